//! Controlling-side dialog API
//!
//! [`DialogFactory`] owns the shared module connection and creates
//! [`DialogProxy`] instances; each proxy forwards its operations to the UI
//! runtime through that connection.

pub mod factory;
pub mod module;
pub mod proxy;

pub use factory::DialogFactory;
pub use module::SharedModuleHandle;
pub use proxy::{DialogProxy, IdBinding, UNSET_ID_MESSAGE};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{BridgeConfig, CallbackScope},
        error::BridgeError,
        interop::{
            functions, testing::CountingRuntime, CallableRegistry, FnCallable, ForeignDispatcher,
            ForeignTarget,
        },
        ui::{Document, UiHandle, UiHost},
    };
    use serde_json::Value;
    use std::sync::{Arc, Mutex};

    struct Harness {
        ui: UiHandle,
        runtime: Arc<CountingRuntime>,
        dispatcher: ForeignDispatcher,
        factory: DialogFactory,
        fired: Arc<Mutex<Vec<String>>>,
    }

    async fn harness_with(config: BridgeConfig) -> Harness {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let registry = CallableRegistry::new();
        for method in ["OnClosedFirst", "OnClosedSecond"] {
            let fired = fired.clone();
            registry
                .register(
                    ForeignTarget::new("SampleApp", method),
                    Arc::new(FnCallable::new(move |args| {
                        let value = args.get(1).and_then(Value::as_str).unwrap_or_default();
                        fired.lock().unwrap().push(format!("{}:{}", method, value));
                        Ok(Value::Null)
                    })),
                )
                .await;
        }
        let dispatcher = ForeignDispatcher::spawn(registry);

        let mut document = Document::new();
        document.append_dialog("confirm");
        document.append_dialog("settings");
        let ui = UiHost::spawn(document, dispatcher.sender(), &config);

        let runtime = CountingRuntime::new(Arc::new(ui.clone()));
        let factory = DialogFactory::new(runtime.clone(), &config);

        Harness { ui, runtime, dispatcher, factory, fired }
    }

    async fn harness() -> Harness {
        harness_with(BridgeConfig {
            calling_module_name: Some("SampleApp".to_string()),
            ..BridgeConfig::default()
        })
        .await
    }

    #[tokio::test]
    async fn test_unset_id_returns_safe_defaults() {
        let h = harness().await;
        let dialog = h.factory.create_dialog(None);

        assert!(!dialog.is_open().await.unwrap());
        assert_eq!(dialog.get_return_value().await.unwrap(), "");
        dialog.show().await.unwrap();
        dialog.show_modal().await.unwrap();
        dialog.close().await.unwrap();
        dialog.close_with_return_value("x").await.unwrap();
        dialog.set_return_value("x").await.unwrap();
        dialog.on_close("SampleApp", "OnClosedFirst").await.unwrap();
        dialog.remove_close_callbacks().await.unwrap();

        assert_eq!(h.runtime.imports(), 0);
        assert!(h.runtime.calls().is_empty());
        assert!(!h.factory.is_module_loaded());

        let console = h.ui.console_messages().await.unwrap();
        assert_eq!(console.len(), 9);
        assert!(console.iter().all(|m| m == UNSET_ID_MESSAGE));
        assert_eq!(h.runtime.console(), console);
    }

    #[tokio::test]
    async fn test_show_modal_then_close() {
        let h = harness().await;
        let dialog = h.factory.create_dialog(Some("confirm"));

        dialog.show_modal().await.unwrap();
        assert!(dialog.is_open().await.unwrap());
        dialog.close().await.unwrap();
        assert!(!dialog.is_open().await.unwrap());

        dialog.show().await.unwrap();
        assert!(dialog.is_open().await.unwrap());
        assert_eq!(
            h.runtime.calls(),
            vec![
                functions::SHOW_MODAL,
                functions::IS_OPEN,
                functions::CLOSE,
                functions::IS_OPEN,
                functions::SHOW,
                functions::IS_OPEN,
            ]
        );
    }

    #[tokio::test]
    async fn test_return_values() {
        let h = harness().await;
        let dialog = h.factory.create_dialog(Some("confirm"));

        dialog.show_modal().await.unwrap();
        dialog.close_with_return_value("ok").await.unwrap();
        assert_eq!(dialog.get_return_value().await.unwrap(), "ok");

        dialog.set_return_value("x").await.unwrap();
        assert_eq!(dialog.get_return_value().await.unwrap(), "x");

        // Plain close keeps whatever is stored
        dialog.show().await.unwrap();
        dialog.close().await.unwrap();
        assert_eq!(dialog.get_return_value().await.unwrap(), "x");
    }

    #[tokio::test]
    async fn test_two_proxies_share_one_load() {
        let h = harness().await;
        let confirm = h.factory.create_dialog(Some("confirm"));
        let settings = h.factory.create_dialog(Some("settings"));
        assert!(!h.factory.is_module_loaded());
        assert_eq!(h.runtime.imports(), 0);

        let (a, b) = tokio::join!(confirm.show(), settings.show_modal());
        a.unwrap();
        b.unwrap();
        assert!(confirm.is_open().await.unwrap());
        assert!(settings.is_open().await.unwrap());
        assert_eq!(h.runtime.imports(), 1);
    }

    #[tokio::test]
    async fn test_proxies_across_tasks_share_one_load() {
        let h = harness().await;
        let confirm = h.factory.create_dialog(Some("confirm"));
        let settings = h.factory.create_dialog(Some("settings"));

        let first = tokio::spawn(async move { confirm.is_open().await });
        let second = tokio::spawn(async move { settings.is_open().await });
        assert!(!first.await.unwrap().unwrap());
        assert!(!second.await.unwrap().unwrap());
        assert_eq!(h.runtime.imports(), 1);
    }

    #[tokio::test]
    async fn test_close_callbacks_fire_in_order_then_detach() {
        let h = harness().await;
        let dialog = h.factory.create_dialog(Some("confirm"));

        dialog.on_close("SampleApp", "OnClosedFirst").await.unwrap();
        dialog.on_close_method("OnClosedSecond").await.unwrap();

        dialog.show_modal().await.unwrap();
        dialog.close_with_return_value("yes").await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(
            *h.fired.lock().unwrap(),
            vec!["OnClosedFirst:yes", "OnClosedSecond:yes"]
        );

        dialog.remove_close_callbacks().await.unwrap();
        dialog.remove_close_callbacks().await.unwrap();
        dialog.show().await.unwrap();
        dialog.close().await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(h.fired.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_global_scope_detaches_only_from_resolved_element() {
        let h = harness_with(BridgeConfig {
            callback_scope: CallbackScope::Global,
            ..BridgeConfig::default()
        })
        .await;
        let confirm = h.factory.create_dialog(Some("confirm"));
        let settings = h.factory.create_dialog(Some("settings"));

        confirm.on_close("SampleApp", "OnClosedFirst").await.unwrap();
        settings.on_close("SampleApp", "OnClosedSecond").await.unwrap();

        // Every registry entry is walked, but only the resolved element loses listeners
        settings.remove_close_callbacks().await.unwrap();
        confirm.show().await.unwrap();
        confirm.close().await.unwrap();
        settings.show().await.unwrap();
        settings.close().await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(*h.fired.lock().unwrap(), vec!["OnClosedFirst:"]);
    }

    #[tokio::test]
    async fn test_two_factories_share_one_callback_registry() {
        let h = harness().await;
        let other = DialogFactory::new(h.runtime.clone(), &BridgeConfig::default());
        let first = h.factory.create_dialog(Some("confirm"));
        let second = other.create_dialog(Some("confirm"));

        first.on_close("SampleApp", "OnClosedFirst").await.unwrap();
        second.on_close("SampleApp", "OnClosedSecond").await.unwrap();
        assert_eq!(h.runtime.imports(), 2);

        first.show().await.unwrap();
        first.close_with_return_value("a").await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(*h.fired.lock().unwrap(), vec!["OnClosedFirst:a", "OnClosedSecond:a"]);

        // The other factory's import keeps both listeners alive
        h.factory.dispose().await.unwrap();
        second.show().await.unwrap();
        second.close_with_return_value("b").await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(
            *h.fired.lock().unwrap(),
            vec!["OnClosedFirst:a", "OnClosedSecond:a", "OnClosedFirst:b", "OnClosedSecond:b"]
        );

        // Removal clears the element, whichever factory asks
        second.remove_close_callbacks().await.unwrap();
        second.show().await.unwrap();
        second.close().await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(h.fired.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_standalone_proxies_on_one_element_are_additive() {
        let h = harness().await;
        let config = BridgeConfig::default();
        let a = DialogProxy::standalone(h.runtime.clone(), &config, Some("settings"));
        let b = DialogProxy::standalone(h.runtime.clone(), &config, Some("settings"));

        a.on_close("SampleApp", "OnClosedFirst").await.unwrap();
        b.on_close("SampleApp", "OnClosedSecond").await.unwrap();
        a.show_modal().await.unwrap();
        b.close_with_return_value("x").await.unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(*h.fired.lock().unwrap(), vec!["OnClosedFirst:x", "OnClosedSecond:x"]);

        a.dispose().await.unwrap();
        b.dispose().await.unwrap();
        assert_eq!(h.runtime.releases(), 2);

        // Last release took the listeners with it
        h.ui.render(|doc| {
            let dialog = doc.get_element_by_id_mut("settings").unwrap();
            dialog.show().unwrap();
            dialog.close(None);
        })
        .await
        .unwrap();
        h.dispatcher.flush().await.unwrap();
        assert_eq!(h.fired.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_element_is_a_hard_failure() {
        let h = harness().await;
        let ghost = h.factory.create_dialog(Some("ghost"));
        let err = ghost.show().await.unwrap_err();
        assert_eq!(err, BridgeError::ElementNotFound { id: "ghost".to_string() });

        // Removed between calls: the next call sees it gone
        let confirm = h.factory.create_dialog(Some("confirm"));
        confirm.show().await.unwrap();
        h.ui.render(|doc| {
            doc.remove("confirm");
        })
        .await
        .unwrap();
        assert!(confirm.is_open().await.unwrap_err().is_element_not_found());

        // Nothing went to the console for a set-but-missing id
        assert!(h.ui.console_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_id_binding_variants() {
        let h = harness().await;

        let mut fixed = h.factory.create_dialog(Some("confirm"));
        assert_eq!(fixed.binding(), IdBinding::Fixed);
        assert_eq!(fixed.set_id("settings"), Err(BridgeError::IdentifierFixed));
        assert_eq!(fixed.id(), Some("confirm"));

        let mut late = h.factory.create_dialog(None);
        assert_eq!(late.binding(), IdBinding::Settable);
        assert!(!late.is_open().await.unwrap());

        late.set_id("confirm").unwrap();
        late.show().await.unwrap();
        assert!(late.is_open().await.unwrap());

        late.set_id("settings").unwrap();
        assert!(!late.is_open().await.unwrap());
    }

    #[tokio::test]
    async fn test_on_close_method_requires_calling_module() {
        let h = harness_with(BridgeConfig::default()).await;
        let dialog = h.factory.create_dialog(Some("confirm"));
        assert!(h.factory.calling_module_name().is_none());
        assert!(matches!(
            dialog.on_close_method("OnClosedFirst").await,
            Err(BridgeError::Config(_))
        ));

        // An unbound proxy reports the missing id before anything else
        let unbound = h.factory.create_dialog(None);
        unbound.on_close_method("OnClosedFirst").await.unwrap();
        assert_eq!(h.runtime.console(), vec![UNSET_ID_MESSAGE]);
        assert_eq!(h.runtime.imports(), 0);
    }

    #[tokio::test]
    async fn test_factory_dispose() {
        let h = harness().await;

        // Never loaded: nothing to release
        h.factory.dispose().await.unwrap();
        assert_eq!(h.runtime.releases(), 0);

        let dialog = h.factory.create_dialog(Some("confirm"));
        dialog.on_close("SampleApp", "OnClosedFirst").await.unwrap();
        // Factory-made proxies never release the shared module
        dialog.dispose().await.unwrap();
        assert_eq!(h.runtime.releases(), 0);

        h.factory.dispose().await.unwrap();
        h.factory.dispose().await.unwrap();
        assert_eq!(h.runtime.releases(), 1);

        // Listeners went with the module
        h.ui.render(|doc| {
            doc.get_element_by_id_mut("confirm").unwrap().show().unwrap();
            doc.get_element_by_id_mut("confirm").unwrap().close(None);
        })
        .await
        .unwrap();
        h.dispatcher.flush().await.unwrap();
        assert!(h.fired.lock().unwrap().is_empty());

        assert_eq!(dialog.show().await.unwrap_err(), BridgeError::Disposed);
    }

    #[tokio::test]
    async fn test_standalone_proxy_owns_its_module() {
        let h = harness().await;
        let dialog = DialogProxy::standalone(h.runtime.clone(), &BridgeConfig::default(), Some("confirm"));

        dialog.dispose().await.unwrap();
        assert_eq!(h.runtime.releases(), 0);

        dialog.show().await.unwrap();
        dialog.dispose().await.unwrap();
        dialog.dispose().await.unwrap();
        assert_eq!(h.runtime.imports(), 1);
        assert_eq!(h.runtime.releases(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let h = harness().await;
        let dialog = h.factory.create_dialog(Some("confirm"));
        h.ui.shutdown();
        assert_eq!(dialog.show().await.unwrap_err(), BridgeError::TransportClosed);
    }
}
