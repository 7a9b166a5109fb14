use anyhow::Result;
use clap::Args;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use dialog_bridge::{
    interop::FnCallable,
    ui::{Document, UiHost},
    BridgeConfig, CallableRegistry, DialogFactory, ForeignDispatcher, ForeignTarget,
};

const SAMPLE_MODULE: &str = "SampleApp";
const CLOSE_METHOD: &str = "OnDialogClosed";

/// Run a scripted session against a sample dialog
#[derive(Args)]
pub struct DemoCommand {
    /// Id of the dialog element to render and drive
    #[arg(long, default_value = "sample-dialog")]
    pub id: String,

    /// Open the dialog modally
    #[arg(long)]
    pub modal: bool,

    /// Close with this return value
    #[arg(long)]
    pub return_value: Option<String>,
}

impl DemoCommand {
    pub async fn execute(&self, config: &BridgeConfig) -> Result<()> {
        debug!("Executing demo command");

        let registry = CallableRegistry::new();
        registry
            .register(
                ForeignTarget::new(SAMPLE_MODULE, CLOSE_METHOD),
                Arc::new(FnCallable::new(|args| {
                    let id = args.first().and_then(Value::as_str).unwrap_or_default();
                    let value = args.get(1).and_then(Value::as_str).unwrap_or_default();
                    println!("close event from #{} (return value: {:?})", id, value);
                    Ok(Value::Null)
                })),
            )
            .await;
        let dispatcher = ForeignDispatcher::spawn(registry);

        let mut document = Document::new();
        document.append_dialog(self.id.as_str());
        let ui = UiHost::spawn(document, dispatcher.sender(), config);

        let factory = DialogFactory::new(Arc::new(ui.clone()), config);
        let dialog = factory.create_dialog(Some(self.id.as_str()));

        dialog.on_close(SAMPLE_MODULE, CLOSE_METHOD).await?;

        if self.modal {
            dialog.show_modal().await?;
        } else {
            dialog.show().await?;
        }
        println!("open: {}", dialog.is_open().await?);

        match &self.return_value {
            Some(value) => dialog.close_with_return_value(value).await?,
            None => dialog.close().await?,
        }
        dispatcher.flush().await?;

        println!("open: {}", dialog.is_open().await?);
        println!("return value: {:?}", dialog.get_return_value().await?);

        // An unbound proxy only reports to the console
        let unbound = factory.create_dialog(None);
        println!("unbound open: {}", unbound.is_open().await?);

        dialog.remove_close_callbacks().await?;
        factory.dispose().await?;
        ui.shutdown();
        dispatcher.shutdown();

        info!("Demo finished");
        Ok(())
    }
}
