//! Server-side stage invocation shared by both bindings

use contracts::{Message, Stage};
use std::sync::Arc;
use tracing::error;

/// Run a stage on its own task so a panic becomes an error reply instead of
/// taking the connection down with it
pub(crate) async fn run_guarded(stage: Arc<dyn Stage>, message: Message) -> Result<Message, String> {
    let name = stage.name().to_string();

    match tokio::spawn(async move { stage.process(message).await }).await {
        Ok(Ok(out)) => Ok(out),
        Ok(Err(e)) => Err(e.to_string()),
        Err(join_err) if join_err.is_panic() => {
            error!(stage = %name, "Stage handler panicked");
            Err(format!("stage '{name}' panicked"))
        }
        Err(join_err) => Err(join_err.to_string()),
    }
}
