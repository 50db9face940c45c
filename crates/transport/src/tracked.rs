//! TrackedStage - stamps the hosted stage's own timeline entry

use async_trait::async_trait;
use contracts::{ContractError, Message, Stage};
use std::sync::Arc;
use timeline::TimelineTracker;

/// Marks received/started/completed for the wrapped stage around every call
pub struct TrackedStage {
    inner: Arc<dyn Stage>,
    tracker: TimelineTracker,
}

impl TrackedStage {
    pub fn new(inner: Arc<dyn Stage>) -> Self {
        Self {
            inner,
            tracker: TimelineTracker::new(),
        }
    }
}

#[async_trait]
impl Stage for TrackedStage {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn process(&self, mut message: Message) -> Result<Message, ContractError> {
        let name = self.inner.name();
        self.tracker.mark_received(&mut message, name);
        self.tracker.mark_started(&mut message, name);

        let mut out = self.inner.process(message).await?;
        self.tracker.mark_completed(&mut out, name);
        Ok(out)
    }
}
