use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use page::Channel;
use protocol::{Message, TranslateRequest, TranslateResponse, TranslationProgress};
use tokio::sync::mpsc::UnboundedSender;

use super::background::Background;

/// Delivers page requests to an in-process [`Background`] and progress to a listener.
pub struct LocalChannel {
    background: Arc<Background>,
    progress: UnboundedSender<TranslationProgress>,
}

impl LocalChannel {
    pub fn new(background: Arc<Background>, progress: UnboundedSender<TranslationProgress>) -> LocalChannel {
        LocalChannel {
            background,
            progress,
        }
    }
}

#[async_trait]
impl Channel for LocalChannel {
    async fn send_request(&self, request: TranslateRequest) -> Result<TranslateResponse> {
        let reply = self
            .background
            .handle(Message::TranslateText { request })
            .await;

        serde_json::from_value(reply).with_context(|| "decode translate reply")
    }

    async fn report_progress(&self, progress: TranslationProgress) -> Result<()> {
        self.progress
            .send(progress)
            .with_context(|| "progress listener is gone")
    }
}
