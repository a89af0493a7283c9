use anyhow::{Context, Result};
use config::Settings;
use log::{debug, error, info, warn};
use protocol::Message;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use translator::Translator;

const UNKNOWN_MESSAGE: &str = "Unknown message type";

/// Message router standing in for the extension's service worker.
pub struct Background {
    translator: Translator,
}

impl Background {
    pub fn new(translator: Translator) -> Background {
        Background { translator }
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub async fn handle(&self, message: Message) -> Value {
        match message {
            Message::TranslateText { request } => reply(self.translator.translate(&request).await),
            Message::GetSettings => {
                let settings = match self.translator.settings().get_settings().await {
                    Ok(settings) => settings,
                    Err(err) => {
                        warn!("{err:#}, falling back to defaults");
                        Settings::default()
                    }
                };
                reply(settings)
            }
            Message::SaveSettings { settings } => {
                match self.translator.settings().save_settings(&settings).await {
                    Ok(()) => json!({"success": true}),
                    Err(err) => {
                        error!("{err:?}");
                        json!({"success": false, "error": format!("{err:#}")})
                    }
                }
            }
            // progress is for the popup, the router only acknowledges it
            Message::TranslationProgress { progress } => {
                debug!("progress {}/{}", progress.completed, progress.total);
                json!({"success": true})
            }
            Message::StartTranslation { tab_id } => json!({
                "success": false,
                "error": format!("No page attached to tab {tab_id}"),
            }),
            Message::StartExtraction => json!({
                "success": false,
                "error": "No page attached",
            }),
            Message::TranslationResult { .. } => json!({"error": UNKNOWN_MESSAGE}),
        }
    }

    /// Answers one JSON message per line until `reader` is exhausted.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        info!("serving messages on stdio");
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.with_context(|| "read message")? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Message>(line) {
                Ok(message) => self.handle(message).await,
                Err(err) => {
                    warn!("rejected message: {err}");
                    json!({"error": UNKNOWN_MESSAGE})
                }
            };
            let mut out = serde_json::to_vec(&response).with_context(|| "encode response")?;
            out.push(b'\n');
            writer
                .write_all(&out)
                .await
                .with_context(|| "write response")?;
            writer.flush().await.with_context(|| "flush response")?;
        }

        Ok(())
    }
}

fn reply<T: Serialize>(value: T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|err| json!({"error": err.to_string()}))
}
