use std::time::Duration;

use bon::bon;
use config::ApiType;
use getset::{CopyGetters, Getters};
use http_client::Client;
use log::{info, warn};
use protocol::{DEFAULT_SOURCE_LANG, DEFAULT_TARGET_LANG, TranslateResponse};
use tokio::time;

use super::dialect::{CompletionResponse, Dialect};
use super::error::{Error, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(60_000);

#[derive(Debug, Clone, Getters, CopyGetters)]
pub struct ClientConfig {
    #[getset(get = "pub")]
    url: String,
    #[getset(get = "pub")]
    model: String,
    #[getset(get_copy = "pub")]
    api_type: ApiType,
    #[getset(get = "pub")]
    source_lang: String,
    #[getset(get = "pub")]
    target_lang: String,
    #[getset(get_copy = "pub")]
    timeout: Duration,
}

#[bon]
impl ClientConfig {
    #[builder]
    pub fn new(
        url: impl Into<String>,
        model: impl Into<String>,
        api_type: ApiType,
        source_lang: Option<String>,
        target_lang: Option<String>,
        timeout: Option<Duration>,
    ) -> ClientConfig {
        ClientConfig {
            url: url.into(),
            model: model.into(),
            api_type,
            source_lang: source_lang.unwrap_or_else(|| DEFAULT_SOURCE_LANG.to_string()),
            target_lang: target_lang.unwrap_or_else(|| DEFAULT_TARGET_LANG.to_string()),
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }
}

/// Speaks the four inference dialects and folds every outcome into a [`TranslateResponse`].
#[derive(Clone)]
pub struct InferenceClient {
    client: Client,
}

impl InferenceClient {
    pub fn new(client: Client) -> InferenceClient {
        InferenceClient { client }
    }

    /// Never fails: transport, status, timeout and decode errors come back as
    /// `success == false` with a readable message.
    pub async fn translate_text(&self, prompt: &str, config: &ClientConfig) -> TranslateResponse {
        match self.request(prompt, config).await {
            Ok(translated) => {
                info!("{} translated {} chars", config.model, translated.chars().count());
                TranslateResponse::success(translated)
            }
            Err(err) => {
                warn!("{} failed: {err}", config.url);
                TranslateResponse::failure(err.to_string())
            }
        }
    }

    async fn request(&self, prompt: &str, config: &ClientConfig) -> Result<String> {
        let api_type = config.api_type;
        let body = api_type.request_body(
            &config.model,
            prompt,
            &config.source_lang,
            &config.target_lang,
        );

        // Dropping the in-flight future on timeout aborts the connection.
        let call = async {
            let response = self.client.post_json(&config.url, &body).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(Error::Status {
                    code: status.as_u16(),
                    reason: status.canonical_reason().unwrap_or_default().to_string(),
                });
            }
            let bytes = response.bytes().await?;
            let data: CompletionResponse = serde_json::from_slice(&bytes)?;

            Ok::<_, Error>(api_type.extract_text(data))
        };

        time::timeout(config.timeout, call)
            .await
            .map_err(|_| Error::Timeout(config.timeout))?
    }
}
