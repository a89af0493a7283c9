mod client;
mod dialect;
mod error;
mod prompt;

use std::time::Duration;

use bon::bon;
use config::SettingsStore;
use log::{error, warn};
use protocol::{TranslateRequest, TranslateResponse};

pub use client::{ClientConfig, DEFAULT_TIMEOUT, InferenceClient};
pub use dialect::{ChatMessage, CompletionResponse, Dialect, Input, RequestBody};
pub use error::Error;
pub use prompt::{build_prompt, language_name, plamo_prompt, translategemma_prompt};

/// Answers `TRANSLATE_TEXT` requests with the active endpoint.
pub struct Translator {
    settings: SettingsStore,
    client: InferenceClient,
    timeout: Duration,
}

#[bon]
impl Translator {
    #[builder]
    pub fn new(
        settings: SettingsStore,
        client: InferenceClient,
        timeout: Option<Duration>,
    ) -> Translator {
        Translator {
            settings,
            client,
            timeout: timeout.unwrap_or(DEFAULT_TIMEOUT),
        }
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// Resolves the active endpoint at call time, renders its template and calls it.
    /// Configuration problems are reported in the response, never raised.
    pub async fn translate(&self, request: &TranslateRequest) -> TranslateResponse {
        let endpoint = match self.settings.get_active_endpoint().await {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => {
                warn!("no active endpoint configured");
                return TranslateResponse::failure("No active endpoint configured");
            }
            Err(err) => {
                error!("{err:?}");
                return TranslateResponse::failure(format!("{err:#}"));
            }
        };

        let prompt = build_prompt(&endpoint.prompt_template, request);
        let config = ClientConfig::builder()
            .url(endpoint.url)
            .model(endpoint.model)
            .api_type(endpoint.api_type)
            .source_lang(request.source_lang().to_string())
            .target_lang(request.target_lang().to_string())
            .timeout(self.timeout)
            .build();

        self.client.translate_text(&prompt, &config).await
    }
}
