//! Messages exchanged between the page, the background translator and the progress view.

use config::Settings;
use serde::{Deserialize, Serialize};

pub const DEFAULT_SOURCE_LANG: &str = "en";
pub const DEFAULT_TARGET_LANG: &str = "ja";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_lang: Option<String>,
}

impl TranslateRequest {
    pub fn new(text: impl Into<String>) -> TranslateRequest {
        TranslateRequest {
            text: text.into(),
            source_lang: None,
            target_lang: None,
        }
    }

    pub fn with_langs(mut self, source: Option<String>, target: Option<String>) -> Self {
        self.source_lang = source;
        self.target_lang = target;
        self
    }

    /// Source language code, `en` when absent.
    pub fn source_lang(&self) -> &str {
        self.source_lang.as_deref().unwrap_or(DEFAULT_SOURCE_LANG)
    }

    /// Target language code, `ja` when absent.
    pub fn target_lang(&self) -> &str {
        self.target_lang.as_deref().unwrap_or(DEFAULT_TARGET_LANG)
    }
}

/// Uniform result of one translation call, whatever dialect served it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslateResponse {
    #[serde(default)]
    pub translated_text: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TranslateResponse {
    pub fn success(translated_text: impl Into<String>) -> TranslateResponse {
        TranslateResponse {
            translated_text: translated_text.into(),
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> TranslateResponse {
        TranslateResponse {
            translated_text: String::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationProgress {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TranslationProgress {
    pub fn new(total: usize) -> TranslationProgress {
        TranslationProgress {
            total,
            completed: 0,
            failed: 0,
        }
    }

    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 0;
        }

        self.completed * 100 / self.total
    }

    pub fn is_finished(&self) -> bool {
        self.completed == self.total
    }
}

/// Reply to a `START_EXTRACTION` trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionResult {
    pub fn ok() -> ExtractionResult {
        ExtractionResult {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> ExtractionResult {
        ExtractionResult {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    StartTranslation {
        #[serde(rename = "tabId")]
        tab_id: u64,
    },
    StartExtraction,
    TranslateText {
        request: TranslateRequest,
    },
    TranslationResult {
        result: TranslateResponse,
        #[serde(rename = "elementId")]
        element_id: String,
    },
    TranslationProgress {
        progress: TranslationProgress,
    },
    GetSettings,
    SaveSettings {
        settings: Settings,
    },
}
