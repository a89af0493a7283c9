use anyhow::Result;
use async_trait::async_trait;
use protocol::{TranslateRequest, TranslateResponse, TranslationProgress};

use super::selector::Selection;

pub const TRANSLATING_CLASS: &str = "llm-translator-translating";
pub const TRANSLATED_CLASS: &str = "llm-translator-translated";
pub const ORIGINAL_TEXT_ATTR: &str = "data-original-text";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Translating,
    Translated,
}

impl Marker {
    pub fn class(&self) -> &'static str {
        match self {
            Marker::Translating => TRANSLATING_CLASS,
            Marker::Translated => TRANSLATED_CLASS,
        }
    }
}

/// A mutable page the translator walks and rewrites in place.
pub trait Document {
    type Element;

    /// Runs once before elements are collected, e.g. to install marker styles.
    fn prepare(&mut self) -> Result<()> {
        Ok(())
    }

    /// Leaf elements passing `selection`, in document order.
    fn translatable_elements(&self, selection: &Selection) -> Result<Vec<Self::Element>>;

    fn text(&self, element: &Self::Element) -> String;

    fn add_marker(&mut self, element: &Self::Element, marker: Marker) -> Result<()>;

    fn remove_marker(&mut self, element: &Self::Element, marker: Marker) -> Result<()>;

    fn retain_original(&mut self, element: &Self::Element, text: &str) -> Result<()>;

    /// Replaces the element's whole content with a single text node.
    fn replace_text(&mut self, element: &Self::Element, text: &str) -> Result<()>;
}

/// Route from the page to the background translator and the progress view.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn send_request(&self, request: TranslateRequest) -> Result<TranslateResponse>;

    async fn report_progress(&self, progress: TranslationProgress) -> Result<()>;
}
