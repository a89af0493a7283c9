use anyhow::{Context, Result};
use bon::bon;
use log::{debug, error, info, warn};
use protocol::{ExtractionResult, TranslateRequest, TranslationProgress};

use super::host::{Channel, Document, Marker};
use super::selector::Selection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Translated,
    Unchanged,
    Failed,
}

/// Walks a document and translates its elements one at a time.
pub struct PageTranslator<C> {
    channel: C,
    selection: Selection,
    source_lang: Option<String>,
    target_lang: Option<String>,
}

#[bon]
impl<C: Channel> PageTranslator<C> {
    #[builder]
    pub fn new(
        channel: C,
        selection: Option<Selection>,
        source_lang: Option<String>,
        target_lang: Option<String>,
    ) -> PageTranslator<C> {
        PageTranslator {
            channel,
            selection: selection.unwrap_or_default(),
            source_lang,
            target_lang,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Entry point for a `START_EXTRACTION` trigger.
    pub async fn start_extraction<D: Document>(&self, document: &mut D) -> ExtractionResult {
        match self.run(document).await {
            Ok(progress) => {
                info!(
                    "page done, {} translated, {} failed",
                    progress.completed - progress.failed,
                    progress.failed
                );
                ExtractionResult::ok()
            }
            Err(err) => {
                error!("{err:?}");
                ExtractionResult::failed(format!("{err:#}"))
            }
        }
    }

    /// Translates every selected element in document order and returns the final counters.
    ///
    /// One progress event goes out before the first element and one after each element,
    /// so `n` elements produce `n + 1` events. Failures of single elements are counted and
    /// never stop the run.
    pub async fn run<D: Document>(&self, document: &mut D) -> Result<TranslationProgress> {
        document.prepare().with_context(|| "prepare document")?;
        let elements = document
            .translatable_elements(&self.selection)
            .with_context(|| "collect translatable elements")?;
        info!("found {} translatable elements", elements.len());

        let mut progress = TranslationProgress::new(elements.len());
        self.report(progress).await;

        for element in elements.iter() {
            let outcome = self.translate_element(document, element).await;
            progress.completed += 1;
            if outcome == Outcome::Failed {
                progress.failed += 1;
            }
            self.report(progress).await;
        }

        Ok(progress)
    }

    async fn report(&self, progress: TranslationProgress) {
        if let Err(err) = self.channel.report_progress(progress).await {
            debug!("progress not delivered: {err:#}");
        }
    }

    async fn translate_element<D: Document>(&self, document: &mut D, element: &D::Element) -> Outcome {
        let original = document.text(element).trim().to_string();
        if original.is_empty() {
            return Outcome::Unchanged;
        }

        let outcome = match self.try_translate(document, element, &original).await {
            Ok(outcome) => outcome,
            Err(err) => {
                error!("translation error: {err:#}");
                Outcome::Failed
            }
        };
        if let Err(err) = document.remove_marker(element, Marker::Translating) {
            warn!("could not clear marker: {err:#}");
        }

        outcome
    }

    async fn try_translate<D: Document>(
        &self,
        document: &mut D,
        element: &D::Element,
        original: &str,
    ) -> Result<Outcome> {
        document.add_marker(element, Marker::Translating)?;
        document.retain_original(element, original)?;

        let request = TranslateRequest::new(original)
            .with_langs(self.source_lang.clone(), self.target_lang.clone());
        let response = self.channel.send_request(request).await?;

        if !response.success {
            warn!(
                "translation failed: {}",
                response.error.as_deref().unwrap_or("unknown error")
            );
            return Ok(Outcome::Failed);
        }
        if response.translated_text.is_empty() {
            debug!("empty translation, element left as is");
            return Ok(Outcome::Unchanged);
        }

        document.replace_text(element, &response.translated_text)?;
        document.add_marker(element, Marker::Translated)?;

        Ok(Outcome::Translated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use anyhow::bail;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use protocol::TranslateResponse;

    #[derive(Default)]
    struct FakeDocument {
        texts: Vec<String>,
        log: Vec<String>,
        fail_prepare: bool,
    }

    impl FakeDocument {
        fn new(texts: &[&str]) -> FakeDocument {
            FakeDocument {
                texts: texts.iter().map(|text| text.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl Document for FakeDocument {
        type Element = usize;

        fn prepare(&mut self) -> Result<()> {
            if self.fail_prepare {
                bail!("no document body");
            }
            self.log.push("prepare".to_string());
            Ok(())
        }

        fn translatable_elements(&self, selection: &Selection) -> Result<Vec<usize>> {
            Ok((0..self.texts.len())
                .filter(|index| selection.accepts_text(&self.texts[*index]))
                .collect())
        }

        fn text(&self, element: &usize) -> String {
            self.texts[*element].clone()
        }

        fn add_marker(&mut self, element: &usize, marker: Marker) -> Result<()> {
            self.log.push(format!("{element} +{}", marker.class()));
            Ok(())
        }

        fn remove_marker(&mut self, element: &usize, marker: Marker) -> Result<()> {
            self.log.push(format!("{element} -{}", marker.class()));
            Ok(())
        }

        fn retain_original(&mut self, element: &usize, text: &str) -> Result<()> {
            self.log.push(format!("{element} original {text}"));
            Ok(())
        }

        fn replace_text(&mut self, element: &usize, text: &str) -> Result<()> {
            self.log.push(format!("{element} text {text}"));
            self.texts[*element] = text.to_string();
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeChannel {
        replies: Mutex<VecDeque<Result<TranslateResponse>>>,
        requests: Mutex<Vec<TranslateRequest>>,
        progress: Mutex<Vec<TranslationProgress>>,
        drop_progress: bool,
    }

    impl FakeChannel {
        fn replying(replies: Vec<Result<TranslateResponse>>) -> FakeChannel {
            FakeChannel {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            }
        }

        fn progress(&self) -> Vec<TranslationProgress> {
            self.progress.lock().map(|p| p.clone()).unwrap_or_default()
        }

        fn requests(&self) -> Vec<TranslateRequest> {
            self.requests.lock().map(|r| r.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Channel for FakeChannel {
        async fn send_request(&self, request: TranslateRequest) -> Result<TranslateResponse> {
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(request.clone());
            }
            let reply = self.replies.lock().ok().and_then(|mut replies| replies.pop_front());
            match reply {
                Some(reply) => reply,
                None => Ok(TranslateResponse::success(format!("[{}]", request.text))),
            }
        }

        async fn report_progress(&self, progress: TranslationProgress) -> Result<()> {
            if let Ok(mut events) = self.progress.lock() {
                events.push(progress);
            }
            if self.drop_progress {
                bail!("receiver closed");
            }
            Ok(())
        }
    }

    fn translator(channel: FakeChannel) -> PageTranslator<FakeChannel> {
        PageTranslator::builder().channel(channel).build()
    }

    fn progress(total: usize, completed: usize, failed: usize) -> TranslationProgress {
        TranslationProgress {
            total,
            completed,
            failed,
        }
    }

    #[tokio::test]
    async fn test_empty_page_reports_once() -> Result<()> {
        let translator = translator(FakeChannel::default());
        let mut document = FakeDocument::new(&[]);

        let result = translator.run(&mut document).await?;
        assert_eq!(result, progress(0, 0, 0));
        assert_eq!(translator.channel().progress(), vec![progress(0, 0, 0)]);
        assert!(translator.channel().requests().is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_progress_sequence() -> Result<()> {
        let translator = translator(FakeChannel::default());
        let mut document = FakeDocument::new(&["First one", "42", "Second one", "Third one"]);

        translator.run(&mut document).await?;
        assert_eq!(
            translator.channel().progress(),
            vec![
                progress(3, 0, 0),
                progress(3, 1, 0),
                progress(3, 2, 0),
                progress(3, 3, 0),
            ]
        );
        assert_eq!(document.texts[0], "[First one]");
        assert_eq!(document.texts[1], "42");

        Ok(())
    }

    #[tokio::test]
    async fn test_element_lifecycle() -> Result<()> {
        let translator = translator(FakeChannel::default());
        let mut document = FakeDocument::new(&["  Hello world  "]);

        translator.run(&mut document).await?;
        assert_eq!(
            document.log,
            vec![
                "prepare",
                "0 +llm-translator-translating",
                "0 original Hello world",
                "0 text [Hello world]",
                "0 +llm-translator-translated",
                "0 -llm-translator-translating",
            ]
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_failures_counted_and_cleaned_up() -> Result<()> {
        let channel = FakeChannel::replying(vec![
            Ok(TranslateResponse::failure("API error: 500 Internal Server Error")),
            Err(anyhow::anyhow!("channel closed")),
            Ok(TranslateResponse::success("Drei")),
        ]);
        let translator = translator(channel);
        let mut document = FakeDocument::new(&["One item", "Two item", "Three item"]);

        let result = translator.run(&mut document).await?;
        assert_eq!(result, progress(3, 3, 2));
        assert_eq!(
            translator.channel().progress(),
            vec![
                progress(3, 0, 0),
                progress(3, 1, 1),
                progress(3, 2, 2),
                progress(3, 3, 2),
            ]
        );
        assert_eq!(document.texts, vec!["One item", "Two item", "Drei"]);

        let cleared = document
            .log
            .iter()
            .filter(|entry| entry.ends_with("-llm-translator-translating"))
            .count();
        assert_eq!(cleared, 3);
        assert!(!document.log.iter().any(|entry| entry == "0 +llm-translator-translated"));

        Ok(())
    }

    #[tokio::test]
    async fn test_empty_translation_leaves_element() -> Result<()> {
        let channel = FakeChannel::replying(vec![Ok(TranslateResponse::success(""))]);
        let translator = translator(channel);
        let mut document = FakeDocument::new(&["Hello world"]);

        let result = translator.run(&mut document).await?;
        assert_eq!(result, progress(1, 1, 0));
        assert_eq!(document.texts, vec!["Hello world"]);
        assert_eq!(
            document.log.last().map(String::as_str),
            Some("0 -llm-translator-translating")
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_progress_errors_ignored() -> Result<()> {
        let channel = FakeChannel {
            drop_progress: true,
            ..Default::default()
        };
        let translator = translator(channel);
        let mut document = FakeDocument::new(&["Hello world", "Goodbye world"]);

        let result = translator.run(&mut document).await?;
        assert_eq!(result, progress(2, 2, 0));
        assert_eq!(translator.channel().progress().len(), 3);

        Ok(())
    }

    #[tokio::test]
    async fn test_requests_carry_languages() -> Result<()> {
        let translator = PageTranslator::builder()
            .channel(FakeChannel::default())
            .source_lang("en".to_string())
            .target_lang("de".to_string())
            .selection(Selection::new(1))
            .build();
        let mut document = FakeDocument::new(&["a"]);

        translator.run(&mut document).await?;
        let expected = TranslateRequest::new("a")
            .with_langs(Some("en".to_string()), Some("de".to_string()));
        assert_eq!(translator.channel().requests(), vec![expected]);

        Ok(())
    }

    #[tokio::test]
    async fn test_start_extraction() {
        let translator = translator(FakeChannel::default());

        let mut document = FakeDocument::new(&["Hello world"]);
        assert_eq!(
            translator.start_extraction(&mut document).await,
            ExtractionResult::ok()
        );

        let mut document = FakeDocument {
            fail_prepare: true,
            ..Default::default()
        };
        let result = translator.start_extraction(&mut document).await;
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("prepare document: no document body"));
        assert!(translator.channel().requests().len() == 1);
    }
}
