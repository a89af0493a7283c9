use config::ApiType;
use serde::{Deserialize, Serialize};

use super::prompt::{plamo_prompt, translategemma_prompt};

const TEMPERATURE: f64 = 0.1;
const MAX_TOKENS: u32 = 4096;

#[derive(Debug, Serialize)]
pub struct RequestBody<'a> {
    pub model: &'a str,
    #[serde(flatten)]
    pub input: Input<'a>,
    pub temperature: f64,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Input<'a> {
    Prompt { prompt: String },
    Messages { messages: Vec<ChatMessage<'a>> },
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Union of the chat and text completion response shapes; absent fields stay empty.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
struct Choice {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// How one inference front-end wants its request built and its response read.
pub trait Dialect {
    fn request_body<'a>(
        &self,
        model: &'a str,
        prompt: &'a str,
        source_lang: &str,
        target_lang: &str,
    ) -> RequestBody<'a>;

    fn extract_text(&self, response: CompletionResponse) -> String;
}

impl Dialect for ApiType {
    fn request_body<'a>(
        &self,
        model: &'a str,
        prompt: &'a str,
        source_lang: &str,
        target_lang: &str,
    ) -> RequestBody<'a> {
        let input = match self {
            ApiType::TranslateGemma => Input::Prompt {
                prompt: translategemma_prompt(prompt, source_lang, target_lang),
            },
            ApiType::Plamo => Input::Prompt {
                prompt: plamo_prompt(prompt, source_lang, target_lang),
            },
            ApiType::Chat => Input::Messages {
                messages: vec![ChatMessage {
                    role: "user",
                    content: prompt,
                }],
            },
            ApiType::Completions => Input::Prompt {
                prompt: prompt.to_string(),
            },
        };

        RequestBody {
            model,
            input,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    fn extract_text(&self, response: CompletionResponse) -> String {
        let Some(choice) = response.choices.into_iter().next() else {
            return String::new();
        };
        let text = match self {
            ApiType::Chat => choice.message.and_then(|message| message.content),
            ApiType::Completions | ApiType::TranslateGemma | ApiType::Plamo => choice.text,
        };

        text.map(|text| text.trim().to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use test_case::test_case;

    fn body(api_type: ApiType, prompt: &str) -> anyhow::Result<Value> {
        let body = api_type.request_body("my-model", prompt, "en", "ja");

        Ok(serde_json::to_value(&body)?)
    }

    fn response(value: Value) -> anyhow::Result<CompletionResponse> {
        Ok(serde_json::from_value(value)?)
    }

    #[test]
    fn test_chat_body() -> anyhow::Result<()> {
        let body = body(ApiType::Chat, "Test prompt")?;
        assert_eq!(
            body,
            json!({
                "model": "my-model",
                "messages": [{"role": "user", "content": "Test prompt"}],
                "temperature": 0.1,
                "max_tokens": 4096,
            })
        );
        assert!(body.get("prompt").is_none());

        Ok(())
    }

    #[test]
    fn test_completions_body() -> anyhow::Result<()> {
        let body = body(ApiType::Completions, "  Test prompt ")?;
        assert_eq!(
            body,
            json!({
                "model": "my-model",
                "prompt": "  Test prompt ",
                "temperature": 0.1,
                "max_tokens": 4096,
            })
        );
        assert!(body.get("messages").is_none());

        Ok(())
    }

    #[test]
    fn test_unknown_dialect_is_completions() -> anyhow::Result<()> {
        let body = body(ApiType::parse_lenient("legacy"), "Test prompt")?;
        assert_eq!(body["prompt"], "Test prompt");
        assert!(body.get("messages").is_none());

        Ok(())
    }

    #[test]
    fn test_translategemma_body() -> anyhow::Result<()> {
        let body = body(ApiType::TranslateGemma, "Test text")?;
        let prompt = body["prompt"].as_str().unwrap_or_default();
        assert!(prompt.contains("<start_of_turn>user"));
        assert!(prompt.contains("<end_of_turn>"));
        assert!(prompt.contains("English (en) to Japanese (ja)"));
        assert!(prompt.contains("Test text"));
        assert!(body.get("messages").is_none());
        assert_eq!(body["max_tokens"], 4096);

        Ok(())
    }

    #[test]
    fn test_plamo_body() -> anyhow::Result<()> {
        let body = body(ApiType::Plamo, "Test text")?;
        let prompt = body["prompt"].as_str().unwrap_or_default();
        assert!(prompt.contains("<|plamo:op|>dataset"));
        assert!(prompt.contains("lang=en"));
        assert!(prompt.contains("lang=ja"));
        assert!(prompt.contains("Test text"));
        assert!(body.get("messages").is_none());

        Ok(())
    }

    #[test]
    fn test_extract_chat() -> anyhow::Result<()> {
        let data = response(json!({"choices": [{"message": {"content": " こんにちは世界\n"}}]}))?;
        assert_eq!(ApiType::Chat.extract_text(data), "こんにちは世界");

        Ok(())
    }

    #[test_case(ApiType::Completions)]
    #[test_case(ApiType::TranslateGemma)]
    #[test_case(ApiType::Plamo)]
    fn test_extract_text(api_type: ApiType) -> anyhow::Result<()> {
        let data = response(json!({"choices": [{"text": "こんにちは世界 "}]}))?;
        assert_eq!(api_type.extract_text(data), "こんにちは世界");

        Ok(())
    }

    #[test_case(ApiType::Chat, json!({}); "chat without choices")]
    #[test_case(ApiType::Chat, json!({"choices": []}); "chat with empty choices")]
    #[test_case(ApiType::Chat, json!({"choices": [{"text": "wrong shape"}]}); "chat reading text shape")]
    #[test_case(ApiType::Chat, json!({"choices": [{"message": {"content": null}}]}); "chat null content")]
    #[test_case(ApiType::Completions, json!({"choices": [{"message": {"content": "wrong shape"}}]}); "completions reading chat shape")]
    #[test_case(ApiType::Plamo, json!({"choices": [{}]}); "plamo empty choice")]
    fn test_extract_missing(api_type: ApiType, value: Value) -> anyhow::Result<()> {
        assert_eq!(api_type.extract_text(response(value)?), "");

        Ok(())
    }
}
