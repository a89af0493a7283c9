use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::bail;
use indoc::indoc;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::helper::not_blank;

/// Request/response protocol spoken by an inference server front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiType {
    Chat,
    #[default]
    Completions,
    TranslateGemma,
    Plamo,
}

impl ApiType {
    pub const ALL: [ApiType; 4] = [
        ApiType::Chat,
        ApiType::Completions,
        ApiType::TranslateGemma,
        ApiType::Plamo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiType::Chat => "chat",
            ApiType::Completions => "completions",
            ApiType::TranslateGemma => "translategemma",
            ApiType::Plamo => "plamo",
        }
    }

    /// Unknown names fall back to plain completions.
    pub fn parse_lenient(name: &str) -> ApiType {
        name.parse().unwrap_or_default()
    }
}

impl Display for ApiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApiType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ApiType::ALL.iter().find(|ty| ty.as_str() == s) {
            Some(ty) => Ok(*ty),
            None => bail!("unknown api type {s}"),
        }
    }
}

impl<'de> Deserialize<'de> for ApiType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = Option::<String>::deserialize(deserializer)?;

        Ok(name.map(|name| ApiType::parse_lenient(&name)).unwrap_or_default())
    }
}

const PLAMO_TEMPLATE: &str = indoc! {"
    <|plamo:op|>dataset
    translation
    <|plamo:op|>input lang={{sourceLang}}
    {{text}}
    <|plamo:op|>output lang={{targetLang}}"
};

/// Prompt template suggested for a freshly configured endpoint.
pub fn preset_template(api_type: ApiType) -> Option<&'static str> {
    match api_type {
        ApiType::TranslateGemma => Some("{{text}}"),
        ApiType::Plamo => Some(PLAMO_TEMPLATE),
        ApiType::Chat | ApiType::Completions => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    pub id: String,
    pub name: String,
    pub url: String,
    pub model: String,
    pub prompt_template: String,
    #[serde(default)]
    pub api_type: ApiType,
    #[serde(default)]
    pub is_default: bool,
}

/// User supplied endpoint fields, before an id is assigned.
#[derive(Debug, Clone, Validate)]
pub struct EndpointDraft {
    #[validate(custom(function = "not_blank"))]
    pub name: String,
    #[validate(custom(function = "not_blank"))]
    pub url: String,
    pub api_type: ApiType,
    #[validate(custom(function = "not_blank"))]
    pub model: String,
    #[validate(custom(function = "not_blank"))]
    pub prompt_template: String,
}

impl EndpointDraft {
    fn trimmed(self) -> EndpointDraft {
        EndpointDraft {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
            api_type: self.api_type,
            model: self.model.trim().to_string(),
            prompt_template: self.prompt_template.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub active_endpoint_id: Option<String>,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            endpoints: vec![
                Endpoint {
                    id: "default-translategemma".to_string(),
                    name: "TranslateGemma".to_string(),
                    url: "http://localhost:1234/v1/completions".to_string(),
                    model: "translategemma-12b-it".to_string(),
                    prompt_template: "{{text}}".to_string(),
                    api_type: ApiType::TranslateGemma,
                    is_default: true,
                },
                Endpoint {
                    id: "default-plamo".to_string(),
                    name: "PLaMo-2-Translate".to_string(),
                    url: "http://localhost:1234/v1/completions".to_string(),
                    model: "plamo-2-translate".to_string(),
                    prompt_template: "{{text}}".to_string(),
                    api_type: ApiType::Plamo,
                    is_default: false,
                },
            ],
            active_endpoint_id: Some("default-translategemma".to_string()),
        }
    }
}

impl Settings {
    /// Resolves the active id; a dangling or unset id yields `None`.
    pub fn active_endpoint(&self) -> Option<&Endpoint> {
        let id = self.active_endpoint_id.as_deref()?;

        self.endpoints.iter().find(|endpoint| endpoint.id == id)
    }

    pub fn endpoint(&self, id: &str) -> Option<&Endpoint> {
        self.endpoints.iter().find(|endpoint| endpoint.id == id)
    }

    pub fn add_endpoint(&mut self, draft: EndpointDraft) -> anyhow::Result<&Endpoint> {
        draft
            .validate()
            .map_err(|err| anyhow::anyhow!("endpoint -> {err}"))?;
        let draft = draft.trimmed();
        let endpoint = Endpoint {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            url: draft.url,
            model: draft.model,
            prompt_template: draft.prompt_template,
            api_type: draft.api_type,
            is_default: self.endpoints.is_empty(),
        };
        if self.active_endpoint_id.is_none() {
            self.active_endpoint_id = Some(endpoint.id.clone());
        }
        self.endpoints.push(endpoint);

        Ok(&self.endpoints[self.endpoints.len() - 1])
    }

    /// Returns `false` when no endpoint has the given id.
    pub fn update_endpoint(&mut self, id: &str, draft: EndpointDraft) -> anyhow::Result<bool> {
        draft
            .validate()
            .map_err(|err| anyhow::anyhow!("endpoint -> {err}"))?;
        let draft = draft.trimmed();
        let Some(endpoint) = self.endpoints.iter_mut().find(|endpoint| endpoint.id == id) else {
            return Ok(false);
        };
        endpoint.name = draft.name;
        endpoint.url = draft.url;
        endpoint.api_type = draft.api_type;
        endpoint.model = draft.model;
        endpoint.prompt_template = draft.prompt_template;

        Ok(true)
    }

    pub fn remove_endpoint(&mut self, id: &str) -> bool {
        let before = self.endpoints.len();
        self.endpoints.retain(|endpoint| endpoint.id != id);
        if self.endpoints.len() == before {
            return false;
        }

        if self.active_endpoint_id.as_deref() == Some(id) {
            self.active_endpoint_id = self.endpoints.first().map(|endpoint| endpoint.id.clone());
        }

        true
    }
}
