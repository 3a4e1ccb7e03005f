//! Classifier adapters: an OpenAI-compatible chat-completions client and the
//! offline keyword classifiers used when no API key is configured.
//!
//! Both return the raw answer text. Parsing and fallbacks live in the domain.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::application::ports::{IntentClassifier, StructureClassifier};
use crate::domain::classify::{StructureRequest, keyword_intent, listing_structure};
use crate::domain::config::ClassifierConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const INTENT_PROMPT: &str = "You extract deployment parameters from a user's request. \
Answer with one JSON object and nothing else, with the keys \
\"cloudProvider\" (for example \"aws\"), \
\"applicationType\" (\"flask\", \"django\" or \"nodejs\") and \
\"resourceSize\" (an instance type such as \"t2.micro\"). \
Use null for anything the request does not say.";

const STRUCTURE_PROMPT: &str = "You locate files in a source repository given its directory tree. \
Answer with one JSON object and nothing else, with the keys \
\"dependencyManifestPath\" (the dependency manifest, such as requirements.txt or package.json) and \
\"mainFilePath\" (the file that starts the web server). \
Both paths are relative to the tree root and use '/' separators. \
Use null when no such file exists.";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatAnswer,
}

#[derive(Deserialize)]
struct ChatAnswer {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl ChatClassifier {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: &str, model: &str, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key,
        })
    }

    async fn complete(&self, system: &str, user: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: 0.0,
        };
        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "classifier request");
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("POST {}", self.endpoint))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("classifier endpoint returned {status}: {}", body.trim());
        }
        let body: ChatResponse = response
            .json()
            .await
            .context("decoding classifier response")?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow::anyhow!("classifier returned no answer"))
    }
}

fn structure_question(request: &StructureRequest) -> String {
    format!(
        "Framework: {}\nRoot directory: {}\n\n{}",
        request.framework, request.root_name, request.tree_listing
    )
}

/// Remote classifier when an API key is available, keyword rules otherwise.
pub enum Classifier {
    Remote(ChatClassifier),
    Offline,
}

impl Classifier {
    /// Pick the remote client when the configured key variable is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self> {
        match std::env::var(&config.api_key_env) {
            Ok(key) if !key.trim().is_empty() => {
                tracing::debug!(endpoint = %config.endpoint, "using remote classifier");
                Ok(Self::Remote(ChatClassifier::new(
                    &config.endpoint,
                    &config.model,
                    key,
                )?))
            }
            _ => {
                tracing::debug!(env = %config.api_key_env, "no API key; using offline classifier");
                Ok(Self::Offline)
            }
        }
    }
}

impl IntentClassifier for Classifier {
    async fn classify_intent(&self, text: &str) -> Result<String> {
        match self {
            Self::Remote(chat) => chat.complete(INTENT_PROMPT, text).await,
            Self::Offline => {
                serde_json::to_string(&keyword_intent(text)).context("encoding intent")
            }
        }
    }
}

impl StructureClassifier for Classifier {
    async fn classify_structure(&self, request: &StructureRequest) -> Result<String> {
        match self {
            Self::Remote(chat) => {
                chat.complete(STRUCTURE_PROMPT, &structure_question(request))
                    .await
            }
            Self::Offline => {
                serde_json::to_string(&listing_structure(request)).context("encoding structure")
            }
        }
    }
}
