use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};

use crate::config::{GeminiConfig, GenerationDefaults};
use crate::error::Error;
use crate::request::{RequestOptions, ResolvedOptions};

/// Gemini has no per-call option for this; it is always sent.
pub const GEMINI_TOP_K: u32 = 40;

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize)]
pub struct GeminiRequest
{   pub contents: Vec<Content>
  , #[serde(rename = "generationConfig")]
    pub generation_config: GenerationConfig
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content
{   #[serde(default)]
    pub parts: Vec<Part>
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part
{   #[serde(default)]
    pub text: Option<String>
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig
{   pub temperature: f32
  , pub max_output_tokens: u32
  , pub top_p: f32
  , pub top_k: u32
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiResponse
{   #[serde(default)]
    pub candidates: Vec<Candidate>
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate
{   #[serde(default)]
    pub content: Option<Content>
}

/// Gemini has no system role on this endpoint, so the system prompt
/// is folded into the single text part.
pub fn full_prompt(prompt: &str, system_prompt: Option<&str>) -> String
{   match system_prompt
    {   Some(system) => format!("{}\n\nUser: {}", system, prompt)
      , None => prompt.to_string()
    }
}

impl GeminiRequest
{   fn build(prompt: &str, options: &ResolvedOptions) -> Self
    {   GeminiRequest
        {   contents: vec![
              Content
              {   parts: vec![
                    Part
                    {   text: Some(full_prompt(
                          prompt,
                          options.system_prompt.as_deref()
                        ))
                    }
                  ]
              }
            ]
          , generation_config: GenerationConfig
            {   temperature: options.temperature
              , max_output_tokens: options.max_tokens
              , top_p: options.top_p
              , top_k: GEMINI_TOP_K
            }
        }
    }
}

impl GeminiResponse
{   /// `candidates[0].content.parts[0].text`
    fn into_text(self, provider: &str) -> Result<String, Error>
    {   let candidate = self.candidates.into_iter().next()
          .ok_or_else(|| {
            error!("{} returned no candidates", provider);
            Error::NoChoicesInResponse(provider.to_string())
          })?;
        let text = candidate.content
          .and_then(|c| c.parts.into_iter().next())
          .and_then(|p| p.text);
        super::non_blank(provider, text)
    }
}

// ===== Adapter =====

pub struct GeminiProvider
{   name: String
  , config: GeminiConfig
  , defaults: GenerationDefaults
  , http_client: reqwest::Client
  , probe_timeout: Duration
}

impl GeminiProvider
{   pub fn new(
      name: impl Into<String>
    , config: GeminiConfig
    , defaults: GenerationDefaults
    , http_client: reqwest::Client
    , probe_timeout: Duration
    ) -> Self
    {   let name = name.into();
        debug!("Creating GeminiProvider {}", name);
        GeminiProvider
        {   name
          , config
          , defaults
          , http_client
          , probe_timeout
        }
    }

    /// The key travels in the query string, never log the full url.
    fn post(&self, model: &str, body: &GeminiRequest)
      -> reqwest::RequestBuilder
    {   self.http_client
          .post(format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
          ))
          .query(&[("key", self.config.api_key.as_str())])
          .json(body)
    }
}

#[async_trait]
impl super::Provider for GeminiProvider
{   fn name(&self) -> &str
    {   &self.name
    }

    async fn probe(&self) -> bool
    {   let options = RequestOptions::new()
          .max_tokens(1)
          .resolve(&self.defaults, &self.config.model);
        let body = GeminiRequest::build(super::PROBE_PROMPT, &options);
        let result = self.post(&options.model, &body)
          .timeout(self.probe_timeout)
          .send()
          .await;
        super::probe_outcome(&self.name, result)
    }

    async fn request(
      &self
    , prompt: &str
    , options: &RequestOptions
    ) -> Result<String, Error>
    {   options.validate()?;
        let resolved = options.resolve(&self.defaults, &self.config.model);
        let body = GeminiRequest::build(prompt, &resolved);

        debug!("{} sending generateContent for {}", self.name, resolved.model);
        trace!("{} request: {:?}", self.name, body);

        let response = self.post(&resolved.model, &body).send().await?;
        let response = super::ensure_success(&self.name, response).await?;

        let gemini_response: GeminiResponse = response.json().await?;
        gemini_response.into_text(&self.name)
    }
}
