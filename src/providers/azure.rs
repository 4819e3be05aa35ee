use std::time::Duration;
use async_trait::async_trait;
use log::{debug, trace};
use serde::Serialize;

use crate::config::{AzureConfig, GenerationDefaults};
use crate::error::Error;
use crate::request::{Message, RequestOptions, ResolvedOptions};

// ===== Wire Types =====

#[derive(Debug, Clone, Serialize)]
pub struct AzureChatRequest
{   pub messages: Vec<Message>
  , pub max_tokens: u32
  , pub temperature: f32
  , pub top_p: f32
  , pub frequency_penalty: f32
  , pub presence_penalty: f32
  , pub model: String
}

impl AzureChatRequest
{   fn build(prompt: &str, options: &ResolvedOptions) -> Self
    {   AzureChatRequest
        {   messages: Message::conversation(
              prompt,
              options.system_prompt.as_deref()
            )
          , max_tokens: options.max_tokens
          , temperature: options.temperature
          , top_p: options.top_p
          , frequency_penalty: 0.0
          , presence_penalty: 0.0
          , model: options.model.clone()
        }
    }
}

// ===== Adapter =====

/// One Azure OpenAI deployment. Two instances with different
/// endpoint/key/deployment triples give same-vendor redundancy.
pub struct AzureOpenAiProvider
{   name: String
  , config: AzureConfig
  , defaults: GenerationDefaults
  , http_client: reqwest::Client
  , probe_timeout: Duration
}

impl AzureOpenAiProvider
{   pub fn new(
      name: impl Into<String>
    , config: AzureConfig
    , defaults: GenerationDefaults
    , http_client: reqwest::Client
    , probe_timeout: Duration
    ) -> Self
    {   let name = name.into();
        debug!("Creating AzureOpenAiProvider {}", name);
        AzureOpenAiProvider
        {   name
          , config
          , defaults
          , http_client
          , probe_timeout
        }
    }

    fn completions_url(&self) -> String
    {   format!(
          "{}/openai/deployments/{}/chat/completions",
          self.config.endpoint.trim_end_matches('/'),
          self.config.deployment
        )
    }

    fn post(&self, body: &AzureChatRequest) -> reqwest::RequestBuilder
    {   self.http_client
          .post(self.completions_url())
          .query(&[("api-version", self.config.api_version.as_str())])
          .header("api-key", &self.config.api_key)
          .json(body)
    }
}

#[async_trait]
impl super::Provider for AzureOpenAiProvider
{   fn name(&self) -> &str
    {   &self.name
    }

    async fn probe(&self) -> bool
    {   let options = RequestOptions::new()
          .max_tokens(1)
          .resolve(&self.defaults, &self.config.model);
        let body = AzureChatRequest::build(super::PROBE_PROMPT, &options);
        let result = self.post(&body)
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
        let body = AzureChatRequest::build(prompt, &resolved);

        debug!(
          "{} sending chat completion to deployment {}",
          self.name, self.config.deployment
        );
        trace!("{} request: {:?}", self.name, body);

        let response = self.post(&body).send().await?;
        let response = super::ensure_success(&self.name, response).await?;

        let chat_response: super::ChatCompletionResponse
          = response.json().await?;
        chat_response.into_text(&self.name)
    }
}
