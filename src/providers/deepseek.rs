use std::time::Duration;
use async_trait::async_trait;
use log::{debug, trace};
use serde::Serialize;

use crate::config::{DeepSeekConfig, GenerationDefaults};
use crate::error::Error;
use crate::request::{Message, RequestOptions, ResolvedOptions};

#[derive(Debug, Clone, Serialize)]
pub struct DeepSeekChatRequest
{   pub model: String
  , pub messages: Vec<Message>
  , pub max_tokens: u32
  , pub temperature: f32
}

impl DeepSeekChatRequest
{   fn build(prompt: &str, options: &ResolvedOptions) -> Self
    {   DeepSeekChatRequest
        {   model: options.model.clone()
          , messages: Message::conversation(
              prompt,
              options.system_prompt.as_deref()
            )
          , max_tokens: options.max_tokens
          , temperature: options.temperature
        }
    }
}

/// DeepSeek's OpenAI-compatible chat endpoint. `top_p` is not sent.
pub struct DeepSeekProvider
{   name: String
  , config: DeepSeekConfig
  , defaults: GenerationDefaults
  , http_client: reqwest::Client
  , probe_timeout: Duration
}

impl DeepSeekProvider
{   pub fn new(
      name: impl Into<String>
    , config: DeepSeekConfig
    , defaults: GenerationDefaults
    , http_client: reqwest::Client
    , probe_timeout: Duration
    ) -> Self
    {   let name = name.into();
        debug!("Creating DeepSeekProvider {}", name);
        DeepSeekProvider
        {   name
          , config
          , defaults
          , http_client
          , probe_timeout
        }
    }

    fn post(&self, body: &DeepSeekChatRequest) -> reqwest::RequestBuilder
    {   self.http_client
          .post(format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
          ))
          .header("Authorization", format!("Bearer {}", self.config.api_key))
          .json(body)
    }
}

#[async_trait]
impl super::Provider for DeepSeekProvider
{   fn name(&self) -> &str
    {   &self.name
    }

    async fn probe(&self) -> bool
    {   let options = RequestOptions::new()
          .max_tokens(1)
          .resolve(&self.defaults, &self.config.model);
        let body = DeepSeekChatRequest::build(super::PROBE_PROMPT, &options);
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
        let body = DeepSeekChatRequest::build(prompt, &resolved);

        debug!("{} sending chat completion for {}", self.name, body.model);
        trace!("{} request: {:?}", self.name, body);

        let response = self.post(&body).send().await?;
        let response = super::ensure_success(&self.name, response).await?;

        let chat_response: super::ChatCompletionResponse
          = response.json().await?;
        chat_response.into_text(&self.name)
    }
}
