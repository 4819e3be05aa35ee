//! LLM provider implementations

pub mod azure;
pub mod deepseek;
pub mod gemini;

pub use azure::AzureOpenAiProvider;
pub use deepseek::DeepSeekProvider;
pub use gemini::GeminiProvider;

use std::time::Duration;
use async_trait::async_trait;
use log::{debug, error};
use serde::Deserialize;

use crate::error::Error;
use crate::request::RequestOptions;

/// Prompt sent by availability probes.
pub(crate) const PROBE_PROMPT: &str = "ping";

/// One interchangeable chat backend.
///
/// Adapters never retry: a failed call is reported once and the
/// router decides what happens next.
#[async_trait]
pub trait Provider: Send + Sync
{   /// Canonical slot name, e.g. `gemini`.
    fn name(&self) -> &str;

    /// Cheap availability check. `false` only for rate limiting (429),
    /// service unavailable (503) or a transport failure; any other
    /// answer, errors included, counts as available.
    async fn probe(&self) -> bool;

    /// Real completion call. Returns the extracted text.
    async fn request(
      &self
    , prompt: &str
    , options: &RequestOptions
    ) -> Result<String, Error>;
}

/// Shared client for every adapter. The timeout bounds each request;
/// probes override it with their own shorter limit.
pub fn http_client(request_timeout: Duration)
  -> Result<reqwest::Client, Error>
{   reqwest::Client::builder()
      .timeout(request_timeout)
      .build()
      .map_err(|e| {
        Error::InvalidConfiguration(format!(
          "cannot build http client: {}", e
        ))
      })
}

/// Map a probe's raw outcome to availability.
pub(crate) fn probe_outcome(
  provider: &str
, result: Result<reqwest::Response, reqwest::Error>
) -> bool
{   match result
    {   Ok(response) => {
          let status = response.status();
          let limited = status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::SERVICE_UNAVAILABLE;
          debug!("{} probe answered {}", provider, status);
          !limited
        }
      , Err(e) => {
          debug!("{} probe failed: {}", provider, Error::from(e));
          false
        }
    }
}

/// Pass 2xx responses through; turn anything else into an
/// [`Error::ApiError`] carrying status and body.
pub(crate) async fn ensure_success(
  provider: &str
, response: reqwest::Response
) -> Result<reqwest::Response, Error>
{   let status = response.status();
    if status.is_success()
    {   return Ok(response);
    }
    let body = response.text().await
      .unwrap_or_else(|_| "Unknown error".to_string());
    error!("{} API error {}: {}", provider, status, body);
    Err(Error::ApiError
    {   provider: provider.to_string()
      , status: status.as_u16()
      , body
    })
}

/// Blank completions are failures, not answers.
pub(crate) fn non_blank(
  provider: &str
, text: Option<String>
) -> Result<String, Error>
{   match text
    {   Some(text) if !text.trim().is_empty() => Ok(text)
      , _ => Err(Error::EmptyCompletion(provider.to_string()))
    }
}

// ===== OpenAI-style response envelope (Azure, DeepSeek) =====

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChatCompletionResponse
{   #[serde(default)]
    pub choices: Vec<Choice>
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Choice
{   pub message: ChoiceMessage
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ChoiceMessage
{   #[serde(default)]
    pub content: Option<String>
}

impl ChatCompletionResponse
{   /// `choices[0].message.content`, required to be non-blank.
    pub(crate) fn into_text(self, provider: &str)
      -> Result<String, Error>
    {   let first = self.choices.into_iter().next()
          .ok_or_else(|| {
            error!("{} returned no choices", provider);
            Error::NoChoicesInResponse(provider.to_string())
          })?;
        non_blank(provider, first.message.content)
    }
}
