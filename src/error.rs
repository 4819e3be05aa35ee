use std::fmt;

/// Message shown to callers whenever the router cannot answer.
pub const UNAVAILABLE_MESSAGE: &str
  = "AI service is temporarily unavailable; please try again later";

/// Diagnostic error raised by adapters and configuration loading.
/// Carries backend detail, so it stays on the server side.
#[derive(Debug, Clone, PartialEq)]
pub enum Error
{   /// Transport failure (connect, TLS, body read)
    HttpError(String)
  , /// Backend answered with a non-2xx status
    ApiError
    {   provider: String
      , status: u16
      , body: String
    }
  , /// Failed to parse API response
    ParseError(String)
  , /// No choices/candidates in API response
    NoChoicesInResponse(String)
  , /// Backend produced an empty or whitespace-only completion
    EmptyCompletion(String)
  , /// Request options outside their legal ranges
    InvalidOptions(String)
  , /// Malformed configuration value
    InvalidConfiguration(String)
  , /// Timeout error
    Timeout
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { provider, status, body } => {
              write!(f,
                "{} API error (status {}): {}",
                provider, status, body
              )
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::NoChoicesInResponse(provider) => {
              write!(f, "{} response contained no choices", provider)
            }
          , Error::EmptyCompletion(provider) => {
              write!(f, "{} returned an empty completion", provider)
            }
          , Error::InvalidOptions(msg) => {
              write!(f, "Invalid request options: {}", msg)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<reqwest::Error> for Error
{   /// The url is dropped: Gemini carries its key in the query string.
    fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   return Error::Timeout;
        }
        if e.is_decode()
        {   return Error::ParseError(e.without_url().to_string());
        }
        Error::HttpError(e.without_url().to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ParseError(e.to_string())
    }
}

/// Error surfaced to callers of [`crate::AiClient`].
///
/// Both variants render as [`UNAVAILABLE_MESSAGE`]. They differ only so
/// operators can tell "nothing configured" from "everything failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError
{   /// No provider slot had complete configuration
    NoProvidersConfigured
  , /// Every configured provider was skipped or failed
    Exhausted
    {   attempted: usize
    }
}

impl fmt::Display for ServiceError
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   f.write_str(UNAVAILABLE_MESSAGE)
    }
}

impl std::error::Error for ServiceError {}
