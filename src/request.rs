//! Unified request and response types

use serde::{Deserialize, Serialize};

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role
{   User
  , Assistant
  , System
}

/// One chat message as sent on the OpenAI-style wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message
{   pub role: Role
  , pub content: String
}

impl Message
{   pub fn system(content: impl Into<String>) -> Self
    {   Message { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self
    {   Message { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self
    {   Message { role: Role::Assistant, content: content.into() }
    }

    /// Optional system prompt followed by the user prompt.
    pub fn conversation(
      prompt: &str
    , system_prompt: Option<&str>
    ) -> Vec<Message>
    {   let mut messages = Vec::with_capacity(2);
        if let Some(system) = system_prompt
        {   messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));
        messages
    }
}

/// Per-call generation options. Every field is optional; missing
/// values fall back to the adapter's model and the global defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions
{   #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>
  , #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>
}

impl RequestOptions
{   pub fn new() -> Self
    {   RequestOptions::default()
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self
    {   self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self
    {   self.temperature = Some(temperature);
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self
    {   self.top_p = Some(top_p);
        self
    }

    pub fn system_prompt(mut self, system_prompt: impl Into<String>) -> Self
    {   self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self
    {   self.model = Some(model.into());
        self
    }

    /// Check the documented ranges. NaN fails every range check.
    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   if self.max_tokens == Some(0)
        {   return Err(crate::error::Error::InvalidOptions(
              "max_tokens must be at least 1".to_string()
            ));
        }
        if let Some(t) = self.temperature
        {   if !(0.0..=2.0).contains(&t)
            {   return Err(crate::error::Error::InvalidOptions(
                  format!("temperature {} outside 0.0..=2.0", t)
                ));
            }
        }
        if let Some(p) = self.top_p
        {   if !(0.0..=1.0).contains(&p)
            {   return Err(crate::error::Error::InvalidOptions(
                  format!("top_p {} outside 0.0..=1.0", p)
                ));
            }
        }
        Ok(())
    }

    /// Fill the gaps from the adapter's model and the global defaults.
    pub fn resolve(
      &self
    , defaults: &crate::config::GenerationDefaults
    , default_model: &str
    ) -> ResolvedOptions
    {   ResolvedOptions
        {   max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens)
          , temperature: self.temperature
              .unwrap_or(defaults.temperature)
          , top_p: self.top_p.unwrap_or(defaults.top_p)
          , system_prompt: self.system_prompt.clone()
              .filter(|s| !s.trim().is_empty())
          , model: self.model.clone()
              .filter(|m| !m.trim().is_empty())
              .unwrap_or_else(|| default_model.to_string())
        }
    }
}

/// Options after defaulting; what adapters put on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions
{   pub max_tokens: u32
  , pub temperature: f32
  , pub top_p: f32
  , pub system_prompt: Option<String>
  , pub model: String
}

/// Successful answer from the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResult
{   /// Generated text, never blank
    #[serde(rename = "response")]
    pub text: String
  , /// Name of the provider that produced it
    pub provider: String
}

/// Diagnostic availability row for health endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderStatus
{   pub name: String
  , pub available: bool
}
