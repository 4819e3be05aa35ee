//! Typed configuration for provider slots and failover behavior
//!
//! Everything is read once at startup. A slot whose required values are
//! not all present is simply left out; a value that is present but
//! malformed is an [`Error::InvalidConfiguration`].

use std::fmt;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;

pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str
  = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DEEPSEEK_MODEL: &str = "deepseek-chat";
pub const DEFAULT_DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

/// Azure OpenAI deployment
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureConfig
{   /// Resource endpoint, e.g. `https://my-res.openai.azure.com`
    pub endpoint: String
  , pub api_key: String
  , pub deployment: String
  , pub api_version: String
  , /// Sent as the `model` body field
    pub model: String
}

/// Gemini generateContent endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct GeminiConfig
{   pub api_key: String
  , pub model: String
  , pub base_url: String
}

/// DeepSeek chat completions endpoint
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepSeekConfig
{   pub api_key: String
  , pub model: String
  , pub base_url: String
}

/// Global fallbacks for options a caller leaves unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults
{   pub temperature: f32
  , pub top_p: f32
  , pub max_tokens: u32
}

impl Default for GenerationDefaults
{   fn default() -> Self
    {   GenerationDefaults
        {   temperature: 0.7
          , top_p: 0.95
          , max_tokens: 1024
        }
    }
}

/// Router configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverConfig
{   pub azure_primary: Option<AzureConfig>
  , pub azure_secondary: Option<AzureConfig>
  , pub gemini: Option<GeminiConfig>
  , pub deepseek: Option<DeepSeekConfig>
  , /// Explicit attempt order by slot name
    pub provider_order: Option<Vec<String>>
  , pub defaults: GenerationDefaults
  , /// Upper bound for one completion request
    pub request_timeout_secs: u64
  , /// Upper bound for one availability probe
    pub probe_timeout_secs: u64
}

impl Default for FailoverConfig
{   fn default() -> Self
    {   FailoverConfig
        {   azure_primary: None
          , azure_secondary: None
          , gemini: None
          , deepseek: None
          , provider_order: None
          , defaults: GenerationDefaults::default()
          , request_timeout_secs: 60
          , probe_timeout_secs: 10
        }
    }
}

impl FailoverConfig
{   /// Read the process environment.
    pub fn from_env() -> Result<Self, Error>
    {   FailoverConfig::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
      F: Fn(&str) -> Option<String>
    {   let get = |key: &str| -> Option<String>
        {   lookup(key)
              .map(|v| v.trim().to_string())
              .filter(|v| !v.is_empty())
        };

        let mut config = FailoverConfig
        {   azure_primary: azure_from(&get, "AZURE_OPENAI")
          , azure_secondary: azure_from(&get, "AZURE_OPENAI_SECONDARY")
          , gemini: get("GEMINI_API_KEY").map(|api_key| GeminiConfig
            {   api_key
              , model: get("GEMINI_MODEL")
                  .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string())
              , base_url: get("GEMINI_BASE_URL")
                  .unwrap_or_else(|| DEFAULT_GEMINI_BASE_URL.to_string())
            })
          , deepseek: get("DEEPSEEK_API_KEY").map(|api_key| DeepSeekConfig
            {   api_key
              , model: get("DEEPSEEK_MODEL")
                  .unwrap_or_else(|| DEFAULT_DEEPSEEK_MODEL.to_string())
              , base_url: get("DEEPSEEK_BASE_URL")
                  .unwrap_or_else(|| DEFAULT_DEEPSEEK_BASE_URL.to_string())
            })
          , provider_order: get("AI_PROVIDER_ORDER").map(|raw| {
              raw.split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect::<Vec<String>>()
            }).filter(|names| !names.is_empty())
          , ..FailoverConfig::default()
        };

        if let Some(v) = get("AI_DEFAULT_TEMPERATURE")
        {   config.defaults.temperature
              = parse_value("AI_DEFAULT_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("AI_DEFAULT_TOP_P")
        {   config.defaults.top_p = parse_value("AI_DEFAULT_TOP_P", &v)?;
        }
        if let Some(v) = get("AI_DEFAULT_MAX_TOKENS")
        {   config.defaults.max_tokens
              = parse_value("AI_DEFAULT_MAX_TOKENS", &v)?;
        }
        if let Some(v) = get("AI_REQUEST_TIMEOUT_SECS")
        {   config.request_timeout_secs
              = parse_value("AI_REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("AI_PROBE_TIMEOUT_SECS")
        {   config.probe_timeout_secs
              = parse_value("AI_PROBE_TIMEOUT_SECS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject malformed values. Called again by the registry so that
    /// hand-built or deserialized configs get the same checks.
    pub fn validate(&self) -> Result<(), Error>
    {   let d = &self.defaults;
        if !(0.0..=2.0).contains(&d.temperature)
        {   return Err(Error::InvalidConfiguration(format!(
              "default temperature {} outside 0.0..=2.0", d.temperature
            )));
        }
        if !(0.0..=1.0).contains(&d.top_p)
        {   return Err(Error::InvalidConfiguration(format!(
              "default top_p {} outside 0.0..=1.0", d.top_p
            )));
        }
        if d.max_tokens == 0
        {   return Err(Error::InvalidConfiguration(
              "default max_tokens must be at least 1".to_string()
            ));
        }
        if self.request_timeout_secs == 0 || self.probe_timeout_secs == 0
        {   return Err(Error::InvalidConfiguration(
              "timeouts must be at least one second".to_string()
            ));
        }

        for (slot, azure) in [
          ("azure-primary", &self.azure_primary)
        , ("azure-secondary", &self.azure_secondary)
        ]
        {   if let Some(azure) = azure
            {   check_url(slot, &azure.endpoint)?;
            }
        }
        if let Some(gemini) = &self.gemini
        {   check_url("gemini", &gemini.base_url)?;
        }
        if let Some(deepseek) = &self.deepseek
        {   check_url("deepseek", &deepseek.base_url)?;
        }
        Ok(())
    }
}

fn azure_from<G>(get: &G, prefix: &str) -> Option<AzureConfig>
where
  G: Fn(&str) -> Option<String>
{   let endpoint = get(&format!("{}_ENDPOINT", prefix));
    let api_key = get(&format!("{}_API_KEY", prefix));
    let deployment = get(&format!("{}_DEPLOYMENT", prefix));

    match (endpoint, api_key, deployment)
    {   (Some(endpoint), Some(api_key), Some(deployment)) => {
          Some(AzureConfig
          {   endpoint
            , api_key
            , api_version: get(&format!("{}_API_VERSION", prefix))
                .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string())
            , model: get(&format!("{}_MODEL", prefix))
                .unwrap_or_else(|| deployment.clone())
            , deployment
          })
        }
      , (None, None, None) => None
      , _ => {
          debug!("{} is partially configured, leaving it out", prefix);
          None
        }
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, Error>
where
  T: std::str::FromStr
{   raw.parse::<T>().map_err(|_| {
      Error::InvalidConfiguration(format!(
        "{} has unparseable value {:?}", key, raw
      ))
    })
}

fn check_url(slot: &str, url: &str) -> Result<(), Error>
{   if url.starts_with("https://") || url.starts_with("http://")
    {   Ok(())
    } else
    {   Err(Error::InvalidConfiguration(format!(
          "{} url must start with http:// or https://", slot
        )))
    }
}

impl fmt::Debug for AzureConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("AzureConfig")
          .field("endpoint", &self.endpoint)
          .field("api_key", &"<redacted>")
          .field("deployment", &self.deployment)
          .field("api_version", &self.api_version)
          .field("model", &self.model)
          .finish()
    }
}

impl fmt::Debug for GeminiConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("GeminiConfig")
          .field("api_key", &"<redacted>")
          .field("model", &self.model)
          .field("base_url", &self.base_url)
          .finish()
    }
}

impl fmt::Debug for DeepSeekConfig
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.debug_struct("DeepSeekConfig")
          .field("api_key", &"<redacted>")
          .field("model", &self.model)
          .field("base_url", &self.base_url)
          .finish()
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)])
      -> impl Fn(&str) -> Option<String>
    {   let map: HashMap<String, String> = pairs
          .iter()
          .map(|(k, v)| (k.to_string(), v.to_string()))
          .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_configures_nothing()
    {   let config = FailoverConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FailoverConfig::default());
    }

    #[test]
    fn azure_slot_needs_all_three_values()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("AZURE_OPENAI_ENDPOINT", "https://a.openai.azure.com")
        , ("AZURE_OPENAI_API_KEY", "k1")
        ])).unwrap();
        assert!(config.azure_primary.is_none());

        let config = FailoverConfig::from_lookup(lookup(&[
          ("AZURE_OPENAI_ENDPOINT", "https://a.openai.azure.com")
        , ("AZURE_OPENAI_API_KEY", "k1")
        , ("AZURE_OPENAI_DEPLOYMENT", "gpt4o")
        ])).unwrap();
        let azure = config.azure_primary.unwrap();
        assert_eq!(azure.model, "gpt4o");
        assert_eq!(azure.api_version, DEFAULT_AZURE_API_VERSION);
    }

    #[test]
    fn secondary_slot_reads_its_own_prefix()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("AZURE_OPENAI_SECONDARY_ENDPOINT", "https://b.openai.azure.com")
        , ("AZURE_OPENAI_SECONDARY_API_KEY", "k2")
        , ("AZURE_OPENAI_SECONDARY_DEPLOYMENT", "mini")
        , ("AZURE_OPENAI_SECONDARY_MODEL", "gpt-4o-mini")
        ])).unwrap();
        assert!(config.azure_primary.is_none());
        assert_eq!(config.azure_secondary.unwrap().model, "gpt-4o-mini");
    }

    #[test]
    fn blank_key_counts_as_missing()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("GEMINI_API_KEY", "   ")
        , ("DEEPSEEK_API_KEY", "sk-d")
        ])).unwrap();
        assert!(config.gemini.is_none());
        let deepseek = config.deepseek.unwrap();
        assert_eq!(deepseek.model, DEFAULT_DEEPSEEK_MODEL);
        assert_eq!(deepseek.base_url, DEFAULT_DEEPSEEK_BASE_URL);
    }

    #[test]
    fn order_list_is_split_and_trimmed()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("AI_PROVIDER_ORDER", " gemini , ,deepseek")
        ])).unwrap();
        assert_eq!(
          config.provider_order,
          Some(vec!["gemini".to_string(), "deepseek".to_string()])
        );
    }

    #[test]
    fn order_list_of_only_separators_is_unset()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("AI_PROVIDER_ORDER", " , ,")
        ])).unwrap();
        assert_eq!(config.provider_order, None);
    }

    #[test]
    fn malformed_values_fail_fast()
    {   for pairs in [
          [("AI_DEFAULT_TEMPERATURE", "warm")]
        , [("AI_DEFAULT_TEMPERATURE", "3.5")]
        , [("AI_DEFAULT_TOP_P", "1.5")]
        , [("AI_DEFAULT_MAX_TOKENS", "0")]
        , [("AI_REQUEST_TIMEOUT_SECS", "-1")]
        , [("AI_PROBE_TIMEOUT_SECS", "0")]
        , [("DEEPSEEK_BASE_URL", "api.deepseek.com")]
        ]
        {   let mut all = pairs.to_vec();
            all.push(("DEEPSEEK_API_KEY", "sk"));
            let err = FailoverConfig::from_lookup(lookup(&all)).unwrap_err();
            assert!(
              matches!(err, Error::InvalidConfiguration(_)),
              "{:?} gave {:?}", pairs, err
            );
        }
    }

    #[test]
    fn defaults_are_overridable()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("AI_DEFAULT_TEMPERATURE", "0.2")
        , ("AI_DEFAULT_TOP_P", "0.5")
        , ("AI_DEFAULT_MAX_TOKENS", "256")
        , ("AI_REQUEST_TIMEOUT_SECS", "30")
        ])).unwrap();
        assert_eq!(config.defaults.temperature, 0.2);
        assert_eq!(config.defaults.top_p, 0.5);
        assert_eq!(config.defaults.max_tokens, 256);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.probe_timeout_secs, 10);
    }

    #[test]
    fn debug_output_redacts_keys()
    {   let config = FailoverConfig::from_lookup(lookup(&[
          ("GEMINI_API_KEY", "AIza-secret")
        , ("DEEPSEEK_API_KEY", "sk-secret")
        ])).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn from_env_reads_process_environment()
    {   temp_env::with_vars(
          [
            ("GEMINI_API_KEY", Some("env-key"))
          , ("GEMINI_MODEL", Some("gemini-1.5-pro"))
          , ("AI_PROVIDER_ORDER", None)
          ],
          || {
            let config = FailoverConfig::from_env().unwrap();
            let gemini = config.gemini.unwrap();
            assert_eq!(gemini.api_key, "env-key");
            assert_eq!(gemini.model, "gemini-1.5-pro");
          }
        );
    }
}
