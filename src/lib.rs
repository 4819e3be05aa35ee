pub mod error;
pub mod config;
pub mod providers;
pub mod request;
pub mod registry;
pub mod failover;
pub mod client;
use serde::{Deserialize, Serialize};

/*

ai-failover: one async entry point for plain chat completions that
walks an ordered list of interchangeable LLM backends and answers
with the first one that actually produces text.

ai-failover/
├── Cargo.toml
├── src/
│   ├── lib.rs          # Re-exports and provider slots
│   ├── error.rs        # Diagnostic and caller-facing errors
│   ├── config.rs       # Typed env configuration
│   ├── request.rs      # Messages, options, results
│   ├── providers/      # One adapter per wire protocol
│   │   ├── mod.rs      # Provider trait + shared http helpers
│   │   ├── azure.rs    # Azure OpenAI deployments (x2)
│   │   ├── gemini.rs
│   │   └── deepseek.rs
│   ├── registry.rs     # Slot instantiation + ordering
│   ├── failover.rs     # probe -> request loop
│   ├── client.rs       # AiClient facade
│   └── bin/ai_status.rs
└── tests/

*/

pub use client::AiClient;
pub use config::FailoverConfig;
pub use error::{Error, ServiceError};
pub use failover::
{   FailoverRouter, FailureKind, ProviderFailure, RouteReport
};
pub use registry::ProviderRegistry;
pub use providers::Provider;
pub use request::
{   Message, ProviderResult, ProviderStatus, RequestOptions, Role
};

/// Every provider slot the router knows how to build.
/// Declaration order is the default attempt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind
{
  /// First Azure OpenAI deployment
  AzurePrimary
  ,
  /// Second, independent Azure OpenAI deployment
  AzureSecondary
  ,
  /// Google Gemini (generateContent API)
  Gemini
  ,
  /// DeepSeek (OpenAI-compatible chat completions)
  #[serde(rename = "deepseek")]
  DeepSeek
}

impl ProviderKind
{   /// Fallback order used when no explicit order is configured.
    pub const DEFAULT_ORDER: [ProviderKind; 4] = [
      ProviderKind::AzurePrimary
    , ProviderKind::AzureSecondary
    , ProviderKind::Gemini
    , ProviderKind::DeepSeek
    ];

    /// Canonical identifier reported back to callers.
    pub fn name(&self) -> &'static str
    {   match self
        {   ProviderKind::AzurePrimary => "azure-primary"
          , ProviderKind::AzureSecondary => "azure-secondary"
          , ProviderKind::Gemini => "gemini"
          , ProviderKind::DeepSeek => "deepseek"
        }
    }

    /// Parse a configured slot name. Case and surrounding
    /// whitespace are ignored.
    pub fn from_name(name: &str) -> Option<ProviderKind>
    {   let wanted = name.trim().to_ascii_lowercase();
        ProviderKind::DEFAULT_ORDER
          .into_iter()
          .find(|kind| kind.name() == wanted)
    }
}

impl std::fmt::Display for ProviderKind
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.write_str(self.name())
    }
}
