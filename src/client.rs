use std::sync::Arc;
use std::time::Duration;
use log::debug;

use crate::config::FailoverConfig;
use crate::error::{Error, ServiceError};
use crate::failover::{FailoverRouter, RouteReport};
use crate::providers::Provider;
use crate::registry::ProviderRegistry;
use crate::request::{ProviderResult, ProviderStatus, RequestOptions};

/// Public entry point for the rest of the application.
///
/// Build one at startup and hand clones to whatever needs it; clones
/// share the same immutable router. Calls are independent of each other
/// and safe to run concurrently.
#[derive(Debug, Clone)]
pub struct AiClient
{   router: Arc<FailoverRouter>
}

impl AiClient
{   /// Configure from the process environment.
    pub fn from_env() -> Result<Self, Error>
    {   AiClient::from_config(&FailoverConfig::from_env()?)
    }

    /// Instantiate the configured slots and fix their attempt order.
    pub fn from_config(config: &FailoverConfig) -> Result<Self, Error>
    {   let registry = ProviderRegistry::from_config(config)?;
        let ordered = registry.ordered(config.provider_order.as_deref());
        debug!(
          "AI provider order: {:?}",
          ordered.iter().map(|p| p.name()).collect::<Vec<&str>>()
        );
        Ok(AiClient::from_router(FailoverRouter::new(
          ordered,
          Duration::from_secs(config.request_timeout_secs),
          Duration::from_secs(config.probe_timeout_secs)
        )))
    }

    /// Use providers built elsewhere, already in attempt order.
    pub fn from_providers(
      providers: Vec<Arc<dyn Provider>>
    , request_timeout: Duration
    , probe_timeout: Duration
    ) -> Self
    {   let registry = ProviderRegistry::from_providers(providers);
        AiClient::from_router(FailoverRouter::new(
          registry.ordered(None),
          request_timeout,
          probe_timeout
        ))
    }

    pub fn from_router(router: FailoverRouter) -> Self
    {   AiClient { router: Arc::new(router) }
    }

    /// Names in the order they will be attempted.
    pub fn provider_names(&self) -> Vec<&str>
    {   self.router.provider_names()
    }

    /// Route a prompt through the providers; first non-blank answer wins.
    pub async fn generate_response(
      &self
    , prompt: &str
    , options: Option<RequestOptions>
    ) -> Result<ProviderResult, ServiceError>
    {   let options = options.unwrap_or_default();
        self.router.generate_response(prompt, &options).await
    }

    /// Same routing, with the per-provider failure list attached.
    pub async fn generate_response_with_report(
      &self
    , prompt: &str
    , options: Option<RequestOptions>
    ) -> RouteReport
    {   let options = options.unwrap_or_default();
        self.router.route(prompt, &options).await
    }

    /// Availability of every configured provider, in attempt order.
    pub async fn provider_status(&self) -> Vec<ProviderStatus>
    {   self.router.provider_status().await
    }
}
