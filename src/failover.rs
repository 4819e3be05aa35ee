//! Failover logic across the ordered provider list
//!
//! Providers are tried one at a time: probe, then request. The first
//! non-blank completion wins and nothing after it is contacted. Every
//! skip or failure is recorded and logged; callers only ever see
//! [`ServiceError`].

use std::sync::Arc;
use std::time::Duration;
use futures_util::future::join_all;
use log::{debug, error, info, warn};

use crate::error::{Error, ServiceError};
use crate::providers::Provider;
use crate::request::{ProviderResult, ProviderStatus, RequestOptions};

/// Why one provider did not answer a given call.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureKind
{   /// Probe reported rate limiting, unavailability or no connection
    Unavailable
  , /// Request exceeded its time bound
    TimedOut
  , /// Request succeeded with blank text
    EmptyCompletion
  , /// Request raised an error
    Failed(Error)
}

/// One entry of the per-call failure list.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderFailure
{   pub provider: String
  , pub kind: FailureKind
}

impl std::fmt::Display for ProviderFailure
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   match &self.kind
        {   FailureKind::Unavailable => {
              write!(f, "{}: skipped, unavailable", self.provider)
            }
          , FailureKind::TimedOut => {
              write!(f, "{}: timed out", self.provider)
            }
          , FailureKind::EmptyCompletion => {
              write!(f, "{}: empty completion", self.provider)
            }
          , FailureKind::Failed(e) => {
              write!(f, "{}: {}", self.provider, e)
            }
        }
    }
}

/// Result of one routed call together with everything that failed
/// before it. The failure list is for server-side diagnostics only.
#[derive(Debug, Clone)]
pub struct RouteReport
{   pub result: Result<ProviderResult, ServiceError>
  , pub failures: Vec<ProviderFailure>
}

/// The orchestrator. Immutable once built; share it behind an `Arc`.
pub struct FailoverRouter
{   providers: Vec<Arc<dyn Provider>>
  , request_timeout: Duration
  , probe_timeout: Duration
}

impl FailoverRouter
{   /// `providers` must already be in attempt order.
    pub fn new(
      providers: Vec<Arc<dyn Provider>>
    , request_timeout: Duration
    , probe_timeout: Duration
    ) -> Self
    {   debug!(
          "Creating failover router with {} providers",
          providers.len()
        );
        FailoverRouter
        {   providers
          , request_timeout
          , probe_timeout
        }
    }

    pub fn len(&self) -> usize
    {   self.providers.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.providers.is_empty()
    }

    /// Provider names in attempt order.
    pub fn provider_names(&self) -> Vec<&str>
    {   self.providers.iter().map(|p| p.name()).collect()
    }

    /// Route one prompt. See [`FailoverRouter::route`] for the
    /// failure detail.
    pub async fn generate_response(
      &self
    , prompt: &str
    , options: &RequestOptions
    ) -> Result<ProviderResult, ServiceError>
    {   self.route(prompt, options).await.result
    }

    /// Route one prompt and keep the per-provider failure list.
    pub async fn route(
      &self
    , prompt: &str
    , options: &RequestOptions
    ) -> RouteReport
    {   if self.providers.is_empty()
        {   error!("no AI providers configured, cannot route request");
            return RouteReport
            {   result: Err(ServiceError::NoProvidersConfigured)
              , failures: Vec::new()
            };
        }

        let mut failures: Vec<ProviderFailure> = Vec::new();

        for provider in &self.providers
        {   let name = provider.name();

            if !self.probe_one(provider.as_ref()).await
            {   self.record(&mut failures, name, FailureKind::Unavailable);
                continue;
            }

            let attempt = tokio::time::timeout(
              self.request_timeout,
              provider.request(prompt, options)
            ).await;

            let kind = match attempt
            {   Ok(Ok(text)) if !text.trim().is_empty() => {
                  info!(
                    "{} answered after {} failed attempt(s)",
                    name, failures.len()
                  );
                  return RouteReport
                  {   result: Ok(ProviderResult
                      {   text
                        , provider: name.to_string()
                      })
                    , failures
                  };
                }
              , Ok(Ok(_)) => FailureKind::EmptyCompletion
              , Ok(Err(Error::Timeout)) | Err(_) => FailureKind::TimedOut
              , Ok(Err(e)) => FailureKind::Failed(e)
            };
            self.record(&mut failures, name, kind);
        }

        error!(
          "all {} AI providers exhausted: [{}]",
          self.providers.len(),
          failures.iter()
            .map(|f| f.to_string())
            .collect::<Vec<String>>()
            .join("; ")
        );
        RouteReport
        {   result: Err(ServiceError::Exhausted
            {   attempted: self.providers.len()
            })
          , failures
        }
    }

    /// Probe every provider at once. Diagnostic only; routing never
    /// consults this.
    pub async fn provider_status(&self) -> Vec<ProviderStatus>
    {   let probes = self.providers.iter().map(|provider| async move {
          ProviderStatus
          {   name: provider.name().to_string()
            , available: self.probe_one(provider.as_ref()).await
          }
        });
        join_all(probes).await
    }

    /// A probe that does not finish in time counts as unavailable.
    async fn probe_one(&self, provider: &dyn Provider) -> bool
    {   match tokio::time::timeout(self.probe_timeout, provider.probe()).await
        {   Ok(available) => available
          , Err(_) => {
              debug!("{} probe timed out", provider.name());
              false
            }
        }
    }

    fn record(
      &self
    , failures: &mut Vec<ProviderFailure>
    , provider: &str
    , kind: FailureKind
    )
    {   let failure = ProviderFailure
        {   provider: provider.to_string()
          , kind
        };
        warn!("AI provider failover: {}", failure);
        failures.push(failure);
    }
}

impl std::fmt::Debug for FailoverRouter
{   fn fmt(&self, f: &mut std::fmt::Formatter<'_>)
      -> std::fmt::Result
    {   f.debug_struct("FailoverRouter")
          .field("providers", &self.provider_names())
          .field("request_timeout", &self.request_timeout)
          .field("probe_timeout", &self.probe_timeout)
          .finish()
    }
}
