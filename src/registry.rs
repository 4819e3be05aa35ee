//! Provider registry and attempt ordering
//!
//! Slots are instantiated only when their configuration is complete.
//! The attempt order is either the configured name list, filtered to
//! what exists, or [`ProviderKind::DEFAULT_ORDER`].

use std::sync::Arc;
use std::time::Duration;
use log::{debug, info, warn};

use crate::config::FailoverConfig;
use crate::error::Error;
use crate::providers::
{   AzureOpenAiProvider, DeepSeekProvider, GeminiProvider, Provider
};
use crate::ProviderKind;

/// Instantiated providers in default order, no duplicate names.
pub struct ProviderRegistry
{   providers: Vec<Arc<dyn Provider>>
}

impl ProviderRegistry
{   /// Build every slot whose configuration is present.
    pub fn from_config(config: &FailoverConfig) -> Result<Self, Error>
    {   config.validate()?;
        let http_client = crate::providers::http_client(
          Duration::from_secs(config.request_timeout_secs)
        )?;
        let probe_timeout = Duration::from_secs(config.probe_timeout_secs);

        let mut providers: Vec<Arc<dyn Provider>> = Vec::new();
        for kind in ProviderKind::DEFAULT_ORDER
        {   let provider: Option<Arc<dyn Provider>> = match kind
            {   ProviderKind::AzurePrimary => config.azure_primary.clone()
                  .map(|c| Arc::new(AzureOpenAiProvider::new(
                    kind.name(), c, config.defaults.clone(),
                    http_client.clone(), probe_timeout
                  )) as Arc<dyn Provider>)
              , ProviderKind::AzureSecondary => config.azure_secondary.clone()
                  .map(|c| Arc::new(AzureOpenAiProvider::new(
                    kind.name(), c, config.defaults.clone(),
                    http_client.clone(), probe_timeout
                  )) as Arc<dyn Provider>)
              , ProviderKind::Gemini => config.gemini.clone()
                  .map(|c| Arc::new(GeminiProvider::new(
                    kind.name(), c, config.defaults.clone(),
                    http_client.clone(), probe_timeout
                  )) as Arc<dyn Provider>)
              , ProviderKind::DeepSeek => config.deepseek.clone()
                  .map(|c| Arc::new(DeepSeekProvider::new(
                    kind.name(), c, config.defaults.clone(),
                    http_client.clone(), probe_timeout
                  )) as Arc<dyn Provider>)
            };
            match provider
            {   Some(p) => providers.push(p)
              , None => debug!("{} not configured, skipping slot", kind)
            }
        }

        info!("{} AI provider(s) configured", providers.len());
        Ok(ProviderRegistry::from_providers(providers))
    }

    /// Wrap already-built providers. Later duplicates of a name
    /// are discarded.
    pub fn from_providers(providers: Vec<Arc<dyn Provider>>) -> Self
    {   let mut unique: Vec<Arc<dyn Provider>>
          = Vec::with_capacity(providers.len());
        for provider in providers
        {   if unique.iter().any(|p| p.name() == provider.name())
            {   warn!("duplicate provider {} ignored", provider.name());
                continue;
            }
            unique.push(provider);
        }
        ProviderRegistry { providers: unique }
    }

    pub fn len(&self) -> usize
    {   self.providers.len()
    }

    pub fn is_empty(&self) -> bool
    {   self.providers.is_empty()
    }

    pub fn names(&self) -> Vec<&str>
    {   self.providers.iter().map(|p| p.name()).collect()
    }

    /// Look a provider up by name, ignoring case and whitespace.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Provider>>
    {   let wanted = name.trim();
        self.providers
          .iter()
          .find(|p| p.name().eq_ignore_ascii_case(wanted))
    }

    /// Resolve the attempt order. With an explicit list, unknown or
    /// unconfigured names are dropped and repeats collapse to their
    /// first position; without one, registry order is used.
    pub fn ordered(&self, order: Option<&[String]>)
      -> Vec<Arc<dyn Provider>>
    {   let Some(order) = order
        else
        {   return self.providers.clone();
        };

        let mut resolved: Vec<Arc<dyn Provider>> = Vec::new();
        for name in order
        {   match self.get(name)
            {   Some(provider) => {
                  if resolved.iter().any(|p| Arc::ptr_eq(p, provider))
                  {   debug!("{} listed twice in provider order", name);
                      continue;
                  }
                  resolved.push(Arc::clone(provider));
                }
              , None => {
                  warn!(
                    "provider order names {:?}, which is not configured",
                    name
                  );
                }
            }
        }
        if resolved.is_empty() && !self.providers.is_empty()
        {   warn!("provider order matched none of the configured providers");
        }
        resolved
    }
}
