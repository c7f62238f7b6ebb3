//! Model pricing sources
//!
//! [`PricingSource`] is the seam the cost resolver calls through. Two
//! implementations live here: [`PricingFetcher`], which loads the LiteLLM
//! catalogue once per instance, and [`StaticPricing`], a fixed in-memory
//! table.

use async_trait::async_trait;
use ccroll_core::error::Result;
use ccroll_core::types::ModelPricing;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// LiteLLM pricing API URL
const LITELLM_PRICING_URL: &str =
    "https://raw.githubusercontent.com/BerriAI/litellm/main/model_prices_and_context_window.json";

/// Embedded pricing data for offline mode
const EMBEDDED_PRICING: &str = include_str!("../embedded/pricing.json");

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Anything that can answer "what does this model cost"
#[async_trait]
pub trait PricingSource: Send + Sync {
    /// Rates for a model, or `None` when the model is not known
    async fn get_model_pricing(&self, model_name: &str) -> Result<Option<ModelPricing>>;
}

/// One catalogue entry as LiteLLM publishes it, in USD per token
#[derive(Debug, Deserialize)]
struct LiteLlmEntry {
    input_cost_per_token: Option<f64>,
    output_cost_per_token: Option<f64>,
    cache_creation_input_token_cost: Option<f64>,
    cache_read_input_token_cost: Option<f64>,
}

impl LiteLlmEntry {
    fn into_pricing(self) -> Option<ModelPricing> {
        let per_million = |rate: Option<f64>| rate.map(|r| r * TOKENS_PER_MILLION);
        let pricing = ModelPricing {
            input_cost_per_mtok: per_million(self.input_cost_per_token),
            output_cost_per_mtok: per_million(self.output_cost_per_token),
            cache_write_cost_per_mtok: per_million(self.cache_creation_input_token_cost),
            cache_read_cost_per_mtok: per_million(self.cache_read_input_token_cost),
        };

        if pricing == ModelPricing::default() {
            None
        } else {
            Some(pricing)
        }
    }
}

/// Fetches and caches model pricing data
pub struct PricingFetcher {
    /// Cached pricing data
    cache: Arc<RwLock<Option<HashMap<String, ModelPricing>>>>,
    /// Whether to operate in offline mode
    offline_mode: bool,
    /// HTTP client
    client: reqwest::Client,
}

impl PricingFetcher {
    /// Create a new PricingFetcher
    ///
    /// Nothing is loaded until the first lookup.
    pub async fn new(offline: bool) -> Self {
        Self {
            cache: Arc::new(RwLock::new(None)),
            offline_mode: offline,
            client: reqwest::Client::new(),
        }
    }

    /// Whether this fetcher skips the network
    pub fn is_offline(&self) -> bool {
        self.offline_mode
    }

    /// Ensure pricing data is loaded
    async fn ensure_pricing_loaded(&self) -> Result<()> {
        let mut cache = self.cache.write().await;
        if cache.is_some() {
            return Ok(());
        }

        let pricing_data = self.fetch_pricing_data().await?;
        debug!(models = pricing_data.len(), "Pricing catalogue loaded");
        *cache = Some(pricing_data);
        Ok(())
    }

    /// Fetch pricing data from LiteLLM or embedded data
    async fn fetch_pricing_data(&self) -> Result<HashMap<String, ModelPricing>> {
        if self.offline_mode {
            info!("Using embedded pricing data (offline mode)");
            return parse_embedded_pricing();
        }

        match self.fetch_litellm_pricing().await {
            Ok(data) => {
                info!("Successfully fetched pricing data from LiteLLM");
                Ok(data)
            }
            Err(e) => {
                warn!("Failed to fetch pricing data: {}, using embedded data", e);
                parse_embedded_pricing()
            }
        }
    }

    /// Fetch pricing from LiteLLM API
    async fn fetch_litellm_pricing(&self) -> Result<HashMap<String, ModelPricing>> {
        let response = self
            .client
            .get(LITELLM_PRICING_URL)
            .send()
            .await?
            .error_for_status()?;

        let data: HashMap<String, serde_json::Value> = response.json().await?;
        Ok(parse_pricing_data(data))
    }

    /// Force refresh pricing data
    pub async fn refresh(&self) -> Result<()> {
        let mut cache = self.cache.write().await;
        *cache = None;
        drop(cache);

        self.ensure_pricing_loaded().await
    }
}

#[async_trait]
impl PricingSource for PricingFetcher {
    async fn get_model_pricing(&self, model_name: &str) -> Result<Option<ModelPricing>> {
        {
            let cache = self.cache.read().await;
            if let Some(ref pricing_map) = *cache {
                return Ok(find_model_pricing(pricing_map, model_name).cloned());
            }
        }

        self.ensure_pricing_loaded().await?;

        let cache = self.cache.read().await;
        Ok(cache
            .as_ref()
            .and_then(|map| find_model_pricing(map, model_name))
            .cloned())
    }
}

/// Fixed pricing table
///
/// # Examples
/// ```
/// use ccroll_core::types::ModelPricing;
/// use ccroll_pricing::StaticPricing;
///
/// let pricing = StaticPricing::new().with_model(
///     "claude-sonnet-4-20250514",
///     ModelPricing {
///         input_cost_per_mtok: Some(3.0),
///         output_cost_per_mtok: Some(15.0),
///         ..Default::default()
///     },
/// );
/// assert_eq!(pricing.len(), 1);
/// ```
#[derive(Debug, Default, Clone)]
pub struct StaticPricing {
    models: HashMap<String, ModelPricing>,
}

impl StaticPricing {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Table seeded from the embedded LiteLLM snapshot
    pub fn embedded() -> Result<Self> {
        Ok(Self {
            models: parse_embedded_pricing()?,
        })
    }

    /// Add or replace one model's rates
    pub fn with_model(mut self, model_name: impl Into<String>, pricing: ModelPricing) -> Self {
        self.models.insert(model_name.into(), pricing);
        self
    }

    /// Number of models in the table
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether the table has no models
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl FromIterator<(String, ModelPricing)> for StaticPricing {
    fn from_iter<I: IntoIterator<Item = (String, ModelPricing)>>(iter: I) -> Self {
        Self {
            models: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl PricingSource for StaticPricing {
    async fn get_model_pricing(&self, model_name: &str) -> Result<Option<ModelPricing>> {
        Ok(find_model_pricing(&self.models, model_name).cloned())
    }
}

/// Convert a LiteLLM catalogue, skipping entries without any rate
fn parse_pricing_data(data: HashMap<String, serde_json::Value>) -> HashMap<String, ModelPricing> {
    data.into_iter()
        .filter_map(|(model_name, value)| {
            serde_json::from_value::<LiteLlmEntry>(value)
                .ok()
                .and_then(LiteLlmEntry::into_pricing)
                .map(|pricing| (model_name, pricing))
        })
        .collect()
}

/// Load embedded pricing data
fn parse_embedded_pricing() -> Result<HashMap<String, ModelPricing>> {
    let data: HashMap<String, serde_json::Value> = serde_json::from_str(EMBEDDED_PRICING)?;
    Ok(parse_pricing_data(data))
}

/// Find pricing for a model, with fuzzy matching
///
/// Exact key first, then provider-prefixed variants, then the longest
/// catalogue key that contains or is contained in the name. Ties on length
/// resolve to the lexicographically smallest key.
fn find_model_pricing<'a>(
    pricing_map: &'a HashMap<String, ModelPricing>,
    model_name: &str,
) -> Option<&'a ModelPricing> {
    if model_name.is_empty() {
        return None;
    }

    if let Some(pricing) = pricing_map.get(model_name) {
        return Some(pricing);
    }

    let variations = [
        format!("anthropic/{model_name}"),
        format!("claude-{model_name}"),
    ];

    for variant in &variations {
        if let Some(pricing) = pricing_map.get(variant) {
            debug!("Found pricing for {} using variant {}", model_name, variant);
            return Some(pricing);
        }
    }

    let best = pricing_map
        .iter()
        .filter(|(key, _)| key.contains(model_name) || model_name.contains(key.as_str()))
        .max_by(|(a, _), (b, _)| a.len().cmp(&b.len()).then_with(|| b.cmp(a)));

    if let Some((key, pricing)) = best {
        debug!(
            "Found pricing for {} using partial match {}",
            model_name, key
        );
        return Some(pricing);
    }

    None
}
