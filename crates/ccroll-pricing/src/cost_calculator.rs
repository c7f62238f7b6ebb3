//! Cost resolution for usage records
//!
//! Every deduplicated record gets exactly one cost, chosen by [`CostMode`]:
//!
//! - `Display` uses the cost written in the log, or 0 when there is none.
//! - `Calculate` ignores any written cost and prices the tokens.
//! - `Auto` uses the written cost when present and prices the tokens otherwise.
//!
//! Pricing never fails a record: an unknown model, a missing model, or a
//! model without rates all cost 0.
//!
//! # Examples
//!
//! ```no_run
//! use ccroll_core::types::{CostMode, ModelName, TokenCounts};
//! use ccroll_pricing::CostCalculator;
//!
//! # async fn example() -> ccroll_core::Result<()> {
//! let calculator = CostCalculator::for_mode(CostMode::Auto, false).await;
//!
//! let tokens = TokenCounts::new(1000, 500, 100, 50);
//! let model = ModelName::new("claude-sonnet-4-20250514");
//!
//! let cost = calculator
//!     .calculate_with_mode(&tokens, Some(&model), Some(0.05), CostMode::Auto)
//!     .await?;
//! assert_eq!(cost, 0.05);
//! # Ok(())
//! # }
//! ```

use crate::pricing_fetcher::{PricingFetcher, PricingSource};
use ccroll_core::error::Result;
use ccroll_core::types::{CostMode, ModelName, ModelPricing, TokenCounts, UsageRecord};
use std::sync::Arc;
use tracing::debug;

const TOKENS_PER_MILLION: f64 = 1_000_000.0;

/// Resolves the cost of usage records
///
/// Holds a pricing source only when the selected mode can need one. The
/// source is released when the calculator is dropped.
pub struct CostCalculator {
    pricing: Option<Arc<dyn PricingSource>>,
}

impl CostCalculator {
    /// Create a calculator backed by the given pricing source
    pub fn with_source(pricing: Arc<dyn PricingSource>) -> Self {
        Self {
            pricing: Some(pricing),
        }
    }

    /// Create a calculator that never consults pricing data
    pub fn display_only() -> Self {
        Self { pricing: None }
    }

    /// Create a calculator suitable for `mode`
    ///
    /// `Display` gets no pricing source; `Calculate` and `Auto` get a
    /// [`PricingFetcher`], which loads lazily on the first lookup.
    pub async fn for_mode(mode: CostMode, offline: bool) -> Self {
        if !mode.needs_pricing() {
            debug!("Cost mode {} needs no pricing data", mode);
            return Self::display_only();
        }

        debug!(offline, "Acquiring pricing provider for cost mode {}", mode);
        Self::with_source(Arc::new(PricingFetcher::new(offline).await))
    }

    /// Whether a pricing source is attached
    pub fn has_pricing(&self) -> bool {
        self.pricing.is_some()
    }

    /// Price tokens for a model
    ///
    /// Returns 0 when there is no model, no pricing source, or the source
    /// does not know the model.
    pub async fn calculate_cost(
        &self,
        tokens: &TokenCounts,
        model_name: Option<&ModelName>,
    ) -> Result<f64> {
        let (Some(pricing), Some(model)) = (&self.pricing, model_name) else {
            return Ok(0.0);
        };

        match pricing.get_model_pricing(model.as_str()).await? {
            Some(rates) => Ok(Self::calculate_from_pricing(tokens, &rates)),
            None => {
                debug!("No pricing for model {}, costing at 0", model);
                Ok(0.0)
            }
        }
    }

    /// Calculate cost from pricing data without fetching
    ///
    /// Each token category is multiplied by its per-million rate; missing
    /// rates contribute nothing.
    pub fn calculate_from_pricing(tokens: &TokenCounts, pricing: &ModelPricing) -> f64 {
        let component = |count: u64, rate: Option<f64>| {
            rate.map_or(0.0, |r| count as f64 * r / TOKENS_PER_MILLION)
        };

        component(tokens.input_tokens, pricing.input_cost_per_mtok)
            + component(tokens.output_tokens, pricing.output_cost_per_mtok)
            + component(tokens.cache_creation_tokens, pricing.cache_write_cost_per_mtok)
            + component(tokens.cache_read_tokens, pricing.cache_read_cost_per_mtok)
    }

    /// Calculate cost with mode consideration
    pub async fn calculate_with_mode(
        &self,
        tokens: &TokenCounts,
        model_name: Option<&ModelName>,
        pre_calculated: Option<f64>,
        mode: CostMode,
    ) -> Result<f64> {
        match mode {
            CostMode::Auto => match pre_calculated {
                Some(cost) => Ok(cost),
                None => self.calculate_cost(tokens, model_name).await,
            },
            CostMode::Calculate => self.calculate_cost(tokens, model_name).await,
            CostMode::Display => Ok(pre_calculated.unwrap_or(0.0)),
        }
    }

    /// Resolve the cost of one record
    pub async fn resolve(&self, record: &UsageRecord, mode: CostMode) -> Result<f64> {
        self.calculate_with_mode(
            &record.tokens,
            record.model.as_ref(),
            record.cost_usd,
            mode,
        )
        .await
    }
}

impl Drop for CostCalculator {
    fn drop(&mut self) {
        if self.pricing.is_some() {
            debug!("Releasing pricing provider");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing_fetcher::StaticPricing;
    use ccroll_core::types::ISOTimestamp;

    fn sonnet_rates() -> ModelPricing {
        ModelPricing {
            input_cost_per_mtok: Some(3.0),
            output_cost_per_mtok: Some(15.0),
            cache_write_cost_per_mtok: Some(3.75),
            cache_read_cost_per_mtok: Some(0.3),
        }
    }

    fn calculator() -> CostCalculator {
        CostCalculator::with_source(Arc::new(
            StaticPricing::new().with_model("claude-sonnet-4-20250514", sonnet_rates()),
        ))
    }

    fn record(model: Option<&str>, cost_usd: Option<f64>) -> UsageRecord {
        UsageRecord {
            raw_timestamp: "2024-01-01T00:00:00Z".to_string(),
            timestamp: ISOTimestamp::parse("2024-01-01T00:00:00Z").unwrap(),
            version: None,
            tokens: TokenCounts::new(1_000_000, 100_000, 0, 0),
            model: model.map(ModelName::new),
            message_id: None,
            request_id: None,
            cost_usd,
        }
    }

    #[test]
    fn test_cost_calculation() {
        let tokens = TokenCounts::new(1000, 500, 100, 50);
        let pricing = ModelPricing {
            input_cost_per_mtok: Some(10.0),
            output_cost_per_mtok: Some(20.0),
            cache_write_cost_per_mtok: Some(15.0),
            cache_read_cost_per_mtok: Some(1.0),
        };

        let cost = CostCalculator::calculate_from_pricing(&tokens, &pricing);

        // 0.01 + 0.01 + 0.0015 + 0.00005
        assert!((cost - 0.02155).abs() < 0.000001);
    }

    #[test]
    fn test_cost_with_missing_rates() {
        let tokens = TokenCounts::new(1000, 500, 100, 50);
        let pricing = ModelPricing {
            input_cost_per_mtok: Some(10.0),
            output_cost_per_mtok: Some(20.0),
            cache_write_cost_per_mtok: None,
            cache_read_cost_per_mtok: None,
        };

        let cost = CostCalculator::calculate_from_pricing(&tokens, &pricing);
        assert!((cost - 0.02).abs() < 0.000001);
    }

    #[test]
    fn test_zero_tokens() {
        let cost = CostCalculator::calculate_from_pricing(&TokenCounts::default(), &sonnet_rates());
        assert_eq!(cost, 0.0);
    }

    #[test]
    fn test_very_large_token_counts() {
        let tokens = TokenCounts::new(10_000_000, 5_000_000, 1_000_000, 500_000);
        let cost = CostCalculator::calculate_from_pricing(&tokens, &sonnet_rates());
        // 30 + 75 + 3.75 + 0.15
        assert!((cost - 108.9).abs() < 0.0001);
    }

    #[test]
    fn test_all_none_pricing() {
        let tokens = TokenCounts::new(1000, 500, 100, 50);
        let cost = CostCalculator::calculate_from_pricing(&tokens, &ModelPricing::default());
        assert_eq!(cost, 0.0);
    }

    #[tokio::test]
    async fn test_display_mode_uses_written_cost_or_zero() {
        let calc = CostCalculator::display_only();
        assert!(!calc.has_pricing());

        let with_cost = record(Some("claude-sonnet-4-20250514"), Some(0.42));
        assert_eq!(calc.resolve(&with_cost, CostMode::Display).await.unwrap(), 0.42);

        let without_cost = record(Some("claude-sonnet-4-20250514"), None);
        assert_eq!(
            calc.resolve(&without_cost, CostMode::Display).await.unwrap(),
            0.0
        );
    }

    #[tokio::test]
    async fn test_calculate_mode_ignores_written_cost() {
        let calc = calculator();
        let r = record(Some("claude-sonnet-4-20250514"), Some(99.0));

        let cost = calc.resolve(&r, CostMode::Calculate).await.unwrap();
        // 1M input at $3 + 100k output at $15
        assert!((cost - 4.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_auto_mode_prefers_written_cost() {
        let calc = calculator();

        let written = record(Some("claude-sonnet-4-20250514"), Some(0.5));
        assert_eq!(calc.resolve(&written, CostMode::Auto).await.unwrap(), 0.5);

        let computed = record(Some("claude-sonnet-4-20250514"), None);
        let cost = calc.resolve(&computed, CostMode::Auto).await.unwrap();
        assert!((cost - 4.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unknown_or_missing_model_costs_zero() {
        let calc = calculator();

        let unknown = record(Some("mystery-model"), None);
        assert_eq!(calc.resolve(&unknown, CostMode::Calculate).await.unwrap(), 0.0);

        let no_model = record(None, None);
        assert_eq!(calc.resolve(&no_model, CostMode::Auto).await.unwrap(), 0.0);

        let synthetic = record(Some("<synthetic>"), None);
        assert_eq!(calc.resolve(&synthetic, CostMode::Auto).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_for_mode_only_acquires_pricing_when_needed() {
        assert!(!CostCalculator::for_mode(CostMode::Display, true).await.has_pricing());
        assert!(CostCalculator::for_mode(CostMode::Auto, true).await.has_pricing());
        assert!(CostCalculator::for_mode(CostMode::Calculate, true).await.has_pricing());
    }
}
