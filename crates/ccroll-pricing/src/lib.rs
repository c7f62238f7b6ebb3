//! Pricing lookup and cost resolution for ccroll
//!
//! This crate owns the boundary to model pricing data: the [`PricingSource`]
//! trait, a LiteLLM-backed [`PricingFetcher`] with an embedded offline
//! snapshot, a pre-seeded [`StaticPricing`] table, and the
//! [`CostCalculator`] that attaches a cost to each usage record.

pub mod cost_calculator;
pub mod pricing_fetcher;

pub use cost_calculator::CostCalculator;
pub use pricing_fetcher::{PricingFetcher, PricingSource, StaticPricing};
