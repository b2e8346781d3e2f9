//! Strategy registry
//!
//! A closed set of strategy variants dispatched through one fixed
//! interface. Strategies can be registered, enabled and disabled at
//! runtime, but the behavior behind each tag is compiled in.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Inputs handed to a strategy on dispatch.
#[derive(Debug, Clone)]
pub struct StrategyContext {
    pub symbol: String,
    pub notional_usd: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutionResult {
    pub strategy_id: String,
    pub description: String,
    pub expected_return_usd: Decimal,
}

/// The closed set of strategy behaviors.
#[derive(Debug, Clone, Serialize)]
pub enum StrategyKind {
    /// Cross-venue spread capture at an assumed realized spread.
    SpreadCapture { expected_spread_pct: Decimal },
    /// Passive staking yield, quoted as annual percentage rate.
    YieldStaking { apr_pct: Decimal },
    /// Lending out idle balance at a daily rate.
    Lending { daily_rate_pct: Decimal },
}

impl StrategyKind {
    pub fn category(&self) -> &'static str {
        match self {
            StrategyKind::SpreadCapture { .. } => "arbitrage",
            StrategyKind::YieldStaking { .. } => "staking",
            StrategyKind::Lending { .. } => "lending",
        }
    }

    fn run(&self, ctx: &StrategyContext) -> (String, Decimal) {
        match self {
            StrategyKind::SpreadCapture { expected_spread_pct } => (
                format!("capture {expected_spread_pct}% spread on {}", ctx.symbol),
                ctx.notional_usd * expected_spread_pct / dec!(100),
            ),
            StrategyKind::YieldStaking { apr_pct } => (
                format!("stake {} notional at {apr_pct}% APR for one day", ctx.symbol),
                ctx.notional_usd * apr_pct / dec!(100) / dec!(365),
            ),
            StrategyKind::Lending { daily_rate_pct } => (
                format!("lend {} notional at {daily_rate_pct}%/day", ctx.symbol),
                ctx.notional_usd * daily_rate_pct / dec!(100),
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Strategy {
    pub strategy_id: String,
    pub name: String,
    pub description: String,
    pub kind: StrategyKind,
    pub enabled: bool,
    pub created_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryStats {
    pub total_strategies: usize,
    pub enabled_strategies: usize,
    pub disabled_strategies: usize,
    pub categories: Vec<String>,
    pub strategies_by_category: BTreeMap<String, usize>,
}

pub struct StrategyRegistry {
    strategies: BTreeMap<String, Strategy>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        info!("Strategy registry initialized");
        Self {
            strategies: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        strategy_id: &str,
        name: &str,
        description: &str,
        kind: StrategyKind,
    ) -> bool {
        if self.strategies.contains_key(strategy_id) {
            warn!("Strategy {} already exists", strategy_id);
            return false;
        }
        info!("Strategy registered: {} ({})", name, strategy_id);
        self.strategies.insert(
            strategy_id.to_string(),
            Strategy {
                strategy_id: strategy_id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
                kind,
                enabled: true,
                created_date: Utc::now(),
            },
        );
        true
    }

    pub fn set_enabled(&mut self, strategy_id: &str, enabled: bool) -> bool {
        match self.strategies.get_mut(strategy_id) {
            Some(strategy) => {
                strategy.enabled = enabled;
                info!(
                    "Strategy {} {}",
                    strategy_id,
                    if enabled { "enabled" } else { "disabled" }
                );
                true
            }
            None => {
                warn!("Strategy {} not found", strategy_id);
                false
            }
        }
    }

    /// Dispatch one strategy. Missing or disabled strategies are policy
    /// outcomes, reported as `None`.
    pub fn execute(&self, strategy_id: &str, ctx: &StrategyContext) -> Option<ExecutionResult> {
        let Some(strategy) = self.strategies.get(strategy_id) else {
            warn!("Strategy {} not found", strategy_id);
            return None;
        };
        if !strategy.enabled {
            warn!("Strategy {} is disabled", strategy_id);
            return None;
        }

        let (description, expected_return) = strategy.kind.run(ctx);
        info!("Strategy {} executed", strategy_id);
        Some(ExecutionResult {
            strategy_id: strategy_id.to_string(),
            description,
            expected_return_usd: expected_return,
        })
    }

    pub fn get(&self, strategy_id: &str) -> Option<&Strategy> {
        self.strategies.get(strategy_id)
    }

    pub fn enabled_strategies(&self, category: Option<&str>) -> Vec<&Strategy> {
        self.strategies
            .values()
            .filter(|s| s.enabled)
            .filter(|s| category.map_or(true, |c| s.kind.category() == c))
            .collect()
    }

    pub fn stats(&self) -> RegistryStats {
        let enabled = self.strategies.values().filter(|s| s.enabled).count();
        let categories: BTreeSet<String> = self
            .strategies
            .values()
            .map(|s| s.kind.category().to_string())
            .collect();
        let mut by_category = BTreeMap::new();
        for strategy in self.strategies.values() {
            *by_category
                .entry(strategy.kind.category().to_string())
                .or_insert(0) += 1;
        }
        RegistryStats {
            total_strategies: self.strategies.len(),
            enabled_strategies: enabled,
            disabled_strategies: self.strategies.len() - enabled,
            categories: categories.into_iter().collect(),
            strategies_by_category: by_category,
        }
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
