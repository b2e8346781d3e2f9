//! Pool orchestrator
//!
//! Composes the pool components into one surface: membership, validator
//! onboarding, strategy registration, and profit settlement. Settlement
//! routes a slice of each realized profit into the insurance reserve
//! before splitting the remainder pro-rata across members.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::{
    CapitalPool, InsuranceReserve, MemberStatus, NetworkStats, PoolStats, RegistryStats,
    ReserveHealth, StrategyKind, StrategyRegistry, Validator, ValidatorNetwork, ValidatorRole,
};

/// Percent of each settled profit parked in the insurance reserve.
const RESERVE_PCT: Decimal = dec!(5);
const REQUIRED_APPROVALS: usize = 2;

/// One settlement pass over a batch of realized profit.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitSettlement {
    pub total_profit: Decimal,
    pub insurance_allocated: Decimal,
    pub distributed: Decimal,
    pub member_distribution: BTreeMap<String, Decimal>,
}

/// Aggregate snapshot across every pool component.
#[derive(Debug, Clone, Serialize)]
pub struct PoolOverview {
    pub pool: PoolStats,
    pub insurance: ReserveHealth,
    pub validators: NetworkStats,
    pub strategies: RegistryStats,
    pub total_profit_distributed: Decimal,
    pub total_trades_settled: u64,
    pub generated_at: DateTime<Utc>,
}

/// Per-member position derived from the pool's current share value.
#[derive(Debug, Clone, Serialize)]
pub struct MemberReport {
    pub address: String,
    pub capital_contributed: Decimal,
    pub shares_owned: Decimal,
    pub current_balance: Decimal,
    pub profit: Decimal,
    pub status: MemberStatus,
    pub joined_date: DateTime<Utc>,
}

pub struct PoolBot {
    pool: CapitalPool,
    registry: StrategyRegistry,
    insurance: InsuranceReserve,
    validators: ValidatorNetwork,
    total_profit_distributed: Decimal,
    total_trades_settled: u64,
}

impl PoolBot {
    pub fn new(
        pool_name: impl Into<String>,
        max_members: Option<usize>,
        min_contribution: Decimal,
    ) -> Self {
        let mut registry = StrategyRegistry::new();
        registry.register(
            "arbitrage_v1",
            "Arbitrage Trading",
            "cross-exchange spot arbitrage",
            StrategyKind::SpreadCapture {
                expected_spread_pct: dec!(0.5),
            },
        );

        info!("Pool bot initialized");
        Self {
            pool: CapitalPool::new(pool_name, max_members, min_contribution),
            registry,
            insurance: InsuranceReserve::new(Decimal::ZERO, RESERVE_PCT),
            validators: ValidatorNetwork::new(REQUIRED_APPROVALS, true),
            total_profit_distributed: Decimal::ZERO,
            total_trades_settled: 0,
        }
    }

    pub fn add_member(&mut self, address: &str, capital: Decimal) -> bool {
        self.pool.add_member(address, capital)
    }

    pub fn remove_member(&mut self, address: &str) -> bool {
        self.pool.remove_member(address)
    }

    pub fn add_validator(
        &mut self,
        validator_id: &str,
        role: ValidatorRole,
        address: Option<String>,
    ) -> bool {
        self.validators
            .add_validator(Validator::new(validator_id, role, address))
    }

    pub fn register_strategy(
        &mut self,
        strategy_id: &str,
        name: &str,
        description: &str,
        kind: StrategyKind,
    ) -> bool {
        self.registry.register(strategy_id, name, description, kind)
    }

    /// Settle a trading batch: the reserve takes its cut first, the rest
    /// is split across active members by share. Non-positive profit moves
    /// nothing.
    pub fn settle_profit(&mut self, trades: u64, total_profit: Decimal) -> ProfitSettlement {
        self.total_trades_settled += trades;

        if total_profit <= Decimal::ZERO {
            warn!("No positive profit to settle (${})", total_profit);
            return ProfitSettlement {
                total_profit,
                insurance_allocated: Decimal::ZERO,
                distributed: Decimal::ZERO,
                member_distribution: BTreeMap::new(),
            };
        }

        let insurance_allocated = self.insurance.allocate_profit(total_profit);
        let remaining = total_profit - insurance_allocated;
        let member_distribution = self.pool.distribute_profit(remaining);
        self.total_profit_distributed += remaining;

        info!(
            "Settled {} trade(s): ${} profit, ${} reserved, ${} distributed",
            trades, total_profit, insurance_allocated, remaining
        );
        ProfitSettlement {
            total_profit,
            insurance_allocated,
            distributed: remaining,
            member_distribution,
        }
    }

    pub fn overview(&self) -> PoolOverview {
        PoolOverview {
            pool: self.pool.stats(),
            insurance: self.insurance.health(),
            validators: self.validators.stats(),
            strategies: self.registry.stats(),
            total_profit_distributed: self.total_profit_distributed,
            total_trades_settled: self.total_trades_settled,
            generated_at: Utc::now(),
        }
    }

    pub fn member_report(&self, address: &str) -> Option<MemberReport> {
        let member = self.pool.member(address)?;
        let balance = self.pool.member_balance(address).unwrap_or_default();
        Some(MemberReport {
            address: member.address.clone(),
            capital_contributed: member.capital_contributed,
            shares_owned: member.shares_owned,
            current_balance: balance,
            profit: balance - member.capital_contributed,
            status: member.status,
            joined_date: member.joined_date,
        })
    }

    pub fn log_summary(&self) {
        crate::utils::print_pool_overview(&self.overview());
    }

    pub fn pool(&self) -> &CapitalPool {
        &self.pool
    }

    pub fn insurance(&self) -> &InsuranceReserve {
        &self.insurance
    }

    pub fn insurance_mut(&mut self) -> &mut InsuranceReserve {
        &mut self.insurance
    }

    pub fn validators(&self) -> &ValidatorNetwork {
        &self.validators
    }

    pub fn validators_mut(&mut self) -> &mut ValidatorNetwork {
        &mut self.validators
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }
}
