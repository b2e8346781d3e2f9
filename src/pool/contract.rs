//! Pooled-capital share accounting
//!
//! In-memory bookkeeping for a shared trading pool: members contribute
//! capital, receive shares 1:1 at entry, and profits are split pro-rata
//! across active shares. Withdrawals pay out at the current share value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MemberStatus {
    Active,
    Inactive,
    Withdrawn,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolMember {
    pub address: String,
    pub capital_contributed: Decimal,
    pub shares_owned: Decimal,
    pub joined_date: DateTime<Utc>,
    pub status: MemberStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct PoolStats {
    pub pool_name: String,
    pub total_members: usize,
    pub active_members: usize,
    pub total_capital: Decimal,
    pub total_shares: Decimal,
    pub pool_balance: Decimal,
    pub share_value: Decimal,
    pub profit_generated: Decimal,
    pub roi_percentage: Decimal,
    pub member_limit: Option<usize>,
    pub min_contribution: Decimal,
    pub created_date: DateTime<Utc>,
}

pub struct CapitalPool {
    pool_name: String,
    max_members: Option<usize>,
    min_contribution: Decimal,
    members: BTreeMap<String, PoolMember>,
    total_capital: Decimal,
    total_shares: Decimal,
    pool_balance: Decimal,
    created_date: DateTime<Utc>,
}

impl CapitalPool {
    pub fn new(
        pool_name: impl Into<String>,
        max_members: Option<usize>,
        min_contribution: Decimal,
    ) -> Self {
        let pool_name = pool_name.into();
        info!("Pool initialized: {}", pool_name);
        Self {
            pool_name,
            max_members,
            min_contribution,
            members: BTreeMap::new(),
            total_capital: Decimal::ZERO,
            total_shares: Decimal::ZERO,
            pool_balance: Decimal::ZERO,
            created_date: Utc::now(),
        }
    }

    /// Admit a member. Rejections (duplicate, below minimum, pool full) are
    /// policy outcomes, not errors.
    pub fn add_member(&mut self, address: &str, capital: Decimal) -> bool {
        if self.members.contains_key(address) {
            warn!("Member {} already exists", address);
            return false;
        }
        if capital < self.min_contribution {
            warn!(
                "Capital ${} below minimum ${}",
                capital, self.min_contribution
            );
            return false;
        }
        if let Some(max) = self.max_members {
            if self.members.len() >= max {
                warn!("Pool at maximum capacity ({} members)", max);
                return false;
            }
        }

        // Shares are issued 1:1 with contributed capital.
        let shares = capital;
        self.members.insert(
            address.to_string(),
            PoolMember {
                address: address.to_string(),
                capital_contributed: capital,
                shares_owned: shares,
                joined_date: Utc::now(),
                status: MemberStatus::Active,
            },
        );
        self.total_capital += capital;
        self.total_shares += shares;
        self.pool_balance += capital;

        info!(
            "Member {} added with ${} capital and {} shares",
            address, capital, shares
        );
        true
    }

    /// Withdraw a member at the current share value.
    pub fn remove_member(&mut self, address: &str) -> bool {
        let share_value = self.share_value();
        let Some(member) = self.members.get_mut(address) else {
            warn!("Member {} not found", address);
            return false;
        };

        let withdrawal = member.shares_owned * share_value;
        member.status = MemberStatus::Withdrawn;

        self.total_capital -= member.capital_contributed;
        self.total_shares -= member.shares_owned;
        self.pool_balance -= withdrawal;

        info!("Member {} withdrawn with ${}", address, withdrawal);
        true
    }

    /// Split `profit_amount` across active members by share ownership and
    /// credit it to the pool balance. Returns each member's cut.
    pub fn distribute_profit(&mut self, profit_amount: Decimal) -> BTreeMap<String, Decimal> {
        let mut distribution = BTreeMap::new();
        if self.total_shares.is_zero() {
            warn!("No shares to distribute profit");
            return distribution;
        }

        for (address, member) in &self.members {
            if member.status == MemberStatus::Active {
                let cut = profit_amount * member.shares_owned / self.total_shares;
                distribution.insert(address.clone(), cut);
                self.pool_balance += cut;
            }
        }

        info!(
            "Distributed ${} profit among {} members",
            profit_amount,
            distribution.len()
        );
        distribution
    }

    /// Current balance attributable to one member.
    pub fn member_balance(&self, address: &str) -> Option<Decimal> {
        let member = self.members.get(address)?;
        Some(member.shares_owned * self.share_value())
    }

    pub fn share_value(&self) -> Decimal {
        if self.total_shares.is_zero() {
            Decimal::ZERO
        } else {
            self.pool_balance / self.total_shares
        }
    }

    pub fn stats(&self) -> PoolStats {
        let active = self
            .members
            .values()
            .filter(|m| m.status == MemberStatus::Active)
            .count();
        let profit = self.pool_balance - self.total_capital;
        PoolStats {
            pool_name: self.pool_name.clone(),
            total_members: self.members.len(),
            active_members: active,
            total_capital: self.total_capital,
            total_shares: self.total_shares,
            pool_balance: self.pool_balance,
            share_value: self.share_value(),
            profit_generated: profit,
            roi_percentage: if self.total_capital.is_zero() {
                Decimal::ZERO
            } else {
                profit / self.total_capital * Decimal::from(100)
            },
            member_limit: self.max_members,
            min_contribution: self.min_contribution,
            created_date: self.created_date,
        }
    }

    pub fn member(&self, address: &str) -> Option<&PoolMember> {
        self.members.get(address)
    }

    pub fn members(&self) -> impl Iterator<Item = &PoolMember> {
        self.members.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rejects_duplicates_small_contributions_and_overflow() {
        let mut pool = CapitalPool::new("test-pool", Some(2), dec!(100));

        assert!(pool.add_member("alice", dec!(500)));
        assert!(!pool.add_member("alice", dec!(500)));
        assert!(!pool.add_member("bob", dec!(50)));
        assert!(pool.add_member("bob", dec!(100)));
        assert!(!pool.add_member("carol", dec!(1000)));

        let stats = pool.stats();
        assert_eq!(stats.total_members, 2);
        assert_eq!(stats.total_capital, dec!(600));
        assert_eq!(stats.share_value, dec!(1));
    }

    #[test]
    fn profit_splits_pro_rata_by_shares() {
        let mut pool = CapitalPool::new("test-pool", None, dec!(100));
        pool.add_member("alice", dec!(750));
        pool.add_member("bob", dec!(250));

        let distribution = pool.distribute_profit(dec!(100));
        assert_eq!(distribution["alice"], dec!(75));
        assert_eq!(distribution["bob"], dec!(25));

        let stats = pool.stats();
        assert_eq!(stats.pool_balance, dec!(1100));
        assert_eq!(stats.profit_generated, dec!(100));
        assert_eq!(stats.roi_percentage, dec!(10));
        assert_eq!(pool.member_balance("alice"), Some(dec!(825)));
    }

    #[test]
    fn withdrawal_pays_current_share_value() {
        let mut pool = CapitalPool::new("test-pool", None, dec!(100));
        pool.add_member("alice", dec!(500));
        pool.add_member("bob", dec!(500));
        pool.distribute_profit(dec!(200));

        // share value = 1200 / 1000 = 1.2; alice holds 500 shares
        assert!(pool.remove_member("alice"));
        assert!(!pool.remove_member("nobody"));

        let stats = pool.stats();
        assert_eq!(stats.active_members, 1);
        assert_eq!(stats.pool_balance, dec!(600));
        assert_eq!(stats.total_shares, dec!(500));
    }

    #[test]
    fn empty_pool_distributes_nothing() {
        let mut pool = CapitalPool::new("test-pool", None, dec!(100));
        assert!(pool.distribute_profit(dec!(100)).is_empty());
        assert_eq!(pool.share_value(), Decimal::ZERO);
    }
}
