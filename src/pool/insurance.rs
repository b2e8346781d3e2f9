//! Insurance reserve for pooled funds
//!
//! A slice of every distributed profit is parked in a reserve that pays
//! out member loss claims. Payouts never exceed the reserve balance.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ClaimStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Serialize)]
pub struct InsuranceClaim {
    pub claim_id: String,
    pub member_address: String,
    pub loss_amount: Decimal,
    pub reason: String,
    pub status: ClaimStatus,
    pub claim_date: DateTime<Utc>,
    pub payout_amount: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReserveHealth {
    pub reserve_balance: Decimal,
    pub total_allocated: Decimal,
    pub total_paid: Decimal,
    pub pending_claims: usize,
    pub pending_amount: Decimal,
    /// None when there is nothing pending (unbounded coverage).
    pub coverage_ratio: Option<Decimal>,
    pub claim_approval_rate_pct: Decimal,
}

pub struct InsuranceReserve {
    reserve_balance: Decimal,
    /// Fraction of each profit allocation routed to the reserve, in
    /// percent (5 means 5%).
    reserve_percentage: Decimal,
    total_allocated: Decimal,
    total_claims_paid: Decimal,
    claims: BTreeMap<String, InsuranceClaim>,
}

impl InsuranceReserve {
    pub fn new(initial_reserve: Decimal, reserve_percentage: Decimal) -> Self {
        info!("Insurance reserve initialized with ${}", initial_reserve);
        Self {
            reserve_balance: initial_reserve,
            reserve_percentage,
            total_allocated: initial_reserve,
            total_claims_paid: Decimal::ZERO,
            claims: BTreeMap::new(),
        }
    }

    /// Route the configured percentage of a profit into the reserve,
    /// returning the allocated amount.
    pub fn allocate_profit(&mut self, profit_amount: Decimal) -> Decimal {
        let allocation = profit_amount * self.reserve_percentage / dec!(100);
        self.reserve_balance += allocation;
        self.total_allocated += allocation;
        info!(
            "Allocated ${} to insurance reserve (balance: ${})",
            allocation, self.reserve_balance
        );
        allocation
    }

    pub fn file_claim(
        &mut self,
        claim_id: &str,
        member_address: &str,
        loss_amount: Decimal,
        reason: &str,
    ) -> bool {
        if self.claims.contains_key(claim_id) {
            warn!("Claim {} already exists", claim_id);
            return false;
        }
        self.claims.insert(
            claim_id.to_string(),
            InsuranceClaim {
                claim_id: claim_id.to_string(),
                member_address: member_address.to_string(),
                loss_amount,
                reason: reason.to_string(),
                status: ClaimStatus::Pending,
                claim_date: Utc::now(),
                payout_amount: Decimal::ZERO,
            },
        );
        info!(
            "Claim {} filed by {} for ${}",
            claim_id, member_address, loss_amount
        );
        true
    }

    /// Approve and pay a pending claim. The payout is `payout_percentage`
    /// of the loss, capped at the reserve balance.
    pub fn approve_claim(&mut self, claim_id: &str, payout_percentage: Decimal) -> bool {
        let Some(claim) = self.claims.get_mut(claim_id) else {
            warn!("Claim {} not found", claim_id);
            return false;
        };
        if claim.status != ClaimStatus::Pending {
            warn!("Claim {} is not pending", claim_id);
            return false;
        }

        let mut payout = claim.loss_amount * payout_percentage / dec!(100);
        if payout > self.reserve_balance {
            warn!(
                "Insufficient reserve balance. Required: ${}, Available: ${}",
                payout, self.reserve_balance
            );
            payout = self.reserve_balance;
        }

        claim.status = ClaimStatus::Approved;
        claim.payout_amount = payout;
        self.reserve_balance -= payout;
        self.total_claims_paid += payout;

        info!("Claim {} approved for ${} payout", claim_id, payout);
        true
    }

    pub fn deny_claim(&mut self, claim_id: &str, reason: &str) -> bool {
        let Some(claim) = self.claims.get_mut(claim_id) else {
            warn!("Claim {} not found", claim_id);
            return false;
        };
        claim.status = ClaimStatus::Denied;
        info!("Claim {} denied. Reason: {}", claim_id, reason);
        true
    }

    pub fn health(&self) -> ReserveHealth {
        let pending: Vec<&InsuranceClaim> = self
            .claims
            .values()
            .filter(|c| c.status == ClaimStatus::Pending)
            .collect();
        let pending_amount: Decimal = pending.iter().map(|c| c.loss_amount).sum();
        let approved = self
            .claims
            .values()
            .filter(|c| c.status == ClaimStatus::Approved)
            .count();

        ReserveHealth {
            reserve_balance: self.reserve_balance,
            total_allocated: self.total_allocated,
            total_paid: self.total_claims_paid,
            pending_claims: pending.len(),
            pending_amount,
            coverage_ratio: if pending_amount.is_zero() {
                None
            } else {
                Some(self.reserve_balance / pending_amount)
            },
            claim_approval_rate_pct: if self.claims.is_empty() {
                Decimal::ZERO
            } else {
                Decimal::from(approved) / Decimal::from(self.claims.len()) * dec!(100)
            },
        }
    }

    pub fn claims(&self, status_filter: Option<ClaimStatus>) -> Vec<&InsuranceClaim> {
        self.claims
            .values()
            .filter(|c| status_filter.map_or(true, |s| c.status == s))
            .collect()
    }

    pub fn reserve_balance(&self) -> Decimal {
        self.reserve_balance
    }
}
