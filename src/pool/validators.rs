//! Multi-party trade approval
//!
//! Pending trades need a quorum of validator approvals before they may
//! proceed; the quorum can require at least one Lead or Admin signer. Any
//! single rejection sinks the trade.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ValidatorRole {
    Junior,
    Senior,
    Lead,
    Admin,
}

impl ValidatorRole {
    fn is_lead(self) -> bool {
        matches!(self, ValidatorRole::Lead | ValidatorRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Validator {
    pub validator_id: String,
    pub role: ValidatorRole,
    pub address: Option<String>,
    pub approvals_count: u32,
    pub rejections_count: u32,
    pub approval_rate_pct: Decimal,
    pub active: bool,
    pub created_date: DateTime<Utc>,
}

impl Validator {
    pub fn new(validator_id: &str, role: ValidatorRole, address: Option<String>) -> Self {
        Self {
            validator_id: validator_id.to_string(),
            role,
            address,
            approvals_count: 0,
            rejections_count: 0,
            approval_rate_pct: dec!(100),
            active: true,
            created_date: Utc::now(),
        }
    }

    fn record_vote(&mut self, approved: bool) {
        if approved {
            self.approvals_count += 1;
        } else {
            self.rejections_count += 1;
        }
        let total = self.approvals_count + self.rejections_count;
        self.approval_rate_pct =
            Decimal::from(self.approvals_count) / Decimal::from(total) * dec!(100);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReviewStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct Vote {
    pub at: DateTime<Utc>,
    pub role: ValidatorRole,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TradeReview {
    pub trade_data: serde_json::Value,
    pub submitted_at: DateTime<Utc>,
    pub approvals: BTreeMap<String, Vote>,
    pub rejections: BTreeMap<String, Vote>,
    pub status: ReviewStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkStats {
    pub total_validators: usize,
    pub active_validators: usize,
    pub pending_trades: usize,
    pub approved_trades: usize,
    pub rejected_trades: usize,
    pub validators: Vec<Validator>,
}

pub struct ValidatorNetwork {
    validators: BTreeMap<String, Validator>,
    required_approvals: usize,
    require_lead_approval: bool,
    reviews: BTreeMap<String, TradeReview>,
}

impl ValidatorNetwork {
    pub fn new(required_approvals: usize, require_lead_approval: bool) -> Self {
        info!(
            "Validator network initialized (required_approvals: {})",
            required_approvals
        );
        Self {
            validators: BTreeMap::new(),
            required_approvals,
            require_lead_approval,
            reviews: BTreeMap::new(),
        }
    }

    pub fn add_validator(&mut self, validator: Validator) -> bool {
        if self.validators.contains_key(&validator.validator_id) {
            warn!("Validator {} already exists", validator.validator_id);
            return false;
        }
        info!(
            "Validator {} added with role {:?}",
            validator.validator_id, validator.role
        );
        self.validators
            .insert(validator.validator_id.clone(), validator);
        true
    }

    pub fn remove_validator(&mut self, validator_id: &str) -> bool {
        if self.validators.remove(validator_id).is_none() {
            warn!("Validator {} not found", validator_id);
            return false;
        }
        info!("Validator {} removed", validator_id);
        true
    }

    pub fn submit_trade(&mut self, trade_id: &str, trade_data: serde_json::Value) -> bool {
        if self.reviews.contains_key(trade_id) {
            warn!("Trade {} already submitted", trade_id);
            return false;
        }
        self.reviews.insert(
            trade_id.to_string(),
            TradeReview {
                trade_data,
                submitted_at: Utc::now(),
                approvals: BTreeMap::new(),
                rejections: BTreeMap::new(),
                status: ReviewStatus::Pending,
            },
        );
        info!("Trade {} submitted for validation", trade_id);
        true
    }

    /// Record an approval; returns `true` once the trade has reached its
    /// full quorum (including the lead requirement, when configured).
    pub fn approve_trade(&mut self, trade_id: &str, validator_id: &str, notes: &str) -> bool {
        let Some(validator) = self.validators.get_mut(validator_id) else {
            warn!("Validator {} not found", validator_id);
            return false;
        };
        let Some(review) = self.reviews.get_mut(trade_id) else {
            warn!("Trade {} not found", trade_id);
            return false;
        };

        review.approvals.insert(
            validator_id.to_string(),
            Vote {
                at: Utc::now(),
                role: validator.role,
                notes: notes.to_string(),
            },
        );
        validator.record_vote(true);
        info!("Trade {} approved by {}", trade_id, validator_id);

        if review.approvals.len() < self.required_approvals {
            return false;
        }
        if self.require_lead_approval
            && !review.approvals.values().any(|v| v.role.is_lead())
        {
            warn!("Trade {} needs lead validator approval", trade_id);
            return false;
        }

        review.status = ReviewStatus::Approved;
        info!("Trade {} has all required approvals", trade_id);
        true
    }

    pub fn reject_trade(&mut self, trade_id: &str, validator_id: &str, reason: &str) -> bool {
        let Some(validator) = self.validators.get_mut(validator_id) else {
            warn!("Validator {} not found", validator_id);
            return false;
        };
        let Some(review) = self.reviews.get_mut(trade_id) else {
            warn!("Trade {} not found", trade_id);
            return false;
        };

        review.rejections.insert(
            validator_id.to_string(),
            Vote {
                at: Utc::now(),
                role: validator.role,
                notes: reason.to_string(),
            },
        );
        validator.record_vote(false);
        review.status = ReviewStatus::Rejected;

        info!("Trade {} rejected by {}. Reason: {}", trade_id, validator_id, reason);
        true
    }

    pub fn review(&self, trade_id: &str) -> Option<&TradeReview> {
        self.reviews.get(trade_id)
    }

    pub fn pending_trades(&self) -> Vec<(&str, &TradeReview)> {
        self.reviews
            .iter()
            .filter(|(_, r)| r.status == ReviewStatus::Pending)
            .map(|(id, r)| (id.as_str(), r))
            .collect()
    }

    pub fn stats(&self) -> NetworkStats {
        let by_status = |status: ReviewStatus| {
            self.reviews.values().filter(|r| r.status == status).count()
        };
        NetworkStats {
            total_validators: self.validators.len(),
            active_validators: self.validators.values().filter(|v| v.active).count(),
            pending_trades: by_status(ReviewStatus::Pending),
            approved_trades: by_status(ReviewStatus::Approved),
            rejected_trades: by_status(ReviewStatus::Rejected),
            validators: self.validators.values().cloned().collect(),
        }
    }
}
