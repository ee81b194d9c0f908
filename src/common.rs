// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Common types of the client: the synced view model, the notification
//! surface, the error taxonomy, and unit conversion helpers.

use alloy::rpc::json_rpc;
use alloy_primitives::{
    utils::{format_ether, parse_ether, UnitsError},
    U256,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// EIP-1193 error code reported by wallets when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error)]
pub enum CampaignServiceError {
    /// No deployment record exists for the connected network. Fatal for the
    /// session; no contract calls are attempted.
    #[error("smart contract not deployed on network {0}")]
    MissingDeployment(u64),

    /// The provider exposes no account to act from.
    #[error("no accounts available from the provider")]
    NoAccounts,

    /// Address parsing error
    #[error(transparent)]
    FromHexError(#[from] alloy_primitives::hex::FromHexError),

    /// ABI decoding error
    #[error(transparent)]
    AbiError(#[from] alloy::sol_types::Error),

    /// RPC error
    #[error(transparent)]
    RpcError(#[from] json_rpc::RpcError<alloy::transports::TransportErrorKind>),

    /// URL parsing error
    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    /// `serde_json` error
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

/// The closed set of user-facing categories for a failed transaction.
///
/// The transport reports user cancellation, contract-level rejection and
/// infrastructure faults through one error shape; the notification surface
/// reacts differently to each, so submission APIs return this taxonomy
/// instead of raw transport errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TransactionFailure {
    /// The wallet reported that the user declined to sign.
    #[error("transaction rejected by user")]
    UserRejected,

    /// The transaction was submitted but reverted by the contract.
    #[error("transaction reverted")]
    Reverted,

    /// Anything else: transport faults, encoding issues, unknown codes.
    #[error("transaction failed")]
    Unknown,
}

impl TransactionFailure {
    /// Classifies a raw failure, in priority order: the wallet's rejection
    /// code wins, then a revert marker in the message, then unknown.
    pub fn classify(code: Option<i64>, message: &str) -> Self {
        if code == Some(USER_REJECTED_CODE) {
            return TransactionFailure::UserRejected;
        }
        if message.contains("revert") {
            return TransactionFailure::Reverted;
        }
        TransactionFailure::Unknown
    }
}

/// One synced crowdfunding campaign, denormalized for display.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Contract-assigned id, sequential from 1.
    pub id: u64,
    /// The owner's address, 0x-prefixed hex.
    pub owner: String,
    pub title: String,
    pub description: String,
    /// Funding goal in wei.
    pub goal: U256,
    /// Total collected so far, in wei.
    pub amount_collected: U256,
    /// Absolute deadline, Unix seconds.
    pub deadline: u64,
    pub cancelled: bool,
    /// Average rating, fixed point scaled by 100 (437 is 4.37 stars).
    pub avg_rating: u64,
    /// Donor entries, ranked by contribution size.
    pub donors: Vec<DonorEntry>,
}

impl Campaign {
    /// The goal as a decimal ether string.
    pub fn goal_ether(&self) -> String {
        format_amount(self.goal)
    }

    /// The collected total as a decimal ether string.
    pub fn amount_collected_ether(&self) -> String {
        format_amount(self.amount_collected)
    }

    /// The average rating as a two-decimal string, e.g. `"4.37"`.
    pub fn rating_display(&self) -> String {
        format!("{}.{:02}", self.avg_rating / 100, self.avg_rating % 100)
    }
}

/// A single `(donor, amount)` ledger entry. An address donating twice
/// appears twice; entries are never merged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorEntry {
    /// The donor's address, 0x-prefixed hex.
    pub donor: String,
    /// Contribution in wei.
    pub amount: U256,
}

impl DonorEntry {
    /// The contribution as a decimal ether string.
    pub fn amount_ether(&self) -> String {
        format_amount(self.amount)
    }
}

/// The derived view model: one bucket per lifecycle stage, each in
/// ascending-id order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignBuckets {
    pub active: Vec<Campaign>,
    pub completed: Vec<Campaign>,
    pub cancelled: Vec<Campaign>,
}

/// Severity tags understood by the notification surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Success,
    Warning,
    Info,
    Error,
}

/// A notification event for the (external) notification surface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }
}

/// Formats a wei amount as a decimal ether string with trailing zeros
/// trimmed, so `500000000000000000` becomes `"0.5"`.
pub fn format_amount(wei: U256) -> String {
    let formatted = format_ether(wei);
    match formatted.trim_end_matches('0').trim_end_matches('.') {
        "" => "0".to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Parses a decimal ether amount into wei. Exact fixed-point conversion;
/// more than 18 fractional digits is an error.
pub fn parse_amount(ether: &str) -> Result<U256, UnitsError> {
    parse_ether(ether.trim())
}
