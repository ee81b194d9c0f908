// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed interface to the deployed CrowdFunding contract.

use alloy::sol;
use alloy_primitives::U256;
use async_trait::async_trait;

use crate::common::TransactionFailure;

sol! {
    contract CrowdFunding {
        function campaignCount() external view returns (uint256 count);
        function getCampaign(uint256 id) external view returns (
            address owner,
            string title,
            string description,
            uint256 goal,
            uint256 amountCollected,
            uint256 deadline,
            bool cancelled
        );
        function getDonors(uint256 id) external view returns (address[] donors, uint256[] amounts);
        function getAverageRating(uint256 id) external view returns (uint256 rating);

        function createCampaign(string title, string description, uint256 goal, uint256 duration) external;
        function donate(uint256 id) external payable;
        function cancelCampaign(uint256 id) external;
        function updateTitle(uint256 id, string newTitle) external;
        function updateDescription(uint256 id, string newDescription) external;
        function updateGoal(uint256 id, uint256 newGoal) external;
        function extendDeadline(uint256 id, uint256 extraSeconds) external;
        function rateCampaign(uint256 id, uint8 rating) external;
        function withdrawFunds(uint256 id) external;
        function claimRefund(uint256 id) external;
    }
}

/// The raw on-chain campaign record, as returned by `getCampaign`.
#[derive(Clone, Debug)]
pub struct CampaignRecord {
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
}

/// The raw donor ledger of one campaign: two parallel columns. A side that
/// did not decode as an array is `None`; the ranker tolerates that shape by
/// producing an empty ranking.
#[derive(Clone, Debug, Default)]
pub struct DonorLedger {
    pub donors: Option<Vec<String>>,
    pub amounts: Option<Vec<U256>>,
}

impl DonorLedger {
    /// A well-formed ledger from parallel columns.
    pub fn new(donors: Vec<String>, amounts: Vec<U256>) -> Self {
        Self {
            donors: Some(donors),
            amounts: Some(amounts),
        }
    }
}

/// Summary of a mined transaction, returned by every write operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionOutcome {
    pub transaction_hash: String,
    pub block_number: Option<u64>,
}

/// A single-field campaign update, mapped onto the corresponding contract
/// method by the adapter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldUpdate {
    Title(String),
    Description(String),
    /// New goal in wei.
    Goal(U256),
    /// Deadline extension in seconds.
    DeadlineExtension(u64),
}

/// Read-only queries against the CrowdFunding contract.
///
/// All monetary values crossing this boundary are wei; conversion to a
/// decimal display unit happens in the layers above.
#[async_trait]
pub trait CampaignQueries {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Reads the total number of campaigns ever created.
    async fn campaign_count(&self) -> Result<u64, Self::Error>;

    /// Reads the stored record of one campaign.
    async fn get_campaign(&self, id: u64) -> Result<CampaignRecord, Self::Error>;

    /// Reads the donor ledger of one campaign.
    async fn get_donors(&self, id: u64) -> Result<DonorLedger, Self::Error>;

    /// Reads the average rating of one campaign, scaled by 100.
    async fn get_average_rating(&self, id: u64) -> Result<u64, Self::Error>;
}

/// State-changing operations against the CrowdFunding contract.
///
/// Each call suspends until the transaction is mined or rejected and
/// reports failures as the closed [`TransactionFailure`] taxonomy.
#[async_trait]
pub trait CampaignOperations {
    /// Creates a campaign with the given goal (wei) and duration (seconds).
    async fn create_campaign(
        &self,
        title: &str,
        description: &str,
        goal: U256,
        duration: u64,
    ) -> Result<TransactionOutcome, TransactionFailure>;

    /// Donates `value` wei to a campaign.
    async fn donate(&self, id: u64, value: U256) -> Result<TransactionOutcome, TransactionFailure>;

    /// Cancels a campaign, refunding its donors.
    async fn cancel_campaign(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure>;

    /// Applies a single-field update to a campaign.
    async fn update_field(
        &self,
        id: u64,
        update: FieldUpdate,
    ) -> Result<TransactionOutcome, TransactionFailure>;

    /// Rates a campaign with 1 to 5 stars.
    async fn rate_campaign(
        &self,
        id: u64,
        rating: u8,
    ) -> Result<TransactionOutcome, TransactionFailure>;

    /// Withdraws the collected funds of an owned campaign.
    async fn withdraw_funds(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure>;

    /// Claims the caller's refund from a campaign.
    async fn claim_refund(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure>;
}
