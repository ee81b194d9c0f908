// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory stand-in for the deployed CrowdFunding contract, for tests.

use std::collections::BTreeSet;

use alloy_primitives::U256;
use async_lock::Mutex;
use async_trait::async_trait;
use thiserror::Error;

use crate::{
    client::{
        CampaignOperations, CampaignQueries, CampaignRecord, DonorLedger, FieldUpdate,
        TransactionOutcome,
    },
    common::TransactionFailure,
};

/// Error returned by the mock chain's reads.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MockChainError {
    #[error("no campaign with id {0}")]
    UnknownCampaign(u64),

    #[error("injected read failure for campaign {0}")]
    InjectedFailure(u64),
}

#[derive(Clone, Debug, Default)]
struct StoredCampaign {
    owner: String,
    title: String,
    description: String,
    goal: U256,
    amount_collected: U256,
    deadline: u64,
    cancelled: bool,
    withdrawn: bool,
    donors: Vec<(String, U256)>,
    rating_total: u64,
    rating_count: u64,
}

impl StoredCampaign {
    fn average_rating(&self) -> u64 {
        if self.rating_count == 0 {
            0
        } else {
            self.rating_total * 100 / self.rating_count
        }
    }
}

#[derive(Debug, Default)]
struct MockChainState {
    sender: String,
    now: u64,
    campaigns: Vec<StoredCampaign>,
    failing_records: BTreeSet<u64>,
    failing_ratings: BTreeSet<u64>,
    malformed_ledgers: BTreeSet<u64>,
    next_write_failure: Option<TransactionFailure>,
    transaction_counter: u64,
}

impl MockChainState {
    fn campaign(&self, id: u64) -> Result<&StoredCampaign, MockChainError> {
        id.checked_sub(1)
            .and_then(|index| self.campaigns.get(index as usize))
            .ok_or(MockChainError::UnknownCampaign(id))
    }

    // Writes against a missing campaign revert, as the contract would.
    fn campaign_mut(&mut self, id: u64) -> Result<&mut StoredCampaign, TransactionFailure> {
        id.checked_sub(1)
            .and_then(|index| self.campaigns.get_mut(index as usize))
            .ok_or(TransactionFailure::Reverted)
    }

    fn outcome(&mut self) -> TransactionOutcome {
        self.transaction_counter += 1;
        TransactionOutcome {
            transaction_hash: format!("{:#066x}", self.transaction_counter),
            block_number: Some(self.transaction_counter),
        }
    }
}

/// An in-memory mock of the deployed contract. Reads and writes go through
/// the same traits as the HTTP adapter, with hooks to inject read failures,
/// malformed ledgers, and transaction failures.
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<MockChainState>,
}

impl MockChain {
    /// Creates a mock chain whose transactions are sent from `sender`.
    pub fn new(sender: impl Into<String>) -> Self {
        let chain = MockChain::default();
        {
            let mut state = chain.state.try_lock().expect("fresh mock is unlocked");
            state.sender = sender.into();
        }
        chain
    }

    /// Switches the account subsequent transactions are sent from.
    pub async fn set_sender(&self, sender: impl Into<String>) {
        self.state.lock().await.sender = sender.into();
    }

    /// Sets the mock chain clock, in Unix seconds.
    pub async fn set_now(&self, now: u64) {
        self.state.lock().await.now = now;
    }

    /// Makes every record and ledger read of `id` fail until cleared.
    pub async fn fail_campaign_read(&self, id: u64) {
        self.state.lock().await.failing_records.insert(id);
    }

    pub async fn clear_campaign_read_failure(&self, id: u64) {
        self.state.lock().await.failing_records.remove(&id);
    }

    /// Makes the rating read of `id` fail.
    pub async fn fail_rating_read(&self, id: u64) {
        self.state.lock().await.failing_ratings.insert(id);
    }

    /// Makes the donor ledger of `id` come back with a malformed side.
    pub async fn malform_ledger(&self, id: u64) {
        self.state.lock().await.malformed_ledgers.insert(id);
    }

    /// Makes the next write fail with the given category.
    pub async fn fail_next_write(&self, failure: TransactionFailure) {
        self.state.lock().await.next_write_failure = Some(failure);
    }

    /// Inserts a campaign directly, bypassing the transaction path.
    /// Returns its id.
    pub async fn seed_campaign(
        &self,
        owner: &str,
        title: &str,
        goal: U256,
        deadline: u64,
    ) -> u64 {
        let mut state = self.state.lock().await;
        state.campaigns.push(StoredCampaign {
            owner: owner.to_string(),
            title: title.to_string(),
            goal,
            deadline,
            ..StoredCampaign::default()
        });
        state.campaigns.len() as u64
    }

    /// Records a donation directly, bypassing the transaction path.
    pub async fn seed_donation(&self, id: u64, donor: &str, amount: U256) {
        let mut state = self.state.lock().await;
        let campaign = state
            .campaign_mut(id)
            .expect("seeding a donation for a missing campaign");
        campaign.donors.push((donor.to_string(), amount));
        campaign.amount_collected += amount;
    }

    async fn begin_write(&self) -> Result<(), TransactionFailure> {
        let mut state = self.state.lock().await;
        match state.next_write_failure.take() {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CampaignQueries for MockChain {
    type Error = MockChainError;

    async fn campaign_count(&self) -> Result<u64, Self::Error> {
        Ok(self.state.lock().await.campaigns.len() as u64)
    }

    async fn get_campaign(&self, id: u64) -> Result<CampaignRecord, Self::Error> {
        let state = self.state.lock().await;
        if state.failing_records.contains(&id) {
            return Err(MockChainError::InjectedFailure(id));
        }
        let stored = state.campaign(id)?;
        Ok(CampaignRecord {
            owner: stored.owner.clone(),
            title: stored.title.clone(),
            description: stored.description.clone(),
            goal: stored.goal,
            amount_collected: stored.amount_collected,
            deadline: stored.deadline,
            cancelled: stored.cancelled,
        })
    }

    async fn get_donors(&self, id: u64) -> Result<DonorLedger, Self::Error> {
        let state = self.state.lock().await;
        if state.failing_records.contains(&id) {
            return Err(MockChainError::InjectedFailure(id));
        }
        let stored = state.campaign(id)?;
        let amounts = stored.donors.iter().map(|(_, amount)| *amount).collect();
        if state.malformed_ledgers.contains(&id) {
            return Ok(DonorLedger {
                donors: None,
                amounts: Some(amounts),
            });
        }
        Ok(DonorLedger::new(
            stored.donors.iter().map(|(donor, _)| donor.clone()).collect(),
            amounts,
        ))
    }

    async fn get_average_rating(&self, id: u64) -> Result<u64, Self::Error> {
        let state = self.state.lock().await;
        if state.failing_ratings.contains(&id) {
            return Err(MockChainError::InjectedFailure(id));
        }
        Ok(state.campaign(id)?.average_rating())
    }
}

#[async_trait]
impl CampaignOperations for MockChain {
    async fn create_campaign(
        &self,
        title: &str,
        description: &str,
        goal: U256,
        duration: u64,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let campaign = StoredCampaign {
            owner: state.sender.clone(),
            title: title.to_string(),
            description: description.to_string(),
            goal,
            deadline: state.now + duration,
            ..StoredCampaign::default()
        };
        state.campaigns.push(campaign);
        Ok(state.outcome())
    }

    async fn donate(&self, id: u64, value: U256) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let now = state.now;
        let sender = state.sender.clone();
        let campaign = state.campaign_mut(id)?;
        if campaign.cancelled || campaign.deadline <= now || value.is_zero() {
            return Err(TransactionFailure::Reverted);
        }
        campaign.donors.push((sender, value));
        campaign.amount_collected += value;
        Ok(state.outcome())
    }

    async fn cancel_campaign(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let sender = state.sender.clone();
        let campaign = state.campaign_mut(id)?;
        if campaign.owner != sender || campaign.cancelled {
            return Err(TransactionFailure::Reverted);
        }
        campaign.cancelled = true;
        Ok(state.outcome())
    }

    async fn update_field(
        &self,
        id: u64,
        update: FieldUpdate,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let sender = state.sender.clone();
        let campaign = state.campaign_mut(id)?;
        if campaign.owner != sender {
            return Err(TransactionFailure::Reverted);
        }
        match update {
            FieldUpdate::Title(value) => campaign.title = value,
            FieldUpdate::Description(value) => campaign.description = value,
            FieldUpdate::Goal(value) => campaign.goal = value,
            FieldUpdate::DeadlineExtension(seconds) => campaign.deadline += seconds,
        }
        Ok(state.outcome())
    }

    async fn rate_campaign(
        &self,
        id: u64,
        rating: u8,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let campaign = state.campaign_mut(id)?;
        if !(1..=5).contains(&rating) {
            return Err(TransactionFailure::Reverted);
        }
        campaign.rating_total += u64::from(rating);
        campaign.rating_count += 1;
        Ok(state.outcome())
    }

    async fn withdraw_funds(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let sender = state.sender.clone();
        let campaign = state.campaign_mut(id)?;
        if campaign.owner != sender
            || campaign.cancelled
            || campaign.withdrawn
            || campaign.amount_collected.is_zero()
        {
            return Err(TransactionFailure::Reverted);
        }
        campaign.withdrawn = true;
        Ok(state.outcome())
    }

    async fn claim_refund(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure> {
        self.begin_write().await?;
        let mut state = self.state.lock().await;
        let sender = state.sender.clone();
        let campaign = state.campaign_mut(id)?;
        if !campaign.cancelled {
            return Err(TransactionFailure::Reverted);
        }
        let refund: U256 = campaign
            .donors
            .iter()
            .filter(|(donor, _)| *donor == sender)
            .map(|(_, amount)| *amount)
            .fold(U256::ZERO, |total, amount| total + amount);
        if refund.is_zero() {
            return Err(TransactionFailure::Reverted);
        }
        campaign.donors.retain(|(donor, _)| *donor != sender);
        campaign.amount_collected -= refund;
        Ok(state.outcome())
    }
}
