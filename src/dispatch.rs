// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! User-intent dispatch: local validation, transaction submission, and the
//! resynchronization that follows every successful write.

use std::collections::BTreeMap;

use alloy_primitives::U256;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::{
    client::{CampaignOperations, CampaignQueries, FieldUpdate},
    common::{parse_amount, Campaign, CampaignBuckets, Notification, TransactionFailure},
    lifecycle, sync,
};

/// The campaign fields the owner can edit in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CampaignField {
    Title,
    Description,
    Goal,
    Deadline,
}

impl CampaignField {
    fn label(self) -> &'static str {
        match self {
            CampaignField::Title => "title",
            CampaignField::Description => "description",
            CampaignField::Goal => "goal",
            CampaignField::Deadline => "deadline",
        }
    }
}

/// The create-campaign form fields, kept as entered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CreateDraft {
    pub title: String,
    pub description: String,
    /// Goal in ether, as typed.
    pub goal: String,
    /// Duration in seconds, as typed.
    pub duration: String,
}

/// The single in-flight edit: one field of one campaign.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    pub id: u64,
    pub field: CampaignField,
    pub value: String,
}

/// Transient per-session input state. Never persisted; cleared on submit or
/// cancel of the corresponding action.
#[derive(Clone, Debug, Default)]
pub struct DraftState {
    pub create: CreateDraft,
    donations: BTreeMap<u64, String>,
    ratings: BTreeMap<u64, u8>,
    hover: BTreeMap<u64, u8>,
    active_edit: Option<EditDraft>,
}

impl DraftState {
    /// Records the donation amount typed for a campaign.
    pub fn set_donation(&mut self, id: u64, amount: impl Into<String>) {
        self.donations.insert(id, amount.into());
    }

    /// The drafted donation amount for a campaign, defaulting to `"0"`.
    pub fn donation(&self, id: u64) -> &str {
        self.donations.get(&id).map(String::as_str).unwrap_or("0")
    }

    pub fn clear_donation(&mut self, id: u64) {
        self.donations.remove(&id);
    }

    /// Records the selected star rating for a campaign.
    pub fn set_rating(&mut self, id: u64, stars: u8) {
        self.ratings.insert(id, stars.clamp(1, 5));
    }

    pub fn rating(&self, id: u64) -> Option<u8> {
        self.ratings.get(&id).copied()
    }

    pub fn clear_rating(&mut self, id: u64) {
        self.ratings.remove(&id);
        self.hover.remove(&id);
    }

    /// Records the hovered star count; zero clears the preview.
    pub fn set_hover(&mut self, id: u64, stars: u8) {
        if stars == 0 {
            self.hover.remove(&id);
        } else {
            self.hover.insert(id, stars.clamp(1, 5));
        }
    }

    pub fn clear_hover(&mut self, id: u64) {
        self.hover.remove(&id);
    }

    /// The star count the widget should highlight: the hover preview when
    /// present, otherwise the committed selection.
    pub fn effective_rating(&self, id: u64) -> Option<u8> {
        self.hover.get(&id).copied().or_else(|| self.rating(id))
    }

    /// Starts editing one field of one campaign, replacing any previous
    /// edit target.
    pub fn open_edit(&mut self, id: u64, field: CampaignField) {
        self.active_edit = Some(EditDraft {
            id,
            field,
            value: String::new(),
        });
    }

    /// Updates the value of the active edit, if any.
    pub fn set_edit_value(&mut self, value: impl Into<String>) {
        if let Some(edit) = &mut self.active_edit {
            edit.value = value.into();
        }
    }

    pub fn active_edit(&self) -> Option<&EditDraft> {
        self.active_edit.as_ref()
    }

    /// Abandons the active edit without a chain call.
    pub fn close_edit(&mut self) {
        self.active_edit = None;
    }
}

/// Why a dispatched action did not go through.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A local precondition failed; no transaction was submitted.
    #[error("{0}")]
    Validation(String),

    /// The submitted transaction failed.
    #[error(transparent)]
    Transaction(#[from] TransactionFailure),
}

/// The client-side face of the CrowdFunding contract.
///
/// Owns the synced campaign list, the transient drafts, and the
/// notification stream, and turns user intents into transactions followed
/// by a full resync. Intents take `&mut self`, so no two writes can be in
/// flight for the same session.
pub struct CampaignClient<C> {
    chain: C,
    account: String,
    drafts: DraftState,
    campaigns: Vec<Campaign>,
    notifications: mpsc::UnboundedSender<Notification>,
}

impl<C> CampaignClient<C>
where
    C: CampaignQueries + CampaignOperations,
{
    /// Creates a client acting as `account`, returning the receiving end of
    /// its notification stream.
    pub fn new(
        chain: C,
        account: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (notifications, receiver) = mpsc::unbounded_channel();
        let client = Self {
            chain,
            account: account.into(),
            drafts: DraftState::default(),
            campaigns: Vec::new(),
            notifications,
        };
        (client, receiver)
    }

    /// The account this session acts as.
    pub fn account(&self) -> &str {
        &self.account
    }

    /// The underlying chain adapter.
    pub fn chain(&self) -> &C {
        &self.chain
    }

    /// The campaigns from the latest sync, in ascending-id order.
    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    pub fn drafts(&self) -> &DraftState {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftState {
        &mut self.drafts
    }

    /// Recomputes the display buckets for the given instant (Unix seconds).
    pub fn buckets_at(&self, now: u64) -> CampaignBuckets {
        lifecycle::classify(&self.campaigns, now)
    }

    /// Recomputes the display buckets for the current wall clock.
    pub fn buckets(&self) -> CampaignBuckets {
        self.buckets_at(unix_now())
    }

    /// Replaces the campaign list with a fresh full sync. The view model is
    /// never patched in place.
    pub async fn resync(&mut self) -> Result<(), <C as CampaignQueries>::Error> {
        self.campaigns = sync::sync_all(&self.chain).await?;
        Ok(())
    }

    /// Submits the create-campaign form. All fields come from the create
    /// draft; the draft is cleared on success.
    pub async fn create_campaign(&mut self) -> Result<(), ActionError> {
        let CreateDraft {
            title,
            description,
            goal,
            duration,
        } = self.drafts.create.clone();
        if title.is_empty() || goal.is_empty() || duration.is_empty() {
            return Err(self.warn("Please fill all campaign details!"));
        }
        let goal_wei = match parse_amount(&goal) {
            Ok(amount) => amount,
            Err(_) => return Err(self.warn("Please enter a valid goal amount!")),
        };
        let duration_seconds = match duration.trim().parse::<u64>() {
            Ok(seconds) => seconds,
            Err(_) => return Err(self.warn("Please enter a valid duration!")),
        };
        match self
            .chain
            .create_campaign(&title, &description, goal_wei, duration_seconds)
            .await
        {
            Ok(outcome) => {
                tracing::debug!(hash = %outcome.transaction_hash, "campaign created");
                self.drafts.create = CreateDraft::default();
                self.notify_success("Campaign created successfully!");
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => Err(self.report_failure(failure, "Failed to create campaign")),
        }
    }

    /// Donates the drafted amount to a campaign.
    pub async fn donate(&mut self, id: u64) -> Result<(), ActionError> {
        let amount = self.drafts.donation(id).to_string();
        let value = match parse_amount(&amount) {
            Ok(value) if value > U256::ZERO => value,
            _ => return Err(self.warn("Please enter a valid donation amount!")),
        };
        match self.chain.donate(id, value).await {
            Ok(outcome) => {
                tracing::debug!(id, hash = %outcome.transaction_hash, "donation mined");
                self.drafts.clear_donation(id);
                self.notify_success(format!("Donated {amount} ETH successfully!"));
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => Err(self.report_failure(failure, "Donation failed")),
        }
    }

    /// Cancels a campaign. Ownership is enforced by the contract; a
    /// non-owner attempt surfaces as a revert.
    pub async fn cancel_campaign(&mut self, id: u64) -> Result<(), ActionError> {
        match self.chain.cancel_campaign(id).await {
            Ok(_) => {
                self.emit(Notification::warning("Campaign cancelled and refunds issued!"));
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => Err(self.report_failure(failure, "Cancel failed")),
        }
    }

    /// Saves the active edit draft. Empty values are rejected locally; on
    /// success the draft is cleared and the view resynced.
    pub async fn save_edit(&mut self) -> Result<(), ActionError> {
        let Some(edit) = self.drafts.active_edit().cloned() else {
            return Err(self.warn("No field is being edited."));
        };
        if edit.value.is_empty() {
            return Err(self.warn("Please enter a value!"));
        }
        let update = match edit.field {
            CampaignField::Title => FieldUpdate::Title(edit.value.clone()),
            CampaignField::Description => FieldUpdate::Description(edit.value.clone()),
            CampaignField::Goal => match parse_amount(&edit.value) {
                Ok(goal) => FieldUpdate::Goal(goal),
                Err(_) => return Err(self.warn("Please enter a valid goal amount!")),
            },
            CampaignField::Deadline => match edit.value.trim().parse::<u64>() {
                Ok(seconds) => FieldUpdate::DeadlineExtension(seconds),
                Err(_) => return Err(self.warn("Please enter a valid extension in seconds!")),
            },
        };
        let label = edit.field.label();
        match self.chain.update_field(edit.id, update).await {
            Ok(_) => {
                self.notify_success(format!("{label} updated successfully!"));
                self.drafts.close_edit();
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => {
                Err(self.report_failure(failure, &format!("Failed to update {label}")))
            }
        }
    }

    /// Submits the drafted star rating for a campaign. The draft comes from
    /// prior star selection and is already in the 1..=5 range.
    pub async fn rate(&mut self, id: u64) -> Result<(), ActionError> {
        let Some(stars) = self.drafts.rating(id) else {
            return Err(self.warn("Please select a rating first!"));
        };
        match self.chain.rate_campaign(id, stars).await {
            Ok(_) => {
                self.drafts.clear_rating(id);
                self.notify_success("Thanks for rating!");
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => Err(self.report_failure(failure, "Rating failed")),
        }
    }

    /// Withdraws collected funds from an owned campaign. Ownership and a
    /// non-zero balance are checked against the synced view first, to avoid
    /// a needless failed transaction.
    pub async fn withdraw_funds(&mut self, id: u64) -> Result<(), ActionError> {
        let Some(campaign) = self.campaigns.iter().find(|campaign| campaign.id == id) else {
            return Err(self.warn("Unknown campaign."));
        };
        if campaign.owner != self.account {
            return Err(self.warn("Only the campaign owner can withdraw funds!"));
        }
        if campaign.amount_collected.is_zero() {
            return Err(self.warn("There are no funds to withdraw!"));
        }
        match self.chain.withdraw_funds(id).await {
            Ok(_) => {
                self.notify_success("Funds withdrawn successfully!");
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => Err(self.report_failure(failure, "Withdraw failed")),
        }
    }

    /// Claims the caller's refund from a campaign.
    pub async fn claim_refund(&mut self, id: u64) -> Result<(), ActionError> {
        match self.chain.claim_refund(id).await {
            Ok(_) => {
                self.notify_success("Refund claimed successfully!");
                self.resync_after_write().await;
                Ok(())
            }
            Err(failure) => Err(self.report_failure(failure, "Refund failed")),
        }
    }

    /// Refreshes the view after a successful write. A failed refresh keeps
    /// the previous view; the write itself already succeeded.
    async fn resync_after_write(&mut self) {
        if let Err(error) = self.resync().await {
            tracing::warn!(%error, "resync after write failed, keeping previous view");
        }
    }

    /// Translates a transaction failure into its notification. A user
    /// rejection is informational; everything else is an error carrying the
    /// action's context label.
    fn report_failure(&self, failure: TransactionFailure, context: &str) -> ActionError {
        match failure {
            TransactionFailure::UserRejected => {
                self.emit(Notification::info("Transaction rejected by user."));
            }
            TransactionFailure::Reverted => {
                self.emit(Notification::error(format!(
                    "{context}: Transaction reverted."
                )));
            }
            TransactionFailure::Unknown => {
                self.emit(Notification::error(format!("{context}.")));
            }
        }
        ActionError::Transaction(failure)
    }

    fn warn(&self, message: &str) -> ActionError {
        self.emit(Notification::warning(message));
        ActionError::Validation(message.to_string())
    }

    fn notify_success(&self, message: impl Into<String>) {
        self.emit(Notification::success(message));
    }

    fn emit(&self, notification: Notification) {
        // The receiver may be gone, e.g. in tests that only inspect state.
        let _ = self.notifications.send(notification);
    }
}

/// Current Unix time in seconds.
fn unix_now() -> u64 {
    std::time::SystemTime::UNIX_EPOCH
        .elapsed()
        .expect("system clock is before the Unix epoch")
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::{CampaignField, DraftState};

    #[test]
    fn donation_draft_defaults_to_zero() {
        let mut drafts = DraftState::default();
        assert_eq!(drafts.donation(7), "0");
        drafts.set_donation(7, "0.5");
        assert_eq!(drafts.donation(7), "0.5");
        drafts.clear_donation(7);
        assert_eq!(drafts.donation(7), "0");
    }

    #[test]
    fn hover_preview_wins_over_committed_rating() {
        let mut drafts = DraftState::default();
        assert_eq!(drafts.effective_rating(1), None);
        drafts.set_rating(1, 3);
        assert_eq!(drafts.effective_rating(1), Some(3));
        drafts.set_hover(1, 5);
        assert_eq!(drafts.effective_rating(1), Some(5));
        drafts.set_hover(1, 0);
        assert_eq!(drafts.effective_rating(1), Some(3));
        drafts.set_hover(1, 4);
        drafts.clear_hover(1);
        assert_eq!(drafts.effective_rating(1), Some(3));
    }

    #[test]
    fn ratings_clamp_to_five_stars() {
        let mut drafts = DraftState::default();
        drafts.set_rating(1, 9);
        assert_eq!(drafts.rating(1), Some(5));
    }

    #[test]
    fn one_edit_target_at_a_time() {
        let mut drafts = DraftState::default();
        drafts.open_edit(1, CampaignField::Title);
        drafts.set_edit_value("New title");
        drafts.open_edit(2, CampaignField::Goal);
        let edit = drafts.active_edit().unwrap();
        assert_eq!(edit.id, 2);
        assert_eq!(edit.field, CampaignField::Goal);
        assert!(edit.value.is_empty());
        drafts.close_edit();
        assert!(drafts.active_edit().is_none());
    }
}
