// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::U256;
use assert_matches::assert_matches;
use decrowdfund_client::{
    common::{parse_amount, Notification, Severity, TransactionFailure},
    dispatch::{ActionError, CampaignClient, CampaignField},
    sync,
    test_utils::MockChain,
};
use test_log::test;
use tokio::sync::mpsc::UnboundedReceiver;

const ALICE: &str = "0xa11ce00000000000000000000000000000000001";
const BOB: &str = "0xb0b0000000000000000000000000000000000002";
const NOW: u64 = 1_000_000;

fn drain(receiver: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut notifications = Vec::new();
    while let Ok(notification) = receiver.try_recv() {
        notifications.push(notification);
    }
    notifications
}

#[test(tokio::test)]
async fn sync_skips_campaigns_that_fail_to_read() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    for index in 0..5 {
        chain
            .seed_campaign(ALICE, &format!("campaign {index}"), U256::from(10), NOW + 100)
            .await;
    }
    chain.fail_campaign_read(3).await;

    let campaigns = sync::sync_all(&chain).await?;
    let ids: Vec<_> = campaigns.iter().map(|campaign| campaign.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    // A later resync recovers the campaign once the read works again.
    chain.clear_campaign_read_failure(3).await;
    let campaigns = sync::sync_all(&chain).await?;
    let ids: Vec<_> = campaigns.iter().map(|campaign| campaign.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    Ok(())
}

#[test(tokio::test)]
async fn sync_defaults_rating_to_zero_on_read_failure() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    let id = chain
        .seed_campaign(ALICE, "rated", U256::from(10), NOW + 100)
        .await;
    chain.fail_rating_read(id).await;

    let campaigns = sync::sync_all(&chain).await?;
    assert_eq!(campaigns.len(), 1);
    assert_eq!(campaigns[0].avg_rating, 0);
    Ok(())
}

#[test(tokio::test)]
async fn sync_tolerates_malformed_donor_ledger() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    let id = chain
        .seed_campaign(ALICE, "malformed", U256::from(10), NOW + 100)
        .await;
    chain.seed_donation(id, BOB, parse_amount("0.2")?).await;
    chain.malform_ledger(id).await;

    let campaigns = sync::sync_all(&chain).await?;
    assert_eq!(campaigns.len(), 1);
    assert!(campaigns[0].donors.is_empty());
    Ok(())
}

#[test(tokio::test)]
async fn created_campaign_appears_active_with_zero_totals() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);

    client.drafts_mut().create.title = "Clean water".to_string();
    client.drafts_mut().create.description = "Wells for the village".to_string();
    client.drafts_mut().create.goal = "1".to_string();
    client.drafts_mut().create.duration = "100".to_string();
    client.create_campaign().await?;

    let buckets = client.buckets_at(NOW);
    assert_eq!(buckets.active.len(), 1);
    assert!(buckets.completed.is_empty());
    assert!(buckets.cancelled.is_empty());

    let campaign = &buckets.active[0];
    assert_eq!(campaign.id, 1);
    assert_eq!(campaign.title, "Clean water");
    assert_eq!(campaign.goal, parse_amount("1")?);
    assert_eq!(campaign.goal_ether(), "1");
    assert_eq!(campaign.amount_collected_ether(), "0");
    assert_eq!(campaign.amount_collected, U256::ZERO);
    assert_eq!(campaign.avg_rating, 0);
    assert_eq!(campaign.deadline, NOW + 100);

    // The form draft is consumed by the successful submission.
    assert!(client.drafts().create.title.is_empty());

    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::success("Campaign created successfully!")]
    );
    Ok(())
}

#[test(tokio::test)]
async fn donation_updates_total_and_tops_the_ranking() -> anyhow::Result<()> {
    let chain = MockChain::new(BOB);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;
    chain.seed_donation(id, ALICE, parse_amount("0.2")?).await;

    let (mut client, mut notifications) = CampaignClient::new(chain, BOB);
    client.resync().await?;
    let before = client.campaigns()[0].amount_collected;

    client.drafts_mut().set_donation(id, "0.5");
    client.donate(id).await?;

    let campaign = &client.campaigns()[0];
    assert_eq!(campaign.amount_collected, before + parse_amount("0.5")?);
    assert_eq!(campaign.donors[0].donor, BOB);
    assert_eq!(campaign.donors[0].amount, parse_amount("0.5")?);
    assert_eq!(campaign.donors[0].amount_ether(), "0.5");
    // The donation draft is cleared on success.
    assert_eq!(client.drafts().donation(id), "0");

    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::success("Donated 0.5 ETH successfully!")]
    );
    Ok(())
}

#[test(tokio::test)]
async fn empty_create_form_is_rejected_without_a_chain_call() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);

    let result = client.create_campaign().await;
    assert_matches!(result, Err(ActionError::Validation(_)));
    assert!(client.campaigns().is_empty());

    let emitted = drain(&mut notifications);
    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].severity, Severity::Warning);
    assert_eq!(emitted[0].message, "Please fill all campaign details!");
    Ok(())
}

#[test(tokio::test)]
async fn zero_or_missing_donation_draft_is_rejected() -> anyhow::Result<()> {
    let chain = MockChain::new(BOB);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;

    let (mut client, mut notifications) = CampaignClient::new(chain, BOB);
    client.resync().await?;

    // No draft at all defaults to "0", which is not a valid donation.
    assert_matches!(client.donate(id).await, Err(ActionError::Validation(_)));
    client.drafts_mut().set_donation(id, "lots");
    assert_matches!(client.donate(id).await, Err(ActionError::Validation(_)));

    assert_eq!(client.campaigns()[0].amount_collected, U256::ZERO);
    let emitted = drain(&mut notifications);
    assert_eq!(emitted.len(), 2);
    assert!(emitted
        .iter()
        .all(|notification| notification.severity == Severity::Warning));
    Ok(())
}

#[test(tokio::test)]
async fn user_rejection_is_informational_and_leaves_state_untouched() -> anyhow::Result<()> {
    let chain = MockChain::new(BOB);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;
    chain.fail_next_write(TransactionFailure::UserRejected).await;

    let (mut client, mut notifications) = CampaignClient::new(chain, BOB);
    client.resync().await?;

    client.drafts_mut().set_donation(id, "0.5");
    let result = client.donate(id).await;
    assert_matches!(
        result,
        Err(ActionError::Transaction(TransactionFailure::UserRejected))
    );
    assert_eq!(client.campaigns()[0].amount_collected, U256::ZERO);

    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::info("Transaction rejected by user.")]
    );
    Ok(())
}

#[test(tokio::test)]
async fn revert_is_reported_with_the_action_context() -> anyhow::Result<()> {
    let chain = MockChain::new(BOB);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;

    let (mut client, mut notifications) = CampaignClient::new(chain, BOB);
    client.resync().await?;

    // Bob does not own the campaign, so the mock contract reverts.
    let result = client.cancel_campaign(id).await;
    assert_matches!(
        result,
        Err(ActionError::Transaction(TransactionFailure::Reverted))
    );

    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::error("Cancel failed: Transaction reverted.")]
    );
    Ok(())
}

#[test(tokio::test)]
async fn unknown_failures_surface_only_the_context() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;
    chain.fail_next_write(TransactionFailure::Unknown).await;

    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;

    let result = client.cancel_campaign(id).await;
    assert_matches!(
        result,
        Err(ActionError::Transaction(TransactionFailure::Unknown))
    );
    let emitted = drain(&mut notifications);
    assert_eq!(emitted, vec![Notification::error("Cancel failed.")]);
    Ok(())
}

#[test(tokio::test)]
async fn saving_an_edit_updates_the_field_and_clears_the_draft() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "old title", U256::from(10), NOW + 100)
        .await;

    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;

    client.drafts_mut().open_edit(id, CampaignField::Title);
    client.drafts_mut().set_edit_value("New title");
    client.save_edit().await?;

    assert_eq!(client.campaigns()[0].title, "New title");
    assert!(client.drafts().active_edit().is_none());
    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::success("title updated successfully!")]
    );
    Ok(())
}

#[test(tokio::test)]
async fn saving_an_empty_edit_value_is_rejected() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "title", U256::from(10), NOW + 100)
        .await;

    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;

    client.drafts_mut().open_edit(id, CampaignField::Description);
    let result = client.save_edit().await;
    assert_matches!(result, Err(ActionError::Validation(_)));
    // The draft survives so the user can retry.
    assert!(client.drafts().active_edit().is_some());

    let emitted = drain(&mut notifications);
    assert_eq!(emitted[0].message, "Please enter a value!");
    Ok(())
}

#[test(tokio::test)]
async fn deadline_extension_moves_a_campaign_back_to_active() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "expired", U256::from(10), NOW - 10)
        .await;

    let (mut client, _notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;
    assert_eq!(client.buckets_at(NOW).completed.len(), 1);

    client.drafts_mut().open_edit(id, CampaignField::Deadline);
    client.drafts_mut().set_edit_value("500");
    client.save_edit().await?;

    let buckets = client.buckets_at(NOW);
    assert!(buckets.completed.is_empty());
    assert_eq!(buckets.active.len(), 1);
    assert_eq!(buckets.active[0].deadline, NOW + 490);
    Ok(())
}

#[test(tokio::test)]
async fn rating_averages_are_scaled_by_one_hundred() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(BOB, "rated", U256::from(10), NOW + 100)
        .await;

    let (mut client, _notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;

    client.drafts_mut().set_rating(id, 5);
    client.rate(id).await?;
    assert_eq!(client.drafts().rating(id), None);
    assert_eq!(client.campaigns()[0].avg_rating, 500);

    client.drafts_mut().set_rating(id, 4);
    client.rate(id).await?;
    assert_eq!(client.campaigns()[0].avg_rating, 450);
    assert_eq!(client.campaigns()[0].rating_display(), "4.50");
    Ok(())
}

#[test(tokio::test)]
async fn withdraw_preconditions_are_checked_locally() -> anyhow::Result<()> {
    let chain = MockChain::new(BOB);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;
    chain.seed_donation(id, BOB, parse_amount("0.5")?).await;

    let (mut client, mut notifications) = CampaignClient::new(chain, BOB);
    client.resync().await?;

    // Not the owner: rejected locally, no transaction.
    let result = client.withdraw_funds(id).await;
    assert_matches!(result, Err(ActionError::Validation(_)));
    let emitted = drain(&mut notifications);
    assert_eq!(emitted[0].severity, Severity::Warning);
    Ok(())
}

#[test(tokio::test)]
async fn owner_withdraws_collected_funds() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "books", U256::from(10), NOW + 100)
        .await;
    chain.seed_donation(id, BOB, parse_amount("0.5")?).await;

    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;

    client.withdraw_funds(id).await?;
    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::success("Funds withdrawn successfully!")]
    );
    Ok(())
}

#[test(tokio::test)]
async fn cancelled_campaigns_are_bucketed_and_refundable() -> anyhow::Result<()> {
    let chain = MockChain::new(ALICE);
    chain.set_now(NOW).await;
    let id = chain
        .seed_campaign(ALICE, "doomed", U256::from(10), NOW + 100)
        .await;
    chain.seed_donation(id, BOB, parse_amount("0.5")?).await;

    let (mut client, mut notifications) = CampaignClient::new(chain, ALICE);
    client.resync().await?;
    client.cancel_campaign(id).await?;

    let buckets = client.buckets_at(NOW);
    assert!(buckets.active.is_empty());
    assert_eq!(buckets.cancelled.len(), 1);
    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::warning("Campaign cancelled and refunds issued!")]
    );

    // Bob claims his refund from the cancelled campaign.
    client.chain().set_sender(BOB).await;
    client.claim_refund(id).await?;
    assert_eq!(client.campaigns()[0].amount_collected, U256::ZERO);
    assert!(client.campaigns()[0].donors.is_empty());
    let emitted = drain(&mut notifications);
    assert_eq!(
        emitted,
        vec![Notification::success("Refund claimed successfully!")]
    );
    Ok(())
}
