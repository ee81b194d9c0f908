// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Full synchronization of the campaign set from the contract.

use crate::{client::CampaignQueries, common::Campaign, ranking};

/// Fetches every campaign and assembles the denormalized view model.
///
/// Campaign ids run from 1 to the reported count. A campaign whose record
/// or donor ledger cannot be read is skipped from the result, so one
/// corrupt record cannot blank the whole view; a failed rating read only
/// defaults the rating to zero. The result is in ascending-id order.
/// Reads are issued sequentially, one id at a time.
pub async fn sync_all<C>(client: &C) -> Result<Vec<Campaign>, C::Error>
where
    C: CampaignQueries,
{
    let count = client.campaign_count().await?;
    let mut campaigns = Vec::new();
    for id in 1..=count {
        match fetch_campaign(client, id).await {
            Ok(campaign) => campaigns.push(campaign),
            Err(error) => {
                tracing::warn!(id, %error, "skipping campaign after failed read");
            }
        }
    }
    Ok(campaigns)
}

async fn fetch_campaign<C>(client: &C, id: u64) -> Result<Campaign, C::Error>
where
    C: CampaignQueries,
{
    let record = client.get_campaign(id).await?;
    let ledger = client.get_donors(id).await?;
    // Rating is optional decoration; a failed read must not drop the
    // campaign.
    let avg_rating = match client.get_average_rating(id).await {
        Ok(rating) => rating,
        Err(error) => {
            tracing::debug!(id, %error, "rating unavailable, defaulting to 0");
            0
        }
    };
    Ok(Campaign {
        id,
        owner: record.owner,
        title: record.title,
        description: record.description,
        goal: record.goal,
        amount_collected: record.amount_collected,
        deadline: record.deadline,
        cancelled: record.cancelled,
        avg_rating,
        donors: ranking::rank(ledger),
    })
}
