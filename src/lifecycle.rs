// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Lifecycle classification of synced campaigns.

use serde::{Deserialize, Serialize};

use crate::common::{Campaign, CampaignBuckets};

/// The lifecycle stage of a campaign at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The deadline has not passed and the campaign can receive donations.
    Active,
    /// The deadline has passed without cancellation.
    Completed,
    /// The owner cancelled the campaign.
    Cancelled,
}

/// Classifies one campaign. Cancellation wins over the deadline comparison;
/// otherwise the campaign is active strictly before its deadline. `now` is
/// Unix seconds.
pub fn status(campaign: &Campaign, now: u64) -> Status {
    if campaign.cancelled {
        Status::Cancelled
    } else if campaign.deadline > now {
        Status::Active
    } else {
        Status::Completed
    }
}

/// Partitions campaigns into the three display buckets, preserving input
/// order within each bucket. Pure in its inputs; callers re-run it per view
/// request so that campaigns roll from active to completed as the clock
/// advances, without any chain event.
pub fn classify(campaigns: &[Campaign], now: u64) -> CampaignBuckets {
    let mut buckets = CampaignBuckets::default();
    for campaign in campaigns {
        let bucket = match status(campaign, now) {
            Status::Active => &mut buckets.active,
            Status::Completed => &mut buckets.completed,
            Status::Cancelled => &mut buckets.cancelled,
        };
        bucket.push(campaign.clone());
    }
    buckets
}
