// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Ranking of a campaign's donors by contribution size.

use alloy_primitives::U256;

use crate::{client::DonorLedger, common::DonorEntry};

/// Ranks the raw donor ledger into display order: descending by amount,
/// stable for ties, so equal contributions keep their contract-reported
/// order. A ledger with a malformed side yields an empty list; a missing
/// amount counts as zero. Ordering is computed on the wei values, which
/// coincides with ordering on the converted decimal amounts.
pub fn rank(ledger: DonorLedger) -> Vec<DonorEntry> {
    let (Some(donors), Some(amounts)) = (ledger.donors, ledger.amounts) else {
        return Vec::new();
    };
    let mut entries: Vec<DonorEntry> = donors
        .into_iter()
        .enumerate()
        .map(|(index, donor)| DonorEntry {
            donor,
            amount: amounts.get(index).copied().unwrap_or(U256::ZERO),
        })
        .collect();
    entries.sort_by(|a, b| b.amount.cmp(&a.amount));
    entries
}
