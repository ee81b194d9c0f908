// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Connected-session state: which account acts, on which network, against
//! which deployed contract.

use std::collections::BTreeMap;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::common::CampaignServiceError;

/// The per-network deployment records of the CrowdFunding contract, keyed
/// by network id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DeploymentTable(BTreeMap<u64, Address>);

impl DeploymentTable {
    /// Parses a deployment table from a JSON object mapping network ids to
    /// contract addresses.
    pub fn from_json(json: &str) -> Result<Self, CampaignServiceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Registers the deployment address for a network.
    pub fn insert(&mut self, network_id: u64, address: Address) {
        self.0.insert(network_id, address);
    }

    /// Looks up the contract address deployed on the given network.
    pub fn address_for(&self, network_id: u64) -> Option<Address> {
        self.0.get(&network_id).copied()
    }
}

/// The resolved session: the acting account, the connected network, and
/// the contract deployed on it. Built once at connect time; process-wide
/// and replaced only by an explicit reconnect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub account: Address,
    pub network_id: u64,
    pub contract_address: Address,
}

impl Session {
    /// The acting account as a 0x-prefixed hex string, the form in which
    /// it is displayed and compared against campaign owners.
    pub fn account_display(&self) -> String {
        format!("{:?}", self.account)
    }
}
