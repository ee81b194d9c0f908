// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Alloy-backed access to the deployed CrowdFunding contract.

use alloy::{
    primitives::{Address, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    rpc::{
        json_rpc,
        types::eth::request::{TransactionInput, TransactionRequest},
    },
    sol_types::SolCall,
    transports::{
        http::{reqwest::Client, Http},
        TransportErrorKind,
    },
};
use alloy_primitives::Bytes;
use async_trait::async_trait;
use url::Url;

use crate::{
    client::{
        CampaignOperations, CampaignQueries, CampaignRecord, CrowdFunding, DonorLedger,
        FieldUpdate, TransactionOutcome,
    },
    common::{CampaignServiceError, TransactionFailure},
    session::{DeploymentTable, Session},
};

pub type HttpProvider = RootProvider<Http<Client>>;

/// A connected view of a CrowdFunding deployment: an HTTP provider plus the
/// session resolved against the deployment table.
pub struct ContractClient<M> {
    pub provider: M,
    pub session: Session,
}

impl ContractClient<HttpProvider> {
    /// Connects to an Ethereum node, resolves the acting account and the
    /// network id, and looks up the contract address deployed on that
    /// network. A network without a deployment record is a configuration
    /// error and no contract calls are attempted.
    pub async fn connect(
        url: &str,
        deployments: &DeploymentTable,
    ) -> Result<Self, CampaignServiceError> {
        let rpc_url = Url::parse(url)?;
        let provider = ProviderBuilder::new().on_http(rpc_url);
        let session = Self::resolve_session(&provider, deployments).await?;
        Ok(Self { provider, session })
    }

    /// Re-resolves the session against the same deployment table, e.g.
    /// after the wallet switched accounts or networks. Callers are expected
    /// to trigger a full resync afterwards.
    pub async fn reconnect(
        &mut self,
        deployments: &DeploymentTable,
    ) -> Result<(), CampaignServiceError> {
        self.session = Self::resolve_session(&self.provider, deployments).await?;
        Ok(())
    }

    async fn resolve_session(
        provider: &HttpProvider,
        deployments: &DeploymentTable,
    ) -> Result<Session, CampaignServiceError> {
        let accounts = provider.get_accounts().await?;
        let account = *accounts.first().ok_or(CampaignServiceError::NoAccounts)?;
        let network_id = provider.get_chain_id().await?;
        let contract_address = deployments
            .address_for(network_id)
            .ok_or(CampaignServiceError::MissingDeployment(network_id))?;
        Ok(Session {
            account,
            network_id,
            contract_address,
        })
    }

    /// Lists the accounts exposed by the provider.
    pub async fn get_accounts(&self) -> Result<Vec<String>, CampaignServiceError> {
        Ok(self
            .provider
            .get_accounts()
            .await?
            .into_iter()
            .map(|address| format!("{:?}", address))
            .collect::<Vec<_>>())
    }

    /// Reads the balance of an address, in wei.
    pub async fn get_balance(&self, address: &str) -> Result<U256, CampaignServiceError> {
        let address = address.parse::<Address>()?;
        Ok(self.provider.get_balance(address).await?)
    }

    /// Executes a read-only call against the contract and returns the raw
    /// return data.
    async fn view_call(&self, data: Vec<u8>) -> Result<Bytes, CampaignServiceError> {
        let input = TransactionInput::new(data.into());
        let tx = TransactionRequest::default()
            .from(self.session.account)
            .to(self.session.contract_address)
            .input(input);
        Ok(self.provider.call(&tx).await?)
    }

    /// Submits a state-changing transaction and suspends until it is mined,
    /// classifying any failure into the closed taxonomy. There is no
    /// client-side timeout on mining latency.
    async fn send_call(
        &self,
        data: Vec<u8>,
        value: Option<U256>,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        let input = TransactionInput::new(data.into());
        let mut tx = TransactionRequest::default()
            .from(self.session.account)
            .to(self.session.contract_address)
            .input(input);
        if let Some(value) = value {
            tx = tx.value(value);
        }
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|error| classify_rpc_error(&error))?;
        let receipt = pending.get_receipt().await.map_err(|error| {
            tracing::warn!(%error, "failed waiting for transaction receipt");
            TransactionFailure::Unknown
        })?;
        if !receipt.status() {
            return Err(TransactionFailure::Reverted);
        }
        Ok(TransactionOutcome {
            transaction_hash: format!("{:?}", receipt.transaction_hash),
            block_number: receipt.block_number,
        })
    }
}

/// Maps a raw JSON-RPC failure onto the user-facing taxonomy. This is the
/// only place raw transport errors are inspected.
fn classify_rpc_error(error: &json_rpc::RpcError<TransportErrorKind>) -> TransactionFailure {
    match error {
        json_rpc::RpcError::ErrorResp(payload) => {
            TransactionFailure::classify(Some(payload.code), &payload.message)
        }
        other => TransactionFailure::classify(None, &other.to_string()),
    }
}

#[async_trait]
impl CampaignQueries for ContractClient<HttpProvider> {
    type Error = CampaignServiceError;

    async fn campaign_count(&self) -> Result<u64, Self::Error> {
        let data = CrowdFunding::campaignCountCall {}.abi_encode();
        let raw = self.view_call(data).await?;
        let count = CrowdFunding::campaignCountCall::abi_decode_returns(&raw, true)?.count;
        Ok(count.saturating_to::<u64>())
    }

    async fn get_campaign(&self, id: u64) -> Result<CampaignRecord, Self::Error> {
        let data = CrowdFunding::getCampaignCall { id: U256::from(id) }.abi_encode();
        let raw = self.view_call(data).await?;
        let record = CrowdFunding::getCampaignCall::abi_decode_returns(&raw, true)?;
        Ok(CampaignRecord {
            owner: format!("{:?}", record.owner),
            title: record.title,
            description: record.description,
            goal: record.goal,
            amount_collected: record.amountCollected,
            deadline: record.deadline.saturating_to::<u64>(),
            cancelled: record.cancelled,
        })
    }

    async fn get_donors(&self, id: u64) -> Result<DonorLedger, Self::Error> {
        let data = CrowdFunding::getDonorsCall { id: U256::from(id) }.abi_encode();
        let raw = self.view_call(data).await?;
        // A response that does not decode as the two parallel arrays is an
        // empty ledger, not a failed read.
        match CrowdFunding::getDonorsCall::abi_decode_returns(&raw, true) {
            Ok(columns) => Ok(DonorLedger::new(
                columns
                    .donors
                    .into_iter()
                    .map(|address| format!("{:?}", address))
                    .collect(),
                columns.amounts,
            )),
            Err(error) => {
                tracing::warn!(id, %error, "donor ledger did not decode; treating as empty");
                Ok(DonorLedger::default())
            }
        }
    }

    async fn get_average_rating(&self, id: u64) -> Result<u64, Self::Error> {
        let data = CrowdFunding::getAverageRatingCall { id: U256::from(id) }.abi_encode();
        let raw = self.view_call(data).await?;
        let rating = CrowdFunding::getAverageRatingCall::abi_decode_returns(&raw, true)?.rating;
        Ok(rating.saturating_to::<u64>())
    }
}

#[async_trait]
impl CampaignOperations for ContractClient<HttpProvider> {
    async fn create_campaign(
        &self,
        title: &str,
        description: &str,
        goal: U256,
        duration: u64,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        let data = CrowdFunding::createCampaignCall {
            title: title.to_string(),
            description: description.to_string(),
            goal,
            duration: U256::from(duration),
        }
        .abi_encode();
        self.send_call(data, None).await
    }

    async fn donate(&self, id: u64, value: U256) -> Result<TransactionOutcome, TransactionFailure> {
        let data = CrowdFunding::donateCall { id: U256::from(id) }.abi_encode();
        self.send_call(data, Some(value)).await
    }

    async fn cancel_campaign(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure> {
        let data = CrowdFunding::cancelCampaignCall { id: U256::from(id) }.abi_encode();
        self.send_call(data, None).await
    }

    async fn update_field(
        &self,
        id: u64,
        update: FieldUpdate,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        let id = U256::from(id);
        let data = match update {
            FieldUpdate::Title(value) => CrowdFunding::updateTitleCall {
                id,
                newTitle: value,
            }
            .abi_encode(),
            FieldUpdate::Description(value) => CrowdFunding::updateDescriptionCall {
                id,
                newDescription: value,
            }
            .abi_encode(),
            FieldUpdate::Goal(value) => {
                CrowdFunding::updateGoalCall { id, newGoal: value }.abi_encode()
            }
            FieldUpdate::DeadlineExtension(seconds) => CrowdFunding::extendDeadlineCall {
                id,
                extraSeconds: U256::from(seconds),
            }
            .abi_encode(),
        };
        self.send_call(data, None).await
    }

    async fn rate_campaign(
        &self,
        id: u64,
        rating: u8,
    ) -> Result<TransactionOutcome, TransactionFailure> {
        let data = CrowdFunding::rateCampaignCall {
            id: U256::from(id),
            rating,
        }
        .abi_encode();
        self.send_call(data, None).await
    }

    async fn withdraw_funds(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure> {
        let data = CrowdFunding::withdrawFundsCall { id: U256::from(id) }.abi_encode();
        self.send_call(data, None).await
    }

    async fn claim_refund(&self, id: u64) -> Result<TransactionOutcome, TransactionFailure> {
        let data = CrowdFunding::claimRefundCall { id: U256::from(id) }.abi_encode();
        self.send_call(data, None).await
    }
}
