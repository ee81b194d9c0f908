// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Client core for the DeCrowdFund application.
//!
//! This crate mirrors the on-chain state of the CrowdFunding contract into
//! a local view model (ranked donors, lifecycle buckets, normalized
//! ratings) and forwards user actions as transactions, classifying their
//! failures into a small user-facing taxonomy. Rendering is a consumer of
//! this crate, not part of it.

pub mod client;
pub mod common;
pub mod dispatch;
pub mod lifecycle;
pub mod provider;
pub mod ranking;
pub mod session;
pub mod sync;

/// Helper types for tests.
pub mod test_utils;
