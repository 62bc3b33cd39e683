// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Policy parameters with eager validation.

use crate::error::{PolicyError, PolicyResult};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

pub const BPS_DENOMINATOR: u64 = 10_000;

/// Parameters of one deployed policy instance. Identity is immutable;
/// parameters are mutable through the owner-only configure path, which
/// re-validates the full set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyParams {
    /// Confirmation delay (blocks) a claim must strictly exceed.
    pub delay_threshold: u64,
    /// Premium, in basis points of the current pool size.
    pub premium_bps: u64,
    /// Protocol fee taken from each purchase, in basis points.
    pub protocol_fee_bps: u64,
    /// Fixed payout per successful claim, in the native currency's smallest unit.
    pub payout_per_incident: U256,
    pub active: bool,
    /// The semi-trusted witness whose signature is the sole claim evidence.
    pub attester_address: Address,
}

impl PolicyParams {
    pub fn new(
        delay_threshold: u64,
        premium_bps: u64,
        protocol_fee_bps: u64,
        payout_per_incident: U256,
        attester_address: Address,
    ) -> PolicyResult<Self> {
        let params = Self {
            delay_threshold,
            premium_bps,
            protocol_fee_bps,
            payout_per_incident,
            active: true,
            attester_address,
        };
        params.validate()?;
        Ok(params)
    }

    /// A half-configured policy must never reach an operating state, so all
    /// bounds are checked here rather than at first use.
    pub fn validate(&self) -> PolicyResult<()> {
        if self.delay_threshold == 0 {
            return Err(PolicyError::InvalidParameter("delay-threshold must be > 0"));
        }
        if self.premium_bps > BPS_DENOMINATOR {
            return Err(PolicyError::InvalidParameter(
                "premium-bps must be <= 10000",
            ));
        }
        if self.protocol_fee_bps > BPS_DENOMINATOR {
            return Err(PolicyError::InvalidParameter(
                "protocol-fee-bps must be <= 10000",
            ));
        }
        if self.payout_per_incident.is_zero() {
            return Err(PolicyError::InvalidParameter(
                "payout-per-incident must be > 0",
            ));
        }
        if self.attester_address == Address::zero() {
            return Err(PolicyError::InvalidParameter(
                "attester-address must be set",
            ));
        }
        Ok(())
    }
}
