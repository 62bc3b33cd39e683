// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// External value transfer failure, reported by a [`crate::PayoutSink`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("transfer failed: {0}")]
pub struct TransferError(pub String);

/// Claim-protocol and policy-administration rejections.
///
/// The `Display` strings are part of the protocol surface: clients match on
/// them and monitoring alerts on them, so they must stay stable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("policy not active")]
    NotActive,
    #[error("already processed")]
    AlreadyProcessed,
    #[error("no incidents remaining")]
    NoIncidentsRemaining,
    #[error("delay not sufficient")]
    DelayNotSufficient,
    #[error("invalid signature")]
    InvalidSignature,
    #[error("insufficient pool funds")]
    InsufficientPoolFunds,
    #[error("amount too small for coverage")]
    AmountTooSmall,
    #[error("value must be positive")]
    ZeroValue,
    #[error("reentrant call")]
    Reentrancy,
    #[error("not the policy owner")]
    NotOwner,
    #[error("no protocol fees to withdraw")]
    NoFeesToWithdraw,
    #[error("invalid policy parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("arithmetic overflow")]
    Overflow,
    #[error(transparent)]
    TransferFailed(#[from] TransferError),
}

impl PolicyError {
    /// Short identifier for metrics labels.
    pub fn error_type(&self) -> &'static str {
        match self {
            PolicyError::NotActive => "not_active",
            PolicyError::AlreadyProcessed => "already_processed",
            PolicyError::NoIncidentsRemaining => "no_incidents_remaining",
            PolicyError::DelayNotSufficient => "delay_not_sufficient",
            PolicyError::InvalidSignature => "invalid_signature",
            PolicyError::InsufficientPoolFunds => "insufficient_pool_funds",
            PolicyError::AmountTooSmall => "amount_too_small",
            PolicyError::ZeroValue => "zero_value",
            PolicyError::Reentrancy => "reentrancy",
            PolicyError::NotOwner => "not_owner",
            PolicyError::NoFeesToWithdraw => "no_fees_to_withdraw",
            PolicyError::InvalidParameter(_) => "invalid_parameter",
            PolicyError::Overflow => "overflow",
            PolicyError::TransferFailed(_) => "transfer_failed",
        }
    }
}

pub type PolicyResult<T> = Result<T, PolicyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_reason_strings_are_stable() {
        // These strings are matched by claim submitters and alerting.
        assert_eq!(PolicyError::NotActive.to_string(), "policy not active");
        assert_eq!(
            PolicyError::AlreadyProcessed.to_string(),
            "already processed"
        );
        assert_eq!(
            PolicyError::NoIncidentsRemaining.to_string(),
            "no incidents remaining"
        );
        assert_eq!(
            PolicyError::DelayNotSufficient.to_string(),
            "delay not sufficient"
        );
        assert_eq!(PolicyError::InvalidSignature.to_string(), "invalid signature");
        assert_eq!(
            PolicyError::InsufficientPoolFunds.to_string(),
            "insufficient pool funds"
        );
        assert_eq!(
            PolicyError::AmountTooSmall.to_string(),
            "amount too small for coverage"
        );
    }

    #[test]
    fn test_error_type_valid_prometheus_labels() {
        let errors = vec![
            PolicyError::NotActive,
            PolicyError::AlreadyProcessed,
            PolicyError::DelayNotSufficient,
            PolicyError::InvalidSignature,
            PolicyError::InsufficientPoolFunds,
            PolicyError::TransferFailed(TransferError("boom".to_string())),
        ];
        for error in errors {
            let label = error.error_type();
            assert!(!label.is_empty());
            for c in label.chars() {
                assert!(
                    c.is_ascii_lowercase() || c == '_',
                    "error_type '{}' contains invalid character '{}'",
                    label,
                    c
                );
            }
        }
    }
}
