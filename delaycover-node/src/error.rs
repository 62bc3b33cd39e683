// Copyright (c) DelayCover, Inc.
// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoverError {
    // The input is not a valid transaction hash
    InvalidTxHash,
    // The referenced transaction is unknown to the ledger and the chain
    TxNotFound,
    // The transaction is known but has no confirmation yet, so no proof
    // can be signed for it
    TxNotYetConfirmed,
    // The transaction confirmed but its broadcast height was never
    // observed, so the delay is unknowable
    MissingBroadcastHeight,
    // Malformed client request (bad hex, missing field, bad query param)
    InvalidClientRequest(String),
    // Attestation signing failure
    SigningError(String),
    // Transient Ethereum provider error
    TransientProviderError(String),
    // Ethereum provider error
    ProviderError(String),
    // Internal error
    InternalError(String),
    // Uncategorized error
    Generic(String),
}

impl CoverError {
    /// Returns a short string identifying the error type for metrics labels
    pub fn error_type(&self) -> &'static str {
        match self {
            CoverError::InvalidTxHash => "invalid_tx_hash",
            CoverError::TxNotFound => "tx_not_found",
            CoverError::TxNotYetConfirmed => "tx_not_yet_confirmed",
            CoverError::MissingBroadcastHeight => "missing_broadcast_height",
            CoverError::InvalidClientRequest(_) => "invalid_client_request",
            CoverError::SigningError(_) => "signing_error",
            CoverError::TransientProviderError(_) => "transient_provider_error",
            CoverError::ProviderError(_) => "provider_error",
            CoverError::InternalError(_) => "internal_error",
            CoverError::Generic(_) => "generic",
        }
    }
}

pub type CoverResult<T> = Result<T, CoverError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_simple_variants() {
        let errors = vec![
            (CoverError::InvalidTxHash, "invalid_tx_hash"),
            (CoverError::TxNotFound, "tx_not_found"),
            (CoverError::TxNotYetConfirmed, "tx_not_yet_confirmed"),
            (
                CoverError::MissingBroadcastHeight,
                "missing_broadcast_height",
            ),
        ];
        for (error, expected) in errors {
            assert_eq!(error.error_type(), expected);
        }
    }

    #[test]
    fn test_error_type_payload_independence() {
        let err1 = CoverError::ProviderError("short".to_string());
        let err2 = CoverError::ProviderError("a much longer provider error".to_string());
        assert_eq!(err1.error_type(), err2.error_type());
    }

    /// error_type values feed Prometheus labels, so they must stay
    /// lowercase-with-underscores
    #[test]
    fn test_error_type_valid_prometheus_labels() {
        let errors = vec![
            CoverError::InvalidTxHash,
            CoverError::TxNotFound,
            CoverError::TxNotYetConfirmed,
            CoverError::MissingBroadcastHeight,
            CoverError::InvalidClientRequest("test".to_string()),
            CoverError::SigningError("test".to_string()),
            CoverError::TransientProviderError("test".to_string()),
            CoverError::ProviderError("test".to_string()),
            CoverError::InternalError("test".to_string()),
            CoverError::Generic("test".to_string()),
        ];
        for error in errors {
            let error_type = error.error_type();
            assert!(!error_type.is_empty());
            for c in error_type.chars() {
                assert!(
                    c.is_ascii_lowercase() || c == '_',
                    "error_type '{}' contains invalid character '{}'",
                    error_type,
                    c
                );
            }
            assert!(!error_type.starts_with('_'));
            assert!(!error_type.ends_with('_'));
        }
    }
}
