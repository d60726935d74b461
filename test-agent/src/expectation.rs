use std::fmt;

use rosetta_http_client::models::Operation;
use thiserror::Error;

/// Field of an operation that did not match its expectation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Error)]
pub enum MismatchReason {
    #[error("amount")]
    Amount,
    #[error("account")]
    Account,
    #[error("account public key")]
    AccountPublicKey,
    #[error("account token id")]
    AccountTokenId,
    #[error("status")]
    Status,
    #[error("kind")]
    Kind,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectedAccount {
    pub public_key: String,
    pub token_id: u64,
}

/// Partial description of an operation. `None` fields are not inspected.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExpectedOperation {
    pub amount: Option<i64>,
    pub account: Option<ExpectedAccount>,
    pub status: String,
    pub kind: String,
}

impl ExpectedOperation {
    /// Compares against `observed`, reporting only the first differing field
    /// in the order amount, account, status, kind.
    pub fn check(&self, observed: &Operation) -> Result<(), MismatchReason> {
        if let Some(amount) = self.amount {
            let observed_amount = observed
                .amount
                .as_ref()
                .and_then(|amount| amount.value.parse::<i64>().ok());
            if observed_amount != Some(amount) {
                return Err(MismatchReason::Amount);
            }
        }

        if let Some(account) = &self.account {
            let observed_account = observed.account.as_ref().ok_or(MismatchReason::Account)?;
            if observed_account.address != account.public_key {
                return Err(MismatchReason::AccountPublicKey);
            }
            let token_id = observed_account
                .token_id()
                .ok_or(MismatchReason::AccountTokenId)?;
            if token_id != account.token_id.to_string() {
                return Err(MismatchReason::AccountTokenId);
            }
        }

        if observed.status.as_deref() != Some(self.status.as_str()) {
            return Err(MismatchReason::Status);
        }
        if observed.kind != self.kind {
            return Err(MismatchReason::Kind);
        }
        Ok(())
    }
}

impl fmt::Display for ExpectedOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum OperationsMismatch {
    #[error("expected {expected} operations, observed {observed}")]
    Length { expected: usize, observed: usize },
    #[error("operation {index} differs on {reason}")]
    Operation {
        index: usize,
        reason: MismatchReason,
        observed: Box<Operation>,
    },
}

/// Pairs `expected` with `observed` element-wise. Lists of different lengths
/// are rejected before any operation is compared.
pub fn match_operations(
    expected: &[ExpectedOperation],
    observed: &[Operation],
) -> Result<(), OperationsMismatch> {
    if expected.len() != observed.len() {
        return Err(OperationsMismatch::Length {
            expected: expected.len(),
            observed: observed.len(),
        });
    }

    for (index, (expectation, operation)) in expected.iter().zip(observed).enumerate() {
        expectation
            .check(operation)
            .map_err(|reason| OperationsMismatch::Operation {
                index,
                reason,
                observed: Box::new(operation.clone()),
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use rosetta_http_client::models::{AccountIdentifier, Amount, Currency, OperationIdentifier};
    use serde_json::{json, Map};

    use super::*;

    const PUBLIC_KEY: &str = "B62qrPN5Y5yq8kGE3FbVKbGTdTAJNdtNtB5sNVpxyRwWGcDEhpMzc8g";

    fn observed(amount: Option<&str>, token_id: Option<&str>, status: &str, kind: &str) -> Operation {
        let metadata = token_id.map(|token_id| {
            let mut metadata = Map::new();
            metadata.insert("token_id".to_owned(), json!(token_id));
            metadata
        });
        Operation {
            operation_identifier: OperationIdentifier { index: 0 },
            related_operations: None,
            kind: kind.to_owned(),
            status: Some(status.to_owned()),
            account: Some(AccountIdentifier {
                address: PUBLIC_KEY.to_owned(),
                metadata,
            }),
            amount: amount.map(|value| Amount {
                value: value.to_owned(),
                currency: Currency {
                    symbol: "CODA".to_owned(),
                    decimals: 9,
                },
            }),
        }
    }

    fn fee_payer(amount: Option<i64>, token_id: Option<u64>) -> ExpectedOperation {
        ExpectedOperation {
            amount,
            account: token_id.map(|token_id| ExpectedAccount {
                public_key: PUBLIC_KEY.to_owned(),
                token_id,
            }),
            status: "Pending".to_owned(),
            kind: "fee_payer_dec".to_owned(),
        }
    }

    #[test]
    fn unconstrained_fields_are_ignored() {
        let expected = fee_payer(None, None);
        for operation in [
            observed(Some("-2000000000"), Some("1"), "Pending", "fee_payer_dec"),
            observed(None, None, "Pending", "fee_payer_dec"),
            observed(Some("not a number"), Some("7"), "Pending", "fee_payer_dec"),
        ] {
            assert_eq!(expected.check(&operation), Ok(()));
        }

        let mut no_account = observed(None, None, "Pending", "fee_payer_dec");
        no_account.account = None;
        assert_eq!(expected.check(&no_account), Ok(()));
    }

    #[test]
    fn amount_sign_matters() {
        let expected = fee_payer(Some(-2_000_000_000), None);
        assert_eq!(
            expected.check(&observed(Some("-2000000000"), None, "Pending", "fee_payer_dec")),
            Ok(())
        );
        assert_eq!(
            expected.check(&observed(Some("2000000000"), None, "Pending", "fee_payer_dec")),
            Err(MismatchReason::Amount)
        );
        assert_eq!(
            expected.check(&observed(None, None, "Pending", "fee_payer_dec")),
            Err(MismatchReason::Amount)
        );
    }

    #[test]
    fn missing_token_id_fails_even_with_matching_key() {
        let expected = fee_payer(None, Some(1));
        assert_eq!(
            expected.check(&observed(None, None, "Pending", "fee_payer_dec")),
            Err(MismatchReason::AccountTokenId)
        );
        assert_eq!(
            expected.check(&observed(None, Some("2"), "Pending", "fee_payer_dec")),
            Err(MismatchReason::AccountTokenId)
        );
        assert_eq!(
            expected.check(&observed(None, Some("1"), "Pending", "fee_payer_dec")),
            Ok(())
        );
    }

    #[test]
    fn account_mismatches() {
        let expected = fee_payer(None, Some(1));

        let mut other_key = observed(None, Some("1"), "Pending", "fee_payer_dec");
        if let Some(account) = other_key.account.as_mut() {
            account.address = PUBLIC_KEY.to_lowercase();
        }
        assert_eq!(
            expected.check(&other_key),
            Err(MismatchReason::AccountPublicKey)
        );

        let mut no_account = observed(None, Some("1"), "Pending", "fee_payer_dec");
        no_account.account = None;
        assert_eq!(expected.check(&no_account), Err(MismatchReason::Account));
    }

    #[test]
    fn first_mismatch_wins() {
        let expected = fee_payer(Some(-2_000_000_000), Some(1));
        assert_eq!(
            expected.check(&observed(Some("-1"), None, "Applied", "fee_payer_dec")),
            Err(MismatchReason::Amount)
        );
        assert_eq!(
            expected.check(&observed(Some("-2000000000"), Some("1"), "Applied", "coinbase_inc")),
            Err(MismatchReason::Status)
        );
        assert_eq!(
            expected.check(&observed(Some("-2000000000"), Some("1"), "Pending", "coinbase_inc")),
            Err(MismatchReason::Kind)
        );
    }

    #[test]
    fn operation_lists_must_line_up() {
        let expected = vec![fee_payer(None, None), fee_payer(Some(-5), None)];
        let operations = vec![
            observed(Some("-1"), None, "Pending", "fee_payer_dec"),
            observed(Some("-6"), None, "Pending", "fee_payer_dec"),
        ];

        assert_eq!(
            match_operations(&expected, &operations[..1]),
            Err(OperationsMismatch::Length {
                expected: 2,
                observed: 1
            })
        );
        match match_operations(&expected, &operations) {
            Err(OperationsMismatch::Operation {
                index,
                reason,
                observed,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(reason, MismatchReason::Amount);
                assert_eq!(*observed, operations[1]);
            }
            other => panic!("unexpected result {other:?}"),
        }
    }
}
