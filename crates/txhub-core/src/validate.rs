//! Submission gate
//!
//! A payload is only built when the identifier is present and every
//! identifier the records declare about themselves agrees with it.

use crate::error::{ConsistencyError, HubError, HubResult};
use crate::types::TransactionPayload;
use txhub_ejson::NormalizedValue;

/// Compare one record's self-declared identifier with the session's.
///
/// Absent, null and undefined members are not checked. Scalars compare by
/// their text form, so a numeric `id` of `123` matches `"123"`.
fn check_identity(
    record: &str,
    key: &str,
    tree: &NormalizedValue,
    expected: &str,
) -> Result<(), ConsistencyError> {
    let declared = match tree.get(key) {
        None | Some(NormalizedValue::Null | NormalizedValue::Undefined) => return Ok(()),
        Some(value) => value,
    };
    let actual = declared
        .scalar_text()
        .unwrap_or_else(|| declared.to_json().to_string());
    if actual == expected {
        Ok(())
    } else {
        Err(ConsistencyError {
            field: format!("{record}.{key}"),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Gate payload construction
///
/// # Errors
/// [`HubError::MissingIdentifier`] for a blank identifier,
/// [`HubError::Consistency`] when `transaction.id` or
/// `webcheckout.transaction_id` disagrees with it.
pub fn validate_submission(
    transaction_id: &str,
    transaction: NormalizedValue,
    webcheckout: NormalizedValue,
) -> HubResult<TransactionPayload> {
    let transaction_id = transaction_id.trim();
    if transaction_id.is_empty() {
        return Err(HubError::MissingIdentifier);
    }

    check_identity("transaction", "id", &transaction, transaction_id)?;
    check_identity("webcheckout", "transaction_id", &webcheckout, transaction_id)?;

    Ok(TransactionPayload::new(
        transaction_id.to_string(),
        transaction,
        webcheckout,
    ))
}
