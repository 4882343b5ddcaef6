//! Core types for Transaction Hub
//!
//! Defines the form-side data model:
//! - The two editable record slots and their raw text buffers
//! - Records as fetched from the webhook
//! - The outbound payload
//! - Session state

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use txhub_ejson::NormalizedValue;

/// Named record slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldSlot {
    Transaction,
    Webcheckout,
}

impl FieldSlot {
    /// Both slots in form order
    pub const ALL: [Self; 2] = [Self::Transaction, Self::Webcheckout];

    /// Wire name of the slot
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transaction => "transaction",
            Self::Webcheckout => "webcheckout",
        }
    }
}

impl fmt::Display for FieldSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(Self::Transaction),
            "webcheckout" => Ok(Self::Webcheckout),
            other => Err(format!("unknown field slot: {other}")),
        }
    }
}

/// Text buffer holding operator-edited content for one slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawField {
    text: String,
}

impl RawField {
    /// Literal an untouched field starts with
    pub const EMPTY_OBJECT: &'static str = "{}";

    /// Create field with initial content
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Initialize from a fetched record, or the empty object when absent
    #[must_use]
    pub fn from_record(record: Option<&Value>) -> Self {
        match record {
            Some(value) => Self::new(
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string()),
            ),
            None => Self::default(),
        }
    }

    /// Current text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the whole buffer
    #[inline]
    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }
}

impl Default for RawField {
    fn default() -> Self {
        Self::new(Self::EMPTY_OBJECT)
    }
}

/// The form's field set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    pub transaction: RawField,
    pub webcheckout: RawField,
}

impl FormFields {
    #[inline]
    #[must_use]
    pub fn get(&self, slot: FieldSlot) -> &RawField {
        match slot {
            FieldSlot::Transaction => &self.transaction,
            FieldSlot::Webcheckout => &self.webcheckout,
        }
    }

    #[inline]
    pub fn get_mut(&mut self, slot: FieldSlot) -> &mut RawField {
        match slot {
            FieldSlot::Transaction => &mut self.transaction,
            FieldSlot::Webcheckout => &mut self.webcheckout,
        }
    }
}

/// Webhook response to a fetch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FetchedRecords {
    #[serde(default)]
    pub transaction: Option<Value>,
    #[serde(default)]
    pub webcheckout: Option<Value>,
}

impl FetchedRecords {
    /// Neither record present (null counts as absent)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.transaction.is_none() && self.webcheckout.is_none()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, slot: FieldSlot) -> Option<&Value> {
        match slot {
            FieldSlot::Transaction => self.transaction.as_ref(),
            FieldSlot::Webcheckout => self.webcheckout.as_ref(),
        }
    }
}

/// Outbound update, built only by the submission validator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionPayload {
    transaction_id: String,
    transaction: NormalizedValue,
    webcheckout: NormalizedValue,
}

impl TransactionPayload {
    pub(crate) fn new(
        transaction_id: String,
        transaction: NormalizedValue,
        webcheckout: NormalizedValue,
    ) -> Self {
        Self {
            transaction_id,
            transaction,
            webcheckout,
        }
    }

    #[inline]
    #[must_use]
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    #[inline]
    #[must_use]
    pub fn transaction(&self) -> &NormalizedValue {
        &self.transaction
    }

    #[inline]
    #[must_use]
    pub fn webcheckout(&self) -> &NormalizedValue {
        &self.webcheckout
    }

    /// Body as sent on the wire
    #[must_use]
    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "transactionId": self.transaction_id,
            "transaction": self.transaction.to_json(),
            "webcheckout": self.webcheckout.to_json(),
        })
    }
}

/// What the session is waiting on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Idle,
    Loading,
    Submitting,
}

impl SessionState {
    #[inline]
    #[must_use]
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn slot_names_round_trip() {
        for slot in FieldSlot::ALL {
            assert_eq!(slot.as_str().parse::<FieldSlot>().unwrap(), slot);
        }
        assert!("checkout".parse::<FieldSlot>().is_err());
    }

    #[test]
    fn raw_field_defaults_to_empty_object() {
        assert_eq!(RawField::default().text(), "{}");
        assert_eq!(RawField::from_record(None).text(), "{}");
        let field = RawField::from_record(Some(&json!({"a": 1})));
        assert_eq!(field.text(), "{\n  \"a\": 1\n}");
    }

    #[test]
    fn fetched_records_absence() {
        let records: FetchedRecords = serde_json::from_value(json!({})).unwrap();
        assert!(records.is_empty());

        let records: FetchedRecords =
            serde_json::from_value(json!({"transaction": null, "webcheckout": null})).unwrap();
        assert!(records.is_empty());

        let records: FetchedRecords =
            serde_json::from_value(json!({"webcheckout": {"transaction_id": "T1"}})).unwrap();
        assert!(!records.is_empty());
        assert!(records.get(FieldSlot::Transaction).is_none());
    }

    #[test]
    fn payload_wire_shape() {
        let payload = TransactionPayload::new(
            "T1".into(),
            NormalizedValue::from(json!({"amount": 5})),
            NormalizedValue::empty_object(),
        );
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"transactionId": "T1", "transaction": {"amount": 5}, "webcheckout": {}})
        );
        assert_eq!(serde_json::to_value(&payload).unwrap(), payload.to_json());
    }

    #[test]
    fn busy_states() {
        assert!(!SessionState::Idle.is_busy());
        assert!(SessionState::Loading.is_busy());
        assert!(SessionState::Submitting.is_busy());
    }
}
