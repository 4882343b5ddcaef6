//! Transaction form session
//!
//! Headless model of the operator form:
//! - Holds the transaction identifier and the two raw field buffers
//! - Fetches existing records and fills the buffers
//! - Parses, validates and submits updates
//! - Reports every outcome to the notification surface
//!
//! Network operations take `&mut self`, so one session can never have two
//! requests in flight. Observers follow the busy state through
//! [`TransactionSession::subscribe_state`].

use crate::config::FormConfig;
use crate::error::{HubError, HubResult};
use crate::fields::{apply_flat_edit, extract_flat_fields, FieldValue, FlatFields};
use crate::notify::{Notification, Notifier};
use crate::page::identifier_from_page_url;
use crate::transport::WebhookTransport;
use crate::types::{FetchedRecords, FieldSlot, FormFields, RawField, SessionState, TransactionPayload};
use crate::validate::validate_submission;
use tokio::sync::watch;
use txhub_ejson::{parse_field, parse_shell_json};

/// One operator's form
#[derive(Debug)]
pub struct TransactionSession<T, N> {
    config: FormConfig,
    transport: T,
    notifier: N,
    transaction_id: String,
    fields: FormFields,
    loaded: Option<FetchedRecords>,
    state: watch::Sender<SessionState>,
    last_error: Option<String>,
}

impl<T: WebhookTransport, N: Notifier> TransactionSession<T, N> {
    /// Create session for a known identifier
    #[must_use]
    pub fn new(config: FormConfig, transport: T, notifier: N, transaction_id: impl Into<String>) -> Self {
        Self {
            config,
            transport,
            notifier,
            transaction_id: transaction_id.into(),
            fields: FormFields::default(),
            loaded: None,
            state: watch::channel(SessionState::Idle).0,
            last_error: None,
        }
    }

    /// Create session from the hosting page URL
    ///
    /// # Errors
    /// [`HubError::MissingParameter`] when the configured identifier
    /// parameter is absent; the operator is notified as well.
    pub fn from_page_url(config: FormConfig, page_url: &str, transport: T, notifier: N) -> HubResult<Self> {
        match identifier_from_page_url(page_url, &config.id_param) {
            Ok(id) => Ok(Self::new(config, transport, notifier, id)),
            Err(e) => {
                tracing::error!(error = %e, "cannot start session");
                notifier.notify(Notification::error(e.title(), e.to_string()));
                Err(e)
            }
        }
    }

    /// Fetch immediately when the form is configured to
    ///
    /// # Errors
    /// Fetch errors, see [`Self::load`].
    pub async fn start(&mut self) -> HubResult<()> {
        if self.config.auto_fetch {
            self.load().await?;
        }
        Ok(())
    }

    /// Fetch the records and reset both field buffers from them
    ///
    /// # Errors
    /// [`HubError::MissingIdentifier`], [`HubError::Network`] or
    /// [`HubError::NoDataFound`].
    pub async fn load(&mut self) -> HubResult<&FetchedRecords> {
        match self.fetch_records().await {
            Ok(records) => Ok(self.apply_records(records)),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Fetch without touching the fields, the inline error or the notifier
    async fn fetch_records(&mut self) -> HubResult<FetchedRecords> {
        let id = self.transaction_id.trim().to_string();
        if id.is_empty() {
            return Err(HubError::MissingIdentifier);
        }

        self.last_error = None;
        self.state.send_replace(SessionState::Loading);
        let fetched = self.transport.fetch(&id).await;
        self.state.send_replace(SessionState::Idle);

        let records = fetched?;
        if records.is_empty() {
            return Err(HubError::NoDataFound { transaction_id: id });
        }
        Ok(records)
    }

    fn apply_records(&mut self, records: FetchedRecords) -> &FetchedRecords {
        for slot in FieldSlot::ALL {
            *self.fields.get_mut(slot) = RawField::from_record(records.get(slot));
        }
        tracing::info!(transaction_id = %self.transaction_id.trim(), "records loaded");
        self.notifier.notify(Notification::success(
            "Data loaded",
            "Transaction data was loaded successfully.",
        ));
        self.loaded.insert(records)
    }

    /// Parse both fields and run the submission gate, without any I/O
    ///
    /// # Errors
    /// [`HubError::JsonSyntax`], [`HubError::MissingIdentifier`] or
    /// [`HubError::Consistency`].
    pub fn prepare(&self) -> HubResult<TransactionPayload> {
        let mode = self.config.input_mode();
        let parse = |slot: FieldSlot| {
            parse_field(self.fields.get(slot).text(), mode).map_err(|e| HubError::json_syntax(slot, e))
        };
        let transaction = parse(FieldSlot::Transaction)?;
        let webcheckout = parse(FieldSlot::Webcheckout)?;
        validate_submission(&self.transaction_id, transaction, webcheckout)
    }

    /// Validate and send the update, then refresh after the configured delay
    ///
    /// # Errors
    /// Validation errors from [`Self::prepare`] (nothing is sent), or
    /// [`HubError::Network`] when the webhook rejects the update.
    pub async fn submit(&mut self) -> HubResult<TransactionPayload> {
        if self.transaction_id.trim().is_empty() {
            return Err(self.fail(HubError::MissingIdentifier));
        }
        let payload = self.prepare().map_err(|e| self.fail(e))?;

        self.last_error = None;
        self.state.send_replace(SessionState::Submitting);
        let sent = self.transport.submit(&payload).await;
        self.state.send_replace(SessionState::Idle);

        if let Err(e) = sent {
            let err = HubError::Network(e);
            self.last_error = Some(format!("Update failed: {err}"));
            tracing::error!(error = %err, "update failed");
            self.notifier.notify(Notification::error(
                "Update failed",
                format!("The data could not be updated: {err}"),
            ));
            return Err(err);
        }

        tracing::info!(transaction_id = payload.transaction_id(), "update submitted");
        self.notifier.notify(Notification::success(
            "Update succeeded",
            format!(
                "Data was updated for transaction {}.",
                payload.transaction_id()
            ),
        ));

        if let Some(delay) = self.config.refresh_delay() {
            tokio::time::sleep(delay).await;
            match self.fetch_records().await {
                Ok(records) => {
                    self.apply_records(records);
                }
                Err(e) => tracing::warn!(error = %e, "refresh after update failed"),
            }
        }
        Ok(payload)
    }

    /// Replace one field's text
    pub fn edit(&mut self, slot: FieldSlot, text: impl Into<String>) {
        self.fields.get_mut(slot).set(text);
    }

    /// Editable scalar members of a field
    ///
    /// # Errors
    /// [`HubError::JsonSyntax`] when the field text does not parse.
    pub fn flat_fields(&self, slot: FieldSlot) -> HubResult<FlatFields> {
        let (value, _) =
            parse_shell_json(self.fields.get(slot).text()).map_err(|e| HubError::json_syntax(slot, e))?;
        Ok(extract_flat_fields(&value))
    }

    /// Edit one scalar member, coercing `input` to its current kind.
    ///
    /// The field buffer is rewritten as pretty JSON; Shell literals in it
    /// come back as Extended JSON wrappers.
    ///
    /// # Errors
    /// [`HubError::JsonSyntax`] or [`HubError::InvalidField`]; the buffer is
    /// left unchanged.
    pub fn edit_field(&mut self, slot: FieldSlot, key: &str, input: &str) -> HubResult<FieldValue> {
        let (mut value, _) = parse_shell_json(self.fields.get(slot).text())
            .map_err(|e| self.fail(HubError::json_syntax(slot, e)))?;
        let updated = apply_flat_edit(&mut value, key, input)
            .map_err(|reason| self.fail(HubError::invalid_field(slot, key, reason)))?;
        let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
        self.fields.get_mut(slot).set(text);
        Ok(updated)
    }

    /// Read-only view of the loaded records, when the preview pane is on
    #[must_use]
    pub fn preview(&self) -> Option<String> {
        if !self.config.show_preview {
            return None;
        }
        let records = self.loaded.as_ref()?;
        let view = serde_json::json!({
            "transactionId": self.transaction_id,
            "transaction": records.transaction,
            "webcheckout": records.webcheckout,
        });
        serde_json::to_string_pretty(&view).ok()
    }

    /// What a submit would send, when the preview pane is on
    ///
    /// # Errors
    /// Same as [`Self::prepare`].
    pub fn preview_normalized(&self) -> HubResult<Option<String>> {
        if !self.config.show_preview {
            return Ok(None);
        }
        let payload = self.prepare()?;
        Ok(serde_json::to_string_pretty(&payload).ok())
    }

    pub fn set_transaction_id(&mut self, id: impl Into<String>) {
        self.transaction_id = id.into();
    }

    #[inline]
    #[must_use]
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    #[inline]
    #[must_use]
    pub fn field(&self, slot: FieldSlot) -> &RawField {
        self.fields.get(slot)
    }

    #[inline]
    #[must_use]
    pub fn loaded(&self) -> Option<&FetchedRecords> {
        self.loaded.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch the busy state while an operation is in flight
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Inline error message of the last failed operation
    #[inline]
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Whether the submit action is enabled
    #[inline]
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.state().is_busy() && !self.transaction_id.trim().is_empty()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Record, log and announce a failure
    fn fail(&mut self, err: HubError) -> HubError {
        tracing::error!(error = %err, "operation failed");
        self.last_error = Some(err.to_string());
        self.notifier.notify(Notification::error(err.title(), err.to_string()));
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NetworkError;
    use crate::notify::{MockNotifier, RecordingNotifier, Severity};
    use crate::transport::MockWebhookTransport;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn config() -> FormConfig {
        FormConfig::new().with_refresh_delay(std::time::Duration::ZERO)
    }

    #[tokio::test]
    async fn consistency_failure_makes_no_network_call() {
        let mut transport = MockWebhookTransport::new();
        transport.expect_submit().times(0);
        let notifier = RecordingNotifier::new();

        let mut session = TransactionSession::new(config(), transport, notifier.clone(), "T123");
        session.edit(FieldSlot::Transaction, r#"{"id": "T999"}"#);

        let err = session.submit().await.unwrap_err();
        assert!(matches!(err, HubError::Consistency(_)));
        assert_eq!(notifier.severities(), vec![Severity::Error]);
        assert!(session.last_error().unwrap().contains("transaction.id"));
        assert!(session.can_submit());
    }

    #[tokio::test]
    async fn matching_identifier_is_submitted() {
        let mut transport = MockWebhookTransport::new();
        transport
            .expect_submit()
            .withf(|p| p.transaction_id() == "T123")
            .times(1)
            .returning(|_| Ok(()));

        let mut session = TransactionSession::new(config(), transport, RecordingNotifier::new(), "T123");
        session.edit(FieldSlot::Transaction, r#"{"id": "T123", "amount": NumberLong("5")}"#);

        let payload = session.submit().await.unwrap();
        assert_eq!(payload.transaction().to_json(), json!({"id": "T123", "amount": 5}));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn rejected_update_surfaces_body() {
        let mut transport = MockWebhookTransport::new();
        transport
            .expect_submit()
            .returning(|_| Err(NetworkError::status(500, "workflow crashed")));
        let notifier = RecordingNotifier::new();

        let mut session = TransactionSession::new(config(), transport, notifier.clone(), "T1");
        let err = session.submit().await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(
            session.last_error(),
            Some("Update failed: Error 500: workflow crashed")
        );
        let last = notifier.last().unwrap();
        assert_eq!(last.title, "Update failed");
        assert!(last.description.contains("workflow crashed"));
    }

    #[tokio::test]
    async fn empty_fetch_is_no_data() {
        let mut transport = MockWebhookTransport::new();
        transport
            .expect_fetch()
            .withf(|id| id == "T1")
            .returning(|_| Ok(FetchedRecords::default()));

        let mut notifier = MockNotifier::new();
        notifier
            .expect_notify()
            .withf(|n| n.severity == Severity::Error && n.title == "No data")
            .times(1)
            .return_const(());

        let mut session = TransactionSession::new(config(), transport, notifier, "T1");
        let err = session.load().await.unwrap_err();
        assert!(matches!(err, HubError::NoDataFound { .. }));
        assert!(session.loaded().is_none());
    }

    #[tokio::test]
    async fn auto_fetch_is_optional() {
        let mut transport = MockWebhookTransport::new();
        transport.expect_fetch().times(0);
        let mut session = TransactionSession::new(
            config().with_auto_fetch(false),
            transport,
            RecordingNotifier::new(),
            "T1",
        );
        session.start().await.unwrap();
        assert_eq!(session.field(FieldSlot::Transaction).text(), "{}");
    }

    #[tokio::test]
    async fn blank_identifier_blocks_everything() {
        let mut transport = MockWebhookTransport::new();
        transport.expect_fetch().times(0);
        transport.expect_submit().times(0);
        let mut session = TransactionSession::new(config(), transport, RecordingNotifier::new(), "  ");

        assert!(!session.can_submit());
        assert!(matches!(session.load().await, Err(HubError::MissingIdentifier)));
        assert!(matches!(session.submit().await, Err(HubError::MissingIdentifier)));
    }

    /// Holds every fetch until the gate opens
    struct GatedTransport {
        gate: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl WebhookTransport for GatedTransport {
        async fn fetch(&self, _transaction_id: &str) -> Result<FetchedRecords, NetworkError> {
            self.gate.notified().await;
            Ok(FetchedRecords {
                transaction: Some(json!({"id": "T1"})),
                webcheckout: None,
            })
        }

        async fn submit(&self, _payload: &TransactionPayload) -> Result<(), NetworkError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn busy_state_is_observable_during_fetch() {
        let gate = Arc::new(Notify::new());
        let mut session = TransactionSession::new(
            config(),
            GatedTransport { gate: gate.clone() },
            RecordingNotifier::new(),
            "T1",
        );
        let mut states = session.subscribe_state();

        let task = tokio::spawn(async move {
            let loaded = session.load().await.is_ok();
            (session, loaded)
        });

        states.changed().await.unwrap();
        assert_eq!(*states.borrow_and_update(), SessionState::Loading);

        gate.notify_one();
        let (session, loaded) = task.await.unwrap();
        assert!(loaded);
        assert_eq!(*states.borrow(), SessionState::Idle);
        assert!(session.can_submit());
    }

    #[test]
    fn plain_mode_rejects_shell_syntax() {
        let mut session = TransactionSession::new(
            config().with_extended_json(false),
            MockWebhookTransport::new(),
            RecordingNotifier::new(),
            "T1",
        );
        session.edit(FieldSlot::Webcheckout, r#"{"_id": ObjectId("65a0")}"#);
        let err = session.prepare().unwrap_err();
        assert!(matches!(
            err,
            HubError::JsonSyntax { slot: FieldSlot::Webcheckout, .. }
        ));
    }

    #[test]
    fn missing_page_parameter_notifies() {
        let notifier = RecordingNotifier::new();
        let result = TransactionSession::from_page_url(
            config(),
            "https://hub.example/?transaction=T1",
            MockWebhookTransport::new(),
            notifier.clone(),
        );
        assert!(matches!(result, Err(HubError::MissingParameter { .. })));
        assert_eq!(notifier.last().unwrap().title, "Configuration error");
    }
}
