//! Transaction Hub Core - operator form for stored transactions
//!
//! The headless form that:
//! - Reads the transaction identifier from the hosting page
//! - Fetches the `transaction` and `webcheckout` records from the webhook
//! - Lets the operator edit both as JSON or MongoDB Shell text
//! - Refuses updates whose records name a different transaction
//! - Submits normalized records and re-fetches after success
//!
//! # Example
//!
//! ```rust,ignore
//! use txhub_core::prelude::*;
//!
//! # async fn example() -> Result<(), HubError> {
//! let config = FormConfig::new();
//! let transport = ReqwestTransport::from_config(&config)?;
//! let mut session = TransactionSession::from_page_url(
//!     config,
//!     "https://hub.example/form?transactionId=T1",
//!     transport,
//!     TracingNotifier,
//! )?;
//! session.start().await?;
//! session.edit(FieldSlot::Transaction, r#"{"id": "T1", "amount": NumberLong("500")}"#);
//! session.submit().await?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod fields;
pub mod notify;
pub mod page;
pub mod session;
pub mod transport;
pub mod types;
pub mod validate;

// Re-exports for convenience
pub use config::{EndpointProfile, FormConfig, PRODUCTION_ENDPOINT, TEST_ENDPOINT};
pub use error::{ConsistencyError, HubError, HubResult, NetworkError};
pub use fields::{apply_flat_edit, extract_flat_fields, FieldValue, FlatFields};
pub use notify::{Notification, Notifier, RecordingNotifier, Severity, TracingNotifier};
pub use page::identifier_from_page_url;
pub use session::TransactionSession;
pub use transport::{ReqwestTransport, WebhookTransport};
pub use types::{
    FetchedRecords, FieldSlot, FormFields, RawField, SessionState, TransactionPayload,
};
pub use validate::validate_submission;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the transaction form
    pub use crate::{
        FieldSlot, FormConfig, HubError, HubResult, Notification, Notifier, ReqwestTransport,
        TracingNotifier, TransactionPayload, TransactionSession, WebhookTransport,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
