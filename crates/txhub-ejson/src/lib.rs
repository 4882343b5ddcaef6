//! Transaction Hub Extended JSON
//!
//! Accepts the loose JSON operators paste out of database consoles and turns
//! it into plain JSON ready for transmission.
//!
//! # Pipeline
//!
//! ```text
//! text → serde_json ──ok──────────────────────→ Value → normalize → NormalizedValue
//!            │                                    ↑
//!            └─err→ LiteralRewriter → serde_json ─┘
//! ```
//!
//! - **Rewrite**: `ObjectId("…")`, `ISODate("…")`, `NumberLong("…")` and the
//!   other Shell constructors become Extended JSON wrapper objects
//! - **Normalize**: wrapper objects (`{"$oid": …}`, `{"$date": …}`, …) become
//!   native values
//!
//! # Example
//!
//! ```rust
//! use txhub_ejson::{parse_field, InputMode};
//!
//! let text = r#"{"amount": NumberLong("500"), "when": ISODate("2024-01-01T00:00:00Z")}"#;
//! let value = parse_field(text, InputMode::Extended).unwrap();
//!
//! assert_eq!(
//!     value.to_json(),
//!     serde_json::json!({"amount": 500, "when": "2024-01-01T00:00:00.000Z"})
//! );
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod normalize;
pub mod parse;
pub mod rewrite;
pub mod tag;
pub mod value;

pub use error::{ParseError, ParseResult};
pub use normalize::normalize;
pub use parse::{parse_field, parse_shell_json, InputMode};
pub use rewrite::{rewrite_shell_literals, LiteralRewriter, Rewritten};
pub use tag::ExtendedTag;
pub use value::NormalizedValue;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
