//! REST transport for Parley.
//!
//! Binds the abstract transport seam to the chat service's HTTP API:
//! [`HttpTransport`] implements `ChatTransport` over `reqwest`, and the
//! wire module owns the translation between the server's response
//! envelope and the core model types.
//!
//! ```no_run
//! use parley_app::ChatSession;
//! use parley_core::UserId;
//! use parley_http::{HttpConfig, HttpTransport};
//!
//! # fn main() -> Result<(), parley_http::HttpConfigError> {
//! let config = HttpConfig::new("https://api.example.com/api")
//!     .with_bearer_token("token-from-login");
//! let transport = HttpTransport::new(config)?;
//! let session = ChatSession::new(transport, UserId(42));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod wire;

pub use client::{HttpConfig, HttpConfigError, HttpTransport};
