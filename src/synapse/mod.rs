//! Synapse homeserver transport
//!
//! # Module Structure
//!
//! - [`transport`] - The [`Transport`] trait and request type
//! - [`http`] - reqwest-backed implementation with bearer auth and retry
//! - [`backoff`] - Exponential backoff policy used for retried requests
//! - [`error`] - Typed transport errors
//!
//! # Example
//!
//! ```ignore
//! use syncli::synapse::{Request, SynapseHttpClient, Transport};
//!
//! async fn example() -> anyhow::Result<()> {
//!     let client = SynapseHttpClient::new("https://matrix.example.org", "token", timeout)?;
//!     let deadline = tokio::time::Instant::now() + timeout;
//!     let body = client.call(&Request::get("/_matrix/client/versions"), deadline, true).await?;
//!     Ok(())
//! }
//! ```

pub mod backoff;
pub mod error;
pub mod http;
pub mod transport;

pub use error::{format_synapse_error, TransportError};
pub use http::SynapseHttpClient;
pub use transport::{Request, Transport};
