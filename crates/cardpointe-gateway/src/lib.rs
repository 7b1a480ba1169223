//! CardPointe Gateway REST client.
//!
//! Configures the REST base URL and basic-auth credentials for a CardPointe
//! site, and returns data-aware responses whose [`Response::data`] decodes
//! JSON bodies on demand.
//!
//! # Quick Example
//!
//! ```no_run
//! use cardpointe::{CardPointeClient, ClientConfig};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = CardPointeClient::new(ClientConfig::new("testing", "testing123", "fts-uat"))
//!     .unwrap();
//!
//! let resp = client.get("inquireMerchant/496160873888").await.unwrap();
//! if let Some(merchant) = resp.data().unwrap().as_json() {
//!     println!("merchant: {}", merchant["merchid"]);
//! }
//! # }
//! ```

mod client;
pub mod config;
pub mod error;
pub mod middleware;
pub mod response;
pub mod transport;

pub use client::{basic_auth_header, CardPointeClient};
pub use config::ClientConfig;
pub use error::{CardPointeError, ConfigError, ParseError};
pub use middleware::{HandlerStack, ResponseStep, DATA_DECODE};
pub use response::{Response, ResponseData};
pub use transport::{ReqwestTransport, Transport};
