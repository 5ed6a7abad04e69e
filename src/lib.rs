//! # ucloud-storage
//!
//! Client SDK for kt ucloud storage, an OpenStack-Swift-style object store.
//!
//! ## Features
//!
//! - **One client, three tiers**: account, container and object operations
//!   behind a single [`UcloudClient`]
//! - **Typed results**: every operation returns status, headers and a lazily
//!   readable body; status interpretation stays with the caller
//! - **Lazy re-authentication**: expiring tokens are refreshed transparently
//!   before a request goes out
//! - **Shareable**: the session descriptor is immutable and swapped behind a
//!   lock, so one client instance works across tasks
//!
//! ## Example
//!
//! ```rust,ignore
//! use ucloud_storage::{Config, UcloudClient};
//!
//! #[tokio::main]
//! async fn main() -> ucloud_storage::Result<()> {
//!     let client = UcloudClient::new(Config::new(
//!         "https://api.ucloudbiz.olleh.com/storage/v1/auth",
//!         "user@example.com",
//!         "api-key",
//!     ))?;
//!
//!     // Create a container
//!     let created = client.put_container("backups", Default::default()).await?;
//!     assert!(created.is_success());
//!
//!     // Upload and read back an object
//!     client
//!         .put_object("backups", "hello.txt", "Hello, World!", Default::default())
//!         .await?;
//!     let response = client.get_object("backups", "hello.txt").await?;
//!     let data = response.body.bytes().await?;
//!     println!("{}", String::from_utf8_lossy(&data));
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod headers;
mod session;
mod transport;
mod types;

pub use client::UcloudClient;
pub use config::Config;
pub use error::{ClientError, Result};
pub use headers::{meta_header_name, user_metadata, MetaScope};
pub use session::Session;
pub use transport::{ApiRequest, ApiResponse, HttpTransport, RequestBody, ResponseBody, Transport};
pub use types::*;
