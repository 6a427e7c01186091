//! Depanku Remote - HTTP adapter for the Depanku collection API.
//!
//! Implements [`depanku_core::remote::RemoteCollectionApi`] over the REST
//! endpoints serving the signed-in user's applications, listings and
//! bookmarks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use depanku_remote::{DepankuClient, DEFAULT_TIMEOUT};
//!
//! let client = DepankuClient::new("https://api.depanku.id", DEFAULT_TIMEOUT)?;
//! let bookmarks = client.get_bookmarks("id_token").await?;
//! ```

mod client;
mod error;
mod types;

pub use client::{DepankuClient, DEFAULT_TIMEOUT};
pub use error::{RemoteError, Result};
pub use types::*;
