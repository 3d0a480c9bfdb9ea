//! Small HTTP relay that reads and writes Google Sheets ranges on behalf of a service account.
//!
//! The crate is split along the request path: [`config`] loads process-wide settings,
//! [`resolver`] turns a service-account credential into a bearer token, [`sheets`] issues the
//! `values.get` / `values.update` calls, and `api` (behind the `server` feature) exposes both
//! operations over HTTP.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(feature = "server")] pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod resolver;
pub mod sheets;

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		path::PathBuf,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(feature = "server")] use {color_eyre as _, dotenvy as _, tracing_subscriber as _};
#[cfg(test)] use {httpmock as _, tower as _};
