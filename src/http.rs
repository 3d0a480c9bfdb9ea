//! Outbound HTTP primitives shared by the token exchange and the Sheets gateway.
//!
//! [`ReqwestHttpClient`] is the only handle the relay uses to talk upstream. Each call site
//! captures a [`ResponseMetadata`] snapshot from the response before consuming the body so
//! error mapping can report the status and any Retry-After hint consistently.

// std
use std::ops::Deref;
// crates.io
use reqwest::{
	Response,
	header::{HeaderMap, RETRY_AFTER},
	redirect::Policy,
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::ConfigError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Metadata captured from an upstream response for downstream error mapping.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResponseMetadata {
	/// HTTP status code returned upstream.
	pub status: Option<u16>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ResponseMetadata {
	/// Snapshots status and Retry-After from a response without consuming it.
	pub fn capture(response: &Response) -> Self {
		Self {
			status: Some(response.status().as_u16()),
			retry_after: parse_retry_after(response.headers()),
		}
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// Neither the token endpoint nor the Sheets API answer with redirects, so redirect
/// following is disabled on clients built by [`ReqwestHttpClient::new`].
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub ReqwestClient);
impl ReqwestHttpClient {
	/// Builds the relay's default client.
	pub fn new() -> Result<Self, ConfigError> {
		let client = ReqwestClient::builder().user_agent(USER_AGENT).redirect(Policy::none()).build()?;

		Ok(Self(client))
	}
}
impl Deref for ReqwestHttpClient {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
