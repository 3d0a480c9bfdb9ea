//! Secret wrapper that redacts sensitive material.

// self
use crate::_prelude::*;

/// Redacted secret wrapper keeping access tokens and private keys out of logs.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
