//! Optional observability helpers for relay operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default through `server`) to emit structured spans named
//!   `sheets_relay.op` with the `op` and `stage` fields.
//! - Enable `metrics` to increment the `sheets_relay_operation_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Upstream operations observed by the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Service-account assertion exchanged for an access token.
	TokenExchange,
	/// `values.get` against the Sheets API.
	ReadRange,
	/// `values.update` against the Sheets API.
	WriteRange,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::TokenExchange => "token_exchange",
			Operation::ReadRange => "read_range",
			Operation::WriteRange => "write_range",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}

	/// Maps a result to its terminal outcome.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { Outcome::Success } else { Outcome::Failure }
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
