//! Strongly typed identifiers for the spreadsheet target and the service-account principal.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal, $validate:ident) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				$validate($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				$validate($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

// Long enough for service-account emails.
const IDENTIFIER_MAX_LEN: usize = 254;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (spreadsheet, principal).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (spreadsheet, principal).
		kind: &'static str,
	},
	/// The identifier contains a path separator and cannot be used as a URL segment.
	#[error("{kind} identifier contains a `/`.")]
	ContainsSlash {
		/// Kind of identifier (spreadsheet, principal).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (spreadsheet, principal).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! {
	SpreadsheetId,
	"Identifier of the remote spreadsheet document every request targets.\n\nOpaque: any non-empty string is accepted and percent-encoded when forwarded.",
	"Spreadsheet",
	validate_opaque
}
def_id! {
	PrincipalId,
	"Service-account identity (its `client_email`) that tokens are minted for.",
	"Principal",
	validate_view
}

fn validate_opaque(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}

	Ok(())
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	validate_opaque(kind, view)?;

	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.contains('/') {
		return Err(IdentifierError::ContainsSlash { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
