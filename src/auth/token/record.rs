//! Bearer token records minted for a service account, plus their builder.

// self
use crate::{
	_prelude::*,
	auth::{PrincipalId, token::secret::Secret},
};

/// Current lifecycle status for a token record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is not yet valid because the issued-at instant is in the future.
	Pending,
	/// Token is currently valid.
	Active,
	/// Token exceeded its expiry instant.
	Expired,
}

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
	/// Issued when the expiry does not come after the issued-at instant.
	#[error("Expiry must be later than the issued-at instant.")]
	NonPositiveLifetime,
	/// Issued when the relative expiry overflows the representable date range.
	#[error("Expiry is out of the representable date range.")]
	ExpiryOutOfRange,
}

/// Immutable record describing an access token minted for a service account.
#[derive(Clone)]
pub struct TokenRecord {
	/// Service account the token was minted for.
	pub principal: PrincipalId,
	/// Space-delimited OAuth scope the token was requested with.
	pub scope: String,
	/// Access token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Instant the token endpoint answered.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus expires_in.
	pub expires_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for the given principal and scope.
	pub fn builder(principal: PrincipalId, scope: impl Into<String>) -> TokenRecordBuilder {
		TokenRecordBuilder::new(principal, scope.into())
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant < self.issued_at {
			return TokenStatus::Pending;
		}
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Active
	}

	/// Returns `true` if the record has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Lifetime left at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - instant;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("principal", &self.principal)
			.field("scope", &self.scope)
			.field("access_token", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug)]
pub struct TokenRecordBuilder {
	principal: PrincipalId,
	scope: String,
	access_token: Option<Secret>,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl TokenRecordBuilder {
	fn new(principal: PrincipalId, scope: String) -> Self {
		Self { principal, scope, access_token: None, issued_at: None, expires_at: None, expires_in: None }
	}

	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(Secret::new(token));

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) =>
				issued_at.checked_add(delta).ok_or(TokenRecordBuilderError::ExpiryOutOfRange)?,
			(None, None) => return Err(TokenRecordBuilderError::MissingExpiry),
		};

		if expires_at <= issued_at {
			return Err(TokenRecordBuilderError::NonPositiveLifetime);
		}

		Ok(TokenRecord {
			principal: self.principal,
			scope: self.scope,
			access_token,
			issued_at,
			expires_at,
		})
	}
}
