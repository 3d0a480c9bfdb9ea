//! RS256 JWT assertions for the `jwt-bearer` grant.

// crates.io
use jsonwebtoken::{Algorithm, EncodingKey, Header};
// self
use crate::{_prelude::*, auth::ServiceAccountKey, error::CredentialError};

/// Lifetime Google accepts for a service-account assertion.
pub const ASSERTION_LIFETIME: Duration = Duration::hours(1);

/// Claim set signed into the assertion.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
	/// Issuer; the service-account email.
	pub iss: String,
	/// Space-delimited scopes requested for the access token.
	pub scope: String,
	/// Audience; the token endpoint.
	pub aud: String,
	/// Issued-at, seconds since the epoch.
	pub iat: i64,
	/// Expiry, seconds since the epoch.
	pub exp: i64,
}
impl AssertionClaims {
	/// Builds the claim set for `key` at `now`.
	pub fn new(key: &ServiceAccountKey, scope: &str, now: OffsetDateTime) -> Self {
		let iat = now.unix_timestamp();

		Self {
			iss: key.client_email.to_string(),
			scope: scope.to_owned(),
			aud: key.token_uri.clone(),
			iat,
			exp: iat + ASSERTION_LIFETIME.whole_seconds(),
		}
	}
}

/// Signs an assertion for `key` requesting `scope`.
pub fn sign_assertion(
	key: &ServiceAccountKey,
	scope: &str,
	now: OffsetDateTime,
) -> Result<String, CredentialError> {
	let encoding_key = EncodingKey::from_rsa_pem(key.private_key.expose().as_bytes())
		.map_err(|source| CredentialError::InvalidPrivateKey { source })?;
	let mut header = Header::new(Algorithm::RS256);

	header.kid = key.private_key_id.clone();

	jsonwebtoken::encode(&header, &AssertionClaims::new(key, scope, now), &encoding_key)
		.map_err(|source| CredentialError::Signing { source })
}

#[cfg(test)]
mod tests {
	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use time::macros;
	// self
	use super::*;
	use crate::auth::{PrincipalId, Secret};

	fn key(private_key: &str) -> ServiceAccountKey {
		ServiceAccountKey {
			kind: Some("service_account".into()),
			project_id: Some("demo".into()),
			private_key_id: Some("kid-7".into()),
			private_key: Secret::new(private_key),
			client_email: PrincipalId::new("relay@demo.iam.gserviceaccount.com")
				.expect("Principal fixture should be valid."),
			token_uri: "https://oauth2.googleapis.com/token".into(),
		}
	}

	#[test]
	fn claims_span_one_hour_and_target_the_token_endpoint() {
		let claims = AssertionClaims::new(
			&key("unused"),
			"https://www.googleapis.com/auth/spreadsheets",
			macros::datetime!(2025-01-01 00:00 UTC),
		);

		assert_eq!(claims.iss, "relay@demo.iam.gserviceaccount.com");
		assert_eq!(claims.aud, "https://oauth2.googleapis.com/token");
		assert_eq!(claims.exp - claims.iat, 3600);
		assert_eq!(claims.iat, 1_735_689_600);
	}

	#[test]
	fn signed_assertions_carry_kid_and_claims() {
		let pem = include_str!("../../tests/fixtures/service_account_key.pem");
		let jwt = sign_assertion(&key(pem), "scope-a", OffsetDateTime::now_utc())
			.expect("Fixture key should sign.");
		let parts = jwt.split('.').collect::<Vec<_>>();

		assert_eq!(parts.len(), 3);

		let header = jsonwebtoken::decode_header(&jwt).expect("Header should decode.");

		assert_eq!(header.alg, Algorithm::RS256);
		assert_eq!(header.kid.as_deref(), Some("kid-7"));

		let claims: AssertionClaims = serde_json::from_slice(
			&URL_SAFE_NO_PAD.decode(parts[1]).expect("Claims segment should be base64url."),
		)
		.expect("Claims segment should be JSON.");

		assert_eq!(claims.scope, "scope-a");
	}

	#[test]
	fn invalid_pem_is_a_credential_error() {
		let err = sign_assertion(&key("not a pem"), "scope", OffsetDateTime::now_utc())
			.expect_err("Garbage keys must be rejected.");

		assert!(matches!(err, CredentialError::InvalidPrivateKey { .. }));
	}
}
