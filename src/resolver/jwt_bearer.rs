//! `urn:ietf:params:oauth:grant-type:jwt-bearer` exchange against the credential's token
//! endpoint.

// crates.io
use oauth2::basic::{BasicErrorResponse, BasicErrorResponseType};
// self
use crate::{
	_prelude::*,
	auth::{self, ServiceAccountKey, TokenRecord},
	error::{TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata},
};

/// Grant type sent with every assertion.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

const ENDPOINT: &str = "the token endpoint";
const BODY_PREVIEW_LEN: usize = 256;

#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<i64>,
}

/// Signs an assertion for `key` and trades it for an access token.
pub(crate) async fn exchange(
	http_client: &ReqwestHttpClient,
	key: &ServiceAccountKey,
	scope: &str,
) -> Result<TokenRecord> {
	let token_url = key.token_url()?;
	let issued_at = OffsetDateTime::now_utc();
	let assertion = auth::sign_assertion(key, scope, issued_at)?;
	let response = http_client
		.post(token_url)
		.form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
		.send()
		.await
		.map_err(|e| TransportError::network(ENDPOINT, e))?;
	let meta = ResponseMetadata::capture(&response);
	let success = response.status().is_success();
	let body = response.bytes().await.map_err(|e| TransportError::network(ENDPOINT, e))?;

	if !success {
		return Err(map_error_response(&meta, &body));
	}

	let mut de = serde_json::Deserializer::from_slice(&body);
	let parsed: TokenEndpointResponse = serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TransientError::TokenResponseParse { source, status: meta.status })?;
	let expires_in = parsed
		.expires_in
		.map(Duration::seconds)
		.unwrap_or(auth::ASSERTION_LIFETIME);

	TokenRecord::builder(key.client_email.clone(), scope)
		.access_token(parsed.access_token)
		.issued_at(issued_at)
		.expires_in(expires_in)
		.build()
		.map_err(|e| {
			TransientError::TokenEndpoint {
				message: e.to_string(),
				status: meta.status,
				retry_after: None,
			}
			.into()
		})
}

fn map_error_response(meta: &ResponseMetadata, body: &[u8]) -> Error {
	let Ok(response) = serde_json::from_slice::<BasicErrorResponse>(body) else {
		return TransientError::TokenEndpoint {
			message: body_preview(body),
			status: meta.status,
			retry_after: meta.retry_after,
		}
		.into();
	};
	let reason =
		response.error_description().cloned().unwrap_or_else(|| response.error().to_string());

	match response.error() {
		BasicErrorResponseType::InvalidGrant => Error::InvalidGrant { reason },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			Error::InvalidClient { reason },
		_ => TransientError::TokenEndpoint {
			message: reason,
			status: meta.status,
			retry_after: meta.retry_after,
		}
		.into(),
	}
}

fn body_preview(body: &[u8]) -> String {
	let text = String::from_utf8_lossy(body);

	if text.trim().is_empty() {
		return "empty response body".into();
	}

	text.chars().take(BODY_PREVIEW_LEN).collect()
}
