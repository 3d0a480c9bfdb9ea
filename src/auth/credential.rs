//! Service-account credential documents and the policy that decides where they come from.
//!
//! A [`CredentialSource`] is fixed once from configuration. Loading is deferred until a token
//! must be minted, so a key file that appears (or is repaired) after startup is picked up by
//! the next request, and a broken source only fails the requests that need it.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{
	_prelude::*,
	auth::{PrincipalId, Secret},
	error::CredentialError,
};

/// Token endpoint used when a credential document omits `token_uri`.
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

const SERVICE_ACCOUNT_TYPE: &str = "service_account";

/// Parsed service-account credential document.
///
/// Only the fields needed to mint an access token are kept; anything else in the JSON key
/// file is ignored.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceAccountKey {
	/// Document type; Google writes `service_account`.
	#[serde(rename = "type", default)]
	pub kind: Option<String>,
	/// Owning Google Cloud project.
	#[serde(default)]
	pub project_id: Option<String>,
	/// Key identifier advertised as the JWT `kid`.
	#[serde(default)]
	pub private_key_id: Option<String>,
	/// PEM-encoded RSA private key.
	pub private_key: Secret,
	/// Service-account identity, used as the assertion issuer.
	pub client_email: PrincipalId,
	/// OAuth token endpoint the assertion is exchanged at.
	#[serde(default = "default_token_uri")]
	pub token_uri: String,
}
impl ServiceAccountKey {
	/// Parses a JSON credential document, reporting the failing field path on error.
	pub fn from_json(raw: &str) -> Result<Self, serde_path_to_error::Error<serde_json::Error>> {
		let mut de = serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(&mut de)
	}

	/// Parses the configured `token_uri`.
	pub fn token_url(&self) -> Result<Url, CredentialError> {
		Url::parse(&self.token_uri).map_err(|source| CredentialError::InvalidTokenUri { source })
	}

	fn ensure_service_account(self) -> Result<Self, CredentialError> {
		match self.kind.as_deref() {
			None | Some(SERVICE_ACCOUNT_TYPE) => Ok(self),
			Some(other) => Err(CredentialError::UnsupportedType { kind: other.to_owned() }),
		}
	}
}

/// Where the service-account credential is read from, in priority order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CredentialSource {
	/// Credential document supplied directly through configuration.
	Inline(Secret),
	/// Path to a credential document, read whenever a token is minted.
	File(PathBuf),
	/// Nothing configured; every resolution fails.
	Unconfigured,
}
impl CredentialSource {
	/// Picks the source from raw settings. Inline wins over a path; blank values count as unset.
	pub fn from_settings(inline: Option<String>, key_path: Option<String>) -> Self {
		let inline = inline.filter(|v| !v.trim().is_empty());
		let key_path = key_path.filter(|v| !v.trim().is_empty());

		match (inline, key_path) {
			(Some(document), _) => Self::Inline(Secret::new(document)),
			(None, Some(path)) => Self::File(PathBuf::from(path)),
			(None, None) => Self::Unconfigured,
		}
	}

	/// Stable label suitable for logs.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Inline(_) => "inline",
			Self::File(_) => "file",
			Self::Unconfigured => "unconfigured",
		}
	}

	/// Loads and parses the credential document.
	pub async fn load(&self) -> Result<ServiceAccountKey, CredentialError> {
		let key = match self {
			Self::Inline(document) => {
				let raw = decode_inline(document.expose())?;

				ServiceAccountKey::from_json(&raw)
					.map_err(|source| CredentialError::MalformedInline { source })?
			},
			Self::File(path) => {
				let raw = tokio::fs::read_to_string(path).await.map_err(|source| {
					CredentialError::FileUnavailable { path: path.clone(), source }
				})?;

				ServiceAccountKey::from_json(&raw)
					.map_err(|source| CredentialError::MalformedFile { path: path.clone(), source })?
			},
			Self::Unconfigured => return Err(CredentialError::NoCredentialConfigured),
		};

		key.ensure_service_account()
	}
}

fn default_token_uri() -> String {
	DEFAULT_TOKEN_URI.into()
}

// Raw JSON starts with `{`; anything else is standard base64 of the document.
fn decode_inline(document: &str) -> Result<String, CredentialError> {
	let trimmed = document.trim();

	if trimmed.starts_with('{') {
		return Ok(trimmed.to_owned());
	}

	let bytes =
		STANDARD.decode(trimmed).map_err(|source| CredentialError::InlineEncoding { source })?;

	Ok(String::from_utf8_lossy(&bytes).into_owned())
}
