//! Relay-level error types shared across the resolver, gateway, and router.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;
type JsonPathError = serde_path_to_error::Error<serde_json::Error>;

/// Canonical relay error exposed by public APIs.
///
/// Every gateway operation returns this type; the router maps all variants to `500`.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Service-account credential could not be loaded or used.
	#[error(transparent)]
	Credential(#[from] CredentialError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Token endpoint rejected the signed assertion.
	#[error("Token endpoint rejected the assertion grant: {reason}.")]
	InvalidGrant {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Token endpoint does not recognize the service account.
	#[error("Service account authentication failed: {reason}.")]
	InvalidClient {
		/// Provider-supplied reason string.
		reason: String,
	},
	/// Sheets API answered with a non-success status.
	#[error("Sheets API responded with status {status}: {message}")]
	Remote {
		/// HTTP status code returned by the Sheets API.
		status: u16,
		/// Message extracted from the Google error envelope, or the raw body.
		message: String,
	},
}
impl Error {
	/// Returns `true` when the remote service rejected the bearer token.
	pub fn is_unauthorized(&self) -> bool {
		matches!(self, Self::Remote { status: 401, .. })
	}
}

/// Configuration and validation failures raised while wiring the relay.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// `PORT` cannot be parsed.
	#[error("Port `{value}` is invalid.")]
	InvalidPort {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: std::num::ParseIntError,
	},
	/// `HOST` cannot be parsed.
	#[error("Bind address `{value}` is invalid.")]
	InvalidHost {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: std::net::AddrParseError,
	},
	/// A configured URL cannot be parsed.
	#[error("URL `{value}` is invalid.")]
	InvalidUrl {
		/// Raw configured value.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures while locating, parsing, or signing with a service-account credential.
#[derive(Debug, ThisError)]
pub enum CredentialError {
	/// Neither an inline document nor a key path is configured.
	#[error("No service account credential is configured.")]
	NoCredentialConfigured,
	/// Inline credential is neither JSON nor base64-encoded JSON.
	#[error("Inline service account credential is not valid base64.")]
	InlineEncoding {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Inline credential could not be parsed.
	#[error("Inline service account credential is malformed.")]
	MalformedInline {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Credential file could not be read.
	#[error("Service account key file {} is unavailable.", path.display())]
	FileUnavailable {
		/// Configured key path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Credential file could not be parsed.
	#[error("Service account key file {} is malformed.", path.display())]
	MalformedFile {
		/// Configured key path.
		path: PathBuf,
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
	/// Credential document describes something other than a service account.
	#[error("Credential type `{kind}` is not supported; expected `service_account`.")]
	UnsupportedType {
		/// The `type` field found in the document.
		kind: String,
	},
	/// Credential document names a token endpoint that is not a URL.
	#[error("Credential token_uri is invalid.")]
	InvalidTokenUri {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Private key is not a usable RSA PEM.
	#[error("Service account private key is not a valid RSA PEM.")]
	InvalidPrivateKey {
		/// Underlying key decoding failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// Assertion could not be signed.
	#[error("Failed to sign the service account assertion.")]
	Signing {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or relay-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Sheets API returned a success status with a body that could not be parsed.
	#[error("Sheets API returned malformed JSON.")]
	SheetsResponseParse {
		/// Structured parsing failure.
		#[source]
		source: JsonPathError,
	},
}

/// Transport-level failures.
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Which upstream was being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(endpoint: &'static str, src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}
