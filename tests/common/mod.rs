//! Shared fixtures for the integration tests: a signing key, credential documents, and
//! resolver/gateway builders pointed at an `httpmock` server.

#![allow(dead_code, unused_imports)]

pub use std::{path::PathBuf, sync::Arc};

pub use httpmock::{Mock, prelude::*};
pub use serde_json::{Value, json};
pub use sheets_relay::{
	auth::{CredentialSource, Secret, SpreadsheetId},
	error::{CredentialError, Error, TransientError},
	http::ReqwestHttpClient,
	resolver::{CredentialResolver, SPREADSHEETS_SCOPE},
	sheets::{RangeSelector, SheetsGateway, ValueMatrix},
	url::Url,
};

/// PKCS#8 RSA key used only by tests.
pub const TEST_PRIVATE_KEY: &str = include_str!("../fixtures/service_account_key.pem");
pub const CLIENT_EMAIL: &str = "relay@demo-project.iam.gserviceaccount.com";
pub const SPREADSHEET: &str = "1BxiMVs0XRA5nFMdKvBdBZjgmUUqptlbs74OgvE2upms";

/// Credential document whose `token_uri` points at `server`.
pub fn service_account_json(server: &MockServer) -> String {
	json!({
		"type": "service_account",
		"project_id": "demo-project",
		"private_key_id": "test-kid",
		"private_key": TEST_PRIVATE_KEY,
		"client_email": CLIENT_EMAIL,
		"client_id": "100000000000000000001",
		"token_uri": format!("{}/token", plain_http_root(server)),
	})
	.to_string()
}

pub fn inline_source(server: &MockServer) -> CredentialSource {
	CredentialSource::Inline(Secret::new(service_account_json(server)))
}

pub fn resolver(source: CredentialSource) -> Arc<CredentialResolver> {
	Arc::new(CredentialResolver::new(source, ReqwestHttpClient::default()))
}

pub fn base_url(server: &MockServer) -> Url {
	Url::parse(&plain_http_root(server)).expect("Mock server base URL should parse.")
}

/// `http://` root of `server`.
///
/// With the `https` feature, `MockServer::base_url` reports an `https://` scheme whose
/// self-signed certificate reqwest rejects; the server also answers plain HTTP.
pub fn plain_http_root(server: &MockServer) -> String {
	format!("http://{}", server.address())
}

pub fn gateway(server: &MockServer, resolver: Arc<CredentialResolver>) -> SheetsGateway {
	SheetsGateway::new(ReqwestHttpClient::default(), resolver, base_url(server))
}

pub fn spreadsheet_id() -> SpreadsheetId {
	SpreadsheetId::new(SPREADSHEET).expect("Spreadsheet fixture should be valid.")
}

/// Path of the `values` resource for `encoded_range` (already percent-encoded).
pub fn values_path(encoded_range: &str) -> String {
	format!("/v4/spreadsheets/{SPREADSHEET}/values/{encoded_range}")
}

/// Token endpoint answering every assertion with `access_token`.
pub async fn mock_token<'a>(server: &'a MockServer, access_token: &str) -> Mock<'a> {
	let body = json!({
		"access_token": access_token,
		"token_type": "Bearer",
		"expires_in": 3599,
	})
	.to_string();

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(body.as_str());
		})
		.await
}

/// Writes the credential document to a unique temp file and returns its path.
pub fn write_key_file(server: &MockServer, name: &str) -> PathBuf {
	let dir = std::env::temp_dir().join(format!("sheets-relay-it-{}", std::process::id()));

	std::fs::create_dir_all(&dir).expect("Temp directory should be creatable.");

	let path = dir.join(name);

	std::fs::write(&path, service_account_json(server)).expect("Key file should be writable.");

	path
}
