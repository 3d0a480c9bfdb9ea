//! Sheets API v4 gateway for the two values operations the relay forwards.
//!
//! Each call resolves credentials, then issues exactly one request. Nothing is retried and
//! nothing is cached; a `401` from the API drops the cached token so the following call
//! starts from a fresh mint.

pub mod model;

pub use model::*;

// crates.io
use reqwest::{Method, Response};
// self
use crate::{
	_prelude::*,
	auth::SpreadsheetId,
	error::{ConfigError, TransientError, TransportError},
	http::ReqwestHttpClient,
	obs::{self, OpSpan, Operation, Outcome},
	resolver::CredentialResolver,
};

/// Production Sheets API root.
pub const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/";

const ENDPOINT: &str = "the Sheets API";

/// Reads and writes value ranges on behalf of the resolver's service account.
#[derive(Clone, Debug)]
pub struct SheetsGateway {
	http_client: ReqwestHttpClient,
	resolver: Arc<CredentialResolver>,
	base_url: Url,
}
impl SheetsGateway {
	/// Creates a gateway against `base_url`, normally [`DEFAULT_BASE_URL`].
	pub fn new(
		http_client: ReqwestHttpClient,
		resolver: Arc<CredentialResolver>,
		base_url: Url,
	) -> Self {
		Self { http_client, resolver, base_url }
	}

	/// Resolver used to authenticate each call.
	pub fn resolver(&self) -> &Arc<CredentialResolver> {
		&self.resolver
	}

	/// Fetches the values in `range`.
	pub async fn read_range(
		&self,
		spreadsheet_id: &SpreadsheetId,
		range: &RangeSelector,
	) -> Result<ValueRange> {
		const OP: Operation = Operation::ReadRange;

		let span = OpSpan::new(OP, "values.get");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let url = self.values_url(spreadsheet_id, range)?;
				let response = self.send(Method::GET, url, None).await?;

				decode(response).await
			})
			.await;

		obs::record_outcome(OP, Outcome::of(&result));

		result
	}

	/// Overwrites `range` with `values`, letting the API parse them as user-entered input.
	pub async fn write_range(
		&self,
		spreadsheet_id: &SpreadsheetId,
		range: &RangeSelector,
		values: &ValueMatrix,
	) -> Result<UpdateValuesResponse> {
		const OP: Operation = Operation::WriteRange;

		let span = OpSpan::new(OP, "values.update");

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let mut url = self.values_url(spreadsheet_id, range)?;

				url.query_pairs_mut().append_pair("valueInputOption", USER_ENTERED);

				let body = UpdateValuesRequest { values };
				let response = self.send(Method::PUT, url, Some(&body)).await?;

				decode(response).await
			})
			.await;

		obs::record_outcome(OP, Outcome::of(&result));

		result
	}

	fn values_url(&self, spreadsheet_id: &SpreadsheetId, range: &RangeSelector) -> Result<Url> {
		let mut endpoint = self.base_url.clone();

		endpoint
			.path_segments_mut()
			.map_err(|_| ConfigError::InvalidUrl {
				value: self.base_url.to_string(),
				source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
			})?
			.pop_if_empty()
			.extend(["v4", "spreadsheets", spreadsheet_id.as_ref(), "values", range.as_str()]);

		Ok(endpoint)
	}

	async fn send(
		&self,
		method: Method,
		url: Url,
		body: Option<&UpdateValuesRequest<'_>>,
	) -> Result<Response> {
		let client = self.resolver.resolve().await?;
		let mut request = client.authorize(self.http_client.request(method, url));

		if let Some(body) = body {
			request = request.json(body);
		}

		let response = request.send().await.map_err(|e| TransportError::network(ENDPOINT, e))?;

		if response.status().is_success() {
			return Ok(response);
		}

		let status = response.status().as_u16();
		let body = response.text().await.unwrap_or_default();
		let err = Error::Remote { status, message: remote_message(&body) };

		if err.is_unauthorized() {
			obs::warn_event(Operation::TokenExchange, "Sheets API rejected the cached token");
			self.resolver.invalidate();
		}

		Err(err)
	}
}

async fn decode<T>(response: Response) -> Result<T>
where
	T: for<'de> Deserialize<'de>,
{
	let body = response.bytes().await.map_err(|e| TransportError::network(ENDPOINT, e))?;
	let mut de = serde_json::Deserializer::from_slice(&body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| TransientError::SheetsResponseParse { source }.into())
}

fn remote_message(body: &str) -> String {
	match serde_json::from_str::<GoogleErrorEnvelope>(body) {
		Ok(envelope) => envelope.error.message,
		Err(_) if body.trim().is_empty() => "empty response body".into(),
		Err(_) => body.trim().to_owned(),
	}
}
