//! HTTP surface: liveness plus read/write of a range in the configured spreadsheet.
//!
//! Handlers validate what they can locally (spreadsheet configured, write payload shape)
//! before touching the gateway, and every gateway failure is converted into a JSON error
//! body here so nothing escapes the request.

// crates.io
use axum::{
	Json, Router,
	extract::{Path as UrlPath, State, rejection::JsonRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::get,
};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
// self
use crate::{
	_prelude::*,
	auth::SpreadsheetId,
	config::ServerConfig,
	error::ConfigError,
	http::ReqwestHttpClient,
	resolver::CredentialResolver,
	sheets::{RangeSelector, SheetsGateway, UpdateValuesResponse, ValueMatrix, ValueRange},
};

/// Body returned by `GET /`.
pub const LIVENESS_BODY: &str = "Google Sheets API server is running";

/// State shared by every handler.
#[derive(Debug)]
pub struct AppState {
	/// Spreadsheet every request targets.
	pub spreadsheet_id: Option<SpreadsheetId>,
	/// Upstream gateway.
	pub gateway: SheetsGateway,
}
impl AppState {
	/// Wires the resolver and gateway described by `config`.
	pub fn from_config(config: &ServerConfig) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::new()?;
		let resolver =
			Arc::new(CredentialResolver::new(config.credentials.clone(), http_client.clone()));
		let gateway = SheetsGateway::new(http_client, resolver, config.sheets_base_url.clone());

		Ok(Self { spreadsheet_id: config.spreadsheet_id.clone(), gateway })
	}

	fn spreadsheet_id(&self) -> Result<&SpreadsheetId, ApiError> {
		self.spreadsheet_id.as_ref().ok_or(ApiError::SpreadsheetNotConfigured)
	}
}

/// Request-terminating failures, each mapped to a status code and JSON body.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// No spreadsheet is configured.
	#[error("Spreadsheet ID not configured")]
	SpreadsheetNotConfigured,
	/// Write body lacks a `values` sequence of sequences.
	#[error("Missing or invalid \"values\" in request body")]
	InvalidValues,
	/// Gateway failed during a read.
	#[error("Failed to retrieve spreadsheet data")]
	ReadFailed(#[source] Error),
	/// Gateway failed during a write.
	#[error("Failed to update spreadsheet data")]
	WriteFailed(#[source] Error),
}
impl ApiError {
	/// Status code for this failure.
	pub fn status(&self) -> StatusCode {
		match self {
			Self::InvalidValues => StatusCode::BAD_REQUEST,
			Self::SpreadsheetNotConfigured | Self::ReadFailed(_) | Self::WriteFailed(_) =>
				StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let status = self.status();
		// Write failures echo the upstream cause so callers can see why a range was refused.
		let details = match &self {
			Self::ReadFailed(cause) => {
				tracing::error!(error = %cause, "failed to read spreadsheet range");

				None
			},
			Self::WriteFailed(cause) => {
				tracing::error!(error = %cause, "failed to update spreadsheet range");

				Some(cause.to_string())
			},
			Self::SpreadsheetNotConfigured => {
				tracing::error!("SPREADSHEET_ID is not configured");

				None
			},
			Self::InvalidValues => None,
		};

		(status, Json(ErrorBody { error: self.to_string(), details })).into_response()
	}
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	details: Option<String>,
}

/// Builds the relay's router.
pub fn router(state: Arc<AppState>) -> Router {
	Router::new()
		.route("/", get(liveness))
		.route("/api/sheets/:range", get(read_range).put(write_range))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(state)
}

async fn liveness() -> &'static str {
	LIVENESS_BODY
}

async fn read_range(
	State(state): State<Arc<AppState>>,
	UrlPath(range): UrlPath<String>,
) -> Result<Json<ValueRange>, ApiError> {
	let spreadsheet_id = state.spreadsheet_id()?;

	state
		.gateway
		.read_range(spreadsheet_id, &RangeSelector::new(range))
		.await
		.map(Json)
		.map_err(ApiError::ReadFailed)
}

async fn write_range(
	State(state): State<Arc<AppState>>,
	UrlPath(range): UrlPath<String>,
	payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<UpdateValuesResponse>, ApiError> {
	let spreadsheet_id = state.spreadsheet_id()?;
	// A body that is not JSON (by content type or syntax) counts as one without `values`.
	let values =
		payload.ok().and_then(|Json(body)| parse_values(body)).ok_or(ApiError::InvalidValues)?;

	state
		.gateway
		.write_range(spreadsheet_id, &RangeSelector::new(range), &values)
		.await
		.map(Json)
		.map_err(ApiError::WriteFailed)
}

fn parse_values(body: Value) -> Option<ValueMatrix> {
	let Value::Object(mut payload) = body else {
		return None;
	};

	ValueMatrix::from_json(payload.remove("values")?)
}
