//! Wire types for the Sheets API values endpoints.
//!
//! Response types keep any field they do not model in `extra`, so the router can relay
//! remote payloads without dropping metadata.

// crates.io
use serde_json::{Map, Value};
// self
use crate::_prelude::*;

/// Cell region in A1 notation (`Sheet1!A1:B2`). Passed through verbatim; the remote
/// service is the only validator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeSelector(String);
impl RangeSelector {
	/// Wraps a raw range string.
	pub fn new(range: impl Into<String>) -> Self {
		Self(range.into())
	}

	/// Raw A1 notation.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for RangeSelector {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Rows of cell values, outer sequence first.
///
/// Only the shape is checked locally; cell contents go to the remote service untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValueMatrix(pub Vec<Vec<Value>>);
impl ValueMatrix {
	/// Accepts `value` only when it is an array whose elements are all arrays.
	pub fn from_json(value: Value) -> Option<Self> {
		let Value::Array(rows) = value else {
			return None;
		};

		rows.into_iter()
			.map(|row| match row {
				Value::Array(cells) => Some(cells),
				_ => None,
			})
			.collect::<Option<Vec<_>>>()
			.map(Self)
	}
}

/// `valueInputOption` sent with every write: strings are parsed as if typed into the UI
/// (numbers, dates, formulas).
pub const USER_ENTERED: &str = "USER_ENTERED";

/// `values.get` response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
	/// Range actually returned, normalized by the remote service.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub range: Option<String>,
	/// `ROWS` or `COLUMNS`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub major_dimension: Option<String>,
	/// Cell values; omitted by the remote service when the range is empty.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub values: Option<ValueMatrix>,
	/// Unmodeled fields, relayed as-is.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// `values.update` request body.
#[derive(Debug, Serialize)]
pub(crate) struct UpdateValuesRequest<'a> {
	pub(crate) values: &'a ValueMatrix,
}

/// `values.update` response summary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValuesResponse {
	/// Spreadsheet the update applied to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub spreadsheet_id: Option<String>,
	/// Range that was written, in A1 notation.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_range: Option<String>,
	/// Rows touched by the update.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_rows: Option<u64>,
	/// Columns touched by the update.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_columns: Option<u64>,
	/// Cells touched by the update.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_cells: Option<u64>,
	/// Unmodeled fields, relayed as-is.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorEnvelope {
	pub(crate) error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GoogleErrorBody {
	pub(crate) message: String,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn value_matrix_accepts_only_sequences_of_sequences() {
		assert_eq!(
			ValueMatrix::from_json(json!([["a", 1], [true]])),
			Some(ValueMatrix(vec![vec![json!("a"), json!(1)], vec![json!(true)]]))
		);
		assert_eq!(ValueMatrix::from_json(json!([])), Some(ValueMatrix::default()));

		for rejected in [json!(null), json!("a"), json!(3), json!({ "a": [] }), json!([["a"], "b"])] {
			assert_eq!(ValueMatrix::from_json(rejected.clone()), None, "{rejected} must be rejected.");
		}
	}

	#[test]
	fn value_range_relays_unmodeled_fields() {
		let raw = json!({
			"range": "Sheet1!A1:B2",
			"majorDimension": "ROWS",
			"values": [["a", "1"], ["b", "2"]],
			"etag": "abc"
		});
		let parsed: ValueRange = serde_json::from_value(raw.clone()).expect("ValueRange should parse.");

		assert_eq!(parsed.values.as_ref().map(|m| m.0.len()), Some(2));
		assert_eq!(serde_json::to_value(&parsed).expect("ValueRange should serialize."), raw);

		let empty: ValueRange =
			serde_json::from_value(json!({ "range": "Sheet1!Z1", "majorDimension": "ROWS" }))
				.expect("Empty ranges omit values.");

		assert_eq!(empty.values, None);
	}

	#[test]
	fn update_summary_round_trips_unchanged() {
		let raw = json!({
			"spreadsheetId": "sheet-123",
			"updatedRange": "Sheet1!A1:B2",
			"updatedRows": 2,
			"updatedColumns": 2,
			"updatedCells": 4
		});
		let parsed: UpdateValuesResponse =
			serde_json::from_value(raw.clone()).expect("Summary should parse.");

		assert_eq!(parsed.updated_rows, Some(2));
		assert_eq!(serde_json::to_value(&parsed).expect("Summary should serialize."), raw);
	}
}
