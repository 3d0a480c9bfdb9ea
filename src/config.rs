//! Process-wide settings read once at startup.

// std
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
// self
use crate::{
	_prelude::*,
	auth::{CredentialSource, SpreadsheetId},
	error::ConfigError,
	sheets::DEFAULT_BASE_URL,
};

/// Port used when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable names understood by [`ServerConfig::from_env`].
pub mod vars {
	/// Listen port.
	pub const PORT: &str = "PORT";
	/// Bind address.
	pub const HOST: &str = "HOST";
	/// Target spreadsheet.
	pub const SPREADSHEET_ID: &str = "SPREADSHEET_ID";
	/// Inline credential document (JSON or base64 JSON).
	pub const GOOGLE_SERVICE_ACCOUNT: &str = "GOOGLE_SERVICE_ACCOUNT";
	/// Path to a credential document.
	pub const SERVICE_ACCOUNT_KEY_PATH: &str = "SERVICE_ACCOUNT_KEY_PATH";
	/// Sheets API root override.
	pub const SHEETS_API_BASE_URL: &str = "SHEETS_API_BASE_URL";
}

/// Settings for one relay process.
#[derive(Clone, Debug)]
pub struct ServerConfig {
	/// Address the HTTP listener binds to.
	pub listen_addr: SocketAddr,
	/// Spreadsheet every request targets; `None` makes the sheet routes answer 500.
	pub spreadsheet_id: Option<SpreadsheetId>,
	/// Where service-account credentials come from.
	pub credentials: CredentialSource,
	/// Sheets API root.
	pub sheets_base_url: Url,
}
impl ServerConfig {
	/// Reads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Reads settings through `lookup`, which returns the raw value of a variable.
	///
	/// Blank values are treated as unset.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
		let port = match get(vars::PORT) {
			Some(raw) => raw
				.trim()
				.parse::<u16>()
				.map_err(|source| ConfigError::InvalidPort { value: raw.clone(), source })?,
			None => DEFAULT_PORT,
		};
		let host = match get(vars::HOST) {
			Some(raw) => raw
				.trim()
				.parse::<IpAddr>()
				.map_err(|source| ConfigError::InvalidHost { value: raw.clone(), source })?,
			None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
		};
		// Blank values are already filtered out, so construction cannot fail.
		let spreadsheet_id =
			get(vars::SPREADSHEET_ID).and_then(|raw| SpreadsheetId::new(raw.trim()).ok());
		let credentials = CredentialSource::from_settings(
			get(vars::GOOGLE_SERVICE_ACCOUNT),
			get(vars::SERVICE_ACCOUNT_KEY_PATH),
		);
		let sheets_base_url = parse_base_url(
			get(vars::SHEETS_API_BASE_URL).as_deref().unwrap_or(DEFAULT_BASE_URL),
		)?;

		Ok(Self {
			listen_addr: SocketAddr::new(host, port),
			spreadsheet_id,
			credentials,
			sheets_base_url,
		})
	}
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw.trim())
		.map_err(|source| ConfigError::InvalidUrl { value: raw.to_owned(), source })?;

	if url.cannot_be_a_base() {
		return Err(ConfigError::InvalidUrl {
			value: raw.to_owned(),
			source: url::ParseError::RelativeUrlWithCannotBeABaseBase,
		});
	}

	Ok(url)
}
