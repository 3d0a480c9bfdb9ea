//! Credential resolution with token caching + singleflight guards.
//!
//! [`CredentialResolver::resolve`] hands out an [`AuthenticatedClient`] for the configured
//! service account. A minted token is cached and reused until it enters the preemptive
//! window before expiry. Concurrent callers that find the cache stale queue on one guard so
//! only the first of them calls the token endpoint; the rest pick up its result. A failed
//! mint leaves the cache untouched, so the next request simply tries again.

pub mod jwt_bearer;

// crates.io
use reqwest::RequestBuilder;
// self
use crate::{
	_prelude::*,
	auth::{CredentialSource, TokenRecord},
	http::ReqwestHttpClient,
	obs::{self, OpSpan, Operation, Outcome},
};

/// OAuth scope granting read/write access to spreadsheet values.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Bearer credentials ready to be attached to a Sheets API request.
#[derive(Clone, Debug)]
pub struct AuthenticatedClient {
	token: TokenRecord,
}
impl AuthenticatedClient {
	/// Wraps a minted token.
	pub fn new(token: TokenRecord) -> Self {
		Self { token }
	}

	/// Token backing this client.
	pub fn token(&self) -> &TokenRecord {
		&self.token
	}

	/// Adds the `Authorization: Bearer` header to `request`.
	pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
		request.bearer_auth(self.token.access_token.expose())
	}
}

/// Decides when a cached token must be replaced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefreshPolicy {
	/// Tokens with this much lifetime left (or less) are minted again.
	pub preemptive_window: Duration,
}
impl RefreshPolicy {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Determines whether the cached record should be replaced at `now`.
	pub fn should_refresh(&self, record: &TokenRecord, now: OffsetDateTime) -> bool {
		if record.is_expired_at(now) {
			return true;
		}

		record.remaining_at(now) <= self.preemptive_window
	}
}
impl Default for RefreshPolicy {
	fn default() -> Self {
		Self { preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW }
	}
}

/// Turns a [`CredentialSource`] into authenticated clients, caching the minted token.
pub struct CredentialResolver {
	source: CredentialSource,
	scope: String,
	http_client: ReqwestHttpClient,
	policy: RefreshPolicy,
	cached: RwLock<Option<TokenRecord>>,
	mint_guard: AsyncMutex<()>,
}
impl CredentialResolver {
	/// Creates a resolver requesting [`SPREADSHEETS_SCOPE`].
	pub fn new(source: CredentialSource, http_client: ReqwestHttpClient) -> Self {
		Self {
			source,
			scope: SPREADSHEETS_SCOPE.into(),
			http_client,
			policy: RefreshPolicy::default(),
			cached: RwLock::new(None),
			mint_guard: AsyncMutex::new(()),
		}
	}

	/// Snapshot of the cached token, if any.
	pub fn cached_token(&self) -> Option<TokenRecord> {
		self.cached.read().clone()
	}

	/// Drops the cached token so the next [`resolve`](Self::resolve) mints a new one.
	pub fn invalidate(&self) {
		self.cached.write().take();
	}

	/// Returns a client backed by a fresh token, minting one when the cache is stale.
	pub async fn resolve(&self) -> Result<AuthenticatedClient> {
		if let Some(token) = self.fresh_token(OffsetDateTime::now_utc()) {
			return Ok(AuthenticatedClient::new(token));
		}

		let _singleflight = self.mint_guard.lock().await;

		// Another caller may have minted while this one waited on the guard.
		if let Some(token) = self.fresh_token(OffsetDateTime::now_utc()) {
			return Ok(AuthenticatedClient::new(token));
		}

		let token = self.mint().await?;

		*self.cached.write() = Some(token.clone());

		Ok(AuthenticatedClient::new(token))
	}

	fn fresh_token(&self, now: OffsetDateTime) -> Option<TokenRecord> {
		self.cached.read().as_ref().filter(|record| !self.policy.should_refresh(record, now)).cloned()
	}

	async fn mint(&self) -> Result<TokenRecord> {
		const OP: Operation = Operation::TokenExchange;

		let span = OpSpan::new(OP, self.source.kind());

		obs::record_outcome(OP, Outcome::Attempt);

		let result = span
			.instrument(async {
				let key = self.source.load().await.map_err(Error::from)?;

				jwt_bearer::exchange(&self.http_client, &key, &self.scope).await
			})
			.await;

		if let Err(e) = &result {
			obs::warn_event(OP, &format!("token exchange failed: {e}"));
		}

		obs::record_outcome(OP, Outcome::of(&result));

		result
	}
}
impl Debug for CredentialResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialResolver")
			.field("source", &self.source.kind())
			.field("scope", &self.scope)
			.field("policy", &self.policy)
			.field("token_cached", &self.cached.read().is_some())
			.finish()
	}
}
