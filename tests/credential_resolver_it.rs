mod common;

// self
use common::*;

#[tokio::test]
async fn inline_credentials_mint_once_and_reuse_the_token() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "ya29.inline").await;
	let resolver = resolver(inline_source(&server));
	let first = resolver.resolve().await.expect("Initial resolution should succeed.");
	let second = resolver.resolve().await.expect("Cached resolution should succeed.");

	assert_eq!(first.token().access_token.expose(), "ya29.inline");
	assert_eq!(second.token().access_token.expose(), "ya29.inline");
	assert_eq!(first.token().principal.to_string(), CLIENT_EMAIL);
	assert_eq!(first.token().scope, SPREADSHEETS_SCOPE);

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_resolutions_share_one_mint() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "ya29.guard").await;
	let resolver = resolver(inline_source(&server));
	let (first, second, third) =
		tokio::join!(resolver.resolve(), resolver.resolve(), resolver.resolve());

	for client in [first, second, third] {
		let client = client.expect("Concurrent resolution should succeed.");

		assert_eq!(client.token().access_token.expose(), "ya29.guard");
	}

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn invalidate_forces_a_new_mint() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "ya29.again").await;
	let resolver = resolver(inline_source(&server));

	resolver.resolve().await.expect("Initial resolution should succeed.");
	resolver.invalidate();

	assert!(resolver.cached_token().is_none());

	resolver.resolve().await.expect("Resolution after invalidation should succeed.");

	mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn key_files_are_read_when_a_token_is_needed() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "ya29.file").await;
	let path = std::env::temp_dir()
		.join(format!("sheets-relay-it-{}", std::process::id()))
		.join("late-key.json");
	let _ = std::fs::remove_file(&path);
	let resolver = resolver(CredentialSource::File(path.clone()));
	let err = resolver.resolve().await.expect_err("A missing key file must fail resolution.");

	assert!(matches!(
		err,
		Error::Credential(CredentialError::FileUnavailable { path: ref p, .. }) if *p == path
	));

	mock.assert_calls_async(0).await;

	// The file appears after startup; the next call picks it up.
	let written = write_key_file(&server, "late-key.json");

	assert_eq!(written, path);

	let client = resolver.resolve().await.expect("Resolution should succeed once the file exists.");

	assert_eq!(client.token().access_token.expose(), "ya29.file");

	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn malformed_inline_credentials_fail_every_call_without_contacting_the_endpoint() {
	let server = MockServer::start_async().await;
	let mock = mock_token(&server, "never").await;
	let resolver = resolver(CredentialSource::Inline(Secret::new("{\"client_email\": ")));

	for _ in 0..2 {
		let err = resolver.resolve().await.expect_err("Malformed JSON must fail resolution.");

		assert!(matches!(err, Error::Credential(CredentialError::MalformedInline { .. })));
	}

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn rejected_assertions_map_to_invalid_grant_and_do_not_poison_the_cache() {
	let server = MockServer::start_async().await;
	let mut rejecting = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Invalid JWT Signature.\"}",
			);
		})
		.await;
	let resolver = resolver(inline_source(&server));
	let err = resolver.resolve().await.expect_err("Rejected assertions must surface.");

	assert!(matches!(err, Error::InvalidGrant { ref reason } if reason == "Invalid JWT Signature."));
	assert!(resolver.cached_token().is_none());

	rejecting.assert_async().await;
	rejecting.delete_async().await;

	let accepting = mock_token(&server, "ya29.recovered").await;
	let client = resolver.resolve().await.expect("The next call should mint again.");

	assert_eq!(client.token().access_token.expose(), "ya29.recovered");

	accepting.assert_calls_async(1).await;
}

#[tokio::test]
async fn unavailable_token_endpoints_are_transient_with_retry_hints() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(503).header("retry-after", "7").body("backend unavailable");
		})
		.await;
	let err = resolver(inline_source(&server))
		.resolve()
		.await
		.expect_err("5xx token responses must surface.");

	match err {
		Error::Transient(TransientError::TokenEndpoint { message, status, retry_after }) => {
			assert_eq!(message, "backend unavailable");
			assert_eq!(status, Some(503));
			assert_eq!(retry_after.map(|d| d.whole_seconds()), Some(7));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	mock.assert_async().await;
}

#[tokio::test]
async fn out_of_range_lifetimes_are_reported_as_token_endpoint_faults() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(200).json_body(json!({
				"access_token": "ya29.forever",
				"token_type": "Bearer",
				"expires_in": i64::MAX,
			}));
		})
		.await;
	let resolver = resolver(inline_source(&server));
	let err = resolver.resolve().await.expect_err("Unrepresentable expiries must fail the mint.");

	assert!(matches!(
		err,
		Error::Transient(TransientError::TokenEndpoint { status: Some(200), .. })
	));
	assert!(resolver.cached_token().is_none());

	mock.assert_async().await;
}
