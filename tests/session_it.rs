#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use token_handshake::{
	_preludet::*,
	auth::TokenStatus,
	ext::AuthorizationHeaderSigner,
	oauth2::http::Request,
};

const ACCOUNT: &str = "svc-orders";
const SECRET: &str = "hunter2";

fn rfc3339(instant: OffsetDateTime) -> String {
	instant.format(&Rfc3339).expect("Test instant should format as RFC 3339.")
}

struct SecurityMocks<'a> {
	code: httpmock::Mock<'a>,
	tokens: httpmock::Mock<'a>,
	access_token: String,
}

/// Mocks the code + token handshake; the issued token expires at `expiry` and fails at `failure`.
async fn mock_handshake(
	server: &MockServer,
	expiry: OffsetDateTime,
	failure: OffsetDateTime,
) -> SecurityMocks<'_> {
	let access_token =
		encode_test_access_token(&json!({ "id": "u-42", "userName": "Orders", "account": ACCOUNT }));
	let code = server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/codes").query_param("account", ACCOUNT);
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "successful": true, "data": { "id": "code-9", "stamp": "st" } }));
		})
		.await;
	let tokens = server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/tokens").query_param("id", "code-9");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"successful": true,
				"data": {
					"accessToken": access_token,
					"refreshToken": "refresh-9",
					"expiryTime": rfc3339(expiry),
					"failureTime": rfc3339(failure),
				}
			}));
		})
		.await;

	SecurityMocks { code, tokens, access_token }
}

#[tokio::test]
async fn first_resolve_acquires_once_and_then_hits_the_cache() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now + Duration::minutes(30), now + Duration::hours(8)).await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);
	let token = session.resolve().await.expect("First resolve should acquire a token.");

	assert_eq!(token.expose(), mocks.access_token);

	let (a, b, c) = tokio::join!(session.resolve(), session.resolve(), session.resolve());

	for token in [a, b, c] {
		assert_eq!(token.expect("Cached resolve should succeed.").expose(), mocks.access_token);
	}

	mocks.code.assert_calls_async(1).await;
	mocks.tokens.assert_calls_async(1).await;

	let claims = session.claims().await.expect("Claims should resolve from the cache.");

	assert_eq!(claims.user_name.as_deref(), Some("Orders"));
	assert_eq!(claims.account.as_deref(), Some(ACCOUNT));
	mocks.code.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_first_resolves_share_one_acquisition() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now + Duration::minutes(30), now + Duration::hours(8)).await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);
	let (a, b, c) = tokio::join!(session.resolve(), session.resolve(), session.resolve());
	let tokens = [a, b, c]
		.map(|token| token.expect("Concurrent resolve should succeed.").expose().to_owned());

	assert!(tokens.iter().all(|token| token == &mocks.access_token));

	mocks.code.assert_calls_async(1).await;
	mocks.tokens.assert_calls_async(1).await;
}

#[tokio::test]
async fn soft_expired_tokens_are_refreshed_without_reacquiring() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now - Duration::minutes(1), now + Duration::hours(8)).await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(PUT).path("/security/v1.0/tokens").body("\"refresh-9\"");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"successful": true,
				"data": { "expiryTime": rfc3339(now + Duration::minutes(30)) }
			}));
		})
		.await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);

	// A freshly acquired token is handed out even when its soft expiry already passed.
	session.resolve().await.expect("First resolve should acquire a token.");
	refresh.assert_calls_async(0).await;

	assert_eq!(session.status_at(OffsetDateTime::now_utc()).await, Some(TokenStatus::SoftExpired));

	let token = session.resolve().await.expect("Second resolve should refresh.");

	assert_eq!(token.expose(), mocks.access_token);
	assert_eq!(session.status_at(OffsetDateTime::now_utc()).await, Some(TokenStatus::Fresh));

	session.resolve().await.expect("Third resolve should hit the cache.");

	refresh.assert_calls_async(1).await;
	mocks.code.assert_calls_async(1).await;
	mocks.tokens.assert_calls_async(1).await;
	assert_eq!(session.client().refresh_metrics.extensions(), 1);
}

#[tokio::test]
async fn rejected_refresh_tokens_fall_back_to_acquisition() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now - Duration::minutes(1), now + Duration::hours(8)).await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(PUT).path("/security/v1.0/tokens");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"successful": false,
				"code": "406",
				"message": "Refresh token expired"
			}));
		})
		.await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);

	session.resolve().await.expect("First resolve should acquire a token.");

	let token = session.resolve().await.expect("Fallback should reacquire within the call.");

	assert_eq!(token.expose(), mocks.access_token);

	refresh.assert_calls_async(1).await;
	mocks.code.assert_calls_async(2).await;
	mocks.tokens.assert_calls_async(2).await;
	assert_eq!(session.client().refresh_metrics.fallbacks(), 1);
}

#[tokio::test]
async fn failed_refresh_keeps_the_cached_state() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now - Duration::minutes(1), now + Duration::hours(8)).await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(PUT).path("/security/v1.0/tokens");
			then.status(503).body("maintenance");
		})
		.await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);

	session.resolve().await.expect("First resolve should acquire a token.");

	let err = session.resolve().await.expect_err("A failed refresh should surface.");

	assert!(matches!(err, Error::Remote { ref code, .. } if code == "503"));
	assert_eq!(session.status_at(OffsetDateTime::now_utc()).await, Some(TokenStatus::SoftExpired));

	session.resolve().await.expect_err("The next resolve should retry the refresh.");

	refresh.assert_calls_async(2).await;
	mocks.code.assert_calls_async(1).await;
	assert_eq!(session.client().refresh_metrics.failures(), 2);
}

#[tokio::test]
async fn hard_expired_tokens_are_reacquired() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now - Duration::hours(2), now - Duration::hours(1)).await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(PUT).path("/security/v1.0/tokens");
			then.status(200);
		})
		.await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);

	session.resolve().await.expect("First resolve should acquire a token.");
	session.resolve().await.expect("Hard-expired state should be reacquired.");

	refresh.assert_calls_async(0).await;
	mocks.code.assert_calls_async(2).await;
	mocks.tokens.assert_calls_async(2).await;

	session.invalidate().await;

	assert_eq!(session.status_at(now).await, None);
}

#[tokio::test]
async fn sign_attaches_the_resolved_token() {
	let server = MockServer::start_async().await;
	let now = OffsetDateTime::now_utc();
	let mocks = mock_handshake(&server, now + Duration::minutes(30), now + Duration::hours(8)).await;
	let session = build_reqwest_test_session(&server.base_url(), ACCOUNT, SECRET);
	let orders = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/orders")
				.header("authorization", format!("Bearer {}", mocks.access_token));
			then.status(204);
		})
		.await;
	let builder = test_reqwest_http_client().get(server.url("/orders"));
	let response = session
		.sign(&AuthorizationHeaderSigner::bearer(), builder)
		.await
		.expect("Signing a reqwest builder should succeed.")
		.send()
		.await
		.expect("Signed request should reach the mock server.");

	assert_eq!(response.status().as_u16(), 204);
	orders.assert_calls_async(1).await;

	let request = Request::builder()
		.uri(server.url("/orders"))
		.body(())
		.expect("Request fixture should build.");
	let signed = session
		.sign(&AuthorizationHeaderSigner::default(), request)
		.await
		.expect("Signing an http request should succeed.");

	assert_eq!(signed.headers()["authorization"], mocks.access_token.as_str());
	mocks.code.assert_calls_async(1).await;
}
