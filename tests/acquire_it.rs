#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
use time::format_description::well_known::Rfc3339;
// self
use token_handshake::{
	_preludet::*,
	auth::{self, AccountId, DeptId, TokenSecret, TokenStatus},
	error::DecodeError,
	flows::RefreshOutcome,
};

const ACCOUNT: &str = "alice";
const SECRET: &str = "s3cret";
const DEPT: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";

fn rfc3339(instant: OffsetDateTime) -> String {
	instant.format(&Rfc3339).expect("Test instant should format as RFC 3339.")
}

fn account() -> AccountId {
	AccountId::new(ACCOUNT).expect("Account fixture should be valid.")
}

async fn mock_code(server: &MockServer) -> httpmock::Mock<'_> {
	server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/codes").query_param("account", ACCOUNT);
			then.status(200).header("content-type", "application/json").json_body(json!({
				"successful": true,
				"code": "200",
				"message": "",
				"data": { "id": "code-1", "stamp": "stamp-1" }
			}));
		})
		.await
}

#[tokio::test]
async fn acquire_answers_the_stamp_and_decodes_claims() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.base_url());
	let signature = auth::sign(ACCOUNT, SECRET);
	let challenge = signature.challenge("stamp-1");
	let access_token =
		encode_test_access_token(&json!({ "id": "u-1", "userName": "Alice", "deptId": DEPT }));
	let now = OffsetDateTime::now_utc();
	let code = mock_code(&server).await;
	let tokens = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/security/v1.0/tokens")
				.query_param("id", "code-1")
				.query_param("account", ACCOUNT)
				.query_param("signature", challenge.as_str())
				.query_param("deptid", DEPT);
			// PascalCase envelope whose data is a JSON string.
			then.status(200).header("content-type", "application/json").json_body(json!({
				"Successful": true,
				"Code": "200",
				"Message": "",
				"Data": json!({
					"AccessToken": access_token,
					"RefreshToken": "refresh-1",
					"ExpiryTime": rfc3339(now + Duration::minutes(30)),
					"FailureTime": rfc3339(now + Duration::hours(8)),
				})
				.to_string()
			}));
		})
		.await;
	let dept = DeptId::new(DEPT).expect("Department fixture should be valid.");
	let state = client
		.acquire(&account(), &signature, Some(&dept))
		.await
		.expect("Acquisition against the mock service should succeed.");

	code.assert_calls_async(1).await;
	tokens.assert_calls_async(1).await;

	assert_eq!(state.claims().id.as_deref(), Some("u-1"));
	assert_eq!(state.claims().user_name.as_deref(), Some("Alice"));
	assert_eq!(state.status_at(now), TokenStatus::Fresh);
	assert_eq!(state.status_at(now + Duration::hours(1)), TokenStatus::SoftExpired);
	assert_eq!(state.status_at(now + Duration::hours(9)), TokenStatus::HardExpired);
}

#[tokio::test]
async fn rejected_code_request_points_at_the_base_server() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.base_url());
	let code = server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/codes");
			then.status(400).body("Bad account parameter");
		})
		.await;
	let tokens = server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/tokens");
			then.status(200);
		})
		.await;
	let err = client
		.acquire(&account(), &auth::sign(ACCOUNT, SECRET), None)
		.await
		.expect_err("A 400 on the code request should fail acquisition.");

	code.assert_calls_async(1).await;
	tokens.assert_calls_async(0).await;

	assert!(matches!(err, Error::MisconfiguredBaseServer { ref message } if message == "Bad account parameter"));
	assert_eq!(err.code(), "400");
}

#[tokio::test]
async fn token_failures_surface_the_remote_code() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.base_url());
	let _code = mock_code(&server).await;
	let _tokens = server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/tokens");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"successful": false,
				"code": "413",
				"message": "Signature mismatch"
			}));
		})
		.await;
	let err = client
		.acquire(&account(), &auth::sign(ACCOUNT, "wrong"), None)
		.await
		.expect_err("A rejected signature should fail acquisition.");

	assert!(matches!(
		err,
		Error::Remote { ref code, ref message } if code == "413" && message == "Signature mismatch"
	));
}

#[tokio::test]
async fn malformed_access_tokens_fail_to_decode() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.base_url());
	let now = OffsetDateTime::now_utc();
	let _code = mock_code(&server).await;
	let _tokens = server
		.mock_async(|when, then| {
			when.method(GET).path("/security/v1.0/tokens");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"accessToken": "%%% not base64 %%%",
				"refreshToken": "refresh-1",
				"expiryTime": rfc3339(now + Duration::minutes(30)),
				"failureTime": rfc3339(now + Duration::hours(8)),
			}));
		})
		.await;
	let err = client
		.acquire(&account(), &auth::sign(ACCOUNT, SECRET), None)
		.await
		.expect_err("Undecodable claims should fail acquisition.");

	assert!(matches!(err, Error::Decode(DecodeError::Base64(_))));
}

#[tokio::test]
async fn refresh_extends_or_asks_for_reacquisition() {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client(&server.base_url());
	let expiry = OffsetDateTime::now_utc().replace_nanosecond(0).expect("Zero is a valid nanosecond.")
		+ Duration::minutes(45);
	let extended = server
		.mock_async(|when, then| {
			when.method(PUT).path("/security/v1.0/tokens").body("\"refresh-live\"");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "expiryTime": rfc3339(expiry) }));
		})
		.await;
	let expired = server
		.mock_async(|when, then| {
			when.method(PUT).path("/security/v1.0/tokens").body("\"refresh-dead\"");
			then.status(406).body("Refresh token expired");
		})
		.await;
	let outcome = client
		.refresh(&TokenSecret::new("refresh-live"))
		.await
		.expect("Refreshing a live token should succeed.");

	assert_eq!(outcome, RefreshOutcome::Extended { expiry_time: expiry });

	let outcome = client
		.refresh(&TokenSecret::new("refresh-dead"))
		.await
		.expect("A 406 answer is a fallback signal, not an error.");

	assert_eq!(outcome, RefreshOutcome::ReacquireRequired);

	extended.assert_calls_async(1).await;
	expired.assert_calls_async(1).await;

	assert_eq!(client.refresh_metrics.attempts(), 2);
	assert_eq!(client.refresh_metrics.extensions(), 1);
	assert_eq!(client.refresh_metrics.fallbacks(), 1);
	assert_eq!(client.refresh_metrics.failures(), 0);
}
