//! Verification outcomes and the result envelope handed back to callers.

// crates.io
use oauth2::http::StatusCode;
// self
use crate::_prelude::*;

/// Result of one verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerificationOutcome {
	/// The request may proceed.
	Success,
	/// No access token was presented.
	Unauthorized,
	/// The caller exceeded its rate limit.
	TooFrequent {
		/// Seconds until the next call is allowed.
		retry_after: u64,
	},
	/// The security service rejected the token or could not be reached.
	RemoteFailure {
		/// Service code, or the local error code when the call never completed.
		code: String,
		/// Human-readable message.
		message: String,
	},
}
impl VerificationOutcome {
	/// Whether the request may proceed.
	pub fn is_success(&self) -> bool {
		matches!(self, Self::Success)
	}

	/// HTTP status a hosting framework should answer with.
	///
	/// Remote failures carrying an HTTP-like code keep it; anything else maps to `403`.
	pub fn status_code(&self) -> StatusCode {
		match self {
			Self::Success => StatusCode::OK,
			Self::Unauthorized => StatusCode::UNAUTHORIZED,
			Self::TooFrequent { .. } => StatusCode::TOO_MANY_REQUESTS,
			Self::RemoteFailure { code, .. } => code
				.parse::<u16>()
				.ok()
				.and_then(|code| StatusCode::from_u16(code).ok())
				.filter(|status| status.is_client_error() || status.is_server_error())
				.unwrap_or(StatusCode::FORBIDDEN),
		}
	}

	/// Converts a rejection into the crate [`Error`], for hosts that propagate errors with `?`.
	pub fn into_result(self) -> Result<()> {
		match self {
			Self::Success => Ok(()),
			Self::Unauthorized => Err(Error::Unauthorized),
			Self::TooFrequent { retry_after } => Err(Error::TooFrequent { retry_after }),
			Self::RemoteFailure { code, message } => Err(Error::Remote { code, message }),
		}
	}

	/// Stable label used for metrics.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Success => "success",
			Self::Unauthorized => "unauthorized",
			Self::TooFrequent { .. } => "too_frequent",
			Self::RemoteFailure { .. } => "remote_failure",
		}
	}
}

/// Result envelope in the shape the security service itself answers with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResult {
	/// Whether the request may proceed.
	pub successful: bool,
	/// Machine-readable code.
	pub code: String,
	/// Human-readable message.
	pub message: String,
}
impl VerifyResult {
	/// Successful verification.
	pub fn success() -> Self {
		Self { successful: true, code: "200".into(), message: "Success.".into() }
	}

	/// Missing or invalid access token.
	pub fn invalid_auth() -> Self {
		Self { successful: false, code: "401".into(), message: "Invalid authentication.".into() }
	}

	/// Rate limited for `retry_after` more seconds.
	pub fn too_frequent(retry_after: u64) -> Self {
		Self {
			successful: false,
			code: "429".into(),
			message: format!("Called too frequently; retry in {retry_after} seconds."),
		}
	}

	/// Failure reported by (or while reaching) the security service.
	pub fn remote_failure(code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { successful: false, code: code.into(), message: message.into() }
	}
}
impl From<VerificationOutcome> for VerifyResult {
	fn from(outcome: VerificationOutcome) -> Self {
		match outcome {
			VerificationOutcome::Success => Self::success(),
			VerificationOutcome::Unauthorized => Self::invalid_auth(),
			VerificationOutcome::TooFrequent { retry_after } => Self::too_frequent(retry_after),
			VerificationOutcome::RemoteFailure { code, message } =>
				Self::remote_failure(code, message),
		}
	}
}
