//! Crate-level error types shared by token sessions, verifiers, and transports.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Security service returned a payload that could not be decoded.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Security service reported a failure.
	#[error("Security service rejected the request ({code}): {message}.")]
	Remote {
		/// Machine-readable code reported by the service (or the HTTP status).
		code: String,
		/// Human-readable message reported by the service.
		message: String,
	},
	/// Security service rejected the code request as malformed, which means the base server
	/// points at the wrong service.
	#[error("Configuration error: check that the base server points at the security service.")]
	MisconfiguredBaseServer {
		/// Message reported by the service, kept for diagnostics.
		message: String,
	},
	/// Credential is missing or was rejected.
	#[error("Authentication failed: the credential is missing or invalid.")]
	Unauthorized,
	/// Caller exceeded the permitted call rate.
	#[error("Calls are too frequent; retry after {retry_after} seconds.")]
	TooFrequent {
		/// Seconds the caller should wait before retrying.
		retry_after: u64,
	},
}
impl Error {
	/// Returns a machine-readable code suitable for result envelopes.
	pub fn code(&self) -> String {
		match self {
			Self::Config(_) => "500".into(),
			Self::Transport(_) => "503".into(),
			Self::Decode(_) => "502".into(),
			Self::Remote { code, .. } => code.clone(),
			Self::MisconfiguredBaseServer { .. } => "400".into(),
			Self::Unauthorized => "401".into(),
			Self::TooFrequent { .. } => "429".into(),
		}
	}
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A URL could not be parsed.
	#[error("URL `{value}` is invalid.")]
	InvalidUrl {
		/// Offending input.
		value: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A URL uses a scheme other than `http` or `https`, or cannot carry a path.
	#[error("URL `{url}` cannot address the security service.")]
	UnsupportedUrl {
		/// Offending URL.
		url: String,
	},
	/// Identifier validation failed.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Credential configuration could not be parsed.
	#[error("Credential configuration is invalid.")]
	Credentials {
		/// Structured parsing failure including the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request body could not be encoded.
	#[error("Request body could not be encoded.")]
	RequestBody(#[source] serde_json::Error),
	/// A token could not be carried in an HTTP header.
	#[error("Token is not a valid header value.")]
	HeaderValue(#[from] oauth2::http::header::InvalidHeaderValue),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the security service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the security service.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a structured error.
	#[error("HTTP client error occurred while calling the security service: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Payload decoding failures.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response body was not valid JSON.
	#[error("Security service returned malformed JSON for {what}.")]
	Json {
		/// Payload being decoded.
		what: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Successful response did not carry the expected payload.
	#[error("Security service response for {what} carries no data.")]
	MissingData {
		/// Payload being decoded.
		what: &'static str,
	},
	/// Access token is not valid base64.
	#[error("Access token is not valid base64.")]
	Base64(#[from] base64::DecodeError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn codes_cover_every_variant() {
		assert_eq!(Error::Unauthorized.code(), "401");
		assert_eq!(Error::TooFrequent { retry_after: 3 }.code(), "429");
		assert_eq!(Error::MisconfiguredBaseServer { message: "bad".into() }.code(), "400");
		assert_eq!(
			Error::Remote { code: "406".into(), message: "expired".into() }.code(),
			"406"
		);
		assert_eq!(Error::from(TransportError::Other { message: "closed".into() }).code(), "503");
		assert_eq!(Error::from(DecodeError::MissingData { what: "tokens" }).code(), "502");
	}

	#[test]
	fn remote_errors_render_code_and_message() {
		let err = Error::Remote { code: "404".into(), message: "Account not found".into() };

		assert_eq!(err.to_string(), "Security service rejected the request (404): Account not found.");
	}
}
