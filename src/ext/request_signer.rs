//! Attaching session tokens to outbound requests.
//!
//! The security service expects the access token as the whole `Authorization` header value.
//! Deployments fronted by a gateway that wants `Bearer` tokens can switch the scheme.

// crates.io
use oauth2::http::header::{AUTHORIZATION, HeaderValue};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Describes how to attach an access token to an outbound request without constraining the
/// HTTP client type.
pub trait RequestSignerExt<Request>
where
	Self: Send + Sync,
{
	/// Consumes the request and returns it carrying `token`.
	fn attach_token(&self, request: Request, token: &TokenSecret) -> Result<Request>;
}

/// How the token is laid out inside the `Authorization` header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthorizationScheme {
	/// The header value is the token itself.
	#[default]
	Raw,
	/// The header value is `Bearer <token>`.
	Bearer,
}

/// Signer writing the token into the `Authorization` header.
#[derive(Clone, Copy, Debug, Default)]
pub struct AuthorizationHeaderSigner {
	/// Header layout.
	pub scheme: AuthorizationScheme,
}
impl AuthorizationHeaderSigner {
	/// Signer emitting `Bearer <token>`.
	pub fn bearer() -> Self {
		Self { scheme: AuthorizationScheme::Bearer }
	}

	/// Builds the header value for `token`.
	pub fn header_value(&self, token: &TokenSecret) -> Result<HeaderValue> {
		let mut value = match self.scheme {
			AuthorizationScheme::Raw => HeaderValue::from_str(token.expose()),
			AuthorizationScheme::Bearer => HeaderValue::from_str(&format!("Bearer {}", token.expose())),
		}
		.map_err(ConfigError::from)?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl<B> RequestSignerExt<oauth2::http::Request<B>> for AuthorizationHeaderSigner {
	fn attach_token(
		&self,
		mut request: oauth2::http::Request<B>,
		token: &TokenSecret,
	) -> Result<oauth2::http::Request<B>> {
		request.headers_mut().insert(AUTHORIZATION, self.header_value(token)?);

		Ok(request)
	}
}
#[cfg(feature = "reqwest")]
impl RequestSignerExt<reqwest::RequestBuilder> for AuthorizationHeaderSigner {
	fn attach_token(
		&self,
		request: reqwest::RequestBuilder,
		token: &TokenSecret,
	) -> Result<reqwest::RequestBuilder> {
		Ok(request.header(AUTHORIZATION, self.header_value(token)?))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn raw_and_bearer_layouts() {
		let token = TokenSecret::new("eyJpZCI6IjEifQ==");
		let request = oauth2::http::Request::builder()
			.uri("https://api.example.com/orders")
			.body(())
			.expect("Request fixture should build.");
		let signed = AuthorizationHeaderSigner::default()
			.attach_token(request, &token)
			.expect("Raw token should be a valid header.");

		assert_eq!(signed.headers()[AUTHORIZATION], "eyJpZCI6IjEifQ==");
		assert!(signed.headers()[AUTHORIZATION].is_sensitive());

		let value = AuthorizationHeaderSigner::bearer()
			.header_value(&token)
			.expect("Bearer token should be a valid header.");

		assert_eq!(value, "Bearer eyJpZCI6IjEifQ==");
	}

	#[test]
	fn control_characters_are_rejected() {
		let err = AuthorizationHeaderSigner::default()
			.header_value(&TokenSecret::new("bad\ntoken"))
			.expect_err("Newlines cannot appear in header values.");

		assert!(matches!(err, Error::Config(ConfigError::HeaderValue(_))));
	}
}
