//! Security service endpoints derived from a validated base server URL.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, ActionId, DeptId},
	error::ConfigError,
};

const API_ROOT: [&str; 2] = ["security", "v1.0"];

/// Remote calls issued against the security service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SecurityCall {
	/// One-time code (nonce) request.
	Codes,
	/// Token request answered with fresh token material.
	Tokens,
	/// Refresh request extending the current access token.
	RefreshTokens,
	/// Identity verification of an inbound token.
	Verify,
	/// Action-scoped verification of an inbound token.
	VerifyAction,
}
impl SecurityCall {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			SecurityCall::Codes => "codes",
			SecurityCall::Tokens => "tokens",
			SecurityCall::RefreshTokens => "refresh_tokens",
			SecurityCall::Verify => "verify",
			SecurityCall::VerifyAction => "verify_action",
		}
	}
}
impl Display for SecurityCall {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Validated root of the security service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityEndpoints {
	base: Url,
}
impl SecurityEndpoints {
	/// Validates `base` as an `http`/`https` URL that can carry a path.
	pub fn new(base: Url) -> Result<Self, ConfigError> {
		ensure_addressable(&base)?;

		Ok(Self { base })
	}

	/// Parses and validates a base server string.
	pub fn parse(base: &str) -> Result<Self, ConfigError> {
		let url = Url::parse(base)
			.map_err(|source| ConfigError::InvalidUrl { value: base.to_owned(), source })?;

		Self::new(url)
	}

	/// Base server URL.
	pub fn base(&self) -> &Url {
		&self.base
	}

	/// `GET {base}/security/v1.0/codes?account=`.
	pub fn codes(&self, account: &AccountId) -> Url {
		let mut url = self.resource("codes");

		url.query_pairs_mut().append_pair("account", account);

		url
	}

	/// `GET {base}/security/v1.0/tokens?id=&account=&signature=&deptid=`.
	pub fn tokens_request(
		&self,
		code_id: &str,
		account: &AccountId,
		challenge: &str,
		dept_id: Option<&DeptId>,
	) -> Url {
		let mut url = self.resource("tokens");

		url.query_pairs_mut()
			.append_pair("id", code_id)
			.append_pair("account", account)
			.append_pair("signature", challenge)
			.append_pair("deptid", dept_id.map_or("", |id| id.as_ref()));

		url
	}

	/// `PUT {base}/security/v1.0/tokens`.
	pub fn tokens(&self) -> Url {
		self.resource("tokens")
	}

	fn resource(&self, name: &str) -> Url {
		let mut url = self.base.clone();

		url.set_query(None);
		url.set_fragment(None);

		if let Ok(mut segments) = url.path_segments_mut() {
			segments.pop_if_empty().extend(API_ROOT).push(name);
		}

		url
	}
}

/// Builds `{verify_url}/auth?action={action}`.
pub fn action_url(verify_url: &Url, action: &ActionId) -> Result<Url, ConfigError> {
	ensure_addressable(verify_url)?;

	let mut url = verify_url.clone();

	if let Ok(mut segments) = url.path_segments_mut() {
		segments.pop_if_empty().push("auth");
	}

	url.query_pairs_mut().append_pair("action", action);

	Ok(url)
}

pub(crate) fn ensure_addressable(url: &Url) -> Result<(), ConfigError> {
	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(ConfigError::UnsupportedUrl { url: url.to_string() });
	}

	Ok(())
}
