//! Caller-owned credentials for a token session.

// self
use crate::{
	_prelude::*,
	auth::{AccountId, DeptId, Signature, TokenSecret, signature},
	error::ConfigError,
};

/// Account credentials and the security service they authenticate against.
///
/// The secret never leaves the process; only the derived [`Signature`] is combined with
/// server-issued stamps. Deserializes from camelCase JSON (`baseServer`, `account`, `secret`,
/// `deptId`).
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
	/// Root URL of the security service.
	pub base_server: Url,
	/// Application or tenant account.
	pub account: AccountId,
	secret: TokenSecret,
	/// Organizational context selected at login.
	#[serde(default)]
	pub dept_id: Option<DeptId>,
}
impl Credentials {
	/// Creates credentials without a department selection.
	pub fn new(base_server: Url, account: AccountId, secret: impl Into<String>) -> Self {
		Self { base_server, account, secret: TokenSecret::new(secret), dept_id: None }
	}

	/// Selects the department used at login.
	pub fn with_dept_id(mut self, dept_id: DeptId) -> Self {
		self.dept_id = Some(dept_id);

		self
	}

	/// Parses credentials from a JSON document, reporting the offending path on failure.
	pub fn from_json(raw: &str) -> Result<Self> {
		let de = &mut serde_json::Deserializer::from_str(raw);

		serde_path_to_error::deserialize(de)
			.map_err(|source| ConfigError::Credentials { source }.into())
	}

	/// Derives the account signature.
	pub fn signature(&self) -> Signature {
		signature::sign(&self.account, self.secret.expose())
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("base_server", &self.base_server.as_str())
			.field("account", &self.account)
			.field("secret", &self.secret)
			.field("dept_id", &self.dept_id)
			.finish()
	}
}
