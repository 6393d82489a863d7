//! Decoded access-token payload.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, error::DecodeError};

/// Identity, permission, and session attributes carried inside an access token.
///
/// Access tokens are base64-encoded JSON objects. The well-known fields are lifted into typed
/// accessors; everything else is preserved in [`Claims::extra`] so encoding the claims again
/// reproduces the original object.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
	/// Token identifier.
	#[serde(default, alias = "ID", alias = "Id", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Authenticated user.
	#[serde(default, alias = "UserId", skip_serializing_if = "Option::is_none")]
	pub user_id: Option<String>,
	/// Display name of the authenticated user.
	#[serde(default, alias = "UserName", skip_serializing_if = "Option::is_none")]
	pub user_name: Option<String>,
	/// Account the token was issued for.
	#[serde(default, alias = "Account", skip_serializing_if = "Option::is_none")]
	pub account: Option<String>,
	/// Department selected at login.
	#[serde(default, alias = "DeptId", skip_serializing_if = "Option::is_none")]
	pub dept_id: Option<String>,
	/// Remaining attributes, kept verbatim.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl Claims {
	/// Decodes claims from a base64 access token.
	pub fn decode(access_token: &str) -> Result<Self, DecodeError> {
		let bytes = STANDARD.decode(access_token.trim())?;
		let de = &mut serde_json::Deserializer::from_slice(&bytes);

		serde_path_to_error::deserialize(de)
			.map_err(|source| DecodeError::Json { what: "access token claims", source })
	}

	/// Encodes the claims the way the security service encodes access tokens.
	pub fn encode(&self) -> Result<String, serde_json::Error> {
		Ok(STANDARD.encode(serde_json::to_vec(self)?))
	}

	/// Returns an attribute that is not lifted into a typed field.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.extra.get(key)
	}
}
