//! Token material returned by the security service and the session-held token state.

// self
use crate::{
	_prelude::*,
	auth::token::{claims::Claims, secret::TokenSecret},
	error::DecodeError,
};

/// Lifecycle status of a [`TokenState`] at a given instant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Access token can be used as-is.
	Fresh,
	/// Soft expiry passed; the refresh token can still extend the access token.
	SoftExpired,
	/// Hard expiry passed; only a full acquisition yields a usable token.
	HardExpired,
}

/// Tokens and validity windows issued by a successful acquisition.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMaterial {
	/// Base64-encoded access token; its payload decodes into [`Claims`].
	#[serde(alias = "AccessToken")]
	pub access_token: TokenSecret,
	/// Refresh token used to extend `expiry_time`.
	#[serde(alias = "RefreshToken")]
	pub refresh_token: TokenSecret,
	/// Soft expiry; after it the access token must be refreshed.
	#[serde(alias = "ExpiryTime", with = "time::serde::rfc3339")]
	pub expiry_time: OffsetDateTime,
	/// Hard expiry; after it the tokens must be reacquired.
	#[serde(alias = "FailureTime", with = "time::serde::rfc3339")]
	pub failure_time: OffsetDateTime,
}
impl Debug for TokenMaterial {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenMaterial")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("expiry_time", &self.expiry_time)
			.field("failure_time", &self.failure_time)
			.finish()
	}
}

/// Token material together with its decoded claims.
///
/// Both halves are built together and replaced together, so a state with claims that do not
/// belong to its access token is never observable.
#[derive(Clone, Debug)]
pub struct TokenState {
	material: TokenMaterial,
	claims: Claims,
}
impl TokenState {
	/// Decodes the access-token claims and pairs them with the material.
	///
	/// A soft expiry later than the hard expiry is clamped to the hard expiry.
	pub fn from_material(mut material: TokenMaterial) -> Result<Self, DecodeError> {
		let claims = Claims::decode(material.access_token.expose())?;

		if material.expiry_time > material.failure_time {
			material.expiry_time = material.failure_time;
		}

		Ok(Self { material, claims })
	}

	/// Claims decoded from the current access token.
	pub fn claims(&self) -> &Claims {
		&self.claims
	}

	/// Soft expiry instant.
	pub fn expiry_time(&self) -> OffsetDateTime {
		self.material.expiry_time
	}

	/// Hard expiry instant.
	pub fn failure_time(&self) -> OffsetDateTime {
		self.material.failure_time
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant > self.material.failure_time {
			return TokenStatus::HardExpired;
		}
		if instant > self.material.expiry_time {
			return TokenStatus::SoftExpired;
		}

		TokenStatus::Fresh
	}

	pub(crate) fn access_token(&self) -> &TokenSecret {
		&self.material.access_token
	}

	pub(crate) fn refresh_token(&self) -> &TokenSecret {
		&self.material.refresh_token
	}

	/// Moves the soft expiry, never past the hard expiry.
	pub(crate) fn extend(&mut self, expiry_time: OffsetDateTime) {
		self.material.expiry_time = expiry_time.min(self.material.failure_time);
	}
}
