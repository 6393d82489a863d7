//! Code + token handshake.
//!
//! [`SecurityClient::acquire`] asks the service for a single-use code (`id` + `stamp`), answers
//! the stamp with the account signature, and decodes the issued token material. Nothing is
//! retried here; the session gate decides when to try again.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::{AccountId, DeptId, Signature, TokenMaterial, TokenState},
	endpoint::SecurityCall,
	flows::{
		SecurityClient,
		common::{self, Reply},
	},
	http::{SecurityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const MISCONFIGURED_CODE: &str = "400";

/// Single-use code issued for one acquisition attempt.
#[derive(Clone, Debug, Deserialize)]
pub struct Nonce {
	/// Code identifier echoed back in the token request.
	#[serde(alias = "ID", alias = "Id")]
	pub id: String,
	/// Stamp combined with the signature to form the challenge response.
	#[serde(alias = "Stamp")]
	pub stamp: String,
}

impl<C, M> SecurityClient<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Performs the full handshake and returns freshly issued token state.
	pub async fn acquire(
		&self,
		account: &AccountId,
		signature: &Signature,
		dept_id: Option<&DeptId>,
	) -> Result<TokenState> {
		const KIND: FlowKind = FlowKind::Acquire;

		let span = FlowSpan::new(KIND, "acquire");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let nonce = self.request_code(account).await?;
				let challenge = signature.challenge(&nonce.stamp);
				let url = self.endpoints.tokens_request(&nonce.id, account, &challenge, dept_id);
				let request = common::request(Method::GET, &url)?;
				let material: TokenMaterial = common::execute(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					SecurityCall::Tokens,
					request,
				)
				.await?
				.into_payload("tokens")?;

				if material.expiry_time > material.failure_time {
					obs::flow_event!(
						warn,
						account = %account,
						"Soft expiry is later than hard expiry; clamping."
					);
				}

				Ok(TokenState::from_material(material)?)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn request_code(&self, account: &AccountId) -> Result<Nonce> {
		let request = common::request(Method::GET, &self.endpoints.codes(account))?;
		let reply = common::execute(
			self.http_client.as_ref(),
			self.transport_mapper.as_ref(),
			SecurityCall::Codes,
			request,
		)
		.await?;

		match reply {
			Reply::Failure { code, message } if code == MISCONFIGURED_CODE =>
				Err(Error::MisconfiguredBaseServer { message }),
			reply => reply.into_payload("code"),
		}
	}
}
