//! Refresh-token extension.
//!
//! [`SecurityClient::refresh`] sends the refresh token to the tokens endpoint with `PUT`. A
//! `406` reply means the refresh token is no longer accepted and the caller has to run the
//! full handshake again; [`TokenSession`](crate::flows::TokenSession) does that without
//! surfacing the signal.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	endpoint::SecurityCall,
	flows::{
		SecurityClient,
		common::{self, Reply},
	},
	http::{SecurityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

const REACQUIRE_CODE: &str = "406";

/// Result of a refresh call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
	/// The access token stays valid until the new soft expiry.
	Extended {
		/// New soft expiry.
		expiry_time: OffsetDateTime,
	},
	/// The refresh token was rejected as invalid or expired; acquire again.
	ReacquireRequired,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshPayload {
	#[serde(alias = "ExpiryTime", with = "time::serde::rfc3339")]
	expiry_time: OffsetDateTime,
}

impl<C, M> SecurityClient<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Extends the access token behind `refresh_token`.
	pub async fn refresh(&self, refresh_token: &TokenSecret) -> Result<RefreshOutcome> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let request = common::json_string_request(
					Method::PUT,
					&self.endpoints.tokens(),
					refresh_token.expose(),
				)?;
				let reply = common::execute(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					SecurityCall::RefreshTokens,
					request,
				)
				.await?;

				match reply {
					Reply::Failure { code, .. } if code == REACQUIRE_CODE =>
						Ok(RefreshOutcome::ReacquireRequired),
					reply => {
						let payload: RefreshPayload = reply.into_payload("refreshed tokens")?;

						Ok(RefreshOutcome::Extended { expiry_time: payload.expiry_time })
					},
				}
			})
			.await;

		match &result {
			Ok(RefreshOutcome::Extended { .. }) => {
				self.refresh_metrics.record_extension();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Ok(RefreshOutcome::ReacquireRequired) => {
				self.refresh_metrics.record_fallback();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(_) => {
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
			},
		}

		result
	}
}
