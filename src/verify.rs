//! Server-side verification of inbound access tokens.
//!
//! A [`Verifier`] decides, for one inbound request, whether it may proceed. The decision
//! combines three inputs: the caller's rate-limit budget, the presence of an access token
//! in the `Authorization` header, and the security service's opinion of that token.
//!
//! # Modes
//!
//! - **Identity** ([`VerifyRequest::identity`]): rate limit, then token, then remote check.
//! - **Anonymous identity** ([`VerifyRequest::anonymous`]): token, then remote check; a rejected
//!   token still passes when the caller is within its budget (60 seconds when no limit is set).
//!   Note that the limiter runs after the remote call here and before it in every other mode.
//! - **Action** ([`VerifyRequest::action`]): like identity, against `{verify_url}/auth?action=`.

mod context;
mod outcome;

pub use context::*;
pub use outcome::*;

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	auth::ActionId,
	endpoint::{self, SecurityCall},
	ext::{MemoryRateLimiter, RateLimitContext, RateLimitDecision, RateLimitPolicy},
	flows::common::{self, Reply},
	http::{SecurityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Window applied to anonymous callers whose token was rejected when no limit is configured.
pub const ANONYMOUS_DEFAULT_LIMIT: Duration = Duration::seconds(60);

#[cfg(feature = "reqwest")]
/// Verifier specialized for the crate's default reqwest transport stack.
pub type ReqwestVerifier = Verifier<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Which verification protocol a [`VerifyRequest`] follows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VerifyMode {
	/// Token identity check.
	Identity {
		/// Let callers through on a rejected token while they stay within budget.
		anonymous: bool,
	},
	/// Token check scoped to one action.
	Action(ActionId),
}
impl VerifyMode {
	/// Stable label used for spans and metrics.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Identity { anonymous: false } => "identity",
			Self::Identity { anonymous: true } => "anonymous",
			Self::Action(_) => "action",
		}
	}
}

/// What to verify and how strictly to budget callers.
#[derive(Clone, Debug)]
pub struct VerifyRequest {
	target: Url,
	limit: Duration,
	mode: VerifyMode,
	method: Method,
}
impl VerifyRequest {
	/// Identity verification against `verify_url`, with no rate limit.
	pub fn identity(verify_url: Url) -> Result<Self> {
		endpoint::ensure_addressable(&verify_url)?;

		Ok(Self::with_target(verify_url, VerifyMode::Identity { anonymous: false }))
	}

	/// Action-scoped verification against `{verify_url}/auth?action={action}`.
	pub fn action(verify_url: Url, action: ActionId) -> Result<Self> {
		let target = endpoint::action_url(&verify_url, &action)?;

		Ok(Self::with_target(target, VerifyMode::Action(action)))
	}

	/// Switches identity verification to its anonymous variant.
	///
	/// Has no effect on action-scoped requests.
	pub fn anonymous(mut self) -> Self {
		if let VerifyMode::Identity { anonymous } = &mut self.mode {
			*anonymous = true;
		}

		self
	}

	/// Minimum spacing between two calls of one caller; zero or negative disables it.
	pub fn with_limit(mut self, limit: Duration) -> Self {
		self.limit = limit;

		self
	}

	/// HTTP method used for the remote call (`GET` by default).
	///
	/// The token always travels in the `Authorization` header; methods other than `GET` and
	/// `HEAD` also carry it as a JSON string body.
	pub fn with_method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// URL the remote call goes to.
	pub fn target(&self) -> &Url {
		&self.target
	}

	/// Configured rate limit.
	pub fn limit(&self) -> Duration {
		self.limit
	}

	/// Verification mode.
	pub fn mode(&self) -> &VerifyMode {
		&self.mode
	}

	fn with_target(target: Url, mode: VerifyMode) -> Self {
		Self { target, limit: Duration::ZERO, mode, method: Method::GET }
	}

	fn call(&self) -> SecurityCall {
		match self.mode {
			VerifyMode::Identity { .. } => SecurityCall::Verify,
			VerifyMode::Action(_) => SecurityCall::VerifyAction,
		}
	}
}

/// Verifies inbound requests against a security service.
pub struct Verifier<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for remote checks.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before they become outcomes.
	pub transport_mapper: Arc<M>,
	rate_limiter: Arc<dyn RateLimitPolicy>,
}
impl<C, M> Verifier<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a verifier with its own in-memory rate limiter.
	pub fn with_http_client(http_client: impl Into<Arc<C>>, mapper: impl Into<Arc<M>>) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			rate_limiter: Arc::new(MemoryRateLimiter::default()),
		}
	}

	/// Replaces the rate limiter, e.g. with one shared across verifiers.
	pub fn with_rate_limiter(mut self, rate_limiter: Arc<dyn RateLimitPolicy>) -> Self {
		self.rate_limiter = rate_limiter;

		self
	}

	/// Rate limiter consulted by [`verify`](Self::verify).
	pub fn rate_limiter(&self) -> &Arc<dyn RateLimitPolicy> {
		&self.rate_limiter
	}

	/// Decides whether the request described by `context` may proceed.
	pub async fn verify(
		&self,
		context: &RequestContext<'_>,
		request: &VerifyRequest,
	) -> VerificationOutcome {
		const KIND: FlowKind = FlowKind::Verify;

		let span = FlowSpan::new(KIND, request.mode.as_str());

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let outcome = span.instrument(self.decide(context, request)).await;

		obs::record_verification(request.mode.as_str(), outcome.label());
		obs::record_flow_outcome(
			KIND,
			if outcome.is_success() { FlowOutcome::Success } else { FlowOutcome::Failure },
		);

		outcome
	}

	async fn decide(
		&self,
		context: &RequestContext<'_>,
		request: &VerifyRequest,
	) -> VerificationOutcome {
		if let VerifyMode::Identity { anonymous: true } = request.mode {
			let Some(token) = context.access_token() else {
				return VerificationOutcome::Unauthorized;
			};

			let outcome = self.remote(request, &token).await;

			if outcome.is_success() {
				return outcome;
			}

			obs::flow_event!(
				debug,
				caller = context.caller,
				outcome = ?outcome,
				"Anonymous caller rejected remotely; applying rate limit."
			);

			let window =
				if request.limit <= Duration::ZERO { ANONYMOUS_DEFAULT_LIMIT } else { request.limit };

			return self
				.throttle(context, request, window)
				.await
				.unwrap_or(VerificationOutcome::Success);
		}

		if let Some(outcome) = self.throttle(context, request, request.limit).await {
			return outcome;
		}

		let Some(token) = context.access_token() else {
			return VerificationOutcome::Unauthorized;
		};

		self.remote(request, &token).await
	}

	/// Consults the rate limiter; `None` means the call may proceed.
	async fn throttle(
		&self,
		context: &RequestContext<'_>,
		request: &VerifyRequest,
		window: Duration,
	) -> Option<VerificationOutcome> {
		if window <= Duration::ZERO {
			return None;
		}

		let limit_context = RateLimitContext::new(context.caller, request.target.as_str(), window);

		match self.rate_limiter.evaluate(&limit_context).await {
			Ok(RateLimitDecision::Allow) => None,
			Ok(RateLimitDecision::Delay(directive)) => {
				obs::flow_event!(
					debug,
					caller = context.caller,
					retry_after = directive.retry_after_secs(),
					"Caller is rate limited."
				);

				Some(VerificationOutcome::TooFrequent { retry_after: directive.retry_after_secs() })
			},
			Err(e) => Some(failure(e)),
		}
	}

	async fn remote(&self, request: &VerifyRequest, token: &str) -> VerificationOutcome {
		let reply = match common::token_request(request.method.clone(), &request.target, token) {
			Ok(http_request) =>
				common::execute(
					self.http_client.as_ref(),
					self.transport_mapper.as_ref(),
					request.call(),
					http_request,
				)
				.await,
			Err(e) => Err(e),
		};

		match reply {
			Ok(Reply::Success(_)) => VerificationOutcome::Success,
			Ok(Reply::Failure { code, message }) => {
				obs::flow_event!(debug, code = %code, message = %message, "Token rejected remotely.");

				VerificationOutcome::RemoteFailure { code, message }
			},
			Err(e) => {
				obs::flow_event!(warn, error = %e, "Remote verification did not complete.");

				failure(e)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl Verifier<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a verifier backed by a default reqwest transport and an in-memory rate limiter.
	pub fn new() -> Self {
		Self::with_http_client(ReqwestHttpClient::default(), Arc::new(ReqwestTransportErrorMapper))
	}
}
#[cfg(feature = "reqwest")]
impl Default for Verifier<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	fn default() -> Self {
		Self::new()
	}
}
impl<C, M> Clone for Verifier<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			rate_limiter: self.rate_limiter.clone(),
		}
	}
}
impl<C, M> Debug for Verifier<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Verifier").finish_non_exhaustive()
	}
}

fn failure(error: Error) -> VerificationOutcome {
	VerificationOutcome::RemoteFailure { code: error.code(), message: error.to_string() }
}
