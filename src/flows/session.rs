//! Per-account token session and its lifecycle gate.
//!
//! A [`TokenSession`] owns the only copy of an account's [`TokenState`]. Every read goes through
//! [`TokenSession::resolve`], which decides under one async mutex whether the cached token can be
//! used, must be refreshed, or must be reacquired. Concurrent callers queue on that mutex, so at
//! most one acquisition or refresh is in flight per session and all of them observe its result.

// self
use crate::{
	_prelude::*,
	auth::{Claims, Credentials, Signature, TokenSecret, TokenState, TokenStatus},
	ext::RequestSignerExt,
	flows::{RefreshOutcome, SecurityClient},
	http::{SecurityHttpClient, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Token session specialized for the crate's default reqwest transport stack.
pub type ReqwestTokenSession = TokenSession<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Token lifecycle for one set of [`Credentials`].
pub struct TokenSession<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	client: SecurityClient<C, M>,
	credentials: Credentials,
	signature: Signature,
	state: AsyncMutex<Option<TokenState>>,
}
impl<C, M> TokenSession<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a session that talks to `credentials.base_server` through the provided transport.
	pub fn with_http_client(
		credentials: Credentials,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let client =
			SecurityClient::with_http_client(credentials.base_server.clone(), http_client, mapper)?;

		Ok(Self::with_client(client, credentials))
	}

	/// Creates a session on top of an existing client.
	///
	/// The client's base server wins over `credentials.base_server`.
	pub fn with_client(client: SecurityClient<C, M>, credentials: Credentials) -> Self {
		let signature = credentials.signature();

		Self { client, credentials, signature, state: AsyncMutex::new(None) }
	}

	/// Client used for acquisition and refresh.
	pub fn client(&self) -> &SecurityClient<C, M> {
		&self.client
	}

	/// Credentials the session acquires tokens for.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	/// Returns a usable access token, acquiring or refreshing first when needed.
	///
	/// With no cached state, or past the hard expiry, a full acquisition runs. Past the soft
	/// expiry the refresh token extends the access token; when the service answers that the
	/// refresh token is no longer accepted, the acquisition runs within the same call. A
	/// failed refresh leaves the cached state as it was, so the next call tries again.
	pub async fn resolve(&self) -> Result<TokenSecret> {
		self.with_state(|state| state.access_token().clone()).await
	}

	/// Returns the claims of the token [`resolve`](Self::resolve) would hand out.
	pub async fn claims(&self) -> Result<Claims> {
		self.with_state(|state| state.claims().clone()).await
	}

	/// Resolves a token and attaches it to `request` with `signer`.
	pub async fn sign<R, S>(&self, signer: &S, request: R) -> Result<R>
	where
		S: ?Sized + RequestSignerExt<R>,
	{
		let token = self.resolve().await?;

		signer.attach_token(request, &token)
	}

	/// Drops the cached state; the next [`resolve`](Self::resolve) acquires again.
	pub async fn invalidate(&self) {
		*self.state.lock().await = None;
	}

	/// Lifecycle status of the cached state at `instant`, without touching the network.
	pub async fn status_at(&self, instant: OffsetDateTime) -> Option<TokenStatus> {
		self.state.lock().await.as_ref().map(|state| state.status_at(instant))
	}

	async fn with_state<T>(&self, read: impl FnOnce(&TokenState) -> T) -> Result<T> {
		const KIND: FlowKind = FlowKind::Resolve;

		let span = FlowSpan::new(KIND, "resolve");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let mut slot = self.state.lock().await;
				let now = OffsetDateTime::now_utc();
				let reacquire = match slot.as_mut() {
					None => true,
					Some(state) => match state.status_at(now) {
						TokenStatus::Fresh => false,
						TokenStatus::SoftExpired => self.extend(state).await?,
						TokenStatus::HardExpired => {
							obs::flow_event!(
								debug,
								account = %self.credentials.account,
								"Token passed its hard expiry; reacquiring."
							);

							true
						},
					},
				};
				let state = match &mut *slot {
					Some(state) if !reacquire => state,
					_ => slot.insert(self.acquire().await?),
				};

				Ok(read(state))
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn acquire(&self) -> Result<TokenState> {
		self.client
			.acquire(&self.credentials.account, &self.signature, self.credentials.dept_id.as_ref())
			.await
	}

	/// Refreshes `state` in place; returns whether a full acquisition is required instead.
	async fn extend(&self, state: &mut TokenState) -> Result<bool> {
		match self.client.refresh(state.refresh_token()).await? {
			RefreshOutcome::Extended { expiry_time } => {
				state.extend(expiry_time);

				Ok(false)
			},
			RefreshOutcome::ReacquireRequired => {
				obs::flow_event!(
					debug,
					account = %self.credentials.account,
					"Refresh token rejected; reacquiring."
				);

				Ok(true)
			},
		}
	}
}
#[cfg(feature = "reqwest")]
impl TokenSession<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a session for `credentials` backed by a default reqwest transport.
	pub fn new(credentials: Credentials) -> Result<Self> {
		let client = SecurityClient::new(credentials.base_server.clone())?;

		Ok(Self::with_client(client, credentials))
	}
}
impl<C, M> Debug for TokenSession<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSession")
			.field("client", &self.client)
			.field("credentials", &self.credentials)
			.finish_non_exhaustive()
	}
}
