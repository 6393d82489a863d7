//! Client-side token flows: acquisition, refresh, and the session lifecycle gate.

pub mod acquire;
pub mod common;
pub mod refresh;
pub mod session;

pub use refresh::*;
pub use session::*;

// self
use crate::{
	_prelude::*,
	endpoint::SecurityEndpoints,
	http::{SecurityHttpClient, TransportErrorMapper},
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Security client specialized for the crate's default reqwest transport stack.
pub type ReqwestSecurityClient = SecurityClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Talks to one security service on behalf of token sessions.
///
/// The client owns the transport, the transport error mapper, and the validated endpoints, so
/// individual flows only deal with request construction and reply interpretation. It holds no
/// token state; [`TokenSession`] owns that.
pub struct SecurityClient<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound call.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Endpoints derived from the base server.
	pub endpoints: SecurityEndpoints,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<C, M> SecurityClient<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		base_server: Url,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		Ok(Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			endpoints: SecurityEndpoints::new(base_server)?,
			refresh_metrics: Default::default(),
		})
	}
}
#[cfg(feature = "reqwest")]
impl SecurityClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client for `base_server` backed by a default reqwest transport.
	pub fn new(base_server: Url) -> Result<Self> {
		Self::with_http_client(
			base_server,
			ReqwestHttpClient::default(),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}
}
impl<C, M> Clone for SecurityClient<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			endpoints: self.endpoints.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
		}
	}
}
impl<C, M> Debug for SecurityClient<C, M>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SecurityClient").field("base_server", &self.endpoints.base().as_str()).finish()
	}
}
