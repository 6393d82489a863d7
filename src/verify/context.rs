//! Inbound request context handed to the verifier by the hosting framework.

// crates.io
use oauth2::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
// self
use crate::_prelude::*;

const BEARER_PREFIX: &str = "Bearer ";

/// Slot the verifier writes the HTTP status it wants the host to answer with.
///
/// Only a missing token sets it today (`401 Unauthorized`); the host reads the slot after
/// verification and applies the status to its outgoing response.
#[derive(Clone, Debug, Default)]
pub struct StatusSlot(Arc<Mutex<Option<StatusCode>>>);
impl StatusSlot {
	/// Stores `status` for the current response.
	pub fn store(&self, status: StatusCode) {
		*self.0.lock() = Some(status);
	}

	/// Returns the stored status without consuming it.
	pub fn get(&self) -> Option<StatusCode> {
		*self.0.lock()
	}

	/// Returns the stored status, consuming it from the slot.
	pub fn take(&self) -> Option<StatusCode> {
		self.0.lock().take()
	}
}

/// Everything the verifier needs from the inbound request.
#[derive(Clone, Copy, Debug)]
pub struct RequestContext<'a> {
	/// Inbound request headers.
	pub headers: &'a HeaderMap,
	/// Key the rate limiter budgets against, typically the client address.
	pub caller: &'a str,
	/// Output slot for the response status.
	pub response_status: &'a StatusSlot,
}
impl<'a> RequestContext<'a> {
	/// Bundles the inbound pieces of one request.
	pub fn new(headers: &'a HeaderMap, caller: &'a str, response_status: &'a StatusSlot) -> Self {
		Self { headers, caller, response_status }
	}

	/// Reads the access token from the `Authorization` header.
	///
	/// A leading `Bearer ` scheme, in any letter case, is stripped. When the header is missing, empty, or not visible ASCII,
	/// `401 Unauthorized` is stored in the status slot and `None` is returned.
	pub fn access_token(&self) -> Option<String> {
		let token = self
			.headers
			.get(AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.map(|value| strip_bearer(value).trim())
			.filter(|token| !token.is_empty());

		match token {
			Some(token) => Some(token.to_owned()),
			None => {
				self.response_status.store(StatusCode::UNAUTHORIZED);

				None
			},
		}
	}
}

fn strip_bearer(value: &str) -> &str {
	match (value.get(..BEARER_PREFIX.len()), value.get(BEARER_PREFIX.len()..)) {
		(Some(scheme), Some(rest)) if scheme.eq_ignore_ascii_case(BEARER_PREFIX) => rest,
		_ => value,
	}
}
