//! Shared helpers for security service calls (request construction, reply interpretation).
//!
//! The service answers with a result envelope (`successful`, `code`, `message`, `data`, in
//! camelCase or PascalCase) or, from some deployments, with the bare payload. A non-2xx status
//! is always a failure whose code is the status number.

// crates.io
use oauth2::{
	AsyncHttpClient, HttpRequest, HttpResponse,
	http::{
		Method,
		HeaderValue,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	endpoint::SecurityCall,
	error::{ConfigError, DecodeError},
	http::{SecurityHttpClient, TransportErrorMapper},
};

const JSON: &str = "application/json";

/// Interpreted reply from the security service.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
	/// Call succeeded, optionally carrying a payload.
	Success(Option<Value>),
	/// Call failed with a service code and message.
	Failure {
		/// Service code, or the HTTP status when the body carries none.
		code: String,
		/// Human-readable message.
		message: String,
	},
}
impl Reply {
	/// Decodes the success payload, or converts a failure into [`Error::Remote`].
	pub fn into_payload<T>(self, what: &'static str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		match self {
			Reply::Success(data) => Ok(decode_data(what, data)?),
			Reply::Failure { code, message } => Err(Error::Remote { code, message }),
		}
	}
}

/// Executes `request` and interprets the reply.
pub(crate) async fn execute<C, M>(
	http_client: &C,
	mapper: &M,
	call: SecurityCall,
	request: HttpRequest,
) -> Result<Reply>
where
	C: ?Sized + SecurityHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	let handle = http_client.handle();
	let response =
		handle.call(request).await.map_err(|err| mapper.map_transport_error(call, err))?;

	Ok(interpret(&response)?)
}

/// Builds a body-less request.
pub(crate) fn request(method: Method, url: &Url) -> Result<HttpRequest> {
	oauth2::http::Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(ACCEPT, JSON)
		.body(Vec::new())
		.map_err(|e| ConfigError::from(e).into())
}

/// Builds a request whose body is `value` encoded as a JSON string.
pub(crate) fn json_string_request(method: Method, url: &Url, value: &str) -> Result<HttpRequest> {
	let body = serde_json::to_vec(value).map_err(ConfigError::RequestBody)?;

	oauth2::http::Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(ACCEPT, JSON)
		.header(CONTENT_TYPE, JSON)
		.body(body)
		.map_err(|e| ConfigError::from(e).into())
}

/// Builds a request carrying `token` in the `Authorization` header.
///
/// Methods that accept a body also get the token as a JSON string body; `GET` and `HEAD` go
/// out with an empty body.
pub(crate) fn token_request(method: Method, url: &Url, token: &str) -> Result<HttpRequest> {
	let mut authorization = HeaderValue::from_str(token).map_err(ConfigError::from)?;

	authorization.set_sensitive(true);

	let mut http_request = if method == Method::GET || method == Method::HEAD {
		request(method, url)?
	} else {
		json_string_request(method, url, token)?
	};

	http_request.headers_mut().insert(AUTHORIZATION, authorization);

	Ok(http_request)
}

/// Maps an HTTP response onto a [`Reply`].
pub fn interpret(response: &HttpResponse) -> Result<Reply, DecodeError> {
	let status = response.status();
	let body = response.body();
	let parsed = if body.iter().all(u8::is_ascii_whitespace) {
		None
	} else {
		Some(parse_json::<Value>("response body", body))
	};
	let envelope = parsed.as_ref().and_then(|value| value.as_ref().ok()).and_then(Envelope::read);

	if !status.is_success() {
		let message = envelope
			.and_then(|envelope| envelope.message)
			.filter(|message| !message.is_empty())
			.or_else(|| {
				let text = String::from_utf8_lossy(body).trim().to_owned();

				(!text.is_empty()).then_some(text)
			})
			.or_else(|| status.canonical_reason().map(str::to_owned))
			.unwrap_or_else(|| format!("Security service returned HTTP {}", status.as_u16()));

		return Ok(Reply::Failure { code: status.as_u16().to_string(), message });
	}

	match (envelope, parsed) {
		(Some(envelope), _) if envelope.successful => Ok(Reply::Success(envelope.data)),
		(Some(envelope), _) => {
			let code = envelope.code.unwrap_or_else(|| status.as_u16().to_string());
			let message = envelope
				.message
				.unwrap_or_else(|| format!("Security service reported failure {code}"));

			Ok(Reply::Failure { code, message })
		},
		(None, Some(parsed)) => Ok(Reply::Success(Some(parsed?))),
		(None, None) => Ok(Reply::Success(None)),
	}
}

/// Decodes an envelope payload; string payloads holding JSON are parsed once more.
pub(crate) fn decode_data<T>(what: &'static str, data: Option<Value>) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	match data.ok_or(DecodeError::MissingData { what })? {
		Value::String(raw) => parse_json(what, raw.as_bytes()),
		other => serde_path_to_error::deserialize(other)
			.map_err(|source| DecodeError::Json { what, source }),
	}
}

fn parse_json<T>(what: &'static str, bytes: &[u8]) -> Result<T, DecodeError>
where
	T: DeserializeOwned,
{
	let de = &mut serde_json::Deserializer::from_slice(bytes);

	serde_path_to_error::deserialize(de).map_err(|source| DecodeError::Json { what, source })
}

struct Envelope {
	successful: bool,
	code: Option<String>,
	message: Option<String>,
	data: Option<Value>,
}
impl Envelope {
	fn read(value: &Value) -> Option<Self> {
		let map = value.as_object()?;
		let successful = field(map, "successful")?.as_bool()?;
		let code = field(map, "code").and_then(|code| match code {
			Value::String(text) if !text.is_empty() => Some(text.clone()),
			Value::Number(number) => Some(number.to_string()),
			_ => None,
		});
		let message = field(map, "message").and_then(Value::as_str).map(str::to_owned);
		let data = field(map, "data").filter(|data| !data.is_null()).cloned();

		Some(Self { successful, code, message, data })
	}
}

fn field<'a>(map: &'a Map<String, Value>, camel: &str) -> Option<&'a Value> {
	map.get(camel).or_else(|| {
		let mut chars = camel.chars();
		let pascal = chars
			.next()
			.map(|first| first.to_ascii_uppercase().to_string() + chars.as_str())
			.unwrap_or_default();

		map.get(&pascal)
	})
}
