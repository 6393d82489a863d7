//! Resolves a token for the account described by a credentials file and prints its claims.
//!
//! ```sh
//! cargo run --example resolve_token -- credentials.json
//! ```
//!
//! The file holds the session configuration in the security service's own shape:
//!
//! ```json
//! { "baseServer": "https://security.example.com/", "account": "svc-orders", "secret": "..." }
//! ```
//!
//! A second resolve right after the first is answered from the session cache.

// std
use std::{env, fs};
// crates.io
use color_eyre::{Result, eyre::eyre};
// self
use token_handshake::{auth::Credentials, flows::TokenSession};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let path = env::args().nth(1).ok_or_else(|| eyre!("Usage: resolve_token <credentials.json>"))?;
	let credentials = Credentials::from_json(&fs::read_to_string(&path)?)?;

	println!("Resolving a token for {} via {}.", credentials.account, credentials.base_server);

	let session = TokenSession::new(credentials)?;
	let token = session.resolve().await?;
	let claims = session.claims().await?;

	println!("Access token: {token}.");
	println!("User: {}.", claims.user_name.as_deref().unwrap_or("<unnamed>"));
	println!("Department: {}.", claims.dept_id.as_deref().unwrap_or("<none>"));

	let again = session.resolve().await?;

	println!("Second resolve reused the cached token: {}.", again.expose() == token.expose());

	Ok(())
}
