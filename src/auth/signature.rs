//! Account signatures and nonce challenges.
//!
//! The security service never sees the account secret. Clients prove possession by
//! deriving a signature from the uppercased account and the hashed secret, then hashing that
//! signature together with the single-use stamp issued for each acquisition attempt.

// std
use std::fmt::Write;
// crates.io
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Signature derived from an account and its secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(String);
impl Signature {
	/// Returns the challenge response for a server-issued stamp.
	pub fn challenge(&self, stamp: &str) -> String {
		hash(&format!("{}{stamp}", self.0))
	}

	/// Returns the signature text. Callers must avoid logging it.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Signature {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Signature").field(&"<redacted>").finish()
	}
}

/// Derives the account signature; the account is matched case-insensitively.
pub fn sign(account: &str, secret: &str) -> Signature {
	let normalized = account.to_uppercase();

	Signature(hash(&format!("{normalized}{}", hash(secret))))
}

/// Lowercase hexadecimal SHA-256 digest of `input`.
pub fn hash(input: &str) -> String {
	let digest = Sha256::digest(input.as_bytes());

	digest.iter().fold(String::with_capacity(digest.len() * 2), |mut out, byte| {
		// Writing into a `String` cannot fail.
		let _ = write!(out, "{byte:02x}");

		out
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn hash_matches_known_digest() {
		assert_eq!(
			hash("abc"),
			"ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
		);
		assert_eq!(
			hash(""),
			"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
		);
		assert_eq!(hash("abc").len(), 64);
	}

	#[test]
	fn sign_is_deterministic_and_case_insensitive() {
		let lower = sign("demo-app", "s3cret");
		let upper = sign("DEMO-APP", "s3cret");
		let mixed = sign("Demo-App", "s3cret");

		assert_eq!(lower, upper);
		assert_eq!(lower, mixed);
		assert_eq!(lower, sign("demo-app", "s3cret"));
		assert_ne!(lower, sign("demo-app", "other"));
		assert_eq!(lower.expose(), hash(&format!("DEMO-APP{}", hash("s3cret"))));
	}

	#[test]
	fn challenge_binds_the_stamp() {
		let signature = sign("demo-app", "s3cret");

		assert_eq!(signature.challenge("stamp-1"), hash(&format!("{}stamp-1", signature.expose())));
		assert_ne!(signature.challenge("stamp-1"), signature.challenge("stamp-2"));
	}

	#[test]
	fn debug_redacts_signature() {
		assert_eq!(format!("{:?}", sign("a", "b")), "Signature(\"<redacted>\")");
	}
}
