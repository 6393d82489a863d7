//! Identifiers carried in security service query strings.
//!
//! Accounts are free-form names that the service matches case-insensitively. Departments and
//! actions are GUIDs; they are stored in the lowercase hyphenated form the service expects,
//! whatever case or braces the caller supplied.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

const ACCOUNT_MAX_CHARS: usize = 128;
const GUID_LEN: usize = 36;
const GUID_HYPHENS: [usize; 4] = [8, 13, 18, 23];

macro_rules! identifier {
	($(#[$meta:meta])* $name:ident, $kind:literal, $normalize:path) => {
		$(#[$meta])*
		#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Validates `value` and stores it in canonical form.
			pub fn new(value: impl Into<String>) -> Result<Self, IdentifierError> {
				$normalize($kind, value.into()).map(Self)
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &str {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				Self::new(value)
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
	};
}

/// Rejected identifier input.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// Nothing was supplied.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// `Account`, `Dept` or `Action`.
		kind: &'static str,
	},
	/// An account name holds whitespace or a control character.
	#[error("{kind} identifier contains {character:?}.")]
	InvalidCharacter {
		/// `Account`, `Dept` or `Action`.
		kind: &'static str,
		/// First offending character.
		character: char,
	},
	/// An account name is longer than the service accepts.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// `Account`, `Dept` or `Action`.
		kind: &'static str,
		/// Maximum character count.
		max: usize,
	},
	/// A department or action id is not a GUID.
	#[error("{kind} identifier must be a GUID such as `0f8fad5b-d9cb-469f-a165-70867728950e`.")]
	NotAGuid {
		/// `Account`, `Dept` or `Action`.
		kind: &'static str,
	},
}

identifier! {
	/// Application or tenant account registered with the security service.
	///
	/// Spelling is kept as given; [`sign`](crate::auth::sign) uppercases it itself.
	AccountId, "Account", account_name
}
identifier! {
	/// Department selected at login (`deptid`).
	DeptId, "Dept", guid
}
identifier! {
	/// Action checked by action-scoped verification (`auth?action=`).
	ActionId, "Action", guid
}

fn account_name(kind: &'static str, value: String) -> Result<String, IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if let Some(character) = value.chars().find(|c| c.is_whitespace() || c.is_control()) {
		return Err(IdentifierError::InvalidCharacter { kind, character });
	}
	if value.chars().count() > ACCOUNT_MAX_CHARS {
		return Err(IdentifierError::TooLong { kind, max: ACCOUNT_MAX_CHARS });
	}

	Ok(value)
}

fn guid(kind: &'static str, value: String) -> Result<String, IdentifierError> {
	if value.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}

	let bare =
		value.strip_prefix('{').and_then(|rest| rest.strip_suffix('}')).unwrap_or(value.as_str());
	let well_formed = bare.len() == GUID_LEN
		&& bare.char_indices().all(|(i, c)| {
			if GUID_HYPHENS.contains(&i) { c == '-' } else { c.is_ascii_hexdigit() }
		});

	if !well_formed {
		return Err(IdentifierError::NotAGuid { kind });
	}

	Ok(bare.to_ascii_lowercase())
}
