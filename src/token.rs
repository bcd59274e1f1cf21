//! Opaque secret tokens for sessions and nonces.

// std
use std::fmt::{Debug, Formatter, Result as FmtResult};
// crates.io
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An opaque secret value, such as a session token or a nonce.
///
/// The `Debug` implementation redacts the inner value so a secret cannot leak
/// through logs or panic messages; call [`Secret::expose`] where the raw
/// string is genuinely needed (cache keys, wire encoding).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wrap an existing string as a secret.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Mint a fresh cryptographically random secret (UUIDv4).
	pub fn random() -> Self {
		Self(Uuid::new_v4().to_string())
	}

	/// Read the underlying value.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		write!(f, "Secret(<redacted>)")
	}
}
