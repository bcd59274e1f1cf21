//! Identity provider token validators.
//!
//! Three parallel implementations ([`apple`], [`google`], [`microsoft`])
//! turn an untrusted bearer token into a verified [`Claims`] set. Each
//! fetches the provider's published signing keys (cached per `kid`), checks
//! the RS256 signature, and validates claims in a fixed order, failing with a
//! provider-namespaced error on the first mismatch. They share only the cache
//! and HTTP-client plumbing; key formats and claim rules are per provider.

pub mod apple;
pub mod google;
pub mod microsoft;

// std
use std::fmt::{Display, Formatter, Result as FmtResult};
// crates.io
use reqwest::Client;
use serde::{Deserialize, Deserializer};
// self
use crate::_prelude::*;

/// Deadline applied to each signing-key discovery request.
pub(crate) const KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
/// Overall timeout for the default HTTP client.
pub(crate) const CLIENT_TIMEOUT: Duration = Duration::from_secs(60);
/// Cache lifetime for signing keys when the provider does not say otherwise.
pub(crate) const DEFAULT_KEY_TTL: Duration = Duration::from_secs(60 * 60);

/// Which identity provider produced a token or a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provider {
	/// Sign in with Apple.
	Apple,
	/// Google sign-in.
	Google,
	/// Microsoft identity platform.
	Microsoft,
}
impl Display for Provider {
	fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
		let name = match self {
			Self::Apple => "Apple",
			Self::Google => "Google",
			Self::Microsoft => "Microsoft",
		};

		write!(f, "{name}")
	}
}

/// Claims extracted from a successfully validated identity token.
///
/// Produced per validation call and never persisted.
#[derive(Clone, Debug)]
pub struct Claims {
	/// Token issuer (`iss`).
	pub issuer: String,
	/// Audiences the token was issued for (`aud`).
	pub audience: Vec<String>,
	/// Stable subject identifier at the provider (`sub`).
	pub subject: String,
	/// Expiration instant (`exp`).
	pub expires_at: DateTime<Utc>,
	/// Email address asserted by the provider, when present.
	pub email: String,
	/// Whether the provider vouches for the email address.
	pub email_verified: bool,
}

/// The capability shared by all provider validators.
pub trait Validate {
	/// Verify the token's signature and claims, returning the embedded claim
	/// set on success.
	fn validate(&self, token: &str) -> impl Future<Output = Result<Claims>> + Send;
}

/// Raw claim set as deserialized from a token payload, before checks.
#[derive(Debug, Deserialize)]
pub(crate) struct RawClaims {
	pub iss: String,
	#[serde(default, deserialize_with = "one_or_many")]
	pub aud: Vec<String>,
	pub sub: String,
	pub exp: i64,
	#[serde(default)]
	pub email: String,
	#[serde(default)]
	pub email_verified: bool,
}
impl RawClaims {
	pub(crate) fn into_claims(self) -> Claims {
		Claims {
			issuer: self.iss,
			audience: self.aud,
			subject: self.sub,
			expires_at: DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH),
			email: self.email,
			email_verified: self.email_verified,
		}
	}
}

/// Build the default HTTP client used when none is injected.
pub(crate) fn default_client() -> Result<Client> {
	Client::builder()
		.timeout(CLIENT_TIMEOUT)
		.connect_timeout(Duration::from_secs(5))
		.user_agent(concat!("oauth-sessions/", env!("CARGO_PKG_VERSION")))
		.build()
		.map_err(Error::from)
}

// the `aud` claim is a bare string or an array depending on the provider
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
	D: Deserializer<'de>,
{
	#[derive(Deserialize)]
	#[serde(untagged)]
	enum OneOrMany {
		One(String),
		Many(Vec<String>),
	}

	Ok(match OneOrMany::deserialize(deserializer)? {
		OneOrMany::One(value) => vec![value],
		OneOrMany::Many(values) => values,
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn aud_accepts_string_and_array_forms() {
		let single: RawClaims = serde_json::from_str(
			r#"{"iss":"i","aud":"client-1","sub":"s","exp":1735732800}"#,
		)
		.expect("single aud");

		assert_eq!(single.aud, vec!["client-1".to_string()]);

		let many: RawClaims = serde_json::from_str(
			r#"{"iss":"i","aud":["client-1","client-2"],"sub":"s","exp":1735732800}"#,
		)
		.expect("array aud");

		assert_eq!(many.aud, vec!["client-1".to_string(), "client-2".to_string()]);
	}

	#[test]
	fn missing_optional_claims_default() {
		let claims: RawClaims =
			serde_json::from_str(r#"{"iss":"i","sub":"s","exp":1735732800}"#).expect("claims");

		assert!(claims.aud.is_empty());
		assert_eq!(claims.email, "");
		assert!(!claims.email_verified);
	}

	#[test]
	fn into_claims_converts_expiry_to_utc() {
		let raw: RawClaims =
			serde_json::from_str(r#"{"iss":"i","sub":"s","exp":1735732800}"#).expect("claims");
		let claims = raw.into_claims();

		assert_eq!(claims.expires_at.timestamp(), 1_735_732_800);
	}
}
