//! Crate-wide error types and `Result` alias.

// self
use crate::providers::Provider;

/// Library-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the oauth-sessions crate.
///
/// Provider failures carry the [`Provider`] discriminant so callers can log
/// which upstream rejected a token without string matching. Every variant is
/// recoverable; the caller decides whether to treat it as "unauthenticated"
/// or surface it.
#[allow(missing_docs)]
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Base64(#[from] base64::DecodeError),
	#[error(transparent)]
	Jsonwebtoken(#[from] jsonwebtoken::errors::Error),
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Serde(#[from] serde_json::Error),
	#[error(transparent)]
	Url(#[from] url::ParseError),

	#[error("{provider} token is malformed")]
	MalformedToken { provider: Provider },
	#[error("{provider} public key '{kid}' not found")]
	KeyNotFound { provider: Provider, kid: String },
	#[error("{provider} key material could not be decoded: {reason}")]
	KeyDecode { provider: Provider, reason: String },
	#[error("{provider} token iss is not valid")]
	IssuerMismatch { provider: Provider },
	#[error("{provider} token aud is not valid")]
	AudienceMismatch { provider: Provider },
	#[error("{provider} token is expired")]
	TokenExpired { provider: Provider },
	#[error("{provider} email is not verified")]
	EmailNotVerified { provider: Provider },

	#[error("session: not found")]
	SessionNotFound,
	#[error("session: not a match")]
	SessionNotMatch,
	#[error("token not valid")]
	NonceNotValid,
}
