//! Sign in with Apple identity-token validation.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use url::Url;
// self
use crate::{
	_prelude::*,
	cache::{Cache, TtlCache},
	providers::{self, Claims, Provider, RawClaims, Validate},
};

/// Official oauth certificate endpoint for Apple.
const PUBLIC_ENDPOINT: &str = "https://appleid.apple.com/auth/keys";
/// Issuer expected in Apple identity tokens.
const ISSUER: &str = "https://appleid.apple.com";

/// RSA public key material as published by Apple, cached per `kid`.
#[derive(Clone, Debug)]
pub struct RsaComponents {
	/// Base64url modulus, no padding.
	pub n: String,
	/// Base64url exponent, no padding.
	pub e: String,
}

#[derive(Debug, Deserialize)]
struct KeySet {
	keys: Vec<Key>,
}

#[derive(Debug, Deserialize)]
struct Key {
	kid: String,
	n: String,
	e: String,
}

/// Validates Apple-issued identity tokens for one client id.
pub struct Validator {
	endpoint: Url,
	client: Client,
	client_id: String,
	cache: Arc<dyn Cache<RsaComponents>>,
}
impl Validator {
	/// Create a validator expecting tokens issued to `client_id`, fetching
	/// keys from Apple's production endpoint.
	pub fn new(client_id: impl Into<String>) -> Result<Self> {
		Ok(Self {
			endpoint: Url::parse(PUBLIC_ENDPOINT)?,
			client: providers::default_client()?,
			client_id: client_id.into(),
			cache: Arc::new(TtlCache::new()),
		})
	}

	/// Override the key discovery endpoint.
	pub fn with_endpoint(mut self, endpoint: Url) -> Self {
		self.endpoint = endpoint;

		self
	}

	/// Supply a custom HTTP client.
	pub fn with_http_client(mut self, client: Client) -> Self {
		self.client = client;

		self
	}

	/// Substitute the signing key cache.
	pub fn with_cache(mut self, cache: Arc<dyn Cache<RsaComponents>>) -> Self {
		self.cache = cache;

		self
	}

	#[tracing::instrument(skip(self))]
	async fn signing_key(&self, kid: &str) -> Result<DecodingKey> {
		if let Some(components) = self.cache.get(kid) {
			return decoding_key(&components);
		}

		tracing::debug!(kid, "Apple key cache miss; fetching key set");

		let response = self
			.client
			.get(self.endpoint.clone())
			.timeout(providers::KEY_FETCH_TIMEOUT)
			.send()
			.await?
			.error_for_status()?;
		let set: KeySet = response.json().await?;
		let mut wanted = None;

		// cache every returned key to amortize the fetch across rotations
		for key in set.keys {
			let components = RsaComponents { n: key.n, e: key.e };

			self.cache.put(&key.kid, components.clone(), providers::DEFAULT_KEY_TTL);

			if key.kid == kid {
				wanted = Some(components);
			}
		}

		match wanted {
			Some(components) => decoding_key(&components),
			None => Err(Error::KeyNotFound { provider: Provider::Apple, kid: kid.to_owned() }),
		}
	}
}
impl Validate for Validator {
	fn validate(&self, token: &str) -> impl Future<Output = Result<Claims>> + Send {
		async move {
			let header = decode_header(token)
				.map_err(|_| Error::MalformedToken { provider: Provider::Apple })?;
			let kid = header.kid.ok_or(Error::MalformedToken { provider: Provider::Apple })?;
			let key = self.signing_key(&kid).await?;
			let mut validation = Validation::new(Algorithm::RS256);

			// claims are checked explicitly below, in a fixed order
			validation.validate_exp = false;
			validation.validate_aud = false;
			validation.required_spec_claims.clear();

			let claims = decode::<RawClaims>(token, &key, &validation)?.claims;

			if claims.iss != ISSUER {
				return Err(Error::IssuerMismatch { provider: Provider::Apple });
			}
			if !claims.aud.iter().any(|aud| aud == &self.client_id) {
				return Err(Error::AudienceMismatch { provider: Provider::Apple });
			}
			if claims.exp <= Utc::now().timestamp() {
				return Err(Error::TokenExpired { provider: Provider::Apple });
			}
			if !claims.email_verified {
				return Err(Error::EmailNotVerified { provider: Provider::Apple });
			}

			Ok(claims.into_claims())
		}
	}
}

fn decoding_key(components: &RsaComponents) -> Result<DecodingKey> {
	DecodingKey::from_rsa_components(&components.n, &components.e).map_err(Error::from)
}
