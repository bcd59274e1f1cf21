//! Google identity-token validation.

// std
use std::collections::HashMap;
// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::{
	Client,
	header::{EXPIRES, HeaderMap},
};
use url::Url;
// self
use crate::{
	_prelude::*,
	cache::{Cache, TtlCache},
	providers::{self, Claims, Provider, RawClaims, Validate},
};

/// Official oauth certificate endpoint for Google.
const PUBLIC_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v1/certs";
/// Issuer spellings Google uses in identity tokens.
const ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Validates Google-issued identity tokens for one client id.
///
/// Google publishes its signing keys as a flat map of `kid` to PEM-encoded
/// RSA public key, and advertises the set's lifetime through the HTTP
/// `Expires` response header.
pub struct Validator {
	endpoint: Url,
	client: Client,
	client_id: String,
	cache: Arc<dyn Cache<String>>,
}
impl Validator {
	/// Create a validator expecting tokens issued to `client_id`, fetching
	/// keys from Google's production endpoint.
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

	/// Substitute the signing key cache; values are PEM-encoded public keys.
	pub fn with_cache(mut self, cache: Arc<dyn Cache<String>>) -> Self {
		self.cache = cache;

		self
	}

	#[tracing::instrument(skip(self))]
	async fn signing_key(&self, kid: &str) -> Result<DecodingKey> {
		if let Some(pem) = self.cache.get(kid) {
			return decoding_key(&pem);
		}

		tracing::debug!(kid, "Google key cache miss; fetching certificate map");

		let response = self
			.client
			.get(self.endpoint.clone())
			.timeout(providers::KEY_FETCH_TIMEOUT)
			.send()
			.await?
			.error_for_status()?;
		// the certificates Expires header drives the cache lifetime
		let ttl = keys_ttl(SystemTime::now(), response.headers());
		let mut data: HashMap<String, String> = response.json().await?;

		for (id, pem) in &data {
			self.cache.put(id, pem.clone(), ttl);
		}

		match data.remove(kid) {
			Some(pem) => decoding_key(&pem),
			None => Err(Error::KeyNotFound { provider: Provider::Google, kid: kid.to_owned() }),
		}
	}
}
impl Validate for Validator {
	fn validate(&self, token: &str) -> impl Future<Output = Result<Claims>> + Send {
		async move {
			let header = decode_header(token)
				.map_err(|_| Error::MalformedToken { provider: Provider::Google })?;
			let kid = header.kid.ok_or(Error::MalformedToken { provider: Provider::Google })?;
			let key = self.signing_key(&kid).await?;
			let mut validation = Validation::new(Algorithm::RS256);

			// claims are checked explicitly below, in a fixed order
			validation.validate_exp = false;
			validation.validate_aud = false;
			validation.required_spec_claims.clear();

			let claims = decode::<RawClaims>(token, &key, &validation)?.claims;

			if !ISSUERS.contains(&claims.iss.as_str()) {
				return Err(Error::IssuerMismatch { provider: Provider::Google });
			}
			if !claims.aud.iter().any(|aud| aud == &self.client_id) {
				return Err(Error::AudienceMismatch { provider: Provider::Google });
			}
			if claims.exp <= Utc::now().timestamp() {
				return Err(Error::TokenExpired { provider: Provider::Google });
			}
			if !claims.email_verified {
				return Err(Error::EmailNotVerified { provider: Provider::Google });
			}

			Ok(claims.into_claims())
		}
	}
}

fn decoding_key(pem: &str) -> Result<DecodingKey> {
	DecodingKey::from_rsa_pem(pem.as_bytes()).map_err(Error::from)
}

/// Cache lifetime for a fetched key set, from the `Expires` response header.
///
/// Falls back to one hour when the header is absent or unparsable. An
/// `Expires` already in the past yields a zero TTL, so the keys are discarded
/// on next access.
fn keys_ttl(now: SystemTime, headers: &HeaderMap) -> Duration {
	let Some(raw) = headers.get(EXPIRES).and_then(|value| value.to_str().ok()) else {
		return providers::DEFAULT_KEY_TTL;
	};

	match httpdate::parse_http_date(raw) {
		Ok(expiration) => expiration.duration_since(now).unwrap_or(Duration::ZERO),
		Err(_) => providers::DEFAULT_KEY_TTL,
	}
}
