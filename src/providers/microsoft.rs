//! Microsoft identity-token validation.

// crates.io
use base64::prelude::*;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use reqwest::Client;
use serde::Deserialize;
use url::Url;
use x509_parser::{parse_x509_certificate, public_key::PublicKey};
// self
use crate::{
	_prelude::*,
	cache::{Cache, TtlCache},
	providers::{self, Claims, Provider, RawClaims, Validate},
};

/// Official oauth certificate endpoint for Microsoft.
const PUBLIC_ENDPOINT: &str = "https://login.microsoftonline.com/common/discovery/v2.0/keys";
/// Issuer prefix common to all Microsoft tenants.
const ISSUER_PREFIX: &str = "https://login.microsoftonline.com/";

#[derive(Debug, Deserialize)]
struct KeySet {
	keys: Vec<Key>,
}

#[derive(Debug, Deserialize)]
struct Key {
	kid: String,
	#[serde(default)]
	x5c: Vec<String>,
}

/// Validates Microsoft-issued identity tokens for one client id.
///
/// Microsoft publishes its signing keys as `x5c` X.509 certificate chains;
/// the leaf certificate of each chain carries the RSA public key. Tenanted
/// issuers all live under one URL prefix, so only the prefix is checked, and
/// Microsoft publishes no email-verification claim.
pub struct Validator {
	endpoint: Url,
	client: Client,
	client_id: String,
	cache: Arc<dyn Cache<String>>,
}
impl Validator {
	/// Create a validator expecting tokens issued to `client_id`, fetching
	/// keys from Microsoft's common discovery endpoint.
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

	/// Substitute the signing key cache; values are base64 DER leaf
	/// certificates.
	pub fn with_cache(mut self, cache: Arc<dyn Cache<String>>) -> Self {
		self.cache = cache;

		self
	}

	#[tracing::instrument(skip(self))]
	async fn signing_key(&self, kid: &str) -> Result<DecodingKey> {
		if let Some(leaf) = self.cache.get(kid) {
			return decoding_key(&leaf);
		}

		tracing::debug!(kid, "Microsoft key cache miss; fetching key set");

		let response = self
			.client
			.get(self.endpoint.clone())
			.timeout(providers::KEY_FETCH_TIMEOUT)
			.send()
			.await?
			.error_for_status()?;
		let set: KeySet = response.json().await?;
		let mut wanted = None;

		// cache the leaf certificate of every returned chain
		for key in set.keys {
			let Some(leaf) = key.x5c.into_iter().next() else {
				continue;
			};

			self.cache.put(&key.kid, leaf.clone(), providers::DEFAULT_KEY_TTL);

			if key.kid == kid {
				wanted = Some(leaf);
			}
		}

		match wanted {
			Some(leaf) => decoding_key(&leaf),
			None => Err(Error::KeyNotFound { provider: Provider::Microsoft, kid: kid.to_owned() }),
		}
	}
}
impl Validate for Validator {
	fn validate(&self, token: &str) -> impl Future<Output = Result<Claims>> + Send {
		async move {
			let header = decode_header(token)
				.map_err(|_| Error::MalformedToken { provider: Provider::Microsoft })?;
			let kid = header.kid.ok_or(Error::MalformedToken { provider: Provider::Microsoft })?;
			let key = self.signing_key(&kid).await?;
			let mut validation = Validation::new(Algorithm::RS256);

			// claims are checked explicitly below, in a fixed order
			validation.validate_exp = false;
			validation.validate_aud = false;
			validation.required_spec_claims.clear();

			let claims = decode::<RawClaims>(token, &key, &validation)?.claims;

			if !claims.iss.starts_with(ISSUER_PREFIX) {
				return Err(Error::IssuerMismatch { provider: Provider::Microsoft });
			}
			if !claims.aud.iter().any(|aud| aud == &self.client_id) {
				return Err(Error::AudienceMismatch { provider: Provider::Microsoft });
			}
			if claims.exp <= Utc::now().timestamp() {
				return Err(Error::TokenExpired { provider: Provider::Microsoft });
			}

			// there is no microsoft email validation option

			Ok(claims.into_claims())
		}
	}
}

/// Extract the RSA public key from a base64 DER certificate.
fn decoding_key(leaf: &str) -> Result<DecodingKey> {
	let der = BASE64_STANDARD.decode(leaf).map_err(|err| key_decode(err.to_string()))?;
	let (_, certificate) =
		parse_x509_certificate(&der).map_err(|err| key_decode(err.to_string()))?;
	let public_key =
		certificate.public_key().parsed().map_err(|err| key_decode(err.to_string()))?;
	let PublicKey::RSA(rsa) = public_key else {
		return Err(key_decode("certificate does not carry an RSA public key".into()));
	};
	let n = BASE64_URL_SAFE_NO_PAD.encode(rsa.modulus);
	let e = BASE64_URL_SAFE_NO_PAD.encode(rsa.exponent);

	DecodingKey::from_rsa_components(&n, &e).map_err(Error::from)
}

fn key_decode(reason: String) -> Error {
	Error::KeyDecode { provider: Provider::Microsoft, reason }
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn decoding_key_rejects_invalid_base64() {
		let err = decoding_key("not base64!!").unwrap_err();

		assert!(matches!(err, Error::KeyDecode { provider: Provider::Microsoft, .. }));
	}

	#[test]
	fn decoding_key_rejects_non_certificate_bytes() {
		let bogus = BASE64_STANDARD.encode(b"clearly not DER");
		let err = decoding_key(&bogus).unwrap_err();

		assert!(matches!(err, Error::KeyDecode { provider: Provider::Microsoft, .. }));
	}
}
