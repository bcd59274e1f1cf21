//! Cookie baking and the session cookie wire format.

// crates.io
use base64::prelude::*;
use cookie::{Cookie, SameSite, time::OffsetDateTime};
use serde::{Deserialize, Serialize};
// self
use crate::{_prelude::*, identity::Identity, token::Secret};

/// Injectable wall clock, used to make cookie expirations deterministic under
/// test.
pub type WallClock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

/// The data stored per session, carried in the cookie value.
///
/// Wire format: base64 (standard alphabet) of the JSON object
/// `{"token": string, "user_id": identity}`. The payload is opaque but not
/// encrypted; the token it carries is independently verified server-side on
/// every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct CookiePayload<U> {
	/// The secret session token bound to this cookie.
	pub token: Secret,
	/// The identity claimed by this cookie.
	pub user_id: U,
}
impl<U> CookiePayload<U>
where
	U: Identity,
{
	/// Encode the payload into a cookie value.
	pub fn encode(&self) -> Result<String> {
		let json = serde_json::to_vec(self)?;

		Ok(BASE64_STANDARD.encode(json))
	}

	/// Decode a cookie value back into a payload.
	pub fn decode(value: &str) -> Result<Self> {
		let json = BASE64_STANDARD.decode(value)?;

		Ok(serde_json::from_slice(&json)?)
	}
}

/// Bakes cookies representing a user identity and its associated session
/// token.
///
/// Each cookie minted carries the same name; i.e. the name associated with
/// the cookie in the requester's cookie jar (web browser / http client).
/// No validation of the identity or token happens here; that is the
/// [`Sessions`](crate::session::Sessions) store's job.
pub struct CookieFactory {
	name: String,
	secure: bool,
	clock: WallClock,
}
impl CookieFactory {
	/// Create a factory minting cookies under the given name.
	///
	/// The `Secure` attribute defaults to on; disable it only for plain-HTTP
	/// development setups.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), secure: true, clock: Arc::new(OffsetDateTime::now_utc) }
	}

	/// Set the cookie `Secure` attribute.
	pub fn with_secure(mut self, secure: bool) -> Self {
		self.secure = secure;

		self
	}

	/// Inject a wall clock (primarily for tests).
	pub fn with_clock(mut self, clock: WallClock) -> Self {
		self.clock = clock;

		self
	}

	/// Name under which the factory's cookies are stored.
	pub fn name(&self) -> &str {
		&self.name
	}

	/// Bake a cookie binding `id` to `token`, expiring `ttl` from now.
	pub fn create<U>(&self, id: U, token: &Secret, ttl: Duration) -> Result<Cookie<'static>>
	where
		U: Identity,
	{
		let expiration = (self.clock)() + ttl;
		let payload = CookiePayload { token: token.clone(), user_id: id };
		let encoded = payload.encode()?;
		let cookie = Cookie::build((self.name.clone(), encoded))
			.path("/")
			.http_only(true)
			.same_site(SameSite::Lax)
			.secure(self.secure)
			.expires(expiration)
			.build();

		Ok(cookie)
	}
}
