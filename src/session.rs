//! Session creation and token/identity matching.

// crates.io
use cookie::Cookie;
// self
use crate::{_prelude::*, cache::Cache, cookies::CookieFactory, identity::Identity, token::Secret};

/// Manages sessions and the cookies associated with those sessions.
///
/// `Sessions` owns a [`CookieFactory`] to bake cookies and a [`Cache`]
/// mapping each minted session token to the identity it was issued for. The
/// cache decides durability: the in-memory [`TtlCache`](crate::cache::TtlCache)
/// forgets everything on restart, an external store survives it.
pub struct Sessions<U> {
	cache: Arc<dyn Cache<U>>,
	cookies: CookieFactory,
}
impl<U> Sessions<U>
where
	U: Identity,
{
	/// Create a session store from a cookie factory and a token cache.
	pub fn new(cookies: CookieFactory, cache: Arc<dyn Cache<U>>) -> Self {
		Self { cache, cookies }
	}

	/// Name of the cookie this store issues and recognizes.
	pub fn cookie_name(&self) -> &str {
		self.cookies.name()
	}

	/// Create a session for `id` lasting `ttl`, returning the cookie to set.
	///
	/// Mints a fresh random token, records `token -> id` in the cache, and
	/// bakes the cookie carrying both.
	pub fn create(&self, id: U, ttl: Duration) -> Result<Cookie<'static>> {
		let token = Secret::random();
		let cookie = self.cookies.create(id, &token, ttl)?;

		self.cache.put(token.expose(), id, ttl);

		Ok(cookie)
	}

	/// Verify that `token` still maps to the claimed identity `id`.
	///
	/// Fails with [`Error::SessionNotFound`] when the token is unknown or
	/// expired, and with [`Error::SessionNotMatch`] when the token exists but
	/// is bound to a different identity, a sign of tampering or reuse across
	/// accounts.
	pub fn matches(&self, id: U, token: &Secret) -> Result<()> {
		match self.cache.get(token.expose()) {
			None => Err(Error::SessionNotFound),
			Some(actual) if actual != id => Err(Error::SessionNotMatch),
			Some(_) => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use cookie::time::OffsetDateTime;
	// self
	use super::*;
	use crate::{cache::TtlCache, cookies::CookiePayload};

	fn test_sessions() -> Sessions<u64> {
		let factory = CookieFactory::new("session-token")
			.with_clock(Arc::new(|| OffsetDateTime::from_unix_timestamp(1_735_732_800).unwrap()));

		Sessions::new(factory, Arc::new(TtlCache::new()))
	}

	#[test]
	fn create_stores_token_and_bakes_cookie() {
		let sessions = test_sessions();
		let cookie = sessions.create(12345, Duration::from_secs(3600)).expect("cookie");

		assert_eq!(cookie.name(), "session-token");

		let payload = CookiePayload::<u64>::decode(cookie.value()).expect("payload");

		assert!(sessions.matches(12345, &payload.token).is_ok());
	}

	#[test]
	fn matches_distinguishes_not_found_from_not_match() {
		let sessions = test_sessions();
		let cookie = sessions.create(12345, Duration::from_secs(3600)).expect("cookie");
		let payload = CookiePayload::<u64>::decode(cookie.value()).expect("payload");

		assert!(matches!(sessions.matches(99999, &payload.token), Err(Error::SessionNotMatch)));

		let unrelated = Secret::random();

		assert!(matches!(sessions.matches(12345, &unrelated), Err(Error::SessionNotFound)));
	}

	#[test]
	fn matches_fails_after_token_expiry() {
		// zero ttl expires the record immediately
		let sessions = test_sessions();
		let cookie = sessions.create(12345, Duration::ZERO).expect("cookie");
		let payload = CookiePayload::<u64>::decode(cookie.value()).expect("payload");

		assert!(matches!(sessions.matches(12345, &payload.token), Err(Error::SessionNotFound)));
	}
}
