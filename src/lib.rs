//! Provider-verified sign-in and short-lived session management for Rust web
//! services — Apple/Google/Microsoft identity-token validation, TTL caching,
//! cookie-bound sessions, and one-time nonces.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod cache;
pub mod cookies;
pub mod identity;
pub mod middleware;
pub mod nonce;
pub mod providers;
pub mod session;
pub mod token;

mod error;
mod _prelude {
	pub use std::{
		sync::Arc,
		time::{Duration, SystemTime},
	};

	pub use chrono::{DateTime, Utc};

	pub use crate::{Error, Result};
}

pub use crate::{
	cache::{Cache, TtlCache},
	cookies::{CookieFactory, CookiePayload},
	error::{Error, Result},
	identity::Identity,
	middleware::{SessionState, attach_session},
	nonce::Mint,
	providers::{Claims, Provider, Validate},
	session::Sessions,
	token::Secret,
};
