//! Request middleware resolving session cookies into identities.

// crates.io
use axum::{
	extract::{Request, State},
	http::Extensions,
	middleware::Next,
	response::Response,
};
use axum_extra::extract::cookie::CookieJar;
// self
use crate::{_prelude::*, cookies::CookiePayload, identity::Identity, session::Sessions};

/// The session resolved for an inbound request.
///
/// Attached to every request's extensions by [`attach_session`]; downstream
/// handlers read it via `Extension<SessionState<U>>` and decide what an
/// inactive session means for them. The marker is a value; mutating a copy
/// does not affect other consumers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState<U> {
	/// A verified session exists for this identity.
	Active(U),
	/// No session, or the presented cookie failed verification.
	Inactive,
}
impl<U> SessionState<U>
where
	U: Identity,
{
	/// Whether a verified session is present.
	pub fn active(&self) -> bool {
		matches!(self, Self::Active(_))
	}

	/// The verified identity, when active.
	pub fn identity(&self) -> Option<U> {
		match self {
			Self::Active(id) => Some(*id),
			Self::Inactive => None,
		}
	}

	/// Read the session attached to a request, defaulting to
	/// [`SessionState::Inactive`] when the middleware did not run.
	pub fn from_extensions(extensions: &Extensions) -> Self {
		extensions.get::<Self>().copied().unwrap_or(Self::Inactive)
	}
}

/// Middleware attaching a [`SessionState`] to every inbound request.
///
/// Reads the store's named cookie and verifies its token/identity binding.
/// Absent cookie, undecodable payload, and failed verification all attach
/// [`SessionState::Inactive`] and let the request continue; downstream
/// authorization decides what to do with an inactive session. The request is
/// never aborted here.
///
/// Install with
/// `axum::middleware::from_fn_with_state(sessions, attach_session::<U>)`.
pub async fn attach_session<U>(
	State(sessions): State<Arc<Sessions<U>>>,
	mut request: Request,
	next: Next,
) -> Response
where
	U: Identity,
{
	let state = resolve(&sessions, &request);

	request.extensions_mut().insert(state);

	next.run(request).await
}

fn resolve<U>(sessions: &Sessions<U>, request: &Request) -> SessionState<U>
where
	U: Identity,
{
	let jar = CookieJar::from_headers(request.headers());
	let Some(cookie) = jar.get(sessions.cookie_name()) else {
		return SessionState::Inactive;
	};
	let payload = match CookiePayload::<U>::decode(cookie.value()) {
		Ok(payload) => payload,
		Err(error) => {
			tracing::debug!(%error, "session cookie failed to decode");

			return SessionState::Inactive;
		},
	};

	match sessions.matches(payload.user_id, &payload.token) {
		Ok(()) => SessionState::Active(payload.user_id),
		Err(Error::SessionNotMatch) => {
			// a token bound to a different identity is likely tampering
			tracing::warn!("session token does not match claimed identity");

			SessionState::Inactive
		},
		Err(error) => {
			tracing::debug!(%error, "no active session");

			SessionState::Inactive
		},
	}
}
