//! Integration tests for the session-resolving middleware.

// std
use std::{sync::Arc, time::Duration};
// crates.io
use axum::{
	Extension, Router,
	body::Body,
	http::{Request, StatusCode, header::COOKIE},
	middleware::from_fn_with_state,
	routing::get,
};
use http_body_util::BodyExt;
use oauth_sessions::{
	CookieFactory, CookiePayload, Secret, SessionState, Sessions, TtlCache, attach_session,
};
use tower::ServiceExt;

async fn whoami(Extension(session): Extension<SessionState<u64>>) -> String {
	match session.identity() {
		Some(id) => format!("active:{id}"),
		None => "inactive".to_string(),
	}
}

fn test_app() -> (Arc<Sessions<u64>>, Router) {
	let factory = CookieFactory::new("session-token").with_secure(false);
	let sessions = Arc::new(Sessions::new(factory, Arc::new(TtlCache::new())));
	let app = Router::new()
		.route("/whoami", get(whoami))
		.layer(from_fn_with_state(sessions.clone(), attach_session::<u64>));

	(sessions, app)
}

async fn body_text(app: Router, request: Request<Body>) -> (StatusCode, String) {
	let response = app.oneshot(request).await.expect("response");
	let status = response.status();
	let bytes = response.into_body().collect().await.expect("body").to_bytes();

	(status, String::from_utf8(bytes.to_vec()).expect("utf8 body"))
}

fn plain_request() -> Request<Body> {
	Request::builder().uri("/whoami").body(Body::empty()).expect("request")
}

fn request_with_cookie(value: &str) -> Request<Body> {
	Request::builder()
		.uri("/whoami")
		.header(COOKIE, format!("session-token={value}"))
		.body(Body::empty())
		.expect("request")
}

#[tokio::test]
async fn request_without_cookie_reaches_handler_as_inactive() {
	let _ = tracing_subscriber::fmt::try_init();

	let (_sessions, app) = test_app();
	let (status, body) = body_text(app, plain_request()).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "inactive");
}

#[tokio::test]
async fn live_session_cookie_resolves_to_identity() {
	let (sessions, app) = test_app();
	let cookie = sessions.create(12345, Duration::from_secs(3600)).expect("cookie");
	let (status, body) = body_text(app, request_with_cookie(cookie.value())).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "active:12345");
}

#[tokio::test]
async fn undecodable_cookie_is_treated_as_no_session() {
	let (_sessions, app) = test_app();
	let (status, body) = body_text(app, request_with_cookie("garbage-not-base64")).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "inactive");
}

#[tokio::test]
async fn tampered_identity_is_treated_as_no_session() {
	let (sessions, app) = test_app();
	let cookie = sessions.create(12345, Duration::from_secs(3600)).expect("cookie");

	// re-encode the payload claiming someone else's identity
	let payload = CookiePayload::<u64>::decode(cookie.value()).expect("payload");
	let forged =
		CookiePayload { token: payload.token, user_id: 99999_u64 }.encode().expect("encode");
	let (status, body) = body_text(app, request_with_cookie(&forged)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "inactive");
}

#[tokio::test]
async fn unknown_token_is_treated_as_no_session() {
	let (_sessions, app) = test_app();
	let forged = CookiePayload { token: Secret::random(), user_id: 12345_u64 }
		.encode()
		.expect("encode");
	let (status, body) = body_text(app, request_with_cookie(&forged)).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "inactive");
}

#[tokio::test]
async fn expired_session_is_treated_as_no_session() {
	let (sessions, app) = test_app();
	let cookie = sessions.create(12345, Duration::ZERO).expect("cookie");
	let (status, body) = body_text(app, request_with_cookie(cookie.value())).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, "inactive");
}
