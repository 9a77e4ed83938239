#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use posm_session::{
	_preludet::*,
	bootstrap::{Admission, Bootstrapper, PagePolicy, RedirectReason},
	session::{Role, Session},
	store::{MemoryStore, SessionStore},
};

const LOGIN_SURFACE: &str = "https://posm.example/login";
const ADMIN_LANDING: &str = "https://posm.example/admin";

fn url(raw: &str) -> Url {
	Url::parse(raw).expect("Fixture URL should parse successfully.")
}

fn field_user_policy() -> PagePolicy {
	PagePolicy::new(Role::User, url(LOGIN_SURFACE))
		.landing_page(Role::Admin, url(ADMIN_LANDING))
}

async fn seed_session(store: &MemoryStore, access: &str, refresh: &str) {
	store
		.replace(Session::new(access, refresh, None))
		.await
		.expect("Failed to seed session into the store.");
}

#[tokio::test]
async fn verified_user_with_matching_role_is_admitted() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	seed_session(&store, "a-1", "r-1").await;

	let verify = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/verify").header("authorization", "Bearer a-1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"username":"tdp.hn","role":"user","leader":"lead.sw"}"#);
		})
		.await;
	let bootstrapper = Bootstrapper::new(&gateway, field_user_policy());
	let admission = bootstrapper
		.admit(&url("https://posm.example/surveys"))
		.await
		.expect("Admission check should succeed.");

	verify.assert_async().await;

	let Admission::Admitted { user } = admission else {
		panic!("A matching role should be admitted, got {admission:?}.");
	};

	assert_eq!(user.username, "tdp.hn");
	assert_eq!(user.role, Role::User);

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert_eq!(
		snapshot.user.map(|u| u.username),
		Some("tdp.hn".into()),
		"Verification should re-cache the server's profile.",
	);
}

#[tokio::test]
async fn role_mismatch_redirects_to_the_role_landing_without_clearing() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	seed_session(&store, "a-1", "r-1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/verify");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"username":"boss.hq","role":"admin","isSuperAdmin":true}"#);
		})
		.await;
	let bootstrapper = Bootstrapper::new(&gateway, field_user_policy());
	let admission = bootstrapper
		.admit(&url("https://posm.example/surveys"))
		.await
		.expect("Admission check should succeed.");

	assert_eq!(
		admission,
		Admission::Redirect { target: url(ADMIN_LANDING), reason: RedirectReason::RoleMismatch },
	);

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert!(
		snapshot.access_token.is_some(),
		"A signed-in user on the wrong page keeps their session.",
	);
}

#[tokio::test]
async fn missing_session_redirects_to_login_without_calling_the_backend() {
	let server = MockServer::start_async().await;
	let (gateway, _store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));
	let verify = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/verify");
			then.status(200);
		})
		.await;
	let bootstrapper = Bootstrapper::new(&gateway, field_user_policy());
	let admission = bootstrapper
		.admit(&url("https://posm.example/surveys"))
		.await
		.expect("Admission check should succeed.");

	verify.assert_calls_async(0).await;

	assert_eq!(
		admission,
		Admission::Redirect { target: url(LOGIN_SURFACE), reason: RedirectReason::NoSession },
	);
}

#[tokio::test]
async fn browser_already_on_the_login_surface_stays_put() {
	let server = MockServer::start_async().await;
	let (gateway, _store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));
	let bootstrapper = Bootstrapper::new(&gateway, field_user_policy());
	let admission = bootstrapper
		.admit(&url("https://posm.example/login?next=%2Fsurveys"))
		.await
		.expect("Admission check should succeed.");

	assert_eq!(admission, Admission::Stay, "Redirecting to the current surface would loop.");
}

#[tokio::test]
async fn dead_session_is_cleared_before_redirecting() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	seed_session(&store, "a-1", "r-1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/verify");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"code":"TOKEN_EXPIRED"}"#);
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"error":"invalid refresh token"}"#);
		})
		.await;
	let bootstrapper = Bootstrapper::new(&gateway, field_user_policy());
	let admission = bootstrapper
		.admit(&url("https://posm.example/surveys"))
		.await
		.expect("Admission check should produce a redirect, not an error.");

	assert_eq!(
		admission,
		Admission::Redirect { target: url(LOGIN_SURFACE), reason: RedirectReason::SessionExpired },
	);

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert!(snapshot.access_token.is_none(), "A dead session must not linger in storage.");
	assert!(snapshot.refresh_token.is_none());
}
