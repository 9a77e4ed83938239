#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use posm_session::{
	_preludet::*,
	error::ProtocolError,
	gateway::Credentials,
	session::{Role, Session},
	store::{MemoryStore, SessionStore},
};

async fn seed_session(store: &MemoryStore, access: &str, refresh: &str) {
	store
		.replace(Session::new(access, refresh, None))
		.await
		.expect("Failed to seed session into the store.");
}

#[tokio::test]
async fn login_persists_the_full_triple() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login")
				.header("content-type", "application/json")
				.json_body(serde_json::json!({
					"username": "tdp.hn",
					"password": "hunter2",
				}));
			then.status(200).header("content-type", "application/json").body(
				r#"{
					"accessToken": "a-1",
					"refreshToken": "r-1",
					"user": {"username": "tdp.hn", "role": "user", "leader": "lead.sw"}
				}"#,
			);
		})
		.await;
	let user = gateway
		.login(Credentials::new("tdp.hn", "hunter2"))
		.await
		.expect("Login should succeed.");

	login.assert_async().await;

	assert_eq!(user.username, "tdp.hn");
	assert_eq!(user.role, Role::User);

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert_eq!(snapshot.access_token.as_ref().map(AsRef::as_ref), Some("a-1"));
	assert_eq!(snapshot.refresh_token.as_ref().map(AsRef::as_ref), Some("r-1"));
	assert_eq!(snapshot.user.map(|u| u.username), Some("tdp.hn".into()));
}

#[tokio::test]
async fn rejected_login_reports_the_server_reason_and_keeps_the_old_session() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	seed_session(&store, "a-old", "r-old").await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(401)
				.header("content-type", "application/json")
				.body(r#"{"message":"invalid username or password"}"#);
		})
		.await;
	let err = gateway
		.login(Credentials::new("tdp.hn", "wrong"))
		.await
		.expect_err("Wrong credentials should be rejected.");

	let Error::CredentialsRejected { reason } = err else {
		panic!("Expected a credentials rejection, got {err:?}.");
	};

	assert_eq!(reason, "invalid username or password");

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert_eq!(
		snapshot.access_token.as_ref().map(AsRef::as_ref),
		Some("a-old"),
		"A failed re-login must not sign the user out.",
	);
}

#[tokio::test]
async fn login_without_a_profile_is_a_protocol_error() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"accessToken":"a-1","refreshToken":"r-1"}"#);
		})
		.await;
	let err = gateway
		.login(Credentials::new("tdp.hn", "hunter2"))
		.await
		.expect_err("A grant without a profile cannot complete a login.");

	assert!(matches!(err, Error::Protocol(ProtocolError::Endpoint { .. })));

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert!(snapshot.access_token.is_none(), "Nothing should be persisted for a bad grant.");
}

#[tokio::test]
async fn logout_clears_locally_even_when_the_server_errors() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	seed_session(&store, "a-1", "r-1").await;

	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout").header("authorization", "Bearer a-1");
			then.status(500);
		})
		.await;

	gateway.logout().await.expect("Logout should succeed despite the server error.");

	logout.assert_async().await;

	let snapshot = store.load().await.expect("Store load should succeed.");

	assert!(snapshot.access_token.is_none());
	assert!(snapshot.refresh_token.is_none());
	assert!(snapshot.user.is_none());
}

#[tokio::test]
async fn logout_without_a_session_skips_the_server_call() {
	let server = MockServer::start_async().await;
	let (gateway, _store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));
	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/logout");
			then.status(200);
		})
		.await;

	gateway.logout().await.expect("Logout with nothing stored should still succeed.");

	logout.assert_calls_async(0).await;
}

#[tokio::test]
async fn verify_re_caches_the_profile_on_the_stored_session() {
	let server = MockServer::start_async().await;
	let (gateway, store) = build_reqwest_test_gateway(test_descriptor(&server.base_url()));

	seed_session(&store, "a-1", "r-1").await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/verify").header("authorization", "Bearer a-1");
			then.status(200)
				.header("content-type", "application/json")
				.body(r#"{"username":"tdp.hn","role":"user","assignedStores":["s-1","s-2"]}"#);
		})
		.await;
	let user = gateway.verify().await.expect("Verification should succeed.");

	assert_eq!(user.assigned_stores.as_deref().map(<[String]>::len), Some(2));

	let snapshot = store.load().await.expect("Store load should succeed.");
	let cached = snapshot.user.expect("Profile should be cached after verification.");

	assert_eq!(cached, user);
	assert_eq!(snapshot.access_token.as_ref().map(AsRef::as_ref), Some("a-1"));
}
