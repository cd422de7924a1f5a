//! Shared helpers for integration tests against a mock platform.

#![allow(dead_code)]

use ebook_archiver_core::{ActiveSession, Credentials, PlatformEndpoints, Session, TransportOptions};
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SESSION_VALUE: &str = "sess-123";

/// Endpoints rooted at the mock server.
pub fn endpoints_for(server: &MockServer) -> PlatformEndpoints {
    let base = Url::parse(&server.uri()).expect("mock server URI is a URL");
    PlatformEndpoints::with_base(&base)
}

/// An unauthenticated session pointed at the mock server.
pub fn session_for(server: &MockServer) -> Session {
    Session::new(
        Credentials::new("reader@example.com", "secret"),
        endpoints_for(server),
        &TransportOptions::default(),
    )
    .expect("session builds")
}

/// Mounts a login endpoint that sets the session cookie.
pub async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/br/xhr/login"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("digi4s={SESSION_VALUE}; Path=/").as_str())
                .set_body_string("OK"),
        )
        .mount(server)
        .await;
}

/// A logged-in session against the mock server.
pub async fn logged_in(server: &MockServer) -> ActiveSession {
    mount_login_ok(server).await;
    session_for(server).login().await.expect("login succeeds")
}

/// Renders hidden inputs the way the relay pages do.
pub fn hidden_form(action: &str, fields: &[(&str, &str)]) -> String {
    let inputs: String = fields
        .iter()
        .map(|(name, value)| format!("<input name='{name}' value='{value}'>\n"))
        .collect();
    format!(
        "<html><body onload='document.forms[0].submit()'>\
         <form action='{action}' method='post'>\n{inputs}</form></body></html>"
    )
}

/// Mounts a complete handshake for `item` that yields `digi4b=X; digi4p=Y`.
///
/// With `needs_sub_path` the redirect target lacks the viewer marker, so
/// pages are served from the `1/` sub-path.
pub async fn mount_handshake(server: &MockServer, item: &str, needs_sub_path: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/ebook/{item}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(hidden_form(
            "/kat/lti",
            &[("resource_link_id", item), ("oauth_nonce", "n1")],
        )))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/kat/lti"))
        .and(body_string_contains(format!("resource_link_id={item}")))
        .respond_with(ResponseTemplate::new(200).set_body_string(hidden_form(
            "/a/lti",
            &[("resource_link_id", item), ("custom_code", item)],
        )))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/a/lti"))
        .and(body_string_contains(format!("custom_code={item}")))
        .respond_with(
            ResponseTemplate::new(302)
                .append_header("set-cookie", "digi4b=X; Path=/")
                .append_header("set-cookie", "digi4p=Y; Path=/")
                .insert_header("location", format!("/a/ebook/{item}/").as_str()),
        )
        .mount(server)
        .await;
    let probe_body = if needs_sub_path {
        "<html><body>Loading...</body></html>"
    } else {
        "<html><script src='IDRViewer.js'></script></html>"
    };
    Mock::given(method("POST"))
        .and(path(format!("/a/ebook/{item}/")))
        .respond_with(ResponseTemplate::new(200).set_body_string(probe_body))
        .mount(server)
        .await;
}
