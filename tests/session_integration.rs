//! Integration tests for login, logout and the session cookie.

use ebook_archiver_core::SessionError;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod support;
use support::{SESSION_VALUE, logged_in, mount_login_ok, session_for};

#[tokio::test]
async fn test_login_posts_form_and_captures_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/br/xhr/login"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .and(body_string_contains("email=reader%40example.com"))
        .and(body_string_contains("password=secret"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", format!("digi4s={SESSION_VALUE}; Path=/").as_str()),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = tokio_test::assert_ok!(session_for(&server).login().await);

    assert_eq!(session.username(), "reader@example.com");
    let origin = session.endpoints().origin.clone();
    assert_eq!(session.current_session_cookie(&origin), SESSION_VALUE);
}

#[tokio::test]
async fn test_login_without_session_cookie_is_authentication_error() {
    let server = MockServer::start().await;
    // Wrong credentials still answer 200, just without the cookie.
    Mock::given(method("POST"))
        .and(path("/br/xhr/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("KO"))
        .mount(&server)
        .await;

    let result = session_for(&server).login().await;

    match result {
        Err(SessionError::Authentication { username, cookie, .. }) => {
            assert_eq!(username, "reader@example.com");
            assert_eq!(cookie, "digi4s");
        }
        other => panic!("Expected Authentication error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_login_transport_failure_is_transport_error() {
    let server = MockServer::start().await;
    let session = session_for(&server);
    drop(server);

    let error = tokio_test::assert_err!(session.login().await);
    assert!(
        matches!(error, SessionError::Transport { .. }),
        "Expected Transport error, got: {error:?}"
    );
}

#[tokio::test]
async fn test_logout_hits_logout_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/br/logout"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .expect(1)
        .mount(&server)
        .await;

    let session = logged_in(&server).await;
    session.logout().await;
}

#[tokio::test]
async fn test_logout_failure_is_not_an_error() {
    let server = MockServer::start().await;
    mount_login_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/br/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let session = session_for(&server).login().await.expect("login succeeds");
    // Returns unit; a failing logout only logs.
    session.logout().await;
}

#[tokio::test]
async fn test_session_cookie_sent_on_later_requests() {
    let server = MockServer::start().await;
    let session = logged_in(&server).await;
    Mock::given(method("GET"))
        .and(path("/ebooks"))
        .and(header("cookie", format!("digi4s={SESSION_VALUE}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a data-code="abc"><h1>Deutsch 3</h1></a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let items = ebook_archiver_core::list_shelf(&session).await.expect("shelf lists");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Deutsch 3");
}
