//! The shared HTTP session: client construction, login and logout.
//!
//! One [`Session`] is built per run. It owns a `reqwest` client with a
//! persistent cookie jar and with automatic redirects disabled, because the
//! handshake reads `Location` headers and per-hop cookies itself.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, ORIGIN, REFERER};
use reqwest::{Client, ClientBuilder, Proxy, redirect};
use tracing::{debug, info, instrument, warn};
use url::Url;
use url::form_urlencoded;

use super::cookies::{merge_cookie_header, parse_cookie_header};
use super::{Credentials, SessionError};
use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::platform::{PlatformEndpoints, SESSION_COOKIE};
use crate::user_agent;

/// Transport settings for the session's HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOptions {
    /// Skip TLS certificate verification (interception proxies, debugging).
    pub insecure_tls: bool,
    /// Upstream proxy URL. Falls back to `HTTPS_PROXY`/`ALL_PROXY` when unset.
    pub proxy: Option<String>,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Whole-request timeout in seconds.
    pub read_timeout_secs: u64,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            insecure_tls: false,
            proxy: None,
            connect_timeout_secs: CONNECT_TIMEOUT_SECS,
            read_timeout_secs: READ_TIMEOUT_SECS,
        }
    }
}

/// A configured but not yet authenticated session.
///
/// Created once at startup and consumed by [`Session::login`].
#[derive(Debug)]
pub struct Session {
    client: Client,
    jar: Arc<Jar>,
    endpoints: PlatformEndpoints,
    credentials: Credentials,
}

impl Session {
    /// Builds the HTTP client and cookie jar for a run.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidProxy`] when the proxy URL is rejected and
    /// [`SessionError::ClientBuild`] when the client cannot be constructed.
    #[instrument(level = "debug", skip(credentials, endpoints))]
    pub fn new(
        credentials: Credentials,
        endpoints: PlatformEndpoints,
        transport: &TransportOptions,
    ) -> Result<Self, SessionError> {
        let jar = Arc::new(Jar::default());
        let client = build_client(Arc::clone(&jar), transport)?;
        Ok(Self {
            client,
            jar,
            endpoints,
            credentials,
        })
    }

    /// Endpoints this session talks to.
    #[must_use]
    pub fn endpoints(&self) -> &PlatformEndpoints {
        &self.endpoints
    }

    /// Logs in and returns the authenticated session.
    ///
    /// Success is decided by the presence of the session cookie in the jar,
    /// not by the HTTP status: the platform answers bad credentials with 200.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Transport`] when the request fails and
    /// [`SessionError::Authentication`] when the session cookie is absent.
    #[instrument(skip(self), fields(username = %self.credentials.username))]
    pub async fn login(self) -> Result<ActiveSession, SessionError> {
        let url = self.endpoints.login.clone();
        let body = form_urlencoded::Serializer::new(String::new())
            .append_pair("email", &self.credentials.username)
            .append_pair("password", self.credentials.password())
            .finish();

        let response = self
            .client
            .post(url.clone())
            .header(ACCEPT, user_agent::ACCEPT_XHR)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(CONTENT_TYPE, user_agent::FORM_CONTENT_TYPE)
            .header(REFERER, self.endpoints.origin.as_str())
            .header(ORIGIN, origin_header(&self.endpoints.origin))
            .header("X-Requested-With", "XMLHttpRequest")
            .body(body)
            .send()
            .await
            .map_err(|e| SessionError::transport(url.as_str(), e))?;

        let status = response.status();
        // Drain the body so the connection returns to the pool.
        let _ = response.bytes().await;
        debug!(status = status.as_u16(), "login response received");

        let Some(session_cookie) = jar_cookie(&self.jar, &url, SESSION_COOKIE) else {
            warn!(status = status.as_u16(), "login did not set the session cookie");
            return Err(SessionError::authentication(
                self.credentials.username.clone(),
                url.as_str(),
                SESSION_COOKIE,
            ));
        };

        info!("logged in");
        Ok(ActiveSession {
            client: self.client,
            jar: self.jar,
            endpoints: self.endpoints,
            username: self.credentials.username,
            session_cookie,
        })
    }
}

/// A logged-in session shared by every download of a run.
///
/// Only obtainable from a successful [`Session::login`].
pub struct ActiveSession {
    client: Client,
    jar: Arc<Jar>,
    endpoints: PlatformEndpoints,
    username: String,
    session_cookie: String,
}

impl fmt::Debug for ActiveSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActiveSession")
            .field("username", &self.username)
            .field("endpoints", &self.endpoints)
            .field("session_cookie", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl ActiveSession {
    /// The shared HTTP client (cookie jar attached, redirects disabled).
    #[must_use]
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Endpoints this session talks to.
    #[must_use]
    pub fn endpoints(&self) -> &PlatformEndpoints {
        &self.endpoints
    }

    /// Account name used for the login.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Value of a named cookie the jar would send to `url`.
    #[must_use]
    pub fn cookie_value(&self, url: &Url, name: &str) -> Option<String> {
        jar_cookie(&self.jar, url, name)
    }

    /// Current top-level session cookie for `url`.
    ///
    /// Prefers a value the jar holds for that URL (the platform may rotate
    /// it) and falls back to the value captured at login.
    #[must_use]
    pub fn current_session_cookie(&self, url: &Url) -> String {
        self.cookie_value(url, SESSION_COOKIE)
            .unwrap_or_else(|| self.session_cookie.clone())
    }

    /// Builds the `Cookie` header for a request to `url`.
    ///
    /// Starts from the jar's cookies for `url`, adds the session cookie and
    /// then `extra` (later pairs win). Setting the header explicitly stops
    /// the client from adding the jar's header on its own.
    #[must_use]
    pub fn cookie_header_for(&self, url: &Url, extra: &[(&str, &str)]) -> Option<String> {
        let jar_header = self
            .jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string));
        let session = self.current_session_cookie(url);
        let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(extra.len() + 1);
        pairs.push((SESSION_COOKIE, session.as_str()));
        pairs.extend_from_slice(extra);
        merge_cookie_header(jar_header.as_deref(), &pairs)
    }

    /// Logs out. Best effort: failures are logged, never returned.
    #[instrument(skip(self), fields(username = %self.username))]
    pub async fn logout(self) {
        let url = self.endpoints.logout.clone();
        let result = self
            .client
            .get(url.clone())
            .header(ACCEPT, user_agent::ACCEPT_DOCUMENT)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(REFERER, self.endpoints.origin.as_str())
            .send()
            .await;

        match result {
            Ok(response)
                if response.status().is_success() || response.status().is_redirection() =>
            {
                info!("logged out");
            }
            Ok(response) => {
                warn!(
                    status = response.status().as_u16(),
                    url = %url,
                    "logout returned an error status"
                );
            }
            Err(error) => {
                warn!(error = %error, url = %url, "logout request failed");
            }
        }
    }
}

/// `Origin` header value (scheme://host[:port], no trailing slash).
pub(crate) fn origin_header(url: &Url) -> String {
    url.origin().ascii_serialization()
}

fn jar_cookie(jar: &Jar, url: &Url, name: &str) -> Option<String> {
    let header = jar.cookies(url)?;
    let header = header.to_str().ok()?;
    parse_cookie_header(header)
        .into_iter()
        .find(|(cookie_name, value)| cookie_name == name && !value.is_empty())
        .map(|(_, value)| value)
}

fn build_client(jar: Arc<Jar>, transport: &TransportOptions) -> Result<Client, SessionError> {
    let mut builder: ClientBuilder = Client::builder()
        .cookie_provider(jar)
        .redirect(redirect::Policy::none())
        .connect_timeout(Duration::from_secs(transport.connect_timeout_secs))
        .timeout(Duration::from_secs(transport.read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::BROWSER_USER_AGENT);

    if transport.insecure_tls {
        warn!("TLS certificate verification is disabled");
        builder = builder.danger_accept_invalid_certs(true);
    }

    let proxy = transport
        .proxy
        .clone()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| {
            find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"])
        });
    if let Some(proxy) = proxy {
        let resolved = Proxy::all(proxy.as_str()).map_err(|source| SessionError::InvalidProxy {
            proxy: proxy.clone(),
            source,
        })?;
        debug!(proxy = %proxy, "routing requests through proxy");
        builder = builder.proxy(resolved);
    }

    builder
        .build()
        .map_err(|source| SessionError::ClientBuild { source })
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
