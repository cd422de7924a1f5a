//! Handshake state machine.
//!
//! Drives the three hops for one item and turns the final response into a
//! [`ResolvedAccess`]. There are no retries: any failed stage aborts the
//! item with a [`HandshakeError`] naming that stage.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, COOKIE, LOCATION, ORIGIN, REFERER};
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, info, instrument};
use url::Url;

use super::error::{HandshakeError, HandshakeFailure, HandshakeStage};
use super::fields::{RELAY_ONE_FIELDS, RELAY_TWO_FIELDS};
use super::ResolvedAccess;
use super::params::{HandshakeParameters, extract_hidden_fields};
use crate::auth::{ActiveSession, origin_header};
use crate::platform::{BOOK_COOKIE, PAGE_COOKIE};
use crate::shelf::ContentItem;
use crate::user_agent;

/// Where the state machine currently is, carrying what the next hop needs.
enum State {
    Landing,
    RelayOne(HandshakeParameters),
    RelayTwo(HandshakeParameters),
    CookieExtraction(RelayTwoResponse),
}

/// What the second relay hop produced.
struct RelayTwoResponse {
    cookies: Vec<(String, String)>,
    sub_path: Option<String>,
}

impl RelayTwoResponse {
    fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .rev()
            .find(|(n, v)| n == name && !v.is_empty())
            .map(|(_, v)| v.as_str())
    }
}

/// Runs the relay handshake for items using a shared logged-in session.
#[derive(Debug, Clone, Copy)]
pub struct HandshakeEngine<'a> {
    session: &'a ActiveSession,
}

impl<'a> HandshakeEngine<'a> {
    /// Creates an engine bound to a session.
    #[must_use]
    pub fn new(session: &'a ActiveSession) -> Self {
        Self { session }
    }

    /// Unlocks one item.
    ///
    /// # Errors
    ///
    /// Returns [`HandshakeError`] tagged with the failing stage:
    /// - `landing`: landing page unreachable, error status or no hidden fields
    /// - `relay1`: first relay unreachable, error status or no hidden fields
    /// - `relay2`: second relay or its redirect target unreachable
    /// - `cookie-extraction`: a content cookie was not issued
    #[instrument(skip(self, item), fields(item = %item.id))]
    pub async fn resolve(&self, item: &ContentItem) -> Result<ResolvedAccess, HandshakeError> {
        let mut state = State::Landing;
        loop {
            state = match state {
                State::Landing => State::RelayOne(self.fetch_landing(item).await?),
                State::RelayOne(params) => State::RelayTwo(self.relay_one(item, &params).await?),
                State::RelayTwo(params) => {
                    State::CookieExtraction(self.relay_two(item, &params).await?)
                }
                State::CookieExtraction(response) => return extract_access(item, &response),
            };
        }
    }

    async fn fetch_landing(&self, item: &ContentItem) -> Result<HandshakeParameters, HandshakeError> {
        let stage = HandshakeStage::Landing;
        let endpoints = self.session.endpoints();
        let url = endpoints.landing_url(&item.id).ok_or_else(|| {
            HandshakeError::new(
                stage,
                &item.id,
                HandshakeFailure::InvalidUrl {
                    url: item.id.clone(),
                },
            )
        })?;

        let request = self
            .session
            .client()
            .get(url.clone())
            .header(ACCEPT, user_agent::ACCEPT_DOCUMENT)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(REFERER, endpoints.origin.as_str());
        let response = self.send(stage, item, &url, request, &[]).await?;
        let params = read_parameters(stage, item, &url, response).await?;
        debug!(stage = %stage, fields = params.len(), "landing page parsed");
        Ok(params)
    }

    async fn relay_one(
        &self,
        item: &ContentItem,
        landing: &HandshakeParameters,
    ) -> Result<HandshakeParameters, HandshakeError> {
        let stage = HandshakeStage::RelayOne;
        let endpoints = self.session.endpoints();
        let url = endpoints.relay_one.clone();
        let request = self.form_post(&url, &endpoints.origin, landing, RELAY_ONE_FIELDS);
        let response = self.send(stage, item, &url, request, &[]).await?;
        let params = read_parameters(stage, item, &url, response).await?;
        debug!(stage = %stage, fields = params.len(), "first relay answered");
        Ok(params)
    }

    async fn relay_two(
        &self,
        item: &ContentItem,
        relayed: &HandshakeParameters,
    ) -> Result<RelayTwoResponse, HandshakeError> {
        let stage = HandshakeStage::RelayTwo;
        let endpoints = self.session.endpoints();
        let url = endpoints.relay_two.clone();
        let request = self.form_post(&url, &endpoints.relay_one, relayed, RELAY_TWO_FIELDS);
        let response = self.send(stage, item, &url, request, &[]).await?;

        let status = response.status();
        let cookies: Vec<(String, String)> = response
            .cookies()
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        // Drain the body so the connection returns to the pool.
        let _ = response.bytes().await;
        debug!(
            stage = %stage,
            status = status.as_u16(),
            cookies = cookies.len(),
            location = location.as_deref().unwrap_or("-"),
            "second relay answered"
        );

        let sub_path = match location {
            Some(location) => {
                let target = url.join(&location).map_err(|_| {
                    HandshakeError::new(
                        stage,
                        &item.id,
                        HandshakeFailure::InvalidUrl { url: location.clone() },
                    )
                })?;
                self.probe_sub_path(item, &target, &cookies).await?
            }
            None => None,
        };

        Ok(RelayTwoResponse { cookies, sub_path })
    }

    /// Posts to the redirect target and decides whether pages need a sub-path.
    async fn probe_sub_path(
        &self,
        item: &ContentItem,
        target: &Url,
        issued: &[(String, String)],
    ) -> Result<Option<String>, HandshakeError> {
        let stage = HandshakeStage::RelayTwo;
        let endpoints = self.session.endpoints();
        let extra: Vec<(&str, &str)> = issued
            .iter()
            .filter(|(name, _)| name == BOOK_COOKIE || name == PAGE_COOKIE)
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect();

        let request = self
            .session
            .client()
            .post(target.clone())
            .header(ACCEPT, user_agent::ACCEPT_DOCUMENT)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(CONTENT_TYPE, user_agent::FORM_CONTENT_TYPE)
            .header(ORIGIN, origin_header(&endpoints.relay_one));
        let response = self.send(stage, item, target, request, &extra).await?;
        let body = response.text().await.map_err(|source| {
            HandshakeError::new(
                stage,
                &item.id,
                HandshakeFailure::Transport {
                    url: target.to_string(),
                    source,
                },
            )
        })?;

        if body.contains(&endpoints.no_subpath_marker) {
            debug!(target = %target, "no sub-path needed");
            Ok(None)
        } else {
            debug!(target = %target, sub_path = %endpoints.sub_path, "sub-path needed");
            Ok(Some(endpoints.sub_path.clone()))
        }
    }

    /// Builds a relay POST carrying exactly `fields`.
    fn form_post(
        &self,
        url: &Url,
        origin: &Url,
        params: &HandshakeParameters,
        fields: &[&str],
    ) -> RequestBuilder {
        let relayed = params.restricted_to(fields);
        let dropped = params
            .names()
            .filter(|name| !fields.contains(name))
            .count();
        if dropped > 0 {
            debug!(dropped, "dropping fields the relay does not accept");
        }

        self.session
            .client()
            .post(url.clone())
            .header(ACCEPT, user_agent::ACCEPT_DOCUMENT)
            .header(ACCEPT_LANGUAGE, user_agent::ACCEPT_LANGUAGE)
            .header(CONTENT_TYPE, user_agent::FORM_CONTENT_TYPE)
            .header(ORIGIN, origin_header(origin))
            .body(relayed.to_form_body())
    }

    /// Attaches cookies, sends and maps transport errors to `stage`.
    async fn send(
        &self,
        stage: HandshakeStage,
        item: &ContentItem,
        url: &Url,
        mut request: RequestBuilder,
        extra_cookies: &[(&str, &str)],
    ) -> Result<Response, HandshakeError> {
        if let Some(cookie) = self.session.cookie_header_for(url, extra_cookies) {
            request = request.header(COOKIE, cookie);
        }
        request.send().await.map_err(|source| {
            HandshakeError::new(
                stage,
                &item.id,
                HandshakeFailure::Transport {
                    url: url.to_string(),
                    source,
                },
            )
        })
    }
}

/// Checks the status and extracts the next field set from the body.
async fn read_parameters(
    stage: HandshakeStage,
    item: &ContentItem,
    url: &Url,
    response: Response,
) -> Result<HandshakeParameters, HandshakeError> {
    ensure_not_error_status(stage, item, url, response.status())?;
    let body = response.text().await.map_err(|source| {
        HandshakeError::new(
            stage,
            &item.id,
            HandshakeFailure::Transport {
                url: url.to_string(),
                source,
            },
        )
    })?;

    let params = extract_hidden_fields(&body);
    if params.is_empty() {
        return Err(HandshakeError::new(
            stage,
            &item.id,
            HandshakeFailure::NoParameters {
                url: url.to_string(),
            },
        ));
    }
    Ok(params)
}

fn ensure_not_error_status(
    stage: HandshakeStage,
    item: &ContentItem,
    url: &Url,
    status: StatusCode,
) -> Result<(), HandshakeError> {
    if status.is_client_error() || status.is_server_error() {
        return Err(HandshakeError::new(
            stage,
            &item.id,
            HandshakeFailure::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            },
        ));
    }
    Ok(())
}

fn extract_access(
    item: &ContentItem,
    response: &RelayTwoResponse,
) -> Result<ResolvedAccess, HandshakeError> {
    let stage = HandshakeStage::CookieExtraction;
    let missing = |name: &'static str| {
        HandshakeError::new(stage, &item.id, HandshakeFailure::MissingCookie { name })
    };

    let book = response.cookie(BOOK_COOKIE).ok_or_else(|| missing(BOOK_COOKIE))?;
    let page = response.cookie(PAGE_COOKIE).ok_or_else(|| missing(PAGE_COOKIE))?;
    let access = ResolvedAccess::new(book, page, response.sub_path.clone())
        .ok_or_else(|| missing(BOOK_COOKIE))?;

    info!(
        item = %item.id,
        sub_path = access.sub_path().unwrap_or("-"),
        "handshake complete"
    );
    Ok(access)
}
