//! Thin HTTP client for the provider's zone API.
//!
//! Every call goes to `<base>/zones/<zone>/<endpoint>` and carries either a
//! bearer token or the email + key header pair, whichever the configuration
//! supplied. The client never picks between them.

use axum::http::{HeaderMap, HeaderValue, header};
use reqwest::{Client, Method, Response, Url};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{Credentials, EdgeSettings};

use super::{error::EdgeError, models::ApiEnvelope};

const AUTH_EMAIL_HEADER: &str = "x-auth-email";
const AUTH_KEY_HEADER: &str = "x-auth-key";

#[derive(Clone, Debug)]
pub struct EdgeClient {
    client: Client,
    base: Url,
    zone_id: String,
    auth: HeaderMap,
}

impl EdgeClient {
    pub fn new(settings: &EdgeSettings) -> Result<Self, EdgeError> {
        let zone_id = settings.zone_id.clone().ok_or(EdgeError::MissingZone)?;
        let credentials = settings
            .credentials
            .as_ref()
            .ok_or(EdgeError::MissingCredentials)?;

        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.timeout)
            .build()?;

        Ok(Self {
            client,
            base: settings.base_url.clone(),
            zone_id,
            auth: auth_headers(credentials)?,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("edgecache/", env!("CARGO_PKG_VERSION"))
    }

    pub fn zone_id(&self) -> &str {
        &self.zone_id
    }

    /// Absolute URL for a zone endpoint; a leading `/` on `endpoint` is ignored.
    pub fn url(&self, endpoint: &str) -> Result<Url, EdgeError> {
        let path = format!(
            "zones/{}/{}",
            self.zone_id,
            endpoint.trim_start_matches('/')
        );
        self.base.join(&path).map_err(EdgeError::Url)
    }

    /// Like [`url`](Self::url), appending `query` pairs. An empty slice adds no `?`.
    pub fn url_with_query(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<Url, EdgeError> {
        let mut url = self.url(endpoint)?;
        if !query.is_empty() {
            let mut qp = url.query_pairs_mut();
            for (k, v) in query {
                qp.append_pair(k, v);
            }
        }
        Ok(url)
    }

    #[instrument(skip(self, body), fields(zone = %self.zone_id))]
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<ApiEnvelope, EdgeError> {
        let url = self.url(endpoint)?;
        let resp = self
            .client
            .request(Method::POST, url)
            .headers(self.auth.clone())
            .json(body)
            .send()
            .await?;
        Self::handle(resp).await
    }

    #[instrument(skip(self, query), fields(zone = %self.zone_id))]
    pub async fn get(
        &self,
        endpoint: &str,
        query: Option<&[(&str, String)]>,
    ) -> Result<ApiEnvelope, EdgeError> {
        let url = self.url_with_query(endpoint, query.unwrap_or_default())?;
        let resp = self
            .client
            .request(Method::GET, url)
            .headers(self.auth.clone())
            .send()
            .await?;
        Self::handle(resp).await
    }

    async fn handle(resp: Response) -> Result<ApiEnvelope, EdgeError> {
        let status = resp.status();
        let bytes = resp.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            let errors = serde_json::from_slice::<ApiEnvelope>(&bytes)
                .map(|envelope| envelope.errors)
                .unwrap_or_default();
            warn!(
                edge = "response",
                status = status.as_u16(),
                errors = errors.len(),
                "edge API call failed"
            );
            return Err(EdgeError::Status {
                status: status.as_u16(),
                errors,
                body,
            });
        }

        let envelope: ApiEnvelope = serde_json::from_slice(&bytes)?;
        if !envelope.success {
            warn!(edge = "response", errors = envelope.errors.len(), "edge API rejected call");
            return Err(EdgeError::Rejected {
                errors: envelope.errors,
            });
        }

        debug!(edge = "response", status = status.as_u16(), "edge API call succeeded");
        Ok(envelope)
    }
}

fn auth_headers(credentials: &Credentials) -> Result<HeaderMap, EdgeError> {
    let mut headers = HeaderMap::new();
    match credentials {
        Credentials::Token(token) => {
            headers.insert(header::AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
        }
        Credentials::Key { email, key } => {
            headers.insert(AUTH_EMAIL_HEADER, header_value(email)?);
            headers.insert(AUTH_KEY_HEADER, header_value(key)?);
        }
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, EdgeError> {
    let mut value =
        HeaderValue::from_str(value).map_err(|err| EdgeError::InvalidHeader(err.to_string()))?;
    value.set_sensitive(true);
    Ok(value)
}
