use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

use super::{MspFact, PriceHistory, PricingApi, Property, RemoteError, Settings, SettingsUpdate};
use crate::calendar::IsoKey;

const USER_AGENT: &str = concat!("pricing-session/", env!("CARGO_PKG_VERSION"));

/// `PricingApi` over HTTP+JSON.
pub struct HttpPricingApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpPricingApi {
    pub fn new(
        base_url: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("client init failed: {e}")))?;

        Ok(Self {
            client,
            base: parse_base(base_url)?,
            token,
        })
    }

    /// Builds `{base}/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                RemoteError::Unavailable(format!("base url cannot hold a path: {}", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn dated_endpoint(
        &self,
        property_id: &str,
        resource: &str,
        date: &IsoKey,
    ) -> Result<Url, RemoteError> {
        let mut url = self.endpoint(&["properties", property_id, resource])?;
        url.query_pairs_mut().append_pair("date", date.as_str());
        Ok(url)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url, what: &str) -> Result<T, RemoteError> {
        tracing::debug!(%url, "GET {what}");
        let resp = self.authorized(self.client.get(url)).send()?;
        let resp = check_status(resp, what)?;
        resp.json::<T>()
            .map_err(|e| RemoteError::Decode(format!("{what}: {e}")))
    }
}

fn parse_base(base_url: &str) -> Result<Url, RemoteError> {
    Url::parse(base_url)
        .map_err(|e| RemoteError::Unavailable(format!("invalid base url {base_url:?}: {e}")))
}

fn check_status(resp: Response, what: &str) -> Result<Response, RemoteError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_else(|_| "(no body)".to_string());
    Err(status_error(status, what, &body))
}

/// Maps a non-success status to the error the core reconciles on.
fn status_error(status: StatusCode, what: &str, body: &str) -> RemoteError {
    if status == StatusCode::NOT_FOUND {
        RemoteError::NotFound(what.to_string())
    } else {
        RemoteError::Unavailable(format!("{what}: {status} - {body}"))
    }
}

impl PricingApi for HttpPricingApi {
    fn settings(&self, property_id: &str) -> Result<Settings, RemoteError> {
        let url = self.endpoint(&["properties", property_id, "settings"])?;
        self.get_json(url, "settings")
    }

    fn update_settings(
        &self,
        property_id: &str,
        update: &SettingsUpdate,
    ) -> Result<(), RemoteError> {
        let url = self.endpoint(&["properties", property_id, "settings"])?;
        tracing::debug!(%url, status = ?update.pricing_status, "PUT settings");

        let resp = self
            .authorized(self.client.put(url))
            .json(update)
            .send()?;
        check_status(resp, "settings update")?;
        Ok(())
    }

    fn properties(&self, user_id: &str) -> Result<Vec<Property>, RemoteError> {
        let url = self.endpoint(&["users", user_id, "properties"])?;
        self.get_json(url, "properties")
    }

    fn msp(&self, property_id: &str, date: &IsoKey) -> Result<MspFact, RemoteError> {
        let url = self.dated_endpoint(property_id, "msp", date)?;
        self.get_json(url, "msp")
    }

    fn price_history(
        &self,
        property_id: &str,
        date: &IsoKey,
    ) -> Result<PriceHistory, RemoteError> {
        let url = self.dated_endpoint(property_id, "price-history", date)?;
        self.get_json(url, "price history")
    }
}
