use std::{num::NonZeroU32, sync::Arc, time::Duration};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use reqwest::{
    StatusCode,
    header::{ACCEPT, REFERER},
};
use serde::Deserialize;
use tracing::debug;

use crate::{
    config::Config,
    error::{AppError, AppResult},
};

/// Where listing and detail pages come from.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    /// The `lista` HTML fragment for one `DD-MM-YYYY` date, if the envelope carries one.
    async fn fetch_listing(&self, date: &str) -> AppResult<Option<String>>;

    async fn fetch_detail(&self, url: &str) -> AppResult<String>;
}

pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl HttpSource {
    pub fn new(client: reqwest::Client, base_url: String, rps: u32) -> Self {
        let rps = NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_second(rps)));
        Self { client, base_url, limiter }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::new(client, config.base_url.clone(), config.requests_per_second))
    }

    pub fn listing_url(&self) -> String {
        format!("{}/rep.json", self.base_url.trim_end_matches('/'))
    }

    async fn get(&self, request: reqwest::RequestBuilder) -> AppResult<reqwest::Response> {
        self.limiter.until_ready().await;

        let resp = request.send().await?;
        ensure_success(resp.url().as_str(), resp.status())?;
        Ok(resp)
    }
}

fn ensure_success(url: &str, status: StatusCode) -> AppResult<()> {
    if !status.is_success() {
        return Err(AppError::Status { url: url.to_string(), status });
    }
    Ok(())
}

/// The `lista` fragment of a listing response. A missing, null or blank fragment means the
/// date has nothing to show.
fn decode_listing(body: &str) -> AppResult<Option<String>> {
    let envelope: ListingEnvelope = serde_json::from_str(body)?;
    Ok(envelope.lista.filter(|html| !html.trim().is_empty()))
}

#[async_trait::async_trait]
impl PageSource for HttpSource {
    async fn fetch_listing(&self, date: &str) -> AppResult<Option<String>> {
        debug!(date = %date, "fetching listing");
        let request = self
            .client
            .get(self.listing_url())
            .header(ACCEPT, "application/json,text/javascript,*/*;q=0.1")
            .query(&[("dzien", date)]);

        let body = self.get(request).await?.text().await?;
        decode_listing(&body)
    }

    async fn fetch_detail(&self, url: &str) -> AppResult<String> {
        debug!(url = %url, "fetching detail page");
        let request = self.client.get(url).header(REFERER, self.base_url.as_str());
        Ok(self.get(request).await?.text().await?)
    }
}

#[derive(Debug, Deserialize)]
struct ListingEnvelope {
    #[serde(default)]
    lista: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_url_has_single_separator() {
        let source = HttpSource::new(reqwest::Client::new(), "https://www.kinonh.pl/".into(), 4);
        assert_eq!(source.listing_url(), "https://www.kinonh.pl/rep.json");
    }

    #[test]
    fn envelope_tolerates_missing_and_null_lista() {
        let missing: ListingEnvelope = serde_json::from_str(r#"{"inne": 1}"#).unwrap();
        assert_eq!(missing.lista, None);
        let null: ListingEnvelope = serde_json::from_str(r#"{"lista": null}"#).unwrap();
        assert_eq!(null.lista, None);
        let html: ListingEnvelope =
            serde_json::from_str(r#"{"lista": "<div class=\"pastyt\"></div>"}"#).unwrap();
        assert_eq!(html.lista.as_deref(), Some(r#"<div class="pastyt"></div>"#));
    }

    #[test]
    fn blank_lista_means_nothing_to_show() {
        assert_eq!(decode_listing(r#"{"lista": ""}"#).unwrap(), None);
        assert_eq!(decode_listing(r#"{"lista": "   \n"}"#).unwrap(), None);
        assert_eq!(decode_listing(r#"{"lista": null}"#).unwrap(), None);
        assert_eq!(
            decode_listing(r#"{"lista": "<div class=\"pastyt\"></div>"}"#).unwrap().as_deref(),
            Some(r#"<div class="pastyt"></div>"#)
        );
    }

    #[test]
    fn non_json_listing_body_is_an_error() {
        let err = decode_listing("<html>Service Unavailable</html>").unwrap_err();
        assert!(matches!(err, AppError::Json(_)));
    }

    #[test]
    fn non_success_status_carries_url_and_code() {
        assert!(ensure_success("https://kino.test/rep.json", StatusCode::OK).is_ok());

        let err = ensure_success("https://kino.test/rep.json", StatusCode::SERVICE_UNAVAILABLE)
            .unwrap_err();
        match err {
            AppError::Status { url, status } => {
                assert_eq!(url, "https://kino.test/rep.json");
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
