use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::debug;

use crate::{
    error::{Error, Result, truncate_body},
    model::Location,
};

const SERVICE: &str = "ip-api";

/// Resolves where this process runs.
#[async_trait]
pub trait Locator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Location>;
}

/// Geolocation by public IP through ip-api.com.
#[derive(Debug, Clone)]
pub struct IpApiLocator {
    url: String,
    http: Client,
}

impl IpApiLocator {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IpApiResponse {
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    region_name: Option<String>,
    country: Option<String>,
}

impl From<IpApiResponse> for Location {
    fn from(v: IpApiResponse) -> Self {
        Self {
            latitude: v.lat,
            longitude: v.lon,
            city: v.city,
            region: v.region_name,
            country: v.country,
        }
    }
}

#[async_trait]
impl Locator for IpApiLocator {
    async fn locate(&self) -> Result<Location> {
        let res = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|source| Error::Request {
                service: SERVICE,
                source,
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|source| Error::Request {
            service: SERVICE,
            source,
        })?;

        if !status.is_success() {
            return Err(Error::Status {
                service: SERVICE,
                status,
                body: truncate_body(&body),
            });
        }

        debug!(body = %truncate_body(&body), "geolocation response");

        let parsed: IpApiResponse =
            serde_json::from_str(&body).map_err(|source| Error::Malformed {
                service: SERVICE,
                source,
            })?;

        Ok(parsed.into())
    }
}
