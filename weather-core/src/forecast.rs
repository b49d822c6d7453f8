use async_trait::async_trait;
use reqwest::Client;
use std::fmt::Debug;

use crate::{
    error::{Error, Result, truncate_body},
    model::WeatherReport,
};

const SERVICE: &str = "open-meteo";

#[async_trait]
pub trait WeatherFetcher: Send + Sync + Debug {
    /// Hourly forecast for the given coordinates. Coordinates are passed
    /// through as is.
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherReport>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoFetcher {
    url: String,
    hourly: String,
    timezone: String,
    http: Client,
}

impl OpenMeteoFetcher {
    pub fn new(
        http: Client,
        url: impl Into<String>,
        hourly: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            hourly: hourly.into(),
            timezone: timezone.into(),
            http,
        }
    }
}

#[async_trait]
impl WeatherFetcher for OpenMeteoFetcher {
    async fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherReport> {
        let res = self
            .http
            .get(&self.url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("hourly", self.hourly.clone()),
                ("timezone", self.timezone.clone()),
            ])
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

        let report: WeatherReport =
            serde_json::from_str(&body).map_err(|source| Error::Malformed {
                service: SERVICE,
                source,
            })?;

        if report.is_empty() {
            return Err(Error::EmptyReport { service: SERVICE });
        }

        Ok(report)
    }
}
