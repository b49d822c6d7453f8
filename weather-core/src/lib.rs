//! Core library for the local weather publisher.
//!
//! This crate defines:
//! - Geolocation of the running host (`locator`)
//! - Hourly forecast retrieval (`forecast`)
//! - Publishing to a durable AMQP queue (`publisher`) and draining it (`consumer`)
//! - One locate/fetch/publish cycle (`pipeline`) and its periodic runner (`scheduler`)
//!
//! It is used by `weather-publisher`, but the pieces are usable on their own.

pub mod config;
pub mod consumer;
pub mod error;
pub mod forecast;
pub mod locator;
pub mod model;
pub mod pipeline;
pub mod publisher;
pub mod scheduler;

pub use config::Config;
pub use consumer::Consumer;
pub use error::{Error, ErrorKind, Result};
pub use forecast::{OpenMeteoFetcher, WeatherFetcher};
pub use locator::{IpApiLocator, Locator};
pub use model::{Location, Message, WeatherReport};
pub use pipeline::{CycleOutcome, Pipeline};
pub use publisher::{AmqpPublisher, Publisher, publish_json};
pub use scheduler::{RunSummary, Scheduler};

/// Wires the HTTP and AMQP implementations described by `config`.
pub fn pipeline_from_config(config: &Config) -> Result<Pipeline> {
    let http = config.http_client().map_err(|source| Error::Request {
        service: "http client",
        source,
    })?;

    Ok(Pipeline::new(
        Box::new(IpApiLocator::new(http.clone(), &config.geolocation_url)),
        Box::new(OpenMeteoFetcher::new(
            http,
            &config.forecast_url,
            &config.hourly,
            &config.timezone,
        )),
        Box::new(AmqpPublisher::new(&config.amqp_url)),
        &config.queue,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_from_default_config() {
        let pipeline = pipeline_from_config(&Config::default()).unwrap();
        assert_eq!(pipeline.queue(), "local_weather");
    }
}
