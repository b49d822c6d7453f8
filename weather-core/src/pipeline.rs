use std::fmt::Debug;
use tracing::{error, info, instrument};

use crate::{
    error::{Error, ErrorKind},
    forecast::WeatherFetcher,
    locator::Locator,
    model::Message,
    publisher::{Publisher, publish_json},
};

/// How a single cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    Published(Message),
    LocationUnavailable(Error),
    WeatherUnavailable(Error),
    PublishFailed(Error),
}

impl CycleOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, CycleOutcome::Published(_))
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            CycleOutcome::Published(_) => None,
            CycleOutcome::LocationUnavailable(e)
            | CycleOutcome::WeatherUnavailable(e)
            | CycleOutcome::PublishFailed(e) => Some(e),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(Error::kind)
    }
}

/// Locator, fetcher and publisher wired together for one queue.
#[derive(Debug)]
pub struct Pipeline {
    locator: Box<dyn Locator>,
    fetcher: Box<dyn WeatherFetcher>,
    publisher: Box<dyn Publisher>,
    queue: String,
}

impl Pipeline {
    pub fn new(
        locator: Box<dyn Locator>,
        fetcher: Box<dyn WeatherFetcher>,
        publisher: Box<dyn Publisher>,
        queue: impl Into<String>,
    ) -> Self {
        Self {
            locator,
            fetcher,
            publisher,
            queue: queue.into(),
        }
    }

    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Runs the three steps in order. A failing step ends the cycle; nothing
    /// is retried.
    #[instrument(skip_all, fields(queue = %self.queue))]
    pub async fn run_cycle(&self) -> CycleOutcome {
        let location = match self.locator.locate().await {
            Ok(v) => v,
            Err(e) => {
                error!("could not determine location: {e}");
                return CycleOutcome::LocationUnavailable(e);
            }
        };

        let Some((latitude, longitude)) = location.coordinates() else {
            error!(?location, "could not determine location: {}", Error::MissingCoordinates);
            return CycleOutcome::LocationUnavailable(Error::MissingCoordinates);
        };

        info!(
            "location found: {} - {} ({latitude}, {longitude})",
            location.city.as_deref().unwrap_or("unknown city"),
            location.region.as_deref().unwrap_or("unknown region"),
        );

        let weather = match self.fetcher.fetch(latitude, longitude).await {
            Ok(v) => v,
            Err(e) => {
                error!("unable to fetch the weather data: {e}");
                return CycleOutcome::WeatherUnavailable(e);
            }
        };

        let message = Message { location, weather };

        match publish_json(self.publisher.as_ref(), &self.queue, &message).await {
            Ok(()) => {
                info!("message sent to queue '{}'", self.queue);
                CycleOutcome::Published(message)
            }
            Err(e) => {
                error!("error while sending to the broker: {e}");
                CycleOutcome::PublishFailed(e)
            }
        }
    }
}
