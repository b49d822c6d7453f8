use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use weather_core::{
    CycleOutcome, ErrorKind, IpApiLocator, Location, Message, OpenMeteoFetcher, Pipeline,
    Publisher, Result, WeatherReport,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

#[derive(Debug, Clone, Default)]
struct Outbox(Arc<Mutex<Vec<(String, Vec<u8>)>>>);

#[async_trait]
impl Publisher for Outbox {
    async fn publish(&self, queue: &str, body: &[u8]) -> Result<()> {
        self.0
            .lock()
            .unwrap()
            .push((queue.to_string(), body.to_vec()));
        Ok(())
    }
}

struct TestHelper {
    server: MockServer,
    outbox: Outbox,
}

impl TestHelper {
    async fn new() -> Self {
        Self {
            server: MockServer::start().await,
            outbox: Outbox::default(),
        }
    }

    async fn mock_location(&self, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/json/"))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    async fn mock_forecast(&self, template: ResponseTemplate, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("hourly", "temperature_2m,relative_humidity_2m"))
            .and(query_param("timezone", "America/Recife"))
            .respond_with(template)
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    fn pipeline(&self) -> Pipeline {
        let http = reqwest::Client::new();
        Pipeline::new(
            Box::new(IpApiLocator::new(
                http.clone(),
                format!("{}/json/", self.server.uri()),
            )),
            Box::new(OpenMeteoFetcher::new(
                http,
                format!("{}/v1/forecast", self.server.uri()),
                "temperature_2m,relative_humidity_2m",
                "America/Recife",
            )),
            Box::new(self.outbox.clone()),
            "local_weather",
        )
    }

    fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.outbox.0.lock().unwrap().clone()
    }
}

fn ip_api_body() -> Value {
    json!({
        "status": "success",
        "country": "Brazil",
        "countryCode": "BR",
        "region": "PE",
        "regionName": "Pernambuco",
        "city": "Olinda",
        "lat": -7.9986,
        "lon": -34.8456,
        "timezone": "America/Recife",
    })
}

fn forecast_body() -> Value {
    json!({
        "latitude": -8.0,
        "longitude": -34.875,
        "generationtime_ms": 0.04,
        "utc_offset_seconds": -10800,
        "timezone": "America/Recife",
        "hourly_units": {"time": "iso8601", "temperature_2m": "°C", "relative_humidity_2m": "%"},
        "hourly": {
            "time": ["2026-10-19T00:00", "2026-10-19T01:00", "2026-10-19T02:00"],
            "temperature_2m": [25.9, 25.6, 25.2],
            "relative_humidity_2m": [79, 80, 82],
        },
    })
}

#[tokio::test]
async fn publishes_location_and_forecast() {
    let helper = TestHelper::new().await;
    helper
        .mock_location(ResponseTemplate::new(200).set_body_json(ip_api_body()))
        .await;
    helper
        .mock_forecast(ResponseTemplate::new(200).set_body_json(forecast_body()), 1)
        .await;

    let outcome = helper.pipeline().run_cycle().await;
    assert!(outcome.is_published());

    let sent = helper.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "local_weather");

    let decoded: Message = serde_json::from_slice(&sent[0].1).unwrap();
    assert_eq!(
        decoded,
        Message {
            location: Location {
                latitude: Some(-7.9986),
                longitude: Some(-34.8456),
                city: Some("Olinda".into()),
                region: Some("Pernambuco".into()),
                country: Some("Brazil".into()),
            },
            weather: WeatherReport(forecast_body()),
        }
    );

    let raw: Value = serde_json::from_slice(&sent[0].1).unwrap();
    assert_eq!(raw["weather"], forecast_body());
    assert_eq!(raw["location"]["region"], "Pernambuco");
}

#[tokio::test]
async fn garbage_location_publishes_nothing() {
    let helper = TestHelper::new().await;
    helper
        .mock_location(ResponseTemplate::new(200).set_body_string("not json at all"))
        .await;
    helper
        .mock_forecast(ResponseTemplate::new(200).set_body_json(forecast_body()), 0)
        .await;

    let outcome = helper.pipeline().run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::LocationUnavailable(_)));
    assert_eq!(outcome.error_kind(), Some(ErrorKind::Upstream));
    assert!(helper.sent().is_empty());
}

#[tokio::test]
async fn failing_forecast_publishes_nothing() {
    let helper = TestHelper::new().await;
    helper
        .mock_location(ResponseTemplate::new(200).set_body_json(ip_api_body()))
        .await;
    helper
        .mock_forecast(ResponseTemplate::new(503), 1)
        .await;

    let outcome = helper.pipeline().run_cycle().await;

    assert!(matches!(outcome, CycleOutcome::WeatherUnavailable(_)));
    assert!(helper.sent().is_empty());
}
