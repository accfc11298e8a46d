use std::thread;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use serde::Deserialize;
use thiserror::Error;

use crate::config::WeatherOptions;

/// The fixed set of cities the lookup understands.
const CITY_TABLE: &[(&str, Coordinates)] = &[
    (
        "nairobi",
        Coordinates {
            latitude: -1.2864,
            longitude: 36.8172,
        },
    ),
    (
        "mombasa",
        Coordinates {
            latitude: -4.0435,
            longitude: 39.6682,
        },
    ),
    (
        "kisumu",
        Coordinates {
            latitude: -0.0917,
            longitude: 34.7680,
        },
    ),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Error)]
pub enum WeatherError {
    #[error("please enter a city name")]
    EmptyCity,
    #[error("invalid city '{0}'")]
    UnknownCity(String),
    #[error("weather request failed: {0}")]
    Request(String),
    #[error("weather response was missing current conditions")]
    MalformedResponse,
}

/// Current conditions as reported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    pub city: String,
    pub current: CurrentWeather,
}

/// Normalizes the typed city name and resolves it against the city table.
/// Returns the display name alongside the coordinates.
pub fn lookup_city(input: &str) -> Result<(String, Coordinates), WeatherError> {
    let normalized = input.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(WeatherError::EmptyCity);
    }
    CITY_TABLE
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(name, coords)| (display_name(name), *coords))
        .ok_or(WeatherError::UnknownCity(normalized))
}

pub fn known_cities() -> Vec<&'static str> {
    CITY_TABLE.iter().map(|(name, _)| *name).collect()
}

fn display_name(city: &str) -> String {
    let mut chars = city.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[derive(Deserialize)]
struct ForecastBody {
    current_weather: Option<CurrentWeather>,
}

/// Thin client for the current-weather endpoint. One unauthenticated GET per
/// lookup; no retries, no caching.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: reqwest::blocking::Client,
    endpoint: String,
}

impl WeatherClient {
    pub fn new(options: &WeatherOptions) -> anyhow::Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(options.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            endpoint: options.endpoint.clone(),
        })
    }

    pub fn fetch_current(&self, coords: Coordinates) -> Result<CurrentWeather, WeatherError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("latitude", coords.latitude.to_string()),
                ("longitude", coords.longitude.to_string()),
                ("current_weather", "true".to_string()),
            ])
            .send()
            .map_err(|err| WeatherError::Request(err.to_string()))?;
        if !response.status().is_success() {
            return Err(WeatherError::Request(format!(
                "server returned {}",
                response.status()
            )));
        }
        let body: ForecastBody = response
            .json()
            .map_err(|_| WeatherError::MalformedResponse)?;
        body.current_weather.ok_or(WeatherError::MalformedResponse)
    }
}

#[derive(Debug)]
struct LookupJob {
    generation: u64,
    city: String,
    coords: Coordinates,
}

#[derive(Debug)]
pub struct LookupReply {
    generation: u64,
    city: String,
    result: Result<CurrentWeather, WeatherError>,
}

#[derive(Debug)]
pub enum WeatherEvent {
    Report(WeatherReport),
    Failed { city: String, error: WeatherError },
}

/// Dispatches lookups to a background worker. Each request carries a
/// generation token; replies older than the latest issued request are
/// discarded, so a later search deterministically supersedes an earlier
/// in-flight one.
pub struct WeatherRuntime {
    job_tx: Sender<LookupJob>,
    reply_rx: Receiver<LookupReply>,
    generation: u64,
    pending_city: Option<String>,
}

impl WeatherRuntime {
    pub fn new(client: WeatherClient) -> Self {
        let (job_tx, job_rx) = unbounded::<LookupJob>();
        let (reply_tx, reply_rx) = unbounded::<LookupReply>();
        thread::spawn(move || worker_loop(client, job_rx, reply_tx));
        Self {
            job_tx,
            reply_rx,
            generation: 0,
            pending_city: None,
        }
    }

    /// Validates the typed city and, if known, queues one lookup. Validation
    /// failures never touch the network.
    pub fn request(&mut self, city_input: &str) -> Result<(), WeatherError> {
        let (city, coords) = lookup_city(city_input)?;
        self.generation += 1;
        self.pending_city = Some(city.clone());
        let job = LookupJob {
            generation: self.generation,
            city,
            coords,
        };
        if self.job_tx.send(job).is_err() {
            self.pending_city = None;
            return Err(WeatherError::Request("weather worker stopped".to_string()));
        }
        Ok(())
    }

    /// True while the newest request is still outstanding.
    pub fn is_loading(&self) -> bool {
        self.pending_city.is_some()
    }

    pub fn pending_city(&self) -> Option<&str> {
        self.pending_city.as_deref()
    }

    /// Drains worker replies, returning the first one that belongs to the
    /// latest generation. Stale replies are dropped.
    pub fn poll(&mut self) -> Option<WeatherEvent> {
        loop {
            match self.reply_rx.try_recv() {
                Ok(reply) => {
                    if let Some(event) = self.admit(reply) {
                        return Some(event);
                    }
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        }
    }

    fn admit(&mut self, reply: LookupReply) -> Option<WeatherEvent> {
        if reply.generation != self.generation {
            tracing::debug!(
                generation = reply.generation,
                latest = self.generation,
                city = %reply.city,
                "dropping superseded weather reply"
            );
            return None;
        }
        self.pending_city = None;
        Some(match reply.result {
            Ok(current) => WeatherEvent::Report(WeatherReport {
                city: reply.city,
                current,
            }),
            Err(error) => WeatherEvent::Failed {
                city: reply.city,
                error,
            },
        })
    }
}

fn worker_loop(client: WeatherClient, jobs: Receiver<LookupJob>, replies: Sender<LookupReply>) {
    while let Ok(job) = jobs.recv() {
        let result = client.fetch_current(job.coords);
        if let Err(err) = &result {
            tracing::debug!(city = %job.city, %err, "weather lookup failed");
        }
        let reply = LookupReply {
            generation: job.generation,
            city: job.city,
            result,
        };
        if replies.send(reply).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeatherOptions;
    use assert_matches::assert_matches;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(endpoint: String) -> WeatherClient {
        WeatherClient::new(&WeatherOptions {
            endpoint,
            timeout_ms: 2_000,
        })
        .unwrap()
    }

    #[test]
    fn lookup_resolves_known_cities() {
        let (city, coords) = lookup_city("  Nairobi ").unwrap();
        assert_eq!(city, "Nairobi");
        assert!((coords.latitude - -1.2864).abs() < f64::EPSILON);
    }

    #[test]
    fn lookup_rejects_unknown_and_empty_cities() {
        assert_matches!(lookup_city("atlantis"), Err(WeatherError::UnknownCity(_)));
        assert_matches!(lookup_city("   "), Err(WeatherError::EmptyCity));
    }

    #[test]
    fn unknown_city_makes_no_request() {
        // Point at an unroutable endpoint: a validation failure must return
        // before the client is ever exercised.
        let mut runtime = WeatherRuntime::new(client_for("http://127.0.0.1:1".to_string()));
        assert_matches!(runtime.request("atlantis"), Err(WeatherError::UnknownCity(_)));
        assert!(!runtime.is_loading());
    }

    #[test]
    fn stale_generations_are_discarded() {
        let mut runtime = WeatherRuntime::new(client_for("http://127.0.0.1:1".to_string()));
        runtime.generation = 2;
        runtime.pending_city = Some("Mombasa".to_string());

        let stale = LookupReply {
            generation: 1,
            city: "Nairobi".to_string(),
            result: Ok(CurrentWeather {
                temperature: 21.0,
                windspeed: 7.0,
            }),
        };
        assert!(runtime.admit(stale).is_none());
        assert!(runtime.is_loading());

        let latest = LookupReply {
            generation: 2,
            city: "Mombasa".to_string(),
            result: Ok(CurrentWeather {
                temperature: 28.5,
                windspeed: 12.0,
            }),
        };
        let event = runtime.admit(latest).expect("latest reply admitted");
        assert_matches!(event, WeatherEvent::Report(report) if report.city == "Mombasa");
        assert!(!runtime.is_loading());
    }

    #[tokio::test]
    async fn fetch_parses_current_weather() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current_weather", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": { "temperature": 23.4, "windspeed": 11.2 }
            })))
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1/forecast", server.uri());
        let (_, coords) = lookup_city("nairobi").unwrap();
        let current =
            tokio::task::spawn_blocking(move || client_for(endpoint).fetch_current(coords))
                .await
                .unwrap()
                .unwrap();
        assert!((current.temperature - 23.4).abs() < f64::EPSILON);
        assert!((current.windspeed - 11.2).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn missing_current_weather_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "elevation": 1680.0
            })))
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1/forecast", server.uri());
        let (_, coords) = lookup_city("kisumu").unwrap();
        let result =
            tokio::task::spawn_blocking(move || client_for(endpoint).fetch_current(coords))
                .await
                .unwrap();
        assert_matches!(result, Err(WeatherError::MalformedResponse));
    }

    #[tokio::test]
    async fn server_errors_surface_as_request_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1/forecast", server.uri());
        let (_, coords) = lookup_city("mombasa").unwrap();
        let result =
            tokio::task::spawn_blocking(move || client_for(endpoint).fetch_current(coords))
                .await
                .unwrap();
        assert_matches!(result, Err(WeatherError::Request(_)));
    }
}
