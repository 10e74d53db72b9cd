//! ÖBB railnet source.
//!
//! Railjets publish everything in one `combined.json` document, so a poll is a
//! single request without any special headers.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use super::json::string_or_number;
use super::{DataSource, Snapshot, SourceError, SourceKind};
use crate::fetch::Fetcher;

/// Combined status document of the ÖBB on-board portal.
pub const DEFAULT_URL: &str = "https://railnet.oebb.at/assets/media/fis/combined.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Combined {
    train_type: String,
    #[serde(deserialize_with = "string_or_number")]
    line_number: String,
    latest_status: LatestStatus,
    next_station: NextStation,
}

#[derive(Debug, Deserialize)]
struct LatestStatus {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct NextStation {
    name: LocalizedName,
    arrival: Arrival,
}

#[derive(Debug, Deserialize)]
struct LocalizedName {
    de: String,
}

#[derive(Debug, Deserialize)]
struct Arrival {
    #[serde(default)]
    forecast: Option<String>,
    #[serde(default)]
    scheduled: Option<String>,
}

impl Arrival {
    /// A live forecast overrides the timetable.
    fn best(self) -> String {
        self.forecast
            .filter(|f| !f.is_empty())
            .or(self.scheduled)
            .unwrap_or_default()
    }
}

/// Polls the ÖBB railnet feed.
#[derive(Debug, Clone)]
pub struct RailjetSource {
    fetcher: Fetcher,
    url: String,
}

impl RailjetSource {
    /// Create a source reading `url` (normally [`DEFAULT_URL`]).
    pub fn new(fetcher: Fetcher, url: impl Into<String>) -> Self {
        Self {
            fetcher,
            url: url.into(),
        }
    }

    /// Build a [`Snapshot`] from an already-fetched `combined.json` document.
    pub fn parse(combined: Value) -> Result<Snapshot, SourceError> {
        let combined: Combined = serde_json::from_value(combined)?;

        Ok(Snapshot {
            source: SourceKind::Railjet,
            train_label: format!("{} {}", combined.train_type, combined.line_number),
            speed_kmh: Snapshot::checked_speed(combined.latest_status.speed)?,
            next_stop_name: combined.next_station.name.de,
            next_stop_time: combined.next_station.arrival.best(),
        })
    }
}

#[async_trait]
impl DataSource for RailjetSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Railjet
    }

    async fn poll(&self) -> Result<Snapshot, SourceError> {
        let combined = self.fetcher.fetch(&self.url, &[]).await?;
        Self::parse(combined)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub fn combined_json() -> Value {
        json!({
            "trainType": "RJ",
            "lineNumber": 60,
            "latestStatus": { "speed": 180 },
            "nextStation": {
                "name": { "de": "Wien", "en": "Vienna" },
                "arrival": { "scheduled": "14:10" }
            }
        })
    }

    #[test]
    fn parse_extracts_all_fields() {
        assert_eq!(
            RailjetSource::parse(combined_json()).unwrap(),
            Snapshot {
                source: SourceKind::Railjet,
                train_label: "RJ 60".into(),
                speed_kmh: 180.0,
                next_stop_name: "Wien".into(),
                next_stop_time: "14:10".into(),
            }
        );
    }

    #[test]
    fn forecast_overrides_schedule() {
        let mut doc = combined_json();
        doc["nextStation"]["arrival"]["forecast"] = json!("14:13");
        assert_eq!(RailjetSource::parse(doc).unwrap().next_stop_time, "14:13");
    }

    #[test]
    fn null_or_empty_forecast_keeps_schedule() {
        for forecast in [Value::Null, json!("")] {
            let mut doc = combined_json();
            doc["nextStation"]["arrival"]["forecast"] = forecast;
            assert_eq!(RailjetSource::parse(doc).unwrap().next_stop_time, "14:10");
        }
    }

    #[test]
    fn no_arrival_times_render_empty() {
        let mut doc = combined_json();
        doc["nextStation"]["arrival"] = json!({});
        assert_eq!(RailjetSource::parse(doc).unwrap().next_stop_time, "");
    }

    #[test]
    fn string_line_numbers_are_accepted() {
        let mut doc = combined_json();
        doc["lineNumber"] = json!("531");
        assert_eq!(RailjetSource::parse(doc).unwrap().train_label, "RJ 531");
    }

    #[test]
    fn missing_required_fields_are_data_shape_errors() {
        let removals: [&[&str]; 5] = [
            &["trainType"],
            &["lineNumber"],
            &["latestStatus", "speed"],
            &["nextStation", "name", "de"],
            &["nextStation", "arrival"],
        ];
        for path in removals {
            let mut doc = combined_json();
            let (last, parents) = path.split_last().unwrap();
            let mut node = &mut doc;
            for key in parents {
                node = &mut node[*key];
            }
            node.as_object_mut().unwrap().remove(*last);

            let err = RailjetSource::parse(doc).unwrap_err();
            assert!(matches!(err, SourceError::DataShape(_)), "{path:?}: {err:?}");
        }
    }

    #[test]
    fn null_next_station_or_arrival_is_data_shape_error() {
        // At a terminus the portal sends `"nextStation": null`.
        for (key, parent) in [("nextStation", None), ("arrival", Some("nextStation"))] {
            let mut doc = combined_json();
            match parent {
                Some(parent) => doc[parent][key] = Value::Null,
                None => doc[key] = Value::Null,
            }

            let err = RailjetSource::parse(doc).unwrap_err();
            assert!(matches!(err, SourceError::DataShape(_)), "{key}: {err:?}");
        }
    }

    async fn mount_combined(server: &wiremock::MockServer, calls: u64) -> RailjetSource {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, ResponseTemplate};

        Mock::given(method("GET"))
            .and(path("/assets/media/fis/combined.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(combined_json()))
            .expect(calls)
            .mount(server)
            .await;

        let fetcher = Fetcher::new(std::time::Duration::from_millis(500)).unwrap();
        RailjetSource::new(fetcher, format!("{}/assets/media/fis/combined.json", server.uri()))
    }

    #[tokio::test]
    async fn poll_reads_combined_document() {
        let server = wiremock::MockServer::start().await;
        let source = mount_combined(&server, 1).await;
        assert_eq!(source.poll().await.unwrap().train_label, "RJ 60");
    }

    #[tokio::test]
    async fn repeated_polls_of_same_document_agree() {
        let server = wiremock::MockServer::start().await;
        let source = mount_combined(&server, 2).await;

        let first = source.poll().await.unwrap();
        let second = source.poll().await.unwrap();
        assert_eq!(first, second);
    }
}
