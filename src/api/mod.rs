//! Client for the OpenF1 REST API.
//!
//! Every endpoint returns a JSON array; the client deserializes each array
//! into typed records and leaves aggregation to the analysis module. All
//! requests are one-shot blocking GETs, one per user action.

use log::debug;
use reqwest::header::ACCEPT;
use serde::Deserialize;

use crate::errors::BoxBoxError;

pub const OPENF1_BASE_URL: &str = "https://api.openf1.org/v1";

const UNKNOWN_CIRCUIT: &str = "Unknown Circuit";
const UNKNOWN_COUNTRY: &str = "Unknown Country";
const UNKNOWN_DATE: &str = "Unknown Date";

/// One entry from the `/sessions` endpoint. Only race weekends with
/// `session_name == "Race"` are of interest; the rest (practice,
/// qualifying, sprint) are filtered out by the callers.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionRecord {
    pub session_key: u32,
    pub session_name: String,
    #[serde(default)]
    pub circuit_short_name: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub date_start: Option<String>,
}

/// One entry from the `/laps` endpoint. `lap_duration` and the sector
/// durations are null for in-progress or invalidated laps, and the pit-out
/// flag can be absent entirely on older sessions.
#[derive(Clone, Debug, Deserialize)]
pub struct Lap {
    pub driver_number: u32,
    pub lap_number: u32,
    #[serde(default)]
    pub lap_duration: Option<f64>,
    #[serde(default)]
    pub is_pit_out_lap: Option<bool>,
    #[serde(default)]
    pub duration_sector_1: Option<f64>,
    #[serde(default)]
    pub duration_sector_2: Option<f64>,
    #[serde(default)]
    pub duration_sector_3: Option<f64>,
}

impl Lap {
    pub fn is_pit_out(&self) -> bool {
        self.is_pit_out_lap.unwrap_or(false)
    }
}

/// One entry from the `/position` endpoint. The stream is chronological,
/// so the last record per driver is their final classification.
#[derive(Clone, Copy, Debug, Deserialize)]
pub struct PositionEvent {
    pub driver_number: u32,
    pub position: u32,
}

/// A race on the season calendar, numbered by order of appearance in the
/// session list (OpenF1 carries no explicit round field).
#[derive(Clone, Debug, PartialEq)]
pub struct RaceListing {
    pub round: u32,
    pub circuit_name: String,
    pub country_name: String,
    pub date: String,
    pub session_key: u32,
}

/// A resolved (season, round) pair. Immutable once resolved; every later
/// fetch for the same user action reuses the same session key.
#[derive(Clone, Copy, Debug)]
pub struct SessionIdentity {
    pub season: u32,
    pub round: u32,
    pub session_key: u32,
}

/// Builds the season calendar from a raw session list, assigning round
/// numbers positionally and substituting defaults for missing fields.
pub fn race_listings(sessions: &[SessionRecord]) -> Vec<RaceListing> {
    sessions
        .iter()
        .enumerate()
        .map(|(idx, session)| {
            // Keep just the calendar date from the ISO timestamp
            let date = match session.date_start.as_deref() {
                Some(date_start) => date_start.get(..10).unwrap_or(date_start),
                None => UNKNOWN_DATE,
            };
            RaceListing {
                round: idx as u32 + 1,
                circuit_name: session
                    .circuit_short_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_CIRCUIT.to_string()),
                country_name: session
                    .country_name
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_COUNTRY.to_string()),
                date: date.to_string(),
                session_key: session.session_key,
            }
        })
        .collect()
}

/// Returns the session key of the `round`-th "Race" session in source
/// order, or `None` when the season has fewer race sessions than that.
pub fn resolve_session_key(sessions: &[SessionRecord], round: u32) -> Option<u32> {
    if round == 0 {
        return None;
    }
    sessions
        .iter()
        .filter(|s| s.session_name == "Race")
        .nth(round as usize - 1)
        .map(|s| s.session_key)
}

pub struct OpenF1Client {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl Default for OpenF1Client {
    fn default() -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            base_url: OPENF1_BASE_URL.to_string(),
        }
    }
}

impl OpenF1Client {
    /// Fetches the race calendar for a season.
    pub fn fetch_races(&self, season: u32) -> Result<Vec<RaceListing>, BoxBoxError> {
        let sessions = self.fetch_race_sessions(season)?;
        Ok(race_listings(&sessions))
    }

    /// Maps a (season, round) pair to the session key OpenF1 uses for
    /// every other endpoint.
    pub fn resolve_session(
        &self,
        season: u32,
        round: u32,
    ) -> Result<SessionIdentity, BoxBoxError> {
        let sessions = self.fetch_race_sessions(season)?;
        resolve_session_key(&sessions, round)
            .map(|session_key| SessionIdentity {
                season,
                round,
                session_key,
            })
            .ok_or(BoxBoxError::SessionNotFound { season, round })
    }

    /// Fetches every lap of every driver in a session.
    pub fn fetch_session_laps(&self, session_key: u32) -> Result<Vec<Lap>, BoxBoxError> {
        let laps: Vec<Lap> =
            self.get_json("laps", &[("session_key", session_key.to_string())])?;
        debug!("fetched {} laps for session {}", laps.len(), session_key);
        Ok(laps)
    }

    /// Fetches one driver's laps, used for sector comparisons.
    pub fn fetch_driver_laps(
        &self,
        session_key: u32,
        driver_number: u32,
    ) -> Result<Vec<Lap>, BoxBoxError> {
        let laps: Vec<Lap> = self.get_json(
            "laps",
            &[
                ("session_key", session_key.to_string()),
                ("driver_number", driver_number.to_string()),
            ],
        )?;
        debug!(
            "fetched {} laps for driver {} in session {}",
            laps.len(),
            driver_number,
            session_key
        );
        Ok(laps)
    }

    /// Fetches the full position-event stream for a session in a single
    /// request, rather than one request per driver.
    pub fn fetch_positions(&self, session_key: u32) -> Result<Vec<PositionEvent>, BoxBoxError> {
        let events: Vec<PositionEvent> =
            self.get_json("position", &[("session_key", session_key.to_string())])?;
        debug!(
            "fetched {} position events for session {}",
            events.len(),
            session_key
        );
        Ok(events)
    }

    fn fetch_race_sessions(&self, season: u32) -> Result<Vec<SessionRecord>, BoxBoxError> {
        self.get_json(
            "sessions",
            &[
                ("year", season.to_string()),
                ("session_name", "Race".to_string()),
            ],
        )
    }

    fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BoxBoxError> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);
        let response = self
            .http
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|e| BoxBoxError::Transport { source: e })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BoxBoxError::HttpStatus {
                status: status.as_u16(),
            });
        }

        response
            .json()
            .map_err(|e| BoxBoxError::Transport { source: e })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sessions_fixture() -> Vec<SessionRecord> {
        serde_json::from_str(
            r#"[
                {"session_key": 9001, "session_name": "Practice 1", "circuit_short_name": "Sakhir", "country_name": "Bahrain", "date_start": "2023-03-03T11:30:00+00:00"},
                {"session_key": 9010, "session_name": "Race", "circuit_short_name": "Sakhir", "country_name": "Bahrain", "date_start": "2023-03-05T15:00:00+00:00"},
                {"session_key": 9020, "session_name": "Race", "circuit_short_name": "Jeddah", "country_name": "Saudi Arabia", "date_start": "2023-03-19T17:00:00+00:00"},
                {"session_key": 9030, "session_name": "Race"}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn race_listings_assign_positional_rounds_and_truncate_dates() {
        let listings = race_listings(&sessions_fixture());
        assert_eq!(listings.len(), 4);
        assert_eq!(listings[1].round, 2);
        assert_eq!(listings[1].circuit_name, "Sakhir");
        assert_eq!(listings[1].date, "2023-03-05");
        assert_eq!(listings[1].session_key, 9010);
    }

    #[test]
    fn race_listings_default_missing_fields() {
        let listings = race_listings(&sessions_fixture());
        let bare = &listings[3];
        assert_eq!(bare.circuit_name, "Unknown Circuit");
        assert_eq!(bare.country_name, "Unknown Country");
        assert_eq!(bare.date, "Unknown Date");
    }

    #[test]
    fn resolve_session_key_counts_race_sessions_only() {
        let sessions = sessions_fixture();
        // Practice 1 does not count towards the round number
        assert_eq!(resolve_session_key(&sessions, 1), Some(9010));
        assert_eq!(resolve_session_key(&sessions, 2), Some(9020));
        assert_eq!(resolve_session_key(&sessions, 3), Some(9030));
    }

    #[test]
    fn resolve_session_key_rejects_out_of_range_rounds() {
        let sessions = sessions_fixture();
        assert_eq!(resolve_session_key(&sessions, 0), None);
        assert_eq!(resolve_session_key(&sessions, 4), None);
    }

    #[test]
    fn lap_parses_null_duration_and_missing_pit_flag() {
        let laps: Vec<Lap> = serde_json::from_str(
            r#"[
                {"driver_number": 1, "lap_number": 1, "lap_duration": null, "is_pit_out_lap": true},
                {"driver_number": 1, "lap_number": 2, "lap_duration": 92.345,
                 "duration_sector_1": 30.1, "duration_sector_2": 34.2, "duration_sector_3": 28.045}
            ]"#,
        )
        .unwrap();
        assert!(laps[0].lap_duration.is_none());
        assert!(laps[0].is_pit_out());
        assert!(!laps[1].is_pit_out());
        assert_eq!(laps[1].lap_duration, Some(92.345));
        assert_eq!(laps[1].duration_sector_3, Some(28.045));
    }
}
