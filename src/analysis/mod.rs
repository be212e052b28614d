//! Lap aggregation and comparison.
//!
//! Takes the flat record streams the API returns and turns them into
//! per-driver summaries: lap history, fastest lap, running average, and
//! final classification. Sector comparison picks each driver's fastest
//! fully-timed lap and diffs the splits.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use log::debug;

use crate::api::{Lap, PositionEvent};
use crate::roster::Roster;

/// Aggregated lap data for a single driver in a single session.
#[derive(Clone, Debug)]
pub struct DriverSummary {
    pub driver_number: u32,
    pub driver_name: String,
    /// Accepted (lap_number, duration) pairs in arrival order.
    laps: Vec<(u32, f64)>,
    fastest_lap_time: f64,
    fastest_lap_number: u32,
    /// Final classification, `None` for DNF/DNS/DSQ.
    pub finishing_position: Option<u32>,
}

impl DriverSummary {
    fn new(driver_number: u32, driver_name: String) -> Self {
        Self {
            driver_number,
            driver_name,
            laps: Vec::new(),
            fastest_lap_time: f64::INFINITY,
            fastest_lap_number: 0,
            finishing_position: None,
        }
    }

    fn add_lap(&mut self, duration: f64, lap_number: u32) {
        self.laps.push((lap_number, duration));
        if duration < self.fastest_lap_time {
            self.fastest_lap_time = duration;
            self.fastest_lap_number = lap_number;
        }
    }

    pub fn fastest_lap_time(&self) -> f64 {
        self.fastest_lap_time
    }

    pub fn fastest_lap_number(&self) -> u32 {
        self.fastest_lap_number
    }

    pub fn total_laps(&self) -> usize {
        self.laps.len()
    }

    pub fn lap_times(&self) -> &[(u32, f64)] {
        &self.laps
    }

    /// Arithmetic mean of the accepted lap times, 0.0 with no laps.
    pub fn average_lap_time(&self) -> f64 {
        if self.laps.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.laps.iter().map(|(_, duration)| duration).sum();
        sum / self.laps.len() as f64
    }
}

/// Groups a lap stream by driver, skipping pit-out laps and laps without a
/// recorded duration. Output order is unspecified; callers sort explicitly.
pub fn aggregate_laps(laps: &[Lap], roster: &Roster) -> Vec<DriverSummary> {
    let mut drivers: HashMap<u32, DriverSummary> = HashMap::new();
    let mut skipped = 0usize;

    for lap in laps {
        if lap.is_pit_out() {
            skipped += 1;
            continue;
        }
        let Some(duration) = lap.lap_duration else {
            skipped += 1;
            continue;
        };

        drivers
            .entry(lap.driver_number)
            .or_insert_with(|| {
                DriverSummary::new(lap.driver_number, roster.name(lap.driver_number))
            })
            .add_lap(duration, lap.lap_number);
    }

    debug!(
        "aggregated {} laps into {} drivers ({} skipped)",
        laps.len(),
        drivers.len(),
        skipped
    );
    drivers.into_values().collect()
}

/// Applies final classification from the position-event stream. The stream
/// is assumed chronological, so the last event per driver wins. Drivers
/// with no events keep `None` and classify as DNF.
pub fn apply_finishing_positions(events: &[PositionEvent], summaries: &mut [DriverSummary]) {
    let mut final_positions: HashMap<u32, u32> = HashMap::new();
    for event in events {
        final_positions.insert(event.driver_number, event.position);
    }

    for summary in summaries.iter_mut() {
        summary.finishing_position = final_positions.get(&summary.driver_number).copied();
    }
}

/// Sorts by finishing position ascending; unclassified drivers sort last.
/// Stable, so repeated sorts leave the order unchanged.
pub fn sort_by_finishing_position(summaries: &mut [DriverSummary]) {
    summaries.sort_by_key(|s| (s.finishing_position.is_none(), s.finishing_position));
}

/// All drivers ranked by fastest lap, quickest first. Drivers without an
/// accepted lap (fastest still at infinity) rank last.
pub fn fastest_ranking(summaries: &[DriverSummary]) -> Vec<&DriverSummary> {
    summaries
        .iter()
        .sorted_by(|a, b| a.fastest_lap_time.total_cmp(&b.fastest_lap_time))
        .collect()
}

/// The three sector times of a driver's fastest fully-timed lap.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SectorSplit {
    pub lap_number: u32,
    pub sector_1: f64,
    pub sector_2: f64,
    pub sector_3: f64,
}

impl SectorSplit {
    pub fn total(&self) -> f64 {
        self.sector_1 + self.sector_2 + self.sector_3
    }
}

/// Picks the minimum-total-duration lap that has a duration and all three
/// sector times and is not a pit-out lap. `None` when no lap qualifies.
pub fn fastest_sector_split(laps: &[Lap]) -> Option<SectorSplit> {
    laps.iter()
        .filter(|lap| !lap.is_pit_out())
        .filter_map(|lap| {
            let duration = lap.lap_duration?;
            Some((
                duration,
                SectorSplit {
                    lap_number: lap.lap_number,
                    sector_1: lap.duration_sector_1?,
                    sector_2: lap.duration_sector_2?,
                    sector_3: lap.duration_sector_3?,
                },
            ))
        })
        .min_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, split)| split)
}

/// Signed time difference in one sector between two drivers. An exact
/// zero is its own case so it renders as "Equal" rather than "+0.000s".
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SectorDelta {
    Equal,
    Gap(f64),
}

impl SectorDelta {
    pub fn between(first: f64, second: f64) -> Self {
        let diff = first - second;
        if diff == 0.0 {
            SectorDelta::Equal
        } else {
            SectorDelta::Gap(diff)
        }
    }
}

impl fmt::Display for SectorDelta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectorDelta::Equal => write!(f, "Equal"),
            SectorDelta::Gap(diff) => write!(f, "{diff:+.3}s"),
        }
    }
}

/// Sector-by-sector difference between two splits, sign preserved:
/// positive means the first driver was slower in that sector.
pub fn compare_splits(first: &SectorSplit, second: &SectorSplit) -> [SectorDelta; 3] {
    [
        SectorDelta::between(first.sector_1, second.sector_1),
        SectorDelta::between(first.sector_2, second.sector_2),
        SectorDelta::between(first.sector_3, second.sector_3),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lap(driver: u32, number: u32, duration: Option<f64>, pit_out: bool) -> Lap {
        Lap {
            driver_number: driver,
            lap_number: number,
            lap_duration: duration,
            is_pit_out_lap: Some(pit_out),
            duration_sector_1: None,
            duration_sector_2: None,
            duration_sector_3: None,
        }
    }

    fn sector_lap(driver: u32, number: u32, sectors: (f64, f64, f64)) -> Lap {
        Lap {
            driver_number: driver,
            lap_number: number,
            lap_duration: Some(sectors.0 + sectors.1 + sectors.2),
            is_pit_out_lap: Some(false),
            duration_sector_1: Some(sectors.0),
            duration_sector_2: Some(sectors.1),
            duration_sector_3: Some(sectors.2),
        }
    }

    #[test]
    fn aggregate_skips_pit_out_and_null_duration_laps() {
        let laps = vec![
            lap(1, 1, Some(95.0), true),
            lap(1, 2, None, false),
            lap(1, 3, Some(91.5), false),
            lap(1, 4, Some(92.0), false),
        ];
        let summaries = aggregate_laps(&laps, &Roster::default());

        assert_eq!(summaries.len(), 1);
        let driver = &summaries[0];
        assert_eq!(driver.total_laps(), 2);
        assert_eq!(driver.fastest_lap_time(), 91.5);
        assert_eq!(driver.fastest_lap_number(), 3);
    }

    #[test]
    fn fastest_lap_is_minimum_of_accepted_laps() {
        let laps = vec![
            lap(44, 10, Some(93.2), false),
            lap(44, 11, Some(92.8), false),
            lap(44, 12, Some(93.0), false),
        ];
        let summaries = aggregate_laps(&laps, &Roster::default());
        let driver = &summaries[0];

        for (_, duration) in driver.lap_times() {
            assert!(driver.fastest_lap_time() <= *duration);
        }
        assert_eq!(driver.fastest_lap_number(), 11);
    }

    #[test]
    fn average_of_no_laps_is_zero() {
        let laps = vec![lap(63, 1, None, false), lap(63, 2, Some(90.0), true)];
        let summaries = aggregate_laps(&laps, &Roster::default());
        assert!(summaries.is_empty());

        let empty = DriverSummary::new(63, "George Russell".to_string());
        assert_eq!(empty.average_lap_time(), 0.0);
        assert_eq!(empty.fastest_lap_time(), f64::INFINITY);
    }

    #[test]
    fn average_is_arithmetic_mean() {
        let laps = vec![
            lap(4, 1, Some(90.0), false),
            lap(4, 2, Some(92.0), false),
            lap(4, 3, Some(94.0), false),
        ];
        let summaries = aggregate_laps(&laps, &Roster::default());
        assert_eq!(summaries[0].average_lap_time(), 92.0);
    }

    #[test]
    fn last_position_event_wins() {
        let events = vec![
            PositionEvent { driver_number: 44, position: 5 },
            PositionEvent { driver_number: 44, position: 3 },
            PositionEvent { driver_number: 1, position: 1 },
        ];
        let mut summaries = vec![
            DriverSummary::new(44, "Lewis Hamilton".to_string()),
            DriverSummary::new(1, "Max Verstappen".to_string()),
            DriverSummary::new(2, "Logan Sargeant".to_string()),
        ];
        apply_finishing_positions(&events, &mut summaries);

        let by_number: HashMap<u32, Option<u32>> = summaries
            .iter()
            .map(|s| (s.driver_number, s.finishing_position))
            .collect();
        assert_eq!(by_number[&44], Some(3));
        assert_eq!(by_number[&1], Some(1));
        assert_eq!(by_number[&2], None);
    }

    #[test]
    fn unclassified_drivers_sort_last() {
        let mut summaries = vec![
            DriverSummary::new(2, "Logan Sargeant".to_string()),
            DriverSummary::new(44, "Lewis Hamilton".to_string()),
            DriverSummary::new(1, "Max Verstappen".to_string()),
        ];
        summaries[1].finishing_position = Some(3);
        summaries[2].finishing_position = Some(1);

        sort_by_finishing_position(&mut summaries);
        let order: Vec<u32> = summaries.iter().map(|s| s.driver_number).collect();
        assert_eq!(order, vec![1, 44, 2]);
    }

    #[test]
    fn position_sort_is_idempotent() {
        let mut summaries = vec![
            DriverSummary::new(10, "Pierre Gasly".to_string()),
            DriverSummary::new(31, "Esteban Ocon".to_string()),
            DriverSummary::new(14, "Fernando Alonso".to_string()),
        ];
        summaries[0].finishing_position = Some(7);
        summaries[2].finishing_position = Some(7);

        sort_by_finishing_position(&mut summaries);
        let first_pass: Vec<u32> = summaries.iter().map(|s| s.driver_number).collect();
        sort_by_finishing_position(&mut summaries);
        let second_pass: Vec<u32> = summaries.iter().map(|s| s.driver_number).collect();
        assert_eq!(first_pass, second_pass);
    }

    #[test]
    fn fastest_ranking_orders_by_fastest_lap() {
        let laps = vec![
            lap(1, 1, Some(91.0), false),
            lap(44, 1, Some(90.5), false),
            lap(16, 1, Some(92.0), false),
        ];
        let summaries = aggregate_laps(&laps, &Roster::default());
        let ranked = fastest_ranking(&summaries);
        let order: Vec<u32> = ranked.iter().map(|s| s.driver_number).collect();
        assert_eq!(order, vec![44, 1, 16]);
    }

    #[test]
    fn sector_split_comes_from_fastest_fully_timed_lap() {
        let mut slow = sector_lap(55, 8, (31.0, 36.0, 29.0));
        slow.lap_duration = Some(96.0);
        let laps = vec![
            // fastest overall but missing a sector, must be skipped
            Lap {
                duration_sector_2: None,
                ..sector_lap(55, 12, (29.0, 34.0, 27.0))
            },
            sector_lap(55, 20, (30.0, 35.0, 28.0)),
            slow,
        ];
        let split = fastest_sector_split(&laps).unwrap();
        assert_eq!(split.lap_number, 20);
        assert_eq!(split.total(), 93.0);
    }

    #[test]
    fn no_valid_lap_yields_no_split() {
        let laps = vec![
            lap(2, 1, Some(95.0), false),
            lap(2, 2, None, false),
            Lap {
                is_pit_out_lap: Some(true),
                ..sector_lap(2, 3, (30.0, 35.0, 28.0))
            },
        ];
        assert_eq!(fastest_sector_split(&laps), None);
    }

    #[test]
    fn sector_deltas_preserve_sign_and_report_equal() {
        let first = SectorSplit {
            lap_number: 30,
            sector_1: 30.0,
            sector_2: 35.0,
            sector_3: 28.0,
        };
        let second = SectorSplit {
            lap_number: 41,
            sector_1: 29.5,
            sector_2: 35.5,
            sector_3: 28.0,
        };
        let deltas = compare_splits(&first, &second);
        assert_eq!(deltas[0], SectorDelta::Gap(0.5));
        assert_eq!(deltas[1], SectorDelta::Gap(-0.5));
        assert_eq!(deltas[2], SectorDelta::Equal);

        assert_eq!(deltas[0].to_string(), "+0.500s");
        assert_eq!(deltas[1].to_string(), "-0.500s");
        assert_eq!(deltas[2].to_string(), "Equal");
    }
}
