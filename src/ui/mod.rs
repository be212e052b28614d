//! Interactive console for race analysis.
//!
//! Owns the prompt/response loop and all table rendering. Transport and
//! not-found errors from the API surface here as messages; a failed action
//! returns to the menu instead of tearing the session down.

use std::io::{self, BufRead, Write};

use log::warn;

use crate::analysis::{
    DriverSummary, SectorSplit, aggregate_laps, apply_finishing_positions, compare_splits,
    fastest_ranking, fastest_sector_split, sort_by_finishing_position,
};
use crate::api::{OpenF1Client, RaceListing, SessionIdentity};
use crate::errors::BoxBoxError;
use crate::roster::Roster;

/// Formats a lap time in seconds as M:SS.mmm; "N/A" for drivers with no
/// accepted lap (time still at infinity) or an all-zero average.
pub fn format_lap_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds == 0.0 {
        return "N/A".to_string();
    }
    // Round to milliseconds before splitting off the minutes, so a time
    // like 119.9996 carries into 2:00.000 instead of printing 1:60.000
    let total_millis = (seconds * 1000.0).round() as u64;
    let minutes = total_millis / 60_000;
    let remaining = (total_millis % 60_000) as f64 / 1000.0;
    format!("{minutes}:{remaining:06.3}")
}

/// Formats a sector time in seconds with millisecond precision.
pub fn format_sector_time(seconds: f64) -> String {
    if seconds == 0.0 || seconds.is_nan() {
        return "N/A".to_string();
    }
    format!("{seconds:.3}s")
}

fn prompt_u32(label: &str) -> Result<u32, BoxBoxError> {
    read_u32(&mut io::stdin().lock(), label)
}

fn read_u32(input: &mut impl BufRead, label: &str) -> Result<u32, BoxBoxError> {
    loop {
        print!("{label}");
        io::stdout()
            .flush()
            .map_err(|e| BoxBoxError::ConsoleIo { source: e })?;

        let mut line = String::new();
        let bytes_read = input
            .read_line(&mut line)
            .map_err(|e| BoxBoxError::ConsoleIo { source: e })?;
        // A zero-byte read means the input stream is closed; abort the
        // session rather than re-prompting forever
        if bytes_read == 0 {
            return Err(BoxBoxError::ConsoleIo {
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "console input closed"),
            });
        }

        match line.trim().parse() {
            Ok(value) => return Ok(value),
            Err(_) => println!("Please enter a whole number."),
        }
    }
}

/// Top-level session flow: resolve the race, build the summaries, then
/// loop on the analysis menu until the user exits.
pub fn run(
    client: &OpenF1Client,
    roster: &Roster,
    season: Option<u32>,
    round: Option<u32>,
) -> Result<(), BoxBoxError> {
    println!("=== F1 Lap Time Analyzer ===\n");

    let season = match season {
        Some(season) => season,
        None => prompt_u32("Enter season (e.g., 2023 or 2024): ")?,
    };
    let mut round = match round {
        Some(round) => round,
        None => choose_round(client, season)?,
    };

    let session = loop {
        match client.resolve_session(season, round) {
            Ok(identity) => break identity,
            Err(e @ BoxBoxError::SessionNotFound { .. }) => {
                println!("{e}");
                round = prompt_u32("Enter race round number: ")?;
            }
            Err(e) => return Err(e),
        }
    };

    println!("\nFetching race data...");
    let laps = client.fetch_session_laps(session.session_key)?;
    let mut summaries = aggregate_laps(&laps, roster);
    if summaries.is_empty() {
        println!("No data available for this race.");
        return Ok(());
    }

    let positions = client.fetch_positions(session.session_key)?;
    apply_finishing_positions(&positions, &mut summaries);
    sort_by_finishing_position(&mut summaries);

    print_classification(&summaries);

    loop {
        println!("\n=== Analysis Menu ===");
        println!("1. Display Top 3 Fastest Laps");
        println!("2. View Average Lap Times for Specific Driver");
        println!("3. Compare Sector Times Between Two Drivers");
        println!("4. Exit");

        match prompt_u32("Choose an option: ")? {
            1 => show_top_fastest(&summaries),
            2 => show_driver_stats(&summaries)?,
            3 => compare_sectors(client, &session, &summaries)?,
            4 => {
                println!("Exiting...");
                return Ok(());
            }
            _ => println!("Invalid option. Please try again."),
        }
    }
}

/// Shows the season calendar and asks for a round. Falls back to manual
/// round entry when the calendar cannot be fetched or comes back empty.
fn choose_round(client: &OpenF1Client, season: u32) -> Result<u32, BoxBoxError> {
    println!("\nFetching available races for {season}...");
    match client.fetch_races(season) {
        Ok(races) if !races.is_empty() => {
            print_race_calendar(season, &races);
            prompt_u32("\nEnter race round number: ")
        }
        Ok(_) => {
            println!("No races found for this season.");
            prompt_u32("Enter race round number manually: ")
        }
        Err(e) => {
            warn!("race calendar fetch failed: {e}");
            println!("Error fetching races: {e}");
            prompt_u32("Enter race round number manually: ")
        }
    }
}

fn print_race_calendar(season: u32, races: &[RaceListing]) {
    println!("\n=== Available Races for {season} ===");
    println!("{:<5} {:<30} {:<20}", "Round", "Circuit", "Date");
    println!("{}", "-".repeat(55));
    for race in races {
        println!(
            "{:<5} {:<30} {:<20}",
            race.round, race.circuit_name, race.date
        );
    }
}

fn print_classification(summaries: &[DriverSummary]) {
    println!("\n=== Race Results (Final Positions) ===");
    println!("{:<5} {:<5} {:<30}", "Pos", "No.", "Driver");
    println!("{}", "-".repeat(35));
    for driver in summaries {
        let position = match driver.finishing_position {
            Some(position) => position.to_string(),
            None => "DNF".to_string(),
        };
        println!(
            "{:<5} {:<5} {:<30}",
            position, driver.driver_number, driver.driver_name
        );
    }
}

fn show_top_fastest(summaries: &[DriverSummary]) {
    println!("\n=== Top 3 Fastest Laps ===");
    for (rank, driver) in fastest_ranking(summaries).iter().take(3).enumerate() {
        println!(
            "{}. {} - {} (Lap {})",
            rank + 1,
            driver.driver_name,
            format_lap_time(driver.fastest_lap_time()),
            driver.fastest_lap_number()
        );
    }
}

fn show_driver_stats(summaries: &[DriverSummary]) -> Result<(), BoxBoxError> {
    let driver_number = prompt_u32("\nEnter driver number (e.g., 1 for Verstappen): ")?;

    let Some(driver) = summaries.iter().find(|d| d.driver_number == driver_number) else {
        println!("Driver not found.");
        return Ok(());
    };

    println!("\n=== Driver Statistics ===");
    println!("Driver: {}", driver.driver_name);
    println!("Number: {}", driver.driver_number);
    println!("Total Laps: {}", driver.total_laps());
    println!(
        "Fastest Lap: {} (Lap {})",
        format_lap_time(driver.fastest_lap_time()),
        driver.fastest_lap_number()
    );
    println!(
        "Average Lap Time: {}",
        format_lap_time(driver.average_lap_time())
    );
    Ok(())
}

/// Fetches both drivers' laps and prints their fastest-lap sector splits
/// side by side. A driver without a fully-timed lap is reported and the
/// comparison degrades to whatever data is left.
fn compare_sectors(
    client: &OpenF1Client,
    session: &SessionIdentity,
    summaries: &[DriverSummary],
) -> Result<(), BoxBoxError> {
    let first_number = prompt_u32("\nEnter first driver number: ")?;
    let second_number = prompt_u32("Enter second driver number: ")?;

    let mut splits: Vec<(u32, Option<SectorSplit>)> = Vec::new();
    for driver_number in [first_number, second_number] {
        match client.fetch_driver_laps(session.session_key, driver_number) {
            Ok(laps) => splits.push((driver_number, fastest_sector_split(&laps))),
            Err(e) => {
                println!("Error fetching sector times: {e}");
                return Ok(());
            }
        }
    }

    let driver_name = |number: u32| {
        summaries
            .iter()
            .find(|d| d.driver_number == number)
            .map(|d| d.driver_name.clone())
            .unwrap_or_else(|| format!("Driver #{number}"))
    };

    println!("\n=== Fastest Lap Sector Comparison ===");
    println!(
        "{:<20} {:<15} {:<15} {:<15}",
        "Driver", "Sector 1", "Sector 2", "Sector 3"
    );
    println!("{}", "-".repeat(65));
    for (driver_number, split) in &splits {
        match split {
            Some(split) => println!(
                "{:<20} {:<15} {:<15} {:<15}",
                driver_name(*driver_number),
                format_sector_time(split.sector_1),
                format_sector_time(split.sector_2),
                format_sector_time(split.sector_3)
            ),
            None => println!(
                "Sector data not available for {}.",
                driver_name(*driver_number)
            ),
        }
    }

    if let (Some(first), Some(second)) = (splits[0].1, splits[1].1) {
        let deltas = compare_splits(&first, &second);
        println!("\n=== Sector Differences (Driver 1 - Driver 2) ===");
        for (sector, delta) in deltas.iter().enumerate() {
            println!("Sector {}: {}", sector + 1, delta);
        }
    }
    Ok(())
}
