// Error types for boxbox

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum BoxBoxError {
    // Errors talking to the OpenF1 API
    #[snafu(display("OpenF1 request failed with HTTP status {status}"))]
    HttpStatus { status: u16 },
    #[snafu(display("Error reaching the OpenF1 API"))]
    Transport { source: reqwest::Error },
    #[snafu(display("No race session found for season {season}, round {round}"))]
    SessionNotFound { season: u32, round: u32 },

    // Roster config errors
    #[snafu(display("Error reading roster file"))]
    RosterIo { source: io::Error },
    #[snafu(display("Error parsing roster file"))]
    RosterParse { source: serde_json::Error },

    // Console errors
    #[snafu(display("Error reading console input"))]
    ConsoleIo { source: io::Error },
}
