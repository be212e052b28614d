// Library interface for boxbox
// This allows integration tests to access internal modules

pub mod analysis;
pub mod api;
pub mod errors;
pub mod roster;
pub mod ui;

// Re-export commonly used types
pub use analysis::{DriverSummary, SectorDelta, SectorSplit};
pub use api::{Lap, OpenF1Client, PositionEvent, RaceListing, SessionIdentity, SessionRecord};
pub use errors::BoxBoxError;
pub use roster::Roster;
