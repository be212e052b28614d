//! Driver number to display name mapping.
//!
//! Ships with a builtin grid so the tool works out of the box; a JSON file
//! in the user's config directory (or one passed with `--roster`) replaces
//! it without recompiling. Unknown numbers render as "Driver #N".

use std::collections::HashMap;
use std::path::Path;

use log::warn;

use crate::errors::BoxBoxError;

const ROSTER_FILE_NAME: &str = "roster.json";

const DEFAULT_GRID: &[(u32, &str)] = &[
    (1, "Max Verstappen"),
    (2, "Logan Sargeant"),
    (3, "Daniel Ricciardo"),
    (4, "Lando Norris"),
    (10, "Pierre Gasly"),
    (11, "Sergio Perez"),
    (14, "Fernando Alonso"),
    (16, "Charles Leclerc"),
    (18, "Lance Stroll"),
    (20, "Kevin Magnussen"),
    (21, "Nyck de Vries"),
    (22, "Yuki Tsunoda"),
    (23, "Alexander Albon"),
    (24, "Zhou Guanyu"),
    (27, "Nico Hulkenberg"),
    (30, "Liam Lawson"),
    (31, "Esteban Ocon"),
    (40, "Liam Lawson"),
    (43, "Franco Colapinto"),
    (44, "Lewis Hamilton"),
    (55, "Carlos Sainz"),
    (63, "George Russell"),
    (77, "Valtteri Bottas"),
    (81, "Oscar Piastri"),
];

#[derive(Clone, Debug)]
pub struct Roster {
    names: HashMap<u32, String>,
}

impl Default for Roster {
    fn default() -> Self {
        Self {
            names: DEFAULT_GRID
                .iter()
                .map(|(number, name)| (*number, name.to_string()))
                .collect(),
        }
    }
}

impl Roster {
    /// Display name for a driver number, with a generated fallback for
    /// numbers outside the roster.
    pub fn name(&self, driver_number: u32) -> String {
        self.names
            .get(&driver_number)
            .cloned()
            .unwrap_or_else(|| format!("Driver #{driver_number}"))
    }

    /// Loads a roster: an explicit path must parse, the config-directory
    /// file is used when present, otherwise the builtin grid.
    pub fn load(path_override: Option<&Path>) -> Result<Self, BoxBoxError> {
        match path_override {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_local_file().unwrap_or_default()),
        }
    }

    /// Reads a roster file of the form `{"1": "Max Verstappen", ...}`.
    pub fn from_file(path: &Path) -> Result<Self, BoxBoxError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| BoxBoxError::RosterIo { source: e })?;
        let names: HashMap<u32, String> =
            serde_json::from_str(&contents).map_err(|e| BoxBoxError::RosterParse { source: e })?;
        Ok(Self { names })
    }

    fn from_local_file() -> Option<Self> {
        let roster_path = dirs::config_dir()?.join("boxbox").join(ROSTER_FILE_NAME);
        if !roster_path.exists() {
            return None;
        }
        match Self::from_file(&roster_path) {
            Ok(roster) => Some(roster),
            Err(e) => {
                warn!("ignoring roster file {}: {}", roster_path.display(), e);
                None
            }
        }
    }
}
