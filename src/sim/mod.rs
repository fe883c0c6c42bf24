//! Simulation orchestration layers.
//!
//! Leaf-first, these mirror the data flow of one generation:
//!
//! - [`encoder`]: integer candidate index → coordinates + nearest network
//!   connection.
//! - [`scenario`]: candidate → isolated, numbered scenario directory.
//! - [`executor`]: scenario directory → completed simulation run.
//! - [`scorer`]: completed run → three objective values.
//!
//! The search loop in [`crate::problem`] drives them in that order for every
//! candidate the optimizer proposes.

pub mod encoder;
pub mod executor;
pub mod scenario;
pub mod scorer;

pub use encoder::{encode, CampLocationTable, Candidate, RouteDistanceTable};
pub use executor::{DirectExecutor, PilotJobExecutor, ScenarioExecutor, ScenarioJob};
pub use scenario::Materializer;
pub use scorer::ObjectiveRecord;

use crate::error::{CampOptError, Result};
use std::path::Path;

/// Destination marker of the route-table row representing the virtual new
/// camp. Exactly one row of the shared route table carries it.
pub const NEW_CAMP_MARKER: &str = "Z";

/// Name of the camp in the simulator's location table and output columns.
pub const CAMP_NAME: &str = "Z";

/// Looks up a named column in a CSV header row.
pub(crate) fn column_index(
    headers: &csv::StringRecord,
    name: &str,
    path: &Path,
) -> Result<usize> {
    headers.iter().position(|h| h == name).ok_or_else(|| {
        CampOptError::Config(format!(
            "{}: required column '{name}' is missing",
            path.display()
        ))
    })
}
