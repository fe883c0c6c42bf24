//! Error taxonomy for the optimization driver.
//!
//! Every variant is fatal: the driver has no partial-results mode. A
//! corrupted objective would silently bias the search, so errors propagate
//! all the way up and abort the run, leaving the execution log and any
//! partially written `objectives.csv` behind as forensic evidence.

use std::path::PathBuf;

/// All error conditions the driver can surface.
#[derive(Debug, thiserror::Error)]
pub enum CampOptError {
    /// Invalid or incomplete run configuration. Reported before any
    /// simulation work begins.
    #[error("configuration error: {0}")]
    Config(String),

    /// The materializer was asked to write into a scenario directory that
    /// already exists. Directory numbers are never reused within a run, so
    /// this indicates a counter defect, not a transient condition.
    #[error("scenario directory already exists: {0}")]
    WorkdirCollision(PathBuf),

    /// A directly executed simulation exited with a non-zero status.
    #[error("simulation exited with status {code:?} while executing {script}")]
    SimulationFailed {
        script: PathBuf,
        code: Option<i32>,
    },

    /// A pilot-job batch completed but a scenario never produced its
    /// completion marker.
    #[error("job {name} finished without a completion marker in {workdir}")]
    JobIncomplete { name: String, workdir: PathBuf },

    /// Output of a completed scenario could not be turned into objective
    /// values (missing trajectory rows, unknown camp, absent column).
    #[error("scoring failed in {workdir}: {reason}")]
    Scoring { workdir: PathBuf, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CampOptError>;
