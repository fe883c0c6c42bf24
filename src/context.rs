//! Run-wide state shared by every layer of the driver.
//!
//! [`RunContext`] replaces ad-hoc globals with one value created at run
//! start and passed down by reference: the working-directory root, the
//! simulator invocation parameters, and the append-only execution log.

use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{CampOptError, Result};

/// How the external simulator is launched inside each scenario directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// One interpreter process per scenario.
    Serial,
    /// Multi-process invocation through `mpirun` with a fixed core count.
    Parallel,
}

impl FromStr for ExecutionMode {
    type Err = CampOptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "serial" => Ok(ExecutionMode::Serial),
            "parallel" => Ok(ExecutionMode::Parallel),
            other => Err(CampOptError::Config(format!(
                "execution mode '{other}' is not valid (expected 'serial' or 'parallel')"
            ))),
        }
    }
}

/// Append-only text log recording every major step of a run.
///
/// Write-only during the run, never rotated or truncated. Survives fatal
/// failures so the operator can reconstruct how far the search got.
#[derive(Debug)]
pub struct RunLog {
    file: File,
}

impl RunLog {
    /// Opens (or creates) the log file in append mode.
    pub fn open(path: &Path) -> Result<RunLog> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(RunLog { file })
    }

    /// Appends one message, terminated by a newline.
    pub fn append(&mut self, msg: impl Display) -> Result<()> {
        writeln!(self.file, "{msg}")?;
        Ok(())
    }
}

/// Everything a component needs to know about the current run.
#[derive(Debug)]
pub struct RunContext {
    /// Root directory holding the shared inputs and the `SWEEP` tree.
    pub work_dir: PathBuf,
    /// Serial or parallel simulator launch.
    pub execution_mode: ExecutionMode,
    /// Number of simulated days handed to the simulator.
    pub simulation_period: i64,
    /// Core count for parallel launches and pilot-job declarations.
    pub cores: usize,
    /// Interpreter used to launch the simulator's run script.
    pub interpreter: String,
    /// Append-only execution log.
    pub log: RunLog,
}

impl RunContext {
    /// Builds a context rooted at `work_dir`, opening the execution log.
    pub fn new(
        work_dir: PathBuf,
        execution_mode: ExecutionMode,
        simulation_period: i64,
        cores: usize,
        interpreter: String,
        log_path: &Path,
    ) -> Result<RunContext> {
        let log = RunLog::open(log_path)?;
        Ok(RunContext {
            work_dir,
            execution_mode,
            simulation_period,
            cores,
            interpreter,
            log,
        })
    }

    /// Directory holding one numbered subdirectory per scenario.
    pub fn sweep_dir(&self) -> PathBuf {
        self.work_dir.join("SWEEP")
    }

    /// Shared read-only input directory.
    pub fn input_csv_dir(&self) -> PathBuf {
        self.work_dir.join("input_csv")
    }

    /// Shell command that runs the simulator to completion inside a
    /// scenario directory, writing the population time series to `out.csv`.
    pub fn simulator_command(&self) -> String {
        match self.execution_mode {
            ExecutionMode::Serial => format!(
                "{} run.py input_csv source_data {} simsetting.csv > out.csv",
                self.interpreter, self.simulation_period
            ),
            ExecutionMode::Parallel => format!(
                "mpirun -np {} {} run_par.py input_csv source_data {} simsetting.csv > out.csv",
                self.cores, self.interpreter, self.simulation_period
            ),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
