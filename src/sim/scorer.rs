//! Objective scoring.
//!
//! Converts one completed scenario directory into the three objective
//! values the search minimizes:
//!
//! 1. mean distance travelled by agents that arrived at the camp,
//! 2. camp population on the final simulated day (a maximization target,
//!    negated before it reaches the optimizer),
//! 3. mean absolute gap between scaled camp capacity and the simulated
//!    population across all days.
//!
//! Missing data is fatal. A silently zero-filled objective would bias the
//! search without any signal, so the run aborts instead.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::context::RunLog;
use crate::error::{CampOptError, Result};
use crate::sim::column_index;

/// Declared camp capacities in the location table are scaled down by this
/// factor to match the simulated agent counts.
pub const POPULATION_SCALEDOWN_FACTOR: f64 = 100.0;

/// Per-generation objectives table, written next to the shared inputs.
pub const OBJECTIVES_FILE: &str = "objectives.csv";

const OBJECTIVES_HEADER: [&str; 3] = ["Objective #1", "Objective #2", "Objective #3"];

/// Raw (non-negated) objective values for one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveRecord {
    /// Mean distance travelled by agents that reached the camp (minimize).
    pub avg_distance: f64,
    /// Simulated camp population on the final day (maximize).
    pub camp_population: f64,
    /// Mean absolute capacity gap over all simulated days (minimize).
    pub capacity_gap: f64,
}

impl ObjectiveRecord {
    /// Minimize-oriented row handed to the optimizer: the population
    /// objective is negated, the others pass through.
    pub fn minimized(&self) -> [f64; 3] {
        [self.avg_distance, -self.camp_population, self.capacity_gap]
    }
}

/// Scores one completed scenario directory.
///
/// Consumes the raw per-process trajectory files: the qualifying rows are
/// written to `df_agents.out.csv` for audit and the raw files are deleted
/// to bound disk usage.
pub fn score_scenario(
    workdir: &Path,
    camp_name: &str,
    log: &mut RunLog,
) -> Result<ObjectiveRecord> {
    log.append(format!(
        "scoring scenario {} for camp {camp_name}",
        workdir.display()
    ))?;

    let series = read_population_series(&workdir.join("out.csv"), camp_name)?;
    let camp_population = *series.last().ok_or_else(|| scoring_err(
        workdir,
        "population time series is empty",
    ))?;
    log.append(format!(
        "  camp {camp_name} population on final day = {camp_population}"
    ))?;

    let trajectory_files = find_trajectory_files(workdir)?;
    if trajectory_files.is_empty() {
        return Err(scoring_err(workdir, "no agent trajectory files found"));
    }
    let avg_distance = average_arrival_distance(workdir, &trajectory_files, camp_name)?;
    log.append(format!(
        "  avg distance travelled to camp {camp_name} = {avg_distance}"
    ))?;
    for file in &trajectory_files {
        fs::remove_file(file)?;
    }

    let capacity =
        camp_capacity(&workdir.join("input_csv").join("locations.csv"), camp_name)?;
    let capacity_gap = series
        .iter()
        .map(|p| (capacity - p).abs())
        .sum::<f64>()
        / series.len() as f64;
    log.append(format!(
        "  scaled capacity = {capacity}, mean capacity gap = {capacity_gap}"
    ))?;

    Ok(ObjectiveRecord {
        avg_distance,
        camp_population,
        capacity_gap,
    })
}

/// Reads the `<camp> sim` column of the population time series.
fn read_population_series(path: &Path, camp_name: &str) -> Result<Vec<f64>> {
    let mut reader = csv::Reader::from_path(path)?;
    let column = format!("{camp_name} sim");
    let col = column_index(reader.headers()?, &column, path).map_err(|_| {
        scoring_err(
            path.parent().unwrap_or(path),
            &format!("column '{column}' missing from {}", path.display()),
        )
    })?;
    let mut series = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw = record.get(col).unwrap_or("");
        let value = raw.trim().parse::<f64>().map_err(|_| {
            scoring_err(
                path.parent().unwrap_or(path),
                &format!("cell '{raw}' in column '{column}' is not a number"),
            )
        })?;
        series.push(value);
    }
    Ok(series)
}

/// Raw per-process trajectory files (`agents.out.*`), in deterministic
/// order.
fn find_trajectory_files(workdir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(workdir)? {
        let entry = entry?;
        let name = entry.file_name();
        if name.to_string_lossy().starts_with("agents.out.") {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Concatenates the trajectory files, keeps rows where the agent sits at
/// the camp and moved this timestep, writes the kept rows to
/// `df_agents.out.csv`, and returns the mean of their total distance
/// travelled.
fn average_arrival_distance(
    workdir: &Path,
    files: &[PathBuf],
    camp_name: &str,
) -> Result<f64> {
    let mut writer = csv::Writer::from_path(workdir.join("df_agents.out.csv"))?;
    let mut wrote_header = false;
    let mut sum = 0.0;
    let mut count = 0usize;

    for file in files {
        let mut reader = csv::Reader::from_path(file)?;
        let headers = reader.headers()?.clone();
        let location_col = column_index(&headers, "agent location", file)?;
        let moved_col = column_index(&headers, "distance_moved_this_timestep", file)?;
        let travelled_col = column_index(&headers, "distance_travelled", file)?;
        if !wrote_header {
            writer.write_record(&headers)?;
            wrote_header = true;
        }

        for record in reader.records() {
            let record = record?;
            if record.get(location_col) != Some(camp_name) {
                continue;
            }
            let moved: f64 = parse_field(&record, moved_col, file)?;
            if moved <= 0.0 {
                continue;
            }
            sum += parse_field::<f64>(&record, travelled_col, file)?;
            count += 1;
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;

    if count == 0 {
        return Err(scoring_err(
            workdir,
            &format!("no agent recorded positive movement at camp {camp_name}"),
        ));
    }
    Ok(sum / count as f64)
}

/// Scaled capacity of the camp, from the static location table.
fn camp_capacity(locations: &Path, camp_name: &str) -> Result<f64> {
    let mut reader = csv::Reader::from_path(locations)?;
    let headers = reader.headers()?.clone();
    let name_col = column_index(&headers, "#name", locations)?;
    let population_col = column_index(&headers, "population", locations)?;

    for record in reader.records() {
        let record = record?;
        if record.get(name_col) == Some(camp_name) {
            let declared: f64 = parse_field(&record, population_col, locations)?;
            return Ok(declared / POPULATION_SCALEDOWN_FACTOR);
        }
    }
    Err(scoring_err(
        locations.parent().unwrap_or(locations),
        &format!("camp '{camp_name}' not present in {}", locations.display()),
    ))
}

/// Creates the per-generation objectives table holding only the header.
pub fn init_objectives_table(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(OBJECTIVES_HEADER)?;
    writer.flush()?;
    Ok(())
}

/// Appends one scored row to the objectives table.
pub fn append_objective(path: &Path, record: &ObjectiveRecord) -> Result<()> {
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record([
        record.avg_distance.to_string(),
        record.camp_population.to_string(),
        record.capacity_gap.to_string(),
    ])?;
    writer.flush()?;
    Ok(())
}

fn parse_field<T: std::str::FromStr>(
    record: &csv::StringRecord,
    col: usize,
    path: &Path,
) -> Result<T> {
    let raw = record.get(col).unwrap_or("");
    raw.trim().parse::<T>().map_err(|_| {
        scoring_err(
            path.parent().unwrap_or(path),
            &format!("cell '{raw}' in {} is not a number", path.display()),
        )
    })
}

fn scoring_err(workdir: &Path, reason: &str) -> CampOptError {
    CampOptError::Scoring {
        workdir: workdir.to_path_buf(),
        reason: reason.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
