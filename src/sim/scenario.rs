//! Scenario materialization.
//!
//! The materializer turns one decoded [`Candidate`] into a self-contained,
//! numbered scenario directory under `SWEEP/`: a copy of the shared route
//! table with the virtual-camp row rewired to the candidate's nearest
//! location, plus a staged copy of every other static input the simulator
//! needs.
//!
//! Directory numbers increase strictly across the whole run and are never
//! reused, so an objective row can always be traced back to the directory
//! that produced it. Writing into an already-existing numbered directory is
//! refused outright: it would mean double-counting a candidate.

use std::fs;
use std::path::{Path, PathBuf};

use crate::context::RunContext;
use crate::error::{CampOptError, Result};
use crate::sim::encoder::Candidate;
use crate::sim::{column_index, NEW_CAMP_MARKER};

/// File and directory names staged into every scenario directory.
const STAGED_INPUTS: [&str; 5] = [
    "input_csv",
    "source_data",
    "run.py",
    "run_par.py",
    "simsetting.csv",
];

/// Allocates numbered scenario directories and populates them.
///
/// Holds the run-wide directory counter. The driver is single-threaded, so
/// no locking is needed; a parallel reimplementation must serialize the
/// counter increment to preserve the no-reuse invariant.
#[derive(Debug, Default)]
pub struct Materializer {
    counter: usize,
}

impl Materializer {
    /// A materializer whose next scenario directory is `SWEEP/1`.
    pub fn new() -> Materializer {
        Materializer { counter: 0 }
    }

    /// Number of scenario directories allocated so far in this run.
    pub fn allocated(&self) -> usize {
        self.counter
    }

    /// Creates the next numbered scenario directory for `candidate`.
    ///
    /// Writes the rewired route table into `<dir>/input_csv/routes.csv`,
    /// stages the remaining static inputs, and returns the scenario
    /// directory path.
    pub fn materialize(
        &mut self,
        ctx: &mut RunContext,
        candidate: &Candidate,
    ) -> Result<PathBuf> {
        let number = self.counter + 1;
        let scenario_dir = ctx.sweep_dir().join(number.to_string());
        let input_dir = scenario_dir.join("input_csv");
        if input_dir.exists() {
            return Err(CampOptError::WorkdirCollision(input_dir));
        }
        fs::create_dir_all(&input_dir)?;

        rewire_route_table(
            &ctx.input_csv_dir().join("routes.csv"),
            &input_dir.join("routes.csv"),
            candidate,
        )?;
        stage_static_inputs(&ctx.work_dir, &scenario_dir)?;

        self.counter = number;
        ctx.log.append(format!(
            "materialized scenario {number}: camp ({}, {}) connected to {} over {} km",
            candidate.lon, candidate.lat, candidate.nearest_location, candidate.connection_km
        ))?;
        Ok(scenario_dir)
    }
}

/// Copies the shared route table, rewriting the single row whose
/// destination is the virtual new camp: its origin becomes the candidate's
/// nearest location and its distance the candidate's connection distance.
fn rewire_route_table(src: &Path, dst: &Path, candidate: &Candidate) -> Result<()> {
    let mut reader = csv::Reader::from_path(src)?;
    let headers = reader.headers()?.clone();
    let origin_col = column_index(&headers, "#name1", src)?;
    let destination_col = column_index(&headers, "name2", src)?;
    let distance_col = column_index(&headers, "distance", src)?;

    let mut writer = csv::Writer::from_path(dst)?;
    writer.write_record(&headers)?;
    for record in reader.records() {
        let record = record?;
        if record.get(destination_col) == Some(NEW_CAMP_MARKER) {
            let mut fields: Vec<String> =
                record.iter().map(|f| f.to_string()).collect();
            fields[origin_col] = candidate.nearest_location.clone();
            fields[distance_col] = candidate.connection_km.to_string();
            writer.write_record(&fields)?;
        } else {
            writer.write_record(&record)?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Writes the per-generation candidate summary consumed by audit tooling:
/// one row per candidate with coordinates, nearest location, and distance.
pub fn write_selected_camps(ctx: &RunContext, candidates: &[Candidate]) -> Result<PathBuf> {
    let path = ctx.input_csv_dir().join("selectedCamps.csv");
    let mut writer = csv::Writer::from_path(&path)?;
    writer.write_record([
        "camp longitude",
        "camp latitude",
        "nearest location",
        "distance",
    ])?;
    for c in candidates {
        writer.write_record([
            c.lon.to_string(),
            c.lat.to_string(),
            c.nearest_location.clone(),
            c.connection_km.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(path)
}

/// Stages the static inputs a simulation needs into `scenario_dir`.
///
/// Selective copy: only the entries in [`STAGED_INPUTS`] are considered,
/// existing files are never overwritten (the rewired route table must
/// survive), and `SWEEP` subtrees are never descended into.
fn stage_static_inputs(work_dir: &Path, scenario_dir: &Path) -> Result<()> {
    for name in STAGED_INPUTS {
        let src = work_dir.join(name);
        if !src.exists() {
            continue;
        }
        copy_ignore_existing(&src, &scenario_dir.join(name))?;
    }
    Ok(())
}

fn copy_ignore_existing(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        fs::create_dir_all(dst)?;
        for entry in fs::read_dir(src)? {
            let entry = entry?;
            if entry.file_name() == "SWEEP" {
                continue;
            }
            copy_ignore_existing(&entry.path(), &dst.join(entry.file_name()))?;
        }
    } else if !dst.exists() {
        fs::copy(src, dst)?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
