//! The camp-placement evaluation problem.
//!
//! Bridges the optimizer and the simulation pipeline: one generation of
//! candidate indices becomes one batch of materialized scenario
//! directories, one executor submission, and one pass of scoring in
//! allocation order. The optimizer sees only minimize-oriented objective
//! rows; everything on disk (objectives table, selected-camps summary,
//! pruned scenario directories) is an audit artifact.

use std::path::PathBuf;

use crate::context::RunContext;
use crate::error::Result;
use crate::moo::types::{MooProblem, MooResult};
use crate::sim::encoder::{encode, Candidate, CampLocationTable, RouteDistanceTable};
use crate::sim::executor::{
    prune_workdir, write_job_script, ScenarioExecutor, ScenarioJob,
};
use crate::sim::scenario::{write_selected_camps, Materializer};
use crate::sim::scorer::{
    append_objective, init_objectives_table, score_scenario, OBJECTIVES_FILE,
};
use crate::sim::CAMP_NAME;

/// Output file holding the final non-dominated set.
pub const POPULATION_FILE: &str = "population.csv";

/// Where a new refugee camp should be placed, evaluated by simulation.
///
/// `n_var` is 1 (the candidate index) and `n_obj` is 3. Each call to
/// [`MooProblem::evaluate`] costs one full simulation per candidate.
pub struct CampPlacementProblem {
    ctx: RunContext,
    executor: Box<dyn ScenarioExecutor>,
    camps: CampLocationTable,
    routes: RouteDistanceTable,
    materializer: Materializer,
}

impl CampPlacementProblem {
    /// Number of objectives produced per scenario.
    pub const N_OBJ: usize = 3;

    pub fn new(
        ctx: RunContext,
        executor: Box<dyn ScenarioExecutor>,
        camps: CampLocationTable,
        routes: RouteDistanceTable,
    ) -> CampPlacementProblem {
        CampPlacementProblem {
            ctx,
            executor,
            camps,
            routes,
            materializer: Materializer::new(),
        }
    }

    /// Writes the final non-dominated set to `population.csv`: candidate
    /// coordinates plus the three objective values with the population
    /// objective de-negated back to its natural sign.
    pub fn write_population_csv(&mut self, result: &MooResult) -> Result<PathBuf> {
        let path = self.ctx.work_dir.join(POPULATION_FILE);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(["lon", "lat", "obj_1", "obj_2", "obj_3"])?;
        for (genes, objectives) in result.x.iter().zip(&result.f) {
            let (lon, lat) = self.camps.coords(gene_to_index(genes[0]));
            writer.write_record([
                lon.to_string(),
                lat.to_string(),
                objectives[0].to_string(),
                (-objectives[1]).to_string(),
                objectives[2].to_string(),
            ])?;
        }
        writer.flush()?;
        self.ctx.log.append(format!(
            "final non-dominated set ({} candidates) written to {}",
            result.x.len(),
            path.display()
        ))?;
        Ok(path)
    }

    fn decode_generation(&self, population: &[Vec<f64>]) -> Vec<Candidate> {
        population
            .iter()
            .map(|genes| encode(gene_to_index(genes[0]), &self.camps, &self.routes))
            .collect()
    }
}

fn gene_to_index(gene: f64) -> usize {
    gene.round().max(0.0) as usize
}

impl MooProblem for CampPlacementProblem {
    fn n_var(&self) -> usize {
        1
    }

    fn n_obj(&self) -> usize {
        Self::N_OBJ
    }

    fn lower_bound(&self) -> f64 {
        0.0
    }

    fn upper_bound(&self) -> f64 {
        self.camps.max_index() as f64
    }

    /// Materializes, runs, prunes, and scores one generation.
    ///
    /// Objective rows come back in population order; the population
    /// objective arrives negated so a smaller value always means better.
    fn evaluate(&mut self, population: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let candidates = self.decode_generation(population);
        self.ctx.log.append(format!(
            "evaluating generation of {} candidates: {:?}",
            candidates.len(),
            candidates.iter().map(|c| c.index).collect::<Vec<_>>()
        ))?;
        write_selected_camps(&self.ctx, &candidates)?;

        let mut jobs = Vec::with_capacity(candidates.len());
        let command = self.ctx.simulator_command();
        for candidate in &candidates {
            let workdir = self.materializer.materialize(&mut self.ctx, candidate)?;
            write_job_script(&workdir, &command)?;
            jobs.push(ScenarioJob::for_workdir(workdir));
        }

        self.executor.submit_and_wait(&jobs)?;

        let objectives_path = self.ctx.work_dir.join(OBJECTIVES_FILE);
        init_objectives_table(&objectives_path)?;
        let mut rows = Vec::with_capacity(jobs.len());
        for job in &jobs {
            prune_workdir(&job.workdir)?;
            let record = score_scenario(&job.workdir, CAMP_NAME, &mut self.ctx.log)?;
            append_objective(&objectives_path, &record)?;
            rows.push(record.minimized().to_vec());
        }
        Ok(rows)
    }
}

// ============================================================================
// Tests
// ============================================================================
