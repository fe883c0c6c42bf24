//! Run configuration.
//!
//! The optimizer is configured through a YAML file in the working
//! directory. Operator and algorithm names form closed sets; anything
//! outside them is rejected before any scenario directory is created.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::Deserialize;

use crate::error::{CampOptError, Result};
use crate::moo::moead::Moead;
use crate::moo::nsga2::Nsga2;
use crate::moo::nsga3::Nsga3;
use crate::moo::operators::{Crossover, Mutation, PmArgs, Sampling, SbxArgs};
use crate::moo::ref_dirs::das_dennis;
use crate::moo::runner::MooAlgorithm;
use crate::moo::types::Termination;

/// Default configuration file name, looked up in the working directory.
pub const SETTINGS_FILE: &str = "MOO_setting.yaml";

/// Arguments of a reference-direction generator.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RefDirArgs {
    pub n_partitions: usize,
}

/// Algorithm-specific arguments, keyed by algorithm name in the file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlgArgs {
    pub pop_size: Option<usize>,
    pub n_neighbors: Option<usize>,
    pub prob_neighbor_mating: Option<f64>,
    pub ref_dir_name: Option<String>,
}

/// The deserialized settings file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MooSettings {
    pub alg_name: String,
    pub sampling_func: String,
    pub crossover_func: String,
    pub crossover_func_args: HashMap<String, SbxArgs>,
    pub mutation_func: String,
    pub mutation_func_args: HashMap<String, PmArgs>,
    #[serde(default)]
    pub ref_dir_func: HashMap<String, RefDirArgs>,
    pub alg_specific_args: HashMap<String, AlgArgs>,
    pub termination: HashMap<String, usize>,
}

impl MooSettings {
    /// Reads the settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(serde_yaml::from_reader(file)?)
    }

    /// Resolves the settings into a concrete algorithm and termination
    /// criterion for an `n_obj`-objective problem.
    pub fn build_algorithm(&self, n_obj: usize) -> Result<(MooAlgorithm, Termination)> {
        let sampling = self.sampling()?;
        let crossover = self.crossover()?;
        let mutation = self.mutation()?;
        let termination = self.termination()?;
        let args = self.alg_specific_args.get(&self.alg_name).ok_or_else(|| {
            CampOptError::Config(format!(
                "alg_specific_args has no entry for '{}'",
                self.alg_name
            ))
        })?;

        let algorithm = match self.alg_name.as_str() {
            "NSGA2" => MooAlgorithm::Nsga2(Nsga2 {
                pop_size: require(args.pop_size, &self.alg_name, "pop_size")?,
                sampling,
                crossover,
                mutation,
            }),
            "NSGA3" => MooAlgorithm::Nsga3(Nsga3 {
                pop_size: require(args.pop_size, &self.alg_name, "pop_size")?,
                ref_dirs: self.ref_dirs(args, n_obj)?,
                sampling,
                crossover,
                mutation,
            }),
            "MOEAD" => MooAlgorithm::Moead(Moead {
                weights: self.ref_dirs(args, n_obj)?,
                n_neighbors: require(args.n_neighbors, &self.alg_name, "n_neighbors")?,
                prob_neighbor_mating: require(
                    args.prob_neighbor_mating,
                    &self.alg_name,
                    "prob_neighbor_mating",
                )?,
                sampling,
                crossover,
                mutation,
            }),
            other => {
                return Err(CampOptError::Config(format!(
                    "alg_name '{other}' is not supported (expected NSGA2, NSGA3 or MOEAD)"
                )))
            }
        };
        Ok((algorithm, termination))
    }

    fn sampling(&self) -> Result<Sampling> {
        match self.sampling_func.as_str() {
            "int_random" => Ok(Sampling::IntRandom),
            other => Err(CampOptError::Config(format!(
                "sampling_func '{other}' is not supported (expected int_random)"
            ))),
        }
    }

    fn crossover(&self) -> Result<Crossover> {
        match self.crossover_func.as_str() {
            "int_sbx" => {
                let args = self.crossover_func_args.get("int_sbx").ok_or_else(|| {
                    CampOptError::Config(
                        "crossover_func_args has no entry for 'int_sbx'".into(),
                    )
                })?;
                Ok(Crossover::IntSbx(*args))
            }
            other => Err(CampOptError::Config(format!(
                "crossover_func '{other}' is not supported (expected int_sbx)"
            ))),
        }
    }

    fn mutation(&self) -> Result<Mutation> {
        match self.mutation_func.as_str() {
            "int_pm" => {
                let args = self.mutation_func_args.get("int_pm").ok_or_else(|| {
                    CampOptError::Config(
                        "mutation_func_args has no entry for 'int_pm'".into(),
                    )
                })?;
                Ok(Mutation::IntPm(*args))
            }
            other => Err(CampOptError::Config(format!(
                "mutation_func '{other}' is not supported (expected int_pm)"
            ))),
        }
    }

    fn ref_dirs(&self, args: &AlgArgs, n_obj: usize) -> Result<Vec<Vec<f64>>> {
        let name = args.ref_dir_name.as_deref().ok_or_else(|| {
            CampOptError::Config(format!(
                "algorithm '{}' requires ref_dir_name",
                self.alg_name
            ))
        })?;
        if name != "das-dennis" {
            return Err(CampOptError::Config(format!(
                "ref_dir_name '{name}' is not supported (expected das-dennis)"
            )));
        }
        let ref_args = self.ref_dir_func.get(name).ok_or_else(|| {
            CampOptError::Config(format!("ref_dir_func has no entry for '{name}'"))
        })?;
        Ok(das_dennis(n_obj, ref_args.n_partitions))
    }

    fn termination(&self) -> Result<Termination> {
        match (self.termination.get("n_gen"), self.termination.len()) {
            (Some(&n_gen), 1) if n_gen > 0 => Ok(Termination::MaxGenerations(n_gen)),
            (Some(_), 1) => Err(CampOptError::Config("n_gen must be positive".into())),
            _ => Err(CampOptError::Config(
                "termination must contain exactly the key 'n_gen'".into(),
            )),
        }
    }
}

fn require<T>(value: Option<T>, alg: &str, field: &str) -> Result<T> {
    value.ok_or_else(|| {
        CampOptError::Config(format!("algorithm '{alg}' requires {field}"))
    })
}

// ============================================================================
// Tests
// ============================================================================
