//! End-to-end pipeline tests.
//!
//! Drive the full optimizer against a bash stand-in for the migration
//! simulator: the configuration file, reference tables, and shared inputs
//! are laid out in a temporary working directory exactly as an operator
//! would prepare them.

use std::fs;
use std::io::Write;
use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use campopt::moo::config::{MooSettings, SETTINGS_FILE};
use campopt::moo::MooProblem;
use campopt::sim::encoder::{CampLocationTable, RouteDistanceTable};
use campopt::sim::executor::{DirectExecutor, PilotJobExecutor, ScenarioExecutor};
use campopt::{CampOptError, CampPlacementProblem, ExecutionMode, RunContext};

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = fs::File::create(path).unwrap();
    f.write_all(contents.as_bytes()).unwrap();
}

/// Lays out a complete working directory with three candidate locations
/// and a simulator stand-in that emits a fixed population series.
fn seed_work_dir(dir: &Path) {
    write_file(
        &dir.join("camp_locations_refined.csv"),
        "name,lon,lat\nc0,30.1,7.5\nc1,31.2,8.0\nc2,32.3,8.5\n",
    );
    write_file(
        &dir.join("camp_routes_refined.csv"),
        "name,lon,lat,Juba,Bor\n\
         c0,30.1,7.5,5000,2000\n\
         c1,31.2,8.0,1000,8000\n\
         c2,32.3,8.5,6000,3000\n",
    );
    write_file(
        &dir.join("input_csv/routes.csv"),
        "#name1,name2,distance,forced_redirection\n\
         Juba,Bor,190,0\n\
         Bor,Z,999,0\n",
    );
    write_file(
        &dir.join("input_csv/locations.csv"),
        "#name,region,country,lat,lon,location_type,conflict_date,population\n\
         Juba,x,y,4.8,31.6,town,0,500\n\
         Z,x,y,8.0,31.2,camp,0,4000\n",
    );
    write_file(
        &dir.join("run.py"),
        "#!/bin/bash\n\
         echo 'Day,Juba sim,Z sim'\n\
         echo '0,5,10'\n\
         echo '1,6,30'\n\
         printf '%s\\n' \
         '#time,agent location,distance_moved_this_timestep,distance_travelled' \
         '0,Z,6.0,10.0' '1,Z,20.0,20.0' > agents.out.1\n",
    );
    write_file(&dir.join("simsetting.csv"), "");
    write_file(
        &dir.join(SETTINGS_FILE),
        "alg_name: NSGA2\n\
         sampling_func: int_random\n\
         crossover_func: int_sbx\n\
         crossover_func_args:\n\
         \x20 int_sbx:\n\
         \x20   prob: 0.9\n\
         \x20   eta: 15\n\
         mutation_func: int_pm\n\
         mutation_func_args:\n\
         \x20 int_pm:\n\
         \x20   eta: 20\n\
         ref_dir_func:\n\
         \x20 das-dennis:\n\
         \x20   n_partitions: 12\n\
         alg_specific_args:\n\
         \x20 NSGA2:\n\
         \x20   pop_size: 4\n\
         termination:\n\
         \x20 n_gen: 2\n",
    );
}

fn build_problem(dir: &Path, executor: Box<dyn ScenarioExecutor>) -> CampPlacementProblem {
    let ctx = RunContext::new(
        dir.to_path_buf(),
        ExecutionMode::Serial,
        10,
        1,
        "bash".into(),
        &dir.join("log_MOO.txt"),
    )
    .unwrap();
    let camps = CampLocationTable::load(&dir.join("camp_locations_refined.csv")).unwrap();
    let routes = RouteDistanceTable::load(&dir.join("camp_routes_refined.csv")).unwrap();
    CampPlacementProblem::new(ctx, executor, camps, routes)
}

#[test]
fn full_run_produces_population_and_audit_files() {
    let tmp = tempfile::tempdir().unwrap();
    seed_work_dir(tmp.path());

    let settings = MooSettings::load(&tmp.path().join(SETTINGS_FILE)).unwrap();
    let (algorithm, termination) = settings
        .build_algorithm(CampPlacementProblem::N_OBJ)
        .unwrap();
    let mut problem = build_problem(tmp.path(), Box::new(DirectExecutor));
    let mut rng = StdRng::seed_from_u64(7);

    let result = algorithm
        .minimize(&mut problem, termination, &mut rng)
        .unwrap();
    assert_eq!(result.generations, 2);
    assert!(!result.x.is_empty());

    // Two generations of four candidates each, numbered without reuse.
    for n in 1..=8 {
        let dir = tmp.path().join(format!("SWEEP/{n}"));
        assert!(dir.join("out.csv").exists(), "missing SWEEP/{n}/out.csv");
        assert!(dir.join("df_agents.out.csv").exists());
        assert!(!dir.join("run.py").exists(), "SWEEP/{n} was not pruned");
        assert!(!dir.join("source_data").exists());
    }
    assert!(!tmp.path().join("SWEEP/9").exists());

    // The objectives table holds the last generation only.
    let objectives = fs::read_to_string(tmp.path().join("objectives.csv")).unwrap();
    let lines: Vec<&str> = objectives.lines().collect();
    assert_eq!(lines[0], "Objective #1,Objective #2,Objective #3");
    assert_eq!(lines.len(), 5);
    // Natural sign on disk: the population objective is positive.
    assert!(lines[1].starts_with("15,30,"));

    let path = problem.write_population_csv(&result).unwrap();
    let population = fs::read_to_string(path).unwrap();
    let rows: Vec<&str> = population.lines().collect();
    assert_eq!(rows[0], "lon,lat,obj_1,obj_2,obj_3");
    assert_eq!(rows.len(), result.x.len() + 1);
    for row in &rows[1..] {
        let fields: Vec<&str> = row.split(',').collect();
        // Coordinates come from the candidate table, objectives are
        // de-negated back to their natural sign.
        assert!(["30.1", "31.2", "32.3"].contains(&fields[0]), "{row}");
        assert_eq!(fields[3], "30");
    }

    let log = fs::read_to_string(tmp.path().join("log_MOO.txt")).unwrap();
    assert!(log.contains("evaluating generation of 4 candidates"));
    assert!(log.contains("materialized scenario 8"));
}

#[test]
fn pilot_job_batch_leaves_completion_markers() {
    let tmp = tempfile::tempdir().unwrap();
    seed_work_dir(tmp.path());

    let mut problem = build_problem(tmp.path(), Box::new(PilotJobExecutor { cores: 1 }));
    let rows = problem.evaluate(&[vec![0.0], vec![2.0]]).unwrap();
    assert_eq!(rows.len(), 2);
    assert!(tmp.path().join("SWEEP/1/DONE").exists());
    assert!(tmp.path().join("SWEEP/2/DONE").exists());
    assert!(tmp.path().join("SWEEP/1/SWEEP_1.stdout").exists());
}

#[test]
fn simulator_failure_aborts_the_search() {
    let tmp = tempfile::tempdir().unwrap();
    seed_work_dir(tmp.path());
    write_file(&tmp.path().join("run.py"), "#!/bin/bash\nexit 2\n");

    let settings = MooSettings::load(&tmp.path().join(SETTINGS_FILE)).unwrap();
    let (algorithm, termination) = settings
        .build_algorithm(CampPlacementProblem::N_OBJ)
        .unwrap();
    let mut problem = build_problem(tmp.path(), Box::new(DirectExecutor));
    let mut rng = StdRng::seed_from_u64(7);

    let err = algorithm
        .minimize(&mut problem, termination, &mut rng)
        .unwrap_err();
    assert!(matches!(
        err,
        CampOptError::SimulationFailed { code: Some(2), .. }
    ));
    // The first scenario was materialized before the batch died.
    assert!(tmp.path().join("SWEEP/1").exists());
}

#[test]
fn mid_generation_scoring_failure_leaves_partial_objectives() {
    let tmp = tempfile::tempdir().unwrap();
    seed_work_dir(tmp.path());
    // A simulator that only produces trajectory files in the first
    // scenario directory: scenario 2 completes but cannot be scored.
    write_file(
        &tmp.path().join("run.py"),
        "#!/bin/bash\n\
         echo 'Day,Juba sim,Z sim'\n\
         echo '0,5,10'\n\
         echo '1,6,30'\n\
         if [ \"$(basename \"$PWD\")\" = \"1\" ]; then\n\
         printf '%s\\n' \
         '#time,agent location,distance_moved_this_timestep,distance_travelled' \
         '0,Z,6.0,10.0' '1,Z,20.0,20.0' > agents.out.1\n\
         fi\n",
    );

    let mut problem = build_problem(tmp.path(), Box::new(DirectExecutor));
    let err = problem.evaluate(&[vec![0.0], vec![1.0]]).unwrap_err();
    assert!(matches!(err, CampOptError::Scoring { .. }));

    // The table is left behind with rows only for what was scored before
    // the failure.
    let objectives = fs::read_to_string(tmp.path().join("objectives.csv")).unwrap();
    let lines: Vec<&str> = objectives.lines().collect();
    assert_eq!(lines[0], "Objective #1,Objective #2,Objective #3");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("15,30,"));
}

#[test]
fn invalid_settings_fail_before_any_scenario_exists() {
    let tmp = tempfile::tempdir().unwrap();
    seed_work_dir(tmp.path());
    let raw = fs::read_to_string(tmp.path().join(SETTINGS_FILE)).unwrap();
    write_file(
        &tmp.path().join(SETTINGS_FILE),
        &raw.replace("alg_name: NSGA2", "alg_name: NSGA5")
            .replace("NSGA2:", "NSGA5:"),
    );

    let settings = MooSettings::load(&tmp.path().join(SETTINGS_FILE)).unwrap();
    let err = settings
        .build_algorithm(CampPlacementProblem::N_OBJ)
        .unwrap_err();
    assert!(matches!(err, CampOptError::Config(_)));
    assert!(!tmp.path().join("SWEEP").exists());
}
