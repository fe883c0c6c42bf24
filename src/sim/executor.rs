//! Scenario execution back-ends.
//!
//! A generation's scenarios are handed to a [`ScenarioExecutor`] as one
//! batch. Two interchangeable strategies exist, selected once per run:
//!
//! - [`DirectExecutor`]: spawns one subprocess at a time and waits
//!   synchronously; a non-zero exit aborts the whole run immediately.
//! - [`PilotJobExecutor`]: launches the whole batch concurrently and blocks
//!   until every job finishes, then verifies each scenario's completion
//!   marker. Per-job exit codes are not inspected; the marker is the
//!   documented completion signal.
//!
//! Neither strategy retries: a failed scenario means an operator needs to
//! diagnose, not a silently shrunken population.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::debug;

use crate::error::{CampOptError, Result};

/// File name of the generated per-scenario run script.
pub const JOB_SCRIPT_NAME: &str = "flee_exec_cmd.sh";

/// Marker file a scenario touches as its very last step.
pub const DONE_MARKER: &str = "DONE";

/// One schedulable unit: a scenario directory plus its run script.
#[derive(Debug, Clone)]
pub struct ScenarioJob {
    /// Job name, derived from the scenario directory number.
    pub name: String,
    /// Executable wrapper script.
    pub script: PathBuf,
    /// Scenario directory the script runs in.
    pub workdir: PathBuf,
}

impl ScenarioJob {
    /// Builds the job for a materialized scenario directory.
    pub fn for_workdir(workdir: PathBuf) -> ScenarioJob {
        let name = workdir
            .file_name()
            .map(|n| format!("SWEEP_{}", n.to_string_lossy()))
            .unwrap_or_else(|| "SWEEP_unknown".into());
        ScenarioJob {
            name,
            script: workdir.join(JOB_SCRIPT_NAME),
            workdir,
        }
    }
}

/// Runs a batch of scenario jobs to completion.
///
/// The search loop is written against this capability only; whether jobs
/// run one at a time or concurrently is the implementation's business.
pub trait ScenarioExecutor {
    /// Blocks until every job in the batch has completed, or fails fatally.
    fn submit_and_wait(&self, jobs: &[ScenarioJob]) -> Result<()>;
}

/// Writes the executable wrapper script for one scenario.
///
/// The script changes into the scenario directory, runs the simulator
/// command, and touches the completion marker as its final step. `set -e`
/// makes a failing command terminate the script with that command's
/// status, so the marker only ever exists for a successful run and the
/// script's exit code is the simulator's.
pub fn write_job_script(workdir: &Path, command: &str) -> Result<PathBuf> {
    let path = workdir.join(JOB_SCRIPT_NAME);
    let body = format!(
        "#!/bin/bash\n\
         set -e\n\n\
         cd {}\n\n\
         # running simulation\n\
         {}\n\n\
         touch {}\n",
        workdir.display(),
        command,
        DONE_MARKER
    );
    fs::write(&path, body)?;
    make_executable(&path)?;
    Ok(path)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Sequential subprocess back-end.
///
/// Jobs run strictly one at a time. Captured stdio is written next to the
/// script; any non-zero exit status is fatal for the whole run.
#[derive(Debug, Default)]
pub struct DirectExecutor;

impl ScenarioExecutor for DirectExecutor {
    fn submit_and_wait(&self, jobs: &[ScenarioJob]) -> Result<()> {
        for job in jobs {
            debug!("running {} via {}", job.name, job.script.display());
            let output = Command::new("bash")
                .arg("-l")
                .arg(&job.script)
                .current_dir(&job.workdir)
                .output()?;
            fs::write(
                job.workdir.join(format!("{}.stdout", job.name)),
                &output.stdout,
            )?;
            fs::write(
                job.workdir.join(format!("{}.stderr", job.name)),
                &output.stderr,
            )?;
            if !output.status.success() {
                return Err(CampOptError::SimulationFailed {
                    script: job.script.clone(),
                    code: output.status.code(),
                });
            }
        }
        Ok(())
    }
}

/// Batch back-end in the style of a pilot-job manager.
///
/// The whole generation is launched at once and the call blocks on the full
/// batch; a straggler delays scoring of the entire generation. Exit codes
/// are not inspected per job. Instead, after the batch wait, every scenario
/// must have produced its [`DONE_MARKER`] or the run aborts.
#[derive(Debug)]
pub struct PilotJobExecutor {
    /// Exact core count declared per job.
    pub cores: usize,
}

impl PilotJobExecutor {
    fn spawn(&self, job: &ScenarioJob) -> Result<Child> {
        debug!(
            "submitting {} ({} cores) via {}",
            job.name,
            self.cores,
            job.script.display()
        );
        let stdout = File::create(job.workdir.join(format!("{}.stdout", job.name)))?;
        let stderr = File::create(job.workdir.join(format!("{}.stderr", job.name)))?;
        Ok(Command::new("bash")
            .arg("-l")
            .arg(&job.script)
            .current_dir(&job.workdir)
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()?)
    }
}

impl ScenarioExecutor for PilotJobExecutor {
    fn submit_and_wait(&self, jobs: &[ScenarioJob]) -> Result<()> {
        let mut children = Vec::with_capacity(jobs.len());
        for job in jobs {
            match self.spawn(job) {
                Ok(child) => children.push(child),
                Err(err) => {
                    // Already-launched scenarios must not outlive the batch.
                    for child in &mut children {
                        let _ = child.wait();
                    }
                    return Err(err);
                }
            }
        }

        // Block on the whole batch before looking at any completion state.
        for child in &mut children {
            child.wait()?;
        }

        for job in jobs {
            if !job.workdir.join(DONE_MARKER).exists() {
                return Err(CampOptError::JobIncomplete {
                    name: job.name.clone(),
                    workdir: job.workdir.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Prunes a completed scenario directory down to what scoring and audit
/// need, bounding disk usage across generations.
///
/// Keeps the population time series, the rewired route table, raw agent
/// trajectories, the location table, the run script, captured stdio, and
/// the completion marker. The staged `source_data` tree is removed
/// wholesale.
pub fn prune_workdir(workdir: &Path) -> Result<()> {
    prune_tree(workdir)?;
    let source_data = workdir.join("source_data");
    if source_data.exists() {
        fs::remove_dir_all(&source_data)?;
    }
    Ok(())
}

fn prune_tree(dir: &Path) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            prune_tree(&path)?;
        } else if !keep_after_run(&entry.file_name().to_string_lossy()) {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

fn keep_after_run(name: &str) -> bool {
    matches!(
        name,
        "out.csv" | "routes.csv" | "locations.csv" | "selectedCamps.csv" | JOB_SCRIPT_NAME
            | DONE_MARKER
    ) || name.starts_with("agents.out")
        || name.ends_with(".stdout")
        || name.ends_with(".stderr")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn script_job(dir: &Path, number: u32, command: &str) -> ScenarioJob {
        let workdir = dir.join(format!("SWEEP/{number}"));
        fs::create_dir_all(&workdir).unwrap();
        write_job_script(&workdir, command).unwrap();
        ScenarioJob::for_workdir(workdir)
    }

    #[test]
    fn test_job_script_is_executable_and_touches_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let job = script_job(tmp.path(), 1, "true");
        DirectExecutor.submit_and_wait(&[job.clone()]).unwrap();
        assert!(job.workdir.join(DONE_MARKER).exists());
        assert!(job.workdir.join("SWEEP_1.stdout").exists());
    }

    #[test]
    fn test_direct_mode_nonzero_exit_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let ok = script_job(tmp.path(), 1, "true");
        let bad = script_job(tmp.path(), 2, "exit 1");
        let later = script_job(tmp.path(), 3, "true");

        let err = DirectExecutor
            .submit_and_wait(&[ok.clone(), bad, later.clone()])
            .unwrap_err();
        assert!(matches!(
            err,
            CampOptError::SimulationFailed { code: Some(1), .. }
        ));
        // The failing job stops the batch: earlier jobs ran, later did not.
        assert!(ok.workdir.join(DONE_MARKER).exists());
        assert!(!later.workdir.join(DONE_MARKER).exists());
    }

    #[test]
    fn test_pilot_mode_runs_whole_batch() {
        let tmp = tempfile::tempdir().unwrap();
        let jobs = vec![
            script_job(tmp.path(), 1, "echo one"),
            script_job(tmp.path(), 2, "echo two"),
        ];
        PilotJobExecutor { cores: 1 }.submit_and_wait(&jobs).unwrap();
        for job in &jobs {
            assert!(job.workdir.join(DONE_MARKER).exists());
        }
        let first =
            fs::read_to_string(jobs[0].workdir.join("SWEEP_1.stdout")).unwrap();
        let second =
            fs::read_to_string(jobs[1].workdir.join("SWEEP_2.stdout")).unwrap();
        assert!(first.contains("one"));
        assert!(second.contains("two"));
    }

    #[test]
    fn test_pilot_mode_missing_marker_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        // Hand-written script that never touches the marker, standing in
        // for a simulation that died without tripping the batch wait.
        let workdir = tmp.path().join("SWEEP/1");
        fs::create_dir_all(&workdir).unwrap();
        let script = workdir.join(JOB_SCRIPT_NAME);
        fs::write(&script, "#!/bin/bash\nexit 3\n").unwrap();
        super::make_executable(&script).unwrap();
        let job = ScenarioJob::for_workdir(workdir);

        let err = PilotJobExecutor { cores: 1 }
            .submit_and_wait(&[job])
            .unwrap_err();
        assert!(matches!(err, CampOptError::JobIncomplete { .. }));
    }

    #[test]
    fn test_failing_command_exits_nonzero_and_leaves_no_marker() {
        let tmp = tempfile::tempdir().unwrap();
        // `false` fails mid-script; the marker step must never run and the
        // script must surface the command's status.
        let job = script_job(tmp.path(), 1, "false");
        let err = DirectExecutor.submit_and_wait(&[job.clone()]).unwrap_err();
        assert!(matches!(
            err,
            CampOptError::SimulationFailed { code: Some(1), .. }
        ));
        assert!(!job.workdir.join(DONE_MARKER).exists());
    }

    #[test]
    fn test_pilot_mode_failing_command_leaves_no_marker() {
        let tmp = tempfile::tempdir().unwrap();
        let job = script_job(tmp.path(), 1, "exit 7");
        let err = PilotJobExecutor { cores: 1 }
            .submit_and_wait(&[job.clone()])
            .unwrap_err();
        assert!(matches!(err, CampOptError::JobIncomplete { .. }));
        assert!(!job.workdir.join(DONE_MARKER).exists());
    }

    #[test]
    fn test_pilot_spawn_failure_waits_for_started_jobs() {
        let tmp = tempfile::tempdir().unwrap();
        let ok = script_job(tmp.path(), 1, "echo one");
        // A job whose directory never existed fails at stdio creation.
        let missing = ScenarioJob::for_workdir(tmp.path().join("SWEEP/404"));

        let err = PilotJobExecutor { cores: 1 }
            .submit_and_wait(&[ok.clone(), missing])
            .unwrap_err();
        assert!(matches!(err, CampOptError::Io(_)));
        // The first job was reaped before the error surfaced.
        assert!(ok.workdir.join(DONE_MARKER).exists());
    }

    #[test]
    fn test_prune_keeps_only_scoring_and_audit_files() {
        let tmp = tempfile::tempdir().unwrap();
        let workdir = tmp.path().join("SWEEP/1");
        fs::create_dir_all(workdir.join("input_csv")).unwrap();
        fs::create_dir_all(workdir.join("source_data")).unwrap();
        for name in [
            "out.csv",
            "agents.out.0",
            "agents.out.1",
            "SWEEP_1.stdout",
            "SWEEP_1.stderr",
            "run.py",
            "simsetting.csv",
            DONE_MARKER,
            JOB_SCRIPT_NAME,
        ] {
            fs::write(workdir.join(name), "x").unwrap();
        }
        fs::write(workdir.join("input_csv/routes.csv"), "x").unwrap();
        fs::write(workdir.join("input_csv/locations.csv"), "x").unwrap();
        fs::write(workdir.join("input_csv/closures.csv"), "x").unwrap();
        fs::write(workdir.join("source_data/refugees.csv"), "x").unwrap();

        prune_workdir(&workdir).unwrap();

        assert!(workdir.join("out.csv").exists());
        assert!(workdir.join("agents.out.0").exists());
        assert!(workdir.join("agents.out.1").exists());
        assert!(workdir.join("SWEEP_1.stdout").exists());
        assert!(workdir.join(DONE_MARKER).exists());
        assert!(workdir.join(JOB_SCRIPT_NAME).exists());
        assert!(workdir.join("input_csv/routes.csv").exists());
        assert!(workdir.join("input_csv/locations.csv").exists());

        assert!(!workdir.join("run.py").exists());
        assert!(!workdir.join("simsetting.csv").exists());
        assert!(!workdir.join("input_csv/closures.csv").exists());
        assert!(!workdir.join("source_data").exists());
    }
}
