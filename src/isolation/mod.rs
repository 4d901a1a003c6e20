//! Process-per-module isolation.
//!
//! Each module path is a test binary built with `minitest::module_main!()`. The runner spawns it with the protocol
//! switched on, rebuilds its [`ModuleResult`] from the event stream, and reaps the process before starting the
//! next one. Whatever the module leaves behind (statics, threads, leaked memory) goes away with its process.

pub mod protocol;

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, instrument, warn};

use crate::engine::config::{PROTOCOL_ENV, RunnerConfig};
use crate::engine::error::LoadFault;
use crate::engine::reporter::Reporter;
use crate::engine::results::{ModuleResult, RunTotals};
use protocol::{Marker, StreamDecoder};

/// Kills and reaps the child on every exit path.
struct ChildGuard {
    child: Child,
}

impl ChildGuard {
    fn wait(&mut self) -> Option<ExitStatus> {
        self.child.wait().ok()
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Display name of a module: the binary's file stem.
pub fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Path to hand to `Command::new`. A bare file name would be looked up on `PATH`, so it is anchored to the
/// working directory the same way [`Path::exists`] sees it.
fn launch_path(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if parent.as_os_str().is_empty() => Path::new(".").join(path),
        _ => path.to_path_buf(),
    }
}

/// Run one module binary in its own process.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn run_isolated(path: &Path, config: &RunnerConfig, reporter: &mut dyn Reporter) -> Result<ModuleResult, LoadFault> {
    if !path.exists() {
        return Err(LoadFault::Missing {
            path: path.to_path_buf(),
        });
    }

    let launch = |source| LoadFault::Launch {
        path: path.to_path_buf(),
        source,
    };
    let marker = Marker::generate();
    let mut child = Command::new(launch_path(path))
        .envs(config.to_env())
        .env(PROTOCOL_ENV, marker.token())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(launch)?;
    debug!(pid = child.id(), "spawned module");

    let stdout = child.stdout.take();
    let mut guard = ChildGuard { child };
    let Some(stdout) = stdout else {
        return Err(LoadFault::Handshake {
            path: path.to_path_buf(),
        });
    };

    let name = module_name(path);
    let mut decoder = StreamDecoder::new(marker, name.clone());
    for line in BufReader::new(stdout).lines() {
        let line = line.map_err(launch)?;
        decoder
            .feed(&line, reporter)
            .map_err(|source| LoadFault::Protocol {
                path: path.to_path_buf(),
                source,
            })?;
    }

    let status = guard.wait();
    debug!(?status, "module exited");
    if !decoder.started() {
        return Err(LoadFault::Handshake {
            path: path.to_path_buf(),
        });
    }
    decoder.finish(reporter).ok_or_else(|| LoadFault::aborted(name, status))
}

/// Run every module in order, each in its own process. A module that fails to load is reported and skipped;
/// the remaining modules still run.
pub fn run_modules(paths: &[PathBuf], config: &RunnerConfig, reporter: &mut dyn Reporter) -> RunTotals {
    let mut totals = RunTotals::default();
    for path in paths {
        match run_isolated(path, config, reporter) {
            Ok(result) => totals.record(&result),
            Err(fault) => {
                warn!(path = %path.display(), "{fault}");
                reporter.on_load_fault(&module_name(path), &fault);
                totals.record_load_fault();
            }
        }
    }
    reporter.on_run_complete(&totals);
    totals
}
