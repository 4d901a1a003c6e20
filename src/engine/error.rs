//! Module-level failures.
//!
//! A [`LoadFault`] aborts one module and never the run: the driver reports it and moves on to the next module.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum LoadFault {
    #[error("test module `{}` does not exist", path.display())]
    #[diagnostic(code(minitest::load::missing), help("check the path; modules are built test binaries"))]
    Missing { path: PathBuf },

    #[error("failed to launch test module `{}`", path.display())]
    #[diagnostic(
        code(minitest::load::launch),
        help("the path must be an executable built with `minitest::module_main!()`")
    )]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("`{}` did not speak the minitest protocol", path.display())]
    #[diagnostic(
        code(minitest::load::handshake),
        help("the binary exited without announcing a module; is it a minitest module?")
    )]
    Handshake { path: PathBuf },

    #[error("malformed event from `{}`", path.display())]
    #[diagnostic(code(minitest::load::protocol))]
    Protocol {
        path: PathBuf,
        #[source]
        source: ProtocolError,
    },

    #[error("test module `{name}` aborted before completing ({status})")]
    #[diagnostic(
        code(minitest::load::aborted),
        help("the module process crashed or exited early; rerun it directly to see its output")
    )]
    Aborted { name: String, status: String },

    #[error("could not load registry of `{name}`: {reason}")]
    #[diagnostic(code(minitest::load::registry))]
    Registry { name: String, reason: String },
}

impl LoadFault {
    pub fn aborted(name: impl Into<String>, status: Option<ExitStatus>) -> Self {
        let status = match status {
            Some(status) => status.to_string(),
            None => "no exit status".to_string(),
        };
        LoadFault::Aborted {
            name: name.into(),
            status,
        }
    }
}

/// A line that carried the protocol marker but could not be decoded.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid event payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("event `{event}` arrived out of order: {reason}")]
    OutOfOrder { event: &'static str, reason: String },
}
