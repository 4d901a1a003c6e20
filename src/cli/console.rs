//! Console and JSON reporters.

use std::io::{self, Write};

use miette::{GraphicalReportHandler, GraphicalTheme};
use serde::Serialize;

use crate::engine::discovery::DiscoveryWarning;
use crate::engine::error::LoadFault;
use crate::engine::reporter::Reporter;
use crate::engine::results::{ClassResult, ModuleResult, RunTotals, TestCaseResult};
use crate::version::MINITEST_VERSION;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

// Module paths can be long; keep them on one line.
const DIAGNOSTIC_WIDTH: usize = 1000;

/// Human-readable report: one line per case, a summary per class and module, and a final banner.
pub struct ConsoleReporter<W: Write> {
    out: W,
    verbose: bool,
    color: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(verbose: bool, color: bool) -> Self {
        Self::new(io::stdout(), verbose, color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, verbose: bool, color: bool) -> Self {
        Self { out, verbose, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, color: &str, text: impl std::fmt::Display) -> String {
        if self.color {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn counts(&self, passed: usize, failed: usize, total: usize) -> String {
        let mut parts = vec![self.paint(GREEN, format!("{passed} passed"))];
        if failed > 0 {
            parts.push(self.paint(RED, format!("{failed} failed")));
        }
        parts.push(format!("{total} total"));
        parts.join(", ")
    }

    // Console output is best effort; a closed pipe must not abort the run.
    fn line(&mut self, text: impl std::fmt::Display) {
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn on_module_start(&mut self, module: &str) {
        let header = self.paint(BOLD, format!("Running {module}"));
        self.line(header);
    }

    fn on_discovery_warning(&mut self, warning: &DiscoveryWarning) {
        let label = self.paint(YELLOW, "warning:");
        self.line(format!("  {label} {warning}"));
    }

    fn on_class_start(&mut self, class: &str, description: Option<&str>) {
        self.line("");
        let title = self.paint(BOLD, class);
        match description {
            Some(description) => self.line(format!("{title} - {description}")),
            None => self.line(title),
        }
    }

    fn on_case_complete(&mut self, _class: &str, result: &TestCaseResult) {
        let status = if result.passed {
            self.paint(GREEN, "PASSED")
        } else {
            self.paint(RED, "FAILED")
        };
        let name = match &result.description {
            Some(description) => format!("{} - {description}", result.name),
            None => result.name.clone(),
        };
        let millis = self.paint(DIM, format!("({:.2}ms)", result.duration.as_secs_f64() * 1000.0));
        self.line(format!("  {status} {name} {millis}"));

        if let Some(message) = &result.failure_message {
            let message = self.paint(RED, message);
            self.line(format!("         {message}"));
        }
    }

    fn on_fixture_warning(&mut self, _class: &str, _case: &str, message: &str) {
        let label = self.paint(YELLOW, "warning:");
        self.line(format!("         {label} {message}"));
    }

    fn on_class_complete(&mut self, result: &ClassResult) {
        let counts = self.counts(result.passed(), result.failed(), result.total());
        self.line(format!("  {}: {counts}", result.name));
    }

    fn on_module_complete(&mut self, result: &ModuleResult) {
        let counts = self.counts(result.passed(), result.failed(), result.total());
        self.line("");
        self.line(format!("{}: {counts}", self.paint(BOLD, &result.name)));
        self.line("");
    }

    fn on_load_fault(&mut self, module: &str, fault: &LoadFault) {
        let theme = if self.color {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::unicode_nocolor()
        };
        let mut rendered = String::new();
        let label = self.paint(RED, "error:");
        if GraphicalReportHandler::new_themed(theme)
            .with_width(DIAGNOSTIC_WIDTH)
            .render_report(&mut rendered, fault)
            .is_ok()
        {
            self.line(format!("{label} could not run {module}"));
            self.line(rendered.trim_end());
        } else {
            self.line(format!("{label} {fault}"));
        }
        self.line("");
    }

    fn on_module_output(&mut self, module: &str, line: &str) {
        if self.verbose {
            let prefix = self.paint(DIM, format!("[{module}]"));
            self.line(format!("  {prefix} {line}"));
        }
    }

    fn on_run_complete(&mut self, totals: &RunTotals) {
        let mut parts = vec![self.paint(GREEN, format!("{} passed", totals.passed))];
        if totals.failed > 0 {
            parts.push(self.paint(RED, format!("{} failed", totals.failed)));
        }
        parts.push(format!("{} total", totals.total));
        if totals.load_faults > 0 {
            parts.push(self.paint(RED, format!("{} module(s) failed to load", totals.load_faults)));
        }
        let banner = format!("====== {} ======", parts.join(", "));
        self.line(banner);
        let _ = self.out.flush();
    }
}

// ============================================================================
// JSON report
// ============================================================================

#[derive(Debug, Serialize)]
struct LoadFaultRecord {
    module: String,
    message: String,
    code: Option<String>,
}

#[derive(Debug, Serialize)]
struct RunReport<'a> {
    version: &'static str,
    modules: &'a [ModuleResult],
    load_faults: &'a [LoadFaultRecord],
    totals: &'a RunTotals,
}

/// Collects module results and prints a single JSON document when the run completes.
pub struct JsonReporter<W: Write> {
    out: W,
    modules: Vec<ModuleResult>,
    load_faults: Vec<LoadFaultRecord>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            modules: Vec::new(),
            load_faults: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for JsonReporter<W> {
    fn on_case_complete(&mut self, _class: &str, _result: &TestCaseResult) {}

    fn on_module_complete(&mut self, result: &ModuleResult) {
        self.modules.push(result.clone());
    }

    fn on_load_fault(&mut self, module: &str, fault: &LoadFault) {
        use miette::Diagnostic;

        self.load_faults.push(LoadFaultRecord {
            module: module.to_string(),
            message: fault.to_string(),
            code: fault.code().map(|c| c.to_string()),
        });
    }

    fn on_run_complete(&mut self, totals: &RunTotals) {
        let report = RunReport {
            version: MINITEST_VERSION,
            modules: &self.modules,
            load_faults: &self.load_faults,
            totals,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(json) => {
                let _ = writeln!(self.out, "{json}");
                let _ = self.out.flush();
            }
            Err(err) => tracing::error!("failed to serialize run report: {err}"),
        }
    }
}
