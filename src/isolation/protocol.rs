//! Parent/child event protocol.
//!
//! A module process running under the runner prints one event per line on stdout. Each event line starts with a
//! [`Marker`] carrying a token the runner generated for that process, followed by a JSON object. The child writes
//! a newline before every event, so output a test left unterminated ends before the event instead of swallowing
//! it. Everything else on stdout is ordinary output from test code and is passed through untouched.

use std::io::Write;

use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::engine::discovery::DiscoveryWarning;
use crate::engine::error::{LoadFault, ProtocolError};
use crate::engine::reporter::Reporter;
use crate::engine::results::{ClassResult, ModuleResult, TestCaseResult};

/// Common start of every marker.
pub const MARKER_PREFIX: &str = "##minitest";

/// Line marker of one module process: `##minitest:<token> `.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    token: String,
    text: String,
}

impl Marker {
    pub fn new(token: impl Into<String>) -> Self {
        let token = token.into();
        let text = format!("{MARKER_PREFIX}:{token} ");
        Self { token, text }
    }

    /// A marker with a fresh random token.
    pub fn generate() -> Self {
        Self::new(Uuid::new_v4().simple().to_string())
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Render an event as one protocol line, without line breaks.
    pub fn encode(&self, event: &Event) -> Result<String, serde_json::Error> {
        Ok(format!("{}{}", self.text, serde_json::to_string(event)?))
    }

    /// Split a stdout line into the test output in front of the marker and the event after it. A line without
    /// the marker is all output.
    pub fn split<'l>(&self, line: &'l str) -> (&'l str, Option<Result<Event, ProtocolError>>) {
        let line = line.trim_end_matches(['\r', '\n']);
        match line.find(&self.text) {
            None => (line, None),
            Some(at) => {
                let payload = &line[at + self.text.len()..];
                (&line[..at], Some(serde_json::from_str(payload).map_err(ProtocolError::from)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    ModuleStart {
        module: String,
    },
    DiscoveryWarning {
        warning: DiscoveryWarning,
    },
    ClassStart {
        class: String,
        description: Option<String>,
    },
    CaseComplete {
        class: String,
        result: TestCaseResult,
    },
    FixtureWarning {
        class: String,
        case: String,
        message: String,
    },
    ClassComplete {
        class: String,
    },
    ModuleComplete {
        module: String,
        total: usize,
    },
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::ModuleStart { .. } => "module_start",
            Event::DiscoveryWarning { .. } => "discovery_warning",
            Event::ClassStart { .. } => "class_start",
            Event::CaseComplete { .. } => "case_complete",
            Event::FixtureWarning { .. } => "fixture_warning",
            Event::ClassComplete { .. } => "class_complete",
            Event::ModuleComplete { .. } => "module_complete",
        }
    }
}

// ============================================================================
// Child side
// ============================================================================

/// Reporter used inside a module process: writes every event as a protocol line.
///
/// Each event goes out in a single `write_all`, so with `io::Stdout` the stdout lock is held per event and never
/// across test code.
pub struct ProtocolReporter<W: Write> {
    out: W,
    marker: Marker,
}

impl<W: Write> ProtocolReporter<W> {
    pub fn new(out: W, marker: Marker) -> Self {
        Self { out, marker }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, event: Event) {
        let written = self
            .marker
            .encode(&event)
            .map_err(std::io::Error::other)
            .and_then(|line| self.out.write_all(format!("\n{line}\n").as_bytes()))
            .and_then(|()| self.out.flush());
        if let Err(err) = written {
            error!(event = event.kind(), "failed to write protocol event: {err}");
        }
    }
}

impl<W: Write> Reporter for ProtocolReporter<W> {
    fn on_module_start(&mut self, module: &str) {
        self.emit(Event::ModuleStart {
            module: module.to_string(),
        });
    }

    fn on_discovery_warning(&mut self, warning: &DiscoveryWarning) {
        self.emit(Event::DiscoveryWarning {
            warning: warning.clone(),
        });
    }

    fn on_class_start(&mut self, class: &str, description: Option<&str>) {
        self.emit(Event::ClassStart {
            class: class.to_string(),
            description: description.map(str::to_string),
        });
    }

    fn on_case_complete(&mut self, class: &str, result: &TestCaseResult) {
        self.emit(Event::CaseComplete {
            class: class.to_string(),
            result: result.clone(),
        });
    }

    fn on_fixture_warning(&mut self, class: &str, case: &str, message: &str) {
        self.emit(Event::FixtureWarning {
            class: class.to_string(),
            case: case.to_string(),
            message: message.to_string(),
        });
    }

    fn on_class_complete(&mut self, result: &ClassResult) {
        self.emit(Event::ClassComplete {
            class: result.name.clone(),
        });
    }

    fn on_module_complete(&mut self, result: &ModuleResult) {
        self.emit(Event::ModuleComplete {
            module: result.name.clone(),
            total: result.total(),
        });
    }

    fn on_load_fault(&mut self, module: &str, fault: &LoadFault) {
        // Not representable on the wire; the parent sees the missing module_start instead.
        error!(module, "{fault}");
    }
}

// ============================================================================
// Parent side
// ============================================================================

/// Rebuilds a [`ModuleResult`] from a child's event stream and forwards each event to the parent's reporter.
#[derive(Debug, Default)]
pub struct ResultAssembler {
    module: Option<ModuleResult>,
    class: Option<ClassResult>,
    finished: Option<ModuleResult>,
}

impl ResultAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the child announced its module.
    pub fn started(&self) -> bool {
        self.module.is_some() || self.finished.is_some()
    }

    pub fn apply(&mut self, event: Event, reporter: &mut dyn Reporter) -> Result<(), ProtocolError> {
        let kind = event.kind();
        let out_of_order = |reason: &str| ProtocolError::OutOfOrder {
            event: kind,
            reason: reason.to_string(),
        };

        match event {
            Event::ModuleStart { module } => {
                if self.started() {
                    return Err(out_of_order("module already started"));
                }
                reporter.on_module_start(&module);
                self.module = Some(ModuleResult::new(module));
            }
            Event::DiscoveryWarning { warning } => {
                if self.module.is_none() {
                    return Err(out_of_order("no module in progress"));
                }
                reporter.on_discovery_warning(&warning);
            }
            Event::ClassStart { class, description } => {
                if self.module.is_none() || self.class.is_some() {
                    return Err(out_of_order("a class may only start inside a module, one at a time"));
                }
                reporter.on_class_start(&class, description.as_deref());
                self.class = Some(ClassResult::new(class, description));
            }
            Event::CaseComplete { class, result } => {
                let current = self
                    .class
                    .as_mut()
                    .filter(|c| c.name == class)
                    .ok_or_else(|| out_of_order("case does not belong to the running class"))?;
                reporter.on_case_complete(&class, &result);
                current.push(result);
            }
            Event::FixtureWarning { class, case, message } => {
                if self.class.as_ref().is_none_or(|c| c.name != class) {
                    return Err(out_of_order("warning does not belong to the running class"));
                }
                reporter.on_fixture_warning(&class, &case, &message);
            }
            Event::ClassComplete { class } => {
                let finished = self
                    .class
                    .take()
                    .filter(|c| c.name == class)
                    .ok_or_else(|| out_of_order("class was never started"))?;
                reporter.on_class_complete(&finished);
                if let Some(module) = self.module.as_mut() {
                    module.classes.push(finished);
                }
            }
            Event::ModuleComplete { module, total } => {
                if self.class.is_some() {
                    return Err(out_of_order("a class is still running"));
                }
                let result = self
                    .module
                    .take()
                    .filter(|m| m.name == module)
                    .ok_or_else(|| out_of_order("module was never started"))?;
                if result.total() != total {
                    return Err(out_of_order(&format!(
                        "module reported {total} cases, received {}",
                        result.total()
                    )));
                }
                reporter.on_module_complete(&result);
                self.finished = Some(result);
            }
        }
        Ok(())
    }

    /// The completed module, if the stream reached `module_complete`.
    pub fn finish(self) -> Option<ModuleResult> {
        self.finished
    }
}

/// Routes a child's stdout: event lines go to a [`ResultAssembler`], everything else reaches the reporter as
/// module output.
#[derive(Debug)]
pub struct StreamDecoder {
    marker: Marker,
    module: String,
    assembler: ResultAssembler,
    // A blank line is held back until the next line shows whether it was the break written before an event.
    held_blank: bool,
}

impl StreamDecoder {
    pub fn new(marker: Marker, module: impl Into<String>) -> Self {
        Self {
            marker,
            module: module.into(),
            assembler: ResultAssembler::new(),
            held_blank: false,
        }
    }

    pub fn feed(&mut self, line: &str, reporter: &mut dyn Reporter) -> Result<(), ProtocolError> {
        let (output, event) = self.marker.split(line);
        match event {
            None => {
                self.release_blank(reporter);
                if output.is_empty() {
                    self.held_blank = true;
                } else {
                    reporter.on_module_output(&self.module, output);
                }
                Ok(())
            }
            Some(event) => {
                self.held_blank = false;
                if !output.is_empty() {
                    reporter.on_module_output(&self.module, output);
                }
                self.assembler.apply(event?, reporter)
            }
        }
    }

    pub fn started(&self) -> bool {
        self.assembler.started()
    }

    /// End of stream: the completed module, if the child got that far.
    pub fn finish(mut self, reporter: &mut dyn Reporter) -> Option<ModuleResult> {
        self.release_blank(reporter);
        self.assembler.finish()
    }

    fn release_blank(&mut self, reporter: &mut dyn Reporter) {
        if std::mem::take(&mut self.held_blank) {
            reporter.on_module_output(&self.module, "");
        }
    }
}
