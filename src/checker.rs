//! External checker invocation and output reduction.
//!
//! A [`Checker`] describes one static-analysis tool: how to launch it and
//! which output grammar it speaks. Reduction filters the tool's raw output
//! down to the entries whose reported lines intersect a [`ChangedLines`]
//! mapping, then renders a report section with a trailing count line.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

use crate::CheckerError;
use crate::changeset::ChangedLines;

/// One issue per physical line: `<file>: line <N>, col <M>, <description>`
#[allow(clippy::expect_used)]
static LINE_ISSUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+): line (\d+), col \d+, .+$").expect("invalid issue regex"));

/// Block header naming the offending file: `<message> at ./<file> :`
#[allow(clippy::expect_used)]
static BLOCK_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^.* \./(.+) :$").expect("invalid block header regex"));

/// Block body line starting with a numeric gutter: `    12 |<source>`
#[allow(clippy::expect_used)]
static BLOCK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*(\d+)[ \t]*\|").expect("invalid gutter regex"));

/// The output grammar a checker speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    /// One issue per line, tagged with file and line number.
    LineTagged,
    /// Issues grouped into blank-line-delimited blocks, each headed by a
    /// file name and containing one or more line-number references.
    Block,
}

/// Descriptor for one external static-analysis tool.
#[derive(Debug, Clone)]
pub struct Checker {
    name: &'static str,
    binary: String,
    rules_flag: &'static str,
    grammar: Grammar,
    count_label: &'static str,
}

impl Checker {
    /// JSHint: line-tagged output, one finding per line.
    #[must_use]
    pub fn jshint() -> Self {
        Self {
            name: "JSHint",
            binary: "node_modules/.bin/jshint".to_string(),
            rules_flag: "--verbose",
            grammar: Grammar::LineTagged,
            count_label: "errors",
        }
    }

    /// JSCS: block output, one finding per blank-line-delimited block.
    #[must_use]
    pub fn jscs() -> Self {
        Self {
            name: "JSCS",
            binary: "node_modules/.bin/jscs".to_string(),
            rules_flag: "--verbose",
            grammar: Grammar::Block,
            count_label: "code style errors found.",
        }
    }

    /// A checker for a tool not known ahead of time.
    #[must_use]
    pub fn new(
        name: &'static str,
        binary: impl Into<String>,
        rules_flag: &'static str,
        grammar: Grammar,
        count_label: &'static str,
    ) -> Self {
        Self {
            name,
            binary: binary.into(),
            rules_flag,
            grammar,
            count_label,
        }
    }

    /// Override the executable path, e.g. from a CLI flag.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Display name of the underlying tool.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Launch the tool against `project_root` and capture its output.
    ///
    /// A non-zero exit status means the tool found issues, not that the
    /// invocation failed; the captured output is returned either way. Only
    /// a launch failure (missing executable) or undecodable stdout is an
    /// error.
    pub fn run(&self, project_root: &Path, verbose_rules: bool) -> Result<String, CheckerError> {
        let program = if self.binary.contains('/') {
            project_root.join(&self.binary)
        } else {
            // Bare names resolve through PATH.
            PathBuf::from(&self.binary)
        };

        let mut command = Command::new(program);
        command.current_dir(project_root);
        if verbose_rules {
            command.arg(self.rules_flag);
        }
        command.arg(".");

        let output = command
            .output()
            .map_err(|e| CheckerError::LaunchFailed {
                name: self.name.to_string(),
                binary: self.binary.clone(),
                message: e.to_string(),
            })?;

        let mut text =
            String::from_utf8(output.stdout).map_err(|e| CheckerError::InvalidOutput {
                name: self.name.to_string(),
                message: e.to_string(),
            })?;
        if !output.stderr.is_empty() {
            text.push_str(&String::from_utf8_lossy(&output.stderr));
        }

        Ok(text)
    }

    /// Reduce raw tool output to the entries intersecting `changed` and
    /// render the report section.
    ///
    /// Entries that do not match the grammar are dropped silently.
    #[must_use]
    pub fn reduce(&self, output: &str, changed: &ChangedLines) -> String {
        let kept = match self.grammar {
            Grammar::LineTagged => reduce_line_tagged(output, changed),
            Grammar::Block => reduce_block(output, changed),
        };
        self.render(&kept)
    }

    /// Render retained entries as a titled section ending in a count line.
    fn render(&self, kept: &[String]) -> String {
        let separator = match self.grammar {
            Grammar::LineTagged => "\n",
            Grammar::Block => "\n\n",
        };

        let title = format!("{} output:", self.name);
        let mut section = format!("{title}\n{}\n", "=".repeat(title.len()));
        if !kept.is_empty() {
            section.push_str(&kept.join(separator));
            section.push('\n');
        }
        section.push('\n');
        section.push_str(&format!("{} {}", kept.len(), self.count_label));
        section
    }
}

/// Keep output lines whose `(file, line)` tag is in the change set.
fn reduce_line_tagged(output: &str, changed: &ChangedLines) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let captures = LINE_ISSUE.captures(line)?;
            let file = captures.get(1)?.as_str();
            let line_no: u32 = captures.get(2)?.as_str().parse().ok()?;
            changed.contains(file, line_no).then(|| line.to_string())
        })
        .collect()
}

/// Keep blocks where any referenced line of the named file is in the
/// change set.
fn reduce_block(output: &str, changed: &ChangedLines) -> Vec<String> {
    output
        .split("\n\n")
        .filter_map(|block| {
            let file = BLOCK_FILE.captures(block)?.get(1)?.as_str();
            let hit = BLOCK_LINE
                .captures_iter(block)
                .filter_map(|captures| captures.get(1)?.as_str().parse::<u32>().ok())
                .any(|line_no| changed.contains(file, line_no));
            hit.then(|| block.trim_matches('\n').to_string())
        })
        .collect()
}
