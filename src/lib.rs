use error_set::error_set;
use std::path::Path;
use std::process::Command;

pub mod changeset;
pub mod checker;

pub use changeset::ChangedLines;
pub use checker::{Checker, Grammar};

error_set! {
    /// Top-level error for difflint operations
    DiffLintError := GitCommandError || CheckerError

    /// Errors from git diff invocation
    GitCommandError := {
        #[display("Failed to run git diff: {message}")]
        DiffFailed { message: String },
        #[display("git diff {range} failed: {stderr}")]
        DiffExitError { range: String, stderr: String },
        #[display("Invalid UTF-8 in git diff output: {message}")]
        InvalidUtf8 { message: String },
    }

    /// Errors from launching an external checker
    CheckerError := {
        #[display("Failed to launch {name} ({binary}): {message}")]
        LaunchFailed { name: String, binary: String, message: String },
        #[display("Invalid UTF-8 in {name} output: {message}")]
        InvalidOutput { name: String, message: String },
    }
}

/// Main interface for difflint operations
pub struct DiffLint<'a> {
    repo_root: &'a Path,
}

impl<'a> DiffLint<'a> {
    /// Create a new DiffLint for the given repository root
    pub fn new(repo_root: &'a Path) -> Self {
        Self { repo_root }
    }

    /// Build the changed-line mapping for a revision pair.
    ///
    /// Diffs `base` against `target`, or against the working tree when no
    /// target is given, and collects the changed lines of files whose
    /// extension is tracked.
    ///
    /// # Examples
    /// ```no_run
    /// # use difflint::DiffLint;
    /// # use std::path::Path;
    /// let lint = DiffLint::new(Path::new("."));
    /// let changed = lint.changed_lines("develop", Some("feature"), &["js"]).unwrap();
    /// let changed = lint.changed_lines("HEAD~3", None, &["js"]).unwrap();
    /// ```
    pub fn changed_lines<S: AsRef<str>>(
        &self,
        base: &str,
        target: Option<&str>,
        tracked_extensions: &[S],
    ) -> Result<ChangedLines, GitCommandError> {
        let diff = self.get_raw_diff(base, target)?;
        Ok(ChangedLines::from_diff(&diff, tracked_extensions))
    }

    /// Run one checker and reduce its output to the changed lines.
    ///
    /// The mapping is only read; a failure to launch the checker is fatal
    /// for this checker alone and leaves the mapping reusable for others.
    pub fn check(
        &self,
        checker: &Checker,
        changed: &ChangedLines,
        verbose_rules: bool,
    ) -> Result<String, CheckerError> {
        let output = checker.run(self.repo_root, verbose_rules)?;
        Ok(checker.reduce(&output, changed))
    }

    /// Get raw zero-context diff output for the revision pair
    fn get_raw_diff(&self, base: &str, target: Option<&str>) -> Result<String, GitCommandError> {
        let mut command = Command::new("git");
        command
            .arg("-C")
            .arg(self.repo_root)
            .args(["diff", "--no-ext-diff", "-U0", "--no-color"])
            .arg(base);
        if let Some(target) = target {
            command.arg(target);
        }

        let output = command
            .output()
            .map_err(|e| GitCommandError::DiffFailed {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let range = match target {
                Some(target) => format!("{base} {target}"),
                None => base.to_string(),
            };
            return Err(GitCommandError::DiffExitError {
                range,
                stderr: stderr.into_owned(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| GitCommandError::InvalidUtf8 {
            message: e.to_string(),
        })
    }
}
