//! Change-set extraction from zero-context unified diffs.
//!
//! This module turns the text of a `git diff -U0` invocation into a
//! [`ChangedLines`] mapping of file path to the set of target-revision line
//! numbers that the diff touched, restricted to a list of tracked file
//! extensions.
//!
//! # Examples
//!
//! ```
//! use difflint::ChangedLines;
//!
//! let diff = "\
//! +++ b/app.js
//! @@ -10,2 +10,4 @@
//! ";
//!
//! let changed = ChangedLines::from_diff(diff, &["js"]);
//! assert!(changed.contains("app.js", 10));
//! assert!(changed.contains("app.js", 13));
//! assert!(!changed.contains("app.js", 14));
//! assert!(!changed.contains("readme.md", 10));
//! ```

use std::collections::{BTreeSet, HashMap};

static EMPTY_SET: BTreeSet<u32> = BTreeSet::new();

/// Per-file sets of changed line numbers in the target revision.
///
/// Built once from a single diff text and read-only afterwards. Line numbers
/// are 1-based and live in the target revision's coordinate space. Files
/// whose extension is not tracked never acquire an entry, and looking up an
/// absent file yields an empty set rather than an error.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangedLines {
    files: HashMap<String, BTreeSet<u32>>,
}

impl ChangedLines {
    /// Scan a unified diff and collect the changed lines of tracked files.
    ///
    /// The scan is a single pass holding one piece of state, the file the
    /// hunks currently belong to:
    ///
    /// - `+++ <path>` introduces a file section. The target-side `b/` prefix
    ///   is stripped and the extension after the last `.` decides whether
    ///   the following hunks are tracked. `+++ /dev/null` (deleted file)
    ///   has no `b/` prefix and is therefore never tracked.
    /// - `@@ -a[,b] +c[,d] @@` describes one hunk. The target-side range
    ///   `+start[,count]` (omitted count meaning 1) contributes the `count`
    ///   line numbers starting at `start`; a count of zero is a pure
    ///   deletion and contributes nothing.
    /// - Every other line, including headers that fail to parse, is skipped.
    ///
    /// Extraction is a pure function of the diff text.
    pub fn from_diff<S: AsRef<str>>(diff: &str, tracked_extensions: &[S]) -> Self {
        let mut files: HashMap<String, BTreeSet<u32>> = HashMap::new();
        let mut current_file: Option<String> = None;

        for line in diff.lines() {
            if let Some(rest) = line.strip_prefix("+++ ") {
                current_file = tracked_target_path(rest, tracked_extensions);
            } else if line.starts_with("@@ ") {
                let Some(file) = current_file.as_ref() else {
                    continue;
                };
                let Some((start, count)) = parse_hunk_header(line) else {
                    continue;
                };
                if count > 0 {
                    files
                        .entry(file.clone())
                        .or_default()
                        .extend(start..start.saturating_add(count));
                }
            }
        }

        ChangedLines { files }
    }

    /// Whether `line` of `file` was changed in the target revision.
    #[must_use]
    pub fn contains(&self, file: &str, line: u32) -> bool {
        self.files.get(file).is_some_and(|lines| lines.contains(&line))
    }

    /// The changed lines of `file`, empty for untracked or absent files.
    #[must_use]
    pub fn lines(&self, file: &str) -> &BTreeSet<u32> {
        self.files.get(file).unwrap_or(&EMPTY_SET)
    }

    /// Tracked files that have at least one changed line.
    pub fn files(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// True when no tracked file changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Extract the tracked target path from the remainder of a `+++ ` line.
///
/// Returns `None` for untracked extensions, extension-less paths, and
/// targets without the `b/` prefix such as `/dev/null`.
fn tracked_target_path<S: AsRef<str>>(rest: &str, tracked_extensions: &[S]) -> Option<String> {
    // Git may append a tab and metadata after the path.
    let path = rest.split_whitespace().next()?;
    let path = path.strip_prefix("b/")?;
    let (_, extension) = path.rsplit_once('.')?;

    tracked_extensions
        .iter()
        .any(|tracked| tracked.as_ref() == extension)
        .then(|| path.to_string())
}

/// Parse the target-side range of a hunk header into `(start, count)`.
///
/// Accepts `@@ -a,b +c,d @@ context` as well as the short forms without a
/// count. Returns `None` for anything that does not match that shape.
fn parse_hunk_header(line: &str) -> Option<(u32, u32)> {
    let ranges = line.strip_prefix("@@ ")?;
    let ranges = &ranges[..ranges.find(" @@")?];

    let target = ranges
        .split(' ')
        .find_map(|token| token.strip_prefix('+'))?;

    match target.split_once(',') {
        Some((start, count)) => Some((start.parse().ok()?, count.parse().ok()?)),
        None => Some((target.parse().ok()?, 1)),
    }
}
