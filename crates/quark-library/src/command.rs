//! The command channel: single lines, batches and input files.
//!
//! Lines ending in `&` are spliced with the line that follows before
//! dispatch. Batches stop at the first failing command; the failure is
//! captured and the remaining lines are not executed.

use std::path::Path;

use quark_engine::input;

use crate::instance::Instance;

/// Concatenate `lines` into one newline-delimited text, appending a
/// newline to any entry that lacks one.
pub fn join_lines<S: AsRef<str>>(lines: &[S]) -> String {
    let capacity = lines.iter().map(|l| l.as_ref().len() + 1).sum();
    let mut text = String::with_capacity(capacity);
    for line in lines {
        let line = line.as_ref();
        text.push_str(line);
        if !line.ends_with('\n') {
            text.push('\n');
        }
    }
    text
}

impl Instance {
    /// Execute every command in the input script at `path`.
    pub fn run_file(&mut self, path: impl AsRef<Path>) {
        let result = self.engine.execute_file(path.as_ref());
        self.capture(result);
    }

    /// Execute one command and return its name.
    ///
    /// Returns `None` for a blank or comment-only line, and for a command
    /// that failed (the failure is captured).
    pub fn run_one(&mut self, line: &str) -> Option<String> {
        let result = self.engine.execute(line);
        self.capture(result).flatten()
    }

    /// Execute a list of commands as one batch.
    pub fn run_batch<S: AsRef<str>>(&mut self, lines: &[S]) {
        self.run_text(&join_lines(lines));
    }

    /// Execute newline-delimited commands as one batch. Blank lines are
    /// skipped.
    pub fn run_text(&mut self, text: &str) {
        let spliced = input::splice(text);
        let result = spliced
            .lines()
            .filter(|line| !line.trim().is_empty())
            .try_for_each(|line| self.engine.execute(line).map(drop));
        self.capture(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_adds_missing_newlines_only() {
        assert_eq!(join_lines(&["a", "b\n", "c"]), "a\nb\nc\n");
        assert_eq!(join_lines::<&str>(&[]), "");
    }

    #[test]
    fn join_keeps_continuations_adjacent() {
        let text = join_lines(&["variable a equal &", "1+2"]);
        assert_eq!(input::splice(&text), "variable a equal   1+2\n");
    }
}
