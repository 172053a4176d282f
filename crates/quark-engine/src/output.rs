//! Console output: screen (tracing events) and an optional log file.
//!
//! Messages and echoed input are emitted by rank 0 only. Warnings are
//! emitted by whichever rank raises them.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use quark_core::{EngineError, EngineResult};

use crate::config::{EngineConfig, Echo};

/// Screen and log-file sink for engine output.
pub struct Console {
    rank: usize,
    screen: bool,
    echo: Echo,
    log: Option<BufWriter<File>>,
}

impl Console {
    /// Set up output for `rank` according to `config`.
    ///
    /// Only rank 0 opens the log file.
    pub fn new(config: &EngineConfig, rank: usize) -> EngineResult<Self> {
        let log = match (&config.log, rank) {
            (Some(path), 0) => Some(open_log(path)?),
            _ => None,
        };
        Ok(Self {
            rank,
            screen: config.screen,
            echo: config.echo,
            log,
        })
    }

    /// Change the echo target.
    pub fn set_echo(&mut self, echo: Echo) {
        self.echo = echo;
    }

    /// Current echo target.
    pub fn echo_target(&self) -> Echo {
        self.echo
    }

    /// Echo one executed input line.
    pub fn echo(&mut self, line: &str) {
        if self.rank != 0 {
            return;
        }
        if self.screen && self.echo.screen() {
            tracing::info!(target: "quark::echo", "{line}");
        }
        if self.echo.log() {
            self.write_log(line);
        }
    }

    /// Informational output (banners, thermo lines, `print`).
    pub fn message(&mut self, text: &str) {
        if self.rank != 0 {
            return;
        }
        if self.screen {
            tracing::info!(target: "quark::screen", "{text}");
        }
        self.write_log(text);
    }

    /// A non-fatal condition.
    pub fn warning(&mut self, text: &str) {
        tracing::warn!(rank = self.rank, "{text}");
        if self.rank == 0 {
            self.write_log(&format!("WARNING: {text}"));
        }
    }

    /// Close the current log file and open `path` instead, or run
    /// without a log for `None`. Only rank 0 opens the file.
    pub fn reopen_log(&mut self, path: Option<&Path>) -> EngineResult<()> {
        if let Some(mut old) = self.log.take() {
            let _ = old.flush();
        }
        if let (Some(path), 0) = (path, self.rank) {
            self.log = Some(open_log(path)?);
        }
        Ok(())
    }

    fn write_log(&mut self, text: &str) {
        if let Some(log) = self.log.as_mut() {
            if writeln!(log, "{text}").and_then(|_| log.flush()).is_err() {
                tracing::warn!("log file write failed; disabling log output");
                self.log = None;
            }
        }
    }
}

fn open_log(path: &Path) -> EngineResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| EngineError::all(format!("Cannot open logfile {}: {e}", path.display())))
}
