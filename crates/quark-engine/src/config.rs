//! Instance construction options parsed from command-line style switches.

use std::path::PathBuf;

use thiserror::Error;

// ── Echo ────────────────────────────────────────────────────────────

/// Where executed input lines are echoed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Echo {
    /// No echo.
    #[default]
    None,
    /// Echo to the screen (tracing output).
    Screen,
    /// Echo to the log file.
    Log,
    /// Echo to both.
    Both,
}

impl Echo {
    /// Parse an `echo` keyword.
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "none" => Some(Self::None),
            "screen" => Some(Self::Screen),
            "log" => Some(Self::Log),
            "both" => Some(Self::Both),
            _ => None,
        }
    }

    /// Whether lines go to the screen.
    pub fn screen(self) -> bool {
        matches!(self, Self::Screen | Self::Both)
    }

    /// Whether lines go to the log file.
    pub fn log(self) -> bool {
        matches!(self, Self::Log | Self::Both)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while parsing or validating an [`EngineConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A switch that is not recognised.
    #[error("Invalid command-line argument: {0}")]
    UnknownSwitch(String),
    /// A switch that needs a value was the last argument.
    #[error("Invalid command-line argument: {switch} requires a value")]
    MissingValue {
        /// The switch lacking its value.
        switch: String,
    },
    /// A switch value outside the accepted set.
    #[error("Invalid command-line argument: {switch} {value}")]
    InvalidValue {
        /// The switch.
        switch: String,
        /// The rejected value.
        value: String,
    },
    /// A `-var` name that cannot name a variable.
    #[error("Invalid variable name in command-line argument: {0}")]
    InvalidVariableName(String),
}

// ── EngineConfig ───────────────────────────────────────────────────

/// Construction options for an engine instance.
///
/// Built from command-line style arguments by [`EngineConfig::from_args`].
/// The program name is not part of `args`.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Input echo target. Default: none.
    pub echo: Echo,
    /// Log file path. Default: no log file.
    pub log: Option<PathBuf>,
    /// Whether screen output is enabled. Default: on.
    pub screen: bool,
    /// Index variables predefined with `-var name value...`.
    pub variables: Vec<(String, Vec<String>)>,
    /// `-nocite` was given. Accepted for compatibility; no effect.
    pub nocite: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            echo: Echo::None,
            log: None,
            screen: true,
            variables: Vec::new(),
            nocite: false,
        }
    }
}

impl EngineConfig {
    /// Parse and validate switches.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let mut iter = args.iter().map(|s| s.as_ref()).peekable();

        while let Some(switch) = iter.next() {
            match switch {
                "-echo" | "-e" => {
                    let value = next_value(&mut iter, switch)?;
                    config.echo = Echo::parse(value).ok_or_else(|| invalid(switch, value))?;
                }
                "-log" | "-l" => {
                    let value = next_value(&mut iter, switch)?;
                    config.log = match value {
                        "none" => None,
                        path => Some(PathBuf::from(path)),
                    };
                }
                "-screen" | "-sc" => {
                    let value = next_value(&mut iter, switch)?;
                    config.screen = match value {
                        "none" => false,
                        "on" => true,
                        other => return Err(invalid(switch, other)),
                    };
                }
                "-var" | "-v" => {
                    let name = next_value(&mut iter, switch)?;
                    let mut values = Vec::new();
                    while let Some(v) = iter.next_if(|v| !v.starts_with('-')) {
                        values.push(v.to_string());
                    }
                    if values.is_empty() {
                        return Err(ConfigError::MissingValue {
                            switch: format!("{switch} {name}"),
                        });
                    }
                    config.variables.push((name.to_string(), values));
                }
                "-nocite" | "-nc" => config.nocite = true,
                other => return Err(ConfigError::UnknownSwitch(other.to_string())),
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, _) in &self.variables {
            if !is_identifier(name) {
                return Err(ConfigError::InvalidVariableName(name.clone()));
            }
        }
        Ok(())
    }
}

/// Whether `name` is a valid variable, group, compute or fix identifier.
pub fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn next_value<'a, I>(iter: &mut I, switch: &str) -> Result<&'a str, ConfigError>
where
    I: Iterator<Item = &'a str>,
{
    iter.next().ok_or_else(|| ConfigError::MissingValue {
        switch: switch.to_string(),
    })
}

fn invalid(switch: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        switch: switch.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_give_defaults() {
        let c = EngineConfig::from_args::<&str>(&[]).unwrap();
        assert_eq!(c, EngineConfig::default());
        assert!(c.screen);
        assert!(c.log.is_none());
    }

    #[test]
    fn parses_every_switch() {
        let c = EngineConfig::from_args(&[
            "-echo", "both", "-log", "run.log", "-screen", "none", "-var", "n", "1", "2", "-nocite",
        ])
        .unwrap();
        assert_eq!(c.echo, Echo::Both);
        assert_eq!(c.log, Some(PathBuf::from("run.log")));
        assert!(!c.screen);
        assert_eq!(
            c.variables,
            vec![("n".to_string(), vec!["1".to_string(), "2".to_string()])]
        );
        assert!(c.nocite);
    }

    #[test]
    fn unknown_switch_is_rejected() {
        match EngineConfig::from_args(&["-frobnicate"]) {
            Err(ConfigError::UnknownSwitch(s)) => assert_eq!(s, "-frobnicate"),
            other => panic!("expected UnknownSwitch, got {other:?}"),
        }
    }

    #[test]
    fn missing_value_is_rejected() {
        match EngineConfig::from_args(&["-log"]) {
            Err(ConfigError::MissingValue { switch }) => assert_eq!(switch, "-log"),
            other => panic!("expected MissingValue, got {other:?}"),
        }
    }

    #[test]
    fn bad_echo_value_is_rejected() {
        match EngineConfig::from_args(&["-echo", "loud"]) {
            Err(ConfigError::InvalidValue { value, .. }) => assert_eq!(value, "loud"),
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn bad_variable_name_fails_validation() {
        match EngineConfig::from_args(&["-var", "a.b", "1"]) {
            Err(ConfigError::InvalidVariableName(n)) => assert_eq!(n, "a.b"),
            other => panic!("expected InvalidVariableName, got {other:?}"),
        }
    }
}
