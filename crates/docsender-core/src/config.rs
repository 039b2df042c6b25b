//! Typed run configuration.
//!
//! The on-disk format is the operator's `key = value` text file: blank
//! lines and `#`-prefixed lines are ignored, and the literal escape
//! `#nl#` inside a value expands to a newline so body templates can
//! span lines. All keys are validated up front; a bad file fails with
//! the complete list of problems, not the first one hit at use time.

use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::ledger::Schema;

/// Errors from loading or validating the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config {path}: {source}")]
    Read {
        /// Path that was opened.
        path: PathBuf,
        /// Underlying I/O failure.
        source: io::Error,
    },

    /// A non-comment line has no `=` separator.
    #[error("config line {line} is not a `key = value` pair")]
    Malformed {
        /// 1-based line number.
        line: usize,
    },

    /// One or more keys are missing or invalid.
    #[error("invalid configuration: {}", .0.iter().map(FieldError::message).collect::<Vec<_>>().join("; "))]
    Invalid(Vec<FieldError>),
}

/// A single missing or invalid configuration key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// Required key absent.
    Missing(&'static str),
    /// `port` is not a number in 1-65535.
    InvalidPort(String),
    /// `delimiter` is not a single byte.
    InvalidDelimiter(String),
    /// Neither the `subject`/`body` pair nor the
    /// `subject_raw`/`body_raw` pair is complete.
    MissingTemplates,
}

impl FieldError {
    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Missing(key) => format!("missing required key `{key}`"),
            Self::InvalidPort(value) => format!("`port` must be 1-65535, got `{value}`"),
            Self::InvalidDelimiter(value) => {
                format!("`delimiter` must be a single character, got `{value}`")
            }
            Self::MissingTemplates => {
                "need either `subject` + `body` or `subject_raw` + `body_raw`".to_string()
            }
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

/// Message templates, selecting the ledger schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Templates {
    /// Fixed subject and body, used with the six-column ledger where
    /// the first column is the attachment path itself.
    Simple {
        /// Literal subject line.
        subject: String,
        /// Literal body text.
        body: String,
    },
    /// Positional `{N}` templates, used with the nine-column ledger:
    /// subject gets `(file_code, month, year)`, body `(month, year)`.
    Coded {
        /// Subject template.
        subject: String,
        /// Body template.
        body: String,
    },
}

impl Templates {
    /// The ledger schema these templates imply.
    #[must_use]
    pub const fn schema(&self) -> Schema {
        match self {
            Self::Simple { .. } => Schema::Simple,
            Self::Coded { .. } => Schema::Coded,
        }
    }
}

/// Validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (implicit TLS).
    pub port: u16,
    /// AUTH login.
    pub login: String,
    /// AUTH password.
    pub password: String,
    /// Sender address for every message.
    pub from: String,
    /// Recipient that replaces the row's own list in `TEST` mode.
    /// Config key keeps the historical spelling `test_recepient`.
    pub test_recipient: String,
    /// Ledger column delimiter.
    pub delimiter: u8,
    /// Subject/body templates; also fixes the ledger schema.
    pub templates: Templates,
}

impl Config {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read,
    /// [`ConfigError::Malformed`] for a broken line, and
    /// [`ConfigError::Invalid`] carrying every missing/invalid key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parses configuration from `key = value` text.
    ///
    /// # Errors
    ///
    /// Same validation as [`Config::load`], minus the file read.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut raw = HashMap::new();
        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                return Err(ConfigError::Malformed { line: idx + 1 });
            };
            raw.insert(
                key.trim().to_string(),
                value.trim().replace("#nl#", "\n"),
            );
        }
        Self::validate(&raw)
    }

    fn validate(raw: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        let mut required = |key: &'static str| match raw.get(key) {
            Some(value) => value.clone(),
            None => {
                problems.push(FieldError::Missing(key));
                String::new()
            }
        };

        let host = required("host");
        let login = required("login");
        let password = required("password");
        let from = required("from");
        let test_recipient = required("test_recepient");

        let port = match raw.get("port") {
            Some(value) => match value.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    problems.push(FieldError::InvalidPort(value.clone()));
                    0
                }
            },
            None => {
                problems.push(FieldError::Missing("port"));
                0
            }
        };

        let delimiter = match raw.get("delimiter") {
            Some(value) if value.len() == 1 => value.as_bytes()[0],
            Some(value) => {
                problems.push(FieldError::InvalidDelimiter(value.clone()));
                b';'
            }
            None => b';',
        };

        let templates = match (
            raw.get("subject_raw").zip(raw.get("body_raw")),
            raw.get("subject").zip(raw.get("body")),
        ) {
            (Some((subject, body)), _) => Templates::Coded {
                subject: subject.clone(),
                body: body.clone(),
            },
            (None, Some((subject, body))) => Templates::Simple {
                subject: subject.clone(),
                body: body.clone(),
            },
            (None, None) => {
                problems.push(FieldError::MissingTemplates);
                Templates::Simple {
                    subject: String::new(),
                    body: String::new(),
                }
            }
        };

        if problems.is_empty() {
            Ok(Self {
                host,
                port,
                login,
                password,
                from,
                test_recipient,
                delimiter,
                templates,
            })
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
