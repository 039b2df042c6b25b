//! Ledger row model.
//!
//! The ledger is a delimited text file, one row per notice. Two column
//! layouts exist in the field; which one a run uses is fixed by the
//! configuration ([`crate::config::Templates`]), never guessed per row.

use csv::StringRecord;

/// Per-row status driving the state machine.
///
/// Parsing trims the field; anything unrecognized is preserved verbatim
/// in [`Mode::Other`] and passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Pending: send to the row's own recipients.
    NotSent,
    /// Pending: send to the configured test recipient instead.
    Test,
    /// Already processed; never re-sent.
    Sent,
    /// A previous attempt failed. Terminal until an operator resets
    /// the column; deliberately does not match the pending modes.
    Error,
    /// Unrecognized value, passed through as-is.
    Other(String),
}

impl Mode {
    /// Parses a mode column value.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "NO_SENT" => Self::NotSent,
            "TEST" => Self::Test,
            "SENT" => Self::Sent,
            "ERROR" => Self::Error,
            _ => Self::Other(raw.to_string()),
        }
    }

    /// The column value to write back.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NotSent => "NO_SENT",
            Self::Test => "TEST",
            Self::Sent => "SENT",
            Self::Error => "ERROR",
            Self::Other(raw) => raw,
        }
    }
}

/// Ledger column layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Six columns: path, mode, timepoint, price, recipients, company.
    /// The first column is both the row identifier and the single
    /// attachment path.
    Simple,
    /// Nine columns: code, mode, timepoint, price, recipients,
    /// company, two attachment paths, file code. The code column is
    /// `year_month_…` and feeds the subject/body templates.
    Coded,
}

impl Schema {
    /// Number of columns a row must have.
    #[must_use]
    pub const fn arity(self) -> usize {
        match self {
            Self::Simple => 6,
            Self::Coded => 9,
        }
    }
}

/// Structural ledger failures; always abort the whole pass.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// Row has the wrong number of columns for the schema.
    #[error("row {line}: expected {expected} columns, got {got}")]
    Arity {
        /// 1-based ledger line.
        line: u64,
        /// Columns the schema requires.
        expected: usize,
        /// Columns actually present.
        got: usize,
    },
}

/// One ledger row as a named record.
///
/// Business fields (`price`, `recipients_raw`, `company`, attachment
/// columns, `file_code`) are opaque passthrough: the processor never
/// rewrites them, so a failed row keeps everything a human needs to
/// diagnose it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// First column: the code (`Coded`) or the attachment path
    /// (`Simple`).
    pub code: String,
    /// Status column.
    pub mode: Mode,
    /// Timestamp column; set to "now" only when a send is attempted.
    pub timepoint: String,
    /// Opaque passthrough.
    pub price: String,
    /// Raw recipients column, `,`-separated with optional `*` markers.
    pub recipients_raw: String,
    /// Opaque passthrough.
    pub company: String,
    /// Attachment path columns (7 and 8), `Coded` schema only.
    pub files: Vec<String>,
    /// Subject token column (9), `Coded` schema only.
    pub file_code: Option<String>,
    schema: Schema,
}

impl Row {
    /// Parses a delimited record against the schema's fixed arity.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Arity`] on a column-count mismatch.
    pub fn parse(record: &StringRecord, schema: Schema, line: u64) -> Result<Self, LedgerError> {
        if record.len() != schema.arity() {
            return Err(LedgerError::Arity {
                line,
                expected: schema.arity(),
                got: record.len(),
            });
        }

        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let (files, file_code) = match schema {
            Schema::Simple => (Vec::new(), None),
            Schema::Coded => (vec![field(6), field(7)], Some(field(8))),
        };

        Ok(Self {
            code: field(0),
            mode: Mode::parse(record.get(1).unwrap_or_default()),
            timepoint: field(2),
            price: field(3),
            recipients_raw: field(4),
            company: field(5),
            files,
            file_code,
            schema,
        })
    }

    /// The schema this row was parsed under.
    #[must_use]
    pub const fn schema(&self) -> Schema {
        self.schema
    }

    /// Serializes the row back to a record of the same arity.
    #[must_use]
    pub fn record(&self) -> StringRecord {
        let mut record = StringRecord::new();
        record.push_field(&self.code);
        record.push_field(self.mode.as_str());
        record.push_field(&self.timepoint);
        record.push_field(&self.price);
        record.push_field(&self.recipients_raw);
        record.push_field(&self.company);
        for file in &self.files {
            record.push_field(file);
        }
        if let Some(file_code) = &self.file_code {
            record.push_field(file_code);
        }
        record
    }

    /// Recipient addresses: split on `,`, `*` markers stripped,
    /// whitespace trimmed, empties dropped.
    #[must_use]
    pub fn recipients(&self) -> Vec<String> {
        self.recipients_raw
            .split(',')
            .map(|addr| addr.replace('*', "").trim().to_string())
            .filter(|addr| !addr.is_empty())
            .collect()
    }

    /// Attachment paths for this row, trimmed.
    #[must_use]
    pub fn attachment_paths(&self) -> Vec<String> {
        match self.schema {
            Schema::Simple => vec![self.code.trim().to_string()],
            Schema::Coded => self.files.iter().map(|f| f.trim().to_string()).collect(),
        }
    }
}
