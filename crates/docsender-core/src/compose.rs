//! Subject and body generation from the row's code column.
//!
//! A Coded-schema code looks like `2023_03_01_AX`: the first segment
//! is the year, the second the month number. The month name table is
//! the operators' locale (Russian), matching the templates they write.

use crate::config::Templates;
use crate::ledger::Row;

/// Localized month names, index 0 = January.
const MONTHS: [&str; 12] = [
    "январь",
    "февраль",
    "март",
    "апрель",
    "май",
    "июнь",
    "июль",
    "август",
    "сентябрь",
    "октябрь",
    "ноябрь",
    "декабрь",
];

/// Composition failures. These are structural: the ledger's code
/// column is corrupt, so the pass aborts rather than guessing.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    /// Code has fewer than the `year_month` segments.
    #[error("code {code:?} does not split into year and month")]
    BadCode {
        /// Offending code column value.
        code: String,
    },

    /// Month segment is not a number in 1-12.
    #[error("code {code:?}: month segment {month:?} is not 1-12")]
    BadMonth {
        /// Offending code column value.
        code: String,
        /// The segment that failed the bounds check.
        month: String,
    },

    /// Template references a placeholder beyond the supplied values.
    #[error("template {template:?} references {{{index}}} but only {supplied} values supplied")]
    TemplateArity {
        /// The template string.
        template: String,
        /// Placeholder index that failed.
        index: usize,
        /// Number of values available.
        supplied: usize,
    },

    /// Unclosed or non-numeric placeholder.
    #[error("template {template:?} has a malformed placeholder")]
    BadPlaceholder {
        /// The template string.
        template: String,
    },
}

/// Rendered subject and body for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Content {
    /// Subject line.
    pub subject: String,
    /// Body text.
    pub body: String,
}

/// Produces the subject and body for a row under the given templates.
///
/// Simple templates are literal. Coded templates substitute
/// `(file_code, month name, year)` into the subject and
/// `(month name, year)` into the body.
///
/// # Errors
///
/// Returns a [`ComposeError`] when the code column cannot yield a
/// year/month pair or a template placeholder cannot be satisfied.
pub fn content_for(row: &Row, templates: &Templates) -> Result<Content, ComposeError> {
    match templates {
        Templates::Simple { subject, body } => Ok(Content {
            subject: subject.clone(),
            body: body.clone(),
        }),
        Templates::Coded { subject, body } => {
            let (year, month) = split_code(&row.code)?;
            let month = month_name(&row.code, month)?;
            let file_code = row.file_code.as_deref().unwrap_or_default();
            Ok(Content {
                subject: render(subject, &[file_code, month, year])?,
                body: render(body, &[month, year])?,
            })
        }
    }
}

/// Splits a code into its year and month segments.
fn split_code(code: &str) -> Result<(&str, &str), ComposeError> {
    let mut segments = code.split('_');
    match (segments.next(), segments.next()) {
        (Some(year), Some(month)) if !year.is_empty() => Ok((year, month)),
        _ => Err(ComposeError::BadCode { code: code.into() }),
    }
}

/// Maps a month segment to its localized name, bounds-checked.
fn month_name(code: &str, segment: &str) -> Result<&'static str, ComposeError> {
    segment
        .parse::<usize>()
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|m| MONTHS.get(m))
        .copied()
        .ok_or_else(|| ComposeError::BadMonth {
            code: code.into(),
            month: segment.into(),
        })
}

/// Substitutes positional `{N}` placeholders. `{{` and `}}` escape
/// literal braces. An index past `args` is an error, unused args are
/// not.
fn render(template: &str, args: &[&str]) -> Result<String, ComposeError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '{' => {
                let mut digits = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(d) if d.is_ascii_digit() => digits.push(d),
                        _ => {
                            return Err(ComposeError::BadPlaceholder {
                                template: template.into(),
                            });
                        }
                    }
                }
                let index = digits.parse::<usize>().map_err(|_| {
                    ComposeError::BadPlaceholder {
                        template: template.into(),
                    }
                })?;
                let value = args.get(index).ok_or_else(|| ComposeError::TemplateArity {
                    template: template.into(),
                    index,
                    supplied: args.len(),
                })?;
                out.push_str(value);
            }
            '}' => {
                return Err(ComposeError::BadPlaceholder {
                    template: template.into(),
                });
            }
            c => out.push(c),
        }
    }

    Ok(out)
}
