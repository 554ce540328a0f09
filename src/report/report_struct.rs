use serde::Serialize;
use strum_macros::{Display, EnumIter};

use crate::report::ErrorKey;
use crate::token::Loc;

/// Describes a report about a potentially problematic situation that can be logged.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogReport {
    /// Used for choosing output colors and for filtering reports.
    pub severity: Severity,
    /// Mostly invisible in the output. Used for filtering and sorting.
    pub confidence: Confidence,
    /// Defines the problem category. Used for filtering reports.
    pub key: ErrorKey,
    /// The primary message. A short description of the problem.
    pub msg: String,
    /// Optional info message to be printed at the end.
    pub info: Option<String>,
    /// Should contain one or more elements.
    pub pointers: Vec<PointedMessage>,
}

impl LogReport {
    /// Returns the primary pointer.
    ///
    /// # Panics
    /// The report builder guarantees at least one pointer, so this only panics on reports
    /// constructed by hand without one.
    pub fn primary(&self) -> &PointedMessage {
        self.pointers.first().expect("A LogReport must always have at least one PointedMessage.")
    }

    /// Returns the length of the longest line number.
    pub fn indentation(&self) -> usize {
        self.pointers.iter().map(|pointer| pointer.loc.line.to_string().len()).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PointedMessage {
    /// Which file and where in the file the problem occurs.
    /// Might point to a whole file, rather than a specific location in the file.
    pub loc: Loc,
    /// The length of the offending phrase in characters.
    /// This will determine the number of carets that are printed at the given location.
    pub length: usize,
    /// A short message that will be printed at the caret location.
    pub msg: Option<String>,
}

/// Determines the output colour.
/// User can also filter by minimum severity level: e.g. don't show me Tips-level messages.
#[derive(
    Default, Debug, Display, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic trace output, such as the per-settlement weight breakdown.
    Tips,
    /// Odd data that does not change the results.
    Untidy,
    /// Data was skipped or a choice was made between conflicting records.
    #[default]
    Warning,
    /// Data is wrong and was replaced by a fallback.
    Error,
    /// The run cannot continue.
    Fatal,
}

/// User can filter by minimum confidence level.
#[derive(Default, Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Weak,
    #[default]
    Reasonable,
    Strong,
}
