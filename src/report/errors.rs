//! Collect reports and then write them out.

use std::cmp::Ordering;
use std::fs::read;
use std::io::{stderr, Write};
use std::mem::take;
use std::path::PathBuf;
use std::sync::{LazyLock, Mutex, MutexGuard};

use ahash::{AHashMap, AHashSet};

use crate::pdxfile::decode_bytes;
use crate::report::writer::log_report;
use crate::report::writer_json::log_report_json;
use crate::report::{LogReport, OutputStyle, Severity};
use crate::token::Loc;

static ERRORS: LazyLock<Mutex<Errors>> = LazyLock::new(|| Mutex::new(Errors::default()));

#[allow(missing_debug_implementations)]
pub struct Errors {
    pub(crate) output: Box<dyn Write + Send>,

    /// Files that have been read in to get the lines where problems occurred.
    /// Cached here to avoid duplicate I/O and decoding.
    filecache: AHashMap<PathBuf, String>,

    /// Output color and style configuration.
    pub(crate) styles: OutputStyle,

    /// Reports below this severity are dropped as soon as they are logged.
    min_severity: Severity,

    /// All reports that passed the checks, stored here to be sorted before being emitted all at once.
    /// It's a `HashSet` because the same anomaly is often found from more than one direction.
    storage: AHashSet<LogReport>,
}

impl Default for Errors {
    fn default() -> Self {
        Errors {
            output: Box::new(stderr()),
            filecache: AHashMap::default(),
            styles: OutputStyle::default(),
            min_severity: Severity::Tips,
            storage: AHashSet::default(),
        }
    }
}

impl Errors {
    /// Fetch the contents of a single line from a document.
    pub(crate) fn get_line(&mut self, loc: &Loc) -> Option<String> {
        if loc.line == 0 {
            return None;
        }
        let idx = loc.line as usize - 1;
        if let Some(contents) = self.filecache.get(loc.pathname()) {
            return contents.lines().nth(idx).map(str::to_string);
        }
        let bytes = read(loc.pathname()).ok()?;
        let contents = decode_bytes(&bytes);
        let line = contents.lines().nth(idx).map(str::to_string);
        self.filecache.insert(loc.pathname().to_path_buf(), contents);
        line
    }

    fn push_report(&mut self, report: LogReport) {
        if report.severity < self.min_severity {
            return;
        }
        self.storage.insert(report);
    }

    /// Extract the stored reports, sort them, and return them as a vector of [`LogReport`].
    /// The stored reports will be left empty.
    pub fn take_reports(&mut self) -> Vec<LogReport> {
        let mut reports: Vec<LogReport> = take(&mut self.storage).into_iter().collect();
        reports.sort_unstable_by(|a, b| {
            // Severity in descending order
            let mut cmp = b.severity.cmp(&a.severity);
            if cmp != Ordering::Equal {
                return cmp;
            }
            // Confidence in descending order too
            cmp = b.confidence.cmp(&a.confidence);
            if cmp != Ordering::Equal {
                return cmp;
            }
            // If severity and confidence are the same, order by loc. Check all locs in order.
            for (a, b) in a.pointers.iter().zip(b.pointers.iter()) {
                cmp = a.loc.cmp(&b.loc);
                if cmp != Ordering::Equal {
                    return cmp;
                }
            }
            // Shorter chain goes first, if it comes to that.
            cmp = a.pointers.len().cmp(&b.pointers.len());
            if cmp != Ordering::Equal {
                return cmp;
            }
            // Fallback: order by message text.
            a.msg.cmp(&b.msg)
        });
        reports
    }

    /// Print all the stored reports to the output.
    /// Set `json` if they should be printed as a JSON array.
    pub fn emit_reports(&mut self, json: bool) {
        let reports = self.take_reports();
        if json {
            _ = writeln!(self.output, "[");
            let mut first = true;
            for report in &reports {
                if !first {
                    _ = writeln!(self.output, ",");
                }
                first = false;
                log_report_json(self, report);
            }
            _ = writeln!(self.output, "\n]");
        } else {
            for report in &reports {
                log_report(self, report);
            }
        }
    }

    /// Get a mutable lock on the global ERRORS struct.
    ///
    /// # Panics
    /// May panic when the mutex has been poisoned by another thread.
    pub fn get_mut() -> MutexGuard<'static, Errors> {
        ERRORS.lock().unwrap()
    }
}

/// Store a report to be emitted when [`emit_reports`] is called.
pub fn log(report: LogReport) {
    Errors::get_mut().push_report(report);
}

/// Print all the stored reports.
pub fn emit_reports(json: bool) {
    Errors::get_mut().emit_reports(json);
}

/// Extract the stored reports, sort them, and return them as a vector of [`LogReport`].
/// The stored reports will be left empty.
pub fn take_reports() -> Vec<LogReport> {
    Errors::get_mut().take_reports()
}

/// Override the default `OutputStyle`. (Controls ansi colors)
pub fn set_output_style(style: OutputStyle) {
    Errors::get_mut().styles = style;
}

/// Disable color in the output.
pub fn disable_ansi_colors() {
    Errors::get_mut().styles = OutputStyle::no_color();
}

/// Drop reports below this severity. The default keeps everything, including the weight trace.
pub fn set_minimum_severity(severity: Severity) {
    Errors::get_mut().min_severity = severity;
}
