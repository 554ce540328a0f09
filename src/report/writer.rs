use std::io::Write;

use ansiterm::{ANSIString, ANSIStrings};

use crate::report::errors::Errors;
use crate::report::output_style::Styled;
use crate::report::{LogReport, PointedMessage, Severity};

/// Log the report.
pub fn log_report(errors: &mut Errors, report: &LogReport) {
    let indentation = report.indentation();
    // Log severity and message:
    log_line_title(errors, report);
    // Log the pointers, with a file location line whenever the file changes:
    let mut previous: Option<&PointedMessage> = None;
    for pointer in &report.pointers {
        log_pointer(errors, previous, pointer, indentation, report.severity);
        previous = Some(pointer);
    }
    // Log the info line, if one exists.
    if let Some(info) = &report.info {
        log_line_info(errors, indentation, info);
    }
    // Write a blank line to visually separate reports:
    _ = writeln!(errors.output);
}

fn log_pointer(
    errors: &mut Errors,
    previous: Option<&PointedMessage>,
    pointer: &PointedMessage,
    indentation: usize,
    severity: Severity,
) {
    if previous.is_none_or(|p| p.loc.pathname() != pointer.loc.pathname()) {
        log_line_file_location(errors, pointer, indentation);
    }
    if pointer.loc.line == 0 {
        // Zero-length line means the location is an entire file,
        // not any particular location within the file.
        return;
    }
    if let Some(line) = errors.get_line(&pointer.loc) {
        log_line_from_source(errors, pointer, indentation, &line);
        log_line_carets(errors, pointer, &line, indentation, severity);
    }
}

/// Log the first line of a report, containing the severity level and the message.
fn log_line_title(errors: &mut Errors, report: &LogReport) {
    let styles = &errors.styles;
    let line: &[ANSIString<'static>] = &[
        styles.style(Styled::Tag(report.severity, true)).paint(report.severity.to_string()),
        styles.style(Styled::Tag(report.severity, false)).paint(format!("({})", report.key)),
        styles.style(Styled::Default).paint(": "),
        styles.style(Styled::ErrorMessage).paint(report.msg.clone()),
    ];
    let line = ANSIStrings(line).to_string();
    _ = writeln!(errors.output, "{line}");
}

/// Log the optional info line that is part of the overall report.
fn log_line_info(errors: &mut Errors, indentation: usize, info: &str) {
    let styles = &errors.styles;
    let line: &[ANSIString<'static>] = &[
        styles.style(Styled::Default).paint(format!("{:width$} ", "", width = indentation)),
        styles.style(Styled::Location).paint("="),
        styles.style(Styled::Default).paint(" "),
        styles.style(Styled::InfoTag).paint("Info:"),
        styles.style(Styled::Default).paint(" "),
        styles.style(Styled::Info).paint(info.to_string()),
    ];
    let line = ANSIStrings(line).to_string();
    _ = writeln!(errors.output, "{line}");
}

/// Log the line containing the location's filename.
fn log_line_file_location(errors: &mut Errors, pointer: &PointedMessage, indentation: usize) {
    let styles = &errors.styles;
    let line: &[ANSIString<'static>] = &[
        styles.style(Styled::Default).paint(format!("{:width$}", "", width = indentation)),
        styles.style(Styled::Location).paint("--> "),
        styles.style(Styled::Location).paint(pointer.loc.pathname().display().to_string()),
    ];
    let line = ANSIStrings(line).to_string();
    _ = writeln!(errors.output, "{line}");
}

/// Print a line from the source file.
fn log_line_from_source(
    errors: &mut Errors,
    pointer: &PointedMessage,
    indentation: usize,
    line: &str,
) {
    let styles = &errors.styles;
    let line: &[ANSIString<'static>] = &[
        styles
            .style(Styled::Location)
            .paint(format!("{:width$}", pointer.loc.line, width = indentation)),
        styles.style(Styled::Default).paint(" "),
        styles.style(Styled::Location).paint("|"),
        styles.style(Styled::Default).paint(" "),
        styles.style(Styled::SourceText).paint(line.to_string()),
    ];
    let line = ANSIStrings(line).to_string();
    _ = writeln!(errors.output, "{line}");
}

fn log_line_carets(
    errors: &mut Errors,
    pointer: &PointedMessage,
    line: &str,
    indentation: usize,
    severity: Severity,
) {
    let mut spacing = String::new();
    for c in line.chars().take(pointer.loc.column.saturating_sub(1) as usize) {
        // Keep tabs so that the carets line up with the source line.
        spacing.push(if c == '\t' { '\t' } else { ' ' });
    }
    let styles = &errors.styles;
    let tag = pointer.msg.as_ref().map_or_else(String::new, |msg| format!(" <-- {msg}"));
    let line: &[ANSIString<'static>] = &[
        styles.style(Styled::Default).paint(format!("{:width$} ", "", width = indentation)),
        styles.style(Styled::Location).paint("|"),
        styles.style(Styled::Default).paint(format!(" {spacing}")),
        styles
            .style(Styled::Tag(severity, true))
            .paint(format!("{:^^width$}{tag}", "", width = pointer.length)),
    ];
    let line = ANSIStrings(line).to_string();
    _ = writeln!(errors.output, "{line}");
}
