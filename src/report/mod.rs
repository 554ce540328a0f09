//! All functions and data types related to diagnostic reports: building them, storing them, and
//! printing them.

pub use builder::{err, fatal, tips, untidy, warn};
pub use error_loc::ErrorLoc;
pub use errorkey::ErrorKey;
pub use errors::{
    disable_ansi_colors, emit_reports, log, set_minimum_severity, set_output_style, take_reports,
};
pub use output_style::OutputStyle;
pub use report_struct::{Confidence, LogReport, PointedMessage, Severity};

mod builder;
mod error_loc;
mod errorkey;
mod errors;
mod output_style;
mod report_struct;
mod writer;
mod writer_json;
