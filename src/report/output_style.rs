use ahash::AHashMap;
use ansiterm::Colour::{Blue, Cyan, Green, Red, White, Yellow};
use ansiterm::Style;

use crate::report::Severity;

/// For looking up the style to use for the various parts of the output.
#[derive(Debug, Default, Clone, Copy, Hash, PartialEq, Eq)]
pub enum Styled {
    #[default]
    Default,
    Tag(Severity, IsTag),
    /// The actual report message, telling the user what is wrong.
    ErrorMessage,
    /// Introduces additional info on a report.
    InfoTag,
    /// The actual info message. Optionally attached to a report.
    Info,
    /// Filename, line number, column number.
    Location,
    /// Text from the source file.
    SourceText,
}

/// Whether the style applies to the `Severity` tag itself or the `ErrorKey` that follows it.
pub type IsTag = bool;

#[derive(Debug)]
pub struct OutputStyle {
    map: AHashMap<Styled, Style>,
}

impl Default for OutputStyle {
    /// Constructs an instance of `OutputStyle` that uses default, hard-coded color values.
    fn default() -> Self {
        let mut map = AHashMap::new();
        map.insert(Styled::Default, Style::new());

        map.insert(Styled::InfoTag, Style::new().bold());
        map.insert(Styled::Info, Style::new());
        map.insert(Styled::ErrorMessage, Style::new().bold());
        map.insert(Styled::Location, Blue.bold());
        map.insert(Styled::SourceText, Style::new());

        map.insert(Styled::Tag(Severity::Fatal, true), White.bold());
        map.insert(Styled::Tag(Severity::Fatal, false), White.bold());
        map.insert(Styled::Tag(Severity::Error, true), Red.bold());
        map.insert(Styled::Tag(Severity::Error, false), Red.bold());
        map.insert(Styled::Tag(Severity::Warning, true), Yellow.bold());
        map.insert(Styled::Tag(Severity::Warning, false), Yellow.normal());
        map.insert(Styled::Tag(Severity::Untidy, true), Cyan.bold());
        map.insert(Styled::Tag(Severity::Untidy, false), Cyan.normal());
        map.insert(Styled::Tag(Severity::Tips, true), Green.bold());
        map.insert(Styled::Tag(Severity::Tips, false), Green.normal());

        OutputStyle { map }
    }
}

impl OutputStyle {
    /// Construct a version of the `OutputStyle` that always returns the default, no-colour style.
    /// Use this to effectively disable any ANSI characters in the output.
    pub fn no_color() -> Self {
        let mut map = AHashMap::new();
        map.insert(Styled::Default, Style::new());
        OutputStyle { map }
    }

    pub fn style(&self, output: Styled) -> Style {
        self.map.get(&output).or_else(|| self.map.get(&Styled::Default)).copied().unwrap_or_default()
    }
}
