use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The category of a report. Reports can be filtered and grouped by key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
    IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKey {
    ReadError,
    Encoding,
    ParseError,
    BracePlacement,
    Structure,
    DuplicateName,
    Sealed,
    MissingItem,
    TitleLevel,
    LiegeConflict,
    Participant,
    WarName,
    Settlement,
    Weights,
    Tables,
    Mapping,
}
