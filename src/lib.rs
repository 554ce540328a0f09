//! This library reads Crusader Kings save games into a typed graph of titles, rulers,
//! provinces and wars, and scores every province for the conversion to Europa Universalis.
//!
//! The usual entry points are [`PdxFile::read`] to load the documents, [`Tables::read`] for the
//! coefficient tables, and [`World::build`] to run the whole pipeline.

pub use crate::block::{Block, BlockItem, Field, NodeKind, BV};
pub use crate::data::countries::Country;
pub use crate::data::provinces::{CkProvince, EuProvince};
pub use crate::data::rulers::{count_baronies, create_liege, Ruler};
pub use crate::data::titles::{Level, Title};
pub use crate::data::wars::{Side, War};
pub use crate::error::{ConvertError, InvariantError, LookupError};
pub use crate::parse::pdxfile::parse_pdx;
pub use crate::pdxfile::PdxFile;
pub use crate::registry::{Entity, EntityId, Registry};
pub use crate::report::{
    disable_ansi_colors, emit_reports, set_minimum_severity, set_output_style, take_reports,
    Confidence, ErrorKey, LogReport, OutputStyle, PointedMessage, Severity,
};
pub use crate::tables::{Building, SettlementType, Tables};
pub use crate::token::{Loc, Token};
pub use crate::weights::{settlement_weights, SettlementScore, Weight, Weights};
pub use crate::world::World;

mod block;
mod data;
mod error;
mod parse;
mod pdxfile;
mod registry;
mod report;
mod tables;
mod token;
mod weights;
mod world;
