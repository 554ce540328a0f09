//! The coefficient tables that drive the province weight engine.
//!
//! The tables are written in the same format as the saves themselves:
//!
//! ```text
//! settlement_types = { castle = { cost = 10 prod = 0.6 tax = 0.4 } }
//! buildings = { ca_wall_1 = { weight = 5 fort_level = 2 } }
//! units = { light_infantry_f = { manpower = 0.001 } }
//! ```

use std::path::Path;

use ahash::AHashMap;
use anyhow::{Context, Result};
use phf::phf_map;

use crate::block::Block;
use crate::error::LookupError;
use crate::pdxfile::PdxFile;
use crate::report::{untidy, ErrorKey};

/// Manpower per unit of levy strength, for unit types that the `units` table leaves out.
static UNIT_MANPOWER: phf::Map<&'static str, f64> = phf_map! {
    "light_infantry_f" => 0.001,
    "heavy_infantry_f" => 0.002,
    "pikemen_f" => 0.002,
    "light_cavalry_f" => 0.003,
    "knights_f" => 0.005,
    "archers_f" => 0.0015,
    "horse_archers_f" => 0.003,
    "camel_cavalry_f" => 0.003,
    "war_elephants_f" => 0.005,
};

/// Manpower coefficient for unit types that are in neither table.
pub const DEFAULT_MANPOWER: f64 = 0.0001;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SettlementType {
    /// Base weight of the settlement before any buildings.
    pub cost: f64,
    /// Multiplier from building weight to production.
    pub prod: f64,
    /// Multiplier from building weight to taxation.
    pub tax: f64,
}

impl SettlementType {
    fn from_block(block: &Block) -> Self {
        SettlementType {
            cost: block.get_field_number_or("cost", 0.0),
            prod: block.get_field_number_or("prod", 0.5),
            tax: block.get_field_number_or("tax", 0.5),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Building {
    pub weight: f64,
    pub fort_level: f64,
}

impl Building {
    fn from_block(block: &Block) -> Self {
        Building {
            weight: block.get_field_number_or("weight", 0.0),
            fort_level: block.get_field_number_or("fort_level", 0.0),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Tables {
    settlement_types: AHashMap<String, SettlementType>,
    buildings: AHashMap<String, Building>,
    units: AHashMap<String, f64>,
}

impl Tables {
    /// Build the tables from a parsed table file.
    /// The `settlement_types` and `buildings` sections are required, `units` is optional.
    pub fn from_block(block: &Block) -> Result<Self, LookupError> {
        let mut tables = Tables::default();
        for (key, block) in block.get_required_block("settlement_types")?.iter_definitions() {
            tables.settlement_types.insert(key.to_string(), SettlementType::from_block(block));
        }
        for (key, block) in block.get_required_block("buildings")?.iter_definitions() {
            tables.buildings.insert(key.to_string(), Building::from_block(block));
        }
        if let Some(units) = block.get_field_block("units") {
            for (key, block) in units.iter_definitions() {
                if let Some(manpower) = block.get_field_number("manpower") {
                    tables.units.insert(key.to_string(), manpower);
                } else {
                    let msg = format!("unit `{key}` has no manpower, using the built-in value");
                    untidy(ErrorKey::Tables).msg(msg).loc(key).push();
                }
            }
        }
        Ok(tables)
    }

    pub fn read(pathname: &Path) -> Result<Self> {
        let block = PdxFile::read(pathname)?;
        Tables::from_block(&block)
            .with_context(|| format!("invalid coefficient tables in {}", pathname.display()))
    }

    pub fn settlement_type(&self, kind: &str) -> Option<&SettlementType> {
        self.settlement_types.get(kind)
    }

    pub fn building(&self, name: &str) -> Option<&Building> {
        self.buildings.get(name)
    }

    /// The manpower that one point of levy strength of this unit type is worth, if the unit
    /// type is in the `units` table or the built-in one.
    pub fn unit_manpower(&self, unit: &str) -> Option<f64> {
        self.units.get(unit).or_else(|| UNIT_MANPOWER.get(unit)).copied()
    }

    /// Like [`Tables::unit_manpower`], with [`DEFAULT_MANPOWER`] for unknown unit types.
    pub fn manpower(&self, unit: &str) -> f64 {
        self.unit_manpower(unit).unwrap_or(DEFAULT_MANPOWER)
    }

    pub fn insert_settlement_type(&mut self, kind: &str, settlement_type: SettlementType) {
        self.settlement_types.insert(kind.to_string(), settlement_type);
    }

    pub fn insert_building(&mut self, name: &str, building: Building) {
        self.buildings.insert(name.to_string(), building);
    }
}
