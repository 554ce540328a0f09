//! The province weight engine.
//!
//! Every settlement in a province is scored in five categories from its settlement type, its
//! buildings, and its levies. The scores are written back onto the settlement as
//! `weight_<category>` fields and summed into the province total. Trade is not computed from the
//! settlements but read from the province itself.

use std::fmt::Write as _;
use std::ops::{Add, AddAssign, Index, IndexMut};

use serde::ser::{Serialize, SerializeMap, Serializer};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter, IntoStaticStr};

use crate::block::{Block, BV};
use crate::error::LookupError;
use crate::report::{tips, untidy, warn, ErrorKey};
use crate::tables::{Tables, DEFAULT_MANPOWER};
use crate::token::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumIter, EnumCount, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Weight {
    Manpower,
    Production,
    Taxation,
    Galleys,
    Fortification,
    Trade,
}

impl Weight {
    /// The categories that are computed per settlement.
    pub fn settlement_categories() -> impl Iterator<Item = Weight> {
        Weight::iter().filter(|w| *w != Weight::Trade)
    }

    /// The key under which a settlement's score in this category is written back.
    pub fn field_name(self) -> String {
        format!("weight_{self}")
    }
}

/// One score per [`Weight`] category.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Weights([f64; Weight::COUNT]);

impl Weights {
    pub fn iter(&self) -> impl Iterator<Item = (Weight, f64)> + '_ {
        Weight::iter().map(|w| (w, self[w]))
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }
}

impl Index<Weight> for Weights {
    type Output = f64;

    fn index(&self, weight: Weight) -> &f64 {
        &self.0[weight as usize]
    }
}

impl IndexMut<Weight> for Weights {
    fn index_mut(&mut self, weight: Weight) -> &mut f64 {
        &mut self.0[weight as usize]
    }
}

impl AddAssign for Weights {
    fn add_assign(&mut self, other: Self) {
        for w in Weight::iter() {
            self[w] += other[w];
        }
    }
}

impl Add for Weights {
    type Output = Weights;

    fn add(mut self, other: Self) -> Weights {
        self += other;
        self
    }
}

impl Serialize for Weights {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Weight::COUNT))?;
        for (w, value) in self.iter() {
            let key: &'static str = w.into();
            map.serialize_entry(key, &value)?;
        }
        map.end()
    }
}

/// The result of scoring one settlement.
#[derive(Clone, Debug)]
pub struct SettlementScore {
    pub weights: Weights,
    /// Settlement type cost plus the weight of every active building.
    pub building_weight: f64,
    /// The active buildings that were found in the building table, with their weights.
    pub buildings: Vec<(String, f64)>,
    pub levies: usize,
}

/// Score one settlement and write the scores back into its block.
pub fn settlement_weights(
    key: &Token,
    block: &mut Block,
    tables: &Tables,
) -> Result<SettlementScore, LookupError> {
    let kind = block.get_required_value("type")?;
    let settlement_type = tables.settlement_type(kind.as_str()).ok_or_else(|| {
        LookupError::MissingSettlementType { settlement: key.to_string(), kind: kind.to_string() }
    })?;

    let mut weights = Weights::default();
    let mut building_weight = settlement_type.cost;
    let mut buildings = Vec::new();
    for (name, value) in block.iter_assignments() {
        if let Some(building) = tables.building(name.as_str()) {
            if value.is_true() {
                building_weight += building.weight;
                weights[Weight::Fortification] += building.fort_level;
                buildings.push((name.to_string(), building.weight));
            }
        }
    }
    weights[Weight::Production] = building_weight * settlement_type.prod;
    weights[Weight::Taxation] = building_weight * settlement_type.tax;

    let mut levies = 0;
    if let Some(levy) = block.get_field_block("levy") {
        for field in levy.iter_fields() {
            let Some(strength) = levy_strength(field.bv()) else {
                let msg = format!("levy `{}` has no strength", field.key());
                warn(ErrorKey::Settlement).msg(msg).loc(field).push();
                continue;
            };
            levies += 1;
            if field.key().is("galleys_f") {
                weights[Weight::Galleys] += strength;
            } else if let Some(manpower) = tables.unit_manpower(field.key().as_str()) {
                weights[Weight::Manpower] += strength * manpower;
            } else {
                let msg = format!("unknown unit type `{}`", field.key());
                let info = format!("using the default manpower of {DEFAULT_MANPOWER} per levy");
                untidy(ErrorKey::Settlement).msg(msg).info(info).loc(field.key()).push();
                weights[Weight::Manpower] += strength * DEFAULT_MANPOWER;
            }
        }
    }

    for w in Weight::settlement_categories() {
        block.set_field_value(&w.field_name(), &weights[w].to_string());
    }
    Ok(SettlementScore { weights, building_weight, buildings, levies })
}

/// A levy is either a single number, or a list whose first number is the current strength.
fn levy_strength(bv: &BV) -> Option<f64> {
    match bv {
        BV::Value(token) => token.get_number(),
        BV::Block(block) => block.iter_values().next().and_then(Token::get_number),
    }
}

/// Whether this child of a province is a settlement. Settlements are keyed by barony titles and
/// have a settlement type. Barony records that don't qualify are reported.
pub fn is_settlement(key: &Token, block: &Block) -> bool {
    if !key.starts_with("b_") {
        return false;
    }
    match block.get_field("type") {
        Some(BV::Value(_)) => true,
        Some(BV::Block(_)) => {
            let msg = format!("settlement `{key}` has a block as its type, skipping it");
            warn(ErrorKey::Settlement).msg(msg).loc(key).push();
            false
        }
        None => {
            let msg = format!("`{key}` has no settlement type, skipping it");
            tips(ErrorKey::Settlement).msg(msg).loc(key).push();
            false
        }
    }
}

/// Score a whole province. `block` is the province record, whose settlements get their scores
/// written back into them. Returns the province total and the names of the settlements.
pub fn province_weights(
    key: &Token,
    block: &mut Block,
    tables: &Tables,
) -> Result<(Weights, Vec<String>), LookupError> {
    let mut total = Weights::default();
    let mut settlements = Vec::new();
    let mut trace = String::new();
    for (name, settlement) in block.iter_definitions_mut() {
        if !is_settlement(name, settlement) {
            continue;
        }
        let score = settlement_weights(name, settlement, tables)?;
        _ = write!(trace, "{name}: building weight {}", score.building_weight);
        for (building, weight) in &score.buildings {
            _ = write!(trace, ", {building} {weight}");
        }
        _ = writeln!(trace, ", {} levies", score.levies);
        total += score.weights;
        settlements.push(name.to_string());
    }
    total[Weight::Trade] = block.get_field_number_or("realm_tradeposts", 0.0);

    let msg = format!(
        "province {key} has {} settlements, total weight {}",
        settlements.len(),
        total.total()
    );
    tips(ErrorKey::Weights).msg(msg).info(trace.trim_end()).loc(key).push();
    Ok((total, settlements))
}
