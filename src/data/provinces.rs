//! Provinces on both sides of the conversion.
//!
//! A [`CkProvince`] is a source province from the CK save. It holds settlements and gets scored
//! by the weight engine. An [`EuProvince`] is a target province from the EU save. Which source
//! provinces feed which target provinces is decided by the mapping, which assigns them here.

use crate::block::{Block, BV};
use crate::error::LookupError;
use crate::registry::{Entity, EntityId};
use crate::tables::Tables;
use crate::token::Token;
use crate::weights::{province_weights, Weight, Weights};

#[derive(Debug)]
pub struct CkProvince {
    id: Token,
    block: Block,
    weights: Weights,
    settlements: Vec<String>,
    targets: Vec<EntityId<EuProvince>>,
}

impl CkProvince {
    pub fn new(id: Token, block: Block) -> Self {
        Self {
            id,
            block,
            weights: Weights::default(),
            settlements: Vec::new(),
            targets: Vec::new(),
        }
    }

    pub fn id(&self) -> &Token {
        &self.id
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// The display name, falling back to the province id.
    pub fn name(&self) -> &str {
        self.block.get_field_value_or("name", self.id.as_str())
    }

    /// The county title that this province belongs to.
    pub fn title(&self) -> Option<&Token> {
        self.block.get_field_value("title")
    }

    /// Run the weight engine over this province. The settlement scores are written into the
    /// province's block.
    pub fn compute_weights(&mut self, tables: &Tables) -> Result<(), LookupError> {
        let (weights, settlements) = province_weights(&self.id, &mut self.block, tables)?;
        self.weights = weights;
        self.settlements = settlements;
        Ok(())
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn weight(&self, weight: Weight) -> f64 {
        self.weights[weight]
    }

    /// The names of the settlements that were scored, in document order.
    pub fn settlements(&self) -> &[String] {
        &self.settlements
    }

    pub fn settlement(&self, name: &str) -> Option<&Block> {
        self.block.get_field_block(name)
    }

    pub fn targets(&self) -> &[EntityId<EuProvince>] {
        &self.targets
    }

    pub(crate) fn assign_target(&mut self, target: EntityId<EuProvince>) {
        if !self.targets.contains(&target) {
            self.targets.push(target);
        }
    }
}

impl Entity for CkProvince {
    const KIND: &'static str = "CK province";

    fn name(&self) -> &str {
        self.id.as_str()
    }
}

#[derive(Debug)]
pub struct EuProvince {
    id: Token,
    block: Block,
    sources: Vec<EntityId<CkProvince>>,
}

impl EuProvince {
    /// EU saves key their provinces as `-1 = { ... }`. The id is the number without the sign.
    pub fn new(key: Token, block: Block) -> Self {
        let id = match key.as_str().strip_prefix('-') {
            Some(id) => Token::new(id, key.loc.clone()),
            None => key,
        };
        Self { id, block, sources: Vec::new() }
    }

    pub fn id(&self) -> &Token {
        &self.id
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn name(&self) -> &str {
        self.block.get_field_value_or("name", self.id.as_str())
    }

    /// The tag of the owning country.
    pub fn owner(&self) -> Option<&Token> {
        self.block.get_field_value("owner")
    }

    /// The tags of the countries with cores here. Saves write these either as repeated
    /// `core = TAG` fields or as a `cores = { TAG ... }` list.
    pub fn cores(&self) -> Vec<&Token> {
        let mut cores = self.block.get_field_values("core");
        if let Some(list) = self.block.get_field_list("cores") {
            cores.extend(list);
        }
        cores
    }

    pub fn has_core(&self, tag: &str) -> bool {
        self.cores().iter().any(|t| t.is(tag))
    }

    pub fn add_core(&mut self, tag: &str) {
        if self.has_core(tag) {
            return;
        }
        let token = Token::new(tag, self.block.loc.clone());
        if let Some(list) = self.block.get_field_block_mut("cores") {
            list.add_value(BV::Value(token));
        } else {
            self.block.add_field("core", BV::Value(token));
        }
    }

    /// Returns whether there was a core to remove.
    pub fn remove_core(&mut self, tag: &str) -> bool {
        let mut removed = self.block.remove_assignment("core", tag);
        if let Some(list) = self.block.get_field_block_mut("cores") {
            while list.remove_value(tag) {
                removed = true;
            }
        }
        removed
    }

    /// Remove every core, whichever way they were written.
    pub fn clear_cores(&mut self) {
        self.block.remove_fields("core");
        self.block.remove_fields("cores");
    }

    pub fn set_field(&mut self, key: &str, value: &str) {
        self.block.set_field_value(key, value);
    }

    pub fn sources(&self) -> &[EntityId<CkProvince>] {
        &self.sources
    }

    pub(crate) fn add_source(&mut self, source: EntityId<CkProvince>) {
        if !self.sources.contains(&source) {
            self.sources.push(source);
        }
    }
}

impl Entity for EuProvince {
    const KIND: &'static str = "EU province";

    fn name(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::pdxfile::parse_pdx;
    use crate::token::Loc;

    fn eu_province(key: &str, content: &str) -> EuProvince {
        let loc = Loc::internal("eu");
        EuProvince::new(Token::new(key, loc.clone()), parse_pdx(&loc, content).unwrap())
    }

    #[test]
    fn test_repeated_cores() {
        let mut province = eu_province("-183", "name = Paris owner = FRA core = FRA core = ENG");
        assert_eq!(province.id().as_str(), "183");
        assert_eq!(province.name(), "Paris");
        assert_eq!(province.owner().map(Token::as_str), Some("FRA"));
        assert!(province.remove_core("ENG"));
        assert!(!province.remove_core("ENG"));
        province.add_core("BUR");
        province.add_core("FRA");
        let cores: Vec<_> = province.cores().iter().map(|t| t.as_str()).collect();
        assert_eq!(cores, vec!["FRA", "BUR"]);
    }

    #[test]
    fn test_core_list() {
        let mut province = eu_province("1", "cores = { SWE DAN }");
        province.add_core("NOR");
        assert!(province.remove_core("SWE"));
        let cores: Vec<_> = province.cores().iter().map(|t| t.as_str()).collect();
        assert_eq!(cores, vec!["DAN", "NOR"]);
        province.clear_cores();
        assert!(province.cores().is_empty());
    }
}
