use crate::block::Block;
use crate::data::provinces::EuProvince;
use crate::data::rulers::Ruler;
use crate::registry::{Entity, EntityId, Registry};
use crate::token::Token;

/// A country in the EU save, keyed by its tag.
#[derive(Debug)]
pub struct Country {
    tag: Token,
    block: Block,
    ruler: Option<EntityId<Ruler>>,
}

impl Country {
    pub fn new(tag: Token, block: Block) -> Self {
        Self { tag, block, ruler: None }
    }

    pub fn tag(&self) -> &Token {
        &self.tag
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// The id of the capital province.
    pub fn capital(&self) -> Option<&Token> {
        self.block.get_field_value("capital")
    }

    /// The provinces this country owns, in registry order.
    pub fn provinces(&self, provinces: &Registry<EuProvince>) -> Vec<EntityId<EuProvince>> {
        provinces
            .iter()
            .filter(|(_, p)| p.owner().is_some_and(|owner| owner == &self.tag))
            .map(|(id, _)| id)
            .collect()
    }

    /// The CK ruler that this country was made from, once the mapping has assigned one.
    pub fn ruler(&self) -> Option<EntityId<Ruler>> {
        self.ruler
    }

    /// Returns the ruler that was assigned before, if any.
    pub(crate) fn assign_ruler(&mut self, ruler: EntityId<Ruler>) -> Option<EntityId<Ruler>> {
        self.ruler.replace(ruler)
    }

    pub fn set_field(&mut self, key: &str, value: &str) {
        self.block.set_field_value(key, value);
    }
}

impl Entity for Country {
    const KIND: &'static str = "country";

    fn name(&self) -> &str {
        self.tag.as_str()
    }
}
