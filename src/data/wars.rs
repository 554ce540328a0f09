use bitflags::bitflags;

use crate::block::{Block, BV};
use crate::data::rulers::Ruler;
use crate::registry::{Entity, EntityId, Registry};
use crate::report::{warn, ErrorKey};
use crate::token::Token;

bitflags! {
    /// Which side or sides of a war to look at.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Side: u8 {
        const ATTACKER = 0x01;
        const DEFENDER = 0x02;
        const ALL = Self::ATTACKER.bits() | Self::DEFENDER.bits();
    }
}

#[derive(Debug)]
pub struct War {
    /// Unique name. Wars with the same name in the save get a number appended.
    name: String,
    raw_name: Token,
    block: Block,
    attackers: Vec<EntityId<Ruler>>,
    defenders: Vec<EntityId<Ruler>>,
}

impl War {
    /// Construct a war and resolve its participants. Participants that are not rulers are
    /// reported and left out.
    pub fn new(name: String, raw_name: Token, block: Block, rulers: &Registry<Ruler>) -> Self {
        let attackers = participants(&block, "attacker", &name, rulers);
        let defenders = participants(&block, "defender", &name, rulers);
        Self { name, raw_name, block, attackers, defenders }
    }

    /// The war's name as written in the save.
    pub fn raw_name(&self) -> &Token {
        &self.raw_name
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn attackers(&self) -> &[EntityId<Ruler>] {
        &self.attackers
    }

    pub fn defenders(&self) -> &[EntityId<Ruler>] {
        &self.defenders
    }

    /// The participants on the given sides that match `predicate`, attackers first.
    pub fn participants<F>(
        &self,
        rulers: &Registry<Ruler>,
        side: Side,
        mut predicate: F,
    ) -> Vec<EntityId<Ruler>>
    where
        F: FnMut(&Ruler) -> bool,
    {
        let mut result = Vec::new();
        if side.contains(Side::ATTACKER) {
            result.extend(self.attackers.iter().copied().filter(|&r| predicate(rulers.get(r))));
        }
        if side.contains(Side::DEFENDER) {
            result.extend(self.defenders.iter().copied().filter(|&r| predicate(rulers.get(r))));
        }
        result
    }

    /// Which sides the ruler fights on. Empty if it isn't in this war.
    pub fn side_of(&self, ruler: EntityId<Ruler>) -> Side {
        let mut side = Side::empty();
        if self.attackers.contains(&ruler) {
            side |= Side::ATTACKER;
        }
        if self.defenders.contains(&ruler) {
            side |= Side::DEFENDER;
        }
        side
    }
}

impl Entity for War {
    const KIND: &'static str = "war";

    fn name(&self) -> &str {
        &self.name
    }
}

/// Participants are written as repeated `attacker = id` fields or as `attacker = { id ... }`.
fn participants(
    block: &Block,
    key: &str,
    war: &str,
    rulers: &Registry<Ruler>,
) -> Vec<EntityId<Ruler>> {
    let mut result = Vec::new();
    for field in block.get_fields(key) {
        let ids: Vec<&Token> = match field.bv() {
            BV::Value(token) => vec![token],
            BV::Block(block) => block.iter_values().collect(),
        };
        for id in ids {
            if let Some(ruler) = rulers.lookup(id.as_str()) {
                if !result.contains(&ruler) {
                    result.push(ruler);
                }
            } else {
                let msg = format!("{key} {id} in war {war} is not a ruler");
                warn(ErrorKey::Participant).msg(msg).loc(id).push();
            }
        }
    }
    result
}
