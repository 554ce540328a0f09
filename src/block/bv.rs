use crate::block::Block;
use crate::report::{err, ErrorKey};
use crate::token::Token;

/// `BV` is the value part of a `Field`, which represents keyed items in `Block`.
/// It is itself either a `Block` or a single-token `Value`.
#[derive(Clone, Debug)]
pub enum BV {
    Value(Token),
    Block(Block),
}

impl BV {
    pub fn get_block(&self) -> Option<&Block> {
        match self {
            BV::Value(_) => None,
            BV::Block(b) => Some(b),
        }
    }

    pub fn get_value(&self) -> Option<&Token> {
        match self {
            BV::Value(t) => Some(t),
            BV::Block(_) => None,
        }
    }

    pub fn expect_block(&self) -> Option<&Block> {
        match self {
            BV::Value(_) => {
                err(ErrorKey::Structure).msg("expected block, found value").loc(self).push();
                None
            }
            BV::Block(b) => Some(b),
        }
    }

    pub fn expect_value(&self) -> Option<&Token> {
        match self {
            BV::Value(t) => Some(t),
            BV::Block(_) => {
                err(ErrorKey::Structure).msg("expected value, found block").loc(self).push();
                None
            }
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, BV::Value(_))
    }

    pub fn is_block(&self) -> bool {
        !self.is_value()
    }

    pub fn into_block(self) -> Option<Block> {
        match self {
            BV::Value(_) => None,
            BV::Block(b) => Some(b),
        }
    }

    pub fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (BV::Value(t1), BV::Value(t2)) => t1 == t2,
            (BV::Block(b1), BV::Block(b2)) => b1.equivalent(b2),
            _ => false,
        }
    }
}
