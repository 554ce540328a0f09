use crate::block::{Block, BV};
use crate::error::LookupError;
use crate::token::Token;

/// A keyed item in a [`Block`]: `key = value` or `key = { ... }`.
#[derive(Debug, Clone)]
pub struct Field(pub Token, pub BV);

impl Field {
    pub fn key(&self) -> &Token {
        &self.0
    }

    pub fn into_key(self) -> Token {
        self.0
    }

    pub fn bv(&self) -> &BV {
        &self.1
    }

    pub fn bv_mut(&mut self) -> &mut BV {
        &mut self.1
    }

    pub fn into_bv(self) -> BV {
        self.1
    }

    /// The scalar value of a leaf field. It is an error to ask this of a block field.
    pub fn value(&self) -> Result<&Token, LookupError> {
        match &self.1 {
            BV::Value(token) => Ok(token),
            BV::Block(_) => Err(LookupError::NotALeaf {
                at: self.0.loc.marker(),
                key: self.0.to_string(),
            }),
        }
    }

    pub fn get_definition(&self) -> Option<(&Token, &Block)> {
        match self {
            Field(key, BV::Block(block)) => Some((key, block)),
            Field(_, BV::Value(_)) => None,
        }
    }

    pub fn get_assignment(&self) -> Option<(&Token, &Token)> {
        match self {
            Field(key, BV::Value(token)) => Some((key, token)),
            Field(_, BV::Block(_)) => None,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self.1 {
            BV::Value(_) => "assignment",
            BV::Block(_) => "definition",
        }
    }

    pub fn equivalent(&self, other: &Self) -> bool {
        self.0 == other.0 && self.1.equivalent(&other.1)
    }
}
