use crate::block::{Block, Field, BV};
use crate::token::{Loc, Token};

/// This trait lets the report functions accept a variety of things as the error locator.
pub trait ErrorLoc {
    fn loc_length(&self) -> usize {
        1
    }
    fn into_loc(self) -> Loc;
}

impl ErrorLoc for Loc {
    fn into_loc(self) -> Loc {
        self
    }
}

impl ErrorLoc for &Loc {
    fn into_loc(self) -> Loc {
        self.clone()
    }
}

impl ErrorLoc for Token {
    fn loc_length(&self) -> usize {
        self.as_str().chars().count().max(1)
    }

    fn into_loc(self) -> Loc {
        self.loc
    }
}

impl ErrorLoc for &Token {
    fn loc_length(&self) -> usize {
        self.as_str().chars().count().max(1)
    }

    fn into_loc(self) -> Loc {
        self.loc.clone()
    }
}

impl ErrorLoc for &Block {
    fn into_loc(self) -> Loc {
        self.loc.clone()
    }
}

impl ErrorLoc for &Field {
    fn loc_length(&self) -> usize {
        self.key().loc_length()
    }

    fn into_loc(self) -> Loc {
        self.key().loc.clone()
    }
}

impl ErrorLoc for &BV {
    fn loc_length(&self) -> usize {
        match self {
            BV::Value(token) => token.loc_length(),
            BV::Block(_) => 1,
        }
    }

    fn into_loc(self) -> Loc {
        match self {
            BV::Value(token) => token.loc.clone(),
            BV::Block(block) => block.loc.clone(),
        }
    }
}
