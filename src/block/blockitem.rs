use crate::block::{Block, Field, BV};
use crate::report::{err, ErrorKey};
use crate::token::Token;

/// One entry in a [`Block`]: a bare value, an anonymous block, or a keyed field.
#[derive(Debug, Clone)]
pub enum BlockItem {
    Value(Token),
    Block(Block),
    Field(Field),
}

impl BlockItem {
    pub fn get_field(&self) -> Option<&Field> {
        match self {
            BlockItem::Field(field) => Some(field),
            _ => None,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self, BlockItem::Field(_))
    }

    pub fn get_value(&self) -> Option<&Token> {
        match self {
            BlockItem::Value(token) => Some(token),
            _ => None,
        }
    }

    pub fn get_block(&self) -> Option<&Block> {
        match self {
            BlockItem::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn get_definition(&self) -> Option<(&Token, &Block)> {
        self.get_field().and_then(Field::get_definition)
    }

    pub fn expect_into_definition(self) -> Option<(Token, Block)> {
        match self {
            BlockItem::Field(Field(key, BV::Block(block))) => Some((key, block)),
            BlockItem::Field(field) => {
                let msg = format!("expected definition, found {}", field.describe());
                err(ErrorKey::Structure).msg(msg).loc(&field).push();
                None
            }
            BlockItem::Value(token) => {
                err(ErrorKey::Structure).msg("expected definition, found value").loc(token).push();
                None
            }
            BlockItem::Block(block) => {
                let msg = "expected definition, found block";
                err(ErrorKey::Structure).msg(msg).loc(&block).push();
                None
            }
        }
    }

    pub fn get_assignment(&self) -> Option<(&Token, &Token)> {
        self.get_field().and_then(Field::get_assignment)
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BlockItem::Value(_) => "value",
            BlockItem::Block(_) => "block",
            BlockItem::Field(field) => field.describe(),
        }
    }

    pub fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (BlockItem::Value(t1), BlockItem::Value(t2)) => t1 == t2,
            (BlockItem::Block(b1), BlockItem::Block(b2)) => b1.equivalent(b2),
            (BlockItem::Field(f1), BlockItem::Field(f2)) => f1.equivalent(f2),
            _ => false,
        }
    }
}
