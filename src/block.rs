//! The [`Block`] type, which is the tree structure of a parsed save file or table file.
//!
//! A block holds an ordered list of items. Each item is a bare value, an anonymous block, or a
//! keyed [`Field`]. Keys may repeat, and the order of items is kept exactly as parsed so that
//! writing the block back out reproduces the document.

use crate::error::LookupError;
use crate::report::{err, ErrorKey};
use crate::token::{Loc, Token};

pub use crate::block::blockitem::BlockItem;
pub use crate::block::bv::BV;
pub use crate::block::field::Field;

mod blockitem;
mod bv;
mod field;
mod writer;

/// What a block holds, as far as the tree model is concerned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// `{ }`, which can be read as either an empty list or an empty collection.
    Empty,
    /// Only bare values: `{ 1 2 3 }`.
    List,
    /// Only keyed fields and anonymous blocks.
    Collection,
    /// Bare values mixed with fields. Not produced by the games, but representable.
    Mixed,
}

#[derive(Clone, Debug)]
pub struct Block {
    v: Vec<BlockItem>,
    pub loc: Loc,
}

impl Block {
    pub fn new(loc: Loc) -> Self {
        Block { v: Vec::new(), loc }
    }

    pub fn add_value(&mut self, value: BV) {
        match value {
            BV::Value(token) => self.v.push(BlockItem::Value(token)),
            BV::Block(block) => self.v.push(BlockItem::Block(block)),
        }
    }

    pub fn add_key_value(&mut self, key: Token, value: BV) {
        self.v.push(BlockItem::Field(Field(key, value)));
    }

    /// Append a field, keeping any earlier fields with the same key.
    /// This is how repeated keys such as `core = ...` are modeled.
    pub fn add_field(&mut self, key: &str, value: BV) {
        let key = Token::new(key, self.loc.clone());
        self.add_key_value(key, value);
    }

    pub fn is_empty(&self) -> bool {
        self.v.is_empty()
    }

    pub fn len(&self) -> usize {
        self.v.len()
    }

    pub fn node_kind(&self) -> NodeKind {
        let mut values = false;
        let mut others = false;
        for item in &self.v {
            match item {
                BlockItem::Value(_) => values = true,
                BlockItem::Block(_) | BlockItem::Field(_) => others = true,
            }
        }
        match (values, others) {
            (false, false) => NodeKind::Empty,
            (true, false) => NodeKind::List,
            (false, true) => NodeKind::Collection,
            (true, true) => NodeKind::Mixed,
        }
    }

    /// Set the value of `name`, replacing whatever it held.
    /// The first field with that key is overwritten in place and any later ones are removed,
    /// so the field keeps its position in the written document. If there was no such field,
    /// it is appended.
    pub fn set_field(&mut self, name: &str, value: BV) {
        let mut value = Some(value);
        self.v.retain_mut(|item| {
            if let BlockItem::Field(Field(key, bv)) = item {
                if key.is(name) {
                    if let Some(value) = value.take() {
                        *bv = value;
                        return true;
                    }
                    return false;
                }
            }
            true
        });
        if let Some(value) = value {
            self.add_field(name, value);
        }
    }

    /// Convenience wrapper for writing a computed scalar into the tree.
    pub fn set_field_value(&mut self, name: &str, value: &str) {
        let token = Token::new(value, self.loc.clone());
        self.set_field(name, BV::Value(token));
    }

    /// Remove all fields with this key. Returns how many were removed.
    pub fn remove_fields(&mut self, name: &str) -> usize {
        let before = self.v.len();
        self.v.retain(|item| !matches!(item, BlockItem::Field(field) if field.key().is(name)));
        before - self.v.len()
    }

    /// Remove the `name = value` assignments whose value is `value`, leaving other fields with
    /// the same key in place. Returns whether any were removed.
    pub fn remove_assignment(&mut self, name: &str, value: &str) -> bool {
        let before = self.v.len();
        self.v.retain(|item| {
            !matches!(item, BlockItem::Field(Field(key, BV::Value(t))) if key.is(name) && t.is(value))
        });
        before != self.v.len()
    }

    /// Move all the values of fields with this key out of the block, in order.
    pub fn take_fields(&mut self, name: &str) -> Vec<BV> {
        let mut taken = Vec::new();
        let mut kept = Vec::with_capacity(self.v.len());
        for item in self.v.drain(..) {
            match item {
                BlockItem::Field(Field(key, bv)) if key.is(name) => taken.push(bv),
                item => kept.push(item),
            }
        }
        self.v = kept;
        taken
    }

    /// Remove the first bare value that matches `literal`, as in removing one entry from a list.
    /// Returns whether a value was found.
    pub fn remove_value(&mut self, literal: &str) -> bool {
        if let Some(idx) =
            self.v.iter().position(|item| matches!(item, BlockItem::Value(t) if t.is(literal)))
        {
            self.v.remove(idx);
            true
        } else {
            false
        }
    }

    /// Get the value of a single `name = value` assignment.
    /// If the key is repeated, the last one wins, as it does in the games.
    pub fn get_field_value(&self, name: &str) -> Option<&Token> {
        for item in self.v.iter().rev() {
            if let BlockItem::Field(Field(key, BV::Value(t))) = item {
                if key.is(name) {
                    return Some(t);
                }
            }
        }
        None
    }

    /// Get the value of an optional `name = value` assignment, or `default` if it's missing.
    pub fn get_field_value_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.get_field_value(name).map_or(default, Token::as_str)
    }

    pub fn field_value_is(&self, name: &str, value: &str) -> bool {
        self.get_field_value(name).is_some_and(|t| t.is(value))
    }

    pub fn get_field_bool(&self, name: &str) -> Option<bool> {
        self.get_field_value(name).map(|t| t.is("yes"))
    }

    pub fn get_field_integer(&self, name: &str) -> Option<i64> {
        self.get_field_value(name).and_then(Token::get_integer)
    }

    pub fn get_field_number(&self, name: &str) -> Option<f64> {
        self.get_field_value(name).and_then(Token::get_number)
    }

    /// Get an optional number. A value that is present but not a number is reported and
    /// treated as absent.
    pub fn get_field_number_or(&self, name: &str, default: f64) -> f64 {
        match self.get_field_value(name) {
            Some(token) => token.get_number().unwrap_or_else(|| {
                let msg = format!("expected a number for `{name}`");
                err(ErrorKey::Structure).msg(msg).loc(token).push();
                default
            }),
            None => default,
        }
    }

    /// Get all the values of `name = value` assignments in this block
    pub fn get_field_values(&self, name: &str) -> Vec<&Token> {
        self.iter_assignments().filter(|(key, _)| key.is(name)).map(|(_, token)| token).collect()
    }

    /// Get the block of a `name = { ... }` definition
    pub fn get_field_block(&self, name: &str) -> Option<&Block> {
        for item in self.v.iter().rev() {
            if let BlockItem::Field(Field(key, BV::Block(b))) = item {
                if key.is(name) {
                    return Some(b);
                }
            }
        }
        None
    }

    pub fn get_field_block_mut(&mut self, name: &str) -> Option<&mut Block> {
        for item in self.v.iter_mut().rev() {
            if let BlockItem::Field(Field(key, BV::Block(b))) = item {
                if key.is(name) {
                    return Some(b);
                }
            }
        }
        None
    }

    /// Get all the blocks of `name = { ... }` definitions in this block
    pub fn get_field_blocks(&self, name: &str) -> Vec<&Block> {
        self.iter_definitions().filter(|(key, _)| key.is(name)).map(|(_, block)| block).collect()
    }

    /// Get all the fields with this key, whatever their values are.
    pub fn get_fields(&self, name: &str) -> Vec<&Field> {
        self.iter_fields().filter(|field| field.key().is(name)).collect()
    }

    /// Get the values of a single `name = { value ... }` list
    pub fn get_field_list(&self, name: &str) -> Option<Vec<&Token>> {
        self.get_field_block(name).map(|b| b.iter_values().collect())
    }

    pub fn get_field(&self, name: &str) -> Option<&BV> {
        for item in self.v.iter().rev() {
            if let BlockItem::Field(Field(key, bv)) = item {
                if key.is(name) {
                    return Some(bv);
                }
            }
        }
        None
    }

    /// Get a field that the document is required to have.
    pub fn get_required(&self, name: &str) -> Result<&BV, LookupError> {
        self.get_field(name)
            .ok_or_else(|| LookupError::MissingField { at: self.loc.marker(), key: name.to_string() })
    }

    pub fn get_required_value(&self, name: &str) -> Result<&Token, LookupError> {
        match self.get_required(name)? {
            BV::Value(token) => Ok(token),
            BV::Block(_) => {
                Err(LookupError::NotALeaf { at: self.loc.marker(), key: name.to_string() })
            }
        }
    }

    pub fn get_required_block(&self, name: &str) -> Result<&Block, LookupError> {
        match self.get_required(name)? {
            BV::Block(block) => Ok(block),
            BV::Value(_) => {
                Err(LookupError::NotABlock { at: self.loc.marker(), key: name.to_string() })
            }
        }
    }

    pub fn get_key(&self, name: &str) -> Option<&Token> {
        self.iter_fields().map(Field::key).filter(|key| key.is(name)).last()
    }

    pub fn has_key(&self, name: &str) -> bool {
        self.get_key(name).is_some()
    }

    pub fn count_keys(&self, name: &str) -> usize {
        self.iter_fields().filter(|field| field.key().is(name)).count()
    }

    pub fn iter_items(&self) -> std::slice::Iter<'_, BlockItem> {
        self.v.iter()
    }

    pub fn iter_fields(&self) -> IterFields<'_> {
        IterFields { iter: self.v.iter() }
    }

    /// "Assignments" are fields that have `key = value`.
    pub fn iter_assignments(&self) -> IterAssignments<'_> {
        IterAssignments { iter: self.v.iter() }
    }

    /// "Definitions" are fields that have `key = { block }`.
    pub fn iter_definitions(&self) -> IterDefinitions<'_> {
        IterDefinitions { iter: self.v.iter() }
    }

    /// Like [`Block::iter_definitions`] but the blocks can be modified in place.
    pub fn iter_definitions_mut(&mut self) -> impl Iterator<Item = (&Token, &mut Block)> {
        self.v.iter_mut().filter_map(|item| match item {
            BlockItem::Field(Field(key, BV::Block(block))) => Some((&*key, block)),
            _ => None,
        })
    }

    /// Take out all the definitions in this block, leaving it empty. Items that are not
    /// definitions are dropped silently.
    pub fn drain_definitions(&mut self) -> impl Iterator<Item = (Token, Block)> + '_ {
        self.v.drain(..).filter_map(|item| match item {
            BlockItem::Field(Field(key, BV::Block(block))) => Some((key, block)),
            _ => None,
        })
    }

    /// Like [`Block::drain_definitions`] but items that are not definitions are reported.
    pub fn drain_definitions_warn(&mut self) -> DrainDefinitions<'_> {
        DrainDefinitions { iter: self.v.drain(..) }
    }

    pub fn iter_values(&self) -> IterValues<'_> {
        IterValues { iter: self.v.iter() }
    }

    pub fn iter_blocks(&self) -> IterBlocks<'_> {
        IterBlocks { iter: self.v.iter() }
    }

    /// Compare two blocks for structural equality, ignoring where their tokens came from.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.v.len() == other.v.len()
            && self.v.iter().zip(other.v.iter()).all(|(a, b)| a.equivalent(b))
    }
}

#[derive(Clone, Debug)]
pub struct IterFields<'a> {
    iter: std::slice::Iter<'a, BlockItem>,
}

impl<'a> Iterator for IterFields<'a> {
    type Item = &'a Field;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(BlockItem::get_field)
    }
}

#[derive(Clone, Debug)]
pub struct IterAssignments<'a> {
    iter: std::slice::Iter<'a, BlockItem>,
}

impl<'a> Iterator for IterAssignments<'a> {
    type Item = (&'a Token, &'a Token);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(BlockItem::get_assignment)
    }
}

#[derive(Clone, Debug)]
pub struct IterDefinitions<'a> {
    iter: std::slice::Iter<'a, BlockItem>,
}

impl<'a> Iterator for IterDefinitions<'a> {
    type Item = (&'a Token, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(BlockItem::get_definition)
    }
}

#[derive(Debug)]
pub struct DrainDefinitions<'a> {
    iter: std::vec::Drain<'a, BlockItem>,
}

impl Iterator for DrainDefinitions<'_> {
    type Item = (Token, Block);

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(BlockItem::expect_into_definition)
    }
}

#[derive(Clone, Debug)]
pub struct IterValues<'a> {
    iter: std::slice::Iter<'a, BlockItem>,
}

impl<'a> Iterator for IterValues<'a> {
    type Item = &'a Token;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(BlockItem::get_value)
    }
}

#[derive(Clone, Debug)]
pub struct IterBlocks<'a> {
    iter: std::slice::Iter<'a, BlockItem>,
}

impl<'a> Iterator for IterBlocks<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.by_ref().find_map(BlockItem::get_block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::pdxfile::parse_pdx;

    fn parse(content: &str) -> Block {
        parse_pdx(&Loc::internal("test"), content).unwrap()
    }

    #[test]
    fn test_repeated_keys() {
        let block = parse("core = FRA core = ENG owner = FRA");
        let cores: Vec<_> = block.get_field_values("core").iter().map(|t| t.as_str()).collect();
        assert_eq!(cores, vec!["FRA", "ENG"]);
        assert_eq!(block.count_keys("core"), 2);
        assert!(block.get_field_blocks("core").is_empty());
    }

    #[test]
    fn test_value_with_default() {
        let block = parse("type = castle");
        assert_eq!(block.get_field_value_or("type", "none"), "castle");
        assert_eq!(block.get_field_value_or("culture", "none"), "none");
        assert!((block.get_field_number_or("tax", 0.5) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_required() {
        let block = parse("liege = { title = k_france } holder = 12");
        assert!(block.get_required_block("liege").is_ok());
        assert_eq!(block.get_required_value("holder").map(Token::as_str), Ok("12"));
        assert!(matches!(
            block.get_required_value("liege"),
            Err(LookupError::NotALeaf { key, .. }) if key == "liege"
        ));
        assert!(matches!(
            block.get_required("missing"),
            Err(LookupError::MissingField { key, .. }) if key == "missing"
        ));
    }

    #[test]
    fn test_set_field_keeps_position() {
        let mut block = parse("a = 1 b = 2 a = 3 c = 4");
        block.set_field_value("a", "5");
        assert!(block.equivalent(&parse("a = 5 b = 2 c = 4")));
        block.set_field_value("d", "6");
        assert!(block.equivalent(&parse("a = 5 b = 2 c = 4 d = 6")));
    }

    #[test]
    fn test_remove() {
        let mut block = parse("core = FRA flags = { a b a } core = ENG");
        assert_eq!(block.remove_fields("core"), 2);
        assert!(!block.has_key("core"));
        let flags = block.get_field_block_mut("flags").unwrap();
        assert!(flags.remove_value("a"));
        assert!(!flags.remove_value("c"));
        assert!(block.equivalent(&parse("flags = { b a }")));
    }

    #[test]
    fn test_remove_assignment() {
        let mut block = parse("core = FRA owner = FRA core = ENG");
        assert!(block.remove_assignment("core", "FRA"));
        assert!(!block.remove_assignment("core", "FRA"));
        assert!(block.equivalent(&parse("owner = FRA core = ENG")));
    }

    #[test]
    fn test_take_fields() {
        let mut block = parse("active_war = { name = a } date = 1066.1.1 active_war = { name = b }");
        let wars = block.take_fields("active_war");
        assert_eq!(wars.len(), 2);
        assert!(wars[1].get_block().is_some_and(|b| b.field_value_is("name", "b")));
        assert!(block.equivalent(&parse("date = 1066.1.1")));
    }

    #[test]
    fn test_node_kinds() {
        let block = parse("list = { 1 2 } coll = { a = 1 } empty = { } mixed = { a b = c }");
        let kind = |name| block.get_field_block(name).unwrap().node_kind();
        assert_eq!(kind("list"), NodeKind::List);
        assert_eq!(kind("coll"), NodeKind::Collection);
        assert_eq!(kind("empty"), NodeKind::Empty);
        assert_eq!(kind("mixed"), NodeKind::Mixed);
    }
}
