//! Writing a [`Block`] back out in the save file format.
//!
//! The top-level block is written without braces, one item per line. Nested blocks that hold
//! only values are written on one line, as the games do for lists. Other nested blocks get one
//! item per line, indented by tabs.

use std::fmt::{Display, Formatter, Result};

use crate::block::{Block, BlockItem, Field, NodeKind, BV};
use crate::token::Token;

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write_items(f, self, 0)
    }
}

fn write_items(f: &mut Formatter<'_>, block: &Block, indent: usize) -> Result {
    for item in block.iter_items() {
        write_indent(f, indent)?;
        match item {
            BlockItem::Value(token) => write_token(f, token)?,
            BlockItem::Block(block) => write_block(f, block, indent)?,
            BlockItem::Field(Field(key, bv)) => {
                write_token(f, key)?;
                f.write_str(" = ")?;
                match bv {
                    BV::Value(token) => write_token(f, token)?,
                    BV::Block(block) => write_block(f, block, indent)?,
                }
            }
        }
        f.write_str("\n")?;
    }
    Ok(())
}

fn write_block(f: &mut Formatter<'_>, block: &Block, indent: usize) -> Result {
    match block.node_kind() {
        NodeKind::Empty => f.write_str("{ }"),
        NodeKind::List => {
            f.write_str("{")?;
            for token in block.iter_values() {
                f.write_str(" ")?;
                write_token(f, token)?;
            }
            f.write_str(" }")
        }
        NodeKind::Collection | NodeKind::Mixed => {
            f.write_str("{\n")?;
            write_items(f, block, indent + 1)?;
            write_indent(f, indent)?;
            f.write_str("}")
        }
    }
}

fn write_token(f: &mut Formatter<'_>, token: &Token) -> Result {
    if token.is_bare() {
        f.write_str(token.as_str())
    } else {
        write!(f, "\"{}\"", token.as_str())
    }
}

fn write_indent(f: &mut Formatter<'_>, indent: usize) -> Result {
    for _ in 0..indent {
        f.write_str("\t")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parse::pdxfile::parse_pdx;
    use crate::token::Loc;

    #[test]
    fn test_write() {
        let loc = Loc::internal("test");
        let block = parse_pdx(&loc, "a=1 l={1 2} c={x=y e={} } name=\"War of X\"").unwrap();
        let expected = "a = 1\nl = { 1 2 }\nc = {\n\tx = y\n\te = { }\n}\nname = \"War of X\"\n";
        assert_eq!(block.to_string(), expected);
    }

    #[test]
    fn test_round_trip() {
        let loc = Loc::internal("test");
        let text = "
            c_paris = {
                name = \"Paris\"
                b_paris = { type = city ct_marketplace_1 = yes }
                levy = { light_infantry_f = { 120.000 150.000 } }
            }
            core = FRA core = ENG
            flags = { }
            { 1 2 }
        ";
        let block = parse_pdx(&loc, text).unwrap();
        let again = parse_pdx(&loc, &block.to_string()).unwrap();
        assert!(block.equivalent(&again));
    }
}
