use std::cell::OnceCell;

use strum_macros::{Display, EnumIter};

use crate::block::{Block, BV};
use crate::error::LookupError;
use crate::registry::{Entity, EntityId, Registry};
use crate::report::{err, ErrorKey};
use crate::token::Token;

#[derive(Copy, Clone, Debug, Ord, PartialOrd, Eq, PartialEq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Level {
    Barony,
    County,
    Duchy,
    Kingdom,
    Empire,
}

impl TryFrom<&str> for Level {
    type Error = ();

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        if s.starts_with("b_") {
            Ok(Level::Barony)
        } else if s.starts_with("c_") {
            Ok(Level::County)
        } else if s.starts_with("d_") {
            Ok(Level::Duchy)
        } else if s.starts_with("k_") {
            Ok(Level::Kingdom)
        } else if s.starts_with("e_") {
            Ok(Level::Empire)
        } else {
            Err(())
        }
    }
}

impl Level {
    /// The level of a title, from its prefix. Titles without a recognized prefix are reported
    /// and treated as baronies.
    pub fn of_title(key: &Token) -> Self {
        Level::try_from(key.as_str()).unwrap_or_else(|()| {
            let msg = format!("cannot tell the level of title `{key}`");
            let info = "title names should start with b_, c_, d_, k_ or e_; treating it as a barony";
            err(ErrorKey::TitleLevel).msg(msg).info(info).loc(key).push();
            Level::Barony
        })
    }
}

/// Read a reference to another title, which the saves write either as `key = k_france` or as
/// `key = { title = k_france ... }`.
pub(crate) fn title_reference<'a>(block: &'a Block, key: &str) -> Option<&'a Token> {
    match block.get_field(key)? {
        BV::Value(token) => Some(token),
        BV::Block(block) => block.get_field_value("title"),
    }
}

#[derive(Debug)]
pub struct Title {
    key: Token,
    block: Block,
    level: Level,
    liege: OnceCell<Option<EntityId<Title>>>,
}

impl Title {
    pub fn new(key: Token, block: Block) -> Self {
        let level = Level::of_title(&key);
        Self { key, block, level, liege: OnceCell::new() }
    }

    pub fn key(&self) -> &Token {
        &self.key
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// The character id of the holder, if the title is held.
    pub fn holder(&self) -> Option<&Token> {
        self.block.get_field_value("holder").filter(|t| !t.is("0"))
    }

    /// The name of the liege title, as written in the save.
    pub fn liege_name(&self) -> Option<&Token> {
        title_reference(&self.block, "liege")
    }

    pub fn de_jure_liege(&self) -> Option<&Token> {
        title_reference(&self.block, "de_jure_liege")
    }

    /// The liege title. This is looked up once and then remembered.
    ///
    /// A title whose liege is held by the same ruler still has that liege here; callers that
    /// care about rulers have to skip it themselves.
    pub fn liege(&self, titles: &Registry<Title>) -> Result<Option<EntityId<Title>>, LookupError> {
        if let Some(liege) = self.liege.get() {
            return Ok(*liege);
        }
        let liege = match self.liege_name() {
            Some(name) => Some(titles.lookup(name.as_str()).ok_or_else(|| {
                LookupError::MissingTitle { title: self.key.to_string(), liege: name.to_string() }
            })?),
            None => None,
        };
        Ok(*self.liege.get_or_init(|| liege))
    }
}

impl Entity for Title {
    const KIND: &'static str = "title";

    fn name(&self) -> &str {
        self.key.as_str()
    }
}
