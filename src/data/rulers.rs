//! Rulers are the characters that hold at least one title.
//!
//! The save only records lieges between titles. The liege relationship between rulers is
//! inferred from that: a ruler's liege is whoever holds the liege title of one of the ruler's
//! titles.

use std::cell::OnceCell;

use crate::block::Block;
use crate::data::titles::{title_reference, Level, Title};
use crate::error::LookupError;
use crate::registry::{Entity, EntityId, Registry};
use crate::report::{err, warn, ErrorKey};
use crate::token::Token;

#[derive(Debug)]
pub struct Ruler {
    id: Token,
    block: Block,
    titles: Vec<EntityId<Title>>,
    primary: Option<EntityId<Title>>,
    liege: Option<EntityId<Ruler>>,
    vassals: Vec<EntityId<Ruler>>,
    /// Own titles plus those of all direct and indirect vassals.
    realm_titles: Vec<EntityId<Title>>,
    enemies: Vec<EntityId<Ruler>>,
    baronies: OnceCell<usize>,
}

impl Ruler {
    /// `titles` are the titles this character holds, in the order they appear in the save.
    pub fn new(
        id: Token,
        block: Block,
        titles: Vec<EntityId<Title>>,
        title_registry: &Registry<Title>,
    ) -> Self {
        let primary = primary_title(&block, &titles, title_registry);
        Self {
            id,
            block,
            realm_titles: titles.clone(),
            titles,
            primary,
            liege: None,
            vassals: Vec::new(),
            enemies: Vec::new(),
            baronies: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &Token {
        &self.id
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// The character's name, if the save records one.
    pub fn character_name(&self) -> Option<&Token> {
        self.block.get_field_value("bn").or_else(|| self.block.get_field_value("name"))
    }

    pub fn titles(&self) -> &[EntityId<Title>] {
        &self.titles
    }

    pub fn primary_title(&self) -> Option<EntityId<Title>> {
        self.primary
    }

    pub fn highest_level(&self, titles: &Registry<Title>) -> Option<Level> {
        self.titles.iter().map(|&t| titles.get(t).level()).max()
    }

    pub fn liege(&self) -> Option<EntityId<Ruler>> {
        self.liege
    }

    pub fn is_independent(&self) -> bool {
        self.liege.is_none()
    }

    /// The ruler at the top of this ruler's liege chain, or `None` if this ruler is independent.
    pub fn top_liege(&self, rulers: &Registry<Ruler>) -> Option<EntityId<Ruler>> {
        let mut top = self.liege?;
        while let Some(liege) = rulers.get(top).liege {
            top = liege;
        }
        Some(top)
    }

    pub fn vassals(&self) -> &[EntityId<Ruler>] {
        &self.vassals
    }

    pub fn titles_including_vassals(&self) -> &[EntityId<Title>] {
        &self.realm_titles
    }

    pub fn enemies(&self) -> &[EntityId<Ruler>] {
        &self.enemies
    }

    pub fn is_enemy(&self, other: EntityId<Ruler>) -> bool {
        self.enemies.contains(&other)
    }

    pub(crate) fn add_enemy(&mut self, enemy: EntityId<Ruler>) {
        if !self.enemies.contains(&enemy) {
            self.enemies.push(enemy);
        }
    }

    /// The barony count, once [`count_baronies`] has been run for this ruler.
    pub fn total_baronies(&self) -> Option<usize> {
        self.baronies.get().copied()
    }
}

impl Entity for Ruler {
    const KIND: &'static str = "ruler";

    fn name(&self) -> &str {
        self.id.as_str()
    }
}

/// The explicitly chosen primary title if it can be found among the held titles, otherwise the
/// first of the highest level titles.
fn primary_title(
    block: &Block,
    held: &[EntityId<Title>],
    titles: &Registry<Title>,
) -> Option<EntityId<Title>> {
    if let Some(primary) = title_reference(block, "primary").and_then(|t| titles.lookup(t.as_str()))
    {
        if held.contains(&primary) {
            return Some(primary);
        }
    }
    let mut best: Option<EntityId<Title>> = None;
    for &title in held {
        if best.is_none_or(|b| titles.get(title).level() > titles.get(b).level()) {
            best = Some(title);
        }
    }
    best
}

/// Find the liege of ruler `id` through its titles, and link the two.
///
/// When the ruler's titles point at more than one other ruler, the first one found wins and the
/// conflict is reported. Liege titles held by the ruler itself are skipped.
pub fn create_liege(
    rulers: &mut Registry<Ruler>,
    titles: &Registry<Title>,
    id: EntityId<Ruler>,
) -> Result<(), LookupError> {
    let ruler = rulers.get(id);
    let mut found: Option<(EntityId<Ruler>, EntityId<Title>)> = None;
    for &title in ruler.titles() {
        let Some(liege_title) = titles.get(title).liege(titles)? else {
            continue;
        };
        let Some(holder) = titles.get(liege_title).holder() else {
            continue;
        };
        let Some(candidate) = rulers.lookup(holder.as_str()) else {
            continue;
        };
        if candidate == id {
            continue;
        }
        match found {
            None => found = Some((candidate, title)),
            Some((liege, first_title)) if liege != candidate => {
                let msg = format!(
                    "ruler {} has more than one liege: {} and {}",
                    ruler.id(),
                    rulers.get(liege).id(),
                    rulers.get(candidate).id()
                );
                let info = "keeping the first liege found";
                // Which liege comes first depends only on the order of the save.
                warn(ErrorKey::LiegeConflict)
                    .weak()
                    .msg(msg)
                    .info(info)
                    .loc(titles.get(first_title).key())
                    .loc(titles.get(title).key(), "conflicting liege through this title")
                    .push();
            }
            Some(_) => (),
        }
    }
    let Some((liege, _)) = found else {
        return Ok(());
    };

    // Linking would close a loop if this ruler is already above the candidate.
    let mut above = Some(liege);
    while let Some(r) = above {
        if r == id {
            let msg = format!("ruler {} would become a vassal of its own vassal", ruler.id());
            err(ErrorKey::LiegeConflict).msg(msg).loc(ruler.id()).push();
            return Ok(());
        }
        above = rulers.get(r).liege;
    }

    let realm = ruler.realm_titles.clone();
    rulers.get_mut(id).liege = Some(liege);
    rulers.get_mut(liege).vassals.push(id);
    let mut above = Some(liege);
    while let Some(r) = above {
        let ruler = rulers.get_mut(r);
        ruler.realm_titles.extend_from_slice(&realm);
        above = ruler.liege;
    }
    Ok(())
}

/// Count the baronies in a ruler's realm: its own barony titles plus those of all its vassals.
/// The count is remembered, and written into the ruler's block as `total_baronies`.
pub fn count_baronies(
    rulers: &mut Registry<Ruler>,
    titles: &Registry<Title>,
    id: EntityId<Ruler>,
) -> usize {
    if let Some(count) = rulers.get(id).total_baronies() {
        return count;
    }
    let ruler = rulers.get(id);
    let mut count =
        ruler.titles.iter().filter(|&&t| titles.get(t).level() == Level::Barony).count();
    for vassal in ruler.vassals.clone() {
        count += count_baronies(rulers, titles, vassal);
    }
    let ruler = rulers.get_mut(id);
    ruler.block.set_field_value("total_baronies", &count.to_string());
    *ruler.baronies.get_or_init(|| count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::pdxfile::parse_pdx;
    use crate::token::Loc;

    fn world(content: &str) -> (Registry<Title>, Registry<Ruler>) {
        let mut block = parse_pdx(&Loc::internal("rulers"), content).unwrap();
        let mut titles = Registry::new();
        for (key, block) in block.drain_definitions() {
            titles.register(Title::new(key, block)).unwrap();
        }
        let mut rulers = Registry::new();
        for (_, title) in titles.iter() {
            let Some(holder) = title.holder() else { continue };
            if rulers.lookup(holder.as_str()).is_some() {
                continue;
            }
            let held = titles
                .iter()
                .filter(|(_, t)| t.holder().is_some_and(|h| h == holder))
                .map(|(id, _)| id)
                .collect();
            let block = Block::new(holder.loc.clone());
            rulers.register(Ruler::new(holder.clone(), block, held, &titles)).unwrap();
        }
        for id in rulers.ids().collect::<Vec<_>>() {
            create_liege(&mut rulers, &titles, id).unwrap();
        }
        (titles, rulers)
    }

    #[test]
    fn test_hierarchy() {
        let (titles, mut rulers) = world(
            "k_france = { holder = 1 }
             d_ile = { holder = 1 liege = k_france }
             c_paris = { holder = 2 liege = d_ile }
             b_paris = { holder = 2 liege = c_paris }
             b_st_denis = { holder = 3 liege = c_paris }
             b_sens = { holder = 1 liege = d_ile }",
        );
        let king = rulers.lookup("1").unwrap();
        let count = rulers.lookup("2").unwrap();
        let baron = rulers.lookup("3").unwrap();
        assert_eq!(rulers.get(count).liege(), Some(king));
        assert_eq!(rulers.get(baron).liege(), Some(count));
        assert_eq!(rulers.get(baron).top_liege(&rulers), Some(king));
        assert!(rulers.get(king).is_independent());
        assert_eq!(rulers.get(king).vassals(), &[count]);
        assert_eq!(rulers.get(king).titles_including_vassals().len(), 6);
        assert_eq!(rulers.get(king).primary_title(), titles.lookup("k_france"));
        assert_eq!(rulers.get(king).highest_level(&titles), Some(Level::Kingdom));

        assert_eq!(count_baronies(&mut rulers, &titles, baron), 1);
        assert_eq!(count_baronies(&mut rulers, &titles, king), 3);
        assert_eq!(count_baronies(&mut rulers, &titles, king), 3);
        assert_eq!(rulers.get(count).total_baronies(), Some(2));
        assert!(rulers.get(king).block().field_value_is("total_baronies", "3"));
    }

    #[test]
    fn test_primary() {
        let content = "d_a = { holder = 1 } k_b = { holder = 1 } k_c = { holder = 1 }";
        let (titles, rulers) = world(content);
        let ruler = rulers.lookup_entity("1").unwrap();
        assert_eq!(ruler.primary_title(), titles.lookup("k_b"));

        let block = parse_pdx(&Loc::internal("c"), "primary = { title = k_c }").unwrap();
        let held = ruler.titles().to_vec();
        let ruler = Ruler::new(ruler.id().clone(), block, held, &titles);
        assert_eq!(ruler.primary_title(), titles.lookup("k_c"));
    }
}
