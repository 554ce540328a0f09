//! The [`World`] holds every entity of one conversion run and builds them from the documents.

use ahash::{AHashMap, AHashSet};

use crate::block::{Block, BV};
use crate::data::countries::Country;
use crate::data::provinces::{CkProvince, EuProvince};
use crate::data::rulers::{count_baronies, create_liege, Ruler};
use crate::data::titles::Title;
use crate::data::wars::War;
use crate::error::{ConvertError, InvariantError};
use crate::registry::{Entity, EntityId, Registry};
use crate::report::{err, fatal, warn, ErrorKey, ErrorLoc};
use crate::tables::Tables;
use crate::token::{Loc, Token};

#[derive(Debug, Default)]
pub struct World {
    pub titles: Registry<Title>,
    pub rulers: Registry<Ruler>,
    pub ck_provinces: Registry<CkProvince>,
    pub eu_provinces: Registry<EuProvince>,
    pub wars: Registry<War>,
    pub countries: Registry<Country>,
    /// How many wars have been seen with each name as written in the save.
    war_names: AHashMap<String, usize>,
}

impl World {
    /// Build the entity graph from a CK save and optionally an EU save.
    ///
    /// The sections that the entities are made from are moved out of `ck` and `eu`. Whatever is
    /// left of the documents can be ignored.
    pub fn build(mut ck: Block, eu: Option<Block>, tables: &Tables) -> Result<Self, ConvertError> {
        let mut world = World::default();
        world.load_titles(&mut ck)?;
        world.load_rulers(&mut ck)?;
        world.link_rulers()?;
        world.load_ck_provinces(&mut ck, tables)?;
        world.load_wars(&mut ck)?;
        if let Some(mut eu) = eu {
            world.load_eu_provinces(&mut eu)?;
            world.load_countries(&mut eu)?;
        }
        world.eu_provinces.seal();
        world.countries.seal();
        Ok(world)
    }

    fn load_titles(&mut self, ck: &mut Block) -> Result<(), ConvertError> {
        for mut section in sections(ck, "title") {
            for (key, block) in section.drain_definitions_warn() {
                let loc = key.clone();
                register(&mut self.titles, Title::new(key, block), loc)?;
            }
        }
        self.titles.seal();
        Ok(())
    }

    /// Every title holder becomes a ruler. Holders are registered in the order of the
    /// `character` section, and holders without a character record come last.
    fn load_rulers(&mut self, ck: &mut Block) -> Result<(), ConvertError> {
        let mut held: AHashMap<&str, Vec<EntityId<Title>>> = AHashMap::default();
        let mut holders = Vec::new();
        for (id, title) in self.titles.iter() {
            if let Some(holder) = title.holder() {
                held.entry(holder.as_str())
                    .or_insert_with(|| {
                        holders.push(holder);
                        Vec::new()
                    })
                    .push(id);
            }
        }

        let mut rulers = Registry::new();
        for mut section in sections(ck, "character") {
            for (key, block) in section.drain_definitions() {
                if let Some(titles) = held.remove(key.as_str()) {
                    let loc = key.clone();
                    register(&mut rulers, Ruler::new(key, block, titles, &self.titles), loc)?;
                }
            }
        }
        for holder in holders {
            if let Some(titles) = held.remove(holder.as_str()) {
                let msg = format!("title holder {holder} has no character record");
                warn(ErrorKey::MissingItem).msg(msg).loc(holder).push();
                let block = Block::new(holder.loc.clone());
                let ruler = Ruler::new(holder.clone(), block, titles, &self.titles);
                register(&mut rulers, ruler, holder)?;
            }
        }
        rulers.seal();
        self.rulers = rulers;
        Ok(())
    }

    fn link_rulers(&mut self) -> Result<(), ConvertError> {
        let ids: Vec<_> = self.rulers.ids().collect();
        for &id in &ids {
            create_liege(&mut self.rulers, &self.titles, id).map_err(|e| {
                let ruler = self.rulers.get(id);
                fatal(ErrorKey::MissingItem).msg(e.to_string()).loc(ruler.id()).push();
                e
            })?;
        }
        for &id in &ids {
            count_baronies(&mut self.rulers, &self.titles, id);
        }
        Ok(())
    }

    fn load_ck_provinces(&mut self, ck: &mut Block, tables: &Tables) -> Result<(), ConvertError> {
        for mut section in sections(ck, "provinces") {
            for (key, block) in section.drain_definitions_warn() {
                let loc = key.clone();
                let mut province = CkProvince::new(key, block);
                province.compute_weights(tables).map_err(|e| {
                    fatal(ErrorKey::Settlement).msg(e.to_string()).loc(province.id()).push();
                    e
                })?;
                register(&mut self.ck_provinces, province, loc)?;
            }
        }
        self.ck_provinces.seal();
        Ok(())
    }

    fn load_wars(&mut self, ck: &mut Block) -> Result<(), ConvertError> {
        for block in into_blocks(ck.take_fields("active_war")) {
            let raw_name = if let Some(name) = block.get_field_value("name") {
                name.clone()
            } else {
                let msg = "war without a name";
                err(ErrorKey::WarName).msg(msg).loc(&block).push();
                Token::new("Unnamed war", block.loc.clone())
            };
            let name = self.unique_war_name(raw_name.as_str());
            if name != raw_name.as_str() {
                let msg = format!("more than one war is named `{raw_name}`, renaming this one");
                let info = format!("this war is registered as `{name}`");
                warn(ErrorKey::WarName).msg(msg).info(info).loc(&raw_name).push();
            }
            let war = War::new(name, raw_name.clone(), block, &self.rulers);
            for &attacker in war.attackers() {
                for &defender in war.defenders() {
                    self.rulers.get_mut(attacker).add_enemy(defender);
                    self.rulers.get_mut(defender).add_enemy(attacker);
                }
            }
            register(&mut self.wars, war, raw_name)?;
        }
        self.wars.seal();
        Ok(())
    }

    /// The first war with a given name keeps it. Later ones get " 2", " 3", ... appended.
    fn unique_war_name(&mut self, raw: &str) -> String {
        let seen = self.war_names.entry(raw.to_string()).or_insert(0);
        *seen += 1;
        let mut name = if *seen == 1 { raw.to_string() } else { format!("{raw} {seen}") };
        while self.wars.lookup(&name).is_some() {
            let seen = self.war_names.entry(raw.to_string()).or_insert(0);
            *seen += 1;
            name = format!("{raw} {seen}");
        }
        name
    }

    fn load_eu_provinces(&mut self, eu: &mut Block) -> Result<(), ConvertError> {
        for mut section in sections(eu, "provinces") {
            for (key, block) in section.drain_definitions_warn() {
                let loc = key.clone();
                register(&mut self.eu_provinces, EuProvince::new(key, block), loc)?;
            }
        }
        Ok(())
    }

    fn load_countries(&mut self, eu: &mut Block) -> Result<(), ConvertError> {
        for mut section in sections(eu, "countries") {
            for (key, block) in section.drain_definitions_warn() {
                let loc = key.clone();
                register(&mut self.countries, Country::new(key, block), loc)?;
            }
        }
        Ok(())
    }

    /// Record that source province `ck` feeds target province `eu`, on both sides.
    pub fn assign_target(&mut self, ck: EntityId<CkProvince>, eu: EntityId<EuProvince>) {
        self.ck_provinces.get_mut(ck).assign_target(eu);
        self.eu_provinces.get_mut(eu).add_source(ck);
    }

    /// Make `ruler` the source of `country`. A country has one ruler, so reassigning it replaces
    /// the earlier one with a warning.
    pub fn assign_ruler(&mut self, country: EntityId<Country>, ruler: EntityId<Ruler>) {
        let previous = self.countries.get_mut(country).assign_ruler(ruler);
        if let Some(previous) = previous.filter(|&p| p != ruler) {
            let country = self.countries.get(country);
            let msg = format!(
                "country {} was made from ruler {}, now from ruler {}",
                country.tag(),
                self.rulers.get(previous).id(),
                self.rulers.get(ruler).id()
            );
            warn(ErrorKey::Mapping).msg(msg).loc(country.tag()).push();
        }
    }

    /// The rulers that are at war with `ruler` in any war.
    pub fn enemies_of(&self, ruler: EntityId<Ruler>) -> AHashSet<EntityId<Ruler>> {
        self.rulers.get(ruler).enemies().iter().copied().collect()
    }

    /// A `provinces` section holding the scored CK provinces, with their settlement weights.
    pub fn ck_provinces_block(&self) -> Block {
        let entries = self.ck_provinces.all().iter().map(|p| (p.id(), p.block()));
        section_block("provinces", entries)
    }

    /// A `character` section holding the rulers, with their `total_baronies` counts.
    pub fn rulers_block(&self) -> Block {
        section_block("character", self.rulers.all().iter().map(|r| (r.id(), r.block())))
    }
}

/// Wrap copies of entity blocks in a top-level `key = { id = { ... } ... }` section.
fn section_block<'a, I>(key: &str, entries: I) -> Block
where
    I: Iterator<Item = (&'a Token, &'a Block)>,
{
    let mut section: Option<Block> = None;
    for (id, block) in entries {
        let section = section.get_or_insert_with(|| Block::new(block.loc.clone()));
        section.add_key_value(id.clone(), BV::Block(block.clone()));
    }
    let section = section.unwrap_or_else(|| Block::new(Loc::internal(key)));
    let mut top = Block::new(section.loc.clone());
    top.add_field(key, BV::Block(section));
    top
}

/// Move the blocks of all top-level `key = { ... }` sections out of the document.
fn sections(doc: &mut Block, key: &str) -> Vec<Block> {
    into_blocks(doc.take_fields(key))
}

fn into_blocks(bvs: Vec<BV>) -> Vec<Block> {
    bvs.into_iter()
        .filter_map(|bv| match bv {
            BV::Block(block) => Some(block),
            BV::Value(token) => {
                err(ErrorKey::Structure).msg("expected block, found value").loc(token).push();
                None
            }
        })
        .collect()
}

fn register<T: Entity, E: ErrorLoc>(
    registry: &mut Registry<T>,
    entity: T,
    eloc: E,
) -> Result<EntityId<T>, ConvertError> {
    registry.register(entity).map_err(|e| {
        let key = match e {
            InvariantError::DuplicateName { .. } => ErrorKey::DuplicateName,
            InvariantError::Sealed { .. } => ErrorKey::Sealed,
        };
        fatal(key).msg(e.to_string()).loc(eloc).push();
        ConvertError::from(e)
    })
}
