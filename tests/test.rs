use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};

use ck2eu_lib::{
    parse_pdx, Confidence, take_reports, ConvertError, ErrorKey, Level, LogReport, LookupError, PdxFile,
    Registry, Ruler, Severity, Side, Tables, Weight, World,
};

static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(|| Mutex::new(()));

const CK_SAVE: &str = "tests/files/ck_save.txt";
const EU_SAVE: &str = "tests/files/eu_save.txt";
const TABLES: &str = "tests/files/tables.txt";

fn build_helper(with_eu: bool) -> (World, Vec<LogReport>) {
    let _guard = TEST_MUTEX.lock().unwrap();
    _ = take_reports();

    let tables = Tables::read(Path::new(TABLES)).unwrap();
    let ck = PdxFile::read(Path::new(CK_SAVE)).unwrap();
    let eu = with_eu.then(|| PdxFile::read(Path::new(EU_SAVE)).unwrap());
    let world = World::build(ck, eu, &tables).unwrap();

    (world, take_reports())
}

fn build_str_helper(ck: &str, tables: &str) -> (Result<World, ConvertError>, Vec<LogReport>) {
    let _guard = TEST_MUTEX.lock().unwrap();
    _ = take_reports();

    let loc = ck2eu_lib::Loc::internal("ck");
    let tables = Tables::from_block(&parse_pdx(&loc, tables).unwrap()).unwrap();
    let world = World::build(parse_pdx(&loc, ck).unwrap(), None, &tables);

    (world, take_reports())
}

fn take_report(vec: &mut Vec<LogReport>, key: ErrorKey, msg_contains: &str) -> Option<LogReport> {
    let i = vec.iter().position(|r| r.key == key && r.msg.contains(msg_contains))?;
    Some(vec.remove(i))
}

fn ruler<'a>(world: &'a World, id: &str) -> &'a Ruler {
    world.rulers.lookup_entity(id).unwrap()
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_rulers() {
    let (world, mut reports) = build_helper(false);

    // Character 7 holds nothing, so it is not a ruler.
    let ids: Vec<_> = world.rulers.all().iter().map(|r| r.id().as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(ruler(&world, "1").character_name().map(|t| t.as_str()), Some("Philippe"));

    let king = world.rulers.lookup("1").unwrap();
    assert!(ruler(&world, "1").is_independent());
    assert!(ruler(&world, "4").is_independent());
    assert_eq!(ruler(&world, "2").liege(), Some(king));
    assert_eq!(ruler(&world, "3").liege(), Some(king));
    assert_eq!(ruler(&world, "5").top_liege(&world.rulers), Some(king));
    assert_eq!(ruler(&world, "1").titles_including_vassals().len(), 11);

    assert_eq!(ruler(&world, "1").primary_title(), world.titles.lookup("k_france"));
    assert_eq!(ruler(&world, "3").primary_title(), world.titles.lookup("d_normandy"));
    assert_eq!(ruler(&world, "5").primary_title(), world.titles.lookup("c_vexin"));
    assert_eq!(ruler(&world, "4").highest_level(&world.titles), Some(Level::Kingdom));

    let report = take_report(&mut reports, ErrorKey::TitleLevel, "x_barony1");
    let report = report.expect("unknown title prefix is reported");
    assert_eq!(report.severity, Severity::Error);
    assert_eq!(report.pointers[0].loc.pathname(), PathBuf::from(CK_SAVE));
    let x_barony = world.titles.lookup_entity("x_barony1").unwrap();
    assert_eq!(x_barony.level(), Level::Barony);
}

#[test]
fn test_conflicting_lieges() {
    let (world, mut reports) = build_helper(false);

    let report = take_report(&mut reports, ErrorKey::LiegeConflict, "ruler 5");
    let report = report.expect("conflicting lieges test");
    // Keeping the first liege is a guess, so the report says so.
    assert_eq!(report.confidence, Confidence::Weak);
    assert_eq!(report.pointers.len(), 2);

    // The first liege found wins: c_vexin is under d_normandy, held by 3.
    let eudes = world.rulers.lookup("5").unwrap();
    let normandy = world.rulers.lookup("3").unwrap();
    assert_eq!(world.rulers.get(eudes).liege(), Some(normandy));
    let in_vassal_lists =
        world.rulers.all().iter().filter(|r| r.vassals().contains(&eudes)).count();
    assert_eq!(in_vassal_lists, 1);
    assert_eq!(world.rulers.get(normandy).vassals(), &[eudes]);
}

#[test]
fn test_count_baronies() {
    let (world, _) = build_helper(false);

    let expected = [("1", 5), ("2", 2), ("3", 2), ("4", 1), ("5", 1)];
    for (id, count) in expected {
        let ruler = ruler(&world, id);
        assert_eq!(ruler.total_baronies(), Some(count), "ruler {id}");
        let written = ruler.block().get_field_integer("total_baronies");
        assert_eq!(written, Some(i64::try_from(count).unwrap()), "ruler {id}");
    }

    // Own baronies plus the totals of the direct vassals.
    for ruler in world.rulers.all() {
        let own = ruler
            .titles()
            .iter()
            .filter(|&&t| world.titles.get(t).level() == Level::Barony)
            .count();
        let vassals: usize = ruler
            .vassals()
            .iter()
            .filter_map(|&v| world.rulers.get(v).total_baronies())
            .sum();
        assert_eq!(ruler.total_baronies(), Some(own + vassals));
    }
}

#[test]
fn test_province_weights() {
    let (world, _) = build_helper(false);

    let paris = world.ck_provinces.lookup_entity("1").unwrap();
    assert_eq!(paris.name(), "Paris");
    assert_eq!(paris.title().map(|t| t.as_str()), Some("c_paris"));
    assert_eq!(paris.settlements(), &["b_paris", "b_st_denis"]);
    assert!(close(paris.weight(Weight::Production), 7.0 + 10.8));
    assert!(close(paris.weight(Weight::Taxation), 4.2 + 7.2));
    assert!(close(paris.weight(Weight::Fortification), 3.0));
    assert!(close(paris.weight(Weight::Manpower), 0.16));
    assert!(close(paris.weight(Weight::Galleys), 5.0));
    assert!(close(paris.weight(Weight::Trade), 1.0));

    // The province total is the sum of the scores written onto its settlements.
    for province in world.ck_provinces.all() {
        for weight in Weight::settlement_categories() {
            let sum: f64 = province
                .settlements()
                .iter()
                .filter_map(|s| province.settlement(s))
                .filter_map(|b| b.get_field_number(&weight.field_name()))
                .sum();
            assert!(close(sum, province.weight(weight)), "{} {weight}", province.id());
        }
    }
    let empty_slot = paris.settlement("b_empty_slot").unwrap();
    assert!(!empty_slot.has_key("weight_production"));

    let rouen = world.ck_provinces.lookup_entity("2").unwrap();
    assert!(close(rouen.weight(Weight::Production), 4.0));
    assert!(close(rouen.weight(Weight::Taxation), 4.0));

    let kent = world.ck_provinces.lookup_entity("3").unwrap();
    assert!(kent.settlements().is_empty());
    assert!(close(kent.weights().total(), 0.0));
}

#[test]
fn test_wars() {
    let (world, mut reports) = build_helper(false);

    let names: Vec<_> = world.wars.all().iter().map(|w| ck2eu_lib::Entity::name(w)).collect();
    assert_eq!(names, vec!["War of X", "War of X 2"]);

    let rulers: &Registry<Ruler> = &world.rulers;
    let id = |name: &str| rulers.lookup(name).unwrap();
    let first = world.wars.lookup_entity("War of X").unwrap();
    let second = world.wars.lookup_entity("War of X 2").unwrap();
    assert_eq!(second.raw_name().as_str(), "War of X");
    assert_eq!(first.attackers(), &[id("4")]);
    assert_eq!(first.defenders(), &[id("1"), id("3")]);
    assert_eq!(second.attackers(), &[id("1")]);
    assert_eq!(second.defenders(), &[id("4")]);
    assert_eq!(first.side_of(id("3")), Side::DEFENDER);
    assert!(second.side_of(id("3")).is_empty());

    let independent = first.participants(rulers, Side::ALL, Ruler::is_independent);
    assert_eq!(independent, vec![id("4"), id("1")]);

    assert_eq!(rulers.get(id("4")).enemies(), &[id("1"), id("3")]);
    assert!(rulers.get(id("3")).is_enemy(id("4")));
    assert!(!rulers.get(id("3")).is_enemy(id("1")));

    let report = take_report(&mut reports, ErrorKey::Participant, "defender 99");
    report.expect("unknown participant test");

    let report = take_report(&mut reports, ErrorKey::WarName, "`War of X`");
    let report = report.expect("duplicate war name test");
    assert_eq!(report.severity, Severity::Warning);
    assert!(report.info.is_some_and(|info| info.contains("`War of X 2`")));
    assert_eq!(report.pointers[0].loc, second.raw_name().loc);
    assert!(take_report(&mut reports, ErrorKey::WarName, "").is_none());
}

#[test]
fn test_eu_side() {
    let (mut world, _) = build_helper(true);

    assert_eq!(world.eu_provinces.len(), 3);
    let paris = world.eu_provinces.lookup("183").unwrap();
    let kent = world.eu_provinces.lookup("236").unwrap();
    let fra = world.countries.lookup("FRA").unwrap();
    assert_eq!(world.countries.get(fra).capital().map(|t| t.as_str()), Some("183"));
    assert_eq!(world.countries.get(fra).provinces(&world.eu_provinces), vec![paris]);

    let cores: Vec<_> =
        world.eu_provinces.get(kent).cores().iter().map(|t| t.to_string()).collect();
    assert_eq!(cores, vec!["ENG", "FRA"]);

    let ck_paris = world.ck_provinces.lookup("1").unwrap();
    world.assign_target(ck_paris, paris);
    world.assign_target(ck_paris, paris);
    assert_eq!(world.ck_provinces.get(ck_paris).targets(), &[paris]);
    assert_eq!(world.eu_provinces.get(paris).sources(), &[ck_paris]);

    let king = world.rulers.lookup("1").unwrap();
    world.assign_ruler(fra, king);
    assert_eq!(world.countries.get(fra).ruler(), Some(king));
}

#[test]
fn test_round_trip() {
    let _guard = TEST_MUTEX.lock().unwrap();

    let block = PdxFile::read(Path::new(CK_SAVE)).unwrap();
    let loc = ck2eu_lib::Loc::internal("written");
    let again = parse_pdx(&loc, &block.to_string()).unwrap();
    assert!(block.equivalent(&again));

    _ = take_reports();
}

#[test]
fn test_write_back() {
    let (world, _) = build_helper(false);

    let loc = ck2eu_lib::Loc::internal("written");
    let written = parse_pdx(&loc, &world.ck_provinces_block().to_string()).unwrap();
    let provinces = written.get_field_block("provinces").unwrap();
    let paris = provinces.get_field_block("1").unwrap();
    let st_denis = paris.get_field_block("b_st_denis").unwrap();
    assert!(close(st_denis.get_field_number("weight_production").unwrap(), 10.8));
    assert!(close(st_denis.get_field_number("weight_fortification").unwrap(), 2.0));

    let written = parse_pdx(&loc, &world.rulers_block().to_string()).unwrap();
    let characters = written.get_field_block("character").unwrap();
    assert_eq!(characters.iter_definitions().count(), world.rulers.len());
    let king = characters.get_field_block("1").unwrap();
    assert_eq!(king.get_field_integer("total_baronies"), Some(5));
    assert_eq!(king.get_field_value("bn").map(|t| t.as_str()), Some("Philippe"));
}

#[test]
fn test_windows_1252() {
    let _guard = TEST_MUTEX.lock().unwrap();
    _ = take_reports();

    let block = PdxFile::read(Path::new("tests/files/windows1252.txt")).unwrap();
    let character = block.get_field_block("character").unwrap().get_field_block("1").unwrap();
    assert_eq!(character.get_field_value_or("bn", ""), "Vratislav z Bohmêns");

    let mut reports = take_reports();
    let report = take_report(&mut reports, ErrorKey::Encoding, "Windows-1252");
    report.expect("encoding fallback test");
}

#[test]
fn test_missing_liege_title() {
    let (world, mut reports) = build_str_helper(
        "title = { c_paris = { holder = 1 liege = d_nowhere } }",
        "settlement_types = { } buildings = { }",
    );
    assert!(matches!(
        world,
        Err(ConvertError::Lookup(LookupError::MissingTitle { title, liege }))
            if title == "c_paris" && liege == "d_nowhere"
    ));
    let report = take_report(&mut reports, ErrorKey::MissingItem, "d_nowhere");
    assert_eq!(report.map(|r| r.severity), Some(Severity::Fatal));
}

#[test]
fn test_missing_settlement_type() {
    let (world, mut reports) = build_str_helper(
        "provinces = { 1 = { b_a = { type = tribal } } }",
        "settlement_types = { castle = { } } buildings = { }",
    );
    assert!(matches!(
        world,
        Err(ConvertError::Lookup(LookupError::MissingSettlementType { kind, .. })) if kind == "tribal"
    ));
    let report = take_report(&mut reports, ErrorKey::Settlement, "tribal");
    assert_eq!(report.map(|r| r.severity), Some(Severity::Fatal));
}

#[test]
fn test_city_one() {
    let (world, _) = build_str_helper(
        "provinces = { 1 = { b_city_one = { type = city ct_wall_1 = yes } } }",
        "settlement_types = { city = { cost = 10 prod = 0.6 tax = 0.4 } }
         buildings = { ct_wall_1 = { weight = 5 fort_level = 2 } }",
    );
    let world = world.unwrap();
    let province = world.ck_provinces.lookup_entity("1").unwrap();
    assert!(close(province.weight(Weight::Production), 9.0));
    assert!(close(province.weight(Weight::Taxation), 6.0));
    assert!(close(province.weight(Weight::Fortification), 2.0));
}

#[test]
fn test_unknown_unit() {
    let (world, mut reports) = build_str_helper(
        "provinces = { 1 = { b_a = { type = castle levy = { mystery_f = 100 knights_f = 10 } } } }",
        "settlement_types = { castle = { } } buildings = { }",
    );
    let world = world.unwrap();
    let province = world.ck_provinces.lookup_entity("1").unwrap();
    assert!(close(province.weight(Weight::Manpower), 100.0 * 0.0001 + 10.0 * 0.005));

    let report = take_report(&mut reports, ErrorKey::Settlement, "mystery_f");
    let report = report.expect("unknown unit test");
    assert_eq!(report.severity, Severity::Untidy);
    assert!(take_report(&mut reports, ErrorKey::Settlement, "knights_f").is_none());
}

#[test]
fn test_settlement_type_block() {
    let (world, mut reports) = build_str_helper(
        "provinces = { 1 = { b_a = { type = { castle } } b_b = { type = castle } } }",
        "settlement_types = { castle = { cost = 4 } } buildings = { }",
    );
    let world = world.unwrap();
    let province = world.ck_provinces.lookup_entity("1").unwrap();
    assert_eq!(province.settlements(), &["b_b"]);
    assert!(close(province.weight(Weight::Production), 2.0));
    assert!(!province.settlement("b_a").unwrap().has_key("weight_production"));

    let report = take_report(&mut reports, ErrorKey::Settlement, "b_a");
    assert_eq!(report.map(|r| r.severity), Some(Severity::Warning));
}

#[test]
fn test_settlement_placeholder() {
    let (world, mut reports) = build_str_helper(
        "provinces = { 1 = { b_empty = { } c_x = { type = castle } } }",
        "settlement_types = { castle = { } } buildings = { }",
    );
    let world = world.unwrap();
    assert!(world.ck_provinces.lookup_entity("1").unwrap().settlements().is_empty());

    let report = take_report(&mut reports, ErrorKey::Settlement, "b_empty");
    assert_eq!(report.map(|r| r.severity), Some(Severity::Tips));
    // Only barony records are settlement candidates.
    assert!(take_report(&mut reports, ErrorKey::Settlement, "c_x").is_none());
}
