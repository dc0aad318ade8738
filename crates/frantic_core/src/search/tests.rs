//! End-to-end engine tests over a small fixture catalog.

use crate::cards::testing::{card_columns, stat_index, FaceFixture};
use crate::cards::{Format, Layout, PrintingColumns, Rarity, SetRecord};

use super::eval::NodeError;
use super::SearchEngine;

const U: u8 = 2;
const R: u8 = 8;
const G: u8 = 16;

// Face rows of the fixture catalog.
const BOLT: u32 = 0;
const BEARS: u32 = 1;
const DELVER: u32 = 2;
const ABERRATION: u32 = 3;
const NIV: u32 = 4;
const SOL_RING: u32 = 5;
const IZZET_CHARM: u32 = 6;
const TARMOGOYF: u32 = 7;
const BIRDS: u32 = 8;
const CRAW_WURM: u32 = 9;
const FLAMETONGUE: u32 = 10;
const BALL_LIGHTNING: u32 = 11;

fn catalog() -> Vec<FaceFixture> {
    let modern = Format::Modern.bit();
    let commander = Format::Commander.bit();
    vec![
        FaceFixture {
            name: "Lightning Bolt",
            mana_cost: "{R}",
            type_line: "Instant",
            oracle_text: "Lightning Bolt deals 3 damage to any target.",
            mana_value: 1,
            color: R,
            color_identity: R,
            legal: modern | commander,
            canonical_face: 0,
            combined_name: "Lightning Bolt",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Grizzly Bears",
            mana_cost: "{1}{G}",
            type_line: "Creature — Bear",
            oracle_text: "",
            power: stat_index("2"),
            toughness: stat_index("2"),
            mana_value: 2,
            color: G,
            color_identity: G,
            legal: modern | commander,
            canonical_face: 1,
            combined_name: "Grizzly Bears",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Delver of Secrets",
            mana_cost: "{U}",
            type_line: "Creature — Human Wizard",
            oracle_text: "At the beginning of your upkeep, look at the top card of your library.",
            power: stat_index("1"),
            toughness: stat_index("1"),
            mana_value: 1,
            color: U,
            color_identity: U,
            layout: Layout::Transform,
            legal: modern,
            canonical_face: 2,
            combined_name: "Delver of Secrets // Insectile Aberration",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Insectile Aberration",
            mana_cost: "",
            type_line: "Creature — Human Insect",
            oracle_text: "Flying",
            power: stat_index("3"),
            toughness: stat_index("2"),
            mana_value: 1,
            color: U,
            color_identity: U,
            layout: Layout::Transform,
            legal: modern,
            canonical_face: 2,
            combined_name: "Delver of Secrets // Insectile Aberration",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Niv-Mizzet, Parun",
            mana_cost: "{U}{U}{U}{R}{R}{R}",
            type_line: "Legendary Creature — Dragon Wizard",
            oracle_text: "This spell can't be countered.\nFlying",
            power: stat_index("5"),
            toughness: stat_index("5"),
            mana_value: 6,
            color: U | R,
            color_identity: U | R,
            legal: commander,
            canonical_face: 4,
            combined_name: "Niv-Mizzet, Parun",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Sol Ring",
            mana_cost: "{1}",
            type_line: "Artifact",
            oracle_text: "{T}: Add {C}{C}.",
            mana_value: 1,
            color: 0,
            color_identity: 0,
            legal: commander,
            canonical_face: 5,
            combined_name: "Sol Ring",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Izzet Charm",
            mana_cost: "{U}{R}",
            type_line: "Instant",
            oracle_text: "Choose one —",
            mana_value: 2,
            color: U | R,
            color_identity: U | R,
            legal: modern | commander,
            canonical_face: 6,
            combined_name: "Izzet Charm",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Tarmogoyf",
            mana_cost: "{1}{G}",
            type_line: "Creature — Lhurgoyf",
            oracle_text: "Tarmogoyf's power is equal to the number of card types among cards in all graveyards.",
            power: stat_index("*"),
            toughness: stat_index("1+*"),
            mana_value: 2,
            color: G,
            color_identity: G,
            legal: modern,
            canonical_face: 7,
            combined_name: "Tarmogoyf",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Birds of Paradise",
            mana_cost: "{G}",
            type_line: "Creature — Bird",
            oracle_text: "Flying\n{T}: Add one mana of any color.",
            power: stat_index("0"),
            toughness: stat_index("1"),
            mana_value: 1,
            color: G,
            color_identity: G,
            legal: modern | commander,
            canonical_face: 8,
            combined_name: "Birds of Paradise",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Craw Wurm",
            mana_cost: "{4}{G}{G}",
            type_line: "Creature — Wurm",
            oracle_text: "",
            power: stat_index("6"),
            toughness: stat_index("4"),
            mana_value: 6,
            color: G,
            color_identity: G,
            legal: commander,
            canonical_face: 9,
            combined_name: "Craw Wurm",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Flametongue Kavu",
            mana_cost: "{3}{R}",
            type_line: "Creature — Kavu",
            oracle_text: "When Flametongue Kavu enters the battlefield, it deals 4 damage to target creature.",
            power: stat_index("4"),
            toughness: stat_index("2"),
            mana_value: 4,
            color: R,
            color_identity: R,
            legal: modern | commander,
            canonical_face: 10,
            combined_name: "Flametongue Kavu",
            ..FaceFixture::default()
        },
        FaceFixture {
            name: "Ball Lightning",
            mana_cost: "{R}{R}{R}",
            type_line: "Creature — Elemental",
            oracle_text: "Trample, haste",
            power: stat_index("6"),
            toughness: stat_index("1"),
            mana_value: 3,
            color: R,
            color_identity: R,
            legal: modern,
            canonical_face: 11,
            combined_name: "Ball Lightning",
            ..FaceFixture::default()
        },
    ]
}

fn engine() -> SearchEngine {
    SearchEngine::with_salt(card_columns(catalog()), 0xdead_beef)
}

fn printing_columns() -> PrintingColumns {
    PrintingColumns {
        scryfall_id: vec!["p0".into(), "p1".into(), "p2".into(), "p3".into()],
        collector_number: vec!["330".into(), "330★".into(), "270".into(), "162".into()],
        set_indices: vec![0, 0, 1, 1],
        rarity: vec![Rarity::Uncommon, Rarity::Uncommon, Rarity::Rare, Rarity::Common],
        finish: vec![
            crate::cards::Finish::Nonfoil,
            crate::cards::Finish::Foil,
            crate::cards::Finish::Nonfoil,
            crate::cards::Finish::Nonfoil,
        ],
        price_usd: vec![150, 450, 1_500_000, 0],
        canonical_face_ref: vec![SOL_RING, SOL_RING, SOL_RING, BOLT],
        set_lookup: vec![
            SetRecord {
                code: "clb".into(),
                name: "Commander Legends: Battle for Baldur's Gate".into(),
            },
            SetRecord {
                code: "lea".into(),
                name: "Limited Edition Alpha".into(),
            },
        ],
    }
}

fn engine_with_printings() -> SearchEngine {
    let mut engine = engine();
    engine.attach_printings(printing_columns());
    engine
}

fn sorted_indices(engine: &mut SearchEngine, query: &str) -> Vec<u32> {
    let mut indices = engine.search(query).indices;
    indices.sort_unstable();
    indices
}

#[test]
fn test_basic_conjunction() {
    let mut engine = engine();
    let result = engine.search("t:creature c:green");
    let mut indices = result.indices.clone();
    indices.sort_unstable();
    assert_eq!(indices, vec![BEARS, TARMOGOYF, BIRDS, CRAW_WURM]);

    assert_eq!(result.breakdown.label, "AND");
    assert_eq!(result.breakdown.children.len(), 2);
    assert_eq!(result.breakdown.children[0].label, "t:creature");
    assert_eq!(result.breakdown.children[0].count, 9);
    assert_eq!(result.breakdown.children[1].label, "c:green");
    assert_eq!(result.breakdown.children[1].count, 4);
}

#[test]
fn test_exact_name() {
    let mut engine = engine();
    assert_eq!(sorted_indices(&mut engine, "!\"Lightning Bolt\""), vec![BOLT]);
    assert_eq!(sorted_indices(&mut engine, "!\"lightning bolt\""), vec![BOLT]);
    // Substring names don't count as exact.
    assert!(sorted_indices(&mut engine, "!\"Lightning\"").is_empty());
}

#[test]
fn test_exact_name_matches_combined() {
    let mut engine = engine();
    assert_eq!(
        sorted_indices(&mut engine, "!\"Delver of Secrets // Insectile Aberration\""),
        vec![DELVER]
    );
}

#[test]
fn test_face_level_not() {
    let mut engine = engine();
    let result = engine.search("-o:flying");
    // The Delver card has a flying back face, so neither of its faces may
    // appear; same for Niv-Mizzet and Birds of Paradise.
    for face in [DELVER, ABERRATION, NIV, BIRDS] {
        assert!(!result.indices.contains(&face), "face {face} leaked through");
    }
    let mut indices = result.indices;
    indices.sort_unstable();
    assert_eq!(
        indices,
        vec![BOLT, BEARS, SOL_RING, IZZET_CHARM, TARMOGOYF, CRAW_WURM, FLAMETONGUE, BALL_LIGHTNING]
    );
}

#[test]
fn test_not_partitions_cards() {
    // Card-level complement: every card is in exactly one of N, NOT N.
    let mut engine = engine();
    for query in ["o:flying", "t:creature", "c:ur", "pow>=4", "is:dfc"] {
        let positive = engine.search(query).indices;
        let negative = engine.search(&format!("-({query})")).indices;
        let mut union: Vec<u32> = positive.iter().chain(negative.iter()).copied().collect();
        union.sort_unstable();
        let mut expected: Vec<u32> = (0..12).filter(|f| engine.cards().canonical(*f) == *f).collect();
        expected.sort_unstable();
        assert_eq!(union, expected, "query {query}");
        assert!(positive.iter().all(|f| !negative.contains(f)), "query {query}");
    }
}

#[test]
fn test_color_identity_equality() {
    let mut engine = engine();
    assert_eq!(
        sorted_indices(&mut engine, "ci=ur"),
        vec![NIV, IZZET_CHARM]
    );
    // The at-least form also finds them, plus nothing else in this catalog.
    assert_eq!(
        sorted_indices(&mut engine, "ci:ur"),
        vec![NIV, IZZET_CHARM]
    );
    // Letter order does not matter.
    assert_eq!(sorted_indices(&mut engine, "ci=ru"), vec![NIV, IZZET_CHARM]);
}

#[test]
fn test_color_shorthands() {
    let mut engine = engine();
    assert_eq!(
        sorted_indices(&mut engine, "c:m"),
        vec![NIV, IZZET_CHARM]
    );
    assert_eq!(sorted_indices(&mut engine, "c:colorless"), vec![SOL_RING]);
    assert_eq!(
        sorted_indices(&mut engine, "ci:izzet"),
        vec![NIV, IZZET_CHARM]
    );
    // ci<=g: green-or-colorless identities.
    assert_eq!(
        sorted_indices(&mut engine, "ci<=g"),
        vec![BEARS, SOL_RING, TARMOGOYF, BIRDS, CRAW_WURM]
    );
}

#[test]
fn test_mana_cost_multiset() {
    let mut engine = engine();
    assert_eq!(sorted_indices(&mut engine, "m=3R"), vec![FLAMETONGUE]);
    // {R}{R}{R} is not the multiset {3, R}.
    assert!(!sorted_indices(&mut engine, "m=3R").contains(&BALL_LIGHTNING));
    assert_eq!(sorted_indices(&mut engine, "m=rrr"), vec![BALL_LIGHTNING]);
    assert_eq!(
        sorted_indices(&mut engine, "m:uurr"),
        vec![NIV]
    );
}

#[test]
fn test_numeric_stats() {
    let mut engine = engine();
    assert_eq!(
        sorted_indices(&mut engine, "pow>=4"),
        vec![NIV, CRAW_WURM, FLAMETONGUE, BALL_LIGHTNING]
    );
    // `*` power is non-numeric and never satisfies numeric comparisons;
    // absent powers never match either.
    assert!(sorted_indices(&mut engine, "pow>=0")
        .iter()
        .all(|f| *f != TARMOGOYF && *f != BOLT));
    // But it matches itself literally.
    assert_eq!(sorted_indices(&mut engine, "pow:*"), vec![TARMOGOYF]);
    assert_eq!(sorted_indices(&mut engine, "pow=2"), vec![BEARS]);
    assert_eq!(sorted_indices(&mut engine, "tou:1+*"), vec![TARMOGOYF]);
}

#[test]
fn test_mana_value() {
    let mut engine = engine();
    assert_eq!(
        sorted_indices(&mut engine, "mv=6"),
        vec![NIV, CRAW_WURM]
    );
    assert_eq!(sorted_indices(&mut engine, "cmc>=6"), vec![NIV, CRAW_WURM]);
    assert_eq!(sorted_indices(&mut engine, "mv<1"), Vec::<u32>::new());
}

#[test]
fn test_legality() {
    let mut engine = engine();
    let commander = sorted_indices(&mut engine, "f:commander");
    assert!(commander.contains(&SOL_RING));
    assert!(!commander.contains(&TARMOGOYF));
    // Alias and case-insensitive format names.
    assert_eq!(sorted_indices(&mut engine, "legal:EDH"), commander);
}

#[test]
fn test_is_keywords() {
    let mut engine = engine();
    assert_eq!(sorted_indices(&mut engine, "is:dfc"), vec![DELVER]);
    assert_eq!(sorted_indices(&mut engine, "is:transform"), vec![DELVER]);
    let spells = sorted_indices(&mut engine, "is:spell");
    assert!(spells.contains(&BOLT));
}

#[test]
fn test_bare_and_regex() {
    let mut engine = engine();
    assert_eq!(sorted_indices(&mut engine, "grizzly"), vec![BEARS]);
    // Bare words also hit the combined name, so the back face's card shows.
    assert_eq!(sorted_indices(&mut engine, "aberration"), vec![DELVER]);
    // Bare regex searches name, oracle and type together.
    assert_eq!(
        sorted_indices(&mut engine, "/lhurgoyf/"),
        vec![TARMOGOYF]
    );
    assert_eq!(
        sorted_indices(&mut engine, "o:/deals \\d+ damage/"),
        vec![BOLT, FLAMETONGUE]
    );
}

#[test]
fn test_or_composition() {
    let mut engine = engine();
    assert_eq!(
        sorted_indices(&mut engine, "!\"Grizzly Bears\" or !\"Sol Ring\""),
        vec![BEARS, SOL_RING]
    );
}

#[test]
fn test_error_tags_are_local() {
    let mut engine = engine();
    let result = engine.search("banana:split t:creature");
    // The unknown field empties its own node, not the whole query.
    assert_eq!(result.breakdown.children[0].error, Some(NodeError::UnknownField));
    assert_eq!(result.breakdown.children[0].count, 0);
    assert!(result.breakdown.children[1].error.is_none());
    assert!(result.indices.is_empty());

    let result = engine.search("o:/[/");
    assert_eq!(result.breakdown.error, Some(NodeError::InvalidRegex));

    let result = engine.search("pow>=*");
    assert_eq!(result.breakdown.error, Some(NodeError::InvalidNumeric));
}

#[test]
fn test_printing_conditions_without_payload() {
    let mut engine = engine();
    let result = engine.search("t:artifact s:clb");
    assert_eq!(result.breakdown.children[1].error, Some(NodeError::PrintingsMissing));
    // The query still evaluates in the face domain.
    assert!(!result.has_printing_conditions);
    assert!(result.printing_indices.is_none());
    assert!(result.indices.is_empty());
}

#[test]
fn test_printing_domain_filter() {
    let mut engine = engine_with_printings();
    let result = engine.search("t:artifact s:clb");
    assert!(result.has_printing_conditions);
    assert!(!result.unique_prints);
    assert_eq!(result.indices, vec![SOL_RING]);
    // One row per card by default, but the printing set is carried.
    assert_eq!(result.printing_indices, Some(vec![0, 1]));
}

#[test]
fn test_unique_prints() {
    let mut engine = engine_with_printings();
    let result = engine.search("!\"Sol Ring\" s:clb unique:prints");
    assert!(result.has_printing_conditions);
    assert!(result.unique_prints);
    // Printings of one card stay contiguous in stored order.
    assert_eq!(result.printing_indices, Some(vec![0, 1]));
    assert_eq!(result.indices, vec![SOL_RING]);
}

#[test]
fn test_unique_last_writer_wins() {
    let mut engine = engine_with_printings();
    let result = engine.search("!\"Sol Ring\" unique:prints unique:cards");
    assert!(!result.unique_prints);
    let result = engine.search("!\"Sol Ring\" unique:cards unique:prints");
    assert!(result.unique_prints);
}

#[test]
fn test_rarity_and_price() {
    let mut engine = engine_with_printings();
    let result = engine.search("r>=rare");
    assert_eq!(result.printing_indices, Some(vec![2]));

    let result = engine.search("usd>=10");
    assert_eq!(result.printing_indices, Some(vec![2]));
    assert_eq!(result.indices, vec![SOL_RING]);

    // Unknown prices (0 cents) never match price comparisons.
    let result = engine.search("usd<=9999");
    assert_eq!(result.printing_indices, Some(vec![0, 1]));

    let result = engine.search("finish:foil");
    assert_eq!(result.printing_indices, Some(vec![1]));
}

#[test]
fn test_printing_domain_not() {
    let mut engine = engine_with_printings();
    let result = engine.search("-s:clb unique:prints");
    // Complement over printing rows. The two survivors belong to different
    // cards, so their relative order depends on the session hash.
    let mut rows = result.printing_indices.expect("printing domain");
    rows.sort_unstable();
    assert_eq!(rows, vec![2, 3]);
}

#[test]
fn test_evaluation_is_idempotent_and_cached() {
    let mut engine = engine();
    let first = engine.search("t:creature c:green");
    let cached_after_first = engine.cached_nodes();
    let second = engine.search("t:creature c:green");
    assert_eq!(first.indices, second.indices);
    // The repeat evaluation hit the cache instead of growing it.
    assert_eq!(engine.cached_nodes(), cached_after_first);

    // Same subexpressions under different grouping share entries.
    engine.search("(t:creature) (c:green)");
    let third = engine.search("t:creature   c:green");
    assert_eq!(first.indices, third.indices);
}

#[test]
fn test_ordering_is_stable_per_salt_and_query() {
    let mut a = engine();
    let mut b = engine();
    assert_eq!(
        a.search("t:creature").indices,
        b.search("t:creature").indices
    );
}

#[test]
fn test_prefix_tier_boosts_bare_matches() {
    let mut engine = engine();
    let result = engine.search("grizzly or t:creature");
    // Grizzly Bears prefix-matches the bare word and must sort first.
    assert_eq!(result.indices[0], BEARS);
}

#[test]
fn test_histograms_over_results() {
    let mut engine = engine();
    let result = engine.search("t:creature");
    let histograms = &result.histograms;
    assert_eq!(histograms.card_type.creature, result.indices.len() as u32);
    // Niv-Mizzet is the only multicolor creature.
    assert_eq!(histograms.color_identity.multicolor, 1);
    assert_eq!(histograms.mana_value.buckets[6], 2);
}

#[test]
fn test_empty_query_matches_every_card() {
    let mut engine = engine();
    let result = engine.search("");
    // One row per card: 12 faces, 11 cards.
    assert_eq!(result.indices.len(), 11);
}
