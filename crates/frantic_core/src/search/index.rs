//! Search indices over the columnar containers.
//!
//! Built once when a payload loads, immutable afterwards. The card index
//! precomputes the case-folded strings every text predicate needs; the
//! printing index adds the adjacency tables for flipping between the face
//! and printing domains.

use std::collections::HashMap;

use crate::cards::{mana, CardColumns, PrintingColumns};

use super::bitset::Bitset;

/// Case-fold and strip non-alphanumerics, the normal form used for the
/// ordering prefix tier.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

pub struct CardIndex {
    pub columns: CardColumns,
    pub lower_name: Vec<String>,
    pub lower_type: Vec<String>,
    pub lower_oracle: Vec<String>,
    pub lower_combined: Vec<String>,
    pub norm_combined: Vec<String>,
    /// Tokenized mana costs, one symbol sequence per face.
    pub mana_symbols: Vec<Vec<String>>,
    /// Face rows of each card, indexed by canonical face. Non-canonical
    /// rows hold empty lists.
    faces_by_canonical: Vec<Vec<u32>>,
}

impl CardIndex {
    pub fn new(columns: CardColumns) -> CardIndex {
        let faces = columns.face_count();

        let mut faces_by_canonical = vec![Vec::new(); faces];
        for f in 0..faces {
            faces_by_canonical[columns.canonical_face[f] as usize].push(f as u32);
        }

        CardIndex {
            lower_name: columns.name.iter().map(|s| s.to_lowercase()).collect(),
            lower_type: columns.type_line.iter().map(|s| s.to_lowercase()).collect(),
            lower_oracle: columns.oracle_text.iter().map(|s| s.to_lowercase()).collect(),
            lower_combined: columns
                .combined_name
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            norm_combined: columns
                .combined_name
                .iter()
                .map(|s| normalize_name(s))
                .collect(),
            mana_symbols: columns.mana_cost.iter().map(|s| mana::symbols(s)).collect(),
            faces_by_canonical,
            columns,
        }
    }

    pub fn face_count(&self) -> usize {
        self.columns.face_count()
    }

    pub fn canonical(&self, face: u32) -> u32 {
        self.columns.canonical_face[face as usize]
    }

    /// Ordered face rows of the card owning `canonical_face`.
    pub fn faces_of(&self, canonical_face: u32) -> &[u32] {
        &self.faces_by_canonical[canonical_face as usize]
    }

    /// Collapse a face match set to canonical faces, keeping each card once
    /// in first-seen order.
    pub fn deduplicate_matches(&self, faces: &Bitset) -> Vec<u32> {
        let mut seen = Bitset::new(self.face_count());
        let mut canonical_faces = Vec::new();
        for face in faces.iter() {
            let canonical = self.canonical(face);
            if !seen.contains(canonical) {
                seen.insert(canonical);
                canonical_faces.push(canonical);
            }
        }
        canonical_faces
    }

    /// Lift a face set to the card level: the set of faces whose card has at
    /// least one face in `faces`.
    pub fn expand_to_cards(&self, faces: &Bitset) -> Bitset {
        let mut out = Bitset::new(self.face_count());
        for face in faces.iter() {
            for sibling in self.faces_of(self.canonical(face)) {
                out.insert(*sibling);
            }
        }
        out
    }
}

pub struct PrintingIndex {
    pub columns: PrintingColumns,
    /// Printing rows of each card, indexed by canonical face; printings of
    /// one card keep their stored order.
    printings_by_canonical: Vec<Vec<u32>>,
    /// Lowercased set code → printing rows.
    set_index: HashMap<String, Vec<u32>>,
}

impl PrintingIndex {
    pub fn new(columns: PrintingColumns, face_count: usize) -> PrintingIndex {
        let mut printings_by_canonical = vec![Vec::new(); face_count];
        let mut set_index: HashMap<String, Vec<u32>> = HashMap::new();

        for p in 0..columns.printing_count() {
            printings_by_canonical[columns.canonical_face_ref[p] as usize].push(p as u32);
            set_index
                .entry(columns.set_code(p as u32).to_lowercase())
                .or_default()
                .push(p as u32);
        }

        PrintingIndex {
            columns,
            printings_by_canonical,
            set_index,
        }
    }

    pub fn printing_count(&self) -> usize {
        self.columns.printing_count()
    }

    pub fn canonical_face_ref(&self, printing: u32) -> u32 {
        self.columns.canonical_face_ref[printing as usize]
    }

    pub fn printings_of(&self, canonical_face: u32) -> &[u32] {
        &self.printings_by_canonical[canonical_face as usize]
    }

    pub fn by_set(&self, code: &str) -> Option<&[u32]> {
        self.set_index.get(&code.to_lowercase()).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::testing::{card_columns, FaceFixture};
    use crate::cards::{Layout, SetRecord};

    fn dfc_columns() -> CardColumns {
        card_columns(vec![
            FaceFixture {
                name: "Delver of Secrets",
                type_line: "Creature — Human Wizard",
                layout: Layout::Transform,
                canonical_face: 0,
                combined_name: "Delver of Secrets // Insectile Aberration",
                ..FaceFixture::default()
            },
            FaceFixture {
                name: "Insectile Aberration",
                type_line: "Creature — Human Insect",
                layout: Layout::Transform,
                canonical_face: 0,
                combined_name: "Delver of Secrets // Insectile Aberration",
                ..FaceFixture::default()
            },
            FaceFixture {
                name: "Giant Growth",
                type_line: "Instant",
                canonical_face: 2,
                combined_name: "Giant Growth",
                ..FaceFixture::default()
            },
        ])
    }

    #[test]
    fn test_faces_of() {
        let index = CardIndex::new(dfc_columns());
        assert_eq!(index.faces_of(0), &[0, 1]);
        assert_eq!(index.faces_of(2), &[2]);
        assert!(index.faces_of(1).is_empty());
    }

    #[test]
    fn test_deduplicate_keeps_first_seen_order() {
        let index = CardIndex::new(dfc_columns());
        let faces = Bitset::from_indices(3, [1, 2]);
        // Face 1 collapses onto canonical face 0.
        assert_eq!(index.deduplicate_matches(&faces), vec![0, 2]);
    }

    #[test]
    fn test_expand_to_cards() {
        let index = CardIndex::new(dfc_columns());
        let faces = Bitset::from_indices(3, [1]);
        assert_eq!(index.expand_to_cards(&faces).to_indices(), vec![0, 1]);
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Ajani's Pridemate"), "ajanispridemate");
        assert_eq!(normalize_name("Borrowing 100,000 Arrows"), "borrowing100000arrows");
    }

    #[test]
    fn test_printing_index() {
        let cards = dfc_columns();
        let columns = PrintingColumns {
            scryfall_id: vec!["p0".into(), "p1".into(), "p2".into()],
            collector_number: vec!["51".into(), "51★".into(), "170".into()],
            set_indices: vec![0, 0, 1],
            rarity: vec![
                crate::cards::Rarity::Common,
                crate::cards::Rarity::Common,
                crate::cards::Rarity::Common,
            ],
            finish: vec![
                crate::cards::Finish::Nonfoil,
                crate::cards::Finish::Foil,
                crate::cards::Finish::Nonfoil,
            ],
            price_usd: vec![100, 250, 0],
            canonical_face_ref: vec![0, 0, 2],
            set_lookup: vec![
                SetRecord {
                    code: "isd".into(),
                    name: "Innistrad".into(),
                },
                SetRecord {
                    code: "lea".into(),
                    name: "Limited Edition Alpha".into(),
                },
            ],
        };
        let index = PrintingIndex::new(columns, cards.face_count());
        assert_eq!(index.printings_of(0), &[0, 1]);
        assert_eq!(index.printings_of(2), &[2]);
        assert_eq!(index.by_set("ISD"), Some(&[0, 1][..]));
        assert_eq!(index.by_set("zzz"), None);
    }
}
