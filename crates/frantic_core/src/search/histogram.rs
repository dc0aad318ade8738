//! Result-set histograms.
//!
//! All three projections run over the deduplicated canonical faces of a
//! result, so a card counts once however many faces matched.

use serde::Serialize;

use super::index::CardIndex;

/// Colorless, one bucket per color counted independently, and multicolor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColorIdentityHistogram {
    pub colorless: u32,
    pub white: u32,
    pub blue: u32,
    pub black: u32,
    pub red: u32,
    pub green: u32,
    pub multicolor: u32,
}

/// Mana values 0 through 6, with everything higher clamped into `seven_plus`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManaValueHistogram {
    pub buckets: [u32; 8],
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CardTypeHistogram {
    pub legendary: u32,
    pub creature: u32,
    pub instant: u32,
    pub sorcery: u32,
    pub artifact: u32,
    pub enchantment: u32,
    pub planeswalker: u32,
    pub land: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Histograms {
    #[serde(rename = "colorIdentity")]
    pub color_identity: ColorIdentityHistogram,
    #[serde(rename = "manaValue")]
    pub mana_value: ManaValueHistogram,
    #[serde(rename = "cardType")]
    pub card_type: CardTypeHistogram,
}

pub fn project(index: &CardIndex, canonical_faces: &[u32]) -> Histograms {
    let mut histograms = Histograms::default();

    for face in canonical_faces {
        let f = *face as usize;

        let identity = index.columns.color_identity[f];
        let colors = &mut histograms.color_identity;
        if identity.is_empty() {
            colors.colorless += 1;
        } else {
            // A two-color card contributes to both of its color buckets.
            if identity.contains(crate::cards::colors::WHITE) {
                colors.white += 1;
            }
            if identity.contains(crate::cards::colors::BLUE) {
                colors.blue += 1;
            }
            if identity.contains(crate::cards::colors::BLACK) {
                colors.black += 1;
            }
            if identity.contains(crate::cards::colors::RED) {
                colors.red += 1;
            }
            if identity.contains(crate::cards::colors::GREEN) {
                colors.green += 1;
            }
            if identity.is_multicolor() {
                colors.multicolor += 1;
            }
        }

        let mana_value = (index.columns.mana_value[f] as usize).min(7);
        histograms.mana_value.buckets[mana_value] += 1;

        let type_line = &index.lower_type[f];
        let types = &mut histograms.card_type;
        for (needle, bucket) in [
            ("legendary", &mut types.legendary),
            ("creature", &mut types.creature),
            ("instant", &mut types.instant),
            ("sorcery", &mut types.sorcery),
            ("artifact", &mut types.artifact),
            ("enchantment", &mut types.enchantment),
            ("planeswalker", &mut types.planeswalker),
            ("land", &mut types.land),
        ] {
            if type_line.contains(needle) {
                *bucket += 1;
            }
        }
    }

    histograms
}
