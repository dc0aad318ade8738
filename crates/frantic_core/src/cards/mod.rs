//! Columnar card data.
//!
//! All card data lives in two immutable struct-of-arrays containers built
//! once at load time: [`CardColumns`] keyed by face index and
//! [`PrintingColumns`] keyed by printing index. Faces of a multi-face card
//! occupy consecutive rows and share a canonical (front) face row.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

pub mod colors;
pub mod formats;
pub mod mana;
pub mod payload;

pub use colors::{parse_color_value, ColorSet, ColorValue};
pub use formats::{Format, ALL_FORMATS, FORMAT_COUNT};
pub use payload::{CardPayload, PrintingPayload, SetRecord, ThumbHashPayload, SCHEMA_VERSION};

/// Physical layout of a card, distinguishing single-face cards from the
/// various multi-face arrangements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Layout {
    Normal = 0,
    Split = 1,
    Flip = 2,
    Transform = 3,
    ModalDfc = 4,
    Meld = 5,
    Adventure = 6,
    Leveler = 7,
    Other = 8,
}

impl Layout {
    pub fn from_code(code: u8) -> Layout {
        match code {
            0 => Layout::Normal,
            1 => Layout::Split,
            2 => Layout::Flip,
            3 => Layout::Transform,
            4 => Layout::ModalDfc,
            5 => Layout::Meld,
            6 => Layout::Adventure,
            7 => Layout::Leveler,
            _ => Layout::Other,
        }
    }

    /// Card has a physical back face.
    pub fn is_double_faced(&self) -> bool {
        matches!(self, Layout::Transform | Layout::ModalDfc | Layout::Meld)
    }
}

/// Printing rarity. Ordering follows print-run scarcity so that rarity
/// comparisons (`r>=rare`) work as range queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Rarity {
    Common = 0,
    Uncommon = 1,
    Rare = 2,
    Mythic = 3,
}

impl Rarity {
    pub fn from_code(code: u8) -> Option<Rarity> {
        match code {
            0 => Some(Rarity::Common),
            1 => Some(Rarity::Uncommon),
            2 => Some(Rarity::Rare),
            3 => Some(Rarity::Mythic),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Rarity> {
        match value.to_lowercase().as_str() {
            "c" | "common" => Some(Rarity::Common),
            "u" | "uncommon" => Some(Rarity::Uncommon),
            "r" | "rare" => Some(Rarity::Rare),
            "m" | "mythic" => Some(Rarity::Mythic),
            _ => None,
        }
    }
}

/// Physical finish of a printing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Finish {
    Nonfoil = 0,
    Foil = 1,
    Etched = 2,
}

impl Finish {
    pub fn from_code(code: u8) -> Option<Finish> {
        match code {
            0 => Some(Finish::Nonfoil),
            1 => Some(Finish::Foil),
            2 => Some(Finish::Etched),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Finish> {
        match value.to_lowercase().as_str() {
            "nonfoil" => Some(Finish::Nonfoil),
            "foil" => Some(Finish::Foil),
            "etched" => Some(Finish::Etched),
            _ => None,
        }
    }
}

/// Immutable face-level container. One row per oracle face.
#[derive(Debug, Clone)]
pub struct CardColumns {
    pub name: Vec<String>,
    pub mana_cost: Vec<String>,
    pub type_line: Vec<String>,
    pub oracle_text: Vec<String>,
    pub power: Vec<u16>,
    pub toughness: Vec<u16>,
    pub loyalty: Vec<u16>,
    pub defense: Vec<u16>,
    pub mana_value: Vec<u8>,
    pub color: Vec<ColorSet>,
    pub color_identity: Vec<ColorSet>,
    pub layout: Vec<Layout>,
    pub legalities_legal: Vec<u32>,
    pub legalities_banned: Vec<u32>,
    pub legalities_restricted: Vec<u32>,
    pub scryfall_id: Vec<String>,
    pub canonical_face: Vec<u32>,
    pub combined_name: Vec<String>,
    pub power_lookup: Vec<String>,
    pub toughness_lookup: Vec<String>,
    pub loyalty_lookup: Vec<String>,
    pub defense_lookup: Vec<String>,
    /// Optional display-only placeholder hashes, attached after load.
    pub art_crop_thumb_hash: Option<Vec<String>>,
    pub card_thumb_hash: Option<Vec<String>>,
}

impl CardColumns {
    pub fn from_payload(payload: CardPayload) -> Result<CardColumns, LoadError> {
        payload::check_schema_version(payload.schema_version)?;

        let faces = payload.name.len();
        let lengths = [
            ("mana_cost", payload.mana_cost.len()),
            ("type_line", payload.type_line.len()),
            ("oracle_text", payload.oracle_text.len()),
            ("power", payload.power.len()),
            ("toughness", payload.toughness.len()),
            ("loyalty", payload.loyalty.len()),
            ("defense", payload.defense.len()),
            ("mana_value", payload.mana_value.len()),
            ("color", payload.color.len()),
            ("color_identity", payload.color_identity.len()),
            ("layout", payload.layout.len()),
            ("legalities_legal", payload.legalities_legal.len()),
            ("legalities_banned", payload.legalities_banned.len()),
            ("legalities_restricted", payload.legalities_restricted.len()),
            ("scryfall_id", payload.scryfall_id.len()),
            ("canonical_face", payload.canonical_face.len()),
            ("combined_name", payload.combined_name.len()),
        ];
        for (column, len) in lengths {
            if len != faces {
                return Err(LoadError::Malformed(format!(
                    "column {column} has {len} rows, expected {faces}"
                )));
            }
        }

        payload::check_lookup("power_lookup", &payload.power_lookup)?;
        payload::check_lookup("toughness_lookup", &payload.toughness_lookup)?;
        payload::check_lookup("loyalty_lookup", &payload.loyalty_lookup)?;
        payload::check_lookup("defense_lookup", &payload.defense_lookup)?;

        let stat_columns = [
            ("power", &payload.power, payload.power_lookup.len()),
            ("toughness", &payload.toughness, payload.toughness_lookup.len()),
            ("loyalty", &payload.loyalty, payload.loyalty_lookup.len()),
            ("defense", &payload.defense, payload.defense_lookup.len()),
        ];
        for (column, values, lookup_len) in stat_columns {
            if let Some(bad) = values.iter().find(|idx| **idx as usize >= lookup_len) {
                return Err(LoadError::Malformed(format!(
                    "column {column} points at lookup entry {bad}, table has {lookup_len}"
                )));
            }
        }

        for (f, canonical) in payload.canonical_face.iter().enumerate() {
            let canonical = *canonical as usize;
            if canonical >= faces {
                return Err(LoadError::Malformed(format!(
                    "canonical_face[{f}] is out of range"
                )));
            }
            if payload.canonical_face[canonical] as usize != canonical {
                return Err(LoadError::Malformed(format!(
                    "canonical_face[{f}] does not point at a canonical row"
                )));
            }
            // Card-level attributes must agree across faces of one card.
            if payload.color_identity[f] != payload.color_identity[canonical]
                || payload.combined_name[f] != payload.combined_name[canonical]
                || payload.layout[f] != payload.layout[canonical]
                || payload.scryfall_id[f] != payload.scryfall_id[canonical]
                || payload.legalities_legal[f] != payload.legalities_legal[canonical]
                || payload.legalities_banned[f] != payload.legalities_banned[canonical]
                || payload.legalities_restricted[f] != payload.legalities_restricted[canonical]
            {
                return Err(LoadError::Malformed(format!(
                    "face {f} disagrees with its canonical face on card-level columns"
                )));
            }
        }

        Ok(CardColumns {
            name: payload.name,
            mana_cost: payload.mana_cost,
            type_line: payload.type_line,
            oracle_text: payload.oracle_text,
            power: payload.power,
            toughness: payload.toughness,
            loyalty: payload.loyalty,
            defense: payload.defense,
            mana_value: payload.mana_value,
            color: payload.color.into_iter().map(ColorSet).collect(),
            color_identity: payload.color_identity.into_iter().map(ColorSet).collect(),
            layout: payload.layout.into_iter().map(Layout::from_code).collect(),
            legalities_legal: payload.legalities_legal,
            legalities_banned: payload.legalities_banned,
            legalities_restricted: payload.legalities_restricted,
            scryfall_id: payload.scryfall_id,
            canonical_face: payload.canonical_face,
            combined_name: payload.combined_name,
            power_lookup: payload.power_lookup,
            toughness_lookup: payload.toughness_lookup,
            loyalty_lookup: payload.loyalty_lookup,
            defense_lookup: payload.defense_lookup,
            art_crop_thumb_hash: None,
            card_thumb_hash: None,
        })
    }

    pub fn face_count(&self) -> usize {
        self.name.len()
    }

    pub fn is_canonical(&self, face: u32) -> bool {
        self.canonical_face[face as usize] == face
    }

    /// Stat string for a 1-indexed lookup column; `None` when absent.
    pub fn stat<'a>(&self, lookup: &'a [String], index: u16) -> Option<&'a str> {
        if index == 0 {
            None
        } else {
            Some(lookup[index as usize].as_str())
        }
    }

    pub fn attach_thumb_hashes(&mut self, payload: ThumbHashPayload) -> Result<(), LoadError> {
        let faces = self.face_count();
        if payload.art_crop.len() != faces || payload.card.len() != faces {
            return Err(LoadError::Malformed(
                "thumb-hash arrays are not aligned to the face rows".to_string(),
            ));
        }
        self.art_crop_thumb_hash = Some(payload.art_crop);
        self.card_thumb_hash = Some(payload.card);
        Ok(())
    }
}

/// Immutable printing-level container. One row per physical printing.
#[derive(Debug, Clone)]
pub struct PrintingColumns {
    pub scryfall_id: Vec<String>,
    pub collector_number: Vec<String>,
    pub set_indices: Vec<u16>,
    pub rarity: Vec<Rarity>,
    pub finish: Vec<Finish>,
    pub price_usd: Vec<u32>,
    pub canonical_face_ref: Vec<u32>,
    pub set_lookup: Vec<SetRecord>,
}

impl PrintingColumns {
    pub fn from_payload(
        payload: PrintingPayload,
        cards: &CardColumns,
    ) -> Result<PrintingColumns, LoadError> {
        payload::check_schema_version(payload.schema_version)?;

        let printings = payload.scryfall_id.len();
        let lengths = [
            ("collector_number", payload.collector_number.len()),
            ("set_indices", payload.set_indices.len()),
            ("rarity", payload.rarity.len()),
            ("finish", payload.finish.len()),
            ("price_usd", payload.price_usd.len()),
            ("canonical_face_ref", payload.canonical_face_ref.len()),
        ];
        for (column, len) in lengths {
            if len != printings {
                return Err(LoadError::Malformed(format!(
                    "column {column} has {len} rows, expected {printings}"
                )));
            }
        }

        for (p, reference) in payload.canonical_face_ref.iter().enumerate() {
            if *reference as usize >= cards.face_count() || !cards.is_canonical(*reference) {
                return Err(LoadError::Malformed(format!(
                    "canonical_face_ref[{p}] does not point at a canonical face"
                )));
            }
        }
        if let Some(bad) = payload
            .set_indices
            .iter()
            .find(|idx| **idx as usize >= payload.set_lookup.len())
        {
            return Err(LoadError::Malformed(format!(
                "set index {bad} is outside the set lookup table"
            )));
        }

        let rarity = payload
            .rarity
            .iter()
            .map(|code| {
                Rarity::from_code(*code)
                    .ok_or_else(|| LoadError::Malformed(format!("unknown rarity code {code}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let finish = payload
            .finish
            .iter()
            .map(|code| {
                Finish::from_code(*code)
                    .ok_or_else(|| LoadError::Malformed(format!("unknown finish code {code}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PrintingColumns {
            scryfall_id: payload.scryfall_id,
            collector_number: payload.collector_number,
            set_indices: payload.set_indices,
            rarity,
            finish,
            price_usd: payload.price_usd,
            canonical_face_ref: payload.canonical_face_ref,
            set_lookup: payload.set_lookup,
        })
    }

    pub fn printing_count(&self) -> usize {
        self.scryfall_id.len()
    }

    pub fn set_code(&self, printing: u32) -> &str {
        &self.set_lookup[self.set_indices[printing as usize] as usize].code
    }

    pub fn set_name(&self, printing: u32) -> &str {
        &self.set_lookup[self.set_indices[printing as usize] as usize].name
    }
}
