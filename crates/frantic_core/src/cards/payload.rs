use serde::Deserialize;

use crate::error::LoadError;

/// Schema version this build understands. A payload declaring any other
/// version is rejected as stale so the UI can offer a hard reload.
pub const SCHEMA_VERSION: u32 = 1;

/// Face-level columnar document, one entry per column under its snake_case
/// name. All columns have the same length: the number of face rows.
#[derive(Debug, Clone, Deserialize)]
pub struct CardPayload {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub name: Vec<String>,
    pub mana_cost: Vec<String>,
    pub type_line: Vec<String>,
    pub oracle_text: Vec<String>,
    pub power: Vec<u16>,
    pub toughness: Vec<u16>,
    pub loyalty: Vec<u16>,
    pub defense: Vec<u16>,
    pub mana_value: Vec<u8>,
    pub color: Vec<u8>,
    pub color_identity: Vec<u8>,
    pub layout: Vec<u8>,
    pub legalities_legal: Vec<u32>,
    pub legalities_banned: Vec<u32>,
    pub legalities_restricted: Vec<u32>,
    pub scryfall_id: Vec<String>,
    pub canonical_face: Vec<u32>,
    pub combined_name: Vec<String>,
    /// 1-indexed stat string tables; element 0 is always the empty string,
    /// the sentinel for "absent".
    pub power_lookup: Vec<String>,
    pub toughness_lookup: Vec<String>,
    pub loyalty_lookup: Vec<String>,
    pub defense_lookup: Vec<String>,
}

/// One record of the printing payload's set lookup table.
#[derive(Debug, Clone, Deserialize)]
pub struct SetRecord {
    pub code: String,
    pub name: String,
}

/// Printing-level columnar document; optional and may arrive after the
/// face payload is already being queried.
#[derive(Debug, Clone, Deserialize)]
pub struct PrintingPayload {
    #[serde(default)]
    pub schema_version: Option<u32>,
    pub scryfall_id: Vec<String>,
    pub collector_number: Vec<String>,
    pub set_indices: Vec<u16>,
    pub rarity: Vec<u8>,
    pub finish: Vec<u8>,
    /// Integer cents; 0 means the price is unknown.
    pub price_usd: Vec<u32>,
    pub canonical_face_ref: Vec<u32>,
    pub set_lookup: Vec<SetRecord>,
}

/// Progressive-image placeholder hashes, aligned to the face rows.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbHashPayload {
    pub art_crop: Vec<String>,
    pub card: Vec<String>,
}

pub(crate) fn check_schema_version(declared: Option<u32>) -> Result<(), LoadError> {
    match declared {
        Some(found) if found != SCHEMA_VERSION => Err(LoadError::Stale {
            found,
            expected: SCHEMA_VERSION,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn check_lookup(name: &str, lookup: &[String]) -> Result<(), LoadError> {
    match lookup.first() {
        Some(sentinel) if sentinel.is_empty() => Ok(()),
        _ => Err(LoadError::Malformed(format!(
            "{name} must reserve element 0 as the empty absent sentinel"
        ))),
    }
}
