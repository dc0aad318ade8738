use serde::{Deserialize, Serialize};

/// Bitmask over the five card colors.
///
/// Bit layout matches the columnar payload: W=1, U=2, B=4, R=8, G=16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColorSet(pub u8);

pub const WHITE: ColorSet = ColorSet(1);
pub const BLUE: ColorSet = ColorSet(2);
pub const BLACK: ColorSet = ColorSet(4);
pub const RED: ColorSet = ColorSet(8);
pub const GREEN: ColorSet = ColorSet(16);

/// Canonical serialization order for color letters.
const WUBRG: [(char, ColorSet); 5] = [
    ('w', WHITE),
    ('u', BLUE),
    ('b', BLACK),
    ('r', RED),
    ('g', GREEN),
];

impl ColorSet {
    pub const ALL: ColorSet = ColorSet(0b11111);

    pub fn empty() -> Self {
        ColorSet(0)
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> u32 {
        self.0.count_ones()
    }

    pub fn contains(&self, other: ColorSet) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_subset_of(&self, other: ColorSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_multicolor(&self) -> bool {
        self.len() >= 2
    }

    pub fn insert(&mut self, other: ColorSet) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: ColorSet) {
        self.0 &= !other.0;
    }

    pub fn toggled(self, other: ColorSet) -> ColorSet {
        ColorSet(self.0 ^ other.0)
    }

    /// Single color for a WUBRG letter, case-insensitive.
    pub fn from_letter(letter: char) -> Option<ColorSet> {
        let letter = letter.to_ascii_lowercase();
        WUBRG.iter().find(|(c, _)| *c == letter).map(|(_, m)| *m)
    }

    /// Parse a run of WUBRG letters. Duplicates are tolerated; any other
    /// character rejects the whole string.
    pub fn from_letters(s: &str) -> Option<ColorSet> {
        let mut mask = ColorSet::empty();
        for ch in s.chars() {
            mask.insert(ColorSet::from_letter(ch)?);
        }
        Some(mask)
    }

    /// Letters in canonical WUBRG order, lowercase. Empty set renders as "c".
    pub fn letters(&self) -> String {
        if self.is_empty() {
            return "c".to_string();
        }
        WUBRG
            .iter()
            .filter(|(_, m)| self.contains(*m))
            .map(|(c, _)| *c)
            .collect()
    }
}

/// A color-field query value: either a concrete mask or the special
/// "two or more colors" request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorValue {
    Mask(ColorSet),
    Multicolor,
}

/// Parse the value of a `c:`/`ci:` query term.
///
/// Accepts WUBRG letter runs, full color names, `colorless`/`c`,
/// `multicolor`/`m`, and the guild, shard, and wedge nicknames.
pub fn parse_color_value(value: &str) -> Option<ColorValue> {
    let value = value.to_lowercase();

    let named = match value.as_str() {
        "white" => Some("w"),
        "blue" => Some("u"),
        "black" => Some("b"),
        "red" => Some("r"),
        "green" => Some("g"),
        "c" | "colorless" => Some(""),
        // Guild names
        "azorius" => Some("wu"),
        "dimir" => Some("ub"),
        "rakdos" => Some("br"),
        "gruul" => Some("rg"),
        "selesnya" => Some("gw"),
        "orzhov" => Some("wb"),
        "izzet" => Some("ur"),
        "golgari" => Some("bg"),
        "boros" => Some("rw"),
        "simic" => Some("gu"),
        // Shard names
        "bant" => Some("gwu"),
        "esper" => Some("wub"),
        "grixis" => Some("ubr"),
        "jund" => Some("brg"),
        "naya" => Some("rgw"),
        // Wedge names
        "abzan" => Some("wbg"),
        "jeskai" => Some("urw"),
        "sultai" => Some("bgu"),
        "mardu" => Some("rwb"),
        "temur" => Some("gur"),
        _ => None,
    };

    if let Some(letters) = named {
        return ColorSet::from_letters(letters).map(ColorValue::Mask);
    }

    if value == "m" || value == "multicolor" || value == "multi" {
        return Some(ColorValue::Multicolor);
    }

    ColorSet::from_letters(&value).map(ColorValue::Mask)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_parsing() {
        assert_eq!(ColorSet::from_letters("w"), Some(WHITE));
        assert_eq!(ColorSet::from_letters("WUg"), Some(ColorSet(1 | 2 | 16)));
        assert_eq!(ColorSet::from_letters(""), Some(ColorSet::empty()));
        assert_eq!(ColorSet::from_letters("wx"), None);
    }

    #[test]
    fn test_canonical_letters() {
        let mask = ColorSet::from_letters("gub").unwrap();
        assert_eq!(mask.letters(), "ubg");
        assert_eq!(ColorSet::empty().letters(), "c");
        assert_eq!(ColorSet::ALL.letters(), "wubrg");
    }

    #[test]
    fn test_subset_and_multicolor() {
        let ur = ColorSet::from_letters("ur").unwrap();
        assert!(BLUE.is_subset_of(ur));
        assert!(!ur.is_subset_of(BLUE));
        assert!(ur.is_multicolor());
        assert!(!RED.is_multicolor());
        assert!(ColorSet::empty().is_subset_of(ur));
    }

    #[test]
    fn test_named_values() {
        assert_eq!(
            parse_color_value("izzet"),
            Some(ColorValue::Mask(ColorSet::from_letters("ur").unwrap()))
        );
        assert_eq!(
            parse_color_value("Bant"),
            Some(ColorValue::Mask(ColorSet::from_letters("gwu").unwrap()))
        );
        assert_eq!(
            parse_color_value("colorless"),
            Some(ColorValue::Mask(ColorSet::empty()))
        );
        assert_eq!(parse_color_value("m"), Some(ColorValue::Multicolor));
        assert_eq!(parse_color_value("chartreuse"), None);
    }
}
