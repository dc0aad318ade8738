//! Query evaluation.
//!
//! Evaluation is total: every AST node yields a [`NodeResult`] carrying a
//! face bitset, an optional printing bitset, and a match count, with
//! recoverable problems attached as error tags instead of being thrown.
//! Results are memoized in the [`NodeCache`](super::cache::NodeCache) by the
//! node's canonical key and shared by reference on repeat evaluation.

use std::sync::Arc;

use serde::Serialize;

use crate::cards::{mana, parse_color_value, ColorSet, ColorValue, Finish, Format, Rarity};

use super::ast::{CompareOp, FieldTerm, Query, RegexTerm};
use super::bitset::Bitset;
use super::cache::NodeCache;
use super::index::{CardIndex, PrintingIndex};

/// Recoverable per-node problem, surfaced in the breakdown tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeError {
    UnknownField,
    InvalidRegex,
    InvalidNumeric,
    InvalidValue,
    InvalidOperator,
    PrintingsMissing,
    Parse,
}

/// Result of evaluating one AST node.
#[derive(Debug, Clone)]
pub struct NodeResult {
    pub label: String,
    /// Face rows that match.
    pub faces: Arc<Bitset>,
    /// Printing rows that match; present only in the printing domain.
    pub printings: Option<Arc<Bitset>>,
    /// Matching faces, or matching printings when in the printing domain.
    pub match_count: u32,
    pub error: Option<NodeError>,
    pub children: Vec<Arc<NodeResult>>,
}

impl NodeResult {
    pub fn in_printing_domain(&self) -> bool {
        self.printings.is_some()
    }
}

/// Which rows the result list should contain, driven by `unique:` markers.
/// Markers apply last-writer-wins in source order; cards is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniqueMode {
    #[default]
    Cards,
    Prints,
}

pub struct EvalOutcome {
    pub root: Arc<NodeResult>,
    pub unique: UniqueMode,
}

/// The canonical fields, after alias resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Oracle,
    Type,
    Color,
    Identity,
    Power,
    Toughness,
    Loyalty,
    Defense,
    ManaValue,
    Mana,
    Legal,
    Set,
    Rarity,
    Finish,
    Usd,
    Is,
    Unique,
}

fn resolve_field(name: &str) -> Option<Field> {
    let field = match name {
        "name" | "n" => Field::Name,
        "oracle" | "o" => Field::Oracle,
        "type" | "t" => Field::Type,
        "color" | "c" => Field::Color,
        "identity" | "id" | "ci" | "commander" | "cmd" => Field::Identity,
        "power" | "pow" => Field::Power,
        "toughness" | "tou" => Field::Toughness,
        "loyalty" | "loy" => Field::Loyalty,
        "defense" | "def" => Field::Defense,
        "mv" | "cmc" => Field::ManaValue,
        "mana" | "m" => Field::Mana,
        "legal" | "f" | "format" => Field::Legal,
        "set" | "s" | "e" => Field::Set,
        "rarity" | "r" => Field::Rarity,
        "finish" => Field::Finish,
        "usd" | "price" => Field::Usd,
        "is" => Field::Is,
        "unique" => Field::Unique,
        _ => return None,
    };
    Some(field)
}

pub struct Evaluator<'a> {
    cards: &'a CardIndex,
    printings: Option<&'a PrintingIndex>,
    cache: &'a mut NodeCache,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        cards: &'a CardIndex,
        printings: Option<&'a PrintingIndex>,
        cache: &'a mut NodeCache,
    ) -> Evaluator<'a> {
        Evaluator {
            cards,
            printings,
            cache,
        }
    }

    pub fn evaluate(&mut self, query: &Query) -> EvalOutcome {
        let root = self.eval_node(query);

        let mut unique = UniqueMode::default();
        query.walk(&mut |node| {
            if let Query::Field(term) = node {
                if resolve_field(&term.field) == Some(Field::Unique) && term.op == CompareOp::Colon
                {
                    match term.value.to_lowercase().as_str() {
                        "prints" => unique = UniqueMode::Prints,
                        "cards" => unique = UniqueMode::Cards,
                        _ => {}
                    }
                }
            }
        });

        EvalOutcome { root, unique }
    }

    fn eval_node(&mut self, node: &Query) -> Arc<NodeResult> {
        let key = node.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        let result = Arc::new(match node {
            Query::And { children, .. } => self.eval_junction(node, children, true),
            Query::Or { children, .. } => self.eval_junction(node, children, false),
            Query::Not { child, .. } => self.eval_not(node, child),
            Query::Field(term) => self.eval_field(node, term),
            Query::RegexField(term) => self.eval_regex_field(node, term),
            Query::Bare { value, .. } => {
                let needle = value.to_lowercase();
                let faces = self.faces_where(|f| {
                    self.cards.lower_name[f].contains(&needle)
                        || self.cards.lower_combined[f].contains(&needle)
                });
                self.face_result(node, faces, None)
            }
            Query::Exact { value, .. } => {
                let needle = value.to_lowercase();
                let faces = self.faces_where(|f| {
                    self.cards.lower_name[f] == needle || self.cards.lower_combined[f] == needle
                });
                self.face_result(node, faces, None)
            }
            Query::Nop { .. } => self.face_result(
                node,
                Bitset::new(self.cards.face_count()),
                Some(NodeError::Parse),
            ),
        });

        self.cache.insert(key, Arc::clone(&result));
        result
    }

    /// AND / OR over child results. Any printing-domain child flips the
    /// whole junction into the printing domain.
    fn eval_junction(&mut self, node: &Query, children: &[Query], intersect: bool) -> NodeResult {
        let child_results: Vec<Arc<NodeResult>> =
            children.iter().map(|child| self.eval_node(child)).collect();

        let printing_domain = child_results.iter().any(|r| r.in_printing_domain());

        if printing_domain {
            let printing_count = self
                .printings
                .expect("printing-domain child requires printings")
                .printing_count();
            let mut combined = if intersect {
                Bitset::full(printing_count)
            } else {
                Bitset::new(printing_count)
            };
            for child in &child_results {
                let child_printings = self.printing_set_of(child);
                if intersect {
                    combined.intersect_with(&child_printings);
                } else {
                    combined.union_with(&child_printings);
                }
            }
            return self.printing_result(node, combined, None, child_results);
        }

        let mut combined = if intersect {
            Bitset::full(self.cards.face_count())
        } else {
            Bitset::new(self.cards.face_count())
        };
        for child in &child_results {
            if intersect {
                combined.intersect_with(&child.faces);
            } else {
                combined.union_with(&child.faces);
            }
        }
        NodeResult {
            label: node.label(),
            match_count: combined.count(),
            faces: Arc::new(combined),
            printings: None,
            error: None,
            children: child_results,
        }
    }

    /// Negation is lifted to the card level: the complement of "some face of
    /// the card matches", re-expanded to faces. In the printing domain it is
    /// the complement over printing rows instead.
    fn eval_not(&mut self, node: &Query, child: &Query) -> NodeResult {
        let child_result = self.eval_node(child);

        if child_result.in_printing_domain() {
            let complement = self.printing_set_of(&child_result).complement();
            return self.printing_result(node, complement, None, vec![child_result]);
        }

        let matching_cards = self.cards.expand_to_cards(&child_result.faces);
        let faces = matching_cards.complement();
        NodeResult {
            label: node.label(),
            match_count: faces.count(),
            faces: Arc::new(faces),
            printings: None,
            error: None,
            children: vec![child_result],
        }
    }

    fn eval_field(&mut self, node: &Query, term: &FieldTerm) -> NodeResult {
        let Some(field) = resolve_field(&term.field) else {
            return self.empty(node, NodeError::UnknownField);
        };
        let op = term.op;
        let value = term.value.as_str();

        let columns = &self.cards.columns;
        match field {
            Field::Name => {
                self.eval_text(node, op, value, &self.cards.lower_name, &self.cards.lower_combined)
            }
            Field::Oracle => {
                self.eval_text(node, op, value, &self.cards.lower_oracle, &self.cards.lower_oracle)
            }
            Field::Type => {
                self.eval_text(node, op, value, &self.cards.lower_type, &self.cards.lower_type)
            }
            Field::Color => self.eval_color(node, op, value, &columns.color),
            Field::Identity => self.eval_color(node, op, value, &columns.color_identity),
            Field::Power => self.eval_stat(node, op, value, &columns.power, &columns.power_lookup),
            Field::Toughness => {
                self.eval_stat(node, op, value, &columns.toughness, &columns.toughness_lookup)
            }
            Field::Loyalty => {
                self.eval_stat(node, op, value, &columns.loyalty, &columns.loyalty_lookup)
            }
            Field::Defense => {
                self.eval_stat(node, op, value, &columns.defense, &columns.defense_lookup)
            }
            Field::ManaValue => self.eval_mana_value(node, op, value),
            Field::Mana => self.eval_mana_cost(node, op, value),
            Field::Legal => self.eval_legal(node, op, value),
            Field::Set => self.eval_set(node, op, value),
            Field::Rarity => self.eval_rarity(node, op, value),
            Field::Finish => self.eval_finish(node, op, value),
            Field::Usd => self.eval_usd(node, op, value),
            Field::Is => self.eval_is(node, op, value),
            Field::Unique => self.eval_unique(node, op, value),
        }
    }

    /// Substring (`:`) or whole-string (`=`) match over a pair of
    /// case-folded columns; a face matches if either column does.
    fn eval_text(
        &self,
        node: &Query,
        op: CompareOp,
        value: &str,
        primary: &[String],
        secondary: &[String],
    ) -> NodeResult {
        let needle = value.to_lowercase();
        match op {
            CompareOp::Colon => {
                let faces = self.faces_where(|f| {
                    primary[f].contains(&needle) || secondary[f].contains(&needle)
                });
                self.face_result(node, faces, None)
            }
            CompareOp::Eq => {
                let faces =
                    self.faces_where(|f| primary[f] == needle || secondary[f] == needle);
                self.face_result(node, faces, None)
            }
            _ => self.empty(node, NodeError::InvalidOperator),
        }
    }

    fn eval_color(
        &self,
        node: &Query,
        op: CompareOp,
        value: &str,
        masks: &[ColorSet],
    ) -> NodeResult {
        let Some(color_value) = parse_color_value(value) else {
            return self.empty(node, NodeError::InvalidValue);
        };

        let faces = match color_value {
            ColorValue::Multicolor => match op {
                CompareOp::Colon | CompareOp::Eq | CompareOp::Gte => {
                    self.faces_where(|f| masks[f].is_multicolor())
                }
                CompareOp::Neq => self.faces_where(|f| !masks[f].is_multicolor()),
                _ => return self.empty(node, NodeError::InvalidOperator),
            },
            ColorValue::Mask(query) => match op {
                // With an empty query mask, "at least these colors" would be
                // vacuous; colorless means exactly no colors.
                CompareOp::Colon | CompareOp::Gte if query.is_empty() => {
                    self.faces_where(|f| masks[f].is_empty())
                }
                CompareOp::Colon | CompareOp::Gte => {
                    self.faces_where(|f| masks[f].contains(query))
                }
                CompareOp::Eq => self.faces_where(|f| masks[f] == query),
                CompareOp::Neq => self.faces_where(|f| masks[f] != query),
                CompareOp::Lte => self.faces_where(|f| masks[f].is_subset_of(query)),
                _ => return self.empty(node, NodeError::InvalidOperator),
            },
        };
        self.face_result(node, faces, None)
    }

    /// Stats backed by the 1-indexed lookup tables (`power`, `toughness`,
    /// `loyalty`, `defense`). Absent stats satisfy nothing; non-numeric
    /// stats only match literal `:`/`=` comparisons against themselves.
    fn eval_stat(
        &self,
        node: &Query,
        op: CompareOp,
        value: &str,
        indices: &[u16],
        lookup: &[String],
    ) -> NodeResult {
        if let Ok(wanted) = value.parse::<f64>() {
            let faces = self.faces_where(|f| {
                let index = indices[f];
                if index == 0 {
                    return false;
                }
                match lookup[index as usize].parse::<f64>() {
                    Ok(stat) => compare_numbers(stat, op, wanted),
                    Err(_) => false,
                }
            });
            return self.face_result(node, faces, None);
        }

        // Non-numeric query value (`pow:*`): literal comparison only.
        let needle = value.to_lowercase();
        match op {
            CompareOp::Colon | CompareOp::Eq => {
                let faces = self.faces_where(|f| {
                    let index = indices[f];
                    index != 0 && lookup[index as usize].to_lowercase() == needle
                });
                self.face_result(node, faces, None)
            }
            CompareOp::Neq => {
                let faces = self.faces_where(|f| {
                    let index = indices[f];
                    index != 0 && lookup[index as usize].to_lowercase() != needle
                });
                self.face_result(node, faces, None)
            }
            _ => self.empty(node, NodeError::InvalidNumeric),
        }
    }

    fn eval_mana_value(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        let Ok(wanted) = value.parse::<f64>() else {
            return self.empty(node, NodeError::InvalidNumeric);
        };
        let faces = self.faces_where(|f| {
            compare_numbers(self.cards.columns.mana_value[f] as f64, op, wanted)
        });
        self.face_result(node, faces, None)
    }

    /// Mana costs compare as symbol multisets.
    fn eval_mana_cost(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        let wanted = mana::symbols(value);
        let faces = match op {
            CompareOp::Colon | CompareOp::Gte => {
                self.faces_where(|f| mana::contains_all(&self.cards.mana_symbols[f], &wanted))
            }
            CompareOp::Eq => {
                self.faces_where(|f| mana::same_multiset(&self.cards.mana_symbols[f], &wanted))
            }
            CompareOp::Neq => {
                self.faces_where(|f| !mana::same_multiset(&self.cards.mana_symbols[f], &wanted))
            }
            CompareOp::Lte => {
                self.faces_where(|f| mana::contains_all(&wanted, &self.cards.mana_symbols[f]))
            }
            _ => return self.empty(node, NodeError::InvalidOperator),
        };
        self.face_result(node, faces, None)
    }

    fn eval_legal(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        if op != CompareOp::Colon {
            return self.empty(node, NodeError::InvalidOperator);
        }
        let Some(format) = Format::parse(value) else {
            return self.empty(node, NodeError::InvalidValue);
        };
        let bit = format.bit();
        // Restricted still counts as playable for legality searches.
        let faces = self.faces_where(|f| {
            (self.cards.columns.legalities_legal[f] | self.cards.columns.legalities_restricted[f])
                & bit
                != 0
        });
        self.face_result(node, faces, None)
    }

    fn eval_set(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        if !matches!(op, CompareOp::Colon | CompareOp::Eq) {
            return self.empty(node, NodeError::InvalidOperator);
        }
        let Some(printings) = self.printings else {
            return self.empty(node, NodeError::PrintingsMissing);
        };
        let mut set = Bitset::new(printings.printing_count());
        if let Some(rows) = printings.by_set(value) {
            for p in rows {
                set.insert(*p);
            }
        }
        self.printing_result(node, set, None, Vec::new())
    }

    fn eval_rarity(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        let Some(printings) = self.printings else {
            return self.empty(node, NodeError::PrintingsMissing);
        };
        let Some(wanted) = Rarity::parse(value) else {
            return self.empty(node, NodeError::InvalidValue);
        };
        let rows = self.printings_where(printings, |p| {
            let rarity = printings.columns.rarity[p];
            match op {
                CompareOp::Colon | CompareOp::Eq => rarity == wanted,
                CompareOp::Neq => rarity != wanted,
                CompareOp::Lt => rarity < wanted,
                CompareOp::Lte => rarity <= wanted,
                CompareOp::Gt => rarity > wanted,
                CompareOp::Gte => rarity >= wanted,
            }
        });
        self.printing_result(node, rows, None, Vec::new())
    }

    fn eval_finish(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        if op != CompareOp::Colon {
            return self.empty(node, NodeError::InvalidOperator);
        }
        let Some(printings) = self.printings else {
            return self.empty(node, NodeError::PrintingsMissing);
        };
        let Some(wanted) = Finish::parse(value) else {
            return self.empty(node, NodeError::InvalidValue);
        };
        let rows = self.printings_where(printings, |p| printings.columns.finish[p] == wanted);
        self.printing_result(node, rows, None, Vec::new())
    }

    /// Prices are integer cents; 0 marks an unknown price, which never
    /// matches. Query values are dollars with optional cents.
    fn eval_usd(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        let Some(printings) = self.printings else {
            return self.empty(node, NodeError::PrintingsMissing);
        };
        let Ok(dollars) = value.parse::<f64>() else {
            return self.empty(node, NodeError::InvalidNumeric);
        };
        let wanted_cents = (dollars * 100.0).round();
        let rows = self.printings_where(printings, |p| {
            let cents = printings.columns.price_usd[p];
            cents != 0 && compare_numbers(cents as f64, op, wanted_cents)
        });
        self.printing_result(node, rows, None, Vec::new())
    }

    fn eval_is(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        use crate::cards::Layout;

        if op != CompareOp::Colon {
            return self.empty(node, NodeError::InvalidOperator);
        }
        let layouts = &self.cards.columns.layout;
        let faces = match value.to_lowercase().as_str() {
            "dfc" => self.faces_where(|f| layouts[f].is_double_faced()),
            "mdfc" => self.faces_where(|f| layouts[f] == Layout::ModalDfc),
            "transform" => self.faces_where(|f| layouts[f] == Layout::Transform),
            "meld" => self.faces_where(|f| layouts[f] == Layout::Meld),
            "split" => self.faces_where(|f| layouts[f] == Layout::Split),
            "flip" => self.faces_where(|f| layouts[f] == Layout::Flip),
            "adventure" => self.faces_where(|f| layouts[f] == Layout::Adventure),
            "leveler" => self.faces_where(|f| layouts[f] == Layout::Leveler),
            "spell" => self.faces_where(|f| !self.cards.lower_type[f].contains("land")),
            "permanent" => self.faces_where(|f| {
                let t = &self.cards.lower_type[f];
                ["creature", "artifact", "enchantment", "land", "planeswalker", "battle"]
                    .iter()
                    .any(|kind| t.contains(kind))
            }),
            "dual" => self.faces_where(|f| {
                let t = &self.cards.lower_type[f];
                let basics = ["plains", "island", "swamp", "mountain", "forest"];
                t.contains("land") && basics.iter().filter(|b| t.contains(*b)).count() >= 2
            }),
            _ => return self.empty(node, NodeError::InvalidValue),
        };
        self.face_result(node, faces, None)
    }

    /// `unique:` is a result-shape marker, not a filter; it matches every
    /// row. `unique:prints` additionally forces the printing domain.
    fn eval_unique(&self, node: &Query, op: CompareOp, value: &str) -> NodeResult {
        if op != CompareOp::Colon {
            return self.empty(node, NodeError::InvalidOperator);
        }
        match value.to_lowercase().as_str() {
            "prints" => {
                if let Some(printings) = self.printings {
                    self.printing_result(
                        node,
                        Bitset::full(printings.printing_count()),
                        None,
                        Vec::new(),
                    )
                } else {
                    self.face_result(node, Bitset::full(self.cards.face_count()), None)
                }
            }
            "cards" => self.face_result(node, Bitset::full(self.cards.face_count()), None),
            _ => self.empty(node, NodeError::InvalidValue),
        }
    }

    fn eval_regex_field(&self, node: &Query, term: &RegexTerm) -> NodeResult {
        let compiled = regex::RegexBuilder::new(&term.pattern)
            .case_insensitive(true)
            .build();
        let Ok(pattern) = compiled else {
            return self.empty(node, NodeError::InvalidRegex);
        };

        let faces = match term.field.as_str() {
            // The bare form searches name, oracle text and type line.
            "" => self.faces_where(|f| {
                pattern.is_match(&self.cards.columns.name[f])
                    || pattern.is_match(&self.cards.columns.oracle_text[f])
                    || pattern.is_match(&self.cards.columns.type_line[f])
            }),
            "name" | "n" => self.faces_where(|f| {
                pattern.is_match(&self.cards.columns.name[f])
                    || pattern.is_match(&self.cards.columns.combined_name[f])
            }),
            "oracle" | "o" => {
                self.faces_where(|f| pattern.is_match(&self.cards.columns.oracle_text[f]))
            }
            "type" | "t" => {
                self.faces_where(|f| pattern.is_match(&self.cards.columns.type_line[f]))
            }
            other => {
                let error = if resolve_field(other).is_some() {
                    // The field exists but has no regex semantics.
                    NodeError::InvalidValue
                } else {
                    NodeError::UnknownField
                };
                return self.empty(node, error);
            }
        };
        self.face_result(node, faces, None)
    }

    fn faces_where(&self, predicate: impl Fn(usize) -> bool) -> Bitset {
        let mut set = Bitset::new(self.cards.face_count());
        for f in 0..self.cards.face_count() {
            if predicate(f) {
                set.insert(f as u32);
            }
        }
        set
    }

    fn printings_where(
        &self,
        printings: &PrintingIndex,
        predicate: impl Fn(usize) -> bool,
    ) -> Bitset {
        let mut set = Bitset::new(printings.printing_count());
        for p in 0..printings.printing_count() {
            if predicate(p) {
                set.insert(p as u32);
            }
        }
        set
    }

    /// Printing set of a child result, lifting face-domain children through
    /// the card level: every printing of a card with a matching face.
    fn printing_set_of(&self, child: &NodeResult) -> Arc<Bitset> {
        if let Some(printings) = &child.printings {
            return Arc::clone(printings);
        }
        let printings = self.printings.expect("printing domain requires printings");
        let mut out = Bitset::new(printings.printing_count());
        for canonical in self.cards.deduplicate_matches(&child.faces) {
            for p in printings.printings_of(canonical) {
                out.insert(*p);
            }
        }
        Arc::new(out)
    }

    /// Faces of every card with a printing in `set`.
    fn printings_to_faces(&self, set: &Bitset) -> Bitset {
        let printings = self.printings.expect("printing domain requires printings");
        let mut seen = Bitset::new(self.cards.face_count());
        let mut out = Bitset::new(self.cards.face_count());
        for p in set.iter() {
            let canonical = printings.canonical_face_ref(p);
            if !seen.contains(canonical) {
                seen.insert(canonical);
                for face in self.cards.faces_of(canonical) {
                    out.insert(*face);
                }
            }
        }
        out
    }

    fn face_result(&self, node: &Query, faces: Bitset, error: Option<NodeError>) -> NodeResult {
        NodeResult {
            label: node.label(),
            match_count: faces.count(),
            faces: Arc::new(faces),
            printings: None,
            error,
            children: Vec::new(),
        }
    }

    fn printing_result(
        &self,
        node: &Query,
        printings: Bitset,
        error: Option<NodeError>,
        children: Vec<Arc<NodeResult>>,
    ) -> NodeResult {
        let faces = self.printings_to_faces(&printings);
        NodeResult {
            label: node.label(),
            match_count: printings.count(),
            faces: Arc::new(faces),
            printings: Some(Arc::new(printings)),
            error,
            children,
        }
    }

    fn empty(&self, node: &Query, error: NodeError) -> NodeResult {
        self.face_result(node, Bitset::new(self.cards.face_count()), Some(error))
    }
}

fn compare_numbers(actual: f64, op: CompareOp, wanted: f64) -> bool {
    match op {
        CompareOp::Colon | CompareOp::Eq => actual == wanted,
        CompareOp::Neq => actual != wanted,
        CompareOp::Lt => actual < wanted,
        CompareOp::Lte => actual <= wanted,
        CompareOp::Gt => actual > wanted,
        CompareOp::Gte => actual >= wanted,
    }
}
