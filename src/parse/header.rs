//! Column layout detection.
//!
//! The upstream export is not contractually fixed: the header row may be
//! missing, columns may move, and the interesting labels get reworded between
//! publications. Row 0 is therefore classified by keyword, and when it is a
//! header, three slots (license number and the two date columns) are located
//! by pattern; every other slot keeps its fixed position.

use once_cell::sync::Lazy;
use regex::Regex;

pub const SLOT_COUNT: usize = 18;

/// Canonical column slots. Positions mirror the registry's published layout
/// (spreadsheet columns A through R).
pub mod slot {
    pub const CATEGORY: usize = 0;
    pub const LICENSE_TYPE: usize = 1;
    pub const LICENSE_NUMBER: usize = 2;
    pub const HOLDER: usize = 3;
    pub const DBA: usize = 4;
    pub const QUALIFIED_REP: usize = 6;
    pub const MN_MANAGER: usize = 7;
    pub const ADDRESS_1: usize = 8;
    pub const ADDRESS_2: usize = 9;
    pub const CITY: usize = 10;
    pub const STATE: usize = 11;
    pub const ZIP: usize = 12;
    pub const MN_PHONE: usize = 13;
    pub const CORP_PHONE: usize = 14;
    pub const EMAIL: usize = 15;
    pub const ORIGINAL_DATE: usize = 16;
    pub const NEXT_REISSUE: usize = 17;
}

/// Mapping from the 18 canonical slots to source column indices. The default
/// is the identity map; header detection overrides at most three slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap([usize; SLOT_COUNT]);

impl ColumnMap {
    pub fn fixed() -> Self {
        let mut map = [0usize; SLOT_COUNT];
        for (i, entry) in map.iter_mut().enumerate() {
            *entry = i;
        }
        ColumnMap(map)
    }

    /// Source column index feeding the given slot.
    pub fn source_index(&self, slot: usize) -> usize {
        self.0[slot]
    }

    fn set(&mut self, slot: usize, index: usize) {
        self.0[slot] = index;
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        ColumnMap::fixed()
    }
}

/// One detection rule: which slot it resolves, matched against a normalized
/// header cell. Kept as data so the list can grow when upstream wording
/// drifts, without touching the detection pass itself.
struct HeaderRule {
    slot: usize,
    pattern: Regex,
}

struct HeaderRules {
    /// Quick keyword test deciding whether row 0 is a header at all.
    header_hint: Regex,
    /// Exact label matches, applied first. First match per slot wins.
    exact: Vec<HeaderRule>,
    /// Looser phrasings, applied only to slots the exact pass left alone.
    fuzzy: Vec<HeaderRule>,
}

static RULES: Lazy<HeaderRules> = Lazy::new(|| {
    let rule = |slot: usize, pattern: &str| HeaderRule {
        slot,
        pattern: Regex::new(pattern).expect("header rule pattern should compile"),
    };
    HeaderRules {
        header_hint: Regex::new(r"licen|category|holder|city|reissu|original|date")
            .expect("header hint pattern should compile"),
        exact: vec![
            rule(slot::ORIGINAL_DATE, r"^\s*original\s+license\s+date\s*$"),
            rule(slot::NEXT_REISSUE, r"^\s*next\s+reissuance\s*$"),
            rule(slot::LICENSE_NUMBER, r"licen.*(#|number|no)"),
        ],
        fuzzy: vec![
            rule(
                slot::ORIGINAL_DATE,
                r"date\s*of\s*original\s*licen|original\s*licen.*date|date.*original",
            ),
            rule(
                slot::NEXT_REISSUE,
                r"next\s*reissu|re-?\s*issuance|reissuance\s*date|reissue",
            ),
        ],
    }
});

fn normalize(cell: &str) -> String {
    cell.trim().to_lowercase()
}

/// Decide whether `row` is a header row and, if so, build the column map for
/// the rows beneath it. A non-header row gets the fixed map and stays data.
pub fn detect(row: &[String]) -> (bool, ColumnMap) {
    let cells: Vec<String> = row.iter().map(|c| normalize(c)).collect();
    if !RULES.header_hint.is_match(&cells.join(" ")) {
        return (false, ColumnMap::fixed());
    }

    let mut map = ColumnMap::fixed();
    let mut resolved = [false; SLOT_COUNT];

    for rule in &RULES.exact {
        if let Some(i) = cells.iter().position(|c| rule.pattern.is_match(c)) {
            map.set(rule.slot, i);
            resolved[rule.slot] = true;
        }
    }
    for rule in &RULES.fuzzy {
        if resolved[rule.slot] {
            continue;
        }
        if let Some(i) = cells.iter().position(|c| rule.pattern.is_match(c)) {
            map.set(rule.slot, i);
        }
    }

    (true, map)
}
