use serde::{Deserialize, Serialize};

use crate::parse::header::{slot, ColumnMap};

/// Delimiter between the joined parts of `mn_address`.
const ADDRESS_SEP: &str = " • ";

/// One normalized registry row. Date fields carry the display text the
/// spreadsheet rendered, on purpose: the published formatting is the value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub license_number: String,
    pub license_type: String,
    pub category: String,
    pub holder: String,
    pub dba: String,
    pub city: String,
    pub original_date: String,
    pub next_reissue: String,
    pub qualified_rep: String,
    pub mn_manager: String,
    pub mn_phone: String,
    pub corp_phone: String,
    pub email: String,
    pub mn_address: String,
}

/// Cell for `slot` out of `row`, trimmed. Out-of-range source columns read as
/// empty rather than failing, so a short row degrades to blank fields.
fn cell(row: &[String], map: &ColumnMap, slot: usize) -> String {
    row.get(map.source_index(slot))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Map data rows (header already stripped) into records, dropping rows that
/// carry no license number, holder, or dba — blank separators and footnotes.
pub fn normalize_records(rows: &[Vec<String>], map: &ColumnMap) -> Vec<LicenseRecord> {
    rows.iter()
        .map(|row| to_record(row, map))
        .filter(|rec| {
            !rec.license_number.is_empty() || !rec.holder.is_empty() || !rec.dba.is_empty()
        })
        .collect()
}

fn to_record(row: &[String], map: &ColumnMap) -> LicenseRecord {
    let addr1 = cell(row, map, slot::ADDRESS_1);
    let addr2 = cell(row, map, slot::ADDRESS_2);
    let city = cell(row, map, slot::CITY);
    let state = cell(row, map, slot::STATE);
    let zip = cell(row, map, slot::ZIP);

    let city_state = [city.as_str(), state.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(", ");
    let mn_address = [addr1.as_str(), addr2.as_str(), city_state.as_str(), zip.as_str()]
        .iter()
        .filter(|s| !s.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(ADDRESS_SEP);

    LicenseRecord {
        license_number: cell(row, map, slot::LICENSE_NUMBER),
        license_type: cell(row, map, slot::LICENSE_TYPE),
        category: cell(row, map, slot::CATEGORY),
        holder: cell(row, map, slot::HOLDER),
        dba: cell(row, map, slot::DBA),
        city,
        original_date: cell(row, map, slot::ORIGINAL_DATE),
        next_reissue: cell(row, map, slot::NEXT_REISSUE),
        qualified_rep: cell(row, map, slot::QUALIFIED_REP),
        mn_manager: cell(row, map, slot::MN_MANAGER),
        mn_phone: cell(row, map, slot::MN_PHONE),
        corp_phone: cell(row, map, slot::CORP_PHONE),
        email: cell(row, map, slot::EMAIL),
        mn_address,
    }
}
