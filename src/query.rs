//! Filter, sort, and paginate the cached record set. Query-time work has no
//! error states: an out-of-range page or a needle nobody matches just yields
//! an empty slice.

use serde::Serialize;

use crate::parse::records::LicenseRecord;

pub const MIN_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 250; // clamped down to MAX_PAGE_SIZE

#[derive(Debug, Clone)]
pub struct QueryParams {
    pub search: String,
    pub page: usize,
    pub page_size: usize,
}

impl QueryParams {
    /// Normalize raw request inputs: page floors at 1, page size clamps to
    /// the allowed window, absent values take the documented defaults.
    pub fn normalize(q: Option<String>, page: Option<i64>, page_size: Option<i64>) -> Self {
        QueryParams {
            search: q.unwrap_or_default(),
            page: page.unwrap_or(1).max(1) as usize,
            page_size: (page_size.unwrap_or(DEFAULT_PAGE_SIZE as i64).max(MIN_PAGE_SIZE as i64)
                as usize)
                .min(MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QueryPage {
    pub total: usize,
    pub page: usize,
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    pub results: Vec<LicenseRecord>,
}

/// Run one query over the full record set.
pub fn run(records: &[LicenseRecord], params: &QueryParams) -> QueryPage {
    let needle = params.search.trim().to_lowercase();

    let mut filtered: Vec<&LicenseRecord> = if needle.is_empty() {
        records.iter().collect()
    } else {
        records
            .iter()
            .filter(|r| searchable_text(r).contains(&needle))
            .collect()
    };

    filtered.sort_by(|a, b| {
        license_sort_key(&a.license_number)
            .cmp(&license_sort_key(&b.license_number))
            .then_with(|| a.holder.to_lowercase().cmp(&b.holder.to_lowercase()))
    });

    let total = filtered.len();
    let start = (params.page - 1).saturating_mul(params.page_size);
    let results = filtered
        .into_iter()
        .skip(start)
        .take(params.page_size)
        .cloned()
        .collect();

    QueryPage {
        total,
        page: params.page,
        page_size: params.page_size,
        results,
    }
}

fn searchable_text(r: &LicenseRecord) -> String {
    [
        r.license_number.as_str(),
        r.license_type.as_str(),
        r.category.as_str(),
        r.holder.as_str(),
        r.dba.as_str(),
        r.city.as_str(),
    ]
    .join(" ")
    .to_lowercase()
}

/// Numeric ordering key for a license number: strip non-digits and parse what
/// is left. Values with no digits at all sort after every real number.
fn license_sort_key(license_number: &str) -> u64 {
    let digits: String = license_number.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(u64::MAX)
}
