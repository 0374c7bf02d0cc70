use crate::error::CardstockError;
use std::collections::HashMap;
use std::path::Path;

/// Field keys every beneficiary record carries after reconciliation.
pub const COLUMN_NAME: &str = "LAABHARTHI_NAME";
pub const COLUMN_CONTACT: &str = "CONTACT_NUMBER";
pub const COLUMN_GROUP: &str = "ARPIT_GROUP";
pub const COLUMN_AREA: &str = "AREA";

pub const REQUIRED_COLUMNS: [&str; 4] =
    [COLUMN_NAME, COLUMN_CONTACT, COLUMN_GROUP, COLUMN_AREA];

/// Keyword fallbacks per required column, in priority order. Tried only when
/// no header matches the required name itself.
fn keyword_candidates(required: &str) -> &'static [&'static str] {
    match required {
        COLUMN_NAME => &["name", "person", "beneficiary"],
        COLUMN_CONTACT => &["phone", "contact", "mobile", "number"],
        COLUMN_GROUP => &["group", "category", "team"],
        COLUMN_AREA => &["area", "location", "place", "region", "city"],
        _ => &[],
    }
}

/// One ingested row: field name to text value, in field order. Values are
/// kept as the source text; numbers are not reformatted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    fn insert(&mut self, field: &str, value: String) {
        self.fields.push((field.to_string(), value));
    }
}

/// Explicit header assignments that bypass fuzzy matching per column.
#[derive(Debug, Clone, Default)]
pub struct ColumnOverrides {
    map: HashMap<String, String>,
}

impl ColumnOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(mut self, required: &str, header: &str) -> Self {
        self.map.insert(required.to_string(), header.to_string());
        self
    }

    fn get(&self, required: &str) -> Option<&str> {
        self.map.get(required).map(String::as_str)
    }
}

/// Result of header reconciliation: source header index per required column,
/// plus the columns nothing matched (filled with empty values downstream).
#[derive(Debug, Clone)]
pub struct ColumnMap {
    assignments: Vec<(&'static str, Option<usize>)>,
    pub missing: Vec<String>,
}

impl ColumnMap {
    /// Index of the source header serving `required`, if any matched.
    pub fn source_index(&self, required: &str) -> Option<usize> {
        self.assignments
            .iter()
            .find(|(name, _)| *name == required)
            .and_then(|(_, idx)| *idx)
    }
}

/// Map the sheet's required columns onto `headers`.
///
/// Overrides claim their headers first; the remaining columns then try, in
/// fixed order: exact case-insensitive header, substring containment either
/// way, the per-column keyword list. A claimed header is out of play for
/// later columns. A stage that matches two or more unclaimed headers fails
/// with the candidates named; the original tool picked one silently, which
/// mislabeled cards whenever headers like AREA and PLACE_AREA_CODE coexisted.
pub fn reconcile_columns(
    headers: &[String],
    overrides: &ColumnOverrides,
) -> Result<ColumnMap, CardstockError> {
    let lowered: Vec<String> = headers.iter().map(|h| h.to_lowercase()).collect();
    let mut claimed = vec![false; headers.len()];
    let mut chosen: Vec<(&'static str, Option<usize>)> = Vec::new();

    for required in REQUIRED_COLUMNS {
        if let Some(header) = overrides.get(required) {
            let idx = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(header))
                .ok_or_else(|| {
                    CardstockError::Ingest(format!(
                        "override for {} names absent header {}",
                        required, header
                    ))
                })?;
            claimed[idx] = true;
            chosen.push((required, Some(idx)));
        } else {
            chosen.push((required, None));
        }
    }

    let mut assignments = Vec::with_capacity(REQUIRED_COLUMNS.len());
    let mut missing = Vec::new();
    for (required, overridden) in chosen {
        let slot = match overridden {
            Some(idx) => Some(idx),
            None => {
                let found = match_header(required, headers, &lowered, &claimed)?;
                if let Some(idx) = found {
                    claimed[idx] = true;
                }
                found
            }
        };
        if slot.is_none() {
            missing.push(required.to_string());
        }
        assignments.push((required, slot));
    }

    Ok(ColumnMap {
        assignments,
        missing,
    })
}

fn match_header(
    required: &'static str,
    headers: &[String],
    lowered: &[String],
    claimed: &[bool],
) -> Result<Option<usize>, CardstockError> {
    let wanted = required.to_lowercase();

    if let Some(idx) = lowered
        .iter()
        .position(|h| *h == wanted)
        .filter(|&idx| !claimed[idx])
    {
        return Ok(Some(idx));
    }

    let contains: Vec<usize> = lowered
        .iter()
        .enumerate()
        .filter(|(idx, h)| !claimed[*idx] && (h.contains(&wanted) || wanted.contains(h.as_str())))
        .map(|(idx, _)| idx)
        .collect();
    if let Some(idx) = single_or_ambiguous(required, headers, contains)? {
        return Ok(Some(idx));
    }

    for keyword in keyword_candidates(required) {
        let hits: Vec<usize> = lowered
            .iter()
            .enumerate()
            .filter(|(idx, h)| !claimed[*idx] && h.contains(keyword))
            .map(|(idx, _)| idx)
            .collect();
        if let Some(idx) = single_or_ambiguous(required, headers, hits)? {
            return Ok(Some(idx));
        }
    }

    Ok(None)
}

fn single_or_ambiguous(
    required: &str,
    headers: &[String],
    hits: Vec<usize>,
) -> Result<Option<usize>, CardstockError> {
    match hits.len() {
        0 => Ok(None),
        1 => Ok(Some(hits[0])),
        _ => Err(CardstockError::ColumnAmbiguous {
            wanted: required.to_string(),
            candidates: hits.iter().map(|&idx| headers[idx].clone()).collect(),
        }),
    }
}

/// Read beneficiary records from a CSV file. The first row is the header;
/// ragged rows are tolerated and short cells read as empty.
pub fn read_records(
    path: impl AsRef<Path>,
    overrides: &ColumnOverrides,
) -> Result<(Vec<Record>, ColumnMap), CardstockError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path.as_ref())
        .map_err(|err| CardstockError::Ingest(err.to_string()))?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| CardstockError::Ingest(err.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();
    let columns = reconcile_columns(&headers, overrides)?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| CardstockError::Ingest(err.to_string()))?;
        let mut record = Record::default();
        for required in REQUIRED_COLUMNS {
            let value = columns
                .source_index(required)
                .and_then(|idx| row.get(idx))
                .unwrap_or("");
            record.insert(required, value.to_string());
        }
        records.push(record);
    }

    Ok((records, columns))
}
