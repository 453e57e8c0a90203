use std::collections::BTreeSet;

use serde::Serialize;

use super::error::DataIssue;
use super::model::{Track, TrackTable, YEAR};

// ---------------------------------------------------------------------------
// Filter predicate: selected genres and an inclusive year range
// ---------------------------------------------------------------------------

/// Inclusive year bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct YearRange {
    pub min: i64,
    pub max: i64,
}

impl YearRange {
    /// Build a range from two bounds given in any order.
    pub fn new(a: i64, b: i64) -> Self {
        YearRange {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// A range that admits every parseable year.
    pub fn unbounded() -> Self {
        YearRange {
            min: i64::MIN,
            max: i64::MAX,
        }
    }

    pub fn contains(&self, year: i64) -> bool {
        self.min <= year && year <= self.max
    }
}

/// The user's current filter choice.
///
/// An empty `genres` set means "no genre restriction" (show all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub genres: BTreeSet<String>,
    pub year_range: YearRange,
}

impl FilterSelection {
    /// Default selection for a table: every genre, the full derived year range.
    pub fn for_table(table: &TrackTable) -> Self {
        let derived = derive_year_range(table);
        FilterSelection {
            genres: BTreeSet::new(),
            year_range: derived.bounds.unwrap_or_else(YearRange::unbounded),
        }
    }

    fn admits_genre(&self, track: &Track) -> bool {
        self.genres.is_empty() || self.genres.contains(&track.genre)
    }
}

// ---------------------------------------------------------------------------
// Default year range
// ---------------------------------------------------------------------------

/// Year bounds derived from a table, with a flag for partial input.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedYearRange {
    /// Min/max over the rows whose year coerces; `None` if no row does.
    pub bounds: Option<YearRange>,
    /// Set when any year failed to coerce or the column is missing.
    pub degraded: bool,
    pub issues: Vec<DataIssue>,
}

impl DerivedYearRange {
    /// One-line user warning describing why the range is degraded.
    pub fn warning(&self) -> Option<String> {
        if !self.degraded {
            return None;
        }
        if let Some(DataIssue::MissingColumn(col)) = self
            .issues
            .iter()
            .find(|i| matches!(i, DataIssue::MissingColumn(_)))
        {
            return Some(format!(
                "the dataset has no '{col}' column; \
                 year filter and popularity trend are disabled"
            ));
        }
        let malformed = self
            .issues
            .iter()
            .filter(|i| matches!(i, DataIssue::MalformedYearValue { .. }))
            .count();
        Some(format!(
            "the '{YEAR}' column contains {malformed} invalid value(s); \
             those tracks are left out of year filtering"
        ))
    }
}

/// Derive the default year range from every coercible year in the table.
///
/// Malformed years are left out of the bounds and reported in `issues`; this
/// never fails.
pub fn derive_year_range(table: &TrackTable) -> DerivedYearRange {
    if !table.has_year() {
        log::warn!("Dataset has no '{YEAR}' column; year filter disabled");
        return DerivedYearRange {
            bounds: None,
            degraded: true,
            issues: vec![DataIssue::MissingColumn(YEAR.to_string())],
        };
    }

    let mut bounds: Option<YearRange> = None;
    let mut issues = Vec::new();

    for (row, track) in table.rows().iter().enumerate() {
        match track.year() {
            Some(year) => {
                bounds = Some(match bounds {
                    Some(r) => YearRange::new(r.min.min(year), r.max.max(year)),
                    None => YearRange::new(year, year),
                });
            }
            None => issues.push(DataIssue::MalformedYearValue {
                row,
                raw: track.year.clone(),
            }),
        }
    }

    if !issues.is_empty() {
        log::warn!(
            "{} of {} year values are not valid integers; year range may be incomplete",
            issues.len(),
            table.len()
        );
    }

    DerivedYearRange {
        degraded: !issues.is_empty(),
        bounds,
        issues,
    }
}

// ---------------------------------------------------------------------------
// Filtered view
// ---------------------------------------------------------------------------

/// Rows of a source table passing a [`FilterSelection`], in source order.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    source: &'a TrackTable,
    indices: Vec<usize>,
}

impl<'a> FilteredTable<'a> {
    pub fn source(&self) -> &'a TrackTable {
        self.source
    }

    /// Indices into the source table of every passing row.
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Track> + '_ {
        let rows = self.source.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Return the rows that pass both the genre and the year test.
///
/// A track passes when:
/// * `genres` is empty, or its genre is in the set (exact match)
/// * its year coerces to an integer inside `year_range`
///
/// Tracks with a malformed year are excluded. If the table has no year
/// column the year test is skipped.
pub fn filter<'a>(table: &'a TrackTable, selection: &FilterSelection) -> FilteredTable<'a> {
    let check_year = table.has_year();
    let indices: Vec<usize> = table
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, track)| {
            if !selection.admits_genre(track) {
                return false;
            }
            if !check_year {
                return true;
            }
            match track.year() {
                Some(year) => selection.year_range.contains(year),
                None => false,
            }
        })
        .map(|(i, _)| i)
        .collect();

    log::debug!(
        "Filter kept {} of {} tracks ({} genres selected, years {}..={})",
        indices.len(),
        table.len(),
        selection.genres.len(),
        selection.year_range.min,
        selection.year_range.max
    );

    FilteredTable {
        source: table,
        indices,
    }
}
