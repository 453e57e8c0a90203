use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::error::TableError;

/// Columns every track table must carry.
pub const GENRE: &str = "genre";
pub const YEAR: &str = "year";
pub const POPULARITY: &str = "popularity";
pub const ENERGY: &str = "energy";
pub const DANCEABILITY: &str = "danceability";

// ---------------------------------------------------------------------------
// CellValue – a single cell of the source table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the dtypes a delimited file can carry.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Guess the type of a raw text cell: empty → `Null`, then integer,
    /// float, boolean, and finally plain text.
    pub fn guess(s: &str) -> CellValue {
        if s.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = s.parse::<i64>() {
            return CellValue::Integer(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return CellValue::Float(f);
        }
        if s == "true" || s == "false" {
            return CellValue::Bool(s == "true");
        }
        CellValue::String(s.to_string())
    }

    /// Try to interpret the value as an `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Coerce the cell to an integer year.
    ///
    /// Integers pass through, finite floats are truncated toward zero and
    /// text must parse as a whole integer. Anything else is `None`.
    pub fn as_year(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(f) if f.is_finite() => Some(f.trunc() as i64),
            CellValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

// ---------------------------------------------------------------------------
// Track – one row of the source table
// ---------------------------------------------------------------------------

/// A single song (one row of the source table).
#[derive(Debug, Clone)]
pub struct Track {
    pub genre: String,
    /// Raw year cell; coerced with [`CellValue::as_year`] when needed.
    pub year: CellValue,
    /// 0–100 in practice; `NaN` when the cell was empty.
    pub popularity: f64,
    /// 0.0–1.0 in practice; `NaN` when the cell was empty.
    pub energy: f64,
    /// 0.0–1.0 in practice; `NaN` when the cell was empty.
    pub danceability: f64,
    /// Every other column: column_name → value.
    pub extra: BTreeMap<String, CellValue>,
}

impl Track {
    /// Column access by name. Returns `None` for unknown columns.
    pub fn value(&self, column: &str) -> Option<CellValue> {
        match column {
            GENRE => Some(CellValue::String(self.genre.clone())),
            YEAR => Some(self.year.clone()),
            POPULARITY => Some(CellValue::Float(self.popularity)),
            ENERGY => Some(CellValue::Float(self.energy)),
            DANCEABILITY => Some(CellValue::Float(self.danceability)),
            other => self.extra.get(other).cloned(),
        }
    }

    /// The coerced integer year, if the raw cell allows it.
    pub fn year(&self) -> Option<i64> {
        self.year.as_year()
    }
}

// ---------------------------------------------------------------------------
// TrackTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The immutable loaded dataset with pre-computed column indices.
#[derive(Debug, Clone)]
pub struct TrackTable {
    /// All tracks (rows), in source order.
    rows: Vec<Track>,
    /// Column names in source order.
    column_names: Vec<String>,
    /// Distinct genres in order of first appearance.
    genres: Vec<String>,
    has_year: bool,
}

impl TrackTable {
    /// Build a table from loosely typed records.
    ///
    /// `genre`, `popularity`, `energy` and `danceability` are required. The
    /// `year` column is optional; when absent every row carries `Null`.
    pub fn from_records(
        column_names: Vec<String>,
        records: Vec<BTreeMap<String, CellValue>>,
    ) -> Result<Self, TableError> {
        for required in [GENRE, POPULARITY, ENERGY, DANCEABILITY] {
            if !column_names.iter().any(|c| c == required) {
                return Err(TableError::MissingColumn(required.to_string()));
            }
        }
        let has_year = column_names.iter().any(|c| c == YEAR);

        let mut rows = Vec::with_capacity(records.len());
        for (row, mut record) in records.into_iter().enumerate() {
            let genre = match record.remove(GENRE) {
                None | Some(CellValue::Null) => {
                    return Err(TableError::MissingValue {
                        row,
                        column: GENRE.to_string(),
                    })
                }
                Some(value) => value.to_string(),
            };
            let year = record.remove(YEAR).unwrap_or(CellValue::Null);
            let popularity = take_number(&mut record, row, POPULARITY)?;
            let energy = take_number(&mut record, row, ENERGY)?;
            let danceability = take_number(&mut record, row, DANCEABILITY)?;

            rows.push(Track {
                genre,
                year,
                popularity,
                energy,
                danceability,
                extra: record,
            });
        }

        Ok(Self::from_tracks(column_names, rows, has_year))
    }

    /// Build column indices from already typed tracks.
    pub fn from_tracks(column_names: Vec<String>, rows: Vec<Track>, has_year: bool) -> Self {
        let genres = {
            let mut seen = HashSet::new();
            rows.iter()
                .filter(|t| seen.insert(t.genre.as_str()))
                .map(|t| t.genre.clone())
                .collect()
        };

        TrackTable {
            rows,
            column_names,
            genres,
            has_year,
        }
    }

    pub fn rows(&self) -> &[Track] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Track> {
        self.rows.get(index)
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_names.iter().any(|c| c == name)
    }

    /// Whether the source carried a `year` column at all.
    pub fn has_year(&self) -> bool {
        self.has_year
    }

    /// Distinct genres in order of first appearance.
    pub fn genres(&self) -> &[String] {
        &self.genres
    }

    /// Every value of one column, in row order.
    pub fn column(&self, name: &str) -> Option<Vec<CellValue>> {
        if !self.has_column(name) {
            return None;
        }
        Some(
            self.rows
                .iter()
                .map(|t| t.value(name).unwrap_or(CellValue::Null))
                .collect(),
        )
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn take_number(
    record: &mut BTreeMap<String, CellValue>,
    row: usize,
    column: &str,
) -> Result<f64, TableError> {
    match record.remove(column) {
        None | Some(CellValue::Null) => Ok(f64::NAN),
        Some(value) => value.as_f64().ok_or_else(|| TableError::MalformedNumber {
            row,
            column: column.to_string(),
            value: value.to_string(),
        }),
    }
}
