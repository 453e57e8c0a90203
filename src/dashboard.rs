use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::data::aggregate::{
    count_by_genre, mean_popularity_by_year, project_relationship_rows, GenreCount,
    RelationshipPoint, YearlyPopularity,
};
use crate::data::filter::{
    derive_year_range, filter, DerivedYearRange, FilterSelection, YearRange,
};
use crate::data::model::TrackTable;

// ---------------------------------------------------------------------------
// Derived views
// ---------------------------------------------------------------------------

/// Everything the presentation layer needs after one filter change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DashboardViews {
    pub total_rows: usize,
    pub visible_rows: usize,
    pub genre_counts: Vec<GenreCount>,
    /// False when the dataset has no year column; the trend is then empty.
    pub trend_available: bool,
    pub popularity_trend: Vec<YearlyPopularity>,
    pub relationship: Vec<RelationshipPoint>,
}

impl DashboardViews {
    /// Run the filter and every aggregator for one selection.
    pub fn compute(table: &TrackTable, selection: &FilterSelection) -> Self {
        let filtered = filter(table, selection);
        let trend_available = table.has_year();

        DashboardViews {
            total_rows: table.len(),
            visible_rows: filtered.len(),
            genre_counts: count_by_genre(&filtered),
            trend_available,
            popularity_trend: if trend_available {
                mean_popularity_by_year(&filtered)
            } else {
                Vec::new()
            },
            relationship: project_relationship_rows(&filtered),
        }
    }

    /// No track passed the current filters.
    pub fn is_empty(&self) -> bool {
        self.visible_rows == 0
    }

    /// Mean energy and danceability over the scatter points, skipping `NaN`
    /// cells. `NaN` when no point has a value.
    pub fn relationship_means(&self) -> (f64, f64) {
        (
            mean_ignoring_nan(self.relationship.iter().map(|p| p.energy)),
            mean_ignoring_nan(self.relationship.iter().map(|p| p.danceability)),
        )
    }
}

fn mean_ignoring_nan(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

// ---------------------------------------------------------------------------
// Dashboard session
// ---------------------------------------------------------------------------

/// Filter state over one loaded table, independent of rendering.
///
/// Every mutation recomputes the views from scratch.
pub struct Dashboard {
    /// Shared, immutable dataset handle.
    table: Arc<TrackTable>,

    /// Current genre / year selection.
    selection: FilterSelection,

    /// Default bounds for the year slider, with the degraded flag.
    year_range: DerivedYearRange,

    /// Views for the current selection (cached).
    views: DashboardViews,
}

impl Dashboard {
    /// Start a session with every genre and the full year range selected.
    pub fn new(table: Arc<TrackTable>) -> Self {
        let year_range = derive_year_range(&table);
        let selection = FilterSelection {
            genres: BTreeSet::new(),
            year_range: year_range.bounds.unwrap_or_else(YearRange::unbounded),
        };
        let views = DashboardViews::compute(&table, &selection);
        Self {
            table,
            selection,
            year_range,
            views,
        }
    }

    pub fn table(&self) -> &Arc<TrackTable> {
        &self.table
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    pub fn year_range(&self) -> &DerivedYearRange {
        &self.year_range
    }

    pub fn views(&self) -> &DashboardViews {
        &self.views
    }

    /// Recompute `views` after a selection change.
    fn refilter(&mut self) {
        self.views = DashboardViews::compute(&self.table, &self.selection);
        if self.views.is_empty() {
            log::debug!("No tracks match the current selection");
        }
    }

    /// Replace the genre selection. An empty set shows every genre.
    pub fn set_genres<I, S>(&mut self, genres: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selection.genres = genres.into_iter().map(Into::into).collect();
        self.refilter();
    }

    /// Toggle a single genre in the selection.
    pub fn toggle_genre(&mut self, genre: &str) {
        if !self.selection.genres.remove(genre) {
            self.selection.genres.insert(genre.to_string());
        }
        self.refilter();
    }

    /// Drop the genre restriction.
    pub fn select_all_genres(&mut self) {
        self.selection.genres.clear();
        self.refilter();
    }

    pub fn set_year_range(&mut self, range: YearRange) {
        self.selection.year_range = range;
        self.refilter();
    }

    /// Back to every genre and the full derived year range.
    pub fn reset_selection(&mut self) {
        self.selection = FilterSelection {
            genres: BTreeSet::new(),
            year_range: self.default_year_range(),
        };
        self.refilter();
    }

    /// Swap in a freshly loaded table.
    ///
    /// The year range is re-derived and selected genres the new table does
    /// not contain are dropped.
    pub fn reload(&mut self, table: Arc<TrackTable>) {
        self.year_range = derive_year_range(&table);
        let known: BTreeSet<&str> = table.genres().iter().map(String::as_str).collect();
        self.selection
            .genres
            .retain(|g| known.contains(g.as_str()));
        self.selection.year_range = self.default_year_range();
        self.table = table;
        self.refilter();
    }

    fn default_year_range(&self) -> YearRange {
        self.year_range.bounds.unwrap_or_else(YearRange::unbounded)
    }
}
