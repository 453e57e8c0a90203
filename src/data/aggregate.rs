use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::filter::FilteredTable;

// ---------------------------------------------------------------------------
// View rows handed to the presentation layer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlyPopularity {
    pub year: i64,
    pub mean_popularity: f64,
}

/// One point of the energy vs danceability scatter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipPoint {
    pub energy: f64,
    pub danceability: f64,
    pub popularity: f64,
    pub genre: String,
}

// ---------------------------------------------------------------------------
// Aggregators
// ---------------------------------------------------------------------------

/// Number of tracks per genre, most frequent first.
///
/// Ties are broken by genre name so the output is stable.
pub fn count_by_genre(filtered: &FilteredTable<'_>) -> Vec<GenreCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for track in filtered.rows() {
        *counts.entry(track.genre.as_str()).or_default() += 1;
    }

    let mut out: Vec<GenreCount> = counts
        .into_iter()
        .map(|(genre, count)| GenreCount {
            genre: genre.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.genre.cmp(&b.genre)));
    out
}

/// Mean popularity per coerced year, ascending by year.
///
/// Empty when the source has no year column. `NaN` popularities are left
/// out of the mean.
pub fn mean_popularity_by_year(filtered: &FilteredTable<'_>) -> Vec<YearlyPopularity> {
    if !filtered.source().has_year() {
        return Vec::new();
    }

    // year → (sum, n)
    let mut groups: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for track in filtered.rows() {
        let Some(year) = track.year() else {
            continue;
        };
        let entry = groups.entry(year).or_insert((0.0, 0));
        if !track.popularity.is_nan() {
            entry.0 += track.popularity;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(year, (sum, n))| YearlyPopularity {
            year,
            mean_popularity: if n == 0 { f64::NAN } else { sum / n as f64 },
        })
        .collect()
}

/// Energy, danceability, popularity and genre of every filtered track.
pub fn project_relationship_rows(filtered: &FilteredTable<'_>) -> Vec<RelationshipPoint> {
    filtered
        .rows()
        .map(|t| RelationshipPoint {
            energy: t.energy,
            danceability: t.danceability,
            popularity: t.popularity,
            genre: t.genre.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::filter::{filter, FilterSelection, YearRange};
    use crate::data::model::tests::table;
    use crate::data::model::{CellValue, TrackTable};

    fn year(y: i64) -> CellValue {
        CellValue::Integer(y)
    }

    fn five_tracks() -> TrackTable {
        table(&[
            ("Pop", year(2018), 70.0),
            ("Rock", year(2019), 50.0),
            ("Pop", year(2019), 80.0),
            ("Pop", year(2020), 90.0),
            ("Rock", year(2020), 30.0),
        ])
    }

    fn only(genre: &str) -> BTreeSet<String> {
        BTreeSet::from([genre.to_string()])
    }

    #[test]
    fn test_count_by_genre_full_table() {
        let t = five_tracks();
        let filtered = filter(&t, &FilterSelection::for_table(&t));
        let counts = count_by_genre(&filtered);

        assert_eq!(
            counts,
            vec![
                GenreCount {
                    genre: "Pop".into(),
                    count: 3,
                },
                GenreCount {
                    genre: "Rock".into(),
                    count: 2,
                },
            ]
        );
        let total: usize = counts.iter().map(|c| c.count).sum();
        assert_eq!(total, filtered.len());
    }

    #[test]
    fn test_count_by_genre_single_genre() {
        let t = five_tracks();
        let selection = FilterSelection {
            genres: only("Rock"),
            ..FilterSelection::for_table(&t)
        };
        let filtered = filter(&t, &selection);
        assert_eq!(filtered.len(), 2);
        assert_eq!(
            count_by_genre(&filtered),
            vec![GenreCount {
                genre: "Rock".into(),
                count: 2,
            }]
        );
    }

    #[test]
    fn test_count_ties_sorted_by_name() {
        let t = table(&[
            ("Soul", year(2000), 1.0),
            ("Jazz", year(2000), 1.0),
        ]);
        let filtered = filter(&t, &FilterSelection::for_table(&t));
        let names: Vec<_> = count_by_genre(&filtered)
            .into_iter()
            .map(|c| c.genre)
            .collect();
        assert_eq!(names, ["Jazz", "Soul"]);
    }

    #[test]
    fn test_mean_popularity_single_year() {
        let t = table(&[
            ("Pop", year(2019), 10.0),
            ("Rock", year(2019), 20.0),
            ("Jazz", year(2019), 30.0),
        ]);
        let filtered = filter(&t, &FilterSelection::for_table(&t));
        assert_eq!(
            mean_popularity_by_year(&filtered),
            vec![YearlyPopularity {
                year: 2019,
                mean_popularity: 20.0,
            }]
        );
    }

    #[test]
    fn test_mean_popularity_only_filtered_years() {
        let t = five_tracks();
        let selection = FilterSelection {
            genres: BTreeSet::new(),
            year_range: YearRange::new(2019, 2020),
        };
        let filtered = filter(&t, &selection);
        let trend = mean_popularity_by_year(&filtered);

        assert_eq!(
            trend,
            vec![
                YearlyPopularity {
                    year: 2019,
                    mean_popularity: 65.0,
                },
                YearlyPopularity {
                    year: 2020,
                    mean_popularity: 60.0,
                },
            ]
        );
    }

    #[test]
    fn test_mean_popularity_skips_nan() {
        let t = table(&[
            ("Pop", year(2001), f64::NAN),
            ("Pop", year(2001), 40.0),
            ("Pop", year(2002), f64::NAN),
        ]);
        let filtered = filter(&t, &FilterSelection::for_table(&t));
        let trend = mean_popularity_by_year(&filtered);
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].mean_popularity, 40.0);
        assert!(trend[1].mean_popularity.is_nan());
    }

    #[test]
    fn test_mean_popularity_without_year_column() {
        let t = five_tracks();
        let no_year = TrackTable::from_tracks(t.column_names().to_vec(), t.rows().to_vec(), false);
        let filtered = filter(&no_year, &FilterSelection::for_table(&no_year));
        assert_eq!(filtered.len(), 5);
        assert!(mean_popularity_by_year(&filtered).is_empty());
        assert_eq!(project_relationship_rows(&filtered).len(), 5);
    }

    #[test]
    fn test_projection_preserves_rows() {
        let t = five_tracks();
        let selection = FilterSelection {
            genres: only("Pop"),
            ..FilterSelection::for_table(&t)
        };
        let filtered = filter(&t, &selection);
        let points = project_relationship_rows(&filtered);

        assert_eq!(points.len(), filtered.len());
        let popularity: Vec<f64> = points.iter().map(|p| p.popularity).collect();
        assert_eq!(popularity, [70.0, 80.0, 90.0]);
        assert!(points.iter().all(|p| p.genre == "Pop"));
    }

    #[test]
    fn test_empty_filter_result() {
        let t = five_tracks();
        let selection = FilterSelection {
            genres: only("Polka"),
            ..FilterSelection::for_table(&t)
        };
        let filtered = filter(&t, &selection);

        assert!(filtered.is_empty());
        assert!(count_by_genre(&filtered).is_empty());
        assert!(mean_popularity_by_year(&filtered).is_empty());
        assert!(project_relationship_rows(&filtered).is_empty());
    }
}
