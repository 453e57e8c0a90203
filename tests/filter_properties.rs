use std::collections::{BTreeMap, BTreeSet};

use music_trends::data::aggregate::{
    count_by_genre, mean_popularity_by_year, project_relationship_rows,
};
use music_trends::data::filter::{derive_year_range, filter, FilterSelection, YearRange};
use music_trends::data::model::{CellValue, Track, TrackTable};
use proptest::prelude::*;

const GENRE_POOL: [&str; 4] = ["Pop", "Rock", "Jazz", "Hip-Hop"];

fn year_cell() -> impl Strategy<Value = CellValue> {
    prop_oneof![
        6 => (2000i64..=2010).prop_map(CellValue::Integer),
        2 => (2000i64..=2010).prop_map(|y| CellValue::String(y.to_string())),
        1 => Just(CellValue::String("unknown".to_string())),
        1 => Just(CellValue::Null),
    ]
}

fn track(year: impl Strategy<Value = CellValue>) -> impl Strategy<Value = Track> {
    (0..GENRE_POOL.len(), year, 0.0f64..100.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(
        |(genre, year, popularity, energy, danceability)| Track {
            genre: GENRE_POOL[genre].to_string(),
            year,
            popularity,
            energy,
            danceability,
            extra: BTreeMap::new(),
        },
    )
}

fn build(rows: Vec<Track>) -> TrackTable {
    let columns = ["genre", "year", "popularity", "energy", "danceability"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    TrackTable::from_tracks(columns, rows, true)
}

fn table_with_malformed_years() -> impl Strategy<Value = TrackTable> {
    proptest::collection::vec(track(year_cell()), 1..40).prop_map(build)
}

fn clean_table() -> impl Strategy<Value = TrackTable> {
    proptest::collection::vec(track((2000i64..=2010).prop_map(CellValue::Integer)), 1..40)
        .prop_map(build)
}

fn selection() -> impl Strategy<Value = FilterSelection> {
    (
        proptest::collection::vec(any::<bool>(), GENRE_POOL.len()),
        1998i64..=2012,
        1998i64..=2012,
    )
        .prop_map(|(mask, a, b)| FilterSelection {
            genres: GENRE_POOL
                .iter()
                .zip(mask)
                .filter(|(_, picked)| *picked)
                .map(|(g, _)| g.to_string())
                .collect(),
            year_range: YearRange::new(a, b),
        })
}

fn admits(selection: &FilterSelection, track: &Track) -> bool {
    let genre_ok = selection.genres.is_empty() || selection.genres.contains(&track.genre);
    let year_ok = track
        .year()
        .is_some_and(|y| selection.year_range.contains(y));
    genre_ok && year_ok
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0),
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn filter_keeps_exactly_the_admitted_rows(
        table in table_with_malformed_years(),
        selection in selection(),
    ) {
        let filtered = filter(&table, &selection);
        let expected: Vec<usize> = table
            .rows()
            .iter()
            .enumerate()
            .filter(|(_, t)| admits(&selection, t))
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(filtered.indices(), expected.as_slice());
        prop_assert!(filtered.rows().all(|t| admits(&selection, t)));
    }

    #[test]
    fn filter_is_idempotent(
        table in table_with_malformed_years(),
        selection in selection(),
    ) {
        let a = filter(&table, &selection);
        let b = filter(&table, &selection);
        prop_assert_eq!(a.indices(), b.indices());
    }

    #[test]
    fn genre_counts_sum_to_filtered_rows(
        table in table_with_malformed_years(),
        selection in selection(),
    ) {
        let filtered = filter(&table, &selection);
        let counts = count_by_genre(&filtered);
        prop_assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), filtered.len());

        let distinct: BTreeSet<&str> = filtered.rows().map(|t| t.genre.as_str()).collect();
        prop_assert_eq!(counts.len(), distinct.len());
        prop_assert!(counts.iter().all(|c| c.count > 0));
    }

    #[test]
    fn trend_years_come_from_filtered_rows(
        table in table_with_malformed_years(),
        selection in selection(),
    ) {
        let filtered = filter(&table, &selection);
        let present: BTreeSet<i64> = filtered.rows().filter_map(|t| t.year()).collect();
        let trend: Vec<i64> = mean_popularity_by_year(&filtered).iter().map(|p| p.year).collect();
        prop_assert_eq!(trend, present.into_iter().collect::<Vec<_>>());
    }

    #[test]
    fn projection_preserves_row_count(
        table in table_with_malformed_years(),
        selection in selection(),
    ) {
        let filtered = filter(&table, &selection);
        prop_assert_eq!(project_relationship_rows(&filtered).len(), filtered.len());
    }

    #[test]
    fn default_selection_keeps_clean_table(table in clean_table()) {
        let derived = derive_year_range(&table);
        prop_assert!(!derived.degraded);
        let filtered = filter(&table, &FilterSelection::for_table(&table));
        prop_assert_eq!(filtered.len(), table.len());
    }

    #[test]
    fn derived_range_covers_every_valid_year(table in table_with_malformed_years()) {
        let derived = derive_year_range(&table);
        let valid: Vec<i64> = table.rows().iter().filter_map(|t| t.year()).collect();
        let malformed = table.len() - valid.len();

        prop_assert_eq!(derived.degraded, malformed > 0);
        prop_assert_eq!(derived.issues.len(), malformed);
        match derived.bounds {
            Some(r) => {
                prop_assert_eq!(Some(r.min), valid.iter().copied().min());
                prop_assert_eq!(Some(r.max), valid.iter().copied().max());
            }
            None => prop_assert!(valid.is_empty()),
        }
    }
}
