use sad_search::bench::generate_dataset;
use sad_search::{
    build_store, search_parallel_inner, search_parallel_outer, search_sequential,
    ColumnMajorStore, Layout, MatchResult, RowMajorStore, Schedule, SearchConfig, SearchEngine,
    SearchError, Series, SeriesStore, Strategy, WorkerPool, UNMATCHED,
};
use serde::Deserialize;
use std::fs;

#[derive(Deserialize)]
struct GoldenCase {
    query: Vec<f64>,
    series: Vec<Vec<f64>>,
    expected_distances: Vec<Option<f64>>,
    expected_best_index: usize,
}

const EPSILON: f64 = 1e-9;

fn load_golden(filename: &str) -> GoldenCase {
    let path = format!("tests/golden_data/{filename}");
    let data = fs::read_to_string(&path)
        .unwrap_or_else(|_| panic!("Golden data file not found: {path}"));
    serde_json::from_str(&data).unwrap()
}

/// Seeded series with lengths varying between `min_len` and `min_len + 60`.
fn variable_length_dataset(n: usize, min_len: usize, seed: u64) -> Vec<Series> {
    generate_dataset(n, min_len + 60, seed)
        .into_iter()
        .enumerate()
        .map(|(i, s)| Series::from(&s[..min_len + (i * 17) % 61]))
        .collect()
}

fn assert_distances_close(name: &str, actual: &MatchResult, reference: &MatchResult, eps: f64) {
    assert_eq!(
        actual.distances.len(),
        reference.distances.len(),
        "{name}: length mismatch"
    );
    for (i, (a, r)) in actual.distances.iter().zip(&reference.distances).enumerate() {
        if *r == UNMATCHED {
            assert_eq!(*a, UNMATCHED, "{name}: series {i} should be unmatched");
        } else {
            assert!(
                (a - r).abs() <= eps,
                "{name}: series {i}: {a} vs reference {r}"
            );
        }
    }
    assert_eq!(
        actual.best_index(),
        reference.best_index(),
        "{name}: best index differs"
    );
}

#[test]
fn test_golden_mixed_lengths_all_variants() {
    let golden = load_golden("mixed_lengths.json");
    let series: Vec<Series> = golden.series.into_iter().map(Series::new).collect();

    for threads in [1, 2, 5] {
        let engine = SearchEngine::new(SearchConfig::default().with_threads(threads)).unwrap();
        for layout in Layout::ALL {
            let store = build_store(layout, &series);
            for strategy in Strategy::ALL {
                let r = engine.search_any(&store, &golden.query, strategy).unwrap();
                let name = format!("{layout}/{strategy}/{threads}t");
                for (i, expected) in golden.expected_distances.iter().enumerate() {
                    match expected {
                        Some(d) => assert!(
                            (r.distances[i] - d).abs() < 1e-12,
                            "{name}: series {i}: {} vs {d}",
                            r.distances[i]
                        ),
                        None => assert!(matches!(
                            r.distance_of(i),
                            Err(SearchError::SeriesTooShort { .. })
                        )),
                    }
                }
                assert_eq!(r.best_index(), Some(golden.expected_best_index), "{name}");
            }
        }
    }
}

#[test]
fn test_layout_equivalence_is_exact() {
    let series = variable_length_dataset(40, 50, 11);
    let query: Vec<f64> = series[7][5..35].iter().map(|x| x + 0.25).collect();
    let aos = RowMajorStore::from_series(&series);
    let soa = ColumnMajorStore::from_series(&series);

    let a = search_sequential(&aos, &query);
    let b = search_sequential(&soa, &query);
    for (x, y) in a.distances.iter().zip(&b.distances) {
        assert_eq!(x.to_bits(), y.to_bits());
    }
    assert_eq!(a.best, b.best);
}

#[test]
fn test_thread_count_convergence() {
    let series = variable_length_dataset(64, 30, 5);
    let query: Vec<f64> = series[20][3..28].to_vec();
    let aos = RowMajorStore::from_series(&series);
    let soa = ColumnMajorStore::from_series(&series);
    let reference = search_sequential(&aos, &query);
    assert_eq!(reference.best_index(), Some(20));

    for threads in [1, 2, 3, 4, 8, 13] {
        let pool = WorkerPool::new(Some(threads)).unwrap();
        for schedule in [Schedule::Static, Schedule::Dynamic] {
            let name = format!("outer/{schedule}/{threads}t");
            assert_distances_close(
                &name,
                &search_parallel_outer(&aos, &query, &pool, schedule),
                &reference,
                0.0,
            );
            assert_distances_close(
                &name,
                &search_parallel_outer(&soa, &query, &pool, schedule),
                &reference,
                0.0,
            );
        }
        let name = format!("inner/{threads}t");
        assert_distances_close(
            &name,
            &search_parallel_inner(&aos, &query, &pool, 2),
            &reference,
            EPSILON,
        );
        assert_distances_close(
            &name,
            &search_parallel_inner(&soa, &query, &pool, 2),
            &reference,
            EPSILON,
        );
    }
}

#[test]
fn test_exact_ties_resolve_identically() {
    // Copies of the same series scattered through the collection: every
    // strategy must report the first copy.
    let mut series = variable_length_dataset(30, 40, 9);
    let planted = series[4].clone();
    for i in [11, 17, 29] {
        series[i] = planted.clone();
    }
    let query: Vec<f64> = planted[2..22].to_vec();

    for threads in [2, 4, 7] {
        let engine = SearchEngine::new(SearchConfig::default().with_threads(threads)).unwrap();
        for layout in Layout::ALL {
            let store = build_store(layout, &series);
            for strategy in Strategy::ALL {
                let r = engine.search_any(&store, &query, strategy).unwrap();
                assert_eq!(r.best_index(), Some(4), "{layout}/{strategy}/{threads}t");
                assert_eq!(r.distances[11], 0.0);
            }
        }
    }
}

#[test]
fn test_idempotent_repeated_calls() {
    let series = variable_length_dataset(25, 20, 3);
    let query: Vec<f64> = (0..15).map(|i| 100.0 + (i as f64 * 0.4).sin() * 10.0).collect();
    let engine = SearchEngine::new(SearchConfig::default().with_threads(4)).unwrap();
    let store = build_store(Layout::ColumnMajor, &series);

    for strategy in Strategy::ALL {
        let first = engine.search_any(&store, &query, strategy).unwrap();
        for _ in 0..5 {
            assert_eq!(engine.search_any(&store, &query, strategy).unwrap(), first);
        }
    }
}

#[test]
fn test_padding_never_contributes() {
    // Short series followed by a long one: column-major pads the short
    // series with zeros. A query of zeros that fits only inside the padding
    // must leave the short series unmatched, and a query that fits exactly
    // must see only the true values.
    let series = vec![
        Series::new(vec![2.0, 2.0]),
        Series::new(vec![1.0; 8]),
        Series::new(vec![3.0, 3.0, 3.0]),
    ];
    let soa = ColumnMajorStore::from_series(&series);
    let aos = RowMajorStore::from_series(&series);
    let engine = SearchEngine::new(SearchConfig::default().with_threads(3)).unwrap();

    for strategy in Strategy::ALL {
        let r = engine.search(&soa, &[0.0, 0.0, 0.0, 0.0], strategy).unwrap();
        assert_eq!(r.distances[0], UNMATCHED);
        assert_eq!(r.distances[2], UNMATCHED);
        assert!((r.distances[1] - 4.0).abs() < 1e-12);
        assert_eq!(r, engine.search(&aos, &[0.0, 0.0, 0.0, 0.0], strategy).unwrap());

        let r = engine.search(&soa, &[0.0, 0.0, 0.0], strategy).unwrap();
        assert!((r.distances[2] - 9.0).abs() < 1e-12);
        assert!((r.distances[1] - 3.0).abs() < 1e-12);
        assert_eq!(r.best_index(), Some(1));
    }
}

#[test]
fn test_infinite_sums_keep_long_enough_series_matched() {
    let inf = f64::INFINITY;
    let series = vec![
        Series::new(vec![inf, inf]),
        Series::new(vec![inf, inf, inf]),
        Series::new(vec![inf]),
    ];
    let engine = SearchEngine::new(SearchConfig::default().with_threads(2)).unwrap();

    for layout in Layout::ALL {
        let store = build_store(layout, &series);
        for strategy in Strategy::ALL {
            let name = format!("{layout}/{strategy}");
            let r = engine.search_any(&store, &[0.0, 0.0], strategy).unwrap();
            assert_eq!(r.distance_of(0).unwrap(), inf, "{name}");
            assert_eq!(r.distance_of(1).unwrap(), inf, "{name}");
            assert!(
                matches!(r.distance_of(2), Err(SearchError::SeriesTooShort { index: 2 })),
                "{name}"
            );
            assert!(matches!(r.best_match(), Err(SearchError::NoMatch)), "{name}");
        }
    }
}

#[test]
fn test_store_value_contract() {
    let series = variable_length_dataset(12, 5, 1);
    let aos = RowMajorStore::from_series(&series);
    let soa = ColumnMajorStore::from_series(&series);
    for (i, s) in series.iter().enumerate() {
        assert_eq!(aos.len_of(i), s.len());
        assert_eq!(soa.len_of(i), s.len());
        for t in 0..s.len() {
            assert_eq!(aos.value_at(i, t), s.value(t));
            assert_eq!(soa.value_at(i, t), s.value(t));
        }
        assert_eq!(soa.value_at(i, soa.max_len()), 0.0);
    }
}

#[test]
fn test_engine_rejects_empty_query() {
    let series = vec![Series::new(vec![1.0, 2.0])];
    let engine = SearchEngine::new(SearchConfig::default().with_threads(2)).unwrap();
    for layout in Layout::ALL {
        let store = build_store(layout, &series);
        for strategy in Strategy::ALL {
            assert!(matches!(
                engine.search_any(&store, &[], strategy),
                Err(SearchError::EmptyQuery)
            ));
        }
    }
}

#[test]
fn test_engine_rejects_zero_threads() {
    let err = SearchEngine::new(SearchConfig::default().with_threads(0)).unwrap_err();
    assert!(matches!(err, SearchError::InvalidConfig(_)));
}
