//! Integration tests for time-aware ranking over a vector index

mod common;

use chrono::{DateTime, Duration, TimeZone, Utc};
use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::sync::Arc;

use common::{candidate, engine, FakeIndex};
use supportrag::index::Candidate;

fn june_first() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
}

fn worked_example_index() -> Arc<FakeIndex> {
    Arc::new(FakeIndex::with_candidates(vec![
        candidate("A", Some("Mon, 01 Jan 2024 00:00:00 +0000"), 0.1),
        candidate("B", Some("Mon, 01 Jan 2025 00:00:00 +0000"), 0.5),
    ]))
}

#[tokio::test]
async fn test_similarity_dominates_large_gap() {
    let index = worked_example_index();
    let engine = engine(index.clone(), 0.3);

    let hits = engine.rank_at("export contacts", 1, june_first()).await.unwrap();

    assert_eq!(hits.len(), 1);
    let best = &hits[0];
    assert_eq!(best.candidate.id, "A");
    assert!((best.similarity - 0.909).abs() < 0.01);
    assert!((best.recency_score - 0.29).abs() < 0.02);
    assert!((best.blended_score - 0.72).abs() < 0.01);
}

#[tokio::test]
async fn test_worked_example_scores_for_both_records() {
    let engine = engine(worked_example_index(), 0.3);
    let hits = engine.rank_at("export contacts", 2, june_first()).await.unwrap();

    let ids: Vec<&str> = hits.iter().map(|h| h.candidate.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "B"]);

    let b = &hits[1];
    assert!((b.similarity - 0.667).abs() < 0.01);
    assert!((b.recency_score - 0.79).abs() < 0.02);
    assert!((b.blended_score - 0.705).abs() < 0.01);
}

#[tokio::test]
async fn test_overfetches_three_times_top_k() {
    let index = worked_example_index();
    let engine = engine(index.clone(), 0.3);

    engine.rank_at("q", 1, june_first()).await.unwrap();
    engine.rank_at("q", 5, june_first()).await.unwrap();

    assert_eq!(index.requested(), vec![3, 15]);
}

#[tokio::test]
async fn test_zero_top_k_skips_index() {
    let index = worked_example_index();
    let engine = engine(index.clone(), 0.3);

    let hits = engine.rank_at("q", 0, june_first()).await.unwrap();
    assert!(hits.is_empty());
    assert!(index.requested().is_empty());
}

#[tokio::test]
async fn test_empty_index_returns_no_hits() {
    let engine = engine(Arc::new(FakeIndex::default()), 0.3);
    let hits = engine.rank_at("anything", 5, june_first()).await.unwrap();
    assert!(hits.is_empty());
}

#[tokio::test]
async fn test_pure_similarity_weight() {
    let index = Arc::new(FakeIndex::with_candidates(vec![
        candidate("old-close", Some("2020-01-01"), 0.2),
        candidate("new-far", Some("2025-05-30"), 0.3),
    ]));
    let hits = engine(index, 0.0)
        .rank_at("q", 2, june_first())
        .await
        .unwrap();

    assert_eq!(hits[0].candidate.id, "old-close");
    for hit in &hits {
        assert_eq!(hit.blended_score, hit.similarity);
    }
}

#[tokio::test]
async fn test_pure_recency_weight() {
    let index = Arc::new(FakeIndex::with_candidates(vec![
        candidate("old-close", Some("2020-01-01"), 0.0),
        candidate("new-far", Some("2025-05-30"), 3.0),
        candidate("undated", None, 0.1),
    ]));
    let hits = engine(index, 1.0)
        .rank_at("q", 3, june_first())
        .await
        .unwrap();

    let ids: Vec<&str> = hits.iter().map(|h| h.candidate.id.as_str()).collect();
    assert_eq!(ids, vec!["new-far", "undated", "old-close"]);
    assert_eq!(hits[2].recency_score, 0.0);
}

#[tokio::test]
async fn test_newer_wins_at_equal_distance() {
    let index = Arc::new(FakeIndex::with_candidates(vec![
        candidate("older", Some("2024-06-01"), 0.4),
        candidate("newer", Some("2025-05-01"), 0.4),
    ]));
    let hits = engine(index, 0.3)
        .rank_at("q", 2, june_first())
        .await
        .unwrap();
    assert_eq!(hits[0].candidate.id, "newer");
}

#[tokio::test]
async fn test_unparseable_date_treated_as_year_old() {
    let index = Arc::new(FakeIndex::with_candidates(vec![
        candidate("garbled", Some("sometime last spring"), 0.3),
        candidate("missing", None, 0.3),
    ]));
    let hits = engine(index, 0.3)
        .rank_at("q", 2, june_first())
        .await
        .unwrap();

    assert_eq!(hits[0].recency_score, hits[1].recency_score);
    assert!((hits[0].recency_score - 0.5).abs() < 0.001);
    // equal scores keep index order
    assert_eq!(hits[0].candidate.id, "garbled");
}

#[tokio::test]
async fn test_ranking_is_deterministic() {
    let engine = engine(worked_example_index(), 0.3);
    let first = engine.rank_at("q", 2, june_first()).await.unwrap();
    let second = engine.rank_at("q", 2, june_first()).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_index_error_propagates_unchanged() {
    let engine = engine(Arc::new(FakeIndex::failing("collection missing")), 0.3);
    let err = engine.rank_at("q", 5, june_first()).await.unwrap_err();
    assert!(!err.is_config());
    assert!(err.to_string().contains("collection missing"));
}

fn arbitrary_candidates(specs: &[(u16, Option<u16>)]) -> Vec<Candidate> {
    let now = june_first();
    specs
        .iter()
        .enumerate()
        .map(|(i, (distance, age))| {
            let date = age.map(|days| (now - Duration::days(i64::from(days % 2000))).to_rfc3339());
            candidate(&format!("doc-{:03}", i), date.as_deref(), f32::from(*distance) / 1000.0)
        })
        .collect()
}

#[quickcheck]
fn prop_result_bounded_by_top_k(specs: Vec<(u16, Option<u16>)>, top_k: u8) -> TestResult {
    let top_k = usize::from(top_k % 20);
    let available = specs.len();
    let index = Arc::new(FakeIndex::with_candidates(arbitrary_candidates(&specs)));
    let engine = engine(index, 0.3);

    let hits = tokio_test::block_on(engine.rank_at("q", top_k, june_first())).unwrap();
    TestResult::from_bool(hits.len() == top_k.min(available))
}

#[quickcheck]
fn prop_scores_non_increasing(specs: Vec<(u16, Option<u16>)>, weight: u8) -> bool {
    let weight = f64::from(weight % 101) / 100.0;
    let index = Arc::new(FakeIndex::with_candidates(arbitrary_candidates(&specs)));
    let engine = engine(index, weight);

    let hits = tokio_test::block_on(engine.rank_at("q", 10, june_first())).unwrap();
    hits.windows(2)
        .all(|pair| pair[0].blended_score >= pair[1].blended_score)
}

#[quickcheck]
fn prop_scores_in_unit_interval(specs: Vec<(u16, Option<u16>)>) -> bool {
    let index = Arc::new(FakeIndex::with_candidates(arbitrary_candidates(&specs)));
    let engine = engine(index, 0.3);

    let hits = tokio_test::block_on(engine.rank_at("q", 10, june_first())).unwrap();
    hits.iter().all(|h| {
        (0.0..=1.0).contains(&h.similarity)
            && (0.0..=1.0).contains(&h.recency_score)
            && h.blended_score >= 0.0
            && h.blended_score <= 1.0 + f64::EPSILON * 4.0
    })
}

#[quickcheck]
fn prop_newer_wins_at_equal_distance(distance: u16, age_secs: u32, gap_secs: u32, weight: u8) -> TestResult {
    let weight = f64::from(weight % 100 + 1) / 100.0;
    // both dates inside the 730-day horizon
    let horizon_secs = 729 * 86_400;
    let older_age = i64::from(age_secs) % horizon_secs + 1;
    let gap = i64::from(gap_secs) % older_age;
    if gap == 0 {
        return TestResult::discard();
    }

    let now = june_first();
    let older = (now - Duration::seconds(older_age)).to_rfc3339();
    let newer = (now - Duration::seconds(older_age - gap)).to_rfc3339();
    let distance = f32::from(distance) / 1000.0;
    let index = Arc::new(FakeIndex::with_candidates(vec![
        candidate("older", Some(&older), distance),
        candidate("newer", Some(&newer), distance),
    ]));

    let hits = tokio_test::block_on(engine(index, weight).rank_at("q", 2, now)).unwrap();
    TestResult::from_bool(
        hits[0].candidate.id == "newer" && hits[0].blended_score > hits[1].blended_score,
    )
}
