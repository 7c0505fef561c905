//! Integration tests for prototype extraction on fixed and random corpora.

mod helpers;

use approx::assert_relative_eq;
use helpers::{array_from, cosine_extractor, random_reports, regression_reports, space};
use malheur_core::types::{KernelScheme, MetricDirection};
use malheur_core::{Config, KernelEngine, PrototypeExtractor};

// ---------------------------------------------------------------------------
// Regression corpus
// ---------------------------------------------------------------------------

#[test]
fn test_regression_corpus_cosine_similarity() {
    let space = space();
    let array = array_from(regression_reports(), &space);
    let set = cosine_extractor(0.5).extract(&array).unwrap();

    assert_eq!(set.len(), 2);
    let p0 = set.get(0).unwrap();
    let p1 = set.get(1).unwrap();
    assert_eq!(p0.label, "R1");
    assert_eq!(p0.members, vec![0, 1, 2]);
    assert_eq!(p1.label, "R4");
    assert_eq!(p1.members, vec![3, 4]);

    let expected_p0 = (2.0 - 6.0 / 15f64.sqrt()).sqrt();
    let expected_p1 = (2.0 - 4.0 / 5f64.sqrt()).sqrt();
    assert_relative_eq!(p0.radius, expected_p0, epsilon = 1e-6);
    assert_relative_eq!(p1.radius, expected_p1, epsilon = 1e-6);

    // R3 duplicates R1
    assert_relative_eq!(set.assignment(2).unwrap().distance, 0.0, epsilon = 1e-6);
    assert_eq!(set.prototype_of(4).unwrap().label, "R4");
    set.validate().unwrap();
}

#[test]
fn test_regression_corpus_default_config() {
    // Default: linear kernel, L2 vectors, distance threshold 0.65.
    // R2 sits just beyond the threshold from R1.
    let config = Config::default();
    let space = space();
    let array = array_from(regression_reports(), &space);
    let set = PrototypeExtractor::from_config(&config)
        .unwrap()
        .extract(&array)
        .unwrap();

    let labels: Vec<&str> = set.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(labels, vec!["R1", "R2", "R4"]);
    assert_eq!(set.get(0).unwrap().members, vec![0, 2]);
    assert_eq!(set.get(2).unwrap().members, vec![3, 4]);
}

#[test]
fn test_threshold_sweep() {
    let space = space();
    let array = array_from(regression_reports(), &space);
    let k = |theta: f64| cosine_extractor(theta).extract(&array).unwrap().len();

    assert_eq!(k(0.0), 1);
    assert_eq!(k(0.5), 2);
    assert_eq!(k(0.8), 3);
    assert_eq!(k(0.9), 4);
    assert!(k(1.0) >= 4);

    let mut previous = 0;
    for step in 0..=20 {
        let current = k(step as f64 / 20.0);
        assert!(current >= previous, "k dropped at step {}", step);
        previous = current;
    }
}

// ---------------------------------------------------------------------------
// Order and determinism
// ---------------------------------------------------------------------------

#[test]
fn test_input_order_matters() {
    // B overlaps both A and C, which do not overlap each other
    let space = space();
    let forward = array_from(
        vec![("A", vec!["x"]), ("B", vec!["x", "y"]), ("C", vec!["y"])],
        &space,
    );
    let reordered = array_from(
        vec![("B", vec!["x", "y"]), ("A", vec!["x"]), ("C", vec!["y"])],
        &space,
    );

    let extractor = cosine_extractor(0.7);
    assert_eq!(extractor.extract(&forward).unwrap().len(), 2);
    assert_eq!(extractor.extract(&reordered).unwrap().len(), 1);
}

#[test]
fn test_deterministic_across_spaces() {
    let reports = random_reports(80, 30, 7);
    let first = array_from(reports.clone(), &space());
    let second = array_from(reports, &space());

    let extractor = cosine_extractor(0.6);
    let a = extractor.extract(&first).unwrap();
    let b = extractor.extract(&second).unwrap();
    assert_eq!(a, b);
}

// ---------------------------------------------------------------------------
// Structural invariants on random corpora
// ---------------------------------------------------------------------------

#[test]
fn test_assignment_complete_and_disjoint() {
    let space = space();
    for seed in 1..6 {
        let array = array_from(random_reports(60, 25, seed), &space);
        for (scheme, metric, theta) in [
            (KernelScheme::Cosine, MetricDirection::Similarity, 0.4),
            (KernelScheme::Linear, MetricDirection::Distance, 0.8),
        ] {
            let set = PrototypeExtractor::new(KernelEngine::new(scheme), metric, theta)
                .unwrap()
                .extract(&array)
                .unwrap();

            set.validate().unwrap();
            assert_eq!(set.report_count(), array.len());
            let total: usize = set.iter().map(|p| p.members.len()).sum();
            assert_eq!(total, array.len());

            for prototype in &set {
                assert_eq!(set.assignment(prototype.source).unwrap().distance, 0.0);
                for &member in &prototype.members {
                    let d = set.assignment(member).unwrap().distance;
                    assert!(d <= prototype.radius + 1e-12);
                }
            }
        }
    }
}

#[test]
fn test_distance_members_within_threshold() {
    let space = space();
    let array = array_from(random_reports(50, 20, 42), &space);
    let theta = 0.9;
    let set = PrototypeExtractor::new(
        KernelEngine::new(KernelScheme::Linear),
        MetricDirection::Distance,
        theta,
    )
    .unwrap()
    .extract(&array)
    .unwrap();

    for prototype in &set {
        assert!(prototype.radius <= theta);
    }
}
