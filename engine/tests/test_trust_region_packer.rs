//! Trust-region packing scenarios

use replanner_core_rs::selection::{PackerConfig, PackingCandidate, ReplicationAggregate, Verdict};
use replanner_core_rs::{Slot, TrustRegionPacker};

fn slot(name: &str) -> Slot {
    Slot::new(name, 0)
}

/// A {slot1} 5, B {slot1} 3, C {slot2} 1
fn abc() -> Vec<PackingCandidate> {
    vec![
        PackingCandidate::new("A", 5.0).with_footprint(0, vec![slot("slot1")]),
        PackingCandidate::new("B", 3.0).with_footprint(0, vec![slot("slot1")]),
        PackingCandidate::new("C", 1.0).with_footprint(0, vec![slot("slot2")]),
    ]
}

fn accepted(candidates: &[PackingCandidate], trust_region: u32) -> Vec<String> {
    TrustRegionPacker::default()
        .pack(candidates, trust_region, 1)
        .unwrap()
        .decisions
        .into_iter()
        .filter(|d| d.verdict == Verdict::Accepted)
        .map(|d| d.agent_id)
        .collect()
}

fn accepted_score(candidates: &[PackingCandidate], trust_region: u32) -> f64 {
    TrustRegionPacker::default()
        .pack(candidates, trust_region, 1)
        .unwrap()
        .decisions
        .iter()
        .filter(|d| d.verdict == Verdict::Accepted)
        .map(|d| d.score)
        .sum()
}

#[test]
fn test_abc_scenario() {
    let outcome = TrustRegionPacker::default().pack(&abc(), 1, 1).unwrap();

    let verdicts: Vec<Verdict> = outcome.decisions.iter().map(|d| d.verdict).collect();
    assert_eq!(
        verdicts,
        vec![Verdict::Accepted, Verdict::RejectedInfeasible, Verdict::Accepted]
    );
    assert_eq!(outcome.decisions[1].anticipated_change, Some(2.0));
    assert_eq!(outcome.ledger.change(0, &slot("slot1")), 1);
    assert_eq!(outcome.ledger.change(0, &slot("slot2")), 1);
    assert_eq!(outcome.ledger.max_change(0), 1);
}

#[test]
fn test_larger_trust_region_admits_all() {
    assert_eq!(accepted(&abc(), 2), vec!["A", "B", "C"]);
}

#[test]
fn test_zero_trust_region_rejects_everyone_touching_a_slot() {
    assert!(accepted(&abc(), 0).is_empty());
}

#[test]
fn test_zero_trust_region_still_admits_inert_candidates() {
    let mut candidates = abc();
    candidates.push(PackingCandidate::new("idle", 0.5).with_footprint(0, vec![]));
    assert_eq!(accepted(&candidates, 0), vec!["idle"]);
}

#[test]
fn test_descending_order_beats_ascending_on_abc() {
    let descending = abc();
    let mut ascending = abc();
    ascending.reverse();

    assert_eq!(accepted_score(&descending, 1), 6.0);
    assert_eq!(accepted_score(&ascending, 1), 4.0);
}

#[test]
fn test_descending_order_beats_ascending_on_shared_corridor() {
    // Long trips over a corridor compete with short local trips
    let corridor = |id: &str, score: f64| {
        PackingCandidate::new(id, score).with_footprint(0, vec![slot("c1"), slot("c2"), slot("c3")])
    };
    let local = |id: &str, score: f64, s: &str| PackingCandidate::new(id, score).with_footprint(0, vec![slot(s)]);

    let mut descending = vec![
        corridor("long1", 10.0),
        corridor("long2", 9.0),
        local("short1", 2.0, "c1"),
        local("short2", 1.0, "c2"),
    ];
    descending.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut ascending = descending.clone();
    ascending.reverse();

    for t in 1..=3 {
        assert!(
            accepted_score(&descending, t) >= accepted_score(&ascending, t),
            "T = {}",
            t
        );
    }
}

#[test]
fn test_earlier_max_change_bounds_later_candidates() {
    // After A and B share slot1 (change 2), C on a fresh slot anticipates 2
    let candidates = vec![
        PackingCandidate::new("A", 3.0).with_footprint(0, vec![slot("slot1")]),
        PackingCandidate::new("B", 2.0).with_footprint(0, vec![slot("slot1")]),
        PackingCandidate::new("C", 1.0).with_footprint(0, vec![slot("slot2")]),
    ];
    let outcome = TrustRegionPacker::default().pack(&candidates, 2, 1).unwrap();
    assert_eq!(outcome.decisions[2].anticipated_change, Some(2.0));
    assert_eq!(outcome.decisions[2].verdict, Verdict::Accepted);
}

#[test]
fn test_worst_case_aggregation_across_replications() {
    let packer = TrustRegionPacker::new(PackerConfig {
        aggregation: ReplicationAggregate::Worst,
        ..PackerConfig::default()
    });
    let candidates = vec![
        PackingCandidate::new("A", 2.0)
            .with_footprint(0, vec![slot("s1")])
            .with_footprint(1, vec![slot("s2")]),
        PackingCandidate::new("B", 1.0)
            .with_footprint(0, vec![slot("s3")])
            .with_footprint(1, vec![slot("s2")]),
    ];

    let outcome = packer.pack(&candidates, 1, 2).unwrap();
    assert_eq!(outcome.decisions[0].verdict, Verdict::Accepted);
    assert_eq!(outcome.decisions[1].verdict, Verdict::RejectedInfeasible);
    assert_eq!(outcome.ledger.change(1, &slot("s2")), 1);
}

#[test]
fn test_mean_aggregation_can_exceed_trust_region_on_one_replication() {
    // Empty footprints in r1 halve the mean, so slot x in r0 reaches 2 > T
    let candidates = vec![
        PackingCandidate::new("A", 2.0)
            .with_footprint(0, vec![slot("x")])
            .with_footprint(1, vec![]),
        PackingCandidate::new("B", 1.0)
            .with_footprint(0, vec![slot("x")])
            .with_footprint(1, vec![]),
    ];

    let mean = TrustRegionPacker::default().pack(&candidates, 1, 2).unwrap();
    let verdicts: Vec<Verdict> = mean.decisions.iter().map(|d| d.verdict).collect();
    assert_eq!(verdicts, vec![Verdict::Accepted, Verdict::Accepted]);
    assert_eq!(mean.decisions[1].anticipated_change, Some(1.0));
    assert_eq!(mean.ledger.change(0, &slot("x")), 2);

    let worst = TrustRegionPacker::new(PackerConfig {
        aggregation: ReplicationAggregate::Worst,
        ..PackerConfig::default()
    })
    .pack(&candidates, 1, 2)
    .unwrap();
    assert_eq!(worst.decisions[1].verdict, Verdict::RejectedInfeasible);
    assert_eq!(worst.ledger.change(0, &slot("x")), 1);
}
