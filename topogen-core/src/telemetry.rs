//! Optional build counters.
//!
//! With the `metrics` feature enabled every successful build emits:
//!
//! - `topology_builds_total` (counter)
//! - `topology_nodes_created_total` (counter)
//! - `topology_links_created_total` (counter)
//!
//! each labelled with `model`. Without the feature this module compiles to
//! nothing.

use crate::generator::BuildSummary;

#[cfg(feature = "metrics")]
pub(crate) fn record_build(summary: &BuildSummary) {
    let model = summary.model;
    metrics::counter!("topology_builds_total", "model" => model).increment(1);
    metrics::counter!("topology_nodes_created_total", "model" => model)
        .increment(summary.nodes as u64);
    metrics::counter!("topology_links_created_total", "model" => model)
        .increment(summary.links as u64);
}

#[cfg(not(feature = "metrics"))]
pub(crate) fn record_build(_summary: &BuildSummary) {}

#[cfg(all(test, feature = "metrics"))]
mod tests {
    use super::*;
    use metrics::{SharedString, Unit};
    use metrics_util::CompositeKey;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use rstest::rstest;

    use crate::{BoundedNetwork, Capacity, Lattice, RegularGraph, test_utils::seeded_rng};

    type Entry = (CompositeKey, Option<Unit>, Option<SharedString>, DebugValue);

    fn counter(snapshot: &[Entry], name: &str, model: &str) -> Option<u64> {
        snapshot.iter().find_map(|(key, _, _, value)| {
            let key = key.key();
            let labelled = key
                .labels()
                .any(|label| label.key() == "model" && label.value() == model);
            match value {
                DebugValue::Counter(count) if key.name() == name && labelled => Some(*count),
                _ => None,
            }
        })
    }

    #[rstest]
    fn record_build_increments_all_counters() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        metrics::with_local_recorder(&recorder, || {
            record_build(&BuildSummary {
                model: "lattice",
                nodes: 9,
                links: 12,
            });
            record_build(&BuildSummary {
                model: "lattice",
                nodes: 4,
                links: 4,
            });
        });
        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(counter(&snapshot, "topology_builds_total", "lattice"), Some(2));
        assert_eq!(counter(&snapshot, "topology_nodes_created_total", "lattice"), Some(13));
        assert_eq!(counter(&snapshot, "topology_links_created_total", "lattice"), Some(16));
    }

    #[rstest]
    fn successful_builds_are_counted_per_model() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let mut network = BoundedNetwork::new(Capacity::new(100, 400, 2));
        metrics::with_local_recorder(&recorder, || {
            Lattice::new([3, 3])
                .build(&mut network, &mut seeded_rng(1))
                .expect("lattice fits");
            RegularGraph::new(3)
                .with_nodes(7)
                .build(&mut network, &mut seeded_rng(1))
                .expect_err("odd degree and odd node count");
        });
        let snapshot = snapshotter.snapshot().into_vec();
        assert_eq!(counter(&snapshot, "topology_builds_total", "lattice"), Some(1));
        assert_eq!(counter(&snapshot, "topology_links_created_total", "lattice"), Some(12));
        assert_eq!(counter(&snapshot, "topology_builds_total", "regular"), None);
    }
}
