//! Uniform half-edge matching.
//!
//! A [`StubList`] holds every node once per unit of its target degree.
//! Matching repeatedly removes two uniformly chosen stubs and links their
//! nodes. Removal swaps the last live stub into the freed slot and shrinks
//! the live length, so the buffer is never resized.

use rand::Rng;

use crate::{
    error::NetworkError,
    network::{Network, NodeHandle},
};

/// Fixed-capacity buffer of stubs with a live-length cursor.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, Network, NodeState, StubList};
///
/// let mut network = BoundedNetwork::new(Capacity::new(2, 4, 2));
/// network.create_nodes(2, NodeState::default())?;
/// let a = network.node_at(1).expect("first node");
/// let b = network.node_at(2).expect("second node");
///
/// let stubs = StubList::from_degrees([(a, 2), (b, 1)]);
/// assert_eq!(stubs.len(), 3);
/// let mut rng = SmallRng::seed_from_u64(1);
/// assert_eq!(stubs.match_into(&mut network, &mut rng)?, 1);
/// # Ok::<(), topogen_core::NetworkError>(())
/// ```
#[derive(Clone, Debug)]
pub struct StubList {
    stubs: Box<[NodeHandle]>,
    live: usize,
}

impl StubList {
    /// Lays out each node's stubs contiguously, in iteration order.
    pub fn from_degrees<I>(degrees: I) -> Self
    where
        I: IntoIterator<Item = (NodeHandle, usize)>,
        I::IntoIter: Clone,
    {
        let degrees = degrees.into_iter();
        let total = degrees.clone().map(|(_, degree)| degree).sum();
        let mut stubs = Vec::with_capacity(total);
        for (node, degree) in degrees {
            stubs.extend(std::iter::repeat_n(node, degree));
        }
        let stubs = stubs.into_boxed_slice();
        let live = stubs.len();
        Self { stubs, live }
    }

    /// Number of stubs not yet matched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Whether every stub has been consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// The live stubs, in buffer order.
    #[must_use]
    pub fn live(&self) -> &[NodeHandle] {
        self.stubs.get(..self.live).unwrap_or_default()
    }

    /// Removes and returns a uniformly chosen live stub.
    pub fn draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<NodeHandle> {
        if self.live == 0 {
            return None;
        }
        let slot = rng.gen_range(0..self.live);
        self.live -= 1;
        self.stubs.swap(slot, self.live);
        self.stubs.get(self.live).copied()
    }

    /// Pairs the live stubs uniformly at random and links each pair.
    ///
    /// An odd stub left at the end is discarded. Returns the number of links
    /// created.
    ///
    /// # Errors
    /// Propagates the first [`NetworkError`] from [`Network::create_link`];
    /// links created before it remain.
    pub fn match_into<N, R>(mut self, network: &mut N, rng: &mut R) -> Result<usize, NetworkError>
    where
        N: Network + ?Sized,
        R: Rng + ?Sized,
    {
        let mut links = 0;
        while self.live > 1 {
            let (Some(first), Some(second)) = (self.draw(rng), self.draw(rng)) else {
                break;
            };
            network.create_link(first, second)?;
            links += 1;
        }
        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{
        network::{BoundedNetwork, Capacity, NodeState},
        test_utils::{seeded_rng, suite_proptest_config},
    };
    use proptest::prelude::*;
    use rstest::rstest;

    fn network_with(nodes: usize) -> (BoundedNetwork, Vec<NodeHandle>) {
        let mut network = BoundedNetwork::new(Capacity::new(nodes, nodes * 4 + 1, 2));
        network
            .create_nodes(nodes, NodeState::default())
            .expect("capacity suffices");
        let handles = network.nodes().collect();
        (network, handles)
    }

    #[rstest]
    fn stubs_are_laid_out_per_node() {
        let a = NodeHandle::new(1);
        let b = NodeHandle::new(2);
        let stubs = StubList::from_degrees([(a, 2), (b, 0), (a, 1), (b, 3)]);
        assert_eq!(stubs.live(), &[a, a, a, b, b, b]);
    }

    #[rstest]
    fn draw_consumes_every_stub_exactly_once() {
        let handles: Vec<_> = (0..5).map(NodeHandle::new).collect();
        let mut stubs = StubList::from_degrees(handles.iter().map(|&h| (h, 1)));
        let mut rng = seeded_rng(3);
        let mut drawn: Vec<_> = std::iter::from_fn(|| stubs.draw(&mut rng)).collect();
        drawn.sort();
        assert_eq!(drawn, handles);
        assert!(stubs.is_empty());
        assert_eq!(stubs.draw(&mut rng), None);
    }

    #[rstest]
    #[case::even(4, 2)]
    #[case::odd(5, 2)]
    #[case::single(1, 0)]
    #[case::empty(0, 0)]
    fn odd_leftover_is_discarded(#[case] stubs: usize, #[case] expected_links: usize) {
        let (mut network, handles) = network_with(1);
        let list = StubList::from_degrees([(handles[0], stubs)]);
        let links = list
            .match_into(&mut network, &mut seeded_rng(11))
            .expect("capacity suffices");
        assert_eq!(links, expected_links);
        assert_eq!(network.link_count(), expected_links);
    }

    #[rstest]
    fn matching_surfaces_link_capacity_errors() {
        let mut network = BoundedNetwork::new(Capacity::new(2, 1, 2));
        network
            .create_nodes(2, NodeState::default())
            .expect("capacity suffices");
        let handles: Vec<_> = network.nodes().collect();
        let list = StubList::from_degrees(handles.iter().map(|&h| (h, 2)));
        let err = list
            .match_into(&mut network, &mut seeded_rng(5))
            .expect_err("second link exceeds capacity");
        assert!(matches!(err, NetworkError::LinkCapacity { capacity: 1 }));
        assert_eq!(network.link_count(), 1);
    }

    proptest! {
        #![proptest_config(suite_proptest_config(64))]

        #[test]
        fn matching_realises_the_degree_sequence(
            degrees in proptest::collection::vec(0_usize..6, 1..24),
            seed in any::<u64>(),
        ) {
            let (mut network, handles) = network_with(degrees.len());
            let mut with_even_total = degrees.clone();
            if with_even_total.iter().sum::<usize>() % 2 == 1 {
                with_even_total[0] += 1;
            }
            let list = StubList::from_degrees(
                handles.iter().copied().zip(with_even_total.iter().copied()),
            );
            let links = list.match_into(&mut network, &mut seeded_rng(seed))?;

            prop_assert_eq!(links * 2, with_even_total.iter().sum::<usize>());
            let realised: HashMap<_, _> = handles
                .iter()
                .map(|&h| (h, network.degree(h).unwrap_or_default()))
                .collect();
            for (handle, expected) in handles.iter().zip(&with_even_total) {
                prop_assert_eq!(realised[handle], *expected);
            }
        }
    }
}
