//! Random regular graphs.

use rand::Rng;
use tracing::instrument;

use crate::{
    Result,
    error::TopologyError,
    generator::{
        BuildSummary, Construct, Topology, check_link_capacity, check_node_capacity, check_state,
        fresh_nodes, run,
    },
    network::{Capacity, Network, NodeState},
    stubs::StubList,
};

/// Gives every node the same degree by uniform stub matching.
///
/// The realised degree sum is exactly `nodes * degree`; self-loops and
/// parallel links are possible.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, RegularGraph};
///
/// let mut network = BoundedNetwork::new(Capacity::new(1_000, 2_000, 2));
/// let summary = RegularGraph::new(4).build(&mut network, &mut SmallRng::seed_from_u64(3))?;
/// assert_eq!(summary.links, 2_000);
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct RegularGraph {
    degree: usize,
    nodes: Option<usize>,
    state: NodeState,
}

/// Validated parameters for [`RegularGraph`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RegularPlan {
    /// Nodes to create.
    pub nodes: usize,
    /// Degree of every node.
    pub degree: usize,
    /// Links the matching will create.
    pub links: usize,
}

impl RegularGraph {
    /// Creates a generator for `degree`-regular graphs.
    #[must_use]
    pub fn new(degree: usize) -> Self {
        Self {
            degree,
            ..Self::default()
        }
    }

    /// Overrides the node count; defaults to the node capacity.
    #[must_use]
    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Sets the state of every created node.
    #[must_use]
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Returns the configured degree.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Replaces the substrate's topology with a random regular graph.
    ///
    /// # Errors
    /// Returns [`TopologyError::NoNodes`] for an empty request, a capacity
    /// error when the nodes or `nodes * degree / 2` links do not fit,
    /// [`TopologyError::InvalidState`], and
    /// [`TopologyError::OddDegreeOddNodes`] when no regular graph exists.
    #[instrument(
        name = "topology.regular",
        err,
        skip(self, network, rng),
        fields(degree = self.degree, nodes = ?self.nodes, state = %self.state),
    )]
    pub fn build<N, R>(&self, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        run(self, network, rng)
    }
}

impl Topology for RegularGraph {
    type Plan = RegularPlan;

    const MODEL: &'static str = "regular";

    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan> {
        let nodes = self.nodes.unwrap_or(capacity.max_nodes);
        let degree = self.degree;
        if nodes < 1 {
            return Err(TopologyError::NoNodes { model: Self::MODEL });
        }
        check_node_capacity(nodes, capacity)?;
        let links = nodes
            .checked_mul(degree)
            .map(|stubs| stubs / 2)
            .ok_or(TopologyError::LinkCapacityExceeded {
                requested: usize::MAX,
                capacity: capacity.max_links,
            })?;
        check_link_capacity(links, capacity)?;
        check_state(self.state, capacity)?;
        if nodes % 2 == 1 && degree % 2 == 1 {
            return Err(TopologyError::OddDegreeOddNodes { degree, nodes });
        }
        Ok(RegularPlan {
            nodes,
            degree,
            links,
        })
    }
}

impl Construct for RegularGraph {
    fn construct<N, R>(&self, plan: Self::Plan, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        let handles = fresh_nodes(network, plan.nodes, self.state)?;
        let stubs = StubList::from_degrees(handles.iter().map(|&node| (node, plan.degree)));
        let links = stubs.match_into(network, rng)?;
        Ok(BuildSummary {
            model: Self::MODEL,
            nodes: plan.nodes,
            links,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TopologyErrorCode, network::BoundedNetwork, test_utils::seeded_rng};
    use rstest::rstest;

    #[rstest]
    fn every_node_reaches_the_target_degree() {
        let mut network = BoundedNetwork::new(Capacity::new(1_000, 2_000, 2));
        let summary = RegularGraph::new(4)
            .build(&mut network, &mut seeded_rng(8))
            .expect("valid request");
        assert_eq!(summary.nodes, 1_000);
        assert_eq!(network.link_count(), 2_000);
        assert!(
            network
                .nodes()
                .all(|node| network.degree(node) == Some(4))
        );
    }

    #[rstest]
    #[case::odd_degree_even_nodes(3, 10, 15)]
    #[case::even_degree_odd_nodes(2, 9, 9)]
    #[case::degree_zero(0, 5, 0)]
    fn feasible_parities_build(#[case] degree: usize, #[case] nodes: usize, #[case] links: usize) {
        let mut network = BoundedNetwork::new(Capacity::new(10, 20, 2));
        let summary = RegularGraph::new(degree)
            .with_nodes(nodes)
            .build(&mut network, &mut seeded_rng(2))
            .expect("valid request");
        assert_eq!(summary.links, links);
        assert_eq!(network.link_count(), links);
    }

    #[rstest]
    #[case::odd_odd(RegularGraph::new(3).with_nodes(9), TopologyErrorCode::OddDegreeOddNodes)]
    #[case::no_nodes(RegularGraph::new(2).with_nodes(0), TopologyErrorCode::NoNodes)]
    #[case::node_capacity(RegularGraph::new(2).with_nodes(11), TopologyErrorCode::NodeCapacityExceeded)]
    #[case::link_capacity(RegularGraph::new(6).with_nodes(10), TopologyErrorCode::LinkCapacityExceeded)]
    #[case::state(RegularGraph::new(2).with_nodes(4).with_state(NodeState::new(2)), TopologyErrorCode::InvalidState)]
    fn infeasible_requests_are_rejected(
        #[case] generator: RegularGraph,
        #[case] expected: TopologyErrorCode,
    ) {
        let mut network = BoundedNetwork::new(Capacity::new(10, 20, 2));
        let err = generator
            .build(&mut network, &mut seeded_rng(1))
            .expect_err("request must be rejected");
        assert_eq!(err.code(), expected);
        assert_eq!(network.node_count(), 0);
    }

    #[rstest]
    fn repeated_builds_keep_the_degree_sum() {
        let mut network = BoundedNetwork::new(Capacity::new(64, 96, 2));
        let mut rng = seeded_rng(31);
        for _ in 0..3 {
            RegularGraph::new(3)
                .build(&mut network, &mut rng)
                .expect("valid request");
            let degree_sum: usize = network
                .nodes()
                .map(|node| network.degree(node).unwrap_or_default())
                .sum();
            assert_eq!(degree_sum, 64 * 3);
        }
    }
}
