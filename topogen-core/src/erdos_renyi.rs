//! Bernoulli (Erdős–Rényi) graphs with a fixed link count.

use rand::Rng;
use tracing::instrument;

use crate::{
    Result,
    error::TopologyError,
    generator::{BuildSummary, Construct, Topology, check_bernoulli_request, fresh_nodes, run},
    network::{Capacity, Network, NodeState},
};

/// Places `links` links between independently drawn uniform endpoints.
///
/// Endpoints are drawn with replacement, so self-loops and repeated links
/// occur; both grow rare as the node count grows.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, ErdosRenyi, Network};
///
/// let mut network = BoundedNetwork::new(Capacity::new(100, 250, 2));
/// let mut rng = SmallRng::seed_from_u64(42);
/// let summary = ErdosRenyi::new()
///     .with_nodes(50)
///     .with_links(120)
///     .build(&mut network, &mut rng)?;
/// assert_eq!(summary.links, 120);
/// assert_eq!(network.node_count(), 50);
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct ErdosRenyi {
    nodes: Option<usize>,
    links: Option<usize>,
    state: NodeState,
}

/// Validated node and link counts for [`ErdosRenyi`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ErdosRenyiPlan {
    /// Nodes to create.
    pub nodes: usize,
    /// Links to create.
    pub links: usize,
}

impl ErdosRenyi {
    /// Creates a generator that fills the substrate to capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the node count; defaults to the node capacity.
    #[must_use]
    pub fn with_nodes(mut self, nodes: usize) -> Self {
        self.nodes = Some(nodes);
        self
    }

    /// Overrides the link count; defaults to the link capacity.
    #[must_use]
    pub fn with_links(mut self, links: usize) -> Self {
        self.links = Some(links);
        self
    }

    /// Sets the state of every created node.
    #[must_use]
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Returns the configured node state.
    #[must_use]
    pub fn state(&self) -> NodeState {
        self.state
    }

    /// Replaces the substrate's topology with a Bernoulli graph.
    ///
    /// # Errors
    /// Returns [`TopologyError::LinksWithoutNodes`] for links without nodes,
    /// a capacity error when either count exceeds the substrate, and
    /// [`TopologyError::InvalidState`] for an out-of-range state. All of
    /// these are raised before the substrate is touched.
    #[instrument(
        name = "topology.erdos_renyi",
        err,
        skip(self, network, rng),
        fields(nodes = ?self.nodes, links = ?self.links, state = %self.state),
    )]
    pub fn build<N, R>(&self, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        run(self, network, rng)
    }
}

impl Topology for ErdosRenyi {
    type Plan = ErdosRenyiPlan;

    const MODEL: &'static str = "erdos_renyi";

    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan> {
        let nodes = self.nodes.unwrap_or(capacity.max_nodes);
        let links = self.links.unwrap_or(capacity.max_links);
        check_bernoulli_request(nodes, links, self.state, capacity)?;
        Ok(ErdosRenyiPlan { nodes, links })
    }
}

impl Construct for ErdosRenyi {
    fn construct<N, R>(&self, plan: Self::Plan, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        fresh_nodes(network, plan.nodes, self.state)?;
        for _ in 0..plan.links {
            let (Some(source), Some(target)) =
                (network.random_node(rng, None), network.random_node(rng, None))
            else {
                return Err(TopologyError::LinksWithoutNodes { links: plan.links });
            };
            network.create_link(source, target)?;
        }
        Ok(BuildSummary {
            model: Self::MODEL,
            nodes: plan.nodes,
            links: plan.links,
        })
    }
}
