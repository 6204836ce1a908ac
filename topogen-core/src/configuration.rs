//! Configuration-model graphs over an arbitrary degree distribution.

use rand::Rng;
use tracing::{debug, instrument};

use crate::{
    Result,
    error::TopologyError,
    generator::{BuildSummary, Construct, Topology, check_state, fresh_nodes, run},
    network::{Capacity, Network, NodeState},
    partition::DegreeSequence,
    stubs::StubList,
};

/// Realises a degree distribution by uniform stub matching.
///
/// `degree_distribution[k - 1]` is the fraction of nodes with degree `k`.
/// Mass left unassigned becomes degree-zero nodes. Matching can produce
/// self-loops and parallel links.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, ConfigurationModel};
///
/// let mut network = BoundedNetwork::new(Capacity::new(200, 1_000, 2));
/// let summary = ConfigurationModel::new(vec![0.5, 0.25, 0.25])
///     .build(&mut network, &mut SmallRng::seed_from_u64(7))?;
/// assert_eq!(summary.nodes, 200);
/// assert_eq!(summary.links, 175);
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConfigurationModel {
    nodes: Option<usize>,
    degree_distribution: Vec<f64>,
    state: NodeState,
}

impl ConfigurationModel {
    /// Creates a generator for the given degree distribution.
    #[must_use]
    pub fn new(degree_distribution: Vec<f64>) -> Self {
        Self {
            degree_distribution,
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

    /// Returns the configured degree distribution.
    #[must_use]
    pub fn degree_distribution(&self) -> &[f64] {
        &self.degree_distribution
    }

    /// Replaces the substrate's topology with a configuration-model graph.
    ///
    /// # Errors
    /// Returns the partitioner's errors (see [`DegreeSequence::partition`])
    /// and [`TopologyError::InvalidState`], all before any mutation.
    #[instrument(
        name = "topology.configuration",
        err,
        skip(self, network, rng),
        fields(nodes = ?self.nodes, degrees = self.degree_distribution.len(), state = %self.state),
    )]
    pub fn build<N, R>(&self, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        run(self, network, rng)
    }
}

impl Topology for ConfigurationModel {
    type Plan = DegreeSequence;

    const MODEL: &'static str = "configuration";

    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan> {
        let nodes = self.nodes.unwrap_or(capacity.max_nodes);
        let sequence = DegreeSequence::partition(nodes, &self.degree_distribution, capacity)?;
        check_state(self.state, capacity)?;
        Ok(sequence)
    }
}

impl Construct for ConfigurationModel {
    fn construct<N, R>(&self, plan: Self::Plan, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        let handles = fresh_nodes(network, plan.nodes(), self.state)?;
        debug!(
            total_stubs = plan.total_stubs(),
            isolated = plan.count(0),
            "degree sequence partitioned"
        );
        let stubs = StubList::from_degrees(handles.iter().copied().zip(plan.degrees()));
        let links = stubs.match_into(network, rng)?;
        Ok(BuildSummary {
            model: Self::MODEL,
            nodes: handles.len(),
            links,
        })
    }
}

/// Directed configuration model with separate in- and out-degree
/// distributions.
///
/// Only the capability is declared: [`DirectedConfigurationModel::build`]
/// always fails with [`TopologyError::NotImplemented`] and never touches the
/// substrate.
#[derive(Clone, Debug, Default)]
pub struct DirectedConfigurationModel {
    _private: (),
}

impl DirectedConfigurationModel {
    const CAPABILITY: &'static str = "directed configuration model";

    /// Creates the placeholder generator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Always fails.
    ///
    /// # Errors
    /// Returns [`TopologyError::NotImplemented`].
    pub fn build<N, R>(&self, _network: &mut N, _rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        Err(TopologyError::NotImplemented {
            capability: Self::CAPABILITY,
        })
    }
}
