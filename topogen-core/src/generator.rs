//! Two-phase contract shared by every topology generator.
//!
//! A generator first produces a plan from the substrate's [`Capacity`]
//! without touching the substrate, then constructs the topology from that
//! plan. Validation failures therefore never leave a half-built graph.

use rand::Rng;
use tracing::info;

use crate::{
    Result,
    error::{NetworkError, TopologyError},
    network::{Capacity, Network, NodeHandle, NodeState},
};

/// Counts produced by a successful build.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BuildSummary {
    /// Name of the generating model.
    pub model: &'static str,
    /// Nodes created.
    pub nodes: usize,
    /// Links created.
    pub links: usize,
}

impl BuildSummary {
    /// Mean number of link endpoints per node, or `0.0` for an empty graph.
    ///
    /// # Examples
    /// ```
    /// use topogen_core::BuildSummary;
    ///
    /// let summary = BuildSummary { model: "regular", nodes: 10, links: 20 };
    /// assert_eq!(summary.mean_degree(), 4.0);
    /// ```
    #[must_use]
    pub fn mean_degree(&self) -> f64 {
        if self.nodes == 0 {
            0.0
        } else {
            2.0 * self.links as f64 / self.nodes as f64
        }
    }
}

/// A generator with a pure feasibility check and a mutating construction.
///
/// Only [`Topology::plan`] is public, so callers can dry-run a request
/// against a [`Capacity`]. Construction runs through each generator's
/// `build` method.
///
/// # Examples
/// ```
/// use topogen_core::{Capacity, Lattice, Topology};
///
/// let plan = Lattice::new([4, 4]).with_periodic(true).plan(&Capacity::new(16, 32, 2))?;
/// assert_eq!((plan.nodes, plan.links), (16, 32));
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
///
/// A hand-written plan cannot bypass validation:
///
/// ```compile_fail
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, Lattice, LatticePlan, Topology};
///
/// let plan = LatticePlan { dims: vec![2, 2], periodic: vec![true], nodes: 4, links: 4 };
/// let mut network = BoundedNetwork::new(Capacity::new(4, 4, 2));
/// Lattice::new([2, 2]).construct(plan, &mut network, &mut SmallRng::seed_from_u64(1));
/// ```
pub trait Topology {
    /// Everything construction needs once the request has been validated.
    type Plan;

    /// Short model name used in summaries, spans and metrics.
    const MODEL: &'static str;

    /// Validates the request against `capacity` without mutating anything.
    ///
    /// # Errors
    /// Returns the [`TopologyError`] describing the first violated
    /// constraint.
    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan>;
}

/// Construction half of [`Topology`], reachable only through [`run`].
///
/// `construct` trusts its plan: plans are only ever produced by
/// [`Topology::plan`] against the same substrate.
pub(crate) trait Construct: Topology {
    /// Replaces the substrate's topology according to `plan`.
    fn construct<N, R>(&self, plan: Self::Plan, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized;
}

/// Plans against the substrate's capacity, then constructs.
pub(crate) fn run<T, N, R>(topology: &T, network: &mut N, rng: &mut R) -> Result<BuildSummary>
where
    T: Construct,
    N: Network,
    R: Rng + ?Sized,
{
    let plan = topology.plan(&network.capacity())?;
    let summary = topology.construct(plan, network, rng)?;
    info!(
        model = summary.model,
        nodes = summary.nodes,
        links = summary.links,
        "topology built"
    );
    crate::telemetry::record_build(&summary);
    Ok(summary)
}

pub(crate) fn check_node_capacity(requested: usize, capacity: &Capacity) -> Result<()> {
    if requested > capacity.max_nodes {
        return Err(TopologyError::NodeCapacityExceeded {
            requested,
            capacity: capacity.max_nodes,
        });
    }
    Ok(())
}

pub(crate) fn check_link_capacity(requested: usize, capacity: &Capacity) -> Result<()> {
    if requested > capacity.max_links {
        return Err(TopologyError::LinkCapacityExceeded {
            requested,
            capacity: capacity.max_links,
        });
    }
    Ok(())
}

pub(crate) fn check_state(state: NodeState, capacity: &Capacity) -> Result<()> {
    if !capacity.admits_state(state) {
        return Err(TopologyError::InvalidState {
            state: state.get(),
            max_states: capacity.max_states,
        });
    }
    Ok(())
}

/// Node/link/state checks shared by the ER and geometric generators.
pub(crate) fn check_bernoulli_request(
    nodes: usize,
    links: usize,
    state: NodeState,
    capacity: &Capacity,
) -> Result<()> {
    if nodes < 1 && links > 0 {
        return Err(TopologyError::LinksWithoutNodes { links });
    }
    check_node_capacity(nodes, capacity)?;
    check_link_capacity(links, capacity)?;
    check_state(state, capacity)
}

/// Resets the substrate and creates `count` nodes, returning their handles
/// in position order.
pub(crate) fn fresh_nodes<N>(network: &mut N, count: usize, state: NodeState) -> Result<Vec<NodeHandle>>
where
    N: Network,
{
    crate::reset::reset(network)?;
    network.create_nodes(count, state)?;
    (1..=count)
        .map(|position| {
            network
                .node_at(position)
                .ok_or(TopologyError::from(NetworkError::MissingPosition { position }))
        })
        .collect()
}
