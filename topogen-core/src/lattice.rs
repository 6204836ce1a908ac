//! Hyper-rectangular lattices with optional periodic boundaries.
//!
//! Node positions map to mixed-radix coordinates: axis `j` has radix
//! `dims[j]` and the running product of the earlier radices is the stride
//! between neighbours along that axis. Each node links forward along every
//! axis, so every lattice edge is created exactly once, from its
//! lower-coordinate endpoint.

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
};

/// Per-axis lattice sizes.
///
/// A single size describes a one-dimensional chain.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LatticeDims(Vec<usize>);

impl LatticeDims {
    /// Returns the axis sizes.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl From<usize> for LatticeDims {
    fn from(size: usize) -> Self {
        Self(vec![size])
    }
}

impl From<Vec<usize>> for LatticeDims {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl From<&[usize]> for LatticeDims {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const D: usize> From<[usize; D]> for LatticeDims {
    fn from(dims: [usize; D]) -> Self {
        Self(dims.to_vec())
    }
}

/// Which lattice axes wrap around.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Periodicity {
    /// The same flag for every axis.
    Uniform(bool),
    /// One flag per axis.
    PerAxis(Vec<bool>),
}

impl Default for Periodicity {
    fn default() -> Self {
        Self::Uniform(false)
    }
}

impl From<bool> for Periodicity {
    fn from(periodic: bool) -> Self {
        Self::Uniform(periodic)
    }
}

impl From<Vec<bool>> for Periodicity {
    fn from(periodic: Vec<bool>) -> Self {
        Self::PerAxis(periodic)
    }
}

impl<const D: usize> From<[bool; D]> for Periodicity {
    fn from(periodic: [bool; D]) -> Self {
        Self::PerAxis(periodic.to_vec())
    }
}

impl Periodicity {
    fn resolve(&self, axes: usize) -> Result<Vec<bool>> {
        match self {
            Self::Uniform(periodic) => Ok(vec![*periodic; axes]),
            Self::PerAxis(flags) if flags.len() == axes => Ok(flags.clone()),
            Self::PerAxis(flags) => Err(TopologyError::PeriodicityMismatch {
                axes,
                periodic: flags.len(),
            }),
        }
    }
}

/// Axis-aligned lattice generator.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, Lattice};
///
/// let mut network = BoundedNetwork::new(Capacity::new(2_000, 6_000, 2));
/// let summary = Lattice::new([10, 20, 10])
///     .with_periodic([true, false, true])
///     .build(&mut network, &mut SmallRng::seed_from_u64(0))?;
/// assert_eq!((summary.nodes, summary.links), (2_000, 5_900));
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Clone, Debug)]
pub struct Lattice {
    dims: LatticeDims,
    periodic: Periodicity,
    state: NodeState,
}

/// Validated lattice shape.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LatticePlan {
    /// Axis sizes.
    pub dims: Vec<usize>,
    /// Per-axis periodicity.
    pub periodic: Vec<bool>,
    /// Product of the axis sizes.
    pub nodes: usize,
    /// Edges the lattice will contain.
    pub links: usize,
}

impl Lattice {
    /// Creates an open lattice with the given axis sizes.
    #[must_use]
    pub fn new(dims: impl Into<LatticeDims>) -> Self {
        Self {
            dims: dims.into(),
            periodic: Periodicity::default(),
            state: NodeState::default(),
        }
    }

    /// Sets which axes wrap around.
    #[must_use]
    pub fn with_periodic(mut self, periodic: impl Into<Periodicity>) -> Self {
        self.periodic = periodic.into();
        self
    }

    /// Sets the state of every created node.
    #[must_use]
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Returns the configured axis sizes.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        self.dims.as_slice()
    }

    /// Replaces the substrate's topology with the lattice.
    ///
    /// # Errors
    /// Returns [`TopologyError::EmptyLattice`],
    /// [`TopologyError::ZeroLengthAxis`] or
    /// [`TopologyError::PeriodicityMismatch`] for malformed shapes, capacity
    /// errors when the nodes or edges do not fit, and
    /// [`TopologyError::InvalidState`].
    #[instrument(
        name = "topology.lattice",
        err,
        skip(self, network, rng),
        fields(dims = ?self.dims.as_slice(), periodic = ?self.periodic, state = %self.state),
    )]
    pub fn build<N, R>(&self, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        run(self, network, rng)
    }
}

impl Topology for Lattice {
    type Plan = LatticePlan;

    const MODEL: &'static str = "lattice";

    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan> {
        let dims = self.dims.as_slice().to_vec();
        if dims.is_empty() {
            return Err(TopologyError::EmptyLattice);
        }
        if let Some(axis) = dims.iter().position(|&size| size == 0) {
            return Err(TopologyError::ZeroLengthAxis { axis });
        }
        let periodic = self.periodic.resolve(dims.len())?;
        let nodes = dims
            .iter()
            .try_fold(1_usize, |product, &size| product.checked_mul(size))
            .ok_or(TopologyError::LatticeTooLarge)?;
        check_node_capacity(nodes, capacity)?;
        let links = edge_count(nodes, &dims, &periodic).ok_or(TopologyError::LatticeTooLarge)?;
        check_link_capacity(links, capacity)?;
        check_state(self.state, capacity)?;
        Ok(LatticePlan {
            dims,
            periodic,
            nodes,
            links,
        })
    }
}

impl Construct for Lattice {
    fn construct<N, R>(&self, plan: Self::Plan, network: &mut N, _rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        let handles = fresh_nodes(network, plan.nodes, self.state)?;
        let mut links = 0;
        for (index, &source) in handles.iter().enumerate() {
            let mut stride = 1;
            for (&size, &periodic) in plan.dims.iter().zip(&plan.periodic) {
                if let Some(neighbour) = forward_neighbour(index, stride, size, periodic)
                    && let Some(&target) = handles.get(neighbour)
                {
                    network.create_link(source, target)?;
                    links += 1;
                }
                stride *= size;
            }
        }
        Ok(BuildSummary {
            model: Self::MODEL,
            nodes: plan.nodes,
            links,
        })
    }
}

/// Edges of the lattice: `nodes` per axis, less one layer per open axis.
fn edge_count(nodes: usize, dims: &[usize], periodic: &[bool]) -> Option<usize> {
    dims.iter()
        .zip(periodic)
        .try_fold(0_usize, |total, (&size, &wraps)| {
            let axis = if wraps { nodes } else { nodes - nodes / size };
            total.checked_add(axis)
        })
}

/// Zero-based index of the next node along one axis.
///
/// `stride` is the product of the sizes of all earlier axes. On the last
/// coordinate the neighbour wraps back to coordinate zero when the axis is
/// periodic; otherwise there is none.
fn forward_neighbour(index: usize, stride: usize, size: usize, periodic: bool) -> Option<usize> {
    let coordinate = (index / stride) % size;
    if coordinate + 1 < size {
        Some(index + stride)
    } else if periodic {
        Some(index - (size - 1) * stride)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        TopologyErrorCode,
        network::BoundedNetwork,
        test_utils::{seeded_rng, suite_proptest_config},
    };
    use proptest::prelude::*;
    use rstest::rstest;

    fn build(lattice: &Lattice, capacity: Capacity) -> Result<(BuildSummary, BoundedNetwork)> {
        let mut network = BoundedNetwork::new(capacity);
        let summary = lattice.build(&mut network, &mut seeded_rng(0))?;
        Ok((summary, network))
    }

    #[rstest]
    fn mixed_periodicity_counts_match_the_closed_form() {
        let lattice = Lattice::new([10, 20, 10]).with_periodic([true, false, true]);
        let (summary, network) =
            build(&lattice, Capacity::new(2_000, 5_900, 2)).expect("capacity is exact");
        assert_eq!(summary.nodes, 2_000);
        assert_eq!(network.link_count(), 5_900);
    }

    #[rstest]
    fn open_chain_links_consecutive_positions() {
        let (_, network) =
            build(&Lattice::new(5), Capacity::new(5, 4, 2)).expect("chain fits");
        assert_eq!(network.link_count(), 4);
        for position in 1..5 {
            let a = network.node_at(position).expect("node");
            let b = network.node_at(position + 1).expect("node");
            assert!(network.connected(a, b));
        }
    }

    #[rstest]
    fn periodic_ring_closes_the_loop() {
        let (_, network) = build(
            &Lattice::new(6).with_periodic(true),
            Capacity::new(6, 6, 2),
        )
        .expect("ring fits");
        let first = network.node_at(1).expect("node");
        let last = network.node_at(6).expect("node");
        assert!(network.connected(last, first));
        assert!(network.nodes().all(|node| network.degree(node) == Some(2)));
    }

    #[rstest]
    fn periodic_torus_is_four_regular() {
        let (summary, network) = build(
            &Lattice::new(vec![4, 5]).with_periodic(true),
            Capacity::new(20, 40, 2),
        )
        .expect("torus fits");
        assert_eq!(summary.links, 40);
        assert!(network.nodes().all(|node| network.degree(node) == Some(4)));
    }

    #[rstest]
    fn open_grid_corner_and_interior_degrees() {
        let (_, network) =
            build(&Lattice::new([3, 3]), Capacity::new(9, 12, 2)).expect("grid fits");
        assert_eq!(network.link_count(), 12);
        let degree_at = |position| {
            network
                .node_at(position)
                .and_then(|node| network.degree(node))
        };
        assert_eq!(degree_at(1), Some(2));
        assert_eq!(degree_at(2), Some(3));
        assert_eq!(degree_at(5), Some(4));
        assert_eq!(degree_at(9), Some(2));
        // Position 4 is coordinate (0, 1); its forward neighbours are 5 and 7.
        let node = |position| network.node_at(position).expect("node");
        assert!(network.connected(node(4), node(5)));
        assert!(network.connected(node(4), node(7)));
        assert!(!network.connected(node(3), node(4)));
    }

    #[rstest]
    #[case::empty(Lattice::new(Vec::new()), TopologyErrorCode::EmptyLattice)]
    #[case::zero_axis(Lattice::new([3, 0]), TopologyErrorCode::ZeroLengthAxis)]
    #[case::mismatch(Lattice::new([3, 3]).with_periodic([true]), TopologyErrorCode::PeriodicityMismatch)]
    #[case::nodes(Lattice::new([4, 4]), TopologyErrorCode::NodeCapacityExceeded)]
    #[case::links(Lattice::new([3, 3]).with_periodic(true), TopologyErrorCode::LinkCapacityExceeded)]
    #[case::state(Lattice::new(3).with_state(NodeState::new(5)), TopologyErrorCode::InvalidState)]
    #[case::overflow(Lattice::new([usize::MAX, 2]), TopologyErrorCode::LatticeTooLarge)]
    fn malformed_requests_are_rejected(
        #[case] lattice: Lattice,
        #[case] expected: TopologyErrorCode,
    ) {
        let err = build(&lattice, Capacity::new(9, 12, 2)).expect_err("request must fail");
        assert_eq!(err.code(), expected);
    }

    #[rstest]
    #[case(0, 1, 3, false, Some(1))]
    #[case(2, 1, 3, false, None)]
    #[case(2, 1, 3, true, Some(0))]
    #[case(7, 3, 3, true, Some(1))]
    #[case(4, 3, 3, false, Some(7))]
    fn forward_neighbour_follows_mixed_radix_coordinates(
        #[case] index: usize,
        #[case] stride: usize,
        #[case] size: usize,
        #[case] periodic: bool,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(forward_neighbour(index, stride, size, periodic), expected);
    }

    proptest! {
        #![proptest_config(suite_proptest_config(64))]

        #[test]
        fn link_count_matches_the_plan(
            shape in proptest::collection::vec((1_usize..6, any::<bool>()), 1..4),
        ) {
            let (dims, periodic): (Vec<usize>, Vec<bool>) = shape.into_iter().unzip();
            let lattice = Lattice::new(dims.clone()).with_periodic(periodic.clone());
            let capacity = Capacity::new(1_000, 4_000, 2);
            let plan = lattice.plan(&capacity)?;
            let (summary, network) = build(&lattice, capacity)?;
            prop_assert_eq!(summary.links, plan.links);
            prop_assert_eq!(network.link_count(), plan.links);
            prop_assert_eq!(network.node_count(), dims.iter().product::<usize>());
        }
    }
}
