//! Replays an in-memory adjacency matrix into the substrate.

use std::marker::PhantomData;

use rand::Rng;
use tracing::{instrument, warn};

use crate::{
    Result,
    error::TopologyError,
    generator::{
        BuildSummary, Construct, Topology, check_link_capacity, check_node_capacity, check_state,
        fresh_nodes, run,
    },
    network::{Capacity, Network, NodeState},
};

/// Conversion of a matrix entry into a truth value.
///
/// `None` marks an entry that has no truth value, such as a NaN.
pub trait Truthy {
    /// Returns the entry's truth value, if it has one.
    fn truth(&self) -> Option<bool>;
}

impl Truthy for bool {
    fn truth(&self) -> Option<bool> {
        Some(*self)
    }
}

macro_rules! impl_truthy_for_integers {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Truthy for $ty {
                fn truth(&self) -> Option<bool> {
                    Some(*self != 0)
                }
            }
        )+
    };
}

impl_truthy_for_integers!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

impl Truthy for f32 {
    fn truth(&self) -> Option<bool> {
        (!self.is_nan()).then_some(*self != 0.0)
    }
}

impl Truthy for f64 {
    fn truth(&self) -> Option<bool> {
        (!self.is_nan()).then_some(*self != 0.0)
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn truth(&self) -> Option<bool> {
        self.as_ref().and_then(Truthy::truth)
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn truth(&self) -> Option<bool> {
        (**self).truth()
    }
}

/// How the importer counts links against the link capacity.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum MatrixStrictness {
    /// Validates every off-diagonal entry and counts each pair with a truthy
    /// entry in either direction, which is exactly the number of links the
    /// import creates.
    #[default]
    Strict,
    /// Validates and counts only the upper triangle. Lower entries without a
    /// truth value read as false. Pairs linked only through the lower
    /// triangle go uncounted, so the substrate may reject a link after the
    /// reset.
    UpperOnly,
}

/// Imports a square matrix of [`Truthy`] entries.
///
/// Row and column `i` become the node at position `i + 1`. For each pair
/// `i < j`, a truthy `(i, j)` entry links `j` to `i`; otherwise a truthy
/// `(j, i)` entry links `i` to `j`. A pair truthy in both directions yields
/// a single link.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{AdjacencyImport, BoundedNetwork, Capacity};
///
/// let matrix = [[0, 1, 0], [1, 0, 1], [0, 1, 0]];
/// let mut network = BoundedNetwork::new(Capacity::new(3, 2, 2));
/// let summary = AdjacencyImport::new(&matrix).build(&mut network, &mut SmallRng::seed_from_u64(0))?;
/// assert_eq!((summary.nodes, summary.links), (3, 2));
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Debug)]
pub struct AdjacencyImport<'a, E, R> {
    matrix: &'a [R],
    state: NodeState,
    strictness: MatrixStrictness,
    _entry: PhantomData<fn() -> E>,
}

impl<E, R> Clone for AdjacencyImport<'_, E, R> {
    fn clone(&self) -> Self {
        Self {
            matrix: self.matrix,
            state: self.state,
            strictness: self.strictness,
            _entry: PhantomData,
        }
    }
}

/// Zero-based links resolved from the matrix.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AdjacencyPlan {
    /// Matrix order, which is also the node count.
    pub nodes: usize,
    /// `(source, target)` node indices in creation order.
    pub links: Vec<(usize, usize)>,
    /// Links counted against the link capacity.
    pub counted: usize,
}

impl<'a, E, R> AdjacencyImport<'a, E, R>
where
    E: Truthy,
    R: AsRef<[E]>,
{
    /// Borrows `matrix` for import with strict link counting.
    #[must_use]
    pub fn new(matrix: &'a [R]) -> Self {
        Self {
            matrix,
            state: NodeState::default(),
            strictness: MatrixStrictness::default(),
            _entry: PhantomData,
        }
    }

    /// Sets the state of every created node.
    #[must_use]
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Selects how links are counted against the capacity.
    #[must_use]
    pub fn with_strictness(mut self, strictness: MatrixStrictness) -> Self {
        self.strictness = strictness;
        self
    }

    /// Returns the matrix order.
    #[must_use]
    pub fn order(&self) -> usize {
        self.matrix.len()
    }

    /// Replaces the substrate's topology with the matrix's links.
    ///
    /// # Errors
    /// Returns [`TopologyError::NonSquareMatrix`],
    /// [`TopologyError::NotTruthConvertible`], capacity errors and
    /// [`TopologyError::InvalidState`] before mutating. Under
    /// [`MatrixStrictness::UpperOnly`] an undercounted matrix can also fail
    /// with [`TopologyError::Network`] after the reset.
    #[instrument(
        name = "topology.adjacency",
        err,
        skip(self, network, rng),
        fields(order = self.matrix.len(), strictness = ?self.strictness, state = %self.state),
    )]
    pub fn build<N, G>(&self, network: &mut N, rng: &mut G) -> Result<BuildSummary>
    where
        N: Network,
        G: Rng + ?Sized,
    {
        run(self, network, rng)
    }

    fn entry(&self, row: usize, column: usize) -> Option<&E> {
        self.matrix.get(row).and_then(|entries| entries.as_ref().get(column))
    }

    fn truth(&self, row: usize, column: usize) -> Result<bool> {
        self.entry(row, column)
            .and_then(Truthy::truth)
            .ok_or(TopologyError::NotTruthConvertible { row, column })
    }

    fn check_square(&self) -> Result<usize> {
        let rows = self.matrix.len();
        for (row, entries) in self.matrix.iter().enumerate() {
            let len = entries.as_ref().len();
            if len != rows {
                return Err(TopologyError::NonSquareMatrix { rows, row, len });
            }
        }
        Ok(rows)
    }

    /// Resolves each pair's link and the number charged to the budget.
    fn resolve(&self, order: usize) -> Result<(Vec<(usize, usize)>, usize)> {
        let mut links = Vec::new();
        let mut counted = 0;
        for i in 0..order {
            for j in (i + 1)..order {
                let upper = self.truth(i, j)?;
                let lower = match self.strictness {
                    MatrixStrictness::Strict => self.truth(j, i)?,
                    MatrixStrictness::UpperOnly => self.truth(j, i).unwrap_or(false),
                };
                if upper {
                    links.push((j, i));
                } else if lower {
                    links.push((i, j));
                }
                counted += match self.strictness {
                    MatrixStrictness::Strict => usize::from(upper || lower),
                    MatrixStrictness::UpperOnly => usize::from(upper),
                };
            }
        }
        Ok((links, counted))
    }
}

impl<E, R> Topology for AdjacencyImport<'_, E, R>
where
    E: Truthy,
    R: AsRef<[E]>,
{
    type Plan = AdjacencyPlan;

    const MODEL: &'static str = "adjacency";

    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan> {
        let nodes = self.check_square()?;
        check_node_capacity(nodes, capacity)?;
        let (links, counted) = self.resolve(nodes)?;
        check_link_capacity(counted, capacity)?;
        check_state(self.state, capacity)?;
        if links.len() > counted {
            warn!(
                counted,
                required = links.len(),
                "upper-triangle count misses links set only below the diagonal"
            );
        }
        Ok(AdjacencyPlan {
            nodes,
            links,
            counted,
        })
    }
}

impl<E, R> Construct for AdjacencyImport<'_, E, R>
where
    E: Truthy,
    R: AsRef<[E]>,
{
    fn construct<N, G>(&self, plan: Self::Plan, network: &mut N, _rng: &mut G) -> Result<BuildSummary>
    where
        N: Network,
        G: Rng + ?Sized,
    {
        let handles = fresh_nodes(network, plan.nodes, self.state)?;
        for &(source, target) in &plan.links {
            if let (Some(&source), Some(&target)) = (handles.get(source), handles.get(target)) {
                network.create_link(source, target)?;
            }
        }
        Ok(BuildSummary {
            model: Self::MODEL,
            nodes: plan.nodes,
            links: plan.links.len(),
        })
    }
}
