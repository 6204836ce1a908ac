//! Random geometric (threshold) graphs in the unit hypercube.
//!
//! Nodes receive uniform positions in `[0, 1)^dim` and every pair closer
//! than a connection radius is linked. The radius is chosen so that a node
//! away from the boundary expects `mean_degree` neighbours; nodes near the
//! faces of the cube see fewer, so realised link counts trail
//! `nodes * mean_degree / 2` slightly.

use std::f64::consts::{FRAC_PI_2, LN_2, TAU};

use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::{
    Result,
    error::{NetworkError, TopologyError},
    generator::{BuildSummary, Construct, Topology, check_bernoulli_request, fresh_nodes, run},
    network::{Capacity, Network, NodeHandle, NodeState},
};

/// Product `n (n - 2) (n - 4) ...` down to 1 or 2, with `0!! = 1`.
///
/// Saturates to infinity once the product leaves the `f64` range, which
/// happens from `n = 301`.
///
/// # Examples
/// ```
/// use topogen_core::double_factorial;
///
/// assert_eq!(double_factorial(0), 1.0);
/// assert_eq!(double_factorial(6), 48.0);
/// assert_eq!(double_factorial(7), 105.0);
/// assert_eq!(double_factorial(usize::MAX), f64::INFINITY);
/// ```
#[must_use]
pub fn double_factorial(n: usize) -> f64 {
    let mut product = 1.0;
    for k in (1..=n).rev().step_by(2) {
        product *= k as f64;
        if product.is_infinite() {
            break;
        }
    }
    product
}

/// Largest position buffer a `Vec<f64>` can address.
const MAX_COORDINATES: usize = isize::MAX as usize / size_of::<f64>();

/// Below this the log double factorial is summed term by term.
const EXACT_LOG_TERMS: usize = 512;

/// `ln(n!!)`, exact summation for small `n` and Stirling's series above.
fn ln_double_factorial(n: usize) -> f64 {
    if n <= EXACT_LOG_TERMS {
        return (1..=n).rev().step_by(2).map(|k| (k as f64).ln()).sum();
    }
    let half = (n / 2) as f64;
    if n % 2 == 0 {
        half * LN_2 + ln_factorial(half)
    } else {
        ln_factorial(n as f64) - half * LN_2 - ln_factorial(half)
    }
}

/// Stirling's series for `ln(k!)`; accurate to `f64` precision for `k >= 256`.
fn ln_factorial(k: f64) -> f64 {
    k * k.ln() - k + 0.5 * (TAU * k).ln() + 1.0 / (12.0 * k) - 1.0 / (360.0 * k.powi(3))
}

/// Radius at which `nodes` uniform points in a `dimension`-cube expect
/// `mean_degree` neighbours each, ignoring boundary effects.
///
/// Solves `mean_degree = nodes * V_dim(r)` where `V_dim` is the volume of a
/// `dimension`-ball. The ratio is evaluated in log space, so the radius stays
/// finite in every dimension. Returns `0.0` when there are no nodes.
///
/// # Examples
/// ```
/// use topogen_core::connection_radius;
///
/// let radius = connection_radius(50, 400, 2.0);
/// assert!(radius.is_finite() && radius > 4.0 && radius < 6.0);
/// ```
#[must_use]
pub fn connection_radius(nodes: usize, dimension: usize, mean_degree: f64) -> f64 {
    if nodes == 0 || dimension == 0 {
        return 0.0;
    }
    let ln_scaled = (mean_degree / nodes as f64).ln() + ln_double_factorial(dimension)
        - (dimension / 2) as f64 * FRAC_PI_2.ln();
    0.5 * (ln_scaled / dimension as f64).exp()
}

/// When a geometric build checks its link budget.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum BudgetCheck {
    /// Samples positions and counts qualifying pairs before the reset, so an
    /// overrun leaves the substrate untouched.
    #[default]
    Precheck,
    /// Links pairs as they are found and stops at the first pair past the
    /// budget, leaving the nodes and the links created so far in place.
    DuringConstruction,
}

/// Threshold graph over uniformly placed nodes.
///
/// # Examples
/// ```
/// use rand::{SeedableRng, rngs::SmallRng};
/// use topogen_core::{BoundedNetwork, Capacity, GeometricGraph};
///
/// let mut network = BoundedNetwork::new(Capacity::new(500, 1_000, 2));
/// let summary = GeometricGraph::new()
///     .with_mean_degree(4.0)
///     .build(&mut network, &mut SmallRng::seed_from_u64(11))?;
/// assert!(summary.links <= 1_000);
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Clone, Debug)]
pub struct GeometricGraph {
    nodes: Option<usize>,
    links: Option<usize>,
    state: NodeState,
    dimension: usize,
    mean_degree: f64,
    budget_check: BudgetCheck,
}

impl Default for GeometricGraph {
    fn default() -> Self {
        Self {
            nodes: None,
            links: None,
            state: NodeState::default(),
            dimension: 2,
            mean_degree: 2.0,
            budget_check: BudgetCheck::default(),
        }
    }
}

/// Validated parameters for [`GeometricGraph`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeometricPlan {
    /// Nodes to place.
    pub nodes: usize,
    /// Maximum number of links.
    pub budget: usize,
    /// Embedding dimension.
    pub dimension: usize,
    /// Length of the position buffer, `nodes * dimension`.
    pub coordinates: usize,
    /// Connection radius.
    pub radius: f64,
}

impl GeometricGraph {
    /// Creates a two-dimensional generator with mean degree 2.
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

    /// Overrides the link budget; defaults to the link capacity.
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

    /// Sets the embedding dimension.
    #[must_use]
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Sets the target mean degree.
    #[must_use]
    pub fn with_mean_degree(mut self, mean_degree: f64) -> Self {
        self.mean_degree = mean_degree;
        self
    }

    /// Selects when the link budget is enforced.
    #[must_use]
    pub fn with_budget_check(mut self, budget_check: BudgetCheck) -> Self {
        self.budget_check = budget_check;
        self
    }

    /// Replaces the substrate's topology with a geometric graph.
    ///
    /// # Errors
    /// Returns the ER validation errors, [`TopologyError::InvalidDimension`],
    /// [`TopologyError::InvalidMeanDegree`] and
    /// [`TopologyError::GeometryTooLarge`] before mutating, and
    /// [`TopologyError::LinkBudgetExceeded`] when more pairs qualify than the
    /// budget allows. With [`BudgetCheck::DuringConstruction`] the overrun
    /// leaves a partial topology behind.
    #[instrument(
        name = "topology.geometric",
        err,
        skip(self, network, rng),
        fields(
            nodes = ?self.nodes,
            links = ?self.links,
            dimension = self.dimension,
            mean_degree = self.mean_degree,
            budget_check = ?self.budget_check,
        ),
    )]
    pub fn build<N, R>(&self, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        run(self, network, rng)
    }
}

impl Topology for GeometricGraph {
    type Plan = GeometricPlan;

    const MODEL: &'static str = "geometric";

    fn plan(&self, capacity: &Capacity) -> Result<Self::Plan> {
        let nodes = self.nodes.unwrap_or(capacity.max_nodes);
        let budget = self.links.unwrap_or(capacity.max_links);
        check_bernoulli_request(nodes, budget, self.state, capacity)?;
        if self.dimension < 1 {
            return Err(TopologyError::InvalidDimension {
                got: self.dimension,
            });
        }
        if !self.mean_degree.is_finite() || self.mean_degree < 0.0 {
            return Err(TopologyError::InvalidMeanDegree {
                got: self.mean_degree,
            });
        }
        let coordinates = nodes
            .checked_mul(self.dimension)
            .filter(|&len| len <= MAX_COORDINATES)
            .ok_or(TopologyError::GeometryTooLarge {
                nodes,
                dimension: self.dimension,
            })?;
        Ok(GeometricPlan {
            nodes,
            budget,
            dimension: self.dimension,
            coordinates,
            radius: connection_radius(nodes, self.dimension, self.mean_degree),
        })
    }
}

impl Construct for GeometricGraph {
    fn construct<N, R>(&self, plan: Self::Plan, network: &mut N, rng: &mut R) -> Result<BuildSummary>
    where
        N: Network,
        R: Rng + ?Sized,
    {
        let positions: Vec<f64> = (0..plan.coordinates)
            .map(|_| rng.r#gen::<f64>())
            .collect();
        debug!(radius = plan.radius, "positions sampled");
        let pairs = close_pairs(&positions, plan.dimension, plan.radius);
        let overrun = |partial| {
            warn!(budget = plan.budget, partial, "geometric link budget exceeded");
            TopologyError::LinkBudgetExceeded {
                budget: plan.budget,
                partial,
            }
        };

        let links = match self.budget_check {
            BudgetCheck::Precheck => {
                let accepted: Vec<_> = pairs.take(plan.budget.saturating_add(1)).collect();
                if accepted.len() > plan.budget {
                    return Err(overrun(false));
                }
                let handles = fresh_nodes(network, plan.nodes, self.state)?;
                for &(i, j) in &accepted {
                    link_pair(network, &handles, i, j)?;
                }
                accepted.len()
            }
            BudgetCheck::DuringConstruction => {
                let handles = fresh_nodes(network, plan.nodes, self.state)?;
                let mut created = 0;
                for (i, j) in pairs {
                    if created == plan.budget {
                        return Err(overrun(true));
                    }
                    link_pair(network, &handles, i, j)?;
                    created += 1;
                }
                created
            }
        };
        Ok(BuildSummary {
            model: Self::MODEL,
            nodes: plan.nodes,
            links,
        })
    }
}

fn link_pair<N: Network>(network: &mut N, handles: &[NodeHandle], i: usize, j: usize) -> Result<()> {
    let (Some(&source), Some(&target)) = (handles.get(i), handles.get(j)) else {
        return Err(NetworkError::MissingPosition {
            position: i.max(j) + 1,
        }
        .into());
    };
    network.create_link(source, target)?;
    Ok(())
}

/// Index pairs `i < j` whose positions lie strictly closer than `radius`.
fn close_pairs(
    positions: &[f64],
    dimension: usize,
    radius: f64,
) -> impl Iterator<Item = (usize, usize)> + '_ {
    let threshold = radius * radius;
    let count = positions.len().checked_div(dimension).unwrap_or(0);
    let point = move |index: usize| &positions[index * dimension..(index + 1) * dimension];
    (0..count).flat_map(move |i| {
        ((i + 1)..count).filter_map(move |j| {
            let distance: f64 = point(i)
                .iter()
                .zip(point(j))
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            (distance < threshold).then_some((i, j))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TopologyErrorCode, network::BoundedNetwork, test_utils::seeded_rng};
    use rstest::rstest;

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 1.0)]
    #[case(2, 2.0)]
    #[case(3, 3.0)]
    #[case(4, 8.0)]
    #[case(5, 15.0)]
    #[case(8, 384.0)]
    fn double_factorial_matches_table(#[case] n: usize, #[case] expected: f64) {
        assert_eq!(double_factorial(n), expected);
    }

    #[rstest]
    #[case::line(1, 0.5 * 4.0 / 100.0)]
    #[case::plane(2, (4.0 / (100.0 * std::f64::consts::PI)).sqrt())]
    #[case::space(3, (3.0 * 4.0 / (4.0 * std::f64::consts::PI * 100.0)).cbrt())]
    fn radius_matches_ball_volume(#[case] dimension: usize, #[case] expected: f64) {
        let radius = connection_radius(100, dimension, 4.0);
        assert!((radius - expected).abs() < 1e-12, "{radius} vs {expected}");
    }

    #[rstest]
    fn radius_is_zero_without_nodes() {
        assert_eq!(connection_radius(0, 2, 2.0), 0.0);
    }

    #[rstest]
    fn double_factorial_saturates() {
        assert!(double_factorial(300).is_finite());
        assert_eq!(double_factorial(301), f64::INFINITY);
        assert_eq!(double_factorial(usize::MAX), f64::INFINITY);
    }

    #[rstest]
    #[case(1)]
    #[case(2)]
    #[case(7)]
    #[case(40)]
    #[case(151)]
    fn log_double_factorial_matches_product(#[case] n: usize) {
        let expected = double_factorial(n).ln();
        let actual = ln_double_factorial(n);
        assert!((actual - expected).abs() <= 1e-9 * expected.max(1.0), "{actual} vs {expected}");
    }

    #[rstest]
    #[case(EXACT_LOG_TERMS - 1)]
    #[case(EXACT_LOG_TERMS)]
    fn stirling_branch_continues_exact_sum(#[case] n: usize) {
        // n!! = n * (n - 2)!!, across the switch between the two branches.
        let step = ln_double_factorial(n + 2) - ln_double_factorial(n);
        assert!((step - ((n + 2) as f64).ln()).abs() < 1e-9, "{step}");
    }

    #[rstest]
    #[case(300)]
    #[case(400)]
    #[case(4_000)]
    #[case(usize::MAX)]
    fn radius_stays_finite_in_high_dimensions(#[case] dimension: usize) {
        let radius = connection_radius(50, dimension, 2.0);
        assert!(radius.is_finite() && radius > 0.0, "{radius}");
    }

    #[rstest]
    fn high_dimensional_build_links_few_pairs() {
        let mut network = BoundedNetwork::new(Capacity::new(50, 1_225, 2));
        let summary = GeometricGraph::new()
            .with_dimension(400)
            .build(&mut network, &mut seeded_rng(8))
            .expect("budget covers every pair");
        let radius = connection_radius(50, 400, 2.0);
        assert!((4.0..6.0).contains(&radius), "{radius}");
        // Typical separations are near sqrt(400 / 6), far beyond the radius.
        assert!(summary.links < 10, "{} links", summary.links);
        assert_eq!(network.link_count(), summary.links);
    }

    #[rstest]
    fn close_pairs_use_strict_euclidean_threshold() {
        let positions = [0.0, 0.0, 0.5, 0.0, 0.75, 0.25, 0.9, 0.9];
        let pairs: Vec<_> = close_pairs(&positions, 2, 0.5).collect();
        // (0, 1) sit exactly 0.5 apart and are not linked.
        assert_eq!(pairs, vec![(1, 2)]);
    }

    #[rstest]
    fn mean_degree_two_yields_about_one_link_per_node() {
        let mut network = BoundedNetwork::new(Capacity::new(1_000, 2_000, 2));
        let summary = GeometricGraph::new()
            .build(&mut network, &mut seeded_rng(12))
            .expect("budget is generous");
        assert_eq!(summary.nodes, 1_000);
        assert_eq!(network.link_count(), summary.links);
        assert!(
            (850..=1_150).contains(&summary.links),
            "{} links",
            summary.links
        );
        assert!(network.links().all(|link| !link.is_loop()));
    }

    #[rstest]
    fn precheck_overrun_leaves_substrate_untouched() {
        let mut network = BoundedNetwork::new(Capacity::new(200, 100, 2));
        network
            .create_nodes(5, NodeState::default())
            .expect("seed nodes");
        let err = GeometricGraph::new()
            .with_links(50)
            .with_mean_degree(10.0)
            .build(&mut network, &mut seeded_rng(4))
            .expect_err("about 1000 pairs qualify");
        assert_eq!(
            err,
            TopologyError::LinkBudgetExceeded {
                budget: 50,
                partial: false
            }
        );
        assert!(!err.left_partial_topology());
        assert_eq!(network.node_count(), 5);
    }

    #[rstest]
    fn construction_overrun_leaves_partial_topology() {
        let mut network = BoundedNetwork::new(Capacity::new(200, 100, 2));
        let err = GeometricGraph::new()
            .with_links(50)
            .with_mean_degree(10.0)
            .with_budget_check(BudgetCheck::DuringConstruction)
            .build(&mut network, &mut seeded_rng(4))
            .expect_err("about 1000 pairs qualify");
        assert!(err.left_partial_topology());
        assert_eq!(network.node_count(), 200);
        assert_eq!(network.link_count(), 50);
    }

    #[rstest]
    fn budget_check_modes_agree_when_within_budget() {
        let build = |check| {
            let mut network = BoundedNetwork::new(Capacity::new(300, 600, 2));
            let summary = GeometricGraph::new()
                .with_dimension(3)
                .with_budget_check(check)
                .build(&mut network, &mut seeded_rng(21))
                .expect("budget is generous");
            (summary, network.link_count())
        };
        assert_eq!(
            build(BudgetCheck::Precheck),
            build(BudgetCheck::DuringConstruction)
        );
    }

    #[rstest]
    #[case::dimension(GeometricGraph::new().with_nodes(10).with_dimension(0), TopologyErrorCode::InvalidDimension)]
    #[case::negative_degree(GeometricGraph::new().with_nodes(10).with_mean_degree(-1.0), TopologyErrorCode::InvalidMeanDegree)]
    #[case::nan_degree(GeometricGraph::new().with_nodes(10).with_mean_degree(f64::NAN), TopologyErrorCode::InvalidMeanDegree)]
    #[case::links_without_nodes(GeometricGraph::new().with_nodes(0).with_links(3), TopologyErrorCode::LinksWithoutNodes)]
    #[case::link_capacity(GeometricGraph::new().with_nodes(10).with_links(41), TopologyErrorCode::LinkCapacityExceeded)]
    #[case::position_overflow(GeometricGraph::new().with_nodes(10).with_dimension(usize::MAX), TopologyErrorCode::GeometryTooLarge)]
    fn invalid_requests_are_rejected(
        #[case] generator: GeometricGraph,
        #[case] expected: TopologyErrorCode,
    ) {
        let mut network = BoundedNetwork::new(Capacity::new(20, 40, 2));
        let err = generator
            .build(&mut network, &mut seeded_rng(0))
            .expect_err("request must be rejected");
        assert_eq!(err.code(), expected);
    }

    #[rstest]
    fn repeated_builds_stay_within_budget() {
        let mut network = BoundedNetwork::new(Capacity::new(400, 800, 3));
        let mut rng = seeded_rng(5);
        let generator = GeometricGraph::new().with_state(NodeState::new(2));
        for _ in 0..3 {
            let summary = generator.build(&mut network, &mut rng).expect("within budget");
            assert_eq!(network.node_count(), 400);
            assert!(network.link_count() <= 800);
            assert_eq!(network.link_count(), summary.links);
        }
    }
}
