//! Degree-sequence partitioning for the configuration model.
//!
//! Converts a probability mass over degrees into integer node counts. Each
//! count is rounded down, so the realised distribution can trail the
//! request slightly; the nodes left over receive degree zero.

use crate::{
    Result,
    error::TopologyError,
    generator::{check_link_capacity, check_node_capacity},
    network::Capacity,
};

/// Slack allowed when checking that the masses sum to at most one.
const MASS_TOLERANCE: f64 = 1e-9;

/// Per-degree node counts derived from a probability mass.
///
/// # Examples
/// ```
/// use topogen_core::{Capacity, DegreeSequence};
///
/// let capacity = Capacity::new(200, 1_000, 2);
/// let sequence = DegreeSequence::partition(200, &[0.5, 0.25, 0.25], &capacity)?;
/// assert_eq!(sequence.count(1), 100);
/// assert_eq!(sequence.count(3), 50);
/// assert_eq!(sequence.total_stubs(), 350);
/// assert_eq!(sequence.links(), 175);
/// # Ok::<(), topogen_core::TopologyError>(())
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DegreeSequence {
    /// `counts[k - 1]` nodes have degree `k`.
    counts: Vec<usize>,
    zero_degree: usize,
    total_stubs: usize,
}

impl DegreeSequence {
    /// Partitions `nodes` according to `masses`, where `masses[k - 1]` is the
    /// fraction of nodes with degree `k`.
    ///
    /// # Errors
    /// Returns [`TopologyError::InvalidDegreeDistribution`] for negative or
    /// non-finite masses or masses summing past one,
    /// [`TopologyError::NodeCapacityExceeded`] when `nodes` exceeds the node
    /// capacity, and [`TopologyError::LinkCapacityExceeded`] when the stubs
    /// would pair into more links than the substrate holds.
    pub fn partition(nodes: usize, masses: &[f64], capacity: &Capacity) -> Result<Self> {
        validate_masses(masses)?;
        check_node_capacity(nodes, capacity)?;

        let scale = nodes as f64;
        let counts: Vec<usize> = masses
            .iter()
            .map(|&mass| (mass * scale + MASS_TOLERANCE).floor() as usize)
            .collect();
        let assigned: usize = counts.iter().sum();
        let zero_degree = nodes.checked_sub(assigned).ok_or_else(|| {
            TopologyError::InvalidDegreeDistribution {
                reason: format!("masses assign {assigned} of {nodes} nodes"),
            }
        })?;

        let total_stubs = counts
            .iter()
            .zip(1_usize..)
            .try_fold(0_usize, |total, (&count, degree)| {
                count
                    .checked_mul(degree)
                    .and_then(|stubs| total.checked_add(stubs))
            })
            .ok_or(TopologyError::LinkCapacityExceeded {
                requested: usize::MAX,
                capacity: capacity.max_links,
            })?;
        check_link_capacity(total_stubs / 2, capacity)?;

        Ok(Self {
            counts,
            zero_degree,
            total_stubs,
        })
    }

    /// Number of nodes with degree `degree`.
    #[must_use]
    pub fn count(&self, degree: usize) -> usize {
        match degree {
            0 => self.zero_degree,
            k => self.counts.get(k - 1).copied().unwrap_or(0),
        }
    }

    /// Total number of nodes, including degree-zero nodes.
    #[must_use]
    pub fn nodes(&self) -> usize {
        self.counts.iter().sum::<usize>() + self.zero_degree
    }

    /// Sum of all target degrees.
    #[must_use]
    pub fn total_stubs(&self) -> usize {
        self.total_stubs
    }

    /// Links produced by pairing the stubs; an odd stub is dropped.
    #[must_use]
    pub fn links(&self) -> usize {
        self.total_stubs / 2
    }

    /// Target degree of each node in position order: ascending degrees
    /// first, degree-zero nodes last.
    pub fn degrees(&self) -> impl Iterator<Item = usize> + Clone + '_ {
        self.counts
            .iter()
            .zip(1_usize..)
            .flat_map(|(&count, degree)| std::iter::repeat_n(degree, count))
            .chain(std::iter::repeat_n(0, self.zero_degree))
    }
}

fn validate_masses(masses: &[f64]) -> Result<()> {
    if let Some((index, mass)) = masses
        .iter()
        .enumerate()
        .find(|(_, mass)| !mass.is_finite() || **mass < 0.0)
    {
        return Err(TopologyError::InvalidDegreeDistribution {
            reason: format!("mass {mass} for degree {} is not a probability", index + 1),
        });
    }
    let total: f64 = masses.iter().sum();
    if total > 1.0 + MASS_TOLERANCE {
        return Err(TopologyError::InvalidDegreeDistribution {
            reason: format!("masses sum to {total}, more than 1"),
        });
    }
    Ok(())
}
