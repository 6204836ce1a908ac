//! Topology generators for capacity-bounded graph substrates.
//!
//! Each generator is a configuration value with `with_*` setters and a
//! `build(&mut network, &mut rng)` method. Builds validate the request
//! against the substrate's [`Capacity`] first, then reset the substrate and
//! construct the new topology, so a rejected request leaves the previous
//! topology in place. [`BudgetCheck::DuringConstruction`] and
//! [`MatrixStrictness::UpperOnly`] opt out of that guarantee.
//!
//! Randomness is always passed in explicitly; a seeded [`rand::rngs::SmallRng`]
//! makes every build reproducible.
#![cfg_attr(docsrs, feature(doc_cfg))]

mod adjacency;
mod configuration;
mod erdos_renyi;
mod error;
mod generator;
mod geometric;
mod lattice;
mod network;
mod partition;
mod regular;
mod reset;
mod stubs;
mod telemetry;

#[cfg(test)]
mod test_utils;

pub use crate::{
    adjacency::{AdjacencyImport, AdjacencyPlan, MatrixStrictness, Truthy},
    configuration::{ConfigurationModel, DirectedConfigurationModel},
    erdos_renyi::{ErdosRenyi, ErdosRenyiPlan},
    error::{NetworkError, NetworkErrorCode, Result, TopologyError, TopologyErrorCode},
    generator::{BuildSummary, Topology},
    geometric::{BudgetCheck, GeometricGraph, GeometricPlan, connection_radius, double_factorial},
    lattice::{Lattice, LatticeDims, LatticePlan, Periodicity},
    network::{BoundedNetwork, Capacity, Link, LinkHandle, Network, NodeHandle, NodeState},
    partition::DegreeSequence,
    regular::{RegularGraph, RegularPlan},
    reset::reset,
    stubs::StubList,
};
