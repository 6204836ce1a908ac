//! Error types for the topology generators and the network substrate.
//!
//! Every generator failure is an invalid request: the caller corrects the
//! parameters and calls again. Each variant carries a stable machine-readable
//! code so front ends can report failures without matching on messages.

use std::fmt;

use thiserror::Error;

use crate::network::NodeHandle;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// An error produced by a [`crate::Network`] substrate.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum NetworkError {
    /// The handle does not name a live node.
    #[error("node {handle} does not exist")]
    UnknownNode {
        /// The stale or foreign handle.
        handle: NodeHandle,
    },
    /// Creating the nodes would exceed the node capacity.
    #[error("cannot hold {requested} nodes (capacity {capacity})")]
    NodeCapacity {
        /// Node count after the rejected operation.
        requested: usize,
        /// Maximum number of nodes.
        capacity: usize,
    },
    /// Creating the link would exceed the link capacity.
    #[error("cannot hold more than {capacity} links")]
    LinkCapacity {
        /// Maximum number of links.
        capacity: usize,
    },
    /// The state is reserved or outside the configured state range.
    #[error("state {state} is outside 1..{max_states}")]
    InvalidState {
        /// The rejected state.
        state: u32,
        /// Number of distinct states, including the reserved state 0.
        max_states: u32,
    },
    /// No node occupies the position.
    #[error("no node at position {position}")]
    MissingPosition {
        /// The 1-based position that was looked up.
        position: usize,
    },
}

define_error_codes! {
    /// Stable codes describing [`NetworkError`] variants.
    enum NetworkErrorCode for NetworkError {
        /// The handle does not name a live node.
        UnknownNode => UnknownNode { .. } => "NETWORK_UNKNOWN_NODE",
        /// Creating the nodes would exceed the node capacity.
        NodeCapacity => NodeCapacity { .. } => "NETWORK_NODE_CAPACITY",
        /// Creating the link would exceed the link capacity.
        LinkCapacity => LinkCapacity { .. } => "NETWORK_LINK_CAPACITY",
        /// The state is reserved or outside the configured state range.
        InvalidState => InvalidState { .. } => "NETWORK_INVALID_STATE",
        /// No node occupies the position.
        MissingPosition => MissingPosition { .. } => "NETWORK_MISSING_POSITION",
    }
}

/// Error returned when a topology request is rejected.
#[non_exhaustive]
#[derive(Clone, Debug, Error, PartialEq)]
pub enum TopologyError {
    /// More nodes were requested than the substrate can hold.
    #[error("{requested} nodes requested but the network holds at most {capacity}")]
    NodeCapacityExceeded {
        /// Requested node count.
        requested: usize,
        /// Node capacity of the substrate.
        capacity: usize,
    },
    /// More links were requested than the substrate can hold.
    #[error("{requested} links requested but the network holds at most {capacity}")]
    LinkCapacityExceeded {
        /// Requested or derived link count.
        requested: usize,
        /// Link capacity of the substrate.
        capacity: usize,
    },
    /// Links were requested for a graph without nodes.
    #[error("cannot place {links} links without any nodes")]
    LinksWithoutNodes {
        /// Requested link count.
        links: usize,
    },
    /// The model needs at least one node.
    #[error("the {model} model needs at least one node")]
    NoNodes {
        /// Model that was requested.
        model: &'static str,
    },
    /// The node state is reserved or outside the substrate's state range.
    #[error("node state {state} is outside 1..{max_states}")]
    InvalidState {
        /// Requested state.
        state: u32,
        /// Number of distinct states, including the reserved state 0.
        max_states: u32,
    },
    /// The degree probability masses are negative, non-finite or sum past 1.
    #[error("invalid degree distribution: {reason}")]
    InvalidDegreeDistribution {
        /// Explanation of the rejected distribution.
        reason: String,
    },
    /// Both the degree and the node count are odd.
    #[error("no regular graph has odd degree {degree} and an odd node count {nodes}")]
    OddDegreeOddNodes {
        /// Requested degree.
        degree: usize,
        /// Requested node count.
        nodes: usize,
    },
    /// The lattice has no axes.
    #[error("a lattice needs at least one axis")]
    EmptyLattice,
    /// A lattice axis has length zero.
    #[error("lattice axis {axis} has length zero")]
    ZeroLengthAxis {
        /// Zero-based axis index.
        axis: usize,
    },
    /// The periodicity flags do not match the lattice axes.
    #[error("{periodic} periodicity flags given for {axes} lattice axes")]
    PeriodicityMismatch {
        /// Number of lattice axes.
        axes: usize,
        /// Number of periodicity flags.
        periodic: usize,
    },
    /// The lattice size overflows the address space.
    #[error("lattice size overflows usize")]
    LatticeTooLarge,
    /// The adjacency matrix is not square.
    #[error("adjacency matrix row {row} has {len} entries but the matrix has {rows} rows")]
    NonSquareMatrix {
        /// Number of rows.
        rows: usize,
        /// Offending row.
        row: usize,
        /// Length of the offending row.
        len: usize,
    },
    /// An adjacency entry has no truth value.
    #[error("adjacency entry ({row}, {column}) is not convertible to a truth value")]
    NotTruthConvertible {
        /// Zero-based row.
        row: usize,
        /// Zero-based column.
        column: usize,
    },
    /// The embedding dimension must be positive.
    #[error("embedding dimension must be at least 1 (got {got})")]
    InvalidDimension {
        /// Requested dimension.
        got: usize,
    },
    /// The target mean degree must be finite and non-negative.
    #[error("mean degree must be finite and non-negative (got {got})")]
    InvalidMeanDegree {
        /// Requested mean degree.
        got: f64,
    },
    /// The node positions do not fit in memory.
    #[error("{nodes} nodes in {dimension} dimensions overflow the position buffer")]
    GeometryTooLarge {
        /// Requested node count.
        nodes: usize,
        /// Requested embedding dimension.
        dimension: usize,
    },
    /// Construction produced more links than the configured budget.
    #[error("geometric construction exceeded the link budget of {budget}")]
    LinkBudgetExceeded {
        /// Configured link budget.
        budget: usize,
        /// Whether links were already created when the overrun was detected.
        partial: bool,
    },
    /// The substrate rejected an operation.
    #[error("network operation failed: {source}")]
    Network {
        /// Underlying substrate error.
        #[from]
        source: NetworkError,
    },
    /// The requested capability does not exist yet.
    #[error("{capability} is not implemented")]
    NotImplemented {
        /// Name of the missing capability.
        capability: &'static str,
    },
}

define_error_codes! {
    /// Stable codes describing [`TopologyError`] variants.
    enum TopologyErrorCode for TopologyError {
        /// More nodes were requested than the substrate can hold.
        NodeCapacityExceeded => NodeCapacityExceeded { .. } => "TOPOLOGY_NODE_CAPACITY_EXCEEDED",
        /// More links were requested than the substrate can hold.
        LinkCapacityExceeded => LinkCapacityExceeded { .. } => "TOPOLOGY_LINK_CAPACITY_EXCEEDED",
        /// Links were requested for a graph without nodes.
        LinksWithoutNodes => LinksWithoutNodes { .. } => "TOPOLOGY_LINKS_WITHOUT_NODES",
        /// The model needs at least one node.
        NoNodes => NoNodes { .. } => "TOPOLOGY_NO_NODES",
        /// The node state is outside the substrate's state range.
        InvalidState => InvalidState { .. } => "TOPOLOGY_INVALID_STATE",
        /// The degree probability masses are invalid.
        InvalidDegreeDistribution => InvalidDegreeDistribution { .. } => "TOPOLOGY_INVALID_DEGREE_DISTRIBUTION",
        /// Both the degree and the node count are odd.
        OddDegreeOddNodes => OddDegreeOddNodes { .. } => "TOPOLOGY_ODD_DEGREE_ODD_NODES",
        /// The lattice has no axes.
        EmptyLattice => EmptyLattice => "TOPOLOGY_EMPTY_LATTICE",
        /// A lattice axis has length zero.
        ZeroLengthAxis => ZeroLengthAxis { .. } => "TOPOLOGY_ZERO_LENGTH_AXIS",
        /// The periodicity flags do not match the lattice axes.
        PeriodicityMismatch => PeriodicityMismatch { .. } => "TOPOLOGY_PERIODICITY_MISMATCH",
        /// The lattice size overflows the address space.
        LatticeTooLarge => LatticeTooLarge => "TOPOLOGY_LATTICE_TOO_LARGE",
        /// The adjacency matrix is not square.
        NonSquareMatrix => NonSquareMatrix { .. } => "TOPOLOGY_NON_SQUARE_MATRIX",
        /// An adjacency entry has no truth value.
        NotTruthConvertible => NotTruthConvertible { .. } => "TOPOLOGY_NOT_TRUTH_CONVERTIBLE",
        /// The embedding dimension must be positive.
        InvalidDimension => InvalidDimension { .. } => "TOPOLOGY_INVALID_DIMENSION",
        /// The target mean degree is invalid.
        InvalidMeanDegree => InvalidMeanDegree { .. } => "TOPOLOGY_INVALID_MEAN_DEGREE",
        /// The node positions do not fit in memory.
        GeometryTooLarge => GeometryTooLarge { .. } => "TOPOLOGY_GEOMETRY_TOO_LARGE",
        /// Construction produced more links than the configured budget.
        LinkBudgetExceeded => LinkBudgetExceeded { .. } => "TOPOLOGY_LINK_BUDGET_EXCEEDED",
        /// The substrate rejected an operation.
        NetworkFailure => Network { .. } => "TOPOLOGY_NETWORK_FAILURE",
        /// The requested capability does not exist yet.
        NotImplemented => NotImplemented { .. } => "TOPOLOGY_NOT_IMPLEMENTED",
    }
}

impl TopologyError {
    /// Retrieve the inner [`NetworkErrorCode`] when the substrate failed.
    pub const fn network_code(&self) -> Option<NetworkErrorCode> {
        match self {
            Self::Network { source } => Some(source.code()),
            _ => None,
        }
    }

    /// Whether the substrate may hold a partially built topology after this
    /// error.
    ///
    /// Validation failures are raised before the substrate is touched.
    /// Substrate failures and budget overruns detected during construction
    /// happen after the reset.
    #[must_use]
    pub const fn left_partial_topology(&self) -> bool {
        match self {
            Self::LinkBudgetExceeded { partial, .. } => *partial,
            Self::Network { .. } => true,
            _ => false,
        }
    }
}

/// Convenient alias for results returned by the generators.
pub type Result<T> = core::result::Result<T, TopologyError>;
