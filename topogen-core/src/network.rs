//! The capacity-bounded graph substrate the generators populate.
//!
//! [`Network`] is the capability surface the generators rely on.
//! [`BoundedNetwork`] is the in-memory implementation shipped with the crate.

use std::{collections::HashMap, fmt};

use rand::Rng;

use crate::error::NetworkError;

/// Stable identity of a node. Handles are never reused by a substrate.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct NodeHandle(u64);

impl NodeHandle {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Stable identity of a link.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct LinkHandle(u64);

impl LinkHandle {
    /// Returns the raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Dynamical state attached to a node.
///
/// State `0` is reserved; valid states lie in `1..max_states`.
///
/// # Examples
/// ```
/// use topogen_core::NodeState;
///
/// assert_eq!(NodeState::default(), NodeState::new(1));
/// assert_eq!(NodeState::new(3).get(), 3);
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeState(u32);

impl NodeState {
    /// Wraps a raw state value. Range checks happen against a [`Capacity`].
    #[must_use]
    pub const fn new(state: u32) -> Self {
        Self(state)
    }

    /// Returns the raw state value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for NodeState {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Hard limits of a substrate.
///
/// # Examples
/// ```
/// use topogen_core::{Capacity, NodeState};
///
/// let capacity = Capacity::new(100, 400, 3);
/// assert!(capacity.admits_state(NodeState::new(2)));
/// assert!(!capacity.admits_state(NodeState::new(0)));
/// assert!(!capacity.admits_state(NodeState::new(3)));
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Capacity {
    /// Maximum number of nodes.
    pub max_nodes: usize,
    /// Maximum number of links.
    pub max_links: usize,
    /// Number of distinct node states, including the reserved state `0`.
    pub max_states: u32,
}

impl Capacity {
    /// Bundles the three limits.
    #[must_use]
    pub const fn new(max_nodes: usize, max_links: usize, max_states: u32) -> Self {
        Self {
            max_nodes,
            max_links,
            max_states,
        }
    }

    /// Whether `state` lies in `1..max_states`.
    #[must_use]
    pub const fn admits_state(&self, state: NodeState) -> bool {
        state.0 >= 1 && state.0 < self.max_states
    }
}

/// A directed link between two nodes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Link {
    /// Tail of the link.
    pub source: NodeHandle,
    /// Head of the link.
    pub target: NodeHandle,
}

impl Link {
    /// Whether both endpoints are the same node.
    #[must_use]
    pub fn is_loop(&self) -> bool {
        self.source == self.target
    }

    fn other(&self, node: NodeHandle) -> NodeHandle {
        if self.source == node {
            self.target
        } else {
            self.source
        }
    }
}

/// Capability surface of a capacity-bounded graph substrate.
///
/// Positions are 1-based and follow creation order; implementations with
/// O(1) node destruction may move the last node into a freed position.
pub trait Network {
    /// Returns the hard limits of the substrate.
    fn capacity(&self) -> Capacity;

    /// Returns the number of live nodes.
    fn node_count(&self) -> usize;

    /// Returns the number of live links.
    fn link_count(&self) -> usize;

    /// Removes a node together with its incident links.
    ///
    /// # Errors
    /// Returns [`NetworkError::UnknownNode`] for a handle that is not live.
    fn destroy_node(&mut self, node: NodeHandle) -> Result<(), NetworkError>;

    /// Appends `count` nodes, all in `state`.
    ///
    /// # Errors
    /// Returns [`NetworkError::NodeCapacity`] or
    /// [`NetworkError::InvalidState`] without creating any node.
    fn create_nodes(&mut self, count: usize, state: NodeState) -> Result<(), NetworkError>;

    /// Creates a link from `source` to `target`.
    ///
    /// # Errors
    /// Returns [`NetworkError::LinkCapacity`] when the substrate is full and
    /// [`NetworkError::UnknownNode`] for a dead endpoint.
    fn create_link(
        &mut self,
        source: NodeHandle,
        target: NodeHandle,
    ) -> Result<LinkHandle, NetworkError>;

    /// Returns the node at 1-based `position`.
    fn node_at(&self, position: usize) -> Option<NodeHandle>;

    /// Returns a uniformly random live node, optionally restricted to
    /// nodes in `state`.
    fn random_node<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        state: Option<NodeState>,
    ) -> Option<NodeHandle>;
}

#[derive(Debug, Clone)]
struct NodeRecord {
    handle: NodeHandle,
    state: NodeState,
    incident: Vec<LinkHandle>,
}

/// In-memory [`Network`] with O(1) node lookup by handle and by position.
///
/// # Examples
/// ```
/// use topogen_core::{BoundedNetwork, Capacity, Network, NodeState};
///
/// let mut network = BoundedNetwork::new(Capacity::new(4, 4, 2));
/// network.create_nodes(2, NodeState::default())?;
/// let a = network.node_at(1).expect("first node");
/// let b = network.node_at(2).expect("second node");
/// network.create_link(a, b)?;
/// assert_eq!(network.degree(a), Some(1));
/// network.destroy_node(b)?;
/// assert_eq!(network.link_count(), 0);
/// # Ok::<(), topogen_core::NetworkError>(())
/// ```
#[derive(Debug, Clone)]
pub struct BoundedNetwork {
    capacity: Capacity,
    nodes: Vec<NodeRecord>,
    slots: HashMap<NodeHandle, usize>,
    links: HashMap<LinkHandle, Link>,
    next_node: u64,
    next_link: u64,
}

impl BoundedNetwork {
    /// Creates an empty substrate with the given limits.
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        Self {
            capacity,
            nodes: Vec::new(),
            slots: HashMap::new(),
            links: HashMap::new(),
            next_node: 0,
            next_link: 0,
        }
    }

    /// Returns the state of `node`.
    #[must_use]
    pub fn state(&self, node: NodeHandle) -> Option<NodeState> {
        self.record(node).map(|record| record.state)
    }

    /// Returns the number of link endpoints at `node`. A self-loop counts
    /// twice.
    #[must_use]
    pub fn degree(&self, node: NodeHandle) -> Option<usize> {
        self.record(node).map(|record| record.incident.len())
    }

    /// Returns the 1-based position of `node`.
    #[must_use]
    pub fn position(&self, node: NodeHandle) -> Option<usize> {
        self.slots.get(&node).map(|&slot| slot + 1)
    }

    /// Iterates over live nodes in position order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeHandle> + '_ {
        self.nodes.iter().map(|record| record.handle)
    }

    /// Iterates over live links in unspecified order.
    pub fn links(&self) -> impl Iterator<Item = Link> + '_ {
        self.links.values().copied()
    }

    /// Whether some link connects `a` and `b` in either direction.
    #[must_use]
    pub fn connected(&self, a: NodeHandle, b: NodeHandle) -> bool {
        self.record(a).is_some_and(|record| {
            record.incident.iter().any(|handle| {
                self.links
                    .get(handle)
                    .is_some_and(|link| link.other(a) == b)
            })
        })
    }

    fn record(&self, node: NodeHandle) -> Option<&NodeRecord> {
        self.slots.get(&node).and_then(|&slot| self.nodes.get(slot))
    }

    fn record_mut(&mut self, node: NodeHandle) -> Result<&mut NodeRecord, NetworkError> {
        let slot = *self
            .slots
            .get(&node)
            .ok_or(NetworkError::UnknownNode { handle: node })?;
        self.nodes
            .get_mut(slot)
            .ok_or(NetworkError::UnknownNode { handle: node })
    }

    fn detach(&mut self, node: NodeHandle, link: LinkHandle) {
        if let Ok(record) = self.record_mut(node)
            && let Some(at) = record.incident.iter().position(|&h| h == link)
        {
            record.incident.swap_remove(at);
        }
    }
}

impl Network for BoundedNetwork {
    fn capacity(&self) -> Capacity {
        self.capacity
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn link_count(&self) -> usize {
        self.links.len()
    }

    fn destroy_node(&mut self, node: NodeHandle) -> Result<(), NetworkError> {
        let slot = self
            .slots
            .remove(&node)
            .ok_or(NetworkError::UnknownNode { handle: node })?;
        let removed = self.nodes.swap_remove(slot);
        if let Some(moved) = self.nodes.get(slot) {
            self.slots.insert(moved.handle, slot);
        }
        for handle in removed.incident {
            // A self-loop appears twice in the list; the second lookup misses.
            let Some(link) = self.links.remove(&handle) else {
                continue;
            };
            let other = link.other(node);
            if other != node {
                self.detach(other, handle);
            }
        }
        Ok(())
    }

    fn create_nodes(&mut self, count: usize, state: NodeState) -> Result<(), NetworkError> {
        if !self.capacity.admits_state(state) {
            return Err(NetworkError::InvalidState {
                state: state.get(),
                max_states: self.capacity.max_states,
            });
        }
        let requested = self.nodes.len().saturating_add(count);
        if requested > self.capacity.max_nodes {
            return Err(NetworkError::NodeCapacity {
                requested,
                capacity: self.capacity.max_nodes,
            });
        }
        self.nodes.reserve(count);
        self.slots.reserve(count);
        for _ in 0..count {
            let handle = NodeHandle(self.next_node);
            self.next_node += 1;
            self.slots.insert(handle, self.nodes.len());
            self.nodes.push(NodeRecord {
                handle,
                state,
                incident: Vec::new(),
            });
        }
        Ok(())
    }

    fn create_link(
        &mut self,
        source: NodeHandle,
        target: NodeHandle,
    ) -> Result<LinkHandle, NetworkError> {
        if self.links.len() >= self.capacity.max_links {
            return Err(NetworkError::LinkCapacity {
                capacity: self.capacity.max_links,
            });
        }
        for endpoint in [source, target] {
            if !self.slots.contains_key(&endpoint) {
                return Err(NetworkError::UnknownNode { handle: endpoint });
            }
        }
        let handle = LinkHandle(self.next_link);
        self.next_link += 1;
        self.links.insert(handle, Link { source, target });
        self.record_mut(source)?.incident.push(handle);
        self.record_mut(target)?.incident.push(handle);
        Ok(handle)
    }

    fn node_at(&self, position: usize) -> Option<NodeHandle> {
        position
            .checked_sub(1)
            .and_then(|slot| self.nodes.get(slot))
            .map(|record| record.handle)
    }

    fn random_node<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        state: Option<NodeState>,
    ) -> Option<NodeHandle> {
        match state {
            None => {
                if self.nodes.is_empty() {
                    return None;
                }
                let slot = rng.gen_range(0..self.nodes.len());
                self.nodes.get(slot).map(|record| record.handle)
            }
            Some(wanted) => {
                let matching = self
                    .nodes
                    .iter()
                    .filter(|record| record.state == wanted)
                    .count();
                if matching == 0 {
                    return None;
                }
                let pick = rng.gen_range(0..matching);
                self.nodes
                    .iter()
                    .filter(|record| record.state == wanted)
                    .nth(pick)
                    .map(|record| record.handle)
            }
        }
    }
}
