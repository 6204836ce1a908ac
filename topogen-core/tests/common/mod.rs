use rand::{Rng, SeedableRng, rngs::SmallRng};
use topogen_core::{
    BoundedNetwork, Capacity, LinkHandle, Network, NetworkError, NodeHandle, NodeState,
};

/// Seeded generator shared by the integration suites.
#[must_use]
pub fn rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Substrate wrapper counting every mutating call.
#[derive(Debug)]
pub struct CountingNetwork {
    inner: BoundedNetwork,
    mutations: usize,
}

impl CountingNetwork {
    #[must_use]
    pub fn new(capacity: Capacity) -> Self {
        Self {
            inner: BoundedNetwork::new(capacity),
            mutations: 0,
        }
    }

    #[must_use]
    pub fn mutations(&self) -> usize {
        self.mutations
    }

    #[must_use]
    pub fn inner(&self) -> &BoundedNetwork {
        &self.inner
    }
}

impl Network for CountingNetwork {
    fn capacity(&self) -> Capacity {
        self.inner.capacity()
    }

    fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    fn link_count(&self) -> usize {
        self.inner.link_count()
    }

    fn destroy_node(&mut self, node: NodeHandle) -> Result<(), NetworkError> {
        self.mutations += 1;
        self.inner.destroy_node(node)
    }

    fn create_nodes(&mut self, count: usize, state: NodeState) -> Result<(), NetworkError> {
        self.mutations += 1;
        self.inner.create_nodes(count, state)
    }

    fn create_link(
        &mut self,
        source: NodeHandle,
        target: NodeHandle,
    ) -> Result<LinkHandle, NetworkError> {
        self.mutations += 1;
        self.inner.create_link(source, target)
    }

    fn node_at(&self, position: usize) -> Option<NodeHandle> {
        self.inner.node_at(position)
    }

    fn random_node<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        state: Option<NodeState>,
    ) -> Option<NodeHandle> {
        self.inner.random_node(rng, state)
    }
}
