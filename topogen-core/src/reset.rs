//! Clearing a substrate before a generator replaces its topology.

use tracing::debug;

use crate::{error::NetworkError, network::Network};

/// Destroys every node, and with them every link, until the substrate is
/// empty. Calling it on an empty substrate does nothing.
///
/// Nodes are removed from the last position so substrates that compact by
/// moving the last node never need to move anything.
///
/// # Errors
/// Propagates any [`NetworkError`] raised by [`Network::destroy_node`].
///
/// # Examples
/// ```
/// use topogen_core::{BoundedNetwork, Capacity, Network, NodeState, reset};
///
/// let mut network = BoundedNetwork::new(Capacity::new(3, 3, 2));
/// network.create_nodes(3, NodeState::default())?;
/// reset(&mut network)?;
/// assert_eq!(network.node_count(), 0);
/// reset(&mut network)?;
/// # Ok::<(), topogen_core::NetworkError>(())
/// ```
pub fn reset<N: Network + ?Sized>(network: &mut N) -> Result<(), NetworkError> {
    let nodes = network.node_count();
    while let Some(node) = network.node_at(network.node_count()) {
        network.destroy_node(node)?;
    }
    if nodes > 0 {
        debug!(nodes, "network reset");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{BoundedNetwork, Capacity, NodeState};

    #[test]
    fn reset_clears_nodes_and_links() {
        let mut network = BoundedNetwork::new(Capacity::new(5, 5, 2));
        network
            .create_nodes(5, NodeState::default())
            .expect("capacity suffices");
        let nodes: Vec<_> = network.nodes().collect();
        for pair in nodes.windows(2) {
            network.create_link(pair[0], pair[1]).expect("link");
        }

        reset(&mut network).expect("reset succeeds");

        assert_eq!(network.node_count(), 0);
        assert_eq!(network.link_count(), 0);
    }

    #[test]
    fn reset_on_empty_network_is_a_no_op() {
        let mut network = BoundedNetwork::new(Capacity::new(1, 1, 2));
        reset(&mut network).expect("reset succeeds");
        reset(&mut network).expect("reset stays idempotent");
        assert_eq!(network.node_count(), 0);
    }
}
