use std::net::Ipv4Addr;

use log::info;

use crate::{Core, RouterId, SharedCore};

/// A router heard on a directly attached link. Owned by the interface
/// it was discovered on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Neighbor {
    pub rid: RouterId,
    /// The neighbor's address on the shared link.
    pub ip: Ipv4Addr,
    /// Subnet mask advertised by the neighbor.
    pub mask: Ipv4Addr,
    /// Seconds of life left; refreshed on every HELLO.
    pub alive: u16,
}

/// One aging pass: every neighbor loses a second of life, and the ones
/// that hit zero are unlinked. Expiry dirties the topology.
pub fn age_neighbors(core: &mut Core) {
    for iface in &mut core.interfaces {
        let before = iface.neighbors.len();
        iface.neighbors.retain_mut(|nbr| {
            nbr.alive -= 1;
            if nbr.alive == 0 {
                info!("neighbor {} timed out on {}", Ipv4Addr::from(nbr.rid), iface.name);
                false
            } else {
                true
            }
        });
        if iface.neighbors.len() != before {
            core.topology_dirty = true;
        }
    }
}

pub async fn aging_task(core: SharedCore) {
    loop {
        super::tick().await;
        let mut core = core.lock().await;
        age_neighbors(&mut core);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Interface;
    use crate::protocol::NEIGHBOR_TIMEOUT;
    use pnet::util::MacAddr;

    fn iface_with_neighbor(alive: u16) -> Interface {
        let mut iface = Interface::new(
            "eth0".into(),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(255, 255, 255, 0),
            MacAddr::zero(),
        );
        iface.neighbors.push(Neighbor {
            rid: u32::from(Ipv4Addr::new(10, 0, 0, 2)),
            ip: Ipv4Addr::new(10, 0, 0, 2),
            mask: Ipv4Addr::new(255, 255, 255, 0),
            alive,
        });
        iface
    }

    #[test]
    fn expires_exactly_at_zero() {
        let mut core = Core::new(vec![iface_with_neighbor(2)], 30);

        age_neighbors(&mut core);
        assert_eq!(core.interfaces[0].neighbors.len(), 1);
        assert_eq!(core.interfaces[0].neighbors[0].alive, 1);
        assert!(!core.topology_dirty);

        age_neighbors(&mut core);
        assert!(core.interfaces[0].neighbors.is_empty());
        assert!(core.topology_dirty);
    }

    #[test]
    fn alive_stays_within_bounds() {
        let mut core = Core::new(vec![iface_with_neighbor(NEIGHBOR_TIMEOUT)], 30);
        for _ in 0..NEIGHBOR_TIMEOUT - 1 {
            age_neighbors(&mut core);
            for nbr in &core.interfaces[0].neighbors {
                assert!(nbr.alive > 0 && nbr.alive <= NEIGHBOR_TIMEOUT);
            }
        }
        age_neighbors(&mut core);
        assert!(core.interfaces[0].neighbors.is_empty());
    }
}
