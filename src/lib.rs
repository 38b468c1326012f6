pub mod algorithms;
pub mod config;
pub mod network;
pub mod protocol;
pub mod wire;

use std::net::Ipv4Addr;
use std::sync::Arc;
use tokio::sync::Mutex;

use network::Interface;
use protocol::lsdb::Lsdb;

pub type RouterId = u32;
pub type AreaId = u32;

/// All protocol state of the daemon, guarded by one coarse lock.
///
/// The routing table is deliberately *not* part of this struct: it lives
/// behind its own lock, and every path that needs both takes the core
/// lock first.
pub struct Core {
    pub router_id: RouterId,
    pub area_id: AreaId,
    pub sequence_num: u16,
    /// LSU refresh interval in seconds.
    pub lsuint: u16,
    /// Seconds left until the next periodic LSU refresh.
    pub left_interval: u16,
    /// Set whenever a neighbor appears or expires; consumed by the LSU
    /// generator together with the self-LSA rebuild.
    pub topology_dirty: bool,
    pub interfaces: Vec<Interface>,
    pub lsdb: Lsdb,
}

impl Core {
    /// The router id is the first interface's IPv4 address.
    pub fn new(interfaces: Vec<Interface>, lsuint: u16) -> Self {
        let router_id = interfaces
            .first()
            .map(|iface| u32::from(iface.ip))
            .unwrap_or(0);

        Self {
            router_id,
            area_id: 0,
            sequence_num: 0,
            lsuint,
            left_interval: lsuint,
            topology_dirty: false,
            interfaces,
            lsdb: Lsdb::new(),
        }
    }

    pub fn iface(&self, name: &str) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.name == name)
    }

    pub fn iface_mut(&mut self, name: &str) -> Option<&mut Interface> {
        self.interfaces.iter_mut().find(|iface| iface.name == name)
    }

    /// The interface on which the given gateway router is known as a
    /// neighbor.
    pub fn gw_to_iface(&self, gw: RouterId) -> Option<&Interface> {
        self.interfaces
            .iter()
            .find(|iface| iface.neighbors.iter().any(|nbr| nbr.rid == gw))
    }

    /// The interface whose attached subnet equals the given one.
    pub fn subnet_to_iface(&self, subnet: Ipv4Addr) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| iface.subnet() == subnet)
    }
}

pub type SharedCore = Arc<Mutex<Core>>;
