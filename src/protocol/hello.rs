//! HELLO emission and handling.

use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::Mutex;
use tokio::time;

use crate::network::{Interface, PacketTx};
use crate::wire::builder::MospfFrame;
use crate::wire::ethernet::ALL_SPF_ROUTERS_MAC;
use crate::wire::mospf::{Hello, MospfPacket, ALL_SPF_ROUTERS};
use crate::{Core, RouterId, SharedCore};

use super::routing_table::RoutingTable;
use super::{Neighbor, HELLO_IP_TTL, NEIGHBOR_TIMEOUT};

/// Hello cycles between routing-table dumps.
const DUMP_PERIOD: u64 = 4;

/// Builds the multicast HELLO frame for one interface.
pub fn build_hello(core: &Core, iface: &Interface) -> Vec<u8> {
    let packet = MospfPacket::hello(core.router_id, core.area_id, iface.mask, iface.hello_interval);
    MospfFrame {
        src_mac: iface.mac,
        dst_mac: ALL_SPF_ROUTERS_MAC,
        src_ip: iface.ip,
        dst_ip: ALL_SPF_ROUTERS,
        ip_ttl: HELLO_IP_TTL,
        packet: &packet,
    }
    .build()
}

/// One emission pass over every interface, under the core lock.
pub fn emit_hellos(core: &Core, tx: &dyn PacketTx) {
    for iface in &core.interfaces {
        tx.send(iface, &build_hello(core, iface));
    }
}

/// A HELLO from `rid` on `iface_name`: refresh the neighbor if it is
/// already known there, otherwise create it and dirty the topology.
pub fn handle_hello(core: &mut Core, iface_name: &str, src_ip: Ipv4Addr, rid: RouterId, hello: &Hello) {
    let Some(iface) = core.iface_mut(iface_name) else {
        return;
    };

    if let Some(nbr) = iface.neighbor_mut(rid) {
        nbr.alive = NEIGHBOR_TIMEOUT;
        return;
    }

    info!(
        "new neighbor {} ({}) on {}",
        Ipv4Addr::from(rid),
        src_ip,
        iface.name
    );
    iface.neighbors.push(Neighbor {
        rid,
        ip: src_ip,
        mask: hello.mask,
        alive: NEIGHBOR_TIMEOUT,
    });
    core.topology_dirty = true;
}

/// Emits HELLOs every `period`, dumping the routing table every fourth
/// cycle as a debugging aid.
pub async fn hello_task(
    core: SharedCore,
    rtable: Arc<Mutex<RoutingTable>>,
    tx: Arc<dyn PacketTx>,
    period: Duration,
) {
    let mut cycle: u64 = 0;
    loop {
        time::sleep(period).await;

        let core = core.lock().await;
        emit_hellos(&core, tx.as_ref());
        debug!("sent HELLO on {} interface(s)", core.interfaces.len());

        cycle += 1;
        if cycle % DUMP_PERIOD == 0 {
            // Lock order: core first, then the routing table.
            let rtable = rtable.lock().await;
            info!("routing table:\n{}", *rtable);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnet::util::MacAddr;

    fn core_with_iface() -> Core {
        let iface = Interface::new(
            "eth0".into(),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(255, 255, 255, 0),
            MacAddr::zero(),
        );
        Core::new(vec![iface], 30)
    }

    #[test]
    fn first_hello_creates_neighbor_and_dirties() {
        let mut core = core_with_iface();
        let hello = Hello {
            mask: Ipv4Addr::new(255, 255, 255, 0),
            helloint: 5,
        };

        handle_hello(
            &mut core,
            "eth0",
            Ipv4Addr::new(10, 0, 0, 2),
            u32::from(Ipv4Addr::new(10, 0, 0, 2)),
            &hello,
        );

        assert!(core.topology_dirty);
        let nbr = &core.interfaces[0].neighbors[0];
        assert_eq!(nbr.ip, Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(nbr.alive, NEIGHBOR_TIMEOUT);
    }

    #[test]
    fn repeat_hello_only_refreshes() {
        let mut core = core_with_iface();
        let hello = Hello {
            mask: Ipv4Addr::new(255, 255, 255, 0),
            helloint: 5,
        };
        let rid = u32::from(Ipv4Addr::new(10, 0, 0, 2));

        handle_hello(&mut core, "eth0", Ipv4Addr::new(10, 0, 0, 2), rid, &hello);
        core.topology_dirty = false;
        core.interfaces[0].neighbors[0].alive = 1;

        handle_hello(&mut core, "eth0", Ipv4Addr::new(10, 0, 0, 2), rid, &hello);
        assert!(!core.topology_dirty);
        assert_eq!(core.interfaces[0].neighbors.len(), 1);
        assert_eq!(core.interfaces[0].neighbors[0].alive, NEIGHBOR_TIMEOUT);
    }

    #[test]
    fn hello_frame_addresses_the_group() {
        let core = core_with_iface();
        let frame = build_hello(&core, &core.interfaces[0]);
        assert_eq!(&frame[0..6], &[0x01, 0x00, 0x5E, 0x00, 0x00, 0x05]);

        let ip = crate::wire::ip::Ipv4Packet::from_bytes(&frame[14..]).unwrap();
        assert_eq!(ip.destination, ALL_SPF_ROUTERS);
        assert_eq!(ip.ttl, HELLO_IP_TTL);
    }
}
