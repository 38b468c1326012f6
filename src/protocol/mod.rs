pub mod dispatcher;
pub mod hello;
pub mod lsdb;
pub mod lsu;
pub mod neighbor;
pub mod routing_table;

pub use neighbor::Neighbor;
pub use routing_table::{RouteEntry, RoutingTable};

use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::sync::{mpsc, Mutex};
use tokio::time;

use crate::network::{PacketTx, ReceivedPacket};
use crate::SharedCore;

/// Default HELLO emission period in seconds.
pub const DEFAULT_HELLOINT: u16 = 5;

/// Seconds a neighbor stays alive without a HELLO: three hello periods.
pub const NEIGHBOR_TIMEOUT: u16 = 3 * DEFAULT_HELLOINT;

/// Default LSU refresh period in seconds.
pub const DEFAULT_LSUINT: u16 = 30;

/// Flooding hop budget of a freshly originated LSU; also its IP TTL.
pub const MAX_LSU_TTL: u8 = 16;

/// IP TTL of multicast HELLOs; they must never leave the link.
pub const HELLO_IP_TTL: u8 = 1;

/// Ties the protocol tasks to the shared state and the egress seam.
pub struct ProtocolEngine {
    core: SharedCore,
    rtable: Arc<Mutex<RoutingTable>>,
    tx: Arc<dyn PacketTx>,
}

impl ProtocolEngine {
    pub fn new(core: SharedCore, rtable: Arc<Mutex<RoutingTable>>, tx: Arc<dyn PacketTx>) -> Self {
        Self { core, rtable, tx }
    }

    /// Spawns the periodic tasks and then runs the dispatcher until the
    /// ingress channel closes. There is no graceful shutdown: the tasks
    /// die with the process.
    pub async fn start(&self, ingress: mpsc::Receiver<ReceivedPacket>) {
        let hello_interval = {
            let core = self.core.lock().await;
            core.interfaces
                .first()
                .map(|iface| iface.hello_interval)
                .unwrap_or(DEFAULT_HELLOINT)
        };

        tokio::spawn(hello::hello_task(
            self.core.clone(),
            self.rtable.clone(),
            self.tx.clone(),
            Duration::from_secs(hello_interval as u64),
        ));

        tokio::spawn(neighbor::aging_task(self.core.clone()));

        tokio::spawn(lsu::lsu_task(
            self.core.clone(),
            self.rtable.clone(),
            self.tx.clone(),
        ));

        info!("protocol tasks started");

        dispatcher::dispatch_loop(
            self.core.clone(),
            self.rtable.clone(),
            self.tx.clone(),
            ingress,
        )
        .await;
    }
}

/// One-second tick shared by the aging and LSU loops; the sleep happens
/// with no lock held.
pub(crate) async fn tick() {
    time::sleep(Duration::from_secs(1)).await;
}
