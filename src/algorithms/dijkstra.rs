//! Shortest-path-first computation over the link-state database, and
//! the routing-table rebuild it feeds.
//!
//! The database entries are taken in stored order and indexed by
//! position; the adjacency matrix is rebuilt from rid lookups on every
//! run, so entries never hold pointers into each other. Advertisements
//! that reference a router the database does not know contribute no
//! edge, and destinations that end up unreachable are simply omitted;
//! an inconsistent snapshot degrades coverage, never correctness.

use log::{debug, warn};
use std::net::Ipv4Addr;

use crate::protocol::routing_table::{RouteEntry, RoutingTable};
use crate::{Core, RouterId};

/// Distance assigned to routers not yet reached.
pub const MAX_DIST: u32 = u32::MAX;

/// First-hop gateway toward a router: unreachable, the router itself
/// (directly attached, rid 0), or a neighbor rid.
type Gateway = Option<RouterId>;

/// Rebuilds the routing table from the current database. Caller holds
/// the core lock and the routing-table lock, in that order.
pub fn recompute(core: &Core, rtable: &mut RoutingTable) {
    rtable.clear();
    rtable.init();

    let entries = core.lsdb.entries();
    let Some(src) = entries.iter().position(|entry| entry.rid == core.router_id) else {
        return;
    };
    let n = entries.len();

    let index_of =
        |rid: RouterId| entries.iter().position(|entry| entry.rid == rid);

    // Directed adjacency; symmetry is whatever the advertisements say.
    let mut graph = vec![vec![false; n]; n];
    for (k, entry) in entries.iter().enumerate() {
        for lsa in &entry.lsas {
            if let Some(j) = index_of(lsa.rid) {
                graph[k][j] = true;
            }
        }
    }

    let mut dist = vec![MAX_DIST; n];
    let mut gw: Vec<Gateway> = vec![None; n];
    let mut visited = vec![false; n];

    dist[src] = 0;
    gw[src] = Some(0);
    for lsa in &entries[src].lsas {
        if lsa.rid == 0 {
            continue;
        }
        if let Some(j) = index_of(lsa.rid) {
            dist[j] = 1;
            gw[j] = Some(lsa.rid);
        }
    }

    for _ in 0..n.saturating_sub(1) {
        // Closest unvisited router, lowest index on ties.
        let mut u = None;
        let mut min_dist = MAX_DIST;
        for j in 0..n {
            if !visited[j] && dist[j] < min_dist {
                min_dist = dist[j];
                u = Some(j);
            }
        }
        let Some(u) = u else { break };
        visited[u] = true;

        for v in 0..n {
            if graph[u][v] && !visited[v] && dist[u] + 1 < dist[v] {
                dist[v] = dist[u] + 1;
                // The first hop is the relaxed router itself when we are
                // its predecessor, otherwise it is inherited.
                gw[v] = if u == src { Some(entries[v].rid) } else { gw[u] };
            }
        }
    }

    // Turn the per-router distances into per-subnet routes. Ties between
    // subnets advertised more than once go to the first encounter.
    for (j, entry) in entries.iter().enumerate() {
        for lsa in &entry.lsas {
            if let Some(existing) = rtable.find(lsa.subnet) {
                if dist[j] >= existing.dist {
                    continue;
                }
                let egress = match gw[j] {
                    Some(0) => core.subnet_to_iface(lsa.subnet),
                    Some(via) => core.gw_to_iface(via),
                    None => None,
                };
                let Some(egress) = egress else {
                    warn!(
                        "no egress interface toward {}, keeping existing route",
                        lsa.subnet
                    );
                    continue;
                };
                let (mask, iface) = (egress.mask, egress.name.clone());
                let updated = rtable.find_mut(lsa.subnet).unwrap();
                updated.gw = gw[j].unwrap_or(0);
                updated.dist = dist[j];
                updated.iface = iface;
                updated.mask = mask;
                continue;
            }

            match gw[j] {
                Some(0) => {
                    let Some(egress) = core.subnet_to_iface(lsa.subnet) else {
                        warn!("directly attached subnet {} matches no interface", lsa.subnet);
                        continue;
                    };
                    rtable.add(RouteEntry {
                        dest: lsa.subnet,
                        mask: lsa.mask,
                        gw: 0,
                        iface: egress.name.clone(),
                        dist: dist[j],
                    });
                }
                Some(via) => {
                    let Some(egress) = core.gw_to_iface(via) else {
                        warn!(
                            "no interface knows gateway {} for subnet {}",
                            Ipv4Addr::from(via),
                            lsa.subnet
                        );
                        continue;
                    };
                    rtable.add(RouteEntry {
                        dest: lsa.subnet,
                        mask: egress.mask,
                        gw: via,
                        iface: egress.name.clone(),
                        dist: dist[j],
                    });
                }
                None => {
                    debug!("{} is unreachable, omitting {}", Ipv4Addr::from(entry.rid), lsa.subnet);
                }
            }
        }
    }
}
