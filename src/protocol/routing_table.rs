//! The forwarding table the shortest-path build writes into. Guarded by
//! its own lock, always taken after the core lock.

use std::fmt;
use std::net::Ipv4Addr;

use crate::RouterId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub dest: Ipv4Addr,
    pub mask: Ipv4Addr,
    /// Next-hop router id; 0 for a directly attached subnet.
    pub gw: RouterId,
    /// Egress interface name.
    pub iface: String,
    /// Hop count from this router.
    pub dist: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    entries: Vec<RouteEntry>,
    /// Statically configured default route, reinstalled by `init`.
    default_route: Option<RouteEntry>,
}

impl RoutingTable {
    pub fn new(default_route: Option<RouteEntry>) -> Self {
        let mut table = Self {
            entries: Vec::new(),
            default_route,
        };
        table.init();
        table
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Reinstalls the default gateway, if one is configured.
    pub fn init(&mut self) {
        if let Some(route) = &self.default_route {
            self.entries.push(route.clone());
        }
    }

    pub fn add(&mut self, entry: RouteEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn find(&self, dest: Ipv4Addr) -> Option<&RouteEntry> {
        self.entries.iter().find(|entry| entry.dest == dest)
    }

    pub fn find_mut(&mut self, dest: Ipv4Addr) -> Option<&mut RouteEntry> {
        self.entries.iter_mut().find(|entry| entry.dest == dest)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RoutingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<16} {:<16} {:<16} {:<8} {}",
            "destination", "mask", "gateway", "iface", "dist"
        )?;
        for entry in &self.entries {
            let gw = if entry.gw == 0 {
                "direct".to_string()
            } else {
                Ipv4Addr::from(entry.gw).to_string()
            };
            writeln!(
                f,
                "{:<16} {:<16} {:<16} {:<8} {}",
                entry.dest, entry.mask, gw, entry.iface, entry.dist
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_route() -> RouteEntry {
        RouteEntry {
            dest: Ipv4Addr::UNSPECIFIED,
            mask: Ipv4Addr::UNSPECIFIED,
            gw: u32::from(Ipv4Addr::new(10, 0, 0, 254)),
            iface: "eth0".into(),
            dist: 0,
        }
    }

    #[test]
    fn init_reinstalls_default_gateway() {
        let mut table = RoutingTable::new(Some(default_route()));
        assert_eq!(table.len(), 1);

        table.clear();
        assert!(table.is_empty());

        table.init();
        assert_eq!(table.find(Ipv4Addr::UNSPECIFIED), Some(&default_route()));
    }

    #[test]
    fn dump_renders_direct_routes() {
        let mut table = RoutingTable::new(None);
        table.add(RouteEntry {
            dest: Ipv4Addr::new(10, 0, 1, 0),
            mask: Ipv4Addr::new(255, 255, 255, 0),
            gw: 0,
            iface: "eth0".into(),
            dist: 0,
        });
        let dump = table.to_string();
        assert!(dump.contains("10.0.1.0"));
        assert!(dump.contains("direct"));
    }
}
