//! Layered frame assembly: mOSPF message -> IPv4 -> Ethernet.

use std::net::Ipv4Addr;

use pnet::util::MacAddr;

use super::ethernet::EthernetFrame;
use super::ip::Ipv4Packet;
use super::mospf::MospfPacket;

/// Everything needed to put one mOSPF message on a link. `build`
/// serializes the layers innermost-first so each header's length and
/// checksum fields cover the finished layer below it.
#[derive(Debug)]
pub struct MospfFrame<'a> {
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    pub ip_ttl: u8,
    pub packet: &'a MospfPacket,
}

impl MospfFrame<'_> {
    pub fn build(&self) -> Vec<u8> {
        let payload = self.packet.to_bytes();
        let ip = Ipv4Packet::new(self.src_ip, self.dst_ip, self.ip_ttl, payload);
        EthernetFrame::new(self.src_mac, self.dst_mac, ip.to_bytes()).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ethernet::{ALL_SPF_ROUTERS_MAC, ETHER_HDR_SIZE};
    use crate::wire::ip::{IPPROTO_MOSPF, IP_BASE_HDR_SIZE};
    use crate::wire::mospf::ALL_SPF_ROUTERS;

    #[test]
    fn layers_nest() {
        let packet = MospfPacket::hello(0x0a000101, 0, Ipv4Addr::new(255, 255, 255, 0), 5);
        let frame = MospfFrame {
            src_mac: MacAddr(0x02, 0, 0, 0, 0, 0x01),
            dst_mac: ALL_SPF_ROUTERS_MAC,
            src_ip: Ipv4Addr::new(10, 0, 1, 1),
            dst_ip: ALL_SPF_ROUTERS,
            ip_ttl: 1,
            packet: &packet,
        }
        .build();

        let eth = EthernetFrame::from_bytes(&frame).unwrap();
        assert_eq!(eth.destination, ALL_SPF_ROUTERS_MAC);

        let ip = Ipv4Packet::from_bytes(&eth.payload).unwrap();
        assert_eq!(ip.protocol, IPPROTO_MOSPF);
        assert_eq!(ip.destination, ALL_SPF_ROUTERS);
        assert_eq!(ip.ttl, 1);

        assert_eq!(MospfPacket::from_bytes(&ip.payload).unwrap(), packet);
        assert_eq!(
            frame.len(),
            ETHER_HDR_SIZE + IP_BASE_HDR_SIZE + packet.wire_size()
        );
    }
}
