//! IPv4 packet construction and parsing.
//!
//! Only the base 20-byte header is supported; mOSPF never emits IP
//! options.

use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};

use super::checksum::internet_checksum;
use super::WireError;

/// IP protocol number assigned to mOSPF.
pub const IPPROTO_MOSPF: u8 = 90;

/// Base IPv4 header size in bytes.
pub const IP_BASE_HDR_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet {
    pub tos: u8,
    pub total_length: u16,
    pub identification: u16,
    pub dont_fragment: bool,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    pub payload: Vec<u8>,
}

impl Ipv4Packet {
    pub fn new(source: Ipv4Addr, destination: Ipv4Addr, ttl: u8, payload: Vec<u8>) -> Self {
        Self {
            tos: 0,
            total_length: (IP_BASE_HDR_SIZE + payload.len()) as u16,
            identification: 0,
            dont_fragment: true,
            ttl,
            protocol: IPPROTO_MOSPF,
            checksum: 0,
            source,
            destination,
            payload,
        }
    }

    fn header_bytes(&self) -> [u8; IP_BASE_HDR_SIZE] {
        let mut buf = BytesMut::with_capacity(IP_BASE_HDR_SIZE);
        buf.put_u8(0x45); // version 4, ihl 5
        buf.put_u8(self.tos);
        buf.put_u16(self.total_length);
        buf.put_u16(self.identification);
        buf.put_u16(if self.dont_fragment { 0x4000 } else { 0 });
        buf.put_u8(self.ttl);
        buf.put_u8(self.protocol);
        buf.put_u16(self.checksum);
        buf.put_slice(&self.source.octets());
        buf.put_slice(&self.destination.octets());

        let mut header = [0u8; IP_BASE_HDR_SIZE];
        header.copy_from_slice(&buf);
        header
    }

    /// Serializes the packet, recomputing the header checksum over the
    /// header with the checksum field zeroed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut packet = self.clone();
        packet.checksum = 0;
        packet.checksum = internet_checksum(&packet.header_bytes());

        let mut buf = Vec::with_capacity(IP_BASE_HDR_SIZE + self.payload.len());
        buf.extend_from_slice(&packet.header_bytes());
        buf.extend_from_slice(&self.payload);
        buf
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < IP_BASE_HDR_SIZE {
            return Err(WireError::Truncated {
                layer: "ipv4",
                need: IP_BASE_HDR_SIZE,
                got: data.len(),
            });
        }
        if data[0] >> 4 != 4 {
            return Err(WireError::NotIpv4);
        }

        let ihl = (data[0] & 0x0F) as usize * 4;
        if ihl < IP_BASE_HDR_SIZE || data.len() < ihl {
            return Err(WireError::Truncated {
                layer: "ipv4",
                need: ihl,
                got: data.len(),
            });
        }

        let total_length = u16::from_be_bytes([data[2], data[3]]);
        let flags = u16::from_be_bytes([data[6], data[7]]);

        Ok(Self {
            tos: data[1],
            total_length,
            identification: u16::from_be_bytes([data[4], data[5]]),
            dont_fragment: flags & 0x4000 != 0,
            ttl: data[8],
            protocol: data[9],
            checksum: u16::from_be_bytes([data[10], data[11]]),
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            payload: data[ihl..].to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let pkt = Ipv4Packet::new(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(224, 0, 0, 5),
            1,
            vec![1, 2, 3, 4],
        );
        let bytes = pkt.to_bytes();
        assert_eq!(bytes.len(), 24);
        assert_eq!(bytes[9], IPPROTO_MOSPF);

        let parsed = Ipv4Packet::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.source, pkt.source);
        assert_eq!(parsed.destination, pkt.destination);
        assert_eq!(parsed.ttl, 1);
        assert_eq!(parsed.payload, pkt.payload);

        // A parsed header's checksum verifies to zero.
        assert_eq!(internet_checksum(&bytes[..IP_BASE_HDR_SIZE]), 0);
    }

    #[test]
    fn rejects_non_ipv4() {
        let mut bytes = Ipv4Packet::new(
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
            16,
            vec![],
        )
        .to_bytes();
        bytes[0] = 0x65;
        assert_eq!(Ipv4Packet::from_bytes(&bytes), Err(WireError::NotIpv4));
    }
}
