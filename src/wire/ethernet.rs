//! Ethernet II framing, reduced to what an mOSPF router emits.

use bytes::{BufMut, BytesMut};
use pnet::util::MacAddr;

use super::WireError;

/// EtherType for IPv4.
pub const ETHERTYPE_IPV4: u16 = 0x0800;

/// Ethernet header size in bytes.
pub const ETHER_HDR_SIZE: usize = 14;

/// The AllSPFRouters group MAC (maps 224.0.0.5).
pub const ALL_SPF_ROUTERS_MAC: MacAddr = MacAddr(0x01, 0x00, 0x5E, 0x00, 0x00, 0x05);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub destination: MacAddr,
    pub source: MacAddr,
    pub ethertype: u16,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn new(source: MacAddr, destination: MacAddr, payload: Vec<u8>) -> Self {
        Self {
            destination,
            source,
            ethertype: ETHERTYPE_IPV4,
            payload,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(ETHER_HDR_SIZE + self.payload.len());
        buf.put_slice(&self.destination.octets());
        buf.put_slice(&self.source.octets());
        buf.put_u16(self.ethertype);
        buf.put_slice(&self.payload);
        buf.to_vec()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < ETHER_HDR_SIZE {
            return Err(WireError::Truncated {
                layer: "ethernet",
                need: ETHER_HDR_SIZE,
                got: data.len(),
            });
        }

        let destination = MacAddr(data[0], data[1], data[2], data[3], data[4], data[5]);
        let source = MacAddr(data[6], data[7], data[8], data[9], data[10], data[11]);
        let ethertype = u16::from_be_bytes([data[12], data[13]]);

        Ok(Self {
            destination,
            source,
            ethertype,
            payload: data[ETHER_HDR_SIZE..].to_vec(),
        })
    }
}
