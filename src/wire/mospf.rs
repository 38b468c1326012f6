//! The mOSPF message codecs: common header, HELLO and LSU bodies.
//!
//! All integers are network byte order. The checksum is the RFC 1071
//! ones-complement sum over the whole message (header and payload) with
//! the checksum field zeroed.

use std::net::Ipv4Addr;

use bytes::{BufMut, BytesMut};

use super::checksum::internet_checksum;
use super::WireError;

pub const MOSPF_VERSION: u8 = 2;
pub const MOSPF_TYPE_HELLO: u8 = 1;
pub const MOSPF_TYPE_LSU: u8 = 4;

pub const MOSPF_HDR_SIZE: usize = 16;
pub const MOSPF_HELLO_SIZE: usize = 8;
pub const MOSPF_LSU_SIZE: usize = 8;
pub const MOSPF_LSA_SIZE: usize = 12;

/// The AllSPFRouters multicast group.
pub const ALL_SPF_ROUTERS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 5);

/// One link-state advertisement: a subnet, its mask, and the router id
/// of the neighbor it was learned from (0 when the subnet is directly
/// attached and has no neighbor).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lsa {
    pub subnet: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub rid: u32,
}

impl Lsa {
    fn write_bytes(&self, dst: &mut BytesMut) {
        dst.put_slice(&self.subnet.octets());
        dst.put_slice(&self.mask.octets());
        dst.put_u32(self.rid);
    }

    fn from_bytes(src: &[u8]) -> Self {
        Self {
            subnet: Ipv4Addr::new(src[0], src[1], src[2], src[3]),
            mask: Ipv4Addr::new(src[4], src[5], src[6], src[7]),
            rid: u32::from_be_bytes([src[8], src[9], src[10], src[11]]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hello {
    pub mask: Ipv4Addr,
    /// Hello interval in seconds.
    pub helloint: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lsu {
    pub seq: u16,
    /// Flooding hop budget, decremented on every re-flood.
    pub ttl: u8,
    pub lsas: Vec<Lsa>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MospfBody {
    Hello(Hello),
    Lsu(Lsu),
}

impl MospfBody {
    fn type_byte(&self) -> u8 {
        match self {
            MospfBody::Hello(_) => MOSPF_TYPE_HELLO,
            MospfBody::Lsu(_) => MOSPF_TYPE_LSU,
        }
    }

    fn wire_size(&self) -> usize {
        match self {
            MospfBody::Hello(_) => MOSPF_HELLO_SIZE,
            MospfBody::Lsu(lsu) => MOSPF_LSU_SIZE + MOSPF_LSA_SIZE * lsu.lsas.len(),
        }
    }
}

/// A complete mOSPF message: the common header fields that survive
/// parsing plus the typed body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MospfPacket {
    pub rid: u32,
    pub aid: u32,
    pub body: MospfBody,
}

impl MospfPacket {
    pub fn hello(rid: u32, aid: u32, mask: Ipv4Addr, helloint: u16) -> Self {
        Self {
            rid,
            aid,
            body: MospfBody::Hello(Hello { mask, helloint }),
        }
    }

    pub fn lsu(rid: u32, aid: u32, seq: u16, ttl: u8, lsas: Vec<Lsa>) -> Self {
        Self {
            rid,
            aid,
            body: MospfBody::Lsu(Lsu { seq, ttl, lsas }),
        }
    }

    pub fn wire_size(&self) -> usize {
        MOSPF_HDR_SIZE + self.body.wire_size()
    }

    /// Serializes the message, computing the checksum last.
    pub fn to_bytes(&self) -> Vec<u8> {
        let len = self.wire_size();
        let mut buf = BytesMut::with_capacity(len);

        buf.put_u8(MOSPF_VERSION);
        buf.put_u8(self.body.type_byte());
        buf.put_u16(len as u16);
        buf.put_u32(self.rid);
        buf.put_u32(self.aid);
        buf.put_u16(0); // checksum, patched below
        buf.put_u16(0); // padding

        match &self.body {
            MospfBody::Hello(hello) => {
                buf.put_slice(&hello.mask.octets());
                buf.put_u16(hello.helloint);
                buf.put_u16(0);
            }
            MospfBody::Lsu(lsu) => {
                buf.put_u16(lsu.seq);
                buf.put_u8(lsu.ttl);
                buf.put_u8(0);
                buf.put_u32(lsu.lsas.len() as u32);
                for lsa in &lsu.lsas {
                    lsa.write_bytes(&mut buf);
                }
            }
        }

        let csum = internet_checksum(&buf);
        buf[12..14].copy_from_slice(&csum.to_be_bytes());
        buf.to_vec()
    }

    /// Parses and validates a message: version, advertised length, and
    /// checksum must all hold. The area id is left to the caller, which
    /// knows the local area.
    pub fn from_bytes(data: &[u8]) -> Result<Self, WireError> {
        if data.len() < MOSPF_HDR_SIZE {
            return Err(WireError::Truncated {
                layer: "mospf",
                need: MOSPF_HDR_SIZE,
                got: data.len(),
            });
        }

        if data[0] != MOSPF_VERSION {
            return Err(WireError::BadVersion(data[0]));
        }

        let len = u16::from_be_bytes([data[2], data[3]]) as usize;
        if len < MOSPF_HDR_SIZE || len > data.len() {
            return Err(WireError::BadLength(len as u16));
        }
        let data = &data[..len];

        let got = u16::from_be_bytes([data[12], data[13]]);
        let mut scratch = data.to_vec();
        scratch[12] = 0;
        scratch[13] = 0;
        let want = internet_checksum(&scratch);
        if got != want {
            return Err(WireError::BadChecksum { got, want });
        }

        let rid = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);
        let aid = u32::from_be_bytes([data[8], data[9], data[10], data[11]]);
        let payload = &data[MOSPF_HDR_SIZE..];

        let body = match data[1] {
            MOSPF_TYPE_HELLO => {
                if payload.len() < MOSPF_HELLO_SIZE {
                    return Err(WireError::BadLength(len as u16));
                }
                MospfBody::Hello(Hello {
                    mask: Ipv4Addr::new(payload[0], payload[1], payload[2], payload[3]),
                    helloint: u16::from_be_bytes([payload[4], payload[5]]),
                })
            }
            MOSPF_TYPE_LSU => {
                if payload.len() < MOSPF_LSU_SIZE {
                    return Err(WireError::BadLength(len as u16));
                }
                let nadv = u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
                let lsa_bytes = &payload[MOSPF_LSU_SIZE..];
                if lsa_bytes.len() != MOSPF_LSA_SIZE * nadv as usize {
                    return Err(WireError::BadLength(len as u16));
                }
                let lsas = lsa_bytes
                    .chunks_exact(MOSPF_LSA_SIZE)
                    .map(Lsa::from_bytes)
                    .collect();
                MospfBody::Lsu(Lsu {
                    seq: u16::from_be_bytes([payload[0], payload[1]]),
                    ttl: payload[2],
                    lsas,
                })
            }
            other => return Err(WireError::UnknownType(other)),
        };

        Ok(Self { rid, aid, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_encoding() {
        let pkt = MospfPacket::hello(
            u32::from(Ipv4Addr::new(10, 0, 1, 1)),
            0,
            Ipv4Addr::new(255, 255, 255, 0),
            5,
        );
        let bytes = pkt.to_bytes();

        assert_eq!(bytes.len(), MOSPF_HDR_SIZE + MOSPF_HELLO_SIZE);
        #[rustfmt::skip]
        let expected_sans_csum: [u8; 24] = [
            2, 1, 0, 24,              // version, type, len
            10, 0, 1, 1,              // rid
            0, 0, 0, 0,               // aid
            0, 0,                     // checksum (zeroed here)
            0, 0,                     // padding
            255, 255, 255, 0,         // mask
            0, 5,                     // helloint
            0, 0,                     // padding
        ];
        let mut zeroed = bytes.clone();
        zeroed[12] = 0;
        zeroed[13] = 0;
        assert_eq!(zeroed, expected_sans_csum);

        // Checksum over the whole message with the field in place folds
        // to zero.
        assert_eq!(internet_checksum(&bytes), 0);
    }

    #[test]
    fn hello_roundtrip_bytes() {
        let pkt = MospfPacket::hello(0x0a000101, 0, Ipv4Addr::new(255, 255, 0, 0), 5);
        let bytes = pkt.to_bytes();
        let parsed = MospfPacket::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, pkt);
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn lsu_roundtrip_bytes() {
        let lsas = vec![
            Lsa {
                subnet: Ipv4Addr::new(10, 0, 1, 0),
                mask: Ipv4Addr::new(255, 255, 255, 0),
                rid: 0,
            },
            Lsa {
                subnet: Ipv4Addr::new(10, 0, 0, 0),
                mask: Ipv4Addr::new(255, 255, 255, 0),
                rid: 0x0a000002,
            },
        ];
        let pkt = MospfPacket::lsu(0x0a000101, 0, 7, 16, lsas);
        let bytes = pkt.to_bytes();
        assert_eq!(
            bytes.len(),
            MOSPF_HDR_SIZE + MOSPF_LSU_SIZE + 2 * MOSPF_LSA_SIZE
        );

        let parsed = MospfPacket::from_bytes(&bytes).unwrap();
        assert_eq!(parsed, pkt);
        assert_eq!(parsed.to_bytes(), bytes);
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let pkt = MospfPacket::hello(1, 0, Ipv4Addr::new(255, 255, 255, 0), 5);
        let mut bytes = pkt.to_bytes();
        bytes[20] ^= 0xFF; // flip a payload bit, checksum now stale
        assert!(matches!(
            MospfPacket::from_bytes(&bytes),
            Err(WireError::BadChecksum { .. })
        ));
    }

    #[test]
    fn wrong_version_rejected() {
        let mut bytes = MospfPacket::hello(1, 0, Ipv4Addr::new(255, 0, 0, 0), 5).to_bytes();
        bytes[0] = 3;
        assert_eq!(
            MospfPacket::from_bytes(&bytes),
            Err(WireError::BadVersion(3))
        );
    }

    #[test]
    fn unknown_type_rejected() {
        let mut bytes = MospfPacket::hello(1, 0, Ipv4Addr::new(255, 0, 0, 0), 5).to_bytes();
        bytes[1] = 9;
        // Fix the checksum so the type check is what fires.
        bytes[12] = 0;
        bytes[13] = 0;
        let csum = internet_checksum(&bytes);
        bytes[12..14].copy_from_slice(&csum.to_be_bytes());
        assert_eq!(MospfPacket::from_bytes(&bytes), Err(WireError::UnknownType(9)));
    }

    #[test]
    fn lsa_count_must_match_length() {
        let pkt = MospfPacket::lsu(1, 0, 1, 16, vec![]);
        let mut bytes = pkt.to_bytes();
        // Claim one LSA without carrying it.
        bytes[23] = 1;
        bytes[12] = 0;
        bytes[13] = 0;
        let csum = internet_checksum(&bytes);
        bytes[12..14].copy_from_slice(&csum.to_be_bytes());
        assert!(matches!(
            MospfPacket::from_bytes(&bytes),
            Err(WireError::BadLength(_))
        ));
    }
}
