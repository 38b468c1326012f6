pub mod builder;
pub mod checksum;
pub mod ethernet;
pub mod ip;
pub mod mospf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WireError>;

/// Errors raised while parsing frames off the wire.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WireError {
    #[error("truncated {layer} header ({got} of {need} bytes)")]
    Truncated {
        layer: &'static str,
        need: usize,
        got: usize,
    },

    #[error("unsupported mOSPF version {0}")]
    BadVersion(u8),

    #[error("bad mOSPF checksum (got {got:#06x}, computed {want:#06x})")]
    BadChecksum { got: u16, want: u16 },

    #[error("unknown mOSPF packet type {0}")]
    UnknownType(u8),

    #[error("mOSPF length field {0} does not match the payload")]
    BadLength(u16),

    #[error("not an IPv4 packet")]
    NotIpv4,
}
