pub mod interface;
pub mod transport;

pub use interface::{subnet_of, Interface};
pub use transport::{PacketTx, ReceivedPacket};
