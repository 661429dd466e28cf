mod bridge;

pub use bridge::{spawn_transport_bridge, InboundIntent};
