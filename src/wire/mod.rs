//! The ASGI-compatible wire protocol: the connection scope, the inbound and
//! outbound lifecycle messages, and the channel capabilities that carry them.

mod channel;
mod message;
mod scope;

pub use channel::{Emit, Receive, StreamReceiver};
pub use message::{Inbound, Outbound};
pub use scope::{Addr, Phase, Scope};
