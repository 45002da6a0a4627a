pub mod session;

pub use session::{run_protocol, ProtocolState, Session};
