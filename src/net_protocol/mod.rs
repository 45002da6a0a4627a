pub mod net_protocol;

pub use net_protocol::{decode_message, encode_message, BlindedBatch, FilterMessage, SignedBatch, MAX_MESSAGE_BYTES};
