// Rôle serveur : signature des lots aveuglés, construction du filtre publié

pub mod filter_builder;
pub mod server;
pub mod signer;

pub use filter_builder::{build_filter, signed_keys};
pub use server::ServerRole;
pub use signer::{sign_batch, sign_element};
