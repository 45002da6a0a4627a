mod rsa_keygen;

pub use rsa_keygen::{rsa_keygen, rsa_keygen_with_rng, PrivateKey, PublicKey, RsaKeyPair};
