// Primitives RSA : arithmétique modulaire, primalité, génération de clés

pub mod arith;
pub mod math;
pub mod rsa_keygen;

pub use arith::{canonical_key, ModularArithmetic, Modulus};
pub use rsa_keygen::{rsa_keygen, PrivateKey, PublicKey, RsaKeyPair};
