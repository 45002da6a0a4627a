// Déclaration des modules
pub mod client;
pub mod config;
pub mod crypto_error;
pub mod membership;
pub mod net_protocol;
pub mod rsa;
pub mod server;
pub mod session;

// Rôles du protocole
pub use client::{ClientRole, PendingIntersection, RandomFactor, RandomFactors};
pub use server::ServerRole;

// Session complète (machine à états)
pub use session::{run_protocol, ProtocolState, Session};

// Clés RSA et façade arithmétique
pub use rsa::{canonical_key, rsa_keygen, ModularArithmetic, Modulus, PrivateKey, PublicKey, RsaKeyPair};

// Structure d'appartenance
pub use membership::{BloomFilter, MembershipStructure};

// Messages échangés
pub use net_protocol::{BlindedBatch, FilterMessage, SignedBatch};

// Configuration et erreurs
pub use config::PsiConfig;
pub use crypto_error::{ProtocolError, PsiError};
