use num_bigint::BigUint;

use crate::config::PsiConfig;
use crate::crypto_error::Result;
use crate::membership::MembershipStructure;
use crate::net_protocol::{BlindedBatch, SignedBatch};
use crate::rsa::rsa_keygen::{PrivateKey, PublicKey};
use crate::server::filter_builder::build_filter;
use crate::server::signer::sign_batch;

// ============================================================================
// Rôle serveur : { build_filter, sign }
//
// Détient la clé privée (zeroïsée au Drop) ; aucune autre donnée n'est
// conservée entre deux appels.
// ============================================================================
#[derive(Clone, Debug)]
pub struct ServerRole {
    private_key: PrivateKey,
    config: PsiConfig,
}

impl ServerRole {
    /// Err(KeyMaterialInvalid) avant tout travail si la clé est incohérente.
    pub fn new(private_key: PrivateKey, config: PsiConfig) -> Result<Self> {
        config.validate()?;
        private_key.validate()?;
        Ok(ServerRole { private_key, config })
    }

    pub fn public_key(&self) -> PublicKey {
        self.private_key.public_key()
    }

    pub fn config(&self) -> &PsiConfig {
        &self.config
    }

    pub fn build_filter<M: MembershipStructure>(&self, elements: &[BigUint]) -> Result<M> {
        build_filter(&self.private_key, elements, self.config.false_positive_rate)
    }

    pub fn sign(&self, batch: &BlindedBatch) -> Result<SignedBatch> {
        sign_batch(&self.private_key, batch, self.config.max_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_error::PsiError;
    use crate::membership::BloomFilter;
    use crate::test_support::{test_config, test_keys};

    #[test]
    fn test_inconsistent_key_rejected_before_any_work() {
        let mut sk = test_keys().private_key.clone();
        sk.d += 2u32;
        assert!(matches!(
            ServerRole::new(sk, test_config()),
            Err(PsiError::KeyMaterialInvalid(_))
        ));
    }

    #[test]
    fn test_public_key_matches_keypair() {
        let server = ServerRole::new(test_keys().private_key.clone(), test_config()).unwrap();
        assert_eq!(server.public_key(), test_keys().public_key);
    }

    #[test]
    fn test_filter_uses_configured_rate() {
        let config = PsiConfig { false_positive_rate: 0.01, ..test_config() };
        let server = ServerRole::new(test_keys().private_key.clone(), config).unwrap();
        let x: Vec<BigUint> = (0..100u32).map(BigUint::from).collect();
        let filter: BloomFilter = server.build_filter(&x).unwrap();
        assert_eq!(filter.false_positive_rate(), 0.01);
        assert_eq!(filter.inserted(), 100);
    }
}
