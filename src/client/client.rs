use num_bigint::BigUint;

use crate::client::blinder::{blind_batch, PendingIntersection};
use crate::client::intersection::find_intersection;
use crate::client::random_factors::{generate_random_factors, RandomFactors};
use crate::config::PsiConfig;
use crate::crypto_error::Result;
use crate::membership::MembershipStructure;
use crate::net_protocol::SignedBatch;
use crate::rsa::rsa_keygen::PublicKey;

// ============================================================================
// Rôle client : { generate_random_factors, blind, intersect }
//
// Valeur sans état caché au-delà de la clé publique du serveur et de la
// configuration ; les facteurs de chaque session sont retournés à l'appelant.
// ============================================================================
#[derive(Clone, Debug)]
pub struct ClientRole {
    public_key: PublicKey,
    config: PsiConfig,
}

impl ClientRole {
    pub fn new(public_key: PublicKey, config: PsiConfig) -> Result<Self> {
        config.validate()?;
        public_key.validate()?;
        Ok(ClientRole { public_key, config })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn config(&self) -> &PsiConfig {
        &self.config
    }

    /// `max_inputs` facteurs frais, à n'utiliser que pour une seule session.
    pub fn generate_random_factors(&self) -> Result<RandomFactors> {
        generate_random_factors(&self.public_key, self.config.max_inputs)
    }

    /// Consomme les facteurs ; le lot en attente ne sert qu'à `intersect`.
    pub fn blind(&self, elements: &[BigUint], factors: RandomFactors) -> Result<PendingIntersection> {
        blind_batch(elements, factors, &self.public_key, self.config.max_inputs)
    }

    pub fn intersect<M: MembershipStructure>(
        &self,
        elements: &[BigUint],
        signed: &SignedBatch,
        pending: PendingIntersection,
        filter: &M,
    ) -> Result<Vec<BigUint>> {
        find_intersection(elements, signed, pending, filter, &self.public_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_error::PsiError;
    use crate::test_support::{test_config, test_keys};

    #[test]
    fn test_generates_max_inputs_factors() {
        let config = PsiConfig { max_inputs: 32, ..test_config() };
        let client = ClientRole::new(test_keys().public_key.clone(), config).unwrap();
        assert_eq!(client.generate_random_factors().unwrap().len(), 32);
    }

    #[test]
    fn test_rejects_invalid_config_and_key() {
        let bad_config = PsiConfig { max_inputs: 0, ..test_config() };
        assert!(matches!(
            ClientRole::new(test_keys().public_key.clone(), bad_config),
            Err(PsiError::InvalidConfig(_))
        ));

        let mut pk = test_keys().public_key.clone();
        pk.n += 1u32; // n pair
        assert!(matches!(
            ClientRole::new(pk, test_config()),
            Err(PsiError::KeyMaterialInvalid(_))
        ));
    }

    #[test]
    fn test_blind_respects_configured_maximum() {
        let config = PsiConfig { max_inputs: 4, ..test_config() };
        let client = ClientRole::new(test_keys().public_key.clone(), config).unwrap();
        let factors = client.generate_random_factors().unwrap();
        let y: Vec<BigUint> = (0..5u32).map(BigUint::from).collect();
        assert_eq!(
            client.blind(&y, factors).err(),
            Some(PsiError::BatchSizeExceeded { requested: 5, available: 4 })
        );
    }
}
