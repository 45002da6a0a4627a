use num_bigint::BigUint;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::client::random_factors::RandomFactors;
use crate::crypto_error::{PsiError, Result};
use crate::net_protocol::BlindedBatch;
use crate::rsa::arith::ModularArithmetic;
use crate::rsa::rsa_keygen::PublicKey;

// ---------------------------------------------------------------------------
// Vérifie qu'un lot de `len` éléments tient dans la limite configurée et
// dans le nombre de facteurs disponibles. Jamais de troncature silencieuse.
// ---------------------------------------------------------------------------
pub(crate) fn check_batch_len(len: usize, max_inputs: usize, factors: usize) -> Result<()> {
    if len > max_inputs {
        return Err(PsiError::BatchSizeExceeded { requested: len, available: max_inputs });
    }
    if len > factors {
        return Err(PsiError::BatchSizeExceeded { requested: len, available: factors });
    }
    Ok(())
}

// Tout élément doit être dans [0, n)
pub(crate) fn check_in_range(values: &[BigUint], n: &BigUint) -> Result<()> {
    match values.iter().position(|v| v >= n) {
        Some(index) => Err(PsiError::ElementOutOfRange { index }),
        None => Ok(()),
    }
}

/// Lot aveuglé en attente de signature.
///
/// Détient les facteurs qui l'ont produit : seule l'intersection peut les
/// consommer, et un second lot ne peut pas être aveuglé avec eux.
///
/// ```compile_fail,E0382
/// # use num_bigint::BigUint;
/// # use rsa_blind_psi::client::{blind_batch, generate_random_factors};
/// # let keys = rsa_blind_psi::rsa_keygen(512, 65537).unwrap();
/// # let pk = &keys.public_key;
/// let factors = generate_random_factors(pk, 2).unwrap();
/// let first = blind_batch(&[BigUint::from(6u32)], factors, pk, 2).unwrap();
/// let second = blind_batch(&[BigUint::from(3u32)], factors, pk, 2).unwrap();
/// ```
pub struct PendingIntersection {
    batch: BlindedBatch,
    factors: RandomFactors,
}

impl PendingIntersection {
    /// Lot à envoyer au serveur
    pub fn batch(&self) -> &BlindedBatch {
        &self.batch
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub(crate) fn factors(&self) -> &RandomFactors {
        &self.factors
    }
}

// ---------------------------------------------------------------------------
// Aveuglement : a_i = y_i · r_i^e mod n
//
// Le lot produit est aligné indice par indice sur `elements` et sur les
// `elements.len()` premiers facteurs. Les facteurs sont consommés, y compris
// en cas d'erreur.
// ---------------------------------------------------------------------------
pub fn blind_batch(
    elements: &[BigUint],
    factors: RandomFactors,
    public_key: &PublicKey,
    max_inputs: usize,
) -> Result<PendingIntersection> {
    check_batch_len(elements.len(), max_inputs, factors.len())?;
    check_in_range(elements, &public_key.n)?;

    let arith = public_key.modulus();
    let slots = &factors.as_slice()[..elements.len()];

    #[cfg(not(feature = "parallel"))]
    let iter = elements.iter().zip(slots.iter());
    #[cfg(feature = "parallel")]
    let iter = elements.par_iter().zip(slots.par_iter());

    let values: Vec<BigUint> = iter.map(|(y, f)| arith.mul_mod(y, &f.r_pow)).collect();

    log::debug!("lot de {} éléments aveuglé", values.len());
    Ok(PendingIntersection { batch: BlindedBatch { values }, factors })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::random_factors::generate_random_factors;
    use crate::test_support::test_keys;

    fn range(end: u32) -> Vec<BigUint> {
        (0..end).map(BigUint::from).collect()
    }

    #[test]
    fn test_blinded_entries_are_aligned() {
        let pk = &test_keys().public_key;
        let arith = pk.modulus();
        let factors = generate_random_factors(pk, 16).unwrap();
        let y = range(10);
        let pending = blind_batch(&y, factors, pk, 16).unwrap();
        assert_eq!(pending.len(), 10);
        for (i, a) in pending.batch().values.iter().enumerate() {
            let f = pending.factors().get(i).unwrap();
            assert_eq!(a, &arith.mul_mod(&y[i], &f.r_pow));
        }
    }

    #[test]
    fn test_batch_longer_than_factors_fails() {
        let pk = &test_keys().public_key;
        let factors = generate_random_factors(pk, 8).unwrap();
        assert_eq!(
            blind_batch(&range(9), factors, pk, 1024).err(),
            Some(PsiError::BatchSizeExceeded { requested: 9, available: 8 })
        );
    }

    #[test]
    fn test_batch_longer_than_max_inputs_fails() {
        let pk = &test_keys().public_key;
        let factors = generate_random_factors(pk, 8).unwrap();
        assert_eq!(
            blind_batch(&range(6), factors, pk, 5).err(),
            Some(PsiError::BatchSizeExceeded { requested: 6, available: 5 })
        );
    }

    #[test]
    fn test_element_outside_zn_rejected() {
        let pk = &test_keys().public_key;
        let factors = generate_random_factors(pk, 4).unwrap();
        let y = vec![BigUint::from(1u32), pk.n.clone()];
        assert_eq!(
            blind_batch(&y, factors, pk, 4).err(),
            Some(PsiError::ElementOutOfRange { index: 1 })
        );
    }

    #[test]
    fn test_each_factor_set_blinds_a_single_batch() {
        // Deux lots aveuglés avec deux jeux de facteurs distincts : le
        // rapport a1 · a2^-1 ne révèle plus y1 / y2.
        let pk = &test_keys().public_key;
        let arith = pk.modulus();
        let first = blind_batch(&[BigUint::from(6u32)], generate_random_factors(pk, 1).unwrap(), pk, 1)
            .unwrap();
        let second = blind_batch(&[BigUint::from(3u32)], generate_random_factors(pk, 1).unwrap(), pk, 1)
            .unwrap();
        let ratio = arith.mul_mod(
            &first.batch().values[0],
            &arith.inv_mod(&second.batch().values[0]).unwrap(),
        );
        assert_ne!(ratio, BigUint::from(2u32));
    }

    #[test]
    fn test_empty_batch_is_empty() {
        let pk = &test_keys().public_key;
        let factors = generate_random_factors(pk, 2).unwrap();
        assert!(blind_batch(&[], factors, pk, 2).unwrap().is_empty());
    }
}
