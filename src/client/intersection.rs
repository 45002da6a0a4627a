use num_bigint::BigUint;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::client::blinder::{check_in_range, PendingIntersection};
use crate::crypto_error::{PsiError, Result};
use crate::membership::MembershipStructure;
use crate::net_protocol::SignedBatch;
use crate::rsa::arith::{canonical_key, ModularArithmetic};
use crate::rsa::rsa_keygen::PublicKey;

// ---------------------------------------------------------------------------
// Désaveuglement + test d'appartenance
//
//   u_i = s_i · r_i^-1 mod n  =  y_i^d mod n
//
// y_i est retenu si canonical_key(u_i) est reconnu par le filtre. L'ordre
// de `elements` est conservé, doublons compris.
//
// Le lot en attente est consommé avec ses facteurs : une seule exécution.
// ---------------------------------------------------------------------------
pub fn find_intersection<M: MembershipStructure>(
    elements: &[BigUint],
    signed: &SignedBatch,
    pending: PendingIntersection,
    filter: &M,
    public_key: &PublicKey,
) -> Result<Vec<BigUint>> {
    for received in [elements.len(), signed.len()] {
        if received != pending.len() {
            return Err(PsiError::BatchMisaligned { expected: pending.len(), received });
        }
    }
    check_in_range(&signed.values, &public_key.n)?;

    let arith = public_key.modulus();
    let slots = &pending.factors().as_slice()[..elements.len()];

    #[cfg(not(feature = "parallel"))]
    let iter = signed.values.iter().zip(slots.iter());
    #[cfg(feature = "parallel")]
    let iter = signed.values.par_iter().zip(slots.par_iter());

    let hits: Vec<bool> = iter
        .map(|(s, f)| filter.contains(&canonical_key(&arith.mul_mod(s, &f.r_inv))))
        .collect();

    let intersection: Vec<BigUint> = elements
        .iter()
        .zip(hits)
        .filter_map(|(y, hit)| hit.then(|| y.clone()))
        .collect();

    log::debug!(
        "intersection : {} élément(s) retenu(s) sur {}",
        intersection.len(),
        elements.len()
    );
    Ok(intersection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::blinder::blind_batch;
    use crate::client::random_factors::generate_random_factors;
    use crate::membership::BloomFilter;
    use crate::server::filter_builder::build_filter;
    use crate::server::signer::sign_batch;
    use crate::test_support::test_keys;

    fn values(v: &[u32]) -> Vec<BigUint> {
        v.iter().copied().map(BigUint::from).collect()
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let kp = test_keys();
        let pk = &kp.public_key;
        let x = values(&[2, 4, 6, 8]);
        let y = values(&[8, 1, 4, 4, 3, 2, 8]);

        let filter: BloomFilter = build_filter(&kp.private_key, &x, 1e-9).unwrap();
        let factors = generate_random_factors(pk, 16).unwrap();
        let pending = blind_batch(&y, factors, pk, 16).unwrap();
        let signed = sign_batch(&kp.private_key, pending.batch(), 16).unwrap();

        let result = find_intersection(&y, &signed, pending, &filter, pk).unwrap();
        assert_eq!(result, values(&[8, 4, 4, 2, 8]));
    }

    // Lot aveuglé pour `y`, prêt à être signé
    fn pending_for(y: &[BigUint]) -> PendingIntersection {
        let pk = &test_keys().public_key;
        let factors = generate_random_factors(pk, y.len()).unwrap();
        blind_batch(y, factors, pk, y.len()).unwrap()
    }

    #[test]
    fn test_short_signed_batch_rejected() {
        let kp = test_keys();
        let pk = &kp.public_key;
        let y = values(&[1, 2, 3]);
        let filter: BloomFilter = build_filter(&kp.private_key, &y, 0.001).unwrap();
        let signed = SignedBatch { values: values(&[1, 2]) };
        assert_eq!(
            find_intersection(&y, &signed, pending_for(&y), &filter, pk),
            Err(PsiError::BatchMisaligned { expected: 3, received: 2 })
        );
    }

    #[test]
    fn test_elements_differing_from_blinded_batch_rejected() {
        let kp = test_keys();
        let pk = &kp.public_key;
        let y = values(&[1, 2, 3]);
        let filter: BloomFilter = build_filter(&kp.private_key, &y, 0.001).unwrap();
        let pending = pending_for(&y[..2]);
        let signed = sign_batch(&kp.private_key, pending.batch(), 4).unwrap();
        assert_eq!(
            find_intersection(&y, &signed, pending, &filter, pk),
            Err(PsiError::BatchMisaligned { expected: 2, received: 3 })
        );
    }

    #[test]
    fn test_signed_value_outside_zn_rejected() {
        let kp = test_keys();
        let pk = &kp.public_key;
        let y = values(&[1]);
        let filter: BloomFilter = build_filter(&kp.private_key, &y, 0.001).unwrap();
        let signed = SignedBatch { values: vec![pk.n.clone()] };
        assert_eq!(
            find_intersection(&y, &signed, pending_for(&y), &filter, pk),
            Err(PsiError::ElementOutOfRange { index: 0 })
        );
    }

    mod laws {
        use super::*;
        use crate::client::random_factors::generate_random_factors_with_rng;
        use crate::rsa::arith::ModularArithmetic;
        use proptest::prelude::*;
        use rand_chacha::ChaCha20Rng;
        use rand_core::SeedableRng;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(48))]

            // unblind(sign(blind(v))) == v^d mod n
            #[test]
            fn test_unblinding_recovers_direct_signature(
                seed in any::<u64>(),
                v_bytes in proptest::collection::vec(any::<u8>(), 1..80),
            ) {
                let kp = test_keys();
                let pk = &kp.public_key;
                let arith = pk.modulus();
                let v = BigUint::from_bytes_be(&v_bytes) % &pk.n;

                let mut rng = ChaCha20Rng::seed_from_u64(seed);
                let factors = generate_random_factors_with_rng(pk, 1, &mut rng).unwrap();
                let pending = blind_batch(std::slice::from_ref(&v), factors, pk, 1).unwrap();
                let signed = sign_batch(&kp.private_key, pending.batch(), 1).unwrap();

                let r_inv = &pending.factors().get(0).unwrap().r_inv;
                let unblinded = arith.mul_mod(&signed.values[0], r_inv);
                prop_assert_eq!(unblinded, arith.pow_mod(&v, &kp.private_key.d));
            }
        }
    }
}
