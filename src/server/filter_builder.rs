use num_bigint::BigUint;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::crypto_error::{PsiError, Result};
use crate::membership::MembershipStructure;
use crate::rsa::arith::canonical_key;
use crate::rsa::rsa_keygen::PrivateKey;
use crate::server::signer::sign_element;

// ---------------------------------------------------------------------------
// Clés canoniques du filtre : canonical_key(x^d mod n) pour x ∈ X
// ---------------------------------------------------------------------------
pub fn signed_keys(private_key: &PrivateKey, elements: &[BigUint]) -> Result<Vec<String>> {
    if let Some(index) = elements.iter().position(|x| x >= &private_key.n) {
        return Err(PsiError::ElementOutOfRange { index });
    }

    let arith = private_key.modulus();

    #[cfg(not(feature = "parallel"))]
    let iter = elements.iter();
    #[cfg(feature = "parallel")]
    let iter = elements.par_iter();

    Ok(iter
        .map(|x| canonical_key(&sign_element(&arith, private_key, x)))
        .collect())
}

// ---------------------------------------------------------------------------
// Phase hors-ligne du serveur : filtre dimensionné pour |X| à ε.
// Aucun faux négatif : toute signature d'un x ∈ X est reconnue.
// ---------------------------------------------------------------------------
pub fn build_filter<M: MembershipStructure>(
    private_key: &PrivateKey,
    elements: &[BigUint],
    false_positive_rate: f64,
) -> Result<M> {
    let keys = signed_keys(private_key, elements)?;
    let filter = M::build(&keys, false_positive_rate)?;
    log::debug!("filtre construit pour {} éléments (ε = {false_positive_rate})", keys.len());
    Ok(filter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::BloomFilter;
    use crate::net_protocol::FilterMessage;
    use crate::rsa::arith::ModularArithmetic;
    use crate::test_support::test_keys;
    use rstest::rstest;

    #[test]
    fn test_every_signed_element_is_present() {
        let kp = test_keys();
        let arith = kp.private_key.modulus();
        let x: Vec<BigUint> = (0..1024u32).step_by(5).map(BigUint::from).collect();
        let filter: BloomFilter = build_filter(&kp.private_key, &x, 0.001).unwrap();
        for v in &x {
            let key = canonical_key(&arith.pow_mod(v, &kp.private_key.d));
            assert!(filter.contains(&key));
        }
    }

    #[test]
    fn test_keys_are_canonical_signatures() {
        let kp = test_keys();
        let x = vec![BigUint::from(0u32), BigUint::from(1u32), BigUint::from(7u32)];
        let keys = signed_keys(&kp.private_key, &x).unwrap();
        assert_eq!(keys[0], "0");
        assert_eq!(keys[1], "1");
        assert_eq!(keys[2], canonical_key(&BigUint::from(7u32).modpow(&kp.private_key.d, &kp.private_key.n)));
    }

    #[test]
    fn test_element_outside_zn_rejected() {
        let kp = test_keys();
        let x = vec![kp.private_key.n.clone()];
        assert!(matches!(
            build_filter::<BloomFilter>(&kp.private_key, &x, 0.001),
            Err(PsiError::ElementOutOfRange { index: 0 })
        ));
    }

    // Le filtre publié puis relu répond comme l'original pour toutes les
    // clés interrogées par le client dans les scénarios A et B.
    #[rstest]
    #[case::scenario_a_x_multiples_of_5(5)]
    #[case::scenario_b_x_all(1)]
    fn test_published_filter_answers_like_original(#[case] step: usize) {
        let kp = test_keys();
        let arith = kp.private_key.modulus();
        let x: Vec<BigUint> = (0..1024u32).step_by(step).map(BigUint::from).collect();
        let filter: BloomFilter = build_filter(&kp.private_key, &x, 0.001).unwrap();

        let wire = FilterMessage::publish(&filter).unwrap().to_bytes().unwrap();
        let restored: BloomFilter = FilterMessage::from_bytes(&wire).unwrap().open().unwrap();

        for y in 0..1024u32 {
            let key = canonical_key(&arith.pow_mod(&BigUint::from(y), &kp.private_key.d));
            assert_eq!(restored.contains(&key), filter.contains(&key), "y = {y}");
        }
    }
}
