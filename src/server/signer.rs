use num_bigint::BigUint;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::crypto_error::{PsiError, Result};
use crate::net_protocol::{BlindedBatch, SignedBatch};
use crate::rsa::arith::ModularArithmetic;
use crate::rsa::rsa_keygen::PrivateKey;

// Transformation par l'exposant privé : x^d mod n
pub fn sign_element<A: ModularArithmetic>(arith: &A, private_key: &PrivateKey, x: &BigUint) -> BigUint {
    arith.pow_mod(x, &private_key.d)
}

// ---------------------------------------------------------------------------
// Signature d'un lot aveuglé : s_i = a_i^d mod n, ordre conservé.
//
// Le serveur refuse un lot plus long que `max_inputs` et toute entrée hors
// de [0, n) : ce sont des données contrôlées par le client.
// ---------------------------------------------------------------------------
pub fn sign_batch(private_key: &PrivateKey, batch: &BlindedBatch, max_inputs: usize) -> Result<SignedBatch> {
    if batch.len() > max_inputs {
        return Err(PsiError::BatchSizeExceeded { requested: batch.len(), available: max_inputs });
    }
    if let Some(index) = batch.values.iter().position(|a| a >= &private_key.n) {
        return Err(PsiError::ElementOutOfRange { index });
    }

    let arith = private_key.modulus();

    #[cfg(not(feature = "parallel"))]
    let iter = batch.values.iter();
    #[cfg(feature = "parallel")]
    let iter = batch.values.par_iter();

    let values: Vec<BigUint> = iter.map(|a| sign_element(&arith, private_key, a)).collect();

    log::debug!("lot de {} éléments signé", values.len());
    Ok(SignedBatch { values })
}
