use num_bigint::{BigUint, RandBigInt};
use num_traits::Zero;
use rand_core::{OsRng, RngCore};
use zeroize::Zeroize;

use crate::crypto_error::Result;
use crate::rsa::arith::ModularArithmetic;
use crate::rsa::rsa_keygen::PublicKey;

// ============================================================================
// Facteur d'aveuglement : (r^-1 mod n, r^e mod n) pour un r frais
// ============================================================================
pub struct RandomFactor {
    pub r_inv: BigUint,
    pub r_pow: BigUint,
}

impl Zeroize for RandomFactor {
    fn zeroize(&mut self) {
        self.r_inv.set_zero();
        self.r_pow.set_zero();
    }
}

// ============================================================================
// Facteurs d'une session — USAGE UNIQUE
//
// Ni Clone ni Copy : l'aveuglement consomme la valeur, un second lot
// aveuglé avec les mêmes facteurs ne compile pas. Remis à zéro au Drop
// (mêmes limites que PrivateKey : les limbes libérés ne sont pas écrasés).
// ============================================================================
pub struct RandomFactors {
    factors: Vec<RandomFactor>,
}

impl RandomFactors {
    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RandomFactor> {
        self.factors.get(index)
    }

    pub fn as_slice(&self) -> &[RandomFactor] {
        &self.factors
    }
}

impl Drop for RandomFactors {
    fn drop(&mut self) {
        for factor in self.factors.iter_mut() {
            factor.zeroize();
        }
    }
}

// Tire r dans [0, n) jusqu'à ce que r^-1 existe (gcd(r, n) = 1)
fn sample_factor<A: ModularArithmetic>(
    arith: &A,
    e: &BigUint,
    rng: &mut impl RngCore,
) -> RandomFactor {
    loop {
        let mut r = rng.gen_biguint_below(arith.modulus());
        match arith.inv_mod(&r) {
            Ok(r_inv) => {
                let r_pow = arith.pow_mod(&r, e);
                r.set_zero();
                return RandomFactor { r_inv, r_pow };
            }
            Err(_) => {
                log::trace!("facteur non inversible, nouveau tirage");
                r.set_zero();
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Génère `count` facteurs d'aveuglement pour la clé publique du serveur.
// Err(KeyMaterialInvalid) si la clé est mal formée.
// ---------------------------------------------------------------------------
pub fn generate_random_factors(public_key: &PublicKey, count: usize) -> Result<RandomFactors> {
    generate_random_factors_with_rng(public_key, count, &mut OsRng)
}

pub fn generate_random_factors_with_rng(
    public_key: &PublicKey,
    count: usize,
    rng: &mut impl RngCore,
) -> Result<RandomFactors> {
    public_key.validate()?;

    let arith = public_key.modulus();
    let factors = (0..count)
        .map(|_| sample_factor(&arith, &public_key.e, &mut *rng))
        .collect();

    log::debug!("{count} facteurs d'aveuglement générés");
    Ok(RandomFactors { factors })
}
