use num_bigint::BigUint;

use crate::crypto_error::Result;
use crate::rsa::math::mod_inverse;

// ============================================================================
// Façade arithmétique modulaire
//
// Toute la logique du protocole passe par ces trois opérations : le code
// client/serveur ne manipule jamais directement modpow ou l'Euclide étendu.
// ============================================================================
pub trait ModularArithmetic {
    /// Module n de l'anneau Z_n
    fn modulus(&self) -> &BigUint;

    /// (a · b) mod n
    fn mul_mod(&self, a: &BigUint, b: &BigUint) -> BigUint;

    /// base^exponent mod n
    fn pow_mod(&self, base: &BigUint, exponent: &BigUint) -> BigUint;

    /// a^-1 mod n, ou Err(ModularInverseUndefined) si gcd(a, n) != 1
    fn inv_mod(&self, a: &BigUint) -> Result<BigUint>;
}

/// Implémentation sur `num_bigint::BigUint`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modulus {
    n: BigUint,
}

impl Modulus {
    pub fn new(n: BigUint) -> Self {
        Modulus { n }
    }
}

impl ModularArithmetic for Modulus {
    fn modulus(&self) -> &BigUint {
        &self.n
    }

    fn mul_mod(&self, a: &BigUint, b: &BigUint) -> BigUint {
        (a * b) % &self.n
    }

    fn pow_mod(&self, base: &BigUint, exponent: &BigUint) -> BigUint {
        base.modpow(exponent, &self.n)
    }

    fn inv_mod(&self, a: &BigUint) -> Result<BigUint> {
        mod_inverse(a, &self.n)
    }
}

// ---------------------------------------------------------------------------
// Représentation canonique d'un entier pour les requêtes du filtre :
// base 10, sans zéro de tête ("0" pour zéro).
// ---------------------------------------------------------------------------
pub fn canonical_key(value: &BigUint) -> String {
    value.to_str_radix(10)
}
