use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};
use num_integer::Integer;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::config::MIN_MODULUS_BITS;
use crate::crypto_error::{PsiError, Result};
use crate::rsa::arith::{ModularArithmetic, Modulus};
use crate::rsa::math::{generate_prime, is_probable_prime, lcm, miller_rabin_rounds, mod_inverse};

// ============================================================================
// Clé publique RSA — publiée au client, pas de données secrètes
// ============================================================================
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKey {
    pub n: BigUint,
    pub e: BigUint,
}

impl PublicKey {
    pub fn modulus(&self) -> Modulus {
        Modulus::new(self.n.clone())
    }

    // -----------------------------------------------------------------------
    // Contrôle défensif : n impair, composé, e impair dans [3, n).
    // Ne prouve pas que n = p·q, écarte seulement les clés mal formées.
    // -----------------------------------------------------------------------
    pub fn validate(&self) -> Result<()> {
        if self.n <= BigUint::from(3u32) {
            return Err(PsiError::KeyMaterialInvalid("module n trop petit".into()));
        }
        if self.n.is_even() {
            return Err(PsiError::KeyMaterialInvalid("module n pair".into()));
        }
        if is_probable_prime(&self.n, miller_rabin_rounds(self.n.bits()), &mut OsRng) {
            return Err(PsiError::KeyMaterialInvalid("module n premier".into()));
        }
        if self.e < BigUint::from(3u32) || self.e.is_even() || self.e >= self.n {
            return Err(PsiError::KeyMaterialInvalid(
                "exposant public e hors de [3, n) ou pair".into(),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// Clé privée RSA
//
// d est remis à zéro à la destruction. BigUint ne donne pas accès à ses
// limbes : la valeur n'est plus lisible via la clé, mais les octets libérés
// par le Vec interne ne sont pas écrasés.
// ============================================================================
#[derive(Clone)]
pub struct PrivateKey {
    pub n: BigUint,
    pub e: BigUint,
    pub d: BigUint,
}

impl PrivateKey {
    pub fn public_key(&self) -> PublicKey {
        PublicKey { n: self.n.clone(), e: self.e.clone() }
    }

    pub fn modulus(&self) -> Modulus {
        Modulus::new(self.n.clone())
    }

    // -----------------------------------------------------------------------
    // Validation : partie publique + 1 < d < n + sonde de cohérence
    // (v^e)^d ≡ v mod n pour une valeur fixe.
    // -----------------------------------------------------------------------
    pub fn validate(&self) -> Result<()> {
        self.public_key().validate()?;
        if self.d <= BigUint::one() || self.d >= self.n {
            return Err(PsiError::KeyMaterialInvalid("exposant privé d hors de ]1, n)".into()));
        }
        let m = self.modulus();
        let witness = BigUint::from(0x5eed_u32) % &self.n;
        let signed = m.pow_mod(&witness, &self.d);
        if m.pow_mod(&signed, &self.e) != witness {
            return Err(PsiError::KeyMaterialInvalid("e·d ≢ 1 mod λ(n)".into()));
        }
        Ok(())
    }
}

// d n'apparaît jamais dans les journaux
impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey")
            .field("n_bits", &self.n.bits())
            .field("e", &self.e)
            .field("d", &"<secret>")
            .finish()
    }
}

impl Zeroize for PrivateKey {
    fn zeroize(&mut self) {
        self.d.set_zero();
    }
}

impl Drop for PrivateKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

// ============================================================================
// Paire de clés
// ============================================================================
#[derive(Clone, Debug)]
pub struct RsaKeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

// ============================================================================
// Génération de clés RSA
//
// n = p·q avec |p| = ⌈bits/2⌉, |q| = ⌊bits/2⌋, gcd(e, p-1) = gcd(e, q-1) = 1.
// d = e^-1 mod λ(n), λ(n) = lcm(p-1, q-1).
// ============================================================================
pub fn rsa_keygen(modulus_bits: u64, public_exponent: u64) -> Result<RsaKeyPair> {
    rsa_keygen_with_rng(modulus_bits, public_exponent, &mut OsRng)
}

pub fn rsa_keygen_with_rng(
    modulus_bits: u64,
    public_exponent: u64,
    rng: &mut impl RngCore,
) -> Result<RsaKeyPair> {
    if modulus_bits < MIN_MODULUS_BITS {
        return Err(PsiError::KeySizeTooSmall {
            requested: modulus_bits,
            minimum: MIN_MODULUS_BITS,
        });
    }
    if public_exponent < 3 || public_exponent % 2 == 0 {
        return Err(PsiError::KeyMaterialInvalid(format!(
            "exposant public {public_exponent} : doit être impair et >= 3"
        )));
    }

    let e = BigUint::from(public_exponent);
    let q_bits = modulus_bits / 2;
    let p_bits = modulus_bits - q_bits;

    let p = generate_prime(p_bits, &e, rng)?;
    let mut q = generate_prime(q_bits, &e, rng)?;
    while p == q {
        q = generate_prime(q_bits, &e, rng)?;
    }

    let n = &p * &q;
    let lambda = lcm(&(&p - BigUint::one()), &(&q - BigUint::one()));

    // gcd(e, λ) = 1 garanti par generate_prime — Err par sécurité
    let d = mod_inverse(&e, &lambda)?;
    debug_assert_eq!(n.bits(), modulus_bits);
    debug_assert!(!d.is_zero());

    log::debug!("clés RSA générées : |n| = {} bits, e = {}", n.bits(), e);

    let private_key = PrivateKey { n, e, d };
    Ok(RsaKeyPair { public_key: private_key.public_key(), private_key })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn textbook_private() -> PrivateKey {
        PrivateKey {
            n: BigUint::from(3233u32),
            e: BigUint::from(17u32),
            d: BigUint::from(2753u32),
        }
    }

    #[test]
    fn test_keygen_512_is_consistent() {
        let kp = rsa_keygen(512, 65537).unwrap();
        assert_eq!(kp.public_key.n.bits(), 512);
        assert_eq!(kp.public_key, kp.private_key.public_key());
        assert!(kp.private_key.validate().is_ok());
    }

    #[test]
    fn test_keygen_rejects_small_modulus_and_bad_exponent() {
        assert!(matches!(rsa_keygen(256, 65537), Err(PsiError::KeySizeTooSmall { .. })));
        assert!(matches!(rsa_keygen(512, 2), Err(PsiError::KeyMaterialInvalid(_))));
    }

    #[test]
    fn test_textbook_key_validates() {
        assert!(textbook_private().validate().is_ok());
    }

    #[test]
    fn test_public_key_validation_catches_malformed_modulus() {
        let e = BigUint::from(17u32);
        let even = PublicKey { n: BigUint::from(3234u32), e: e.clone() };
        let prime = PublicKey { n: BigUint::from(7919u32), e: e.clone() };
        let tiny = PublicKey { n: BigUint::from(3u32), e: e.clone() };
        let bad_e = PublicKey { n: BigUint::from(3233u32), e: BigUint::from(4u32) };
        for pk in [even, prime, tiny, bad_e] {
            assert!(matches!(pk.validate(), Err(PsiError::KeyMaterialInvalid(_))), "{pk:?}");
        }
    }

    #[test]
    fn test_inconsistent_private_exponent_detected() {
        let mut sk = textbook_private();
        sk.d = BigUint::from(2751u32);
        assert!(matches!(sk.validate(), Err(PsiError::KeyMaterialInvalid(_))));
    }

    #[test]
    fn test_debug_redacts_private_exponent() {
        let printed = format!("{:?}", textbook_private());
        assert!(!printed.contains("2753"));
        assert!(printed.contains("<secret>"));
    }

    #[test]
    fn test_zeroize_clears_private_exponent() {
        let mut sk = textbook_private();
        sk.zeroize();
        assert!(sk.d.is_zero());
        assert_eq!(sk.n, BigUint::from(3233u32));
    }
}
