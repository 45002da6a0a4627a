use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use rand_core::RngCore;

use crate::crypto_error::{PsiError, Result};

// ---------------------------------------------------------------------------
// Petits premiers impairs < 1000 (crible préliminaire avant Miller-Rabin)
// ---------------------------------------------------------------------------
const SMALL_PRIMES: &[u32] = &[
      3,   5,   7,  11,  13,  17,  19,  23,  29,  31,  37,  41,
     43,  47,  53,  59,  61,  67,  71,  73,  79,  83,  89,  97,
    101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151, 157,
    163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227,
    229, 233, 239, 241, 251, 257, 263, 269, 271, 277, 281, 283,
    293, 307, 311, 313, 317, 331, 337, 347, 349, 353, 359, 367,
    373, 379, 383, 389, 397, 401, 409, 419, 421, 431, 433, 439,
    443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503, 509,
    521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599,
    601, 607, 613, 617, 619, 631, 641, 643, 647, 653, 659, 661,
    673, 677, 683, 691, 701, 709, 719, 727, 733, 739, 743, 751,
    757, 761, 769, 773, 787, 797, 809, 811, 821, 823, 827, 829,
    839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911, 919,
    929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997,
];

// Calcule le pgcd de deux nombres
pub fn gcd(a: &BigUint, b: &BigUint) -> BigUint {
    a.gcd(b)
}

pub fn lcm(a: &BigUint, b: &BigUint) -> BigUint {
    a.lcm(b)
}

// ---------------------------------------------------------------------------
// Calcule l'inverse modulaire de a mod n via Bézout.
// Retourne Err(PsiError::ModularInverseUndefined) si gcd(a, n) != 1.
// ---------------------------------------------------------------------------
pub fn mod_inverse(a: &BigUint, n: &BigUint) -> Result<BigUint> {
    if n.is_zero() {
        return Err(PsiError::ModularInverseUndefined);
    }

    let n_big = BigInt::from(n.clone());
    let ext = BigInt::from(a.clone()).extended_gcd(&n_big);
    if !ext.gcd.is_one() {
        return Err(PsiError::ModularInverseUndefined);
    }

    // x peut être négatif : on le ramène dans [0, n)
    let mut x = ext.x % &n_big;
    if x.is_negative() {
        x += &n_big;
    }

    // Invariant : x est dans [0, n) après la correction ci-dessus
    x.to_biguint().ok_or(PsiError::ModularInverseUndefined)
}

// ---------------------------------------------------------------------------
// Nombre de rounds Miller-Rabin selon la taille du candidat
// (erreur < 2^-80 pour des candidats aléatoires)
// ---------------------------------------------------------------------------
pub fn miller_rabin_rounds(nbits: u64) -> u32 {
    match nbits {
        0..=255 => 16,
        256..=511 => 8,
        512..=1023 => 6,
        _ => 4,
    }
}

// Vrai si n est divisible par un petit premier distinct de n
fn divisible_by_small_prime(n: &BigUint) -> bool {
    SMALL_PRIMES.iter().any(|&sp| {
        let bp = BigUint::from(sp);
        n != &bp && (n % &bp).is_zero()
    })
}

pub fn is_probable_prime(n: &BigUint, rounds: u32, rng: &mut impl RngCore) -> bool {
    if n <= &BigUint::one() { return false; }
    if n == &BigUint::from(2u32) || n == &BigUint::from(3u32) { return true; }
    if n.is_even() { return false; }
    if SMALL_PRIMES.iter().any(|&p| n == &BigUint::from(p)) { return true; }
    if divisible_by_small_prime(n) { return false; }

    let n_minus_1 = n - BigUint::one();
    let mut d = n_minus_1.clone();
    let mut r = 0u32;
    while d.is_even() {
        d >>= 1;
        r += 1;
    }

    let two = BigUint::from(2u32);
    'witness: for _ in 0..rounds {
        let a = rng.gen_biguint_range(&two, &(n - &two));
        let mut x = a.modpow(&d, n);
        if x.is_one() || x == n_minus_1 {
            continue 'witness;
        }
        for _ in 0..r.saturating_sub(1) {
            x = (&x * &x) % n;
            if x == n_minus_1 {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

// ---------------------------------------------------------------------------
// Génère un premier p de exactement `nbits` bits tel que gcd(e, p-1) = 1,
// condition nécessaire pour que e soit inversible modulo λ(n).
//
// Les deux bits de poids fort sont forcés : le produit de deux tels
// premiers a exactement la somme de leurs tailles en bits.
// ---------------------------------------------------------------------------
pub fn generate_prime(nbits: u64, e: &BigUint, rng: &mut impl RngCore) -> Result<BigUint> {
    if nbits < 16 {
        return Err(PsiError::KeySizeTooSmall { requested: nbits, minimum: 16 });
    }

    let rounds = miller_rabin_rounds(nbits);

    loop {
        let mut candidate = rng.gen_biguint(nbits);
        candidate.set_bit(nbits - 1, true);
        candidate.set_bit(nbits - 2, true);
        candidate.set_bit(0, true);

        if divisible_by_small_prime(&candidate) {
            continue;
        }
        if !gcd(e, &(&candidate - BigUint::one())).is_one() {
            continue;
        }
        if is_probable_prime(&candidate, rounds, rng) {
            debug_assert_eq!(candidate.bits(), nbits);
            return Ok(candidate);
        }
    }
}
