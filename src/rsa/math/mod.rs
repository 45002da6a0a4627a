// Réexporte les primitives arithmétiques (pgcd, inverse, primalité)

mod math;

pub use math::{gcd, lcm, mod_inverse, generate_prime, is_probable_prime, miller_rabin_rounds};
