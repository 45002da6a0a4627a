mod arith;

pub use arith::{canonical_key, ModularArithmetic, Modulus};
