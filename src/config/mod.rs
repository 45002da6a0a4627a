mod config;

pub use config::{
    PsiConfig, DEFAULT_FALSE_POSITIVE_RATE, DEFAULT_MAX_INPUTS, DEFAULT_MODULUS_BITS,
    DEFAULT_PUBLIC_EXPONENT, MIN_MODULUS_BITS,
};
