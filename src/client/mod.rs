// Rôle client : facteurs aléatoires, aveuglement, calcul de l'intersection

pub mod blinder;
pub mod client;
pub mod intersection;
pub mod random_factors;

pub use blinder::{blind_batch, PendingIntersection};
pub use client::ClientRole;
pub use intersection::find_intersection;
pub use random_factors::{
    generate_random_factors, generate_random_factors_with_rng, RandomFactor, RandomFactors,
};
