// Structure d'appartenance probabiliste : capacité abstraite + filtre de Bloom

pub mod bloom_filter;
pub mod membership;

pub use bloom_filter::BloomFilter;
pub use membership::MembershipStructure;
