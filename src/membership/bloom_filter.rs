use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto_error::{PsiError, Result};
use crate::membership::MembershipStructure;

// Version du format binaire publié au client
const FORMAT_VERSION: u8 = 1;

// ε < 2^-64 n'a pas de sens
const MAX_HASHES: u32 = 64;

// ============================================================================
// Filtre de Bloom à hachages SHA-256 indexés
//
//   m = ⌈-1.44 · log2(p) · capacité⌉ bits, k = ⌈-log2(p)⌉ hachages
//   bin_j(x) = SHA-256(j ‖ x) mod m
//
// Aucun faux négatif ; faux positif avec probabilité ≈ p.
// ============================================================================
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilter {
    bits: Vec<u8>,
    nbits: u64,
    nhashes: u32,
    capacity: u64,
    false_positive_rate: f64,
    inserted: u64,
}

// Forme sur le fil — validée champ par champ à la lecture
#[derive(Serialize, Deserialize)]
struct BloomFilterWire {
    version: u8,
    nbits: u64,
    nhashes: u32,
    capacity: u64,
    false_positive_rate: f64,
    inserted: u64,
    bits: Vec<u8>,
}

fn check_rate(p: f64) -> Result<()> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(PsiError::InvalidConfig(format!("taux de faux positifs {p} hors de ]0, 1[")))
    }
}

impl BloomFilter {
    pub fn compute_expansion(p: f64) -> f64 {
        -1.44 * p.log2()
    }

    pub fn compute_nhashes(p: f64) -> u32 {
        ((-p.log2()).ceil() as u32).clamp(1, MAX_HASHES)
    }

    // Filtre vide dimensionné pour `capacity` insertions
    pub fn with_false_positive_prob(p: f64, capacity: usize) -> Result<Self> {
        check_rate(p)?;
        let capacity = capacity.max(1) as u64;
        let nbits = ((Self::compute_expansion(p) * capacity as f64).ceil() as u64).max(8);
        Ok(BloomFilter {
            bits: vec![0u8; nbits.div_ceil(8) as usize],
            nbits,
            nhashes: Self::compute_nhashes(p),
            capacity,
            false_positive_rate: p,
            inserted: 0,
        })
    }

    pub fn len_bits(&self) -> u64 {
        self.nbits
    }

    pub fn nhashes(&self) -> u32 {
        self.nhashes
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn inserted(&self) -> u64 {
        self.inserted
    }

    pub fn false_positive_rate(&self) -> f64 {
        self.false_positive_rate
    }

    // (1 - e^(-k·n/m))^k au remplissage courant
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let k = self.nhashes as f64;
        let fill = -k * self.inserted as f64 / self.nbits as f64;
        (1.0 - fill.exp()).powf(k)
    }

    // Position du bit pour la fonction de hachage `hash_index`
    fn bin(&self, item: &[u8], hash_index: u32) -> u64 {
        let mut h = Sha256::new();
        h.update(u64::from(hash_index).to_le_bytes());
        h.update(item);
        let digest = h.finalize();
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(head) % self.nbits
    }

    pub fn insert(&mut self, item: &str) {
        for hash_index in 0..self.nhashes {
            let i = self.bin(item.as_bytes(), hash_index);
            self.bits[(i / 8) as usize] |= 1 << (i % 8);
        }
        self.inserted += 1;
    }

    fn test_bit(&self, i: u64) -> bool {
        self.bits[(i / 8) as usize] & (1 << (i % 8)) != 0
    }
}

impl MembershipStructure for BloomFilter {
    fn build(items: &[String], false_positive_rate: f64) -> Result<Self> {
        let mut filter = Self::with_false_positive_prob(false_positive_rate, items.len())?;
        for item in items {
            filter.insert(item);
        }
        Ok(filter)
    }

    fn contains(&self, item: &str) -> bool {
        (0..self.nhashes).all(|hash_index| self.test_bit(self.bin(item.as_bytes(), hash_index)))
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let wire = BloomFilterWire {
            version: FORMAT_VERSION,
            nbits: self.nbits,
            nhashes: self.nhashes,
            capacity: self.capacity,
            false_positive_rate: self.false_positive_rate,
            inserted: self.inserted,
            bits: self.bits.clone(),
        };
        bincode::serialize(&wire).map_err(|e| PsiError::MessageEncoding(e.to_string()))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let fail = |msg: String| PsiError::StructureDeserializationFailed(msg);

        let wire: BloomFilterWire = bincode::deserialize(bytes).map_err(|e| fail(e.to_string()))?;

        if wire.version != FORMAT_VERSION {
            return Err(fail(format!("version de format {} inconnue", wire.version)));
        }
        if wire.nbits == 0 {
            return Err(fail("filtre de taille nulle".into()));
        }
        if wire.nhashes == 0 || wire.nhashes > MAX_HASHES {
            return Err(fail(format!("nombre de hachages {} invalide", wire.nhashes)));
        }
        if wire.bits.len() as u64 != wire.nbits.div_ceil(8) {
            return Err(fail(format!(
                "{} octets de bits pour {} bits annoncés",
                wire.bits.len(),
                wire.nbits
            )));
        }
        check_rate(wire.false_positive_rate).map_err(|e| fail(e.to_string()))?;

        Ok(BloomFilter {
            bits: wire.bits,
            nbits: wire.nbits,
            nhashes: wire.nhashes,
            capacity: wire.capacity,
            false_positive_rate: wire.false_positive_rate,
            inserted: wire.inserted,
        })
    }
}
