// ============================================================================
// Messages du protocole (client ⇄ serveur) et leur encodage bincode
//
// Client → Serveur : BlindedBatch (longueur <= max_inputs)
// Serveur → Client : SignedBatch (même longueur, même ordre)
//                    + FilterMessage (filtre publié, hors-ligne)
// ============================================================================

use bincode::Options;
use num_bigint::BigUint;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::crypto_error::{PsiError, Result};
use crate::membership::MembershipStructure;

/// Taille maximale d'un message décodé (16 Mo) : un préfixe de longueur
/// falsifié ne peut pas déclencher une allocation non bornée.
pub const MAX_MESSAGE_BYTES: u64 = 16 * 1024 * 1024;

fn wire_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_MESSAGE_BYTES)
}

pub fn encode_message<T: Serialize>(message: &T) -> Result<Vec<u8>> {
    wire_options()
        .serialize(message)
        .map_err(|e| PsiError::MessageEncoding(e.to_string()))
}

pub fn decode_message<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    wire_options()
        .deserialize(bytes)
        .map_err(|e| PsiError::MessageEncoding(e.to_string()))
}

/// Lot aveuglé : entrée i = y_i · r_i^e mod n, alignée sur Y.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindedBatch {
    pub values: Vec<BigUint>,
}

/// Lot signé : entrée i = (blinded_i)^d mod n, alignée sur le lot aveuglé.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBatch {
    pub values: Vec<BigUint>,
}

impl BlindedBatch {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_message(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_message(bytes)
    }
}

impl SignedBatch {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_message(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_message(bytes)
    }
}

// ---------------------------------------------------------------------------
// Filtre publié par le serveur : forme sérialisée d'une MembershipStructure.
// Toute erreur de lecture devient StructureDeserializationFailed.
// ---------------------------------------------------------------------------
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMessage {
    pub payload: Vec<u8>,
}

impl FilterMessage {
    pub fn publish<M: MembershipStructure>(filter: &M) -> Result<Self> {
        Ok(FilterMessage { payload: filter.to_bytes()? })
    }

    pub fn open<M: MembershipStructure>(&self) -> Result<M> {
        M::from_bytes(&self.payload)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        encode_message(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        decode_message(bytes).map_err(|e| match e {
            PsiError::MessageEncoding(msg) => PsiError::StructureDeserializationFailed(msg),
            other => other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::BloomFilter;

    #[test]
    fn test_batch_survives_the_wire_in_order() {
        let batch = BlindedBatch {
            values: vec![BigUint::from(3u32), BigUint::from(0u32), BigUint::from(1u32) << 600],
        };
        let decoded = BlindedBatch::from_bytes(&batch.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(SignedBatch::from_bytes(&[1, 2, 3]), Err(PsiError::MessageEncoding(_))));
    }

    #[test]
    fn test_forged_length_prefix_is_bounded() {
        // Préfixe annonçant 2^62 éléments
        let mut bytes = (1u64 << 62).to_le_bytes().to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(BlindedBatch::from_bytes(&bytes), Err(PsiError::MessageEncoding(_))));
    }

    #[test]
    fn test_published_filter_opens_identically() {
        let items: Vec<String> = (0..200u32).map(|i| i.to_string()).collect();
        let filter = BloomFilter::build(&items, 0.001).unwrap();
        let wire = FilterMessage::publish(&filter).unwrap().to_bytes().unwrap();
        let opened: BloomFilter = FilterMessage::from_bytes(&wire).unwrap().open().unwrap();
        assert_eq!(opened, filter);
    }

    #[test]
    fn test_corrupted_filter_message_rejected() {
        assert!(matches!(
            FilterMessage::from_bytes(&[7, 0, 0]),
            Err(PsiError::StructureDeserializationFailed(_))
        ));
        // Enveloppe lisible, contenu qui n'est pas un filtre
        let wire = FilterMessage { payload: vec![1, 2, 3] }.to_bytes().unwrap();
        let message = FilterMessage::from_bytes(&wire).unwrap();
        assert!(matches!(
            message.open::<BloomFilter>(),
            Err(PsiError::StructureDeserializationFailed(_))
        ));
    }
}
