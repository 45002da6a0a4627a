use crate::crypto_error::Result;

// ============================================================================
// Capacité d'appartenance probabiliste indexée par chaînes
//
// Contrat :
//   - aucun faux négatif : tout élément passé à `build` est reconnu ;
//   - faux positifs avec probabilité ≈ false_positive_rate ;
//   - from_bytes(to_bytes(s)) répond à toute requête comme s.
//
// Le protocole est générique sur ce trait : une variante (filtre extensible,
// filtre à compteurs…) se substitue sans toucher au code client/serveur.
// Send + Sync : la structure publiée est partagée en lecture seule entre
// les threads qui traitent un lot.
// ============================================================================
pub trait MembershipStructure: Sized + Send + Sync {
    /// Construit la structure dimensionnée pour `items.len()` éléments.
    fn build(items: &[String], false_positive_rate: f64) -> Result<Self>;

    fn contains(&self, item: &str) -> bool;

    /// Forme sérialisée publiée par le serveur
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Err(StructureDeserializationFailed) si les octets sont corrompus
    /// ou d'un format incompatible.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}
