// ===========================================================================
// Gestion centralisée des erreurs du protocole PSI
//
// Tous les modules utilisent ce type au lieu de panic!/assert!/unwrap().
// L'appelant reçoit une Err(...) identifiant la précondition violée,
// jamais un résultat silencieusement faux.
// ===========================================================================

use thiserror::Error;

use crate::session::ProtocolState;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PsiError {
    // --- Erreurs de clés ---
    /// Champs de clé mal formés ou incohérents (n pair, premier, e invalide…)
    #[error("Matériel de clé RSA invalide : {0}")]
    KeyMaterialInvalid(String),
    /// Taille de module demandée trop petite
    #[error("Taille de module {requested} bits insuffisante, minimum requis : {minimum} bits")]
    KeySizeTooSmall { requested: u64, minimum: u64 },

    // --- Erreurs mathématiques internes ---
    /// L'inverse modulaire n'existe pas (gcd != 1) — rattrapé par rééchantillonnage
    #[error("Impossible de calculer l'inverse modulaire (gcd != 1)")]
    ModularInverseUndefined,

    // --- Erreurs de lot ---
    /// Lot plus long que le maximum configuré ou que le nombre de facteurs
    #[error("Taille de lot {requested} dépasse la capacité disponible ({available})")]
    BatchSizeExceeded { requested: usize, available: usize },
    /// Lot reçu désaligné : sa longueur diffère de celle du lot aveuglé
    #[error("Lot désaligné : {received} entrées reçues, {expected} attendues")]
    BatchMisaligned { expected: usize, received: usize },
    /// Élément >= n (hors domaine Z_n)
    #[error("L'élément d'indice {index} doit être dans [0, n)")]
    ElementOutOfRange { index: usize },

    // --- Erreurs de structure / messages ---
    /// Filtre sérialisé corrompu ou incompatible
    #[error("Désérialisation de la structure d'appartenance échouée : {0}")]
    StructureDeserializationFailed(String),
    /// Message du protocole illisible ou non encodable
    #[error("Encodage du message échoué : {0}")]
    MessageEncoding(String),

    // --- Erreurs de configuration / session ---
    #[error("Configuration invalide : {0}")]
    InvalidConfig(String),
    /// Transition sautée, répétée ou demandée après un abandon
    #[error("Transition de {from:?} vers {to:?} interdite")]
    InvalidTransition { from: ProtocolState, to: ProtocolState },
}

/// Erreur d'une session : la phase qui était en cours d'entrée + la cause.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Phase {phase:?} abandonnée : {source}")]
pub struct ProtocolError {
    pub phase: ProtocolState,
    #[source]
    pub source: PsiError,
}

pub type Result<T> = std::result::Result<T, PsiError>;
