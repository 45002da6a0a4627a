use serde::{Deserialize, Serialize};

use crate::crypto_error::{PsiError, Result};

// ─────────────────────────────────────────────────────────
// Paramètres par défaut du protocole
// ─────────────────────────────────────────────────────────

pub const DEFAULT_MODULUS_BITS: u64 = 2048;
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 0x10001;
pub const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.001;
pub const DEFAULT_MAX_INPUTS: usize = 1024;

/// En dessous, le module se factorise trivialement.
pub const MIN_MODULUS_BITS: u64 = 512;

// ============================================================================
// Configuration explicite d'une session PSI
//
// Passée par valeur à chaque rôle (ClientRole, ServerRole) : aucun état
// global, aucune valeur par défaut mutable partagée entre sessions.
// ============================================================================
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PsiConfig {
    /// Taille du module RSA n en bits
    pub modulus_bits: u64,
    /// Exposant public e
    pub public_exponent: u64,
    /// Taux de faux positifs cible ε du filtre
    pub false_positive_rate: f64,
    /// Taille maximale d'un lot client (= nombre de facteurs générés)
    pub max_inputs: usize,
}

impl Default for PsiConfig {
    fn default() -> Self {
        PsiConfig {
            modulus_bits: DEFAULT_MODULUS_BITS,
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            false_positive_rate: DEFAULT_FALSE_POSITIVE_RATE,
            max_inputs: DEFAULT_MAX_INPUTS,
        }
    }
}

impl PsiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.modulus_bits < MIN_MODULUS_BITS {
            return Err(PsiError::KeySizeTooSmall {
                requested: self.modulus_bits,
                minimum: MIN_MODULUS_BITS,
            });
        }
        if self.public_exponent < 3 || self.public_exponent % 2 == 0 {
            return Err(PsiError::InvalidConfig(format!(
                "exposant public {} : doit être impair et >= 3",
                self.public_exponent
            )));
        }
        // NaN échoue aussi cette comparaison
        if !(self.false_positive_rate > 0.0 && self.false_positive_rate < 1.0) {
            return Err(PsiError::InvalidConfig(format!(
                "taux de faux positifs {} hors de ]0, 1[",
                self.false_positive_rate
            )));
        }
        if self.max_inputs == 0 {
            return Err(PsiError::InvalidConfig(
                "max_inputs doit être >= 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Charge une configuration JSON ; les champs absents prennent
    /// leur valeur par défaut. La configuration obtenue est validée.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: PsiConfig = serde_json::from_str(raw)
            .map_err(|e| PsiError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
