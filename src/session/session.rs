// ============================================================================
// Session PSI — machine à états du protocole complet
//
//   KEYS_READY → FACTORS_READY → FILTER_READY → BLINDED → SIGNED → INTERSECTED
//
// Chaque étape exige l'état précédent exact ; aucune étape ne peut être
// sautée ni rejouée. Toute erreur fait passer la session dans l'état
// terminal Aborted : pas de retour arrière, pas de reprise partielle.
//
// Les deux rôles tournent dans le même processus, mais chaque message
// traverse sa forme sérialisée (lot aveuglé, lot signé, filtre publié).
// ============================================================================

use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::client::{ClientRole, PendingIntersection, RandomFactors};
use crate::config::PsiConfig;
use crate::crypto_error::{ProtocolError, PsiError, Result};
use crate::membership::{BloomFilter, MembershipStructure};
use crate::net_protocol::{BlindedBatch, FilterMessage, SignedBatch};
use crate::rsa::rsa_keygen::{rsa_keygen, RsaKeyPair};
use crate::server::ServerRole;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProtocolState {
    KeysReady,
    FactorsReady,
    FilterReady,
    Blinded,
    Signed,
    Intersected,
    Aborted,
}

impl ProtocolState {
    /// État suivant, ou None pour les états terminaux.
    pub fn next(self) -> Option<ProtocolState> {
        use ProtocolState::*;
        match self {
            KeysReady => Some(FactorsReady),
            FactorsReady => Some(FilterReady),
            FilterReady => Some(Blinded),
            Blinded => Some(Signed),
            Signed => Some(Intersected),
            Intersected | Aborted => None,
        }
    }
}

pub struct Session<M: MembershipStructure = BloomFilter> {
    state: ProtocolState,
    client: ClientRole,
    server: ServerRole,
    factors: Option<RandomFactors>,
    // Lot aveuglé côté client, détient les facteurs jusqu'à l'intersection
    pending: Option<PendingIntersection>,
    // Filtre tel que reçu par le client (désérialisé)
    filter: Option<M>,
    elements: Vec<BigUint>,
    blinded_wire: Vec<u8>,
    signed_wire: Vec<u8>,
}

impl<M: MembershipStructure> Session<M> {
    // -----------------------------------------------------------------------
    // KEYS_READY à partir d'une paire de clés existante
    // -----------------------------------------------------------------------
    pub fn new(config: PsiConfig, keys: RsaKeyPair) -> std::result::Result<Self, ProtocolError> {
        let tag = |source| ProtocolError { phase: ProtocolState::KeysReady, source };
        let RsaKeyPair { public_key, private_key } = keys;
        let server = ServerRole::new(private_key, config.clone()).map_err(tag)?;
        if server.public_key() != public_key {
            return Err(tag(PsiError::KeyMaterialInvalid(
                "clé publique différente de la clé privée".into(),
            )));
        }
        let client = ClientRole::new(public_key, config).map_err(tag)?;

        log::info!("session prête : |n| = {} bits", client.public_key().n.bits());
        Ok(Session {
            state: ProtocolState::KeysReady,
            client,
            server,
            factors: None,
            pending: None,
            filter: None,
            elements: Vec::new(),
            blinded_wire: Vec::new(),
            signed_wire: Vec::new(),
        })
    }

    /// Génère une paire de clés selon la configuration puis ouvre la session.
    pub fn with_fresh_keys(config: PsiConfig) -> std::result::Result<Self, ProtocolError> {
        let tag = |source| ProtocolError { phase: ProtocolState::KeysReady, source };
        config.validate().map_err(tag)?;
        let keys = rsa_keygen(config.modulus_bits, config.public_exponent).map_err(tag)?;
        Self::new(config, keys)
    }

    pub fn state(&self) -> ProtocolState {
        self.state
    }

    pub fn client(&self) -> &ClientRole {
        &self.client
    }

    pub fn server(&self) -> &ServerRole {
        &self.server
    }

    // Vérifie que `to` est bien la transition suivante ; sinon abandon
    fn begin(&mut self, to: ProtocolState) -> std::result::Result<(), ProtocolError> {
        if self.state.next() == Some(to) {
            return Ok(());
        }
        let from = self.state;
        self.finish::<()>(to, Err(PsiError::InvalidTransition { from, to }))
    }

    // Valide la transition si l'étape a réussi, abandonne la session sinon
    fn finish<T>(&mut self, to: ProtocolState, outcome: Result<T>) -> std::result::Result<T, ProtocolError> {
        match outcome {
            Ok(value) => {
                self.state = to;
                Ok(value)
            }
            Err(source) => {
                log::warn!("session abandonnée pendant {to:?} : {source}");
                self.state = ProtocolState::Aborted;
                self.factors = None;
                self.pending = None;
                Err(ProtocolError { phase: to, source })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Hors-ligne (client) : facteurs d'aveuglement
    // -----------------------------------------------------------------------
    pub fn generate_factors(&mut self) -> std::result::Result<(), ProtocolError> {
        let to = ProtocolState::FactorsReady;
        self.begin(to)?;
        let outcome = self.client.generate_random_factors();
        let factors = self.finish(to, outcome)?;
        self.factors = Some(factors);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Hors-ligne (serveur) : filtre publié, puis reçu par le client
    // -----------------------------------------------------------------------
    pub fn build_filter(&mut self, server_elements: &[BigUint]) -> std::result::Result<(), ProtocolError> {
        let to = ProtocolState::FilterReady;
        self.begin(to)?;
        let outcome = self
            .server
            .build_filter::<M>(server_elements)
            .and_then(|filter| FilterMessage::publish(&filter))
            .and_then(|message| message.to_bytes())
            .and_then(|wire| FilterMessage::from_bytes(&wire))
            .and_then(|message| message.open::<M>());
        let filter = self.finish(to, outcome)?;
        self.filter = Some(filter);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // En ligne (client) : lot aveuglé envoyé au serveur.
    // Les facteurs passent dans le lot en attente.
    // -----------------------------------------------------------------------
    pub fn blind(&mut self, client_elements: &[BigUint]) -> std::result::Result<(), ProtocolError> {
        let to = ProtocolState::Blinded;
        self.begin(to)?;
        let outcome = match self.factors.take() {
            Some(factors) => self.client.blind(client_elements, factors).and_then(|pending| {
                let wire = pending.batch().to_bytes()?;
                Ok((pending, wire))
            }),
            None => Err(PsiError::InvalidTransition { from: self.state, to }),
        };
        let (pending, wire) = self.finish(to, outcome)?;
        self.pending = Some(pending);
        self.blinded_wire = wire;
        self.elements = client_elements.to_vec();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // En ligne (serveur) : signature du lot reçu
    // -----------------------------------------------------------------------
    pub fn sign(&mut self) -> std::result::Result<(), ProtocolError> {
        let to = ProtocolState::Signed;
        self.begin(to)?;
        let outcome = BlindedBatch::from_bytes(&self.blinded_wire)
            .and_then(|batch| self.server.sign(&batch))
            .and_then(|signed| signed.to_bytes());
        self.signed_wire = self.finish(to, outcome)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // En ligne (client) : désaveuglement et intersection.
    // Le lot en attente et ses facteurs sont consommés ici.
    // -----------------------------------------------------------------------
    pub fn intersect(&mut self) -> std::result::Result<Vec<BigUint>, ProtocolError> {
        let to = ProtocolState::Intersected;
        self.begin(to)?;
        let outcome = match (self.pending.take(), self.filter.as_ref()) {
            (Some(pending), Some(filter)) => SignedBatch::from_bytes(&self.signed_wire)
                .and_then(|signed| self.client.intersect(&self.elements, &signed, pending, filter)),
            _ => Err(PsiError::InvalidTransition { from: self.state, to }),
        };
        let intersection = self.finish(to, outcome)?;
        log::info!(
            "intersection calculée : {} élément(s) sur {}",
            intersection.len(),
            self.elements.len()
        );
        Ok(intersection)
    }
}

// ---------------------------------------------------------------------------
// Exécution complète du protocole avec un filtre de Bloom
// ---------------------------------------------------------------------------
pub fn run_protocol(
    config: PsiConfig,
    keys: RsaKeyPair,
    server_elements: &[BigUint],
    client_elements: &[BigUint],
) -> std::result::Result<Vec<BigUint>, ProtocolError> {
    let mut session: Session<BloomFilter> = Session::new(config, keys)?;
    session.generate_factors()?;
    session.build_filter(server_elements)?;
    session.blind(client_elements)?;
    session.sign()?;
    session.intersect()
}
