// =========================================================
// PSI par signatures aveugles RSA — démonstration
// X = 0..1024 (serveur), Y = multiples de 5 (client)
// =========================================================

use num_bigint::BigUint;

use rsa_blind_psi::{PsiConfig, ProtocolError, PsiError, Session};

// ─────────────────────────────────────────────────────────
// Erreur applicative centrale
// ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error("Configuration : {0}")]
    Config(#[from] PsiError),
    #[error("Protocole : {0}")]
    Protocol(#[from] ProtocolError),
    #[error("Lecture de la configuration : {0}")]
    Io(#[from] std::io::Error),
}

// ─────────────────────────────────────────────────────────
// Point d'entrée
// ─────────────────────────────────────────────────────────

fn main() {
    pretty_env_logger::init();

    if let Err(e) = run() {
        eprintln!("[ERREUR] {}", e);
        std::process::exit(1);
    }
}

// Configuration : fichier JSON en premier argument, sinon valeurs par défaut
fn load_config() -> Result<PsiConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            Ok(PsiConfig::from_json_str(&raw)?)
        }
        None => Ok(PsiConfig::default()),
    }
}

fn preview(values: &[BigUint]) -> String {
    let head: Vec<String> = values.iter().take(10).map(|v| v.to_string()).collect();
    format!("[{} ...]", head.join(", "))
}

fn run() -> Result<(), AppError> {
    let config = load_config()?;

    let x: Vec<BigUint> = (0..1024u32).map(BigUint::from).collect();
    let y: Vec<BigUint> = (0..1024u32).step_by(5).map(BigUint::from).collect();

    // ── Hors ligne ─────────────────────────────────────────
    println!("Génération des clés ({} bits)...", config.modulus_bits);
    let mut session: Session = Session::with_fresh_keys(config)?;
    session.generate_factors()?;
    session.build_filter(&x)?;

    // ── En ligne ───────────────────────────────────────────
    session.blind(&y)?;
    session.sign()?;
    let x_y = session.intersect()?;

    println!("{} - X original", preview(&x));
    println!("{} - Y original", preview(&y));
    println!("{} - Intersection", preview(&x_y));

    Ok(())
}
