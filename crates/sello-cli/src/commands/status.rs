use colored::Colorize;
use sello_core::{select_signer, ManifestSigner as _};
use sello_key::{PrivateKey, CERTIFICATE_ENV, PRIVATE_KEY_ENV};

use crate::{commands::resolve_material, error::CliResult};

/// Report the signing configuration a mark would use, without touching any
/// image. Mirrors the signer selection policy exactly by invoking it.
pub fn handle(key: Option<String>, certificate: Option<String>) -> CliResult<()> {
    let material = resolve_material(key, certificate);

    println!("{}", "Signing configuration".cyan());
    match &material {
        None => {
            println!(
                "{} no private key configured ({} unset)",
                "!".yellow(),
                PRIVATE_KEY_ENV
            );
        }
        Some(material) => {
            if let Some(path) = &material.private_key_path {
                println!("  private key: {}", path.display());
                if !material.is_available() {
                    println!("    {}", "not a readable file".red());
                } else {
                    match PrivateKey::load_pem_file(path) {
                        Ok(key) => {
                            println!("    algorithm: {}", key.algorithm().as_str());
                            println!("    fingerprint: {}", key.fingerprint_hex()?);
                        }
                        Err(e) => println!("    {}", format!("does not parse: {e}").red()),
                    }
                }
            }
            match &material.certificate_path {
                Some(path) if path.is_file() => println!("  certificate: {}", path.display()),
                Some(path) => println!(
                    "  certificate: {} {}",
                    path.display(),
                    "(missing)".yellow()
                ),
                None => println!("  certificate: none ({} unset)", CERTIFICATE_ENV),
            }
        }
    }

    let (signer, downgrade) = select_signer(material.as_ref());
    println!();
    match downgrade {
        None => println!(
            "{} marks will carry a {} signature",
            "✓".green(),
            signer.kind().to_string().green()
        ),
        Some(reason) => {
            println!(
                "{} marks will carry a {} signature: {reason}",
                "!".yellow(),
                signer.kind().to_string().yellow()
            );
            println!("  (integrity stamp only; proves non-tampering, not identity)");
        }
    }
    Ok(())
}
