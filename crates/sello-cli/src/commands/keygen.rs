use std::fs;
use std::path::Path;

use colored::Colorize;
use sello_key::{PrivateKey, PRIVATE_KEY_ENV};

use crate::error::{CliError, CliResult};

pub fn handle(output: String) -> CliResult<()> {
    let dir = Path::new(&output);
    fs::create_dir_all(dir)?;

    let private_path = dir.join("private_key.pem");
    let public_path = dir.join("public_key.pem");
    if private_path.exists() {
        return Err(CliError::InvalidInput(format!(
            "{} already exists, refusing to overwrite",
            private_path.display()
        )));
    }

    println!("{}", "Generating Ed25519 key pair...".cyan());
    let key = PrivateKey::generate_ed25519();
    fs::write(&private_path, key.to_pkcs8_pem()?)?;
    fs::write(&public_path, key.public_key_spki_pem()?)?;

    // Keep generated key material out of version control.
    fs::write(dir.join(".gitignore"), "*.pem\n*.key\n*.crt\n")?;

    println!("{} private key: {}", "✓".green(), private_path.display());
    println!("{} public key:  {}", "✓".green(), public_path.display());
    println!("  fingerprint: {}", key.fingerprint_hex()?);
    println!();
    println!("To use it for marking:");
    println!("  export {}={}", PRIVATE_KEY_ENV, private_path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keygen_writes_key_pair() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("keys");
        handle(out.to_string_lossy().into_owned()).unwrap();

        let private_pem = fs::read_to_string(out.join("private_key.pem")).unwrap();
        assert!(private_pem.contains("BEGIN PRIVATE KEY"));
        assert!(PrivateKey::from_pem(&private_pem).is_ok());
        assert!(out.join("public_key.pem").exists());
        assert!(out.join(".gitignore").exists());
    }

    #[test]
    fn test_keygen_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("keys");
        handle(out.to_string_lossy().into_owned()).unwrap();
        assert!(matches!(
            handle(out.to_string_lossy().into_owned()),
            Err(CliError::InvalidInput(_))
        ));
    }
}
