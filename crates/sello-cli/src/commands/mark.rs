use std::path::{Path, PathBuf};

use colored::Colorize;
use sello_core::mark_file;

use crate::{
    commands::resolve_material,
    error::{CliError, CliResult},
};

pub fn handle(
    input: String,
    output: Option<String>,
    prompt: String,
    model: String,
    author: String,
    key: Option<String>,
    certificate: Option<String>,
) -> CliResult<()> {
    let input_path = Path::new(&input);
    if !input_path.exists() {
        return Err(CliError::FileNotFound(input));
    }
    let output_path = output.map(PathBuf::from);
    let material = resolve_material(key, certificate);

    println!("{}", format!("Marking image: {input}").cyan());
    let (outcome, sidecar_path) = mark_file(
        input_path,
        output_path.as_deref(),
        &prompt,
        &model,
        &author,
        material,
    )?;

    let target = output_path.unwrap_or_else(|| input_path.to_path_buf());
    println!(
        "{} marked {} image written to {}",
        "✓".green(),
        outcome.format,
        target.display()
    );
    println!("  sidecar: {}", sidecar_path.display());
    println!("  instance: {}", outcome.manifest.instance_id);

    match &outcome.downgrade {
        None => {
            if let Some(kind) = outcome.manifest.signature_kind() {
                println!("  signature: {}", kind.to_string().green());
            }
        }
        Some(reason) => {
            println!(
                "{} {}",
                "!".yellow(),
                format!("simulated signature used ({reason})").yellow()
            );
            println!("  a simulated signature proves integrity, not signer identity");
        }
    }
    Ok(())
}
