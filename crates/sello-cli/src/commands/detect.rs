use std::path::Path;

use colored::Colorize;
use sello_core::{classify_path, DetectionSource, SignatureKind};

use crate::error::CliResult;

pub fn handle(input: String, json: bool) -> CliResult<()> {
    let result = classify_path(Path::new(&input));

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if !result.exists {
        println!("{} {}", "✗".red(), format!("{input} does not exist").red());
        return Ok(());
    }

    println!("{}", format!("Detection result for {input}").cyan());
    match result.format {
        Some(format) => println!("  format: {format}"),
        None => println!("  format: {}", "unknown".yellow()),
    }

    if result.ai_generated {
        println!("  ai_generated: {}", "true".green());
    } else {
        println!("  ai_generated: {}", "false".red());
    }
    println!("  source: {}", result.source);

    match result.signature_kind {
        Some(SignatureKind::Real) => println!("  signature: {}", "real".green()),
        Some(SignatureKind::Simulated) => {
            println!("  signature: {}", "simulated".yellow());
            println!("    (integrity stamp only; proves non-tampering, not identity)");
        }
        None => {
            if result.source != DetectionSource::None {
                println!("  signature: none");
            }
        }
    }

    if !result.details.is_empty() {
        println!("  details:");
        for (key, value) in &result.details {
            println!("    {key}: {}", truncated(value));
        }
    }
    Ok(())
}

/// Long values (the embedded manifest JSON in particular) are clipped for
/// terminal display.
fn truncated(value: &str) -> String {
    const MAX: usize = 100;
    if value.len() <= MAX {
        return value.to_string();
    }
    let mut end = MAX;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &value[..end])
}
