use super::{json_pretty, load_engine, EXIT_SUCCESS};
use cartage_core::CoreError;
use cartage_schema::{ModuleReference, Style};
use std::path::Path;

pub fn run(config: &Path, references: &[String], json: bool) -> Result<u8, String> {
    let parsed = references
        .iter()
        .map(|r| ModuleReference::parse(r).map_err(|e| CoreError::from(e).to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let engine = load_engine(config)?;
    let results = engine.classify(&parsed);

    if json {
        println!("{}", json_pretty(&results)?);
        return Ok(EXIT_SUCCESS);
    }

    for result in &results {
        if result.first_party {
            let style = result.style.map_or("unknown", Style::as_str);
            let tiers: Vec<&str> = result.tiers.iter().map(|t| t.as_str()).collect();
            println!(
                "{}: cartridge {} (style {style}; tiers: {})",
                result.reference,
                result.name.as_deref().unwrap_or(""),
                if tiers.is_empty() { "none".to_owned() } else { tiers.join(", ") }
            );
        } else {
            println!("{}: library", result.reference);
        }
    }
    Ok(EXIT_SUCCESS)
}
