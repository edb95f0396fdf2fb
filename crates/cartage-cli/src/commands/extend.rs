use super::{colorize_tier, json_pretty, load_engine, EXIT_SUCCESS};
use cartage_schema::Tier;
use std::path::Path;

pub fn run(config: &Path, tier: Tier, json: bool) -> Result<u8, String> {
    let engine = load_engine(config)?;
    let report = engine
        .extend_cartridge_list(tier)
        .map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    let output = report
        .output
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    println!("{}: wrote {output}", colorize_tier(tier));
    for name in &report.cartridges {
        println!("  + cartridges {name}");
    }
    for name in &report.dbinit {
        println!("  + cartridges.dbinit {name}");
    }
    for reference in &report.skipped {
        println!("  skipped {reference}");
    }
    Ok(EXIT_SUCCESS)
}
