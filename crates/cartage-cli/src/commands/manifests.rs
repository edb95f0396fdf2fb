use super::{colorize_tier, json_pretty, load_engine, EXIT_SUCCESS};
use std::path::Path;

pub fn run(config: &Path, json: bool) -> Result<u8, String> {
    let engine = load_engine(config)?;
    let report = engine.run().map_err(|e| e.to_string())?;
    engine.write_manifests(&report).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    for manifest in &report.tiers {
        println!(
            "{:<22} {:>4} libraries  {:>3} excluded  {}",
            colorize_tier(manifest.tier),
            manifest.libraries.len(),
            manifest.excluded.len(),
            manifest.path.display()
        );
    }
    if !report.drifts.is_empty() {
        println!("{} version drift(s) resolved:", report.drifts.len());
        for drift in &report.drifts {
            println!(
                "  {} ({}): {} over {}",
                drift.key, drift.kind, drift.chosen, drift.other
            );
        }
    }
    let stats = report.classification;
    if stats.failures > 0 {
        println!(
            "{} metadata lookup(s) failed; those modules were treated as libraries",
            stats.failures
        );
    }
    Ok(EXIT_SUCCESS)
}
