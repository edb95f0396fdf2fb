use super::{colorize_tier, json_pretty, load_engine, EXIT_MANIFEST_DRIFT, EXIT_SUCCESS};
use std::path::Path;

pub fn run(config: &Path, json: bool) -> Result<u8, String> {
    let engine = load_engine(config)?;
    let report = engine.check().map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        for tier in &report.tiers {
            let label = colorize_tier(tier.tier);
            if tier.missing {
                println!("{label}: {} missing", tier.path.display());
            } else if tier.has_drift() {
                println!("{label}: {} out of date", tier.path.display());
            } else {
                println!("{label}: up to date");
            }
            for id in &tier.added {
                println!("  + {id}");
            }
            for id in &tier.removed {
                println!("  - {id}");
            }
        }
    }

    Ok(if report.has_drift {
        EXIT_MANIFEST_DRIFT
    } else {
        EXIT_SUCCESS
    })
}
