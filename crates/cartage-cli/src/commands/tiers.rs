use super::{colorize_tier, json_pretty, EXIT_SUCCESS};
use cartage_schema::{Style, Tier};
use serde::Serialize;

#[derive(Serialize)]
struct StyleRow {
    style: Style,
    environment_type: Tier,
    tiers: Vec<Tier>,
}

fn rows() -> Vec<StyleRow> {
    Style::ALL_STYLES
        .into_iter()
        .map(|style| StyleRow {
            style,
            environment_type: style.environment_type(),
            tiers: Tier::ORDERED
                .into_iter()
                .filter(|t| t.accepts(style))
                .collect(),
        })
        .collect()
}

pub fn run(json: bool) -> Result<u8, String> {
    let rows = rows();
    if json {
        println!("{}", json_pretty(&rows)?);
        return Ok(EXIT_SUCCESS);
    }

    println!("{:<12} {:<12} DEPLOYED IN", "STYLE", "TYPE");
    for row in &rows {
        let tiers: Vec<String> = row.tiers.iter().map(|t| colorize_tier(*t)).collect();
        println!(
            "{:<12} {:<12} {}",
            row.style,
            row.environment_type,
            tiers.join(" ")
        );
    }
    Ok(EXIT_SUCCESS)
}
