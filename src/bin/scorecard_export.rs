use std::path::PathBuf;

use anyhow::{Context, Result};

use crease_terminal::config::Config;
use crease_terminal::export;
use crease_terminal::model::Id;
use crease_terminal::scorecard::{self, NameBook};

fn main() -> Result<()> {
    let match_id = parse_match_arg().context("usage: scorecard_export --match ID [--out PATH]")?;
    let out = parse_out_arg().unwrap_or_else(|| PathBuf::from(format!("scorecard_{match_id}.xlsx")));

    let config = Config::load();
    let backend = config.open_backend()?;
    let record = backend
        .get_match(match_id)?
        .with_context(|| format!("match {match_id} not found"))?;
    let names = NameBook::from_teams(&backend.get_all_teams()?);

    let report = export::export_scorecard(&out, &record, &names)?;

    println!("Scorecard export complete");
    println!("File: {}", out.display());
    println!("Match: {} v {}", record.team_a_name, record.team_b_name);
    for card in scorecard::match_card(&record, &names) {
        println!("  {}", card.total_line());
    }
    if let Some(result) = scorecard::result_line(&record, None) {
        println!("Result: {result}");
    }
    println!(
        "Rows: batting={} bowling={} deliveries={} innings={}",
        report.batting_rows, report.bowling_rows, report.deliveries, report.innings
    );
    Ok(())
}

fn parse_match_arg() -> Option<Id> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix("--match=")
            && let Ok(id) = raw.parse::<Id>()
        {
            return Some(id);
        }
        if arg == "--match"
            && let Some(next) = args.get(idx + 1)
            && let Ok(id) = next.parse::<Id>()
        {
            return Some(id);
        }
    }
    None
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--out=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--out" {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(PathBuf::from(next));
            }
        }
    }
    None
}
