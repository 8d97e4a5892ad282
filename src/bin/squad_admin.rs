use anyhow::{Context, Result, anyhow, bail};

use crease_terminal::backend::Backend;
use crease_terminal::config::Config;
use crease_terminal::model::{Id, Team};
use crease_terminal::validation;

const USAGE: &str = "usage: squad_admin <command> [options]

commands:
  teams                                         list teams, players and elevens
  add-team --name NAME [--color C] [--logo URL]
  add-player --team ID --name NAME [--order N] [--bowler]
  select-squad --team ID (--players ID,ID,... | --auto)
  rules [--name NAME] [--overs N] [--per-side N] [--bowler-overs N]
  match-rules --match ID [--overs N] [--bowler-overs N]
  reset --yes                                   delete every team, player and match";

fn main() -> Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let Some(command) = args.first().cloned() else {
        println!("{USAGE}");
        return Ok(());
    };
    let config = Config::load();
    let mut backend = config.open_backend()?;

    match command.as_str() {
        "teams" => list_teams(backend.as_ref()),
        "add-team" => add_team(backend.as_mut(), &args),
        "add-player" => add_player(backend.as_mut(), &args),
        "select-squad" => select_squad(backend.as_mut(), &args),
        "rules" => tournament_rules(backend.as_mut(), &args),
        "match-rules" => match_rules(backend.as_mut(), &args),
        "reset" => {
            if !has_flag(&args, "--yes") {
                bail!("reset deletes all data; pass --yes to confirm");
            }
            backend.reset_all_data()?;
            config.open_store().wipe();
            println!("All data reset");
            Ok(())
        }
        "-h" | "--help" | "help" => {
            println!("{USAGE}");
            Ok(())
        }
        other => Err(anyhow!("unknown command {other:?}\n\n{USAGE}")),
    }
}

fn list_teams(backend: &dyn Backend) -> Result<()> {
    let teams = backend.get_all_teams()?;
    if teams.is_empty() {
        println!("No teams");
        return Ok(());
    }
    for team in &teams {
        println!(
            "{} {} ({} players, eleven {})",
            team.id,
            team.name,
            team.players.len(),
            team.squad.len()
        );
        let mut players = team.players.iter().collect::<Vec<_>>();
        players.sort_by_key(|p| p.batting_order);
        for p in players {
            let in_xi = if team.squad.contains(&p.id) { "*" } else { " " };
            let role = if p.is_bowler { "bowls" } else { "" };
            println!("  {in_xi} {:>2} {} {} {}", p.batting_order, p.id, p.name, role);
        }
    }
    Ok(())
}

fn add_team(backend: &mut dyn Backend, args: &[String]) -> Result<()> {
    let raw = arg_value(args, "--name").context("--name is required")?;
    let teams = backend.get_all_teams()?;
    let name = validation::validate_team_name(&raw, &teams)?;
    let color = arg_value(args, "--color").unwrap_or_else(|| "white".to_string());
    let logo = arg_value(args, "--logo");
    let id = backend.add_team(&name, &color, logo.as_deref())?;
    println!("Team {name} added with id {id}");
    Ok(())
}

fn add_player(backend: &mut dyn Backend, args: &[String]) -> Result<()> {
    let team = find_team(backend, args)?;
    let raw = arg_value(args, "--name").context("--name is required")?;
    let name = validation::validate_player_name(&raw, &team)?;
    let order = match arg_value(args, "--order") {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid --order {raw:?}"))?,
        None => team.players.len() as u32 + 1,
    };
    let id = backend.add_player(team.id, &name, order, has_flag(args, "--bowler"))?;
    println!("Player {name} added to {} with id {id}", team.name);
    Ok(())
}

fn select_squad(backend: &mut dyn Backend, args: &[String]) -> Result<()> {
    let team = find_team(backend, args)?;
    let per_side = backend.get_tournament_rules()?.match_rules.players_per_side as usize;
    let ids = if has_flag(args, "--auto") {
        let mut players = team.players.iter().collect::<Vec<_>>();
        players.sort_by_key(|p| p.batting_order);
        players.into_iter().take(per_side).map(|p| p.id).collect()
    } else {
        let raw = arg_value(args, "--players").context("--players or --auto is required")?;
        parse_ids(&raw)?
    };
    validation::validate_squad(&team, &ids, per_side)?;
    backend.select_squad(team.id, &ids)?;
    println!("Eleven selected for {} ({} players)", team.name, ids.len());
    Ok(())
}

fn tournament_rules(backend: &mut dyn Backend, args: &[String]) -> Result<()> {
    let mut rules = backend.get_tournament_rules()?;
    let mut changed = false;
    if let Some(name) = arg_value(args, "--name") {
        rules.name = validation::clean_name(&name)?;
        changed = true;
    }
    if let Some(overs) = parse_u32_arg(args, "--overs")? {
        rules.match_rules.overs_per_innings = validation::validate_overs(overs)?;
        changed = true;
    }
    if let Some(per_side) = parse_u32_arg(args, "--per-side")? {
        if !(2..=11).contains(&per_side) {
            bail!("--per-side must be between 2 and 11");
        }
        rules.match_rules.players_per_side = per_side;
        changed = true;
    }
    if let Some(max) = parse_u32_arg(args, "--bowler-overs")? {
        rules.match_rules.max_overs_per_bowler = max;
        changed = true;
    }
    if changed {
        backend.update_tournament_rules(&rules)?;
        println!("Tournament rules updated");
    }
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

fn match_rules(backend: &mut dyn Backend, args: &[String]) -> Result<()> {
    let raw = arg_value(args, "--match").context("--match is required")?;
    let match_id = raw
        .trim()
        .parse::<Id>()
        .with_context(|| format!("invalid match id {raw:?}"))?;
    let record = backend
        .get_match(match_id)?
        .with_context(|| format!("match {match_id} not found"))?;
    let mut rules = record.rules;
    if let Some(overs) = parse_u32_arg(args, "--overs")? {
        rules.overs_per_innings = validation::validate_overs(overs)?;
    }
    if let Some(max) = parse_u32_arg(args, "--bowler-overs")? {
        rules.max_overs_per_bowler = max;
    }
    backend.update_match_rules(match_id, &rules)?;
    println!("Rules for match {match_id} updated");
    println!("{}", serde_json::to_string_pretty(&rules)?);
    Ok(())
}

fn find_team(backend: &dyn Backend, args: &[String]) -> Result<Team> {
    let raw = arg_value(args, "--team").context("--team is required")?;
    let id = raw
        .trim()
        .parse::<Id>()
        .with_context(|| format!("invalid team id {raw:?}"))?;
    backend
        .get_all_teams()?
        .into_iter()
        .find(|t| t.id == id)
        .with_context(|| format!("team {id} not found"))
}

fn arg_value(args: &[String], key: &str) -> Option<String> {
    let prefix = format!("{key}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == key
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn parse_u32_arg(args: &[String], key: &str) -> Result<Option<u32>> {
    arg_value(args, key)
        .map(|raw| {
            raw.parse::<u32>()
                .with_context(|| format!("invalid {key} {raw:?}"))
        })
        .transpose()
}

fn parse_ids(raw: &str) -> Result<Vec<Id>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<Id>()
                .with_context(|| format!("invalid player id {part:?}"))
        })
        .collect()
}
