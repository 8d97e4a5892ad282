use std::collections::HashSet;

use crate::model::{Id, Team};

pub const MAX_NAME_LEN: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name is longer than {} characters", MAX_NAME_LEN)]
    NameTooLong,
    #[error("name contains unsupported character {0:?}")]
    InvalidCharacter(char),
    #[error("a player named {0:?} already exists in this team")]
    DuplicateName(String),
    #[error("a team named {0:?} already exists")]
    DuplicateTeam(String),
    #[error("squad needs exactly {expected} players, got {actual}")]
    SquadSize { expected: usize, actual: usize },
    #[error("player {0} appears twice in the squad")]
    DuplicateInSquad(Id),
    #[error("player {0} is not in this team")]
    NotInTeam(Id),
    #[error("a match needs two different teams")]
    SameTeams,
    #[error("team {0} has no playing eleven")]
    SquadNotSelected(String),
    #[error("overs per innings must be between 1 and 50")]
    InvalidOvers,
}

/// Trimmed name, or the reason it cannot be used.
pub fn clean_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::NameTooLong);
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_alphanumeric() || matches!(*c, ' ' | '.' | '\'' | '-')))
    {
        return Err(ValidationError::InvalidCharacter(bad));
    }
    Ok(name)
}

pub fn validate_team_name(raw: &str, existing: &[Team]) -> Result<String, ValidationError> {
    let name = clean_name(raw)?;
    if existing.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
        return Err(ValidationError::DuplicateTeam(name));
    }
    Ok(name)
}

pub fn validate_player_name(raw: &str, team: &Team) -> Result<String, ValidationError> {
    let name = clean_name(raw)?;
    if team
        .players
        .iter()
        .any(|p| p.name.to_lowercase() == name.to_lowercase())
    {
        return Err(ValidationError::DuplicateName(name));
    }
    Ok(name)
}

pub fn validate_squad(
    team: &Team,
    player_ids: &[Id],
    players_per_side: usize,
) -> Result<(), ValidationError> {
    if player_ids.len() != players_per_side {
        return Err(ValidationError::SquadSize {
            expected: players_per_side,
            actual: player_ids.len(),
        });
    }
    let mut seen = HashSet::new();
    for id in player_ids {
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicateInSquad(*id));
        }
        if team.player(*id).is_none() {
            return Err(ValidationError::NotInTeam(*id));
        }
    }
    Ok(())
}

pub fn validate_match_teams(
    team_a: &Team,
    team_b: &Team,
    players_per_side: usize,
) -> Result<(), ValidationError> {
    if team_a.id == team_b.id {
        return Err(ValidationError::SameTeams);
    }
    for team in [team_a, team_b] {
        if team.squad.len() != players_per_side {
            return Err(ValidationError::SquadNotSelected(team.name.clone()));
        }
    }
    Ok(())
}

pub fn validate_overs(overs: u32) -> Result<u32, ValidationError> {
    if (1..=50).contains(&overs) {
        Ok(overs)
    } else {
        Err(ValidationError::InvalidOvers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Player;

    fn team_with(names: &[&str]) -> Team {
        Team {
            id: Id(1),
            name: "Reds".to_string(),
            color: "red".to_string(),
            logo: None,
            players: names
                .iter()
                .enumerate()
                .map(|(i, name)| Player {
                    id: Id(100 + i as u64),
                    team_id: Id(1),
                    name: name.to_string(),
                    batting_order: i as u32 + 1,
                    is_bowler: false,
                })
                .collect(),
            squad: Vec::new(),
        }
    }

    #[test]
    fn names_are_trimmed_and_checked() {
        assert_eq!(clean_name("  Virat   Kohli ").unwrap(), "Virat Kohli");
        assert_eq!(clean_name("   "), Err(ValidationError::EmptyName));
        assert_eq!(
            clean_name("Drop;Table"),
            Err(ValidationError::InvalidCharacter(';'))
        );
        assert_eq!(clean_name(&"x".repeat(41)), Err(ValidationError::NameTooLong));
        assert!(clean_name("D'Arcy Short-Jr.").is_ok());
    }

    #[test]
    fn duplicate_player_names_rejected() {
        let team = team_with(&["Ravi Ashwin"]);
        assert_eq!(
            validate_player_name("ravi ashwin", &team),
            Err(ValidationError::DuplicateName("ravi ashwin".to_string()))
        );
        assert!(validate_player_name("Ravi Jadeja", &team).is_ok());
    }

    #[test]
    fn squad_must_be_full_and_distinct() {
        let team = team_with(&["a", "b", "c"]);
        assert_eq!(
            validate_squad(&team, &[Id(100), Id(101)], 3),
            Err(ValidationError::SquadSize {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(
            validate_squad(&team, &[Id(100), Id(100), Id(101)], 3),
            Err(ValidationError::DuplicateInSquad(Id(100)))
        );
        assert_eq!(
            validate_squad(&team, &[Id(100), Id(101), Id(7)], 3),
            Err(ValidationError::NotInTeam(Id(7)))
        );
        assert!(validate_squad(&team, &[Id(100), Id(101), Id(102)], 3).is_ok());
    }
}
