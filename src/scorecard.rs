use std::collections::HashMap;

use crate::model::{Id, Match, Team};
use crate::progression::{self, Phase};
use crate::stats::{self, Extras, InningsStats};

/// Player and team names by id, built from the backend's team list.
#[derive(Debug, Clone, Default)]
pub struct NameBook {
    names: HashMap<Id, String>,
}

impl NameBook {
    pub fn from_teams(teams: &[Team]) -> Self {
        let mut names = HashMap::new();
        for team in teams {
            names.insert(team.id, team.name.clone());
            for player in &team.players {
                names.insert(player.id, player.name.clone());
            }
        }
        Self { names }
    }

    pub fn name(&self, id: Id) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("#{id}"))
    }

    pub fn name_opt(&self, id: Option<Id>) -> String {
        id.map(|id| self.name(id)).unwrap_or_else(|| "-".to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BattingRow {
    pub name: String,
    pub dismissal: String,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BowlingRow {
    pub name: String,
    pub overs: String,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub economy: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InningsCard {
    pub number: u8,
    pub batting_team: String,
    pub batting: Vec<BattingRow>,
    pub bowling: Vec<BowlingRow>,
    pub extras: Extras,
    pub totals: InningsStats,
    pub fall_of_wickets: Vec<String>,
}

impl InningsCard {
    pub fn total_line(&self) -> String {
        format!(
            "{} {}/{} ({} ov, RR {:.2})",
            self.batting_team,
            self.totals.runs,
            self.totals.wickets,
            self.totals.overs,
            self.totals.run_rate
        )
    }
}

pub fn innings_card(m: &Match, number: u8, names: &NameBook) -> Option<InningsCard> {
    let innings = m.innings_no(number)?;
    let deliveries = &innings.deliveries;

    let batting = stats::batting_card(deliveries)
        .into_iter()
        .map(|s| BattingRow {
            name: names.name(s.batsman_id),
            dismissal: match (&s.dismissal, s.dismissed_by) {
                (Some(wicket), Some(bowler)) => wicket.dismissal_text(&names.name(bowler)),
                _ => "not out".to_string(),
            },
            runs: s.runs,
            balls: s.balls,
            fours: s.fours,
            sixes: s.sixes,
            strike_rate: s.strike_rate,
        })
        .collect();

    let bowling = stats::bowling_card(deliveries)
        .into_iter()
        .map(|s| BowlingRow {
            name: names.name(s.bowler_id),
            overs: s.overs,
            maidens: s.maidens,
            runs: s.runs,
            wickets: s.wickets,
            economy: s.economy,
        })
        .collect();

    let fall_of_wickets = stats::fall_of_wickets(deliveries)
        .into_iter()
        .map(|f| {
            format!(
                "{}-{} ({}, {} ov)",
                f.score,
                f.wicket,
                names.name(f.batsman_id),
                f.overs
            )
        })
        .collect();

    Some(InningsCard {
        number,
        batting_team: m.team_name(innings.batting_team).to_string(),
        batting,
        bowling,
        extras: stats::extras_breakdown(deliveries),
        totals: stats::innings_stats(deliveries),
        fall_of_wickets,
    })
}

pub fn match_card(m: &Match, names: &NameBook) -> Vec<InningsCard> {
    (1..=2)
        .filter_map(|n| innings_card(m, n, names))
        .filter(|card| card.number == 1 || !card.batting.is_empty())
        .collect()
}

/// Stored result text, or the computed outcome once both innings are done.
pub fn result_line(m: &Match, phase: Option<Phase>) -> Option<String> {
    if let Some(result) = m.result.as_ref().filter(|r| !r.trim().is_empty()) {
        return Some(result.clone());
    }
    if !m.finished && phase != Some(Phase::Finished) {
        return None;
    }
    let first = m.innings_no(1)?;
    let second = m.innings_no(2)?;
    let outcome = progression::decide_outcome(&first.deliveries, &second.deliveries, &m.rules);
    Some(outcome.describe(
        m.team_name(first.batting_team),
        m.team_name(second.batting_team),
    ))
}
