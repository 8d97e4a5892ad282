use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend-allocated identifier. Values routinely exceed 2^53, so they travel
/// as decimal text in every serialized form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(pub u64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<u64>().map(Id)
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(text) => text.parse::<Id>().map_err(serde::de::Error::custom),
            Raw::Number(n) => Ok(Id(n)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Wicket {
    Bowled,
    Caught,
    Lbw,
    RunOut,
    Stumped,
    HitWicket,
    Other(String),
}

impl Wicket {
    pub fn label(&self) -> &str {
        match self {
            Wicket::Bowled => "Bowled",
            Wicket::Caught => "Caught",
            Wicket::Lbw => "LBW",
            Wicket::RunOut => "Run out",
            Wicket::Stumped => "Stumped",
            Wicket::HitWicket => "Hit wicket",
            Wicket::Other(text) => text.as_str(),
        }
    }

    /// Scorecard dismissal line, e.g. `lbw b Khan`.
    pub fn dismissal_text(&self, bowler: &str) -> String {
        match self {
            Wicket::Bowled => format!("b {bowler}"),
            Wicket::Caught => format!("c & b {bowler}"),
            Wicket::Lbw => format!("lbw b {bowler}"),
            Wicket::RunOut => "run out".to_string(),
            Wicket::Stumped => format!("st b {bowler}"),
            Wicket::HitWicket => format!("hit wicket b {bowler}"),
            Wicket::Other(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    "out".to_string()
                } else {
                    trimmed.to_string()
                }
            }
        }
    }

    pub fn credited_to_bowler(&self) -> bool {
        match self {
            Wicket::Bowled
            | Wicket::Caught
            | Wicket::Lbw
            | Wicket::Stumped
            | Wicket::HitWicket => true,
            Wicket::RunOut | Wicket::Other(_) => false,
        }
    }

    /// Only these can remove the batsman at the bowler's end.
    pub fn can_dismiss_non_striker(&self) -> bool {
        matches!(self, Wicket::RunOut | Wicket::Other(_))
    }

    /// All fixed kinds in display order, used by the wicket picker.
    pub fn fixed_kinds() -> [Wicket; 6] {
        [
            Wicket::Bowled,
            Wicket::Caught,
            Wicket::Lbw,
            Wicket::RunOut,
            Wicket::Stumped,
            Wicket::HitWicket,
        ]
    }
}

/// One ball bowled. `runs` includes every extra.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub batsman_id: Id,
    pub bowler_id: Id,
    pub runs: u32,
    #[serde(default)]
    pub is_wide: bool,
    #[serde(default)]
    pub is_no_ball: bool,
    #[serde(default)]
    pub is_bye: bool,
    #[serde(default)]
    pub is_leg_bye: bool,
    #[serde(default)]
    pub is_free_hit: bool,
    #[serde(default)]
    pub wicket: Option<Wicket>,
    /// Set when the batsman out is not the one on strike, e.g. a run out at
    /// the bowler's end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed_id: Option<Id>,
}

impl Delivery {
    pub fn new(batsman_id: Id, bowler_id: Id, runs: u32) -> Self {
        Self {
            batsman_id,
            bowler_id,
            runs,
            is_wide: false,
            is_no_ball: false,
            is_bye: false,
            is_leg_bye: false,
            is_free_hit: false,
            wicket: None,
            dismissed_id: None,
        }
    }

    /// Batsman dismissed on this ball, if any.
    pub fn dismissed(&self) -> Option<Id> {
        self.wicket
            .as_ref()
            .map(|_| self.dismissed_id.unwrap_or(self.batsman_id))
    }

    pub fn is_legal(&self) -> bool {
        !self.is_wide && !self.is_no_ball
    }

    /// Runs not credited to the striker's bat.
    pub fn extras(&self) -> u32 {
        if self.is_wide {
            return self.runs;
        }
        let mut extras = 0;
        let mut rest = self.runs;
        if self.is_no_ball {
            extras += rest.min(1);
            rest = rest.saturating_sub(1);
        }
        if self.is_bye || self.is_leg_bye {
            extras += rest;
        }
        extras
    }

    pub fn off_bat(&self) -> u32 {
        self.runs.saturating_sub(self.extras())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InningsSummary {
    #[serde(default)]
    pub runs: u32,
    #[serde(default)]
    pub wickets: u32,
    #[serde(default)]
    pub overs: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Innings {
    pub batting_team: Id,
    pub bowling_team: Id,
    #[serde(default)]
    pub deliveries: Vec<Delivery>,
    #[serde(default)]
    pub summary: InningsSummary,
}

impl Innings {
    pub fn new(batting_team: Id, bowling_team: Id) -> Self {
        Self {
            batting_team,
            bowling_team,
            deliveries: Vec::new(),
            summary: InningsSummary::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: Id,
    pub team_id: Id,
    pub name: String,
    pub batting_order: u32,
    #[serde(default)]
    pub is_bowler: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub players: Vec<Player>,
    /// Playing eleven, in batting order.
    #[serde(default)]
    pub squad: Vec<Id>,
}

impl Team {
    pub fn player(&self, id: Id) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Squad members resolved to players, falling back to the full roster
    /// when no eleven has been picked yet.
    pub fn playing_eleven(&self) -> Vec<&Player> {
        if self.squad.is_empty() {
            let mut all = self.players.iter().collect::<Vec<_>>();
            all.sort_by_key(|p| p.batting_order);
            return all;
        }
        self.squad.iter().filter_map(|id| self.player(*id)).collect()
    }
}

/// Per-match rule parameters. Powerplay fields are carried through to the
/// backend untouched; nothing on this side enforces fielding restrictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchRules {
    pub overs_per_innings: u32,
    pub players_per_side: u32,
    pub max_overs_per_bowler: u32,
    pub powerplay_overs: u32,
    pub first_over_powerplay: bool,
    pub wide_runs: u32,
    pub no_ball_runs: u32,
    pub free_hit_on_no_ball: bool,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            overs_per_innings: 20,
            players_per_side: 11,
            max_overs_per_bowler: 4,
            powerplay_overs: 6,
            first_over_powerplay: false,
            wide_runs: 1,
            no_ball_runs: 1,
            free_hit_on_no_ball: true,
        }
    }
}

impl MatchRules {
    /// Wickets that end an innings (all out).
    pub fn max_wickets(&self) -> u32 {
        self.players_per_side.saturating_sub(1).max(1)
    }

    pub fn balls_per_innings(&self) -> u32 {
        self.overs_per_innings.saturating_mul(6)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TournamentRules {
    pub name: String,
    pub match_rules: MatchRules,
}

impl Default for TournamentRules {
    fn default() -> Self {
        Self {
            name: "Friendly".to_string(),
            match_rules: MatchRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub id: Id,
    pub team_a: Id,
    pub team_b: Id,
    #[serde(default)]
    pub team_a_name: String,
    #[serde(default)]
    pub team_b_name: String,
    #[serde(default)]
    pub rules: MatchRules,
    #[serde(default)]
    pub innings: Vec<Innings>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Match {
    /// Innings by 1-based number.
    pub fn innings_no(&self, number: u8) -> Option<&Innings> {
        let idx = usize::from(number).checked_sub(1)?;
        self.innings.get(idx)
    }

    pub fn deliveries(&self, number: u8) -> &[Delivery] {
        self.innings_no(number)
            .map(|inn| inn.deliveries.as_slice())
            .unwrap_or(&[])
    }

    pub fn team_name(&self, team_id: Id) -> &str {
        if team_id == self.team_a {
            &self.team_a_name
        } else if team_id == self.team_b {
            &self.team_b_name
        } else {
            "?"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Id,
    pub team_a: String,
    pub team_b: String,
    #[serde(default)]
    pub finished: bool,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_text_and_accept_numbers() {
        let id = Id(18_446_744_073_709_551_000);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"18446744073709551000\"");
        assert_eq!(serde_json::from_str::<Id>(&json).unwrap(), id);
        assert_eq!(serde_json::from_str::<Id>("42").unwrap(), Id(42));
        assert!(serde_json::from_str::<Id>("\"abc\"").is_err());
    }

    #[test]
    fn extras_split_by_delivery_kind() {
        let mut wide = Delivery::new(Id(1), Id(2), 3);
        wide.is_wide = true;
        assert_eq!(wide.extras(), 3);
        assert_eq!(wide.off_bat(), 0);

        let mut no_ball = Delivery::new(Id(1), Id(2), 5);
        no_ball.is_no_ball = true;
        assert_eq!(no_ball.extras(), 1);
        assert_eq!(no_ball.off_bat(), 4);

        let mut no_ball_bye = no_ball.clone();
        no_ball_bye.runs = 3;
        no_ball_bye.is_bye = true;
        assert_eq!(no_ball_bye.extras(), 3);

        let mut leg_bye = Delivery::new(Id(1), Id(2), 2);
        leg_bye.is_leg_bye = true;
        assert!(leg_bye.is_legal());
        assert_eq!(leg_bye.off_bat(), 0);
    }

    #[test]
    fn dismissed_defaults_to_striker() {
        let mut d = Delivery::new(Id(1), Id(2), 1);
        assert_eq!(d.dismissed(), None);
        d.wicket = Some(Wicket::RunOut);
        assert_eq!(d.dismissed(), Some(Id(1)));
        d.dismissed_id = Some(Id(3));
        assert_eq!(d.dismissed(), Some(Id(3)));
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""dismissed_id":"3""#));
        assert!(!serde_json::to_string(&Delivery::new(Id(1), Id(2), 0))
            .unwrap()
            .contains("dismissed_id"));
        assert!(Wicket::RunOut.can_dismiss_non_striker());
        assert!(!Wicket::Bowled.can_dismiss_non_striker());
    }

    #[test]
    fn wicket_round_trips_with_payload() {
        let other = Wicket::Other("retired hurt".to_string());
        let json = serde_json::to_string(&other).unwrap();
        assert_eq!(json, r#"{"kind":"other","text":"retired hurt"}"#);
        assert_eq!(serde_json::from_str::<Wicket>(&json).unwrap(), other);
        assert_eq!(
            serde_json::from_str::<Wicket>(r#"{"kind":"lbw"}"#).unwrap(),
            Wicket::Lbw
        );
        assert_eq!(Wicket::Lbw.dismissal_text("Khan"), "lbw b Khan");
        assert!(!Wicket::RunOut.credited_to_bowler());
    }

    #[test]
    fn rules_default_to_t20() {
        let rules: MatchRules = serde_json::from_str("{\"overs_per_innings\": 5}").unwrap();
        assert_eq!(rules.overs_per_innings, 5);
        assert_eq!(rules.players_per_side, 11);
        assert_eq!(rules.max_wickets(), 10);
        assert_eq!(rules.balls_per_innings(), 30);
    }
}
