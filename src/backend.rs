//! Operations the scoring service exposes. The service owns ids, rule
//! enforcement and the committed delivery record.

use crate::model::{Delivery, Id, Match, MatchRules, Team, TournamentRules};

/// Lowercase fragments that mark an infrastructure failure rather than a
/// rejected request.
const UNAVAILABLE_SIGNATURES: &[&str] = &[
    "connection refused",
    "connection reset",
    "connection closed",
    "error sending request",
    "timed out",
    "timeout",
    "dns error",
    "failed to lookup address",
    "network is unreachable",
    "service unavailable",
    "bad gateway",
    "gateway timeout",
    "http 502",
    "http 503",
    "http 504",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("unexpected response: {0}")]
    Protocol(String),
}

impl BackendError {
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        if UNAVAILABLE_SIGNATURES.iter().any(|sig| lower.contains(sig)) {
            BackendError::Unavailable(message)
        } else if lower.contains("not found") {
            BackendError::NotFound(message)
        } else {
            BackendError::Rejected(message)
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, BackendError::Unavailable(_))
    }

    /// Text for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Unavailable(_) => {
                "Scoring service is unavailable. Check the connection and press r to retry."
                    .to_string()
            }
            BackendError::NotFound(what) => format!("Not found: {what}"),
            BackendError::Rejected(msg) | BackendError::Protocol(msg) => {
                format!("Request failed: {msg}")
            }
        }
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

pub trait Backend: Send {
    fn add_team(&mut self, name: &str, color: &str, logo: Option<&str>) -> BackendResult<Id>;

    fn add_player(
        &mut self,
        team_id: Id,
        name: &str,
        batting_order: u32,
        is_bowler: bool,
    ) -> BackendResult<Id>;

    fn select_squad(&mut self, team_id: Id, player_ids: &[Id]) -> BackendResult<()>;

    /// `team_a` bats first.
    fn create_match(&mut self, team_a: Id, team_b: Id, rules: &MatchRules) -> BackendResult<Id>;

    fn record_delivery(
        &mut self,
        match_id: Id,
        innings: u8,
        delivery: &Delivery,
    ) -> BackendResult<()>;

    fn finish_match(&mut self, match_id: Id, result: &str) -> BackendResult<()>;

    fn get_match(&self, match_id: Id) -> BackendResult<Option<Match>>;

    fn get_all_teams(&self) -> BackendResult<Vec<Team>>;

    fn get_tournament_rules(&self) -> BackendResult<TournamentRules>;

    fn update_tournament_rules(&mut self, rules: &TournamentRules) -> BackendResult<()>;

    fn update_match_rules(&mut self, match_id: Id, rules: &MatchRules) -> BackendResult<()>;

    fn reset_all_data(&mut self) -> BackendResult<()>;
}
