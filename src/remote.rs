//! JSON-over-HTTP client for the hosted scoring service.
//!
//! Every operation is `POST {base}/rpc/{method}` with a JSON object of
//! arguments; the service answers `{"ok": <value>}` or `{"err": "<message>"}`.

use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::backend::{Backend, BackendError, BackendResult};
use crate::model::{Delivery, Id, Match, MatchRules, Team, TournamentRules};

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client; the first caller's timeout sticks.
fn rpc_client(timeout: Duration) -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(concat!("crease_terminal/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build http client")
    })
}

pub struct HttpBackend {
    client: &'static Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            anyhow::bail!("BACKEND_URL is empty");
        }
        Ok(Self {
            client: rpc_client(timeout)?,
            base_url,
        })
    }

    fn call<T: DeserializeOwned>(&self, method: &str, args: Value) -> BackendResult<T> {
        let url = format!("{}/rpc/{}", self.base_url, method);
        let resp = self
            .client
            .post(&url)
            .json(&args)
            .send()
            .map_err(|err| BackendError::classify(err.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| BackendError::classify(err.to_string()))?;
        if !status.is_success() {
            return Err(BackendError::classify(format!("http {}: {}", status, body)));
        }
        parse_reply(&body)
    }
}

#[derive(Debug, Deserialize)]
struct Reply {
    #[serde(default)]
    ok: Option<Value>,
    #[serde(default)]
    err: Option<String>,
}

pub fn parse_reply<T: DeserializeOwned>(raw: &str) -> BackendResult<T> {
    let reply = serde_json::from_str::<Reply>(raw)
        .map_err(|err| BackendError::Protocol(format!("invalid reply: {err}")))?;
    if let Some(message) = reply.err {
        return Err(BackendError::classify(message));
    }
    serde_json::from_value(reply.ok.unwrap_or(Value::Null))
        .map_err(|err| BackendError::Protocol(format!("invalid payload: {err}")))
}

pub fn parse_match_reply(raw: &str) -> BackendResult<Option<Match>> {
    missing_as_none(parse_reply(raw))
}

/// An unknown match reads as absent whether the service says so in the
/// reply or in the HTTP status.
fn missing_as_none(result: BackendResult<Option<Match>>) -> BackendResult<Option<Match>> {
    match result {
        Err(BackendError::NotFound(_)) => Ok(None),
        other => other,
    }
}

impl Backend for HttpBackend {
    fn add_team(&mut self, name: &str, color: &str, logo: Option<&str>) -> BackendResult<Id> {
        self.call(
            "addTeam",
            json!({ "name": name, "color": color, "logo": logo }),
        )
    }

    fn add_player(
        &mut self,
        team_id: Id,
        name: &str,
        batting_order: u32,
        is_bowler: bool,
    ) -> BackendResult<Id> {
        self.call(
            "addPlayer",
            json!({
                "teamId": team_id,
                "name": name,
                "battingOrder": batting_order,
                "isBowler": is_bowler,
            }),
        )
    }

    fn select_squad(&mut self, team_id: Id, player_ids: &[Id]) -> BackendResult<()> {
        self.call(
            "selectSquad",
            json!({ "teamId": team_id, "playerIds": player_ids }),
        )
    }

    fn create_match(&mut self, team_a: Id, team_b: Id, rules: &MatchRules) -> BackendResult<Id> {
        self.call(
            "createMatch",
            json!({ "teamAId": team_a, "teamBId": team_b, "rules": rules }),
        )
    }

    fn record_delivery(
        &mut self,
        match_id: Id,
        innings: u8,
        delivery: &Delivery,
    ) -> BackendResult<()> {
        self.call(
            "recordDelivery",
            json!({ "matchId": match_id, "innings": innings, "delivery": delivery }),
        )
    }

    fn finish_match(&mut self, match_id: Id, result: &str) -> BackendResult<()> {
        self.call(
            "finishMatch",
            json!({ "matchId": match_id, "result": result }),
        )
    }

    fn get_match(&self, match_id: Id) -> BackendResult<Option<Match>> {
        missing_as_none(self.call("getMatch", json!({ "matchId": match_id })))
    }

    fn get_all_teams(&self) -> BackendResult<Vec<Team>> {
        self.call("getAllTeams", json!({}))
    }

    fn get_tournament_rules(&self) -> BackendResult<TournamentRules> {
        self.call("getTournamentRules", json!({}))
    }

    fn update_tournament_rules(&mut self, rules: &TournamentRules) -> BackendResult<()> {
        self.call("updateTournamentRules", json!({ "rules": rules }))
    }

    fn update_match_rules(&mut self, match_id: Id, rules: &MatchRules) -> BackendResult<()> {
        self.call(
            "updateMatchRules",
            json!({ "matchId": match_id, "rules": rules }),
        )
    }

    fn reset_all_data(&mut self) -> BackendResult<()> {
        self.call("resetAllData", json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_match_is_absent_on_every_path() {
        assert_eq!(parse_match_reply(r#"{"err":"match 9 not found"}"#).unwrap(), None);
        assert_eq!(parse_match_reply(r#"{"ok":null}"#).unwrap(), None);
        let status = BackendError::classify("http 404 Not Found: match not found");
        assert_eq!(missing_as_none(Err(status)).unwrap(), None);
        let down = BackendError::classify("connection refused");
        assert!(missing_as_none(Err(down)).unwrap_err().is_unavailable());
    }
}
