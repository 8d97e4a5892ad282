use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, Transaction, params};

use crate::backend::{Backend, BackendError, BackendResult};
use crate::model::{
    Delivery, Id, Innings, InningsSummary, Match, MatchRules, Player, Team, TournamentRules,
};
use crate::persist::app_data_dir;
use crate::stats;

const TOURNAMENT_RULES_KEY: &str = "tournament_rules";

/// SQLite stand-in for the hosted service, used for offline scoring and
/// tests. Ids are random 64-bit values stored as text.
pub struct LocalBackend {
    conn: Connection,
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join("scoring.sqlite"))
}

impl LocalBackend {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn =
            Connection::open(path).with_context(|| format!("open sqlite db {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode = WAL;")
            .context("enable sqlite wal")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory sqlite db")?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn team_rows(&self) -> BackendResult<Vec<Team>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, color, logo FROM teams ORDER BY created_at, name")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Team {
                    id: parse_id(&row.get::<_, String>(0)?),
                    name: row.get(1)?,
                    color: row.get(2)?,
                    logo: row.get(3)?,
                    players: Vec::new(),
                    squad: Vec::new(),
                })
            })
            .map_err(db_err)?;
        let mut teams = Vec::new();
        for team in rows {
            let mut team = team.map_err(db_err)?;
            team.players = self.players_of(team.id)?;
            team.squad = self.squad_of(team.id)?;
            teams.push(team);
        }
        Ok(teams)
    }

    fn players_of(&self, team_id: Id) -> BackendResult<Vec<Player>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, name, batting_order, is_bowler FROM players
                 WHERE team_id = ?1 ORDER BY batting_order, name",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![team_id.to_string()], |row| {
                Ok(Player {
                    id: parse_id(&row.get::<_, String>(0)?),
                    team_id,
                    name: row.get(1)?,
                    batting_order: row.get(2)?,
                    is_bowler: row.get::<_, i64>(3)? != 0,
                })
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn squad_of(&self, team_id: Id) -> BackendResult<Vec<Id>> {
        let mut stmt = self
            .conn
            .prepare("SELECT player_id FROM squads WHERE team_id = ?1 ORDER BY position")
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![team_id.to_string()], |row| {
                Ok(parse_id(&row.get::<_, String>(0)?))
            })
            .map_err(db_err)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(db_err)
    }

    fn team_name(&self, team_id: Id) -> BackendResult<Option<String>> {
        self.conn
            .query_row(
                "SELECT name FROM teams WHERE id = ?1",
                params![team_id.to_string()],
                |row| row.get(0),
            )
            .optional()
            .map_err(db_err)
    }

    fn deliveries_of(&self, match_id: Id, innings: u8) -> BackendResult<Vec<Delivery>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT payload FROM deliveries WHERE match_id = ?1 AND innings = ?2 ORDER BY seq",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![match_id.to_string(), innings], |row| {
                row.get::<_, String>(0)
            })
            .map_err(db_err)?;
        let mut out = Vec::new();
        for raw in rows {
            let raw = raw.map_err(db_err)?;
            let delivery = serde_json::from_str::<Delivery>(&raw)
                .map_err(|err| BackendError::Protocol(format!("stored delivery: {err}")))?;
            out.push(delivery);
        }
        Ok(out)
    }

    fn match_status(&self, match_id: Id) -> BackendResult<Option<(bool, MatchRules)>> {
        let row = self
            .conn
            .query_row(
                "SELECT finished, rules FROM matches WHERE id = ?1",
                params![match_id.to_string()],
                |row| Ok((row.get::<_, i64>(0)? != 0, row.get::<_, String>(1)?)),
            )
            .optional()
            .map_err(db_err)?;
        let Some((finished, rules_raw)) = row else {
            return Ok(None);
        };
        let rules = serde_json::from_str::<MatchRules>(&rules_raw).unwrap_or_default();
        Ok(Some((finished, rules)))
    }

    fn tx(&mut self) -> BackendResult<Transaction<'_>> {
        self.conn.transaction().map_err(db_err)
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS teams (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            color TEXT NOT NULL,
            logo TEXT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS players (
            id TEXT PRIMARY KEY,
            team_id TEXT NOT NULL,
            name TEXT NOT NULL,
            batting_order INTEGER NOT NULL,
            is_bowler INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_players_team ON players(team_id);
        CREATE TABLE IF NOT EXISTS squads (
            team_id TEXT NOT NULL,
            player_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (team_id, player_id)
        );
        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            team_a TEXT NOT NULL,
            team_b TEXT NOT NULL,
            rules TEXT NOT NULL,
            finished INTEGER NOT NULL,
            result TEXT NULL,
            created_at TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS deliveries (
            match_id TEXT NOT NULL,
            innings INTEGER NOT NULL,
            seq INTEGER NOT NULL,
            payload TEXT NOT NULL,
            PRIMARY KEY (match_id, innings, seq)
        );
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );
        "#,
    )
    .context("create sqlite schema")?;
    Ok(())
}

fn new_id() -> Id {
    Id(rand::thread_rng().gen_range(1..u64::MAX))
}

fn parse_id(raw: &str) -> Id {
    raw.parse::<Id>().unwrap_or(Id(0))
}

fn now_text() -> String {
    Utc::now().to_rfc3339()
}

fn db_err(err: rusqlite::Error) -> BackendError {
    BackendError::Rejected(format!("storage error: {err}"))
}

fn rejected(msg: impl Into<String>) -> BackendError {
    BackendError::Rejected(msg.into())
}

impl Backend for LocalBackend {
    fn add_team(&mut self, name: &str, color: &str, logo: Option<&str>) -> BackendResult<Id> {
        let id = new_id();
        self.conn
            .execute(
                "INSERT INTO teams (id, name, color, logo, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![id.to_string(), name, color, logo, now_text()],
            )
            .map_err(db_err)?;
        Ok(id)
    }

    fn add_player(
        &mut self,
        team_id: Id,
        name: &str,
        batting_order: u32,
        is_bowler: bool,
    ) -> BackendResult<Id> {
        if self.team_name(team_id)?.is_none() {
            return Err(BackendError::NotFound(format!("team {team_id}")));
        }
        let id = new_id();
        self.conn
            .execute(
                "INSERT INTO players (id, team_id, name, batting_order, is_bowler)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    id.to_string(),
                    team_id.to_string(),
                    name,
                    batting_order,
                    is_bowler as i64
                ],
            )
            .map_err(db_err)?;
        Ok(id)
    }

    fn select_squad(&mut self, team_id: Id, player_ids: &[Id]) -> BackendResult<()> {
        let roster = self.players_of(team_id)?;
        if roster.is_empty() && self.team_name(team_id)?.is_none() {
            return Err(BackendError::NotFound(format!("team {team_id}")));
        }
        let expected = self.get_tournament_rules()?.match_rules.players_per_side as usize;
        if player_ids.len() != expected {
            return Err(rejected(format!(
                "squad must contain {expected} players, got {}",
                player_ids.len()
            )));
        }
        if let Some(stranger) = player_ids
            .iter()
            .find(|id| !roster.iter().any(|p| p.id == **id))
        {
            return Err(rejected(format!("player {stranger} is not in team {team_id}")));
        }

        let tx = self.tx()?;
        tx.execute(
            "DELETE FROM squads WHERE team_id = ?1",
            params![team_id.to_string()],
        )
        .map_err(db_err)?;
        for (pos, player_id) in player_ids.iter().enumerate() {
            tx.execute(
                "INSERT INTO squads (team_id, player_id, position) VALUES (?1, ?2, ?3)",
                params![team_id.to_string(), player_id.to_string(), pos as i64],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)
    }

    fn create_match(&mut self, team_a: Id, team_b: Id, rules: &MatchRules) -> BackendResult<Id> {
        if team_a == team_b {
            return Err(rejected("a match needs two different teams"));
        }
        for team in [team_a, team_b] {
            if self.team_name(team)?.is_none() {
                return Err(BackendError::NotFound(format!("team {team}")));
            }
        }
        let rules_raw = serde_json::to_string(rules)
            .map_err(|err| BackendError::Protocol(err.to_string()))?;
        let id = new_id();
        self.conn
            .execute(
                "INSERT INTO matches (id, team_a, team_b, rules, finished, result, created_at)
                 VALUES (?1, ?2, ?3, ?4, 0, NULL, ?5)",
                params![
                    id.to_string(),
                    team_a.to_string(),
                    team_b.to_string(),
                    rules_raw,
                    now_text()
                ],
            )
            .map_err(db_err)?;
        Ok(id)
    }

    fn record_delivery(
        &mut self,
        match_id: Id,
        innings: u8,
        delivery: &Delivery,
    ) -> BackendResult<()> {
        let Some((finished, _)) = self.match_status(match_id)? else {
            return Err(BackendError::NotFound(format!("match {match_id}")));
        };
        if finished {
            return Err(rejected(format!("match {match_id} is already finished")));
        }
        if !(1..=2).contains(&innings) {
            return Err(rejected(format!("invalid innings {innings}")));
        }
        let payload = serde_json::to_string(delivery)
            .map_err(|err| BackendError::Protocol(err.to_string()))?;

        let tx = self.tx()?;
        let seq: i64 = tx
            .query_row(
                "SELECT COALESCE(MAX(seq), 0) + 1 FROM deliveries WHERE match_id = ?1 AND innings = ?2",
                params![match_id.to_string(), innings],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        tx.execute(
            "INSERT INTO deliveries (match_id, innings, seq, payload) VALUES (?1, ?2, ?3, ?4)",
            params![match_id.to_string(), innings, seq, payload],
        )
        .map_err(db_err)?;
        tx.commit().map_err(db_err)
    }

    fn finish_match(&mut self, match_id: Id, result: &str) -> BackendResult<()> {
        let updated = self
            .conn
            .execute(
                "UPDATE matches SET finished = 1, result = ?2 WHERE id = ?1",
                params![match_id.to_string(), result],
            )
            .map_err(db_err)?;
        if updated == 0 {
            return Err(BackendError::NotFound(format!("match {match_id}")));
        }
        Ok(())
    }

    fn get_match(&self, match_id: Id) -> BackendResult<Option<Match>> {
        let row = self
            .conn
            .query_row(
                "SELECT team_a, team_b, rules, finished, result, created_at FROM matches WHERE id = ?1",
                params![match_id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, i64>(3)? != 0,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()
            .map_err(db_err)?;
        let Some((team_a, team_b, rules_raw, finished, result, created_at)) = row else {
            return Ok(None);
        };
        let team_a = parse_id(&team_a);
        let team_b = parse_id(&team_b);
        let rules = serde_json::from_str::<MatchRules>(&rules_raw).unwrap_or_default();

        let mut innings = Vec::with_capacity(2);
        for (number, batting, bowling) in [(1u8, team_a, team_b), (2u8, team_b, team_a)] {
            let deliveries = self.deliveries_of(match_id, number)?;
            let totals = stats::innings_stats(&deliveries);
            innings.push(Innings {
                batting_team: batting,
                bowling_team: bowling,
                summary: InningsSummary {
                    runs: totals.runs,
                    wickets: totals.wickets,
                    overs: totals.overs,
                },
                deliveries,
            });
        }

        Ok(Some(Match {
            id: match_id,
            team_a,
            team_b,
            team_a_name: self.team_name(team_a)?.unwrap_or_default(),
            team_b_name: self.team_name(team_b)?.unwrap_or_default(),
            rules,
            innings,
            finished,
            result,
            created_at: Some(created_at),
        }))
    }

    fn get_all_teams(&self) -> BackendResult<Vec<Team>> {
        self.team_rows()
    }

    fn get_tournament_rules(&self) -> BackendResult<TournamentRules> {
        let raw = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![TOURNAMENT_RULES_KEY],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(db_err)?;
        Ok(raw
            .and_then(|raw| serde_json::from_str::<TournamentRules>(&raw).ok())
            .unwrap_or_default())
    }

    fn update_tournament_rules(&mut self, rules: &TournamentRules) -> BackendResult<()> {
        let raw =
            serde_json::to_string(rules).map_err(|err| BackendError::Protocol(err.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![TOURNAMENT_RULES_KEY, raw],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn update_match_rules(&mut self, match_id: Id, rules: &MatchRules) -> BackendResult<()> {
        let Some((finished, _)) = self.match_status(match_id)? else {
            return Err(BackendError::NotFound(format!("match {match_id}")));
        };
        if finished {
            return Err(rejected(format!("match {match_id} is already finished")));
        }
        let raw =
            serde_json::to_string(rules).map_err(|err| BackendError::Protocol(err.to_string()))?;
        self.conn
            .execute(
                "UPDATE matches SET rules = ?2 WHERE id = ?1",
                params![match_id.to_string(), raw],
            )
            .map_err(db_err)?;
        Ok(())
    }

    fn reset_all_data(&mut self) -> BackendResult<()> {
        self.conn
            .execute_batch(
                "DELETE FROM deliveries; DELETE FROM matches; DELETE FROM squads;
                 DELETE FROM players; DELETE FROM teams; DELETE FROM settings;",
            )
            .map_err(db_err)
    }
}
