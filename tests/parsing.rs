use std::fs;
use std::path::PathBuf;

use crease_terminal::backend::BackendError;
use crease_terminal::model::{Id, Match, Team, Wicket};
use crease_terminal::remote::{parse_match_reply, parse_reply};
use crease_terminal::stats;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_match_fixture_with_wide_ids() {
    let raw = read_fixture("rpc_match.json");
    let m = parse_match_reply(&raw)
        .expect("fixture should parse")
        .expect("match should be present");
    assert_eq!(m.id, Id(18_446_744_073_709_551_000));
    assert_eq!(m.team_a, Id(7001));
    assert_eq!(m.rules.overs_per_innings, 2);
    assert_eq!(m.rules.wide_runs, 1);
    assert_eq!(m.innings.len(), 2);

    let first = m.deliveries(1);
    assert_eq!(first.len(), 5);
    assert_eq!(first[4].wicket, Some(Wicket::Bowled));
    assert!(first[2].is_wide);
}

#[test]
fn recomputed_totals_match_backend_summary() {
    let raw = read_fixture("rpc_match.json");
    let m: Option<Match> = parse_reply(&raw).expect("fixture should parse");
    let m = m.expect("match should be present");
    let innings = m.innings_no(1).expect("first innings");
    let totals = stats::innings_stats(&innings.deliveries);
    assert_eq!(totals.runs, innings.summary.runs);
    assert_eq!(totals.wickets, innings.summary.wickets);
    assert_eq!(totals.overs, innings.summary.overs);

    let bo = stats::batsman_stats(&innings.deliveries, Id(102));
    assert_eq!(bo.balls, 2);
    // The wide faced counts towards batsman runs.
    assert_eq!(bo.runs, 7);
    assert!(bo.is_out);
}

#[test]
fn parses_teams_with_numeric_and_text_ids() {
    let raw = read_fixture("rpc_teams.json");
    let teams: Vec<Team> = parse_reply(&raw).expect("fixture should parse");
    assert_eq!(teams.len(), 2);
    assert_eq!(teams[0].id, Id(7001));
    assert_eq!(teams[1].id, Id(7002));
    assert!(teams[0].players[1].is_bowler);
    assert!(!teams[0].players[0].is_bowler);
    assert_eq!(teams[0].squad, vec![Id(101), Id(102)]);
    assert!(teams[1].color.is_empty());
}

#[test]
fn infrastructure_error_reply_is_unavailable() {
    let raw = read_fixture("rpc_unavailable.json");
    let err = parse_reply::<Vec<Team>>(&raw).expect_err("error reply");
    assert!(err.is_unavailable());
    assert_eq!(
        err.user_message(),
        "Scoring service is unavailable. Check the connection and press r to retry."
    );
}

#[test]
fn rejected_reply_keeps_backend_message() {
    let raw = read_fixture("rpc_rejected.json");
    let err = parse_reply::<()>(&raw).expect_err("error reply");
    assert_eq!(
        err,
        BackendError::Rejected("squad must contain exactly 11 players".to_string())
    );
    assert_eq!(
        err.user_message(),
        "Request failed: squad must contain exactly 11 players"
    );
}

#[test]
fn missing_match_is_none() {
    let raw = read_fixture("rpc_not_found.json");
    assert_eq!(parse_match_reply(&raw), Ok(None));
    assert_eq!(parse_match_reply(r#"{"ok": null}"#), Ok(None));
}

#[test]
fn garbage_reply_is_protocol_error() {
    let err = parse_reply::<Vec<Team>>("<html>502</html>").expect_err("not json");
    assert!(matches!(err, BackendError::Protocol(_)));
    let err = parse_reply::<Vec<Team>>(r#"{"ok": 5}"#).expect_err("wrong shape");
    assert!(matches!(err, BackendError::Protocol(_)));
}
