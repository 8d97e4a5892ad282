use crease_terminal::backend::{Backend, BackendError};
use crease_terminal::local_backend::LocalBackend;
use crease_terminal::model::{Delivery, Id, MatchRules, TournamentRules, Wicket};

fn backend_with_pairs() -> (LocalBackend, Id, Id) {
    let mut backend = LocalBackend::in_memory().expect("in-memory db");
    let mut rules = TournamentRules::default();
    rules.name = "Sunday League".to_string();
    rules.match_rules.players_per_side = 2;
    backend.update_tournament_rules(&rules).unwrap();

    let reds = backend.add_team("Reds", "red", None).unwrap();
    let blues = backend.add_team("Blues", "blue", Some("https://example.org/b.png")).unwrap();
    for (team, names) in [(reds, ["R One", "R Two"]), (blues, ["B One", "B Two"])] {
        let ids = names
            .iter()
            .enumerate()
            .map(|(i, name)| backend.add_player(team, name, i as u32 + 1, true).unwrap())
            .collect::<Vec<_>>();
        backend.select_squad(team, &ids).unwrap();
    }
    (backend, reds, blues)
}

#[test]
fn teams_come_back_with_players_and_elevens() {
    let (backend, reds, blues) = backend_with_pairs();
    let teams = backend.get_all_teams().unwrap();
    assert_eq!(teams.len(), 2);
    let red = teams.iter().find(|t| t.id == reds).unwrap();
    assert_eq!(red.name, "Reds");
    assert_eq!(red.players.len(), 2);
    assert_eq!(red.squad.len(), 2);
    assert_eq!(red.players[0].name, "R One");
    let blue = teams.iter().find(|t| t.id == blues).unwrap();
    assert_eq!(blue.logo.as_deref(), Some("https://example.org/b.png"));
    assert_eq!(
        backend.get_tournament_rules().unwrap().name,
        "Sunday League"
    );
}

#[test]
fn squad_size_and_membership_are_enforced() {
    let (mut backend, reds, blues) = backend_with_pairs();
    let teams = backend.get_all_teams().unwrap();
    let red = teams.iter().find(|t| t.id == reds).unwrap();
    let blue = teams.iter().find(|t| t.id == blues).unwrap();

    let err = backend
        .select_squad(reds, &[red.players[0].id])
        .unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));

    let err = backend
        .select_squad(reds, &[red.players[0].id, blue.players[0].id])
        .unwrap_err();
    assert!(matches!(err, BackendError::Rejected(_)));

    let err = backend.select_squad(Id(42), &[]).unwrap_err();
    assert!(matches!(err, BackendError::NotFound(_)));
}

#[test]
fn match_lifecycle() {
    let (mut backend, reds, blues) = backend_with_pairs();
    assert!(backend.create_match(reds, reds, &MatchRules::default()).is_err());
    assert!(matches!(
        backend.create_match(reds, Id(9), &MatchRules::default()),
        Err(BackendError::NotFound(_))
    ));

    let rules = MatchRules {
        overs_per_innings: 2,
        ..MatchRules::default()
    };
    let match_id = backend.create_match(reds, blues, &rules).unwrap();
    let teams = backend.get_all_teams().unwrap();
    let red = teams.iter().find(|t| t.id == reds).unwrap();
    let blue = teams.iter().find(|t| t.id == blues).unwrap();
    let (striker, bowler) = (red.players[0].id, blue.players[0].id);

    backend
        .record_delivery(match_id, 1, &Delivery::new(striker, bowler, 4))
        .unwrap();
    let mut wide = Delivery::new(striker, bowler, 1);
    wide.is_wide = true;
    backend.record_delivery(match_id, 1, &wide).unwrap();
    let mut out = Delivery::new(striker, bowler, 0);
    out.wicket = Some(Wicket::Caught);
    backend.record_delivery(match_id, 1, &out).unwrap();
    assert!(backend.record_delivery(match_id, 3, &out).is_err());

    let record = backend.get_match(match_id).unwrap().unwrap();
    assert_eq!(record.team_a_name, "Reds");
    assert_eq!(record.team_b_name, "Blues");
    assert_eq!(record.rules.overs_per_innings, 2);
    assert_eq!(record.innings.len(), 2);
    let first = &record.innings[0];
    assert_eq!(first.batting_team, reds);
    assert_eq!(first.bowling_team, blues);
    assert_eq!(first.deliveries.len(), 3);
    assert_eq!(first.deliveries[1], wide);
    assert_eq!(first.summary.runs, 5);
    assert_eq!(first.summary.wickets, 1);
    assert_eq!(first.summary.overs, "0.2");
    assert_eq!(record.innings[1].batting_team, blues);
    assert!(record.innings[1].deliveries.is_empty());

    let tighter = MatchRules {
        overs_per_innings: 1,
        ..rules
    };
    backend.update_match_rules(match_id, &tighter).unwrap();

    backend
        .finish_match(match_id, "Reds won by 5 runs")
        .unwrap();
    let record = backend.get_match(match_id).unwrap().unwrap();
    assert!(record.finished);
    assert_eq!(record.result.as_deref(), Some("Reds won by 5 runs"));
    assert_eq!(record.rules.overs_per_innings, 1);
    assert!(backend
        .record_delivery(match_id, 2, &Delivery::new(striker, bowler, 1))
        .is_err());
    assert!(backend.update_match_rules(match_id, &tighter).is_err());
}

#[test]
fn unknown_match_is_none_or_not_found() {
    let (mut backend, ..) = backend_with_pairs();
    assert_eq!(backend.get_match(Id(5)).unwrap(), None);
    assert!(matches!(
        backend.finish_match(Id(5), "x"),
        Err(BackendError::NotFound(_))
    ));
    assert!(matches!(
        backend.record_delivery(Id(5), 1, &Delivery::new(Id(1), Id(2), 0)),
        Err(BackendError::NotFound(_))
    ));
}

#[test]
fn reset_clears_everything() {
    let (mut backend, reds, blues) = backend_with_pairs();
    let match_id = backend
        .create_match(reds, blues, &MatchRules::default())
        .unwrap();
    backend.reset_all_data().unwrap();
    assert!(backend.get_all_teams().unwrap().is_empty());
    assert_eq!(backend.get_match(match_id).unwrap(), None);
    assert_eq!(
        backend.get_tournament_rules().unwrap(),
        TournamentRules::default()
    );
}

#[test]
fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("scoring.sqlite");
    let team = {
        let mut backend = LocalBackend::open(&path).unwrap();
        backend.add_team("Greens", "green", None).unwrap()
    };
    let backend = LocalBackend::open(&path).unwrap();
    let teams = backend.get_all_teams().unwrap();
    assert_eq!(teams.len(), 1);
    assert_eq!(teams[0].id, team);
}
