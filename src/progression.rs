//! Who is at the crease, who is bowling, and where the innings stands.
//!
//! This record is advisory: the backend's delivery list stays authoritative
//! for totals, and `reconcile` re-derives the ball-in-over count and free-hit
//! flag from it after every fetch.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{Delivery, Id, MatchRules, Wicket};
use crate::stats::{self, BALLS_PER_OVER};

const MAX_RUNS_PER_BALL: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingInningsSetup,
    Scoring,
    AwaitingNewBatsman,
    AwaitingOverChange,
    AwaitingInningsTransition,
    Finished,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::AwaitingInningsSetup => "awaiting innings setup",
            Phase::Scoring => "scoring",
            Phase::AwaitingNewBatsman => "awaiting new batsman",
            Phase::AwaitingOverChange => "awaiting over change",
            Phase::AwaitingInningsTransition => "awaiting innings transition",
            Phase::Finished => "finished",
        };
        f.write_str(label)
    }
}

/// Outcome of a single ball as entered by the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ball {
    Runs(u32),
    /// Wide plus any further runs taken.
    Wide { extra: u32 },
    /// No-ball; `runs` excludes the penalty.
    NoBall { runs: u32 },
    Bye(u32),
    LegBye(u32),
    /// `runs` are completed before the dismissal. `non_striker_out` marks a
    /// run out (or other dismissal) of the batsman at the bowler's end.
    Wicket {
        kind: Wicket,
        runs: u32,
        no_ball: bool,
        non_striker_out: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScoringError {
    #[error("cannot {action} while {actual}")]
    WrongPhase { action: &'static str, actual: Phase },
    #[error("no {0} selected")]
    MissingSelection(&'static str),
    #[error("striker and non-striker must be different players")]
    SameBatsman,
    #[error("player {0} is already at the crease")]
    AlreadyBatting(Id),
    #[error("player {0} is already out")]
    AlreadyOut(Id),
    #[error("{0} cannot dismiss the non-striker")]
    InvalidDismissal(String),
    #[error("player {0} bowled the previous over")]
    ConsecutiveOvers(Id),
    #[error("player {id} has bowled the maximum of {max} overs")]
    QuotaReached { id: Id, max: u32 },
    #[error("invalid run count {0}")]
    InvalidRuns(u32),
    #[error("match has no innings after innings {0}")]
    NoMoreInnings(u8),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub match_id: Id,
    pub innings: u8,
    pub phase: Phase,
    pub striker: Option<Id>,
    pub non_striker: Option<Id>,
    pub bowler: Option<Id>,
    #[serde(default)]
    pub previous_bowler: Option<Id>,
    #[serde(default)]
    pub balls_in_over: u32,
    #[serde(default)]
    pub free_hit: bool,
}

/// A delivery ready for submission together with the state it leads to.
/// Commit `next` only once the backend has accepted `delivery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub delivery: Delivery,
    pub next: Progression,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    BattingFirst,
    BattingSecond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Margin {
    Wickets(u32),
    Runs(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchOutcome {
    Won { side: Side, margin: Margin },
    Tied,
}

impl MatchOutcome {
    pub fn describe(&self, batting_first: &str, batting_second: &str) -> String {
        match self {
            MatchOutcome::Tied => "Match tied".to_string(),
            MatchOutcome::Won { side, margin } => {
                let winner = match side {
                    Side::BattingFirst => batting_first,
                    Side::BattingSecond => batting_second,
                };
                let (n, unit) = match margin {
                    Margin::Wickets(n) => (*n, "wicket"),
                    Margin::Runs(n) => (*n, "run"),
                };
                let plural = if n == 1 { "" } else { "s" };
                format!("{winner} won by {n} {unit}{plural}")
            }
        }
    }
}

impl Progression {
    pub fn new(match_id: Id) -> Self {
        Self {
            match_id,
            innings: 1,
            phase: Phase::AwaitingInningsSetup,
            striker: None,
            non_striker: None,
            bowler: None,
            previous_bowler: None,
            balls_in_over: 0,
            free_hit: false,
        }
    }

    /// Controls for run/extra/wicket entry are live only in this state.
    pub fn can_score(&self) -> bool {
        self.phase == Phase::Scoring
            && self.striker.is_some()
            && self.non_striker.is_some()
            && self.bowler.is_some()
    }

    /// Openers and bowler for the innings. From the end of the first innings
    /// this also moves on to innings two.
    pub fn start_innings(
        &mut self,
        striker: Id,
        non_striker: Id,
        bowler: Id,
    ) -> Result<(), ScoringError> {
        match self.phase {
            Phase::AwaitingInningsSetup | Phase::AwaitingInningsTransition => {}
            actual => {
                return Err(ScoringError::WrongPhase {
                    action: "start an innings",
                    actual,
                });
            }
        }
        if striker == non_striker {
            return Err(ScoringError::SameBatsman);
        }
        if self.phase == Phase::AwaitingInningsTransition {
            self.advance_innings()?;
        }
        self.striker = Some(striker);
        self.non_striker = Some(non_striker);
        self.bowler = Some(bowler);
        self.previous_bowler = None;
        self.balls_in_over = 0;
        self.free_hit = false;
        self.phase = Phase::Scoring;
        Ok(())
    }

    pub fn advance_innings(&mut self) -> Result<(), ScoringError> {
        if self.phase != Phase::AwaitingInningsTransition {
            return Err(ScoringError::WrongPhase {
                action: "change innings",
                actual: self.phase,
            });
        }
        if self.innings >= 2 {
            return Err(ScoringError::NoMoreInnings(self.innings));
        }
        let match_id = self.match_id;
        *self = Progression::new(match_id);
        self.innings = 2;
        Ok(())
    }

    /// Builds the delivery for `ball` and the state after it. `innings` is the
    /// authoritative list so far (without this ball); `target` is only used
    /// in the second innings.
    pub fn apply(
        &self,
        ball: Ball,
        innings: &[Delivery],
        rules: &MatchRules,
        target: Option<u32>,
    ) -> Result<Step, ScoringError> {
        if self.phase != Phase::Scoring {
            return Err(ScoringError::WrongPhase {
                action: "record a delivery",
                actual: self.phase,
            });
        }
        let striker = self
            .striker
            .ok_or(ScoringError::MissingSelection("striker"))?;
        let non_striker = self
            .non_striker
            .ok_or(ScoringError::MissingSelection("non-striker"))?;
        let bowler = self.bowler.ok_or(ScoringError::MissingSelection("bowler"))?;

        let mut delivery = Delivery::new(striker, bowler, 0);
        delivery.is_free_hit = self.free_hit;
        let ran = match ball {
            Ball::Runs(n) => {
                check_runs(n, 0)?;
                delivery.runs = n;
                n
            }
            Ball::Wide { extra } => {
                check_runs(extra, 0)?;
                delivery.is_wide = true;
                delivery.runs = rules.wide_runs + extra;
                extra
            }
            Ball::NoBall { runs } => {
                check_runs(runs, 0)?;
                delivery.is_no_ball = true;
                delivery.runs = rules.no_ball_runs + runs;
                runs
            }
            Ball::Bye(n) => {
                check_runs(n, 1)?;
                delivery.is_bye = true;
                delivery.runs = n;
                n
            }
            Ball::LegBye(n) => {
                check_runs(n, 1)?;
                delivery.is_leg_bye = true;
                delivery.runs = n;
                n
            }
            Ball::Wicket {
                kind,
                runs,
                no_ball,
                non_striker_out,
            } => {
                check_runs(runs, 0)?;
                if non_striker_out {
                    if !kind.can_dismiss_non_striker() {
                        return Err(ScoringError::InvalidDismissal(kind.label().to_string()));
                    }
                    delivery.dismissed_id = Some(non_striker);
                }
                delivery.is_no_ball = no_ball;
                delivery.runs = runs + if no_ball { rules.no_ball_runs } else { 0 };
                delivery.wicket = Some(kind);
                runs
            }
        };

        let mut next = self.clone();
        next.free_hit = rules.free_hit_on_no_ball && delivery.is_no_ball;
        if ran % 2 == 1 {
            std::mem::swap(&mut next.striker, &mut next.non_striker);
        }
        if delivery.is_legal() {
            next.balls_in_over += 1;
        }
        let over_done = next.balls_in_over >= BALLS_PER_OVER;
        if over_done {
            std::mem::swap(&mut next.striker, &mut next.non_striker);
            next.previous_bowler = Some(bowler);
        }
        // Vacate whichever end the dismissed batsman ended up at.
        if let Some(out) = delivery.dismissed() {
            if next.striker == Some(out) {
                next.striker = None;
            } else if next.non_striker == Some(out) {
                next.non_striker = None;
            }
        }

        let runs = innings.iter().map(|d| d.runs).sum::<u32>() + delivery.runs;
        let wickets = innings.iter().filter(|d| d.wicket.is_some()).count() as u32
            + u32::from(delivery.wicket.is_some());
        let legal = stats::legal_ball_count(innings) + u32::from(delivery.is_legal());

        next.phase = match innings_end_phase(self.innings, runs, wickets, legal, rules, target) {
            Some(phase) => {
                next.free_hit = false;
                phase
            }
            None if delivery.wicket.is_some() => Phase::AwaitingNewBatsman,
            None if over_done => Phase::AwaitingOverChange,
            None => Phase::Scoring,
        };

        Ok(Step { delivery, next })
    }

    /// Replacement for a dismissed batsman. Fills whichever end is vacant.
    pub fn select_batsman(&mut self, id: Id, innings: &[Delivery]) -> Result<(), ScoringError> {
        if self.phase != Phase::AwaitingNewBatsman {
            return Err(ScoringError::WrongPhase {
                action: "select a batsman",
                actual: self.phase,
            });
        }
        if self.striker == Some(id) || self.non_striker == Some(id) {
            return Err(ScoringError::AlreadyBatting(id));
        }
        if innings.iter().any(|d| d.dismissed() == Some(id)) {
            return Err(ScoringError::AlreadyOut(id));
        }
        if self.striker.is_none() {
            self.striker = Some(id);
        } else {
            self.non_striker = Some(id);
        }
        self.phase = if self.balls_in_over >= BALLS_PER_OVER {
            Phase::AwaitingOverChange
        } else {
            Phase::Scoring
        };
        Ok(())
    }

    /// Bowler for the next over. Clears the ball count and resumes scoring.
    pub fn select_bowler(
        &mut self,
        id: Id,
        innings: &[Delivery],
        rules: &MatchRules,
    ) -> Result<(), ScoringError> {
        if self.phase != Phase::AwaitingOverChange {
            return Err(ScoringError::WrongPhase {
                action: "change bowler",
                actual: self.phase,
            });
        }
        if self.previous_bowler == Some(id) {
            return Err(ScoringError::ConsecutiveOvers(id));
        }
        let max = rules.max_overs_per_bowler;
        if max > 0 && stats::bowler_stats(innings, id).legal_balls >= max * BALLS_PER_OVER {
            return Err(ScoringError::QuotaReached { id, max });
        }
        self.bowler = Some(id);
        self.balls_in_over = 0;
        self.phase = Phase::Scoring;
        Ok(())
    }

    pub fn finish(&mut self) {
        self.phase = Phase::Finished;
        self.free_hit = false;
    }

    /// Re-derives over position, free hit and innings completion from the
    /// backend's deliveries. Returns whether anything changed.
    pub fn reconcile(
        &mut self,
        innings_no: u8,
        deliveries: &[Delivery],
        rules: &MatchRules,
        target: Option<u32>,
    ) -> bool {
        if innings_no != self.innings
            || matches!(
                self.phase,
                Phase::AwaitingInningsSetup | Phase::AwaitingInningsTransition | Phase::Finished
            )
        {
            return false;
        }
        let before = self.clone();

        let legal = stats::legal_ball_count(deliveries);
        let rem = legal % BALLS_PER_OVER;
        let over_pending = matches!(
            self.phase,
            Phase::AwaitingOverChange | Phase::AwaitingNewBatsman
        ) && self.balls_in_over >= BALLS_PER_OVER;
        self.balls_in_over = if rem == 0 && legal > 0 && over_pending {
            BALLS_PER_OVER
        } else {
            rem
        };
        // Holds while a new batsman or bowler is still being picked.
        self.free_hit =
            rules.free_hit_on_no_ball && deliveries.last().is_some_and(|d| d.is_no_ball);

        let runs = deliveries.iter().map(|d| d.runs).sum::<u32>();
        let wickets = deliveries.iter().filter(|d| d.wicket.is_some()).count() as u32;
        if let Some(phase) = innings_end_phase(self.innings, runs, wickets, legal, rules, target) {
            self.phase = phase;
            self.free_hit = false;
        }

        *self != before
    }
}

/// Target for the side batting second.
pub fn target(first_innings: &[Delivery]) -> u32 {
    stats::innings_stats(first_innings).runs + 1
}

pub fn decide_outcome(
    first_innings: &[Delivery],
    second_innings: &[Delivery],
    rules: &MatchRules,
) -> MatchOutcome {
    let first = stats::innings_stats(first_innings);
    let second = stats::innings_stats(second_innings);
    if second.runs > first.runs {
        MatchOutcome::Won {
            side: Side::BattingSecond,
            margin: Margin::Wickets(rules.max_wickets().saturating_sub(second.wickets)),
        }
    } else if second.runs == first.runs {
        MatchOutcome::Tied
    } else {
        MatchOutcome::Won {
            side: Side::BattingFirst,
            margin: Margin::Runs(first.runs - second.runs),
        }
    }
}

fn innings_end_phase(
    innings: u8,
    runs: u32,
    wickets: u32,
    legal_balls: u32,
    rules: &MatchRules,
    target: Option<u32>,
) -> Option<Phase> {
    let chasing = innings >= 2;
    if chasing && target.is_some_and(|t| runs >= t) {
        return Some(Phase::Finished);
    }
    let all_out = wickets >= rules.max_wickets();
    let overs_done = legal_balls >= rules.balls_per_innings();
    if !(all_out || overs_done) {
        return None;
    }
    if chasing {
        Some(Phase::Finished)
    } else {
        Some(Phase::AwaitingInningsTransition)
    }
}

fn check_runs(n: u32, min: u32) -> Result<(), ScoringError> {
    if n < min || n > MAX_RUNS_PER_BALL {
        return Err(ScoringError::InvalidRuns(n));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: Id = Id(1);
    const B: Id = Id(2);
    const C: Id = Id(3);
    const BOWLER: Id = Id(90);
    const OTHER_BOWLER: Id = Id(91);

    fn scoring() -> Progression {
        let mut p = Progression::new(Id(500));
        p.start_innings(A, B, BOWLER).unwrap();
        p
    }

    fn play(p: &mut Progression, log: &mut Vec<Delivery>, ball: Ball, rules: &MatchRules) {
        let step = p.apply(ball, log, rules, None).unwrap();
        log.push(step.delivery);
        *p = step.next;
    }

    #[test]
    fn odd_runs_rotate_strike() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = Vec::new();
        play(&mut p, &mut log, Ball::Runs(1), &rules);
        assert_eq!(p.striker, Some(B));
        assert_eq!(p.non_striker, Some(A));
        play(&mut p, &mut log, Ball::Runs(4), &rules);
        assert_eq!(p.striker, Some(B));
        assert_eq!(p.balls_in_over, 2);
    }

    #[test]
    fn wide_is_not_a_legal_ball() {
        let rules = MatchRules::default();
        let p = scoring();
        let step = p.apply(Ball::Wide { extra: 0 }, &[], &rules, None).unwrap();
        assert!(step.delivery.is_wide);
        assert_eq!(step.delivery.runs, 1);
        assert_eq!(step.next.balls_in_over, 0);
        assert_eq!(step.next.striker, Some(A));
    }

    #[test]
    fn free_hit_lasts_exactly_one_delivery() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = Vec::new();
        play(&mut p, &mut log, Ball::NoBall { runs: 0 }, &rules);
        assert!(p.free_hit);
        assert_eq!(log[0].runs, 1);
        play(&mut p, &mut log, Ball::Wide { extra: 0 }, &rules);
        assert!(log[1].is_free_hit);
        assert!(!p.free_hit);
        play(&mut p, &mut log, Ball::Runs(0), &rules);
        assert!(!log[2].is_free_hit);
    }

    #[test]
    fn sixth_legal_ball_swaps_ends_and_waits_for_bowler() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = Vec::new();
        for _ in 0..6 {
            play(&mut p, &mut log, Ball::Runs(0), &rules);
        }
        assert_eq!(p.phase, Phase::AwaitingOverChange);
        assert_eq!(p.balls_in_over, 6);
        assert_eq!(p.striker, Some(B));
        assert!(p.apply(Ball::Runs(1), &log, &rules, None).is_err());

        assert_eq!(
            p.select_bowler(BOWLER, &log, &rules),
            Err(ScoringError::ConsecutiveOvers(BOWLER))
        );
        p.select_bowler(OTHER_BOWLER, &log, &rules).unwrap();
        assert_eq!(p.phase, Phase::Scoring);
        assert_eq!(p.balls_in_over, 0);
    }

    #[test]
    fn wicket_requires_replacement_before_scoring() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = Vec::new();
        play(
            &mut p,
            &mut log,
            Ball::Wicket {
                kind: Wicket::Bowled,
                runs: 0,
                no_ball: false,
                non_striker_out: false,
            },
            &rules,
        );
        assert_eq!(p.phase, Phase::AwaitingNewBatsman);
        assert_eq!(p.striker, None);
        assert_eq!(p.balls_in_over, 1);
        assert_eq!(p.select_batsman(A, &log), Err(ScoringError::AlreadyOut(A)));
        assert_eq!(p.select_batsman(B, &log), Err(ScoringError::AlreadyBatting(B)));
        p.select_batsman(C, &log).unwrap();
        assert_eq!(p.striker, Some(C));
        assert_eq!(p.phase, Phase::Scoring);
    }

    #[test]
    fn wicket_on_last_ball_of_over_then_over_change() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = Vec::new();
        for _ in 0..5 {
            play(&mut p, &mut log, Ball::Runs(0), &rules);
        }
        play(
            &mut p,
            &mut log,
            Ball::Wicket {
                kind: Wicket::Caught,
                runs: 0,
                no_ball: false,
                non_striker_out: false,
            },
            &rules,
        );
        assert_eq!(p.phase, Phase::AwaitingNewBatsman);
        assert_eq!(p.striker, Some(B));
        assert_eq!(p.non_striker, None);
        p.select_batsman(C, &log).unwrap();
        assert_eq!(p.non_striker, Some(C));
        assert_eq!(p.phase, Phase::AwaitingOverChange);
    }

    #[test]
    fn last_over_closes_first_innings() {
        let rules = MatchRules {
            overs_per_innings: 1,
            ..MatchRules::default()
        };
        let mut p = scoring();
        let mut log = Vec::new();
        for _ in 0..6 {
            play(&mut p, &mut log, Ball::Runs(2), &rules);
        }
        assert_eq!(p.phase, Phase::AwaitingInningsTransition);
        p.start_innings(C, A, OTHER_BOWLER).unwrap();
        assert_eq!(p.innings, 2);
        assert_eq!(p.striker, Some(C));
        assert_eq!(p.balls_in_over, 0);
        assert_eq!(p.phase, Phase::Scoring);
    }

    #[test]
    fn reaching_target_finishes_mid_over() {
        let rules = MatchRules::default();
        let mut p = Progression::new(Id(7));
        p.innings = 2;
        p.start_innings(A, B, BOWLER).unwrap();
        let so_far = vec![Delivery::new(A, BOWLER, 4); 3];
        let step = p.apply(Ball::Runs(4), &so_far, &rules, Some(15)).unwrap();
        assert_eq!(step.next.phase, Phase::Finished);
    }

    #[test]
    fn failed_submission_leaves_state_untouched() {
        let rules = MatchRules::default();
        let p = scoring();
        let before = p.clone();
        let _step = p.apply(Ball::Runs(3), &[], &rules, None).unwrap();
        assert_eq!(p, before);
    }

    #[test]
    fn chase_outcome_reports_wickets_in_hand() {
        let rules = MatchRules::default();
        let first = vec![Delivery::new(A, BOWLER, 6); 2];
        let mut out = Delivery::new(C, OTHER_BOWLER, 0);
        out.wicket = Some(Wicket::Bowled);
        let second = vec![out, Delivery::new(A, OTHER_BOWLER, 6), Delivery::new(A, OTHER_BOWLER, 6), Delivery::new(A, OTHER_BOWLER, 1)];
        let outcome = decide_outcome(&first, &second, &rules);
        assert_eq!(
            outcome,
            MatchOutcome::Won {
                side: Side::BattingSecond,
                margin: Margin::Wickets(9)
            }
        );
        assert_eq!(outcome.describe("Reds", "Blues"), "Blues won by 9 wickets");
        assert_eq!(decide_outcome(&first, &first, &rules), MatchOutcome::Tied);
        assert_eq!(
            decide_outcome(&first, &second[..2], &rules).describe("Reds", "Blues"),
            "Reds won by 6 runs"
        );
    }

    #[test]
    fn reconcile_recovers_over_position_and_free_hit() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut nb = Delivery::new(A, BOWLER, 1);
        nb.is_no_ball = true;
        let log = vec![Delivery::new(A, BOWLER, 0), Delivery::new(A, BOWLER, 0), nb];
        assert!(p.reconcile(1, &log, &rules, None));
        assert_eq!(p.balls_in_over, 2);
        assert!(p.free_hit);
        assert!(!p.reconcile(2, &log, &rules, None));
    }

    #[test]
    fn free_hit_survives_refetch_after_no_ball_wicket() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = vec![Delivery::new(A, BOWLER, 0)];
        p.balls_in_over = 1;
        play(
            &mut p,
            &mut log,
            Ball::Wicket {
                kind: Wicket::RunOut,
                runs: 0,
                no_ball: true,
                non_striker_out: false,
            },
            &rules,
        );
        assert_eq!(p.phase, Phase::AwaitingNewBatsman);
        assert!(p.free_hit);

        // Same log back from the service.
        p.reconcile(1, &log, &rules, None);
        assert!(p.free_hit);
        assert_eq!(p.balls_in_over, 1);
        p.select_batsman(C, &log).unwrap();
        let step = p.apply(Ball::Runs(2), &log, &rules, None).unwrap();
        assert!(step.delivery.is_free_hit);
        assert!(!step.next.free_hit);
    }

    #[test]
    fn non_striker_run_out_vacates_the_far_end() {
        let rules = MatchRules::default();
        let mut p = scoring();
        let mut log = Vec::new();
        play(
            &mut p,
            &mut log,
            Ball::Wicket {
                kind: Wicket::RunOut,
                runs: 1,
                no_ball: false,
                non_striker_out: true,
            },
            &rules,
        );
        // One run completed: A reached the far end, B was run out at the near end.
        assert_eq!(log[0].dismissed(), Some(B));
        assert_eq!(log[0].runs, 1);
        assert_eq!(p.striker, None);
        assert_eq!(p.non_striker, Some(A));
        assert_eq!(p.select_batsman(B, &log), Err(ScoringError::AlreadyOut(B)));
        p.select_batsman(C, &log).unwrap();
        assert_eq!(p.striker, Some(C));

        let bowled = Ball::Wicket {
            kind: Wicket::Bowled,
            runs: 0,
            no_ball: false,
            non_striker_out: true,
        };
        assert_eq!(
            p.apply(bowled, &log, &rules, None),
            Err(ScoringError::InvalidDismissal("Bowled".to_string()))
        );
    }

    #[test]
    fn bad_openers_keep_the_innings_transition() {
        let rules = MatchRules {
            overs_per_innings: 1,
            ..MatchRules::default()
        };
        let mut p = scoring();
        let mut log = Vec::new();
        for _ in 0..6 {
            play(&mut p, &mut log, Ball::Runs(0), &rules);
        }
        assert_eq!(p.phase, Phase::AwaitingInningsTransition);
        assert_eq!(p.start_innings(C, C, BOWLER), Err(ScoringError::SameBatsman));
        assert_eq!(p.phase, Phase::AwaitingInningsTransition);
        assert_eq!(p.innings, 1);
        p.start_innings(C, A, OTHER_BOWLER).unwrap();
        assert_eq!(p.innings, 2);
    }

    #[test]
    fn rejects_same_openers_and_bad_runs() {
        let mut p = Progression::new(Id(1));
        assert_eq!(p.start_innings(A, A, BOWLER), Err(ScoringError::SameBatsman));
        p.start_innings(A, B, BOWLER).unwrap();
        let rules = MatchRules::default();
        assert_eq!(
            p.apply(Ball::Runs(9), &[], &rules, None),
            Err(ScoringError::InvalidRuns(9))
        );
        assert_eq!(
            p.apply(Ball::Bye(0), &[], &rules, None),
            Err(ScoringError::InvalidRuns(0))
        );
    }
}
