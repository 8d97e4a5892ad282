//! Scorecard aggregates derived from raw delivery lists.
//!
//! Everything here is recomputed from the backend's deliveries on every render
//! instead of trusting the denormalized innings summary, so the display cannot
//! drift from the ball-by-ball record.

use serde::Serialize;

use crate::model::{Delivery, Id, Wicket};

pub const BALLS_PER_OVER: u32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatsmanStats {
    pub batsman_id: Id,
    pub runs: u32,
    pub balls: u32,
    pub fours: u32,
    pub sixes: u32,
    pub strike_rate: f64,
    pub is_out: bool,
    pub dismissal: Option<Wicket>,
    pub dismissed_by: Option<Id>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BowlerStats {
    pub bowler_id: Id,
    pub legal_balls: u32,
    pub overs: String,
    pub maidens: u32,
    pub runs: u32,
    pub wickets: u32,
    pub wides: u32,
    pub no_balls: u32,
    pub economy: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Extras {
    pub wides: u32,
    pub no_balls: u32,
    pub byes: u32,
    pub leg_byes: u32,
}

impl Extras {
    pub fn total(&self) -> u32 {
        self.wides + self.no_balls + self.byes + self.leg_byes
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InningsStats {
    pub runs: u32,
    pub wickets: u32,
    pub legal_balls: u32,
    pub overs: String,
    pub run_rate: f64,
    pub extras: Extras,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FallOfWicket {
    pub wicket: u32,
    pub score: u32,
    pub batsman_id: Id,
    pub overs: String,
}

pub fn batsman_stats(deliveries: &[Delivery], batsman_id: Id) -> BatsmanStats {
    let mut out = BatsmanStats {
        batsman_id,
        runs: 0,
        balls: 0,
        fours: 0,
        sixes: 0,
        strike_rate: 0.0,
        is_out: false,
        dismissal: None,
        dismissed_by: None,
    };

    for d in deliveries {
        if d.batsman_id == batsman_id {
            if !d.is_wide {
                out.balls += 1;
            }
            // Every run except byes and leg-byes goes to the striker.
            if !(d.is_bye || d.is_leg_bye) {
                out.runs += d.runs;
            }
            match d.off_bat() {
                4 => out.fours += 1,
                6 => out.sixes += 1,
                _ => {}
            }
        }
        if d.dismissed() == Some(batsman_id)
            && let Some(wicket) = &d.wicket
        {
            out.is_out = true;
            out.dismissal = Some(wicket.clone());
            out.dismissed_by = Some(d.bowler_id);
        }
    }

    if out.balls > 0 {
        out.strike_rate = (out.runs as f64) / (out.balls as f64) * 100.0;
    }
    out
}

pub fn bowler_stats(deliveries: &[Delivery], bowler_id: Id) -> BowlerStats {
    let mut legal_balls = 0u32;
    let mut runs = 0u32;
    let mut wickets = 0u32;
    let mut wides = 0u32;
    let mut no_balls = 0u32;
    let mut maidens = 0u32;
    let mut over_runs = 0u32;

    for d in deliveries.iter().filter(|d| d.bowler_id == bowler_id) {
        // Byes and leg-byes are not charged to the bowler.
        let conceded = if d.is_bye || d.is_leg_bye {
            if d.is_no_ball { d.runs.min(1) } else { 0 }
        } else {
            d.runs
        };
        runs += conceded;
        over_runs += conceded;
        if d.is_wide {
            wides += 1;
        }
        if d.is_no_ball {
            no_balls += 1;
        }
        if d.wicket.as_ref().is_some_and(Wicket::credited_to_bowler) {
            wickets += 1;
        }
        if d.is_legal() {
            legal_balls += 1;
            if legal_balls % BALLS_PER_OVER == 0 {
                if over_runs == 0 {
                    maidens += 1;
                }
                over_runs = 0;
            }
        }
    }

    let economy = if legal_balls == 0 {
        0.0
    } else {
        (runs as f64) / overs_decimal(legal_balls)
    };

    BowlerStats {
        bowler_id,
        legal_balls,
        overs: format_overs(legal_balls),
        maidens,
        runs,
        wickets,
        wides,
        no_balls,
        economy,
    }
}

pub fn innings_stats(deliveries: &[Delivery]) -> InningsStats {
    let runs = deliveries.iter().map(|d| d.runs).sum::<u32>();
    let wickets = deliveries.iter().filter(|d| d.wicket.is_some()).count() as u32;
    let legal_balls = legal_ball_count(deliveries);
    let run_rate = if legal_balls == 0 {
        0.0
    } else {
        (runs as f64) / overs_decimal(legal_balls)
    };

    InningsStats {
        runs,
        wickets,
        legal_balls,
        overs: format_overs(legal_balls),
        run_rate,
        extras: extras_breakdown(deliveries),
    }
}

pub fn legal_ball_count(deliveries: &[Delivery]) -> u32 {
    deliveries.iter().filter(|d| d.is_legal()).count() as u32
}

pub fn extras_breakdown(deliveries: &[Delivery]) -> Extras {
    let mut extras = Extras::default();
    for d in deliveries {
        if d.is_wide {
            extras.wides += d.runs;
            continue;
        }
        let mut rest = d.runs;
        if d.is_no_ball {
            extras.no_balls += rest.min(1);
            rest = rest.saturating_sub(1);
        }
        if d.is_bye {
            extras.byes += rest;
        } else if d.is_leg_bye {
            extras.leg_byes += rest;
        }
    }
    extras
}

/// Cricket notation: completed overs, a dot, then balls of the partial over.
pub fn format_overs(legal_balls: u32) -> String {
    format!(
        "{}.{}",
        legal_balls / BALLS_PER_OVER,
        legal_balls % BALLS_PER_OVER
    )
}

pub fn overs_decimal(legal_balls: u32) -> f64 {
    (legal_balls as f64) / (BALLS_PER_OVER as f64)
}

/// Deliveries of the over in progress. Order-sensitive: the boundary is the
/// last delivery that brought the legal count to a multiple of six.
pub fn current_over(deliveries: &[Delivery]) -> &[Delivery] {
    let mut legal = 0u32;
    let mut start = 0usize;
    for (idx, d) in deliveries.iter().enumerate() {
        if d.is_legal() {
            legal += 1;
            if legal % BALLS_PER_OVER == 0 {
                start = idx + 1;
            }
        }
    }
    &deliveries[start..]
}

/// Batting card in order of first appearance at the crease.
pub fn batting_card(deliveries: &[Delivery]) -> Vec<BatsmanStats> {
    appearance_order(
        deliveries
            .iter()
            .flat_map(|d| [Some(d.batsman_id), d.dismissed()])
            .flatten(),
    )
    .into_iter()
    .map(|id| batsman_stats(deliveries, id))
    .collect()
}

pub fn bowling_card(deliveries: &[Delivery]) -> Vec<BowlerStats> {
    appearance_order(deliveries.iter().map(|d| d.bowler_id))
        .into_iter()
        .map(|id| bowler_stats(deliveries, id))
        .collect()
}

pub fn fall_of_wickets(deliveries: &[Delivery]) -> Vec<FallOfWicket> {
    let mut out = Vec::new();
    let mut score = 0u32;
    let mut legal = 0u32;
    for d in deliveries {
        score += d.runs;
        if d.is_legal() {
            legal += 1;
        }
        if let Some(batsman_id) = d.dismissed() {
            out.push(FallOfWicket {
                wicket: out.len() as u32 + 1,
                score,
                batsman_id,
                overs: format_overs(legal),
            });
        }
    }
    out
}

/// Runs and balls of the stand since the last wicket.
pub fn current_partnership(deliveries: &[Delivery]) -> (u32, u32) {
    let start = deliveries
        .iter()
        .rposition(|d| d.wicket.is_some())
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let tail = &deliveries[start..];
    let runs = tail.iter().map(|d| d.runs).sum();
    let balls = tail.iter().filter(|d| !d.is_wide).count() as u32;
    (runs, balls)
}

pub fn required_run_rate(target: u32, runs: u32, balls_remaining: u32) -> Option<f64> {
    if balls_remaining == 0 || runs >= target {
        return None;
    }
    Some(((target - runs) as f64) / overs_decimal(balls_remaining))
}

fn appearance_order(ids: impl Iterator<Item = Id>) -> Vec<Id> {
    let mut seen = Vec::new();
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}
