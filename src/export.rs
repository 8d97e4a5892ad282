use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::model::Match;
use crate::scorecard::{self, NameBook};
use crate::stats;

pub struct ExportReport {
    pub innings: usize,
    pub batting_rows: usize,
    pub bowling_rows: usize,
    pub deliveries: usize,
}

/// Writes the scorecard of `m` as a workbook with Summary, Batting, Bowling
/// and Deliveries sheets.
pub fn export_scorecard(path: &Path, m: &Match, names: &NameBook) -> Result<ExportReport> {
    let cards = scorecard::match_card(m, names);

    let mut summary_rows = vec![
        vec!["Match".to_string(), m.id.to_string()],
        vec![
            "Teams".to_string(),
            format!("{} v {}", m.team_a_name, m.team_b_name),
        ],
        vec![
            "Overs per innings".to_string(),
            m.rules.overs_per_innings.to_string(),
        ],
        vec![
            "Created".to_string(),
            m.created_at.clone().unwrap_or_default(),
        ],
    ];
    for card in &cards {
        summary_rows.push(vec![format!("Innings {}", card.number), card.total_line()]);
        summary_rows.push(vec![
            format!("Extras {}", card.number),
            format!(
                "{} (w {}, nb {}, b {}, lb {})",
                card.extras.total(),
                card.extras.wides,
                card.extras.no_balls,
                card.extras.byes,
                card.extras.leg_byes
            ),
        ]);
        if !card.fall_of_wickets.is_empty() {
            summary_rows.push(vec![
                format!("Fall of wickets {}", card.number),
                card.fall_of_wickets.join(", "),
            ]);
        }
    }
    summary_rows.push(vec![
        "Result".to_string(),
        scorecard::result_line(m, None).unwrap_or_else(|| "In progress".to_string()),
    ]);

    let mut batting_rows = vec![vec![
        "Innings".to_string(),
        "Team".to_string(),
        "Batsman".to_string(),
        "Dismissal".to_string(),
        "R".to_string(),
        "B".to_string(),
        "4s".to_string(),
        "6s".to_string(),
        "SR".to_string(),
    ]];
    let mut bowling_rows = vec![vec![
        "Innings".to_string(),
        "Team".to_string(),
        "Bowler".to_string(),
        "O".to_string(),
        "M".to_string(),
        "R".to_string(),
        "W".to_string(),
        "Econ".to_string(),
    ]];
    for card in &cards {
        for row in &card.batting {
            batting_rows.push(vec![
                card.number.to_string(),
                card.batting_team.clone(),
                row.name.clone(),
                row.dismissal.clone(),
                row.runs.to_string(),
                row.balls.to_string(),
                row.fours.to_string(),
                row.sixes.to_string(),
                format!("{:.2}", row.strike_rate),
            ]);
        }
        for row in &card.bowling {
            bowling_rows.push(vec![
                card.number.to_string(),
                card.batting_team.clone(),
                row.name.clone(),
                row.overs.clone(),
                row.maidens.to_string(),
                row.runs.to_string(),
                row.wickets.to_string(),
                format!("{:.2}", row.economy),
            ]);
        }
    }

    let mut delivery_rows = vec![vec![
        "Innings".to_string(),
        "Over".to_string(),
        "Batsman".to_string(),
        "Bowler".to_string(),
        "Runs".to_string(),
        "Extra".to_string(),
        "Free hit".to_string(),
        "Wicket".to_string(),
    ]];
    for (idx, innings) in m.innings.iter().enumerate() {
        let mut legal = 0u32;
        for d in &innings.deliveries {
            if d.is_legal() {
                legal += 1;
            }
            delivery_rows.push(vec![
                (idx + 1).to_string(),
                stats::format_overs(legal),
                names.name(d.batsman_id),
                names.name(d.bowler_id),
                d.runs.to_string(),
                extra_label(d).to_string(),
                if d.is_free_hit { "yes" } else { "" }.to_string(),
                match (&d.wicket, d.dismissed_id) {
                    (Some(w), Some(out)) => format!("{} ({})", w.label(), names.name(out)),
                    (Some(w), None) => w.label().to_string(),
                    (None, _) => String::new(),
                },
            ]);
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Batting")?;
        write_rows(sheet, &batting_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Bowling")?;
        write_rows(sheet, &bowling_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Deliveries")?;
        write_rows(sheet, &delivery_rows)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;

    Ok(ExportReport {
        innings: cards.len(),
        batting_rows: batting_rows.len().saturating_sub(1),
        bowling_rows: bowling_rows.len().saturating_sub(1),
        deliveries: delivery_rows.len().saturating_sub(1),
    })
}

fn extra_label(d: &crate::model::Delivery) -> &'static str {
    match (d.is_wide, d.is_no_ball, d.is_bye, d.is_leg_bye) {
        (true, ..) => "wd",
        (_, true, true, _) => "nb+b",
        (_, true, _, true) => "nb+lb",
        (_, true, ..) => "nb",
        (_, _, true, _) => "b",
        (_, _, _, true) => "lb",
        _ => "",
    }
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            // Ids do not fit an f64, so everything goes in as text.
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Delivery, Id, Innings, MatchRules};

    #[test]
    fn writes_workbook_with_counts() {
        let mut first = Innings::new(Id(1), Id(2));
        let mut wide = Delivery::new(Id(10), Id(20), 1);
        wide.is_wide = true;
        first.deliveries = vec![Delivery::new(Id(10), Id(20), 4), wide];
        let m = Match {
            id: Id(5),
            team_a: Id(1),
            team_b: Id(2),
            team_a_name: "Reds".into(),
            team_b_name: "Blues".into(),
            rules: MatchRules::default(),
            innings: vec![first, Innings::new(Id(2), Id(1))],
            finished: false,
            result: None,
            created_at: None,
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.xlsx");
        let report = export_scorecard(&path, &m, &NameBook::default()).unwrap();
        assert!(path.exists());
        assert_eq!(report.innings, 1);
        assert_eq!(report.batting_rows, 1);
        assert_eq!(report.bowling_rows, 1);
        assert_eq!(report.deliveries, 2);
        assert_eq!(extra_label(&m.innings[0].deliveries[1]), "wd");
    }
}
