use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crate::backend::Backend;
use crate::export;
use crate::model::Id;
use crate::scorecard::NameBook;
use crate::state::{Delta, ProviderCommand};

/// Runs backend calls on a worker thread. Commands are handled one at a
/// time, so a submitted delivery completes before the next command starts.
/// The last fetched match is re-polled every `match_poll`.
pub fn spawn_provider(
    backend: Box<dyn Backend>,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ProviderCommand>,
    match_poll: Duration,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut backend = backend;
        let mut watching: Option<Id> = None;
        let mut last_poll = Instant::now();

        loop {
            let wait = match_poll
                .checked_sub(last_poll.elapsed())
                .unwrap_or(Duration::ZERO);
            match cmd_rx.recv_timeout(wait) {
                Ok(cmd) => {
                    if let ProviderCommand::FetchMatch { match_id } = &cmd {
                        watching = Some(*match_id);
                        last_poll = Instant::now();
                    }
                    handle_command(backend.as_mut(), cmd, &tx);
                }
                Err(RecvTimeoutError::Timeout) => {
                    last_poll = Instant::now();
                    if let Some(match_id) = watching {
                        fetch_match(backend.as_ref(), match_id, &tx);
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    })
}

/// Executes one command against `backend`, reporting through `tx`.
pub fn handle_command(backend: &mut dyn Backend, cmd: ProviderCommand, tx: &Sender<Delta>) {
    match cmd {
        ProviderCommand::FetchTeams => match backend.get_all_teams() {
            Ok(teams) => {
                let _ = tx.send(Delta::Log(format!("[INFO] Loaded {} teams", teams.len())));
                let _ = tx.send(Delta::SetTeams(teams));
            }
            Err(error) => {
                let _ = tx.send(Delta::RemoteError {
                    context: "Team fetch failed".to_string(),
                    error,
                });
            }
        },
        ProviderCommand::FetchRules => match backend.get_tournament_rules() {
            Ok(rules) => {
                let _ = tx.send(Delta::SetRules(rules));
            }
            Err(error) => {
                let _ = tx.send(Delta::Log(format!("[WARN] Rules fetch failed: {error}")));
            }
        },
        ProviderCommand::FetchMatch { match_id } => fetch_match(backend, match_id, tx),
        ProviderCommand::CreateMatch {
            team_a,
            team_b,
            rules,
        } => match backend.create_match(team_a, team_b, &rules) {
            Ok(match_id) => {
                let _ = tx.send(Delta::MatchCreated {
                    match_id,
                    team_a,
                    team_b,
                });
            }
            Err(error) => {
                let _ = tx.send(Delta::RemoteError {
                    context: "Match creation failed".to_string(),
                    error,
                });
            }
        },
        ProviderCommand::RecordDelivery {
            match_id,
            innings,
            delivery,
        } => match backend.record_delivery(match_id, innings, &delivery) {
            Ok(()) => {
                let _ = tx.send(Delta::DeliveryRecorded { match_id });
            }
            Err(error) => {
                let _ = tx.send(Delta::DeliveryFailed { match_id, error });
            }
        },
        ProviderCommand::FinishMatch { match_id, result } => {
            match backend.finish_match(match_id, &result) {
                Ok(()) => {
                    let _ = tx.send(Delta::MatchFinished { match_id, result });
                }
                Err(error) => {
                    let _ = tx.send(Delta::RemoteError {
                        context: format!("Finishing match {match_id} failed"),
                        error,
                    });
                }
            }
        }
        ProviderCommand::ExportScorecard { match_id, path } => {
            let msg = match export_match(&*backend, match_id, &path) {
                Ok(deliveries) => Delta::ExportFinished {
                    path: path.display().to_string(),
                    deliveries,
                },
                Err(err) => Delta::Log(format!("[WARN] Export failed: {err:#}")),
            };
            let _ = tx.send(msg);
        }
    }
}

fn fetch_match(backend: &dyn Backend, match_id: Id, tx: &Sender<Delta>) {
    match backend.get_match(match_id) {
        Ok(record) => {
            let _ = tx.send(Delta::SetMatch { match_id, record });
        }
        Err(error) => {
            let _ = tx.send(Delta::RemoteError {
                context: format!("Match {match_id} fetch failed"),
                error,
            });
        }
    }
}

fn export_match(backend: &dyn Backend, match_id: Id, path: &Path) -> anyhow::Result<usize> {
    let record = backend
        .get_match(match_id)?
        .ok_or_else(|| anyhow::anyhow!("match {match_id} not found"))?;
    let names = NameBook::from_teams(&backend.get_all_teams()?);
    let report = export::export_scorecard(path, &record, &names)?;
    Ok(report.deliveries)
}
