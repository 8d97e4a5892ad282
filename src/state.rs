use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::backend::BackendError;
use crate::model::{Delivery, HistoryEntry, Id, Match, MatchRules, Player, Team, TournamentRules, Wicket};
use crate::persist::{LocalStore, MatchMeta};
use crate::progression::{self, Ball, Phase, Progression, ScoringError, Step};
use crate::validation;

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Home,
    Setup,
    Live,
    Scorecard { match_id: Id },
}

/// Extra awaiting its run count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extra {
    Wide,
    NoBall,
    Bye,
    LegBye,
}

impl Extra {
    /// `runs` is what the batsmen ran; `None` takes the usual default.
    pub fn ball(self, runs: Option<u32>) -> Ball {
        match self {
            Extra::Wide => Ball::Wide {
                extra: runs.unwrap_or(0),
            },
            Extra::NoBall => Ball::NoBall {
                runs: runs.unwrap_or(0),
            },
            Extra::Bye => Ball::Bye(runs.unwrap_or(1)),
            Extra::LegBye => Ball::LegBye(runs.unwrap_or(1)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Extra::Wide => "Wide",
            Extra::NoBall => "No ball",
            Extra::Bye => "Bye",
            Extra::LegBye => "Leg bye",
        }
    }
}

/// Details entered alongside the dismissal kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WicketEntry {
    pub runs: u32,
    pub no_ball: bool,
    pub non_striker_out: bool,
    /// Description of an "other" dismissal while it is being typed.
    pub other: Option<String>,
}

impl WicketEntry {
    fn ball(&self, kind: Wicket) -> Ball {
        Ball::Wicket {
            kind,
            runs: self.runs,
            no_ball: self.no_ball,
            non_striker_out: self.non_striker_out,
        }
    }

    /// One-line summary for the picker footer.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("{} run(s)", self.runs)];
        if self.no_ball {
            parts.push("no ball".to_string());
        }
        parts.push(if self.non_striker_out {
            "non-striker out".to_string()
        } else {
            "striker out".to_string()
        });
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Picker {
    Wicket {
        selected: usize,
        entry: WicketEntry,
    },
    Batsman {
        selected: usize,
    },
    Bowler {
        selected: usize,
    },
    /// Striker, then non-striker, then opening bowler.
    Openers {
        striker: Option<Id>,
        non_striker: Option<Id>,
        selected: usize,
    },
}

impl Picker {
    fn openers() -> Self {
        Picker::Openers {
            striker: None,
            non_striker: None,
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        match self {
            Picker::Wicket { selected, .. }
            | Picker::Batsman { selected }
            | Picker::Bowler { selected }
            | Picker::Openers { selected, .. } => *selected,
        }
    }

    fn selected_mut(&mut self) -> &mut usize {
        match self {
            Picker::Wicket { selected, .. }
            | Picker::Batsman { selected }
            | Picker::Bowler { selected }
            | Picker::Openers { selected, .. } => selected,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Picker::Wicket {
                entry: WicketEntry { other: Some(_), .. },
                ..
            } => "Describe the dismissal",
            Picker::Wicket { .. } => "How was the batsman out?",
            Picker::Batsman { .. } => "Next batsman",
            Picker::Bowler { .. } => "Bowler for the next over",
            Picker::Openers {
                striker: None, ..
            } => "Opening striker",
            Picker::Openers {
                non_striker: None,
                ..
            } => "Opening non-striker",
            Picker::Openers { .. } => "Opening bowler",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    Player(Id),
    Wicket(Wicket),
    /// Free-text dismissal, typed after choosing this.
    OtherWicket,
}

#[derive(Debug, Clone, Default)]
pub struct SetupForm {
    pub team_a: Option<Id>,
    pub team_b: Option<Id>,
    pub selected: usize,
    pub overs: u32,
}

/// Client-side view of the match being scored. `record` is the backend's
/// copy and stays authoritative; `progression` is the advisory local state.
#[derive(Debug, Clone)]
pub struct LiveMatch {
    pub match_id: Id,
    pub meta: Option<MatchMeta>,
    pub record: Option<Match>,
    pub progression: Progression,
    /// Submitted delivery awaiting the backend. Scoring controls stay
    /// disabled while this is set.
    pub pending: Option<Step>,
    pub picker: Option<Picker>,
    pub extra: Option<Extra>,
    pub setup_deadline: Option<Instant>,
    pub stuck: bool,
    pub finishing: bool,
}

impl LiveMatch {
    fn new(match_id: Id, meta: Option<MatchMeta>, progression: Progression) -> Self {
        Self {
            match_id,
            meta,
            record: None,
            progression,
            pending: None,
            picker: None,
            extra: None,
            setup_deadline: None,
            stuck: false,
            finishing: false,
        }
    }

    pub fn rules(&self) -> MatchRules {
        self.record
            .as_ref()
            .map(|m| m.rules.clone())
            .unwrap_or_default()
    }

    /// Authoritative deliveries of the innings in progress.
    pub fn deliveries(&self) -> &[Delivery] {
        self.record
            .as_ref()
            .map(|m| m.deliveries(self.progression.innings))
            .unwrap_or(&[])
    }

    pub fn target(&self) -> Option<u32> {
        if self.progression.innings < 2 {
            return None;
        }
        let record = self.record.as_ref()?;
        Some(progression::target(record.deliveries(1)))
    }

    /// Innings the pickers choose players for. Openers picked after the
    /// first innings belong to the second.
    fn picking_innings(&self) -> u8 {
        match self.progression.phase {
            Phase::AwaitingInningsTransition => self.progression.innings + 1,
            _ => self.progression.innings,
        }
    }

    /// Batting and bowling team of the innings being played or set up.
    pub fn sides(&self) -> Option<(Id, Id)> {
        let number = self.picking_innings();
        if let Some(innings) = self.record.as_ref().and_then(|m| m.innings_no(number)) {
            return Some((innings.batting_team, innings.bowling_team));
        }
        let meta = self.meta.as_ref()?;
        let second = if meta.batting_first == meta.team_a {
            meta.team_b
        } else {
            meta.team_a
        };
        if number <= 1 {
            Some((meta.batting_first, second))
        } else {
            Some((second, meta.batting_first))
        }
    }

    pub fn controls_enabled(&self) -> bool {
        self.pending.is_none()
            && self.picker.is_none()
            && self.record.is_some()
            && self.progression.can_score()
    }

    fn history_entry(&self) -> Option<HistoryEntry> {
        let record = self.record.as_ref()?;
        Some(HistoryEntry {
            id: record.id,
            team_a: record.team_a_name.clone(),
            team_b: record.team_b_name.clone(),
            finished: record.finished,
            created_at: record.created_at.clone().unwrap_or_else(now_text),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub selected: usize,
    pub teams: Vec<Team>,
    pub rules: TournamentRules,
    pub history: Vec<HistoryEntry>,
    pub setup: SetupForm,
    pub live: Option<LiveMatch>,
    pub scorecard: Option<Match>,
    pub banner: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub setup_timeout: Duration,
    store: LocalStore,
    outbox: Vec<ProviderCommand>,
}

impl AppState {
    pub fn new(store: LocalStore, setup_timeout: Duration) -> Self {
        let history = store.history();
        let rules = TournamentRules::default();
        Self {
            screen: Screen::Home,
            selected: 0,
            teams: Vec::new(),
            setup: SetupForm {
                overs: rules.match_rules.overs_per_innings,
                ..SetupForm::default()
            },
            rules,
            history,
            live: None,
            scorecard: None,
            banner: None,
            logs: VecDeque::new(),
            help_overlay: false,
            setup_timeout,
            store,
            outbox: vec![ProviderCommand::FetchTeams, ProviderCommand::FetchRules],
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Commands queued by state changes, in order. The caller forwards
    /// them to the provider.
    pub fn take_commands(&mut self) -> Vec<ProviderCommand> {
        std::mem::take(&mut self.outbox)
    }

    fn send(&mut self, cmd: ProviderCommand) {
        self.outbox.push(cmd);
    }

    fn fail(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.push_log(format!("[WARN] {msg}"));
        self.banner = Some(msg);
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
    }

    pub fn go_home(&mut self) {
        self.screen = Screen::Home;
        self.live = None;
        self.scorecard = None;
        self.banner = None;
        self.history = self.store.history();
        self.selected = self.selected.min(self.history.len().saturating_sub(1));
    }

    pub fn selected_history(&self) -> Option<&HistoryEntry> {
        self.history.get(self.selected)
    }

    pub fn move_selection(&mut self, delta: i32) {
        let len = match self.screen {
            Screen::Home => self.history.len(),
            Screen::Setup => self.teams.len(),
            _ => 0,
        };
        if len == 0 {
            return;
        }
        let slot = match self.screen {
            Screen::Setup => &mut self.setup.selected,
            _ => &mut self.selected,
        };
        *slot = step_index(*slot, delta, len);
    }

    // Setup

    pub fn open_setup(&mut self) {
        self.screen = Screen::Setup;
        self.banner = None;
        self.setup = SetupForm {
            overs: self.rules.match_rules.overs_per_innings,
            ..SetupForm::default()
        };
        if self.teams.is_empty() {
            self.send(ProviderCommand::FetchTeams);
        }
    }

    /// Takes the highlighted team as team A, then as team B.
    pub fn setup_pick_team(&mut self) {
        let Some(team_id) = self.teams.get(self.setup.selected).map(|t| t.id) else {
            return;
        };
        match (self.setup.team_a, self.setup.team_b) {
            (None, _) => self.setup.team_a = Some(team_id),
            (Some(a), None) if a == team_id => {
                self.fail(validation::ValidationError::SameTeams.to_string());
            }
            (Some(_), None) => self.setup.team_b = Some(team_id),
            (Some(_), Some(_)) => {
                self.setup.team_a = Some(team_id);
                self.setup.team_b = None;
            }
        }
    }

    pub fn setup_adjust_overs(&mut self, delta: i32) {
        let next = (self.setup.overs as i64 + i64::from(delta)).clamp(1, 50);
        self.setup.overs = next as u32;
    }

    /// Validates the form and queues match creation. Nothing is sent when
    /// validation fails.
    pub fn create_match(&mut self) -> bool {
        let (Some(a), Some(b)) = (self.setup.team_a, self.setup.team_b) else {
            self.fail("Pick both teams first");
            return false;
        };
        let team = |id: Id| self.teams.iter().find(|t| t.id == id);
        let (Some(team_a), Some(team_b)) = (team(a), team(b)) else {
            self.fail("Team list is out of date; press r to reload");
            return false;
        };
        let mut rules = self.rules.match_rules.clone();
        let checked = validation::validate_overs(self.setup.overs).and_then(|overs| {
            validation::validate_match_teams(team_a, team_b, rules.players_per_side as usize)
                .map(|_| overs)
        });
        match checked {
            Ok(overs) => {
                rules.overs_per_innings = overs;
                self.banner = None;
                self.send(ProviderCommand::CreateMatch {
                    team_a: a,
                    team_b: b,
                    rules,
                });
                true
            }
            Err(err) => {
                self.fail(err.to_string());
                false
            }
        }
    }

    // Live scoring

    /// Enters the live view, seeding progression from the local store.
    pub fn open_match(&mut self, match_id: Id, now: Instant) {
        let meta = self.store.load_meta(match_id);
        let progression = self
            .store
            .load::<Progression>(match_id)
            .filter(|p| p.match_id == match_id)
            .unwrap_or_else(|| Progression::new(match_id));
        let mut live = LiveMatch::new(match_id, meta, progression);
        live.setup_deadline = Some(now + self.setup_timeout);
        self.live = Some(live);
        self.screen = Screen::Live;
        self.banner = None;
        self.push_log(format!("[INFO] Opening match {match_id}"));
        self.send(ProviderCommand::FetchMatch { match_id });
    }

    /// Marks the live view stuck when the match record has not arrived in
    /// time. Returns true on the transition.
    pub fn check_setup_timeout(&mut self, now: Instant) -> bool {
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if live.stuck || live.record.is_some() {
            return false;
        }
        match live.setup_deadline {
            Some(deadline) if now >= deadline => {
                live.stuck = true;
                self.fail(
                    "Match setup is taking too long. Press m for manual setup, r to retry or Esc to leave.",
                );
                true
            }
            _ => false,
        }
    }

    pub fn retry(&mut self, now: Instant) {
        self.banner = None;
        if self.teams.is_empty() {
            self.send(ProviderCommand::FetchTeams);
        }
        let timeout = self.setup_timeout;
        let match_id = match (&self.screen, self.live.as_mut()) {
            (Screen::Live, Some(live)) => {
                live.stuck = false;
                if live.record.is_none() {
                    live.setup_deadline = Some(now + timeout);
                }
                Some(live.match_id)
            }
            (Screen::Scorecard { match_id }, _) => Some(*match_id),
            _ => None,
        };
        if let Some(match_id) = match_id {
            self.send(ProviderCommand::FetchMatch { match_id });
        }
    }

    /// Opener selection without waiting for the match record.
    pub fn manual_setup(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if !matches!(
            live.progression.phase,
            Phase::AwaitingInningsSetup | Phase::AwaitingInningsTransition
        ) {
            return;
        }
        live.stuck = false;
        live.setup_deadline = None;
        live.picker = Some(Picker::openers());
        self.banner = None;
    }

    pub fn begin_extra(&mut self, extra: Extra) {
        if let Some(live) = self.live.as_mut()
            && live.controls_enabled()
        {
            live.extra = Some(extra);
        }
    }

    pub fn cancel_input(&mut self) -> bool {
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if live.extra.take().is_some() {
            return true;
        }
        // Only the wicket picker can be abandoned; the others gate scoring.
        match live.picker.as_mut() {
            Some(Picker::Wicket { entry, .. }) => {
                if entry.other.take().is_none() {
                    live.picker = None;
                }
                true
            }
            _ => false,
        }
    }

    /// Digit key in the live view: plain runs, or runs for a pending extra.
    pub fn enter_runs(&mut self, runs: u32) {
        let ball = match self.live.as_mut().and_then(|live| live.extra.take()) {
            Some(extra) => extra.ball(Some(runs)),
            None => Ball::Runs(runs),
        };
        self.score(ball);
    }

    /// Confirms a pending extra with its default run count.
    pub fn confirm_extra(&mut self) {
        if let Some(extra) = self.live.as_mut().and_then(|live| live.extra.take()) {
            self.score(extra.ball(None));
        }
    }

    /// A pending no-ball carries over into the wicket entry.
    pub fn open_wicket_picker(&mut self) {
        if let Some(live) = self.live.as_mut()
            && live.controls_enabled()
        {
            let entry = WicketEntry {
                no_ball: live.extra.take() == Some(Extra::NoBall),
                ..WicketEntry::default()
            };
            live.picker = Some(Picker::Wicket { selected: 0, entry });
        }
    }

    fn wicket_entry_mut(&mut self) -> Option<&mut WicketEntry> {
        match self.live.as_mut()?.picker.as_mut()? {
            Picker::Wicket { entry, .. } => Some(entry),
            _ => None,
        }
    }

    /// Whether keys should go to the dismissal text rather than the list.
    pub fn typing_dismissal(&self) -> bool {
        matches!(
            self.live.as_ref().and_then(|live| live.picker.as_ref()),
            Some(Picker::Wicket {
                entry: WicketEntry { other: Some(_), .. },
                ..
            })
        )
    }

    pub fn wicket_set_runs(&mut self, runs: u32) {
        if let Some(entry) = self.wicket_entry_mut() {
            entry.runs = runs;
        }
    }

    pub fn wicket_toggle_no_ball(&mut self) {
        if let Some(entry) = self.wicket_entry_mut() {
            entry.no_ball = !entry.no_ball;
        }
    }

    pub fn wicket_toggle_non_striker(&mut self) {
        if let Some(entry) = self.wicket_entry_mut() {
            entry.non_striker_out = !entry.non_striker_out;
        }
    }

    pub fn wicket_type(&mut self, c: char) {
        if let Some(text) = self.wicket_entry_mut().and_then(|e| e.other.as_mut()) {
            text.push(c);
        }
    }

    pub fn wicket_backspace(&mut self) {
        if let Some(text) = self.wicket_entry_mut().and_then(|e| e.other.as_mut()) {
            text.pop();
        }
    }

    /// Scores the wicket; the picker reopens if the ball is rejected.
    fn submit_wicket(&mut self, picker: Picker, kind: Wicket) {
        let Picker::Wicket { entry, .. } = &picker else {
            return;
        };
        let ball = entry.ball(kind);
        if let Some(live) = self.live.as_mut() {
            live.picker = None;
        }
        if !self.score(ball)
            && let Some(live) = self.live.as_mut()
        {
            live.picker = Some(picker);
        }
    }

    /// Builds the delivery for `ball` and queues it. Progression is left
    /// alone until the backend confirms.
    pub fn score(&mut self, ball: Ball) -> bool {
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if !live.controls_enabled() {
            return false;
        }
        let rules = live.rules();
        let target = live.target();
        match live
            .progression
            .apply(ball, live.deliveries(), &rules, target)
        {
            Ok(step) => {
                let cmd = ProviderCommand::RecordDelivery {
                    match_id: live.match_id,
                    innings: live.progression.innings,
                    delivery: step.delivery.clone(),
                };
                live.pending = Some(step);
                self.banner = None;
                self.send(cmd);
                true
            }
            Err(err) => {
                self.fail(err.to_string());
                false
            }
        }
    }

    pub fn picker_options(&self) -> Vec<(String, Choice)> {
        let Some(live) = self.live.as_ref() else {
            return Vec::new();
        };
        let Some(picker) = live.picker.as_ref() else {
            return Vec::new();
        };
        if let Picker::Wicket { .. } = picker {
            let mut kinds = Wicket::fixed_kinds()
                .into_iter()
                .map(|w| (w.label().to_string(), Choice::Wicket(w)))
                .collect::<Vec<_>>();
            kinds.push(("Other...".to_string(), Choice::OtherWicket));
            return kinds;
        }
        let Some((batting, bowling)) = live.sides() else {
            return Vec::new();
        };
        let meta = live.meta.as_ref();
        let p = &live.progression;
        let players = match picker {
            Picker::Batsman { .. } => {
                let out = live
                    .deliveries()
                    .iter()
                    .filter_map(Delivery::dismissed)
                    .collect::<Vec<_>>();
                eleven(&self.teams, meta, batting)
                    .into_iter()
                    .filter(|pl| {
                        Some(pl.id) != p.striker
                            && Some(pl.id) != p.non_striker
                            && !out.contains(&pl.id)
                    })
                    .collect()
            }
            Picker::Bowler { .. } => eleven(&self.teams, meta, bowling)
                .into_iter()
                .filter(|pl| Some(pl.id) != p.previous_bowler)
                .collect(),
            Picker::Openers {
                striker,
                non_striker,
                ..
            } => {
                if striker.is_some() && non_striker.is_some() {
                    eleven(&self.teams, meta, bowling)
                } else {
                    eleven(&self.teams, meta, batting)
                        .into_iter()
                        .filter(|pl| Some(pl.id) != *striker)
                        .collect()
                }
            }
            Picker::Wicket { .. } => Vec::new(),
        };
        players
            .into_iter()
            .map(|pl| (pl.name, Choice::Player(pl.id)))
            .collect()
    }

    pub fn picker_move(&mut self, delta: i32) {
        let len = self.picker_options().len();
        if let Some(picker) = self.live.as_mut().and_then(|live| live.picker.as_mut())
            && len > 0
        {
            let slot = picker.selected_mut();
            *slot = step_index(*slot, delta, len);
        }
    }

    pub fn picker_confirm(&mut self) {
        let options = self.picker_options();
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.pending.is_some() {
            return;
        }
        let Some(picker) = live.picker.clone() else {
            return;
        };
        if let Picker::Wicket {
            entry: WicketEntry {
                other: Some(text), ..
            },
            ..
        } = &picker
        {
            match validation::clean_name(text) {
                Ok(text) => self.submit_wicket(picker.clone(), Wicket::Other(text)),
                Err(err) => self.fail(format!("Dismissal: {err}")),
            }
            return;
        }
        let Some((_, choice)) = options.get(picker.selected()).cloned() else {
            return;
        };
        let rules = live.rules();
        let result: Result<(), ScoringError> = match (picker, choice) {
            (picker @ Picker::Wicket { .. }, Choice::Wicket(kind)) => {
                self.submit_wicket(picker, kind);
                return;
            }
            (Picker::Wicket { selected, mut entry }, Choice::OtherWicket) => {
                entry.other = Some(String::new());
                live.picker = Some(Picker::Wicket { selected, entry });
                return;
            }
            (Picker::Batsman { .. }, Choice::Player(id)) => {
                let deliveries = live.deliveries().to_vec();
                live.progression.select_batsman(id, &deliveries)
            }
            (Picker::Bowler { .. }, Choice::Player(id)) => {
                let deliveries = live.deliveries().to_vec();
                live.progression.select_bowler(id, &deliveries, &rules)
            }
            (
                Picker::Openers {
                    striker: None,
                    non_striker,
                    ..
                },
                Choice::Player(id),
            ) => {
                live.picker = Some(Picker::Openers {
                    striker: Some(id),
                    non_striker,
                    selected: 0,
                });
                return;
            }
            (
                Picker::Openers {
                    striker: Some(striker),
                    non_striker: None,
                    ..
                },
                Choice::Player(id),
            ) => {
                live.picker = Some(Picker::Openers {
                    striker: Some(striker),
                    non_striker: Some(id),
                    selected: 0,
                });
                return;
            }
            (
                Picker::Openers {
                    striker: Some(striker),
                    non_striker: Some(non_striker),
                    ..
                },
                Choice::Player(bowler),
            ) => {
                let result = live.progression.start_innings(striker, non_striker, bowler);
                if result.is_err() {
                    live.picker = Some(Picker::openers());
                }
                result
            }
            _ => return,
        };
        match result {
            Ok(()) => {
                live.picker = None;
                self.banner = None;
                self.persist_progression();
                self.prompt_for_phase();
            }
            Err(err) => self.fail(err.to_string()),
        }
    }

    fn persist_progression(&mut self) {
        if let Some(live) = self.live.as_ref() {
            self.store.save(live.match_id, &live.progression);
        }
    }

    /// Opens whichever picker the current phase is waiting on.
    fn prompt_for_phase(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        if live.picker.is_some() || live.pending.is_some() {
            return;
        }
        live.picker = match live.progression.phase {
            Phase::AwaitingInningsSetup | Phase::AwaitingInningsTransition => {
                Some(Picker::openers())
            }
            Phase::AwaitingNewBatsman => Some(Picker::Batsman { selected: 0 }),
            Phase::AwaitingOverChange => Some(Picker::Bowler { selected: 0 }),
            Phase::Scoring | Phase::Finished => None,
        };
        if live.progression.phase == Phase::Finished && !live.finishing {
            self.finish_match();
        }
    }

    fn finish_match(&mut self) {
        let Some(live) = self.live.as_mut() else {
            return;
        };
        let Some(record) = live.record.as_ref() else {
            return;
        };
        if record.finished {
            return;
        }
        let (Some(first), Some(second)) = (record.innings_no(1), record.innings_no(2)) else {
            return;
        };
        let outcome = progression::decide_outcome(&first.deliveries, &second.deliveries, &record.rules);
        let result = outcome.describe(
            record.team_name(first.batting_team),
            record.team_name(second.batting_team),
        );
        live.finishing = true;
        let match_id = live.match_id;
        self.push_log(format!("[INFO] {result}"));
        self.send(ProviderCommand::FinishMatch { match_id, result });
    }

    // Scorecard

    pub fn open_scorecard(&mut self, match_id: Id) {
        self.scorecard = self
            .live
            .as_ref()
            .filter(|live| live.match_id == match_id)
            .and_then(|live| live.record.clone());
        self.screen = Screen::Scorecard { match_id };
        self.banner = None;
        self.send(ProviderCommand::FetchMatch { match_id });
    }

    pub fn export_scorecard(&mut self, path: PathBuf) {
        let match_id = match (&self.screen, self.live.as_ref()) {
            (Screen::Scorecard { match_id }, _) => *match_id,
            (Screen::Live, Some(live)) => live.match_id,
            _ => return,
        };
        self.push_log(format!("[INFO] Exporting match {match_id} to {}", path.display()));
        self.send(ProviderCommand::ExportScorecard { match_id, path });
    }

    fn remember(&mut self, entry: HistoryEntry) {
        self.store.upsert_history(entry);
        self.history = self.store.history();
    }
}

fn step_index(current: usize, delta: i32, len: usize) -> usize {
    let next = current as i64 + i64::from(delta);
    next.clamp(0, len as i64 - 1) as usize
}

fn now_text() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Playing eleven for `team_id`, preferring the elevens stored at setup.
fn eleven(teams: &[Team], meta: Option<&MatchMeta>, team_id: Id) -> Vec<Player> {
    let team = teams.iter().find(|t| t.id == team_id);
    let picked = meta
        .and_then(|m| {
            if team_id == m.team_a {
                Some(&m.team_a_eleven)
            } else if team_id == m.team_b {
                Some(&m.team_b_eleven)
            } else {
                None
            }
        })
        .filter(|ids| !ids.is_empty());
    match (team, picked) {
        (Some(team), Some(ids)) => ids
            .iter()
            .filter_map(|id| team.player(*id).cloned())
            .collect(),
        (Some(team), None) => team.playing_eleven().into_iter().cloned().collect(),
        (None, Some(ids)) => ids
            .iter()
            .map(|id| Player {
                id: *id,
                team_id,
                name: format!("#{id}"),
                batting_order: 0,
                is_bowler: true,
            })
            .collect(),
        (None, None) => Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetTeams(Vec<Team>),
    SetRules(TournamentRules),
    SetMatch {
        match_id: Id,
        record: Option<Match>,
    },
    MatchCreated {
        match_id: Id,
        team_a: Id,
        team_b: Id,
    },
    DeliveryRecorded {
        match_id: Id,
    },
    DeliveryFailed {
        match_id: Id,
        error: BackendError,
    },
    MatchFinished {
        match_id: Id,
        result: String,
    },
    ExportFinished {
        path: String,
        deliveries: usize,
    },
    RemoteError {
        context: String,
        error: BackendError,
    },
    Log(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchTeams,
    FetchRules,
    FetchMatch {
        match_id: Id,
    },
    CreateMatch {
        team_a: Id,
        team_b: Id,
        rules: MatchRules,
    },
    RecordDelivery {
        match_id: Id,
        innings: u8,
        delivery: Delivery,
    },
    FinishMatch {
        match_id: Id,
        result: String,
    },
    ExportScorecard {
        match_id: Id,
        path: PathBuf,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetTeams(teams) => {
            state.teams = teams;
            state.setup.selected = state
                .setup
                .selected
                .min(state.teams.len().saturating_sub(1));
        }
        Delta::SetRules(rules) => {
            if state.screen != Screen::Setup || state.setup.team_a.is_none() {
                state.setup.overs = rules.match_rules.overs_per_innings;
            }
            state.rules = rules;
        }
        Delta::SetMatch { match_id, record } => {
            let Some(record) = record else {
                state.fail(format!("Match {match_id} was not found"));
                if let Some(live) = state.live.as_mut().filter(|l| l.match_id == match_id) {
                    live.stuck = true;
                }
                return;
            };
            if state.screen == (Screen::Scorecard { match_id }) {
                state.scorecard = Some(record.clone());
            }
            let Some(live) = state.live.as_mut().filter(|l| l.match_id == match_id) else {
                return;
            };
            live.record = Some(record);
            live.setup_deadline = None;
            live.stuck = false;
            if let Some(entry) = live.history_entry() {
                state.remember(entry);
            }
            sync_live(state);
        }
        Delta::MatchCreated {
            match_id,
            team_a,
            team_b,
        } => {
            let team = |id: Id| state.teams.iter().find(|t| t.id == id);
            let name = |id: Id| team(id).map(|t| t.name.clone()).unwrap_or_default();
            let squad = |id: Id| team(id).map(|t| t.squad.clone()).unwrap_or_default();
            let meta = MatchMeta {
                team_a,
                team_b,
                team_a_name: name(team_a),
                team_b_name: name(team_b),
                batting_first: team_a,
                team_a_eleven: squad(team_a),
                team_b_eleven: squad(team_b),
            };
            state.store.save_meta(match_id, &meta);
            state.remember(HistoryEntry {
                id: match_id,
                team_a: meta.team_a_name.clone(),
                team_b: meta.team_b_name.clone(),
                finished: false,
                created_at: now_text(),
            });
            state.push_log(format!(
                "[INFO] Match {match_id} created: {} v {}",
                meta.team_a_name, meta.team_b_name
            ));
            state.open_match(match_id, Instant::now());
        }
        Delta::DeliveryRecorded { match_id } => {
            let Some(live) = state.live.as_mut().filter(|l| l.match_id == match_id) else {
                return;
            };
            let Some(step) = live.pending.take() else {
                return;
            };
            let innings = usize::from(live.progression.innings);
            if let Some(slot) = live
                .record
                .as_mut()
                .and_then(|m| m.innings.get_mut(innings.saturating_sub(1)))
            {
                slot.deliveries.push(step.delivery);
            }
            live.progression = step.next;
            state.persist_progression();
            state.send(ProviderCommand::FetchMatch { match_id });
            state.prompt_for_phase();
        }
        Delta::DeliveryFailed { match_id, error } => {
            if let Some(live) = state.live.as_mut().filter(|l| l.match_id == match_id) {
                live.pending = None;
            }
            state.push_log(format!("[WARN] Delivery not recorded: {error}"));
            state.banner = Some(error.user_message());
        }
        Delta::MatchFinished { match_id, result } => {
            state.store.clear(match_id);
            state.store.mark_finished(match_id);
            state.history = state.store.history();
            if let Some(live) = state.live.as_mut().filter(|l| l.match_id == match_id) {
                live.progression.finish();
                live.finishing = false;
                if let Some(record) = live.record.as_mut() {
                    record.finished = true;
                    record.result = Some(result.clone());
                }
            }
            state.push_log(format!("[INFO] Match {match_id} finished: {result}"));
        }
        Delta::ExportFinished { path, deliveries } => {
            state.push_log(format!(
                "[INFO] Scorecard written to {path} ({deliveries} deliveries)"
            ));
        }
        Delta::RemoteError { context, error } => {
            state.push_log(format!("[WARN] {context}: {error}"));
            if let Some(live) = state.live.as_mut() {
                live.finishing = false;
            }
            state.banner = Some(error.user_message());
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// Brings progression in line with a freshly fetched record.
fn sync_live(state: &mut AppState) {
    let Some(live) = state.live.as_mut() else {
        return;
    };
    let Some(record) = live.record.as_ref() else {
        return;
    };
    if record.finished {
        if live.progression.phase != Phase::Finished {
            live.progression.finish();
            live.picker = None;
            let match_id = live.match_id;
            state.store.clear(match_id);
            state.store.mark_finished(match_id);
            state.history = state.store.history();
        }
        return;
    }
    if live.pending.is_some() {
        return;
    }
    let rules = record.rules.clone();
    let innings = live.progression.innings;
    let target = live.target();
    let deliveries = record.deliveries(innings).to_vec();
    if live
        .progression
        .reconcile(innings, &deliveries, &rules, target)
    {
        state.push_log("[INFO] Progress re-synced with the scoring service");
        state.persist_progression();
    }
    state.prompt_for_phase();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_steps_stay_in_bounds() {
        assert_eq!(step_index(0, -1, 3), 0);
        assert_eq!(step_index(1, 1, 3), 2);
        assert_eq!(step_index(2, 5, 3), 2);
    }

    #[test]
    fn extras_take_sensible_defaults() {
        assert_eq!(Extra::Wide.ball(None), Ball::Wide { extra: 0 });
        assert_eq!(Extra::Bye.ball(None), Ball::Bye(1));
        assert_eq!(Extra::NoBall.ball(Some(4)), Ball::NoBall { runs: 4 });
    }

    #[test]
    fn log_ring_is_bounded() {
        let mut state = AppState::new(LocalStore::at("/nonexistent/dir/store.json"), Duration::from_secs(5));
        for i in 0..250 {
            state.push_log(format!("line {i}"));
        }
        assert_eq!(state.logs.len(), MAX_LOGS);
        assert_eq!(state.logs.front().map(String::as_str), Some("line 50"));
    }
}
