//! Match state and the authoritative tick loop
//!
//! [`MatchController`] owns the canonical world: roster, guards, safe zone,
//! the current snippet and its typing state. Ticks and keystrokes are both
//! applied through `&mut self`, so there is exactly one writer. Neither path
//! performs I/O; snippet fetches are requested through [`SnippetRequest`]
//! and side effects are reported as [`GameEvent`]s.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::{Builder, Uuid};

use crate::snippets::CodeSnippet;
use crate::store::HighScore;
use crate::util::time::{elapsed_minutes, elapsed_secs};

use super::combat::{CombatSystem, SafeZone};
use super::events::{EliminationCause, GameEvent};
use super::guard::{Guard, GuardStep};
use super::typing::{Evaluation, Key, Progress, TextMatcher};

/// Terminal lines kept for display
const MAX_LOG_LINES: usize = 16;

/// Spectator chat lines kept for display
const MAX_CHAT_LINES: usize = 6;

const LOCAL_PLAYER_NAME: &str = "YOU (MasterBranch)";

const BOT_NAMES: [&str; 20] = [
    "NullDeref",
    "OffByOne",
    "StackSmash",
    "PanicAtRuntime",
    "BorrowChecker",
    "KernelOops",
    "EmacsPinky",
    "TabsNotSpaces",
    "CoreDump",
    "DanglingPtr",
    "DataRace",
    "SigSegv",
    "FutureNotSend",
    "QuickSort",
    "Livelock",
    "Goroutine",
    "Ferris",
    "Pythonista",
    "EventLoop",
    "HookWizard",
];

/// Match lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    /// Roster ready, first snippet prefetched, waiting for a keystroke
    Lobby,
    /// Tick loop active, input accepted
    Playing,
    /// Local player eliminated; stats frozen
    GameOver,
}

/// Gameplay constants
#[derive(Debug, Clone)]
pub struct MatchRules {
    pub arena_width: f32,
    pub arena_height: f32,
    pub zone_center_x: f32,
    pub zone_center_y: f32,
    pub initial_zone_radius: f32,
    pub min_zone_radius: f32,
    /// Radius lost per tick
    pub zone_shrink_per_tick: f32,
    /// Alert whenever the floored radius crosses a multiple of this
    pub zone_alert_interval: f32,
    /// Damage per tick while outside the zone
    pub exposure_damage: f32,
    pub bot_count: usize,
    pub bot_step: f32,
    /// Bots closer than this to the zone center stop moving
    pub bot_settle_distance: f32,
    /// Baseline per-tick chance a bot is knocked out
    pub attrition_base: f64,
    /// Attrition grows by (radius lost / this) per tick; zero disables growth
    pub attrition_shrink_divisor: f64,
    pub guard_speed: f32,
    pub guard_capture_radius: f32,
    pub guard_damage: f32,
    /// Errors on one snippet that trigger a strike
    pub error_threshold: usize,
    pub strike_damage: f32,
    pub completion_heal: f32,
    /// Delay between a strike and the replacement snippet request
    pub stun_cooldown: Duration,
    pub max_health: f32,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            arena_width: 800.0,
            arena_height: 600.0,
            zone_center_x: 400.0,
            zone_center_y: 300.0,
            initial_zone_radius: 450.0,
            min_zone_radius: 15.0,
            zone_shrink_per_tick: 0.75,
            zone_alert_interval: 50.0,
            exposure_damage: 1.8,
            bot_count: 49,
            bot_step: 0.8,
            bot_settle_distance: 4.0,
            attrition_base: 0.003,
            attrition_shrink_divisor: 8000.0,
            guard_speed: 3.0,
            guard_capture_radius: 12.0,
            guard_damage: 25.0,
            error_threshold: 3,
            strike_damage: 25.0,
            completion_heal: 20.0,
            stun_cooldown: Duration::from_millis(1200),
            max_health: 100.0,
        }
    }
}

/// A contestant (the local player or a bot)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    pub id: Uuid,
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub alive: bool,
    pub wpm: u32,
    pub accuracy: u32,
    /// Always within [0, max_health]
    pub health: f32,
    pub is_bot: bool,
}

/// End-of-match summary for the local player
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    pub rank: u32,
    pub total_players: u32,
    pub wpm: u32,
    pub accuracy: u32,
    pub time_survived_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Err,
    Sys,
    Info,
}

/// A line in the player's terminal log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub message: String,
    pub kind: LogKind,
}

/// Request for the next typing target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetRequest {
    /// Match generation the result belongs to
    pub generation: u64,
    /// Origins already used this session
    pub exclude: Vec<String>,
    /// Wait this long before fetching
    pub delay: Duration,
}

/// The authoritative game match
pub struct MatchController {
    rules: MatchRules,
    /// Bumped on restart; stale snippet deliveries are dropped
    generation: u64,
    state: MatchState,
    tick: u64,
    local_id: Uuid,
    players: Vec<PlayerState>,
    guards: Vec<Guard>,
    zone: SafeZone,
    snippet: Option<CodeSnippet>,
    matcher: Option<TextMatcher>,
    used_origins: Vec<String>,
    pending_request: Option<SnippetRequest>,
    started_at: Option<Instant>,
    /// Correct characters from retired snippets
    banked_correct: usize,
    wpm: u32,
    accuracy: u32,
    snippets_completed: u32,
    stats: Option<GameStats>,
    best: Option<HighScore>,
    logs: VecDeque<LogLine>,
    spectator_chat: VecDeque<String>,
    rng: ChaCha8Rng,
}

impl MatchController {
    /// Create a controller in the lobby with a snippet request queued
    pub fn new(rules: MatchRules, seed: u64, best: Option<HighScore>) -> Self {
        let zone = SafeZone::new(
            rules.zone_center_x,
            rules.zone_center_y,
            rules.initial_zone_radius,
            rules.min_zone_radius,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let local_id = Builder::from_random_bytes(rng.gen()).into_uuid();

        let mut controller = Self {
            rules,
            generation: 0,
            state: MatchState::Lobby,
            tick: 0,
            local_id,
            players: Vec::new(),
            guards: Vec::new(),
            zone,
            snippet: None,
            matcher: None,
            used_origins: Vec::new(),
            pending_request: None,
            started_at: None,
            banked_correct: 0,
            wpm: 0,
            accuracy: 100,
            snippets_completed: 0,
            stats: None,
            best,
            logs: VecDeque::new(),
            spectator_chat: VecDeque::new(),
            rng,
        };
        controller.start_lobby();
        controller
    }

    /// Abandon the current match and return to the lobby.
    ///
    /// Any snippet fetch still in flight belongs to the old generation and
    /// will be ignored when it arrives.
    pub fn restart(&mut self) {
        self.generation += 1;
        info!(match_generation = self.generation, "Restarting match");
        self.start_lobby();
    }

    fn start_lobby(&mut self) {
        self.state = MatchState::Lobby;
        self.tick = 0;
        self.zone.reset();
        self.guards.clear();
        self.snippet = None;
        self.matcher = None;
        self.used_origins.clear();
        self.started_at = None;
        self.banked_correct = 0;
        self.wpm = 0;
        self.accuracy = 100;
        self.snippets_completed = 0;
        self.stats = None;
        self.spectator_chat.clear();
        self.logs.clear();
        self.push_log("Initializing virtual shell environment...", LogKind::Info);

        self.players = self.build_roster();
        self.pending_request = Some(SnippetRequest {
            generation: self.generation,
            exclude: Vec::new(),
            delay: Duration::ZERO,
        });
    }

    fn build_roster(&mut self) -> Vec<PlayerState> {
        let mut players = Vec::with_capacity(self.rules.bot_count + 1);
        players.push(PlayerState {
            id: self.local_id,
            name: LOCAL_PLAYER_NAME.to_string(),
            x: self.rules.zone_center_x,
            y: self.rules.zone_center_y,
            alive: true,
            wpm: 0,
            accuracy: 100,
            health: self.rules.max_health,
            is_bot: false,
        });

        for i in 0..self.rules.bot_count {
            let id = self.next_id();
            let suffix = self.rng.gen_range(0..999);
            players.push(PlayerState {
                id,
                name: format!("{}_{}", BOT_NAMES[i % BOT_NAMES.len()], suffix),
                x: self.rng.gen_range(0.0..self.rules.arena_width),
                y: self.rng.gen_range(0.0..self.rules.arena_height),
                alive: true,
                wpm: 0,
                accuracy: 100,
                health: self.rules.max_health,
                is_bot: true,
            });
        }

        players
    }

    fn next_id(&mut self) -> Uuid {
        Builder::from_random_bytes(self.rng.gen()).into_uuid()
    }

    /// Take the queued snippet request, if any
    pub fn take_snippet_request(&mut self) -> Option<SnippetRequest> {
        self.pending_request.take()
    }

    /// Install a fetched snippet. Returns false if it was discarded.
    pub fn deliver_snippet(&mut self, generation: u64, snippet: CodeSnippet) -> bool {
        if generation != self.generation {
            debug!(
                match_generation = self.generation,
                stale_generation = generation,
                "Discarding snippet from abandoned match"
            );
            return false;
        }

        if snippet.code.trim().is_empty() {
            warn!(origin = %snippet.origin, "Received empty snippet");
            self.push_log("Snippet fetch error.", LogKind::Err);
            self.request_snippet(Duration::ZERO);
            return false;
        }

        debug!(origin = %snippet.origin, file = %snippet.file_name, "Snippet loaded");
        self.matcher = Some(TextMatcher::new(&snippet.code, self.rules.error_threshold));
        self.snippet = Some(snippet);
        true
    }

    /// Record the current snippet as used and queue a request for the next
    fn request_snippet(&mut self, delay: Duration) {
        if let Some(snippet) = &self.snippet {
            if !self.used_origins.contains(&snippet.origin) {
                self.used_origins.push(snippet.origin.clone());
            }
        }

        self.pending_request = Some(SnippetRequest {
            generation: self.generation,
            exclude: self.used_origins.clone(),
            delay,
        });
    }

    /// Apply a keystroke.
    ///
    /// Rejected (no events) in game over, while no snippet is loaded, and
    /// while the strike latch is set.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> Vec<GameEvent> {
        let mut events = Vec::new();

        if self.state == MatchState::GameOver {
            return events;
        }

        let Some(evaluation) = self.matcher.as_mut().and_then(|m| m.apply(key)) else {
            return events;
        };

        if self.state == MatchState::Lobby {
            self.state = MatchState::Playing;
            self.started_at = Some(now);
            self.push_log("Battle Royale Protocol Engaged.", LogKind::Sys);
            info!(match_generation = self.generation, "Match started");
            events.push(GameEvent::MatchStarted);
        }

        if evaluation.new_error {
            events.push(GameEvent::TypingError {
                errors: evaluation.progress.errors,
            });
        } else if evaluation.typed {
            events.push(GameEvent::KeyTyped);
        }

        self.update_metrics(&evaluation, now);

        if evaluation.threshold_reached {
            self.on_strike(&evaluation, now, &mut events);
        }

        if evaluation.completed {
            self.on_completed(&evaluation, &mut events);
        }

        events
    }

    fn update_metrics(&mut self, evaluation: &Evaluation, now: Instant) {
        let progress = evaluation.progress;
        let net_correct = self.banked_correct + progress.correct;

        let minutes = self
            .started_at
            .map(|start| elapsed_minutes(start, now))
            .unwrap_or(0.0);
        self.wpm = if minutes > 0.0 {
            ((net_correct as f64 / 5.0) / minutes).round() as u32
        } else {
            0
        };

        let evaluated = progress.evaluated();
        self.accuracy = if evaluated > 0 {
            (((evaluated - progress.errors) as f64 / evaluated as f64) * 100.0).round() as u32
        } else {
            100
        };

        let (wpm, accuracy) = (self.wpm, self.accuracy);
        if let Some(local) = self.local_player_mut() {
            local.wpm = wpm;
            local.accuracy = accuracy;
        }
    }

    fn on_strike(&mut self, evaluation: &Evaluation, now: Instant, events: &mut Vec<GameEvent>) {
        self.push_log("STRIKE DETECTED. Guard Inbound.", LogKind::Err);
        self.banked_correct += evaluation.progress.correct;

        let guard_id = self.next_id();
        let x = if self.rng.gen_bool(0.5) {
            0.0
        } else {
            self.rules.arena_width
        };
        let y = self.rng.gen_range(0.0..self.rules.arena_height);
        self.guards.push(Guard::new(guard_id, x, y, self.local_id, self.rules.guard_speed));

        let damage = self.rules.strike_damage;
        events.push(GameEvent::Strike { guard_id, damage });
        self.damage_local(damage, EliminationCause::Strike, now, events);

        // The latched matcher keeps rejecting input until the replacement lands
        self.request_snippet(self.rules.stun_cooldown);
    }

    fn on_completed(&mut self, evaluation: &Evaluation, events: &mut Vec<GameEvent>) {
        self.push_log("Commit successful. Restore HP.", LogKind::Sys);
        self.banked_correct += evaluation.progress.correct;
        self.snippets_completed += 1;

        let heal = self.rules.completion_heal;
        let max_health = self.rules.max_health;
        if let Some(local) = self.local_player_mut() {
            if local.alive {
                local.health = CombatSystem::heal(local.health, heal, max_health);
            }
        }
        events.push(GameEvent::SnippetCompleted { heal });

        self.request_snippet(Duration::ZERO);
        self.snippet = None;
        self.matcher = None;
    }

    fn damage_local(
        &mut self,
        damage: f32,
        cause: EliminationCause,
        now: Instant,
        events: &mut Vec<GameEvent>,
    ) {
        let Some(idx) = self.players.iter().position(|p| p.id == self.local_id) else {
            return;
        };
        let player = &mut self.players[idx];
        if !player.alive {
            return;
        }

        let (health, dead) = CombatSystem::apply_damage(player.health, damage);
        player.health = health;
        if dead && self.eliminate(idx, cause, events) {
            self.finish_match(now, events);
        }
    }

    /// Run a single simulation tick
    pub fn tick(&mut self, now: Instant) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state != MatchState::Playing {
            return events;
        }
        self.tick += 1;

        // Zone shrinks first; exposure uses the new radius
        if CombatSystem::shrink_zone(
            &mut self.zone,
            self.rules.zone_shrink_per_tick,
            self.rules.zone_alert_interval,
        ) {
            self.push_log("Critical: Safe zone shrinking rapidly.", LogKind::Sys);
            events.push(GameEvent::ZoneAlert {
                radius: self.zone.radius,
            });
        }

        let deaths = self.update_players(&mut events);

        let mut local_died = false;
        for (idx, cause) in deaths {
            local_died |= self.eliminate(idx, cause, &mut events);
        }
        if local_died {
            self.finish_match(now, &mut events);
        }

        // Guards read positions after eliminations are settled
        self.update_guards(now, &mut events);

        events
    }

    /// Exposure damage, bot drift and attrition.
    /// Returns players whose health ran out, in roster order.
    fn update_players(&mut self, events: &mut Vec<GameEvent>) -> Vec<(usize, EliminationCause)> {
        let mut deaths = Vec::new();
        let attrition = CombatSystem::attrition_chance(
            &self.zone,
            self.rules.attrition_base,
            self.rules.attrition_shrink_divisor,
        );

        for (idx, player) in self.players.iter_mut().enumerate() {
            if !player.alive {
                continue;
            }

            let mut cause = None;
            let damage = CombatSystem::exposure_damage(
                &self.zone,
                player.x,
                player.y,
                self.rules.exposure_damage,
            );
            if damage > 0.0 {
                let (health, dead) = CombatSystem::apply_damage(player.health, damage);
                player.health = health;
                events.push(GameEvent::ZoneDamage {
                    player_id: player.id,
                    damage,
                });
                if dead {
                    cause = Some(EliminationCause::Zone);
                }
            }

            // Dying bots stay where the damage landed
            if player.is_bot && cause.is_none() {
                let (x, y) = CombatSystem::bot_step(
                    &self.zone,
                    player.x,
                    player.y,
                    self.rules.bot_step,
                    self.rules.bot_settle_distance,
                );
                player.x = x;
                player.y = y;

                if CombatSystem::roll_attrition(&mut self.rng, attrition) {
                    player.health = 0.0;
                    cause = Some(EliminationCause::Attrition);
                }
            }

            if let Some(cause) = cause {
                deaths.push((idx, cause));
            }
        }

        deaths
    }

    fn update_guards(&mut self, now: Instant, events: &mut Vec<GameEvent>) {
        let mut captures = Vec::new();

        for guard in &mut self.guards {
            let Some(target) = self.players.iter().find(|p| p.id == guard.target_id) else {
                continue;
            };
            if !target.alive {
                continue;
            }

            let step = guard.advance(target.x, target.y, self.rules.guard_capture_radius);
            if step == GuardStep::Captured {
                captures.push((guard.id, guard.target_id));
            }
        }

        for (guard_id, target_id) in captures {
            self.guards.retain(|g| g.id != guard_id);

            let Some(idx) = self.players.iter().position(|p| p.id == target_id) else {
                continue;
            };
            let damage = self.rules.guard_damage;
            let target = &mut self.players[idx];
            if !target.alive {
                continue;
            }
            let (health, dead) = CombatSystem::apply_damage(target.health, damage);
            target.health = health;
            events.push(GameEvent::GuardCapture {
                guard_id,
                target_id,
                damage,
            });

            if dead && self.eliminate(idx, EliminationCause::Guard, events) {
                self.finish_match(now, events);
            }
        }
    }

    /// Mark a player dead. Returns true if it was the local player.
    fn eliminate(
        &mut self,
        idx: usize,
        cause: EliminationCause,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        let player = &mut self.players[idx];
        if !player.alive {
            return false;
        }
        player.health = 0.0;
        player.alive = false;

        events.push(GameEvent::Eliminated {
            player_id: player.id,
            is_bot: player.is_bot,
            x: player.x,
            y: player.y,
            cause,
        });

        if !player.is_bot {
            info!(player_id = %player.id, ?cause, "Local player eliminated");
            return true;
        }

        let name = player.name.clone();
        debug!(player_id = %player.id, ?cause, "Bot eliminated");
        self.push_log(format!("Process {} killed.", name), LogKind::Err);

        let local_alive = self.local_player().map(|p| p.alive).unwrap_or(false);
        if !local_alive {
            self.spectator_chat.push_back(format!("Spectator: RIP {}", name));
            while self.spectator_chat.len() > MAX_CHAT_LINES {
                self.spectator_chat.pop_front();
            }
        }

        false
    }

    fn finish_match(&mut self, now: Instant, events: &mut Vec<GameEvent>) {
        if self.state == MatchState::GameOver {
            return;
        }
        self.state = MatchState::GameOver;

        let stats = GameStats {
            rank: self.alive_bots() as u32 + 1,
            total_players: self.players.len() as u32,
            wpm: self.wpm,
            accuracy: self.accuracy,
            time_survived_secs: self
                .started_at
                .map(|start| elapsed_secs(start, now))
                .unwrap_or(0),
        };
        info!(
            match_generation = self.generation,
            rank = stats.rank,
            wpm = stats.wpm,
            survived_secs = stats.time_survived_secs,
            "Match over"
        );
        self.stats = Some(stats.clone());
        events.push(GameEvent::GameOver { stats });

        let best = self.best.unwrap_or_default();
        if best.beaten_by(self.wpm) {
            let record = HighScore {
                wpm: self.wpm,
                accuracy: self.accuracy,
            };
            self.best = Some(record);
            events.push(GameEvent::NewHighScore { record });
        }
    }

    /// Append a line to the terminal log
    pub fn push_log(&mut self, message: impl Into<String>, kind: LogKind) {
        let message = message.into();
        match kind {
            LogKind::Err => warn!(target: "terminal", "{}", message),
            LogKind::Sys | LogKind::Info => info!(target: "terminal", "{}", message),
        }

        self.logs.push_back(LogLine { message, kind });
        while self.logs.len() > MAX_LOG_LINES {
            self.logs.pop_front();
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> MatchState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn local_id(&self) -> Uuid {
        self.local_id
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn local_player(&self) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.id == self.local_id)
    }

    fn local_player_mut(&mut self) -> Option<&mut PlayerState> {
        let local_id = self.local_id;
        self.players.iter_mut().find(|p| p.id == local_id)
    }

    pub fn guards(&self) -> &[Guard] {
        &self.guards
    }

    pub fn zone(&self) -> &SafeZone {
        &self.zone
    }

    pub fn snippet(&self) -> Option<&CodeSnippet> {
        self.snippet.as_ref()
    }

    /// What the player has typed on the current snippet
    pub fn typed_input(&self) -> String {
        self.matcher.as_ref().map(|m| m.input()).unwrap_or_default()
    }

    /// Score of the current snippet so far
    pub fn typing_progress(&self) -> Option<Progress> {
        self.matcher.as_ref().map(|m| m.progress())
    }

    /// Struck and waiting out the cooldown
    pub fn is_stunned(&self) -> bool {
        self.matcher.as_ref().map(|m| m.is_latched()).unwrap_or(false)
    }

    /// Whether a keystroke would currently be evaluated
    pub fn accepts_input(&self) -> bool {
        self.state != MatchState::GameOver
            && self.matcher.as_ref().map(|m| m.accepts_input()).unwrap_or(false)
    }

    pub fn wpm(&self) -> u32 {
        self.wpm
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    pub fn snippets_completed(&self) -> u32 {
        self.snippets_completed
    }

    pub fn stats(&self) -> Option<&GameStats> {
        self.stats.as_ref()
    }

    pub fn best(&self) -> Option<HighScore> {
        self.best
    }

    pub fn logs(&self) -> impl Iterator<Item = &LogLine> {
        self.logs.iter()
    }

    pub fn spectator_chat(&self) -> impl Iterator<Item = &String> {
        self.spectator_chat.iter()
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|p| p.alive).count()
    }

    fn alive_bots(&self) -> usize {
        self.players.iter().filter(|p| p.alive && p.is_bot).count()
    }
}
