//! Async session loop
//!
//! Serializes ticks, keystrokes, frames and snippet deliveries onto the
//! single [`MatchController`]. Snippet fetches run as spawned tasks and
//! report back through a channel tagged with the match generation.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::{GameEvent, MatchController, WorldSnapshot};
use crate::snippets::{CodeSnippet, SnippetSupplier};
use crate::store::ScoreStore;

use super::audio::AudioSink;
use super::input::Command;
use super::present::Presenter;

/// Buffered snippet deliveries
const SNIPPET_CHANNEL_SIZE: usize = 8;

type SnippetDelivery = (u64, CodeSnippet);

pub struct MatchRunner<A: AudioSink, P: Presenter> {
    controller: MatchController,
    supplier: Arc<SnippetSupplier>,
    store: Arc<dyn ScoreStore>,
    audio: A,
    presenter: P,
    tick_rate: Duration,
    frame_rate: Duration,
    fetches: Vec<JoinHandle<()>>,
}

impl<A: AudioSink, P: Presenter> MatchRunner<A, P> {
    pub fn new(
        controller: MatchController,
        supplier: Arc<SnippetSupplier>,
        store: Arc<dyn ScoreStore>,
        audio: A,
        presenter: P,
        tick_rate: Duration,
        frame_rate: Duration,
    ) -> Self {
        Self {
            controller,
            supplier,
            store,
            audio,
            presenter,
            tick_rate,
            frame_rate,
            fetches: Vec::new(),
        }
    }

    /// Run until `Quit`, the command stream ends, or `shutdown` resolves.
    /// Returns the final world state.
    pub async fn run<F>(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        shutdown: F,
    ) -> WorldSnapshot
    where
        F: Future<Output = ()>,
    {
        info!(
            tick_ms = self.tick_rate.as_millis() as u64,
            frame_ms = self.frame_rate.as_millis() as u64,
            "Session started"
        );

        let (snippet_tx, mut snippet_rx) = mpsc::channel::<SnippetDelivery>(SNIPPET_CHANNEL_SIZE);

        let mut tick_interval = interval(self.tick_rate);
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frame_interval = interval(self.frame_rate);
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tokio::pin!(shutdown);
        self.dispatch_fetches(&snippet_tx);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Shutdown requested");
                    break;
                }
                _ = tick_interval.tick() => {
                    let events = self.controller.tick(Instant::now());
                    self.handle_events(events);
                }
                _ = frame_interval.tick() => {
                    self.presenter.present(&WorldSnapshot::capture(&self.controller));
                }
                command = commands.recv() => match command {
                    Some(Command::Key(key)) => {
                        let events = self.controller.handle_key(key, Instant::now());
                        self.handle_events(events);
                    }
                    Some(Command::Restart) => {
                        self.abort_fetches();
                        self.controller.restart();
                    }
                    Some(Command::Quit) | None => {
                        info!("Player quit");
                        break;
                    }
                },
                Some((generation, snippet)) = snippet_rx.recv() => {
                    self.controller.deliver_snippet(generation, snippet);
                }
            }

            self.dispatch_fetches(&snippet_tx);
        }

        self.abort_fetches();

        let snapshot = WorldSnapshot::capture(&self.controller);
        self.presenter.present(&snapshot);
        info!("Session ended");
        snapshot
    }

    /// Spawn a fetch for any request the controller queued
    fn dispatch_fetches(&mut self, tx: &mpsc::Sender<SnippetDelivery>) {
        self.fetches.retain(|handle| !handle.is_finished());

        while let Some(request) = self.controller.take_snippet_request() {
            debug!(
                generation = request.generation,
                delay_ms = request.delay.as_millis() as u64,
                excluded = request.exclude.len(),
                "Requesting snippet"
            );

            let supplier = self.supplier.clone();
            let tx = tx.clone();
            self.fetches.push(tokio::spawn(async move {
                if !request.delay.is_zero() {
                    sleep(request.delay).await;
                }
                let snippet = supplier.fetch_next(&request.exclude).await;
                if tx.send((request.generation, snippet)).await.is_err() {
                    debug!("Runner gone, dropping snippet");
                }
            }));
        }
    }

    /// Cancel in-flight fetches; late results would be discarded anyway
    fn abort_fetches(&mut self) {
        for handle in self.fetches.drain(..) {
            handle.abort();
        }
    }

    fn handle_events(&mut self, events: Vec<GameEvent>) {
        let mut redraw = false;

        for event in events {
            if let Some(cue) = event.audio_cue() {
                self.audio.play(cue);
            }

            match event {
                GameEvent::NewHighScore { record } => {
                    if let Err(e) = self.store.save(&record) {
                        warn!(error = %e, "Failed to persist high score");
                    }
                }
                GameEvent::GameOver { .. } => redraw = true,
                _ => {}
            }
        }

        if redraw {
            self.presenter.present(&WorldSnapshot::capture(&self.controller));
        }
    }
}
