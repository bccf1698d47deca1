//! TUI runtime: owns the terminal, runs the event loop, executes
//! effects.
//!
//! The reducer stays pure and returns effects; everything with a side
//! effect (HTTP, draft writes, spawning turns) happens here.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;

use pah_core::callback::CallbackSink;
use pah_core::draft::DraftStore;
use pah_core::push::PushUpdate;
use pah_core::transport::ChatClient;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::{ChatTurn, TuiState};
use crate::{render, terminal, update};

/// Target frame rate while streaming (~60fps).
pub const FRAME_DURATION: Duration = Duration::from_millis(16);

/// Poll duration when nothing is streaming. Longer timeout keeps CPU
/// usage down while idle.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: TuiState,
    chat: ChatClient,
    callbacks: CallbackSink,
    drafts: DraftStore,
    /// Server-push stream, fed by the push client task.
    push_rx: mpsc::UnboundedReceiver<PushUpdate>,
    last_tick: Instant,
    last_terminal_event: Instant,
}

impl TuiRuntime {
    /// Sets up the terminal and builds the runtime. The caller spawns
    /// the push client and hands over its receiver.
    pub fn new(
        chat: ChatClient,
        callbacks: CallbackSink,
        drafts: DraftStore,
        push_rx: mpsc::UnboundedReceiver<PushUpdate>,
    ) -> Result<Self> {
        // Panic hook goes in before the alternate screen.
        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal().context("Failed to setup terminal")?;

        let state = TuiState::new(drafts.load());

        let now = Instant::now();
        Ok(Self {
            terminal,
            state,
            chat,
            callbacks,
            drafts,
            push_rx,
            last_tick: now,
            last_terminal_event: now,
        })
    }

    /// Runs the event loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        let result = self.event_loop();
        let _ = terminal::restore_terminal();
        result
    }

    fn event_loop(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let mut events = self.collect_events()?;

            // Frame goes first so layout reflects the current size
            // before anything else renders against it.
            let size = self.terminal.size()?;
            events.insert(
                0,
                UiEvent::Frame {
                    width: size.width,
                    height: size.height,
                },
            );

            for event in events {
                if matches!(&event, UiEvent::Terminal(_)) {
                    self.last_terminal_event = Instant::now();
                }
                // Only Tick triggers a render; terminal and stream
                // events batch up to the next tick.
                if matches!(&event, UiEvent::Tick) {
                    dirty = true;
                }
                let effects = update::update(&mut self.state, event);
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal.draw(|frame| {
                    render::render(&self.state, frame);
                })?;
                dirty = false;
            }
        }

        Ok(())
    }

    /// Collects pending events from the chat stream, the push stream,
    /// and the terminal, then emits a Tick when its interval elapsed.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        let recent_terminal_activity = self.last_terminal_event.elapsed() < IDLE_POLL_DURATION;
        let tick_interval = if self.state.chat.is_active() || recent_terminal_activity {
            FRAME_DURATION
        } else {
            IDLE_POLL_DURATION
        };

        self.collect_chat_events(&mut events);
        while let Ok(update) = self.push_rx.try_recv() {
            events.push(UiEvent::Push(update));
        }

        // Block until the next tick is due unless there is already
        // work to process.
        let poll_duration = if events.is_empty() {
            tick_interval.saturating_sub(self.last_tick.elapsed())
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn collect_chat_events(&mut self, events: &mut Vec<UiEvent>) {
        while let ChatTurn::Active { rx, .. } = &mut self.state.chat {
            match rx.try_recv() {
                Ok(event) => events.push(UiEvent::Chat(event)),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            self.execute_effect(effect);
        }
    }

    fn execute_effect(&mut self, effect: UiEffect) {
        match effect {
            UiEffect::Quit => {
                self.state.should_quit = true;
            }
            UiEffect::StartChatTurn => {
                let (rx, cancel) = self.chat.start_turn(self.state.feed.messages());
                let effects = update::update(&mut self.state, UiEvent::ChatSpawned { rx, cancel });
                self.execute_effects(effects);
            }
            UiEffect::InterruptChat => {
                if let ChatTurn::Active { cancel, .. } = &self.state.chat {
                    cancel.cancel();
                }
            }
            UiEffect::DispatchAction(action) => {
                self.callbacks.dispatch(action);
            }
            UiEffect::SaveDraft { text } => {
                if let Err(error) = self.drafts.save(&text) {
                    tracing::warn!("failed to persist draft: {error:#}");
                }
            }
        }
    }
}
