//! TUI reducer.
//!
//! All state mutations happen here. The runtime calls
//! `update(state, event)` and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use serde_json::{Value, json};

use pah_core::components::{
    ComponentAction, LearningSession, LogDraftData, NewsItem, QuizKind, QuizQuestion,
    ResourcePreviewData, TimesheetEntry,
};
use pah_core::events::ChatEvent;
use pah_core::push::PushUpdate;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::features::feed::{ActiveCard, find_active_card};
use crate::state::{ChatTurn, TuiState};

pub fn update(state: &mut TuiState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => {
            state.spinner_frame = state.spinner_frame.wrapping_add(1);
            state.status.expire_notice();
            vec![]
        }
        UiEvent::Frame { width, height } => {
            state.width = width;
            state.height = height;
            vec![]
        }
        UiEvent::Terminal(term_event) => handle_terminal_event(state, &term_event),
        UiEvent::Chat(chat_event) => handle_chat_event(state, &chat_event),
        UiEvent::ChatSpawned { rx, cancel } => {
            state.chat = ChatTurn::Active { rx, cancel };
            vec![]
        }
        UiEvent::Push(update) => handle_push_update(state, update),
    }
}

fn handle_chat_event(state: &mut TuiState, event: &ChatEvent) -> Vec<UiEffect> {
    state.feed.apply_chat_event(event);
    match event {
        ChatEvent::Error { message, .. } => {
            state.status.notify_error(message.clone());
            state.chat = ChatTurn::Idle;
        }
        ChatEvent::Interrupted => {
            state.status.notify("Turn interrupted");
            state.chat = ChatTurn::Idle;
        }
        ChatEvent::TurnCompleted => {
            state.chat = ChatTurn::Idle;
        }
        _ => {}
    }
    vec![]
}

fn handle_push_update(state: &mut TuiState, update: PushUpdate) -> Vec<UiEffect> {
    state.events.apply(&update);
    match update {
        PushUpdate::Connected => state.status.set_connected(),
        PushUpdate::Disconnected { error } => state.status.set_disconnected(error),
        PushUpdate::Event(event) => {
            if state.feed.ingest_push_event(&event) && event.event_type == "url_summary_complete" {
                state.status.notify("Summary received");
            }
        }
    }
    vec![]
}

fn handle_terminal_event(state: &mut TuiState, event: &Event) -> Vec<UiEffect> {
    let mut effects = match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => handle_key(state, key),
        Event::Paste(text) => {
            state.input.insert_str(text);
            vec![]
        }
        Event::Mouse(mouse) => {
            match mouse.kind {
                MouseEventKind::ScrollUp => state.scroll.scroll_up(3, usize::MAX),
                MouseEventKind::ScrollDown => state.scroll.scroll_down(3),
                _ => {}
            }
            vec![]
        }
        _ => vec![],
    };

    if let Some(text) = state.input.take_dirty() {
        effects.push(UiEffect::SaveDraft { text });
    }
    effects
}

fn handle_key(state: &mut TuiState, key: &KeyEvent) -> Vec<UiEffect> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return handle_ctrl_key(state, key.code);
    }

    match key.code {
        KeyCode::Enter => submit(state),
        KeyCode::Esc => {
            if state.chat.is_active() {
                vec![UiEffect::InterruptChat]
            } else {
                state.scroll.jump_to_bottom();
                vec![]
            }
        }
        KeyCode::Char(ch) => {
            state.input.insert(ch);
            vec![]
        }
        KeyCode::Backspace => {
            state.input.backspace();
            vec![]
        }
        KeyCode::Delete => {
            state.input.delete();
            vec![]
        }
        KeyCode::Left => {
            state.input.move_left();
            vec![]
        }
        KeyCode::Right => {
            state.input.move_right();
            vec![]
        }
        KeyCode::Home => {
            state.input.move_home();
            vec![]
        }
        KeyCode::End => {
            state.input.move_end();
            vec![]
        }
        KeyCode::Up | KeyCode::PageUp => {
            let lines = if key.code == KeyCode::PageUp { 10 } else { 1 };
            state.scroll.scroll_up(lines, usize::MAX);
            vec![]
        }
        KeyCode::Down | KeyCode::PageDown => {
            let lines = if key.code == KeyCode::PageDown { 10 } else { 1 };
            state.scroll.scroll_down(lines);
            vec![]
        }
        _ => vec![],
    }
}

fn handle_ctrl_key(state: &mut TuiState, code: KeyCode) -> Vec<UiEffect> {
    match code {
        KeyCode::Char('c') => {
            if state.chat.is_active() {
                vec![UiEffect::InterruptChat]
            } else {
                state.should_quit = true;
                vec![UiEffect::Quit]
            }
        }
        KeyCode::Char(ch) => handle_card_key(state, ch),
        _ => vec![],
    }
}

fn submit(state: &mut TuiState) -> Vec<UiEffect> {
    if state.input.is_empty() {
        return vec![];
    }
    if state.feed.is_busy() {
        state.status.notify("Wait for the current turn to finish");
        return vec![];
    }
    let text = state.input.take();
    state.feed.push_user_message(text.trim());
    state.scroll.jump_to_bottom();
    vec![UiEffect::StartChatTurn]
}

/// Routes a Ctrl chord to the most recent actionable card.
fn handle_card_key(state: &mut TuiState, ch: char) -> Vec<UiEffect> {
    let Some(card) = find_active_card(&state.feed, &state.feed_ui) else {
        return vec![];
    };
    match card.kind.as_str() {
        "pah-log-draft-card" => log_draft_action(state, &card, ch),
        "pah-timesheet-form" => timesheet_action(state, &card, ch),
        "pah-resource-preview" => resource_action(state, &card, ch),
        "pah-news-digest" => news_action(state, &card, ch),
        "confirmation" => confirmation_action(state, &card, ch),
        "pah-learning-plan" => learning_action(state, &card, ch),
        "pah-quiz" => quiz_action(state, &card, ch),
        _ => vec![],
    }
}

fn log_draft_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    match ch {
        's' => {
            let draft: LogDraftData = field_as(&card.payload, "defaultValues");
            // The card shows "Saving…" until the hub confirms.
            state
                .feed_ui
                .patch(card.key.clone(), json!({ "state": "saving" }));
            vec![UiEffect::DispatchAction(ComponentAction::SaveLogDraft {
                draft,
            })]
        }
        'x' => {
            state
                .feed_ui
                .patch(card.key.clone(), json!({ "state": "cancelled" }));
            vec![UiEffect::DispatchAction(ComponentAction::CancelLogDraft)]
        }
        _ => vec![],
    }
}

fn timesheet_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    if ch != 's' {
        return vec![];
    }
    let entry: TimesheetEntry = field_as(&card.payload, "defaultValues");
    state
        .feed_ui
        .patch(card.key.clone(), json!({ "state": "submitted" }));
    vec![UiEffect::DispatchAction(ComponentAction::SubmitTimesheet {
        entry,
    })]
}

fn resource_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    let resource: ResourcePreviewData = field_as(&card.payload, "data");
    let action = match ch {
        's' => ComponentAction::SaveResource { resource },
        'l' => ComponentAction::ReadLaterResource { resource },
        _ => return vec![],
    };
    state
        .feed_ui
        .patch(card.key.clone(), json!({ "state": "saving" }));
    vec![UiEffect::DispatchAction(action)]
}

fn news_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    let mut items: Vec<NewsItem> = field_as(&card.payload, "items");
    if items.is_empty() {
        return vec![];
    }
    let item = items.remove(0);
    let action = match ch {
        'b' => ComponentAction::BookmarkNews { item },
        'x' => ComponentAction::DismissNews { item },
        _ => return vec![],
    };
    state
        .feed_ui
        .patch(card.key.clone(), json!({ "items": items }));
    vec![UiEffect::DispatchAction(action)]
}

fn confirmation_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    let approved = match ch {
        'y' => true,
        'r' => false,
        _ => return vec![],
    };
    let tool_name = card
        .payload
        .get("toolName")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned();
    state.feed_ui.patch(
        card.key.clone(),
        json!({ "state": "approval-responded", "approved": approved }),
    );
    vec![UiEffect::DispatchAction(
        ComponentAction::RespondConfirmation {
            tool_name,
            approved,
        },
    )]
}

fn learning_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    if ch != 's' {
        return vec![];
    }
    let sessions: Vec<LearningSession> = field_as(&card.payload, "sessions");
    let Some(session) = sessions.into_iter().next() else {
        return vec![];
    };
    state.feed_ui.patch(
        card.key.clone(),
        json!({ "startedSessionId": session.id }),
    );
    vec![UiEffect::DispatchAction(
        ComponentAction::StartLearningSession { session },
    )]
}

fn quiz_action(state: &mut TuiState, card: &ActiveCard, ch: char) -> Vec<UiEffect> {
    let questions: Vec<QuizQuestion> = field_as(&card.payload, "questions");
    if questions.is_empty() {
        return vec![];
    }
    let progress = state.feed_ui.quiz_mut(&card.key);
    match ch {
        '1'..='4' => {
            let option = (ch as usize) - ('1' as usize);
            if let Some(question) = questions.get(progress.current) {
                progress.select(option, question);
            }
        }
        'n' => {
            let current = questions.get(progress.current);
            if !progress.revealed && current.is_some_and(|q| q.kind == QuizKind::FreeText) {
                progress.reveal();
            } else if progress.advance(questions.len()) && progress.is_finished(questions.len()) {
                // Answers stay local until the quiz ends; only the
                // final score goes back to the hub.
                let results = json!({
                    "score": progress.score(),
                    "graded": progress.graded(),
                    "total": questions.len(),
                });
                return vec![UiEffect::DispatchAction(ComponentAction::FinishQuiz {
                    results,
                })];
            }
        }
        _ => {}
    }
    vec![]
}

fn field_as<T: Default + serde::de::DeserializeOwned>(payload: &Value, field: &str) -> T {
    payload
        .get(field)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}
