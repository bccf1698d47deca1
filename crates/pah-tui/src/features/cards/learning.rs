//! Learning cards: study plan and quiz.
//!
//! The quiz keeps local progress (current question, selection,
//! answers) outside the message part, so re-renders of the same part
//! don't reset it.

use serde::Deserialize;
use serde_json::Value;

use pah_core::components::{LearningSession, QuizKind, QuizQuestion};

use super::{
    RenderContext, badge_line, field_line, footer_line, payload_as, title_line,
    wrapped_field_lines,
};
use crate::style::{Style, StyledLine, StyledSpan};

/// Local state of one quiz card.
#[derive(Debug, Clone, Default)]
pub struct QuizProgress {
    /// Index of the question being shown.
    pub current: usize,
    /// The option picked for the current question, if any.
    pub selected: Option<usize>,
    /// Whether the current question's feedback is showing. Free-text
    /// questions reveal without a selection.
    pub revealed: bool,
    /// Grade per answered question; `None` for ungraded free text.
    answered: Vec<Option<bool>>,
}

impl QuizProgress {
    /// Questions answered correctly.
    pub fn score(&self) -> usize {
        self.answered.iter().filter(|a| **a == Some(true)).count()
    }

    /// Questions that could be graded (multiple choice only).
    pub fn graded(&self) -> usize {
        self.answered.iter().filter(|a| a.is_some()).count()
    }

    /// Records the pick for the current question. No-op once revealed
    /// and for free-text questions.
    pub fn select(&mut self, option: usize, question: &QuizQuestion) {
        if self.revealed
            || question.kind != QuizKind::MultipleChoice
            || option >= question.options.len()
        {
            return;
        }
        self.selected = Some(option);
        self.revealed = true;
        self.answered.push(Some(question.is_correct_option(option)));
    }

    /// Shows the model answer for a free-text question.
    pub fn reveal(&mut self) {
        if self.revealed {
            return;
        }
        self.revealed = true;
        self.answered.push(None);
    }

    /// Moves past the feedback screen. Returns false if nothing was
    /// revealed to advance from.
    pub fn advance(&mut self, total: usize) -> bool {
        if !self.revealed || self.current >= total {
            return false;
        }
        self.selected = None;
        self.revealed = false;
        self.current += 1;
        true
    }

    pub fn is_finished(&self, total: usize) -> bool {
        self.current >= total
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LearningPlanPayload {
    #[serde(default)]
    user_name: Option<String>,
    #[serde(default)]
    sessions: Vec<LearningSession>,
    /// Local override set once a session is started.
    #[serde(default)]
    started_session_id: Option<String>,
}

pub(super) fn render_learning_plan(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: LearningPlanPayload = payload_as(payload);

    let title = match &card.user_name {
        Some(name) => format!("Learning Plan for {name}"),
        None => "Learning Plan".to_string(),
    };
    let mut lines = vec![title_line(&title)];
    if card.sessions.is_empty() {
        lines.push(badge_line("No sessions planned.", Style::CardMuted));
        lines.push(footer_line(&[]));
        return lines;
    }

    lines.push(field_line(
        "Today",
        &format!("{} sessions", card.sessions.len()),
    ));
    for session in &card.sessions {
        let started = card.started_session_id.as_deref() == Some(session.id.as_str());
        let marker = if started { "▶" } else { "○" };
        let style = if started { Style::CardDone } else { Style::CardValue };
        let mut spans = vec![
            StyledSpan::new("│ ", Style::CardBorder),
            StyledSpan::new(format!("{marker} "), style),
            StyledSpan::new(session.title.clone(), Style::Strong),
            StyledSpan::new(format!(" ({})", session.estimated_time), Style::CardMuted),
        ];
        if let Some(domain) = &session.source_domain {
            spans.push(StyledSpan::new(format!(" · {domain}"), Style::CardMuted));
        }
        lines.push(StyledLine { spans });
        if !session.reason.is_empty() {
            lines.extend(wrapped_field_lines(ctx.width, &session.reason, Style::Thinking));
        }
    }
    if card.started_session_id.is_some() {
        lines.push(badge_line("Session started", Style::CardDone));
        lines.push(footer_line(&[]));
    } else {
        lines.push(footer_line(&["ctrl+s start first session"]));
    }
    lines
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuizPayload {
    #[serde(default)]
    questions: Vec<QuizQuestion>,
}

pub(super) fn render_quiz(ctx: &RenderContext, payload: &Value) -> Vec<StyledLine> {
    let card: QuizPayload = payload_as(payload);
    let default_progress = QuizProgress::default();
    let progress = ctx.quiz.unwrap_or(&default_progress);

    let mut lines = vec![title_line("Quiz")];
    if card.questions.is_empty() {
        lines.push(badge_line("No questions.", Style::CardMuted));
        lines.push(footer_line(&[]));
        return lines;
    }

    if progress.is_finished(card.questions.len()) {
        lines.push(badge_line(
            &format!("Finished: {}/{} correct", progress.score(), progress.graded()),
            Style::CardDone,
        ));
        lines.push(footer_line(&[]));
        return lines;
    }

    let question = &card.questions[progress.current];
    lines.push(field_line(
        "Question",
        &format!("{}/{}", progress.current + 1, card.questions.len()),
    ));
    lines.extend(wrapped_field_lines(ctx.width, &question.question, Style::Strong));

    match question.kind {
        QuizKind::MultipleChoice => {
            render_options(question, progress, &mut lines);
            if progress.revealed {
                let verdict = if progress.selected.is_some_and(|p| question.is_correct_option(p)) {
                    badge_line("Correct!", Style::CardDone)
                } else {
                    badge_line("Not quite.", Style::NoticeError)
                };
                lines.push(verdict);
                push_explanation(ctx, question, &mut lines);
                lines.push(footer_line(&["ctrl+n next"]));
            } else {
                lines.push(footer_line(&["ctrl+1..4 answer"]));
            }
        }
        QuizKind::FreeText => {
            if progress.revealed {
                if let Some(answer) = &question.correct_answer {
                    lines.push(field_line("Answer", answer));
                }
                push_explanation(ctx, question, &mut lines);
                lines.push(footer_line(&["ctrl+n next"]));
            } else {
                lines.push(badge_line("Think it through, then reveal.", Style::CardMuted));
                lines.push(footer_line(&["ctrl+n reveal"]));
            }
        }
    }
    lines
}

fn render_options(question: &QuizQuestion, progress: &QuizProgress, lines: &mut Vec<StyledLine>) {
    for (index, option) in question.options.iter().enumerate() {
        let marker = match progress.selected {
            Some(picked) if picked == index => "▸",
            _ => " ",
        };
        let style = if progress.revealed && question.is_correct_option(index) {
            Style::CardDone
        } else if progress.selected == Some(index) {
            Style::NoticeError
        } else {
            Style::CardValue
        };
        lines.push(StyledLine {
            spans: vec![
                StyledSpan::new("│ ", Style::CardBorder),
                StyledSpan::new(format!("{marker}{}. ", index + 1), Style::ListNumber),
                StyledSpan::new(option.text.clone(), style),
            ],
        });
    }
}

fn push_explanation(ctx: &RenderContext, question: &QuizQuestion, lines: &mut Vec<StyledLine>) {
    if !question.explanation.is_empty() {
        lines.extend(wrapped_field_lines(ctx.width, &question.explanation, Style::Thinking));
    }
    if let Some(highlight) = &question.source_highlight {
        lines.extend(wrapped_field_lines(ctx.width, highlight, Style::CardMuted));
    }
}
