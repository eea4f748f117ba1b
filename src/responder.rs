// Conversation responder: classifies a text command and produces reply messages.

use std::sync::Arc;

use serde::Serialize;

use crate::catalog::MoveCount;
use crate::error::ConfigError;
use crate::inventory::InventoryService;
use crate::metrics;

pub const HELP_COMMAND: &str = "使い方";
pub const RESET_COMMAND: &str = "リセット";
pub const STOCK_COMMAND: &str = "ストック";
pub const ANSWER_COMMANDS: [&str; 2] = ["かいとう", "解答"];

pub const RESET_DONE_TEXT: &str = "問題がリセットされました。";
pub const RESET_FAILED_TEXT: &str =
    "問題のリセットに失敗しました。時間をおいてもう一度お試しください。";
pub const NO_PENDING_ANSWERS_TEXT: &str = "解答待ちの問題はありません。";
pub const EMPTY_CATALOG_TEXT: &str = "ストックがありません。";

// ── Move range ───────────────────────────────────────────────────────

/// Inclusive bounds on the move counts a user may request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRange {
    min: u32,
    max: u32,
}

impl MoveRange {
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min == 0 || min > max {
            return Err(ConfigError::EmptyRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// The move count for `n`, if it is odd and inside the range.
    pub fn validate(&self, n: i64) -> Option<MoveCount> {
        u32::try_from(n)
            .ok()
            .filter(|n| (self.min..=self.max).contains(n))
            .and_then(MoveCount::new)
    }
}

impl Default for MoveRange {
    fn default() -> Self {
        Self { min: 7, max: 19 }
    }
}

// ── Intents ──────────────────────────────────────────────────────────

/// Outcome of interpreting a non-command message as a move count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PuzzleRequest {
    Valid(MoveCount),
    /// Not an integer, even, or out of range.
    Invalid,
}

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    HowToUse,
    Reset,
    Stock,
    Answer,
    PuzzleRequest(PuzzleRequest),
}

impl Intent {
    /// Metric label for this intent.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::HowToUse => "how_to_use",
            Intent::Reset => "reset",
            Intent::Stock => "stock",
            Intent::Answer => "answer",
            Intent::PuzzleRequest(PuzzleRequest::Valid(_)) => "puzzle",
            Intent::PuzzleRequest(PuzzleRequest::Invalid) => "invalid",
        }
    }
}

/// Map incoming text to an intent. Commands match exactly; anything else
/// is read as a move count.
pub fn classify(text: &str, range: MoveRange) -> Intent {
    match text {
        HELP_COMMAND => Intent::HowToUse,
        RESET_COMMAND => Intent::Reset,
        STOCK_COMMAND => Intent::Stock,
        _ if ANSWER_COMMANDS.contains(&text) => Intent::Answer,
        _ => {
            let request = match parse_number(text) {
                Some(n) => range
                    .validate(n)
                    .map_or(PuzzleRequest::Invalid, PuzzleRequest::Valid),
                None => PuzzleRequest::Invalid,
            };
            Intent::PuzzleRequest(request)
        }
    }
}

/// Parse an integer the way users type it: surrounding whitespace is
/// ignored and full-width digits (as produced by a Japanese IME) count as
/// ASCII digits.
fn parse_number(text: &str) -> Option<i64> {
    let normalized: String = text
        .trim()
        .chars()
        .map(|c| match c {
            '０'..='９' => char::from_digit(c as u32 - '０' as u32, 10).unwrap_or(c),
            _ => c,
        })
        .collect();
    normalized.parse().ok()
}

// ── Outbound messages ────────────────────────────────────────────────

/// A message to send back, in the messaging API's JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum OutboundMessage {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image", rename_all = "camelCase")]
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
}

impl OutboundMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutboundMessage::Text { text: text.into() }
    }

    /// Image message using the same URL for the full and preview image.
    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        OutboundMessage::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }
}

// ── Responder ────────────────────────────────────────────────────────

/// Turns one text command into the messages to reply with.
#[derive(Clone)]
pub struct Responder {
    inventory: Arc<InventoryService>,
    range: MoveRange,
}

impl Responder {
    pub fn new(inventory: Arc<InventoryService>, range: MoveRange) -> Self {
        Self { inventory, range }
    }

    pub fn inventory(&self) -> &InventoryService {
        &self.inventory
    }

    /// Handle one command. Always returns at least one message.
    pub fn respond(&self, text: &str) -> Vec<OutboundMessage> {
        let intent = classify(text, self.range);
        metrics::COMMANDS_TOTAL
            .with_label_values(&[intent.label()])
            .inc();
        tracing::debug!(?intent, "Classified command");

        match intent {
            Intent::HowToUse => vec![OutboundMessage::text(self.how_to_use())],
            Intent::Reset => vec![self.reset()],
            Intent::Stock => vec![self.stock()],
            Intent::Answer => self.answers(),
            Intent::PuzzleRequest(PuzzleRequest::Valid(moves)) => vec![self.puzzle(moves)],
            Intent::PuzzleRequest(PuzzleRequest::Invalid) => {
                vec![OutboundMessage::text(self.guidance())]
            }
        }
    }

    pub fn guidance(&self) -> String {
        format!(
            "{}から{}までの奇数を入力すると、詰将棋の図が出てくるよ。",
            self.range.min, self.range.max
        )
    }

    fn how_to_use(&self) -> String {
        format!(
            "【使い方】\n\
             ・{min}〜{max}の奇数：その手数の詰将棋を出題\n\
             ・{answer}：出題した問題の解答を表示\n\
             ・{stock}：手数ごとの残り問題数を表示\n\
             ・{reset}：問題と解答をリセット\n\
             ・{help}：この説明を表示",
            min = self.range.min,
            max = self.range.max,
            answer = ANSWER_COMMANDS.join("／"),
            stock = STOCK_COMMAND,
            reset = RESET_COMMAND,
            help = HELP_COMMAND,
        )
    }

    fn reset(&self) -> OutboundMessage {
        match self.inventory.reset() {
            Ok(()) => {
                metrics::CATALOG_RESETS_TOTAL.with_label_values(&["ok"]).inc();
                tracing::warn!("Puzzle catalog has been reset");
                OutboundMessage::text(RESET_DONE_TEXT)
            }
            Err(e) => {
                metrics::CATALOG_RESETS_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                tracing::error!("Puzzle catalog reset failed: {e}");
                OutboundMessage::text(RESET_FAILED_TEXT)
            }
        }
    }

    fn stock(&self) -> OutboundMessage {
        let report = self.inventory.stock_report();
        if report.is_empty() {
            return OutboundMessage::text(EMPTY_CATALOG_TEXT);
        }
        let lines: Vec<String> = report
            .iter()
            .map(|entry| format!("{}手：残り{}問", entry.moves, entry.remaining))
            .collect();
        OutboundMessage::text(lines.join("\n"))
    }

    fn answers(&self) -> Vec<OutboundMessage> {
        let answers = self.inventory.drain_answers();
        if answers.is_empty() {
            return vec![OutboundMessage::text(NO_PENDING_ANSWERS_TEXT)];
        }
        answers.into_iter().map(OutboundMessage::text).collect()
    }

    fn puzzle(&self, moves: MoveCount) -> OutboundMessage {
        let label = moves.to_string();
        match self.inventory.serve(moves) {
            Some(record) => {
                metrics::PUZZLES_SERVED_TOTAL
                    .with_label_values(&[label.as_str()])
                    .inc();
                OutboundMessage::image(record.question_image)
            }
            None => {
                metrics::STOCK_EXHAUSTED_TOTAL
                    .with_label_values(&[label.as_str()])
                    .inc();
                OutboundMessage::text(format!(
                    "{moves}手の詰将棋ストックがありません。ほかの手数を入力してください。"
                ))
            }
        }
    }
}
