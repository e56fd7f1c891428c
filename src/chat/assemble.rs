//! Post-processing of raw model output into an answer plus follow-up
//! questions.
//!
//! The system prompt instructs the model to append a fixed separator line
//! followed by suggested next questions, one per line. This module splits
//! that raw text apart. It is a pure function so the conversation logic can
//! be tested without any network dependency.

/// The literal the model is instructed to emit between its answer and the
/// suggested follow-up questions.
pub const FOLLOW_UP_SEPARATOR: &str = "---FOLLOW_UP_QUESTIONS---";

/// Upper bound on how many follow-up questions are kept.
pub const MAX_FOLLOW_UPS: usize = 4;

/// The result of assembling a raw model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledResponse {
    /// The answer text shown in the message bubble.
    pub answer: String,
    /// At most [`MAX_FOLLOW_UPS`] suggested questions, in the order the
    /// model produced them. `None` when the model suggested nothing usable.
    pub follow_ups: Option<Vec<String>>,
}

/// Splits `raw` at the first occurrence of [`FOLLOW_UP_SEPARATOR`].
///
/// Without the separator the text is returned verbatim and no follow-ups
/// are reported. With it, the leading part becomes the trimmed answer and
/// the trailing part is broken into trimmed, non-empty lines capped at
/// [`MAX_FOLLOW_UPS`] entries. A follow-up section consisting only of
/// blank lines is normalized to `None` so downstream rendering has a
/// single "nothing to suggest" shape.
pub fn assemble(raw: &str) -> AssembledResponse {
    let Some((answer_part, questions_part)) = raw.split_once(FOLLOW_UP_SEPARATOR) else {
        return AssembledResponse {
            answer: raw.to_string(),
            follow_ups: None,
        };
    };

    let follow_ups: Vec<String> = questions_part
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(MAX_FOLLOW_UPS)
        .map(str::to_string)
        .collect();

    AssembledResponse {
        answer: answer_part.trim().to_string(),
        follow_ups: if follow_ups.is_empty() {
            None
        } else {
            Some(follow_ups)
        },
    }
}
