//! Classification extraction: turns a grader reply into per-answer verdicts.
//!
//! Primary strategy: `Answer <n>: <label>` lines (case-insensitive), which carry an
//! explicit answer index. Fallback (only when no such line exists): split on `QQQ`,
//! then on line breaks, and read verdicts positionally.
//!
//! Verdicts are aligned to answers by index, never by iteration order alone:
//! indexed verdicts land in their numbered slot, positional ones fill slots in order.
//! Slots nobody claimed become `Incorrect`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm_client::prompts::ITEM_SEPARATOR;

static ANSWER_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)\banswer\s*#?\s*(\d+)\s*:\s*(.+)$").unwrap());

/// "not correct", "not completely correct", "not fully correct", ...
static NEGATED_CORRECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bnot\s+(?:\w+\s+)?correct").unwrap());

/// Discrete correctness verdict for one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    CompletelyCorrect,
    PartiallyCorrect,
    Incorrect,
}

impl Classification {
    /// Highest point value any single answer can earn.
    pub const MAX_POINTS: u32 = 10;

    pub fn points(self) -> u32 {
        match self {
            Classification::CompletelyCorrect => 10,
            Classification::PartiallyCorrect => 5,
            Classification::Incorrect => 0,
        }
    }

    /// Maps free text to a verdict by substring, most specific label first.
    ///
    /// negated "correct" > "completely correct" > "partially correct" >
    /// "incorrect"/"wrong" > "partial" > "correct".
    /// The bare "correct" check runs last so that "partially correct" and
    /// "incorrect" can never be read as a full mark.
    pub fn from_label(text: &str) -> Option<Self> {
        let label = text.to_lowercase();
        if NEGATED_CORRECT.is_match(&label) {
            Some(Classification::Incorrect)
        } else if label.contains("completely correct") {
            Some(Classification::CompletelyCorrect)
        } else if label.contains("partially correct") {
            Some(Classification::PartiallyCorrect)
        } else if label.contains("incorrect") || label.contains("wrong") {
            Some(Classification::Incorrect)
        } else if label.contains("partial") {
            Some(Classification::PartiallyCorrect)
        } else if label.contains("correct") {
            Some(Classification::CompletelyCorrect)
        } else {
            None
        }
    }
}

/// One verdict read from model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    /// Zero-based answer index when the model numbered it; `None` for positional verdicts.
    pub index: Option<usize>,
    pub classification: Classification,
}

/// Reads every verdict the model produced, in reply order.
/// Unclassifiable labels or fragments are dropped, never defaulted.
pub fn extract_verdicts(text: &str) -> Vec<Verdict> {
    let labelled: Vec<(usize, &str)> = ANSWER_LABEL
        .captures_iter(text)
        .filter_map(|c| {
            let number = c.get(1)?.as_str().parse::<usize>().ok()?;
            Some((number, c.get(2)?.as_str()))
        })
        .collect();

    if !labelled.is_empty() {
        return labelled
            .into_iter()
            .filter_map(|(number, label)| {
                // Answers are numbered from 1; a zero index matches no slot.
                let Some(index) = number.checked_sub(1) else {
                    warn!("Dropping verdict for out-of-range answer 0: {label:?}");
                    return None;
                };
                match Classification::from_label(label) {
                    Some(classification) => Some(Verdict {
                        index: Some(index),
                        classification,
                    }),
                    None => {
                        debug!("Dropping unclassifiable label for answer {number}: {label:?}");
                        None
                    }
                }
            })
            .collect();
    }

    let mut fragments: Vec<&str> = text.split(ITEM_SEPARATOR).collect();
    if fragments.len() == 1 {
        fragments = text.lines().collect();
    }

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .filter_map(Classification::from_label)
        .map(|classification| Verdict {
            index: None,
            classification,
        })
        .collect()
}

/// Returns exactly `expected_count` classifications, one per answer in order.
///
/// Indexed verdicts fill their own slot (first one wins; out-of-range indices are
/// ignored). Positional verdicts fill the remaining slots in order; extras are
/// truncated. Unfilled slots are `Incorrect`.
pub fn align_verdicts(verdicts: &[Verdict], expected_count: usize) -> Vec<Classification> {
    let mut slots: Vec<Option<Classification>> = vec![None; expected_count];

    for verdict in verdicts.iter().filter(|v| v.index.is_some()) {
        match verdict.index {
            Some(i) if i < expected_count => {
                if slots[i].is_none() {
                    slots[i] = Some(verdict.classification);
                } else {
                    debug!("Ignoring duplicate verdict for answer {}", i + 1);
                }
            }
            Some(i) => warn!(
                "Verdict for answer {} is out of range ({} answers)",
                i + 1,
                expected_count
            ),
            None => {}
        }
    }

    let mut positional = verdicts
        .iter()
        .filter(|v| v.index.is_none())
        .map(|v| v.classification);
    for slot in slots.iter_mut().filter(|s| s.is_none()) {
        match positional.next() {
            Some(classification) => *slot = Some(classification),
            None => break,
        }
    }

    let unfilled = slots.iter().filter(|s| s.is_none()).count();
    if verdicts.len() != expected_count || unfilled > 0 {
        warn!(
            "Parsed {} verdicts for {} answers; {} padded as incorrect",
            verdicts.len(),
            expected_count,
            unfilled
        );
    }

    slots
        .into_iter()
        .map(|s| s.unwrap_or(Classification::Incorrect))
        .collect()
}

/// Extracts and aligns classifications for `expected_count` answers.
pub fn extract_classifications(text: &str, expected_count: usize) -> Vec<Classification> {
    align_verdicts(&extract_verdicts(text), expected_count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use Classification::*;

    #[test]
    fn test_points_per_classification() {
        assert_eq!(CompletelyCorrect.points(), 10);
        assert_eq!(PartiallyCorrect.points(), 5);
        assert_eq!(Incorrect.points(), 0);
        assert_eq!(Classification::MAX_POINTS, CompletelyCorrect.points());
    }

    #[test]
    fn test_specific_label_wins_over_generic_substring() {
        assert_eq!(
            Classification::from_label("Partially correct - the answer is correct in part"),
            Some(PartiallyCorrect)
        );
        assert_eq!(Classification::from_label("INCORRECT"), Some(Incorrect));
        assert_eq!(Classification::from_label("this is wrong"), Some(Incorrect));
        assert_eq!(Classification::from_label("Correct."), Some(CompletelyCorrect));
        assert_eq!(Classification::from_label("no verdict here"), None);
    }

    #[test]
    fn test_negated_correct_is_incorrect() {
        assert_eq!(Classification::from_label("Not correct"), Some(Incorrect));
        assert_eq!(Classification::from_label("not completely correct"), Some(Incorrect));
        assert_eq!(
            extract_classifications("Answer 1: Not correct\nAnswer 2: Incorrect", 2),
            vec![Incorrect, Incorrect]
        );
    }

    #[test]
    fn test_answer_zero_is_dropped_not_positional() {
        let verdicts = extract_verdicts("Answer 0: Completely correct\nAnswer 1: Incorrect\nAnswer 2: Incorrect");
        assert_eq!(verdicts.len(), 2);
        assert_eq!(
            extract_classifications(
                "Answer 0: Completely correct\nAnswer 1: Incorrect\nAnswer 2: Incorrect",
                3
            ),
            vec![Incorrect, Incorrect, Incorrect]
        );
    }

    #[test]
    fn test_answer_pattern_is_case_insensitive() {
        let text = "answer 1: Completely correct\nANSWER 2: partially correct\nAnswer 3: Incorrect";
        assert_eq!(
            extract_classifications(text, 3),
            vec![CompletelyCorrect, PartiallyCorrect, Incorrect]
        );
    }

    #[test]
    fn test_numbered_verdicts_follow_their_index_not_reply_order() {
        let text = "Answer 3: Incorrect\nAnswer 1: Completely correct\nAnswer 2: Partially correct";
        assert_eq!(
            extract_classifications(text, 3),
            vec![CompletelyCorrect, PartiallyCorrect, Incorrect]
        );
    }

    #[test]
    fn test_missing_numbered_verdict_is_padded_incorrect() {
        let text = "Answer 1: Completely correct\nAnswer 3: Completely correct";
        assert_eq!(
            extract_classifications(text, 3),
            vec![CompletelyCorrect, Incorrect, CompletelyCorrect]
        );
    }

    #[test]
    fn test_out_of_range_and_duplicate_indices_are_ignored() {
        let text = "Answer 1: Completely correct\nAnswer 1: Incorrect\nAnswer 9: Completely correct";
        assert_eq!(extract_classifications(text, 2), vec![CompletelyCorrect, Incorrect]);
    }

    #[test]
    fn test_fallback_splits_on_separator() {
        let text = "Completely correct QQQ Partially correct QQQ Incorrect";
        let verdicts = extract_verdicts(text);
        assert!(verdicts.iter().all(|v| v.index.is_none()));
        assert_eq!(
            extract_classifications(text, 3),
            vec![CompletelyCorrect, PartiallyCorrect, Incorrect]
        );
    }

    #[test]
    fn test_fallback_splits_on_lines_when_no_separator() {
        let text = "Completely correct\n\nPartially correct\nWrong";
        assert_eq!(
            extract_classifications(text, 3),
            vec![CompletelyCorrect, PartiallyCorrect, Incorrect]
        );
    }

    #[test]
    fn test_unclassifiable_fragments_are_dropped_not_defaulted() {
        let text = "Here are my verdicts QQQ Completely correct QQQ ??? QQQ Completely correct";
        let verdicts = extract_verdicts(text);
        assert_eq!(verdicts.len(), 2);
    }

    #[test]
    fn test_extra_positional_verdicts_are_truncated() {
        let text = "Correct QQQ Correct QQQ Correct";
        assert_eq!(extract_classifications(text, 2), vec![CompletelyCorrect; 2]);
    }

    #[test]
    fn test_empty_reply_pads_every_answer_incorrect() {
        assert_eq!(extract_classifications("", 2), vec![Incorrect, Incorrect]);
        assert!(extract_classifications("Completely correct", 0).is_empty());
    }
}
