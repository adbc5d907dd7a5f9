//! Mood scorer — keyword-driven tone and motivation with a history blend.
//!
//! Four dictionaries (positive, discouraged, high/low motivation) are matched
//! by case-sensitive substring containment. Each entry counts at most once per
//! text. The current message decides the tone when it carries any emotional
//! signal; otherwise the ratio over the history window does.

use std::sync::Arc;

use tracing::debug;

use crate::lexicon::Lexicon;
use crate::pipeline::types::{MoodAssessment, Tone};

/// History positive ratio above which a signal-free message reads as positive.
const HISTORY_POSITIVE_THRESHOLD: f64 = 0.6;

/// History positive ratio below which a signal-free message reads as discouraged.
const HISTORY_DISCOURAGED_THRESHOLD: f64 = 0.4;

/// Scale of the emotional nudge on motivation (bounded to ±0.15).
const EMOTIONAL_ADJUSTMENT_SCALE: f64 = 0.3;

/// Weight of the current message in the final blend; history gets the rest.
const CURRENT_WEIGHT: f64 = 0.7;

/// Ratio used when a text carries no signal for a pair of dictionaries.
const NO_SIGNAL_RATIO: f64 = 0.5;

/// Dictionary hit counts for one text or a sum over several.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignalCounts {
    pub positive: usize,
    pub discouraged: usize,
    pub high_motivation: usize,
    pub low_motivation: usize,
}

impl SignalCounts {
    /// `positive / (positive + discouraged)`, if there is any emotional signal.
    pub fn positive_ratio(&self) -> Option<f64> {
        ratio(self.positive, self.discouraged)
    }

    /// `high / (high + low)`, if there is any motivation signal.
    pub fn motivation_ratio(&self) -> Option<f64> {
        ratio(self.high_motivation, self.low_motivation)
    }

    fn add(&mut self, other: SignalCounts) {
        self.positive += other.positive;
        self.discouraged += other.discouraged;
        self.high_motivation += other.high_motivation;
        self.low_motivation += other.low_motivation;
    }
}

fn ratio(hits: usize, misses: usize) -> Option<f64> {
    let total = hits + misses;
    (total > 0).then(|| hits as f64 / total as f64)
}

/// Produces a [`MoodAssessment`] from a message and prior comments.
pub struct MoodScorer {
    lexicon: Arc<Lexicon>,
}

impl MoodScorer {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Score `message` against the dictionaries, blended with `history`.
    ///
    /// History order does not matter. A blank message short-circuits to
    /// `(neutral, 0.5, [])` without scanning.
    pub fn analyze<S: AsRef<str>>(&self, message: &str, history: &[S]) -> MoodAssessment {
        if message.trim().is_empty() {
            return MoodAssessment::neutral();
        }

        let mut indicators = Vec::new();
        let current = self.count(message, Some(&mut indicators));

        let mut past = SignalCounts::default();
        for entry in history {
            past.add(self.count(entry.as_ref(), None));
        }

        let history_positive = past.positive_ratio().unwrap_or(NO_SIGNAL_RATIO);
        let history_motivation = past.motivation_ratio().unwrap_or(NO_SIGNAL_RATIO);

        let tone = decide_tone(&current, history_positive);
        let motivation = blend_motivation(&current, history_motivation);

        debug!(
            tone = tone.label(),
            motivation,
            history_entries = history.len(),
            history_positive,
            history_motivation,
            ?current,
            "Mood scored"
        );

        MoodAssessment::new(tone, motivation, indicators)
    }

    /// Count dictionary hits in one text, optionally recording indicator tags.
    pub fn count(&self, text: &str, mut indicators: Option<&mut Vec<String>>) -> SignalCounts {
        let lexicon = &self.lexicon;
        SignalCounts {
            positive: count_matches(text, &lexicon.positive, "positive", indicators.as_deref_mut()),
            discouraged: count_matches(
                text,
                &lexicon.discouraged,
                "discouraged",
                indicators.as_deref_mut(),
            ),
            high_motivation: count_matches(
                text,
                &lexicon.high_motivation,
                "high_motivation",
                indicators.as_deref_mut(),
            ),
            low_motivation: count_matches(
                text,
                &lexicon.low_motivation,
                "low_motivation",
                indicators.as_deref_mut(),
            ),
        }
    }
}

fn count_matches(
    text: &str,
    dictionary: &[String],
    category: &str,
    mut indicators: Option<&mut Vec<String>>,
) -> usize {
    let mut count = 0;
    for keyword in dictionary {
        if text.contains(keyword.as_str()) {
            count += 1;
            if let Some(tags) = indicators.as_deref_mut() {
                tags.push(format!("{category}:{keyword}"));
            }
        }
    }
    count
}

/// Tone from the current counts, falling back to history when the message is silent.
pub fn decide_tone(current: &SignalCounts, history_positive_ratio: f64) -> Tone {
    let (p, d) = (current.positive, current.discouraged);
    if p > d && p > 0 {
        return Tone::Positive;
    }
    if d > p && d > 0 {
        return Tone::Discouraged;
    }
    if p == 0 && d == 0 {
        if history_positive_ratio > HISTORY_POSITIVE_THRESHOLD {
            return Tone::Positive;
        }
        if history_positive_ratio < HISTORY_DISCOURAGED_THRESHOLD {
            return Tone::Discouraged;
        }
    }
    Tone::Neutral
}

/// Motivation in `[0, 1]`: 70% current message (with emotional nudge), 30% history.
pub fn blend_motivation(current: &SignalCounts, history_motivation_ratio: f64) -> f64 {
    let base = current.motivation_ratio().unwrap_or(NO_SIGNAL_RATIO);
    let adjustment = current
        .positive_ratio()
        .map(|ratio| (ratio - 0.5) * EMOTIONAL_ADJUSTMENT_SCALE)
        .unwrap_or(0.0);
    let blended =
        CURRENT_WEIGHT * (base + adjustment) + (1.0 - CURRENT_WEIGHT) * history_motivation_ratio;
    blended.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn scorer() -> MoodScorer {
        MoodScorer::new(Arc::new(Lexicon::embedded().unwrap()))
    }

    fn no_history() -> Vec<String> {
        Vec::new()
    }

    #[test]
    fn empty_message_is_neutral_half() {
        let mood = scorer().analyze("", &no_history());
        assert_eq!(mood.tone, Tone::Neutral);
        assert_eq!(mood.motivation(), 0.5);
        assert!(mood.indicators.is_empty());
    }

    #[test]
    fn blank_message_ignores_history() {
        let history = vec!["嬉しい", "最高", "楽しい"];
        let mood = scorer().analyze("   ", &history);
        assert_eq!(mood, MoodAssessment::neutral());
    }

    #[test]
    fn positive_message() {
        let mood = scorer().analyze("頑張ります！やる気満々です", &no_history());
        assert_eq!(mood.tone, Tone::Positive);
        // base 1.0 + 0.15 nudge, blended with neutral history
        assert!((mood.motivation() - (0.7 * 1.15 + 0.3 * 0.5)).abs() < EPS);
        assert!(mood.indicators.contains(&"positive:頑張".to_string()));
        assert!(mood.indicators.contains(&"high_motivation:やる気".to_string()));
    }

    #[test]
    fn discouraged_message() {
        let mood = scorer().analyze("疲れて辛い、もう無理", &no_history());
        assert_eq!(mood.tone, Tone::Discouraged);
        assert!((mood.motivation() - (0.7 * -0.15 + 0.3 * 0.5)).abs() < EPS);
        assert!(mood.motivation() < 0.5);
        assert!(mood.indicators.contains(&"low_motivation:無理".to_string()));
    }

    #[test]
    fn indicators_follow_dictionary_order() {
        let mood = scorer().analyze("楽しい！嬉しい！", &no_history());
        assert_eq!(
            mood.indicators,
            vec!["positive:嬉しい".to_string(), "positive:楽しい".to_string()]
        );
    }

    #[test]
    fn repeated_keyword_counts_once() {
        let s = scorer();
        let once = s.count("嬉しい", None);
        let thrice = s.count("嬉しい嬉しい嬉しい", None);
        assert_eq!(once, thrice);
        assert_eq!(once.positive, 1);
    }

    #[test]
    fn matching_is_case_sensitive_substring() {
        let s = scorer();
        assert_eq!(s.count("とても嬉しい日", None).positive, 1);
        assert_eq!(s.count("うれしい", None).positive, 0);
    }

    #[test]
    fn tie_is_neutral() {
        let mood = scorer().analyze("嬉しいけど不安", &vec!["最高", "幸せ"]);
        assert_eq!(mood.tone, Tone::Neutral);
    }

    #[test]
    fn silent_message_uses_positive_history() {
        let history = vec!["嬉しい！", "楽しい一日", "最高"];
        let mood = scorer().analyze("今日は体重を測りました", &history);
        assert_eq!(mood.tone, Tone::Positive);
    }

    #[test]
    fn silent_message_uses_discouraged_history() {
        let history = vec!["辛い", "悲しい", "不安"];
        let mood = scorer().analyze("今日は体重を測りました", &history);
        assert_eq!(mood.tone, Tone::Discouraged);
    }

    #[test]
    fn silent_message_with_balanced_or_silent_history_is_neutral() {
        let s = scorer();
        assert_eq!(s.analyze("散歩した", &vec!["嬉しい", "不安"]).tone, Tone::Neutral);
        assert_eq!(s.analyze("散歩した", &vec!["散歩した"]).tone, Tone::Neutral);
        assert_eq!(s.analyze("散歩した", &no_history()).tone, Tone::Neutral);
    }

    #[test]
    fn history_order_does_not_matter() {
        let s = scorer();
        let forward = vec!["頑張る", "疲れた", "嬉しい", "面倒"];
        let mut backward = forward.clone();
        backward.reverse();
        assert_eq!(s.analyze("散歩した", &forward), s.analyze("散歩した", &backward));
    }

    #[test]
    fn history_shifts_motivation() {
        let s = scorer();
        let keen = s.analyze("散歩した", &vec!["目標に挑戦", "努力を継続"]);
        let weary = s.analyze("散歩した", &vec!["面倒", "だるい"]);
        assert!((keen.motivation() - (0.7 * 0.5 + 0.3 * 1.0)).abs() < EPS);
        assert!((weary.motivation() - (0.7 * 0.5 + 0.3 * 0.0)).abs() < EPS);
    }

    #[test]
    fn high_and_low_motivation_extremes() {
        let s = scorer();
        assert!(s.analyze("目標に向けて挑戦を継続する", &no_history()).motivation() > 0.7);
        assert!(s.analyze("面倒でだるい", &no_history()).motivation() < 0.3);
    }

    #[test]
    fn adding_positive_keyword_never_lowers_motivation() {
        let s = scorer();
        let lexicon = Lexicon::embedded().unwrap();
        let histories: Vec<Vec<&str>> = vec![vec![], vec!["面倒", "挑戦"], vec!["嬉しい"]];
        let bases = ["今日は散歩した", "続けるのは面倒", "目標は遠い"];

        for history in &histories {
            for base in bases {
                let before = s.analyze(base, history);
                for keyword in &lexicon.positive {
                    let with_keyword = format!("{base}{keyword}");
                    if s.count(&with_keyword, None).discouraged > 0 {
                        continue;
                    }
                    let after = s.analyze(&with_keyword, history);
                    assert!(
                        after.motivation() + EPS >= before.motivation(),
                        "{base} + {keyword}: {} < {}",
                        after.motivation(),
                        before.motivation()
                    );
                }
            }
        }
    }

    #[test]
    fn tone_decision_table() {
        let counts = |positive, discouraged| SignalCounts {
            positive,
            discouraged,
            ..Default::default()
        };
        assert_eq!(decide_tone(&counts(2, 1), 0.0), Tone::Positive);
        assert_eq!(decide_tone(&counts(1, 2), 1.0), Tone::Discouraged);
        assert_eq!(decide_tone(&counts(1, 1), 1.0), Tone::Neutral);
        assert_eq!(decide_tone(&counts(0, 0), 0.61), Tone::Positive);
        assert_eq!(decide_tone(&counts(0, 0), 0.6), Tone::Neutral);
        assert_eq!(decide_tone(&counts(0, 0), 0.4), Tone::Neutral);
        assert_eq!(decide_tone(&counts(0, 0), 0.39), Tone::Discouraged);
    }

    #[test]
    fn motivation_is_clamped() {
        let keen = SignalCounts {
            positive: 3,
            high_motivation: 3,
            ..Default::default()
        };
        let weary = SignalCounts {
            discouraged: 3,
            low_motivation: 3,
            ..Default::default()
        };
        assert_eq!(blend_motivation(&keen, 1.0), 1.0);
        assert_eq!(blend_motivation(&weary, 0.0), 0.0);
    }
}
