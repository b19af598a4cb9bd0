//! Lexicon-based sentiment polarity.

use std::collections::HashMap;

/// Scalar sentiment of a text, in [-1, 1].
pub trait PolarityAnalyzer: Send + Sync {
    fn polarity(&self, text: &str) -> f64;
}

/// Word polarities, tuned for hospitality reviews.
const LEXICON: &[(&str, f64)] = &[
    ("amazing", 0.6),
    ("awesome", 1.0),
    ("bad", -0.7),
    ("beautiful", 0.85),
    ("best", 1.0),
    ("bland", -0.3),
    ("broken", -0.4),
    ("clean", 0.37),
    ("cold", -0.6),
    ("comfortable", 0.4),
    ("convenient", 0.3),
    ("cozy", 0.5),
    ("delicious", 1.0),
    ("dirty", -0.6),
    ("disappointing", -0.6),
    ("dusty", -0.3),
    ("easy", 0.43),
    ("excellent", 1.0),
    ("expensive", -0.5),
    ("fantastic", 0.4),
    ("fast", 0.2),
    ("filthy", -0.8),
    ("fine", 0.42),
    ("fresh", 0.3),
    ("friendly", 0.38),
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("helpful", 0.5),
    ("horrible", -1.0),
    ("hot", 0.25),
    ("lovely", 0.5),
    ("nice", 0.6),
    ("noisy", -0.4),
    ("perfect", 1.0),
    ("pleasant", 0.73),
    ("polite", 0.3),
    ("poor", -0.4),
    ("quiet", 0.2),
    ("recommend", 0.5),
    ("rude", -0.3),
    ("slow", -0.3),
    ("small", -0.25),
    ("smelly", -0.5),
    ("spacious", 0.4),
    ("stale", -0.5),
    ("terrible", -1.0),
    ("tasty", 0.6),
    ("uncomfortable", -0.5),
    ("unclean", -0.5),
    ("unfriendly", -0.4),
    ("unhelpful", -0.5),
    ("wonderful", 1.0),
    ("worst", -1.0),
];

/// Multipliers applied to the word that follows.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("absolutely", 1.5),
    ("extremely", 1.5),
    ("incredibly", 1.4),
    ("quite", 1.1),
    ("really", 1.3),
    ("slightly", 0.5),
    ("so", 1.3),
    ("somewhat", 0.6),
    ("super", 1.4),
    ("too", 1.2),
    ("very", 1.3),
];

const NEGATIONS: &[&str] = &["not", "no", "never", "nothing", "hardly", "without"];

/// How many preceding tokens a negation reaches.
const NEGATION_WINDOW: usize = 3;

/// Flips and damps a negated word's polarity.
const NEGATION_FACTOR: f64 = -0.5;

/// Rule-based analyzer: mean polarity of the lexicon words found, each
/// scaled by a preceding intensifier and flipped by a nearby negation.
/// Texts with no lexicon words are neutral.
#[derive(Debug, Clone)]
pub struct LexiconAnalyzer {
    lexicon: HashMap<&'static str, f64>,
    intensifiers: HashMap<&'static str, f64>,
}

impl Default for LexiconAnalyzer {
    fn default() -> Self {
        Self {
            lexicon: LEXICON.iter().copied().collect(),
            intensifiers: INTENSIFIERS.iter().copied().collect(),
        }
    }
}

impl LexiconAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    fn is_negation(token: &str) -> bool {
        NEGATIONS.contains(&token) || token.ends_with("n't")
    }
}

impl PolarityAnalyzer for LexiconAnalyzer {
    fn polarity(&self, text: &str) -> f64 {
        let tokens: Vec<String> = text
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
            .collect();

        let mut scores = Vec::new();
        for (i, token) in tokens.iter().enumerate() {
            let Some(&base) = self.lexicon.get(token.as_str()) else {
                continue;
            };

            let mut score = base;
            if let Some(prev) = i.checked_sub(1).map(|p| tokens[p].as_str()) {
                if let Some(&factor) = self.intensifiers.get(prev) {
                    score *= factor;
                }
            }

            let window = &tokens[i.saturating_sub(NEGATION_WINDOW)..i];
            if window.iter().any(|t| Self::is_negation(t)) {
                score *= NEGATION_FACTOR;
            }

            scores.push(score.clamp(-1.0, 1.0));
        }

        if scores.is_empty() {
            return 0.0;
        }
        (scores.iter().sum::<f64>() / scores.len() as f64).clamp(-1.0, 1.0)
    }
}
