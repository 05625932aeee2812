//! Fuzzy string scoring
//!
//! A weighted similarity score in the 0-100 range, built on normalized
//! Levenshtein similarity. Alongside the plain ratio it considers
//! best-window (partial) matches when the lengths differ a lot, and
//! token-order-insensitive comparisons, then keeps the best of them.

use strsim::normalized_levenshtein;

/// Scale applied to token based ratios
const UNBASE_SCALE: f64 = 0.95;
/// Scale applied to partial ratios
const PARTIAL_SCALE: f64 = 0.90;
/// Scale applied to partial ratios when one string dwarfs the other
const LONG_PARTIAL_SCALE: f64 = 0.60;

/// A scored candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// Position of the candidate in the input
    pub index: usize,
    /// The candidate text
    pub choice: String,
    /// Score in 0..=100
    pub score: u8,
}

/// Lowercase, replace anything that is not alphanumeric with a space, and
/// collapse whitespace
pub fn normalize(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_lowercase().next().unwrap_or(c)
            } else {
                ' '
            }
        })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    normalized_levenshtein(a, b) * 100.0
}

fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long): (Vec<char>, Vec<char>) = if a.chars().count() <= b.chars().count() {
        (a.chars().collect(), b.chars().collect())
    } else {
        (b.chars().collect(), a.chars().collect())
    };

    if short.is_empty() {
        return 0.0;
    }
    if short.len() == long.len() {
        return ratio(a, b);
    }

    let short: String = short.iter().collect();
    let mut best: f64 = 0.0;
    for start in 0..=(long.len() - short.chars().count()) {
        let window: String = long[start..start + short.chars().count()].iter().collect();
        let score = ratio(&short, &window);
        if score > best {
            best = score;
            if best >= 100.0 {
                break;
            }
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn token_set(a: &str, b: &str, scorer: fn(&str, &str) -> f64) -> f64 {
    let mut left: Vec<&str> = a.split_whitespace().collect();
    let mut right: Vec<&str> = b.split_whitespace().collect();
    left.sort_unstable();
    left.dedup();
    right.sort_unstable();
    right.dedup();

    let intersection: Vec<&str> = left.iter().filter(|t| right.contains(t)).copied().collect();
    let only_left: Vec<&str> = left.iter().filter(|t| !right.contains(t)).copied().collect();
    let only_right: Vec<&str> = right.iter().filter(|t| !left.contains(t)).copied().collect();

    let sect = intersection.join(" ");
    let combined_left = format!("{} {}", sect, only_left.join(" ")).trim().to_string();
    let combined_right = format!("{} {}", sect, only_right.join(" ")).trim().to_string();

    [
        scorer(&sect, &combined_left),
        scorer(&sect, &combined_right),
        scorer(&combined_left, &combined_right),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

/// Token-order-insensitive ratio, 0..=100
pub fn token_sort_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    ratio(&sorted_tokens(&a), &sorted_tokens(&b)).round() as u8
}

/// Weighted similarity score, 0..=100
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let base = ratio(&a, &b);
    let (len_a, len_b) = (a.chars().count() as f64, b.chars().count() as f64);
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let best = if len_ratio < 1.5 {
        let sort = ratio(&sorted_tokens(&a), &sorted_tokens(&b)) * UNBASE_SCALE;
        let set = token_set(&a, &b, ratio) * UNBASE_SCALE;
        base.max(sort).max(set)
    } else {
        let scale = if len_ratio > 8.0 {
            LONG_PARTIAL_SCALE
        } else {
            PARTIAL_SCALE
        };
        let partial = partial_ratio(&a, &b) * scale;
        let sort = partial_ratio(&sorted_tokens(&a), &sorted_tokens(&b)) * UNBASE_SCALE * scale;
        let set = token_set(&a, &b, partial_ratio) * UNBASE_SCALE * scale;
        base.max(partial).max(sort).max(set)
    };

    best.round().min(100.0) as u8
}

/// Return the best scoring choice at or above `cutoff`, scored with
/// [`weighted_ratio`]. Ties keep the earliest choice.
pub fn extract_one<'a, I>(query: &str, choices: I, cutoff: u8) -> Option<Match>
where
    I: IntoIterator<Item = &'a str>,
{
    extract_one_with(query, choices, cutoff, weighted_ratio)
}

/// Like [`extract_one`] with a caller-supplied scorer
pub fn extract_one_with<'a, I>(
    query: &str,
    choices: I,
    cutoff: u8,
    scorer: fn(&str, &str) -> u8,
) -> Option<Match>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<Match> = None;
    for (index, choice) in choices.into_iter().enumerate() {
        let score = scorer(query, choice);
        if score < cutoff {
            continue;
        }
        if best.as_ref().is_none_or(|b| score > b.score) {
            best = Some(Match {
                index,
                choice: choice.to_string(),
                score,
            });
        }
    }
    best
}
