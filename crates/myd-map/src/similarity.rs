//! String similarity metrics.
//!
//! Reference implementations of Levenshtein and Jaro-Winkler. All metrics
//! work on Unicode scalar values and return scores in `[0, 1]`; the float
//! operations are ordered so results are reproducible across runs and
//! platforms.

/// Longest common prefix credited by the Winkler adjustment.
const WINKLER_PREFIX_CAP: usize = 4;
/// Winkler prefix scaling factor.
const WINKLER_SCALING: f64 = 0.1;

/// Edit distance (insertions, deletions, substitutions all cost 1).
///
/// Uses a single DP row sized to the shorter input.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, lc) in long.iter().enumerate() {
        // row[j] holds the previous row until overwritten; `diagonal` keeps
        // the previous row's value at j - 1.
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let insertion = row[j + 1] + 1;
            let deletion = row[j] + 1;
            let substitution = diagonal + usize::from(lc != sc);
            diagonal = row[j + 1];
            row[j + 1] = insertion.min(deletion).min(substitution);
        }
    }
    row[short.len()]
}

/// `1 - distance / max_len`; `1.0` for two empty strings, `0.0` when only
/// one side is empty.
pub fn levenshtein_similarity(a: &str, b: &str) -> f64 {
    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 && len_b == 0 {
        return 1.0;
    }
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }
    let max_len = len_a.max(len_b) as f64;
    1.0 - (levenshtein_distance(a, b) as f64 / max_len)
}

/// Jaro similarity with match window `max(len) / 2 - 1` (floored at 0).
pub fn jaro_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    jaro_chars(&a, &b)
}

fn jaro_chars(a: &[char], b: &[char]) -> f64 {
    let (len_a, len_b) = (a.len(), b.len());
    if len_a == 0 && len_b == 0 {
        return 1.0;
    }
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let window = (len_a.max(len_b) / 2).saturating_sub(1);
    let mut a_matched = vec![false; len_a];
    let mut b_matched = vec![false; len_b];
    let mut matches = 0usize;

    for (i, ca) in a.iter().enumerate() {
        let start = i.saturating_sub(window);
        let end = (i + window + 1).min(len_b);
        for j in start..end {
            if b_matched[j] || *ca != b[j] {
                continue;
            }
            a_matched[i] = true;
            b_matched[j] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut k = 0usize;
    for (i, ca) in a.iter().enumerate() {
        if !a_matched[i] {
            continue;
        }
        while !b_matched[k] {
            k += 1;
        }
        if *ca != b[k] {
            transpositions += 1;
        }
        k += 1;
    }

    let m = matches as f64;
    let t = transpositions as f64;
    (m / len_a as f64 + m / len_b as f64 + (m - t / 2.0) / m) / 3.0
}

/// Jaro-Winkler: `jaro + 0.1 * prefix * (1 - jaro)`, prefix capped at 4.
pub fn jaro_winkler_similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let jaro = jaro_chars(&a, &b);
    let prefix = a
        .iter()
        .zip(b.iter())
        .take(WINKLER_PREFIX_CAP)
        .take_while(|(x, y)| x == y)
        .count();
    jaro + WINKLER_SCALING * prefix as f64 * (1.0 - jaro)
}
