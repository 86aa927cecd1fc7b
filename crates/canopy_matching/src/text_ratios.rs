//! Fuzzy text ratios built on `strsim::levenshtein`, combined per spec §4.3
//! `text_similarity` (weighted average of plain/partial/token-sort/token-set).

/// Levenshtein similarity in [0,1]; 1.0 for two empty strings.
pub fn plain_ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (strsim::levenshtein(a, b) as f64 / max_len as f64)
}

/// Best plain-ratio alignment of the shorter string against every
/// same-length window of the longer one (fuzzywuzzy's "partial ratio").
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (shorter, longer) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return if longer.is_empty() { 1.0 } else { 0.0 };
    }

    let longer_chars: Vec<char> = longer.chars().collect();
    let shorter_len = shorter.chars().count();
    if longer_chars.len() <= shorter_len {
        return plain_ratio(shorter, longer);
    }

    let mut best = 0.0_f64;
    for start in 0..=(longer_chars.len() - shorter_len) {
        let window: String = longer_chars[start..start + shorter_len].iter().collect();
        best = best.max(plain_ratio(shorter, &window));
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

/// Plain ratio of the two strings' whitespace-split tokens, each sorted
/// alphabetically (fuzzywuzzy's "token sort ratio").
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    plain_ratio(&sorted_tokens(a), &sorted_tokens(b))
}

/// Plain ratio computed on the shared-token intersection plus each side's
/// leftover tokens (fuzzywuzzy's "token set ratio"); handles cases where
/// one name is a strict superset of the other's tokens.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    use std::collections::BTreeSet;

    let tokens_a: BTreeSet<&str> = a.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b.split_whitespace().collect();

    let intersection: Vec<&str> = tokens_a.intersection(&tokens_b).copied().collect();
    let only_a: Vec<&str> = tokens_a.difference(&tokens_b).copied().collect();
    let only_b: Vec<&str> = tokens_b.difference(&tokens_a).copied().collect();

    let sorted_join = |mut v: Vec<&str>| {
        v.sort_unstable();
        v.join(" ")
    };

    let intersection_str = sorted_join(intersection.clone());
    let combined_a = if intersection.is_empty() {
        sorted_join(only_a)
    } else {
        format!("{intersection_str} {}", sorted_join(only_a)).trim().to_string()
    };
    let combined_b = if intersection.is_empty() {
        sorted_join(only_b)
    } else {
        format!("{intersection_str} {}", sorted_join(only_b)).trim().to_string()
    };

    plain_ratio(&intersection_str, &combined_a)
        .max(plain_ratio(&intersection_str, &combined_b))
        .max(plain_ratio(&combined_a, &combined_b))
}

/// spec §4.3: weighted average of the four ratios above, weights
/// 0.3/0.2/0.3/0.2.
pub fn text_similarity(a: &str, b: &str) -> f64 {
    let a_fold = a.to_ascii_lowercase();
    let b_fold = b.to_ascii_lowercase();
    0.3 * plain_ratio(&a_fold, &b_fold)
        + 0.2 * partial_ratio(&a_fold, &b_fold)
        + 0.3 * token_sort_ratio(&a_fold, &b_fold)
        + 0.2 * token_set_ratio(&a_fold, &b_fold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(plain_ratio("blue dream", "blue dream"), 1.0);
        assert_eq!(text_similarity("Blue Dream", "blue dream"), 1.0);
    }

    #[test]
    fn token_sort_ignores_word_order() {
        assert_eq!(token_sort_ratio("dream blue", "blue dream"), 1.0);
    }

    #[test]
    fn token_set_handles_superset_names() {
        let ratio = token_set_ratio("blue dream 3.5g", "blue dream");
        assert!(ratio > 0.8, "expected high overlap ratio, got {ratio}");
    }

    #[test]
    fn partial_ratio_finds_best_substring_alignment() {
        let ratio = partial_ratio("dream", "blue dream eighth");
        assert_eq!(ratio, 1.0);
    }
}
