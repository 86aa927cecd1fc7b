//! Hand-rolled TF-IDF over 1- and 2-grams, used for `semantic_similarity`
//! (spec §4.3). The "corpus" for IDF purposes is just the pair being
//! compared — there is no larger document set to learn from at match time,
//! so IDF here measures how much a gram is shared between the two names
//! rather than how rare it is across a corpus.

use std::collections::{BTreeMap, BTreeSet};

fn tokenize(text: &str) -> Vec<String> {
    text.to_ascii_lowercase().split_whitespace().map(str::to_string).collect()
}

fn ngrams(tokens: &[String], n: usize) -> Vec<String> {
    if tokens.len() < n {
        return Vec::new();
    }
    (0..=tokens.len() - n).map(|i| tokens[i..i + n].join(" ")).collect()
}

fn grams(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let mut out = ngrams(&tokens, 1);
    out.extend(ngrams(&tokens, 2));
    out
}

fn term_frequencies(grams: &[String]) -> BTreeMap<&str, f64> {
    let mut counts: BTreeMap<&str, f64> = BTreeMap::new();
    for gram in grams {
        *counts.entry(gram.as_str()).or_insert(0.0) += 1.0;
    }
    let total: f64 = counts.values().sum();
    if total > 0.0 {
        for value in counts.values_mut() {
            *value /= total;
        }
    }
    counts
}

/// Cosine similarity of the two names' TF-IDF vectors over their 1- and
/// 2-gram vocabulary (spec §4.3 `semantic_similarity`).
pub fn semantic_similarity(a: &str, b: &str) -> f64 {
    let grams_a = grams(a);
    let grams_b = grams(b);
    if grams_a.is_empty() || grams_b.is_empty() {
        return 0.5;
    }

    let tf_a = term_frequencies(&grams_a);
    let tf_b = term_frequencies(&grams_b);

    let vocabulary: BTreeSet<&str> = tf_a.keys().chain(tf_b.keys()).copied().collect();

    // Inverse document frequency over the two-document "corpus": a gram
    // shared by both names carries less discriminative weight than one
    // unique to a single name.
    let idf = |gram: &str| -> f64 {
        let doc_count = [tf_a.contains_key(gram), tf_b.contains_key(gram)].iter().filter(|x| **x).count();
        1.0 + ((2.0 / doc_count as f64).ln())
    };

    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for gram in vocabulary {
        let weight = idf(gram);
        let wa = tf_a.get(gram).copied().unwrap_or(0.0) * weight;
        let wb = tf_b.get(gram).copied().unwrap_or(0.0) * weight;
        dot += wa * wb;
        norm_a += wa * wa;
        norm_b += wb * wb;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_score_one() {
        assert!((semantic_similarity("Blue Dream 3.5g", "Blue Dream 3.5g") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_names_score_zero() {
        assert_eq!(semantic_similarity("Blue Dream", "Sour Diesel"), 0.0);
    }

    #[test]
    fn partial_overlap_scores_between_bounds() {
        let score = semantic_similarity("Blue Dream Eighth", "Blue Dream Pre-Roll");
        assert!(score > 0.0 && score < 1.0, "got {score}");
    }

    #[test]
    fn empty_input_falls_back_to_midpoint() {
        assert_eq!(semantic_similarity("", "Blue Dream"), 0.5);
    }
}
