//! American Soundex, used for `phonetic_similarity` (spec §4.3).

/// Classic four-character Soundex code: first letter, then up to three
/// digits for subsequent consonant groups, zero-padded.
pub fn soundex(input: &str) -> String {
    let letters: Vec<char> = input.chars().filter(|c| c.is_ascii_alphabetic()).collect();
    let Some(&first) = letters.first() else {
        return String::new();
    };

    let mut code = String::new();
    code.push(first.to_ascii_uppercase());

    let mut last_digit = soundex_digit(first);
    for &ch in &letters[1..] {
        let digit = soundex_digit(ch);
        if digit != 0 && digit != last_digit {
            code.push(char::from_digit(digit as u32, 10).unwrap());
        }
        if ch.to_ascii_uppercase() != 'H' && ch.to_ascii_uppercase() != 'W' {
            last_digit = digit;
        }
        if code.len() == 4 {
            break;
        }
    }

    while code.len() < 4 {
        code.push('0');
    }
    code
}

fn soundex_digit(c: char) -> u8 {
    match c.to_ascii_uppercase() {
        'B' | 'F' | 'P' | 'V' => 1,
        'C' | 'G' | 'J' | 'K' | 'Q' | 'S' | 'X' | 'Z' => 2,
        'D' | 'T' => 3,
        'L' => 4,
        'M' | 'N' => 5,
        'R' => 6,
        _ => 0,
    }
}

/// 1.0 if the two strings' Soundex codes match, else 0.0 (spec §4.3
/// `phonetic_similarity`).
pub fn phonetic_similarity(a: &str, b: &str) -> f64 {
    if soundex(a) == soundex(b) {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_soundex_examples() {
        assert_eq!(soundex("Robert"), "R163");
        assert_eq!(soundex("Rupert"), "R163");
        assert_eq!(soundex("Ashcraft"), "A261");
    }

    #[test]
    fn phonetic_similarity_matches_homophone_spellings() {
        assert_eq!(phonetic_similarity("Robert", "Rupert"), 1.0);
        assert_eq!(phonetic_similarity("Robert", "Smith"), 0.0);
    }
}
