//! Password entropy estimation.
//!
//! Entropy is `length * log2(base)`, where `base` is the size of the
//! alphabet implied by the character classes present and `length` discounts
//! runs of repeated characters and keyboard or alphabet sequences.

/// Threshold used by `strongpassword` when no parameter is given.
pub const DEFAULT_MIN_ENTROPY_BITS: f64 = 50.0;

const REPLACE_CHARS: &str = "!@$&*";
const SEPARATOR_CHARS: &str = "_-., ";
const OTHER_SPECIAL_CHARS: &str = "\"#%'()+/:;<=>?[\\]^{|}~";

const SEQUENCES: [&str; 5] = [
    "0123456789",
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "abcdefghijklmnopqrstuvwxyz",
];

/// Estimates the entropy of `password` in bits.
///
/// ```
/// use vibefeeder_validate::password::entropy;
///
/// assert!(entropy("password") < 50.0);
/// assert!(entropy("MyS3cur3P@ssw0rd!2024") > 60.0);
/// ```
#[must_use]
pub fn entropy(password: &str) -> f64 {
    let base = alphabet_size(password);
    if base == 0 {
        return 0.0;
    }
    effective_length(password) as f64 * f64::from(base).log2()
}

/// Returns `true` when `password` reaches `min_bits` of entropy.
#[must_use]
pub fn is_strong(password: &str, min_bits: f64) -> bool {
    entropy(password) >= min_bits
}

fn alphabet_size(password: &str) -> u32 {
    let mut lower = false;
    let mut upper = false;
    let mut digit = false;
    let mut replace = false;
    let mut separator = false;
    let mut other_special = false;
    let mut others: Vec<char> = Vec::new();

    for c in password.chars() {
        match c {
            'a'..='z' => lower = true,
            'A'..='Z' => upper = true,
            '0'..='9' => digit = true,
            c if REPLACE_CHARS.contains(c) => replace = true,
            c if SEPARATOR_CHARS.contains(c) => separator = true,
            c if OTHER_SPECIAL_CHARS.contains(c) => other_special = true,
            c => {
                if !others.contains(&c) {
                    others.push(c);
                }
            }
        }
    }

    let mut base = 0;
    if lower {
        base += 26;
    }
    if upper {
        base += 26;
    }
    if digit {
        base += 10;
    }
    if replace {
        base += 5;
    }
    if separator {
        base += 5;
    }
    if other_special {
        base += 22;
    }
    base + u32::try_from(others.len()).unwrap_or(u32::MAX)
}

fn effective_length(password: &str) -> usize {
    let mut chars = collapse_repeats(password);
    for seq in SEQUENCES {
        let forward: Vec<char> = seq.chars().collect();
        let mut backward = forward.clone();
        backward.reverse();
        chars = drop_sequence_runs(&chars, &forward);
        chars = drop_sequence_runs(&chars, &backward);
    }
    chars.len()
}

/// Keeps at most two consecutive copies of any character.
fn collapse_repeats(password: &str) -> Vec<char> {
    let mut out: Vec<char> = Vec::with_capacity(password.len());
    for c in password.chars() {
        if let [.., a, b] = out.as_slice() {
            if *a == c && *b == c {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Keeps the first two characters of every run that follows `seq` in order.
fn drop_sequence_runs(chars: &[char], seq: &[char]) -> Vec<char> {
    let position = |c: char| seq.iter().position(|&s| s == c);

    let mut out = Vec::with_capacity(chars.len());
    let mut run = 0;
    let mut prev: Option<char> = None;

    for &c in chars {
        run = match (prev.and_then(position), position(c)) {
            (Some(p), Some(i)) if i == p + 1 => run + 1,
            (_, Some(_)) => 1,
            _ => 0,
        };
        prev = Some(c);
        if run <= 2 {
            out.push(c);
        }
    }
    out
}
