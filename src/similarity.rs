// src/similarity.rs

/// Similarity of the shorter string to its best-matching same-length window
/// of the longer one, on a 0-100 scale. Case-insensitive.
///
/// Each window is scored with the indel ratio `2 * LCS / (|a| + |b|)`.
/// Empty input scores 0.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    if short.is_empty() {
        return 0;
    }

    let mut best = 0.0f64;
    for window in long.windows(short.len()) {
        let score = indel_ratio(short, window);
        if score > best {
            best = score;
            if best >= 1.0 {
                break;
            }
        }
    }
    (best * 100.0).round() as u8
}

/// `2 * LCS / (|a| + |b|)` in `[0, 1]`
fn indel_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

/// Longest common subsequence length, single-row dynamic programming.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}
