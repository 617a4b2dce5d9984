//! Edit distance between byte sequences.

/// Levenshtein distance: the minimum number of single-byte insertions,
/// deletions or substitutions turning `a` into `b`.
pub fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    // Keep the row as short as the shorter input.
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let mut previous: Vec<usize> = (0..=short.len()).collect();
    let mut current = vec![0; short.len() + 1];

    for (i, &lc) in long.iter().enumerate() {
        current[0] = i + 1;
        for (j, &sc) in short.iter().enumerate() {
            let substitute = previous[j] + usize::from(sc != lc);
            let insert = current[j] + 1;
            let delete = previous[j + 1] + 1;
            current[j + 1] = substitute.min(insert).min(delete);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[short.len()]
}

/// [`levenshtein`] when it is at most `limit`, otherwise `None`.
///
/// Only the diagonal band of width `2 * limit + 1` is computed, so the cost
/// is `O(max(len) * limit)` and a length difference above `limit` returns
/// immediately.
pub fn levenshtein_within(a: &[u8], b: &[u8], limit: usize) -> Option<usize> {
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if long.len() - short.len() > limit {
        return None;
    }

    let n = short.len();
    // Anything above `limit` is saturated here.
    let cap = limit.saturating_add(1);
    let mut previous: Vec<usize> = (0..=n).map(|j| j.min(cap)).collect();
    let mut current = vec![cap; n + 1];

    for (i, &lc) in long.iter().enumerate() {
        let row = i + 1;
        let lo = row.saturating_sub(limit).max(1);
        let hi = row.saturating_add(limit).min(n);

        current[0] = row.min(cap);
        if lo > 1 {
            current[lo - 1] = cap;
        }
        let mut row_min = if lo == 1 { current[0] } else { cap };

        for j in lo..=hi {
            let substitute = previous[j - 1] + usize::from(short[j - 1] != lc);
            let insert = current[j - 1] + 1;
            let delete = previous[j] + 1;
            current[j] = substitute.min(insert).min(delete).min(cap);
            row_min = row_min.min(current[j]);
        }
        if hi < n {
            current[hi + 1] = cap;
        }

        if row_min >= cap {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[n];
    (distance <= limit).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical() {
        assert_eq!(levenshtein(b"user@host:~$ ", b"user@host:~$ "), 0);
    }

    #[test]
    fn test_empty() {
        assert_eq!(levenshtein(b"", b""), 0);
        assert_eq!(levenshtein(b"", b"abc"), 3);
        assert_eq!(levenshtein(b"abc", b""), 3);
    }

    #[test]
    fn test_classic_examples() {
        assert_eq!(levenshtein(b"kitten", b"sitting"), 3);
        assert_eq!(levenshtein(b"flaw", b"lawn"), 2);
        assert_eq!(levenshtein(b"sitting", b"kitten"), 3);
    }

    #[test]
    fn test_prompt_with_banner() {
        let a = b"\r\nWelcome to Ubuntu\r\n$ ";
        let b = b"\r\n$ ";
        assert_eq!(levenshtein(a, b), a.len() - b.len());
    }

    #[test]
    fn test_within_limit_matches_full_distance() {
        let pairs: [(&[u8], &[u8]); 6] = [
            (b"kitten", b"sitting"),
            (b"flaw", b"lawn"),
            (b"", b"abc"),
            (b"abc", b""),
            (b"\r\nhost:~$ ", b"\r\nhost:~# "),
            (b"abcdefgh", b"hgfedcba"),
        ];
        for (a, b) in pairs {
            let full = levenshtein(a, b);
            assert_eq!(levenshtein_within(a, b, full), Some(full));
            assert_eq!(levenshtein_within(a, b, full + 3), Some(full));
            if full > 0 {
                assert_eq!(levenshtein_within(a, b, full - 1), None);
            }
        }
    }

    #[test]
    fn test_within_zero_limit() {
        assert_eq!(levenshtein_within(b"same", b"same", 0), Some(0));
        assert_eq!(levenshtein_within(b"same", b"sane", 0), None);
        assert_eq!(levenshtein_within(b"", b"", 0), Some(0));
    }

    #[test]
    fn test_within_length_gap_short_circuits() {
        let a = vec![b'a'; 40_000];
        let b = vec![b'b'; 80_000];
        assert_eq!(levenshtein_within(&a, &b, 15_999), None);
    }
}
