/// Number of leading `'0'` characters in a hex encoded hash.
pub fn leading_zero_chars(hash: &str) -> u32 {
    let mut total = 0u32;
    for c in hash.chars() {
        if c != '0' {
            break;
        }
        total += 1;
    }
    total
}

/// Whether `hash` starts with at least `difficulty` zero characters.
pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
    leading_zero_chars(hash) >= difficulty
}
