//! Prefix / Suffix / Pattern Scanner (§4.7, C7).
//!
//! In a live deployment this is one server-side script that walks a
//! prefix (or suffix) ZSET by a score-bounded window and tests each
//! candidate member against a literal prefix or a glob. Here the same
//! algorithm runs as ordinary Rust over the window
//! [`rom_backend::BackingStore::zrange_by_score`] returns — logically
//! equivalent to the script, since [`rom_backend::InMemoryBackend::execute_write`]
//! already gives every write the atomicity the real script would, and a
//! read-only scan has nothing to race against.

use rom_backend::{BackendResult, BackingStore};
use rom_core::codec::prefix_score;

/// Scan a prefix (or, for suffix queries, a reversed-term) ZSET at `key`
/// for members whose term literally starts with `needle`.
///
/// `is_suffix` only affects how the match is reported: suffix terms are
/// stored reversed, so a literal match on the reversed needle against the
/// reversed term is exactly a suffix match on the original strings.
pub fn scan_literal<S: BackingStore>(
    store: &S,
    key: &str,
    needle: &str,
    is_suffix: bool,
) -> BackendResult<Vec<u64>> {
    let _ = is_suffix; // matching is identical either way once the caller reverses the needle
    let lo = prefix_score(needle, false);
    let hi = prefix_score(needle, true);
    let window = store.zrange_by_score(key, lo, hi)?;
    let mut hits = Vec::new();
    for (member, _) in window {
        if let Some((term, id)) = split_member(&member) {
            if term.starts_with(needle) {
                hits.push(id);
            }
        }
    }
    Ok(hits)
}

/// Scan a prefix ZSET at `key` for members whose term matches the glob
/// `pattern` (§6: `?` 0-or-1, `*` 0-or-more, `+` 1-or-more, `!` exactly
/// one, everything else literal).
pub fn scan_pattern<S: BackingStore>(
    store: &S,
    key: &str,
    pattern: &str,
) -> BackendResult<Vec<u64>> {
    let literal_prefix = literal_prefix_of(pattern);
    let window = if literal_prefix.is_empty() {
        store.zrange_by_score(key, 0.0, f64::MAX)?
    } else {
        let lo = prefix_score(&literal_prefix, false);
        let hi = prefix_score(&literal_prefix, true);
        store.zrange_by_score(key, lo, hi)?
    };
    let mut hits = Vec::new();
    for (member, _) in window {
        if let Some((term, id)) = split_member(&member) {
            if glob_match(pattern, term) {
                hits.push(id);
            }
        }
    }
    Ok(hits)
}

fn split_member(member: &str) -> Option<(&str, u64)> {
    let (term, id) = member.rsplit_once('\0')?;
    id.parse().ok().map(|id| (term, id))
}

/// Literal leading characters of `pattern` up to the first wildcard, at
/// most 7 bytes (matching the prefix codec's window) — used to seed the
/// scan's score bound without scanning the whole index.
fn literal_prefix_of(pattern: &str) -> String {
    let mut out = String::new();
    for ch in pattern.chars() {
        if matches!(ch, '?' | '*' | '+' | '!') {
            break;
        }
        out.push(ch);
        if out.len() >= 7 {
            break;
        }
    }
    out
}

/// Match `pattern` (the `?`/`*`/`+`/`!` glob dialect in §6) against the
/// whole of `text`, anchored at both ends.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    matches_from(&p, 0, &t, 0)
}

fn matches_from(p: &[char], pi: usize, t: &[char], ti: usize) -> bool {
    if pi == p.len() {
        return ti == t.len();
    }
    match p[pi] {
        '?' => {
            // zero or one of any character
            matches_from(p, pi + 1, t, ti)
                || (ti < t.len() && matches_from(p, pi + 1, t, ti + 1))
        }
        '*' => {
            // zero or more of any character
            if matches_from(p, pi + 1, t, ti) {
                return true;
            }
            let mut i = ti;
            while i < t.len() {
                i += 1;
                if matches_from(p, pi + 1, t, i) {
                    return true;
                }
            }
            false
        }
        '+' => {
            // one or more of any character
            let mut i = ti;
            while i < t.len() {
                i += 1;
                if matches_from(p, pi + 1, t, i) {
                    return true;
                }
            }
            false
        }
        '!' => {
            // exactly one character
            ti < t.len() && matches_from(p, pi + 1, t, ti + 1)
        }
        literal => ti < t.len() && t[ti] == literal && matches_from(p, pi + 1, t, ti + 1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rom_core::namespace::Namespace;

    fn seed(be: &rom_backend::InMemoryBackend, ns: &Namespace, field: &str, term: &str, id: u64) {
        let key = ns.prefix_index_key(field);
        let member = format!("{}\0{}", term, id);
        be.zadd(&key, &member, prefix_score(term, false)).unwrap();
    }

    #[test]
    fn literal_prefix_scan_finds_matching_terms() {
        let be = rom_backend::InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed(&be, &ns, "email", "user@gmail.com", 1);
        seed(&be, &ns, "email", "other@yahoo.com", 2);
        let hits = scan_literal(&be, &ns.prefix_index_key("email"), "user@", false).unwrap();
        assert_eq!(hits, vec![1]);
    }

    #[test]
    fn glob_star_matches_anywhere() {
        assert!(glob_match("*@gmail*", "user@gmail.com"));
        assert!(!glob_match("*@gmail*", "user@yahoo.com"));
    }

    #[test]
    fn glob_bang_matches_exactly_one_char() {
        assert!(glob_match("a!c", "abc"));
        assert!(!glob_match("a!c", "ac"));
        assert!(!glob_match("a!c", "abbc"));
    }

    #[test]
    fn glob_question_mark_is_optional() {
        assert!(glob_match("colou?r", "color"));
        assert!(glob_match("colou?r", "colour"));
    }

    #[test]
    fn glob_plus_requires_at_least_one() {
        assert!(glob_match("a+b", "axb"));
        assert!(!glob_match("a+b", "ab"));
    }

    #[test]
    fn pattern_scan_finds_matches_via_literal_prefix_window() {
        let be = rom_backend::InMemoryBackend::default();
        let ns = Namespace::new("User").unwrap();
        seed(&be, &ns, "email", "user@gmail.com", 1);
        seed(&be, &ns, "email", "other@yahoo.com", 2);
        let hits = scan_pattern(&be, &ns.prefix_index_key("email"), "user*").unwrap();
        assert_eq!(hits, vec![1]);
    }
}
