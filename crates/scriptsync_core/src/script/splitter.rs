//! Fuzzy script split-point search.
//!
//! After each analysis window the controller must know how much of the
//! remaining script has been consumed. The service is asked to quote
//! narration verbatim, but in practice it paraphrases, truncates, or
//! drifts on punctuation. Matching is therefore anchored on the *end*
//! of the reported narration: drift at the start of a fragment is
//! tolerated, while the point where consumption resumes stays precise.
//!
//! Pure functions, no I/O.

/// How many trailing characters of the fragment form the search suffix.
const SUFFIX_CHARS: usize = 50;

/// Minimum share of the fragment (or suffix) a fuzzy match must cover.
const MIN_MATCH_RATIO: f64 = 0.6;

/// Find the byte offset in `full_text` just past where `fragment` ends.
///
/// Strategy, in order of preference:
/// 1. whitespace-normalized reverse search, as a confidence signal only
///    (offsets into the normalized string don't map back);
/// 2. exact reverse search for the fragment's last 50 characters;
/// 3. longest-common-block alignment of the whole fragment, accepted at
///    >= 60% coverage, with a suffix-only realignment when the block
///    does not reach the fragment's end.
///
/// Returns `None` when no placement is credible.
pub fn find_split_point(full_text: &str, fragment: &str) -> Option<usize> {
    if full_text.is_empty() || fragment.is_empty() {
        return None;
    }

    let full_norm = normalize_whitespace(full_text);
    let frag_norm = normalize_whitespace(fragment);
    if full_norm.rfind(&frag_norm).is_none() {
        tracing::debug!("normalized exact search missed; fragment is not verbatim");
    }

    let suffix = char_suffix(fragment, SUFFIX_CHARS);
    if let Some(idx) = full_text.rfind(suffix) {
        return Some(idx + suffix.len());
    }

    tracing::debug!("exact suffix search failed, falling back to fuzzy alignment");

    let full_chars: Vec<char> = full_text.chars().collect();
    let frag_chars: Vec<char> = fragment.chars().collect();
    let offsets = char_byte_offsets(full_text);

    let block = longest_match(&full_chars, &frag_chars);
    if (block.len as f64) <= frag_chars.len() as f64 * MIN_MATCH_RATIO {
        return None;
    }

    let end_in_full = block.full_start + block.len;
    if block.frag_start + block.len == frag_chars.len() {
        return Some(offsets[end_in_full]);
    }

    // The block landed at the start or middle of the fragment; realign
    // just the suffix to pin down where consumption should resume.
    let suffix_chars: Vec<char> = suffix.chars().collect();
    let suffix_block = longest_match(&full_chars, &suffix_chars);
    if (suffix_block.len as f64) > suffix_chars.len() as f64 * MIN_MATCH_RATIO {
        return Some(offsets[suffix_block.full_start + suffix_block.len]);
    }

    Some(offsets[end_in_full])
}

/// Collapse all whitespace runs to single spaces.
fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The last `count` characters of `text`, respecting char boundaries.
fn char_suffix(text: &str, count: usize) -> &str {
    match text.char_indices().rev().nth(count.saturating_sub(1)) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Byte offset of each char index, plus one trailing entry for the end.
fn char_byte_offsets(text: &str) -> Vec<usize> {
    let mut offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    offsets.push(text.len());
    offsets
}

/// A contiguous matching block between the full text and the fragment,
/// in char indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MatchBlock {
    full_start: usize,
    frag_start: usize,
    len: usize,
}

/// Longest contiguous common block between `full` and `frag`.
///
/// Classic longest-common-substring dynamic program with a rolling row;
/// O(len(full) x len(frag)) time, O(len(frag)) memory. Ties resolve to
/// the earliest position in `full`, matching difflib's behavior.
fn longest_match(full: &[char], frag: &[char]) -> MatchBlock {
    let mut best = MatchBlock {
        full_start: 0,
        frag_start: 0,
        len: 0,
    };
    if full.is_empty() || frag.is_empty() {
        return best;
    }

    let mut prev = vec![0usize; frag.len() + 1];
    let mut curr = vec![0usize; frag.len() + 1];

    for (i, &fc) in full.iter().enumerate() {
        for (j, &gc) in frag.iter().enumerate() {
            curr[j + 1] = if fc == gc { prev[j] + 1 } else { 0 };
            if curr[j + 1] > best.len {
                best.len = curr[j + 1];
                best.full_start = i + 1 - curr[j + 1];
                best.frag_start = j + 1 - curr[j + 1];
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPT: &str = "The hunter crept through the silver birches, \
        bow drawn, breath held against the cold. Far below, the village \
        lights flickered like dying embers. She had promised to return \
        before the first snow, but the wound in her side said otherwise.";

    #[test]
    fn verbatim_fragment_returns_exact_end() {
        let fragment = "Far below, the village \
        lights flickered like dying embers.";
        let idx = find_split_point(SCRIPT, fragment).unwrap();
        let end = SCRIPT.find(fragment).unwrap() + fragment.len();
        assert_eq!(idx, end);
    }

    #[test]
    fn whole_text_fragment_consumes_everything() {
        let idx = find_split_point(SCRIPT, SCRIPT).unwrap();
        assert_eq!(idx, SCRIPT.len());
    }

    #[test]
    fn single_word_substitution_still_matches() {
        // "wound" -> "hurt": exact suffix search fails, fuzzy alignment
        // must still place the end of the fragment.
        let fragment = "She had promised to return \
        before the first snow, but the hurt in her side said otherwise.";
        let idx = find_split_point(SCRIPT, fragment).unwrap();
        // The offset must land inside the final sentence, at worst just
        // before the substituted word.
        let final_sentence = SCRIPT.find("She had promised").unwrap();
        assert!(idx > final_sentence, "offset {} too early", idx);
        assert!(idx <= SCRIPT.len());
    }

    #[test]
    fn dropped_trailing_clause_matches_via_fuzzy() {
        let truncated = "The hunter crept through the silver birches, \
        bow drawn, breath held against";
        let idx = find_split_point(SCRIPT, truncated).unwrap();
        assert!(idx >= truncated.len() - 10);
        assert!(idx <= truncated.len() + 30);
    }

    #[test]
    fn unrelated_fragment_is_not_found() {
        let fragment = "Quarterly revenue exceeded projections across all \
        twelve regional distribution hubs this fiscal year.";
        assert_eq!(find_split_point(SCRIPT, fragment), None);
    }

    #[test]
    fn empty_inputs_are_not_found() {
        assert_eq!(find_split_point("", "x"), None);
        assert_eq!(find_split_point("x", ""), None);
    }

    #[test]
    fn short_fragment_uses_whole_fragment_as_suffix() {
        let idx = find_split_point("abc def ghi", "def").unwrap();
        assert_eq!(idx, 7);
    }

    #[test]
    fn suffix_respects_multibyte_boundaries() {
        let text = "préambule — la forêt s'éveille doucement sous la pluie fine du matin clair";
        let idx = find_split_point(text, text).unwrap();
        assert_eq!(idx, text.len());
    }

    #[test]
    fn longest_match_finds_block() {
        let full: Vec<char> = "abcXdefghiY".chars().collect();
        let frag: Vec<char> = "ZZdefghiZZ".chars().collect();
        let block = longest_match(&full, &frag);
        assert_eq!(block.len, 6);
        assert_eq!(block.full_start, 4);
        assert_eq!(block.frag_start, 2);
    }

    #[test]
    fn longest_match_empty_inputs() {
        let block = longest_match(&[], &['a']);
        assert_eq!(block.len, 0);
    }
}
