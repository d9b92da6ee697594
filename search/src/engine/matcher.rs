use crate::config::{CaseMatching, MatchKind, SearchConfig};
use nucleo::pattern::{Atom, AtomKind, CaseMatching as NucleoCaseMatching, Normalization};
use nucleo::{Config as NucleoConfig, Matcher, Utf32Str};
use std::borrow::Cow;

/// Scores indexed content against one query. Higher is better.
pub(crate) struct ContentMatcher {
    atom: Atom,
    matcher: Matcher,
    buf: Vec<char>,
}

impl ContentMatcher {
    pub(crate) fn new(text: &str, kind: MatchKind, config: &SearchConfig) -> Self {
        let case_matching = match config.case_matching {
            CaseMatching::Sensitive => NucleoCaseMatching::Respect,
            CaseMatching::Insensitive => NucleoCaseMatching::Ignore,
            CaseMatching::Smart => NucleoCaseMatching::Smart,
        };

        let normalization = if config.unicode_normalization {
            Normalization::Smart
        } else {
            Normalization::Never
        };

        let atom_kind = match kind {
            MatchKind::Substring => AtomKind::Substring,
            MatchKind::Fuzzy => AtomKind::Fuzzy,
        };

        // The needle is folded like every haystack so it has the same chars.
        let mut buf = Vec::new();
        let needle: String = Utf32Str::new(&fold_line_breaks(text), &mut buf)
            .chars()
            .collect();

        // Whitespace stays part of the needle so phrases match as a whole.
        let atom = Atom::new(&needle, case_matching, normalization, atom_kind, false);

        Self {
            atom,
            matcher: Matcher::new(NucleoConfig::DEFAULT),
            buf,
        }
    }

    pub(crate) fn score(&mut self, content: &str) -> Option<u16> {
        let content = fold_line_breaks(content);
        let haystack = Utf32Str::new(&content, &mut self.buf);
        self.atom.score(haystack, &mut self.matcher)
    }
}

/// `Utf32Str` keeps one char per grapheme for non-ASCII text only, which
/// turns `\r\n` into `\r` there but not in ASCII text. Using `\n` on both
/// sides keeps needle and haystack comparable.
fn fold_line_breaks(text: &str) -> Cow<'_, str> {
    if text.contains("\r\n") {
        Cow::Owned(text.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(text)
    }
}
