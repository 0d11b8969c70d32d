//! Trigram inverted index over normalized titles.

use std::collections::HashMap;

/// Length of the character windows used as index keys.
const GRAM_LEN: usize = 3;

/// In-memory inverted index keyed by document ordinal.
///
/// Each title is also kept with its spaces removed, and the 3-character
/// windows of that compact form are the index keys. A query matches a
/// document when each query token occurs inside the title, or when the
/// compact query occurs inside the compact title, so "halflife" finds
/// "half life 2". Trigram postings narrow the candidates and the stored
/// text confirms the match.
#[derive(Debug, Default, Clone)]
pub struct TitleIndex {
    texts: Vec<String>,
    compact: Vec<String>,
    grams: HashMap<String, Vec<usize>>,
}

impl TitleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `text` under ordinal `id`. Re-adding an id replaces its text
    /// for verification but keeps earlier postings, so ids are expected to be
    /// added once each.
    pub fn add(&mut self, id: usize, text: &str) {
        if id >= self.texts.len() {
            self.texts.resize(id + 1, String::new());
            self.compact.resize(id + 1, String::new());
        }
        let compact = compact(text);

        // Windows of the compact form include every window of every token.
        for gram in trigrams(&compact) {
            let postings = self.grams.entry(gram).or_default();
            if let Err(pos) = postings.binary_search(&id) {
                postings.insert(pos, id);
            }
        }

        self.texts[id] = text.to_string();
        self.compact[id] = compact;
    }

    /// Number of ordinals held by the index.
    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }

    /// Number of distinct trigram keys.
    pub fn key_count(&self) -> usize {
        self.grams.len()
    }

    /// Find ordinals matching an already-normalized query.
    ///
    /// Documents containing the whole query as one phrase (spaces ignored)
    /// come first, then documents that only contain every token; each group
    /// is in ascending ordinal order. An empty query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<usize> {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() || limit == 0 {
            return Vec::new();
        }
        let compact_query = tokens.concat();

        // `None` means no piece was long enough to have a trigram.
        let candidates = match (
            self.candidates(tokens.iter().copied()),
            self.candidates([compact_query.as_str()]),
        ) {
            (Some(by_tokens), Some(by_compact)) => Some(union(&by_tokens, &by_compact)),
            _ => None,
        };
        if candidates.as_ref().is_some_and(|c| c.is_empty()) {
            return Vec::new();
        }

        let mut phrase_hits = Vec::new();
        let mut token_hits = Vec::new();

        let mut consider = |id: usize| {
            if self.compact[id].contains(&compact_query) {
                phrase_hits.push(id);
            } else if tokens.iter().all(|t| self.texts[id].contains(t)) {
                token_hits.push(id);
            }
        };

        match candidates {
            Some(ids) => ids.into_iter().for_each(&mut consider),
            None => (0..self.texts.len()).for_each(&mut consider),
        }

        phrase_hits.extend(token_hits);
        phrase_hits.truncate(limit);
        phrase_hits
    }

    /// Ids whose postings hold every trigram of every piece.
    fn candidates<'a>(&self, pieces: impl IntoIterator<Item = &'a str>) -> Option<Vec<usize>> {
        let mut current: Option<Vec<usize>> = None;
        for piece in pieces {
            for gram in trigrams(piece) {
                let postings = self.grams.get(&gram).map(Vec::as_slice).unwrap_or(&[]);
                let next = match current {
                    Some(ids) => intersect(&ids, postings),
                    None => postings.to_vec(),
                };
                if next.is_empty() {
                    return Some(Vec::new());
                }
                current = Some(next);
            }
        }
        current
    }
}

fn compact(text: &str) -> String {
    text.split_whitespace().collect()
}

fn trigrams(token: &str) -> Vec<String> {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() < GRAM_LEN {
        return Vec::new();
    }
    chars
        .windows(GRAM_LEN)
        .map(|w| w.iter().collect())
        .collect()
}

/// Union of two ascending id lists.
fn union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}

/// Intersection of two ascending id lists.
fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}
