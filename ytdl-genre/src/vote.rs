//! Multi-model genre voting
//!
//! Combines the ranked tag lists of the four tagging model variants into one
//! genre label.
//!
//! # Scoring
//! Weighted Borda count. In every list the first tag earns `top_n` points, the
//! second `top_n - 1`, down to 1 point for rank `top_n`. Points add up across
//! lists, so a tag ranked first by all four models scores `4 * top_n`.
//!
//! # Selection
//! Tags are ordered by score (descending), ties keep first-encounter order
//! (list 1 before list 2, and so on). The first tag found in the preferred
//! genre set wins; when none is preferred, the top-scoring tag is used. The
//! winner is title-cased.
//!
//! Everything here is pure: a fresh [`TagVote`] is built per call and dropped
//! afterwards, so concurrent callers never share state.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use ytdl_common::config::GenreConfig;

/// Number of ranked lists fed into one vote (one per model variant)
pub const LIST_COUNT: usize = 4;

/// Default number of tags requested per model
pub const DEFAULT_TOP_N: usize = 5;

/// Preferred genres of the reference deployment
///
/// Casing is kept as deployed. Membership is exact-match by default, so
/// entries such as `Hip-Hop` only match a tagger emitting that exact casing.
pub const DEFAULT_PREFERRED_GENRES: &[&str] = &[
    "classical",
    "techno",
    "strings",
    "drums",
    "electronic",
    "rock",
    "piano",
    "ambient",
    "violin",
    "vocal",
    "synth",
    "indian",
    "opera",
    "harpsichord",
    "flute",
    "pop",
    "sitar",
    "classic",
    "choir",
    "new age",
    "dance",
    "harp",
    "cello",
    "country",
    "metal",
    "choral",
    "alternative",
    "indie",
    "00s",
    "alternative rock",
    "jazz",
    "chillout",
    "classic rock",
    "soul",
    "indie rock",
    "Mellow",
    "electronica",
    "80s",
    "folk",
    "90s",
    "chill",
    "instrumental",
    "punk",
    "oldies",
    "blues",
    "hard rock",
    "acoustic",
    "experimental",
    "Hip-Hop",
    "70s",
    "party",
    "easy listening",
    "funk",
    "electro",
    "heavy metal",
    "Progressive rock",
    "60s",
    "rnb",
    "indie pop",
    "sad",
    "House",
];

/// Voting errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoteError {
    /// Malformed tagger output (wrong shape, wrong element type, too long)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// All lists were empty, so there is nothing to choose from
    #[error("No tags produced by any model")]
    NoTags,
}

// ============================================================================
// Input types
// ============================================================================

/// Tags from one model invocation, most confident first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RankedTagList(Vec<String>);

impl RankedTagList {
    /// Validate raw JSON tagger output: an array whose elements are all strings
    pub fn from_json(value: &serde_json::Value) -> Result<Self, VoteError> {
        let items = value.as_array().ok_or_else(|| {
            VoteError::InvalidInput(format!("expected a list of tags, got {}", json_kind(value)))
        })?;

        items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    VoteError::InvalidInput(format!(
                        "tag at position {} is {}, expected a string",
                        i,
                        json_kind(item)
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn tags(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for RankedTagList {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

impl From<Vec<&str>> for RankedTagList {
    fn from(tags: Vec<&str>) -> Self {
        Self(tags.into_iter().map(str::to_string).collect())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "a list",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Curated genre names that win over higher-scoring free-text tags
#[derive(Debug, Clone)]
pub struct PreferredGenreSet {
    exact: HashSet<String>,
    folded: HashSet<String>,
}

impl PreferredGenreSet {
    pub fn new<I, S>(genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exact: HashSet<String> = genres.into_iter().map(Into::into).collect();
        let folded = exact.iter().map(|g| g.to_lowercase()).collect();
        Self { exact, folded }
    }

    /// Membership check; `case_sensitive = false` compares lower-cased forms
    pub fn contains(&self, tag: &str, case_sensitive: bool) -> bool {
        if case_sensitive {
            self.exact.contains(tag)
        } else {
            self.folded.contains(&tag.to_lowercase())
        }
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }
}

impl Default for PreferredGenreSet {
    fn default() -> Self {
        Self::new(DEFAULT_PREFERRED_GENRES.iter().copied())
    }
}

/// Voting parameters, fixed for the process lifetime
#[derive(Debug, Clone)]
pub struct GenreVoteConfig {
    pub top_n: usize,
    pub case_sensitive: bool,
    pub preferred: PreferredGenreSet,
}

impl GenreVoteConfig {
    pub fn from_genre_config(config: &GenreConfig) -> Self {
        let preferred = match &config.preferred {
            Some(list) => PreferredGenreSet::new(list.iter().cloned()),
            None => PreferredGenreSet::default(),
        };
        Self {
            top_n: config.top_n,
            case_sensitive: config.case_sensitive,
            preferred,
        }
    }
}

impl Default for GenreVoteConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            case_sensitive: true,
            preferred: PreferredGenreSet::default(),
        }
    }
}

// ============================================================================
// Vote accumulation
// ============================================================================

/// Accumulated score per tag, remembering first-encounter order
#[derive(Debug, Clone, Default)]
pub struct TagVote {
    entries: Vec<(String, u32)>,
    index: HashMap<String, usize>,
}

impl TagVote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one ranked list: rank 1 earns `top_n`, each later rank one less
    ///
    /// The list must not be longer than `top_n`.
    pub fn merge(&mut self, list: &RankedTagList, top_n: usize) {
        let mut weight = top_n as u32;
        for tag in list.tags() {
            match self.index.get(tag) {
                Some(&pos) => self.entries[pos].1 += weight,
                None => {
                    self.index.insert(tag.clone(), self.entries.len());
                    self.entries.push((tag.clone(), weight));
                }
            }
            weight = weight.saturating_sub(1);
        }
    }

    pub fn score(&self, tag: &str) -> Option<u32> {
        self.index.get(tag).map(|&pos| self.entries[pos].1)
    }

    /// Entries by score descending; equal scores keep first-encounter order
    pub fn ranked(&self) -> Vec<(String, u32)> {
        let mut sorted = self.entries.clone();
        // sort_by is stable
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }
}

// ============================================================================
// Selection
// ============================================================================

/// How the winning tag was picked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// Highest-ranked tag in the preferred genre set
    Preferred,
    /// No preferred tag present; highest-scoring tag overall
    Fallback,
}

/// Full outcome of one vote
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenreDecision {
    /// Title-cased genre label
    pub genre: String,
    /// Winning tag as emitted by the tagger
    pub tag: String,
    pub source: SelectionSource,
    /// Sorted vote
    pub scores: Vec<(String, u32)>,
}

/// Vote across four ranked lists and return the title-cased genre
pub fn compute_genre(
    config: &GenreVoteConfig,
    lists: &[RankedTagList; LIST_COUNT],
) -> Result<String, VoteError> {
    compute_genre_detailed(config, lists).map(|decision| decision.genre)
}

/// Like [`compute_genre`], also returning the sorted vote and selection path
pub fn compute_genre_detailed(
    config: &GenreVoteConfig,
    lists: &[RankedTagList; LIST_COUNT],
) -> Result<GenreDecision, VoteError> {
    for (i, list) in lists.iter().enumerate() {
        if list.len() > config.top_n {
            return Err(VoteError::InvalidInput(format!(
                "list {} has {} tags, at most {} allowed",
                i + 1,
                list.len(),
                config.top_n
            )));
        }
    }

    let mut vote = TagVote::new();
    for list in lists {
        vote.merge(list, config.top_n);
    }

    let scores = vote.ranked();

    let preferred = scores
        .iter()
        .find(|(tag, _)| config.preferred.contains(tag, config.case_sensitive));

    let (tag, source) = match preferred {
        Some((tag, _)) => (tag.clone(), SelectionSource::Preferred),
        None => match scores.first() {
            Some((tag, _)) => (tag.clone(), SelectionSource::Fallback),
            None => return Err(VoteError::NoTags),
        },
    };

    Ok(GenreDecision {
        genre: title_case(&tag),
        tag,
        source,
        scores,
    })
}

/// Title-case a label
///
/// A cased letter is upper-cased when the previous character is not a cased
/// letter and lower-cased otherwise. Digits and punctuation start a new word:
/// `hip-hop` → `Hip-Hop`, `90s` → `90S`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_cased = false;
    for c in s.chars() {
        let cased = c.is_uppercase() || c.is_lowercase();
        if cased {
            if prev_cased {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
        } else {
            out.push(c);
        }
        prev_cased = cased;
    }
    out
}
