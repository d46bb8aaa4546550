//! Mention Parser
//!
//! Splits a post body into literal text and `@mention` segments.
//!
//! The body is tokenized into word runs (`don't` counts as one word) and
//! single non-word characters. Whenever an `@` token is directly followed by
//! a token that names a known user, that pair becomes a mention segment.
//! Concatenating the segments always yields the original body.

use std::collections::{BTreeMap, HashMap};
use std::iter::FusedIterator;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// A word run with optional internal apostrophes, or one non-word character.
static TOKEN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\w+(?:'\w+)*|[^\w]").expect("token pattern is valid"));

/// Lazy token stream over a string slice.
///
/// A clone is an independent cursor at the same position; call [`tokenize`]
/// again to start over.
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.pos >= self.text.len() {
            return None;
        }
        // Every character matches one of the alternatives, so the leftmost
        // match always starts at `pos`.
        let found = TOKEN_PATTERN.find_at(self.text, self.pos)?;
        self.pos = found.end();
        Some(found.as_str())
    }
}

impl FusedIterator for Tokens<'_> {}

/// Tokenize `text`. Concatenating the tokens reproduces `text` exactly.
pub fn tokenize(text: &str) -> Tokens<'_> {
    Tokens { text, pos: 0 }
}

/// Tokens directly following an `@`: the names a body could mention.
///
/// Used to narrow the user lookup before parsing; duplicates are kept.
pub fn mention_candidates(body: &str) -> Vec<&str> {
    if !body.contains('@') {
        return Vec::new();
    }
    let mut candidates = Vec::new();
    let mut tokens = tokenize(body).peekable();
    while let Some(token) = tokens.next() {
        if token == "@" {
            if let Some(&name) = tokens.peek() {
                if name != "@" {
                    candidates.push(name);
                }
            }
        }
    }
    candidates
}

/// Name used after `@` for `username`.
///
/// A username made of several whitespace-separated words is written with
/// the whitespace removed. A single-word username is used unchanged, stray
/// leading or trailing spaces included.
pub fn mention_name(username: &str) -> String {
    let mut words = username.split_whitespace();
    match (words.next(), words.next()) {
        (Some(first), Some(second)) => [first, second].into_iter().chain(words).collect(),
        _ => username.to_string(),
    }
}

/// A user that can be mentioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionTarget {
    pub user_id: i64,
    pub username: String,
    /// See [`mention_name`]
    pub mention_name: String,
}

impl MentionTarget {
    pub fn new(user_id: i64, username: impl Into<String>) -> Self {
        let username = username.into();
        Self {
            user_id,
            mention_name: mention_name(&username),
            username,
        }
    }
}

/// Lookup of mention candidates.
///
/// Resolution is exact and case-sensitive. When two users share a mention
/// name the first one in enumeration order wins; uniqueness is not enforced.
pub trait UserDirectory {
    fn resolve(&self, candidate: &str) -> Option<&MentionTarget>;
}

impl UserDirectory for [MentionTarget] {
    fn resolve(&self, candidate: &str) -> Option<&MentionTarget> {
        self.iter().find(|target| target.mention_name == candidate)
    }
}

impl UserDirectory for Vec<MentionTarget> {
    fn resolve(&self, candidate: &str) -> Option<&MentionTarget> {
        self.as_slice().resolve(candidate)
    }
}

/// Hash-indexed directory with the same first-match semantics as a slice.
#[derive(Debug, Default)]
pub struct MentionDirectory {
    targets: Vec<MentionTarget>,
    by_name: HashMap<String, usize>,
}

impl MentionDirectory {
    pub fn new(targets: Vec<MentionTarget>) -> Self {
        let mut by_name = HashMap::with_capacity(targets.len());
        for (idx, target) in targets.iter().enumerate() {
            by_name.entry(target.mention_name.clone()).or_insert(idx);
        }
        Self { targets, by_name }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl UserDirectory for MentionDirectory {
    fn resolve(&self, candidate: &str) -> Option<&MentionTarget> {
        self.by_name.get(candidate).map(|&idx| &self.targets[idx])
    }
}

/// A contiguous span of a post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    Mention {
        text: String,
        username: String,
        user_id: i64,
    },
}

impl Segment {
    fn literal(text: &str) -> Self {
        Segment::Text {
            text: text.to_string(),
        }
    }

    /// The exact slice of the body this segment covers.
    pub fn text(&self) -> &str {
        match self {
            Segment::Text { text } | Segment::Mention { text, .. } => text,
        }
    }

    pub fn is_mention(&self) -> bool {
        matches!(self, Segment::Mention { .. })
    }
}

/// Result of mention parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedBody {
    pub segments: Vec<Segment>,
    /// `"@mention_name"` -> username
    pub mentions: BTreeMap<String, String>,
}

impl ParsedBody {
    fn plain(body: &str) -> Self {
        Self {
            segments: vec![Segment::literal(body)],
            mentions: BTreeMap::new(),
        }
    }

    /// Concatenated segment text.
    pub fn reconstruct(&self) -> String {
        self.segments.iter().map(Segment::text).collect()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MentionError {
    #[error("mention parse disagreement: expected {expected:?}, rebuilt {actual:?}")]
    Disagreement { expected: String, actual: String },
}

/// Split `body` into literal and mention segments.
///
/// Bodies without `@` are returned as one literal segment without being
/// tokenized. Literal segments are never empty unless the body is.
///
/// # Errors
///
/// `MentionError::Disagreement` when the rebuilt text differs from `body`.
/// That indicates a parser defect; callers must not render anything.
pub fn parse_mentions<D>(body: &str, directory: &D) -> Result<ParsedBody, MentionError>
where
    D: UserDirectory + ?Sized,
{
    if !body.contains('@') {
        return Ok(ParsedBody::plain(body));
    }

    let mut segments = Vec::new();
    let mut mentions = BTreeMap::new();
    let mut literal_start = 0;
    let mut offset = 0;

    let mut tokens = tokenize(body).peekable();
    while let Some(token) = tokens.next() {
        let start = offset;
        offset += token.len();

        if token != "@" {
            continue;
        }
        let Some(&name) = tokens.peek() else {
            continue;
        };
        let Some(target) = directory.resolve(name) else {
            continue;
        };
        tokens.next();

        let end = offset + name.len();
        if literal_start < start {
            segments.push(Segment::literal(&body[literal_start..start]));
        }
        let text = &body[start..end];
        mentions.insert(text.to_string(), target.username.clone());
        segments.push(Segment::Mention {
            text: text.to_string(),
            username: target.username.clone(),
            user_id: target.user_id,
        });

        offset = end;
        literal_start = end;
    }

    if segments.is_empty() {
        return Ok(ParsedBody::plain(body));
    }
    if literal_start < body.len() {
        segments.push(Segment::literal(&body[literal_start..]));
    }

    let parsed = ParsedBody { segments, mentions };
    let rebuilt = parsed.reconstruct();
    if rebuilt != body {
        return Err(MentionError::Disagreement {
            expected: body.to_string(),
            actual: rebuilt,
        });
    }
    Ok(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn directory() -> Vec<MentionTarget> {
        vec![
            MentionTarget::new(1, "alice"),
            MentionTarget::new(2, "bob"),
            MentionTarget::new(3, "mary jane"),
        ]
    }

    fn text(s: &str) -> Segment {
        Segment::Text { text: s.into() }
    }

    fn mention(s: &str, username: &str) -> Segment {
        let user_id = directory()
            .into_iter()
            .find(|target| target.username == username)
            .map(|target| target.user_id)
            .unwrap();
        Segment::Mention {
            text: s.into(),
            username: username.into(),
            user_id,
        }
    }

    // ==========================================================================
    // Tokenizer
    // ==========================================================================

    #[test]
    fn test_tokenize_words_and_punctuation() {
        let tokens: Vec<&str> = tokenize("hi @bob, don't!").collect();
        assert_eq!(tokens, vec!["hi", " ", "@", "bob", ",", " ", "don't", "!"]);
    }

    #[test]
    fn test_tokenize_trailing_apostrophe_is_separate() {
        let tokens: Vec<&str> = tokenize("dogs' toys").collect();
        assert_eq!(tokens, vec!["dogs", "'", " ", "toys"]);
    }

    #[test]
    fn test_tokenize_multiple_apostrophes() {
        let tokens: Vec<&str> = tokenize("rock'n'roll").collect();
        assert_eq!(tokens, vec!["rock'n'roll"]);
    }

    #[test]
    fn test_tokenize_empty() {
        assert_eq!(tokenize("").count(), 0);
    }

    #[test]
    fn test_tokenize_is_restartable() {
        let tokens = tokenize("a b");
        let first: Vec<&str> = tokens.clone().collect();
        let second: Vec<&str> = tokens.collect();
        assert_eq!(first, second);
    }

    #[test_case("plain words" ; "ascii")]
    #[test_case("line\nbreak\ttab" ; "whitespace")]
    #[test_case("héllo wörld — 你好 🎉" ; "unicode")]
    #[test_case("@@@ '' ' @" ; "symbols")]
    #[test_case("" ; "empty")]
    fn test_tokenize_is_lossless(input: &str) {
        assert_eq!(tokenize(input).collect::<String>(), input);
    }

    // ==========================================================================
    // Resolver
    // ==========================================================================

    #[test]
    fn test_mention_candidates() {
        assert_eq!(
            mention_candidates("hi @alice and @@bob, @ ok @"),
            vec!["alice", "bob"]
        );
        assert!(mention_candidates("no at signs").is_empty());
    }

    #[test]
    fn test_mention_name_strips_spaces() {
        let target = MentionTarget::new(9, "mary jane watson");
        assert_eq!(target.mention_name, "maryjanewatson");
    }

    #[test_case("alice", "alice" ; "single word")]
    #[test_case("alice ", "alice " ; "trailing space kept")]
    #[test_case(" alice", " alice" ; "leading space kept")]
    #[test_case("mary  jane", "maryjane" ; "repeated inner spaces")]
    #[test_case(" mary jane ", "maryjane" ; "outer spaces of a multi word name")]
    #[test_case("", "" ; "empty")]
    fn test_mention_name(username: &str, expected: &str) {
        assert_eq!(mention_name(username), expected);
    }

    #[test]
    fn test_trailing_space_user_does_not_shadow_plain_name() {
        let dir = vec![MentionTarget::new(1, "alice "), MentionTarget::new(2, "alice")];
        assert_eq!(dir.resolve("alice").map(|t| t.user_id), Some(2));

        let parsed = parse_mentions("hi @alice", &MentionDirectory::new(dir)).unwrap();
        assert_eq!(
            parsed.segments,
            vec![
                text("hi "),
                Segment::Mention {
                    text: "@alice".into(),
                    username: "alice".into(),
                    user_id: 2,
                },
            ]
        );
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        let dir = directory();
        assert!(dir.resolve("alice").is_some());
        assert!(dir.resolve("Alice").is_none());
        assert!(dir.resolve("ali").is_none());
    }

    #[test]
    fn test_resolve_duplicate_names_first_wins() {
        let dir = vec![MentionTarget::new(1, "a b"), MentionTarget::new(2, "ab")];
        assert_eq!(dir.resolve("ab").map(|t| t.user_id), Some(1));

        let indexed = MentionDirectory::new(dir);
        assert_eq!(indexed.resolve("ab").map(|t| t.user_id), Some(1));
        assert_eq!(indexed.len(), 2);
    }

    // ==========================================================================
    // Segment builder
    // ==========================================================================

    #[test]
    fn test_no_at_sign_is_single_segment() {
        let parsed = parse_mentions("just a post", &directory()).unwrap();
        assert_eq!(parsed.segments, vec![text("just a post")]);
        assert!(parsed.mentions.is_empty());
    }

    #[test]
    fn test_empty_body() {
        let parsed = parse_mentions("", &directory()).unwrap();
        assert_eq!(parsed.segments, vec![text("")]);
    }

    #[test]
    fn test_resolved_mention() {
        let parsed = parse_mentions("hey @alice, look", &directory()).unwrap();
        assert_eq!(
            parsed.segments,
            vec![text("hey "), mention("@alice", "alice"), text(", look")]
        );
        assert_eq!(parsed.mentions.get("@alice").map(String::as_str), Some("alice"));
    }

    #[test]
    fn test_mention_at_start_and_end() {
        let parsed = parse_mentions("@bob hi @alice", &directory()).unwrap();
        assert_eq!(
            parsed.segments,
            vec![mention("@bob", "bob"), text(" hi "), mention("@alice", "alice")]
        );
        assert_eq!(parsed.mentions.len(), 2);
    }

    #[test]
    fn test_adjacent_mentions() {
        let parsed = parse_mentions("@alice@bob", &directory()).unwrap();
        assert_eq!(
            parsed.segments,
            vec![mention("@alice", "alice"), mention("@bob", "bob")]
        );
    }

    #[test]
    fn test_spaced_username_maps_to_username() {
        let parsed = parse_mentions("thanks @maryjane!", &directory()).unwrap();
        assert_eq!(
            parsed.segments,
            vec![text("thanks "), mention("@maryjane", "mary jane"), text("!")]
        );
        assert_eq!(
            parsed.mentions.get("@maryjane").map(String::as_str),
            Some("mary jane")
        );
    }

    #[test]
    fn test_unresolved_mention_passthrough() {
        let parsed = parse_mentions("hello @ghost", &directory()).unwrap();
        assert_eq!(parsed.segments, vec![text("hello @ghost")]);
        assert!(parsed.mentions.is_empty());
    }

    #[test]
    fn test_trailing_at_passthrough() {
        let parsed = parse_mentions("hello @", &directory()).unwrap();
        assert_eq!(parsed.segments, vec![text("hello @")]);
        assert!(parsed.mentions.is_empty());
    }

    #[test]
    fn test_double_at_then_name() {
        let parsed = parse_mentions("@@alice", &directory()).unwrap();
        assert_eq!(parsed.segments, vec![text("@"), mention("@alice", "alice")]);
    }

    #[test]
    fn test_email_like_text_does_not_resolve_partial_word() {
        // "alice2" is a single word token and matches no user
        let parsed = parse_mentions("mail @alice2 now", &directory()).unwrap();
        assert_eq!(parsed.segments, vec![text("mail @alice2 now")]);
    }

    #[test]
    fn test_repeated_mention_maps_once() {
        let parsed = parse_mentions("@bob and @bob", &directory()).unwrap();
        assert_eq!(parsed.segments.iter().filter(|s| s.is_mention()).count(), 2);
        assert_eq!(parsed.mentions.len(), 1);
    }

    #[test_case("hey @alice, look" ; "one mention")]
    #[test_case("@bob@alice@ghost @" ; "mixed")]
    #[test_case("no mentions at all" ; "none")]
    #[test_case("unicode @alice → 你好 @bob!" ; "unicode")]
    #[test_case("@" ; "lone at")]
    #[test_case("it's @maryjane's turn" ; "apostrophe")]
    fn test_round_trip(body: &str) {
        let parsed = parse_mentions(body, &directory()).unwrap();
        assert_eq!(parsed.reconstruct(), body);
    }

    #[test]
    fn test_apostrophe_word_is_not_a_mention() {
        // "maryjane's" is one token, so it does not resolve
        let parsed = parse_mentions("it's @maryjane's turn", &directory()).unwrap();
        assert!(parsed.mentions.is_empty());
    }

    #[test]
    fn test_segment_serialization() {
        let json = serde_json::to_value(mention("@bob", "bob")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "mention", "text": "@bob", "username": "bob", "user_id": 2})
        );
    }
}
