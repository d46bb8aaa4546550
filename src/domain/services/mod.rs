//! # Domain Services
//!
//! Side-effect free domain logic that does not belong to a single entity.
//!
//! - **mention_parser**: splits post bodies into text and `@mention` segments

pub mod mention_parser;

pub use mention_parser::{
    mention_candidates, mention_name, parse_mentions, tokenize, MentionDirectory, MentionError,
    MentionTarget, ParsedBody, Segment, Tokens, UserDirectory,
};
