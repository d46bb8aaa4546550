//! Response DTOs
//!
//! Data structures for API response bodies. IDs are serialized as strings
//! so Snowflake values survive JavaScript clients.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::application::services::{AuthTokens, PostView};
use crate::domain::services::Segment;
use crate::domain::{MessageListing, Notification, User};
use crate::shared::pagination::Page;

const LIST_AVATAR_SIZE: u32 = 36;
const PROFILE_AVATAR_SIZE: u32 = 128;

/// Authentication tokens response
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    pub token_type: String,
}

impl From<AuthTokens> for TokenResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            expires_in: tokens.expires_in,
            token_type: tokens.token_type,
        }
    }
}

/// Registration response (includes user and tokens)
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenResponse,
}

/// User response
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub about_me: Option<String>,
    pub avatar: String,
    pub last_seen: String,
    pub created_at: String,
}

impl UserResponse {
    /// `include_email` is set only when users look at themselves.
    pub fn from_user(user: User, include_email: bool) -> Self {
        Self {
            id: user.id.to_string(),
            avatar: user.avatar(PROFILE_AVATAR_SIZE),
            email: include_email.then(|| user.email),
            username: user.username,
            about_me: user.about_me,
            last_seen: user.last_seen.to_rfc3339(),
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Profile page header: the user and the viewer's relation to them.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub is_following: bool,
}

/// Post author summary
#[derive(Debug, Serialize)]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
    pub avatar: String,
}

/// Piece of a post body
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentResponse {
    Text {
        text: String,
    },
    Mention {
        text: String,
        username: String,
        user_id: String,
    },
}

impl From<Segment> for SegmentResponse {
    fn from(segment: Segment) -> Self {
        match segment {
            Segment::Text { text } => SegmentResponse::Text { text },
            Segment::Mention {
                text,
                username,
                user_id,
            } => SegmentResponse::Mention {
                text,
                username,
                user_id: user_id.to_string(),
            },
        }
    }
}

/// A post with its body split into text and mention segments.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    pub id: String,
    pub author: AuthorResponse,
    pub body: String,
    pub segments: Vec<SegmentResponse>,
    /// `"@mention"` -> username
    pub mentions: BTreeMap<String, String>,
    pub language: Option<String>,
    pub parent_id: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: String,
    pub edited_at: Option<String>,
}

impl From<PostView> for PostResponse {
    fn from(view: PostView) -> Self {
        let PostView { listing, body } = view;
        let post = listing.post;
        let avatar = User::avatar_for_email(&listing.author_email, LIST_AVATAR_SIZE);

        Self {
            id: post.id.to_string(),
            author: AuthorResponse {
                id: post.author_id.to_string(),
                username: listing.author_username,
                avatar,
            },
            body: post.body,
            segments: body.segments.into_iter().map(SegmentResponse::from).collect(),
            mentions: body.mentions,
            language: post.language,
            parent_id: post.parent_id.map(|id| id.to_string()),
            like_count: listing.like_count,
            comment_count: listing.comment_count,
            created_at: post.created_at.to_rfc3339(),
            edited_at: post.edited_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Received private message
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub id: String,
    pub sender: AuthorResponse,
    pub recipient_id: String,
    pub body: String,
    pub created_at: String,
}

impl From<MessageListing> for MessageResponse {
    fn from(listing: MessageListing) -> Self {
        let message = listing.message;
        Self {
            id: message.id.to_string(),
            sender: AuthorResponse {
                id: message.sender_id.to_string(),
                username: listing.sender_username,
                avatar: User::avatar_for_email(&listing.sender_email, LIST_AVATAR_SIZE),
            },
            recipient_id: message.recipient_id.to_string(),
            body: message.body,
            created_at: message.created_at.to_rfc3339(),
        }
    }
}

/// Sent message acknowledgement
#[derive(Debug, Serialize)]
pub struct SentMessageResponse {
    pub id: String,
    pub recipient_id: String,
    pub created_at: String,
}

/// Polled notification
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub name: String,
    pub data: serde_json::Value,
    pub timestamp: f64,
}

impl From<Notification> for NotificationResponse {
    fn from(n: Notification) -> Self {
        Self {
            name: n.name,
            data: n.payload,
            timestamp: n.timestamp,
        }
    }
}

/// Page of posts
pub fn post_page(page: Page<PostView>) -> Page<PostResponse> {
    page.map(PostResponse::from)
}

/// Page of users, emails hidden
pub fn user_page(page: Page<User>) -> Page<UserResponse> {
    page.map(|user| UserResponse::from_user(user, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::ParsedBody;
    use crate::domain::{Post, PostListing};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_post_response_serializes_segments() {
        let view = PostView {
            listing: PostListing {
                post: Post {
                    id: 12,
                    author_id: 3,
                    body: "hi @bob".into(),
                    parent_id: Some(9),
                    ..Post::default()
                },
                author_username: "alice".into(),
                author_email: "alice@example.com".into(),
                like_count: 2,
                comment_count: 0,
            },
            body: ParsedBody {
                segments: vec![
                    Segment::Text { text: "hi ".into() },
                    Segment::Mention {
                        text: "@bob".into(),
                        username: "bob".into(),
                        user_id: 7,
                    },
                ],
                mentions: BTreeMap::from([("@bob".to_string(), "bob".to_string())]),
            },
        };

        let json = serde_json::to_value(PostResponse::from(view)).unwrap();

        assert_eq!(json["id"], "12");
        assert_eq!(json["parent_id"], "9");
        assert_eq!(json["author"]["username"], "alice");
        assert_eq!(
            json["segments"],
            serde_json::json!([
                {"type": "text", "text": "hi "},
                {"type": "mention", "text": "@bob", "username": "bob", "user_id": "7"}
            ])
        );
        assert_eq!(json["mentions"]["@bob"], "bob");
    }

    #[test]
    fn test_user_response_hides_email_by_default() {
        let user = User {
            id: 5,
            username: "carol".into(),
            email: "carol@example.com".into(),
            ..User::default()
        };
        let json = serde_json::to_value(UserResponse::from_user(user, false)).unwrap();
        assert!(json.get("email").is_none());
        assert_eq!(json["id"], "5");
    }
}
