//! Data store abstraction for bashstory.
//!
//! The resolver and its handlers only ever see the [`Store`] trait, passed
//! in explicitly, so tests and the server can substitute implementations.
//! [`MemoryStore`] is the in-process implementation.

pub mod credentials;
pub mod memory;

pub use memory::MemoryStore;

use bashstory_types::error::Result;
use chrono::{DateTime, Utc};

pub type UserId = u64;
pub type QuoteId = u64;

/// Account role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Moderator,
    Admin,
}

impl Role {
    /// Moderators and admins may run the moderation queue commands.
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Moderator | Self::Admin)
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Moderation state of a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteStatus {
    Pending,
    Approved,
    Rejected,
}

impl QuoteStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A quote with its aggregated rating.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: String,
    pub status: QuoteStatus,
    /// Sum of all votes.
    pub rating: i64,
    pub created_at: DateTime<Utc>,
}

/// Identity a vote is recorded under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Voter {
    User(UserId),
    /// Anonymous voters are keyed by origin address.
    Address(String),
}

/// Vote direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Up),
            "-" => Some(Self::Down),
            _ => None,
        }
    }

    pub fn value(self) -> i64 {
        match self {
            Self::Up => 1,
            Self::Down => -1,
        }
    }
}

/// Result of a vote attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteOutcome {
    /// Vote recorded; carries the new rating.
    Counted(i64),
    /// This voter already voted on the quote. Nothing changed.
    AlreadyVoted,
    /// No approved quote with that id.
    NotFound,
}

/// Persistent collaborator exposing create/read/update operations keyed by
/// opaque identifiers.
///
/// Domain outcomes (no such user, duplicate vote) are values. `Err` is
/// reserved for storage faults.
pub trait Store: Send {
    // -- Users --

    /// Look up a user by name (case-sensitive).
    fn find_user(&self, username: &str) -> Result<Option<User>>;

    /// Create a user with role `User`. Fails if the name is taken.
    fn create_user(&mut self, username: &str, password: &str) -> Result<User>;

    /// Return the user when `password` matches.
    fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>>;

    fn set_password(&mut self, id: UserId, password: &str) -> Result<()>;

    // -- Sessions --

    /// Issue a new opaque session token for `user`.
    fn create_session(&mut self, user: UserId) -> Result<String>;

    /// Resolve a token to its user, if the session exists.
    fn session_user(&self, token: &str) -> Result<Option<User>>;

    fn delete_session(&mut self, token: &str) -> Result<()>;

    // -- Quotes --

    fn quote(&self, id: QuoteId) -> Result<Option<Quote>>;

    /// Quotes with `status`, newest first, at most `limit`.
    fn quotes(&self, status: QuoteStatus, limit: usize) -> Result<Vec<Quote>>;

    /// Approved quotes containing `needle` (case-insensitive), newest first.
    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>>;

    /// A uniformly random approved quote.
    fn random_quote(&self) -> Result<Option<Quote>>;

    /// Store a new `Pending` quote and return its id.
    fn insert_quote(&mut self, text: &str, author: UserId) -> Result<QuoteId>;

    /// Change a quote's status. Returns `false` when the id is unknown.
    fn set_status(&mut self, id: QuoteId, status: QuoteStatus) -> Result<bool>;

    // -- Votes --

    /// Record one vote per voter per approved quote.
    fn vote(&mut self, id: QuoteId, voter: &Voter, direction: VoteDirection) -> Result<VoteOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn privileged_roles() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::Moderator.is_privileged());
        assert!(!Role::User.is_privileged());
    }

    #[test]
    fn vote_direction_parse() {
        assert_eq!(VoteDirection::parse("+"), Some(VoteDirection::Up));
        assert_eq!(VoteDirection::parse("-"), Some(VoteDirection::Down));
        assert_eq!(VoteDirection::parse("up"), None);
        assert_eq!(VoteDirection::Down.value(), -1);
    }
}
