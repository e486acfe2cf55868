//! In-memory store implementation.
//!
//! Used by the server binary and by tests. All tables live in ordered maps
//! keyed by monotonically increasing ids, so "newest first" is simply
//! reverse id order.

use std::collections::{BTreeMap, HashMap};

use bashstory_types::error::{BashError, Result};
use chrono::{DateTime, Duration, Utc};
use rand::seq::IteratorRandom;

use crate::credentials::{Credential, session_token};
use crate::{
    Quote, QuoteId, QuoteStatus, Role, Store, User, UserId, VoteDirection, VoteOutcome, Voter,
};

/// Quotes seeded alongside the admin account.
const SAMPLE_QUOTES: &[&str] = &[
    "Programming is the art of telling a computer what to do.",
    "The best code is the code that was never written.",
    "First rule of programming: if it works, don't touch it.",
    "Code is written once and read a thousand times.",
    "In theory, theory and practice are the same. In practice, they are not.",
    "Any sufficiently advanced technology is indistinguishable from magic.",
    "Computers are useless. They can only give you answers. -- Picasso",
    "The biggest mistake is being afraid to make one.",
    "Unix is simple. It just takes a genius to understand its simplicity.",
    "There are two ways to write error-free programs. Only the third one works.",
];

#[derive(Debug)]
struct Account {
    user: User,
    credential: Credential,
}

#[derive(Debug, Clone)]
struct QuoteRow {
    text: String,
    author: UserId,
    status: QuoteStatus,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct SessionRow {
    user: UserId,
    created_at: DateTime<Utc>,
}

/// Session lifetime when none is configured, matching the cookie default.
const DEFAULT_SESSION_TTL_SECS: u64 = 7 * 24 * 3600;

/// Upper bound on a configured lifetime, well inside chrono's range.
const MAX_SESSION_TTL_SECS: u64 = 100 * 365 * 24 * 3600;

fn ttl_from_secs(secs: u64) -> Duration {
    Duration::seconds(secs.min(MAX_SESSION_TTL_SECS) as i64)
}

/// A fully in-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    accounts: BTreeMap<UserId, Account>,
    by_name: HashMap<String, UserId>,
    sessions: HashMap<String, SessionRow>,
    session_ttl: Duration,
    quotes: BTreeMap<QuoteId, QuoteRow>,
    votes: HashMap<QuoteId, HashMap<Voter, i64>>,
    next_user: UserId,
    next_quote: QuoteId,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            accounts: BTreeMap::new(),
            by_name: HashMap::new(),
            sessions: HashMap::new(),
            session_ttl: ttl_from_secs(DEFAULT_SESSION_TTL_SECS),
            quotes: BTreeMap::new(),
            votes: HashMap::new(),
            next_user: 1,
            next_quote: 1,
        }
    }

    /// Create a store holding an `admin`/`admin` account and the sample
    /// quotes, all approved.
    pub fn seeded() -> Result<Self> {
        let mut store = Self::new();
        let admin = store.create_user("admin", "admin")?;
        store.set_role(admin.id, Role::Admin)?;
        for text in SAMPLE_QUOTES {
            let id = store.insert_quote(text, admin.id)?;
            store.set_status(id, QuoteStatus::Approved)?;
        }
        log::info!("Seeded store with admin account and {} quotes", SAMPLE_QUOTES.len());
        Ok(store)
    }

    /// Sessions older than `secs` stop resolving and are pruned on the next
    /// `create_session`.
    pub fn with_session_ttl(mut self, secs: u64) -> Self {
        self.session_ttl = ttl_from_secs(secs);
        self
    }

    /// Change a user's role.
    pub fn set_role(&mut self, id: UserId, role: Role) -> Result<()> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| BashError::Store(format!("no such user id: {id}")))?;
        account.user.role = role;
        Ok(())
    }

    /// Number of stored sessions, expired ones included until pruned.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn is_expired(&self, row: &SessionRow, now: DateTime<Utc>) -> bool {
        now - row.created_at >= self.session_ttl
    }

    fn prune_sessions(&mut self, now: DateTime<Utc>) {
        let before = self.sessions.len();
        let ttl = self.session_ttl;
        self.sessions.retain(|_, row| now - row.created_at < ttl);
        let pruned = before - self.sessions.len();
        if pruned > 0 {
            log::debug!("pruned {pruned} expired sessions");
        }
    }

    /// Number of registered users.
    pub fn user_count(&self) -> usize {
        self.accounts.len()
    }

    fn rating(&self, id: QuoteId) -> i64 {
        self.votes.get(&id).map_or(0, |v| v.values().sum())
    }

    fn materialize(&self, id: QuoteId, row: &QuoteRow) -> Quote {
        let author = self
            .accounts
            .get(&row.author)
            .map_or_else(|| "unknown".to_string(), |a| a.user.username.clone());
        Quote {
            id,
            text: row.text.clone(),
            author,
            status: row.status,
            rating: self.rating(id),
            created_at: row.created_at,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Store for MemoryStore {
    fn find_user(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .by_name
            .get(username)
            .and_then(|id| self.accounts.get(id))
            .map(|a| a.user.clone()))
    }

    fn create_user(&mut self, username: &str, password: &str) -> Result<User> {
        if self.by_name.contains_key(username) {
            return Err(BashError::Store(format!("username taken: {username}")));
        }
        let id = self.next_user;
        self.next_user += 1;
        let user = User {
            id,
            username: username.to_string(),
            role: Role::User,
            created_at: Utc::now(),
        };
        self.by_name.insert(username.to_string(), id);
        self.accounts.insert(
            id,
            Account {
                user: user.clone(),
                credential: Credential::new(password),
            },
        );
        Ok(user)
    }

    fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        Ok(self
            .by_name
            .get(username)
            .and_then(|id| self.accounts.get(id))
            .filter(|a| a.credential.verify(password))
            .map(|a| a.user.clone()))
    }

    fn set_password(&mut self, id: UserId, password: &str) -> Result<()> {
        let account = self
            .accounts
            .get_mut(&id)
            .ok_or_else(|| BashError::Store(format!("no such user id: {id}")))?;
        account.credential = Credential::new(password);
        Ok(())
    }

    fn create_session(&mut self, user: UserId) -> Result<String> {
        if !self.accounts.contains_key(&user) {
            return Err(BashError::Store(format!("no such user id: {user}")));
        }
        let now = Utc::now();
        self.prune_sessions(now);
        let token = session_token();
        self.sessions.insert(
            token.clone(),
            SessionRow {
                user,
                created_at: now,
            },
        );
        Ok(token)
    }

    fn session_user(&self, token: &str) -> Result<Option<User>> {
        let now = Utc::now();
        Ok(self
            .sessions
            .get(token)
            .filter(|row| !self.is_expired(row, now))
            .and_then(|row| self.accounts.get(&row.user))
            .map(|a| a.user.clone()))
    }

    fn delete_session(&mut self, token: &str) -> Result<()> {
        self.sessions.remove(token);
        Ok(())
    }

    fn quote(&self, id: QuoteId) -> Result<Option<Quote>> {
        Ok(self.quotes.get(&id).map(|row| self.materialize(id, row)))
    }

    fn quotes(&self, status: QuoteStatus, limit: usize) -> Result<Vec<Quote>> {
        Ok(self
            .quotes
            .iter()
            .rev()
            .filter(|(_, row)| row.status == status)
            .take(limit)
            .map(|(id, row)| self.materialize(*id, row))
            .collect())
    }

    fn search(&self, needle: &str, limit: usize) -> Result<Vec<Quote>> {
        let needle = needle.to_lowercase();
        Ok(self
            .quotes
            .iter()
            .rev()
            .filter(|(_, row)| row.status == QuoteStatus::Approved)
            .filter(|(_, row)| row.text.to_lowercase().contains(&needle))
            .take(limit)
            .map(|(id, row)| self.materialize(*id, row))
            .collect())
    }

    fn random_quote(&self) -> Result<Option<Quote>> {
        Ok(self
            .quotes
            .iter()
            .filter(|(_, row)| row.status == QuoteStatus::Approved)
            .choose(&mut rand::thread_rng())
            .map(|(id, row)| self.materialize(*id, row)))
    }

    fn insert_quote(&mut self, text: &str, author: UserId) -> Result<QuoteId> {
        if !self.accounts.contains_key(&author) {
            return Err(BashError::Store(format!("no such user id: {author}")));
        }
        let id = self.next_quote;
        self.next_quote += 1;
        self.quotes.insert(
            id,
            QuoteRow {
                text: text.to_string(),
                author,
                status: QuoteStatus::Pending,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    fn set_status(&mut self, id: QuoteId, status: QuoteStatus) -> Result<bool> {
        match self.quotes.get_mut(&id) {
            Some(row) => {
                row.status = status;
                Ok(true)
            },
            None => Ok(false),
        }
    }

    fn vote(&mut self, id: QuoteId, voter: &Voter, direction: VoteDirection) -> Result<VoteOutcome> {
        match self.quotes.get(&id) {
            Some(row) if row.status == QuoteStatus::Approved => {},
            _ => return Ok(VoteOutcome::NotFound),
        }
        let ballots = self.votes.entry(id).or_default();
        if ballots.contains_key(voter) {
            return Ok(VoteOutcome::AlreadyVoted);
        }
        ballots.insert(voter.clone(), direction.value());
        Ok(VoteOutcome::Counted(self.rating(id)))
    }
}
