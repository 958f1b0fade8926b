//! Bounded, indexed cache of search sessions.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::policy::{Clock, EvictionPolicy, FifoEviction, SystemClock};
use crate::config::StoreConfig;
use crate::models::{JobBrief, JobReference, JobSummary, SearchSession, NOT_AVAILABLE};

/// Points at one job inside a retained session.
#[derive(Debug, Clone)]
struct IndexEntry {
    session: Arc<SearchSession>,
    position: usize,
}

impl IndexEntry {
    fn job(&self) -> &JobSummary {
        &self.session.jobs[self.position]
    }
}

/// Sessions plus the two derived indices. Only mutated under the write lock.
#[derive(Debug, Default)]
struct StoreState {
    sessions: HashMap<String, Arc<SearchSession>>,
    order: VecDeque<String>,
    by_sequence: HashMap<u32, IndexEntry>,
    by_external_id: HashMap<String, IndexEntry>,
}

impl StoreState {
    fn index_session(&mut self, session: &Arc<SearchSession>) {
        for (position, job) in session.jobs.iter().enumerate() {
            let entry = IndexEntry {
                session: Arc::clone(session),
                position,
            };
            if let Some(ref id) = job.external_id {
                self.by_external_id.insert(id.clone(), entry.clone());
            }
            self.by_sequence.insert(job.sequence_number, entry);
        }
    }

    /// Rebuilds both indices from retained sessions, oldest first, so newer
    /// sessions win on colliding keys.
    fn rebuild_indices(&mut self) {
        self.by_sequence.clear();
        self.by_external_id.clear();
        let ordered: Vec<_> = self
            .order
            .iter()
            .filter_map(|id| self.sessions.get(id).cloned())
            .collect();
        for session in &ordered {
            self.index_session(session);
        }
    }

    fn remove(&mut self, ids: &HashSet<String>) {
        self.order.retain(|id| !ids.contains(id));
        for id in ids {
            self.sessions.remove(id);
        }
    }
}

/// What a [`ResultStore::put`] changed besides inserting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutReport {
    /// Sessions removed by the eviction policy.
    pub evicted: Vec<String>,
    /// Sessions removed because their TTL had passed.
    pub expired: Vec<String>,
}

/// Holds the most recent search sessions and indexes their jobs by
/// sequence number and external id.
///
/// Insertion, expiry, eviction and index maintenance happen in one write
/// lock scope, so readers never see a session without its index entries or
/// an index entry whose session is gone.
#[derive(Debug)]
pub struct ResultStore {
    capacity: usize,
    ttl: Option<chrono::Duration>,
    clock: Arc<dyn Clock>,
    policy: Arc<dyn EvictionPolicy>,
    state: RwLock<StoreState>,
}

impl Default for ResultStore {
    fn default() -> Self {
        Self::from_config(&StoreConfig::default())
    }
}

impl ResultStore {
    /// Creates a FIFO store holding at most `capacity` sessions.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl: None,
            clock: Arc::new(SystemClock),
            policy: Arc::new(FifoEviction),
            state: RwLock::new(StoreState::default()),
        }
    }

    /// Creates a store from configuration.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        let store = Self::new(config.capacity);
        match config.session_ttl() {
            Some(ttl) => store.with_ttl(ttl),
            None => store,
        }
    }

    /// Sets the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets the eviction policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn EvictionPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Expires sessions older than `ttl`.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = chrono::Duration::from_std(ttl).ok();
        self
    }

    /// Maximum number of retained sessions.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// The store's clock, shared with session builders.
    #[must_use]
    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    fn is_live(&self, session: &SearchSession, now: DateTime<Utc>) -> bool {
        self.ttl.map_or(true, |ttl| session.created_at + ttl > now)
    }

    fn expired_ids(&self, state: &StoreState, now: DateTime<Utc>) -> Vec<String> {
        state
            .order
            .iter()
            .filter(|id| {
                state
                    .sessions
                    .get(*id)
                    .is_some_and(|s| !self.is_live(s, now))
            })
            .cloned()
            .collect()
    }

    /// Inserts a session, then applies expiry and eviction.
    ///
    /// A session whose id is already stored replaces the old one.
    pub fn put(&self, session: SearchSession) -> PutReport {
        let session = Arc::new(session);
        let now = self.clock.now();
        let mut state = self.state.write();

        let expired = self.expired_ids(&state, now);
        let replaced = state.sessions.contains_key(&session.session_id);

        let mut removed: HashSet<String> = expired.iter().cloned().collect();
        if replaced {
            removed.insert(session.session_id.clone());
        }
        state.remove(&removed);

        state
            .sessions
            .insert(session.session_id.clone(), Arc::clone(&session));
        state.order.push_back(session.session_id.clone());

        let evicted = self.policy.select_victims(&state.order, self.capacity);
        state.remove(&evicted.iter().cloned().collect());

        if removed.is_empty() && evicted.is_empty() {
            state.index_session(&session);
        } else {
            state.rebuild_indices();
        }

        if !evicted.is_empty() {
            info!(
                policy = self.policy.name(),
                evicted = ?evicted,
                retained = state.order.len(),
                "Evicted search sessions"
            );
        }
        if !expired.is_empty() {
            debug!(expired = ?expired, "Purged expired search sessions");
        }

        PutReport { evicted, expired }
    }

    /// Removes sessions whose TTL has passed; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let now = self.clock.now();
        let mut state = self.state.write();
        let expired = self.expired_ids(&state, now);
        if !expired.is_empty() {
            state.remove(&expired.iter().cloned().collect());
            state.rebuild_indices();
            debug!(expired = ?expired, "Purged expired search sessions");
        }
        expired.len()
    }

    /// Looks up a job by sequence number across retained sessions.
    ///
    /// Sequence numbers repeat between sessions; the newest session wins.
    #[must_use]
    pub fn lookup_by_sequence(&self, sequence_number: u32) -> Option<JobSummary> {
        let now = self.clock.now();
        let state = self.state.read();
        state
            .by_sequence
            .get(&sequence_number)
            .filter(|entry| self.is_live(&entry.session, now))
            .map(|entry| entry.job().clone())
    }

    /// Looks up a job by its external id.
    #[must_use]
    pub fn lookup_by_external_id(&self, external_id: &str) -> Option<JobSummary> {
        let now = self.clock.now();
        let state = self.state.read();
        state
            .by_external_id
            .get(external_id.trim())
            .filter(|entry| self.is_live(&entry.session, now))
            .map(|entry| entry.job().clone())
    }

    /// Looks up a job by sequence number within one session.
    #[must_use]
    pub fn lookup_in_session(&self, session_id: &str, sequence_number: u32) -> Option<JobSummary> {
        self.get_session(session_id)
            .and_then(|session| session.job(sequence_number).cloned())
    }

    /// Returns a retained, unexpired session.
    #[must_use]
    pub fn get_session(&self, session_id: &str) -> Option<Arc<SearchSession>> {
        let now = self.clock.now();
        let state = self.state.read();
        state
            .sessions
            .get(session_id)
            .filter(|s| self.is_live(s, now))
            .cloned()
    }

    /// The most recently inserted unexpired session.
    #[must_use]
    pub fn recent_session(&self) -> Option<Arc<SearchSession>> {
        let now = self.clock.now();
        let state = self.state.read();
        state
            .order
            .iter()
            .rev()
            .filter_map(|id| state.sessions.get(id))
            .find(|s| self.is_live(s, now))
            .cloned()
    }

    /// Ids of unexpired sessions, oldest first.
    #[must_use]
    pub fn session_ids(&self) -> Vec<String> {
        let now = self.clock.now();
        let state = self.state.read();
        state
            .order
            .iter()
            .filter(|id| {
                state
                    .sessions
                    .get(*id)
                    .is_some_and(|s| self.is_live(s, now))
            })
            .cloned()
            .collect()
    }

    /// Number of unexpired sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.session_ids().len()
    }

    /// Whether no unexpired session is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Jobs currently reachable by sequence number, in sequence order.
    #[must_use]
    pub fn available(&self) -> Vec<JobBrief> {
        let now = self.clock.now();
        let state = self.state.read();
        let mut briefs: Vec<JobBrief> = state
            .by_sequence
            .values()
            .filter(|entry| self.is_live(&entry.session, now))
            .map(|entry| entry.job().brief())
            .collect();
        briefs.sort_by_key(|b| b.sequence_number);
        briefs
    }

    /// One-line description of a session.
    #[must_use]
    pub fn session_summary(&self, session_id: &str) -> Option<String> {
        self.get_session(session_id).map(|session| {
            let short_id: String = session.session_id.chars().take(8).collect();
            let p = &session.parameters;
            format!(
                "Session {short_id}: '{}' near '{}' within {} miles ({}), {} jobs, created {}",
                p.job_title,
                p.location,
                p.radius_miles,
                p.recency,
                session.jobs.len(),
                session.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            )
        })
    }

    /// Finds a job by free text in `session_id`, or in the most recent session.
    ///
    /// Tries a title match, then a company match, then any shared title word.
    #[must_use]
    pub fn find_in_session(&self, session_id: Option<&str>, text: &str) -> Option<JobSummary> {
        let session = match session_id {
            Some(id) => self.get_session(id)?,
            None => self.recent_session()?,
        };
        find_by_text(&session.jobs, text).cloned()
    }

    /// Resolves a reference: external id, then sequence number, then text.
    #[must_use]
    pub fn resolve(&self, reference: &JobReference) -> Option<JobSummary> {
        let session_id = reference.session_id.as_deref();

        let by_external_id = || {
            reference
                .external_id
                .as_deref()
                .filter(|id| !id.trim().is_empty())
                .and_then(|id| self.lookup_by_external_id(id))
        };
        let by_sequence = || {
            reference.sequence_number.and_then(|n| match session_id {
                Some(id) => self.lookup_in_session(id, n),
                None => self.lookup_by_sequence(n),
            })
        };
        let by_text = || {
            reference
                .text
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .and_then(|t| self.find_in_session(session_id, t))
        };

        by_external_id().or_else(by_sequence).or_else(by_text)
    }
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(str::to_string)
        .collect()
}

fn find_by_text<'a>(jobs: &'a [JobSummary], text: &str) -> Option<&'a JobSummary> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }
    let mutual = |field: &str| {
        if field.is_empty() || field == NOT_AVAILABLE {
            return false;
        }
        let field = field.to_lowercase();
        field.contains(&needle) || needle.contains(&field)
    };

    jobs.iter()
        .find(|j| mutual(&j.title))
        .or_else(|| jobs.iter().find(|j| mutual(&j.company)))
        .or_else(|| {
            let query_words = words(&needle);
            jobs.iter()
                .find(|j| words(&j.title).iter().any(|w| query_words.contains(w)))
        })
}
