use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::catalog::PersonalityId;
use crate::session::id::IdGenerator;
use crate::session::types::{Session, SessionConfig, SessionSummary, Turn};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// The actor task has stopped; no further commands can be served.
    #[error("session registry is no longer running")]
    Closed,
}

/// Limits applied by the registry actor.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Idle time after which a session is removed by the sweeper.
    pub ttl: Duration,
    /// Live-session cap; reaching it on `create` triggers eviction.
    pub max_sessions: usize,
    /// Capacity of the command queue.
    pub queue_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(4 * 60 * 60),
            max_sessions: 100,
            queue_capacity: 256,
        }
    }
}

/// How `create` behaves when the registry is at its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    /// Evict least-recently-active sessions until a slot is free.
    Evict,
    /// Sweep expired sessions only; the cap may be exceeded. Used for
    /// short-lived internal sessions so they never displace a user's.
    Overflow,
}

/// Commands served by the registry actor.
#[derive(Debug)]
enum RegistryCommand {
    Create {
        personality: PersonalityId,
        config: SessionConfig,
        admission: Admission,
        reply_tx: oneshot::Sender<Session>,
    },
    Get {
        id: String,
        reply_tx: oneshot::Sender<Option<Session>>,
    },
    AppendExchange {
        id: String,
        user: Turn,
        assistant: Turn,
        processing_time: f64,
        reply_tx: oneshot::Sender<bool>,
    },
    Delete {
        id: String,
        reply_tx: oneshot::Sender<bool>,
    },
    DeleteAll {
        reply_tx: oneshot::Sender<usize>,
    },
    List {
        reply_tx: oneshot::Sender<Vec<SessionSummary>>,
    },
    Count {
        reply_tx: oneshot::Sender<usize>,
    },
    Distribution {
        reply_tx: oneshot::Sender<BTreeMap<PersonalityId, usize>>,
    },
    Sweep {
        now: DateTime<Utc>,
        reply_tx: oneshot::Sender<usize>,
    },
}

/// Handle to the session registry actor.
///
/// # Usage
///
/// ```rust,ignore
/// let registry = SessionRegistry::start(RegistryConfig::default());
/// let session = registry.create(PersonalityId::TechnicalExpert, SessionConfig::default()).await?;
/// let _sweeper = registry.spawn_sweeper(Duration::from_secs(1800));
/// ```
#[derive(Clone, Debug)]
pub struct SessionRegistry {
    tx: mpsc::Sender<RegistryCommand>,
}

impl SessionRegistry {
    /// Spawn the actor on the current tokio runtime and return a handle.
    pub fn start(config: RegistryConfig) -> Self {
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let state = RegistryState::new(config);
        tokio::spawn(Self::run_loop(rx, state));
        Self { tx }
    }

    async fn run_loop(mut rx: mpsc::Receiver<RegistryCommand>, mut state: RegistryState) {
        while let Some(cmd) = rx.recv().await {
            match cmd {
                RegistryCommand::Create {
                    personality,
                    config,
                    admission,
                    reply_tx,
                } => {
                    let session = state.admit(personality, config, admission, Utc::now());
                    let _ = reply_tx.send(session);
                }
                RegistryCommand::Get { id, reply_tx } => {
                    let _ = reply_tx.send(state.sessions.get(&id).cloned());
                }
                RegistryCommand::AppendExchange {
                    id,
                    user,
                    assistant,
                    processing_time,
                    reply_tx,
                } => {
                    let _ = reply_tx.send(state.append(&id, user, assistant, processing_time));
                }
                RegistryCommand::Delete { id, reply_tx } => {
                    let removed = state.sessions.remove(&id).is_some();
                    if removed {
                        debug!(session_id = %id, "session deleted");
                    }
                    let _ = reply_tx.send(removed);
                }
                RegistryCommand::DeleteAll { reply_tx } => {
                    let count = state.sessions.len();
                    state.sessions.clear();
                    info!(count, "all sessions cleared");
                    let _ = reply_tx.send(count);
                }
                RegistryCommand::List { reply_tx } => {
                    let _ = reply_tx.send(state.list());
                }
                RegistryCommand::Count { reply_tx } => {
                    let _ = reply_tx.send(state.sessions.len());
                }
                RegistryCommand::Distribution { reply_tx } => {
                    let _ = reply_tx.send(state.distribution());
                }
                RegistryCommand::Sweep { now, reply_tx } => {
                    let _ = reply_tx.send(state.sweep_expired(now));
                }
            }
        }
        debug!("session registry loop exited");
    }

    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> RegistryCommand,
    ) -> Result<T, RegistryError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| RegistryError::Closed)?;
        reply_rx.await.map_err(|_| RegistryError::Closed)
    }

    /// Create a session with an empty conversation.
    pub async fn create(
        &self,
        personality: PersonalityId,
        config: SessionConfig,
    ) -> Result<Session, RegistryError> {
        self.call(|reply_tx| RegistryCommand::Create {
            personality,
            config,
            admission: Admission::Evict,
            reply_tx,
        })
        .await
    }

    /// Create a short-lived session that never evicts another one.
    ///
    /// At the cap only expired sessions are swept, so the live count may
    /// briefly exceed the cap until the caller deletes this session.
    pub async fn create_ephemeral(
        &self,
        personality: PersonalityId,
        config: SessionConfig,
    ) -> Result<Session, RegistryError> {
        self.call(|reply_tx| RegistryCommand::Create {
            personality,
            config,
            admission: Admission::Overflow,
            reply_tx,
        })
        .await
    }

    /// Snapshot of a session, or `None` if it does not exist.
    pub async fn get(&self, id: &str) -> Result<Option<Session>, RegistryError> {
        let id = id.to_owned();
        self.call(|reply_tx| RegistryCommand::Get { id, reply_tx })
            .await
    }

    /// Append a user/assistant pair in one step.
    ///
    /// Returns `false` if the session no longer exists; nothing is appended
    /// in that case.
    pub async fn append_exchange(
        &self,
        id: &str,
        user: Turn,
        assistant: Turn,
        processing_time: f64,
    ) -> Result<bool, RegistryError> {
        let id = id.to_owned();
        self.call(|reply_tx| RegistryCommand::AppendExchange {
            id,
            user,
            assistant,
            processing_time,
            reply_tx,
        })
        .await
    }

    /// Returns `true` if a session was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, RegistryError> {
        let id = id.to_owned();
        self.call(|reply_tx| RegistryCommand::Delete { id, reply_tx })
            .await
    }

    /// Remove every session, returning how many were removed.
    pub async fn delete_all(&self) -> Result<usize, RegistryError> {
        self.call(|reply_tx| RegistryCommand::DeleteAll { reply_tx })
            .await
    }

    /// Summaries ordered by creation time, newest first.
    pub async fn list(&self) -> Result<Vec<SessionSummary>, RegistryError> {
        self.call(|reply_tx| RegistryCommand::List { reply_tx }).await
    }

    pub async fn count(&self) -> Result<usize, RegistryError> {
        self.call(|reply_tx| RegistryCommand::Count { reply_tx }).await
    }

    /// Number of live sessions per personality.
    pub async fn personality_distribution(
        &self,
    ) -> Result<BTreeMap<PersonalityId, usize>, RegistryError> {
        self.call(|reply_tx| RegistryCommand::Distribution { reply_tx })
            .await
    }

    /// Remove sessions idle for longer than the TTL as of `now`.
    pub async fn sweep_expired(&self, now: DateTime<Utc>) -> Result<usize, RegistryError> {
        self.call(|reply_tx| RegistryCommand::Sweep { now, reply_tx })
            .await
    }

    /// Run [`Self::sweep_expired`] every `every`, starting one period from now.
    ///
    /// The task stops on its own once the registry actor is gone.
    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + every;
            let mut ticker = tokio::time::interval_at(start, every);
            loop {
                ticker.tick().await;
                match registry.sweep_expired(Utc::now()).await {
                    Ok(0) => debug!("expiry sweep: nothing to remove"),
                    Ok(removed) => info!(removed, "expiry sweep removed idle sessions"),
                    Err(e) => {
                        warn!(error = %e, "expiry sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

// ── Actor-owned state ─────────────────────────────────────────────────────────

/// The session map and its bookkeeping. Only the actor loop touches this.
#[derive(Debug)]
struct RegistryState {
    sessions: HashMap<String, Session>,
    ids: IdGenerator,
    ttl: TimeDelta,
    max_sessions: usize,
}

impl RegistryState {
    fn new(config: RegistryConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            ids: IdGenerator::default(),
            ttl: TimeDelta::from_std(config.ttl).unwrap_or(TimeDelta::MAX),
            max_sessions: config.max_sessions.max(1),
        }
    }

    #[cfg(test)]
    fn create(
        &mut self,
        personality: PersonalityId,
        config: SessionConfig,
        now: DateTime<Utc>,
    ) -> Session {
        self.admit(personality, config, Admission::Evict, now)
    }

    fn admit(
        &mut self,
        personality: PersonalityId,
        config: SessionConfig,
        admission: Admission,
        now: DateTime<Utc>,
    ) -> Session {
        if self.sessions.len() >= self.max_sessions {
            match admission {
                Admission::Evict => self.make_room(now),
                Admission::Overflow => {
                    self.sweep_expired(now);
                }
            }
        }

        let id = loop {
            let candidate = self.ids.next(now);
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Session::new(id.clone(), personality, config, now);
        self.sessions.insert(id.clone(), session.clone());
        info!(session_id = %id, %personality, "session created");
        session
    }

    /// Sweep expired sessions, then evict the least recently active ones
    /// until a slot is free.
    fn make_room(&mut self, now: DateTime<Utc>) {
        self.sweep_expired(now);
        while self.sessions.len() >= self.max_sessions {
            let Some(oldest) = self
                .sessions
                .values()
                .min_by_key(|s| s.last_activity)
                .map(|s| s.id.clone())
            else {
                break;
            };
            self.sessions.remove(&oldest);
            info!(session_id = %oldest, "session evicted at capacity");
        }
    }

    fn append(&mut self, id: &str, user: Turn, assistant: Turn, processing_time: f64) -> bool {
        let Some(session) = self.sessions.get_mut(id) else {
            return false;
        };
        session.last_activity = assistant.timestamp;
        session.conversation.push(user);
        session.conversation.push(assistant);
        session.stats.total_messages += 2;
        session.stats.total_processing_time += processing_time;
        session.stats.request_count += 1;
        true
    }

    fn list(&self) -> Vec<SessionSummary> {
        let mut out: Vec<SessionSummary> = self.sessions.values().map(Session::summary).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out
    }

    fn distribution(&self) -> BTreeMap<PersonalityId, usize> {
        let mut out = BTreeMap::new();
        for session in self.sessions.values() {
            *out.entry(session.personality).or_insert(0) += 1;
        }
        out
    }

    fn sweep_expired(&mut self, now: DateTime<Utc>) -> usize {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, s| now.signed_duration_since(s.last_activity) <= ttl);
        let removed = before - self.sessions.len();
        if removed > 0 {
            info!(removed, remaining = self.sessions.len(), "expired sessions removed");
        }
        removed
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod test {
    use super::*;
    use crate::catalog::TechniqueId;
    use crate::generation::ResponseSource;
    use std::collections::HashSet;
    use tracing_test::traced_test;

    fn small_config(max_sessions: usize) -> RegistryConfig {
        RegistryConfig {
            ttl: Duration::from_secs(60),
            max_sessions,
            queue_capacity: 16,
        }
    }

    fn exchange(at: DateTime<Utc>) -> (Turn, Turn) {
        (
            Turn::user("hi", TechniqueId::Standard, at),
            Turn::assistant(
                "hello",
                PersonalityId::TechnicalExpert,
                0.01,
                ResponseSource::Keyword,
                at,
            ),
        )
    }

    #[tokio::test]
    async fn create_then_get_returns_empty_conversation() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        let created = registry
            .create(PersonalityId::CreativePartner, SessionConfig::default())
            .await
            .unwrap();

        let fetched = registry.get(&created.id).await.unwrap().expect("session exists");
        assert_eq!(fetched.personality, PersonalityId::CreativePartner);
        assert!(fetched.conversation.is_empty());
        assert_eq!(fetched.stats.total_messages, 0);
    }

    #[tokio::test]
    async fn created_ids_are_unique() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        let mut seen = HashSet::new();
        for _ in 0..50 {
            let s = registry
                .create(PersonalityId::TechnicalExpert, SessionConfig::default())
                .await
                .unwrap();
            assert!(seen.insert(s.id));
        }
    }

    #[tokio::test]
    async fn delete_all_empties_registry() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        let mut ids = Vec::new();
        for _ in 0..3 {
            let s = registry
                .create(PersonalityId::BusinessAdvisor, SessionConfig::default())
                .await
                .unwrap();
            ids.push(s.id);
        }

        assert_eq!(registry.delete_all().await.unwrap(), 3);
        assert_eq!(registry.count().await.unwrap(), 0);
        for id in ids {
            assert!(registry.get(&id).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn delete_reports_whether_removed() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        let s = registry
            .create(PersonalityId::TechnicalExpert, SessionConfig::default())
            .await
            .unwrap();
        assert!(registry.delete(&s.id).await.unwrap());
        assert!(!registry.delete(&s.id).await.unwrap());
    }

    #[tokio::test]
    async fn append_updates_history_and_stats() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        let s = registry
            .create(PersonalityId::TechnicalExpert, SessionConfig::default())
            .await
            .unwrap();
        let (user, assistant) = exchange(Utc::now());

        assert!(registry.append_exchange(&s.id, user, assistant, 0.25).await.unwrap());
        let s = registry.get(&s.id).await.unwrap().unwrap();
        assert_eq!(s.conversation.len(), 2);
        assert_eq!(s.stats.total_messages, 2);
        assert_eq!(s.stats.request_count, 1);
        assert!((s.stats.total_processing_time - 0.25).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn append_to_missing_session_is_rejected() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        let (user, assistant) = exchange(Utc::now());
        assert!(!registry
            .append_exchange("session_0_deadbeef", user, assistant, 0.0)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn sweep_removes_only_after_ttl() {
        let registry = SessionRegistry::start(small_config(100));
        let s = registry
            .create(PersonalityId::TechnicalExpert, SessionConfig::default())
            .await
            .unwrap();

        let at_ttl = s.last_activity + TimeDelta::seconds(60);
        assert_eq!(registry.sweep_expired(at_ttl).await.unwrap(), 0);
        assert!(registry.get(&s.id).await.unwrap().is_some());

        let past_ttl = at_ttl + TimeDelta::seconds(1);
        assert_eq!(registry.sweep_expired(past_ttl).await.unwrap(), 1);
        assert!(registry.get(&s.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn sweeper_removes_idle_sessions_on_its_own() {
        let registry = SessionRegistry::start(RegistryConfig {
            ttl: Duration::ZERO,
            ..small_config(100)
        });
        let s = registry
            .create(PersonalityId::TechnicalExpert, SessionConfig::default())
            .await
            .unwrap();

        let sweeper = registry.spawn_sweeper(Duration::from_millis(50));
        // The first sweep runs one period after spawning.
        assert!(registry.get(&s.id).await.unwrap().is_some());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(registry.get(&s.id).await.unwrap().is_none());
        assert_eq!(registry.count().await.unwrap(), 0);
        sweeper.abort();
    }

    #[tokio::test]
    async fn distribution_counts_by_personality() {
        let registry = SessionRegistry::start(RegistryConfig::default());
        for p in [
            PersonalityId::TechnicalExpert,
            PersonalityId::TechnicalExpert,
            PersonalityId::LearningTutor,
        ] {
            registry.create(p, SessionConfig::default()).await.unwrap();
        }
        let dist = registry.personality_distribution().await.unwrap();
        assert_eq!(dist.get(&PersonalityId::TechnicalExpert), Some(&2));
        assert_eq!(dist.get(&PersonalityId::LearningTutor), Some(&1));
        assert_eq!(dist.get(&PersonalityId::CreativePartner), None);
    }

    #[test]
    fn cap_prefers_expired_sessions() {
        let mut state = RegistryState::new(small_config(2));
        let t0 = Utc::now();
        let stale = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t0);
        let t1 = t0 + TimeDelta::seconds(50);
        let fresh = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t1);

        // stale is 70s idle, fresh 20s: only stale has expired.
        let t2 = t0 + TimeDelta::seconds(70);
        let newest = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t2);

        assert!(!state.sessions.contains_key(&stale.id));
        assert!(state.sessions.contains_key(&fresh.id));
        assert!(state.sessions.contains_key(&newest.id));
    }

    #[test]
    #[traced_test]
    fn cap_evicts_least_recently_active_when_nothing_expired() {
        let mut state = RegistryState::new(small_config(2));
        let t0 = Utc::now();
        let first = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t0);
        let second = state.create(
            PersonalityId::TechnicalExpert,
            SessionConfig::default(),
            t0 + TimeDelta::seconds(1),
        );
        // Activity on `first` makes `second` the least recently active.
        let (user, assistant) = exchange(t0 + TimeDelta::seconds(2));
        assert!(state.append(&first.id, user, assistant, 0.0));

        let third = state.create(
            PersonalityId::TechnicalExpert,
            SessionConfig::default(),
            t0 + TimeDelta::seconds(3),
        );
        assert_eq!(state.sessions.len(), 2);
        assert!(state.sessions.contains_key(&first.id));
        assert!(!state.sessions.contains_key(&second.id));
        assert!(state.sessions.contains_key(&third.id));
        assert!(logs_contain("session evicted at capacity"));
    }

    #[test]
    fn ephemeral_create_at_cap_evicts_nobody() {
        let mut state = RegistryState::new(small_config(2));
        let t0 = Utc::now();
        let a = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t0);
        let b = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t0);

        let t1 = t0 + TimeDelta::seconds(1);
        let temp = state.admit(
            PersonalityId::HelpfulAssistant,
            SessionConfig::default(),
            Admission::Overflow,
            t1,
        );
        assert_eq!(state.sessions.len(), 3);
        assert!(state.sessions.contains_key(&a.id));
        assert!(state.sessions.contains_key(&b.id));
        assert!(state.sessions.contains_key(&temp.id));

        // A regular create brings the count back under the cap.
        state.sessions.remove(&temp.id);
        let c = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t1);
        assert_eq!(state.sessions.len(), 2);
        assert!(state.sessions.contains_key(&c.id));
    }

    #[test]
    fn ephemeral_create_still_sweeps_expired() {
        let mut state = RegistryState::new(small_config(1));
        let t0 = Utc::now();
        let stale = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t0);
        let temp = state.admit(
            PersonalityId::HelpfulAssistant,
            SessionConfig::default(),
            Admission::Overflow,
            t0 + TimeDelta::seconds(61),
        );
        assert!(!state.sessions.contains_key(&stale.id));
        assert!(state.sessions.contains_key(&temp.id));
    }

    #[test]
    fn list_is_newest_first() {
        let mut state = RegistryState::new(small_config(10));
        let t0 = Utc::now();
        let a = state.create(PersonalityId::TechnicalExpert, SessionConfig::default(), t0);
        let b = state.create(
            PersonalityId::CreativePartner,
            SessionConfig::default(),
            t0 + TimeDelta::seconds(1),
        );
        let listed: Vec<String> = state.list().into_iter().map(|s| s.session_id).collect();
        assert_eq!(listed, vec![b.id, a.id]);
    }
}
