use crate::core::{
    model::Turn,
    service::chat::{ChatService, Reply},
    session::SessionStore,
};
use crate::{err, error::GroundedError, map_err};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};
use uuid::Uuid;

type SessionHandle = Arc<Mutex<SessionStore>>;

#[derive(Debug)]
struct Entry {
    session: SessionHandle,
    last_active: Instant,
}

/// Holds the transcripts of all live sessions.
///
/// Every session is locked separately so questions in different sessions
/// are answered concurrently. A session answers one question at a time and
/// rejects others with [SessionBusy][crate::error::GroundedErr::SessionBusy]
/// instead of queueing them.
#[derive(Debug, Default, Clone)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<Uuid, Entry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session with an empty transcript.
    pub fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let entry = Entry {
            session: SessionHandle::default(),
            last_active: Instant::now(),
        };
        self.write().insert(id, entry);
        info!("Created session {id}");
        id
    }

    /// Drop the session and its transcript.
    pub fn remove(&self, id: Uuid) -> Result<(), GroundedError> {
        if self.write().remove(&id).is_none() {
            return err!(DoesNotExist, "Session '{id}'");
        }
        info!("Removed session {id}");
        Ok(())
    }

    /// A snapshot of the session's transcript.
    /// Errors with `SessionBusy` while the session is answering a question.
    pub fn transcript(&self, id: Uuid) -> Result<Vec<Turn>, GroundedError> {
        let session = self.get(id)?;

        let Ok(session) = session.try_lock() else {
            debug!("Session {id} is busy");
            return err!(SessionBusy, "{id}");
        };

        Ok(session.turns().to_vec())
    }

    /// Answer `question` in the session identified by `id`.
    /// Returns the reply and a snapshot of the transcript after the exchange.
    ///
    /// The turn runs on its own task which owns the session lock, so it completes
    /// and leaves both turns in the transcript even if the returned future is dropped.
    pub async fn ask(
        &self,
        chat: &ChatService,
        id: Uuid,
        question: &str,
    ) -> Result<(Reply, Vec<Turn>), GroundedError> {
        let session = self.get(id)?;

        let Ok(mut session) = session.try_lock_owned() else {
            debug!("Session {id} is busy");
            return err!(SessionBusy, "{id}");
        };

        let chat = chat.clone();
        let question = question.to_string();

        let turn = tokio::spawn(async move {
            let reply = chat.ask(&mut session, &question).await?;
            Ok::<_, GroundedError>((reply, session.turns().to_vec()))
        });

        map_err!(turn.await)
    }

    /// Drop every session that has not been used for at least `max_idle`.
    /// Sessions answering a question are kept. Returns the amount of dropped sessions.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.write();
        let before = sessions.len();

        sessions.retain(|id, entry| {
            let keep = entry.last_active.elapsed() < max_idle || Arc::strong_count(&entry.session) > 1;
            if !keep {
                debug!("Evicting idle session {id}");
            }
            keep
        });

        before - sessions.len()
    }

    /// Periodically drop sessions idle for at least `max_idle`.
    pub fn spawn_eviction(&self, max_idle: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = max_idle.min(Duration::from_secs(60));

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = registry.evict_idle(max_idle);
                if evicted > 0 {
                    info!("Evicted {evicted} idle session(s), {} left", registry.len());
                }
            }
        })
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Obtain the session and mark it as active.
    fn get(&self, id: Uuid) -> Result<SessionHandle, GroundedError> {
        match self.write().get_mut(&id) {
            Some(entry) => {
                entry.last_active = Instant::now();
                Ok(entry.session.clone())
            }
            None => err!(DoesNotExist, "Session '{id}'"),
        }
    }

    // The map is only held for lookups and never across an await,
    // so a poisoned lock still holds a consistent map.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<Uuid, Entry>> {
        self.sessions.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::SessionRegistry;
    use crate::app::test::{SlowGenerator, StaticGenerator, StaticRetriever};
    use crate::core::{model::Role, service::chat::ChatService};
    use crate::error::GroundedErr;
    use std::{sync::Arc, time::Duration};

    fn chat() -> ChatService {
        ChatService::new(
            Arc::new(StaticRetriever::new(&["StartupX, founded 2012"])),
            Arc::new(StaticGenerator::new("StartupX")),
        )
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let registry = SessionRegistry::new();
        let chat = chat();

        let a = registry.create();
        let b = registry.create();

        registry
            .ask(&chat, a, "Which startups were founded in 2012?")
            .await
            .unwrap();

        assert_eq!(2, registry.transcript(a).unwrap().len());
        assert!(registry.transcript(b).unwrap().is_empty());
        assert_eq!(2, registry.len());
    }

    #[tokio::test]
    async fn ask_returns_the_transcript() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        let (reply, transcript) = registry.ask(&chat(), id, "  Who?  ").await.unwrap();

        assert_eq!("StartupX", reply.answer);
        assert!(!reply.degraded);
        assert_eq!(
            vec![(Role::User, "Who?"), (Role::Assistant, "StartupX")],
            transcript
                .iter()
                .map(|t| (t.role(), t.content()))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn busy_session_rejects_questions_and_transcript_reads() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        let session = registry.get(id).unwrap();
        let _guard = session.lock().await;

        let err = registry.ask(&chat(), id, "Who?").await.unwrap_err();
        assert!(matches!(err.error, GroundedErr::SessionBusy(_)));

        let err = registry.transcript(id).unwrap_err();
        assert!(matches!(err.error, GroundedErr::SessionBusy(_)));
    }

    #[tokio::test]
    async fn abandoned_turn_still_completes() {
        let registry = SessionRegistry::new();
        let id = registry.create();
        let chat = ChatService::new(
            Arc::new(StaticRetriever::new(&["StartupX, founded 2012"])),
            Arc::new(SlowGenerator::new("StartupX", Duration::from_millis(100))),
        );

        let abandoned =
            tokio::time::timeout(Duration::from_millis(10), registry.ask(&chat, id, "A?")).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(300)).await;

        let (_, transcript) = registry.ask(&chat, id, "B?").await.unwrap();

        assert_eq!(
            vec![
                (Role::User, "A?"),
                (Role::Assistant, "StartupX"),
                (Role::User, "B?"),
                (Role::Assistant, "StartupX"),
            ],
            transcript
                .iter()
                .map(|t| (t.role(), t.content()))
                .collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        let idle = registry.create();
        let active = registry.create();

        assert_eq!(0, registry.evict_idle(Duration::from_secs(3600)));

        // An in-flight turn holds a handle to its session.
        let _turn = registry.get(active).unwrap();

        assert_eq!(1, registry.evict_idle(Duration::ZERO));
        assert_eq!(1, registry.len());

        let err = registry.transcript(idle).unwrap_err();
        assert!(matches!(err.error, GroundedErr::DoesNotExist(_)));
        assert!(registry.transcript(active).is_ok());
    }

    #[tokio::test]
    async fn removed_session_does_not_exist() {
        let registry = SessionRegistry::new();
        let id = registry.create();

        registry.remove(id).unwrap();

        assert!(registry.is_empty());
        let err = registry.transcript(id).unwrap_err();
        assert!(matches!(err.error, GroundedErr::DoesNotExist(_)));
        assert!(registry.remove(id).is_err());
    }
}
