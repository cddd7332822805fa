//! Application state: persisted slots, transient busy flag and toasts, and the content service.
//!
//! This module owns:
//!   - the four persisted slots (setup context, documents, question bank, admin documents)
//!   - the persistence port they are written through to
//!   - the busy flag (one generation in flight at a time) and the toast queue
//!   - the optional content service (absent without OPENAI_API_KEY)
//!
//! Every mutator below commits in memory and then re-serializes the whole
//! slot to the store. Store failures are logged and never surfaced.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicI64, Ordering},
        Arc,
    },
    time::Duration,
};

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument, warn};

use crate::catalog::canonical_level;
use crate::config::{load_agent_config_from_env, storage_dir_from_env, AgentConfig};
use crate::content::ContentService;
use crate::domain::{AdminDocument, GeneratedDocument, QuestionItem, SetupContext, SetupField, Toast};
use crate::openai::OpenAI;
use crate::storage::{FileStore, MemoryStore, StateStore, KEY_ADMIN, KEY_DOCUMENTS, KEY_QUESTIONS, KEY_SETUP};
use crate::util::now_millis;

#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn StateStore>,
    pub ai: Option<ContentService>,
    toast_ttl: Duration,

    setup: Arc<RwLock<SetupContext>>,
    documents: Arc<RwLock<Vec<GeneratedDocument>>>,
    questions: Arc<RwLock<Vec<QuestionItem>>>,
    admin_docs: Arc<RwLock<Vec<AdminDocument>>>,

    busy: Arc<AtomicBool>,
    toasts: Arc<RwLock<Vec<Toast>>>,
    last_toast_id: Arc<AtomicI64>,
}

/// Holds the busy flag; dropping it clears the flag whatever the outcome.
pub struct BusyGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl AppState {
    /// Build state from env: load config, open the store, rehydrate slots, init OpenAI.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Self {
        let cfg = load_agent_config_from_env().unwrap_or_default();

        let dir = storage_dir_from_env();
        let store: Arc<dyn StateStore> = match FileStore::open(&dir) {
            Ok(fs) => {
                info!(target: "storage", dir = %fs.dir().display(), "File store opened");
                Arc::new(fs)
            }
            Err(e) => {
                error!(target: "storage", dir = %dir.display(), error = %e, "Cannot open storage dir; state will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let ai = match OpenAI::from_env() {
            Some(oa) => {
                info!(target: "kurikulum_backend", base_url = %oa.base_url, model = %oa.model, timeout = ?oa.timeout, "OpenAI enabled.");
                Some(ContentService::new(Arc::new(oa), cfg.prompts.clone()))
            }
            None => {
                warn!(target: "kurikulum_backend", "OpenAI disabled (no OPENAI_API_KEY). Generation requests will fail.");
                None
            }
        };

        Self::load(store, ai, &cfg)
    }

    /// Rehydrate every persisted slot; unreadable or corrupt slots become empty defaults.
    pub fn load(store: Arc<dyn StateStore>, ai: Option<ContentService>, cfg: &AgentConfig) -> Self {
        let mut setup: SetupContext = load_slot(store.as_ref(), KEY_SETUP);
        if let Some(id) = canonical_level(&setup.level) {
            setup.level = id.to_string();
        }
        let documents: Vec<GeneratedDocument> = load_slot(store.as_ref(), KEY_DOCUMENTS);
        let questions: Vec<QuestionItem> = load_slot(store.as_ref(), KEY_QUESTIONS);
        let admin_docs: Vec<AdminDocument> = load_slot(store.as_ref(), KEY_ADMIN);

        info!(
            target: "storage",
            documents = documents.len(),
            questions = questions.len(),
            admin_documents = admin_docs.len(),
            setup_complete = setup.is_complete(),
            "Startup state inventory"
        );

        Self {
            store,
            ai,
            toast_ttl: Duration::from_millis(cfg.toast_ttl_ms),
            setup: Arc::new(RwLock::new(setup)),
            documents: Arc::new(RwLock::new(documents)),
            questions: Arc::new(RwLock::new(questions)),
            admin_docs: Arc::new(RwLock::new(admin_docs)),
            busy: Arc::new(AtomicBool::new(false)),
            toasts: Arc::new(RwLock::new(Vec::new())),
            last_toast_id: Arc::new(AtomicI64::new(0)),
        }
    }

    fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(s) => s,
            Err(e) => {
                error!(target: "storage", %key, error = %e, "Failed to serialize slot");
                return;
            }
        };
        if let Err(e) = self.store.save(key, &json) {
            error!(target: "storage", %key, error = %e, "Failed to persist slot");
        }
    }

    // --- setup context ---

    pub async fn setup(&self) -> SetupContext {
        self.setup.read().await.clone()
    }

    /// Level values may be sent as id or label; they are stored as id.
    #[instrument(level = "debug", skip(self, value), fields(value_len = value.len()))]
    pub async fn update_setup(&self, field: SetupField, value: String) -> SetupContext {
        let value = match field {
            SetupField::Level => canonical_level(&value).map(str::to_string).unwrap_or(value),
            _ => value,
        };
        let mut setup = self.setup.write().await;
        setup.update(field, value);
        self.persist(KEY_SETUP, &*setup);
        setup.clone()
    }

    // --- generated documents ---

    pub async fn documents(&self) -> Vec<GeneratedDocument> {
        self.documents.read().await.clone()
    }

    pub async fn find_document(&self, id: &str) -> Option<GeneratedDocument> {
        self.documents.read().await.iter().find(|d| d.id == id).cloned()
    }

    /// Whole batch in one commit, appended in the given order.
    #[instrument(level = "debug", skip(self, batch), fields(count = batch.len()))]
    pub async fn append_documents(&self, batch: Vec<GeneratedDocument>) {
        let mut docs = self.documents.write().await;
        docs.extend(batch);
        self.persist(KEY_DOCUMENTS, &*docs);
    }

    // --- question bank ---

    pub async fn questions(&self) -> Vec<QuestionItem> {
        self.questions.read().await.clone()
    }

    /// Newest batch first; order within the batch is kept.
    #[instrument(level = "debug", skip(self, batch), fields(count = batch.len()))]
    pub async fn prepend_questions(&self, batch: Vec<QuestionItem>) {
        let mut questions = self.questions.write().await;
        questions.splice(0..0, batch);
        self.persist(KEY_QUESTIONS, &*questions);
    }

    #[instrument(level = "debug", skip(self))]
    pub async fn remove_question(&self, id: &str) -> bool {
        let mut questions = self.questions.write().await;
        let before = questions.len();
        questions.retain(|q| q.id != id);
        let removed = questions.len() != before;
        if removed {
            self.persist(KEY_QUESTIONS, &*questions);
        }
        removed
    }

    /// Returns how many questions were dropped.
    #[instrument(level = "debug", skip(self))]
    pub async fn clear_questions(&self) -> usize {
        let mut questions = self.questions.write().await;
        let n = questions.len();
        questions.clear();
        self.persist(KEY_QUESTIONS, &*questions);
        n
    }

    // --- administrative documents ---

    pub async fn admin_documents(&self) -> Vec<AdminDocument> {
        self.admin_docs.read().await.clone()
    }

    pub async fn find_admin_document(&self, id: &str) -> Option<AdminDocument> {
        self.admin_docs.read().await.iter().find(|d| d.id == id).cloned()
    }

    #[instrument(level = "debug", skip(self, doc), fields(id = %doc.id))]
    pub async fn append_admin_document(&self, doc: AdminDocument) {
        let mut docs = self.admin_docs.write().await;
        docs.push(doc);
        self.persist(KEY_ADMIN, &*docs);
    }

    // --- busy flag ---

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// `None` while another generation is in flight.
    pub fn try_begin_busy(&self) -> Option<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| BusyGuard { flag: self.busy.clone() })
    }

    // --- toasts ---

    pub async fn toasts(&self) -> Vec<Toast> {
        self.toasts.read().await.clone()
    }

    /// Queue a toast and schedule its removal after the configured lifetime.
    /// Ids are millisecond stamps, bumped when two toasts land in the same millisecond.
    #[instrument(level = "debug", skip(self))]
    pub async fn show_toast(&self, message: &str, color: &str) -> Toast {
        let now = now_millis();
        let prev = self
            .last_toast_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or(now - 1);
        let toast = Toast {
            id: now.max(prev + 1),
            message: message.to_string(),
            color: color.to_string(),
        };
        self.toasts.write().await.push(toast.clone());

        let toasts = self.toasts.clone();
        let ttl = self.toast_ttl;
        let id = toast.id;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            toasts.write().await.retain(|t| t.id != id);
            debug!(target: "kurikulum_backend", id, "Toast expired");
        });

        toast
    }
}

fn load_slot<T: DeserializeOwned + Default>(store: &dyn StateStore, key: &str) -> T {
    match store.load(key) {
        Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            error!(target: "storage", %key, error = %e, "Stored slot is corrupt; using empty default");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            error!(target: "storage", %key, error = %e, "Failed to read slot; using empty default");
            T::default()
        }
    }
}
