//! Engine facade — the in-process surface the side-panel/UI layer consumes.
//!
//! Owns the injected storage, the resume store, the tab monitor and the
//! analysis orchestrator, and translates between browser-shaped events and
//! the pure subsystems. Holds no browser types itself.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::matching::orchestrator::MatchOrchestrator;
use crate::matching::selector::{select_model, AiSettings, ModelChoice};
use crate::models::analysis::MatchReport;
use crate::models::resume::{PersonalInfo, ResumeEntry, ResumeProfile};
use crate::models::scan::AutoScanRequest;
use crate::provider::{build_client, AiProvider};
use crate::resume::import::{decode_data_uri, extract_pdf_text};
use crate::resume::ResumeStore;
use crate::sanitize::sanitize;
use crate::scan::{MonitorAction, TabEvent, TabMonitor};
use crate::storage::{Storage, StorageAdapter, StorageKey, Subscription};

pub struct Engine {
    config: EngineConfig,
    storage: Storage,
    resumes: ResumeStore,
    orchestrator: MatchOrchestrator,
    monitor: Mutex<TabMonitor>,
    /// Test/embedding hook: bypasses the HTTP client factory.
    provider_override: Option<Arc<dyn AiProvider>>,
    /// Guard making auto-scan listener registration idempotent.
    scan_listener: Mutex<Option<Subscription>>,
}

impl Engine {
    pub fn new(adapter: Arc<dyn StorageAdapter>, config: EngineConfig) -> Self {
        let storage = Storage::new(adapter);
        Engine {
            resumes: ResumeStore::new(storage.clone()),
            orchestrator: MatchOrchestrator::new(storage.clone(), config.clone()),
            monitor: Mutex::new(TabMonitor::new(config.debounce_ms, config.scan_cooldown_ms)),
            provider_override: None,
            scan_listener: Mutex::new(None),
            storage,
            config,
        }
    }

    /// Like [`Engine::new`], but every AI call goes to the given provider
    /// instead of a vendor HTTP client.
    pub fn with_provider(
        adapter: Arc<dyn StorageAdapter>,
        config: EngineConfig,
        provider: Arc<dyn AiProvider>,
    ) -> Self {
        let mut engine = Engine::new(adapter, config);
        engine.provider_override = Some(provider);
        engine
    }

    pub fn resumes(&self) -> &ResumeStore {
        &self.resumes
    }

    // ── Subscriptions ───────────────────────────────────────────────────────

    /// Notifies on every change to the stored resume list.
    pub fn subscribe_resumes<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(Vec<ResumeEntry>) + Send + Sync + 'static,
    {
        self.storage
            .subscribe_key(StorageKey::Resumes, move |entries: Option<Vec<ResumeEntry>>| {
                on_change(entries.unwrap_or_default())
            })
    }

    /// Notifies on every change to the active-resume pointer.
    pub fn subscribe_active_resume<F>(&self, on_change: F) -> Subscription
    where
        F: Fn(Option<String>) + Send + Sync + 'static,
    {
        self.storage
            .subscribe_key(StorageKey::ActiveResumeId, on_change)
    }

    /// Registers the auto-scan request listener. Idempotent: the underlying
    /// subscription is created once, so calling this from two startup paths
    /// cannot double-deliver requests. Returns whether this call registered.
    pub fn on_auto_scan_request<F>(&self, on_request: F) -> bool
    where
        F: Fn(AutoScanRequest) + Send + Sync + 'static,
    {
        let mut guard = self.scan_listener.lock().expect("listener guard poisoned");
        if guard.is_some() {
            debug!("auto-scan listener already registered, skipping");
            return false;
        }

        // Storage-change replays of an already-seen request are dropped by
        // timestamp, mirroring the duplicate-delivery guard in the original
        // side panel.
        let last_processed = Mutex::new(0i64);
        let subscription = self.storage.subscribe_key(
            StorageKey::AutoScanRequest,
            move |request: Option<AutoScanRequest>| {
                let Some(request) = request else { return };
                let mut last = last_processed.lock().expect("timestamp guard poisoned");
                if request.timestamp <= *last {
                    debug!("duplicate auto-scan request, skipping");
                    return;
                }
                *last = request.timestamp;
                on_request(request);
            },
        );
        *guard = Some(subscription);
        true
    }

    // ── Auto-scan ───────────────────────────────────────────────────────────

    /// Feeds a tab navigation/activation event through the monitor. The
    /// returned [`MonitorAction::ArmDebounce`] tells the host when to call
    /// [`Engine::debounce_elapsed`].
    pub async fn handle_tab_event(
        &self,
        event: TabEvent,
    ) -> Result<Option<MonitorAction>, EngineError> {
        // The toggle is user-visible state; read it fresh per event rather
        // than caching across the engine's lifetime.
        let enabled = self
            .storage
            .read::<bool>(StorageKey::AutoScanEnabled)
            .await?
            .unwrap_or(true);

        let now_ms = Utc::now().timestamp_millis();
        let mut monitor = self.monitor.lock().expect("monitor poisoned");
        monitor.handle_event(TabEvent::AutoScanChanged { enabled }, now_ms);
        Ok(monitor.handle_event(event, now_ms))
    }

    /// The armed debounce fired. Emits and persists the request when the
    /// candidacy is still live; stale deadlines are no-ops.
    pub async fn debounce_elapsed(
        &self,
        tab_id: i64,
        deadline_ms: i64,
    ) -> Result<Option<AutoScanRequest>, EngineError> {
        let now_ms = Utc::now().timestamp_millis();
        let request = {
            let mut monitor = self.monitor.lock().expect("monitor poisoned");
            monitor.debounce_elapsed(tab_id, deadline_ms, now_ms)
        };
        if let Some(request) = &request {
            self.storage
                .write(StorageKey::AutoScanRequest, request)
                .await?;
        }
        Ok(request)
    }

    /// User-initiated scan of the current page, bypassing classification and
    /// debounce. Still at most one pending request per tab+URL.
    pub async fn trigger_scan_now(
        &self,
        tab_id: i64,
        url: &str,
    ) -> Result<Option<AutoScanRequest>, EngineError> {
        let now_ms = Utc::now().timestamp_millis();
        let request = {
            let mut monitor = self.monitor.lock().expect("monitor poisoned");
            monitor.force_request(tab_id, url.to_string(), now_ms)
        };
        if let Some(request) = &request {
            self.storage
                .write(StorageKey::AutoScanRequest, request)
                .await?;
        }
        Ok(request)
    }

    /// Clears the pending request (acted upon or dismissed) and returns the
    /// originating tab to `Idle`.
    pub async fn dismiss_request(&self) -> Result<(), EngineError> {
        let pending = self
            .storage
            .read::<AutoScanRequest>(StorageKey::AutoScanRequest)
            .await?;
        self.storage.clear(StorageKey::AutoScanRequest).await?;

        if let Some(request) = pending {
            let now_ms = Utc::now().timestamp_millis();
            let mut monitor = self.monitor.lock().expect("monitor poisoned");
            monitor.handle_event(
                TabEvent::RequestCleared {
                    tab_id: request.tab_id,
                },
                now_ms,
            );
        }
        Ok(())
    }

    pub async fn set_auto_scan_enabled(&self, enabled: bool) -> Result<(), EngineError> {
        self.storage
            .write(StorageKey::AutoScanEnabled, &enabled)
            .await?;
        let now_ms = Utc::now().timestamp_millis();
        let mut monitor = self.monitor.lock().expect("monitor poisoned");
        monitor.handle_event(TabEvent::AutoScanChanged { enabled }, now_ms);
        Ok(())
    }

    // ── Analysis ────────────────────────────────────────────────────────────

    /// Sanitizes scraped job text and runs a match analysis against the
    /// active resume's profile (falling back to the global profile).
    pub async fn request_analysis(&self, raw_job_text: &str) -> Result<MatchReport, EngineError> {
        let job_text = sanitize(raw_job_text);
        let profile = self.active_profile().await?;
        let (provider, choice) = self.resolve_provider().await?;
        self.orchestrator
            .analyze(provider.as_ref(), &job_text, profile.as_ref(), &choice)
            .await
    }

    /// Imports a resume document: mints an id and stores the entry. Profile
    /// extraction is a separate, credit-charged step.
    pub async fn import_resume(
        &self,
        name: &str,
        data_uri: &str,
    ) -> Result<ResumeEntry, EngineError> {
        // Fail fast on payloads that could never be extracted later.
        decode_data_uri(data_uri)?;

        let entry = ResumeEntry {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            data: data_uri.to_string(),
            profile: None,
        };
        self.resumes.add_resume(entry.clone()).await?;
        Ok(entry)
    }

    /// Extracts a structured profile from a stored resume via the configured
    /// AI provider, attaches it to the entry and mirrors it to the global
    /// profile fallback.
    pub async fn extract_profile(&self, resume_id: &str) -> Result<ResumeProfile, EngineError> {
        let entry = self
            .resumes
            .list()
            .await?
            .into_iter()
            .find(|e| e.id == resume_id)
            .ok_or_else(|| EngineError::NotFound(format!("resume '{resume_id}'")))?;

        let bytes = decode_data_uri(&entry.data)?;
        let text = tokio::task::spawn_blocking(move || extract_pdf_text(&bytes))
            .await
            .map_err(|e| EngineError::Validation(format!("extraction task failed: {e}")))??;

        let (provider, choice) = self.resolve_provider().await?;
        let profile = self
            .orchestrator
            .extract_profile(provider.as_ref(), &text, &choice)
            .await?;

        self.resumes
            .attach_profile(resume_id, profile.clone())
            .await?;
        self.storage.write(StorageKey::Profile, &profile).await?;
        info!("profile extracted for resume '{}'", entry.name);
        Ok(profile)
    }

    /// Successful AI calls so far.
    pub async fn usage(&self) -> Result<u32, EngineError> {
        self.orchestrator.usage().await
    }

    // ── Personal info ───────────────────────────────────────────────────────

    /// The user's global contact block, independent of any one resume.
    pub async fn personal_info(&self) -> Result<PersonalInfo, EngineError> {
        Ok(self
            .storage
            .read::<PersonalInfo>(StorageKey::PersonalInfo)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_personal_info(&self, info: &PersonalInfo) -> Result<(), EngineError> {
        self.storage.write(StorageKey::PersonalInfo, info).await
    }

    // ── Internals ───────────────────────────────────────────────────────────

    async fn active_profile(&self) -> Result<Option<ResumeProfile>, EngineError> {
        if let Some(entry) = self.resumes.get_active().await? {
            if let Some(profile) = entry.profile {
                return Ok(Some(profile));
            }
        }
        self.storage
            .read::<ResumeProfile>(StorageKey::Profile)
            .await
    }

    async fn resolve_provider(
        &self,
    ) -> Result<(Arc<dyn AiProvider>, ModelChoice), EngineError> {
        let settings = AiSettings::load(&self.storage).await?;
        let choice = select_model(&settings)?;
        let provider = match &self.provider_override {
            Some(provider) => provider.clone(),
            None => build_client(
                &choice,
                settings.api_key.as_deref().unwrap_or_default(),
                self.config.ai_timeout,
                self.config.ai_max_retries,
            ),
        };
        Ok((provider, choice))
    }
}
