//! Tab monitor — the auto-scan state machine.
//!
//! One state per browser tab: `Idle`, `Candidate` (page looks like a job
//! posting, debounce armed), `Requested` (an [`AutoScanRequest`] is pending)
//! and `Suppressed` (auto-scan disabled). The machine is clock-free: callers
//! pass the current epoch-millis timestamp with every event, so transitions
//! are driven by synchronous unit tests exactly as by real browser events.
//!
//! Debouncing works with deadline tokens instead of owned timers: a
//! classification arms a deadline and hands it back to the caller, who
//! schedules the wait. A re-navigation replaces the armed deadline, so a
//! stale timer firing with the old token is ignored — two timers can never
//! emit for one candidacy.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::models::scan::AutoScanRequest;
use crate::scan::sites::detect_job_site;

/// Site label used when the user forces a scan on an unclassified page.
const MANUAL_SITE: &str = "Manual";

/// Cap on the scanned-URL cool-down map before expired entries are pruned.
const COOLDOWN_PRUNE_THRESHOLD: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum TabEvent {
    /// Full page load or SPA history update in a tab.
    Navigated { tab_id: i64, url: String },
    /// The user switched to an already-loaded tab.
    Activated { tab_id: i64, url: String },
    /// The pending request for this tab was consumed or dismissed.
    RequestCleared { tab_id: i64 },
    /// The global auto-scan toggle changed.
    AutoScanChanged { enabled: bool },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ScanState {
    #[default]
    Idle,
    Candidate {
        url: String,
        site: &'static str,
        deadline_ms: i64,
    },
    Requested {
        url: String,
    },
    Suppressed,
}

/// What the caller must do after an event, if anything.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorAction {
    /// Schedule a timer and call [`TabMonitor::debounce_elapsed`] with this
    /// exact deadline when it fires.
    ArmDebounce {
        tab_id: i64,
        url: String,
        deadline_ms: i64,
    },
}

pub struct TabMonitor {
    enabled: bool,
    debounce_ms: i64,
    cooldown_ms: i64,
    tabs: HashMap<i64, ScanState>,
    /// url → last emission timestamp; suppresses re-proposing a page the user
    /// just scanned.
    recently_scanned: HashMap<String, i64>,
}

impl TabMonitor {
    pub fn new(debounce_ms: i64, cooldown_ms: i64) -> Self {
        TabMonitor {
            enabled: true,
            debounce_ms,
            cooldown_ms,
            tabs: HashMap::new(),
            recently_scanned: HashMap::new(),
        }
    }

    pub fn state(&self, tab_id: i64) -> ScanState {
        self.tabs.get(&tab_id).cloned().unwrap_or_default()
    }

    /// Feeds one browser event through the machine.
    pub fn handle_event(&mut self, event: TabEvent, now_ms: i64) -> Option<MonitorAction> {
        match event {
            TabEvent::AutoScanChanged { enabled } => {
                self.set_enabled(enabled);
                None
            }
            TabEvent::RequestCleared { tab_id } => {
                if matches!(self.state(tab_id), ScanState::Requested { .. }) {
                    self.tabs.insert(tab_id, ScanState::Idle);
                }
                None
            }
            TabEvent::Navigated { tab_id, url } | TabEvent::Activated { tab_id, url } => {
                self.classify(tab_id, url, now_ms)
            }
        }
    }

    /// The armed debounce for `tab_id` elapsed. Emits the request only when
    /// the candidacy is still live and the deadline token matches; stale
    /// timers (superseded by a later navigation) are no-ops.
    pub fn debounce_elapsed(
        &mut self,
        tab_id: i64,
        deadline_ms: i64,
        now_ms: i64,
    ) -> Option<AutoScanRequest> {
        let ScanState::Candidate {
            url,
            site,
            deadline_ms: armed,
        } = self.state(tab_id)
        else {
            return None;
        };
        if armed != deadline_ms {
            debug!("stale debounce for tab {tab_id}, ignoring");
            return None;
        }
        Some(self.emit(tab_id, url, site, now_ms))
    }

    /// User-initiated scan: bypasses site classification, debounce and
    /// cool-down. Still idempotent — a pending request for the same tab+URL
    /// is not re-emitted.
    pub fn force_request(
        &mut self,
        tab_id: i64,
        url: String,
        now_ms: i64,
    ) -> Option<AutoScanRequest> {
        if matches!(self.state(tab_id), ScanState::Requested { url: pending } if pending == url) {
            return None;
        }
        let site = detect_job_site(&url).unwrap_or(MANUAL_SITE);
        Some(self.emit(tab_id, url, site, now_ms))
    }

    fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        info!("auto-scan {}", if enabled { "enabled" } else { "disabled" });
        for state in self.tabs.values_mut() {
            *state = if enabled {
                ScanState::Idle
            } else {
                ScanState::Suppressed
            };
        }
    }

    fn classify(&mut self, tab_id: i64, url: String, now_ms: i64) -> Option<MonitorAction> {
        if !self.enabled {
            self.tabs.insert(tab_id, ScanState::Suppressed);
            return None;
        }

        // A pending request for this exact page must not be duplicated.
        if matches!(self.state(tab_id), ScanState::Requested { url: ref pending } if *pending == url)
        {
            return None;
        }

        let Some(site) = detect_job_site(&url) else {
            // Navigating to a non-job page cancels any live candidacy.
            self.tabs.insert(tab_id, ScanState::Idle);
            return None;
        };

        if self.was_recently_scanned(&url, now_ms) {
            self.tabs.insert(tab_id, ScanState::Idle);
            return None;
        }

        let deadline_ms = now_ms + self.debounce_ms;
        debug!("job page candidate ({site}) in tab {tab_id}: {url}");
        self.tabs.insert(
            tab_id,
            ScanState::Candidate {
                url: url.clone(),
                site,
                deadline_ms,
            },
        );
        Some(MonitorAction::ArmDebounce {
            tab_id,
            url,
            deadline_ms,
        })
    }

    fn emit(&mut self, tab_id: i64, url: String, site: &'static str, now_ms: i64) -> AutoScanRequest {
        info!("proposing auto-scan ({site}) for tab {tab_id}: {url}");
        self.mark_scanned(url.clone(), now_ms);
        self.tabs
            .insert(tab_id, ScanState::Requested { url: url.clone() });
        AutoScanRequest {
            tab_id,
            url,
            site_name: site.to_string(),
            timestamp: now_ms,
        }
    }

    fn was_recently_scanned(&mut self, url: &str, now_ms: i64) -> bool {
        match self.recently_scanned.get(url) {
            Some(&at) if now_ms - at <= self.cooldown_ms => true,
            Some(_) => {
                self.recently_scanned.remove(url);
                false
            }
            None => false,
        }
    }

    fn mark_scanned(&mut self, url: String, now_ms: i64) {
        self.recently_scanned.insert(url, now_ms);
        if self.recently_scanned.len() > COOLDOWN_PRUNE_THRESHOLD {
            let cutoff = now_ms - self.cooldown_ms;
            self.recently_scanned.retain(|_, at| *at > cutoff);
        }
    }
}
