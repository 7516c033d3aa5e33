// Refresh orchestrator - Polls chart data for the current selection
use crate::application::dashboard_repository::{ChartDataSource, CredentialSource};
use crate::application::update_suppression::SeriesEquivalence;
use crate::domain::chart::{DeviceChartData, Granularity, HierarchyChartData};
use crate::domain::selection::{Selection, TimeRange};
use crate::domain::widget::ChartProps;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    /// Headline numbers; always daily, always overwritten.
    Metrics,
    /// Charts for the selected time range; gated by update suppression.
    FlowRate,
}

impl Track {
    fn granularity(&self, time_range: TimeRange) -> Granularity {
        match self {
            Track::Metrics => Granularity::Day,
            Track::FlowRate => time_range.granularity(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Track::Metrics => "metrics",
            Track::FlowRate => "flow_rate",
        }
    }
}

#[derive(Debug, Clone)]
pub enum ChartPayload {
    Device(Arc<DeviceChartData>),
    Hierarchy(Arc<HierarchyChartData>),
}

/// What a fetch was issued for; results for anything else are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTag {
    pub target: Selection,
    pub time_range: TimeRange,
}

/// Cached chart payloads plus refresh bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshState {
    pub target: Option<Selection>,
    pub time_range: TimeRange,
    pub metrics: ChartProps,
    pub flow_rate: ChartProps,
    pub last_refresh: DateTime<Utc>,
    pub ticks: u64,
    pub metrics_in_flight: usize,
}

impl RefreshState {
    pub fn new(time_range: TimeRange) -> Self {
        Self {
            target: None,
            time_range,
            metrics: ChartProps::default(),
            flow_rate: ChartProps::default(),
            last_refresh: Utc::now(),
            ticks: 0,
            metrics_in_flight: 0,
        }
    }

    /// The metrics track drives the page loading indicator.
    pub fn is_loading(&self) -> bool {
        self.metrics_in_flight > 0
    }

    fn is_current(&self, target: &Selection) -> bool {
        self.target.as_ref().is_some_and(|t| t.same_target(target))
    }

    /// Point the caches at a new target, emptying everything cached for the
    /// old one. A relabelled target keeps its caches. Returns true only when
    /// the identity changed.
    pub fn retarget(&mut self, target: Option<Selection>) -> bool {
        let same = match &target {
            Some(t) => self.is_current(t),
            None => self.target.is_none(),
        };
        self.target = target;
        if same {
            return false;
        }
        self.metrics = ChartProps::default();
        self.flow_rate = ChartProps::default();
        true
    }

    /// Apply a fetch result. Returns true when the cache changed.
    pub fn commit(
        &mut self,
        track: Track,
        tag: &FetchTag,
        payload: ChartPayload,
        equivalence: &dyn SeriesEquivalence,
    ) -> bool {
        if !self.is_current(&tag.target)
            || (track == Track::FlowRate && self.time_range != tag.time_range)
        {
            tracing::debug!(track = track.name(), selection = %tag.target, "Discarding stale chart data");
            return false;
        }

        let cache = match track {
            Track::Metrics => &mut self.metrics,
            Track::FlowRate => &mut self.flow_rate,
        };

        match payload {
            ChartPayload::Device(data) => {
                if track == Track::FlowRate {
                    let cached = cache.chart_data.as_ref().map(|c| c.chart_data.as_slice());
                    if equivalence.is_equivalent(cached, &data.chart_data) {
                        tracing::debug!(selection = %tag.target, "Flow-rate data unchanged, keeping cached series");
                        return false;
                    }
                }
                cache.chart_data = Some(data);
            }
            ChartPayload::Hierarchy(data) => {
                if track == Track::FlowRate {
                    let cached = cache
                        .hierarchy_chart_data
                        .as_ref()
                        .map(|c| c.chart_data.as_slice());
                    if equivalence.is_equivalent(cached, &data.chart_data) {
                        tracing::debug!(selection = %tag.target, "Flow-rate data unchanged, keeping cached series");
                        return false;
                    }
                }
                cache.hierarchy_chart_data = Some(data);
            }
        }
        true
    }
}

/// A recurring timer that lives exactly as long as this value.
pub struct PollingTask {
    handle: JoinHandle<()>,
}

impl PollingTask {
    /// First tick fires one full period after spawning.
    pub fn spawn<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                on_tick();
            }
        });
        Self { handle }
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct OrchestratorInner {
    source: Arc<dyn ChartDataSource>,
    credentials: Arc<dyn CredentialSource>,
    equivalence: Arc<dyn SeriesEquivalence>,
    state: watch::Sender<RefreshState>,
    fetches: Mutex<JoinSet<()>>,
}

impl OrchestratorInner {
    fn spawn_fetch(self: &Arc<Self>, track: Track, tag: FetchTag) {
        let Some(token) = self.credentials.token() else {
            tracing::debug!(track = track.name(), "No credential, skipping chart fetch");
            return;
        };

        let inner = Arc::clone(self);
        let mut fetches = self.fetches.lock().unwrap_or_else(PoisonError::into_inner);
        while fetches.try_join_next().is_some() {}
        fetches.spawn(async move { inner.fetch(track, tag, token).await });
    }

    async fn fetch(&self, track: Track, tag: FetchTag, token: String) {
        if track == Track::Metrics {
            self.state.send_modify(|state| state.metrics_in_flight += 1);
        }

        let granularity = track.granularity(tag.time_range);
        let result = match &tag.target {
            Selection::Device(device) => self
                .source
                .device_chart_data(device.id, granularity, &token)
                .await
                .map(|data| ChartPayload::Device(Arc::new(data))),
            Selection::Hierarchy(hierarchy) => self
                .source
                .hierarchy_chart_data(hierarchy.id, granularity, &token)
                .await
                .map(|data| ChartPayload::Hierarchy(Arc::new(data))),
        };

        let payload = match result {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::error!(
                    track = track.name(),
                    selection = %tag.target,
                    granularity = granularity.as_str(),
                    "Failed to load chart data: {:#}",
                    e
                );
                None
            }
        };

        self.state.send_if_modified(|state| {
            let mut modified = false;
            if track == Track::Metrics {
                state.metrics_in_flight = state.metrics_in_flight.saturating_sub(1);
                modified = true;
            }
            if let Some(payload) = payload {
                modified |= state.commit(track, &tag, payload, self.equivalence.as_ref());
            }
            modified
        });
    }

    fn tick(self: &Arc<Self>, target: Option<&Selection>, time_range: TimeRange) {
        self.state.send_modify(|state| {
            state.last_refresh = Utc::now();
            state.ticks += 1;
        });

        if let Some(target) = target {
            tracing::debug!(selection = %target, "Refresh tick");
            for track in [Track::Metrics, Track::FlowRate] {
                self.spawn_fetch(
                    track,
                    FetchTag {
                        target: target.clone(),
                        time_range,
                    },
                );
            }
        }
    }
}

/// Owns the chart caches and the single polling timer for a mounted view.
pub struct RefreshOrchestrator {
    inner: Arc<OrchestratorInner>,
    poller: Option<PollingTask>,
    interval: Duration,
    mounted: bool,
}

impl RefreshOrchestrator {
    pub fn new(
        source: Arc<dyn ChartDataSource>,
        credentials: Arc<dyn CredentialSource>,
        equivalence: Arc<dyn SeriesEquivalence>,
        interval: Duration,
        time_range: TimeRange,
    ) -> Self {
        let (state, _) = watch::channel(RefreshState::new(time_range));
        Self {
            inner: Arc::new(OrchestratorInner {
                source,
                credentials,
                equivalence,
                state,
                fetches: Mutex::new(JoinSet::new()),
            }),
            poller: None,
            interval,
            mounted: false,
        }
    }

    /// Receives a notification for every committed change. Suppressed
    /// flow-rate updates publish nothing.
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> RefreshState {
        self.inner.state.borrow().clone()
    }

    pub fn selection(&self) -> Option<Selection> {
        self.inner.state.borrow().target.clone()
    }

    pub fn time_range(&self) -> TimeRange {
        self.inner.state.borrow().time_range
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// Begin polling for whatever is currently selected.
    pub fn start(&mut self) {
        self.mounted = true;
        self.restart_polling();
    }

    /// Cancel the timer; cached data stays readable.
    pub fn stop(&mut self) {
        self.mounted = false;
        self.poller = None;
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        let mut changed = false;
        self.inner.state.send_if_modified(|state| {
            if state.target == selection {
                return false;
            }
            changed = state.retarget(selection.clone());
            true
        });
        if !changed {
            return;
        }

        match &selection {
            Some(target) => tracing::info!(selection = %target, "Selection changed"),
            None => tracing::info!("Selection cleared"),
        }

        if let Some(target) = selection {
            let time_range = self.time_range();
            for track in [Track::Metrics, Track::FlowRate] {
                self.inner.spawn_fetch(
                    track,
                    FetchTag {
                        target: target.clone(),
                        time_range,
                    },
                );
            }
        }
        self.restart_polling();
    }

    pub fn set_time_range(&mut self, time_range: TimeRange) {
        let changed = self.inner.state.send_if_modified(|state| {
            if state.time_range == time_range {
                return false;
            }
            state.time_range = time_range;
            true
        });
        if !changed {
            return;
        }

        tracing::info!(time_range = time_range.as_str(), "Time range changed");
        if let Some(target) = self.selection() {
            self.inner
                .spawn_fetch(Track::FlowRate, FetchTag { target, time_range });
        }
        self.restart_polling();
    }

    /// Wait until every fetch issued so far (and any issued meanwhile) is done.
    pub async fn settle(&self) {
        loop {
            let mut pending = std::mem::take(
                &mut *self
                    .inner
                    .fetches
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner),
            );
            if pending.is_empty() {
                break;
            }
            while pending.join_next().await.is_some() {}
        }
    }

    fn restart_polling(&mut self) {
        // Drop the old timer before arming a new one.
        self.poller = None;
        if !self.mounted {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let target = self.selection();
        let time_range = self.time_range();
        self.poller = Some(PollingTask::spawn(self.interval, move || {
            inner.tick(target.as_ref(), time_range);
        }));
    }
}

impl Drop for RefreshOrchestrator {
    fn drop(&mut self) {
        self.poller = None;
        self.inner
            .fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}
