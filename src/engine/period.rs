//! Time-travel period selection.
//!
//! A [`TimeTravel`] holds the committed (period, position) pair for one
//! monument view. Slider drags and tab clicks set a pending target and start
//! a settle timer; every new target restarts the timer, so a burst of input
//! produces exactly one commit with the last target. Commits are published on
//! a `watch` channel.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;
use ts_rs::TS;

use super::timer::{schedule_once, TimerHandle};
use crate::config::{Config, DEFAULT_SETTLE_MS};
use crate::db::models::{Monument, Period};

pub const MIN_POSITION: f64 = 0.0;
pub const MAX_POSITION: f64 = 100.0;
/// Lowest position that reads as `past`.
pub const PAST_THRESHOLD: f64 = 33.0;
/// Lowest position that reads as `present`.
pub const PRESENT_THRESHOLD: f64 = 66.0;

/// Clamp a slider position into `[0, 100]`. NaN maps to 0.
pub fn clamp_position(p: f64) -> f64 {
    if p.is_nan() {
        MIN_POSITION
    } else {
        p.clamp(MIN_POSITION, MAX_POSITION)
    }
}

/// Period shown for a (clamped) slider position.
pub fn derive_period(p: f64) -> Period {
    let p = clamp_position(p);
    if p < PAST_THRESHOLD {
        Period::Ancient
    } else if p < PRESENT_THRESHOLD {
        Period::Past
    } else {
        Period::Present
    }
}

/// Slider position a tab click snaps to.
pub fn canonical_position(period: Period) -> f64 {
    match period {
        Period::Ancient => 0.0,
        Period::Past => 50.0,
        Period::Present => 100.0,
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodInfo {
    pub period: Period,
    pub title: String,
    pub description: String,
    pub canonical_position: f64,
}

pub fn period_info(period: Period) -> PeriodInfo {
    let (title, description) = match period {
        Period::Present => (
            "Present Day",
            "The monument as it stands today, after centuries of preservation and restoration efforts.",
        ),
        Period::Past => (
            "Early 20th Century",
            "The monument during the British colonial period, showing signs of aging and different surrounding environment.",
        ),
        Period::Ancient => (
            "Original Construction",
            "The monument as it would have looked when newly constructed, with its original colors and pristine condition.",
        ),
    };
    PeriodInfo {
        period,
        title: title.to_string(),
        description: description.to_string(),
        canonical_position: canonical_position(period),
    }
}

/// Historical context paragraph for `monument` as seen in `period`.
pub fn period_context(monument: &Monument, period: Period) -> String {
    let name = &monument.name;
    match period {
        Period::Present => format!(
            "Today, {name} stands as a testament to India's rich architectural heritage, \
             attracting millions of visitors annually. Modern conservation efforts ensure its \
             preservation for future generations."
        ),
        Period::Past => format!(
            "In the early 20th century, {name} had already endured centuries of weather and \
             political changes. During the British colonial period, some restoration work began, \
             though not always with historically accurate methods."
        ),
        Period::Ancient => format!(
            "When first built during the {} period ({}), {name} would have featured vibrant \
             colors and pristine materials. The surrounding landscape was carefully designed to \
             complement the structure.",
            monument.dynasty, monument.year_built
        ),
    }
}

/// One milestone on a monument's timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct TimelineEvent {
    /// Free-form date label ("1631", "1857-1947", "Colonial Period").
    pub when: String,
    pub event: String,
}

impl TimelineEvent {
    fn new(when: &str, event: &str) -> Self {
        Self {
            when: when.to_string(),
            event: event.to_string(),
        }
    }
}

type Milestones = [(&'static str, &'static str); 4];

const GENERIC_MILESTONES: Milestones = [
    ("Ancient Times", "Original foundation laid"),
    ("Middle Period", "Major expansions made to the structure"),
    ("Colonial Period", "Preservation efforts under colonial administration"),
    ("Modern Era", "Recognized as a significant cultural landmark"),
];

fn milestones(monument_id: &str) -> &'static Milestones {
    match monument_id {
        "taj-mahal" => &[
            ("1631", "Construction began under Emperor Shah Jahan"),
            ("1643", "Main structure completed"),
            ("1908", "Major restoration work by British Viceroy Lord Curzon"),
            ("1983", "Designated as a UNESCO World Heritage Site"),
        ],
        "qutub-minar" => &[
            ("1199", "Construction began by Qutb ud-Din Aibak"),
            ("1220", "Completed by Iltutmish, successor of Qutb-ud-Din"),
            ("1920s", "Repairs conducted under British colonial rule"),
            ("1993", "Added to UNESCO World Heritage list"),
        ],
        "konark-sun-temple" => &[
            ("1250", "Construction began under King Narasimhadeva I"),
            ("1255", "Temple construction completed"),
            ("1902", "Early conservation efforts initiated"),
            ("1984", "UNESCO World Heritage designation"),
        ],
        "red-fort" => &[
            ("1639", "Construction began by Emperor Shah Jahan"),
            ("1648", "Construction completed and royal court moved in"),
            ("1857-1947", "British occupation after the Indian Rebellion"),
            ("2007", "Declared a UNESCO World Heritage Site"),
        ],
        "hawa-mahal" => &[
            ("1799", "Built by Maharaja Sawai Pratap Singh"),
            ("1800s", "Became a key cultural icon in Jaipur"),
            ("1876", "Restoration efforts during Maharaja Ram Singh's reign"),
            ("2005", "Major renovation and conservation project"),
        ],
        _ => &GENERIC_MILESTONES,
    }
}

/// Key historical timeline, oldest first, always closing on the present day.
pub fn timeline(monument: &Monument) -> Vec<TimelineEvent> {
    milestones(&monument.id)
        .iter()
        .map(|(when, event)| TimelineEvent::new(when, event))
        .chain(std::iter::once(TimelineEvent::new(
            "Present Day",
            "Ongoing conservation efforts continue to preserve this magnificent monument for future generations",
        )))
        .collect()
}

/// Observable state of a time-travel view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSnapshot {
    pub period: Period,
    pub position: f64,
    pub transitioning: bool,
    /// Target that will be committed when the current transition settles.
    pub pending: Option<(Period, f64)>,
    /// Number of commits since the view was created.
    pub commits: u64,
}

#[derive(Debug)]
struct State {
    period: Period,
    position: f64,
    pending: Option<(Period, f64)>,
    generation: u64,
    commits: u64,
    closed: bool,
}

impl State {
    fn snapshot(&self) -> PeriodSnapshot {
        PeriodSnapshot {
            period: self.period,
            position: self.position,
            transitioning: self.pending.is_some(),
            pending: self.pending,
            commits: self.commits,
        }
    }
}

struct Shared {
    state: Mutex<State>,
    tx: watch::Sender<PeriodSnapshot>,
}

impl Shared {
    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn settle(&self, generation: u64) {
        let mut state = self.lock();
        if state.closed || state.generation != generation {
            return;
        }
        let Some((period, position)) = state.pending.take() else {
            return;
        };
        state.period = period;
        state.position = position;
        state.commits += 1;
        tracing::debug!(%period, position, commits = state.commits, "Period committed");
        self.tx.send_replace(state.snapshot());
    }
}

pub struct TimeTravel {
    shared: Arc<Shared>,
    settle_delay: Duration,
    // Also serialises retargeting so timer replacement follows generation order.
    settle_timer: Mutex<Option<TimerHandle>>,
}

impl TimeTravel {
    /// New view at `present`/100.
    pub fn new(settle_delay: Duration) -> Self {
        let state = State {
            period: Period::Present,
            position: MAX_POSITION,
            pending: None,
            generation: 0,
            commits: 0,
            closed: false,
        };
        let (tx, _rx) = watch::channel(state.snapshot());
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                tx,
            }),
            settle_delay,
            settle_timer: Mutex::new(None),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.settle_delay)
    }

    pub fn set_by_position(&self, p: f64) {
        let position = clamp_position(p);
        self.retarget(derive_period(position), position);
    }

    pub fn set_by_discrete(&self, period: Period) {
        self.retarget(period, canonical_position(period));
    }

    pub fn snapshot(&self) -> PeriodSnapshot {
        self.shared.lock().snapshot()
    }

    /// Receiver that observes every transition start and commit.
    pub fn subscribe(&self) -> watch::Receiver<PeriodSnapshot> {
        self.shared.tx.subscribe()
    }

    /// Tear the view down; a pending settle never commits.
    pub fn close(&self) {
        let mut timer = self.settle_timer.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = timer.take() {
            handle.cancel();
        }
        let mut state = self.shared.lock();
        state.closed = true;
        state.pending = None;
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }

    fn retarget(&self, period: Period, position: f64) {
        let mut timer = self.settle_timer.lock().unwrap_or_else(|e| e.into_inner());

        let generation = {
            let mut state = self.shared.lock();
            if state.closed {
                return;
            }
            state.generation += 1;
            state.pending = Some((period, position));
            self.shared.tx.send_replace(state.snapshot());
            state.generation
        };

        if let Some(previous) = timer.take() {
            previous.cancel();
        }
        let shared = self.shared.clone();
        *timer = Some(schedule_once(self.settle_delay, move || {
            shared.settle(generation)
        }));
    }
}

impl Default for TimeTravel {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_SETTLE_MS))
    }
}

impl Drop for TimeTravel {
    fn drop(&mut self) {
        self.close();
    }
}
