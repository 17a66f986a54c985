//! Day/night cycle for the immersive view.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use ts_rs::TS;

use super::timer::{schedule_repeating, TimerHandle};

pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TimeOfDay {
    Day,
    Sunset,
    Night,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkyConfig {
    pub sun_position: [f32; 3],
    pub turbidity: f32,
    pub rayleigh: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lighting {
    pub ambient_intensity: f32,
    pub directional_intensity: f32,
    pub directional_position: [f32; 3],
}

impl TimeOfDay {
    pub fn next(self) -> Self {
        match self {
            TimeOfDay::Day => TimeOfDay::Sunset,
            TimeOfDay::Sunset => TimeOfDay::Night,
            TimeOfDay::Night => TimeOfDay::Day,
        }
    }

    pub fn sky(self) -> SkyConfig {
        match self {
            TimeOfDay::Day => SkyConfig {
                sun_position: [0.0, 1.0, 0.0],
                turbidity: 10.0,
                rayleigh: 0.5,
            },
            TimeOfDay::Sunset => SkyConfig {
                sun_position: [-1.0, 0.2, 0.0],
                turbidity: 7.0,
                rayleigh: 2.0,
            },
            TimeOfDay::Night => SkyConfig {
                sun_position: [0.0, -1.0, 0.0],
                turbidity: 20.0,
                rayleigh: 0.2,
            },
        }
    }

    pub fn lighting(self) -> Lighting {
        if self == TimeOfDay::Night {
            Lighting {
                ambient_intensity: 0.2,
                directional_intensity: 0.2,
                directional_position: [-5.0, -5.0, -5.0],
            }
        } else {
            Lighting {
                ambient_intensity: 0.5,
                directional_intensity: 1.0,
                directional_position: [5.0, 5.0, 5.0],
            }
        }
    }
}

/// Advances [`TimeOfDay`] on a repeating timer until stopped or dropped.
pub struct DayNightCycle {
    current: Arc<Mutex<TimeOfDay>>,
    timer: TimerHandle,
}

impl DayNightCycle {
    /// Start at `Day`. Must be called inside a tokio runtime.
    pub fn start(interval: Duration) -> Self {
        let current = Arc::new(Mutex::new(TimeOfDay::Day));
        let tick = current.clone();
        let timer = schedule_repeating(interval, move || {
            let mut phase = tick.lock().unwrap_or_else(|e| e.into_inner());
            *phase = phase.next();
            tracing::trace!(phase = ?*phase, "Day/night advanced");
        });
        Self { current, timer }
    }

    pub fn current(&self) -> TimeOfDay {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn stop(&self) {
        self.timer.cancel();
    }

    pub fn is_running(&self) -> bool {
        !self.timer.is_cancelled()
    }
}

impl Drop for DayNightCycle {
    fn drop(&mut self) {
        self.timer.cancel();
    }
}
