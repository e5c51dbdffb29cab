//! Temperature schedules for progressive strategies

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error("schedule needs at least 2 stages, got {0}")]
    TooShort(usize),

    #[error("temperature {0} at stage {1} is outside [0.0, 1.0]")]
    OutOfRange(f32, usize),

    #[error("temperature rises from {0} to {1} at stage {2}")]
    NotDescending(f32, f32, usize),

    #[error("final stage must run at 0.0, got {0}")]
    NonZeroFinal(f32),
}

/// A validated, non-increasing temperature sequence whose last stage is 0.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct TemperatureSchedule(Vec<f32>);

impl TemperatureSchedule {
    pub fn new(temperatures: Vec<f32>) -> Result<Self, ScheduleError> {
        if temperatures.len() < 2 {
            return Err(ScheduleError::TooShort(temperatures.len()));
        }
        for (i, t) in temperatures.iter().enumerate() {
            if !(0.0..=1.0).contains(t) {
                return Err(ScheduleError::OutOfRange(*t, i));
            }
        }
        for (i, pair) in temperatures.windows(2).enumerate() {
            if pair[1] > pair[0] {
                return Err(ScheduleError::NotDescending(pair[0], pair[1], i + 1));
            }
        }
        match temperatures.last() {
            Some(last) if *last != 0.0 => Err(ScheduleError::NonZeroFinal(*last)),
            _ => Ok(Self(temperatures)),
        }
    }

    pub fn temperatures(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TemperatureSchedule {
    fn default() -> Self {
        Self(vec![1.0, 0.7, 0.5, 0.3, 0.0])
    }
}

impl TryFrom<Vec<f32>> for TemperatureSchedule {
    type Error = ScheduleError;

    fn try_from(value: Vec<f32>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TemperatureSchedule> for Vec<f32> {
    fn from(schedule: TemperatureSchedule) -> Self {
        schedule.0
    }
}
