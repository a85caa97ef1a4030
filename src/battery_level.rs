use std::fmt;

use crate::error::{GovernorError, Result};
use crate::sysfs::ChargeDevice;

/// Lowest percentage a user may ask the battery to be held at.
pub const MIN_PERCENTAGE: u8 = 39;
/// Highest percentage a user may ask the battery to be held at.
pub const MAX_PERCENTAGE: u8 = 100;

/// The charge level a user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryLevel {
    /// Hold the battery wherever it currently is.
    Live,
    Custom(u8),
}

impl TryFrom<u8> for BatteryLevel {
    type Error = GovernorError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            MIN_PERCENTAGE..=MAX_PERCENTAGE => Ok(Self::Custom(value)),
            other => Err(GovernorError::InvalidInput(other)),
        }
    }
}

impl BatteryLevel {
    /// Resolve the request into a fixed-point threshold, reading the live
    /// capacity when no explicit percentage was given.
    pub async fn threshold<D>(&self, device: &D) -> Result<Threshold>
    where
        D: ChargeDevice + ?Sized,
    {
        let percentage = match self {
            BatteryLevel::Custom(p) => *p,
            BatteryLevel::Live => {
                let capacity = device
                    .capacity()
                    .await
                    .map_err(|e| GovernorError::TelemetryUnavailable(Box::new(e)))?;
                capacity.clamp(0, 100) as u8
            }
        };
        Ok(Threshold::from_percentage(percentage))
    }
}

/// Charge ceiling in hundredths of a percent, the scale `capacity_raw` uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Threshold(u32);

impl Threshold {
    pub const UNSET: Threshold = Threshold(0);

    /// 100% and 99% are pulled down a quarter point so the raw reading can
    /// actually climb above them.
    pub fn from_percentage(percentage: u8) -> Self {
        match percentage {
            100 => Self(9975),
            99 => Self(9875),
            p => Self(u32::from(p) * 100),
        }
    }

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    pub const fn is_set(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}
