//! Access to the power-supply pseudo-files the governor reads and writes.

use std::path::{Path, PathBuf};

use async_fs::OpenOptions;
use async_trait::async_trait;
use futures_lite::AsyncWriteExt;

use crate::error::{GovernorError, Result};
use crate::{
    CAPACITY_FILE, CAPACITY_RAW_FILE, CURRENT_LIMIT_FILE, INPUT_CURRENT_FILE, STATUS_FILE,
};

/// Charge current limit that leaves the charger IC unconstrained, in µA.
pub const UNRESTRICTED_CURRENT: i64 = 3_000_000;

/// Locations of the files backing a [`SysfsDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPaths {
    pub status: PathBuf,
    pub current_limit: PathBuf,
    pub capacity: PathBuf,
    pub capacity_raw: PathBuf,
    pub input_current: PathBuf,
}

impl Default for PlatformPaths {
    fn default() -> Self {
        Self {
            status: STATUS_FILE.into(),
            current_limit: CURRENT_LIMIT_FILE.into(),
            capacity: CAPACITY_FILE.into(),
            capacity_raw: CAPACITY_RAW_FILE.into(),
            input_current: INPUT_CURRENT_FILE.into(),
        }
    }
}

impl PlatformPaths {
    /// The default layout re-rooted below `root`, e.g. a scratch directory
    /// holding a copy of `/sys/class/power_supply`.
    pub fn under(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let rebase = |file: &str| root.join(file.trim_start_matches('/'));
        Self {
            status: rebase(STATUS_FILE),
            current_limit: rebase(CURRENT_LIMIT_FILE),
            capacity: rebase(CAPACITY_FILE),
            capacity_raw: rebase(CAPACITY_RAW_FILE),
            input_current: rebase(INPUT_CURRENT_FILE),
        }
    }
}

/// Charge telemetry and the current-limit control of one battery.
#[async_trait]
pub trait ChargeDevice: Send + Sync {
    /// Charging status as reported by the platform, e.g. `Charging`.
    async fn status(&self) -> Result<String>;

    /// Battery level in whole percent.
    async fn capacity(&self) -> Result<i64>;

    /// Battery level in hundredths of a percent.
    async fn capacity_raw(&self) -> Result<i64>;

    /// Current flowing in through the charging port, in µA.
    async fn input_current(&self) -> Result<i64>;

    /// The charge current limit currently in effect, in µA.
    async fn current_limit(&self) -> Result<i64>;

    /// Unconditionally write a new charge current limit.
    async fn write_current_limit(&self, value: i64) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct SysfsDevice {
    paths: PlatformPaths,
}

impl SysfsDevice {
    pub fn new(paths: PlatformPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &PlatformPaths {
        &self.paths
    }
}

#[async_trait]
impl ChargeDevice for SysfsDevice {
    async fn status(&self) -> Result<String> {
        read_value(&self.paths.status).await
    }

    async fn capacity(&self) -> Result<i64> {
        read_int(&self.paths.capacity).await
    }

    async fn capacity_raw(&self) -> Result<i64> {
        read_int(&self.paths.capacity_raw).await
    }

    async fn input_current(&self) -> Result<i64> {
        read_int(&self.paths.input_current).await
    }

    async fn current_limit(&self) -> Result<i64> {
        read_int(&self.paths.current_limit).await
    }

    async fn write_current_limit(&self, value: i64) -> Result<()> {
        write_int(&self.paths.current_limit, value).await
    }
}

async fn read_value(path: &Path) -> Result<String> {
    let content = async_fs::read_to_string(path)
        .await
        .map_err(|e| GovernorError::io(path, e))?;
    Ok(content.trim().to_owned())
}

async fn read_int(path: &Path) -> Result<i64> {
    let content = read_value(path).await?.to_lowercase();
    content.parse().map_err(|_| GovernorError::Parse {
        path: path.to_owned(),
        content,
    })
}

/// The control file must already exist; it is never created.
async fn write_int(path: &Path, value: i64) -> Result<()> {
    let mut file = OpenOptions::new()
        .read(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| GovernorError::io(path, e))?;
    file.write_all(value.to_string().as_bytes())
        .await
        .map_err(|e| GovernorError::io(path, e))?;
    file.flush().await.map_err(|e| GovernorError::io(path, e))
}

/// Apply `current` unless it is already the limit in effect.
///
/// Returns whether the control file was written.
pub async fn set_charge_current<D>(device: &D, current: i64) -> Result<bool>
where
    D: ChargeDevice + ?Sized,
{
    if device.current_limit().await? == current {
        tracing::trace!(current, "charge current already in effect");
        return Ok(false);
    }
    device.write_current_limit(current).await?;
    tracing::debug!(current, "charge current limit written");
    Ok(true)
}

/// Lift the limit, writing even if the platform already reports it lifted.
pub async fn restore_charge_current<D>(device: &D) -> Result<()>
where
    D: ChargeDevice + ?Sized,
{
    device.write_current_limit(UNRESTRICTED_CURRENT).await
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory battery recording every limit write.
    #[derive(Debug)]
    pub struct FakeDevice {
        capacity: AtomicI64,
        capacity_raw: AtomicI64,
        input_current: AtomicI64,
        limit: AtomicI64,
        fail_reads: AtomicBool,
        writes: Mutex<Vec<i64>>,
    }

    impl FakeDevice {
        pub fn new() -> Self {
            Self {
                capacity: AtomicI64::new(50),
                capacity_raw: AtomicI64::new(5000),
                input_current: AtomicI64::new(0),
                limit: AtomicI64::new(UNRESTRICTED_CURRENT),
                fail_reads: AtomicBool::new(false),
                writes: Mutex::new(Vec::new()),
            }
        }

        pub fn set_capacity(&self, value: i64) {
            self.capacity.store(value, Ordering::SeqCst);
        }

        pub fn set_capacity_raw(&self, value: i64) {
            self.capacity_raw.store(value, Ordering::SeqCst);
        }

        pub fn set_input_current(&self, value: i64) {
            self.input_current.store(value, Ordering::SeqCst);
        }

        pub fn fail_reads(&self) {
            self.fail_reads.store(true, Ordering::SeqCst);
        }

        pub fn limit(&self) -> i64 {
            self.limit.load(Ordering::SeqCst)
        }

        pub fn writes(&self) -> Vec<i64> {
            self.writes.lock().unwrap().clone()
        }

        fn read(&self, cell: &AtomicI64) -> Result<i64> {
            if self.fail_reads.load(Ordering::SeqCst) {
                return Err(GovernorError::io(
                    "/fake",
                    std::io::Error::from(std::io::ErrorKind::NotFound),
                ));
            }
            Ok(cell.load(Ordering::SeqCst))
        }
    }

    #[async_trait]
    impl ChargeDevice for FakeDevice {
        async fn status(&self) -> Result<String> {
            let input = self.read(&self.input_current)?;
            Ok(if input > 0 { "Charging" } else { "Discharging" }.to_owned())
        }

        async fn capacity(&self) -> Result<i64> {
            self.read(&self.capacity)
        }

        async fn capacity_raw(&self) -> Result<i64> {
            self.read(&self.capacity_raw)
        }

        async fn input_current(&self) -> Result<i64> {
            self.read(&self.input_current)
        }

        async fn current_limit(&self) -> Result<i64> {
            self.read(&self.limit)
        }

        async fn write_current_limit(&self, value: i64) -> Result<()> {
            self.writes.lock().unwrap().push(value);
            self.limit.store(value, Ordering::SeqCst);
            Ok(())
        }
    }
}
