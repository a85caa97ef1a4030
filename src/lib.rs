pub mod args;
pub mod battery_level;
pub mod dashboard;
pub mod error;
pub mod governor;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod sysfs;

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

pub use error::{GovernorError, Result};

const STATUS_FILE: &str = "/sys/class/power_supply/battery/status";
const CURRENT_LIMIT_FILE: &str = "/sys/class/power_supply/battery/constant_charge_current_max";
const CAPACITY_FILE: &str = "/sys/class/power_supply/bms/capacity";
const CAPACITY_RAW_FILE: &str = "/sys/class/power_supply/bms/capacity_raw";
const INPUT_CURRENT_FILE: &str = "/sys/class/power_supply/usb/input_current_now";

/// Where the control page listens unless told otherwise.
pub const DEFAULT_LISTEN: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 64001));
