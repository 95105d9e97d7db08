//! Client for UPS units managed through a Unity DP network card.
//!
//! ```no_run
//! use unity_dp::UPS;
//!
//! let ups = UPS::new("http://192.168.1.100", "admin", "password")?;
//! let status = ups.get_all_status()?;
//! println!("battery at {:?}%", status.battery.charge);
//! ups.silence_alarm()?;
//! # Ok::<(), unity_dp::UPSError>(())
//! ```

pub mod config;
pub mod error;
pub mod mailer;
pub mod monitor;
pub mod points;
pub mod status;
pub mod transport;
pub mod ups;

pub use error::{Result, TransportError, UPSError};
pub use points::{Command, Point, Setting, SettingValue, Subsystem};
pub use status::{PowerSource, StatusSnapshot};
pub use transport::{Credentials, HttpTransport, Reply, Transport};
pub use ups::UPS;
