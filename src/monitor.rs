//! Decides what a polling loop should report given successive snapshots.

use std::fmt;
use std::time::Duration;

use log::warn;

use crate::error::UPSError;
use crate::status::StatusSnapshot;
use crate::transport::Transport;
use crate::ups::UPS;

#[derive(Debug, Clone, PartialEq)]
pub struct Thresholds {
    pub poll_delay: u64,
    pub on_battery_poll_delay: u64,
    pub communication_failed_poll_delay: u64,
    /// Seconds on battery before the host is shut down. 0 means never.
    pub seconds_to_shutdown: u64,
    /// Percent.
    pub battery_low_threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    OnBattery {
        charge: Option<f32>,
        time_remaining: Option<f32>,
    },
    PowerRestored,
    LowBattery {
        charge: f32,
    },
    Overload {
        load_percent: Option<f32>,
    },
    OverloadCleared,
    CommunicationLost(String),
    CommunicationRestored,
    Shutdown,
}

impl Alert {
    pub fn subject(&self) -> &'static str {
        match self {
            Alert::OnBattery { .. } => "Utility failed - running on battery.",
            Alert::PowerRestored => "Utility back.",
            Alert::LowBattery { .. } => "Battery low capacity.",
            Alert::Overload { .. } => "UPS overloaded.",
            Alert::OverloadCleared => "UPS overload cleared.",
            Alert::CommunicationLost(_) => "UPS communication failed.",
            Alert::CommunicationRestored => "UPS communication restored.",
            Alert::Shutdown => "Utility failed - shutting down.",
        }
    }

    /// Whether the alert reports a problem rather than a recovery.
    pub fn is_problem(&self) -> bool {
        !matches!(
            self,
            Alert::PowerRestored | Alert::OverloadCleared | Alert::CommunicationRestored
        )
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.subject())?;
        match self {
            Alert::OnBattery {
                charge,
                time_remaining,
            } => write!(
                f,
                " Charge {}%, {} min remaining.",
                display(charge),
                display(time_remaining)
            ),
            Alert::LowBattery { charge } => write!(f, " Charge {}%.", charge),
            Alert::Overload { load_percent } => write!(f, " Load {}%.", display(load_percent)),
            Alert::CommunicationLost(reason) => write!(f, " {}", reason),
            _ => Ok(()),
        }
    }
}

fn display(value: &Option<f32>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}

pub struct Monitor {
    thresholds: Thresholds,
    on_battery: bool,
    seconds_until_shutdown: i64,
    sent_low_battery: bool,
    overloaded: bool,
    communication_lost: bool,
    shutdown_sent: bool,
}

impl Monitor {
    pub fn new(thresholds: Thresholds) -> Monitor {
        let seconds_until_shutdown = thresholds.seconds_to_shutdown as i64;
        Monitor {
            thresholds,
            on_battery: false,
            seconds_until_shutdown,
            sent_low_battery: false,
            overloaded: false,
            communication_lost: false,
            shutdown_sent: false,
        }
    }

    /// Logs in before the first poll. An unreachable card is reported like
    /// any failed poll rather than stopping the monitor.
    pub fn connect<T: Transport>(&mut self, ups: &UPS<T>) -> Vec<Alert> {
        match ups.login() {
            Ok(()) => Vec::new(),
            Err(e) => {
                warn!("UPS login failed, will keep polling: {}", e);
                self.observe_failure(&e)
            }
        }
    }

    /// Takes one snapshot and returns the resulting alerts along with it.
    pub fn poll<T: Transport>(&mut self, ups: &UPS<T>) -> (Vec<Alert>, Option<StatusSnapshot>) {
        match ups.get_all_status() {
            Ok(status) => (self.observe(&status), Some(status)),
            Err(e) => {
                warn!(
                    "UPS communication failed - retrying in {}s: {}",
                    self.thresholds.communication_failed_poll_delay, e
                );
                (self.observe_failure(&e), None)
            }
        }
    }

    pub fn observe(&mut self, status: &StatusSnapshot) -> Vec<Alert> {
        let elapsed = self.next_delay().as_secs();
        let mut alerts = Vec::new();

        if self.communication_lost {
            self.communication_lost = false;
            alerts.push(Alert::CommunicationRestored);
        }

        if status.on_battery() {
            if self.on_battery {
                self.count_down(elapsed, &mut alerts);
            } else {
                self.on_battery = true;
                alerts.push(Alert::OnBattery {
                    charge: status.battery.charge,
                    time_remaining: status.battery.time_remaining,
                });
            }

            if let Some(charge) = status.battery.charge {
                if charge < self.thresholds.battery_low_threshold && !self.sent_low_battery {
                    self.sent_low_battery = true;
                    alerts.push(Alert::LowBattery { charge });
                }
            }
        } else if self.on_battery {
            self.on_battery = false;
            self.sent_low_battery = false;
            self.shutdown_sent = false;
            self.seconds_until_shutdown = self.thresholds.seconds_to_shutdown as i64;
            alerts.push(Alert::PowerRestored);
        }

        let overloaded = status
            .output
            .overload
            .as_deref()
            .map_or(false, event_active);
        if overloaded != self.overloaded {
            self.overloaded = overloaded;
            alerts.push(if overloaded {
                Alert::Overload {
                    load_percent: status.output.load_percent,
                }
            } else {
                Alert::OverloadCleared
            });
        }

        alerts
    }

    /// A failed poll during an outage still uses up battery time, so the
    /// shutdown countdown keeps running while the card is unreachable.
    pub fn observe_failure(&mut self, err: &UPSError) -> Vec<Alert> {
        let elapsed = self.next_delay().as_secs();
        let mut alerts = Vec::new();

        if !self.communication_lost {
            self.communication_lost = true;
            alerts.push(Alert::CommunicationLost(err.to_string()));
        }
        if self.on_battery {
            self.count_down(elapsed, &mut alerts);
        }

        alerts
    }

    fn count_down(&mut self, elapsed: u64, alerts: &mut Vec<Alert>) {
        self.seconds_until_shutdown -= elapsed as i64;

        if self.thresholds.seconds_to_shutdown > 0
            && self.seconds_until_shutdown <= 0
            && !self.shutdown_sent
        {
            self.shutdown_sent = true;
            alerts.push(Alert::Shutdown);
        }
    }

    pub fn on_battery(&self) -> bool {
        self.on_battery
    }

    pub fn seconds_until_shutdown(&self) -> i64 {
        self.seconds_until_shutdown
    }

    pub fn next_delay(&self) -> Duration {
        let seconds = if self.communication_lost {
            self.thresholds.communication_failed_poll_delay
        } else if self.on_battery {
            self.thresholds.on_battery_poll_delay
        } else {
            self.thresholds.poll_delay
        };
        Duration::from_secs(seconds)
    }
}

// Event points read "Inactive" (or a zero flag) while the condition is clear.
fn event_active(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "inactive" | "normal" | "no" | "off" | "false" | "cleared"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportError;
    use crate::points::Readings;
    use crate::transport::{Credentials, MockTransport, Reply};
    use crate::ups::LOGIN_PATH;

    fn thresholds() -> Thresholds {
        Thresholds {
            poll_delay: 10,
            on_battery_poll_delay: 5,
            communication_failed_poll_delay: 3,
            seconds_to_shutdown: 10,
            battery_low_threshold: 50.0,
        }
    }

    fn snapshot(source: &str, charge: &str, overload: &str) -> StatusSnapshot {
        let body = format!(
            "v4872=\"{}\";v4153=\"{}\";v4150=\"20\";v4215=\"{}\";v5861=\"104\"",
            source, charge, overload
        );
        StatusSnapshot::from_readings(&Readings::parse(&body).unwrap())
    }

    #[test]
    fn test_quiet_while_on_mains() {
        let mut monitor = Monitor::new(thresholds());
        assert!(monitor.observe(&snapshot("3", "100", "Inactive")).is_empty());
        assert!(monitor.observe(&snapshot("3", "100", "Inactive")).is_empty());
        assert_eq!(monitor.next_delay(), Duration::from_secs(10));
    }

    #[test]
    fn test_outage_counts_down_to_shutdown() {
        let mut monitor = Monitor::new(thresholds());

        assert_eq!(
            monitor.observe(&snapshot("5", "90", "Inactive")),
            vec![Alert::OnBattery {
                charge: Some(90.0),
                time_remaining: Some(20.0)
            }]
        );
        assert!(monitor.on_battery());
        assert_eq!(monitor.next_delay(), Duration::from_secs(5));

        assert!(monitor.observe(&snapshot("5", "85", "Inactive")).is_empty());
        assert_eq!(monitor.seconds_until_shutdown(), 5);

        assert_eq!(
            monitor.observe(&snapshot("5", "80", "Inactive")),
            vec![Alert::Shutdown]
        );
        assert!(monitor.observe(&snapshot("5", "75", "Inactive")).is_empty());
    }

    #[test]
    fn test_power_restored_resets_countdown() {
        let mut monitor = Monitor::new(thresholds());

        monitor.observe(&snapshot("5", "90", "Inactive"));
        monitor.observe(&snapshot("5", "90", "Inactive"));
        assert_eq!(
            monitor.observe(&snapshot("3", "90", "Inactive")),
            vec![Alert::PowerRestored]
        );
        assert_eq!(monitor.seconds_until_shutdown(), 10);
        assert!(!monitor.on_battery());
    }

    #[test]
    fn test_shutdown_disabled() {
        let mut monitor = Monitor::new(Thresholds {
            seconds_to_shutdown: 0,
            ..thresholds()
        });

        for _ in 0..10 {
            let alerts = monitor.observe(&snapshot("5", "90", "Inactive"));
            assert!(!alerts.contains(&Alert::Shutdown));
        }
    }

    #[test]
    fn test_low_battery_once_per_outage() {
        let mut monitor = Monitor::new(Thresholds {
            seconds_to_shutdown: 0,
            ..thresholds()
        });

        let alerts = monitor.observe(&snapshot("5", "40", "Inactive"));
        assert!(alerts.contains(&Alert::LowBattery { charge: 40.0 }));
        assert!(monitor.observe(&snapshot("5", "35", "Inactive")).is_empty());

        monitor.observe(&snapshot("3", "35", "Inactive"));
        let alerts = monitor.observe(&snapshot("5", "30", "Inactive"));
        assert!(alerts.contains(&Alert::LowBattery { charge: 30.0 }));
    }

    #[test]
    fn test_low_charge_on_mains_is_not_alerted() {
        let mut monitor = Monitor::new(thresholds());
        assert!(monitor.observe(&snapshot("3", "20", "Inactive")).is_empty());
    }

    #[test]
    fn test_overload_edges() {
        let mut monitor = Monitor::new(thresholds());

        assert_eq!(
            monitor.observe(&snapshot("3", "100", "Active")),
            vec![Alert::Overload {
                load_percent: Some(104.0)
            }]
        );
        assert!(monitor.observe(&snapshot("3", "100", "Active")).is_empty());
        assert_eq!(
            monitor.observe(&snapshot("3", "100", "Inactive")),
            vec![Alert::OverloadCleared]
        );
    }

    #[test]
    fn test_communication_loss_reported_once() {
        let mut monitor = Monitor::new(thresholds());
        let err = UPSError::Connectivity(TransportError::Timeout);

        let alerts = monitor.observe_failure(&err);
        assert_eq!(
            alerts,
            vec![Alert::CommunicationLost(
                "UPS unreachable: request timed out".to_string()
            )]
        );
        assert!(monitor.observe_failure(&err).is_empty());
        assert_eq!(monitor.next_delay(), Duration::from_secs(3));

        assert_eq!(
            monitor.observe(&snapshot("3", "100", "Inactive")),
            vec![Alert::CommunicationRestored]
        );
    }

    #[test]
    fn test_countdown_continues_while_unreachable() {
        let mut monitor = Monitor::new(thresholds());
        let err = UPSError::Connectivity(TransportError::Timeout);

        monitor.observe(&snapshot("5", "90", "Inactive"));

        // first failed poll follows the on-battery delay
        let alerts = monitor.observe_failure(&err);
        assert!(matches!(alerts[..], [Alert::CommunicationLost(_)]));
        assert_eq!(monitor.seconds_until_shutdown(), 5);

        assert!(monitor.observe_failure(&err).is_empty());
        assert_eq!(monitor.seconds_until_shutdown(), 2);

        assert_eq!(monitor.observe_failure(&err), vec![Alert::Shutdown]);
        assert!(monitor.observe_failure(&err).is_empty());
    }

    #[test]
    fn test_failures_on_mains_never_shut_down() {
        let mut monitor = Monitor::new(thresholds());
        let err = UPSError::Connectivity(TransportError::Timeout);

        for _ in 0..20 {
            assert!(!monitor.observe_failure(&err).contains(&Alert::Shutdown));
        }
        assert_eq!(monitor.seconds_until_shutdown(), 10);
    }

    #[test]
    fn test_unreachable_at_startup_keeps_monitoring() {
        let mut transport = MockTransport::new();
        transport
            .expect_get()
            .returning(|_, _, _| Err(TransportError::Connect("no route to host".to_string())));
        let ups = UPS::with_transport(transport, Credentials::new("admin", "secret"));
        let mut monitor = Monitor::new(thresholds());

        let alerts = monitor.connect(&ups);
        assert!(matches!(alerts[..], [Alert::CommunicationLost(_)]));
        assert_eq!(monitor.next_delay(), Duration::from_secs(3));

        let (alerts, status) = monitor.poll(&ups);
        assert!(alerts.is_empty());
        assert!(status.is_none());
    }

    #[test]
    fn test_poll_recovers_after_startup_failure() {
        let mut transport = MockTransport::new();
        let mut calls = 0;
        transport.expect_get().returning(move |path, _, _| {
            calls += 1;
            match (calls, path) {
                (1, _) => Err(TransportError::Timeout),
                (_, LOGIN_PATH) => Ok(Reply::new(200, "sessACT=abc")),
                _ => Ok(Reply::new(200, "v4872=\"3\";v4153=\"100\"")),
            }
        });
        let ups = UPS::with_transport(transport, Credentials::new("admin", "secret"));
        let mut monitor = Monitor::new(thresholds());

        assert_eq!(monitor.connect(&ups).len(), 1);

        let (alerts, status) = monitor.poll(&ups);
        assert_eq!(alerts, vec![Alert::CommunicationRestored]);
        assert_eq!(status.and_then(|s| s.battery.charge), Some(100.0));
    }

    #[test]
    fn test_alert_text() {
        let alert = Alert::OnBattery {
            charge: Some(90.0),
            time_remaining: None,
        };
        assert_eq!(
            alert.to_string(),
            "Utility failed - running on battery. Charge 90%, ? min remaining."
        );
        assert!(alert.is_problem());
        assert!(!Alert::PowerRestored.is_problem());
    }
}
