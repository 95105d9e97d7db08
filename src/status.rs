use std::fmt;

use serde::Serialize;

use crate::points::{Point, Readings};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum PowerSource {
    Normal,
    Battery,
    Bypass,
    Other,
    Unknown(String),
}

impl PowerSource {
    pub fn from_code(code: &str) -> PowerSource {
        match code {
            "1" => PowerSource::Other,
            "3" | "6" | "7" => PowerSource::Normal,
            "4" => PowerSource::Bypass,
            "5" => PowerSource::Battery,
            other => PowerSource::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for PowerSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PowerSource::Normal => write!(f, "Normal"),
            PowerSource::Battery => write!(f, "Battery"),
            PowerSource::Bypass => write!(f, "Bypass"),
            PowerSource::Other => write!(f, "Other"),
            PowerSource::Unknown(code) => write!(f, "Unknown ({})", code),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemStatus {
    pub firmware_version: Option<String>,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
    pub serial_number: Option<String>,
    pub manufacture_date: Option<String>,
    pub inlet_temperature: Option<f32>,
    pub ups_topology: Option<String>,
    pub ups_source: Option<PowerSource>,
    pub black_out_count: Option<u32>,
    pub brown_out_count: Option<u32>,
    pub system_name: Option<String>,

    pub loss_of_redundancy: Option<String>,

    pub site_identifier: Option<String>,
    pub site_equipment_tag: Option<String>,
    pub auto_restart: Option<String>,
    pub auto_restart_delay: Option<u32>,
    pub audible_alarm_control: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatteryStatus {
    /// Percent.
    pub charge: Option<f32>,
    /// Minutes.
    pub time_remaining: Option<f32>,
    pub charge_status: Option<String>,
    pub dc_bus_voltage: Option<f32>,
    pub charger_state: Option<String>,
    pub test_result: Option<String>,
    pub status: Option<String>,

    pub low: Option<String>,

    pub low_battery_warning_time: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputStatus {
    pub voltage_ln: Option<f32>,
    pub current_amps: Option<f32>,
    pub frequency_hz: Option<f32>,
    pub max_voltage_ln: Option<f32>,
    pub min_voltage_ln: Option<f32>,
    pub nominal_voltage: Option<f32>,

    pub undervoltage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputStatus {
    pub voltage_ln: Option<f32>,
    pub amps: Option<f32>,
    pub watts: Option<f32>,
    pub va: Option<f32>,
    pub load_percent: Option<f32>,
    pub pf: Option<f32>,
    pub frequency: Option<f32>,

    pub overload: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BypassStatus {
    pub voltage: Option<f32>,
    pub current: Option<f32>,
    pub frequency: Option<f32>,
    pub nominal_voltage: Option<f32>,
    pub not_available: Option<String>,
}

/// Everything the card reported in a single read. Built once per fetch and
/// never updated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub system: SystemStatus,
    pub battery: BatteryStatus,
    pub input: InputStatus,
    pub output: OutputStatus,
    pub bypass: BypassStatus,
}

impl StatusSnapshot {
    pub fn from_readings(readings: &Readings) -> StatusSnapshot {
        StatusSnapshot {
            system: SystemStatus::from_readings(readings),
            battery: BatteryStatus::from_readings(readings),
            input: InputStatus::from_readings(readings),
            output: OutputStatus::from_readings(readings),
            bypass: BypassStatus::from_readings(readings),
        }
    }

    pub fn on_battery(&self) -> bool {
        self.system.ups_source == Some(PowerSource::Battery)
    }
}

impl SystemStatus {
    pub fn from_readings(readings: &Readings) -> SystemStatus {
        SystemStatus {
            firmware_version: readings.text(Point::FirmwareVersion),
            manufacturer: readings.text(Point::Manufacturer),
            model_number: readings.text(Point::ModelNumber),
            serial_number: readings.text(Point::SerialNumber),
            manufacture_date: readings.text(Point::ManufactureDate),
            inlet_temperature: readings.number(Point::InletTemperature),
            ups_topology: readings.text(Point::UpsTopology),
            ups_source: readings
                .text(Point::UpsSource)
                .map(|code| PowerSource::from_code(&code)),
            black_out_count: readings.integer(Point::BlackOutCount),
            brown_out_count: readings.integer(Point::BrownOutCount),
            system_name: readings.text(Point::SystemName),
            loss_of_redundancy: readings.text(Point::LossOfRedundancy),
            site_identifier: readings.text(Point::SiteIdentifier),
            site_equipment_tag: readings.text(Point::SiteEquipmentTag),
            auto_restart: readings.text(Point::AutoRestart),
            auto_restart_delay: readings.integer(Point::AutoRestartDelay),
            audible_alarm_control: readings.text(Point::AudibleAlarmControl),
        }
    }
}

impl BatteryStatus {
    pub fn from_readings(readings: &Readings) -> BatteryStatus {
        BatteryStatus {
            charge: readings.number(Point::BatteryCharge),
            time_remaining: readings.number(Point::BatteryTimeRemaining),
            charge_status: readings.text(Point::BatteryChargeStatus),
            dc_bus_voltage: readings.number(Point::BatteryDcBusVoltage),
            charger_state: readings.text(Point::BatteryChargerState),
            test_result: readings.text(Point::BatteryTestResult),
            status: readings.text(Point::BatteryStatus),
            low: readings.text(Point::BatteryLow),
            low_battery_warning_time: readings.integer(Point::LowBatteryWarningTime),
        }
    }
}

impl InputStatus {
    pub fn from_readings(readings: &Readings) -> InputStatus {
        InputStatus {
            voltage_ln: readings.number(Point::InputVoltage),
            current_amps: readings.number(Point::InputCurrent),
            frequency_hz: readings.number(Point::InputFrequency),
            max_voltage_ln: readings.number(Point::InputMaxVoltage),
            min_voltage_ln: readings.number(Point::InputMinVoltage),
            nominal_voltage: readings.number(Point::InputNominalVoltage),
            undervoltage: readings.text(Point::InputUndervoltage),
        }
    }
}

impl OutputStatus {
    pub fn from_readings(readings: &Readings) -> OutputStatus {
        let watts = readings.number(Point::OutputWatts);
        let va = readings.number(Point::OutputVa);

        OutputStatus {
            voltage_ln: readings.number(Point::OutputVoltage),
            amps: readings.number(Point::OutputAmps),
            watts,
            va,
            load_percent: readings.number(Point::OutputLoadPercent),
            pf: readings
                .number(Point::OutputPowerFactor)
                .or_else(|| power_factor(watts, va)),
            frequency: readings.number(Point::OutputFrequency),
            overload: readings.text(Point::OutputOverload),
        }
    }
}

impl BypassStatus {
    pub fn from_readings(readings: &Readings) -> BypassStatus {
        BypassStatus {
            voltage: readings.number(Point::BypassVoltage),
            current: readings.number(Point::BypassCurrent),
            frequency: readings.number(Point::BypassFrequency),
            nominal_voltage: readings.number(Point::BypassNominalVoltage),
            not_available: readings.text(Point::BypassNotAvailable),
        }
    }
}

// Not every firmware reports PF; derive it from real and apparent power.
fn power_factor(watts: Option<f32>, va: Option<f32>) -> Option<f32> {
    let (watts, va) = (watts?, va?);
    if va > 0.0 {
        Some((watts / va * 100.0).round() / 100.0)
    } else {
        None
    }
}
