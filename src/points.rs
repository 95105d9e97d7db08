//! Vendor data points exposed by the Unity DP card and the wire encoding
//! used to read and write them.
//!
//! Reads return a `;`-separated list of `v<id>="<value>"` segments, writes
//! are a form posted to `httpSet.htm` wrapped in `begin`/`end` markers.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::warn;

use crate::error::{Result, UPSError};

pub const SESSION_KEY: &str = "sessACT";

// Values the card reports for points it does not implement.
const NO_SUPPORT: &str = "No Support";
const PLACEHOLDER: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subsystem {
    System,
    Battery,
    Input,
    Output,
    Bypass,
}

impl Subsystem {
    pub fn points(self) -> Vec<Point> {
        Point::ALL
            .iter()
            .copied()
            .filter(|point| point.subsystem() == self)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Point {
    FirmwareVersion,
    Manufacturer,
    ModelNumber,
    SerialNumber,
    ManufactureDate,
    InletTemperature,
    UpsTopology,
    UpsSource,
    BlackOutCount,
    BrownOutCount,
    SystemName,
    LossOfRedundancy,
    SiteIdentifier,
    SiteEquipmentTag,
    AutoRestart,
    AutoRestartDelay,
    AudibleAlarmControl,

    BatteryCharge,
    BatteryTimeRemaining,
    BatteryChargeStatus,
    BatteryDcBusVoltage,
    BatteryChargerState,
    BatteryTestResult,
    BatteryStatus,
    BatteryLow,
    LowBatteryWarningTime,

    InputVoltage,
    InputCurrent,
    InputFrequency,
    InputMaxVoltage,
    InputMinVoltage,
    InputNominalVoltage,
    InputUndervoltage,

    OutputVoltage,
    OutputAmps,
    OutputWatts,
    OutputVa,
    OutputLoadPercent,
    OutputPowerFactor,
    OutputFrequency,
    OutputOverload,

    BypassVoltage,
    BypassCurrent,
    BypassFrequency,
    BypassNominalVoltage,
    BypassNotAvailable,
}

impl Point {
    pub const ALL: [Point; 46] = [
        Point::FirmwareVersion,
        Point::Manufacturer,
        Point::ModelNumber,
        Point::SerialNumber,
        Point::ManufactureDate,
        Point::InletTemperature,
        Point::UpsTopology,
        Point::UpsSource,
        Point::BlackOutCount,
        Point::BrownOutCount,
        Point::SystemName,
        Point::LossOfRedundancy,
        Point::SiteIdentifier,
        Point::SiteEquipmentTag,
        Point::AutoRestart,
        Point::AutoRestartDelay,
        Point::AudibleAlarmControl,
        Point::BatteryCharge,
        Point::BatteryTimeRemaining,
        Point::BatteryChargeStatus,
        Point::BatteryDcBusVoltage,
        Point::BatteryChargerState,
        Point::BatteryTestResult,
        Point::BatteryStatus,
        Point::BatteryLow,
        Point::LowBatteryWarningTime,
        Point::InputVoltage,
        Point::InputCurrent,
        Point::InputFrequency,
        Point::InputMaxVoltage,
        Point::InputMinVoltage,
        Point::InputNominalVoltage,
        Point::InputUndervoltage,
        Point::OutputVoltage,
        Point::OutputAmps,
        Point::OutputWatts,
        Point::OutputVa,
        Point::OutputLoadPercent,
        Point::OutputPowerFactor,
        Point::OutputFrequency,
        Point::OutputOverload,
        Point::BypassVoltage,
        Point::BypassCurrent,
        Point::BypassFrequency,
        Point::BypassNominalVoltage,
        Point::BypassNotAvailable,
    ];

    pub fn id(self) -> u16 {
        match self {
            Point::FirmwareVersion => 4335,
            Point::Manufacturer => 4333,
            Point::ModelNumber => 4240,
            Point::SerialNumber => 4244,
            Point::ManufactureDate => 6215,
            Point::InletTemperature => 4291,
            Point::UpsTopology => 6199,
            Point::UpsSource => 4872,
            Point::BlackOutCount => 4120,
            Point::BrownOutCount => 4119,
            Point::SystemName => 4246,
            Point::LossOfRedundancy => 4825,
            Point::SiteIdentifier => 4247,
            Point::SiteEquipmentTag => 4248,
            Point::AutoRestart => 5831,
            Point::AutoRestartDelay => 4710,
            Point::AudibleAlarmControl => 5830,

            Point::BatteryCharge => 4153,
            Point::BatteryTimeRemaining => 4150,
            Point::BatteryChargeStatus => 5799,
            Point::BatteryDcBusVoltage => 4148,
            Point::BatteryChargerState => 6192,
            Point::BatteryTestResult => 6181,
            Point::BatteryStatus => 4871,
            Point::BatteryLow => 4162,
            Point::LowBatteryWarningTime => 5802,

            Point::InputVoltage => 4096,
            Point::InputCurrent => 4113,
            Point::InputFrequency => 4105,
            Point::InputMaxVoltage => 4106,
            Point::InputMinVoltage => 4107,
            Point::InputNominalVoltage => 4102,
            Point::InputUndervoltage => 5568,

            Point::OutputVoltage => 4385,
            Point::OutputAmps => 4204,
            Point::OutputWatts => 4208,
            Point::OutputVa => 4209,
            Point::OutputLoadPercent => 5861,
            Point::OutputPowerFactor => 4212,
            Point::OutputFrequency => 4207,
            Point::OutputOverload => 4215,

            Point::BypassVoltage => 4128,
            Point::BypassCurrent => 5570,
            Point::BypassFrequency => 4131,
            Point::BypassNominalVoltage => 4259,
            Point::BypassNotAvailable => 4135,
        }
    }

    /// Dotted `subsystem.field` name, as accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Point::FirmwareVersion => "system.firmware_version",
            Point::Manufacturer => "system.manufacturer",
            Point::ModelNumber => "system.model_number",
            Point::SerialNumber => "system.serial_number",
            Point::ManufactureDate => "system.manufacture_date",
            Point::InletTemperature => "system.inlet_temperature",
            Point::UpsTopology => "system.ups_topology",
            Point::UpsSource => "system.ups_source",
            Point::BlackOutCount => "system.black_out_count",
            Point::BrownOutCount => "system.brown_out_count",
            Point::SystemName => "system.system_name",
            Point::LossOfRedundancy => "system.loss_of_redundancy",
            Point::SiteIdentifier => "system.site_identifier",
            Point::SiteEquipmentTag => "system.site_equipment_tag",
            Point::AutoRestart => "system.auto_restart",
            Point::AutoRestartDelay => "system.auto_restart_delay",
            Point::AudibleAlarmControl => "system.audible_alarm_control",

            Point::BatteryCharge => "battery.charge",
            Point::BatteryTimeRemaining => "battery.time_remaining",
            Point::BatteryChargeStatus => "battery.charge_status",
            Point::BatteryDcBusVoltage => "battery.dc_bus_voltage",
            Point::BatteryChargerState => "battery.charger_state",
            Point::BatteryTestResult => "battery.test_result",
            Point::BatteryStatus => "battery.status",
            Point::BatteryLow => "battery.low",
            Point::LowBatteryWarningTime => "battery.low_battery_warning_time",

            Point::InputVoltage => "input.voltage_ln",
            Point::InputCurrent => "input.current_amps",
            Point::InputFrequency => "input.frequency_hz",
            Point::InputMaxVoltage => "input.max_voltage_ln",
            Point::InputMinVoltage => "input.min_voltage_ln",
            Point::InputNominalVoltage => "input.nominal_voltage",
            Point::InputUndervoltage => "input.undervoltage",

            Point::OutputVoltage => "output.voltage_ln",
            Point::OutputAmps => "output.amps",
            Point::OutputWatts => "output.watts",
            Point::OutputVa => "output.va",
            Point::OutputLoadPercent => "output.load_percent",
            Point::OutputPowerFactor => "output.pf",
            Point::OutputFrequency => "output.frequency",
            Point::OutputOverload => "output.overload",

            Point::BypassVoltage => "bypass.voltage",
            Point::BypassCurrent => "bypass.current",
            Point::BypassFrequency => "bypass.frequency",
            Point::BypassNominalVoltage => "bypass.nominal_voltage",
            Point::BypassNotAvailable => "bypass.not_available",
        }
    }

    pub fn subsystem(self) -> Subsystem {
        match self.name().split('.').next() {
            Some("battery") => Subsystem::Battery,
            Some("input") => Subsystem::Input,
            Some("output") => Subsystem::Output,
            Some("bypass") => Subsystem::Bypass,
            _ => Subsystem::System,
        }
    }

    /// Key the point carries in read replies, e.g. `v4153`.
    pub fn key(self) -> String {
        format!("v{}", self.id())
    }

    /// Query pair requesting this point from `httpGet.htm`.
    pub fn query(self) -> (String, String) {
        (self.key(), format!("vel~pnt~{}", self.id()))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Point {
    type Err = UPSError;

    fn from_str(s: &str) -> Result<Point> {
        Point::ALL
            .iter()
            .copied()
            .find(|point| point.name() == s)
            .ok_or_else(|| UPSError::Unknown {
                kind: "point",
                name: s.to_string(),
            })
    }
}

/// Values of one read reply, keyed by point key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Readings {
    values: HashMap<String, String>,
}

impl Readings {
    /// Parses a `httpGet.htm` reply. Fails only when the body is not a
    /// `key=value` list at all; unknown keys are kept, absent ones simply
    /// read as `None`.
    pub fn parse(body: &str) -> Result<Readings> {
        let mut values = HashMap::new();

        for segment in segments(body) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }

            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| UPSError::Parse(format!("segment without '=': {:?}", segment)))?;

            let key = key.trim();
            if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(UPSError::Parse(format!("invalid key {:?}", key)));
            }

            values.insert(key.to_string(), unquote(value.trim())?.to_string());
        }

        Ok(Readings { values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn session_token(&self) -> Option<&str> {
        self.values
            .get(SESSION_KEY)
            .map(String::as_str)
            .filter(|token| !token.is_empty())
    }

    pub fn contains_any(&self, points: &[Point]) -> bool {
        points
            .iter()
            .any(|point| self.values.contains_key(&point.key()))
    }

    /// Reported text of a point; unsupported or placeholder values are `None`.
    pub fn text(&self, point: Point) -> Option<String> {
        self.values
            .get(&point.key())
            .map(|value| value.trim())
            .filter(|value| !value.is_empty() && *value != NO_SUPPORT && *value != PLACEHOLDER)
            .map(str::to_string)
    }

    pub fn number(&self, point: Point) -> Option<f32> {
        let text = self.text(point)?;
        match text.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("{} is not a number: {:?}", point, text);
                None
            }
        }
    }

    pub fn integer(&self, point: Point) -> Option<u32> {
        let text = self.text(point)?;
        match text.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("{} is not an integer: {:?}", point, text);
                None
            }
        }
    }
}

// Splits on `;` outside double quotes, so quoted text may carry `;`.
fn segments(body: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut quoted = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        match c {
            '"' => quoted = !quoted,
            ';' if !quoted => {
                segments.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&body[start..]);
    segments
}

fn unquote(value: &str) -> Result<&str> {
    match value.strip_prefix('"') {
        None => Ok(value),
        Some(rest) => rest
            .strip_suffix('"')
            .ok_or_else(|| UPSError::Parse(format!("unterminated value {:?}", value))),
    }
}

/// Pulls a `sessACT` token out of a login or session-info reply. These
/// replies are not strictly `key=value` lists, so this is lenient.
pub fn find_session_token(body: &str) -> Option<String> {
    body.split(';')
        .filter_map(|segment| segment.trim().strip_prefix(SESSION_KEY)?.strip_prefix('='))
        .map(|token| token.split('=').next().unwrap_or_default().trim_matches('"'))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

/// Form posted to `httpSet.htm` to write one point.
pub fn write_form(point_id: u16, value: &SettingValue, session: &str) -> Vec<(String, String)> {
    let (field, encoded) = match value {
        SettingValue::Number(n) => (
            format!("commBtn{}", point_id),
            format!("{{0}}vel~pnt~{}~0|val~num~{}", point_id, n),
        ),
        SettingValue::Text(s) => (
            format!("str{}", point_id),
            format!("vel~pnt~{}~0|val~str~{}", point_id, s),
        ),
    };

    vec![
        ("devId".to_string(), "0".to_string()),
        ("begin".to_string(), "http~set~begin".to_string()),
        (field, encoded),
        ("end".to_string(), "http~set~end".to_string()),
        (SESSION_KEY.to_string(), session.to_string()),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SettingKind {
    Text,
    Number,
    Flag,
}

/// Writable configuration points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    SiteIdentifier,
    SiteEquipmentTag,
    SystemName,
    AutoRestart,
    AutoRestartDelay,
    AudibleAlarmControl,
    LowBatteryWarningTime,
}

impl Setting {
    pub const ALL: [Setting; 7] = [
        Setting::SiteIdentifier,
        Setting::SiteEquipmentTag,
        Setting::SystemName,
        Setting::AutoRestart,
        Setting::AutoRestartDelay,
        Setting::AudibleAlarmControl,
        Setting::LowBatteryWarningTime,
    ];

    pub fn point(self) -> Point {
        match self {
            Setting::SiteIdentifier => Point::SiteIdentifier,
            Setting::SiteEquipmentTag => Point::SiteEquipmentTag,
            Setting::SystemName => Point::SystemName,
            Setting::AutoRestart => Point::AutoRestart,
            Setting::AutoRestartDelay => Point::AutoRestartDelay,
            Setting::AudibleAlarmControl => Point::AudibleAlarmControl,
            Setting::LowBatteryWarningTime => Point::LowBatteryWarningTime,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Setting::SiteIdentifier => "site_identifier",
            Setting::SiteEquipmentTag => "site_equipment_tag",
            Setting::SystemName => "system_name",
            Setting::AutoRestart => "auto_restart",
            Setting::AutoRestartDelay => "auto_restart_delay",
            Setting::AudibleAlarmControl => "audible_alarm_control",
            Setting::LowBatteryWarningTime => "low_battery_warning_time",
        }
    }

    fn kind(self) -> SettingKind {
        match self {
            Setting::AutoRestart => SettingKind::Flag,
            Setting::AutoRestartDelay | Setting::LowBatteryWarningTime => SettingKind::Number,
            _ => SettingKind::Text,
        }
    }

    /// Converts user input into the value type the card expects for this
    /// setting. Flags are written as 1/0.
    pub fn parse_value(self, input: &str) -> Result<SettingValue> {
        let invalid = || UPSError::Unknown {
            kind: "value",
            name: format!("{}={}", self.name(), input),
        };

        match self.kind() {
            SettingKind::Text => Ok(SettingValue::Text(input.to_string())),
            SettingKind::Number => input
                .trim()
                .parse()
                .map(SettingValue::Number)
                .map_err(|_| invalid()),
            SettingKind::Flag => match input.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "on" | "yes" | "enabled" => Ok(SettingValue::Number(1)),
                "0" | "false" | "off" | "no" | "disabled" => Ok(SettingValue::Number(0)),
                _ => Err(invalid()),
            },
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Setting {
    type Err = UPSError;

    fn from_str(s: &str) -> Result<Setting> {
        Setting::ALL
            .iter()
            .copied()
            .find(|setting| setting.name() == s || setting.point().name() == s)
            .ok_or_else(|| UPSError::Unknown {
                kind: "setting",
                name: s.to_string(),
            })
    }
}

/// Control actions. Delays are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    BatteryTest,
    SilenceAlarm,
    Abort,
    ResetPowerStats,
    OutputOn(u32),
    OutputOff(u32),
    OutputReboot(u32),
}

impl Command {
    pub fn point_id(self) -> u16 {
        match self {
            Command::BatteryTest => 5858,
            Command::SilenceAlarm => 6257,
            Command::Abort => 6200,
            Command::ResetPowerStats => 6216,
            Command::OutputOn(_) => 5816,
            Command::OutputOff(_) => 5814,
            Command::OutputReboot(_) => 5815,
        }
    }

    pub fn value(self) -> SettingValue {
        match self {
            Command::OutputOn(delay) | Command::OutputOff(delay) | Command::OutputReboot(delay) => {
                SettingValue::Number(delay.into())
            }
            _ => SettingValue::Number(1),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Command::BatteryTest => write!(f, "battery test"),
            Command::SilenceAlarm => write!(f, "silence alarm"),
            Command::Abort => write!(f, "abort"),
            Command::ResetPowerStats => write!(f, "reset power stats"),
            Command::OutputOn(delay) => write!(f, "output on (delay {}s)", delay),
            Command::OutputOff(delay) => write!(f, "output off (delay {}s)", delay),
            Command::OutputReboot(delay) => write!(f, "output reboot (delay {}s)", delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_point_table_is_consistent() {
        let ids: HashSet<u16> = Point::ALL.iter().map(|p| p.id()).collect();
        let names: HashSet<&str> = Point::ALL.iter().map(|p| p.name()).collect();

        assert_eq!(ids.len(), Point::ALL.len());
        assert_eq!(names.len(), Point::ALL.len());

        for point in Point::ALL {
            assert_eq!(point.name().parse::<Point>().unwrap(), point);
        }
    }

    #[test]
    fn test_subsystem_points() {
        assert_eq!(Subsystem::System.points().len(), 17);
        assert_eq!(Subsystem::Battery.points().len(), 9);
        assert_eq!(Subsystem::Input.points().len(), 7);
        assert_eq!(Subsystem::Output.points().len(), 8);
        assert_eq!(Subsystem::Bypass.points().len(), 5);
        assert!(Subsystem::Battery.points().contains(&Point::BatteryCharge));
    }

    #[test]
    fn test_query_pair() {
        assert_eq!(
            Point::BatteryCharge.query(),
            ("v4153".to_string(), "vel~pnt~4153".to_string())
        );
    }

    #[test]
    fn test_parse_readings() {
        let readings =
            Readings::parse("v4153=\"85\";v4150=\"42.5\";v4335=\"No Support\";v4872=\"--\";sessACT=abc123;\n")
                .unwrap();

        assert_eq!(readings.len(), 5);
        assert_eq!(readings.number(Point::BatteryCharge), Some(85.0));
        assert_eq!(readings.number(Point::BatteryTimeRemaining), Some(42.5));
        assert_eq!(readings.text(Point::FirmwareVersion), None);
        assert_eq!(readings.text(Point::UpsSource), None);
        assert_eq!(readings.text(Point::InputVoltage), None);
        assert_eq!(readings.session_token(), Some("abc123"));
    }

    #[test]
    fn test_parse_keeps_equals_in_values() {
        let readings = Readings::parse("v4246=\"rack=a\"").unwrap();
        assert_eq!(readings.text(Point::SystemName).as_deref(), Some("rack=a"));
    }

    #[test]
    fn test_parse_semicolon_inside_quotes() {
        let readings = Readings::parse("v4247=\"Rack;1\";v4248=\"a=b;c\";v4153=\"85\"").unwrap();

        assert_eq!(readings.len(), 3);
        assert_eq!(readings.text(Point::SiteIdentifier).as_deref(), Some("Rack;1"));
        assert_eq!(readings.text(Point::SiteEquipmentTag).as_deref(), Some("a=b;c"));
        assert_eq!(readings.number(Point::BatteryCharge), Some(85.0));
    }

    #[test]
    fn test_parse_rejects_truncated_reply() {
        assert!(matches!(
            Readings::parse("v4153=\"85\";v4150=\"4"),
            Err(UPSError::Parse(_))
        ));
    }

    #[test]
    fn test_parse_rejects_html() {
        assert!(matches!(
            Readings::parse("<html><body>Login</body></html>"),
            Err(UPSError::Parse(_))
        ));
        assert!(matches!(
            Readings::parse("<a href=\"x\">"),
            Err(UPSError::Parse(_))
        ));
    }

    #[test]
    fn test_unparsable_number_reads_as_none() {
        let readings = Readings::parse("v4153=\"lots\";v4120=\"-3\"").unwrap();
        assert_eq!(readings.number(Point::BatteryCharge), None);
        assert_eq!(readings.integer(Point::BlackOutCount), None);
        assert_eq!(
            readings.text(Point::BatteryCharge).as_deref(),
            Some("lots")
        );
    }

    #[test]
    fn test_find_session_token() {
        assert_eq!(
            find_session_token("user=admin;sessACT=9f8e7d;level=3").as_deref(),
            Some("9f8e7d")
        );
        assert_eq!(
            find_session_token("sessACT=\"quoted\"").as_deref(),
            Some("quoted")
        );
        assert_eq!(find_session_token("sessACT=;other=1"), None);
        assert_eq!(find_session_token("<html></html>"), None);
    }

    #[test]
    fn test_write_form_for_command() {
        let form = write_form(
            Command::BatteryTest.point_id(),
            &Command::BatteryTest.value(),
            "tok",
        );

        assert_eq!(
            form,
            vec![
                ("devId".to_string(), "0".to_string()),
                ("begin".to_string(), "http~set~begin".to_string()),
                (
                    "commBtn5858".to_string(),
                    "{0}vel~pnt~5858~0|val~num~1".to_string()
                ),
                ("end".to_string(), "http~set~end".to_string()),
                ("sessACT".to_string(), "tok".to_string()),
            ]
        );
    }

    #[test]
    fn test_write_form_for_text() {
        let form = write_form(4247, &SettingValue::Text("Main Rack".to_string()), "tok");
        assert_eq!(
            form[2],
            (
                "str4247".to_string(),
                "vel~pnt~4247~0|val~str~Main Rack".to_string()
            )
        );
    }

    #[test]
    fn test_output_commands_carry_delay() {
        assert_eq!(Command::OutputOff(30).value(), SettingValue::Number(30));
        assert_eq!(Command::OutputOff(30).point_id(), 5814);
        assert_eq!(Command::SilenceAlarm.value(), SettingValue::Number(1));
    }

    #[test]
    fn test_setting_values() {
        assert_eq!(
            Setting::AutoRestart.parse_value("true").unwrap(),
            SettingValue::Number(1)
        );
        assert_eq!(
            Setting::AutoRestart.parse_value("off").unwrap(),
            SettingValue::Number(0)
        );
        assert_eq!(
            Setting::AutoRestartDelay.parse_value("120").unwrap(),
            SettingValue::Number(120)
        );
        assert_eq!(
            Setting::SiteIdentifier.parse_value("Main Rack").unwrap(),
            SettingValue::Text("Main Rack".to_string())
        );
        assert!(Setting::LowBatteryWarningTime.parse_value("soon").is_err());
        assert!(Setting::AutoRestart.parse_value("maybe").is_err());
    }

    #[test]
    fn test_setting_from_str() {
        assert_eq!(
            "site_identifier".parse::<Setting>().unwrap(),
            Setting::SiteIdentifier
        );
        assert_eq!(
            "battery.low_battery_warning_time".parse::<Setting>().unwrap(),
            Setting::LowBatteryWarningTime
        );
        assert!("battery.charge".parse::<Setting>().is_err());
    }
}
