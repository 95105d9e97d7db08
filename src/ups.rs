use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::{debug, info, warn};

use crate::error::{Result, TransportError, UPSError};
use crate::points::{
    find_session_token, write_form, Command, Point, Readings, Setting, SettingValue, Subsystem,
    SESSION_KEY,
};
use crate::status::{
    BatteryStatus, BypassStatus, InputStatus, OutputStatus, PowerSource, StatusSnapshot,
    SystemStatus,
};
use crate::transport::{Credentials, HttpTransport, Reply, Transport, DEFAULT_TIMEOUT};

pub const LOGIN_PATH: &str = "/protected/session/unityLogin.htm";
pub const SESSION_INFO_PATH: &str = "/protected/session/getSessionInfo.htm";
pub const GET_PATH: &str = "/httpGetSet/httpGet.htm";
pub const SET_PATH: &str = "/protected/httpSet.htm";

// Session endpoints address the card itself, data endpoints the UPS behind it.
const SESSION_DEV_ID: &str = "4";
const DATA_DEV_ID: &str = "0";

/// Client for one UPS behind a Unity DP card.
///
/// The session token lives behind a mutex that is held for a whole
/// exchange (refresh, request, re-login), so a shared client can be used
/// from several threads without two of them logging in over each other.
pub struct UPS<T: Transport = HttpTransport> {
    transport: T,
    credentials: Credentials,
    session: Mutex<Option<String>>,
}

impl UPS<HttpTransport> {
    pub fn new(base_url: &str, username: &str, password: &str) -> Result<UPS<HttpTransport>> {
        UPS::with_options(base_url, username, password, DEFAULT_TIMEOUT, false)
    }

    pub fn with_options(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
        accept_invalid_certs: bool,
    ) -> Result<UPS<HttpTransport>> {
        let transport = HttpTransport::new(base_url, timeout, accept_invalid_certs)?;
        debug!("UPS client for {}", transport.base_url());
        Ok(UPS::with_transport(
            transport,
            Credentials::new(username, password),
        ))
    }
}

impl<T: Transport> UPS<T> {
    pub fn with_transport(transport: T, credentials: Credentials) -> UPS<T> {
        UPS {
            transport,
            credentials,
            session: Mutex::new(None),
        }
    }

    /// Logs in straight away instead of on the first request.
    pub fn login(&self) -> Result<()> {
        let mut session = self.session();
        self.authenticate(&mut session)?;
        Ok(())
    }

    /// Forgets the session token. The card has no logout endpoint; its
    /// session simply times out.
    pub fn logout(&self) {
        *self.session() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_some()
    }

    pub fn get_all_status(&self) -> Result<StatusSnapshot> {
        let readings = self.fetch(&Point::ALL)?;
        Ok(StatusSnapshot::from_readings(&readings))
    }

    pub fn system(&self) -> Result<SystemStatus> {
        let readings = self.fetch(&Subsystem::System.points())?;
        Ok(SystemStatus::from_readings(&readings))
    }

    pub fn battery(&self) -> Result<BatteryStatus> {
        let readings = self.fetch(&Subsystem::Battery.points())?;
        Ok(BatteryStatus::from_readings(&readings))
    }

    pub fn input(&self) -> Result<InputStatus> {
        let readings = self.fetch(&Subsystem::Input.points())?;
        Ok(InputStatus::from_readings(&readings))
    }

    pub fn output(&self) -> Result<OutputStatus> {
        let readings = self.fetch(&Subsystem::Output.points())?;
        Ok(OutputStatus::from_readings(&readings))
    }

    pub fn bypass(&self) -> Result<BypassStatus> {
        let readings = self.fetch(&Subsystem::Bypass.points())?;
        Ok(BypassStatus::from_readings(&readings))
    }

    /// Raw text of a single point.
    pub fn read_point(&self, point: Point) -> Result<Option<String>> {
        Ok(self.fetch(&[point])?.text(point))
    }

    pub fn firmware_version(&self) -> Result<Option<String>> {
        self.read_point(Point::FirmwareVersion)
    }

    pub fn power_source(&self) -> Result<Option<PowerSource>> {
        Ok(self
            .read_point(Point::UpsSource)?
            .map(|code| PowerSource::from_code(&code)))
    }

    pub fn battery_charge(&self) -> Result<Option<f32>> {
        self.read_number(Point::BatteryCharge)
    }

    pub fn battery_time_remaining(&self) -> Result<Option<f32>> {
        self.read_number(Point::BatteryTimeRemaining)
    }

    pub fn battery_status(&self) -> Result<Option<String>> {
        self.read_point(Point::BatteryStatus)
    }

    pub fn input_voltage(&self) -> Result<Option<f32>> {
        self.read_number(Point::InputVoltage)
    }

    pub fn input_frequency(&self) -> Result<Option<f32>> {
        self.read_number(Point::InputFrequency)
    }

    pub fn output_voltage(&self) -> Result<Option<f32>> {
        self.read_number(Point::OutputVoltage)
    }

    pub fn output_load_percent(&self) -> Result<Option<f32>> {
        self.read_number(Point::OutputLoadPercent)
    }

    pub fn set_setting(&self, setting: Setting, value: SettingValue) -> Result<()> {
        self.write(
            setting.point().id(),
            &value,
            format!("{} = {}", setting, value),
        )
    }

    /// Sends a control action once. Commands are never retried: running a
    /// self-test or an output switch twice is not the same as running it once.
    pub fn command(&self, command: Command) -> Result<()> {
        self.write(command.point_id(), &command.value(), command.to_string())
    }

    pub fn battery_test(&self) -> Result<()> {
        self.command(Command::BatteryTest)
    }

    pub fn silence_alarm(&self) -> Result<()> {
        self.command(Command::SilenceAlarm)
    }

    pub fn abort(&self) -> Result<()> {
        self.command(Command::Abort)
    }

    pub fn reset_power_stats(&self) -> Result<()> {
        self.command(Command::ResetPowerStats)
    }

    pub fn output_on(&self, delay: u32) -> Result<()> {
        self.command(Command::OutputOn(delay))
    }

    pub fn output_off(&self, delay: u32) -> Result<()> {
        self.command(Command::OutputOff(delay))
    }

    pub fn output_reboot(&self, delay: u32) -> Result<()> {
        self.command(Command::OutputReboot(delay))
    }

    /// One `httpGet.htm` round trip for `points`. A session expiry reported
    /// on the read itself is answered with one re-login and retry, unless
    /// this call has already logged in.
    pub fn fetch(&self, points: &[Point]) -> Result<Readings> {
        let mut session = self.session();
        let (token, logged_in) = self.ensure_session(&mut session)?;

        let mut reply = self.read(points, &token)?;
        if reply.is_unauthorized() && !logged_in {
            info!("UPS session expired, logging in again");
            let token = self.authenticate(&mut session)?;
            reply = self.read(points, &token)?;
        }

        if reply.is_unauthorized() {
            *session = None;
            return Err(UPSError::Authentication(
                "session rejected right after login".to_string(),
            ));
        }
        if !reply.is_ok() {
            return Err(TransportError::Status(reply.status).into());
        }

        let readings = Readings::parse(&reply.body)?;
        if let Some(token) = readings.session_token() {
            *session = Some(token.to_string());
        }
        if !readings.contains_any(points) {
            return Err(UPSError::Parse(format!(
                "reply carries none of the {} requested points",
                points.len()
            )));
        }

        Ok(readings)
    }

    fn read_number(&self, point: Point) -> Result<Option<f32>> {
        Ok(self.fetch(&[point])?.number(point))
    }

    fn read(&self, points: &[Point], token: &str) -> Result<Reply> {
        let mut query = Vec::with_capacity(points.len() + 2);
        query.push(("devId".to_string(), DATA_DEV_ID.to_string()));
        query.extend(points.iter().map(|point| point.query()));
        query.push((SESSION_KEY.to_string(), token.to_string()));

        Ok(self.transport.get(GET_PATH, &query, &self.credentials)?)
    }

    fn write(&self, point_id: u16, value: &SettingValue, action: String) -> Result<()> {
        let mut session = self.session();
        let (token, _) = self.ensure_session(&mut session)?;

        let form = write_form(point_id, value, &token);
        let reply = self.transport.post_form(SET_PATH, &form, &self.credentials)?;

        if reply.is_unauthorized() {
            *session = None;
            return Err(UPSError::Authentication(format!(
                "session rejected while sending {}",
                action
            )));
        }
        if !reply.is_ok() {
            warn!("UPS rejected {} with HTTP {}", action, reply.status);
            return Err(UPSError::CommandRejected {
                command: action,
                status: reply.status,
            });
        }

        if let Some(token) = find_session_token(&reply.body) {
            *session = Some(token);
        }
        info!("UPS accepted {}", action);
        Ok(())
    }

    fn session(&self) -> MutexGuard<'_, Option<String>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the token to use and whether a login was needed to get it.
    fn ensure_session(&self, session: &mut Option<String>) -> Result<(String, bool)> {
        match session.clone() {
            None => Ok((self.authenticate(session)?, true)),
            Some(token) => self.refresh(session, token),
        }
    }

    fn authenticate(&self, session: &mut Option<String>) -> Result<String> {
        *session = None;

        let query = [("devId".to_string(), SESSION_DEV_ID.to_string())];
        let reply = self.transport.get(LOGIN_PATH, &query, &self.credentials)?;

        if reply.is_unauthorized() {
            return Err(UPSError::Authentication(format!(
                "credentials for {:?} rejected (HTTP {})",
                self.credentials.username, reply.status
            )));
        }
        if !reply.is_ok() {
            return Err(TransportError::Status(reply.status).into());
        }

        let token = find_session_token(&reply.body).ok_or_else(|| {
            UPSError::Authentication("login reply carries no session token".to_string())
        })?;

        info!("logged in to UPS as {:?}", self.credentials.username);
        *session = Some(token.clone());
        Ok(token)
    }

    // Keeps the session alive and picks up a rotated token. Only an explicit
    // expiry matters here; anything else is left to the request that follows.
    fn refresh(&self, session: &mut Option<String>, token: String) -> Result<(String, bool)> {
        let query = [
            ("devId".to_string(), SESSION_DEV_ID.to_string()),
            (SESSION_KEY.to_string(), token.clone()),
            ("action".to_string(), "0".to_string()),
        ];

        match self.transport.get(SESSION_INFO_PATH, &query, &self.credentials) {
            Ok(reply) if reply.is_unauthorized() => {
                info!("UPS session expired, logging in again");
                Ok((self.authenticate(session)?, true))
            }
            Ok(reply) if reply.is_ok() => match find_session_token(&reply.body) {
                Some(rotated) => {
                    *session = Some(rotated.clone());
                    Ok((rotated, false))
                }
                None => Ok((token, false)),
            },
            Ok(reply) => {
                debug!("session refresh answered HTTP {}", reply.status);
                Ok((token, false))
            }
            Err(err) => {
                debug!("session refresh failed: {}", err);
                Ok((token, false))
            }
        }
    }
}
