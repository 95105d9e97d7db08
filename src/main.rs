use std::path::PathBuf;
use std::process::{self, Command as Process};
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};

use unity_dp::config::{load_mailer_settings, Overrides, Settings};
use unity_dp::mailer::Mailer;
use unity_dp::monitor::{Alert, Monitor};
use unity_dp::{Command, HttpTransport, Point, Result, Setting, StatusSnapshot, UPS};

#[derive(Parser, Debug)]
#[clap(name = "unity-dp", version, about = "Query and control a UPS through its Unity DP card.")]
struct Cli {
    /// Connection and monitoring settings.
    #[clap(short, long, default_value = "ups.toml")]
    config: PathBuf,

    /// SMTP settings for monitor alerts; ignored when missing.
    #[clap(long, default_value = "mailer.toml")]
    mailer: PathBuf,

    /// Base URL of the card, e.g. http://192.168.1.100
    #[clap(long)]
    url: Option<String>,

    #[clap(short, long)]
    user: Option<String>,

    #[clap(short, long)]
    password: Option<String>,

    #[clap(subcommand)]
    action: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Print every status field.
    Status {
        #[clap(long)]
        json: bool,
    },
    /// Print one point, e.g. `battery.charge`.
    Get { point: String },
    /// Change a setting, e.g. `site_identifier "Main Rack"`.
    Set { setting: String, value: String },
    /// List the known point names.
    Points,
    BatteryTest,
    SilenceAlarm,
    /// Abort a pending command.
    Abort,
    ResetPowerStats,
    OutputOn {
        /// Seconds before the UPS acts.
        #[clap(long, default_value_t = 0)]
        delay: u32,
    },
    OutputOff {
        #[clap(long, default_value_t = 0)]
        delay: u32,
    },
    OutputReboot {
        #[clap(long, default_value_t = 0)]
        delay: u32,
    },
    /// Poll the UPS, mail alerts and shut the host down on a long outage.
    Monitor,
}

fn main() {
    pretty_env_logger::init_timed();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        error!("{}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Action::Points = cli.action {
        for point in Point::ALL {
            println!("{:<36} v{}", point.name(), point.id());
        }
        return Ok(());
    }

    let settings = Settings::load(
        &cli.config,
        &Overrides {
            url: cli.url,
            username: cli.user,
            password: cli.password,
        },
    )?;

    let ups = UPS::with_options(
        &settings.url,
        &settings.username,
        &settings.password,
        Duration::from_secs(settings.timeout_secs),
        settings.accept_invalid_certs,
    )?;

    match cli.action {
        Action::Status { json } => {
            let status = ups.get_all_status()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
        Action::Get { point } => {
            let point: Point = point.parse()?;
            println!("{}", ups.read_point(point)?.unwrap_or_else(|| "--".to_string()));
        }
        Action::Set { setting, value } => {
            let setting: Setting = setting.parse()?;
            let value = setting.parse_value(&value)?;
            ups.set_setting(setting, value)?;
        }
        Action::Points => {}
        Action::BatteryTest => ups.command(Command::BatteryTest)?,
        Action::SilenceAlarm => ups.command(Command::SilenceAlarm)?,
        Action::Abort => ups.command(Command::Abort)?,
        Action::ResetPowerStats => ups.command(Command::ResetPowerStats)?,
        Action::OutputOn { delay } => ups.command(Command::OutputOn(delay))?,
        Action::OutputOff { delay } => ups.command(Command::OutputOff(delay))?,
        Action::OutputReboot { delay } => ups.command(Command::OutputReboot(delay))?,
        Action::Monitor => {
            let mailer = match load_mailer_settings(&cli.mailer)? {
                Some(mailer_settings) => Some(Mailer::new(mailer_settings)?),
                None => {
                    warn!("{} not found, alerts will only be logged", cli.mailer.display());
                    None
                }
            };
            monitor(&ups, &settings, mailer.as_ref())?;
        }
    }

    Ok(())
}

fn monitor(ups: &UPS<HttpTransport>, settings: &Settings, mailer: Option<&Mailer>) -> Result<()> {
    let mut monitor = Monitor::new(settings.thresholds());
    let mut last_status: Option<StatusSnapshot> = None;

    let mut alerts = monitor.connect(ups);
    info!("UPS monitor running!");

    loop {
        let (polled, status) = monitor.poll(ups);
        alerts.extend(polled);
        if let Some(status) = status {
            debug!("{:#?}", status);
            last_status = Some(status);
        }

        for alert in &alerts {
            notify(alert, last_status.as_ref(), mailer);
        }

        if alerts.contains(&Alert::Shutdown) {
            shutdown(ups, settings);
            return Ok(());
        }
        alerts.clear();

        if monitor.on_battery() && settings.seconds_to_shutdown > 0 {
            info!(
                "Utility failed - shutdown in {}s.",
                monitor.seconds_until_shutdown()
            );
        }

        thread::sleep(monitor.next_delay());
    }
}

fn notify(alert: &Alert, status: Option<&StatusSnapshot>, mailer: Option<&Mailer>) {
    if alert.is_problem() {
        warn!("{}", alert);
    } else {
        info!("{}", alert);
    }

    if let Some(mailer) = mailer {
        let body = match status {
            Some(status) => format!("{}\n\n{:#?}", alert, status),
            None => alert.to_string(),
        };
        if let Err(e) = mailer.send(alert.subject(), &body) {
            error!("Failed to send email: {}", e);
        }
    }
}

fn shutdown(ups: &UPS<HttpTransport>, settings: &Settings) {
    if settings.output_off_delay > 0 {
        match ups.output_off(settings.output_off_delay) {
            Ok(()) => info!("Set UPS output off in {}s.", settings.output_off_delay),
            Err(e) => error!("Failed to schedule UPS output off: {}", e),
        }
    }

    let Some((program, args)) = settings.shutdown_command.split_first() else {
        warn!("No shutdown_command configured, leaving the host running.");
        return;
    };

    info!("Shutting down.");
    if let Err(e) = Process::new(program).args(args).status() {
        error!("Failed to run {}: {}", program, e);
    }
}

fn print_status(status: &StatusSnapshot) {
    let system = &status.system;
    println!("System");
    line("model", &system.model_number);
    line("serial", &system.serial_number);
    line("firmware", &system.firmware_version);
    line("name", &system.system_name);
    line("site", &system.site_identifier);
    line("source", &system.ups_source.as_ref().map(|s| s.to_string()));
    line("temperature (C)", &system.inlet_temperature);
    line("blackouts", &system.black_out_count);
    line("brownouts", &system.brown_out_count);

    let battery = &status.battery;
    println!("Battery");
    line("charge (%)", &battery.charge);
    line("time remaining (min)", &battery.time_remaining);
    line("status", &battery.status);
    line("charger", &battery.charger_state);
    line("last test", &battery.test_result);

    let input = &status.input;
    println!("Input");
    line("voltage (V)", &input.voltage_ln);
    line("current (A)", &input.current_amps);
    line("frequency (Hz)", &input.frequency_hz);

    let output = &status.output;
    println!("Output");
    line("voltage (V)", &output.voltage_ln);
    line("current (A)", &output.amps);
    line("power (W)", &output.watts);
    line("apparent (VA)", &output.va);
    line("load (%)", &output.load_percent);
    line("power factor", &output.pf);
    line("frequency (Hz)", &output.frequency);
    line("overload", &output.overload);

    let bypass = &status.bypass;
    println!("Bypass");
    line("voltage (V)", &bypass.voltage);
    line("frequency (Hz)", &bypass.frequency);
    line("not available", &bypass.not_available);
}

fn line<T: std::fmt::Display>(label: &str, value: &Option<T>) {
    match value {
        Some(value) => println!("  {:<22}{}", label, value),
        None => println!("  {:<22}--", label),
    }
}
