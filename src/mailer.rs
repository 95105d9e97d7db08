use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, UPSError};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct MailerSettings {
    pub user: String,
    pub pass: String,
    pub relay: String,
    pub from: String,
    pub to: Vec<String>,
    /// Prefix for every subject; defaults to this host's name.
    #[serde(default)]
    pub machine_id: Option<String>,
    /// Log messages instead of sending them.
    #[serde(default)]
    pub dry_run: bool,
}

pub struct Mailer {
    from: Mailbox,
    to: Vec<Mailbox>,
    machine_id: String,
    dry_run: bool,
    relay: SmtpTransport,
}

impl Mailer {
    pub fn new(settings: MailerSettings) -> Result<Mailer> {
        let relay = SmtpTransport::relay(&settings.relay)
            .map_err(|e| UPSError::Mail(format!("relay {}: {}", settings.relay, e)))?
            .credentials(Credentials::new(settings.user, settings.pass))
            .build();

        let machine_id = match settings.machine_id {
            Some(id) => id,
            None => local_hostname(),
        };

        Ok(Mailer {
            from: parse_mailbox(&settings.from)?,
            to: settings
                .to
                .iter()
                .map(|to| parse_mailbox(to))
                .collect::<Result<Vec<_>>>()?,
            machine_id,
            dry_run: settings.dry_run,
            relay,
        })
    }

    pub fn send(&self, subject: &str, message: &str) -> Result<()> {
        let email = compose(&self.from, &self.to, &self.machine_id, subject, message)?;

        if self.dry_run {
            info!("dry run, not sending mail {:?}", subject);
            return Ok(());
        }

        self.relay
            .send(&email)
            .map_err(|e| UPSError::Mail(e.to_string()))?;
        debug!("sent mail {:?} to {} recipients", subject, self.to.len());
        Ok(())
    }
}

fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .unwrap_or_else(|| "ups-monitor".to_string())
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| UPSError::Mail(format!("address {:?}: {}", address, e)))
}

fn compose(
    from: &Mailbox,
    to: &[Mailbox],
    machine_id: &str,
    subject: &str,
    message: &str,
) -> Result<Message> {
    if to.is_empty() {
        return Err(UPSError::Mail("no recipients configured".to_string()));
    }

    let mut builder = Message::builder().from(from.clone());
    for recipient in to {
        builder = builder.to(recipient.clone());
    }

    builder
        .subject(format!("{}: {}", machine_id, subject))
        .body(message.to_string())
        .map_err(|e| UPSError::Mail(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_prefixes_subject() {
        let from = parse_mailbox("ups@example.com").unwrap();
        let to = vec![
            parse_mailbox("ops@example.com").unwrap(),
            parse_mailbox("Night Shift <night@example.com>").unwrap(),
        ];

        let email = compose(&from, &to, "rack-1", "Utility back.", "all good").unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("Subject: rack-1: Utility back."));
        assert!(raw.contains("ops@example.com"));
        assert!(raw.contains("night@example.com"));
    }

    #[test]
    fn test_compose_without_recipients() {
        let from = parse_mailbox("ups@example.com").unwrap();
        assert!(matches!(
            compose(&from, &[], "rack-1", "s", "m"),
            Err(UPSError::Mail(_))
        ));
    }

    #[test]
    fn test_bad_address() {
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(UPSError::Mail(_))
        ));
    }

    #[test]
    fn test_settings_default_machine_id() {
        let settings: MailerSettings = serde_json::from_str(
            r#"{"user":"u","pass":"p","relay":"smtp.example.com","from":"a@example.com","to":["b@example.com"]}"#,
        )
        .unwrap();

        assert_eq!(settings.machine_id, None);
        assert!(!settings.dry_run);
    }
}
