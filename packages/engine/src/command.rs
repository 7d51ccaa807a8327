//! Typed subscriber commands and their handlers.
//!
//! The transport side parses raw text with [`Command::parse`] and hands the
//! result to [`Engine::handle`]; each invocation runs independently of the
//! periodic cycle, against the same guarded stores.

use fogo_watch_incident_models::{District, Subscriber};

use crate::{Engine, EngineError};

/// A recognized subscriber command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `/start`, or any free text: welcome message plus district menu.
    Start,
    /// `/ver`: show the current incidents for the subscriber's district.
    ShowNow,
    /// `/alterar`: re-open the district menu.
    PickDistrict,
    /// `/alterar <district>`: store a new district choice.
    SetDistrict(District),
}

impl Command {
    /// Maps raw message text to a command.
    ///
    /// Returns `None` for an unrecognized slash command (callers reply with
    /// the unknown-command hint). Free text that is no command at all maps
    /// to [`Command::Start`]; the bot greets anyone who just types at it.
    /// An unusable district after `/alterar` falls back to
    /// [`Command::PickDistrict`] so the subscriber sees the menu instead of
    /// an error.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if !text.starts_with('/') {
            return Some(Self::Start);
        }

        let (name, argument) = match text.split_once(char::is_whitespace) {
            Some((name, argument)) => (name, argument.trim()),
            None => (text, ""),
        };

        match name {
            "/start" => Some(Self::Start),
            "/ver" => Some(Self::ShowNow),
            "/alterar" => {
                if argument.is_empty() {
                    return Some(Self::PickDistrict);
                }
                let district = argument
                    .parse()
                    .ok()
                    .filter(|district: &District| district.is_selectable());
                Some(district.map_or(Self::PickDistrict, Self::SetDistrict))
            }
            _ => None,
        }
    }
}

impl Engine {
    /// Dispatches one parsed command for `subscriber_id`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] as the individual operations do.
    pub async fn handle(&self, subscriber_id: &str, command: Command) -> Result<(), EngineError> {
        match command {
            Command::Start => self.welcome(subscriber_id).await,
            Command::ShowNow => self.show_now(subscriber_id).await,
            Command::PickDistrict => {
                Ok(self.notifier.send_district_menu(subscriber_id).await?)
            }
            Command::SetDistrict(district) => self.set_district(subscriber_id, district).await,
        }
    }

    /// Sends the welcome text and the district menu (`/start`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Delivery`] if a reply cannot be delivered.
    pub async fn welcome(&self, subscriber_id: &str) -> Result<(), EngineError> {
        self.notifier.send_welcome(subscriber_id).await?;
        self.notifier.send_district_menu(subscriber_id).await?;
        Ok(())
    }

    /// Fetches the current incidents and sends the subscriber their
    /// filtered view (`/ver`). A subscriber with no stored preference sees
    /// everything.
    ///
    /// A feed failure here is reported to the subscriber as "no incidents"
    /// rather than surfaced raw; the warning lands in the log.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Delivery`] if a reply cannot be delivered.
    pub async fn show_now(&self, subscriber_id: &str) -> Result<(), EngineError> {
        let subscriber = self.subscriber(subscriber_id);
        let incidents = match self.feed.fetch_active().await {
            Ok(incidents) => incidents,
            Err(e) => {
                log::warn!("On-demand fetch failed for {subscriber_id}: {e}");
                Vec::new()
            }
        };
        self.notifier.send_current(&subscriber, &incidents).await?;
        Ok(())
    }

    /// Stores a new district choice, flushes it durably, confirms, and
    /// immediately sends the incidents the new filter covers
    /// (`/alterar <district>`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDistrict`] for the non-selectable
    /// fallback district, [`EngineError::Store`] if the preference flush
    /// fails, and [`EngineError::Delivery`] if a reply cannot be delivered.
    pub async fn set_district(
        &self,
        subscriber_id: &str,
        district: District,
    ) -> Result<(), EngineError> {
        if !district.is_selectable() {
            return Err(EngineError::InvalidDistrict(district));
        }

        self.preferences.set(subscriber_id, district);
        self.preferences.flush()?;
        log::info!("Subscriber {subscriber_id} now watches {district}");

        self.notifier
            .send_district_confirmation(subscriber_id, district)
            .await?;
        self.show_now(subscriber_id).await
    }

    /// Replies to unrecognized input with the command hint.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Delivery`] if the reply cannot be delivered.
    pub async fn unknown_command(&self, subscriber_id: &str) -> Result<(), EngineError> {
        Ok(self.notifier.send_unknown_command(subscriber_id).await?)
    }

    fn subscriber(&self, subscriber_id: &str) -> Subscriber {
        let district = self
            .preferences
            .get(subscriber_id)
            .unwrap_or(District::Todos);
        Subscriber::new(subscriber_id, district)
    }
}
