#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Notification rendering and delivery.
//!
//! The [`Notifier`] filters change events per subscriber district and pushes
//! rendered text through an injected [`Transport`]. Delivery failures are
//! isolated: one unreachable subscriber never blocks the rest of a cycle.

pub mod render;

use std::sync::Arc;

use async_trait::async_trait;
use fogo_watch_incident_models::{ChangeEvent, District, Incident, Subscriber};
use futures::stream::{self, StreamExt as _};

/// How many subscribers are delivered to concurrently during a cycle.
const DELIVERY_CONCURRENCY: usize = 8;

/// Boxed error from a transport implementation.
pub type TransportError = Box<dyn std::error::Error + Send + Sync>;

/// Outbound messaging seam to whatever chat platform hosts the bot.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Delivers a text message to one subscriber.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be delivered.
    async fn send(&self, subscriber_id: &str, text: &str) -> Result<(), TransportError>;

    /// Presents a list of options to pick from.
    ///
    /// The default rendering is a numbered text list; transports with a
    /// native button affordance override this.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu cannot be delivered.
    async fn send_menu(
        &self,
        subscriber_id: &str,
        prompt: &str,
        options: &[&str],
    ) -> Result<(), TransportError> {
        let list = options
            .iter()
            .enumerate()
            .map(|(i, option)| format!("{}. {option}", i + 1))
            .collect::<Vec<_>>()
            .join("\n");
        self.send(subscriber_id, &format!("{prompt}\n{list}")).await
    }
}

/// Counts of attempted deliveries for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: u64,
    pub failed: u64,
}

/// Renders and delivers notifications through a [`Transport`].
#[derive(Clone)]
pub struct Notifier {
    transport: Arc<dyn Transport>,
}

impl Notifier {
    #[must_use]
    pub const fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Delivers every change event to every subscriber whose district
    /// covers it.
    ///
    /// Subscribers are processed concurrently (bounded at
    /// [`DELIVERY_CONCURRENCY`]); events for one subscriber go out
    /// sequentially in diff order. A failed send is logged and counted,
    /// never propagated; one blocked subscriber must not cost the rest of
    /// the batch, and there is no retry within the cycle.
    pub async fn notify_changes(
        &self,
        events: &[ChangeEvent],
        subscribers: &[Subscriber],
    ) -> DeliveryReport {
        if events.is_empty() || subscribers.is_empty() {
            return DeliveryReport::default();
        }

        let deliveries: Vec<_> = subscribers
            .iter()
            .map(|subscriber| {
                let transport = Arc::clone(&self.transport);
                async move {
                    let mut report = DeliveryReport::default();
                    let relevant = events
                        .iter()
                        .filter(|event| subscriber.district.covers(event.district()));
                    for event in relevant {
                        let text = render::render_event(event);
                        match transport.send(&subscriber.id, &text).await {
                            Ok(()) => report.delivered += 1,
                            Err(e) => {
                                log::warn!("Failed to deliver to {}: {e}", subscriber.id);
                                report.failed += 1;
                            }
                        }
                    }
                    report
                }
            })
            .collect();
        let reports: Vec<DeliveryReport> = stream::iter(deliveries)
            .buffer_unordered(DELIVERY_CONCURRENCY)
            .collect()
            .await;

        let mut total = DeliveryReport::default();
        for report in reports {
            total.delivered += report.delivered;
            total.failed += report.failed;
        }
        total
    }

    /// Sends the subscriber their current filtered view of the active
    /// incidents, one message per incident, or [`render::NO_INCIDENTS_TEXT`]
    /// when the filter matches nothing.
    ///
    /// # Errors
    ///
    /// Returns the first transport error; an on-demand view has a single
    /// recipient, so there is nothing to isolate.
    pub async fn send_current(
        &self,
        subscriber: &Subscriber,
        incidents: &[Incident],
    ) -> Result<(), TransportError> {
        let filtered: Vec<&Incident> = incidents
            .iter()
            .filter(|incident| subscriber.district.covers(incident.district))
            .collect();

        if filtered.is_empty() {
            return self
                .transport
                .send(&subscriber.id, render::NO_INCIDENTS_TEXT)
                .await;
        }
        for incident in filtered {
            let text = render::render_incident(incident);
            self.transport.send(&subscriber.id, &text).await?;
        }
        Ok(())
    }

    /// Sends the welcome text shown on first contact.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    pub async fn send_welcome(&self, subscriber_id: &str) -> Result<(), TransportError> {
        self.transport
            .send(subscriber_id, render::WELCOME_TEXT)
            .await
    }

    /// Presents the district-selection menu in menu order.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    pub async fn send_district_menu(&self, subscriber_id: &str) -> Result<(), TransportError> {
        let options: Vec<&str> = District::menu()
            .iter()
            .map(|district| district.as_ref())
            .collect();
        self.transport
            .send_menu(subscriber_id, render::DISTRICT_PROMPT, &options)
            .await
    }

    /// Confirms a district change.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    pub async fn send_district_confirmation(
        &self,
        subscriber_id: &str,
        district: District,
    ) -> Result<(), TransportError> {
        self.transport
            .send(subscriber_id, &render::district_confirmation(district))
            .await
    }

    /// Replies to an unrecognized command.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    pub async fn send_unknown_command(&self, subscriber_id: &str) -> Result<(), TransportError> {
        self.transport
            .send(subscriber_id, render::UNKNOWN_COMMAND_TEXT)
            .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    fn incident(id: &str, district: District) -> Incident {
        Incident {
            id: id.to_string(),
            district,
            location: format!("local {id}"),
            locality: String::new(),
            parish: String::new(),
            municipality: String::new(),
            date: "2025-08-01".to_string(),
            hour: "12:00".to_string(),
            man: 10,
            terrain: 3,
            aerial: 0,
            status: "Em Curso".to_string(),
        }
    }

    #[derive(Default)]
    struct FakeTransport {
        sent: Mutex<Vec<(String, String)>>,
        failing: Mutex<HashSet<String>>,
    }

    impl FakeTransport {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn sent_to(&self, subscriber_id: &str) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter(|(id, _)| id == subscriber_id)
                .map(|(_, text)| text)
                .collect()
        }

        fn fail_for(&self, subscriber_id: &str) {
            self.failing
                .lock()
                .unwrap()
                .insert(subscriber_id.to_string());
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(&self, subscriber_id: &str, text: &str) -> Result<(), TransportError> {
            if self.failing.lock().unwrap().contains(subscriber_id) {
                return Err("blocked".into());
            }
            self.sent
                .lock()
                .unwrap()
                .push((subscriber_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    fn notifier() -> (Arc<FakeTransport>, Notifier) {
        let transport = Arc::new(FakeTransport::default());
        let notifier = Notifier::new(Arc::clone(&transport) as Arc<dyn Transport>);
        (transport, notifier)
    }

    #[tokio::test]
    async fn filters_events_by_district() {
        let (transport, notifier) = notifier();
        let events = vec![
            ChangeEvent::New(incident("1", District::Porto)),
            ChangeEvent::New(incident("2", District::Faro)),
        ];
        let subscribers = vec![
            Subscriber::new("faro-sub", District::Faro),
            Subscriber::new("all-sub", District::Todos),
        ];

        let report = notifier.notify_changes(&events, &subscribers).await;

        assert_eq!(report, DeliveryReport { delivered: 3, failed: 0 });
        assert_eq!(transport.sent_to("faro-sub").len(), 1);
        assert!(transport.sent_to("faro-sub")[0].contains("local 2"));

        // Wildcard subscriber sees both, in diff order.
        let all = transport.sent_to("all-sub");
        assert_eq!(all.len(), 2);
        assert!(all[0].contains("local 1"));
        assert!(all[1].contains("local 2"));
    }

    #[tokio::test]
    async fn unknown_district_reaches_only_wildcard() {
        let (transport, notifier) = notifier();
        let events = vec![ChangeEvent::New(incident("1", District::Desconhecido))];
        let subscribers = vec![
            Subscriber::new("porto-sub", District::Porto),
            Subscriber::new("all-sub", District::Todos),
        ];

        notifier.notify_changes(&events, &subscribers).await;

        assert!(transport.sent_to("porto-sub").is_empty());
        assert_eq!(transport.sent_to("all-sub").len(), 1);
    }

    #[tokio::test]
    async fn failed_delivery_is_isolated() {
        let (transport, notifier) = notifier();
        transport.fail_for("blocked-sub");
        let events = vec![ChangeEvent::New(incident("1", District::Porto))];
        let subscribers = vec![
            Subscriber::new("blocked-sub", District::Todos),
            Subscriber::new("ok-sub", District::Todos),
        ];

        let report = notifier.notify_changes(&events, &subscribers).await;

        assert_eq!(report, DeliveryReport { delivered: 1, failed: 1 });
        assert_eq!(transport.sent_to("ok-sub").len(), 1);
    }

    #[tokio::test]
    async fn no_events_means_no_sends() {
        let (transport, notifier) = notifier();
        let subscribers = vec![Subscriber::new("sub", District::Todos)];

        let report = notifier.notify_changes(&[], &subscribers).await;

        assert_eq!(report, DeliveryReport::default());
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn send_current_filters_and_falls_back() {
        let (transport, notifier) = notifier();
        let incidents = vec![
            incident("1", District::Porto),
            incident("2", District::Faro),
        ];

        let faro = Subscriber::new("faro-sub", District::Faro);
        notifier.send_current(&faro, &incidents).await.unwrap();
        let sent = transport.sent_to("faro-sub");
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("local 2"));
        assert!(!sent[0].contains("Ocorrência\n"), "no alert header: {}", sent[0]);

        let viseu = Subscriber::new("viseu-sub", District::Viseu);
        notifier.send_current(&viseu, &incidents).await.unwrap();
        assert_eq!(
            transport.sent_to("viseu-sub"),
            vec![render::NO_INCIDENTS_TEXT.to_string()]
        );
    }

    #[tokio::test]
    async fn menu_lists_selectable_districts_in_order() {
        let (transport, notifier) = notifier();
        notifier.send_district_menu("sub").await.unwrap();

        let sent = transport.sent_to("sub");
        assert_eq!(sent.len(), 1);
        let menu = &sent[0];
        assert!(menu.starts_with(render::DISTRICT_PROMPT));
        assert!(menu.contains("1. Todos"));
        assert!(menu.contains("21. Madeira"));
        assert!(!menu.contains("Desconhecido"));
    }

    #[tokio::test]
    async fn welcome_and_confirmation_texts() {
        let (transport, notifier) = notifier();
        notifier.send_welcome("sub").await.unwrap();
        notifier
            .send_district_confirmation("sub", District::Evora)
            .await
            .unwrap();

        let sent = transport.sent_to("sub");
        assert!(sent[0].contains("/alterar - Alterar distrito"));
        assert_eq!(sent[1], "✅ Distrito definido para Évora");
    }
}
