#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Cycle orchestration: fetch, diff, notify, persist.
//!
//! [`Engine`] owns the stores, the feed, and the notifier. The periodic
//! [`Scheduler`] drives [`Engine::run_cycle`] from a single task; command
//! handlers call the same engine concurrently from their own tasks.

pub mod command;
pub mod diff;
pub mod scheduler;

use std::collections::BTreeMap;
use std::sync::Arc;

use fogo_watch_feed::{FeedError, IncidentFeed};
use fogo_watch_incident_models::{District, Incident, Subscriber};
use fogo_watch_notify::{DeliveryReport, Notifier, TransportError};
use fogo_watch_store::{PreferenceStore, SnapshotStore, StoreError};

pub use command::Command;
pub use diff::diff;
pub use scheduler::Scheduler;

/// Errors that can occur while running a cycle or handling a command.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The feed could not be fetched or decoded; the cycle was aborted
    /// without touching any state.
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    /// A durable write failed; the in-memory state is ahead of the
    /// persisted copy until the next successful flush.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A command reply could not be delivered.
    #[error("Delivery error: {0}")]
    Delivery(#[from] TransportError),

    /// The requested district cannot be stored as a preference.
    #[error("District {0} cannot be selected")]
    InvalidDistrict(District),
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleReport {
    /// Active incidents the feed returned.
    pub active: usize,
    /// Change events the diff produced.
    pub events: usize,
    /// Delivery counts across all subscribers.
    pub delivery: DeliveryReport,
}

/// The polling/diff/notify core, shared by the scheduler and the command
/// handlers.
pub struct Engine {
    feed: Arc<dyn IncidentFeed>,
    preferences: Arc<PreferenceStore>,
    snapshot: Arc<SnapshotStore>,
    notifier: Notifier,
}

impl Engine {
    #[must_use]
    pub const fn new(
        feed: Arc<dyn IncidentFeed>,
        preferences: Arc<PreferenceStore>,
        snapshot: Arc<SnapshotStore>,
        notifier: Notifier,
    ) -> Self {
        Self {
            feed,
            preferences,
            snapshot,
            notifier,
        }
    }

    /// Runs one fetch → diff → notify → persist cycle.
    ///
    /// Notifications go out before the snapshot commits: a crash between
    /// the two re-notifies at most one cycle's changes on restart, it never
    /// loses them. The snapshot is then replaced wholesale with the fetch
    /// (retired incidents drop out of tracking) and both stores flush so
    /// the durable copies match the completed cycle.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Feed`] if the fetch fails: nothing is
    /// notified, no state changes, and the next cycle retries from the same
    /// baseline. Returns [`EngineError::Store`] if a flush fails: the
    /// in-memory snapshot keeps the new state (no duplicate notifications
    /// while the process lives) and the next cycle's flush retries.
    pub async fn run_cycle(&self) -> Result<CycleReport, EngineError> {
        let current = self.feed.fetch_active().await?;

        let events = diff::diff(&current, &self.snapshot.all());
        let subscribers = self.subscribers();
        let delivery = self.notifier.notify_changes(&events, &subscribers).await;

        let next: BTreeMap<String, Incident> = current
            .iter()
            .map(|incident| (incident.id.clone(), incident.clone()))
            .collect();
        self.snapshot.replace_all(next);
        self.snapshot.flush()?;
        self.preferences.flush()?;

        Ok(CycleReport {
            active: current.len(),
            events: events.len(),
            delivery,
        })
    }

    /// Returns a point-in-time subscriber list from the preference store.
    fn subscribers(&self) -> Vec<Subscriber> {
        self.preferences
            .all()
            .into_iter()
            .map(|(id, district)| Subscriber { id, district })
            .collect()
    }
}
