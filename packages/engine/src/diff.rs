//! Pure change detection between a fetch and the last snapshot.

use std::collections::BTreeMap;

use fogo_watch_incident_models::{ChangeEvent, Incident};

/// Compares the fetched incident list against the last snapshot.
///
/// Emits [`ChangeEvent::New`] for ids absent from `baseline` and
/// [`ChangeEvent::Updated`] for ids whose record content changed, in the
/// order the feed listed them. Ids present only in `baseline` (resolved
/// incidents) produce nothing; they drop out of tracking when the caller
/// commits the new snapshot.
#[must_use]
pub fn diff(current: &[Incident], baseline: &BTreeMap<String, Incident>) -> Vec<ChangeEvent> {
    current
        .iter()
        .filter_map(|incident| match baseline.get(&incident.id) {
            None => Some(ChangeEvent::New(incident.clone())),
            Some(known) if known != incident => Some(ChangeEvent::Updated(incident.clone())),
            Some(_) => None,
        })
        .collect()
}
