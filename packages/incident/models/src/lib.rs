#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident, district, and subscriber model types for the fogo-watch system.
//!
//! Every record the Fogos.PT feed reports is normalized into these shared
//! types; the stores persist them and the notifier renders them. District
//! names serialize as their official Portuguese spelling so the wire form,
//! the persisted form, and the menu label are the same string.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Portuguese district filter for incident notifications.
///
/// A closed list: the twenty district/region names used by the feed plus
/// [`District::Todos`] (the unfiltered wildcard a subscriber may pick) and
/// [`District::Desconhecido`] (the fallback for feed records whose district
/// string matches nothing; never offered in the menu, never accepted as a
/// subscriber preference).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum District {
    /// Wildcard: subscriber receives every district.
    Todos,
    Aveiro,
    Beja,
    Braga,
    #[serde(rename = "Bragança")]
    #[strum(serialize = "Bragança")]
    Braganca,
    #[serde(rename = "Castelo Branco")]
    #[strum(serialize = "Castelo Branco")]
    CasteloBranco,
    Coimbra,
    #[serde(rename = "Évora")]
    #[strum(serialize = "Évora")]
    Evora,
    Faro,
    Guarda,
    Leiria,
    Lisboa,
    Portalegre,
    Porto,
    #[serde(rename = "Santarém")]
    #[strum(serialize = "Santarém")]
    Santarem,
    #[serde(rename = "Setúbal")]
    #[strum(serialize = "Setúbal")]
    Setubal,
    #[serde(rename = "Viana do Castelo")]
    #[strum(serialize = "Viana do Castelo")]
    VianaDoCastelo,
    #[serde(rename = "Vila Real")]
    #[strum(serialize = "Vila Real")]
    VilaReal,
    Viseu,
    #[serde(rename = "Açores")]
    #[strum(serialize = "Açores")]
    Acores,
    Madeira,
    /// Parse fallback for feed records only; not selectable.
    Desconhecido,
}

impl District {
    /// Returns the selectable districts in menu order (`Todos` first).
    #[must_use]
    pub const fn menu() -> &'static [Self] {
        &[
            Self::Todos,
            Self::Aveiro,
            Self::Beja,
            Self::Braga,
            Self::Braganca,
            Self::CasteloBranco,
            Self::Coimbra,
            Self::Evora,
            Self::Faro,
            Self::Guarda,
            Self::Leiria,
            Self::Lisboa,
            Self::Portalegre,
            Self::Porto,
            Self::Santarem,
            Self::Setubal,
            Self::VianaDoCastelo,
            Self::VilaReal,
            Self::Viseu,
            Self::Acores,
            Self::Madeira,
        ]
    }

    /// Maps a raw district string from the feed to a variant.
    ///
    /// Unmatched strings become [`Self::Desconhecido`] rather than failing
    /// the record; those incidents still reach `Todos` subscribers.
    #[must_use]
    pub fn from_feed(raw: &str) -> Self {
        raw.trim().parse().unwrap_or(Self::Desconhecido)
    }

    /// Returns `true` if this district may be stored as a subscriber
    /// preference.
    #[must_use]
    pub const fn is_selectable(self) -> bool {
        !matches!(self, Self::Desconhecido)
    }

    /// Returns `true` if a subscriber with this preference should see an
    /// incident in `district`.
    #[must_use]
    pub fn covers(self, district: Self) -> bool {
        self == Self::Todos || self == district
    }
}

/// One active incident reported by the feed.
///
/// Two records with the same `id` are considered changed if *any* field
/// differs; derived `PartialEq` is the change detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incident {
    /// Stable identity across fetches. Numeric feed ids are stringified.
    pub id: String,
    pub district: District,
    /// Free-text location; preferred for display when non-empty.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub locality: String,
    #[serde(default)]
    pub parish: String,
    #[serde(default)]
    pub municipality: String,
    /// Start date as reported by the feed; opaque display text.
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub hour: String,
    /// Personnel deployed.
    #[serde(default)]
    pub man: u32,
    /// Ground vehicles deployed.
    #[serde(default)]
    pub terrain: u32,
    /// Aircraft deployed.
    #[serde(default)]
    pub aerial: u32,
    #[serde(default)]
    pub status: String,
}

impl Incident {
    /// Returns the display location: the free-text `location` when present,
    /// otherwise the non-empty parts of locality, parish, municipality, and
    /// district joined with `", "`. An unknown district is left out of the
    /// fallback.
    #[must_use]
    pub fn display_location(&self) -> String {
        let location = self.location.trim();
        if !location.is_empty() {
            return location.to_string();
        }
        let mut parts: Vec<&str> = [&self.locality, &self.parish, &self.municipality]
            .into_iter()
            .map(|part| part.trim())
            .filter(|part| !part.is_empty())
            .collect();
        if self.district != District::Desconhecido {
            parts.push(self.district.as_ref());
        }
        parts.join(", ")
    }

    /// Returns the start time for display: date and hour joined and trimmed,
    /// with `"N/A"` standing in for a missing date.
    #[must_use]
    pub fn started_at(&self) -> String {
        let date = self.date.trim();
        let date = if date.is_empty() { "N/A" } else { date };
        format!("{date} {}", self.hour.trim()).trim().to_string()
    }
}

/// A change detected between two consecutive fetches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The incident id was not present in the previous snapshot.
    New(Incident),
    /// The id was present but the record content differs.
    Updated(Incident),
}

impl ChangeEvent {
    /// Returns the incident this event refers to.
    #[must_use]
    pub const fn incident(&self) -> &Incident {
        match self {
            Self::New(incident) | Self::Updated(incident) => incident,
        }
    }

    /// Returns the district of the underlying incident.
    #[must_use]
    pub const fn district(&self) -> District {
        self.incident().district
    }

    /// Returns `true` for a first-seen incident.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        matches!(self, Self::New(_))
    }
}

/// An end user tracked by the system, identified by an opaque id from the
/// external transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: String,
    pub district: District,
}

impl Subscriber {
    #[must_use]
    pub fn new(id: &str, district: District) -> Self {
        Self {
            id: id.to_string(),
            district,
        }
    }
}
