//! This module defines the beacon chain fork names.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// A beacon chain fork, as named by the `version` field of beacon API responses.
#[derive(Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ForkName {
    /// The genesis fork
    Phase0,
    /// Altair introduced sync committees and light client updates
    Altair,
    /// Bellatrix (the merge) introduced the execution payload
    Bellatrix,
    /// Capella added execution headers to light client headers
    Capella,
    /// Deneb added blob gas fields to the execution payload
    Deneb,
    /// Electra added execution requests to the block body
    Electra,
    /// Fulu
    Fulu,
}

impl ForkName {
    /// All known forks, oldest first.
    pub const ALL: [Self; 7] = [
        Self::Phase0,
        Self::Altair,
        Self::Bellatrix,
        Self::Capella,
        Self::Deneb,
        Self::Electra,
        Self::Fulu,
    ];

    /// The lowercase name used by the beacon API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Phase0 => "phase0",
            Self::Altair => "altair",
            Self::Bellatrix => "bellatrix",
            Self::Capella => "capella",
            Self::Deneb => "deneb",
            Self::Electra => "electra",
            Self::Fulu => "fulu",
        }
    }

    /// Whether beacon block bodies of this fork carry an execution payload.
    #[must_use]
    pub const fn has_execution_payload(self) -> bool {
        matches!(
            self,
            Self::Bellatrix | Self::Capella | Self::Deneb | Self::Electra | Self::Fulu
        )
    }

    /// Whether light client headers of this fork carry the execution header and branch.
    #[must_use]
    pub const fn has_light_client_execution_header(self) -> bool {
        matches!(self, Self::Capella | Self::Deneb | Self::Electra | Self::Fulu)
    }

    /// Whether the execution payload carries the blob gas fields.
    #[must_use]
    pub const fn has_blob_gas(self) -> bool {
        matches!(self, Self::Deneb | Self::Electra | Self::Fulu)
    }
}

impl fmt::Display for ForkName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an unknown fork name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fork name: {0}")]
pub struct UnknownForkName(pub String);

impl FromStr for ForkName {
    type Err = UnknownForkName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|fork| fork.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownForkName(s.to_string()))
    }
}
