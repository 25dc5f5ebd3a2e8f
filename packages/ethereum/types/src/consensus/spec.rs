//! This module defines the fork schedule served by the beacon API.

use ethereum_utils::slot::compute_epoch_at_slot;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use super::fork::ForkName;

/// The part of the spec returned from `/eth/v1/config/spec` that locates slots in forks.
///
/// Forks that are not scheduled are served with the far future epoch (`u64::MAX`), and forks
/// unknown to the node are missing.
#[serde_as]
#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Spec {
    /// The number of slots per epoch.
    #[serde_as(as = "DisplayFromStr")]
    pub slots_per_epoch: u64,
    /// The altair fork epoch.
    #[serde_as(as = "DisplayFromStr")]
    pub altair_fork_epoch: u64,
    /// The bellatrix fork epoch.
    #[serde_as(as = "DisplayFromStr")]
    pub bellatrix_fork_epoch: u64,
    /// The capella fork epoch.
    #[serde_as(as = "DisplayFromStr")]
    pub capella_fork_epoch: u64,
    /// The deneb fork epoch.
    #[serde_as(as = "DisplayFromStr")]
    pub deneb_fork_epoch: u64,
    /// The electra fork epoch.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub electra_fork_epoch: Option<u64>,
    /// The fulu fork epoch.
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fulu_fork_epoch: Option<u64>,
}

impl Spec {
    /// Returns the fork active at `epoch`.
    #[must_use]
    pub fn fork_at_epoch(&self, epoch: u64) -> ForkName {
        let reached = |fork_epoch: Option<u64>| fork_epoch.is_some_and(|fork| epoch >= fork);
        match epoch {
            _ if reached(self.fulu_fork_epoch) => ForkName::Fulu,
            _ if reached(self.electra_fork_epoch) => ForkName::Electra,
            _ if epoch >= self.deneb_fork_epoch => ForkName::Deneb,
            _ if epoch >= self.capella_fork_epoch => ForkName::Capella,
            _ if epoch >= self.bellatrix_fork_epoch => ForkName::Bellatrix,
            _ if epoch >= self.altair_fork_epoch => ForkName::Altair,
            _ => ForkName::Phase0,
        }
    }

    /// Returns the fork active at `slot`, `None` if the spec has no slots per epoch.
    #[must_use]
    pub fn fork_at_slot(&self, slot: u64) -> Option<ForkName> {
        (self.slots_per_epoch != 0)
            .then(|| self.fork_at_epoch(compute_epoch_at_slot(self.slots_per_epoch, slot)))
    }
}
