/// Mainnet preset.
pub const SLOTS_PER_EPOCH: u64 = 32;
/// Mainnet preset.
pub const EPOCHS_PER_SYNC_COMMITTEE_PERIOD: u64 = 256;
/// Number of slots covered by one sync committee.
pub const SLOTS_PER_SYNC_COMMITTEE_PERIOD: u64 = SLOTS_PER_EPOCH * EPOCHS_PER_SYNC_COMMITTEE_PERIOD;

/// Returns the epoch at a given `slot`.
///
/// [See in consensus-spec](https://github.com/ethereum/consensus-specs/blob/dev/specs/phase0/beacon-chain.md#compute_epoch_at_slot)
pub const fn compute_epoch_at_slot(slots_per_epoch: u64, slot: u64) -> u64 {
    slot / slots_per_epoch
}

/// Returns the sync committee period at a given `slot`.
///
/// [See in consensus-spec](https://github.com/ethereum/consensus-specs/blob/dev/specs/altair/light-client/sync-protocol.md#compute_sync_committee_period_at_slot)
pub const fn compute_sync_committee_period_at_slot(
    slots_per_epoch: u64,
    epochs_per_sync_committee_period: u64,
    slot: u64,
) -> u64 {
    compute_epoch_at_slot(slots_per_epoch, slot) / epochs_per_sync_committee_period
}

/// Sync committee period of `slot` with the mainnet preset.
pub const fn period_of(slot: u64) -> u64 {
    compute_sync_committee_period_at_slot(SLOTS_PER_EPOCH, EPOCHS_PER_SYNC_COMMITTEE_PERIOD, slot)
}

/// The `count` most recent periods ending at `current`, newest first.
/// Stops at period 0, so fewer than `count` periods may be returned.
pub fn recent_periods(current: u64, count: u64) -> Vec<u64> {
    (0..count).map_while(|i| current.checked_sub(i)).collect()
}
