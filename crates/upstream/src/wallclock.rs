use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};

/// Builds an interval that fires on every epoch boundary, aligned against
/// the chain's genesis time.
pub fn epoch_interval(
    genesis_time: u64,
    seconds_per_slot: u64,
    slots_per_epoch: u64,
) -> anyhow::Result<Interval> {
    let now = SystemTime::now();
    let genesis_instant = UNIX_EPOCH + Duration::from_secs(genesis_time);
    let epoch_duration = Duration::from_secs(seconds_per_slot * slots_per_epoch);

    let interval_start = if now < genesis_instant {
        Instant::now()
            + genesis_instant
                .duration_since(now)
                .map_err(|err| anyhow!("System time seems to have drifted backwards: {err:?}"))?
    } else {
        let epoch_millis = epoch_duration.as_millis();
        let elapsed_millis = now
            .duration_since(genesis_instant)
            .map_err(|err| anyhow!("Failed to calculate elapsed time since genesis: {err:?}"))?
            .as_millis();

        let time_until_next_epoch = epoch_millis - (elapsed_millis % epoch_millis);
        Instant::now() + Duration::from_millis(time_until_next_epoch as u64)
    };

    let mut interval = interval_at(interval_start, epoch_duration);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    Ok(interval)
}

/// The epoch in progress at the current wall-clock time.
pub fn current_epoch(genesis_time: u64, seconds_per_slot: u64, slots_per_epoch: u64) -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if now < genesis_time {
        return 0;
    }

    (now - genesis_time) / (seconds_per_slot * slots_per_epoch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_epoch_before_genesis() {
        let future_genesis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;

        assert_eq!(current_epoch(future_genesis, 12, 32), 0);
    }

    #[test]
    fn test_current_epoch_advances_with_time() {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();

        // Genesis ten epochs ago.
        let genesis = now - 10 * 12 * 32;

        assert_eq!(current_epoch(genesis, 12, 32), 10);
    }
}
