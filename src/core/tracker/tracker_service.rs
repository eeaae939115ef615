// Sliding-window activity tracker - per-(guild,user) spam bookkeeping.
//
// Each user gets three bounded structures:
// - a rate window of message timestamps, prefix-trimmed on every record
// - a mass-mention window, pruned the same way
// - a fixed-size ring of recent message bodies for duplicate detection
//
// NO Discord dependencies here - just pure domain logic. All timestamps are
// seconds on a monotonic clock supplied by the caller.

use crate::core::rules::GuildRuleSet;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::time::Instant;

/// Monotonic seconds since process start. Window arithmetic must never go
/// backwards, so wall-clock time is not used here.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// The flags produced by one `record` call. When several are set at once the
/// caller classifies them in the order rate > mass-mention > duplicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub rate_exceeded: bool,
    pub duplicate_exceeded: bool,
    pub mass_mention_exceeded: bool,
}

/// Per-user window state. Timestamps are monotonically non-decreasing and
/// oldest-first, so pruning is a pop-front loop rather than a full scan.
#[derive(Debug, Default)]
struct UserActivityWindow {
    message_times: VecDeque<f64>,
    mention_times: VecDeque<f64>,
    recent_bodies: VecDeque<String>,
    last_seen: f64,
}

impl UserActivityWindow {
    fn prune(&mut self, now: f64, window_secs: f64) {
        while let Some(&head) = self.message_times.front() {
            if now - head > window_secs {
                self.message_times.pop_front();
            } else {
                break;
            }
        }
        while let Some(&head) = self.mention_times.front() {
            if now - head > window_secs {
                self.mention_times.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Tracks message activity for spam detection, keyed by (guild, user).
///
/// DashMap entry locks linearize all updates for one key: two concurrent
/// messages from the same user cannot interleave inside `record`.
pub struct ActivityTracker {
    windows: DashMap<(u64, u64), UserActivityWindow>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self {
            windows: DashMap::new(),
        }
    }

    /// Record one message and return the window flags.
    ///
    /// Runs in constant time per call: pruning only pops entries that the
    /// bounded window admitted earlier, and the duplicate ring has fixed
    /// capacity `max_duplicates`.
    pub fn record(
        &self,
        guild_id: u64,
        user_id: u64,
        timestamp: f64,
        content: &str,
        mention_count: u32,
        is_broadcast_mention: bool,
        rules: &GuildRuleSet,
    ) -> WindowSnapshot {
        let mut window = self.windows.entry((guild_id, user_id)).or_default();
        window.last_seen = timestamp;

        let window_secs = rules.window_secs as f64;
        window.message_times.push_back(timestamp);
        window.prune(timestamp, window_secs);

        let mut snapshot = WindowSnapshot::default();

        if is_broadcast_mention || mention_count >= rules.max_mentions_per_message {
            window.mention_times.push_back(timestamp);
            // prune() already trimmed mention_times for this timestamp
            snapshot.mass_mention_exceeded = window.mention_times.len() > 2;
        }

        snapshot.rate_exceeded =
            window.message_times.len() > rules.max_messages_per_window as usize;

        // Duplicate ring: push the incoming body, evicting the oldest once
        // capacity is reached, then flag only when the full ring is uniform.
        // The triggering message counts toward its own streak, so the N-th
        // identical send fires with a threshold of N.
        let capacity = rules.max_duplicates.max(1) as usize;
        window.recent_bodies.push_back(content.to_string());
        while window.recent_bodies.len() > capacity {
            window.recent_bodies.pop_front();
        }
        snapshot.duplicate_exceeded = window.recent_bodies.len() == capacity
            && window.recent_bodies.iter().all(|body| body == content);

        snapshot
    }

    /// Number of messages currently inside a user's rate window.
    pub fn window_len(&self, guild_id: u64, user_id: u64) -> usize {
        self.windows
            .get(&(guild_id, user_id))
            .map(|w| w.message_times.len())
            .unwrap_or(0)
    }

    /// Drop windows untouched for longer than `idle_secs`. Returns how many
    /// were evicted. Run periodically so per-user state stays bounded over
    /// the process lifetime.
    pub fn evict_idle(&self, now: f64, idle_secs: f64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, w| now - w.last_seen <= idle_secs);
        before - self.windows.len()
    }
}

impl Default for ActivityTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn rules(window_secs: u64, max_messages: u32, max_duplicates: u32) -> GuildRuleSet {
        GuildRuleSet {
            window_secs,
            max_messages_per_window: max_messages,
            max_duplicates,
            max_mentions_per_message: 5,
            ..Default::default()
        }
    }

    #[test]
    fn rate_fires_on_the_ninth_message_in_a_six_second_window() {
        let tracker = ActivityTracker::new();
        let rules = rules(6, 8, 3);

        for i in 0..8 {
            let ts = i as f64 * 0.1;
            let snap = tracker.record(1, 2, ts, &format!("m{}", i), 0, false, &rules);
            assert!(!snap.rate_exceeded, "message {} should be allowed", i);
        }
        let snap = tracker.record(1, 2, 0.8, "m8", 0, false, &rules);
        assert!(snap.rate_exceeded);
    }

    #[test]
    fn expired_timestamps_are_trimmed_from_the_front() {
        let tracker = ActivityTracker::new();
        let rules = rules(6, 8, 3);

        for i in 0..8 {
            tracker.record(1, 2, i as f64 * 0.1, "x", 99, false, &rules);
        }
        assert_eq!(tracker.window_len(1, 2), 8);

        // Well past the window: everything old falls out, the new message
        // is the only survivor.
        let snap = tracker.record(1, 2, 100.0, "x", 0, false, &rules);
        assert!(!snap.rate_exceeded);
        assert_eq!(tracker.window_len(1, 2), 1);
    }

    #[test]
    fn pruning_at_the_same_timestamp_is_idempotent() {
        let mut window = UserActivityWindow::default();
        for ts in [0.0, 1.0, 8.0, 9.0] {
            window.message_times.push_back(ts);
        }
        window.prune(9.0, 6.0);
        let after_first: Vec<f64> = window.message_times.iter().copied().collect();
        window.prune(9.0, 6.0);
        let after_second: Vec<f64> = window.message_times.iter().copied().collect();
        assert_eq!(after_first, vec![8.0, 9.0]);
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn duplicate_fires_on_the_threshold_th_identical_message() {
        let tracker = ActivityTracker::new();
        let rules = rules(60, 100, 3);

        assert!(!tracker.record(1, 2, 0.0, "hi", 0, false, &rules).duplicate_exceeded);
        assert!(!tracker.record(1, 2, 0.1, "hi", 0, false, &rules).duplicate_exceeded);
        assert!(tracker.record(1, 2, 0.2, "hi", 0, false, &rules).duplicate_exceeded);
        // Ring is still full of "hi", so a fourth keeps firing.
        assert!(tracker.record(1, 2, 0.3, "hi", 0, false, &rules).duplicate_exceeded);
    }

    #[test]
    fn a_differing_message_resets_the_duplicate_streak() {
        let tracker = ActivityTracker::new();
        let rules = rules(60, 100, 3);

        tracker.record(1, 2, 0.0, "hi", 0, false, &rules);
        tracker.record(1, 2, 0.1, "hi", 0, false, &rules);
        tracker.record(1, 2, 0.2, "something else", 0, false, &rules);
        // Two more "hi" are not enough: the ring is no longer uniform.
        assert!(!tracker.record(1, 2, 0.3, "hi", 0, false, &rules).duplicate_exceeded);
        assert!(!tracker.record(1, 2, 0.4, "hi", 0, false, &rules).duplicate_exceeded);
        assert!(tracker.record(1, 2, 0.5, "hi", 0, false, &rules).duplicate_exceeded);
    }

    #[test]
    fn mass_mention_needs_three_flagged_messages_in_window() {
        let tracker = ActivityTracker::new();
        let rules = rules(10, 100, 3);

        let snap = tracker.record(1, 2, 0.0, "a", 6, false, &rules);
        assert!(!snap.mass_mention_exceeded);
        let snap = tracker.record(1, 2, 0.1, "b", 0, true, &rules);
        assert!(!snap.mass_mention_exceeded);
        let snap = tracker.record(1, 2, 0.2, "c", 7, false, &rules);
        assert!(snap.mass_mention_exceeded);
    }

    #[test]
    fn mass_mention_entries_expire_with_the_window() {
        let tracker = ActivityTracker::new();
        let rules = rules(10, 100, 3);

        tracker.record(1, 2, 0.0, "a", 9, false, &rules);
        tracker.record(1, 2, 0.1, "b", 9, false, &rules);
        // Third flagged message arrives after the first two left the window.
        let snap = tracker.record(1, 2, 30.0, "c", 9, false, &rules);
        assert!(!snap.mass_mention_exceeded);
    }

    #[test]
    fn normal_mention_counts_stay_out_of_the_mention_window() {
        let tracker = ActivityTracker::new();
        let rules = rules(10, 100, 3);

        for i in 0..5 {
            let snap = tracker.record(1, 2, i as f64, "x", 1, false, &rules);
            assert!(!snap.mass_mention_exceeded);
        }
    }

    #[test]
    fn keys_are_independent_across_guilds_and_users() {
        let tracker = ActivityTracker::new();
        let rules = rules(6, 2, 3);

        tracker.record(1, 2, 0.0, "a", 0, false, &rules);
        tracker.record(1, 2, 0.1, "b", 0, false, &rules);
        // Same user, other guild: fresh window.
        let snap = tracker.record(9, 2, 0.2, "c", 0, false, &rules);
        assert!(!snap.rate_exceeded);
        // Same guild, other user: fresh window.
        let snap = tracker.record(1, 7, 0.3, "d", 0, false, &rules);
        assert!(!snap.rate_exceeded);
    }

    #[test]
    fn idle_windows_are_evicted() {
        let tracker = ActivityTracker::new();
        let rules = rules(6, 8, 3);

        tracker.record(1, 2, 0.0, "a", 0, false, &rules);
        tracker.record(1, 3, 500.0, "b", 0, false, &rules);

        let evicted = tracker.evict_idle(600.0, 300.0);
        assert_eq!(evicted, 1);
        assert_eq!(tracker.window_len(1, 2), 0);
        assert_eq!(tracker.window_len(1, 3), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_records_for_one_key_lose_no_updates() {
        let tracker = Arc::new(ActivityTracker::new());
        let rules = Arc::new(rules(3600, 1000, 3));

        let mut handles = Vec::new();
        for i in 0..64u32 {
            let tracker = Arc::clone(&tracker);
            let rules = Arc::clone(&rules);
            handles.push(tokio::spawn(async move {
                tracker.record(1, 2, i as f64 * 0.001, "msg", 0, false, &rules);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // Nothing expired (huge window), so every record must be present.
        assert_eq!(tracker.window_len(1, 2), 64);
    }
}
