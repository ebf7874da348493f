//! Per-user behavior history and the merge rules that keep it bounded.

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Most recent listens kept per user.
pub const MAX_LISTEN_HISTORY: usize = 1000;
/// Most recent search queries kept per user.
pub const MAX_SEARCH_HISTORY: usize = 100;
/// Most recent playlist interactions kept per user.
pub const MAX_PLAYLIST_INTERACTIONS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenEvent {
    pub song_id: String,
    /// Unix milliseconds
    pub timestamp: u64,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub skip_reason: Option<String>,
}

impl ListenEvent {
    pub fn new(song_id: impl Into<String>, timestamp: u64) -> Self {
        Self {
            song_id: song_id.into(),
            timestamp,
            duration_ms: 0,
            skip_reason: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaylistAction {
    View,
    Play,
    Add,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistInteraction {
    pub playlist_id: String,
    pub action: PlaylistAction,
    /// Unix milliseconds
    pub timestamp: u64,
}

/// Listening activity bucketed by UTC hour of day and by weekday.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimePatterns {
    pub hourly: [u32; 24],
    /// Monday first
    pub weekday: [u32; 7],
    pub peak_hour: Option<u32>,
}

impl TimePatterns {
    /// Derives the buckets from a listen history.
    pub fn from_listens(listens: &[ListenEvent]) -> Self {
        let mut patterns = Self::default();
        for listen in listens {
            let Some(at) = i64::try_from(listen.timestamp)
                .ok()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
            else {
                continue;
            };
            patterns.hourly[at.hour() as usize] += 1;
            patterns.weekday[at.weekday().num_days_from_monday() as usize] += 1;
        }

        patterns.peak_hour = patterns
            .hourly
            .iter()
            .enumerate()
            .filter(|(_, count)| **count > 0)
            // Earliest hour wins a tie
            .max_by(|(ha, a), (hb, b)| a.cmp(b).then_with(|| hb.cmp(ha)))
            .map(|(hour, _)| hour as u32);
        patterns
    }
}

// == Behavior Update ==
/// Partial profile submitted by the application; every list is optional.
///
/// `search_history` is taken as newer than anything already stored, most
/// recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorUpdate {
    #[serde(default)]
    pub listen_history: Vec<ListenEvent>,
    #[serde(default)]
    pub search_history: Vec<String>,
    #[serde(default)]
    pub playlist_interactions: Vec<PlaylistInteraction>,
}

impl BehaviorUpdate {
    pub fn listen(event: ListenEvent) -> Self {
        Self {
            listen_history: vec![event],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listen_history.is_empty()
            && self.search_history.is_empty()
            && self.playlist_interactions.is_empty()
    }
}

// == User Behavior Profile ==
/// Bounded interaction history of one user. Every list is most recent first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBehaviorProfile {
    pub user_id: String,
    pub listen_history: Vec<ListenEvent>,
    pub search_history: Vec<String>,
    pub playlist_interactions: Vec<PlaylistInteraction>,
    pub time_patterns: TimePatterns,
    pub updated_at: u64,
}

impl UserBehaviorProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    // == Merge ==
    /// Folds an update into the profile.
    ///
    /// Timestamped lists are sorted newest first, stripped of items older
    /// than `window_start`, then capped. Time patterns are rebuilt.
    pub fn merge(&mut self, update: BehaviorUpdate, window_start: u64, now: u64) {
        self.listen_history.extend(update.listen_history);
        self.listen_history
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.listen_history
            .retain(|listen| listen.timestamp >= window_start);
        self.listen_history.truncate(MAX_LISTEN_HISTORY);

        let mut searches = update.search_history;
        searches.append(&mut self.search_history);
        searches.truncate(MAX_SEARCH_HISTORY);
        self.search_history = searches;

        self.playlist_interactions
            .extend(update.playlist_interactions);
        self.playlist_interactions
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.playlist_interactions
            .retain(|interaction| interaction.timestamp >= window_start);
        self.playlist_interactions
            .truncate(MAX_PLAYLIST_INTERACTIONS);

        self.time_patterns = TimePatterns::from_listens(&self.listen_history);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR_MS: u64 = 60 * 60 * 1000;
    // 2024-01-01T00:00:00Z, a Monday
    const MONDAY: u64 = 1_704_067_200_000;

    fn listens(range: std::ops::Range<u64>) -> Vec<ListenEvent> {
        range
            .map(|i| ListenEvent::new(format!("song:{}", i), MONDAY + i))
            .collect()
    }

    #[test]
    fn test_listen_history_capped_keeping_most_recent() {
        let mut profile = UserBehaviorProfile::new("u1");
        profile.merge(
            BehaviorUpdate {
                listen_history: listens(0..800),
                ..BehaviorUpdate::default()
            },
            0,
            MONDAY,
        );
        profile.merge(
            BehaviorUpdate {
                listen_history: listens(800..1500),
                ..BehaviorUpdate::default()
            },
            0,
            MONDAY,
        );

        assert_eq!(profile.listen_history.len(), MAX_LISTEN_HISTORY);
        assert_eq!(profile.listen_history[0].song_id, "song:1499");
        assert_eq!(profile.listen_history[999].song_id, "song:500");
        assert!(profile
            .listen_history
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp));
    }

    #[test]
    fn test_out_of_order_update_is_sorted() {
        let mut profile = UserBehaviorProfile::new("u1");
        let mut update = listens(0..3);
        update.reverse();
        update.swap(0, 1);
        profile.merge(
            BehaviorUpdate {
                listen_history: update,
                ..BehaviorUpdate::default()
            },
            0,
            MONDAY,
        );

        let order: Vec<&str> = profile
            .listen_history
            .iter()
            .map(|l| l.song_id.as_str())
            .collect();
        assert_eq!(order, vec!["song:2", "song:1", "song:0"]);
    }

    #[test]
    fn test_window_drops_old_items() {
        let mut profile = UserBehaviorProfile::new("u1");
        profile.merge(
            BehaviorUpdate {
                listen_history: vec![
                    ListenEvent::new("old", MONDAY - 10),
                    ListenEvent::new("new", MONDAY + 10),
                ],
                playlist_interactions: vec![PlaylistInteraction {
                    playlist_id: "p".to_string(),
                    action: PlaylistAction::Play,
                    timestamp: MONDAY - 10,
                }],
                ..BehaviorUpdate::default()
            },
            MONDAY,
            MONDAY + 20,
        );

        assert_eq!(profile.listen_history.len(), 1);
        assert_eq!(profile.listen_history[0].song_id, "new");
        assert!(profile.playlist_interactions.is_empty());
        assert_eq!(profile.updated_at, MONDAY + 20);
    }

    #[test]
    fn test_search_history_newest_first_and_capped() {
        let mut profile = UserBehaviorProfile::new("u1");
        let first: Vec<String> = (0..90).map(|i| format!("old {}", i)).collect();
        let second: Vec<String> = (0..20).map(|i| format!("new {}", i)).collect();

        profile.merge(
            BehaviorUpdate {
                search_history: first,
                ..BehaviorUpdate::default()
            },
            0,
            MONDAY,
        );
        profile.merge(
            BehaviorUpdate {
                search_history: second,
                ..BehaviorUpdate::default()
            },
            0,
            MONDAY,
        );

        assert_eq!(profile.search_history.len(), MAX_SEARCH_HISTORY);
        assert_eq!(profile.search_history[0], "new 0");
        assert_eq!(profile.search_history[99], "old 79");
    }

    #[test]
    fn test_playlist_interactions_capped() {
        let mut profile = UserBehaviorProfile::new("u1");
        let interactions = (0..600)
            .map(|i| PlaylistInteraction {
                playlist_id: format!("p{}", i),
                action: PlaylistAction::View,
                timestamp: MONDAY + i,
            })
            .collect();
        profile.merge(
            BehaviorUpdate {
                playlist_interactions: interactions,
                ..BehaviorUpdate::default()
            },
            0,
            MONDAY,
        );

        assert_eq!(profile.playlist_interactions.len(), MAX_PLAYLIST_INTERACTIONS);
        assert_eq!(profile.playlist_interactions[0].playlist_id, "p599");
    }

    #[test]
    fn test_time_patterns() {
        let history = vec![
            ListenEvent::new("a", MONDAY + 9 * HOUR_MS),
            ListenEvent::new("b", MONDAY + 9 * HOUR_MS + 5),
            ListenEvent::new("c", MONDAY + 24 * HOUR_MS + 3 * HOUR_MS),
        ];
        let patterns = TimePatterns::from_listens(&history);

        assert_eq!(patterns.hourly[9], 2);
        assert_eq!(patterns.hourly[3], 1);
        assert_eq!(patterns.weekday[0], 2);
        assert_eq!(patterns.weekday[1], 1);
        assert_eq!(patterns.peak_hour, Some(9));
        assert_eq!(TimePatterns::from_listens(&[]).peak_hour, None);
    }

    #[test]
    fn test_update_deserializes_partially() {
        let update: BehaviorUpdate =
            serde_json::from_str(r#"{"search_history": ["lofi"]}"#).unwrap();
        assert_eq!(update.search_history, vec!["lofi".to_string()]);
        assert!(update.listen_history.is_empty());
        assert!(!update.is_empty());
    }
}
