//! Behavior Module
//!
//! Per-user interaction history feeding the prediction model.

mod profile;
mod recorder;

pub use profile::{
    BehaviorUpdate, ListenEvent, PlaylistAction, PlaylistInteraction, TimePatterns,
    UserBehaviorProfile, MAX_LISTEN_HISTORY, MAX_PLAYLIST_INTERACTIONS, MAX_SEARCH_HISTORY,
};
pub use recorder::BehaviorRecorder;
