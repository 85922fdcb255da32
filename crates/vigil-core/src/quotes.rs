//! Encouragement lines shown around check-ins.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub text: String,
}

const QUOTES: &[&str] = &[
    "However hard the wind blows, life does not give up.",
    "Being alive is itself an answer.",
    "The world can be dark, and still you are here.",
    "Everything that happened is only a prologue.",
    "Every crack is where the light gets in.",
    "You came to this world; make sure you see the sun.",
    "Walk to where the river ends, then sit and watch the clouds rise.",
    "One day at a time is still forward.",
    "Someone out there is glad you checked in today.",
    "Rest is not quitting.",
];

/// A random encouragement line.
pub fn random_quote() -> Quote {
    let text = QUOTES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(QUOTES[0]);
    Quote {
        text: text.to_string(),
    }
}

/// Hours elapsed since the start of the current year. Shown in the
/// status output as a small "still counting" reminder.
pub fn hours_alive_this_year(now: DateTime<Utc>) -> i64 {
    let year_start = Utc
        .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    (now - year_start).num_hours()
}
