//! Forex market calendar: session bands and the weekly open/closed schedule.
//!
//! Both functions are pure and total — every UTC hour maps to exactly one
//! session, and every (hour, ISO weekday) pair to a deterministic flag.
//! The market week runs Monday 00:00 UTC through Friday 22:00 UTC, reopening
//! Sunday 22:00 UTC.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Named trading session, derived purely from UTC hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Session {
    SydneyTokyo,
    Tokyo,
    TokyoLondon,
    London,
    LondonNewYork,
    NewYork,
    Sydney,
}

impl Session {
    /// Store-facing label, matching the `trading_session` column values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Session::SydneyTokyo => "SYDNEY_TOKYO",
            Session::Tokyo => "TOKYO",
            Session::TokyoLondon => "TOKYO_LONDON",
            Session::London => "LONDON",
            Session::LondonNewYork => "LONDON_NEW_YORK",
            Session::NewYork => "NEW_YORK",
            Session::Sydney => "SYDNEY",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a UTC hour into its session band.
///
/// Fixed priority bands: overlap hours (Sydney/Tokyo, Tokyo/London,
/// London/New York) get their own labels, so the mapping is unambiguous.
pub fn session_for_hour(hour: u8) -> Session {
    match hour {
        0..=5 => Session::SydneyTokyo,
        6..=7 => Session::Tokyo,
        8 => Session::TokyoLondon,
        9..=12 => Session::London,
        13..=16 => Session::LondonNewYork,
        17..=20 => Session::NewYork,
        _ => Session::Sydney,
    }
}

/// Whether the forex market is open at the given UTC hour and ISO weekday
/// (Monday = 1 … Sunday = 7).
///
/// Closed from Friday 22:00 UTC until Sunday 22:00 UTC; open the rest of
/// the week.
pub fn is_market_open(hour: u8, iso_weekday: u8) -> bool {
    match iso_weekday {
        5 => hour < 22,  // Friday
        6 => false,      // Saturday
        7 => hour >= 22, // Sunday
        _ => true,       // Monday-Thursday
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hour_has_a_session() {
        for hour in 0..24u8 {
            // Total function: no hour panics, and the label is non-empty.
            assert!(!session_for_hour(hour).as_str().is_empty());
        }
    }

    #[test]
    fn session_bands() {
        assert_eq!(session_for_hour(0), Session::SydneyTokyo);
        assert_eq!(session_for_hour(5), Session::SydneyTokyo);
        assert_eq!(session_for_hour(6), Session::Tokyo);
        assert_eq!(session_for_hour(8), Session::TokyoLondon);
        assert_eq!(session_for_hour(10), Session::London);
        assert_eq!(session_for_hour(13), Session::LondonNewYork);
        assert_eq!(session_for_hour(16), Session::LondonNewYork);
        assert_eq!(session_for_hour(17), Session::NewYork);
        assert_eq!(session_for_hour(20), Session::NewYork);
        assert_eq!(session_for_hour(21), Session::Sydney);
        assert_eq!(session_for_hour(23), Session::Sydney);
    }

    #[test]
    fn weekend_schedule() {
        // Saturday: closed all day.
        for hour in 0..24u8 {
            assert!(!is_market_open(hour, 6));
        }
        // Friday: open until 22:00.
        assert!(is_market_open(21, 5));
        assert!(!is_market_open(22, 5));
        assert!(!is_market_open(23, 5));
        // Sunday: reopens at 22:00.
        assert!(!is_market_open(21, 7));
        assert!(is_market_open(22, 7));
        assert!(is_market_open(23, 7));
    }

    #[test]
    fn weekdays_open_around_the_clock() {
        for weekday in 1..=4u8 {
            for hour in 0..24u8 {
                assert!(is_market_open(hour, weekday));
            }
        }
    }
}
