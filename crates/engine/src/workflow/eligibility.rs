//! Eligibility waiter.
//!
//! The registration status endpoint lists the reasons a student may not yet
//! register. When one of them announces an opening time, the run blocks on the
//! clock until that instant plus a safety margin, then carries on.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;
use veil_types::{DomainError, ProtocolError, StepError, TransportError};
use veil_util::format_wait_duration;

use crate::clock::{Clock, SleepOutcome};

/// Phrase marking the failure message that carries an opening time.
pub const REGISTRATION_WINDOW_PHRASE: &str = "You can register from";

const WINDOW_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M %p";

static WINDOW_TIMESTAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4} \d{2}:\d{2} [APM]{2}").expect("valid window timestamp pattern"));

/// A future instant before which registration is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibilityWindow {
    pub opens_at: DateTime<Tz>,
    pub safety_margin: Duration,
}

impl EligibilityWindow {
    /// Time to wait from `now`, or `None` when the window is already open.
    pub fn wait_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        let opens_at = self.opens_at.with_timezone(&Utc);
        if opens_at <= now {
            return None;
        }
        (opens_at - now).to_std().ok().map(|remaining| remaining + self.safety_margin)
    }
}

/// What the status payload says about registering now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    OpensAt(EligibilityWindow),
}

/// Parses a `MM/DD/YYYY HH:MM AM` timestamp found anywhere in `text` as local time in `zone`.
pub fn parse_window_timestamp(text: &str, zone: Tz) -> Result<DateTime<Tz>, ProtocolError> {
    let invalid = |reason: &str| ProtocolError::InvalidDate {
        value: text.to_string(),
        reason: reason.to_string(),
    };
    let matched = WINDOW_TIMESTAMP.find(text).ok_or_else(|| invalid("no timestamp found"))?;
    let naive = NaiveDateTime::parse_from_str(matched.as_str(), WINDOW_TIMESTAMP_FORMAT)
        .map_err(|error| invalid(&error.to_string()))?;
    zone.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| invalid("local time does not exist in the reference time zone"))
}

/// Classifies the eligibility failures returned for a term.
///
/// No failures means eligible. Otherwise the first message containing
/// [`REGISTRATION_WINDOW_PHRASE`] decides the window; when no message has the
/// phrase the student is not eligible at all.
pub fn assess_eligibility(failures: &[String], zone: Tz, safety_margin: Duration) -> Result<Eligibility, StepError> {
    if failures.is_empty() {
        return Ok(Eligibility::Eligible);
    }
    let Some(message) = failures.iter().find(|message| message.contains(REGISTRATION_WINDOW_PHRASE)) else {
        return Err(DomainError::NotEligible {
            messages: failures.to_vec(),
        }
        .into());
    };
    let opens_at = parse_window_timestamp(message, zone)?;
    Ok(Eligibility::OpensAt(EligibilityWindow { opens_at, safety_margin }))
}

/// Blocks on `clock` until `window` opens plus its margin.
///
/// Returns the duration waited, or `None` when the window was already open.
/// A cancelled wait is reported as an interrupted transport so the retry
/// policy may re-check the status.
pub fn wait_for_window(window: &EligibilityWindow, clock: &dyn Clock) -> Result<Option<Duration>, StepError> {
    let now = clock.now();
    info!(opens_at = %window.opens_at, "registration window announced");
    let Some(wait) = window.wait_from(now) else {
        info!("registration window already open");
        return Ok(None);
    };

    let resume_at = now + chrono::Duration::from_std(wait).unwrap_or(chrono::Duration::zero());
    info!(
        resume_at = %resume_at.with_timezone(&window.opens_at.timezone()).format("%Y-%m-%d %I:%M:%S %p %Z"),
        wait = %format_wait_duration(wait),
        "waiting for registration window"
    );
    match clock.sleep(wait) {
        SleepOutcome::Elapsed => Ok(Some(wait)),
        SleepOutcome::Cancelled => Err(TransportError::Interrupted.into()),
    }
}

#[cfg(test)]
mod tests {
    use chrono_tz::America::Los_Angeles;

    use super::*;
    use crate::clock::ManualClock;

    const MARGIN: Duration = Duration::from_secs(5);

    #[test]
    fn parses_timestamp_in_reference_zone() {
        let parsed = parse_window_timestamp("You can register from 05/01/2024 08:00 AM", Los_Angeles).unwrap();
        assert_eq!(parsed.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 5, 1, 15, 0, 0).unwrap());

        let afternoon = parse_window_timestamp("from 11/04/2024 01:30 PM to later", Los_Angeles).unwrap();
        assert_eq!(afternoon.with_timezone(&Utc), Utc.with_ymd_and_hms(2024, 11, 4, 21, 30, 0).unwrap());
    }

    #[test]
    fn unparseable_timestamp_is_protocol_error() {
        let error = parse_window_timestamp("You can register from tomorrow", Los_Angeles).unwrap_err();
        assert!(matches!(error, ProtocolError::InvalidDate { .. }));
        let error = parse_window_timestamp("You can register from 13/45/2024 08:00 AM", Los_Angeles).unwrap_err();
        assert!(matches!(error, ProtocolError::InvalidDate { .. }));
    }

    #[test]
    fn empty_failures_are_eligible() {
        assert_eq!(assess_eligibility(&[], Los_Angeles, MARGIN).unwrap(), Eligibility::Eligible);
    }

    #[test]
    fn failures_without_window_are_not_eligible() {
        let failures = vec!["Holds prevent registration.".to_string()];
        let error = assess_eligibility(&failures, Los_Angeles, MARGIN).unwrap_err();
        assert_eq!(
            error,
            StepError::Domain(DomainError::NotEligible {
                messages: failures.clone()
            })
        );
        assert!(error.is_terminal());
    }

    #[test]
    fn first_window_message_is_honoured() {
        let failures = vec![
            "Registration is closed for online students.".to_string(),
            "You can register from 05/01/2024 08:00 AM".to_string(),
            "You can register from 06/01/2024 08:00 AM".to_string(),
        ];
        let Eligibility::OpensAt(window) = assess_eligibility(&failures, Los_Angeles, MARGIN).unwrap() else {
            panic!("expected a window");
        };
        assert_eq!(window.opens_at.format("%m/%d").to_string(), "05/01");
        assert_eq!(window.safety_margin, MARGIN);
    }

    #[test]
    fn waits_until_window_plus_margin() {
        let opens_at = parse_window_timestamp("05/01/2024 08:00 AM", Los_Angeles).unwrap();
        let now = opens_at.with_timezone(&Utc) - chrono::Duration::hours(2);
        let clock = ManualClock::new(now);
        let window = EligibilityWindow {
            opens_at,
            safety_margin: MARGIN,
        };

        let waited = wait_for_window(&window, &clock).unwrap();

        let expected = Duration::from_secs(2 * 60 * 60) + MARGIN;
        assert_eq!(waited, Some(expected));
        assert_eq!(clock.sleeps(), vec![expected]);
        assert!(clock.now() > opens_at.with_timezone(&Utc));
    }

    #[test]
    fn cancelled_wait_is_interrupted_transport() {
        let opens_at = parse_window_timestamp("05/01/2024 08:00 AM", Los_Angeles).unwrap();
        let clock = ManualClock::new(opens_at.with_timezone(&Utc) - chrono::Duration::minutes(10));
        clock.cancel_handle().cancel();
        let window = EligibilityWindow {
            opens_at,
            safety_margin: MARGIN,
        };

        let error = wait_for_window(&window, &clock).unwrap_err();

        assert_eq!(error, StepError::Transport(TransportError::Interrupted));
        assert!(!error.is_terminal());
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(600) + MARGIN]);
    }

    #[test]
    fn open_window_does_not_wait() {
        let opens_at = parse_window_timestamp("05/01/2024 08:00 AM", Los_Angeles).unwrap();
        let clock = ManualClock::new(opens_at.with_timezone(&Utc));
        let window = EligibilityWindow {
            opens_at,
            safety_margin: MARGIN,
        };
        assert_eq!(wait_for_window(&window, &clock).unwrap(), None);
        assert!(clock.sleeps().is_empty());
    }
}
