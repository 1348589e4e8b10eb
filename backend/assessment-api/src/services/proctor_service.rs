use crate::config::ProctorSettings;
use crate::models::attempt::AssessmentAttempt;

/// Reviews the flag counters after a proctoring event. Purely observational:
/// logs a review warning when a counter crosses its threshold, never blocks
/// the attempt or touches scoring.
pub fn note_flags(attempt: &AssessmentAttempt, settings: &ProctorSettings) {
    let flags = &attempt.proctor_flags;

    if flags.focus_changes == settings.focus_warn_threshold {
        tracing::warn!(
            "Proctor review: attempt={} user={} focus changes reached {}",
            attempt.id,
            attempt.user_id,
            flags.focus_changes
        );
    }

    if flags.paste_count == settings.paste_warn_threshold {
        tracing::warn!(
            "Proctor review: attempt={} user={} paste count reached {}",
            attempt.id,
            attempt.user_id,
            flags.paste_count
        );
    }
}
