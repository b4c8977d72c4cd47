use super::types::{RawSuggestion, Recommendation};
use crate::models::{DoctorRecord, Priority};

pub const HINT_AVAILABLE: &str = "Available now";
pub const HINT_CHECK_SCHEDULE: &str = "Check schedule";

/// Join suggestions to the doctor records they index.
///
/// `doctors` must be the same slice, in the same order, that the prompt
/// enumerated. Entries whose index does not resolve are dropped; the rest
/// keep their input order.
pub fn assemble(suggestions: &[RawSuggestion], doctors: &[DoctorRecord]) -> Vec<Recommendation> {
    let mut recommendations = Vec::with_capacity(suggestions.len());

    for suggestion in suggestions {
        let Some(doctor) = resolve(suggestion.doctor_index, doctors) else {
            tracing::debug!(
                doctor_index = suggestion.doctor_index,
                doctor_count = doctors.len(),
                "Dropping suggestion with unresolvable index"
            );
            continue;
        };

        recommendations.push(Recommendation {
            doctor_id: doctor.id,
            doctor_name: doctor.display_name().to_string(),
            specialization: doctor.specialization,
            experience_years: doctor.experience_years,
            rating: doctor.rating,
            is_available: doctor.is_available,
            rare_cases_handled: doctor.rare_cases_handled,
            match_score: clamp_score(suggestion.match_score),
            reason: suggestion.reason.clone(),
            priority: suggestion.priority.as_deref().and_then(Priority::parse_lenient),
            next_available: scheduling_hint(doctor).to_string(),
        });
    }

    recommendations
}

fn resolve(index: i64, doctors: &[DoctorRecord]) -> Option<&DoctorRecord> {
    usize::try_from(index).ok().and_then(|i| doctors.get(i))
}

fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

pub fn scheduling_hint(doctor: &DoctorRecord) -> &'static str {
    if doctor.is_available {
        HINT_AVAILABLE
    } else {
        HINT_CHECK_SCHEDULE
    }
}
