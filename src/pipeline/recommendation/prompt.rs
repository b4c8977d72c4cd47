use super::types::{OracleRequest, RankingQuery};
use super::RecommendationError;
use crate::models::DoctorRecord;

pub const RANKING_SYSTEM_PROMPT: &str = "You are a medical AI that recommends doctors based on \
patient conditions. Always respond with valid JSON.";

/// Fewest / most doctors the oracle is asked to rank.
pub const TOP_K_MIN: usize = 3;
pub const TOP_K_MAX: usize = 5;

const MAX_NAME_LENGTH: usize = 200;
const MAX_BIO_LENGTH: usize = 600;

/// Trim, clean and de-blank the caller's condition list.
///
/// Fails with `InvalidInput` when nothing usable remains. This runs before
/// any store read or network call. Count and length are not limited.
pub fn normalize_conditions(raw: &[String]) -> Result<Vec<String>, RecommendationError> {
    let conditions: Vec<String> = raw
        .iter()
        .map(|c| clean_text(c))
        .filter(|c| !c.is_empty())
        .collect();

    if conditions.is_empty() {
        return Err(RecommendationError::InvalidInput(
            "at least one patient condition is required".into(),
        ));
    }
    Ok(conditions)
}

/// Build the ranking request for `query`.
///
/// Doctors are enumerated with 0-based indices in `query.doctors` order;
/// the assembler resolves `doctor_index` against that same slice.
pub fn compose_request(query: &RankingQuery) -> Result<OracleRequest, RecommendationError> {
    if query.conditions.iter().all(|c| c.trim().is_empty()) {
        return Err(RecommendationError::InvalidInput(
            "at least one patient condition is required".into(),
        ));
    }

    let conditions = query
        .conditions
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");

    let doctors = query
        .doctors
        .iter()
        .enumerate()
        .map(|(index, doctor)| format_doctor(index, doctor))
        .collect::<Vec<_>>()
        .join("\n");

    let top_k = top_k_instruction(query.doctors.len());
    let max_index = query.doctors.len().saturating_sub(1);

    let prompt = format!(
        r#"Analyze these patient conditions and recommend the best doctors.

Patient Conditions:
{conditions}
Is Rare Case: {rare}

Available Doctors:
{doctors}

{top_k} For each doctor, provide:
1. Why they are recommended (specific to the conditions)
2. A match score (0-100)
3. Priority level (High/Medium/Low)

Consider:
- Specialization match with conditions
- Experience level (especially for rare cases)
- Number of rare cases handled (if applicable)
- Current availability
- Overall rating

Use the bracketed index from the list above as doctor_index (0 to {max_index}).
Order the list from best to worst match.

Respond in JSON format with this structure:
{{
  "recommendations": [
    {{
      "doctor_index": <index from list above>,
      "match_score": <0-100>,
      "reason": "<specific reason for recommendation>",
      "priority": "<High/Medium/Low>"
    }}
  ]
}}"#,
        rare = query.is_rare_case,
    );

    Ok(OracleRequest {
        system: RANKING_SYSTEM_PROMPT.to_string(),
        prompt,
        doctor_count: query.doctors.len(),
    })
}

fn top_k_instruction(doctor_count: usize) -> String {
    if doctor_count <= TOP_K_MIN {
        format!("Rank all {doctor_count} doctors.")
    } else {
        let max = doctor_count.min(TOP_K_MAX);
        format!("Rank the top {TOP_K_MIN}-{max} doctors best suited for these conditions.")
    }
}

fn format_doctor(index: usize, doctor: &DoctorRecord) -> String {
    let bio = doctor
        .bio
        .as_deref()
        .map(|b| clean_field(b, MAX_BIO_LENGTH))
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "[{index}] {name}
   - Specialization: {specialization}
   - Experience: {experience} years
   - Rating: {rating:.1}/5
   - Rare Cases Handled: {rare}
   - Total Patients: {patients}
   - Currently Available: {available}
   - Bio: {bio}",
        name = clean_field(doctor.display_name(), MAX_NAME_LENGTH),
        specialization = doctor.specialization.label(),
        experience = doctor.experience_years,
        rating = doctor.rating,
        rare = doctor.rare_cases_handled,
        patients = doctor.total_patients_handled,
        available = if doctor.is_available { "Yes" } else { "No" },
    )
}

/// Strip invisible/control characters and collapse whitespace to single spaces.
fn clean_text(raw: &str) -> String {
    let visible: String = raw
        .chars()
        .filter(|c| !is_invisible(*c))
        .map(|c| if c.is_whitespace() || c.is_control() { ' ' } else { c })
        .collect();

    visible.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `clean_text`, truncated at a char boundary.
fn clean_field(raw: &str, max_chars: usize) -> String {
    clean_text(raw).chars().take(max_chars).collect()
}

fn is_invisible(c: char) -> bool {
    matches!(
        c,
        '\u{200B}'..='\u{200F}' | '\u{202A}'..='\u{202E}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}'
    )
}
