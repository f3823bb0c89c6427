// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Symptom catalog, follow-up questions, canned diagnoses and the parser for
//! free-text AI diagnoses.

use crate::error::ValidationError;
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Symptom {
    pub id: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FollowUpQuestion {
    pub id: &'static str,
    pub question: &'static str,
    pub options: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub condition: String,
    pub probability: f64,
    pub description: String,
    pub recommendations: Vec<String>,
}

pub const SYMPTOMS: [Symptom; 16] = [
    Symptom { id: "1", name: "Headache" },
    Symptom { id: "2", name: "Fever" },
    Symptom { id: "3", name: "Cough" },
    Symptom { id: "4", name: "Fatigue" },
    Symptom { id: "5", name: "Shortness of breath" },
    Symptom { id: "6", name: "Sore throat" },
    Symptom { id: "7", name: "Muscle aches" },
    Symptom { id: "8", name: "Loss of taste or smell" },
    Symptom { id: "9", name: "Nausea" },
    Symptom { id: "10", name: "Diarrhea" },
    Symptom { id: "11", name: "Chest pain" },
    Symptom { id: "12", name: "Dizziness" },
    Symptom { id: "13", name: "Rash" },
    Symptom { id: "14", name: "Joint pain" },
    Symptom { id: "15", name: "Abdominal pain" },
    Symptom { id: "16", name: "Vomiting" },
];

const HEADACHE_QUESTIONS: &[FollowUpQuestion] = &[
    FollowUpQuestion {
        id: "h1",
        question: "How would you rate your headache pain on a scale of 1-10?",
        options: &["1-3 (Mild)", "4-7 (Moderate)", "8-10 (Severe)"],
    },
    FollowUpQuestion {
        id: "h2",
        question: "How long have you been experiencing headaches?",
        options: &["Less than a day", "1-3 days", "4-7 days", "More than a week"],
    },
    FollowUpQuestion {
        id: "h3",
        question: "Where is the pain located?",
        options: &["Front of head", "Back of head", "One side", "All over"],
    },
];

const FEVER_QUESTIONS: &[FollowUpQuestion] = &[
    FollowUpQuestion {
        id: "f1",
        question: "What is your current temperature?",
        options: &[
            "Below 100°F (37.8°C)",
            "100-102°F (37.8-38.9°C)",
            "Above 102°F (38.9°C)",
            "I haven't measured",
        ],
    },
    FollowUpQuestion {
        id: "f2",
        question: "How long have you had a fever?",
        options: &["Less than 24 hours", "1-3 days", "More than 3 days"],
    },
    FollowUpQuestion {
        id: "f3",
        question: "Does the fever come and go, or is it constant?",
        options: &["Comes and goes", "Constant", "Worse at certain times of day"],
    },
];

const COUGH_QUESTIONS: &[FollowUpQuestion] = &[
    FollowUpQuestion {
        id: "c1",
        question: "Is your cough dry or productive (bringing up mucus)?",
        options: &["Dry", "Productive (with mucus)", "Both/Varies"],
    },
    FollowUpQuestion {
        id: "c2",
        question: "How long have you been coughing?",
        options: &["Less than a week", "1-2 weeks", "More than 2 weeks"],
    },
    FollowUpQuestion {
        id: "c3",
        question: "Is your cough worse at any particular time?",
        options: &["Morning", "Night", "After exercise", "No particular pattern"],
    },
];

const BREATHING_QUESTIONS: &[FollowUpQuestion] = &[
    FollowUpQuestion {
        id: "s1",
        question: "When do you experience shortness of breath?",
        options: &[
            "At rest",
            "With mild activity",
            "With strenuous activity",
            "All the time",
        ],
    },
    FollowUpQuestion {
        id: "s2",
        question: "How long have you been experiencing shortness of breath?",
        options: &["Less than a day", "1-3 days", "4-7 days", "More than a week"],
    },
];

pub const DISCLAIMER: &str = "This AI-generated diagnosis is for informational purposes only and does not constitute professional medical advice, diagnosis, or treatment. Always seek the advice of your physician or other qualified health provider with any questions you may have regarding a medical condition.";

const DEFAULT_DESCRIPTION: &str = "No detailed description available.";
const DEFAULT_RECOMMENDATION: &str =
    "Consult with a healthcare professional for proper diagnosis and treatment.";

/// Follow-up questions asked for one symptom.
pub fn follow_up_questions(symptom_id: &str) -> &'static [FollowUpQuestion] {
    match symptom_id {
        "1" => HEADACHE_QUESTIONS,
        "2" => FEVER_QUESTIONS,
        "3" => COUGH_QUESTIONS,
        "5" => BREATHING_QUESTIONS,
        _ => &[],
    }
}

/// Catalog entries for the selected ids, in catalog order.
pub fn selected_symptoms(ids: &[String]) -> Result<Vec<Symptom>, ValidationError> {
    if let Some(unknown) = ids.iter().find(|id| !SYMPTOMS.iter().any(|s| s.id == *id)) {
        return Err(ValidationError::new(format!("Unknown symptom: {}", unknown)));
    }

    let selected: Vec<Symptom> = SYMPTOMS
        .iter()
        .filter(|s| ids.iter().any(|id| id == s.id))
        .copied()
        .collect();

    if selected.is_empty() {
        return Err(ValidationError::new("Please select at least one symptom"));
    }
    Ok(selected)
}

/// Questions for the follow-up step.
pub fn questions_for(symptoms: &[Symptom]) -> Vec<FollowUpQuestion> {
    symptoms
        .iter()
        .flat_map(|s| follow_up_questions(s.id).iter().copied())
        .collect()
}

/// Symptoms plus follow-up answers (keyed by question id).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiagnosisInput {
    pub symptom_ids: Vec<String>,
    #[serde(default)]
    pub answers: HashMap<String, String>,
    #[serde(default)]
    pub additional_info: Option<String>,
}

/// A diagnosis request that passed every check.
#[derive(Debug, Clone)]
pub struct CheckedDiagnosis {
    pub symptoms: Vec<Symptom>,
    /// (question, answer) in display order
    pub answers: Vec<(FollowUpQuestion, String)>,
    pub additional_info: Option<String>,
}

impl CheckedDiagnosis {
    pub fn symptom_ids(&self) -> Vec<String> {
        self.symptoms.iter().map(|s| s.id.to_string()).collect()
    }

    pub fn symptom_names(&self) -> Vec<String> {
        self.symptoms.iter().map(|s| s.name.to_string()).collect()
    }

    /// Question text and answer pairs, with the free-text note last.
    pub fn prompt_answers(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .answers
            .iter()
            .map(|(q, a)| (q.question.to_string(), a.clone()))
            .collect();
        if let Some(info) = &self.additional_info {
            pairs.push(("Additional Information".to_string(), info.clone()));
        }
        pairs
    }
}

impl DiagnosisInput {
    pub fn check(&self) -> Result<CheckedDiagnosis, ValidationError> {
        let symptoms = selected_symptoms(&self.symptom_ids)?;

        // Unanswered questions are skipped
        let mut answers = Vec::new();
        for question in questions_for(&symptoms) {
            let Some(answer) = self
                .answers
                .get(question.id)
                .map(|a| a.trim())
                .filter(|a| !a.is_empty())
            else {
                continue;
            };
            if !question.options.contains(&answer) {
                return Err(ValidationError::new(format!(
                    "Invalid answer for question {}",
                    question.id
                )));
            }
            answers.push((question, answer.to_string()));
        }

        Ok(CheckedDiagnosis {
            symptoms,
            answers,
            additional_info: self
                .additional_info
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        })
    }
}

// ─── Canned Results ──────────────────────────────────────────────

fn result(condition: &str, probability: f64, description: &str, recs: &[&str]) -> DiagnosisResult {
    DiagnosisResult {
        condition: condition.to_string(),
        probability,
        description: description.to_string(),
        recommendations: recs.iter().map(|r| r.to_string()).collect(),
    }
}

/// Lookup key for the canned table: ids sorted as strings, comma-joined.
pub fn fallback_key(symptom_ids: &[String]) -> String {
    let mut ids: Vec<&str> = symptom_ids.iter().map(String::as_str).collect();
    ids.sort_unstable();
    ids.join(",")
}

pub fn default_results() -> Vec<DiagnosisResult> {
    vec![result(
        "Multiple Possible Conditions",
        0.5,
        "Based on your symptoms, there are several possible conditions. More information is needed for a more accurate assessment.",
        &[
            "Monitor your symptoms and note any changes",
            "Rest and stay hydrated",
            "Consult with a healthcare professional for a proper diagnosis",
            "Seek immediate medical attention if symptoms worsen significantly",
        ],
    )]
}

/// Canned bundle for `key`, or the default bundle.
pub fn canned_results(key: &str) -> Vec<DiagnosisResult> {
    match key {
        "1,2" => vec![
            result(
                "Common Cold",
                0.65,
                "The common cold is a viral infection of your nose and throat. It's usually harmless, although it might not feel that way.",
                &[
                    "Rest and stay hydrated",
                    "Over-the-counter pain relievers",
                    "Saline nasal spray",
                    "Consult a doctor if symptoms worsen or persist beyond a week",
                ],
            ),
            result(
                "Influenza (Flu)",
                0.25,
                "Influenza is a viral infection that attacks your respiratory system \u{2014} your nose, throat and lungs.",
                &[
                    "Rest and stay hydrated",
                    "Over-the-counter fever reducers",
                    "Antiviral medications (if prescribed by a doctor)",
                    "Seek medical attention if symptoms are severe or you're in a high-risk group",
                ],
            ),
        ],
        "3,5" => vec![
            result(
                "Acute Bronchitis",
                0.55,
                "Bronchitis is an inflammation of the lining of your bronchial tubes, which carry air to and from your lungs.",
                &[
                    "Rest and stay hydrated",
                    "Over-the-counter cough suppressants",
                    "Humidifier to ease breathing",
                    "Consult a doctor if symptoms persist beyond 3 weeks or if you have recurring bronchitis",
                ],
            ),
            result(
                "COVID-19",
                0.35,
                "COVID-19 is a respiratory illness caused by the SARS-CoV-2 virus. Symptoms range from mild to severe.",
                &[
                    "Get tested for COVID-19",
                    "Self-isolate to prevent spreading the virus",
                    "Rest and stay hydrated",
                    "Seek immediate medical attention if you have trouble breathing or persistent chest pain",
                ],
            ),
        ],
        _ => default_results(),
    }
}

// ─── AI Text Parsing ─────────────────────────────────────────────

fn contains_any(line: &str, words: &[&str]) -> bool {
    words.iter().any(|w| line.contains(w))
}

/// Text after the first `:` or `-`, up to the next one.
fn second_segment(line: &str) -> Option<&str> {
    line.split([':', '-']).nth(1).map(str::trim)
}

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*%").expect("valid percent pattern"));

/// First `<digits><spaces>%` in `line`, as a fraction.
fn percent(line: &str) -> Option<f64> {
    let digits = PERCENT.captures(line)?.get(1)?;
    digits.as_str().parse::<f64>().ok().map(|n| n / 100.0)
}

/// Strip a leading bullet (`- `) or list number (`1. `).
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    if let Some(rest) = trimmed.strip_prefix('-') {
        return rest.trim_start();
    }
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 && line[digits..].starts_with('.') {
        return line[digits + 1..].trim_start();
    }
    line
}

/// Parse a free-text diagnosis into structured conditions.
///
/// Paragraphs mentioning a condition or diagnosis are scanned line by line.
/// Returns the default bundle when nothing parses.
pub fn parse_ai_diagnosis(content: &str) -> Vec<DiagnosisResult> {
    let normalized = content.replace("\r\n", "\n");
    let mut conditions = Vec::new();

    for section in normalized.split("\n\n") {
        if !contains_any(section, &["condition", "diagnosis", "Condition", "Diagnosis"]) {
            continue;
        }

        let mut condition = String::new();
        let mut description = String::new();
        let mut probability = 0.5;
        let mut recommendations = Vec::new();

        for line in section.lines() {
            let lower = line.to_lowercase();
            if contains_any(line, &["condition:", "Condition:", "diagnosis:", "Diagnosis:"]) {
                condition = second_segment(line)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("Unknown Condition")
                    .to_string();
            } else if contains_any(line, &["description", "Description"]) || lower.contains("about") {
                description = second_segment(line).unwrap_or("").to_string();
            } else if contains_any(line, &["probability", "Probability", "likelihood", "Likelihood"]) {
                if let Some(p) = percent(line) {
                    probability = p;
                }
            } else if contains_any(
                line,
                &["recommendation", "Recommendation", "treatment", "Treatment", "- "],
            ) {
                let rec = strip_list_marker(line).trim();
                let rec_lower = rec.to_lowercase();
                if !rec.is_empty()
                    && !rec_lower.contains("recommendation")
                    && !rec_lower.contains("treatment")
                {
                    recommendations.push(rec.to_string());
                }
            }
        }

        if !condition.is_empty() {
            conditions.push(DiagnosisResult {
                condition,
                description: if description.is_empty() {
                    DEFAULT_DESCRIPTION.to_string()
                } else {
                    description
                },
                probability,
                recommendations: if recommendations.is_empty() {
                    vec![DEFAULT_RECOMMENDATION.to_string()]
                } else {
                    recommendations
                },
            });
        }
    }

    if conditions.is_empty() {
        default_results()
    } else {
        conditions
    }
}

// ─── Report ──────────────────────────────────────────────────────

/// Plain-text diagnosis report.
pub fn render_report(date: NaiveDate, diagnosis: &CheckedDiagnosis, results: &[DiagnosisResult]) -> String {
    let mut out = String::from("MEDGEN AI DIAGNOSIS REPORT\n\n");
    out.push_str(&format!("Date: {}\n\n", date.format("%-m/%-d/%Y")));

    out.push_str("SYMPTOMS:\n");
    for symptom in &diagnosis.symptoms {
        out.push_str(&format!("- {}\n", symptom.name));
    }

    if let Some(info) = &diagnosis.additional_info {
        out.push_str(&format!("\nADDITIONAL INFORMATION:\n{}\n", info));
    }

    if !diagnosis.answers.is_empty() {
        out.push_str("\nFOLLOW-UP RESPONSES:\n");
        for (question, answer) in &diagnosis.answers {
            out.push_str(&format!("Q: {}\nA: {}\n\n", question.question, answer));
        }
    }

    out.push_str("\nDIAGNOSIS RESULTS:\n");
    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "\n{}. {} (Probability: {}%)\n",
            i + 1,
            result.condition,
            (result.probability * 100.0).round()
        ));
        out.push_str(&format!("   {}\n\n", result.description));
        out.push_str("   Recommendations:\n");
        for rec in &result.recommendations {
            out.push_str(&format!("   - {}\n", rec));
        }
        out.push('\n');
    }

    out.push_str("\nDISCLAIMER:\n");
    out.push_str(DISCLAIMER);
    out
}

pub fn report_filename(epoch_ms: i64) -> String {
    format!("medgen-diagnosis-{}.txt", epoch_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fallback_key_sorts_as_strings() {
        assert_eq!(fallback_key(&ids(&["2", "1"])), "1,2");
        assert_eq!(fallback_key(&ids(&["2", "10"])), "10,2");
    }

    #[test]
    fn test_canned_bundles() {
        let cold = canned_results("1,2");
        assert_eq!(cold[0].condition, "Common Cold");
        assert_eq!(cold[1].condition, "Influenza (Flu)");
        assert_eq!(canned_results("3,5")[0].condition, "Acute Bronchitis");
        assert_eq!(canned_results("4")[0].condition, "Multiple Possible Conditions");
    }

    #[test]
    fn test_check_requires_symptoms_but_not_answers() {
        let err = DiagnosisInput::default().check().unwrap_err();
        assert_eq!(err.0, "Please select at least one symptom");

        let input = DiagnosisInput {
            symptom_ids: ids(&["5"]),
            answers: HashMap::from([
                ("s1".to_string(), "At rest".to_string()),
                ("s2".to_string(), " ".to_string()),
            ]),
            additional_info: None,
        };
        let checked = input.check().unwrap();
        assert_eq!(checked.answers.len(), 1);
        assert_eq!(checked.answers[0].0.id, "s1");

        let input = DiagnosisInput {
            symptom_ids: ids(&["5"]),
            answers: HashMap::from([("s1".to_string(), "Sometimes".to_string())]),
            additional_info: None,
        };
        assert_eq!(input.check().unwrap_err().0, "Invalid answer for question s1");

        let input = DiagnosisInput {
            symptom_ids: ids(&["5", "4"]),
            answers: HashMap::from([
                ("s1".to_string(), "At rest".to_string()),
                ("s2".to_string(), "1-3 days".to_string()),
            ]),
            additional_info: Some("  ".into()),
        };
        let checked = input.check().unwrap();
        assert_eq!(checked.symptom_names(), ["Fatigue", "Shortness of breath"]);
        assert_eq!(checked.answers.len(), 2);
        assert!(checked.additional_info.is_none());
    }

    #[test]
    fn test_unknown_symptom_rejected() {
        let input = DiagnosisInput {
            symptom_ids: ids(&["99"]),
            ..Default::default()
        };
        assert!(input.check().unwrap_err().0.contains("Unknown symptom"));
    }

    #[test]
    fn test_parse_ai_text() {
        let text = "Possible Condition: Migraine\nDescription: Recurrent headaches.\nLikelihood: 60 %\nRecommendations:\n- Rest in a dark room\n1. Stay hydrated\n\nDiagnosis: Tension headache\nProbability about 30%\n\nPlease consult a doctor.";
        let results = parse_ai_diagnosis(text);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].condition, "Migraine");
        assert_eq!(results[0].description, "Recurrent headaches.");
        assert!((results[0].probability - 0.6).abs() < 1e-9);
        assert_eq!(results[0].recommendations, ["Rest in a dark room"]);
        assert_eq!(results[1].condition, "Tension headache");
        assert_eq!(results[1].description, DEFAULT_DESCRIPTION);
        assert_eq!(results[1].recommendations, [DEFAULT_RECOMMENDATION]);
    }

    #[test]
    fn test_percent_extraction() {
        assert_eq!(percent("Probability: 65%"), Some(0.65));
        assert_eq!(percent("Likelihood 65 %"), Some(0.65));
        assert_eq!(percent("about 3 in 10, or 30 %"), Some(0.3));
        assert_eq!(percent("Probability: high"), None);

        let results = parse_ai_diagnosis("Condition: Sinusitis\nProbability: unclear");
        assert_eq!(results[0].probability, 0.5);
    }

    #[test]
    fn test_unparseable_text_uses_default() {
        let results = parse_ai_diagnosis("I cannot help with that.");
        assert_eq!(results, default_results());
    }

    #[test]
    fn test_report_contains_sections() {
        let checked = DiagnosisInput {
            symptom_ids: ids(&["4"]),
            additional_info: Some("Started last week".into()),
            ..Default::default()
        }
        .check()
        .unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        let report = render_report(date, &checked, &default_results());
        assert!(report.starts_with("MEDGEN AI DIAGNOSIS REPORT\n\nDate: 3/7/2026\n\nSYMPTOMS:\n- Fatigue\n"));
        assert!(report.contains("1. Multiple Possible Conditions (Probability: 50%)"));
        assert!(report.ends_with(DISCLAIMER));
        assert_eq!(report_filename(1700000000000), "medgen-diagnosis-1700000000000.txt");
    }
}
