// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Drug-candidate generation from a SMILES string, a disease or a protein
//! target.

use super::{write_csv, Export, ExportError, ExportFormat};
use crate::error::ValidationError;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Aspirin, used to prefill the SMILES input.
pub const DEFAULT_SMILES: &str = "CC(=O)OC1=CC=CC=C1C(=O)O";

pub const DEFAULT_CANDIDATE_COUNT: usize = 3;
pub const MAX_CANDIDATE_COUNT: usize = 10;

const SIDE_EFFECTS: [&str; 14] = [
    "Nausea",
    "Headache",
    "Dizziness",
    "Fatigue",
    "Insomnia",
    "Dry mouth",
    "Constipation",
    "Diarrhea",
    "Rash",
    "Itching",
    "Increased heart rate",
    "Decreased appetite",
    "Drowsiness",
    "Blurred vision",
];

const CSV_HEADER: [&str; 14] = [
    "id",
    "name",
    "smiles",
    "molecularWeight",
    "logP",
    "hDonors",
    "hAcceptors",
    "rotBonds",
    "polarSurfaceArea",
    "drugLikeness",
    "synthesizability",
    "predictedActivity",
    "bindingAffinity",
    "toxicityRisk",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMethod {
    Smiles,
    Disease,
    Protein,
}

impl GenerationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMethod::Smiles => "smiles",
            GenerationMethod::Disease => "disease",
            GenerationMethod::Protein => "protein",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToxicityRisk {
    Low,
    Medium,
    High,
}

impl ToxicityRisk {
    fn as_str(&self) -> &'static str {
        match self {
            ToxicityRisk::Low => "Low",
            ToxicityRisk::Medium => "Medium",
            ToxicityRisk::High => "High",
        }
    }

    fn base_side_effects(&self) -> usize {
        match self {
            ToxicityRisk::Low => 1,
            ToxicityRisk::Medium => 2,
            ToxicityRisk::High => 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrugCandidate {
    pub id: String,
    pub name: String,
    pub smiles: String,
    pub molecular_weight: f64,
    #[serde(rename = "logP")]
    pub log_p: f64,
    pub h_donors: u32,
    pub h_acceptors: u32,
    pub rot_bonds: u32,
    pub polar_surface_area: f64,
    pub drug_likeness: f64,
    pub synthesizability: f64,
    pub predicted_activity: f64,
    pub target_protein: String,
    pub binding_affinity: f64,
    pub toxicity_risk: ToxicityRisk,
    pub side_effects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DrugRequest {
    pub method: GenerationMethod,
    pub input: String,
    #[serde(default)]
    pub count: Option<usize>,
}

impl DrugRequest {
    /// Trimmed input and candidate count.
    pub fn check(&self) -> Result<(&str, usize), ValidationError> {
        let input = self.input.trim();
        if input.is_empty() {
            return Err(ValidationError::new("Please provide the required input"));
        }
        let count = self.count.unwrap_or(DEFAULT_CANDIDATE_COUNT);
        if !(1..=MAX_CANDIDATE_COUNT).contains(&count) {
            return Err(ValidationError::new(format!(
                "Candidate count must be between 1 and {}",
                MAX_CANDIDATE_COUNT
            )));
        }
        Ok((input, count))
    }
}

/// 1.0 minus 0.2 per rule-of-five violation, never below 0.1.
pub fn drug_likeness(molecular_weight: f64, log_p: f64, h_donors: u32, h_acceptors: u32) -> f64 {
    let violations = [
        molecular_weight > 500.0,
        log_p > 5.0,
        h_donors > 5,
        h_acceptors > 10,
    ]
    .iter()
    .filter(|v| **v)
    .count();
    (1.0 - 0.2 * violations as f64).clamp(0.1, 1.0)
}

/// Small random edit of a SMILES string.
pub fn modify_smiles<R: Rng + ?Sized>(smiles: &str, rng: &mut R) -> String {
    let mut modified = smiles.to_string();
    if let Some(idx) = smiles.find('C') {
        if rng.gen::<f64>() > 0.5 && rng.gen::<f64>() > 0.5 && idx > 0 {
            modified.replace_range(idx..idx + 1, "CC");
        }
    }

    if rng.gen::<f64>() > 0.7 {
        return if smiles.contains("=O") {
            smiles.replacen("=O", "=S", 1)
        } else if smiles.contains('F') {
            smiles.replacen('F', "Cl", 1)
        } else {
            format!("{}F", smiles)
        };
    }

    modified
}

fn structure_for<R: Rng + ?Sized>(
    method: GenerationMethod,
    input: &str,
    n: usize,
    rng: &mut R,
) -> (String, String, String) {
    match method {
        GenerationMethod::Smiles => (
            modify_smiles(input, rng),
            format!("Modified Compound {}", n),
            String::new(),
        ),
        GenerationMethod::Disease => {
            let disease = input.to_lowercase();
            let (smiles, label, target) = if disease.contains("diabetes") {
                (
                    "CC1=CN(C(=O)NC1=O)C2C(C(C(O2)CO)O)O",
                    "Anti-diabetic",
                    "Insulin Receptor",
                )
            } else if disease.contains("hypertension") {
                (
                    "CCOC(=O)C1=C(NC(=C(C1C(=O)OC)C(=O)OC)C)CCCN",
                    "Anti-hypertensive",
                    "Angiotensin-Converting Enzyme",
                )
            } else {
                (
                    "CC(C)(C)NC(=O)C1CC2CCCCC2CN1CC(C(CC3=CC=CC=C3)NC(=O)C(CC(=O)N)NC(=O)C)O",
                    "Disease-Targeted",
                    "Disease-Related Protein",
                )
            };
            (
                smiles.to_string(),
                format!("{} Compound {}", label, n),
                target.to_string(),
            )
        }
        GenerationMethod::Protein => (
            "O=C(N[C@@H](CC1=CC=CC=C1)C(=O)N2CCC[C@H]2C(=O)N[C@@H](CCCCN)C(=O)N[C@@H](CC(=O)N)C(=O)NCC(=O)N)C"
                .to_string(),
            format!("Protein-Targeted Compound {}", n),
            if input.is_empty() {
                "Custom Protein Target".to_string()
            } else {
                input.to_string()
            },
        ),
    }
}

/// Generate `count` candidates. The first is never high-toxicity.
pub fn generate<R: Rng + ?Sized>(
    method: GenerationMethod,
    input: &str,
    count: usize,
    epoch_ms: i64,
    rng: &mut R,
) -> Vec<DrugCandidate> {
    (0..count)
        .map(|i| {
            let (smiles, name, target_protein) = structure_for(method, input, i + 1, rng);

            let molecular_weight = 250.0 + rng.gen::<f64>() * 300.0;
            let log_p = -0.5 + rng.gen::<f64>() * 5.0;
            let h_donors = rng.gen_range(0..5) + 1;
            let h_acceptors = rng.gen_range(0..8) + 2;
            let rot_bonds = rng.gen_range(0..10) + 1;
            let polar_surface_area = 40.0 + rng.gen::<f64>() * 100.0;

            let synthesizability = 0.3 + rng.gen::<f64>() * 0.7;
            let predicted_activity = 0.4 + rng.gen::<f64>() * 0.6;
            let binding_affinity = 1.0 + rng.gen::<f64>() * 100.0;

            let risks = [ToxicityRisk::Low, ToxicityRisk::Medium, ToxicityRisk::High];
            let toxicity_risk = risks[rng.gen_range(0..if i == 0 { 2 } else { 3 })];

            let draws = rng.gen_range(0..4) + toxicity_risk.base_side_effects();
            let mut side_effects: Vec<String> = Vec::new();
            for _ in 0..draws {
                let effect = SIDE_EFFECTS[rng.gen_range(0..SIDE_EFFECTS.len())];
                if !side_effects.iter().any(|e| e == effect) {
                    side_effects.push(effect.to_string());
                }
            }

            DrugCandidate {
                id: format!("drug-{}-{}", epoch_ms, i),
                name,
                smiles,
                molecular_weight,
                log_p,
                h_donors,
                h_acceptors,
                rot_bonds,
                polar_surface_area,
                drug_likeness: drug_likeness(molecular_weight, log_p, h_donors, h_acceptors),
                synthesizability,
                predicted_activity,
                target_protein,
                binding_affinity,
                toxicity_risk,
                side_effects,
            }
        })
        .collect()
}

pub fn to_csv(candidates: &[DrugCandidate]) -> Result<String, ExportError> {
    let records = candidates.iter().map(|c| {
        vec![
            c.id.clone(),
            c.name.clone(),
            c.smiles.clone(),
            c.molecular_weight.to_string(),
            c.log_p.to_string(),
            c.h_donors.to_string(),
            c.h_acceptors.to_string(),
            c.rot_bonds.to_string(),
            c.polar_surface_area.to_string(),
            c.drug_likeness.to_string(),
            c.synthesizability.to_string(),
            c.predicted_activity.to_string(),
            c.binding_affinity.to_string(),
            c.toxicity_risk.as_str().to_string(),
        ]
    });
    write_csv(&CSV_HEADER, records)
}

pub fn export(candidates: &[DrugCandidate], format: ExportFormat) -> Result<Export, ExportError> {
    Ok(match format {
        ExportFormat::Csv => Export::csv("drug-candidates.csv".to_string(), to_csv(candidates)?),
        ExportFormat::Json => Export::json(
            "drug-candidates.json".to_string(),
            serde_json::to_string_pretty(candidates)?,
        ),
    })
}
