// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Synthetic tabular datasets built from declarative field presets.

use super::{write_csv, Export, ExportError, ExportFormat};
use crate::error::ValidationError;
use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use validator::Validate;

/// Upper bound on rows per request.
pub const MAX_ROWS: usize = 10_000;

/// One generated record, keys in field order.
pub type Row = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    Patient,
    MedicalRecords,
    LabResults,
    Imaging,
    Custom,
}

impl DatasetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetType::Patient => "patient",
            DatasetType::MedicalRecords => "medical_records",
            DatasetType::LabResults => "lab_results",
            DatasetType::Imaging => "imaging",
            DatasetType::Custom => "custom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Date,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default = "default_include")]
    pub include: bool,
}

fn default_include() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Correlation {
    pub field1: String,
    pub field2: String,
    #[validate(range(min = 0.0, max = 1.0))]
    pub strength: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Constraints {
    /// Percent chance that any one cell is left empty.
    #[validate(range(min = 0.0, max = 100.0))]
    pub missing_values: f64,
    /// Percent chance that a number cell is an outlier.
    #[validate(range(min = 0.0, max = 100.0))]
    pub outliers: f64,
    #[serde(default)]
    #[validate(nested)]
    pub correlations: Vec<Correlation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DatasetConfig {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DatasetType,
    #[validate(range(min = 1, max = 10000))]
    pub size: usize,
    pub fields: Vec<FieldSpec>,
    #[validate(nested)]
    pub constraints: Constraints,
}

impl DatasetConfig {
    pub fn included_fields(&self) -> impl Iterator<Item = &FieldSpec> {
        self.fields.iter().filter(|f| f.include)
    }

    /// Structural checks beyond the derived ranges.
    pub fn check(&self) -> Result<(), ValidationError> {
        self.validate()?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("Dataset name is required"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(ValidationError::new("Field names must not be empty"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(ValidationError::new(format!(
                    "Duplicate field: {}",
                    field.name
                )));
            }
        }

        if self.included_fields().next().is_none() {
            return Err(ValidationError::new("Select at least one field"));
        }

        for c in &self.constraints.correlations {
            for name in [&c.field1, &c.field2] {
                if !seen.contains(name.as_str()) {
                    return Err(ValidationError::new(format!(
                        "Correlation refers to unknown field: {}",
                        name
                    )));
                }
            }
        }
        Ok(())
    }
}

// ─── Presets ─────────────────────────────────────────────────────

fn field(name: &str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name: name.to_string(),
        kind,
        options: Vec::new(),
        include: true,
    }
}

fn enum_field(name: &str, options: &[&str]) -> FieldSpec {
    FieldSpec {
        options: options.iter().map(|o| o.to_string()).collect(),
        ..field(name, FieldKind::Enum)
    }
}

fn correlate(field1: &str, field2: &str, strength: f64) -> Correlation {
    Correlation {
        field1: field1.to_string(),
        field2: field2.to_string(),
        strength,
    }
}

/// Starting configuration for a dataset type.
pub fn preset(data_type: DatasetType) -> DatasetConfig {
    let (name, size, fields, missing_values, outliers, correlations) = match data_type {
        DatasetType::Patient => (
            "Synthetic Patient Dataset",
            100,
            vec![
                field("patient_id", FieldKind::String),
                field("age", FieldKind::Number),
                enum_field("gender", &["Male", "Female", "Other"]),
                field("weight_kg", FieldKind::Number),
                field("height_cm", FieldKind::Number),
                enum_field(
                    "blood_type",
                    &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"],
                ),
                enum_field("smoking_status", &["Never", "Former", "Current"]),
                field("diabetes", FieldKind::Boolean),
                field("hypertension", FieldKind::Boolean),
                field("heart_disease", FieldKind::Boolean),
            ],
            5.0,
            2.0,
            vec![
                correlate("age", "hypertension", 0.6),
                correlate("smoking_status", "heart_disease", 0.4),
            ],
        ),
        DatasetType::MedicalRecords => (
            "Synthetic Medical Records",
            100,
            vec![
                field("record_id", FieldKind::String),
                field("patient_id", FieldKind::String),
                field("visit_date", FieldKind::Date),
                field("diagnosis_code", FieldKind::String),
                field("diagnosis_description", FieldKind::String),
                field("medication_prescribed", FieldKind::String),
                field("dosage", FieldKind::String),
                field("follow_up_required", FieldKind::Boolean),
                field("follow_up_date", FieldKind::Date),
                field("notes", FieldKind::String),
            ],
            10.0,
            3.0,
            vec![
                correlate("diagnosis_code", "medication_prescribed", 0.8),
                correlate("follow_up_required", "follow_up_date", 0.9),
            ],
        ),
        DatasetType::LabResults => (
            "Synthetic Lab Results",
            100,
            vec![
                field("result_id", FieldKind::String),
                field("patient_id", FieldKind::String),
                field("test_date", FieldKind::Date),
                field("test_name", FieldKind::String),
                field("result_value", FieldKind::Number),
                field("unit", FieldKind::String),
                field("reference_range_low", FieldKind::Number),
                field("reference_range_high", FieldKind::Number),
                field("is_abnormal", FieldKind::Boolean),
                field("notes", FieldKind::String),
            ],
            5.0,
            8.0,
            vec![correlate("result_value", "is_abnormal", 0.7)],
        ),
        DatasetType::Imaging => (
            "Synthetic Imaging Metadata",
            50,
            vec![
                field("image_id", FieldKind::String),
                field("patient_id", FieldKind::String),
                field("image_date", FieldKind::Date),
                enum_field("modality", &["X-Ray", "MRI", "CT", "Ultrasound", "PET"]),
                field("body_part", FieldKind::String),
                field("radiologist_id", FieldKind::String),
                field("finding", FieldKind::String),
                enum_field(
                    "finding_severity",
                    &["Normal", "Mild", "Moderate", "Severe", "Critical"],
                ),
                field("follow_up_recommended", FieldKind::Boolean),
                field("notes", FieldKind::String),
            ],
            3.0,
            2.0,
            vec![correlate("finding_severity", "follow_up_recommended", 0.8)],
        ),
        DatasetType::Custom => (
            "Custom Medical Dataset",
            100,
            vec![
                field("id", FieldKind::String),
                field("value", FieldKind::Number),
                enum_field("category", &["Category A", "Category B", "Category C"]),
                field("date", FieldKind::Date),
                field("flag", FieldKind::Boolean),
            ],
            5.0,
            3.0,
            vec![],
        ),
    };

    DatasetConfig {
        name: name.to_string(),
        data_type,
        size,
        fields,
        constraints: Constraints {
            missing_values,
            outliers,
            correlations,
        },
    }
}

// ─── Generation ──────────────────────────────────────────────────

fn fabricate<R: Rng + ?Sized>(
    field: &FieldSpec,
    index: usize,
    outliers: f64,
    today: NaiveDate,
    rng: &mut R,
) -> Value {
    match field.kind {
        FieldKind::String => {
            if field.name.contains("id") {
                let initial = field
                    .name
                    .chars()
                    .next()
                    .map(|c| c.to_ascii_uppercase())
                    .unwrap_or('X');
                Value::from(format!("{}{:05}", initial, index))
            } else {
                Value::from(format!("{}_value_{}", field.name, rng.gen_range(0..1000)))
            }
        }
        FieldKind::Number => {
            if rng.gen::<f64>() * 100.0 < outliers {
                return Value::from(rng.gen::<f64>() * 1000.0);
            }
            let n: i64 = match field.name.as_str() {
                "age" => rng.gen_range(0..80) + 18,
                "weight_kg" => rng.gen_range(0..100) + 40,
                "height_cm" => rng.gen_range(0..50) + 150,
                _ => rng.gen_range(0..100),
            };
            Value::from(n)
        }
        FieldKind::Boolean => Value::from(rng.gen::<f64>() > 0.5),
        FieldKind::Date => {
            let date = today - Duration::days(rng.gen_range(0..365));
            Value::from(date.format("%Y-%m-%d").to_string())
        }
        FieldKind::Enum => Value::from(
            field
                .options
                .choose(rng)
                .map(String::as_str)
                .unwrap_or("Unknown"),
        ),
    }
}

fn apply_correlation<R: Rng + ?Sized>(row: &mut Row, c: &Correlation, rng: &mut R) {
    let Some(source) = row.get(&c.field1).cloned() else {
        return;
    };
    if rng.gen::<f64>() >= c.strength {
        return;
    }

    if let Value::Bool(b) = source {
        row.insert(c.field2.clone(), Value::Bool(b));
    } else if let (Some(x), Some(Value::Number(_))) = (source.as_f64(), row.get(&c.field2)) {
        let scaled = x * (0.8 + rng.gen::<f64>() * 0.4);
        row.insert(c.field2.clone(), Value::from(scaled));
    } else if c.field1 == "finding_severity" && c.field2 == "follow_up_recommended" {
        let severe = matches!(source.as_str(), Some("Moderate" | "Severe" | "Critical"));
        row.insert(c.field2.clone(), Value::Bool(severe));
    }
}

/// Fabricate `config.size` rows.
///
/// Cells are dropped at the missing-value rate, then correlated pairs are
/// adjusted. Every included field is guaranteed to appear in at least one
/// row and excluded fields never appear.
pub fn generate<R: Rng + ?Sized>(config: &DatasetConfig, today: NaiveDate, rng: &mut R) -> Vec<Row> {
    let included: Vec<&FieldSpec> = config.included_fields().collect();
    let size = config.size.clamp(1, MAX_ROWS);
    let constraints = &config.constraints;

    let mut rows: Vec<Row> = (0..size)
        .map(|i| {
            let mut row = Row::new();
            for field in &included {
                if rng.gen::<f64>() * 100.0 < constraints.missing_values {
                    continue;
                }
                let value = fabricate(field, i, constraints.outliers, today, rng);
                row.insert(field.name.clone(), value);
            }
            row
        })
        .collect();

    // Correlations may only write fields that are part of the output.
    let correlations: Vec<&Correlation> = constraints
        .correlations
        .iter()
        .filter(|c| included.iter().any(|f| f.name == c.field2))
        .collect();
    for c in correlations {
        for row in rows.iter_mut() {
            apply_correlation(row, c, rng);
        }
    }

    for field in &included {
        if !rows.iter().any(|r| r.contains_key(&field.name)) {
            let value = fabricate(field, 0, constraints.outliers, today, rng);
            rows[0].insert(field.name.clone(), value);
        }
    }

    rows
}

// ─── Export ──────────────────────────────────────────────────────

fn csv_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// CSV with a header of included fields in configuration order. Missing
/// values are empty cells.
pub fn to_csv(config: &DatasetConfig, rows: &[Row]) -> Result<String, ExportError> {
    let names: Vec<&str> = config.included_fields().map(|f| f.name.as_str()).collect();
    let records = rows
        .iter()
        .map(|row| names.iter().map(|n| csv_cell(row.get(*n))).collect::<Vec<_>>());
    write_csv(&names, records)
}

/// Lowercased name with whitespace runs replaced by `_`.
pub fn slugify(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

pub fn export(
    config: &DatasetConfig,
    rows: &[Row],
    format: ExportFormat,
    epoch_ms: i64,
) -> Result<Export, ExportError> {
    let stem = format!("{}_{}", slugify(&config.name), epoch_ms);
    Ok(match format {
        ExportFormat::Csv => Export::csv(format!("{}.csv", stem), to_csv(config, rows)?),
        ExportFormat::Json => Export::json(format!("{}.json", stem), serde_json::to_string_pretty(rows)?),
    })
}
