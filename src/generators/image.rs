// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Canned medical image analyses and their text report.

use crate::error::ValidationError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Xray,
    Mri,
    Report,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::Xray => "xray",
            ImageType::Mri => "mri",
            ImageType::Report => "report",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ImageType::Xray => "X-Ray",
            ImageType::Mri => "MRI/CT Scan",
            ImageType::Report => "Medical Report",
        }
    }
}

/// Bounding box in fractions of the image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedArea {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    #[serde(rename = "type")]
    pub image_type: ImageType,
    pub findings: Vec<String>,
    pub impression: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detected_areas: Vec<DetectedArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
    /// Completion-provider commentary, when a key is configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_interpretation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyzeImageRequest {
    #[serde(default)]
    pub image_type: Option<ImageType>,
    #[serde(default)]
    pub file_name: String,
}

impl AnalyzeImageRequest {
    pub fn check(&self) -> Result<(ImageType, &str), ValidationError> {
        let file_name = self.file_name.trim();
        if file_name.is_empty() {
            return Err(ValidationError::new("Please upload an image first"));
        }
        let image_type = self
            .image_type
            .ok_or_else(|| ValidationError::new("Please select an image type"))?;
        Ok((image_type, file_name))
    }
}

const LAB_REPORT_TEXT: &str = "LABORATORY REPORT\n\nPatient: John Doe\nDate: 06/15/2023\nTest: Comprehensive Metabolic Panel\n\nResults:\nGlucose: 95 mg/dL (70-99)\nBUN: 15 mg/dL (7-20)\nCreatinine: 0.9 mg/dL (0.6-1.2)\nSodium: 140 mEq/L (136-145)\nPotassium: 4.0 mEq/L (3.5-5.1)\nChloride: 101 mEq/L (98-107)\nCO2: 24 mEq/L (21-32)\nCalcium: 9.5 mg/dL (8.5-10.2)\nTotal Protein: 7.0 g/dL (6.0-8.3)\nAlbumin: 4.5 g/dL (3.5-5.0)\nTotal Bilirubin: 0.8 mg/dL (0.1-1.2)\nAST: 25 U/L (10-40)\nALT: 30 U/L (7-56)\nAlk Phos: 70 U/L (44-147)\n\nLipid Panel:\nTotal Cholesterol: 185 mg/dL (<200)\nHDL: 55 mg/dL (>40)\nLDL: 110 mg/dL (<100)\nTriglycerides: 100 mg/dL (<150)\n\nImpression: All values within normal range.";

fn area(label: &str, x: f64, y: f64, width: f64, height: f64, confidence: f64) -> DetectedArea {
    DetectedArea {
        x,
        y,
        width,
        height,
        label: label.to_string(),
        confidence,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Fixed analysis for each image type.
pub fn canned_analysis(image_type: ImageType) -> AnalysisResult {
    let (findings, impression, confidence, detected_areas, extracted_text) = match image_type {
        ImageType::Xray => (
            strings(&[
                "No acute cardiopulmonary process",
                "Heart size is normal",
                "Lungs are clear without focal consolidation",
                "No pleural effusion or pneumothorax",
                "No acute osseous abnormality",
            ]),
            "Normal chest radiograph",
            0.92,
            vec![
                area("Heart", 0.2, 0.3, 0.3, 0.2, 0.98),
                area("Right Lung", 0.6, 0.3, 0.2, 0.2, 0.95),
                area("Left Lung", 0.2, 0.3, 0.2, 0.2, 0.94),
            ],
            None,
        ),
        ImageType::Mri => (
            strings(&[
                "No evidence of acute infarction",
                "No intracranial hemorrhage",
                "No mass effect or midline shift",
                "Ventricles and sulci are normal in size and configuration",
                "No extra-axial fluid collections",
            ]),
            "Normal brain MRI without contrast",
            0.89,
            vec![
                area("Brain", 0.3, 0.3, 0.4, 0.4, 0.99),
                area("Ventricles", 0.4, 0.4, 0.1, 0.1, 0.87),
            ],
            None,
        ),
        ImageType::Report => (
            strings(&[
                "Blood glucose: 95 mg/dL (Normal range: 70-99 mg/dL)",
                "Total cholesterol: 185 mg/dL (Normal range: <200 mg/dL)",
                "HDL cholesterol: 55 mg/dL (Normal range: >40 mg/dL)",
                "LDL cholesterol: 110 mg/dL (Normal range: <100 mg/dL)",
                "Triglycerides: 100 mg/dL (Normal range: <150 mg/dL)",
            ]),
            "Lipid panel within normal limits. Blood glucose normal.",
            0.95,
            Vec::new(),
            Some(LAB_REPORT_TEXT.to_string()),
        ),
    };

    AnalysisResult {
        image_type,
        findings,
        impression: impression.to_string(),
        confidence,
        detected_areas,
        extracted_text,
        ai_interpretation: None,
    }
}

/// Plain-text analysis report.
pub fn render_report(date: NaiveDate, result: &AnalysisResult) -> String {
    let mut out = format!(
        "Medical Image Analysis Report\n\nType: {}\nDate: {}\n\nFindings:\n",
        result.image_type.as_str().to_uppercase(),
        date.format("%-m/%-d/%Y")
    );
    for (i, finding) in result.findings.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, finding));
    }
    out.push_str(&format!(
        "\nImpression: {}\nConfidence: {:.1}%\n",
        result.impression,
        result.confidence * 100.0
    ));
    if let Some(text) = &result.extracted_text {
        out.push_str(&format!("\nExtracted Text:\n{}\n", text));
    }
    if let Some(ai) = &result.ai_interpretation {
        out.push_str(&format!("\nAI Interpretation:\n{}\n", ai));
    }
    out
}

pub fn report_filename(epoch_ms: i64) -> String {
    format!("medical-image-analysis-{}.txt", epoch_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canned_results() {
        let xray = canned_analysis(ImageType::Xray);
        assert_eq!(xray.detected_areas.len(), 3);
        assert_eq!(xray.impression, "Normal chest radiograph");
        assert!(xray.extracted_text.is_none());

        let report = canned_analysis(ImageType::Report);
        assert!(report.detected_areas.is_empty());
        assert!(report.extracted_text.unwrap().starts_with("LABORATORY REPORT"));
    }

    #[test]
    fn test_report_text() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let text = render_report(date, &canned_analysis(ImageType::Mri));
        assert!(text.starts_with("Medical Image Analysis Report\n\nType: MRI\nDate: 1/2/2026\n"));
        assert!(text.contains("1. No evidence of acute infarction\n"));
        assert!(text.contains("Confidence: 89.0%"));
        assert!(!text.contains("Extracted Text"));
    }

    #[test]
    fn test_request_requires_file_and_type() {
        let req = AnalyzeImageRequest {
            image_type: Some(ImageType::Xray),
            file_name: String::new(),
        };
        assert!(req.check().is_err());

        let req = AnalyzeImageRequest {
            image_type: None,
            file_name: "chest.png".into(),
        };
        assert_eq!(req.check().unwrap_err().0, "Please select an image type");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(canned_analysis(ImageType::Xray)).unwrap();
        assert_eq!(json["type"], "xray");
        assert!(json["detectedAreas"].is_array());
    }
}
