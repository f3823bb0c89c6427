// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Local generators used when no completion provider is available, plus the
//! download formats for their output.
//!
//! Every generator takes the RNG as a parameter so tests can seed it.

pub mod chat;
pub mod dataset;
pub mod diagnosis;
pub mod drug;
pub mod image;

/// A generated file ready to be sent as a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl Export {
    pub fn csv(filename: String, body: String) -> Self {
        Self {
            filename,
            content_type: "text/csv",
            body,
        }
    }

    pub fn json(filename: String, body: String) -> Self {
        Self {
            filename,
            content_type: "application/json",
            body,
        }
    }

    pub fn text(filename: String, body: String) -> Self {
        Self {
            filename,
            content_type: "text/plain",
            body,
        }
    }
}

/// Download format selector (`?format=csv|json`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer flush failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Header plus records as RFC 4180 CSV; cells are quoted only when needed.
pub fn write_csv<R, F>(header: &[&str], records: R) -> Result<String, ExportError>
where
    R: IntoIterator<Item = Vec<F>>,
    F: AsRef<[u8]>,
{
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());
    writer.write_record(header)?;
    for record in records {
        writer.write_record(&record)?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}
