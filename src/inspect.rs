use lopdf::{Document as LoDocument, Object as LoObject};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetInspectErrorCode {
    PdfParseFailed,
    PdfIoError,
}

impl SheetInspectErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SheetInspectErrorCode::PdfParseFailed => "PDF_PARSE_FAILED",
            SheetInspectErrorCode::PdfIoError => "PDF_IO_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetInspectError {
    pub code: SheetInspectErrorCode,
    pub message: String,
}

impl std::fmt::Display for SheetInspectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for SheetInspectError {}

/// Structural facts about a generated sheet, read back from the PDF bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetInspectReport {
    pub pdf_version: String,
    pub page_count: usize,
    pub media_box: Option<(f32, f32)>,
    pub file_size_bytes: usize,
}

pub fn inspect_sheet_bytes(bytes: &[u8]) -> Result<SheetInspectReport, SheetInspectError> {
    let pdf = LoDocument::load_mem(bytes).map_err(|err| SheetInspectError {
        code: SheetInspectErrorCode::PdfParseFailed,
        message: err.to_string(),
    })?;

    let media_box = pdf.get_pages().values().next().and_then(|&page_id| {
        let page = pdf.get_object(page_id).ok()?.as_dict().ok()?;
        let raw = page.get(b"MediaBox").ok()?;
        let values = raw.as_array().ok()?;
        if values.len() != 4 {
            return None;
        }
        let number = |obj: &LoObject| -> Option<f32> {
            match obj {
                LoObject::Integer(v) => Some(*v as f32),
                LoObject::Real(v) => Some(*v as f32),
                _ => None,
            }
        };
        Some((number(&values[2])?, number(&values[3])?))
    });

    Ok(SheetInspectReport {
        pdf_version: pdf.version.clone(),
        page_count: pdf.get_pages().len(),
        media_box,
        file_size_bytes: bytes.len(),
    })
}

pub fn inspect_sheet_path(path: &Path) -> Result<SheetInspectReport, SheetInspectError> {
    let data = std::fs::read(path).map_err(|err| SheetInspectError {
        code: SheetInspectErrorCode::PdfIoError,
        message: err.to_string(),
    })?;
    inspect_sheet_bytes(&data)
}
