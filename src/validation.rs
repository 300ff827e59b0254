//! Checks applied to an uploaded file before it reaches the core.

use crate::{Result, VeilError};

const PDF_SIGNATURE: &[u8] = b"%PDF-";
const PDF_EXTENSION: &str = ".pdf";

fn has_pdf_extension(file_name: &str) -> bool {
    file_name.len() > PDF_EXTENSION.len()
        && file_name
            .get(file_name.len() - PDF_EXTENSION.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PDF_EXTENSION))
}

/// File name without a trailing `.pdf`, in any case
pub fn strip_pdf_extension(file_name: &str) -> &str {
    if has_pdf_extension(file_name) {
        &file_name[..file_name.len() - PDF_EXTENSION.len()]
    } else {
        file_name
    }
}

/// Reject non-PDF names and files above `max_bytes`
pub fn validate_upload(file_name: &str, size: u64, max_bytes: u64) -> Result<()> {
    if !has_pdf_extension(file_name) {
        return Err(VeilError::Validation(format!("{file_name} is not a PDF file")));
    }
    if size > max_bytes {
        return Err(VeilError::Validation(format!(
            "{file_name} is {:.1} MB, the limit is {:.1} MB",
            size as f64 / 1_048_576.0,
            max_bytes as f64 / 1_048_576.0
        )));
    }
    Ok(())
}

/// Reject bytes that do not start like a PDF
pub fn check_signature(bytes: &[u8]) -> Result<()> {
    if bytes.starts_with(PDF_SIGNATURE) {
        Ok(())
    } else {
        Err(VeilError::Load("file does not start with a PDF header".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_case_insensitive() {
        assert!(validate_upload("Report.PDF", 10, 100).is_ok());
        assert!(validate_upload("report.pdf", 10, 100).is_ok());
        assert!(matches!(
            validate_upload("report.docx", 10, 100),
            Err(VeilError::Validation(_))
        ));
        assert!(validate_upload("pdf", 10, 100).is_err());
    }

    #[test]
    fn test_size_limit() {
        let limit = 25 * 1024 * 1024;
        assert!(validate_upload("a.pdf", limit, limit).is_ok());
        assert!(matches!(
            validate_upload("a.pdf", limit + 1, limit),
            Err(VeilError::Validation(_))
        ));
    }

    #[test]
    fn test_signature() {
        assert!(check_signature(b"%PDF-1.7\n...").is_ok());
        assert!(matches!(check_signature(b"PK\x03\x04"), Err(VeilError::Load(_))));
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_pdf_extension("contract.pdf"), "contract");
        assert_eq!(strip_pdf_extension("scan.final.PDF"), "scan.final");
        assert_eq!(strip_pdf_extension("notes"), "notes");
    }
}
