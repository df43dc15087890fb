use std::path::Path;

use lopdf::Document;

use crate::cli::has_pdf_extension;
use crate::error::CompressError;

/// Check that `path` names an existing `.pdf` file
pub fn validate_input(path: &Path) -> Result<(), CompressError> {
    if !path.exists() {
        return Err(CompressError::InputNotFound(path.to_path_buf()));
    }
    if !path.is_file() {
        return Err(CompressError::NotAFile(path.to_path_buf()));
    }
    if !has_pdf_extension(path) {
        return Err(CompressError::NotPdf(path.to_path_buf()));
    }
    Ok(())
}

/// Validate and parse the input PDF
pub fn load_document(path: &Path) -> Result<Document, CompressError> {
    validate_input(path)?;

    let mut doc = Document::load(path).map_err(|e| CompressError::InvalidPdf(e.to_string()))?;
    decrypt(&mut doc)?;

    if doc.trailer.get(b"Root").is_err() {
        return Err(CompressError::InvalidPdf(
            "document has no catalog".to_string(),
        ));
    }

    log::debug!(
        "Loaded {} (PDF {}, {} objects, {} pages)",
        path.display(),
        doc.version,
        doc.objects.len(),
        doc.get_pages().len()
    );

    Ok(doc)
}

/// Decrypt in place with the empty user password.
///
/// Stream keys depend on object numbers, which `serialize` rewrites, so an
/// encrypted document is either fully decrypted here or rejected.
fn decrypt(doc: &mut Document) -> Result<(), CompressError> {
    if !doc.is_encrypted() {
        return Ok(());
    }

    doc.decrypt("").map_err(|e| {
        CompressError::InvalidPdf(format!(
            "encrypted document could not be opened without a password: {}",
            e
        ))
    })?;
    log::info!("Decrypted document with the empty user password");

    Ok(())
}

/// Drop unreferenced objects, deflate plain streams and write the document to bytes.
pub fn serialize(doc: &mut Document) -> Result<Vec<u8>, CompressError> {
    let pruned = doc.prune_objects();
    if !pruned.is_empty() {
        log::debug!("Pruned {} unreferenced objects", pruned.len());
    }
    doc.renumber_objects();
    doc.compress();

    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| CompressError::Write(e.to_string()))?;

    Ok(output)
}
