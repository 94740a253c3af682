use std::io::Write;
use std::path::Path;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Case-insensitive `.pdf` extension check on an uploaded filename.
pub fn is_pdf_filename(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

/// Extract plain text from a PDF on disk.
pub fn extract_pdf_text(path: &Path) -> Result<String, String> {
    pdf_extract::extract_text(path).map_err(|e| format!("PDF parse error: {}", e))
}

/// Write uploaded bytes to a scratch `.pdf` file and extract its text.
/// The scratch file is removed when this returns, on success or failure.
pub fn extract_uploaded_pdf(bytes: &[u8]) -> Result<String, String> {
    let mut scratch = tempfile::Builder::new()
        .prefix("upload-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| e.to_string())?;
    scratch.write_all(bytes).map_err(|e| e.to_string())?;
    scratch.flush().map_err(|e| e.to_string())?;

    extract_pdf_text(scratch.path())
}

/// Filename without its extension, reduced to characters that are safe in a URL path segment.
pub fn document_stem(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");
    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

/// Split text into overlapping chunks for embedding.
///
/// Sizes are in characters. Each chunk starts `chunk_size - overlap` characters
/// after the previous one; the final chunk ends at the end of the text.
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() || chunk_size == 0 {
        return vec![];
    }

    let chars: Vec<char> = text.chars().collect();
    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end >= chars.len() {
            break;
        }
        start += step;
    }

    chunks
}
