use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

use regex::bytes::Regex;

use crate::core::errors::Result;

/// The `%PDF-` marker must appear within this many leading bytes.
const HEADER_WINDOW: usize = 1024;

const PDF_MARKER: &[u8] = b"%PDF-";

const CHUNK_SIZE: usize = 64 * 1024;

/// Bytes carried between chunks so a reference split across a boundary still matches.
const OVERLAP: usize = 64;

/// What a cheap scan of a file tells us before any tool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfProbe {
    pub is_pdf: bool,
    pub is_encrypted: bool,
    pub len: u64,
}

impl PdfProbe {
    /// A file a backend may hand back as its result: a non-empty PDF
    /// that no longer carries an encryption dictionary.
    pub fn is_decrypted_pdf(&self) -> bool {
        self.len > 0 && self.is_pdf && !self.is_encrypted
    }
}

fn encrypt_ref() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // `/Encrypt 12 0 R` in a trailer or xref stream dict, or an inline `/Encrypt <<`.
    RE.get_or_init(|| {
        Regex::new(r"/Encrypt\s*(?:\d+\s+\d+\s+R|<<)").expect("encrypt pattern is valid")
    })
}

/// Scan a file for the PDF header and an encryption dictionary reference.
pub fn probe(path: &Path) -> Result<PdfProbe> {
    let len = std::fs::metadata(path)?.len();
    let mut reader = BufReader::new(File::open(path)?);
    scan(&mut reader, len)
}

/// Streaming scan; memory stays bounded regardless of file size.
pub fn scan<R: Read>(reader: &mut R, len: u64) -> Result<PdfProbe> {
    let mut is_pdf = false;
    let mut is_encrypted = false;
    let mut window: Vec<u8> = Vec::with_capacity(CHUNK_SIZE + OVERLAP);
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut consumed = 0usize;

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        window.extend_from_slice(&chunk[..n]);

        if !is_pdf && consumed < HEADER_WINDOW {
            let head_len = window.len().min(HEADER_WINDOW - consumed + PDF_MARKER.len() - 1);
            is_pdf = find(&window[..head_len], PDF_MARKER);
        }
        if !is_encrypted && encrypt_ref().is_match(&window) {
            is_encrypted = true;
        }
        if is_encrypted && (is_pdf || consumed >= HEADER_WINDOW) {
            break;
        }

        let keep = window.len().min(OVERLAP);
        consumed += window.len() - keep;
        window.drain(..window.len() - keep);
    }

    Ok(PdfProbe {
        is_pdf,
        is_encrypted,
        len,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
