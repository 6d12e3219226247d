//! Multi-format content extraction.
//!
//! Every supported source kind is reduced to one normalized text string. A
//! parse failure is deliberately reported *as the extracted content* rather
//! than as an error: ingestion proceeds and the explanatory string becomes
//! searchable text. Callers that need to filter these out can match on the
//! "Error extracting" prefix.

use regex::Regex;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::warn;
use url::Url;
use walkdir::WalkDir;

/// Extension allow-list for file ingestion.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["txt", "pdf", "docx", "pptx"];

/// Maximum decompressed bytes read from a single OOXML archive entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Text,
    Html,
    Pdf,
    Docx,
    Pptx,
}

impl SourceKind {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => Some(SourceKind::Text),
            "pdf" => Some(SourceKind::Pdf),
            "docx" => Some(SourceKind::Docx),
            "pptx" => Some(SourceKind::Pptx),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            SourceKind::Text => "text/plain",
            SourceKind::Html => "text/html",
            SourceKind::Pdf => "application/pdf",
            SourceKind::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            SourceKind::Pptx => {
                "application/vnd.openxmlformats-officedocument.presentationml.presentation"
            }
        }
    }
}

/// Extracts normalized text from a payload. Never fails: parse errors become
/// the returned content (degraded, still ingestible).
pub fn extract_content(bytes: &[u8], kind: SourceKind) -> String {
    match kind {
        SourceKind::Text => String::from_utf8_lossy(bytes).trim().to_string(),
        SourceKind::Html => strip_html(&String::from_utf8_lossy(bytes)),
        SourceKind::Pdf => extract_pdf(bytes).unwrap_or_else(|reason| {
            warn!(%reason, "pdf extraction degraded to error text");
            format!("Error extracting PDF text: {reason}")
        }),
        SourceKind::Docx => extract_docx(bytes).unwrap_or_else(|reason| {
            warn!(%reason, "docx extraction degraded to error text");
            format!("Error extracting DOCX text: {reason}")
        }),
        SourceKind::Pptx => extract_pptx(bytes).unwrap_or_else(|reason| {
            warn!(%reason, "pptx extraction degraded to error text");
            format!("Error extracting PPTX text: {reason}")
        }),
    }
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Regex-based tag stripping, not a real parser: malformed markup may leak
/// visible fragments.
pub fn strip_html(html: &str) -> String {
    let without_tags = tag_re().replace_all(html, "");
    whitespace_re()
        .replace_all(&without_tags, " ")
        .trim()
        .to_string()
}

/// Per-page text extraction, pages joined with newlines.
fn extract_pdf(bytes: &[u8]) -> Result<String, String> {
    let document = lopdf::Document::load_mem(bytes).map_err(|error| error.to_string())?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| error.to_string())?;
        if !text.trim().is_empty() {
            pages.push(text.trim().to_string());
        }
    }

    if pages.is_empty() {
        return Err("pdf had no readable page text".to_string());
    }

    Ok(pages.join("\n"))
}

fn open_archive(bytes: &[u8]) -> Result<zip::ZipArchive<std::io::Cursor<&[u8]>>, String> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|error| error.to_string())
}

fn read_zip_entry(
    archive: &mut zip::ZipArchive<std::io::Cursor<&[u8]>>,
    name: &str,
) -> Result<Vec<u8>, String> {
    let entry = archive.by_name(name).map_err(|error| error.to_string())?;
    let mut out = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut out)
        .map_err(|error| error.to_string())?;
    if out.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(format!("archive entry {name} exceeds size limit"));
    }
    Ok(out)
}

/// Word-processor container: paragraph text from `word/document.xml`.
fn extract_docx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = open_archive(bytes)?;
    let xml = read_zip_entry(&mut archive, "word/document.xml")?;
    let text = collect_text_runs(&xml, b"p")?;
    if text.trim().is_empty() {
        return Err("document contains no paragraph text".to_string());
    }
    Ok(text.trim().to_string())
}

/// Slide-deck container: shape text from each `ppt/slides/slideN.xml`, slides
/// in numeric order.
fn extract_pptx(bytes: &[u8]) -> Result<String, String> {
    let mut archive = open_archive(bytes)?;
    let mut slide_names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("ppt/slides/slide") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    slide_names.sort_by_key(|name| {
        name.trim_start_matches("ppt/slides/slide")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });

    if slide_names.is_empty() {
        return Err("presentation contains no slides".to_string());
    }

    let mut out = String::new();
    for name in slide_names {
        let xml = read_zip_entry(&mut archive, &name)?;
        let text = collect_text_runs(&xml, b"p")?;
        if !text.trim().is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(text.trim());
        }
    }

    if out.trim().is_empty() {
        return Err("presentation contains no shape text".to_string());
    }
    Ok(out)
}

/// Concatenates `<t>` text runs, emitting a newline at the end of each
/// block element (`w:p` for docx, `a:p` for pptx).
fn collect_text_runs(xml: &[u8], block_tag: &[u8]) -> Result<String, String> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    if let Ok(quick_xml::events::Event::Text(te)) = reader.read_event_into(&mut buf)
                    {
                        out.push_str(te.unescape().unwrap_or_default().as_ref());
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == block_tag && !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(error) => return Err(error.to_string()),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

/// Last non-empty path segment of the URL, else its host.
pub fn title_from_url(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last().map(str::to_string));
    match segment {
        Some(name) if !name.is_empty() => name,
        _ => url.host_str().unwrap_or("untitled").to_string(),
    }
}

/// Recursively discovers files whose extension is on the allow-list, in
/// sorted order.
pub fn discover_supported_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let supported = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                ALLOWED_EXTENSIONS
                    .iter()
                    .any(|allowed| ext.eq_ignore_ascii_case(allowed))
            });

        if supported {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn plain_text_passes_through_trimmed() {
        let content = extract_content(b"  hello world \n", SourceKind::Text);
        assert_eq!(content, "hello world");
    }

    #[test]
    fn html_tags_are_stripped_and_whitespace_collapsed() {
        let html = b"<html><body><h1>Cells</h1>\n<p>divide   and\tgrow</p></body></html>";
        let content = extract_content(html, SourceKind::Html);
        assert_eq!(content, "Cells divide and grow");
    }

    #[test]
    fn malformed_markup_may_leak_fragments() {
        // Known limitation of regex stripping.
        let content = extract_content(b"<p>text < unclosed", SourceKind::Html);
        assert!(content.contains("text"));
    }

    #[test]
    fn broken_pdf_degrades_to_error_text() {
        let content = extract_content(b"not a pdf", SourceKind::Pdf);
        assert!(content.starts_with("Error extracting PDF text:"));
    }

    #[test]
    fn broken_docx_degrades_to_error_text() {
        let content = extract_content(b"not a zip", SourceKind::Docx);
        assert!(content.starts_with("Error extracting DOCX text:"));
    }

    #[test]
    fn extension_allow_list_is_enforced() {
        assert!(SourceKind::from_extension("PDF").is_some());
        assert!(SourceKind::from_extension("txt").is_some());
        assert!(SourceKind::from_extension("exe").is_none());
        assert!(SourceKind::from_extension("").is_none());
    }

    #[test]
    fn url_titles_prefer_the_last_path_segment() {
        let url = Url::parse("https://example.org/notes/photosynthesis.html").unwrap();
        assert_eq!(title_from_url(&url), "photosynthesis.html");

        let bare = Url::parse("https://example.org/").unwrap();
        assert_eq!(title_from_url(&bare), "example.org");
    }

    #[test]
    fn discovery_is_recursive_and_filtered() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested)?;

        File::create(dir.path().join("a.txt")).and_then(|mut f| f.write_all(b"alpha"))?;
        File::create(nested.join("b.PDF")).and_then(|mut f| f.write_all(b"%PDF-1.4"))?;
        File::create(nested.join("c.exe")).and_then(|mut f| f.write_all(b"MZ"))?;

        let files = discover_supported_files(dir.path());
        assert_eq!(files.len(), 2);
        Ok(())
    }
}
