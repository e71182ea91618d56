//! Input discovery for email documents.
//!
//! Inputs are explicit files, directories walked for mail files, or
//! stdin. Every readable file becomes one [`InputDocument`].

use crate::cli::is_stdin;
use crate::config::InputConfig;
use crate::models::InputDocument;
use anyhow::{Context, Result};
use mail_parser::MessageParser;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Source label used for stdin.
pub const STDIN_SOURCE: &str = "<stdin>";

/// Collects documents from paths and stdin.
pub struct InputCollector {
    config: InputConfig,
}

impl InputCollector {
    pub fn new(config: InputConfig) -> Self {
        Self { config }
    }

    /// Read every input into a document, capped at `max_files`.
    pub fn collect(&self, inputs: &[PathBuf]) -> Result<Vec<InputDocument>> {
        let mut documents = Vec::new();

        for input in inputs {
            if documents.len() >= self.config.max_files {
                warn!("Reached max_files ({}), ignoring remaining inputs", self.config.max_files);
                break;
            }

            if is_stdin(input) {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("Failed to read email from stdin")?;
                documents.push(InputDocument::new(STDIN_SOURCE, content));
            } else if input.is_dir() {
                for path in self.scan_dir(input) {
                    if documents.len() >= self.config.max_files {
                        break;
                    }
                    if let Some(doc) = self.read_file(&path) {
                        documents.push(doc);
                    }
                }
            } else if let Some(doc) = self.read_file(input) {
                documents.push(doc);
            }
        }

        Ok(documents)
    }

    /// Mail files under `dir`, sorted by path.
    pub fn scan_dir(&self, dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name().to_str()))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|e| e.file_type().is_file() && self.matches_extension(e.path()))
            .map(|e| e.into_path())
            .collect();

        files.sort();
        files
    }

    fn matches_extension(&self, path: &Path) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        self.config.extensions.iter().any(|e| e.eq_ignore_ascii_case(&ext))
    }

    /// Read one file, skipping it with a warning if unusable.
    fn read_file(&self, path: &Path) -> Option<InputDocument> {
        let size = match fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };

        if size > self.config.max_file_size {
            warn!(
                "Skipping {} ({} bytes exceeds max_file_size {})",
                path.display(),
                size,
                self.config.max_file_size
            );
            return None;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                return None;
            }
        };

        let is_eml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("eml"));

        let content = if is_eml {
            match parse_eml(&bytes) {
                Some(content) => content,
                None => {
                    warn!("Skipping {}: not a parseable email message", path.display());
                    return None;
                }
            }
        } else {
            match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(_) => {
                    warn!("Skipping {}: not valid UTF-8", path.display());
                    return None;
                }
            }
        };

        Some(InputDocument::new(path.display().to_string(), content))
    }
}

fn is_hidden(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.starts_with('.'))
}

/// Decode an RFC 822 message into its subject line and text body.
///
/// MIME parts, transfer encodings and encoded-word headers are decoded.
/// HTML-only messages fall back to their HTML body.
pub fn parse_eml(raw: &[u8]) -> Option<String> {
    let message = MessageParser::default().parse(raw)?;

    let body = message
        .body_text(0)
        .or_else(|| message.body_html(0))
        .unwrap_or_default();
    let body = body.trim();

    Some(match message.subject() {
        Some(subject) => format!("Subject: {}\n\n{}", subject.trim(), body),
        None => body.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn collector() -> InputCollector {
        InputCollector::new(InputConfig::default())
    }

    #[test]
    fn test_parse_eml_plain() {
        let raw = "From: ana@example.com\r\nTo: team@example.com\r\nSubject: Deadline moved\r\nDate: Mon, 1 Jan 2024 09:00:00 +0000\r\n\r\nHi team,\r\nthe deadline moved to Friday.\r\n";
        let content = parse_eml(raw.as_bytes()).unwrap();
        assert!(content.starts_with("Subject: Deadline moved\n\nHi team,"));
        assert!(content.contains("the deadline moved to Friday."));
        assert!(!content.contains("From:"));
    }

    #[test]
    fn test_parse_eml_multipart_base64() {
        let raw = concat!(
            "From: ana@example.com\r\n",
            "To: team@example.com\r\n",
            "Subject: =?UTF-8?B?RnJpZGF5IGRlYWRsaW5l?=\r\n",
            "MIME-Version: 1.0\r\n",
            "Content-Type: multipart/alternative; boundary=\"XYZ\"\r\n",
            "\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: base64\r\n",
            "\r\n",
            "SGkgdGVhbSwKdGhlIHJlcG9ydCBpcyBkdWUgRnJpZGF5Lgo=\r\n",
            "--XYZ\r\n",
            "Content-Type: text/html; charset=utf-8\r\n",
            "\r\n",
            "<p>Hi team, the report is due Friday.</p>\r\n",
            "--XYZ--\r\n",
        );

        let content = parse_eml(raw.as_bytes()).unwrap();
        assert!(content.starts_with("Subject: Friday deadline\n\n"));
        assert!(content.contains("the report is due Friday."));
        assert!(!content.contains("--XYZ"));
        assert!(!content.contains("Content-Type"));
        assert!(!content.contains("SGkgdGVhbSwKdGhlIHJlcG9ydCBpcyBkdWUgRnJpZGF5Lgo="));
    }

    #[test]
    fn test_parse_eml_quoted_printable() {
        let raw = concat!(
            "Subject: Lunch\r\n",
            "Content-Type: text/plain; charset=utf-8\r\n",
            "Content-Transfer-Encoding: quoted-printable\r\n",
            "\r\n",
            "Meet at the caf=C3=A9 at noon.\r\n",
        );

        let content = parse_eml(raw.as_bytes()).unwrap();
        assert!(content.contains("Meet at the café at noon."));
    }

    #[test]
    fn test_scan_dir_filters_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir(root.join("nested")).unwrap();
        fs::create_dir(root.join(".hidden")).unwrap();
        fs::write(root.join("b.txt"), "second").unwrap();
        fs::write(root.join("a.eml"), "Subject: x\n\nfirst").unwrap();
        fs::write(root.join("nested").join("c.TXT"), "third").unwrap();
        fs::write(root.join(".hidden").join("d.txt"), "hidden").unwrap();
        fs::write(root.join("notes.md"), "ignored").unwrap();

        let files = collector().scan_dir(root);
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(root).unwrap().to_string_lossy().replace('\\', "/"))
            .collect();

        assert_eq!(names, vec!["a.eml", "b.txt", "nested/c.TXT"]);
    }

    #[test]
    fn test_collect_reads_files_and_respects_limits() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("one.txt"), "first mail").unwrap();
        fs::write(root.join("two.txt"), "second mail").unwrap();
        fs::write(root.join("big.txt"), "x".repeat(64)).unwrap();
        fs::write(root.join("binary.txt"), [0xffu8, 0xfe, 0x00]).unwrap();

        let config = InputConfig {
            max_file_size: 32,
            max_files: 10,
            ..InputConfig::default()
        };
        let docs = InputCollector::new(config)
            .collect(&[root.to_path_buf()])
            .unwrap();

        let contents: Vec<_> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["first mail", "second mail"]);
    }

    #[test]
    fn test_collect_max_files() {
        let temp_dir = TempDir::new().unwrap();
        for i in 0..5 {
            fs::write(temp_dir.path().join(format!("{}.txt", i)), "mail").unwrap();
        }
        let config = InputConfig {
            max_files: 2,
            ..InputConfig::default()
        };
        let docs = InputCollector::new(config)
            .collect(&[temp_dir.path().to_path_buf()])
            .unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_explicit_file_ignores_extension_filter() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("message.body");
        fs::write(&path, "hello").unwrap();

        let docs = collector().collect(&[path.clone()]).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].source, path.display().to_string());
    }
}
