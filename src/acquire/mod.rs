//! Raw input acquisition: URL download and ZIP unwrapping.
//!
//! Feed providers routinely serve catalog exports as zipped XML behind
//! plain HTTP endpoints that reject non-browser user agents, hence the
//! browser UA and the generous timeout.

use std::io::{Cursor, Read};
use std::time::Duration;

use crate::error::{AcquireError, AcquireResult};

/// User agent sent on downloads; some feed servers refuse unknown clients.
const USER_AGENT: &str = "Mozilla/5.0";

/// Download timeout; large feeds on slow feed servers take minutes.
const FETCH_TIMEOUT: Duration = Duration::from_secs(180);

/// Download a feed from a URL.
pub async fn fetch_url(url: &str) -> AcquireResult<Vec<u8>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| AcquireError::Http(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AcquireError::Http(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AcquireError::Status(status.as_u16()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| AcquireError::Http(e.to_string()))?;
    Ok(bytes.to_vec())
}

/// Whether the payload looks like a ZIP archive.
pub fn is_zip(bytes: &[u8]) -> bool {
    bytes.starts_with(b"PK")
}

/// Extract the document from a ZIP archive.
///
/// Picks the first entry whose name ends in `.xml` (case-insensitive),
/// falling back to the first entry when none matches.
pub fn unwrap_archive(bytes: &[u8]) -> AcquireResult<Vec<u8>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| AcquireError::Archive(e.to_string()))?;

    if archive.len() == 0 {
        return Err(AcquireError::EmptyArchive);
    }

    let mut names = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| AcquireError::Archive(e.to_string()))?;
        names.push(entry.name().to_string());
    }

    let picked = names
        .iter()
        .find(|n| n.to_lowercase().ends_with(".xml"))
        .unwrap_or(&names[0])
        .clone();

    let mut entry = archive
        .by_name(&picked)
        .map_err(|e| AcquireError::Archive(e.to_string()))?;
    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_zip_sniffing() {
        assert!(is_zip(b"PK\x03\x04rest"));
        assert!(!is_zip(b"<?xml version=\"1.0\"?>"));
        assert!(!is_zip(b""));
    }

    #[test]
    fn test_picks_xml_entry() {
        let bytes = build_zip(&[
            ("readme.txt", b"notes"),
            ("feed.XML", b"<root/>"),
        ]);

        let content = unwrap_archive(&bytes).unwrap();
        assert_eq!(content, b"<root/>");
    }

    #[test]
    fn test_falls_back_to_first_entry() {
        let bytes = build_zip(&[("data.bin", b"payload"), ("other.bin", b"x")]);

        let content = unwrap_archive(&bytes).unwrap();
        assert_eq!(content, b"payload");
    }

    #[test]
    fn test_garbage_is_archive_error() {
        let err = unwrap_archive(b"PK but not really a zip").unwrap_err();
        assert!(matches!(err, AcquireError::Archive(_)));
    }
}
