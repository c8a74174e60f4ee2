//! The fixed document shell for the legacy word-processor import path.
//!
//! The shell is structural, not cosmetic: the BOM prefix is how the target
//! word processor detects UTF-8, the Office XML namespaces and `Section1`
//! wrapper are what its HTML import path keys on, and the `@page` rule pins
//! A4 geometry with standard margins. Changing any of it breaks import in
//! ways that only show up inside the word processor.

use crate::error::ConvertError;
use std::path::Path;

/// MIME type of the exported document.
pub const DOC_MIME_TYPE: &str = "application/msword";

/// UTF-8 byte-order mark; must be the first bytes of the output.
const BOM: &str = "\u{FEFF}";

/// The finalized document: bytes, target name, and MIME type.
///
/// Handed to exactly one delivery path (file download or native share) and
/// then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportableDocument {
    /// Finalized document bytes, BOM included.
    pub bytes: Vec<u8>,
    /// Target file name, `{base}.doc`.
    pub file_name: String,
    /// Always [`DOC_MIME_TYPE`].
    pub mime_type: String,
}

/// Wrap a document body in the Word-compatible shell.
pub(crate) fn wrap(body: &str, base_name: &str) -> ExportableDocument {
    let title = escape_text(base_name);
    let html = format!(
        r#"{bom}<html xmlns:o='urn:schemas-microsoft-com:office:office'
      xmlns:w='urn:schemas-microsoft-com:office:word'
      xmlns='http://www.w3.org/TR/REC-html40'
      dir="rtl">
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  @page {{ size: 21cm 29.7cm; margin: 2.54cm; mso-page-orientation: portrait; }}
  body {{ font-family: 'Times New Roman', Arial, sans-serif; font-size: 12pt; }}
  table {{ border-collapse: collapse; width: 100%; mso-border-alt: solid windowtext .5pt; }}
  td, th {{ border: 1px solid #000; padding: 5pt; }}
</style>
</head>
<body>
<div class="Section1">{body}</div>
</body>
</html>
"#,
        bom = BOM,
        title = title,
        body = body,
    );

    ExportableDocument {
        bytes: html.into_bytes(),
        file_name: format!("{base_name}.doc"),
        mime_type: DOC_MIME_TYPE.to_string(),
    }
}

/// Write the document to disk atomically (temp file + rename).
pub async fn write_to_file(
    doc: &ExportableDocument,
    path: impl AsRef<Path>,
) -> Result<(), ConvertError> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                ConvertError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            })?;
        }
    }

    let tmp_path = path.with_extension("doc.tmp");
    tokio::fs::write(&tmp_path, &doc.bytes)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ConvertError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_comes_first() {
        let doc = wrap("<p>x</p>", "exam");
        assert_eq!(&doc.bytes[..3], &[0xEF, 0xBB, 0xBF]);
    }

    #[test]
    fn shell_structure() {
        let doc = wrap("<p>question 1</p>", "exam");
        let html = String::from_utf8(doc.bytes).unwrap();

        assert!(html.contains(r#"<div class="Section1"><p>question 1</p></div>"#));
        assert!(html.contains("@page { size: 21cm 29.7cm; margin: 2.54cm;"));
        assert!(html.contains("urn:schemas-microsoft-com:office:word"));
        assert!(html.contains(r#"dir="rtl""#));
        assert!(html.contains("<title>exam</title>"));
    }

    #[test]
    fn naming_and_mime() {
        let doc = wrap("", "physics final");
        assert_eq!(doc.file_name, "physics final.doc");
        assert_eq!(doc.mime_type, "application/msword");
    }

    #[test]
    fn title_is_escaped() {
        let doc = wrap("", "a<b&c");
        let html = String::from_utf8(doc.bytes).unwrap();
        assert!(html.contains("<title>a&lt;b&amp;c</title>"));
    }

    #[tokio::test]
    async fn write_is_atomic_and_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("exam.doc");
        let doc = wrap("<p>x</p>", "exam");

        write_to_file(&doc, &path).await.unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes, doc.bytes);
        assert!(!path.with_extension("doc.tmp").exists());
    }
}
