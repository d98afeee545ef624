//! Remote drive wire types.

use serde::{Deserialize, Serialize};

/// Folder MIME type on google-style drives.
pub const FOLDER_MIME: &str = "application/vnd.google-apps.folder";

/// Document MIME types the pipeline accepts from remote drives.
const SUPPORTED_TYPES: &[&str] = &[
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/msword",
    "text/plain",
    "application/vnd.google-apps.document",
    "application/vnd.google-apps.presentation",
    "application/vnd.google-apps.spreadsheet",
];

/// A file descriptor returned by a remote drive listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Provider modification timestamp, RFC 3339.
    pub modified_time: String,
    pub web_view_link: String,
    /// Which configured drive this file belongs to.
    pub drive_name: String,
}

impl RemoteFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME
    }

    /// Whether this is a document type the pipeline can process.
    pub fn is_supported_document(&self) -> bool {
        SUPPORTED_TYPES.contains(&self.mime_type.as_str())
    }

    /// Export target for google-native formats that cannot be downloaded
    /// directly: docs and slides export as PDF, spreadsheets as xlsx.
    pub fn export_mime_type(&self) -> Option<&'static str> {
        match self.mime_type.as_str() {
            "application/vnd.google-apps.document"
            | "application/vnd.google-apps.presentation" => Some("application/pdf"),
            "application/vnd.google-apps.spreadsheet" => {
                Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
            }
            _ => None,
        }
    }

    /// File extension for the locally stored copy, accounting for exports.
    pub fn local_extension(&self) -> &'static str {
        match self.export_mime_type().unwrap_or(self.mime_type.as_str()) {
            "application/pdf" => "pdf",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
            "application/msword" => "doc",
            "text/plain" => "txt",
            _ => "bin",
        }
    }
}

/// One page of a folder listing.
#[derive(Debug, Clone, Default)]
pub struct FilePage {
    pub files: Vec<RemoteFile>,
    pub next_page_token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(mime: &str) -> RemoteFile {
        RemoteFile {
            id: "id".into(),
            name: "name".into(),
            mime_type: mime.into(),
            size: 0,
            modified_time: "2022-05-01T12:00:00Z".into(),
            web_view_link: String::new(),
            drive_name: "personal".into(),
        }
    }

    #[test]
    fn folders_are_not_supported_documents() {
        let folder = file(FOLDER_MIME);
        assert!(folder.is_folder());
        assert!(!folder.is_supported_document());
    }

    #[test]
    fn google_docs_export_as_pdf() {
        let doc = file("application/vnd.google-apps.document");
        assert!(doc.is_supported_document());
        assert_eq!(doc.export_mime_type(), Some("application/pdf"));
        assert_eq!(doc.local_extension(), "pdf");
    }

    #[test]
    fn spreadsheets_export_as_xlsx() {
        let sheet = file("application/vnd.google-apps.spreadsheet");
        assert_eq!(sheet.local_extension(), "xlsx");
    }

    #[test]
    fn native_pdf_needs_no_export() {
        let pdf = file("application/pdf");
        assert_eq!(pdf.export_mime_type(), None);
        assert_eq!(pdf.local_extension(), "pdf");
    }

    #[test]
    fn images_are_unsupported() {
        assert!(!file("image/png").is_supported_document());
    }
}
