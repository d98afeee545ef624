//! Remote drive enumeration.

use chrono::{DateTime, Utc};

use crate::drive::{DriveClient, DriveError, DriveSourceConfig};
use crate::models::CandidateDocument;

/// Enumerate every supported document under a drive's configured root.
///
/// Listing is breadth-first: each folder is paged through completely, with
/// subfolders queued for their own listing. Only files whose MIME type the
/// pipeline can process become candidates. Any transport error aborts this
/// drive and surfaces to the caller, which decides whether other sources
/// keep going.
pub async fn enumerate_drive(
    client: &dyn DriveClient,
    source: &DriveSourceConfig,
) -> Result<Vec<CandidateDocument>, DriveError> {
    let mut candidates = Vec::new();
    let mut folders: Vec<Option<String>> = vec![source.root_folder_id.clone()];

    while let Some(folder_id) = folders.pop() {
        let mut page_token: Option<String> = None;
        loop {
            let page = client
                .list_page(folder_id.as_deref(), page_token.as_deref())
                .await?;

            for file in page.files {
                if file.is_folder() {
                    folders.push(Some(file.id));
                } else if file.is_supported_document() {
                    let modified = parse_rfc3339(&file.modified_time);
                    candidates.push(CandidateDocument::remote(
                        source.name.clone(),
                        file.id,
                        file.name,
                        file.size,
                        modified,
                        file.mime_type,
                    ));
                } else {
                    tracing::debug!(
                        "skipping unsupported remote file '{}' ({})",
                        file.name,
                        file.mime_type
                    );
                }
            }

            page_token = page.next_page_token;
            if page_token.is_none() {
                break;
            }
        }
    }

    tracing::info!(
        "drive '{}' yielded {} candidate(s)",
        source.name,
        candidates.len()
    );
    Ok(candidates)
}

fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
