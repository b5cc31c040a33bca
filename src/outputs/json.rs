//! JSON output for digests.
//!
//! Files are organized by date with edition names:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── morning.json
//!     ├── afternoon.json
//!     └── evening.json
//! ```
//!
//! A second run in the same edition overwrites the earlier file.

use crate::models::Digest;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`Digest`] to `{json_output_dir}/{local_date}/{time_of_day}.json`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_digest(digest: &Digest, json_output_dir: &str) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(digest)?;

    let full_json_dir = PathBuf::from(json_output_dir).join(&digest.local_date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join(format!("{}.json", digest.time_of_day));
    fs::write(&output_json_filename, json).await?;
    info!(
        path = %output_json_filename.display(),
        entries = digest.entries.len(),
        "Wrote digest JSON"
    );

    Ok(output_json_filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_digest_layout() {
        let dir = std::env::temp_dir().join(format!("headline_digest_json_{}", std::process::id()));
        let digest = Digest {
            local_date: "2025-05-06".into(),
            time_of_day: "morning".into(),
            local_time: "07:15:00".into(),
            country: "us".into(),
            category: "general".into(),
            entries: Vec::new(),
        };

        let path = write_digest(&digest, &dir.to_string_lossy()).await.unwrap();
        assert_eq!(path, dir.join("2025-05-06").join("morning.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: Digest = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, digest);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
