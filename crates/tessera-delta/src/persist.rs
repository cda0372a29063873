//! Saving and loading documents as delta JSON

use std::path::Path;

use tessera_core::Document;
use tokio::fs;
use tracing::debug;

use crate::delta::{from_delta, to_delta, Delta};
use crate::error::Result;

/// Write `doc` to `path` as pretty-printed delta JSON
pub async fn save_document(doc: &Document, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let json = to_delta(doc)?.to_json_pretty()?;
    fs::write(path, json).await?;
    debug!("Saved document to {}", path.display());
    Ok(())
}

/// Read a document previously written by [`save_document`]
pub async fn load_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let json = fs::read_to_string(path).await?;
    let delta = Delta::from_json(&json)?;
    debug!("Loaded {} ops from {}", delta.ops.len(), path.display());
    from_delta(&delta)
}
