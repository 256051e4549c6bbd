use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use super::{validate_key, BlobStore};

/// Blobs as files under a directory; writes go through a temp file + rename.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
        }
    }

    async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create {}", parent.display()))?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, &data)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("rename into {}", path.display()))?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file://{}", self.dir.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn absent_file_is_none_then_roundtrips() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(tmp.path().join("state"));
        assert!(store.get("last_update.json").await.unwrap().is_none());

        store
            .put("last_update.json", br#"{"updates":[]}"#.to_vec())
            .await
            .unwrap();
        let got = store.get("last_update.json").await.unwrap().unwrap();
        assert_eq!(got, br#"{"updates":[]}"#.to_vec());
        assert!(!tmp.path().join("state/last_update.tmp").exists());
    }

    #[tokio::test]
    async fn escaping_keys_are_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(tmp.path());
        assert!(store.put("../outside.json", vec![]).await.is_err());
    }
}
