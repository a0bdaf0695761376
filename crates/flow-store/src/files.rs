use flow_shared::constants::APP_ID;
use flow_shared::types::{resolve_persona, Owner, RecordKey};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::models::FileRecord;
use crate::store::{now, Store};

impl Store {
    /// Write a file record into its owner's persona. Overwrites silently.
    ///
    /// No existence check is made: saving a known id with a different owner
    /// leaves a copy in the old persona. Use `update_file` to reassign.
    pub async fn save_file(&self, record: &FileRecord) -> Result<()> {
        let persona = resolve_persona(&record.owner_id);
        let key = RecordKey::file(&record.id);
        self.engine()
            .set(persona, APP_ID, &key.storage_key(), record.to_stored_value()?)
            .await?;
        debug!(id = %record.id, persona, name = %record.original_name, "saved file");
        Ok(())
    }

    /// Look a file up by id alone, with `owner_name` resolved.
    pub async fn get_file(&self, id: &str) -> Result<FileRecord> {
        let (mut record, _) = self.locate_file(id).await?;
        record.owner_name = self.owner_name(&record.owner_id).await;
        Ok(record)
    }

    /// Rename, reassign and/or change the visibility of a file.
    ///
    /// A new owner moves the record to the new owner's persona before the
    /// content is replaced. Both steps go through the engine's
    /// `move_and_set`. The source persona is the one currently holding the
    /// key, so an update retried after a half-applied move still converges.
    pub async fn update_file(
        &self,
        id: &str,
        original_name: &str,
        owner: Owner,
        is_public: bool,
    ) -> Result<()> {
        let (mut record, old_persona) = self.locate_file(id).await?;

        record.original_name = original_name.to_string();
        record.owner_id = owner;
        record.is_public = is_public;

        let new_persona = resolve_persona(&record.owner_id);
        let key = RecordKey::file(id).storage_key();
        let value = record.to_stored_value()?;

        if old_persona != new_persona {
            debug!(id, from = %old_persona, to = new_persona, "moving file");
            self.engine()
                .move_and_set(&old_persona, new_persona, APP_ID, &key, value)
                .await?;
        } else {
            self.engine().set(new_persona, APP_ID, &key, value).await?;
        }
        Ok(())
    }

    /// Remove a file's content and its record.
    ///
    /// Fails if the record does not exist. A failure to remove the content
    /// is logged and does not stop the record from being deleted.
    pub async fn delete_file(&self, id: &str) -> Result<()> {
        let (record, persona) = self.locate_file(id).await?;

        if let Err(e) = self.blobs().delete(&record.stored_path).await {
            warn!(id, path = %record.stored_path, error = %e, "failed to delete file content");
        }

        self.engine()
            .delete(&persona, APP_ID, &RecordKey::file(id).storage_key())
            .await?;
        debug!(id, persona = %persona, "deleted file");
        Ok(())
    }

    /// Store uploaded bytes and register them as a new file.
    pub async fn upload_file(
        &self,
        data: &[u8],
        original_name: &str,
        owner: Owner,
        is_public: bool,
    ) -> Result<FileRecord> {
        let id = Uuid::new_v4().to_string();
        let (stored_path, size) = self.blobs().store(data, &id).await?;

        let mut record = FileRecord {
            id,
            original_name: original_name.to_string(),
            stored_path,
            size,
            upload_time: now(),
            owner_id: owner,
            owner_name: String::new(),
            download_link: Uuid::new_v4().to_string(),
            is_public,
        };

        if let Err(e) = self.save_file(&record).await {
            if let Err(cleanup) = self.blobs().delete(&record.stored_path).await {
                warn!(id = %record.id, error = %cleanup, "failed to remove orphaned upload");
            }
            return Err(e);
        }

        record.owner_name = self.owner_name(&record.owner_id).await;
        Ok(record)
    }

    /// Find a file by id, falling back to its download link.
    pub async fn resolve_download(&self, reference: &str) -> Result<FileRecord> {
        match self.get_file(reference).await {
            Ok(record) => return Ok(record),
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        self.all_files()
            .await?
            .into_iter()
            .find(|r| r.download_link == reference)
            .ok_or_else(|| StoreError::DownloadNotFound(reference.to_string()))
    }

    pub async fn read_file_content(&self, record: &FileRecord) -> Result<Vec<u8>> {
        self.blobs().read(&record.stored_path).await
    }

    // global lookup for the holding persona, then a direct fetch from it
    async fn locate_file(&self, id: &str) -> Result<(FileRecord, String)> {
        let key = RecordKey::file(id);
        let persona = match self.engine().get_global(APP_ID, &key.storage_key()).await {
            Ok((_, persona)) => persona,
            Err(e) if e.is_not_found() => return Err(StoreError::FileNotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };

        let record = self
            .fetch(&persona, &key)
            .await?
            .ok_or_else(|| StoreError::FileNotFound(id.to_string()))?;
        Ok((record, persona))
    }
}
