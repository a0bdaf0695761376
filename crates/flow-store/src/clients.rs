use flow_shared::constants::{APP_ID, OWNER_NAME_ADMIN, OWNER_NAME_UNKNOWN, SYSTEM_PERSONA};
use flow_shared::identity::{derive_client_id, generate_recovery_code};
use flow_shared::types::{Owner, RecordKey};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::models::ClientRecord;
use crate::store::{decode, now, Store};

impl Store {
    pub async fn get_client(&self, id: &str) -> Result<ClientRecord> {
        self.fetch(SYSTEM_PERSONA, &RecordKey::client(id))
            .await?
            .ok_or_else(|| StoreError::ClientNotFound(id.to_string()))
    }

    /// Create the client, or overwrite name, code and activity of an
    /// existing one while keeping its admin flag.
    pub async fn upsert_client(
        &self,
        id: &str,
        name: &str,
        recovery_code: &str,
        last_active: i64,
    ) -> Result<()> {
        let client = match self.get_client(id).await {
            Ok(mut existing) => {
                existing.name = name.to_string();
                existing.recovery_code = recovery_code.to_string();
                existing.last_active = last_active;
                existing
            }
            Err(e) if e.is_not_found() => ClientRecord {
                id: id.to_string(),
                name: name.to_string(),
                recovery_code: recovery_code.to_string(),
                last_active,
                is_admin: false,
            },
            Err(e) => return Err(e),
        };
        self.put_client(&client).await
    }

    pub async fn update_client_last_active(&self, id: &str, last_active: i64) -> Result<()> {
        let mut client = self.get_client(id).await?;
        client.last_active = last_active;
        self.put_client(&client).await
    }

    pub async fn update_client_admin_status(&self, id: &str, is_admin: bool) -> Result<()> {
        let mut client = self.get_client(id).await?;
        client.is_admin = is_admin;
        self.put_client(&client).await
    }

    pub async fn update_client_full(
        &self,
        id: &str,
        name: &str,
        recovery_code: &str,
        is_admin: bool,
    ) -> Result<()> {
        let mut client = self.get_client(id).await?;
        client.name = name.to_string();
        client.recovery_code = recovery_code.to_string();
        client.is_admin = is_admin;
        self.put_client(&client).await
    }

    /// Succeeds whether or not the client exists.
    pub async fn delete_client(&self, id: &str) -> Result<()> {
        let key = RecordKey::client(id);
        self.engine()
            .delete(SYSTEM_PERSONA, APP_ID, &key.storage_key())
            .await?;
        debug!(id, "deleted client");
        Ok(())
    }

    /// Linear scan over every client; there is no index on recovery codes.
    pub async fn find_client_by_recovery_code(&self, code: &str) -> Result<ClientRecord> {
        self.scan_clients()
            .await?
            .into_iter()
            .find(|c| c.recovery_code == code)
            .ok_or(StoreError::RecoveryCodeNotFound)
    }

    /// All decodable clients, sorted by name (stable).
    pub async fn list_clients(&self) -> Result<Vec<ClientRecord>> {
        let mut clients = self.scan_clients().await?;
        clients.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clients)
    }

    /// Name a client, creating its identity on first use.
    ///
    /// The recovery code of `existing_id` is kept when that client has one;
    /// otherwise a new code is generated. The client id is always derived
    /// from the code, so the returned record may carry a different id than
    /// `existing_id`.
    pub async fn register_client(
        &self,
        name: &str,
        existing_id: Option<&str>,
    ) -> Result<ClientRecord> {
        let namespace = self.config().require_namespace()?;

        let existing_code = match existing_id {
            Some(id) => match self.get_client(id).await {
                Ok(c) if !c.recovery_code.is_empty() => Some(c.recovery_code),
                Ok(_) => None,
                Err(e) if e.is_not_found() => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        let recovery_code = existing_code.unwrap_or_else(generate_recovery_code);
        let id = derive_client_id(&namespace, &recovery_code)?;

        self.upsert_client(&id, name, &recovery_code, now()).await?;
        self.get_client(&id).await
    }

    /// Record activity for `id` at the current time.
    pub async fn touch_client(&self, id: &str) -> Result<()> {
        self.update_client_last_active(id, now()).await
    }

    /// Display name for a file owner. Never fails.
    pub async fn owner_name(&self, owner: &Owner) -> String {
        match owner {
            Owner::System => OWNER_NAME_ADMIN.to_string(),
            Owner::Client(id) => match self.get_client(id).await {
                Ok(client) => client.name,
                Err(_) => OWNER_NAME_UNKNOWN.to_string(),
            },
        }
    }

    async fn put_client(&self, client: &ClientRecord) -> Result<()> {
        let key = RecordKey::client(&client.id);
        let value = serde_json::to_value(client)?;
        self.engine()
            .set(SYSTEM_PERSONA, APP_ID, &key.storage_key(), value)
            .await?;
        debug!(id = %client.id, "saved client");
        Ok(())
    }

    // scan order of the system persona's app store
    async fn scan_clients(&self) -> Result<Vec<ClientRecord>> {
        let entries = match self.engine().get_app_store(SYSTEM_PERSONA, APP_ID).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        Ok(entries
            .into_iter()
            .filter_map(|(raw, value)| match RecordKey::parse(&raw) {
                Some(key @ RecordKey::Client(_)) => decode(&key, value),
                _ => None,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::blobs::FsBlobStore;
    use crate::engine::MemoryEngine;
    use crate::store::fixtures::test_store;

    #[tokio::test]
    async fn test_upsert_creates_non_admin() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "Ann", "ABC123", 10).await.unwrap();

        let client = store.get_client("c1").await.unwrap();
        assert_eq!(client.name, "Ann");
        assert_eq!(client.recovery_code, "ABC123");
        assert_eq!(client.last_active, 10);
        assert!(!client.is_admin);
    }

    #[tokio::test]
    async fn test_upsert_preserves_admin_flag() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "Ann", "ABC123", 10).await.unwrap();
        store.update_client_admin_status("c1", true).await.unwrap();
        store.upsert_client("c1", "Anne", "XYZ789", 20).await.unwrap();

        let client = store.get_client("c1").await.unwrap();
        assert_eq!(client.name, "Anne");
        assert_eq!(client.recovery_code, "XYZ789");
        assert_eq!(client.last_active, 20);
        assert!(client.is_admin);
    }

    #[tokio::test]
    async fn test_updates_require_existing_client() {
        let (store, _dir) = test_store().await;
        assert!(matches!(
            store.update_client_last_active("ghost", 1).await,
            Err(StoreError::ClientNotFound(_))
        ));
        assert!(store.update_client_admin_status("ghost", true).await.is_err());
        assert!(store
            .update_client_full("ghost", "n", "c", false)
            .await
            .is_err());
        assert!(store.get_client("ghost").await.is_err());
    }

    #[tokio::test]
    async fn test_partial_updates() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "Ann", "ABC123", 10).await.unwrap();

        store.update_client_last_active("c1", 99).await.unwrap();
        let client = store.get_client("c1").await.unwrap();
        assert_eq!(client.last_active, 99);
        assert_eq!(client.name, "Ann");

        store
            .update_client_full("c1", "Bob", "NEW000", true)
            .await
            .unwrap();
        let client = store.get_client("c1").await.unwrap();
        assert_eq!(client.name, "Bob");
        assert_eq!(client.recovery_code, "NEW000");
        assert!(client.is_admin);
        assert_eq!(client.last_active, 99);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (store, _dir) = test_store().await;
        store.delete_client("never-existed").await.unwrap();

        store.upsert_client("c1", "Ann", "ABC123", 10).await.unwrap();
        store.delete_client("c1").await.unwrap();
        store.delete_client("c1").await.unwrap();
        assert!(store.get_client("c1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_find_by_recovery_code() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "Ann", "ABC123", 10).await.unwrap();
        store.upsert_client("c2", "Bob", "DEF456", 10).await.unwrap();

        let found = store.find_client_by_recovery_code("DEF456").await.unwrap();
        assert_eq!(found.id, "c2");
        assert!(matches!(
            store.find_client_by_recovery_code("WRONG").await,
            Err(StoreError::RecoveryCodeNotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_with_no_clients() {
        let (store, _dir) = test_store().await;
        assert!(store
            .find_client_by_recovery_code("ABC123")
            .await
            .unwrap_err()
            .is_not_found());
    }

    #[tokio::test]
    async fn test_list_sorted_and_skips_garbage() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "carol", "C", 1).await.unwrap();
        store.upsert_client("c2", "Alice", "A", 1).await.unwrap();
        store.upsert_client("c3", "bob", "B", 1).await.unwrap();
        store
            .engine()
            .set(SYSTEM_PERSONA, APP_ID, "client:broken", json!({"id": 5}))
            .await
            .unwrap();
        // ownerless file in the same namespace is not a client
        store
            .engine()
            .set(SYSTEM_PERSONA, APP_ID, "file:f1", json!({"id": "f1"}))
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_clients()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        // case-sensitive: upper case sorts first
        assert_eq!(names, vec!["Alice", "bob", "carol"]);
    }

    #[tokio::test]
    async fn test_list_equal_names_keep_scan_order() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c2", "Ann", "B", 1).await.unwrap();
        store.upsert_client("c3", "Abe", "C", 1).await.unwrap();
        store.upsert_client("c1", "Ann", "A", 1).await.unwrap();

        let listed: Vec<(String, String)> = store
            .list_clients()
            .await
            .unwrap()
            .into_iter()
            .map(|c| (c.name, c.id))
            .collect();
        // ties follow key order of the system persona, not insertion order
        assert_eq!(
            listed,
            vec![
                ("Abe".to_string(), "c3".to_string()),
                ("Ann".to_string(), "c1".to_string()),
                ("Ann".to_string(), "c2".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_list_empty() {
        let (store, _dir) = test_store().await;
        assert!(store.list_clients().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_owner_name() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "Ann", "ABC123", 10).await.unwrap();

        assert_eq!(store.owner_name(&Owner::System).await, "Admin");
        assert_eq!(store.owner_name(&Owner::client("c1")).await, "Ann");
        assert_eq!(store.owner_name(&Owner::client("gone")).await, "Unknown");
    }

    #[tokio::test]
    async fn test_register_new_and_rename() {
        let (store, _dir) = test_store().await;
        let first = store.register_client("Ann", None).await.unwrap();
        assert_eq!(first.name, "Ann");
        assert!(!first.recovery_code.is_empty());

        let namespace = store.config().require_namespace().unwrap();
        assert_eq!(
            first.id,
            derive_client_id(&namespace, &first.recovery_code).unwrap()
        );

        let renamed = store
            .register_client("Annie", Some(first.id.as_str()))
            .await
            .unwrap();
        assert_eq!(renamed.id, first.id);
        assert_eq!(renamed.recovery_code, first.recovery_code);
        assert_eq!(store.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_without_namespace() {
        let dir = TempDir::new().unwrap();
        let blobs = FsBlobStore::new(dir.path().to_path_buf(), 1024)
            .await
            .unwrap();
        let store = Store::new(Arc::new(MemoryEngine::new()), Arc::new(blobs));
        assert!(matches!(
            store.register_client("Ann", None).await,
            Err(StoreError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_touch() {
        let (store, _dir) = test_store().await;
        store.upsert_client("c1", "Ann", "ABC123", 0).await.unwrap();
        store.touch_client("c1").await.unwrap();
        assert!(store.get_client("c1").await.unwrap().last_active > 0);
        assert!(store.touch_client("ghost").await.is_err());
    }
}
