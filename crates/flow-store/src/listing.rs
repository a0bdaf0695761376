//! Cross-persona file listing.
//!
//! A listing is a full scan of the application's dump: no index is kept.
//! Visibility, search, ordering and pagination are all applied in memory
//! over one consistent snapshot.

use std::collections::HashMap;

use flow_shared::constants::APP_ID;
use flow_shared::types::{Owner, RecordKey};
use tracing::{debug, warn};

use crate::error::Result;
use crate::models::{FileListing, FileRecord, ListQuery, ListScope};
use crate::store::Store;

impl Store {
    pub async fn list_files(&self, query: &ListQuery) -> Result<FileListing> {
        let dump = match self.engine().dump_app(APP_ID).await {
            Ok(dump) => dump,
            Err(e) if e.is_not_found() => Default::default(),
            Err(e) => return Err(e.into()),
        };

        let needle = query.search.to_lowercase();
        let mut skipped = 0;
        let mut matched = Vec::new();

        for (persona, entries) in dump {
            for (raw, value) in entries {
                let Some(RecordKey::File(_)) = RecordKey::parse(&raw) else {
                    continue;
                };
                let record: FileRecord = match serde_json::from_value(value) {
                    Ok(record) => record,
                    Err(e) => {
                        skipped += 1;
                        warn!(persona = %persona, key = %raw, error = %e, "skipping undecodable file record");
                        continue;
                    }
                };
                if query.scope.can_see(&record) && matches_search(&record, &needle) {
                    matched.push(record);
                }
            }
        }

        // newest first; id keeps equal timestamps in a stable order
        matched.sort_by(|a, b| {
            b.upload_time
                .cmp(&a.upload_time)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = matched.len();
        let start = query.offset.min(total);
        let end = if query.limit > 0 {
            start.saturating_add(query.limit).min(total)
        } else {
            total
        };

        let mut files: Vec<FileRecord> = matched.drain(start..end).collect();
        self.resolve_owner_names(&mut files).await;

        debug!(
            scope = ?query.scope,
            search = %query.search,
            total,
            returned = files.len(),
            skipped,
            "listed files"
        );
        Ok(FileListing {
            files,
            total,
            skipped,
        })
    }

    /// Every file, unpaginated.
    pub async fn all_files(&self) -> Result<Vec<FileRecord>> {
        Ok(self.list_files(&ListQuery::default()).await?.files)
    }

    /// Files visible to `owner_id`: its own plus every public one. An empty
    /// `owner_id` sees every file.
    pub async fn files_for_owner(&self, owner_id: &str) -> Result<Vec<FileRecord>> {
        let query = ListQuery {
            scope: ListScope::for_owner(owner_id),
            ..ListQuery::default()
        };
        Ok(self.list_files(&query).await?.files)
    }

    /// Build a paged query using the configured default page size.
    pub fn paged_query(
        &self,
        search: impl Into<String>,
        scope: ListScope,
        page: i64,
        limit: i64,
    ) -> ListQuery {
        ListQuery::paged(search, scope, page, limit, self.config().default_page_size)
    }

    // one client lookup per distinct owner
    async fn resolve_owner_names(&self, files: &mut [FileRecord]) {
        let mut names: HashMap<Owner, String> = HashMap::new();
        for file in files.iter_mut() {
            let name = match names.get(&file.owner_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.owner_name(&file.owner_id).await;
                    names.insert(file.owner_id.clone(), name.clone());
                    name
                }
            };
            file.owner_name = name;
        }
    }
}

fn matches_search(record: &FileRecord, needle: &str) -> bool {
    needle.is_empty() || record.original_name.to_lowercase().contains(needle)
}
