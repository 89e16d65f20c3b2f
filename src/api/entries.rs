//! Entry operations for Gravity Forms
//!
//! Named CRUD operations over the `entries` endpoints. Identifiers are
//! validated before any request is made.

use log::{debug, info};
use reqwest::Method;
use serde::Deserialize;

use super::client::ApiClient;
use super::constants::{self, PAGE_SIZE, paging};
use super::entry::{Entry, ID_FIELD, deserialize_id};
use super::error::{ApiError, Result};

/// One page of a form's entries
#[derive(Debug, Deserialize)]
struct EntryPage {
    #[serde(default, deserialize_with = "deserialize_id")]
    total_count: Option<u64>,
    #[serde(default)]
    entries: Vec<Entry>,
}

/// Entry service composing the transport and the entry model
#[derive(Debug, Clone)]
pub struct EntryService {
    client: ApiClient,
}

impl EntryService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Get the underlying transport
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Create an entry on `form_id`
    ///
    /// `form_id` is written onto `entry` before submission, and the identifier
    /// assigned by the server is written back once the call succeeds.
    pub async fn create_entry(&self, form_id: u64, entry: &mut Entry) -> Result<()> {
        if form_id == 0 {
            return Err(ApiError::validation("missing form id"));
        }

        entry.meta.form_id = Some(form_id.to_string());

        let mut body = entry.to_flat();
        body.remove(ID_FIELD);
        let body = serde_json::Value::Object(body);

        let created: Entry = self
            .client
            .request_json(Method::POST, &constants::entries_path(), &[], Some(&body))
            .await?;

        if let Some(id) = created.id() {
            entry.set_id(Some(id));
        }

        info!("Created entry {:?} on form {}", entry.id(), form_id);
        Ok(())
    }

    /// Fetch a single entry
    pub async fn get_entry(&self, id: u64) -> Result<Entry> {
        Self::require_id(id)?;

        self.client
            .request_json(Method::GET, &constants::entry_path(id), &[], None)
            .await
    }

    /// Replace an entry's values; the response body is not decoded
    pub async fn update_entry(&self, id: u64, entry: &Entry) -> Result<()> {
        Self::require_id(id)?;

        let body = serde_json::Value::Object(entry.to_flat());
        self.client
            .request(Method::PUT, &constants::entry_path(id), &[], Some(&body))
            .await?;

        Ok(())
    }

    /// Delete an entry
    pub async fn delete_entry(&self, id: u64) -> Result<()> {
        Self::require_id(id)?;

        self.client
            .request(Method::DELETE, &constants::entry_path(id), &[], None)
            .await?;

        Ok(())
    }

    /// List every entry of `form_id` (`0` lists entries across all forms)
    ///
    /// Pages of [`PAGE_SIZE`] are requested until the server-reported total is
    /// reached. The first failing page aborts the listing.
    pub async fn list_entries(&self, form_id: u64) -> Result<Vec<Entry>> {
        let path = constants::form_entries_path(form_id);
        let mut entries = Vec::new();
        let mut current_page: u32 = 1;

        loop {
            let query = [
                (paging::PAGE_SIZE, PAGE_SIZE.to_string()),
                (paging::CURRENT_PAGE, current_page.to_string()),
            ];

            let page: EntryPage = self
                .client
                .request_json(Method::GET, &path, &query, None)
                .await?;

            let fetched = page.entries.len();
            let total = page.total_count.unwrap_or(0);
            entries.extend(page.entries);

            debug!(
                "Fetched page {} of form {}: {} entries ({}/{})",
                current_page,
                form_id,
                fetched,
                entries.len(),
                total
            );

            // An empty page ends the listing even if the total says otherwise
            if fetched == 0 || entries.len() as u64 >= total {
                break;
            }

            current_page += 1;
        }

        if entries.is_empty() {
            return Err(ApiError::NotFound(format!("form {}", form_id)));
        }

        Ok(entries)
    }

    fn require_id(id: u64) -> Result<()> {
        if id == 0 {
            return Err(ApiError::validation("missing entry id"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ClientConfig, ErrorKind};

    fn service() -> EntryService {
        let config = ClientConfig::builder()
            .base_url("http://127.0.0.1:9")
            .credentials("key", "secret")
            .build()
            .unwrap();
        EntryService::new(ApiClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_zero_ids_fail_validation_without_network() {
        let service = service();
        let mut entry = Entry::new();

        let err = service.create_entry(0, &mut entry).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(entry.meta.form_id, None);

        assert_eq!(service.get_entry(0).await.unwrap_err().kind(), ErrorKind::Validation);
        assert_eq!(
            service.update_entry(0, &entry).await.unwrap_err().kind(),
            ErrorKind::Validation
        );
        assert_eq!(service.delete_entry(0).await.unwrap_err().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_entry_page_accepts_string_total() {
        let page: EntryPage = serde_json::from_str(
            r#"{"total_count":"2","entries":[{"id":"1","3":"a"},{"id":2,"3":"b"}]}"#,
        )
        .unwrap();
        assert_eq!(page.total_count, Some(2));
        assert_eq!(page.entries.len(), 2);
        assert_eq!(page.entries[1].id(), Some(2));
        assert_eq!(page.entries[1].get_field("3"), Some("b"));
    }
}
