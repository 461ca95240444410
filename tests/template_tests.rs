//! Template store tests

use async_trait::async_trait;
use custom_export_sdk::catalog::{FieldCatalog, StaticFieldCatalog};
use custom_export_sdk::models::TemplateColumn;
use custom_export_sdk::session::ExportSession;
use custom_export_sdk::storage::{MemoryStorageBackend, StorageBackend, StorageError};
use custom_export_sdk::templates::{DEFAULT_TEMPLATE_KEY, TemplateError, TemplateStore, load_template};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Memory backend whose writes can be switched to fail
#[derive(Default)]
struct FlakyBackend {
    inner: MemoryStorageBackend,
    fail_writes: AtomicBool,
}

#[async_trait(?Send)]
impl StorageBackend for FlakyBackend {
    async fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::IoError("quota exceeded".to_string()));
        }
        self.inner.write(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

async fn open_store() -> TemplateStore<MemoryStorageBackend> {
    TemplateStore::open(MemoryStorageBackend::new(), DEFAULT_TEMPLATE_KEY)
        .await
        .unwrap()
}

mod persistence_tests {
    use super::*;

    #[tokio::test]
    async fn test_saved_template_visible_to_new_store() {
        let backend = Arc::new(MemoryStorageBackend::new());
        let mut store = TemplateStore::open(backend.clone(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        let saved = store
            .save("Payroll", "staff", vec![TemplateColumn::new("salary", "Pay")])
            .await
            .unwrap();

        let reopened = TemplateStore::open(backend, DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        assert_eq!(reopened.get(&saved.id), Some(&saved));
        assert_eq!(reopened.list("staff").len(), 1);
        assert!(reopened.list("billing").is_empty());
    }

    #[tokio::test]
    async fn test_stored_json_uses_camel_case() {
        let mut store = open_store().await;
        store
            .save("Payroll", "staff", vec![TemplateColumn::new("salary", "Pay")])
            .await
            .unwrap();
        let raw = store
            .storage()
            .read(DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap()
            .unwrap();
        assert!(raw.contains("\"entityId\":\"staff\""));
        assert!(raw.contains("\"createdAt\""));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_store_unchanged() {
        let backend = Arc::new(FlakyBackend::default());
        let mut store = TemplateStore::open(backend.clone(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        let kept = store
            .save("Kept", "staff", vec![TemplateColumn::new("email", "Mail")])
            .await
            .unwrap();

        backend.fail_writes.store(true, Ordering::SeqCst);
        let result = store
            .save("Lost", "staff", vec![TemplateColumn::new("email", "Mail")])
            .await;
        assert!(matches!(result, Err(TemplateError::Persistence(_))));
        assert_eq!(store.all(), std::slice::from_ref(&kept));

        let result = store.delete(&kept.id).await;
        assert!(matches!(result, Err(TemplateError::Persistence(_))));
        assert_eq!(store.all().len(), 1);
    }

    #[tokio::test]
    async fn test_last_write_wins_across_stores() {
        let backend = Arc::new(MemoryStorageBackend::new());
        let mut tab_a = TemplateStore::open(backend.clone(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();
        let mut tab_b = TemplateStore::open(backend.clone(), DEFAULT_TEMPLATE_KEY)
            .await
            .unwrap();

        tab_a
            .save("From A", "staff", vec![TemplateColumn::new("email", "Mail")])
            .await
            .unwrap();
        // B re-reads before writing, so A's template survives
        tab_b
            .save("From B", "staff", vec![TemplateColumn::new("email", "Mail")])
            .await
            .unwrap();

        let names: Vec<&str> = tab_b.all().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["From B", "From A"]);

        tab_a.refresh().await.unwrap();
        assert_eq!(tab_a.all().len(), 2);
    }
}

mod load_tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_reconstructs_all_fields() {
        let catalog = StaticFieldCatalog::builtin();
        let mut session = ExportSession::new(&catalog);
        for id in ["employee_id", "hire_date", "salary"] {
            session.select_field("staff", id, true).unwrap();
        }
        session.rename_field("staff", "salary", "Pay").unwrap();

        let mut store = open_store().await;
        let saved = session.save_template(&mut store, "Payroll").await.unwrap();
        assert_eq!(saved.len(), 1);

        let loaded = load_template(&saved[0], &catalog);
        assert_eq!(loaded, session.selected_fields());
    }

    #[tokio::test]
    async fn test_dangling_field_dropped_on_load() {
        let mut catalog = StaticFieldCatalog::builtin();
        let mut store = open_store().await;
        let template = store
            .save(
                "Basic Staff",
                "staff",
                vec![
                    TemplateColumn::new("first_name", "First"),
                    TemplateColumn::new("email", "Mail"),
                ],
            )
            .await
            .unwrap();

        catalog.remove_field("staff", "email");
        let loaded = load_template(&template, &catalog);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].field.id, "first_name");
        assert_eq!(loaded[0].display_name, "First");
    }

    #[tokio::test]
    async fn test_apply_template_replaces_entity_selection() {
        let catalog = StaticFieldCatalog::builtin();
        let mut store = open_store().await;
        let template = store
            .save(
                "Names",
                "staff",
                vec![
                    TemplateColumn::new("last_name", "Surname"),
                    TemplateColumn::new("first_name", "first_name"),
                ],
            )
            .await
            .unwrap();

        let mut session = ExportSession::new(&catalog);
        session.select_field("staff", "salary", true).unwrap();
        session.select_field("billing", "amount", true).unwrap();
        session.apply_template_by_id(&store, &template.id).unwrap();

        let columns: Vec<(String, String)> = session
            .selected_fields()
            .into_iter()
            .map(|s| (s.field.id, s.display_name))
            .collect();
        assert_eq!(
            columns,
            vec![
                ("last_name".to_string(), "Surname".to_string()),
                ("first_name".to_string(), "first_name".to_string()),
                ("amount".to_string(), "amount".to_string()),
            ]
        );
        assert_eq!(session.selection().custom_name("staff", "first_name"), None);
    }

    #[tokio::test]
    async fn test_multi_entity_session_saves_one_template_per_entity() {
        let catalog = StaticFieldCatalog::builtin();
        let mut session = ExportSession::new(&catalog);
        session.select_field("staff", "email", true).unwrap();
        session.select_field("billing", "invoice_id", true).unwrap();

        let mut store = open_store().await;
        let saved = session.save_template(&mut store, "Mixed").await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(store.list("staff").len(), 1);
        assert_eq!(store.list("billing").len(), 1);
        assert_eq!(
            store.list("billing")[0].columns,
            vec![TemplateColumn::new("invoice_id", "invoice_id")]
        );
        assert!(catalog.field("billing", "invoice_id").is_some());
    }

    #[tokio::test]
    async fn test_empty_session_cannot_save() {
        let catalog = StaticFieldCatalog::builtin();
        let session = ExportSession::new(&catalog);
        let mut store = open_store().await;
        assert!(session.save_template(&mut store, "Nothing").await.is_err());
        assert!(store.all().is_empty());
    }
}
