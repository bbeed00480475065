use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::drawings::dtos::{
    CreateDrawingDto, DrawingForm, DrawingResponseDto, UploadedFile,
};
use crate::features::drawings::models::{Drawing, DrawingPatch, NewDrawing};
use crate::features::drawings::repositories::DrawingRepository;
use crate::modules::storage::{object_key, FileStore};

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Drawing with id {} not found", id))
}

/// Service for drawing operations
///
/// The only writer of drawing records. Each operation issues one repository
/// call; file payloads go to the file store first so a row never points at a
/// missing object.
pub struct DrawingService {
    repository: Arc<dyn DrawingRepository>,
    file_store: Arc<dyn FileStore>,
}

impl DrawingService {
    pub fn new(repository: Arc<dyn DrawingRepository>, file_store: Arc<dyn FileStore>) -> Self {
        Self {
            repository,
            file_store,
        }
    }

    fn to_dto(&self, drawing: Drawing) -> DrawingResponseDto {
        DrawingResponseDto::from_model(drawing, self.file_store.as_ref())
    }

    /// List all drawings, most recent first
    pub async fn list(&self) -> Result<Vec<DrawingResponseDto>> {
        let drawings = self.repository.list().await?;
        Ok(drawings.into_iter().map(|d| self.to_dto(d)).collect())
    }

    /// Get drawing by ID
    pub async fn get_by_id(&self, id: Uuid) -> Result<DrawingResponseDto> {
        let drawing = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        Ok(self.to_dto(drawing))
    }

    /// Store the file, then insert the record
    pub async fn create(&self, dto: CreateDrawingDto) -> Result<DrawingResponseDto> {
        let id = Uuid::now_v7();
        let file_key = self.store_file(id, dto.file).await?;

        let inserted = self
            .repository
            .insert(NewDrawing {
                id,
                title: dto.title,
                file: file_key.clone(),
            })
            .await;

        let drawing = match inserted {
            Ok(drawing) => drawing,
            Err(e) => {
                self.discard_file(&file_key).await;
                return Err(e);
            }
        };

        info!(
            "Drawing created: id={}, title={}, file={}",
            drawing.id, drawing, drawing.file
        );

        Ok(self.to_dto(drawing))
    }

    /// Apply the fields present in `form`; `id` and `created` never change
    ///
    /// A full update (`partial == false`) requires every field. Unknown ids
    /// fail with `NotFound` before the payload is validated or stored.
    pub async fn update(
        &self,
        id: Uuid,
        form: DrawingForm,
        partial: bool,
    ) -> Result<DrawingResponseDto> {
        let current = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        let dto = form.into_update(partial)?;

        let new_key = match dto.file {
            Some(file) => Some(self.store_file(Uuid::now_v7(), file).await?),
            None => None,
        };

        let patch = DrawingPatch {
            title: dto.title,
            file: new_key.clone(),
        };

        let updated = match self.repository.update(id, patch).await {
            Ok(Some(drawing)) => drawing,
            Ok(None) => {
                // Deleted between the lookup and the update
                if let Some(key) = &new_key {
                    self.discard_file(key).await;
                }
                return Err(not_found(id));
            }
            Err(e) => {
                if let Some(key) = &new_key {
                    self.discard_file(key).await;
                }
                return Err(e);
            }
        };

        if new_key.is_some() && current.file != updated.file {
            self.discard_file(&current.file).await;
        }

        info!("Drawing updated: id={}, title={}", updated.id, updated);

        Ok(self.to_dto(updated))
    }

    /// Delete the record, then its file
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let removed = self
            .repository
            .delete(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        self.discard_file(&removed.file).await;

        info!("Drawing deleted: id={}, file={}", removed.id, removed.file);

        Ok(())
    }

    async fn store_file(&self, id: Uuid, file: UploadedFile) -> Result<String> {
        let key = object_key(id, &file.file_name);
        let size = file.data.len();

        self.file_store
            .put(&key, file.data, &file.content_type)
            .await?;

        debug!(
            "Drawing file stored: key={}, content_type={}, size={}",
            key, file.content_type, size
        );
        Ok(key)
    }

    /// Remove an object no record references anymore
    ///
    /// The record change already committed, so a failure here leaves an
    /// orphaned object behind rather than failing the request.
    async fn discard_file(&self, key: &str) {
        if let Err(e) = self.file_store.remove(key).await {
            warn!("Failed to remove orphaned drawing file '{}': {}", key, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{png_upload, InMemoryDrawingRepository, InMemoryFileStore};
    use chrono::Utc;
    use fake::faker::lorem::en::Sentence;
    use fake::Fake;

    struct Fixture {
        service: DrawingService,
        repository: Arc<InMemoryDrawingRepository>,
        store: Arc<InMemoryFileStore>,
    }

    fn fixture() -> Fixture {
        let repository = Arc::new(InMemoryDrawingRepository::new());
        let store = Arc::new(InMemoryFileStore::new());
        let service = DrawingService::new(repository.clone(), store.clone());
        Fixture {
            service,
            repository,
            store,
        }
    }

    fn create_dto(title: &str) -> CreateDrawingDto {
        DrawingForm {
            title: Some(title.to_string()),
            file: Some(png_upload()),
        }
        .into_create()
        .unwrap()
    }

    fn key_of(url: &str) -> &str {
        let start = url.find("drawings/").unwrap();
        &url[start..]
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let f = fixture();
        let title: String = Sentence(1..4).fake();
        let title = title.chars().take(100).collect::<String>();

        let created = f.service.create(create_dto(&title)).await.unwrap();
        let fetched = f.service.get_by_id(created.id).await.unwrap();

        assert_eq!(fetched.title, title.trim());
        assert_eq!(fetched.file, created.file);
        assert!(fetched.file.contains("/drawings/"));
        assert!(fetched.created <= Utc::now());
        assert!(f.store.contains(key_of(&fetched.file)));
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let f = fixture();
        for title in ["first", "second", "third"] {
            f.service.create(create_dto(title)).await.unwrap();
        }

        let drawings = f.service.list().await.unwrap();
        let titles: Vec<&str> = drawings.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
        assert!(drawings.windows(2).all(|w| w[0].created >= w[1].created));
    }

    #[tokio::test]
    async fn test_get_unknown_id_is_not_found() {
        let f = fixture();
        let err = f.service.get_by_id(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_partial_update_changes_only_title() {
        let f = fixture();
        let created = f.service.create(create_dto("Draft")).await.unwrap();

        let updated = f
            .service
            .update(
                created.id,
                DrawingForm {
                    title: Some("Final".to_string()),
                    file: None,
                },
                true,
            )
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created, created.created);
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.file, created.file);
    }

    #[tokio::test]
    async fn test_file_update_replaces_object() {
        let f = fixture();
        let created = f.service.create(create_dto("Draft")).await.unwrap();
        let old_key = key_of(&created.file).to_string();

        let updated = f
            .service
            .update(
                created.id,
                DrawingForm {
                    title: None,
                    file: Some(png_upload()),
                },
                true,
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Draft");
        assert_eq!(updated.created, created.created);
        assert_ne!(updated.file, created.file);
        assert!(f.store.contains(key_of(&updated.file)));
        assert!(!f.store.contains(&old_key));
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_update_unknown_id_uploads_nothing() {
        let f = fixture();
        let err = f
            .service
            .update(
                Uuid::now_v7(),
                DrawingForm {
                    title: Some("Ghost".to_string()),
                    file: Some(png_upload()),
                },
                false,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(f.store.len(), 0);
        assert_eq!(f.repository.len(), 0);
    }

    #[tokio::test]
    async fn test_update_unknown_id_wins_over_invalid_payload() {
        let f = fixture();
        let err = f
            .service
            .update(Uuid::now_v7(), DrawingForm::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_update_changes_nothing() {
        let f = fixture();
        let created = f.service.create(create_dto("Draft")).await.unwrap();

        let err = f
            .service
            .update(
                created.id,
                DrawingForm {
                    title: Some("x".repeat(101)),
                    file: Some(png_upload()),
                },
                true,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.store.len(), 1);
        let fetched = f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.title, "Draft");
        assert_eq!(fetched.file, created.file);
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let f = fixture();
        let created = f.service.create(create_dto("Doomed")).await.unwrap();

        f.service.delete(created.id).await.unwrap();

        let err = f.service.get_by_id(created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(f.store.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_leaves_others() {
        let f = fixture();
        f.service.create(create_dto("Keeper")).await.unwrap();

        let err = f.service.delete(Uuid::now_v7()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(f.repository.len(), 1);
        assert_eq!(f.store.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_upload_persists_nothing() {
        let f = fixture();
        f.store.fail_writes();

        let err = f.service.create(create_dto("Lost")).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(f.repository.len(), 0);
    }

    #[tokio::test]
    async fn test_failed_insert_discards_uploaded_file() {
        let f = fixture();
        f.repository.fail_writes();

        let err = f.service.create(create_dto("Lost")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(f.store.len(), 0);
    }

    #[tokio::test]
    async fn test_delete_succeeds_when_file_removal_fails() {
        let f = fixture();
        let created = f.service.create(create_dto("Stubborn")).await.unwrap();
        f.store.fail_removes();

        f.service.delete(created.id).await.unwrap();

        assert_eq!(f.repository.len(), 0);
        assert!(f.store.contains(key_of(&created.file)));
        let err = f.service.get_by_id(created.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_file_update_succeeds_when_old_file_removal_fails() {
        let f = fixture();
        let created = f.service.create(create_dto("Draft")).await.unwrap();
        f.store.fail_removes();

        let updated = f
            .service
            .update(
                created.id,
                DrawingForm {
                    title: Some("Redrawn".to_string()),
                    file: Some(png_upload()),
                },
                false,
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Redrawn");
        assert_ne!(updated.file, created.file);
        assert!(f.store.contains(key_of(&updated.file)));
        assert!(f.store.contains(key_of(&created.file)));

        let fetched = f.service.get_by_id(created.id).await.unwrap();
        assert_eq!(fetched.file, updated.file);
    }
}
