//! In-memory stand-ins for the persistence and file store boundaries,
//! plus request fixtures shared by drawing tests.

#![cfg(test)]

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::drawings::dtos::UploadedFile;
use crate::features::drawings::models::{Drawing, DrawingPatch, NewDrawing};
use crate::features::drawings::repositories::DrawingRepository;
use crate::features::drawings::{routes, DrawingService};
use crate::modules::storage::FileStore;

/// Smallest valid PNG: 1x1 transparent pixel
pub const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
    0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9c, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
];

pub fn png_upload() -> UploadedFile {
    UploadedFile {
        file_name: "drawing.png".to_string(),
        content_type: "image/png".to_string(),
        data: PNG_BYTES.to_vec(),
    }
}

/// Vec-backed drawing repository with strictly increasing `created`
#[derive(Default)]
pub struct InMemoryDrawingRepository {
    rows: Mutex<Vec<Drawing>>,
    fail_writes: AtomicBool,
}

impl InMemoryDrawingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Make every subsequent insert/update/delete fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal("repository unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DrawingRepository for InMemoryDrawingRepository {
    async fn list(&self) -> Result<Vec<Drawing>> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.sort_by(|a, b| b.created.cmp(&a.created).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Drawing>> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().find(|d| d.id == id).cloned())
    }

    async fn insert(&self, drawing: NewDrawing) -> Result<Drawing> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();

        let now = Utc::now();
        let created = match rows.iter().map(|d| d.created).max() {
            Some(latest) if latest >= now => latest + Duration::microseconds(1),
            _ => now,
        };

        let row = Drawing {
            id: drawing.id,
            title: drawing.title,
            file: drawing.file,
            created,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, patch: DrawingPatch) -> Result<Option<Drawing>> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();

        let Some(row) = rows.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        if let Some(title) = patch.title {
            row.title = title;
        }
        if let Some(file) = patch.file {
            row.file = file;
        }
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Drawing>> {
        self.check_writable()?;
        let mut rows = self.rows.lock().unwrap();

        let position = rows.iter().position(|d| d.id == id);
        Ok(position.map(|index| rows.remove(index)))
    }
}

/// HashMap-backed file store serving URLs from a fake host
#[derive(Default)]
pub struct InMemoryFileStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
}

impl InMemoryFileStore {
    pub const BASE_URL: &'static str = "http://files.test/canvas-media";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    /// Make every subsequent `put` fail
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Make every subsequent `remove` fail, leaving the object in place
    pub fn fail_removes(&self) {
        self.fail_removes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn put(&self, key: &str, data: Vec<u8>, _content_type: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("cannot write '{}'", key)));
        }
        self.objects.lock().unwrap().insert(key.to_string(), data);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_removes.load(Ordering::SeqCst) {
            return Err(AppError::Storage(format!("cannot remove '{}'", key)));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", Self::BASE_URL, key)
    }
}

/// Drawing routes over fresh in-memory stores
pub struct TestApp {
    pub server: TestServer,
    pub repository: Arc<InMemoryDrawingRepository>,
    pub store: Arc<InMemoryFileStore>,
}

pub fn test_app() -> TestApp {
    test_app_with_body_limit(1024 * 1024)
}

pub fn test_app_with_body_limit(max_body_size: usize) -> TestApp {
    let repository = Arc::new(InMemoryDrawingRepository::new());
    let store = Arc::new(InMemoryFileStore::new());
    let service = Arc::new(DrawingService::new(repository.clone(), store.clone()));

    let server = TestServer::new(routes(service, max_body_size)).unwrap();

    TestApp {
        server,
        repository,
        store,
    }
}
