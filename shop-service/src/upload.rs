use std::path::{Path, PathBuf};

use tracing::info;
use uuid::Uuid;

use crate::error::{Result, ShopError};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Product images on local disk, served back under `/uploads`.
#[derive(Debug, Clone)]
pub struct LocalUploadStore {
    base_dir: PathBuf,
}

impl LocalUploadStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Writes the image under a fresh name and returns its public URL.
    pub async fn save_product_image(&self, product_id: i32, file_name: &str, bytes: &[u8]) -> Result<String> {
        let file_name = image_file_name(file_name)?;
        let relative = format!("products/{}/{}-{}", product_id, Uuid::new_v4().simple(), file_name);
        let full_path = self.base_dir.join(&relative);

        if let Some(dir) = full_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        info!(product_id, path = %full_path.display(), size = bytes.len(), "Stored product image");
        Ok(format!("/uploads/{}", relative))
    }

    pub async fn delete(&self, url: &str) -> Result<()> {
        let relative = url.trim_start_matches("/uploads/");
        tokio::fs::remove_file(self.base_dir.join(relative)).await?;
        Ok(())
    }
}

/// Keeps only the final path component and checks the extension.
fn image_file_name(raw: &str) -> Result<&str> {
    let name = Path::new(raw)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ShopError::validation("file name is required"))?;

    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if !IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        return Err(ShopError::validation(format!("invalid file type: .{}", ext)));
    }
    Ok(name)
}
