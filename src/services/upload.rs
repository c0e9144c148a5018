use crate::error::{AppError, AppResult};
use anyhow::Context;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub const MAX_AVATAR_SIZE: usize = 5 * 1024 * 1024;
const AVATAR_SUBDIR: &str = "avatars";

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub upload_dir: PathBuf,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            upload_dir: std::env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| "./uploads".to_string())
                .into(),
        }
    }
}

/// Accepted image formats: content type, file extension and a check of the
/// leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/jpeg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    fn matches(self, data: &[u8]) -> bool {
        match self {
            Self::Jpeg => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Png => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
            Self::Gif => data.starts_with(b"GIF8"),
            Self::Webp => data.len() >= 12 && data.starts_with(b"RIFF") && &data[8..12] == b"WEBP",
        }
    }
}

pub struct UploadService;

impl UploadService {
    /// Store an avatar image and return its public URL
    /// (`/uploads/avatars/<uuid>.<ext>`).
    pub async fn save_avatar(
        config: &UploadConfig,
        data: &[u8],
        content_type: &str,
    ) -> AppResult<String> {
        if data.len() > MAX_AVATAR_SIZE {
            return Err(AppError::PayloadTooLarge);
        }

        let kind = ImageKind::from_content_type(content_type).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported file type: {content_type}. Allowed: jpeg, png, gif, webp"
            ))
        })?;

        if !kind.matches(data) {
            return Err(AppError::validation(
                "File content does not match declared content type",
            ));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), kind.extension());
        let dir = Path::new(&config.upload_dir).join(AVATAR_SUBDIR);

        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create upload directory {}", dir.display()))?;
        fs::write(dir.join(&filename), data)
            .await
            .context("Failed to write avatar")?;

        Ok(format!("/uploads/{AVATAR_SUBDIR}/{filename}"))
    }
}
