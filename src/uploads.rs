use std::collections::BTreeMap;

use anyhow::Context;
use axum::extract::Multipart;
use bytes::Bytes;
use uuid::Uuid;

use crate::error::ValidationErrors;
use crate::storage::StorageClient;

/// 2048 kilobytes, the upload cap for profile pictures and post images.
pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;

pub struct UploadedImage {
    pub body: Bytes,
    pub content_type: String,
}

/// A fully-read multipart form: text fields plus uploaded files, keyed by
/// field name. Later occurrences of a name overwrite earlier ones.
#[derive(Default)]
pub struct FormData {
    texts: BTreeMap<String, String>,
    files: BTreeMap<String, UploadedImage>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> anyhow::Result<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .context("read multipart field")?
        {
            let Some(name) = field.name().map(|s| s.to_string()) else {
                continue;
            };
            if field.file_name().is_some() {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field
                    .bytes()
                    .await
                    .with_context(|| format!("read file field {}", name))?;
                form.files.insert(name, UploadedImage { body, content_type });
            } else {
                let text = field
                    .text()
                    .await
                    .with_context(|| format!("read text field {}", name))?;
                form.texts.insert(name, text);
            }
        }
        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(|s| s.as_str())
    }

    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts.remove(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedImage> {
        self.files.remove(name)
    }
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Checks type and size, reporting under the given field name.
pub fn validate_image(field: &str, image: &UploadedImage, errors: &mut ValidationErrors) {
    let label = field.replace('_', " ");
    if ext_from_mime(&image.content_type).is_none() {
        errors.add(
            field,
            format!("The {} must be a file of type: jpeg, png, jpg.", label),
        );
    }
    if image.body.len() > MAX_IMAGE_BYTES {
        errors.add(
            field,
            format!("The {} must not be greater than 2048 kilobytes.", label),
        );
    }
}

/// Uploads a validated image under `<prefix>/<uuid>.<ext>` and returns the
/// storage key.
pub async fn store_image(
    storage: &dyn StorageClient,
    prefix: &str,
    image: &UploadedImage,
) -> anyhow::Result<String> {
    let ext = ext_from_mime(&image.content_type).unwrap_or("bin");
    let key = format!("{}/{}.{}", prefix, Uuid::new_v4(), ext);
    storage
        .put_object(&key, image.body.clone(), &image.content_type)
        .await
        .with_context(|| format!("put_object {}", key))?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn image(content_type: &str, len: usize) -> UploadedImage {
        UploadedImage {
            body: Bytes::from(vec![0u8; len]),
            content_type: content_type.to_string(),
        }
    }

    #[test]
    fn ext_from_mime_accepts_only_spec_types() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), None);
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn validate_image_rejects_wrong_type_and_oversize() {
        let mut errors = ValidationErrors::new();
        validate_image("profile_picture", &image("image/gif", 10), &mut errors);
        validate_image("image", &image("image/png", MAX_IMAGE_BYTES + 1), &mut errors);

        let fields: Vec<_> = errors.fields().collect();
        assert_eq!(fields, vec!["image", "profile_picture"]);
    }

    #[test]
    fn validate_image_accepts_small_jpeg() {
        let mut errors = ValidationErrors::new();
        validate_image("image", &image("image/jpeg", 1024), &mut errors);
        assert!(errors.is_empty());
    }

    #[tokio::test]
    async fn store_image_builds_prefixed_key() {
        let state = AppState::fake();
        let key = store_image(state.storage.as_ref(), "profiles", &image("image/png", 16))
            .await
            .unwrap();
        assert!(key.starts_with("profiles/"));
        assert!(key.ends_with(".png"));

        let url = state.storage.public_url(&key);
        assert!(url.contains(&key));
    }
}
