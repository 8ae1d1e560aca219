//! Multipart form parsing and upload validation for `/predict`

use axum::body::Bytes;
use axum::extract::Multipart;

use super::error::{Result, ServerError};

/// Filename suffixes accepted for classification (compared lowercase)
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// A file part from the upload form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub bytes: Bytes,
}

/// Fields of the prediction form; every field is optional until validated
#[derive(Debug, Default)]
pub struct PredictForm {
    pub username: Option<String>,
    pub password: Option<String>,
    pub image: Option<UploadedFile>,
}

impl PredictForm {
    /// Drain the multipart stream, keeping the fields the gate cares about.
    ///
    /// An `image` part only counts as a file when it carries a filename
    /// attribute; a plain text part with that name is ignored.
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "username" => form.username = Some(field.text().await?),
                "password" => form.password = Some(field.text().await?),
                "image" => {
                    if let Some(filename) = field.file_name().map(str::to_string) {
                        let bytes = field.bytes().await?;
                        form.image = Some(UploadedFile { filename, bytes });
                    }
                }
                _ => {}
            }
        }

        Ok(form)
    }

    /// Username and password, empty when absent
    pub fn credentials(&self) -> (String, String) {
        (
            self.username.clone().unwrap_or_default(),
            self.password.clone().unwrap_or_default(),
        )
    }

    /// Take the uploaded image after checking presence, filename and type
    pub fn into_image(self) -> Result<UploadedFile> {
        let file = self.image.ok_or(ServerError::MissingFile)?;
        validate_filename(&file.filename)?;
        Ok(file)
    }
}

/// Reject empty filenames and anything outside [`ALLOWED_EXTENSIONS`].
///
/// Only the name is inspected; the decoder checks the content later.
pub fn validate_filename(filename: &str) -> Result<()> {
    if filename.is_empty() {
        return Err(ServerError::EmptyFilename);
    }

    let allowed = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()));

    if allowed {
        Ok(())
    } else {
        Err(ServerError::UnsupportedFileType)
    }
}
