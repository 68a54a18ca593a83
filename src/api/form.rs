use axum::extract::{FromRequest, Multipart, Request};
use std::collections::HashMap;

use crate::{Error, upload::Upload};

/// A fully read `multipart/form-data` body.
///
/// Field names are matched case-insensitively, so `UserName` and `username`
/// are the same field. File parts with no name or no content are dropped.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, Upload>,
}

impl MultipartForm {
    /// Remove and return a text field.
    pub fn take(&mut self, name: &str) -> Option<String> {
        self.fields.remove(&name.to_ascii_lowercase())
    }

    /// A text field, or an empty string when absent.
    pub fn text(&mut self, name: &str) -> String {
        self.take(name).unwrap_or_default()
    }

    pub fn file(&mut self, name: &str) -> Option<Upload> {
        self.files.remove(&name.to_ascii_lowercase())
    }
}

impl<S> FromRequest<S> for MultipartForm
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(%rejection, "not a multipart body");
            Error::invalid("Expected a multipart form")
        })?;

        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
            let name = field.name().unwrap_or_default().to_ascii_lowercase();
            match field.file_name().map(str::to_owned) {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(bad_form)?;
                    if !file_name.is_empty() && !bytes.is_empty() {
                        form.files.insert(name, Upload { file_name, bytes });
                    }
                }
                None => {
                    let value = field.text().await.map_err(bad_form)?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }
}

fn bad_form(err: axum::extract::multipart::MultipartError) -> Error {
    tracing::debug!(error = %err, "malformed multipart body");
    Error::invalid(format!("Failed to parse form: {}", err.body_text()))
}
