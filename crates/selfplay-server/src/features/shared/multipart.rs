//! Multipart form collection for the upload endpoints
//!
//! Workers post small text fields next to one binary `file` part. The whole
//! form is read into memory before validation so handlers see typed values.

use axum::extract::Multipart;
use selfplay_common::protocol::fields;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum MultipartError {
    #[error("Malformed multipart body: {0}")]
    Malformed(String),

    #[error("Missing form field '{0}'")]
    Missing(&'static str),

    #[error("Form field '{field}' has invalid value '{value}'")]
    Invalid { field: &'static str, value: String },
}

/// All text fields of a multipart body plus the optional file part
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    file: Option<Vec<u8>>,
}

impl MultipartForm {
    /// Drain `multipart`, keeping text fields by name and the `file` part as bytes
    pub async fn read(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = MultipartForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| MultipartError::Malformed(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == fields::FILE {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| MultipartError::Malformed(e.to_string()))?;
                form.file = Some(data.to_vec());
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| MultipartError::Malformed(e.to_string()))?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// Optional text field, empty values treated as absent
    pub fn text(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn required<T: FromStr>(&self, name: &'static str) -> Result<T, MultipartError> {
        self.optional(name)?.ok_or(MultipartError::Missing(name))
    }

    pub fn optional<T: FromStr>(&self, name: &'static str) -> Result<Option<T>, MultipartError> {
        match self.text(name) {
            None => Ok(None),
            Some(value) => value
                .parse()
                .map(Some)
                .map_err(|_| MultipartError::Invalid { field: name, value }),
        }
    }

    pub fn take_file(&mut self) -> Option<Vec<u8>> {
        self.file.take()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(fields: &[(&str, &str)], file: Option<Vec<u8>>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            file,
        }
    }
}
