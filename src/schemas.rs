//! Field-level validation schemas for course and chapter payloads.
//!
//! Each schema deserializes from the camelCase JSON the authoring UI posts and
//! is checked with `validator`. Callers can use them one at a time through
//! [`parse`]. [`ChapterPatch`] runs its fields through the chapter schemas so
//! nothing reaches the store unvalidated.

use serde::{Deserialize, Deserializer, de, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

const TITLE_MIN_LEN: usize = 2;
const TITLE_MAX_LEN: usize = 50;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("{}", describe(.0))]
    Invalid(#[from] ValidationErrors),
}

/// Title with distinct too-short / too-long messages.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TitleSchema {
    #[validate(custom(function = "title_length"))]
    pub title: String,
}

fn title_length(title: &str) -> Result<(), ValidationError> {
    let len = title.chars().count();
    let message = if len < TITLE_MIN_LEN {
        "Title is too short"
    } else if len > TITLE_MAX_LEN {
        "Title is too long"
    } else {
        return Ok(());
    };
    Err(ValidationError::new("length").with_message(message.into()))
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DescriptionSchema {
    #[validate(length(min = 10, message = "description is too short"))]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ThumbnailSchema {
    #[serde(default)]
    #[validate(required(message = "thumbnail is required"))]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategorySchema {
    #[serde(default)]
    #[validate(required(message = "category is required"))]
    pub category: Option<String>,
}

/// Course pricing: free flag plus a price, both mandatory.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IsFreeSchema {
    pub is_free: bool,
    pub price: f64,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContentSchema {
    #[validate(length(min = 50, message = "content is too short"))]
    pub content: String,
}

/// Per-chapter free flag.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChapterFreeSchema {
    pub is_free: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoSchema {
    #[serde(default)]
    #[validate(required(message = "video is required"))]
    pub video_url: Option<String>,
}

/// Deserialize `value` into schema `S` and run its validators.
pub fn parse<S>(value: &Value) -> Result<S, SchemaError>
where
    S: DeserializeOwned + Validate,
{
    let schema = S::deserialize(value)?;
    schema.validate()?;
    Ok(schema)
}

/// Flatten validation errors into one stable, human-readable line.
pub fn describe(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| match &err.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .collect();
    messages.sort();
    messages.join("; ")
}

/// Accept a present key only when it carries a value. Absent keys fall back to
/// `None` through `#[serde(default)]`.
fn non_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    match Option::<T>::deserialize(deserializer)? {
        Some(value) => Ok(Some(value)),
        None => Err(de::Error::custom("fields must not be null")),
    }
}

/// Partial update for a chapter. Every present field overwrites the stored one.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ChapterPatch {
    #[serde(default, deserialize_with = "non_null")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "non_null")]
    pub is_free: Option<bool>,
    #[serde(default, deserialize_with = "non_null")]
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "non_null")]
    pub position: Option<i64>,
    #[serde(default, deserialize_with = "non_null")]
    pub video_url: Option<String>,
}

impl ChapterPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.content.is_none()
            && self.is_free.is_none()
            && self.is_published.is_none()
            && self.position.is_none()
            && self.video_url.is_none()
    }

    /// The video URL that should trigger an asset replace, if any.
    ///
    /// An empty string is stored on the chapter but never sent to the host.
    pub fn video_reference(&self) -> Option<&str> {
        self.video_url.as_deref().filter(|url| !url.is_empty())
    }

    /// Run each present field through its schema, stopping at the first failure.
    pub fn check(&self) -> Result<(), SchemaError> {
        if let Some(title) = &self.title {
            TitleSchema {
                title: title.clone(),
            }
            .validate()?;
        }
        if let Some(description) = &self.description {
            DescriptionSchema {
                description: description.clone(),
            }
            .validate()?;
        }
        if let Some(content) = &self.content {
            ContentSchema {
                content: content.clone(),
            }
            .validate()?;
        }
        if let Some(position) = self.position {
            if position < 0 {
                let mut errors = ValidationErrors::new();
                errors.add(
                    "position",
                    ValidationError::new("range")
                        .with_message("position must not be negative".into()),
                );
                return Err(errors.into());
            }
        }
        if let Some(video_url) = &self.video_url {
            VideoSchema {
                video_url: Some(video_url.clone()),
            }
            .validate()?;
        }
        Ok(())
    }
}
