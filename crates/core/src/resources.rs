//! Resource typing, time-estimate formulas, and normalizer input rules.
//!
//! A resource is a single learning item (video, pdf, article, link) shared
//! across every plan that references its URL. Each type carries a
//! type-specific time estimate; [`duration_minutes`] is the one place that
//! knows the formulas, so the progress aggregator and the API layer cannot
//! drift apart.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Resource types
// ---------------------------------------------------------------------------

/// Known resource types, as stored in `resources.resource_type` and accepted
/// on the wire.
pub mod resource_types {
    /// A single YouTube video; duration fetched from the provider.
    pub const YOUTUBE_VIDEO: &str = "youtube-video";
    /// Input-only: expands into one `youtube-video` resource per entry.
    /// Never stored.
    pub const YOUTUBE_PLAYLIST: &str = "youtube-playlist";
    pub const PDF: &str = "pdf";
    pub const ARTICLE: &str = "article";
    pub const GOOGLE_DRIVE: &str = "google-drive";
    pub const CUSTOM_LINK: &str = "custom-link";
}

/// Types that may appear on a stored resource row.
pub const STORED_RESOURCE_TYPES: &[&str] = &[
    resource_types::YOUTUBE_VIDEO,
    resource_types::PDF,
    resource_types::ARTICLE,
    resource_types::GOOGLE_DRIVE,
    resource_types::CUSTOM_LINK,
];

/// Types accepted by the normalizer endpoint (stored types plus the
/// playlist expansion form).
pub const INPUT_RESOURCE_TYPES: &[&str] = &[
    resource_types::YOUTUBE_VIDEO,
    resource_types::YOUTUBE_PLAYLIST,
    resource_types::PDF,
    resource_types::ARTICLE,
    resource_types::GOOGLE_DRIVE,
    resource_types::CUSTOM_LINK,
];

/// Returns `true` if the given type may be stored on a resource row.
pub fn is_stored_type(resource_type: &str) -> bool {
    STORED_RESOURCE_TYPES.contains(&resource_type)
}

/// Returns `true` if the given type is accepted by the normalizer.
pub fn is_input_type(resource_type: &str) -> bool {
    INPUT_RESOURCE_TYPES.contains(&resource_type)
}

// ---------------------------------------------------------------------------
// Time-estimate metadata
// ---------------------------------------------------------------------------

/// Default reading speed for PDFs when the caller does not supply one.
pub const DEFAULT_MINS_PER_PAGE: i64 = 3;

/// Type-specific time-estimate payload stored in `resources.metadata`.
///
/// Which fields are populated depends on `resource_type`; unrelated fields
/// stay `None` and are omitted from the serialized form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceMetadata {
    /// Video length in minutes (`youtube-video`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_mins: Option<i64>,
    /// Page count (`pdf`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pages: Option<i64>,
    /// Reading speed in minutes per page (`pdf`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mins_per_page: Option<i64>,
    /// Caller-supplied estimate (`article`, `google-drive`, `custom-link`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_mins: Option<i64>,
    /// Thumbnail image URL (`youtube-video`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

/// Time estimate in minutes for a resource of the given type.
///
/// - `youtube-video` -> `duration_mins`
/// - `pdf` -> `pages * mins_per_page` (default speed when unset)
/// - `article` / `google-drive` / `custom-link` -> `estimated_mins`
/// - anything else -> 0
///
/// Missing fields contribute 0 rather than erroring: time totals are
/// advisory display values and must never fail a read.
pub fn duration_minutes(resource_type: &str, metadata: &ResourceMetadata) -> i64 {
    match resource_type {
        resource_types::YOUTUBE_VIDEO => metadata.duration_mins.unwrap_or(0),
        resource_types::PDF => {
            let pages = metadata.pages.unwrap_or(0);
            let per_page = metadata.mins_per_page.unwrap_or(DEFAULT_MINS_PER_PAGE);
            pages * per_page
        }
        resource_types::ARTICLE | resource_types::GOOGLE_DRIVE | resource_types::CUSTOM_LINK => {
            metadata.estimated_mins.unwrap_or(0)
        }
        _ => 0,
    }
}

// ---------------------------------------------------------------------------
// Normalizer input
// ---------------------------------------------------------------------------

/// Request body for `POST /resources`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub url: String,
    pub title: Option<String>,
    pub pages: Option<i64>,
    pub mins_per_page: Option<i64>,
    pub estimated_mins: Option<i64>,
}

/// Validate a normalizer request and, for the non-YouTube types, produce
/// the canonical `(title, metadata)` pair to store.
///
/// YouTube inputs pass validation here but get their title and metadata
/// from the provider fetch; callers must not use the returned pair for
/// them.
pub fn normalize_static(input: &NewResource) -> Result<(String, ResourceMetadata), CoreError> {
    if !is_input_type(&input.resource_type) {
        return Err(CoreError::Validation(format!(
            "Unsupported resource type '{}'. Must be one of: {}",
            input.resource_type,
            INPUT_RESOURCE_TYPES.join(", ")
        )));
    }
    if input.url.trim().is_empty() {
        return Err(CoreError::Validation("url must not be empty".into()));
    }

    match input.resource_type.as_str() {
        resource_types::PDF => {
            let title = required_title(input)?;
            let pages = input
                .pages
                .filter(|p| *p > 0)
                .ok_or_else(|| CoreError::Validation("pdf requires a positive page count".into()))?;
            let mins_per_page = match input.mins_per_page {
                Some(m) if m <= 0 => {
                    return Err(CoreError::Validation(
                        "mins_per_page must be positive".into(),
                    ))
                }
                Some(m) => m,
                None => DEFAULT_MINS_PER_PAGE,
            };
            Ok((
                title,
                ResourceMetadata {
                    pages: Some(pages),
                    mins_per_page: Some(mins_per_page),
                    ..Default::default()
                },
            ))
        }
        resource_types::ARTICLE => {
            let title = required_title(input)?;
            let estimated_mins = input.estimated_mins.filter(|m| *m > 0).ok_or_else(|| {
                CoreError::Validation("article requires a positive estimated_mins".into())
            })?;
            Ok((
                title,
                ResourceMetadata {
                    estimated_mins: Some(estimated_mins),
                    ..Default::default()
                },
            ))
        }
        resource_types::GOOGLE_DRIVE | resource_types::CUSTOM_LINK => {
            // Title falls back to the URL; the estimate is optional and
            // contributes 0 to time totals when absent.
            if let Some(m) = input.estimated_mins {
                if m <= 0 {
                    return Err(CoreError::Validation(
                        "estimated_mins must be positive".into(),
                    ));
                }
            }
            let title = input
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(input.url.trim())
                .to_string();
            Ok((
                title,
                ResourceMetadata {
                    estimated_mins: input.estimated_mins,
                    ..Default::default()
                },
            ))
        }
        // youtube-video / youtube-playlist: metadata comes from the provider.
        _ => Ok((String::new(), ResourceMetadata::default())),
    }
}

fn required_title(input: &NewResource) -> Result<String, CoreError> {
    input
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            CoreError::Validation(format!("{} requires a title", input.resource_type))
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn input(resource_type: &str) -> NewResource {
        NewResource {
            resource_type: resource_type.to_string(),
            url: "https://example.com/item".to_string(),
            title: None,
            pages: None,
            mins_per_page: None,
            estimated_mins: None,
        }
    }

    // -- type validation --

    #[test]
    fn stored_types_exclude_playlist() {
        assert!(is_stored_type("youtube-video"));
        assert!(!is_stored_type("youtube-playlist"));
    }

    #[test]
    fn input_types_include_playlist() {
        assert!(is_input_type("youtube-playlist"));
        assert!(is_input_type("custom-link"));
        assert!(!is_input_type("vimeo"));
        assert!(!is_input_type(""));
    }

    #[test]
    fn unknown_type_rejected() {
        let mut req = input("vimeo");
        req.title = Some("A talk".into());
        assert!(matches!(
            normalize_static(&req),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn empty_url_rejected() {
        let mut req = input("custom-link");
        req.url = "  ".into();
        assert!(normalize_static(&req).is_err());
    }

    // -- duration formulas --

    #[test]
    fn video_duration_from_metadata() {
        let meta = ResourceMetadata {
            duration_mins: Some(42),
            ..Default::default()
        };
        assert_eq!(duration_minutes("youtube-video", &meta), 42);
    }

    #[test]
    fn pdf_duration_is_pages_times_speed() {
        let meta = ResourceMetadata {
            pages: Some(100),
            mins_per_page: Some(2),
            ..Default::default()
        };
        assert_eq!(duration_minutes("pdf", &meta), 200);
    }

    #[test]
    fn pdf_duration_uses_default_speed() {
        let meta = ResourceMetadata {
            pages: Some(10),
            ..Default::default()
        };
        assert_eq!(duration_minutes("pdf", &meta), 10 * DEFAULT_MINS_PER_PAGE);
    }

    #[test]
    fn estimate_types_use_estimated_mins() {
        let meta = ResourceMetadata {
            estimated_mins: Some(15),
            ..Default::default()
        };
        assert_eq!(duration_minutes("article", &meta), 15);
        assert_eq!(duration_minutes("google-drive", &meta), 15);
        assert_eq!(duration_minutes("custom-link", &meta), 15);
    }

    #[test]
    fn missing_estimate_contributes_zero() {
        let meta = ResourceMetadata::default();
        assert_eq!(duration_minutes("google-drive", &meta), 0);
        assert_eq!(duration_minutes("youtube-video", &meta), 0);
    }

    #[test]
    fn unrecognized_type_contributes_zero() {
        let meta = ResourceMetadata {
            estimated_mins: Some(30),
            ..Default::default()
        };
        assert_eq!(duration_minutes("podcast", &meta), 0);
    }

    // -- pdf validation --

    #[test]
    fn pdf_requires_title_and_pages() {
        let mut req = input("pdf");
        assert!(normalize_static(&req).is_err());

        req.title = Some("Lecture notes".into());
        assert!(normalize_static(&req).is_err());

        req.pages = Some(100);
        let (title, meta) = normalize_static(&req).unwrap();
        assert_eq!(title, "Lecture notes");
        assert_eq!(meta.pages, Some(100));
        assert_eq!(meta.mins_per_page, Some(DEFAULT_MINS_PER_PAGE));
    }

    #[test]
    fn pdf_rejects_nonpositive_pages() {
        let mut req = input("pdf");
        req.title = Some("Notes".into());
        req.pages = Some(0);
        assert!(normalize_static(&req).is_err());
    }

    #[test]
    fn pdf_keeps_explicit_speed() {
        let mut req = input("pdf");
        req.title = Some("Notes".into());
        req.pages = Some(100);
        req.mins_per_page = Some(2);
        let (_, meta) = normalize_static(&req).unwrap();
        assert_eq!(duration_minutes("pdf", &meta), 200);
    }

    // -- article validation --

    #[test]
    fn article_requires_title_and_estimate() {
        let mut req = input("article");
        req.title = Some("Reading".into());
        assert!(normalize_static(&req).is_err());

        req.estimated_mins = Some(15);
        let (_, meta) = normalize_static(&req).unwrap();
        assert_eq!(meta.estimated_mins, Some(15));
    }

    // -- link defaults --

    #[test]
    fn link_title_defaults_to_url() {
        let req = input("custom-link");
        let (title, meta) = normalize_static(&req).unwrap();
        assert_eq!(title, "https://example.com/item");
        assert_eq!(meta.estimated_mins, None);
    }

    #[test]
    fn link_keeps_explicit_title() {
        let mut req = input("google-drive");
        req.title = Some("Shared folder".into());
        req.estimated_mins = Some(5);
        let (title, meta) = normalize_static(&req).unwrap();
        assert_eq!(title, "Shared folder");
        assert_eq!(meta.estimated_mins, Some(5));
    }

    #[test]
    fn link_rejects_nonpositive_estimate() {
        let mut req = input("custom-link");
        req.estimated_mins = Some(-1);
        assert!(normalize_static(&req).is_err());
    }

    // -- metadata serialization --

    #[test]
    fn metadata_omits_absent_fields() {
        let meta = ResourceMetadata {
            duration_mins: Some(12),
            ..Default::default()
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json, serde_json::json!({ "duration_mins": 12 }));
    }
}
