use email_address::EmailAddress;
use url::Url;

use crate::errors::{ValidationError, ValidationResult};
use crate::models::{EventDraft, HostRequest, MediaUpload, Rating};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Returns `true` if the provided string is a syntactically valid email address.
pub fn is_valid_email(value: &str) -> bool {
    EmailAddress::is_valid(value)
}

/// Returns `true` if the provided string parses as a URL with a scheme.
pub fn is_valid_url(value: &str) -> bool {
    Url::parse(value).is_ok()
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn required(field: &str, message: &str) -> ValidationError {
    ValidationError::single(field, "required", message)
}

pub fn validate_sign_in(email: &str, password: &str) -> ValidationResult<()> {
    if blank(email) || password.is_empty() {
        return Err(required("form", "Please fill all fields"));
    }
    Ok(())
}

pub fn validate_sign_up(display_name: &str, email: &str, password: &str) -> ValidationResult<()> {
    if blank(display_name) || blank(email) || password.is_empty() {
        return Err(required("form", "Please fill all fields"));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::single(
            "password",
            "length",
            format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    if !is_valid_email(email.trim()) {
        return Err(ValidationError::single("email", "format", "Please enter a valid email"));
    }
    Ok(())
}

/// Trimmed comment text plus a checked rating.
pub fn validate_comment(text: &str, rating: Option<u8>) -> ValidationResult<(String, Option<Rating>)> {
    let text = text.trim();
    if text.is_empty() {
        return Err(required("text", "Write something first!"));
    }
    let rating = match rating {
        None => None,
        Some(value) => Some(Rating::new(value).ok_or_else(|| {
            ValidationError::single("rating", "range", "Rating must be between 1 and 5")
        })?),
    };
    Ok((text.to_string(), rating))
}

pub fn validate_host_request(request: &HostRequest) -> ValidationResult<()> {
    if [&request.full_name, &request.org, &request.email, &request.reason]
        .into_iter()
        .any(|value| blank(value))
    {
        return Err(required("form", "Please fill all fields"));
    }
    if !is_valid_email(request.email.trim()) {
        return Err(ValidationError::single("email", "format", "Please enter a valid email"));
    }
    Ok(())
}

/// Checks the create form in field order and reports the first gap.
pub fn validate_event_draft(draft: &EventDraft) -> ValidationResult<()> {
    if blank(&draft.title) {
        return Err(required("title", "Event title is required"));
    }
    if draft.category.is_none() {
        return Err(required("category", "Please select a category"));
    }
    if draft.event_date.is_none() {
        return Err(required("event_date", "Please set the event date"));
    }
    if draft.start_time.is_none() {
        return Err(required("start_time", "Please set the start time"));
    }
    if blank(&draft.venue) {
        return Err(required("venue", "Please set the venue / address"));
    }
    let located = matches!((draft.lat, draft.lng), (Some(lat), Some(lng)) if lat != 0.0 && lng != 0.0);
    if !located {
        return Err(required("location", "Please tap the map to set the exact location"));
    }
    Ok(())
}

pub fn validate_upload(upload: &MediaUpload, max_upload_size_mb: u64) -> ValidationResult<()> {
    let limit = max_upload_size_mb.saturating_mul(1024 * 1024);
    if upload.bytes.len() as u64 > limit {
        return Err(ValidationError::single(
            "media",
            "size",
            format!("{} is larger than {max_upload_size_mb} MB", upload.file_name),
        ));
    }
    Ok(())
}

/// `music, #live,,` -> `["#music", "#live"]`
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| {
            let tag = tag.trim();
            tag.strip_prefix('#').unwrap_or(tag).trim().to_string()
        })
        .filter(|tag| !tag.is_empty())
        .map(|tag| format!("#{tag}"))
        .collect()
}

/// Comma separated interests, trimmed, blanks dropped.
pub fn parse_interests(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
