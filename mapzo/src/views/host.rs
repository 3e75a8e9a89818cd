use std::sync::Mutex;

use crate::errors::{AppError, AppResult, ValidationError};
use crate::gateway::Gateway;
use crate::id::generate_event_id;
use crate::keys::is_video_file;
use crate::models::{Event, EventDraft, HostRequest, Identity, MediaUpload, NewEvent};
use crate::validators::{parse_tags, validate_event_draft, validate_host_request, validate_upload};

use super::{ViewContext, lock};

/// What the Host button opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostMode {
    /// Not a verified host yet: the verification request form.
    Verify,
    Create,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostModel {
    pub mode: Option<HostMode>,
    pub request_sent: bool,
    pub publishing: bool,
}

#[derive(Debug, Default)]
pub struct HostView {
    model: Mutex<HostModel>,
}

impl HostView {
    pub fn model(&self) -> HostModel {
        lock(&self.model).clone()
    }

    pub(crate) fn reset(&self) {
        *lock(&self.model) = HostModel::default();
    }

    pub fn open(&self, is_host: bool) -> HostMode {
        let mode = if is_host { HostMode::Create } else { HostMode::Verify };
        lock(&self.model).mode = Some(mode);
        mode
    }

    pub fn close(&self) {
        lock(&self.model).mode = None;
    }

    pub async fn submit_request<G: Gateway>(
        &self,
        cx: ViewContext<'_, G>,
        identity: &Identity,
        request: &HostRequest,
    ) -> AppResult<()> {
        validate_host_request(request)?;
        let request = HostRequest {
            full_name: request.full_name.trim().to_string(),
            org: request.org.trim().to_string(),
            email: request.email.trim().to_string(),
            reason: request.reason.trim().to_string(),
        };
        cx.gateway.submit_host_request(&identity.uid, &request).await?;
        lock(&self.model).request_sent = true;
        log::info!("host request stored for {}", identity.uid);
        Ok(())
    }

    /// Validates the draft, uploads its media and creates the event.
    ///
    /// The created event is prepended to the events cache; pins and toasts
    /// are left to the caller.
    pub async fn publish<G: Gateway>(
        &self,
        cx: ViewContext<'_, G>,
        identity: &Identity,
        draft: EventDraft,
    ) -> AppResult<Event> {
        validate_event_draft(&draft)?;
        let (Some(category), Some(event_date), Some(start_time), Some(lat), Some(lng)) =
            (draft.category.clone(), draft.event_date, draft.start_time, draft.lat, draft.lng)
        else {
            return Err(ValidationError::single("form", "required", "Please fill all fields").into());
        };
        let max_mb = cx.config.app.max_upload_size_mb;
        for upload in &draft.media {
            validate_upload(upload, max_mb)?;
        }

        let venue = draft.venue.trim().to_string();
        let new_event = NewEvent {
            title: draft.title.trim().to_string(),
            category,
            event_date,
            start_time,
            end_time: draft.end_time,
            venue_name: venue.clone(),
            address: venue,
            lat,
            lng,
            price: draft.price.trim().to_string(),
            description: draft.description.trim().to_string(),
            tags: parse_tags(&draft.tags),
            image_urls: Vec::new(),
            video_urls: Vec::new(),
        };

        {
            let mut model = lock(&self.model);
            if model.publishing {
                return Err(AppError::InvalidRequest {
                    message: "Already publishing".to_string(),
                });
            }
            model.publishing = true;
        }
        let result = upload_and_create(cx, identity, new_event, &draft.media).await;
        lock(&self.model).publishing = false;

        let event = result?;
        cx.store.update(|state| state.prepend_event(event.clone()));
        Ok(event)
    }
}

/// Videos (`.mp4`, `.mov`) and images go to separate url lists.
async fn upload_and_create<G: Gateway>(
    cx: ViewContext<'_, G>,
    identity: &Identity,
    mut new_event: NewEvent,
    media: &[MediaUpload],
) -> AppResult<Event> {
    let media_key = generate_event_id();
    for upload in media {
        let url = cx
            .gateway
            .upload_event_media(&media_key, upload)
            .await
            .map_err(|err| AppError::Upload {
                message: err.to_string(),
            })?;
        if is_video_file(&upload.file_name) {
            new_event.video_urls.push(url);
        } else {
            new_event.image_urls.push(url);
        }
    }
    cx.gateway.create_event(identity, new_event).await
}
