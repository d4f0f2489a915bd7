// src/services/relay.rs
use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use tracing::Instrument;
use uuid::Uuid;

use crate::error::AppError;
use crate::message::{Attachment, ChatReply, ChatRequest};
use crate::services::provider::{GenerativeProvider, Part};

/// Prompt sent with an image when the user typed nothing.
pub const DEFAULT_IMAGE_PROMPT: &str = "What do you see in the image?";

/// Media type assumed for a file part that declares none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModelVariant {
    Text,
    Vision,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Text => "text",
            ModelVariant::Vision => "vision",
        }
    }
}

/// Provider model identifiers for each variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Models {
    pub text: String,
    pub vision: String,
}

impl Models {
    pub fn for_variant(&self, variant: ModelVariant) -> &str {
        match variant {
            ModelVariant::Text => &self.text,
            ModelVariant::Vision => &self.vision,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationPlan {
    pub variant: ModelVariant,
    pub parts: Vec<Part>,
}

/// Decide which model to call and with what parts.
pub fn plan(request: ChatRequest) -> Result<GenerationPlan, AppError> {
    let ChatRequest { message, attachment } = request;

    match attachment {
        Some(file) => {
            let prompt = if message.is_empty() {
                DEFAULT_IMAGE_PROMPT.to_string()
            } else {
                message
            };
            Ok(GenerationPlan {
                variant: ModelVariant::Vision,
                parts: vec![Part::Text(prompt), inline_part(&file)],
            })
        }
        None if !message.is_empty() => Ok(GenerationPlan {
            variant: ModelVariant::Text,
            parts: vec![Part::Text(message)],
        }),
        None => Err(AppError::missing_input()),
    }
}

fn inline_part(file: &Attachment) -> Part {
    Part::InlineData {
        mime_type: file.mime_type.clone(),
        data: STANDARD.encode(&file.data),
    }
}

/// Run one request through the provider.
pub async fn relay(
    provider: &dyn GenerativeProvider,
    models: &Models,
    request: ChatRequest,
) -> Result<ChatReply, AppError> {
    let span = tracing::info_span!(
        "relay",
        request_id = %Uuid::new_v4(),
        variant = tracing::field::Empty,
    );

    async move {
        tracing::debug!(
            message_len = request.message.len(),
            attachment_bytes = request.attachment.as_ref().map(|a| a.data.len()),
            attachment_type = request.attachment.as_ref().map(|a| a.mime_type.as_str()),
            "chat request received"
        );

        let plan = plan(request)?;
        tracing::Span::current().record("variant", plan.variant.as_str());

        let model = models.for_variant(plan.variant);
        let reply = provider.generate(model, &plan.parts).await?;

        tracing::info!(model, reply_len = reply.len(), "chat reply generated");
        Ok::<_, AppError>(ChatReply { reply })
    }
    .instrument(span)
    .await
}

/// Drain a multipart form into a [`ChatRequest`].
///
/// The first `message` and the first non-empty `file` win; other fields are ignored.
/// A zero-byte `file` part counts as no file at all, so such a request takes the
/// text path, or gets the missing-input 400 when `message` is empty too.
pub async fn read_form(mut multipart: Multipart) -> Result<ChatRequest, AppError> {
    let mut message: Option<String> = None;
    let mut attachment: Option<Attachment> = None;

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "message" if message.is_none() => {
                message = Some(field.text().await.map_err(upload_error)?);
            }
            "file" if attachment.is_none() => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let mime_type = field.content_type().unwrap_or(DEFAULT_MIME_TYPE).to_string();
                let data = field.bytes().await.map_err(upload_error)?;

                // Browsers send an empty part when no file was chosen.
                if !data.is_empty() {
                    attachment = Some(Attachment { file_name, mime_type, data });
                }
            }
            _ => {}
        }
    }

    Ok(ChatRequest {
        message: message.unwrap_or_default(),
        attachment,
    })
}

fn upload_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Internal(anyhow::anyhow!("failed to read multipart form: {}", err.body_text()))
    }
}
