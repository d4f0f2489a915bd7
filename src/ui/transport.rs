use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use crate::message::{Attachment, ChatReply};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server answered {0}")]
    Status(u16),

    #[error("unreadable reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// How the controller reaches the relay.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn submit(
        &self,
        message: &str,
        attachment: Option<&Attachment>,
    ) -> Result<String, TransportError>;
}

/// Posts the form to `<server>/api/chat`.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(server: &str) -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().build()?,
            endpoint: format!("{}/api/chat", server.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn submit(
        &self,
        message: &str,
        attachment: Option<&Attachment>,
    ) -> Result<String, TransportError> {
        let mut form = Form::new().text("message", message.to_string());
        if let Some(file) = attachment {
            let part = Part::bytes(file.data.to_vec())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)?;
            form = form.part("file", part);
        }

        let response = self.client.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let body: ChatReply = serde_json::from_slice(&bytes)?;
        Ok(body.reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_is_built_from_server_url() {
        let transport = HttpTransport::new("http://localhost:3000/").unwrap();
        assert_eq!(transport.endpoint(), "http://localhost:3000/api/chat");
    }
}
