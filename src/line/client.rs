// HTTP client for the messaging API's reply and push endpoints.

use futures::future::BoxFuture;
use serde::Serialize;

use super::MessageSink;
use crate::error::TransportError;
use crate::responder::OutboundMessage;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplyRequest<'a> {
    reply_token: &'a str,
    messages: &'a [OutboundMessage],
}

#[derive(Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    messages: &'a [OutboundMessage],
}

/// Sends messages through the messaging API using a channel access token.
#[derive(Debug, Clone)]
pub struct LineClient {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
}

impl LineClient {
    pub fn new(api_base: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<(), TransportError> {
        let response = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.access_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

impl MessageSink for LineClient {
    fn reply<'a>(
        &'a self,
        reply_token: &'a str,
        messages: &'a [OutboundMessage],
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            let body = ReplyRequest {
                reply_token,
                messages,
            };
            self.post("/v2/bot/message/reply", &body).await
        })
    }

    fn push<'a>(
        &'a self,
        to: &'a str,
        messages: &'a [OutboundMessage],
    ) -> BoxFuture<'a, Result<(), TransportError>> {
        Box::pin(async move {
            let body = PushRequest { to, messages };
            self.post("/v2/bot/message/push", &body).await
        })
    }
}
