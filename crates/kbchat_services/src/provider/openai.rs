use anyhow::Context as _;
use kbchat_app::CompletionService;
use kbchat_domain::{ChatCompletionMessage, Context, Error, ModelId, ResultStream};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use reqwest_eventsource::{Event, RequestBuilderExt};
use tokio_stream::StreamExt;
use tracing::{debug, info};

use super::request::Request;
use super::response::Response;
use crate::utils::{format_http_context, sanitize_headers};

/// Streaming client for OpenAI compatible `chat/completions` endpoints.
#[derive(Clone)]
pub struct OpenAIProvider {
    client: Client,
    base_url: Url,
    api_key: String,
}

impl OpenAIProvider {
    pub fn new(client: Client, base_url: Url, api_key: impl Into<String>) -> Self {
        Self { client, base_url, api_key: api_key.into() }
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        // `Url::join` replaces the last segment unless the base ends with a slash
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let path = path.trim_start_matches('/');
        base.join(path)
            .with_context(|| format!("Failed to append {path} to base URL: {base}"))
    }

    fn headers(&self) -> anyhow::Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .context("API key is not a valid header value")?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert("X-Title", HeaderValue::from_static("kbchat"));
        Ok(headers)
    }

    async fn inner_chat(
        &self,
        model: &ModelId,
        context: Context,
    ) -> ResultStream<ChatCompletionMessage, anyhow::Error> {
        let request = Request::from(context).model(model.clone()).stream(true);
        let url = self.url("chat/completions")?;
        let headers = self.headers()?;

        info!(
            url = %url,
            model = %model,
            headers = ?sanitize_headers(&headers),
            message_count = request.message_count(),
            "Connecting Upstream"
        );

        let es = self
            .client
            .post(url.clone())
            .headers(headers)
            .json(&request)
            .eventsource()
            .with_context(|| format_http_context(None, "POST", &url))?;

        let stream = es
            .take_while(|message| !matches!(message, Err(reqwest_eventsource::Error::StreamEnded)))
            .then(|event| async {
                match event {
                    Ok(event) => match event {
                        Event::Open => None,
                        Event::Message(event) if ["[DONE]", ""].contains(&event.data.as_str()) => {
                            debug!("Received completion from Upstream");
                            None
                        }
                        Event::Message(message) => Some(
                            serde_json::from_str::<Response>(&message.data)
                                .with_context(|| {
                                    format!("Failed to parse provider response: {}", message.data)
                                })
                                .and_then(|response| {
                                    ChatCompletionMessage::try_from(response).with_context(|| {
                                        format!(
                                            "Failed to create completion message: {}",
                                            message.data
                                        )
                                    })
                                }),
                        ),
                    },
                    Err(error) => match error {
                        reqwest_eventsource::Error::StreamEnded => None,
                        reqwest_eventsource::Error::InvalidStatusCode(_, response) => {
                            let status = response.status();
                            let body = response.text().await.ok();
                            Some(Err(Error::InvalidStatusCode(status.as_u16())).with_context(
                                || match body {
                                    Some(body) => format!("{status} Reason: {body}"),
                                    None => format!("{status} Reason: [Unknown]"),
                                },
                            ))
                        }
                        reqwest_eventsource::Error::InvalidContentType(_, ref response) => {
                            let status_code = response.status();
                            debug!(response = ?response, "Invalid content type");
                            Some(Err(error).with_context(|| format!("Http Status: {status_code}")))
                        }
                        error => {
                            tracing::error!(error = ?error, "Failed to receive chat completion event");
                            Some(Err(error.into()))
                        }
                    },
                }
            })
            .filter_map(move |response| {
                response
                    .map(|result| result.with_context(|| format_http_context(None, "POST", &url)))
            });

        Ok(Box::pin(stream))
    }
}

#[async_trait::async_trait]
impl CompletionService for OpenAIProvider {
    async fn chat(
        &self,
        model: &ModelId,
        context: Context,
    ) -> ResultStream<ChatCompletionMessage, anyhow::Error> {
        self.inner_chat(model, context).await
    }
}
