//! [`Transport`] over `reqwest`, which uses `fetch` in the browser.

use futures::{FutureExt, future::LocalBoxFuture};
use reqwest::{
    Client, RequestBuilder,
    header::CONTENT_TYPE,
    multipart::{Form, Part},
};
use txt_client::request::{
    EncodedBody, FormData, HttpRequest, HttpResponse, Method, PartValue, Transport, TransportError,
};

/// Sends requests relative to the page origin.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    origin: String,
}

impl ReqwestTransport {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            origin: origin.into(),
        }
    }

    fn prepare(&self, request: HttpRequest) -> Result<RequestBuilder, TransportError> {
        let url = absolute_url(&self.origin, &request.url);

        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };

        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }

        Ok(match request.body {
            EncodedBody::Empty => builder,
            EncodedBody::Json(text) => builder.body(text),
            EncodedBody::Form(form) => builder.multipart(multipart(&form)?),
        })
    }
}

/// Resolve `url` against `origin` unless it is already absolute.
fn absolute_url(origin: &str, url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }

    format!("{}/{}", origin.trim_end_matches('/'), url.trim_start_matches('/'))
}

fn multipart(form: &FormData) -> Result<Form, TransportError> {
    let mut multipart = Form::new();

    for part in form.parts() {
        multipart = match &part.value {
            PartValue::Text(text) => multipart.text(part.name.clone(), text.clone()),
            PartValue::File {
                file_name,
                mime,
                bytes,
            } => {
                let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());

                if let Some(mime) = mime {
                    file = file
                        .mime_str(mime)
                        .map_err(|error| TransportError::InvalidRequest(error.to_string()))?;
                }

                multipart.part(part.name.clone(), file)
            }
        };
    }

    Ok(multipart)
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>> {
        let builder = self.prepare(request);

        async move {
            let response = builder?
                .send()
                .await
                .map_err(|error| TransportError::Network(error.to_string()))?;

            let status = response.status().as_u16();
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);

            let body = response
                .text()
                .await
                .map_err(|error| TransportError::Network(error.to_string()))?;

            Ok(HttpResponse {
                status,
                content_type,
                body,
            })
        }
        .boxed_local()
    }
}
