use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    rc::Rc,
    time::Duration,
};

use futures::future::{self, Either};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    alerts::{AlertKind, Alerts},
    dom::{Component, Dom},
    request::{HttpRequest, HttpResponse, Method, Payload, RequestError, Transport, encode},
    runtime::Runtime,
    settings::Settings,
};

/// An API call before encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,

    /// Path below the API base, e.g. `/api/add`.
    pub path: String,

    pub payload: Option<Payload>,

    /// `None` for multipart forms; `"json"` is accepted as shorthand.
    pub content_type: Option<String>,
}

impl ApiRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            payload: None,
            content_type: None,
        }
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            ..Self::get(path)
        }
    }

    /// Send `fields` as a multipart form.
    #[must_use]
    pub fn form(mut self, fields: Value) -> Self {
        self.payload = Payload::from_value(fields);
        self.content_type = None;
        self
    }

    /// Send `body` as JSON.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.payload = Payload::from_value(body);
        self.content_type = Some("json".to_string());
        self
    }
}

/// Sends [`ApiRequest`]s with a deadline and normalizes the outcome.
#[derive(Clone)]
pub struct ApiClient {
    transport: Rc<dyn Transport>,
    runtime: Rc<dyn Runtime>,
    settings: Rc<Settings>,
}

impl Debug for ApiClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ApiClient")
            .field("api_base", &self.settings.api_base)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    #[must_use]
    pub fn new(transport: Rc<dyn Transport>, runtime: Rc<dyn Runtime>, settings: Rc<Settings>) -> Self {
        Self {
            transport,
            runtime,
            settings,
        }
    }

    /// Send `request` and decode a `200` body as `T`.
    ///
    /// `timeout` defaults to the promise timeout from [`Settings`]. Empty
    /// bodies decode as JSON `null`, so `()` and `Option<_>` accept them.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Timeout`] when the deadline passes first,
    /// [`RequestError::Status`] for any status other than `200`, and
    /// [`RequestError::Network`] when no response arrived at all.
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
        timeout: Option<Duration>,
    ) -> Result<T, RequestError> {
        let timeout = timeout.unwrap_or_else(|| self.settings.promise_timeout());
        let response = self.dispatch(request, timeout).await?;

        decode(&response)
    }

    /// Start a callback-style exchange for `request`.
    #[must_use]
    pub fn exchange<D: Dom>(&self, request: ApiRequest) -> Exchange<'_, D> {
        Exchange {
            client: self,
            request,
            button: None,
            alerts: None,
            on_failure: None,
            on_always: None,
            on_ready: None,
        }
    }

    async fn dispatch(&self, request: &ApiRequest, timeout: Duration) -> Result<HttpResponse, RequestError> {
        let (content_type, body) = encode(request.payload.as_ref(), request.content_type.as_deref())
            .map_err(RequestError::Encode)?;

        let http = HttpRequest {
            method: request.method,
            url: self.settings.url(&request.path),
            content_type,
            body,
        };

        debug!(method = %http.method, url = %http.url, "sending request");

        let url = http.url.clone();
        let response = self.transport.send(http);
        let deadline = self.runtime.sleep(timeout);

        match future::select(response, deadline).await {
            Either::Left((Ok(response), _)) if response.status == 200 => Ok(response),
            Either::Left((Ok(response), _)) => {
                debug!(%url, status = response.status, "request rejected");
                Err(RequestError::from_response(&response))
            }
            Either::Left((Err(source), _)) => {
                warn!(%url, "transport failed: {source}");
                Err(RequestError::Network(source))
            }
            Either::Right(((), _)) => {
                warn!(%url, ?timeout, "request timed out");
                Err(RequestError::Timeout)
            }
        }
    }
}

fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, RequestError> {
    if response.body.trim().is_empty() {
        return serde_json::from_value(Value::Null).map_err(RequestError::Decode);
    }

    serde_json::from_str(&response.body).map_err(RequestError::Decode)
}

/// Transport progress reported to [`Exchange::on_ready`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// The request is on its way.
    Opened,

    /// A terminal outcome is known.
    Done,
}

type FailureHook<'a> = Box<dyn FnOnce(&RequestError) + 'a>;
type AlwaysHook<'a> = Box<dyn FnOnce() + 'a>;
type ReadyHook<'a> = Box<dyn FnMut(ReadyState) + 'a>;

/// A request with the success/failure/always contract attached.
///
/// Exactly one of success or failure runs, then `always`. When a button is
/// attached it is disabled for the duration of the exchange and enabled
/// again after the terminal callback. If the future is dropped early, the
/// button is still released and `always` still runs, once.
pub struct Exchange<'a, D: Dom> {
    client: &'a ApiClient,
    request: ApiRequest,
    button: Option<Component<D>>,
    alerts: Option<&'a Alerts<D>>,
    on_failure: Option<FailureHook<'a>>,
    on_always: Option<AlwaysHook<'a>>,
    on_ready: Option<ReadyHook<'a>>,
}

impl<D: Dom> Debug for Exchange<'_, D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Exchange")
            .field("request", &self.request)
            .field("button", &self.button)
            .field("has_alerts", &self.alerts.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a, D: Dom> Exchange<'a, D> {
    /// Disable `button` while the request is in flight.
    #[must_use]
    pub fn button(mut self, button: &Component<D>) -> Self {
        self.button = Some(button.clone());
        self
    }

    /// Where failures go when no failure handler is set.
    #[must_use]
    pub fn alerts(mut self, alerts: &'a Alerts<D>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    #[must_use]
    pub fn on_failure(mut self, handler: impl FnOnce(&RequestError) + 'a) -> Self {
        self.on_failure = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn on_always(mut self, handler: impl FnOnce() + 'a) -> Self {
        self.on_always = Some(Box::new(handler));
        self
    }

    #[must_use]
    pub fn on_ready(mut self, handler: impl FnMut(ReadyState) + 'a) -> Self {
        self.on_ready = Some(Box::new(handler));
        self
    }

    /// Run the exchange, calling `on_success` with the decoded body.
    ///
    /// Returns `true` when the success callback ran.
    pub async fn send<T: DeserializeOwned>(self, on_success: impl FnOnce(T)) -> bool {
        let Self {
            client,
            request,
            button,
            alerts,
            on_failure,
            on_always,
            mut on_ready,
        } = self;

        let guard = Finish::engage(button, on_always);

        if let Some(ready) = on_ready.as_mut() {
            ready(ReadyState::Opened);
        }

        let timeout = client.settings.request_timeout();
        let outcome = match client.dispatch(&request, timeout).await {
            Ok(response) => decode::<T>(&response),
            Err(error) => Err(error),
        };

        if let Some(ready) = on_ready.as_mut() {
            ready(ReadyState::Done);
        }

        let succeeded = match outcome {
            Ok(body) => {
                on_success(body);
                true
            }
            Err(error) => {
                match (on_failure, alerts) {
                    (Some(handler), _) => handler(&error),
                    (None, Some(alerts)) => alerts.insert(AlertKind::Danger, &error.to_string()),
                    (None, None) => warn!(path = %request.path, "request failed: {error}"),
                }
                false
            }
        };

        drop(guard);

        succeeded
    }
}

/// Releases the button and then runs `always`, on completion or when the
/// exchange is dropped mid-flight.
struct Finish<'a, D: Dom> {
    button: Option<Component<D>>,
    always: Option<AlwaysHook<'a>>,
}

impl<'a, D: Dom> Finish<'a, D> {
    fn engage(button: Option<Component<D>>, always: Option<AlwaysHook<'a>>) -> Self {
        if let Some(button) = &button {
            button.disable();
        }

        Self { button, always }
    }
}

impl<D: Dom> Drop for Finish<'_, D> {
    fn drop(&mut self) {
        if let Some(button) = self.button.take() {
            button.enable();
        }

        if let Some(always) = self.always.take() {
            always();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use futures::{FutureExt, executor::block_on};
    use serde_json::json;
    use testresult::TestResult;

    use super::*;
    use crate::{
        dom::{Builder, ComponentOptions, MemoryDom},
        models::{Message, Text},
        request::{EncodedBody, MockTransport, TransportError},
        test::{FakeRuntime, PendingTransport, reply},
    };

    fn client(transport: impl Transport + 'static) -> (ApiClient, Rc<FakeRuntime>) {
        let runtime = Rc::new(FakeRuntime::new());
        let client = ApiClient::new(
            Rc::new(transport),
            Rc::clone(&runtime) as Rc<dyn Runtime>,
            Rc::new(Settings::default()),
        );

        (client, runtime)
    }

    #[test]
    fn fetch_decodes_json_body() -> TestResult {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| request.url == "/api/recent-items" && request.method == Method::Get)
            .times(1)
            .returning(|_| reply(HttpResponse::json(200, &json!([]))));

        let (client, _) = client(transport);
        let items: Vec<Message> = block_on(client.fetch(&ApiRequest::get("/api/recent-items"), None))?;

        assert!(items.is_empty());

        Ok(())
    }

    #[test]
    fn fetch_accepts_empty_body_as_unit() -> TestResult {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| reply(HttpResponse::ok()));

        let (client, _) = client(transport);

        block_on(client.fetch::<()>(&ApiRequest::get("/auth/sign-out"), None))?;

        Ok(())
    }

    #[test]
    fn fetch_times_out_with_default_deadline() {
        let (client, runtime) = client(PendingTransport);

        let result = block_on(client.fetch::<Text>(&ApiRequest::get("/api/get-config"), None));

        assert!(matches!(result, Err(RequestError::Timeout)));
        assert_eq!(runtime.sleeps(), vec![Duration::from_secs(5)]);
    }

    #[test]
    fn fetch_honors_explicit_timeout() {
        let (client, runtime) = client(PendingTransport);

        let result = block_on(client.fetch::<Text>(
            &ApiRequest::get("/api/get-config"),
            Some(Duration::from_millis(250)),
        ));

        assert!(matches!(result, Err(RequestError::Timeout)));
        assert_eq!(runtime.sleeps(), vec![Duration::from_millis(250)]);
    }

    #[test]
    fn fetch_maps_transport_failure_to_network_error() {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_| {
            async { Err(TransportError::Network("connection refused".into())) }.boxed_local()
        });

        let (client, _) = client(transport);
        let result = block_on(client.fetch::<Text>(&ApiRequest::get("/x"), None));

        assert!(
            matches!(&result, Err(error) if error.to_string() == "An error occurred during the transaction")
        );
    }

    #[test]
    fn form_request_is_sent_as_multipart() -> TestResult {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.content_type.is_none()
                    && matches!(&request.body, EncodedBody::Form(form) if form.get("msg") == Some("hello"))
            })
            .times(1)
            .returning(|_| reply(HttpResponse::json(200, &json!({"message": "20240101"}))));

        let (client, _) = client(transport);
        let request = ApiRequest::post("/api/add").form(json!({"msg": "hello"}));
        let text: Text = block_on(client.fetch(&request, None))?;

        assert_eq!(text.message, "20240101");

        Ok(())
    }

    #[test]
    fn exchange_runs_success_then_always_once() -> TestResult {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| reply(HttpResponse::json(200, &json!(true))));

        let (client, _) = client(transport);
        let builder = Rc::new(Builder::new(Rc::new(MemoryDom::new())));
        let button = builder.create("button", ComponentOptions::new())?;
        let order = RefCell::new(Vec::new());
        let disabled_during = Cell::new(false);
        let dom = Rc::clone(builder.dom());

        let succeeded = block_on(
            client
                .exchange::<MemoryDom>(ApiRequest::get("/auth/is-signed-in"))
                .button(&button)
                .on_failure(|_| order.borrow_mut().push("failure"))
                .on_always(|| order.borrow_mut().push("always"))
                .send(|signed_in: bool| {
                    disabled_during.set(dom.is_disabled(button.node()));
                    order.borrow_mut().push(if signed_in { "success" } else { "no" });
                }),
        );

        assert!(succeeded);
        assert!(disabled_during.get());
        assert!(!dom.is_disabled(button.node()));
        assert_eq!(*order.borrow(), vec!["success", "always"]);

        Ok(())
    }

    #[test]
    fn exchange_failure_without_handler_goes_to_alerts() -> TestResult {
        let mut transport = MockTransport::new();
        transport
            .expect_send()
            .returning(|_| reply(HttpResponse::json(400, &json!({"message": "id not found"}))));

        let (client, _) = client(transport);
        let builder = Rc::new(Builder::new(Rc::new(MemoryDom::new())));
        let alerts = Alerts::new(&builder, 3)?;
        let always = Cell::new(0);

        let succeeded = block_on(
            client
                .exchange::<MemoryDom>(ApiRequest::post("/api/delete"))
                .alerts(&alerts)
                .on_always(|| always.set(always.get() + 1))
                .send(|_: Text| {}),
        );

        let log = alerts.log();
        let entry = log.entries().next().ok_or("no alert")?;

        assert!(!succeeded);
        assert_eq!(always.get(), 1);
        assert_eq!(entry.kind, AlertKind::Danger);
        assert_eq!(entry.text, "400 id not found");

        Ok(())
    }

    #[test]
    fn exchange_timeout_reenables_button() -> TestResult {
        let (client, runtime) = client(PendingTransport);
        let builder = Rc::new(Builder::new(Rc::new(MemoryDom::new())));
        let button = builder.create("button", ComponentOptions::new())?;
        let failure = RefCell::new(None);
        let states = RefCell::new(Vec::new());

        block_on(
            client
                .exchange::<MemoryDom>(ApiRequest::get("/api/get-config"))
                .button(&button)
                .on_ready(|state| states.borrow_mut().push(state))
                .on_failure(|error| *failure.borrow_mut() = Some(error.to_string()))
                .send(|_: Text| {}),
        );

        assert_eq!(failure.borrow().as_deref(), Some("timeout"));
        assert_eq!(*states.borrow(), vec![ReadyState::Opened, ReadyState::Done]);
        assert_eq!(runtime.sleeps(), vec![Duration::from_secs(10)]);
        assert!(!builder.dom().is_disabled(button.node()));

        Ok(())
    }

    #[test]
    fn dropped_exchange_still_runs_always() -> TestResult {
        let (client, runtime) = client(PendingTransport);
        let builder = Rc::new(Builder::new(Rc::new(MemoryDom::new())));
        let button = builder.create("button", ComponentOptions::new())?;
        let always = Cell::new(0);
        let dom = Rc::clone(builder.dom());
        let disabled_in_always = Cell::new(None);

        runtime.freeze_clock();

        let mut exchange = client
            .exchange::<MemoryDom>(ApiRequest::get("/api/get-config"))
            .button(&button)
            .on_always(|| {
                always.set(always.get() + 1);
                disabled_in_always.set(Some(dom.is_disabled(button.node())));
            })
            .send(|_: Text| {})
            .boxed_local();

        let waker = futures::task::noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);

        assert!(exchange.poll_unpin(&mut cx).is_pending());
        assert_eq!(always.get(), 0);

        drop(exchange);

        assert_eq!(always.get(), 1);
        assert_eq!(disabled_in_always.get(), Some(false));

        Ok(())
    }

    #[test]
    fn dropped_exchange_releases_button() -> TestResult {
        let (client, runtime) = client(PendingTransport);
        let builder = Rc::new(Builder::new(Rc::new(MemoryDom::new())));
        let button = builder.create("button", ComponentOptions::new())?;

        runtime.freeze_clock();

        let mut exchange = client
            .exchange::<MemoryDom>(ApiRequest::get("/api/get-config"))
            .button(&button)
            .send(|_: Text| {})
            .boxed_local();

        let waker = futures::task::noop_waker();
        let mut cx = std::task::Context::from_waker(&waker);

        assert!(exchange.poll_unpin(&mut cx).is_pending());
        assert!(builder.dom().is_disabled(button.node()));

        drop(exchange);

        assert!(!builder.dom().is_disabled(button.node()));

        Ok(())
    }
}
