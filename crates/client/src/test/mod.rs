//! Test doubles shared by the unit tests.

use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    io::{self, Write},
    rc::Rc,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures::{
    FutureExt,
    executor::{LocalPool, LocalSpawner},
    future::{self, LocalBoxFuture},
    task::LocalSpawnExt,
};
use serde_json::{Value, json};

use crate::{
    dom::{Component, MemoryDom},
    pages::{Context, Page},
    request::{HttpRequest, HttpResponse, MockTransport, Transport, TransportError},
    runtime::{Runtime, RuntimeError},
    settings::Settings,
};

/// Single-threaded runtime whose timers fire immediately.
pub(crate) struct FakeRuntime {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    frozen: Cell<bool>,
    sleeps: RefCell<Vec<Duration>>,
    reloads: Cell<usize>,
    params: RefCell<HashMap<String, String>>,
    clipboard: RefCell<Vec<String>>,
    clipboard_denied: Cell<bool>,
    title: RefCell<String>,
}

impl FakeRuntime {
    pub(crate) fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();

        Self {
            pool: RefCell::new(pool),
            spawner,
            frozen: Cell::new(false),
            sleeps: RefCell::new(Vec::new()),
            reloads: Cell::new(0),
            params: RefCell::new(HashMap::new()),
            clipboard: RefCell::new(Vec::new()),
            clipboard_denied: Cell::new(false),
            title: RefCell::new(String::new()),
        }
    }

    /// Run spawned tasks until none can make progress.
    pub(crate) fn run(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    /// Timers never fire from now on.
    pub(crate) fn freeze_clock(&self) {
        self.frozen.set(true);
    }

    pub(crate) fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub(crate) fn reloads(&self) -> usize {
        self.reloads.get()
    }

    pub(crate) fn set_param(&self, name: &str, value: &str) {
        self.params
            .borrow_mut()
            .insert(name.to_string(), value.to_string());
    }

    pub(crate) fn clipboard(&self) -> Vec<String> {
        self.clipboard.borrow().clone()
    }

    pub(crate) fn deny_clipboard(&self) {
        self.clipboard_denied.set(true);
    }

    pub(crate) fn title(&self) -> String {
        self.title.borrow().clone()
    }
}

impl Runtime for FakeRuntime {
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(duration);

        if self.frozen.get() {
            future::pending().boxed_local()
        } else {
            future::ready(()).boxed_local()
        }
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(error) = self.spawner.spawn_local(task) {
            tracing::warn!("cannot spawn task: {error}");
        }
    }

    fn reload(&self) {
        self.reloads.set(self.reloads.get() + 1);
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.params.borrow().get(name).cloned()
    }

    fn copy_text(&self, text: &str) -> LocalBoxFuture<'static, Result<(), RuntimeError>> {
        if self.clipboard_denied.get() {
            return future::ready(Err(RuntimeError::Clipboard("permission denied".into()))).boxed_local();
        }

        self.clipboard.borrow_mut().push(text.to_string());

        future::ready(Ok(())).boxed_local()
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = title.to_string();
    }
}

/// A transport that never answers.
pub(crate) struct PendingTransport;

impl Transport for PendingTransport {
    fn send(&self, _request: HttpRequest) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>> {
        future::pending().boxed_local()
    }
}

/// An immediately available response.
pub(crate) fn reply(response: HttpResponse) -> LocalBoxFuture<'static, Result<HttpResponse, TransportError>> {
    future::ready(Ok(response)).boxed_local()
}

/// Requests seen by a scripted endpoint.
pub(crate) type Sent = Arc<Mutex<Vec<HttpRequest>>>;

/// Answer every request to `url` with `response`.
pub(crate) fn respond(transport: &mut MockTransport, url: &'static str, response: HttpResponse) -> Sent {
    respond_each(transport, url, vec![response])
}

/// Answer requests to `url` with `responses` in order, repeating the last.
pub(crate) fn respond_each(transport: &mut MockTransport, url: &'static str, responses: Vec<HttpResponse>) -> Sent {
    let sent = Sent::default();
    let recorder = Arc::clone(&sent);
    let last = responses
        .last()
        .cloned()
        .unwrap_or_else(|| HttpResponse::json(200, &json!(null)));
    let mut queue = responses.into_iter();

    transport
        .expect_send()
        .withf(move |request| request.url == url)
        .returning(move |request| {
            if let Ok(mut sent) = recorder.lock() {
                sent.push(request);
            }

            reply(queue.next().unwrap_or_else(|| last.clone()))
        });

    sent
}

/// Number of requests recorded in `sent`.
pub(crate) fn sent_count(sent: &Sent) -> usize {
    sent.lock().map(|sent| sent.len()).unwrap_or_default()
}

/// Clone of the `n`th request recorded in `sent`.
pub(crate) fn sent_request(sent: &Sent, n: usize) -> Option<HttpRequest> {
    sent.lock().ok().and_then(|sent| sent.get(n).cloned())
}

/// A message as the server sends it.
pub(crate) fn message_json(id: &str, cat: &str, index: i64) -> Value {
    json!({
        "ID": id,
        "UserID": "",
        "Alias": "",
        "Msg": format!("msg {id}"),
        "Cat": cat,
        "Index": index,
    })
}

/// Log records written while `action` runs, one formatted line each.
pub(crate) fn capture_logs(action: impl FnOnce()) -> String {
    let capture = LogCapture::default();
    let writer = capture.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .with_max_level(tracing::Level::TRACE)
        .finish();

    tracing::subscriber::with_default(subscriber, action);

    capture.contents()
}

#[derive(Clone, Default)]
struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    fn contents(&self) -> String {
        self.0
            .lock()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .unwrap_or_default()
    }
}

impl Write for LogCapture {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        if let Ok(mut buffer) = self.0.lock() {
            buffer.extend_from_slice(bytes);
        }

        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A page context over an in-memory document.
pub(crate) struct Harness {
    pub(crate) dom: Rc<MemoryDom>,
    pub(crate) runtime: Rc<FakeRuntime>,
    pub(crate) ctx: Rc<Context<MemoryDom>>,
}

impl Harness {
    pub(crate) fn new(transport: MockTransport) -> Self {
        let dom = Rc::new(MemoryDom::new());
        let runtime = Rc::new(FakeRuntime::new());
        let ctx = Context::new(
            Rc::clone(&dom),
            Rc::new(transport),
            Rc::clone(&runtime) as Rc<dyn Runtime>,
            Settings::default(),
        );

        Self { dom, runtime, ctx }
    }

    /// Attach `page` to the document, start it and settle.
    pub(crate) fn open<P: Page<MemoryDom>>(&self, page: &Rc<P>) {
        self.dom.mount(page.root().node());
        self.runtime.set_title(page.title());
        Rc::clone(page).start();
        self.runtime.run();
    }

    /// Click `component` and settle.
    pub(crate) fn click(&self, component: &Component<MemoryDom>) {
        self.dom.dispatch(component.node(), "click");
        self.runtime.run();
    }

    /// Text of the whole document.
    pub(crate) fn text(&self) -> String {
        self.dom.text_content(&self.dom.root())
    }

    pub(crate) fn rendered(&self, component: &Component<MemoryDom>) -> bool {
        self.dom.is_rendered(component.node())
    }

    pub(crate) fn disabled(&self, component: &Component<MemoryDom>) -> bool {
        self.dom.is_disabled(component.node())
    }
}
