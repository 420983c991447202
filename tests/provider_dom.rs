#![cfg(not(target_arch = "wasm32"))]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use dioxus::dioxus_core::NoOpMutations;
use dioxus::prelude::*;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Map, Value};
// Both globs together must stay unambiguous for the names used below.
use socket_provider::*;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_tungstenite::{accept_async, tungstenite::Message};

type Record = Map<String, Value>;

const WAIT: Duration = Duration::from_secs(5);

/// What the server saw from its single client.
#[derive(Debug)]
struct Session {
    received: Vec<String>,
    closed_by_client: bool,
    reconnected: bool,
}

/// Accept one client, push an update, record what it sends until it closes,
/// then check whether a second client shows up.
async fn serve_once() -> (String, JoinHandle<Session>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();

        let update = r#"{"type":"event","data":["update",{"count":5}]}"#;
        ws.send(Message::Text(update.to_string().into())).await.unwrap();

        let mut received = Vec::new();
        let mut closed_by_client = false;
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Text(text) => received.push(text.as_str().to_string()),
                Message::Close(_) => {
                    closed_by_client = true;
                    break;
                }
                _ => {}
            }
        }

        let reconnected = tokio::time::timeout(Duration::from_millis(200), listener.accept())
            .await
            .is_ok();

        Session {
            received,
            closed_by_client,
            reconnected,
        }
    });

    (format!("ws://{addr}/socket"), server)
}

fn merge_on_update(state: &Record, action: &SocketAction) -> Record {
    let mut next = state.clone();
    if action.is("update") {
        if let Some(Value::Object(fields)) = &action.payload {
            next.extend(fields.clone());
        }
    }
    next
}

fn count(n: i64) -> Record {
    match json!({ "count": n }) {
        Value::Object(fields) => fields,
        _ => unreachable!(),
    }
}

/// Shared between the test body and the components under test.
#[derive(Clone, Default)]
struct Seen {
    uri: String,
    renders: Rc<RefCell<Vec<(bool, Record)>>>,
    emitter: Rc<RefCell<Option<Emitter>>>,
    tag: Rc<RefCell<Option<Signal<String>>>>,
}

fn app() -> Element {
    let seen = use_context::<Seen>();
    let tag = use_signal(|| "first".to_string());
    use_hook(|| *seen.tag.borrow_mut() = Some(tag));

    rsx! {
        SocketProvider::<Record> {
            uri: seen.uri.clone(),
            reducer: merge_on_update,
            initial_state: count(0),
            query: vec![("tag".to_string(), tag())],
            Watcher {}
        }
    }
}

#[component]
fn Watcher() -> Element {
    let seen = use_context::<Seen>();
    let connected = use_socket().is_some();
    let state = use_socket_state::<Record>();
    let emitter = use_emit_event("increment");

    seen.renders.borrow_mut().push((connected, state));
    use_hook(|| *seen.emitter.borrow_mut() = Some(emitter));

    rsx! {}
}

async fn run_until(dom: &mut VirtualDom, seen: &Seen, done: impl Fn(&[(bool, Record)]) -> bool) {
    while !done(&seen.renders.borrow()) {
        tokio::time::timeout(WAIT, dom.wait_for_work())
            .await
            .expect("timed out waiting for the dom");
        dom.render_immediate(&mut NoOpMutations);
    }
}

#[tokio::test]
async fn provider_publishes_the_socket_and_reduced_state() {
    let (uri, server) = serve_once().await;
    let seen = Seen {
        uri,
        ..Seen::default()
    };

    let mut dom = VirtualDom::new(app).with_root_context(seen.clone());
    dom.rebuild_in_place();
    run_until(&mut dom, &seen, |renders| {
        renders.last() == Some(&(true, count(5)))
    })
    .await;

    let renders = seen.renders.borrow().clone();
    assert_eq!(renders.first(), Some(&(false, count(0))));
    assert!(renders.contains(&(true, count(0))));

    let emitter = seen.emitter.borrow().clone().expect("watcher rendered");
    emitter.emit(1).unwrap();

    // A new query value re-renders the provider but keeps the first socket.
    let mut tag = seen.tag.borrow().expect("app rendered");
    dom.in_runtime(|| tag.set("second".to_string()));
    tokio::time::timeout(WAIT, dom.wait_for_work())
        .await
        .expect("timed out waiting for the dom");
    dom.render_immediate(&mut NoOpMutations);
    assert_eq!(seen.renders.borrow().last(), Some(&(true, count(5))));

    drop(dom);
    assert!(matches!(emitter.emit(2), Err(SocketError::NotConnected)));

    let session = tokio::time::timeout(WAIT, server)
        .await
        .expect("server did not finish")
        .unwrap();
    assert_eq!(
        session.received,
        vec![r#"{"type":"event","data":["increment",1]}"#]
    );
    assert!(session.closed_by_client);
    assert!(!session.reconnected);
}

#[derive(Clone, Default)]
struct Lookups(Rc<RefCell<Vec<bool>>>);

fn outside_provider() -> Element {
    let lookups = use_context::<Lookups>();
    let socket = try_use_socket();
    let state = try_use_socket_state::<Record>();

    let mut seen = lookups.0.borrow_mut();
    seen.push(matches!(socket, Err(SocketError::MissingProvider)));
    seen.push(matches!(state, Err(SocketError::MissingProvider)));

    rsx! {}
}

#[test]
fn accessors_outside_a_provider_report_it() {
    let lookups = Lookups::default();
    let mut dom = VirtualDom::new(outside_provider).with_root_context(lookups.clone());
    dom.rebuild_in_place();

    assert_eq!(*lookups.0.borrow(), vec![true, true]);
}
