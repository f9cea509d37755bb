//! In-process stand-in for the editor host, speaking the real framing over TCP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::codec::Framed;

use hostlink::bridge::codec::JsonCodec;
use hostlink::config::SessionConfig;
use hostlink::{Bridge, CommandEnvelope, Session};

#[derive(Default)]
struct HostState {
    /// blackboard -> (key name, key type), in insertion order
    blackboards: HashMap<String, Vec<(String, String)>>,
    /// query -> generators, each holding its tests' scoring factors
    queries: HashMap<String, Vec<Vec<Value>>>,
    requests: Vec<CommandEnvelope>,
}

pub struct FakeHost {
    addr: SocketAddr,
    state: Arc<Mutex<HostState>>,
    connections: Arc<Mutex<Vec<JoinHandle<()>>>>,
    drop_after_read: Arc<AtomicBool>,
    acceptor: JoinHandle<()>,
}

impl FakeHost {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(HostState::default()));
        let connections = Arc::new(Mutex::new(Vec::new()));
        let drop_after_read = Arc::new(AtomicBool::new(false));

        let acceptor = {
            let state = state.clone();
            let connections = connections.clone();
            let drop_after_read = drop_after_read.clone();
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    let handle = tokio::spawn(serve(stream, state.clone(), drop_after_read.clone()));
                    connections.lock().await.push(handle);
                }
            })
        };

        Self {
            addr,
            state,
            connections,
            drop_after_read,
            acceptor,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_addr(self.addr.ip().to_string(), self.addr.port())
            .with_connect_timeout(Duration::from_secs(2))
            .with_io_timeout(Duration::from_secs(2))
    }

    pub fn bridge(&self) -> Bridge {
        Bridge::new(Arc::new(Session::tcp(self.session_config())))
    }

    /// Read the next request, then hang up without answering.
    pub fn drop_after_read(&self, enabled: bool) {
        self.drop_after_read.store(enabled, Ordering::SeqCst);
    }

    /// Close every open connection from the host side.
    pub async fn reset_connections(&self) {
        let handles: Vec<_> = self.connections.lock().await.drain(..).collect();
        for handle in handles {
            handle.abort();
            let _ = handle.await;
        }
        // Let the FIN reach the client socket.
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    /// Tests recorded under one generator of a query.
    pub async fn eqs_tests(&self, query: &str, generator: usize) -> Vec<Value> {
        self.state
            .lock()
            .await
            .queries
            .get(query)
            .and_then(|generators| generators.get(generator))
            .cloned()
            .unwrap_or_default()
    }

    pub async fn requests(&self) -> Vec<CommandEnvelope> {
        self.state.lock().await.requests.clone()
    }

    pub async fn stop(self) {
        self.acceptor.abort();
        self.reset_connections().await;
    }
}

async fn serve(stream: tokio::net::TcpStream, state: Arc<Mutex<HostState>>, drop_after_read: Arc<AtomicBool>) {
    let mut framed = Framed::new(stream, JsonCodec::<CommandEnvelope>::new());
    while let Some(Ok(request)) = framed.next().await {
        if drop_after_read.load(Ordering::SeqCst) {
            state.lock().await.requests.push(request);
            return;
        }
        let reply = {
            let mut state = state.lock().await;
            state.requests.push(request.clone());
            handle(&mut state, &request)
        };
        if framed.send(reply).await.is_err() {
            return;
        }
    }
}

fn str_param<'a>(request: &'a CommandEnvelope, key: &str) -> &'a str {
    request.params.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn ok(result: Value) -> Value {
    json!({"status": "success", "result": result})
}

fn error(message: String) -> Value {
    json!({"status": "error", "error": message})
}

fn handle(state: &mut HostState, request: &CommandEnvelope) -> Value {
    match request.name.as_str() {
        "create_blackboard" => {
            let name = str_param(request, "name").to_string();
            if state.blackboards.contains_key(&name) {
                return error(format!("Blackboard already exists: {name}"));
            }
            state.blackboards.insert(name.clone(), Vec::new());
            ok(json!({"name": name, "path": str_param(request, "path")}))
        }
        "add_blackboard_key" => {
            let blackboard = str_param(request, "blackboard_name");
            let Some(keys) = state.blackboards.get_mut(blackboard) else {
                return error(format!("Blackboard not found: {blackboard}"));
            };
            let key = str_param(request, "key_name").to_string();
            keys.push((key.clone(), str_param(request, "key_type").to_string()));
            ok(json!({"key_name": key, "key_count": keys.len()}))
        }
        "list_blackboard_keys" => {
            let blackboard = str_param(request, "blackboard_name");
            let Some(keys) = state.blackboards.get(blackboard) else {
                return error(format!("Blackboard not found: {blackboard}"));
            };
            let listed: Vec<Value> = keys
                .iter()
                .map(|(name, key_type)| json!({"name": name, "type": key_type}))
                .collect();
            ok(json!({"keys": listed, "count": keys.len()}))
        }
        "create_eqs_query" => {
            let name = str_param(request, "name").to_string();
            state.queries.entry(name.clone()).or_default();
            ok(json!({"name": name}))
        }
        "add_eqs_generator" => {
            let query = str_param(request, "query_name");
            let Some(generators) = state.queries.get_mut(query) else {
                return error(format!("EQS query not found: {query}"));
            };
            generators.push(Vec::new());
            ok(json!({"generator_index": generators.len() - 1}))
        }
        "add_eqs_test" => {
            let query = str_param(request, "query_name");
            let generator_index = request.params.get("generator_index").and_then(Value::as_u64).unwrap_or(0);
            let Some(tests) = state
                .queries
                .get_mut(query)
                .and_then(|g| g.get_mut(generator_index as usize))
            else {
                return json!({
                    "success": false,
                    "error": format!("Invalid generator index: {generator_index}"),
                    "error_code": "InvalidIndex"
                });
            };
            tests.push(request.params.clone().into());
            ok(json!({"generator_index": generator_index, "test_index": tests.len() - 1}))
        }
        _ => json!({"success": true, "echo": request.params}),
    }
}
