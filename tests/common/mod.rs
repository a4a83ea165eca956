// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Shared helpers for daemon integration tests: a mocked Consul agent
//! seeded with zone documents, a running daemon on a temporary socket and
//! a line-oriented protocol client.

use std::path::PathBuf;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use consulns::config::ConsulDsn;
use consulns::daemon::cache::Cache;
use consulns::daemon::{bind_socket, serve};
use consulns::store::Consul;

/// Wrap a document the way the Consul KV API returns it.
pub fn kv_entry(key: &str, document: &Value) -> Value {
    json!([{
        "LockIndex": 0,
        "Key": key,
        "Flags": 0,
        "Value": BASE64.encode(document.to_string().as_bytes()),
        "CreateIndex": 1,
        "ModifyIndex": 1
    }])
}

/// Serve `document` for GETs of one KV key.
pub async fn mount_kv_doc(server: &MockServer, key: &str, document: &Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/kv/{key}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv_entry(key, document)))
        .mount(server)
        .await;
}

/// Everything not explicitly mounted is absent; writes are acknowledged.
pub async fn mount_fallbacks(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(200)
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(true))
        .with_priority(200)
        .mount(server)
        .await;
}

/// Build a records document body from record objects carrying an `id`.
pub fn records_doc(records: &[Value]) -> Value {
    let mut map = serde_json::Map::new();
    for record in records {
        let id = record["id"].as_str().expect("record has an id").to_string();
        map.insert(id, record.clone());
    }
    Value::Object(map)
}

/// Seed a complete zone: index membership, info and records documents.
///
/// `records` maps straight into the records document; pass record objects
/// keyed by their id (see [`records_doc`]).
pub async fn seed_zone(server: &MockServer, zone: &str, serial: u32, records: &Value) {
    mount_kv_doc(server, "consulns/zones", &json!({"zones": [zone]})).await;
    mount_kv_doc(
        server,
        &format!("consulns/zones/{zone}/info"),
        &json!({"serial": serial, "notified_serial": null, "enabled": true, "last_check": 0}),
    )
    .await;
    mount_kv_doc(
        server,
        &format!("consulns/zones/{zone}/records"),
        &json!({"records": records}),
    )
    .await;
}

/// A running daemon plus the means to talk to it.
pub struct TestDaemon {
    /// Keeps the socket directory alive for the test's duration
    _dir: tempfile::TempDir,
    /// Path of the daemon's UNIX socket
    pub socket_path: PathBuf,
    server_task: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl TestDaemon {
    /// Load a snapshot from the mocked agent and serve it on a fresh
    /// temporary socket.
    pub async fn start(consul: &MockServer) -> Self {
        let dsn = ConsulDsn::parse(&consul.uri()).expect("mock uri parses");
        let store = Consul::connect(&dsn).expect("client builds");
        let cache = Cache::load(&store).await.expect("snapshot loads");

        let dir = tempfile::tempdir().expect("tempdir");
        let socket_path = dir.path().join("pdns.sock");
        let listener = bind_socket(&socket_path).expect("socket binds");

        let server_task = tokio::spawn(serve(
            listener,
            Arc::new(cache),
            Arc::new(Mutex::new(store)),
        ));

        Self {
            _dir: dir,
            socket_path,
            server_task,
        }
    }

    /// Open a fresh front-end connection.
    pub async fn connect(&self) -> ProtoClient {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .expect("daemon socket accepts connections");
        let (read_half, write_half) = stream.into_split();
        ProtoClient {
            reader: BufReader::new(read_half),
            writer: write_half,
        }
    }
}

impl Drop for TestDaemon {
    fn drop(&mut self) {
        self.server_task.abort();
    }
}

/// One newline-framed JSON connection to the daemon.
pub struct ProtoClient {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
}

impl ProtoClient {
    /// Send one raw line and read one reply line.
    pub async fn roundtrip_raw(&mut self, line: &str) -> Value {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("request written");
        self.writer.write_all(b"\n").await.expect("newline written");

        let mut reply = String::new();
        self.reader
            .read_line(&mut reply)
            .await
            .expect("reply read");
        serde_json::from_str(reply.trim_end()).expect("reply is JSON")
    }

    /// Send one query object and read its reply.
    pub async fn roundtrip(&mut self, query: Value) -> Value {
        self.roundtrip_raw(&query.to_string()).await
    }
}
