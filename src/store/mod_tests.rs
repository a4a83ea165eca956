// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the store façade: zone index, lifecycle and the current-zone
//! pointer.

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::ConsulDsn;
    use crate::errors::StoreError;
    use crate::name::DnsName;
    use crate::store::Consul;

    fn kv_entry(key: &str, document: &Value) -> Value {
        json!([{
            "LockIndex": 0,
            "Key": key,
            "Flags": 0,
            "Value": BASE64.encode(document.to_string().as_bytes()),
            "CreateIndex": 1,
            "ModifyIndex": 1
        }])
    }

    async fn mount_doc(server: &MockServer, key: &str, document: &Value) {
        Mock::given(method("GET"))
            .and(path(format!("/v1/kv/{key}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(kv_entry(key, document)))
            .mount(server)
            .await;
    }

    async fn mount_fallbacks(server: &MockServer) {
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

    fn store(server: &MockServer) -> Consul {
        let dsn = ConsulDsn::parse(&server.uri()).unwrap();
        Consul::connect(&dsn).unwrap()
    }

    fn name(text: &str) -> DnsName {
        DnsName::from_text(text).unwrap()
    }

    #[tokio::test]
    async fn test_empty_store_has_no_zones() {
        let server = MockServer::start().await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        assert!(consul.zone_names().await.unwrap().is_empty());
        assert!(consul.zones().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_zone_extends_the_index_then_writes_info() {
        let server = MockServer::start().await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        consul.add_zone(&name("example.com")).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let puts: Vec<&str> = requests
            .iter()
            .filter(|request| request.method.as_str() == "PUT")
            .map(|request| request.url.path())
            .collect();
        // Index first, default info second; a crash in between leaves an
        // index entry whose info materialises from defaults.
        assert_eq!(
            puts,
            vec![
                "/v1/kv/consulns/zones",
                "/v1/kv/consulns/zones/example.com/info"
            ]
        );

        let index_body: Value = requests
            .iter()
            .find(|request| {
                request.method.as_str() == "PUT" && request.url.path() == "/v1/kv/consulns/zones"
            })
            .map(|request| serde_json::from_slice(&request.body).unwrap())
            .unwrap();
        assert_eq!(index_body, json!({"zones": ["example.com"]}));
    }

    #[tokio::test]
    async fn test_add_zone_refuses_duplicates() {
        let server = MockServer::start().await;
        mount_doc(&server, "consulns/zones", &json!({"zones": ["example.com"]})).await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        let result = consul.add_zone(&name("example.com")).await;
        assert!(matches!(result, Err(StoreError::ZoneAlreadyExists(z)) if z == "example.com"));
    }

    #[tokio::test]
    async fn test_zone_lookup_requires_index_membership() {
        let server = MockServer::start().await;
        mount_doc(&server, "consulns/zones", &json!({"zones": ["example.com"]})).await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        assert!(consul.zone(&name("example.com")).await.is_ok());
        let missing = consul.zone(&name("example.org")).await;
        assert!(matches!(missing, Err(StoreError::MissingZone(z)) if z == "example.org"));
    }

    #[tokio::test]
    async fn test_current_zone_round_trip() {
        let server = MockServer::start().await;
        mount_doc(&server, "consulns/zones", &json!({"zones": ["example.com"]})).await;
        mount_doc(
            &server,
            "consulns/current-zone",
            &json!({"zone": "example.com"}),
        )
        .await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        let current = consul.current_zone().await.unwrap().unwrap();
        assert_eq!(current.name(), &name("example.com"));
    }

    #[tokio::test]
    async fn test_absent_pointer_means_no_current_zone() {
        let server = MockServer::start().await;
        mount_fallbacks(&server).await;
        let consul = store(&server);
        assert!(consul.current_zone().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_dangling_pointer_is_treated_as_absent() {
        let server = MockServer::start().await;
        mount_doc(
            &server,
            "consulns/current-zone",
            &json!({"zone": "gone.example.com"}),
        )
        .await;
        mount_fallbacks(&server).await;
        let consul = store(&server);
        assert!(consul.current_zone().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_use_zone_validates_existence() {
        let server = MockServer::start().await;
        mount_doc(&server, "consulns/zones", &json!({"zones": ["example.com"]})).await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        consul.use_zone(&name("example.com")).await.unwrap();
        let requests = server.received_requests().await.unwrap();
        assert!(requests.iter().any(|request| {
            request.method.as_str() == "PUT"
                && request.url.path() == "/v1/kv/consulns/current-zone"
        }));

        let missing = consul.use_zone(&name("example.org")).await;
        assert!(matches!(missing, Err(StoreError::MissingZone(_))));
    }

    #[tokio::test]
    async fn test_invalid_index_entries_are_skipped() {
        let server = MockServer::start().await;
        mount_doc(
            &server,
            "consulns/zones",
            &json!({"zones": ["example.com", "bad..name"]}),
        )
        .await;
        mount_fallbacks(&server).await;
        let consul = store(&server);

        let names = consul.zone_names().await.unwrap();
        assert_eq!(names, vec![name("example.com")]);
    }
}
