// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the protocol codec: method tagging, parameter shapes and
//! response encodings.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::daemon::proto::{
        BeforeAndAfterNames, DomainInfo, QType, Query, RecordInfo, Response, ResultPayload,
        ZoneKind,
    };
    use crate::store::record::RecordType;

    #[test]
    fn test_initialize_decodes() {
        let query: Query =
            serde_json::from_str(r#"{"method":"initialize","parameters":{"path":"/tmp/x"}}"#)
                .unwrap();
        assert_eq!(query.method(), "initialize");
        let Query::Initialize(params) = query else {
            panic!("wrong variant");
        };
        assert_eq!(params.path, "/tmp/x");
    }

    #[test]
    fn test_lookup_keeps_the_hyphenated_zone_id() {
        let query: Query = serde_json::from_str(
            r#"{"method":"lookup","parameters":{"qname":"www.example.com","qtype":"A","zone-id":-1}}"#,
        )
        .unwrap();
        let Query::Lookup(params) = query else {
            panic!("wrong variant");
        };
        assert_eq!(params.qname, "www.example.com");
        assert_eq!(params.qtype, QType::A);
        assert_eq!(params.zone_id, Some(-1));
    }

    #[test]
    fn test_lookup_zone_id_may_be_absent() {
        let query: Query = serde_json::from_str(
            r#"{"method":"lookup","parameters":{"qname":"www.example.com","qtype":"ANY"}}"#,
        )
        .unwrap();
        let Query::Lookup(params) = query else {
            panic!("wrong variant");
        };
        assert_eq!(params.zone_id, None);
    }

    #[test]
    fn test_camel_case_methods_decode() {
        let query: Query = serde_json::from_str(
            r#"{"method":"getBeforeAndAfterNamesAbsolute","parameters":{"qname":"b.example.com"}}"#,
        )
        .unwrap();
        assert_eq!(query.method(), "getBeforeAndAfterNamesAbsolute");

        let query: Query = serde_json::from_str(
            r#"{"method":"getAllDomains","parameters":{"include_disabled":true}}"#,
        )
        .unwrap();
        let Query::GetAllDomains(params) = query else {
            panic!("wrong variant");
        };
        assert!(params.include_disabled);
    }

    #[test]
    fn test_add_domain_key_carries_the_key_payload() {
        let query: Query = serde_json::from_str(
            r#"{"method":"addDomainKey","parameters":{"name":"example.com","key":{"id":2,"flags":257,"active":true,"published":true,"content":"opaque"}}}"#,
        )
        .unwrap();
        let Query::AddDomainKey(params) = query else {
            panic!("wrong variant");
        };
        assert_eq!(params.key.id, 2);
        assert_eq!(params.key.flags, 257);
        assert_eq!(params.key.content, "opaque");
    }

    #[test]
    fn test_transactions_accept_arbitrary_parameters() {
        let query: Query = serde_json::from_str(
            r#"{"method":"startTransaction","parameters":{"domain_id":-1,"domain":"example.com","trxid":7}}"#,
        )
        .unwrap();
        assert_eq!(query.method(), "startTransaction");
    }

    #[test]
    fn test_unknown_methods_are_rejected() {
        let result =
            serde_json::from_str::<Query>(r#"{"method":"calculateSOASerial","parameters":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_boolean_responses() {
        assert_eq!(
            serde_json::to_string(&Response::ok()).unwrap(),
            r#"{"result":true}"#
        );
        assert_eq!(
            serde_json::to_string(&Response::fail()).unwrap(),
            r#"{"result":false}"#
        );
    }

    #[test]
    fn test_record_list_encoding_matches_the_contract() {
        let response: Response = ResultPayload::Records(vec![RecordInfo {
            qtype: QType::A,
            qname: "www.example.com".to_string(),
            content: "1.2.3.4".to_string(),
            ttl: 300,
            auth: true,
        }])
        .into();
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"result":[{"qtype":"A","qname":"www.example.com","content":"1.2.3.4","ttl":300,"auth":true}]}"#
        );
    }

    #[test]
    fn test_domain_info_encoding() {
        let response: Response = ResultPayload::Domain(Box::new(DomainInfo {
            id: 0,
            zone: "example.com".to_string(),
            serial: 7,
            notified_serial: None,
            last_check: 0,
            kind: ZoneKind::Master,
        }))
        .into();
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"result":{"id":0,"zone":"example.com","serial":7,"notified_serial":null,"last_check":0,"kind":"master"}}"#
        );
    }

    #[test]
    fn test_before_and_after_encoding() {
        let response: Response = ResultPayload::BeforeAndAfter(BeforeAndAfterNames {
            before: "a".to_string(),
            after: "c".to_string(),
            unhashed: String::new(),
        })
        .into();
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"result":{"before":"a","after":"c","unhashed":""}}"#
        );
    }

    #[test]
    fn test_serialised_responses_never_embed_newlines() {
        let response: Response = ResultPayload::Records(vec![RecordInfo {
            qtype: QType::CNAME,
            qname: "weird.example.com".to_string(),
            content: "multi\nline".to_string(),
            ttl: 60,
            auth: true,
        }])
        .into();
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_qtype_record_type_mapping_is_partial() {
        assert_eq!(QType::A.record_type(), Some(RecordType::A));
        assert_eq!(QType::NS.record_type(), Some(RecordType::NS));
        assert_eq!(QType::ANY.record_type(), None);
        assert_eq!(QType::SOA.record_type(), None);

        assert_eq!(QType::from_record_type(RecordType::MX), Some(QType::MX));
        // The reserved type has no query equivalent and is never emitted.
        assert_eq!(QType::from_record_type(RecordType::CONSUL), None);
    }

    #[test]
    fn test_query_round_trip() {
        let original: Query = serde_json::from_str(
            r#"{"method":"setDomainMetadata","parameters":{"name":"example.com","kind":"ALSO-NOTIFY","value":["192.0.2.1"]}}"#,
        )
        .unwrap();
        let encoded = serde_json::to_string(&original).unwrap();
        let decoded: Query = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, original);
    }
}
