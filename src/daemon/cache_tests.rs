// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Tests for the lookup engine: zone resolution, wildcard handling, SOA
//! synthesis and the NSEC before/after ordering.

#[cfg(test)]
mod tests {
    use crate::daemon::cache::{Cache, CachedZone, NO_ZONE_ID};
    use crate::daemon::proto::QType;
    use crate::name::DnsName;
    use crate::store::record::{Record, RecordType, RecordValue};
    use crate::store::zone::ZoneInfo;

    fn name(text: &str) -> DnsName {
        DnsName::from_text(text).unwrap()
    }

    fn record(owner: &str, record_type: RecordType, value: &str) -> Record {
        Record::new(
            owner.to_string(),
            record_type,
            RecordValue::parse(value),
            300,
        )
    }

    fn zone(zone_name: &str, serial: u32, records: Vec<Record>) -> CachedZone {
        let info = ZoneInfo {
            serial,
            notified_serial: None,
            enabled: true,
            last_check: 0,
        };
        CachedZone::build(name(zone_name), info, records)
    }

    fn example_zone() -> CachedZone {
        zone(
            "example.com",
            7,
            vec![
                record("www", RecordType::A, "1.2.3.4"),
                record("www", RecordType::AAAA, "2001:db8::1"),
                record("@", RecordType::NS, "ns1.example.com"),
                record("mail", RecordType::CNAME, "www.example.com"),
            ],
        )
    }

    #[test]
    fn test_lookup_answers_from_the_owner_bucket() {
        let zone = example_zone();
        let answers = zone.lookup(QType::A, &name("www.example.com"));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].qtype, QType::A);
        assert_eq!(answers[0].qname, "www.example.com");
        assert_eq!(answers[0].content, "1.2.3.4");
        assert_eq!(answers[0].ttl, 300);
        assert!(answers[0].auth);
    }

    #[test]
    fn test_lookup_filters_by_qtype() {
        let zone = example_zone();
        let answers = zone.lookup(QType::AAAA, &name("www.example.com"));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].content, "2001:db8::1");
    }

    #[test]
    fn test_lookup_any_returns_every_mapped_type() {
        let zone = example_zone();
        let answers = zone.lookup(QType::ANY, &name("www.example.com"));
        assert_eq!(answers.len(), 2);
    }

    #[test]
    fn test_soa_query_on_the_apex_synthesises_one_record() {
        let zone = example_zone();
        let answers = zone.lookup(QType::SOA, &name("example.com"));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].qtype, QType::SOA);
        assert_eq!(answers[0].qname, "example.com");
        assert!(answers[0]
            .content
            .starts_with("ns1.example.com root.example.com 7 "));
        assert_eq!(
            answers[0].content,
            "ns1.example.com root.example.com 7 7200 3600 1209600 3600"
        );
        assert_eq!(answers[0].ttl, 300);
    }

    #[test]
    fn test_any_on_the_apex_yields_soa_first_then_apex_records() {
        let zone = example_zone();
        let answers = zone.lookup(QType::ANY, &name("example.com"));
        assert_eq!(answers[0].qtype, QType::SOA);
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[1].qtype, QType::NS);
        assert_eq!(answers[1].content, "ns1.example.com");
    }

    #[test]
    fn test_soa_query_below_the_apex_is_empty() {
        let zone = example_zone();
        assert!(zone.lookup(QType::SOA, &name("www.example.com")).is_empty());
    }

    #[test]
    fn test_wildcard_records_answer_for_any_sibling() {
        let zone = zone(
            "example.com",
            1,
            vec![record("*", RecordType::A, "9.9.9.9")],
        );
        let answers = zone.lookup(QType::A, &name("anything.example.com"));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].content, "9.9.9.9");
        // The answer echoes the queried name, not the wildcard owner.
        assert_eq!(answers[0].qname, "anything.example.com");
    }

    #[test]
    fn test_owned_names_shadow_the_wildcard() {
        let zone = zone(
            "example.com",
            1,
            vec![
                record("*", RecordType::A, "9.9.9.9"),
                record("www", RecordType::A, "1.2.3.4"),
            ],
        );
        let answers = zone.lookup(QType::A, &name("www.example.com"));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].content, "1.2.3.4");
    }

    #[test]
    fn test_wildcard_qname_fans_out_to_every_record() {
        let zone = example_zone();
        let answers = zone.lookup(QType::ANY, &name("*.example.com"));
        // All four records, each under its true owner name.
        assert_eq!(answers.len(), 4);
        assert!(answers.iter().any(|a| a.qname == "mail.example.com"));
        assert!(answers.iter().any(|a| a.qname == "example.com"));
    }

    #[test]
    fn test_consul_records_never_leave_the_lookup_path() {
        let zone = zone(
            "example.com",
            1,
            vec![
                record("svc", RecordType::CONSUL, "redis"),
                record("svc", RecordType::A, "10.0.0.1"),
            ],
        );
        let answers = zone.lookup(QType::ANY, &name("svc.example.com"));
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].qtype, QType::A);

        // The listing path hides them as well: SOA plus the A record.
        assert_eq!(zone.record_infos().len(), 2);
    }

    #[test]
    fn test_list_yields_soa_first() {
        let zone = example_zone();
        let infos = zone.record_infos();
        assert_eq!(infos.len(), 5);
        assert_eq!(infos[0].qtype, QType::SOA);
    }

    #[test]
    fn test_zone_resolution_prefers_the_longest_suffix() {
        let cache = Cache::from_zones(vec![
            zone("example.com", 1, vec![]),
            zone("sub.example.com", 1, vec![]),
        ]);

        let (id, matched) = cache.zone_by_qname(&name("a.sub.example.com"), false);
        assert_eq!(id, 1);
        assert_eq!(matched.unwrap().name(), &name("sub.example.com"));

        let (id, matched) = cache.zone_by_qname(&name("www.example.com"), false);
        assert_eq!(id, 0);
        assert_eq!(matched.unwrap().name(), &name("example.com"));
    }

    #[test]
    fn test_exact_zone_resolution_rejects_subdomains() {
        let cache = Cache::from_zones(vec![zone("example.com", 1, vec![])]);
        let (id, matched) = cache.zone_by_qname(&name("www.example.com"), true);
        assert_eq!(id, NO_ZONE_ID);
        assert!(matched.is_none());

        let (id, matched) = cache.zone_by_qname(&name("example.com"), true);
        assert_eq!(id, 0);
        assert!(matched.is_some());
    }

    #[test]
    fn test_unmatched_qnames_resolve_to_no_zone() {
        let cache = Cache::from_zones(vec![zone("example.com", 1, vec![])]);
        let (id, matched) = cache.zone_by_qname(&name("example.org"), false);
        assert_eq!(id, NO_ZONE_ID);
        assert!(matched.is_none());
    }

    #[test]
    fn test_zone_by_id() {
        let cache = Cache::from_zones(vec![zone("example.com", 1, vec![])]);
        assert!(cache.zone_by_id(0).is_some());
        assert!(cache.zone_by_id(1).is_none());
        assert!(cache.zone_by_id(-1).is_none());
    }

    #[test]
    fn test_before_and_after_walks_the_cyclic_sequence() {
        let zone = zone(
            "example.com",
            1,
            vec![
                record("a", RecordType::A, "10.0.0.1"),
                record("b", RecordType::A, "10.0.0.2"),
                record("c", RecordType::A, "10.0.0.3"),
            ],
        );

        let middle = zone.before_and_after(&name("b.example.com"));
        assert_eq!((middle.before.as_str(), middle.after.as_str()), ("a", "c"));

        // The sequence is circular at both ends.
        let first = zone.before_and_after(&name("a.example.com"));
        assert_eq!((first.before.as_str(), first.after.as_str()), ("c", "b"));

        let last = zone.before_and_after(&name("c.example.com"));
        assert_eq!((last.before.as_str(), last.after.as_str()), ("b", "a"));
    }

    #[test]
    fn test_before_and_after_for_unowned_names() {
        let zone = zone(
            "example.com",
            1,
            vec![
                record("a", RecordType::A, "10.0.0.1"),
                record("b", RecordType::A, "10.0.0.2"),
            ],
        );
        let result = zone.before_and_after(&name("zzz.example.com"));
        assert_eq!((result.before.as_str(), result.after.as_str()), ("b", "a"));
    }

    #[test]
    fn test_before_and_after_on_an_empty_zone_is_empty_strings() {
        let zone = zone("example.com", 1, vec![]);
        let result = zone.before_and_after(&name("www.example.com"));
        assert_eq!(result.before, "");
        assert_eq!(result.after, "");
        assert_eq!(result.unhashed, "");
    }

    #[test]
    fn test_before_and_after_renders_the_apex_as_at() {
        let zone = zone(
            "example.com",
            1,
            vec![
                record("@", RecordType::NS, "ns1.example.com"),
                record("a", RecordType::A, "10.0.0.1"),
            ],
        );
        let result = zone.before_and_after(&name("a.example.com"));
        assert_eq!(result.before, "@");
    }

    #[test]
    fn test_disabled_flag_is_visible_in_the_snapshot() {
        let info = ZoneInfo {
            serial: 1,
            notified_serial: Some(1),
            enabled: false,
            last_check: 0,
        };
        let cached = CachedZone::build(name("example.com"), info, vec![]);
        assert!(!cached.info().enabled);
        assert_eq!(cached.info().notified_serial, Some(1));
    }

    #[test]
    fn test_records_with_invalid_owner_labels_are_skipped() {
        let zone = zone(
            "example.com",
            1,
            vec![
                record("ok", RecordType::A, "10.0.0.1"),
                record("bad..label", RecordType::A, "10.0.0.2"),
            ],
        );
        assert_eq!(zone.record_infos().len(), 2); // SOA + the valid record
    }
}
