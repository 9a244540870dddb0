//! Contract Test: Partial Probe Failure
//!
//! Constraints verified:
//! - With only IPv4 probed, AAAA entries are skipped and left untouched
//! - A entries proceed normally in the same run
//! - With neither family probed, the run aborts before any provider call

mod common;

use cfddns_core::config::{Domain, Host, IpFamily};
use cfddns_core::store::MemoryConfigStore;
use cfddns_core::{Error, RecordOutcome, SkipReason};
use common::*;

fn dual_stack_config() -> cfddns_core::Configuration {
    config_with(vec![
        Domain::new("example.com").with_id("z1").with_host(
            Host::new("www")
                .with_id("r1")
                .with_type("A")
                .with_type("AAAA")
                .with_stored(IpFamily::V6, "2001:db8::1"),
        ),
    ])
}

#[tokio::test]
async fn ipv4_only_skips_aaaa_and_updates_a() {
    let provider = scenario_provider();
    let store = MemoryConfigStore::new(dual_stack_config());
    let engine = engine(StaticIpSource::v4("1.2.3.4"), &provider, &store);

    let report = engine.run_once().await.expect("run succeeds");

    let upserts = provider.upserts();
    assert_eq!(upserts.len(), 1);
    assert_eq!(upserts[0].content, "1.2.3.4");

    let aaaa = report
        .records
        .iter()
        .find(|r| r.record_type.as_deref() == Some("AAAA"))
        .expect("AAAA reported");
    assert_eq!(
        aaaa.outcome,
        RecordOutcome::Skipped(SkipReason::AddressUnavailable(IpFamily::V6))
    );

    let stored = store.snapshot().await.expect("document stored");
    let host = &stored.domains[0].hosts[0];
    assert_eq!(host.stored_address(IpFamily::V4), Some("1.2.3.4"));
    assert_eq!(host.stored_address(IpFamily::V6), Some("2001:db8::1"));
}

#[tokio::test]
async fn ipv6_only_skips_a() {
    let provider = scenario_provider();
    let store = MemoryConfigStore::new(dual_stack_config());
    let engine = engine(
        StaticIpSource::new(None, Some("2001:db8::2")),
        &provider,
        &store,
    );

    let report = engine.run_once().await.expect("run succeeds");

    assert_eq!(report.updated(), 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(provider.upserts()[0].content, "2001:db8::2");

    let stored = store.snapshot().await.expect("document stored");
    assert_eq!(stored.domains[0].hosts[0].ipv4, None);
}

#[tokio::test]
async fn no_address_at_all_is_fatal() {
    let provider = scenario_provider();
    let store = MemoryConfigStore::new(scenario_config());
    let ip_source = StaticIpSource::new(None, None);
    let engine = engine(ip_source, &provider, &store);

    let err = engine.run_once().await.unwrap_err();

    assert!(matches!(err, Error::NoAddress));
    assert_eq!(provider.list_zones_count(), 0);
    assert_eq!(provider.upsert_count(), 0);
    assert_eq!(store.persist_count(), 0);
}
