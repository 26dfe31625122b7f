//! Unit tests for vendor resolution and bulk cache population.

use super::*;
use crate::fetch::MockFetcher;
use crate::test_utils::{empty_search_page, gzip, registry_block, search_page};
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};

const REGISTRY: &str = "https://registry.test/search?oui=";
const CUSTOM: &str = "https://private.test/oui.txt";
const DUMP: &str = "https://registry.test/oui.txt";

const APPLE: &[&str] = &[
    "Apple Computer, Inc.",
    "20650 Valley Green Dr.",
    "Cupertino CA 95014",
    "UNITED STATES",
];

fn config(custom_source: Option<&str>) -> SourceConfig {
    SourceConfig {
        registry_url: REGISTRY.to_owned(),
        dump_url: DUMP.to_owned(),
        custom_source: custom_source.map(str::to_owned),
        ..SourceConfig::default()
    }
}

fn resolver(custom_source: Option<&str>, fetcher: MockFetcher) -> Resolver {
    Resolver::new(config(custom_source), Arc::new(MemoryCache::new()), fetcher)
}

fn key(value: &str) -> OuiKey {
    normalize(value).expect("valid key")
}

fn apple_record() -> VendorRecord {
    VendorRecord::from(APPLE.iter().map(|line| (*line).to_owned()).collect::<Vec<_>>())
}

fn html(body: String) -> FetchedResource {
    FetchedResource {
        bytes: body.into_bytes(),
        content_type: Some("text/html".to_owned()),
    }
}

/// Counts every call that reaches the wrapped store.
#[derive(Default)]
struct CountingCache {
    inner: MemoryCache,
    puts: AtomicUsize,
    snapshots: AtomicUsize,
}

impl CacheStore for CountingCache {
    fn get(&self, key: &OuiKey) -> Option<VendorRecord> {
        self.inner.get(key)
    }

    fn put(&self, key: OuiKey, record: VendorRecord) {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, record);
    }

    fn snapshot(&self) -> HashMap<OuiKey, VendorRecord> {
        self.snapshots.fetch_add(1, Ordering::SeqCst);
        self.inner.snapshot()
    }
}

/// A sink that rejects every write.
struct FullDisk;

impl Write for FullDisk {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::other("disk full"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn transport_error(url: &str) -> FetchError {
    FetchError::Http {
        url: url.to_owned(),
        reason: "connection reset".to_owned(),
    }
}

#[test]
fn cache_hit_never_touches_the_network() {
    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().never();
    let resolver = resolver(Some(CUSTOM), fetcher);
    resolver.add_to_cache(key("00:03:93"), apple_record());

    let record = resolver.lookup("00:03:93:29:f6:c2").expect("cached record");
    assert_eq!(record, apple_record());
}

#[test]
fn malformed_address_is_rejected_before_any_fetch() {
    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().never();
    let resolver = resolver(Some(CUSTOM), fetcher);

    let err = resolver.lookup("not-a-mac").expect_err("format error");
    assert!(matches!(err, LookupError::Format(_)));
    assert!(resolver.cache().is_empty());
}

#[test]
fn custom_source_answer_skips_the_registry() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(1)
        .returning(|_| Ok(FetchedResource::from_bytes(registry_block("00-03-93", APPLE))));
    let resolver = resolver(Some(CUSTOM), fetcher);

    let record = resolver.lookup("0:3:93").expect("custom record");
    assert_eq!(record, apple_record());
    assert_eq!(resolver.get_from_cache(&key("00-03-93")), Some(apple_record()));
}

#[test]
fn custom_dump_is_searched_for_the_requested_key() {
    let dump = format!(
        "{}\n{}",
        registry_block("00-00-01", &["XEROX CORPORATION"]),
        registry_block("00-03-93", APPLE),
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(1)
        .returning(move |_| Ok(FetchedResource::from_bytes(dump.clone())));
    let resolver = resolver(Some(CUSTOM), fetcher);

    assert_eq!(resolver.lookup("00:03:93").expect("record"), apple_record());
}

#[test]
fn compressed_custom_source_is_decompressed() {
    let gz_url = "https://private.test/oui.txt.gz";
    let payload = gzip(registry_block("00-03-93", APPLE).as_bytes());
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(move |url| url == gz_url)
        .times(1)
        .returning(move |_| Ok(FetchedResource::from_bytes(payload.clone())));
    let resolver = resolver(Some(gz_url), fetcher);

    assert_eq!(resolver.lookup("00:03:93").expect("record"), apple_record());
}

#[test]
fn custom_miss_falls_back_to_the_registry() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(1)
        .returning(|_| {
            Ok(FetchedResource::from_bytes(registry_block(
                "00-00-01",
                &["XEROX CORPORATION"],
            )))
        });
    fetcher
        .expect_fetch()
        .withf(|url| url == format!("{REGISTRY}00-03-93"))
        .times(1)
        .returning(|_| Ok(html(search_page(&registry_block("00-03-93", APPLE)))));
    let resolver = resolver(Some(CUSTOM), fetcher);

    assert_eq!(resolver.lookup("00:03:93").expect("record"), apple_record());
}

#[test]
fn custom_transport_failure_falls_back_to_the_registry() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(1)
        .returning(|url| Err(transport_error(url)));
    fetcher
        .expect_fetch()
        .withf(|url| url.starts_with(REGISTRY))
        .times(1)
        .returning(|_| Ok(html(search_page(&registry_block("00-03-93", APPLE)))));
    let resolver = resolver(Some(CUSTOM), fetcher);

    assert_eq!(resolver.lookup("00:03:93").expect("record"), apple_record());
}

#[test]
fn headerless_custom_text_for_another_key_is_ignored() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(2)
        .returning(|_| {
            Ok(FetchedResource::from_bytes(
                b"Service temporarily unavailable\nTry again later\n".to_vec(),
            ))
        });
    fetcher
        .expect_fetch()
        .withf(|url| url.starts_with(REGISTRY))
        .times(2)
        .returning(|_| Ok(html(empty_search_page())));
    let resolver = resolver(Some(CUSTOM), fetcher);

    for mac in ["00:03:93", "00:00:01"] {
        let err = resolver.lookup(mac).expect_err("no data");
        assert!(err.is_not_found(), "unexpected error: {err}");
    }
    assert!(resolver.cache().is_empty());
}

#[test]
fn headerless_custom_record_naming_the_key_is_accepted() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(1)
        .returning(|_| {
            Ok(FetchedResource::from_bytes(
                b"000393     (base 16)\t\tApple Computer, Inc.\n000393     (base 16)\t\tApple Computer, Inc.\n\t\t\t\tCupertino CA 95014\n".to_vec(),
            ))
        });
    let resolver = resolver(Some(CUSTOM), fetcher);

    let record = resolver.lookup("00:03:93").expect("custom record");
    assert_eq!(record.lines(), ["Apple Computer, Inc.", "Cupertino CA 95014"]);
}

#[test]
fn registry_answer_is_written_through() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == format!("{REGISTRY}00-03-93"))
        .times(1)
        .returning(|_| Ok(html(search_page(&registry_block("00-03-93", APPLE)))));
    let resolver = resolver(None, fetcher);

    assert_eq!(resolver.lookup("00-03-93").expect("first lookup"), apple_record());
    assert_eq!(resolver.lookup("0:3:93").expect("second lookup"), apple_record());
}

#[rstest]
#[case::empty_page(Ok(html(empty_search_page())))]
#[case::other_oui(Ok(html(search_page(&registry_block("00-00-01", &["XEROX"])))))]
#[case::http_404(Err(FetchError::NotFound { url: REGISTRY.to_owned() }))]
fn registry_without_data_is_not_found(#[case] response: std::result::Result<FetchedResource, FetchError>) {
    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().times(1).return_once(move |_| response);
    let resolver = resolver(None, fetcher);

    let err = resolver.lookup("00:03:93").expect_err("no data");
    assert!(err.is_not_found(), "unexpected error: {err}");
    assert!(resolver.cache().is_empty());
}

#[test]
fn transport_failure_is_reported_and_never_cached() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(2)
        .returning(|url| Err(transport_error(url)));
    let resolver = resolver(None, fetcher);

    for _ in 0..2 {
        let err = resolver.lookup("00:03:93").expect_err("network failure");
        assert!(matches!(err, LookupError::Network { .. }), "unexpected error: {err}");
    }
    assert!(resolver.cache().is_empty());
}

#[test]
fn custom_transport_failure_wins_over_registry_miss() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == CUSTOM)
        .times(1)
        .returning(|url| Err(transport_error(url)));
    fetcher
        .expect_fetch()
        .withf(|url| url.starts_with(REGISTRY))
        .times(1)
        .returning(|_| Ok(html(empty_search_page())));
    let resolver = resolver(Some(CUSTOM), fetcher);

    let err = resolver.lookup("00:03:93").expect_err("no answer");
    assert!(matches!(err, LookupError::Network { .. }), "unexpected error: {err}");
}

#[test]
fn corrupt_custom_payload_surfaces_when_registry_is_empty() {
    let gz_url = "https://private.test/oui.txt.gz";
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(move |url| url == gz_url)
        .times(1)
        .returning(|_| Ok(FetchedResource::from_bytes(b"not gzip at all".to_vec())));
    fetcher
        .expect_fetch()
        .withf(|url| url.starts_with(REGISTRY))
        .times(1)
        .returning(|_| Ok(html(empty_search_page())));
    let resolver = resolver(Some(gz_url), fetcher);

    let err = resolver.lookup("00:03:93").expect_err("corrupt payload");
    assert!(matches!(err, LookupError::UnsupportedEncoding(_)), "unexpected error: {err}");
}

#[test]
fn bulk_load_populates_cache_for_offline_lookups() {
    let dump = format!(
        "OUI/MA-L\t\t\tOrganization\ncompany_id\t\t\tOrganization\n\t\t\t\tAddress\n\n{}\n{}",
        registry_block("00-03-93", APPLE),
        registry_block("00-0D-93", &["Apple Computer", "1 Infinite Loop"]),
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(|url| url == DUMP)
        .times(1)
        .returning(move |_| Ok(FetchedResource::from_bytes(dump.clone())));
    let resolver = resolver(Some(CUSTOM), fetcher);

    let outcome = resolver.load_cache(None, None);
    assert_eq!(outcome, LoadOutcome::Loaded { count: 2, skipped: 0 });
    assert_eq!(resolver.lookup("00:03:93:aa:bb:cc").expect("cached"), apple_record());
    assert_eq!(resolver.cache_snapshot().len(), 2);
}

#[test]
fn bulk_load_skips_malformed_records() {
    let dump = format!(
        "{}\n00-00-02   (hex)\n\n{}",
        registry_block("00-00-01", &["XEROX CORPORATION"]),
        registry_block("00-03-93", APPLE),
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .returning(move |_| Ok(FetchedResource::from_bytes(dump.clone())));
    let resolver = resolver(None, fetcher);

    let outcome = resolver.load_cache(None, None);
    assert_eq!(outcome, LoadOutcome::Loaded { count: 2, skipped: 1 });
    assert!(resolver.get_from_cache(&key("00-00-02")).is_none());
}

#[test]
fn bulk_load_decompresses_and_keeps_raw_bytes() {
    let source = "https://mirror.test/oui.txt.gz";
    let payload = gzip(registry_block("00-03-93", APPLE).as_bytes());
    let expected_raw = payload.clone();
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .withf(move |url| url == source)
        .times(1)
        .returning(move |_| Ok(FetchedResource::from_bytes(payload.clone())));
    let resolver = resolver(None, fetcher);

    let mut sink = Vec::new();
    let outcome = resolver.load_cache(Some(source), Some(&mut sink));
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1, skipped: 0 });
    assert_eq!(sink, expected_raw);
    assert_eq!(resolver.get_from_cache(&key("00-03-93")), Some(apple_record()));
}

#[test]
fn bulk_load_survives_a_failing_sink() {
    let dump = registry_block("00-03-93", APPLE);
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move |_| Ok(FetchedResource::from_bytes(dump.clone())));
    let resolver = resolver(None, fetcher);

    let mut sink = FullDisk;
    let outcome = resolver.load_cache(None, Some(&mut sink));
    assert_eq!(outcome, LoadOutcome::Loaded { count: 1, skipped: 0 });
    assert_eq!(resolver.get_from_cache(&key("00-03-93")), Some(apple_record()));
}

#[test]
fn bulk_load_inserts_each_record_separately() {
    let dump = format!(
        "{}\n{}\n{}",
        registry_block("00-00-01", &["XEROX CORPORATION"]),
        registry_block("00-03-93", APPLE),
        registry_block("00-0D-93", &["Apple Computer"]),
    );
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(move |_| Ok(FetchedResource::from_bytes(dump.clone())));
    let cache = Arc::new(CountingCache::default());
    let resolver = Resolver::new(config(None), Arc::clone(&cache) as Arc<dyn CacheStore>, fetcher);

    let outcome = resolver.load_cache(None, None);
    assert_eq!(outcome, LoadOutcome::Loaded { count: 3, skipped: 0 });
    assert_eq!(cache.puts.load(Ordering::SeqCst), 3);
    assert_eq!(cache.snapshots.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case::transport(Err(transport_error(DUMP)), "fetch failed")]
#[case::missing(Err(FetchError::NotFound { url: DUMP.to_owned() }), "not found")]
fn bulk_load_fetch_failure_is_not_fatal(
    #[case] response: std::result::Result<FetchedResource, FetchError>,
    #[case] expected_reason: &str,
) {
    let mut fetcher = MockFetcher::new();
    fetcher.expect_fetch().times(1).return_once(move |_| response);
    let resolver = resolver(None, fetcher);

    match resolver.load_cache(None, None) {
        LoadOutcome::Unavailable { reason } => {
            assert!(reason.contains(expected_reason), "reason: {reason}");
        }
        other => panic!("expected Unavailable, got {other:?}"),
    }
    assert!(resolver.cache().is_empty());
}

#[test]
fn bulk_load_corrupt_dump_is_not_fatal() {
    let mut fetcher = MockFetcher::new();
    fetcher
        .expect_fetch()
        .times(1)
        .returning(|_| Ok(FetchedResource::from_bytes(b"\x00\x01garbage".to_vec())));
    let resolver = resolver(None, fetcher);

    let outcome = resolver.load_cache(Some("https://mirror.test/oui.txt.bz2"), None);
    assert!(
        matches!(outcome, LoadOutcome::Unavailable { ref reason } if reason.contains("bzip2")),
        "unexpected outcome: {outcome:?}"
    );
}
