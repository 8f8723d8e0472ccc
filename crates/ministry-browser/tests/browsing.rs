use ministry_browser::{
    apply, export_table, matches, summarize, ColumnSpec, FilterSpec, Predicate, RecordBrowser,
    ScrollLock, SortKey,
};
use ministry_records::{PartnershipStatus, Record, RecordId, RecordKind};
use ministry_store::MemoryStore;
use ministry_test_utils::{
    create_gallery_image, create_partnership, parse_csv, sample_donations, sample_gallery,
    sample_partnerships,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::sync::Arc;

async fn loaded(
    kind: RecordKind,
    records: Vec<Record>,
    lock: &ScrollLock,
) -> RecordBrowser<MemoryStore> {
    let store = Arc::new(MemoryStore::with_records(kind, records));
    let browser = RecordBrowser::new(store, lock.clone());
    browser.refresh().await.unwrap();
    browser
}

#[tokio::test]
async fn lightbox_wraps_over_filtered_subset() {
    let lock = ScrollLock::new();
    let browser = loaded(RecordKind::Gallery, sample_gallery(), &lock).await;
    browser.set_filter(FilterSpec::default().with_category(Predicate::parse("worship")));

    assert!(browser.open(&RecordId::new("g1")));
    assert!(lock.is_locked());
    assert_eq!(browser.next().map(|r| r.id.to_string()), Some("g4".to_string()));
    assert_eq!(browser.next().map(|r| r.id.to_string()), Some("g1".to_string()));
    assert_eq!(browser.previous().map(|r| r.id.to_string()), Some("g4".to_string()));

    browser.close();
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn hidden_records_cannot_be_opened() {
    let lock = ScrollLock::new();
    let browser = loaded(RecordKind::Gallery, sample_gallery(), &lock).await;
    browser.set_filter(FilterSpec::default().with_category(Predicate::parse("outreach")));

    assert!(!browser.open(&RecordId::new("g4")));
    assert!(browser.focused().is_none());
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn filter_change_closes_overlay_and_releases_scroll() {
    let lock = ScrollLock::new();
    let browser = loaded(RecordKind::Gallery, sample_gallery(), &lock).await;
    assert!(browser.open(&RecordId::new("g2")));

    browser.set_filter(FilterSpec::default().with_query("choir"));
    assert!(browser.view().focused.is_none());
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn dropping_browser_releases_scroll() {
    let lock = ScrollLock::new();
    {
        let browser = loaded(RecordKind::Gallery, sample_gallery(), &lock).await;
        browser.open(&RecordId::new("g3"));
        assert!(lock.is_locked());
    }
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn two_browsers_share_one_lock() {
    let lock = ScrollLock::new();
    let gallery = loaded(RecordKind::Gallery, sample_gallery(), &lock).await;
    let requests = loaded(RecordKind::Partnership, sample_partnerships(), &lock).await;

    gallery.open(&RecordId::new("g1"));
    requests.open(&RecordId::new("p1"));
    gallery.close();
    assert!(lock.is_locked());
    requests.close();
    assert!(!lock.is_locked());
}

#[tokio::test]
async fn stats_ignore_the_filter() {
    let lock = ScrollLock::new();
    let browser = loaded(RecordKind::Donation, sample_donations(), &lock).await;
    let before = browser.stats();

    browser.set_filter(FilterSpec::default().with_status(Predicate::parse("failed")));
    assert_eq!(browser.view().visible.len(), 1);
    assert_eq!(browser.stats(), before);
    assert_eq!(before.total, 4);
    assert_eq!(before.received("NGN"), 750_000);
}

#[tokio::test]
async fn export_round_trips_visible_subset() {
    let lock = ScrollLock::new();
    let browser = loaded(RecordKind::Gallery, sample_gallery(), &lock).await;
    browser.set_filter(FilterSpec::default().with_category(Predicate::parse("events")));

    let columns = vec![
        ColumnSpec::new("Title", "title"),
        ColumnSpec::new("Category", "category"),
        ColumnSpec::new("Description", "description"),
    ];
    let csv = browser.export_visible(&columns);
    assert!(csv.ends_with("\r\n"));
    assert_eq!(
        parse_csv(&csv),
        vec![
            vec!["Title".to_string(), "Category".to_string(), "Description".to_string()],
            vec!["Event, \"Grand\" Opening".to_string(), "events".to_string(), String::new()],
        ]
    );
}

#[test]
fn partnership_export_flattens_nested_fields() {
    let records = sample_partnerships();
    let columns = ColumnSpec::defaults_for(RecordKind::Partnership);
    let rows = parse_csv(&export_table(&records, &columns));
    assert_eq!(rows.len(), records.len() + 1);
    assert!(rows.iter().all(|row| row.len() == columns.len()));
    let status = columns.iter().position(|c| c.field == "status").unwrap();
    assert_eq!(rows[1][status], PartnershipStatus::Pending.as_str());
}

#[test]
fn multiline_values_survive_export() {
    let mut image = create_gallery_image("m", "Night vigil", "prayer", 1);
    if let ministry_records::RecordBody::Gallery(g) = &mut image.body {
        g.description = Some("  first line\nsecond, line ".to_string());
    }
    let columns = vec![ColumnSpec::new("Description", "description")];
    let rows = parse_csv(&export_table([&image], &columns));
    assert_eq!(rows[1][0], "  first line\nsecond, line ");
}

/// Records of mixed kinds with repeating titles, categories and days
fn arb_records() -> impl Strategy<Value = Vec<Record>> {
    let row = (
        any::<bool>(),
        "[A-Da-d ]{1,8}",
        prop::sample::select(vec!["worship", "events", "outreach"]),
        prop::sample::select(PartnershipStatus::ALL.to_vec()),
        0..4i64,
    );
    prop::collection::vec(row, 0..16).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (image, title, category, status, day))| {
                let id = format!("r{i}");
                if image {
                    create_gallery_image(&id, &title, category, day)
                } else {
                    create_partnership(&id, &title, status, day)
                }
            })
            .collect()
    })
}

fn arb_predicate(values: &'static [&'static str]) -> impl Strategy<Value = Predicate> {
    prop::sample::select(values).prop_map(Predicate::parse)
}

fn arb_sort() -> impl Strategy<Value = Option<SortKey>> {
    prop_oneof![
        Just(None),
        Just(Some(SortKey::Newest)),
        Just(Some(SortKey::Oldest)),
        Just(Some(SortKey::Title)),
    ]
}

/// A substring of some record's title, or a free query when there are none
fn arb_query(records: &[Record]) -> BoxedStrategy<String> {
    let titles: Vec<String> = records.iter().map(|r| r.title().to_string()).collect();
    if titles.is_empty() {
        return "[a-d]{0,3}".boxed();
    }
    (
        prop::sample::select(titles),
        any::<prop::sample::Index>(),
        any::<prop::sample::Index>(),
    )
        .prop_map(|(title, a, b)| {
            let (a, b) = (a.index(title.len() + 1), b.index(title.len() + 1));
            title[a.min(b)..a.max(b)].to_uppercase()
        })
        .boxed()
}

fn arb_case() -> impl Strategy<Value = (Vec<Record>, FilterSpec)> {
    arb_records().prop_flat_map(|records| {
        let spec = (
            arb_query(&records),
            arb_predicate(&["all", "worship", "events", "tithe"]),
            arb_predicate(&["all", "pending", "under_review", "approved", "success"]),
            arb_sort(),
        )
            .prop_map(|(query, category, status, sort)| FilterSpec {
                query,
                category,
                status,
                sort,
            });
        (Just(records), spec)
    })
}

/// Comparable form of the field `key` orders by
fn sort_value(record: &Record, key: SortKey) -> (i64, String) {
    let at = record.created_at.timestamp();
    match key {
        SortKey::Newest => (-at, String::new()),
        SortKey::Oldest => (at, String::new()),
        SortKey::Title => (0, record.title().to_lowercase()),
    }
}

fn position(records: &[Record], id: &RecordId) -> usize {
    records.iter().position(|r| &r.id == id).unwrap()
}

proptest! {
    #[test]
    fn filtering_selects_exactly_the_matches((records, spec) in arb_case()) {
        let out = apply(&records, &spec);
        prop_assert_eq!(&out, &apply(&records, &spec));
        let mut expected: Vec<&Record> = records.iter().filter(|r| matches(r, &spec)).collect();
        let mut got: Vec<&Record> = out.iter().collect();
        expected.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        got.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        prop_assert_eq!(got, expected);
    }

    #[test]
    fn query_keeps_the_record_it_came_from((records, spec) in arb_case()) {
        let spec = FilterSpec::default().with_query(spec.query);
        let needle = spec.query.trim().to_lowercase();
        let out = apply(&records, &spec);
        for record in &records {
            if record.title().to_lowercase().contains(&needle) {
                prop_assert!(out.contains(record), "{} lost for {:?}", record.id, spec.query);
            }
        }
    }

    #[test]
    fn unsorted_filtering_preserves_input_order((records, spec) in arb_case()) {
        let spec = FilterSpec { sort: None, ..spec };
        let positions: Vec<usize> = apply(&records, &spec)
            .iter()
            .map(|r| position(&records, &r.id))
            .collect();
        prop_assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sorting_is_ordered_and_stable(
        (records, spec) in arb_case(),
        key in prop_oneof![Just(SortKey::Newest), Just(SortKey::Oldest), Just(SortKey::Title)]
    ) {
        let spec = FilterSpec { sort: Some(key), ..spec };
        let out = apply(&records, &spec);
        for pair in out.windows(2) {
            let (a, b) = (sort_value(&pair[0], key), sort_value(&pair[1], key));
            prop_assert!(a <= b);
            if a == b {
                prop_assert!(position(&records, &pair[0].id) < position(&records, &pair[1].id));
            }
        }
    }

    #[test]
    fn identity_spec_returns_input(records in arb_records()) {
        prop_assert_eq!(apply(&records, &FilterSpec::default()), records);
    }

    #[test]
    fn stats_do_not_depend_on_order(records in arb_records()) {
        let mut reversed = records.clone();
        reversed.reverse();
        prop_assert_eq!(summarize(&records), summarize(&reversed));
        prop_assert_eq!(summarize(&records).total, records.len());
    }
}
