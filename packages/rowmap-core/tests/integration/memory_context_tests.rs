//! Behavior of the in-memory reference engine.

use std::sync::Arc;

use ntest::timeout;
use rowmap_core::{
    ArgumentError, ConditionSet, DataContext, DescriptorRegistry, Error, MemoryContext, SortSpec,
};

use uuid::Uuid;

use super::helpers::{
    cities, City, DateStamp, Element, LineItem, Log, Note, SoftDelete, Token,
};

fn context() -> MemoryContext {
    MemoryContext::new(Arc::new(DescriptorRegistry::new()))
}

async fn seeded_cities() -> MemoryContext {
    let ctx = context();
    for city in cities() {
        ctx.create(city).await.unwrap();
    }
    ctx
}

fn names(rows: &[City]) -> Vec<&str> {
    rows.iter().map(|c| c.city_name.as_str()).collect()
}

#[tokio::test]
async fn test_identity_is_max_plus_one() {
    let ctx = seeded_cities().await;
    let all: Vec<City> = ctx.read_all().await.unwrap();
    let ids: Vec<i32> = all.iter().map(|c| c.city_id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());

    ctx.delete::<City>(8).await.unwrap();
    let next = ctx.create(City::new("LEE", "Leeds", "Yorkshire")).await.unwrap();
    assert_eq!(next.city_id, 8);
}

#[tokio::test]
async fn test_sequential_scoped_by_assigned_key() {
    let ctx = context();
    let first = ctx.create(Element::new("Gas", "Helium")).await.unwrap();
    let second = ctx.create(Element::new("Gas", "Neon")).await.unwrap();
    let other = ctx.create(Element::new("Metal", "Iron")).await.unwrap();

    assert_eq!(first.element_id, 1);
    assert_eq!(second.element_id, 2);
    assert_eq!(other.element_id, 1);
}

#[tokio::test]
async fn test_sequential_scoped_by_every_assigned_key() {
    let ctx = context();
    let mut lines = Vec::new();
    for (order_no, part_no) in [(1, 1), (1, 1), (1, 2)] {
        let item = ctx
            .create(LineItem::new(order_no, part_no, "widget"))
            .await
            .unwrap();
        lines.push(item.line);
    }
    assert_eq!(lines, vec![1, 2, 1]);
}

#[tokio::test]
async fn test_guid_key_kept_as_supplied() {
    let ctx = context();
    let id = Uuid::new_v4();
    let token = ctx
        .create(Token {
            token_id: id,
            label: "api".into(),
        })
        .await
        .unwrap();
    assert_eq!(token.token_id, id);

    let read: Option<Token> = ctx.read(id).await.unwrap();
    assert_eq!(read.unwrap().label, "api");
}

#[tokio::test]
async fn test_read_by_composite_key() {
    let ctx = context();
    ctx.create(Element::new("Gas", "Helium")).await.unwrap();
    ctx.create(Element::new("Metal", "Iron")).await.unwrap();

    let iron: Option<Element> = ctx
        .read(ConditionSet::new().with("ElementType", "Metal").with("ElementId", 1))
        .await
        .unwrap();
    assert_eq!(iron.unwrap().name, "Iron");

    let err = ctx.read::<Element>(1).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::ScalarKeyMismatch { .. })));
}

#[tokio::test]
async fn test_paging_metadata() {
    let ctx = seeded_cities().await;

    let first = ctx
        .read_page::<City>(ConditionSet::new(), SortSpec::new(), 4, 1)
        .await
        .unwrap();
    assert_eq!(first.rows.len(), 4);
    assert_eq!(first.total_rows, 8);
    assert_eq!(first.total_pages, 2);
    assert!(!first.has_previous);
    assert!(first.has_next);
    assert_eq!(
        first.rows.iter().map(|c| c.city_id).collect::<Vec<_>>(),
        vec![1, 2, 3, 4]
    );

    let second = ctx
        .read_page::<City>(ConditionSet::new(), SortSpec::new(), 4, 2)
        .await
        .unwrap();
    assert_eq!(second.rows.len(), 4);
    assert!(second.has_previous);
    assert!(!second.has_next);
}

#[tokio::test]
async fn test_paging_with_mixed_sort() {
    let ctx = seeded_cities().await;
    let page = ctx
        .read_page::<City>(
            ConditionSet::new(),
            SortSpec::new().desc("Area").asc("CityName"),
            10,
            1,
        )
        .await
        .unwrap();
    assert_eq!(
        names(&page.rows),
        vec![
            "Bognor Regis",
            "Chichester",
            "Basingstoke",
            "Petersfield",
            "Portsmouth",
            "Southampton",
            "Winchester",
            "Bournemouth"
        ]
    );
    assert_eq!(page.total_pages, 1);
}

#[tokio::test]
async fn test_paging_with_conditions() {
    let ctx = seeded_cities().await;
    let page = ctx
        .read_page::<City>(
            [("Area", "Hampshire")],
            SortSpec::new().desc("CityName"),
            2,
            2,
        )
        .await
        .unwrap();
    assert_eq!(page.total_rows, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(names(&page.rows), vec!["Portsmouth", "Petersfield"]);
}

#[tokio::test]
async fn test_paging_beyond_last_page() {
    let ctx = seeded_cities().await;
    let page = ctx
        .read_page::<City>(ConditionSet::new(), SortSpec::new(), 5, 3)
        .await
        .unwrap();
    assert!(page.rows.is_empty());
    assert_eq!(page.total_rows, 8);
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_read_list_conditions() {
    let ctx = seeded_cities().await;

    let sussex: Vec<City> = ctx.read_list([("Area", "West Sussex")]).await.unwrap();
    assert_eq!(names(&sussex), vec!["Bognor Regis", "Chichester"]);

    let err = ctx.read_list::<City>(ConditionSet::new()).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::EmptyConditions { .. })));

    let err = ctx.read_list::<City>([("County", "Kent")]).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::UnknownField { .. })));
}

#[tokio::test]
async fn test_update_drops_read_only_fields() {
    let ctx = context();
    ctx.seed(vec![Note {
        note_id: 1,
        body: "draft".into(),
        legacy: "archived".into(),
    }])
    .unwrap();

    let updated: Note = ctx
        .update(
            ConditionSet::new()
                .with("NoteId", 1)
                .with("Body", "final")
                .with("Legacy", "overwritten"),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.body, "final");
    assert_eq!(updated.legacy, "archived");

    let err = ctx
        .update::<Note>(ConditionSet::new().with("NoteId", 1).with("Legacy", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::NoUpdateableFields { .. })));
}

#[tokio::test]
async fn test_update_missing_row() {
    let ctx = seeded_cities().await;
    let updated: Option<City> = ctx
        .update(ConditionSet::new().with("CityId", 99).with("CityName", "Nowhere"))
        .await
        .unwrap();
    assert!(updated.is_none());
}

#[tokio::test]
async fn test_date_stamps_on_create_and_update() {
    let ctx = context();
    let created = ctx
        .create(DateStamp {
            name: "alpha".into(),
            value: "1".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let inserted = created.insert_date.unwrap();
    assert_eq!(created.update_date, Some(inserted));

    let updated: DateStamp = ctx
        .update(ConditionSet::new().with("Name", "alpha").with("Value", "2"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.value, "2");
    assert_eq!(updated.insert_date, Some(inserted));
    assert!(updated.update_date.unwrap() >= inserted);
}

#[tokio::test]
async fn test_soft_delete_field_set_on_create() {
    let ctx = context();
    let row = ctx
        .create(SoftDelete {
            name: Some("kept".into()),
            record_status: 7,
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(row.record_status, 1);
    assert_eq!(row.id, 1);
}

#[tokio::test]
async fn test_required_field_rejected() {
    let ctx = context();
    let err = ctx.create(SoftDelete::default()).await.unwrap_err();
    assert!(err.is_argument());
    assert!(ctx.read_all::<SoftDelete>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_is_idempotent() {
    let ctx = seeded_cities().await;
    ctx.delete::<City>(3).await.unwrap();
    ctx.delete::<City>(3).await.unwrap();
    ctx.delete::<City>(99).await.unwrap();

    assert!(ctx.read::<City>(3).await.unwrap().is_none());
    assert_eq!(ctx.read_all::<City>().await.unwrap().len(), 7);
}

#[tokio::test]
async fn test_delete_list() {
    let ctx = seeded_cities().await;
    ctx.delete_list::<City>([("Area", "Hampshire")]).await.unwrap();
    let remaining: Vec<City> = ctx.read_all().await.unwrap();
    assert_eq!(
        names(&remaining),
        vec!["Bognor Regis", "Bournemouth", "Chichester"]
    );

    let err = ctx.delete_list::<City>(ConditionSet::new()).await.unwrap_err();
    assert!(err.is_argument());
}

#[tokio::test]
async fn test_duplicate_keys_are_integrity_errors() {
    let ctx = context();
    let mut twin = City::new("WIN", "Winchester", "Hampshire");
    twin.city_id = 1;
    ctx.seed(vec![twin.clone(), twin]).unwrap();

    let err = ctx.read::<City>(1).await.unwrap_err();
    assert!(matches!(err, Error::DataIntegrity(_)));
}

#[tokio::test]
async fn test_update_reports_every_duplicate() {
    let ctx = context();
    let mut twin = City::new("WIN", "Winchester", "Hampshire");
    twin.city_id = 1;
    ctx.seed(vec![twin.clone(), twin.clone(), twin]).unwrap();

    let err = ctx
        .update::<City>(ConditionSet::new().with("CityId", 1).with("Area", "Dorset"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("matched 3 rows"));

    let all: Vec<City> = ctx.read_all().await.unwrap();
    assert!(all.iter().all(|c| c.area == "Hampshire"));
}

#[tokio::test]
async fn test_keyless_type_keeps_rows_on_key_operations() {
    let ctx = context();
    for message in ["one", "two", "three"] {
        ctx.create(Log::new(message)).await.unwrap();
    }

    let err = ctx.delete::<Log>(ConditionSet::new()).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::NoKeyFields { .. })));

    let err = ctx
        .update::<Log>(ConditionSet::new().with("Message", "rewritten"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::NoKeyFields { .. })));

    let err = ctx.read::<Log>(ConditionSet::new()).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::NoKeyFields { .. })));

    let all: Vec<Log> = ctx.read_all().await.unwrap();
    assert_eq!(
        all.iter().map(|l| l.message.as_str()).collect::<Vec<_>>(),
        vec!["one", "two", "three"]
    );
}

#[tokio::test]
async fn test_key_bag_without_key_fields_keeps_rows() {
    let ctx = seeded_cities().await;

    let err = ctx.delete::<City>([("Area", "Hampshire")]).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::MissingKeyField { .. })));

    let err = ctx.update::<City>([("Area", "Kent")]).await.unwrap_err();
    assert!(matches!(err, Error::Argument(ArgumentError::MissingKeyField { .. })));

    let all: Vec<City> = ctx.read_all().await.unwrap();
    assert_eq!(all.len(), 8);
    assert!(all.iter().all(|c| c.area != "Kent"));
}

#[tokio::test]
async fn test_seed_replaces_rows() {
    let ctx = seeded_cities().await;
    let mut only = City::new("LEE", "Leeds", "Yorkshire");
    only.city_id = 20;
    ctx.seed(vec![only]).unwrap();

    let all: Vec<City> = ctx.read_all().await.unwrap();
    assert_eq!(names(&all), vec!["Leeds"]);
    let next = ctx.create(City::new("YOR", "York", "Yorkshire")).await.unwrap();
    assert_eq!(next.city_id, 21);
}

#[timeout(5000)]
#[test]
fn test_concurrent_creates_get_distinct_identities() {
    let ctx = Arc::new(context());

    std::thread::scope(|scope| {
        for t in 0..4 {
            let ctx = Arc::clone(&ctx);
            scope.spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .build()
                    .unwrap();
                runtime.block_on(async {
                    for i in 0..25 {
                        let code = format!("{t}-{i}");
                        ctx.create(City::new(&code, &code, "Anywhere")).await.unwrap();
                    }
                });
            });
        }
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let mut ids: Vec<i32> = runtime
        .block_on(ctx.read_all::<City>())
        .unwrap()
        .iter()
        .map(|c| c.city_id)
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=100).collect::<Vec<_>>());
}
