//! Entry store behavior against an in-process fake Neocities site.

use std::sync::Arc;
use std::time::Duration;

use gb_config::{NeocitiesConfig, ReadPolicy};
use gb_core::{Scene, Spots};
use gb_store::{NeocitiesStore, StoreError};
use gb_test_utils::{FakeNeocities, TEST_API_KEY};
use pretty_assertions::assert_eq;

const TWO_ENTRIES: &str = r#"[
  {
    "id": "entry-1700000000000",
    "createdAt": 1700000000000,
    "spot1": "legacy",
    "spot2": "",
    "spot3": ""
  },
  {
    "id": "entry-c-1700000000500",
    "scene": "c",
    "createdAt": 1700000000500,
    "spot1": "sunset",
    "spot2": "tacos",
    "spot3": "ocean breeze"
  }
]"#;

fn store(config: &NeocitiesConfig) -> NeocitiesStore {
    NeocitiesStore::new(config).expect("store builds")
}

fn strict(fake: &FakeNeocities) -> NeocitiesStore {
    store(&NeocitiesConfig {
        read_policy: ReadPolicy::Strict,
        ..fake.config()
    })
}

// ---------------------------------------------------------------------------
// load_all policy table
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_document_loads_empty() {
    let fake = FakeNeocities::start();
    let collection = strict(&fake).load_all().await.unwrap();
    assert!(collection.is_empty());
    assert_eq!(fake.fetch_count(), 1);
}

#[tokio::test]
async fn array_document_is_parsed() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);

    let collection = store(&fake.config()).load_all().await.unwrap();
    assert_eq!(collection.len(), 2);
    assert_eq!(collection.scene_view(Scene::C)[0].spot2, "tacos");
    assert_eq!(collection.scene_view(Scene::A)[0].spot1, "legacy");
}

#[tokio::test]
async fn empty_body_loads_empty() {
    let fake = FakeNeocities::start();
    fake.set_document("");
    assert!(strict(&fake).load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn non_array_document_loads_empty_under_both_policies() {
    let fake = FakeNeocities::start();
    fake.set_document(r#"{"entries":[]}"#);
    assert!(strict(&fake).load_all().await.unwrap().is_empty());
    assert!(store(&fake.config()).load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_json_depends_on_policy() {
    let fake = FakeNeocities::start();
    fake.set_document("[{\"id\": \"entry-1\",");

    assert!(store(&fake.config()).load_all().await.unwrap().is_empty());
    let err = strict(&fake).load_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Parse(_)));
}

#[tokio::test]
async fn server_error_depends_on_policy() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);
    fake.fail_fetch_with(500);

    assert!(store(&fake.config()).load_all().await.unwrap().is_empty());
    let err = strict(&fake).load_all().await.unwrap_err();
    assert!(matches!(err, StoreError::Upstream { status: 500, .. }));
}

#[tokio::test]
async fn network_failure_loads_empty_even_when_strict() {
    // Nothing listens on the discard port.
    let config = NeocitiesConfig {
        site_url: "http://127.0.0.1:9".into(),
        read_policy: ReadPolicy::Strict,
        timeout_secs: 2,
        ..NeocitiesConfig::default()
    };
    assert!(store(&config).load_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn slow_upstream_times_out_to_empty() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);
    fake.delay_fetches(Duration::from_secs(3));

    let config = NeocitiesConfig {
        timeout_secs: 1,
        ..fake.config()
    };
    assert!(store(&config).load_all().await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// replace_all
// ---------------------------------------------------------------------------

#[tokio::test]
async fn replace_all_round_trip_is_byte_stable() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);
    let store = store(&fake.config());

    let loaded = store.load_all().await.unwrap();
    store.replace_all(&loaded).await.unwrap();

    assert_eq!(fake.document().as_deref(), Some(TWO_ENTRIES));
    assert_eq!(fake.last_upload_field().as_deref(), Some("data/a_entries.json"));
    assert_eq!(
        fake.last_authorization(),
        Some(format!("Bearer {TEST_API_KEY}"))
    );
}

#[tokio::test]
async fn replace_all_uses_basic_auth_without_api_key() {
    let fake = FakeNeocities::start();
    let config = NeocitiesConfig {
        api_key: String::new(),
        user: "forest".into(),
        password: "moss".into(),
        ..fake.config()
    };
    store(&config)
        .replace_all(&gb_core::EntryCollection::new())
        .await
        .unwrap();

    let auth = fake.last_authorization().unwrap();
    assert!(auth.starts_with("Basic "), "{auth}");
    assert_eq!(fake.document().as_deref(), Some("[]"));
}

#[tokio::test]
async fn replace_all_without_credentials_never_reaches_upstream() {
    let fake = FakeNeocities::start();
    let err = store(&fake.config_without_credentials())
        .replace_all(&gb_core::EntryCollection::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Auth(_)));
    assert_eq!(fake.upload_count(), 0);
}

#[tokio::test]
async fn rejected_credentials_are_auth_errors() {
    let fake = FakeNeocities::start();
    fake.reply_to_upload_with(
        200,
        r#"{"result":"error","error_type":"invalid_auth","message":"invalid credentials"}"#,
    );
    let err = store(&fake.config())
        .replace_all(&gb_core::EntryCollection::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Auth(ref m) if m == "invalid credentials"));
}

#[tokio::test]
async fn other_upload_rejections_are_upload_errors() {
    let fake = FakeNeocities::start();
    fake.reply_to_upload_with(500, "oops");
    let err = store(&fake.config())
        .replace_all(&gb_core::EntryCollection::new())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Upload(_)));
    assert!(fake.document().is_none());
}

#[tokio::test]
async fn staging_file_mirrors_upload() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);
    let dir = tempfile::tempdir().unwrap();
    let staging = dir.path().join("stage/entries.json");
    let config = NeocitiesConfig {
        staging_path: staging.to_string_lossy().into_owned(),
        ..fake.config()
    };
    let store = store(&config);

    let loaded = store.load_all().await.unwrap();
    store.replace_all(&loaded).await.unwrap();

    assert_eq!(std::fs::read_to_string(&staging).unwrap(), TWO_ENTRIES);
}

// ---------------------------------------------------------------------------
// modify
// ---------------------------------------------------------------------------

#[tokio::test]
async fn modify_appends_to_existing_document() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);
    let store = store(&fake.config());

    let (entry, total) = store
        .modify(|c| (c.append(Scene::C, Spots::new("x", "y", "z"), 1_800_000_000_000), c.len()))
        .await
        .unwrap();

    assert_eq!(total, 3);
    assert_eq!(entry.id, "entry-c-1800000000000");
    let doc = fake.document_json();
    assert_eq!(doc.as_array().unwrap().len(), 3);
    assert_eq!(doc[2]["spot1"], "x");
}

#[tokio::test]
async fn modify_refuses_to_overwrite_unreadable_document() {
    let fake = FakeNeocities::start();
    fake.set_document(TWO_ENTRIES);
    fake.fail_fetch_with(502);
    // Lenient reads must not leak into the write path.
    let store = store(&fake.config());

    let err = store
        .modify(|c| c.append(Scene::A, Spots::default(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Upstream { status: 502, .. }));
    assert_eq!(fake.upload_count(), 0);
    assert_eq!(fake.document().as_deref(), Some(TWO_ENTRIES));
}

#[tokio::test]
async fn modify_refuses_to_overwrite_non_array_document() {
    let fake = FakeNeocities::start();
    fake.set_document(r#"{"not":"an array"}"#);
    let err = store(&fake.config())
        .modify(|c| c.append(Scene::A, Spots::default(), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnexpectedShape("object")));
    assert_eq!(fake.upload_count(), 0);
}

#[tokio::test]
async fn modify_keeps_unknown_records() {
    let fake = FakeNeocities::start();
    fake.set_document(r#"[{"note":"hand edited"}]"#);
    store(&fake.config())
        .modify(|c| c.append(Scene::B, Spots::default(), 5))
        .await
        .unwrap();

    let doc = fake.document_json();
    assert_eq!(doc[0]["note"], "hand edited");
    assert_eq!(doc[1]["id"], "entry-b-5");
}

#[tokio::test]
async fn overlapping_modifies_both_survive() {
    let fake = FakeNeocities::start();
    // Long enough that unserialized cycles would both read the empty document.
    fake.delay_fetches(Duration::from_millis(200));
    let store = Arc::new(store(&fake.config()));

    let first = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .modify(|c| c.append(Scene::E, Spots::new("first", "", ""), 10))
                .await
        })
    };
    let second = {
        let store = Arc::clone(&store);
        tokio::spawn(async move {
            store
                .modify(|c| c.append(Scene::E, Spots::new("second", "", ""), 10))
                .await
        })
    };
    let first = first.await.unwrap().unwrap();
    let second = second.await.unwrap().unwrap();

    assert_ne!(first.id, second.id);
    let final_doc = store.load_all().await.unwrap();
    let spots: Vec<_> = final_doc
        .scene_view(Scene::E)
        .into_iter()
        .map(|e| e.spot1)
        .collect();
    assert_eq!(spots.len(), 2);
    assert!(spots.contains(&"first".to_string()));
    assert!(spots.contains(&"second".to_string()));
}

#[tokio::test]
async fn modify_leaves_existing_entries_untouched() {
    let fake = FakeNeocities::start();
    fake.set_document(
        r#"[{"id":"entry-5","createdAt":5,"spot1":"only"},{"id":"entry-a-6","scene":"a","createdAt":6,"spot1":"x","spot2":"y","spot3":"z","mood":"keep me"}]"#,
    );
    store(&fake.config())
        .modify(|c| c.append(Scene::C, Spots::new("p", "q", "r"), 7))
        .await
        .unwrap();

    let doc = fake.document_json();
    assert_eq!(
        doc[0],
        serde_json::json!({"id": "entry-5", "createdAt": 5, "spot1": "only"})
    );
    assert_eq!(doc[1]["mood"], "keep me");
    assert_eq!(doc[2]["id"], "entry-c-7");
}
