mod common;

use anyhow::Result;
use serde_json::{json, Map, Value};

use common::{test_config, FakeRemote};
use worksite_api::config::StorageMode;
use worksite_api::table::{formula, ListParams, TableClient, TableError};

fn client_for(remote: &FakeRemote) -> Result<TableClient> {
    let config = test_config(StorageMode::Remote, Some(&remote.api_url));
    Ok(TableClient::new(&config.remote)?)
}

fn fields(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn list_follows_offset_cursor() -> Result<()> {
    let remote = FakeRemote::start().await?;
    remote.set_page_size(2);
    for name in ["A", "B", "C", "D", "E"] {
        remote.insert_raw("Locations", json!({ "Name": name }));
    }
    let client = client_for(&remote)?;

    let records = client.list("Locations", &ListParams::default()).await?;

    let names: Vec<&str> = records
        .iter()
        .filter_map(|r| r.fields.get("Name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["A", "B", "C", "D", "E"]);
    assert_eq!(remote.requests().iter().filter(|r| *r == "GET Locations").count(), 3);

    Ok(())
}

#[tokio::test]
async fn filter_formula_escapes_quotes() -> Result<()> {
    let remote = FakeRemote::start().await?;
    remote.insert_raw("Locations", json!({ "Name": "O'Hare", "Slug": "o-hare" }));
    remote.insert_raw("Locations", json!({ "Name": "Midway", "Slug": "midway" }));
    let client = client_for(&remote)?;

    let params = ListParams::filter(formula::field_equals("Name", "O'Hare"));
    let records = client.list("Locations", &params).await?;

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].fields["Slug"], "o-hare");

    Ok(())
}

#[tokio::test]
async fn table_names_with_spaces_round_trip() -> Result<()> {
    let remote = FakeRemote::start().await?;
    let client = client_for(&remote)?;

    let created = client
        .create("Job Categories", &fields(json!({ "Name": "Plumbing", "Slug": "plumbing" })))
        .await?;
    assert!(!created.id.is_empty());

    let fetched = client.get("Job Categories", &created.id).await?;
    assert_eq!(fetched.fields["Name"], "Plumbing");
    assert_eq!(remote.records("Job Categories").len(), 1);

    Ok(())
}

#[tokio::test]
async fn patch_merges_and_put_replaces() -> Result<()> {
    let remote = FakeRemote::start().await?;
    let id = remote.insert_raw("Locations", json!({ "Name": "Main", "Slug": "main", "Status": "active" }));
    let client = client_for(&remote)?;

    let patched = client
        .update("Locations", &id, &fields(json!({ "Status": "inactive" })), true)
        .await?;
    assert_eq!(patched.fields["Name"], "Main");
    assert_eq!(patched.fields["Status"], "inactive");

    let replaced = client
        .update("Locations", &id, &fields(json!({ "Name": "Annex" })), false)
        .await?;
    assert_eq!(replaced.fields["Name"], "Annex");
    assert!(replaced.fields.get("Slug").is_none());

    Ok(())
}

#[tokio::test]
async fn missing_record_is_not_found() -> Result<()> {
    let remote = FakeRemote::start().await?;
    let client = client_for(&remote)?;

    let err = client.get("Locations", "recMissing").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    let err = client.delete("Locations", "recMissing").await.unwrap_err();
    assert!(err.is_not_found(), "unexpected error: {err}");

    Ok(())
}

#[tokio::test]
async fn api_error_body_is_parsed() -> Result<()> {
    let remote = FakeRemote::start().await?;
    remote.set_fail_writes(true);
    let client = client_for(&remote)?;

    let err = client
        .create("Locations", &fields(json!({ "Name": "Nope" })))
        .await
        .unwrap_err();

    match err {
        TableError::Api { status, kind, message } => {
            assert_eq!(status, 500);
            assert_eq!(kind, "SERVER_ERROR");
            assert_eq!(message, "write rejected");
        }
        other => panic!("expected Api error, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn wrong_api_key_is_rejected() -> Result<()> {
    let remote = FakeRemote::start().await?;
    let mut config = test_config(StorageMode::Remote, Some(&remote.api_url));
    config.remote.api_key = "someone-else".to_string();
    let client = TableClient::new(&config.remote)?;

    let err = client.list("Locations", &ListParams::default()).await.unwrap_err();
    assert!(matches!(err, TableError::Api { status: 401, .. }), "unexpected error: {err}");

    Ok(())
}

#[tokio::test]
async fn bulk_delete_limits_batch_size() -> Result<()> {
    let remote = FakeRemote::start().await?;
    let ids: Vec<String> = (0..3)
        .map(|i| remote.insert_raw("Users", json!({ "Email": format!("u{i}@example.com") })))
        .collect();
    let client = client_for(&remote)?;

    client.bulk_delete("Users", &ids[..2]).await?;
    let left: Vec<String> = remote.records("Users").into_iter().map(|r| r.id).collect();
    assert_eq!(left, vec![ids[2].clone()]);

    let too_many: Vec<String> = (0..11).map(|i| format!("rec{i}")).collect();
    let err = client.bulk_delete("Users", &too_many).await.unwrap_err();
    assert!(matches!(err, TableError::TooManyRecords { max: 10, got: 11 }));

    client.bulk_delete("Users", &[]).await?;
    assert!(!remote.requests().iter().any(|r| r == "DELETE Users?0"));

    Ok(())
}
