use std::time::Duration;

use edgecache::{
    config::{Credentials, EdgeSettings},
    directives::CacheTags,
    edge::{CachePurge, EdgeCache, EdgeClient, EdgeError, PurgeOutcome, SkipReason},
};
use httpmock::MockServer;
use serde_json::json;
use url::Url;

const ZONE: &str = "zone-123";

fn settings(server: &MockServer, credentials: Credentials) -> EdgeSettings {
    EdgeSettings {
        base_url: Url::parse(&server.url("/client/v4/")).expect("mock url"),
        zone_id: Some(ZONE.to_string()),
        credentials: Some(credentials),
        timeout: Duration::from_secs(5),
        purge_enabled: true,
    }
}

fn token_cache(server: &MockServer) -> EdgeCache {
    let client = EdgeClient::new(&settings(server, Credentials::Token("token".into())))
        .expect("edge client");
    EdgeCache::new(client, true)
}

fn purge_path() -> String {
    format!("/client/v4/zones/{ZONE}/purge_cache")
}

#[tokio::test]
async fn purge_everything_posts_flag_with_bearer_token() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path(purge_path())
            .header("authorization", "Bearer token")
            .json_body(json!({ "purge_everything": true }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"errors":[],"messages":[],"result":{"id":"purge-1"}}"#);
    });

    let outcome = token_cache(&server).purge_everything().await?;
    mock.assert();
    assert_eq!(
        outcome,
        PurgeOutcome::Purged {
            id: Some("purge-1".to_string())
        }
    );
    Ok(())
}

#[tokio::test]
async fn purge_by_tags_sends_normalized_tags() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path(purge_path())
            .json_body(json!({ "tags": ["products", "category-5"] }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"errors":[],"messages":[],"result":{"id":"purge-2"}}"#);
    });

    let tags = CacheTags::from_param(Some("products; ;category-5;products"));
    token_cache(&server).purge_by_tags(tags).await?;
    mock.assert();
    Ok(())
}

#[tokio::test]
async fn purge_by_urls_uses_files_field_and_key_headers() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST")
            .path(purge_path())
            .header("x-auth-email", "ops@example.com")
            .header("x-auth-key", "global-key")
            .json_body(json!({ "files": ["https://example.com/a", "https://example.com/b"] }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"errors":[],"messages":[],"result":{"id":"purge-3"}}"#);
    });

    let client = EdgeClient::new(&settings(
        &server,
        Credentials::Key {
            email: "ops@example.com".into(),
            key: "global-key".into(),
        },
    ))?;
    let outcome = EdgeCache::new(client, true)
        .purge_by_urls(vec![
            "https://example.com/a".into(),
            " https://example.com/b ".into(),
        ])
        .await?;
    mock.assert();
    assert!(matches!(outcome, PurgeOutcome::Purged { .. }));
    Ok(())
}

#[tokio::test]
async fn purge_by_hosts_and_prefixes_use_their_fields() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let hosts = server.mock(|when, then| {
        when.method("POST")
            .path(purge_path())
            .json_body(json!({ "hosts": ["www.example.com"] }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"result":{"id":"h"}}"#);
    });
    let prefixes = server.mock(|when, then| {
        when.method("POST")
            .path(purge_path())
            .json_body(json!({ "prefixes": ["www.example.com/blog"] }));
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"result":{"id":"p"}}"#);
    });

    let cache = token_cache(&server);
    cache.purge_by_hosts(vec!["www.example.com".into()]).await?;
    cache
        .purge_by_prefixes(vec!["www.example.com/blog".into()])
        .await?;
    hosts.assert();
    prefixes.assert();
    Ok(())
}

#[tokio::test]
async fn empty_targets_skip_the_upstream_call() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path(purge_path());
        then.status(200).body(r#"{"success":true}"#);
    });

    let cache = token_cache(&server);
    let outcome = cache.purge_by_tags(CacheTags::from_param(Some(" ; "))).await?;
    assert_eq!(outcome, PurgeOutcome::Skipped(SkipReason::NoTargets));

    let outcome = cache.purge_by_urls(vec!["   ".into()]).await?;
    assert_eq!(outcome, PurgeOutcome::Skipped(SkipReason::NoTargets));

    mock.assert_calls(0);
    Ok(())
}

#[tokio::test]
async fn disabled_purging_never_calls_the_provider() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path(purge_path());
        then.status(200).body(r#"{"success":true}"#);
    });

    let client = EdgeClient::new(&settings(&server, Credentials::Token("token".into())))?;
    let outcome = EdgeCache::new(client, false).purge_everything().await?;
    assert_eq!(outcome, PurgeOutcome::Skipped(SkipReason::Disabled));
    mock.assert_calls(0);
    Ok(())
}

#[tokio::test]
async fn non_success_status_surfaces_provider_errors() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("POST").path(purge_path());
        then.status(403)
            .header("content-type", "application/json")
            .body(r#"{"success":false,"errors":[{"code":10000,"message":"Authentication error"}]}"#);
    });

    let err = token_cache(&server)
        .purge_everything()
        .await
        .expect_err("403 should fail");
    mock.assert();

    match err {
        EdgeError::Status { status, errors, .. } => {
            assert_eq!(status, 403);
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].code, 10000);
            assert_eq!(errors[0].message, "Authentication error");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_envelope_is_an_error_even_on_200() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method("POST").path(purge_path());
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":false,"errors":[{"code":1012,"message":"Request must contain one of purge_everything, files, tags, hosts or prefixes"}]}"#);
    });

    let err = token_cache(&server)
        .purge_by_tags(CacheTags::from(["a"]))
        .await
        .expect_err("rejected envelope should fail");
    assert!(matches!(err, EdgeError::Rejected { ref errors } if errors[0].code == 1012));
}

#[tokio::test]
async fn zone_setting_returns_result_object() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path(format!("/client/v4/zones/{ZONE}/settings/cache_level"))
            .header("authorization", "Bearer token");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"errors":[],"messages":[],"result":{"id":"cache_level","value":"aggressive","editable":true}}"#);
    });

    let value = token_cache(&server).zone_setting("cache_level").await?;
    mock.assert();
    assert_eq!(value["id"], "cache_level");
    assert_eq!(value["value"], "aggressive");
    Ok(())
}

#[tokio::test]
async fn get_sends_query_pairs() -> Result<(), EdgeError> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET")
            .path(format!("/client/v4/zones/{ZONE}/settings"))
            .query_param("page", "2")
            .query_param("per_page", "50");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"success":true,"result":[{"id":"cache_level","value":"basic"}]}"#);
    });

    let client = EdgeClient::new(&settings(&server, Credentials::Token("token".into())))?;
    let envelope = client
        .get(
            "settings",
            Some(&[("page", "2".to_string()), ("per_page", "50".to_string())]),
        )
        .await?;
    mock.assert();
    assert_eq!(envelope.result[0]["value"], "basic");
    Ok(())
}

#[tokio::test]
async fn zone_setting_rejects_path_like_names() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method("GET");
        then.status(200).body(r#"{"success":true}"#);
    });

    let err = token_cache(&server)
        .zone_setting("../../purge_cache")
        .await
        .expect_err("path-like names should fail");
    assert!(matches!(err, EdgeError::InvalidSetting(_)));
    mock.assert_calls(0);
}
