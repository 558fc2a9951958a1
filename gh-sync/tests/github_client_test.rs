use gh_sync::{
    GhSyncConfig, GhSyncError, GithubClient, RemoteSnapshot, RemoteTeam, RestGithubClient,
    TeamPrivacy, TeamRole, TeamSpec,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> RestGithubClient {
    let config = GhSyncConfig {
        api_url: server.uri(),
        ..GhSyncConfig::new("acme", "test-token")
    };
    RestGithubClient::new(config).unwrap()
}

fn team_json(id: u64, name: &str, parent: Option<(u64, &str)>) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "slug": name,
        "description": "",
        "privacy": "closed",
        "parent": parent.map(|(id, name)| json!({"id": id, "name": name, "slug": name}))
    })
}

#[tokio::test]
async fn test_list_members_follows_link_header() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}/orgs/acme/members?per_page=100&page=2>; rel=\"next\", <{}/orgs/acme/members?per_page=100&page=2>; rel=\"last\"",
        server.uri(),
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 2, "login": "bob-gh"}])))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .and(query_param("per_page", "100"))
        .and(header("Authorization", "Bearer test-token"))
        .and(header("X-GitHub-Api-Version", "2022-11-28"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!([{"id": 1, "login": "ann-gh"}]))
        )
        .mount(&server)
        .await;

    let client = client(&server);

    let first = client.list_members(None).await.unwrap();
    assert_eq!(first.items[0].login, "ann-gh");
    assert_eq!(first.next_page.as_deref(), Some("2"));

    let second = client.list_members(Some("2")).await.unwrap();
    assert_eq!(second.items[0].login, "bob-gh");
    assert!(second.next_page.is_none());
}

#[tokio::test]
async fn test_collect_keeps_only_prefixed_teams() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "login": "ann-gh"}])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            team_json(1, "org-tech", None),
            team_json(2, "org-data", Some((1, "org-tech"))),
            team_json(3, "security-oncall", None)
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let snapshot = RemoteSnapshot::collect(&client, "org-").await.unwrap();

    assert!(snapshot.has_member("ann-gh"));
    assert_eq!(snapshot.teams().count(), 2);
    assert_eq!(snapshot.team("org-data").unwrap().parent_name(), Some("org-tech"));
    assert!(snapshot.team("security-oncall").is_none());
}

#[tokio::test]
async fn test_team_roster_is_read_per_role() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/teams/7/members"))
        .and(query_param("role", "maintainer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1, "login": "ann-gh"}])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/teams/7/members"))
        .and(query_param("role", "member"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "login": "ann-gh"},
            {"id": 2, "login": "cy-gh"}
        ])))
        .mount(&server)
        .await;

    let client = client(&server);
    let remote: RemoteTeam = serde_json::from_value(team_json(7, "org-tech", None)).unwrap();
    let roster = gh_sync::fetch_team_roster(&client, &remote).await.unwrap();

    assert_eq!(roster.role_of("ann-gh"), Some(TeamRole::Maintainer));
    assert_eq!(roster.role_of("cy-gh"), Some(TeamRole::Member));
}

#[tokio::test]
async fn test_create_and_edit_team_bodies() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/orgs/acme/teams"))
        .and(body_json(json!({
            "name": "org-root",
            "description": "Everyone",
            "privacy": "closed",
            "parent_team_id": null
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(team_json(7, "org-root", None)))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/teams/8"))
        .and(body_json(json!({
            "name": "org-platform",
            "description": "",
            "privacy": "closed",
            "parent_team_id": 7
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(team_json(8, "org-platform", Some((7, "org-root"))))
        )
        .mount(&server)
        .await;

    let client = client(&server);

    let created = client
        .create_team(&TeamSpec {
            name: "org-root".to_string(),
            description: "Everyone".to_string(),
            privacy: TeamPrivacy::Closed,
            parent_team_id: None
        })
        .await
        .unwrap();
    assert_eq!(created.id, 7);
    assert_eq!(created.privacy, Some(TeamPrivacy::Closed));

    let edited = client
        .edit_team(
            8,
            &TeamSpec {
                name: "org-platform".to_string(),
                description: String::new(),
                privacy: TeamPrivacy::Closed,
                parent_team_id: Some(7)
            }
        )
        .await
        .unwrap();
    assert_eq!(edited.parent_name(), Some("org-root"));
}

#[tokio::test]
async fn test_membership_and_delete_calls() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/teams/7/memberships/ann-gh"))
        .and(body_json(json!({"role": "maintainer"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"role": "maintainer", "state": "active"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/teams/7/memberships/old-gh"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/teams/9"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);

    client
        .add_team_membership(7, "ann-gh", TeamRole::Maintainer)
        .await
        .unwrap();
    client.remove_team_membership(7, "old-gh").await.unwrap();
    client.delete_team(9).await.unwrap();
}

#[tokio::test]
async fn test_status_codes_map_to_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/members"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Bad credentials"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/orgs/acme/teams"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/teams/1"))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "12")
        )
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/teams/2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/teams/3"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream"))
        .mount(&server)
        .await;

    let client = client(&server);

    assert!(matches!(
        client.list_members(None).await,
        Err(GhSyncError::AuthenticationError(_))
    ));

    let limited = client.list_teams(None).await.unwrap_err();
    assert!(matches!(
        limited,
        GhSyncError::RateLimited {
            retry_after_seconds: 30
        }
    ));
    assert!(limited.is_retryable());

    assert!(matches!(
        client.delete_team(1).await,
        Err(GhSyncError::RateLimited {
            retry_after_seconds: 12
        })
    ));
    assert!(matches!(
        client.delete_team(2).await,
        Err(GhSyncError::NotFound(_))
    ));

    let upstream = client.delete_team(3).await.unwrap_err();
    assert!(matches!(
        upstream,
        GhSyncError::GithubApiError { status: 502, ref message } if message == "upstream"
    ));
    assert!(upstream.is_retryable());
}
