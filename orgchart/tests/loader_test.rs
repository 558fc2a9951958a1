use orgchart::{OrgChartError, load_chart};
use serde_json::json;
use std::io::Write;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn chart_document() -> serde_json::Value {
    json!({
        "_id": "chart",
        "_rev": "12-abc",
        "rootEmployee": "cto",
        "teams": [
            {"id": "tech", "name": "Tech", "techLead": "cto", "description": "All of tech"},
            {"id": "platform_eng", "name": "Platform", "parent": "tech"}
        ],
        "employees": [
            {"id": "cto", "name": "The CTO", "memberOf": "tech", "github": "the-cto", "stream": "ENGINEERING"},
            {"id": "bob", "name": "Bob", "memberOf": "platform_eng", "github": "", "stream": "ENGINEERING", "type": "CONTRACTOR"}
        ]
    })
}

#[tokio::test]
async fn test_load_chart_from_couchdb() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgchart/chart"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chart_document()))
        .mount(&mock_server)
        .await;

    let chart = load_chart(&format!("{}/orgchart", mock_server.uri()))
        .await
        .unwrap();

    assert_eq!(chart.teams().len(), 2);
    assert_eq!(chart.root_employee(), Some("cto"));
    assert_eq!(
        chart.team("platform_eng").unwrap().parent_id.as_deref(),
        Some("tech")
    );
    assert!(chart.employee("bob").unwrap().remote_handle().is_none());
}

#[tokio::test]
async fn test_load_chart_store_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/orgchart/chart"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{\"error\":\"not_found\"}"))
        .mount(&mock_server)
        .await;

    let err = load_chart(&format!("{}/orgchart", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, OrgChartError::StoreError { status: 404, .. }));
}

#[tokio::test]
async fn test_load_chart_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(chart_document().to_string().as_bytes())
        .unwrap();

    let chart = load_chart(file.path().to_str().unwrap()).await.unwrap();
    assert_eq!(chart.employees().len(), 2);

    let url = format!("file://{}", file.path().display());
    let chart = load_chart(&url).await.unwrap();
    assert_eq!(chart.employees().len(), 2);
}

#[tokio::test]
async fn test_load_chart_rejects_dangling_membership() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let document = json!({
        "teams": [{"id": "tech", "name": "Tech"}],
        "employees": [{"id": "bob", "name": "Bob", "memberOf": "nowhere"}]
    });
    file.write_all(document.to_string().as_bytes()).unwrap();

    let err = load_chart(file.path().to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, OrgChartError::UnknownTeamForEmployee { .. }));
}
