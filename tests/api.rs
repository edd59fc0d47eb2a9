use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use resource_api::{app, AppError, AppState, Cardinality, Catalog, ResourceConfig, SqlExecutor};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Answers read queries from fixed tables, keyed by the main table in the FROM clause.
struct Fixture {
    people: Vec<Value>,
    cats: Vec<Value>,
}

impl Fixture {
    fn rows_for(&self, sql: &str, params: &[Value]) -> Vec<Map<String, Value>> {
        let rows = if sql.contains("FROM \"person\" LEFT JOIN") {
            &self.people
        } else {
            &self.cats
        };
        rows.iter()
            .filter(|r| params.first().map_or(true, |id| &r["id"] == id))
            .filter_map(|r| r.as_object().cloned())
            .collect()
    }
}

#[async_trait]
impl SqlExecutor for Fixture {
    async fn apply(&self, _statements: &[String]) -> Result<(), AppError> {
        Ok(())
    }

    async fn fetch_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Map<String, Value>>, AppError> {
        Ok(self.rows_for(sql, params))
    }
}

fn state() -> AppState {
    let catalog = Catalog::new(vec![
        ResourceConfig::new("person", "people")
            .with_attribute("first_name", "text")
            .with_relationship("pets", "cat", Cardinality::OneToMany, false),
        ResourceConfig::new("cat", "cats")
            .with_attribute("name", "text")
            .with_relationship("owner", "person", Cardinality::OneToMany, true),
    ])
    .unwrap();
    let fixture = Fixture {
        people: vec![
            json!({"id": 1, "first_name": "Ann", "pets_ids": [1, 3]}),
            json!({"id": 2, "first_name": "Bo", "pets_ids": null}),
        ],
        cats: vec![
            json!({"id": 1, "name": "james", "owner_id": 1}),
            json!({"id": 2, "name": "stray", "owner_id": null}),
            json!({"id": 3, "name": "tom", "owner_id": 1}),
        ],
    };
    AppState::new(Arc::new(fixture), catalog, 5)
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let res = app(state())
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn read_person_with_pets() {
    let (status, body) = get("/v5/people/1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["type"], "people");
    assert_eq!(body["data"]["id"], "1");
    assert_eq!(body["data"]["attributes"]["first_name"], "Ann");
    assert_eq!(
        body["data"]["relationships"]["pets"],
        json!({
            "data": [{"type": "cats", "id": "1"}, {"type": "cats", "id": "3"}],
            "links": {"self": "/v5/people/1/relationships/pets", "related": "/v5/people/1/pets"}
        })
    );
}

#[tokio::test]
async fn person_without_pets_has_only_self_link() {
    let (_, body) = get("/v5/people/2").await;
    assert_eq!(
        body["data"]["relationships"]["pets"],
        json!({"links": {"self": "/v5/people/2/relationships/pets"}})
    );
}

#[tokio::test]
async fn list_has_count_and_link() {
    let (status, body) = get("/v5/cats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["count"], 3);
    assert_eq!(body["links"]["self"], "/v5/cats");
    assert_eq!(body["data"][1]["relationships"]["owner"], json!({"links": {"self": "/v5/cats/2/relationships/owner"}}));
}

#[tokio::test]
async fn relationship_endpoint() {
    let (status, body) = get("/v5/cats/1/relationships/owner").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"type": "people", "id": "1"}));
}

#[tokio::test]
async fn related_endpoint_reads_targets() {
    let (status, body) = get("/v5/people/1/pets").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["attributes"]["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["james", "tom"]);
}

#[tokio::test]
async fn root_lists_routes() {
    let (status, body) = get("/v5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], "v5");
    assert_eq!(body["endpoints"][0]["route"], "/v5/people");
}

#[tokio::test]
async fn errors_are_json() {
    let (status, body) = get("/v5/cats/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "bad_request");

    let (status, _) = get("/v5/cats/99").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get("/v5/dogs").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["status"], "404");

    let (status, body) = get("/nowhere/at/all/really/deep").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["errors"][0]["code"], "not_found");
}

#[tokio::test]
async fn health_and_ready() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    let (status, body) = get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["resources"], 2);
}
