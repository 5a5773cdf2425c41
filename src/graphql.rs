use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TodoError};
use crate::source::TodoSource;
use crate::types::Todo;

pub const GET_TODOS_OPERATION: &str = "getAllTodosWithUser";

pub const GET_TODOS: &str = r#"query getAllTodosWithUser {
  getTodos {
    id
    title
    completed
    user {
      id
      name
    }
  }
}"#;

pub struct GraphQlClient {
    client: Client,
    endpoint: String,
}

impl std::fmt::Debug for GraphQlClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphQlClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl GraphQlClient {
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("todoview/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TodoError::Config(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    async fn query<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
    ) -> Result<T> {
        let request = GqlRequest {
            operation_name: operation,
            query,
        };

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(TodoError::Network(format!("HTTP {}: {}", status, text)));
        }

        let body: GqlResponse<T> = response.json().await?;
        body.into_result()
    }
}

// GraphQL wire types

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GqlRequest<'a> {
    operation_name: &'a str,
    query: &'a str,
}

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GqlError>,
}

#[derive(Debug, Deserialize)]
struct GqlError {
    message: String,
    #[serde(default)]
    locations: Vec<GqlLocation>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GqlLocation {
    line: u32,
    column: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TodosData {
    get_todos: Option<Vec<Todo>>,
}

impl<T> GqlResponse<T> {
    fn into_result(self) -> Result<T> {
        if !self.errors.is_empty() {
            for err in &self.errors {
                let locations: Vec<String> = err
                    .locations
                    .iter()
                    .map(|l| format!("{}:{}", l.line, l.column))
                    .collect();
                let path: Vec<String> = err.path.iter().map(|p| p.to_string()).collect();
                tracing::debug!(
                    message = %err.message,
                    locations = %locations.join(","),
                    path = %path.join("."),
                    "GraphQL error"
                );
            }
            let joined: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(TodoError::GraphQl(joined.join("; ")));
        }

        self.data
            .ok_or_else(|| TodoError::Decode("response has no data".to_string()))
    }
}

#[async_trait]
impl TodoSource for GraphQlClient {
    fn name(&self) -> &str {
        "GraphQL"
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch_todos(&self) -> Result<Vec<Todo>> {
        tracing::debug!(endpoint = %self.endpoint, "fetching todos");
        let data: TodosData = self.query(GET_TODOS_OPERATION, GET_TODOS).await?;
        let todos = data
            .get_todos
            .ok_or_else(|| TodoError::Decode("getTodos missing from response".to_string()))?;
        tracing::info!(count = todos.len(), "todos fetched");
        Ok(todos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::routing::post;
    use axum::{http::StatusCode, Json, Router};
    use serde_json::{json, Value};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/graphql", addr)
    }

    fn client(endpoint: String) -> GraphQlClient {
        GraphQlClient::new(endpoint, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn fetches_todos_with_users() {
        let router = Router::new().route(
            "/graphql",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["operationName"], GET_TODOS_OPERATION);
                assert!(body["query"].as_str().unwrap().contains("getTodos"));
                Json(json!({
                    "data": {
                        "getTodos": [
                            {"id": "1", "title": "Buy milk", "completed": false,
                             "user": {"id": "10", "name": "Alice"}},
                            {"id": "2", "title": "Walk dog", "completed": true, "user": null}
                        ]
                    }
                }))
            }),
        );
        let todos = client(serve(router).await).fetch_todos().await.unwrap();
        assert_eq!(todos.len(), 2);
        assert_eq!(todos[0].user_name(), "Alice");
        assert!(todos[1].user.is_none());
    }

    #[tokio::test]
    async fn graphql_errors_become_one_message() {
        let router = Router::new().route(
            "/graphql",
            post(|| async {
                Json(json!({
                    "data": null,
                    "errors": [
                        {"message": "boom", "locations": [{"line": 2, "column": 3}], "path": ["getTodos"]},
                        {"message": "again"}
                    ]
                }))
            }),
        );
        let err = client(serve(router).await).fetch_todos().await.unwrap_err();
        match err {
            TodoError::GraphQl(msg) => assert_eq!(msg, "boom; again"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn graphql_errors_are_not_written_at_default_level() {
        let response: GqlResponse<TodosData> = serde_json::from_value(json!({
            "data": null,
            "errors": [{"message": "boom", "path": ["getTodos"]}]
        }))
        .unwrap();
        let (result, logs) =
            crate::test_log::logged_at_default_level(|| response.into_result());
        assert!(matches!(result, Err(TodoError::GraphQl(ref m)) if m == "boom"));
        assert!(logs.is_empty(), "{logs}");
    }

    #[tokio::test]
    async fn http_failure_is_network_error() {
        let router = Router::new().route(
            "/graphql",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "down") }),
        );
        let err = client(serve(router).await).fetch_todos().await.unwrap_err();
        assert!(matches!(err, TodoError::Network(ref m) if m.contains("500") && m.contains("down")));
    }

    #[tokio::test]
    async fn missing_collection_is_decode_error() {
        let router = Router::new().route(
            "/graphql",
            post(|| async { Json(json!({"data": {"getTodos": null}})) }),
        );
        let err = client(serve(router).await).fetch_todos().await.unwrap_err();
        assert!(matches!(err, TodoError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client(format!("http://{}/graphql", addr))
            .fetch_todos()
            .await
            .unwrap_err();
        assert!(matches!(err, TodoError::Network(_)));
    }
}
