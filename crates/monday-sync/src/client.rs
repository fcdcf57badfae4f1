//! GraphQL client for the monday.com API.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::ApiError;
use crate::models::Item;

/// Parent item with a selected set of columns and its subitems.
const ITEM_WITH_SUBITEMS_QUERY: &str = r"
    query GetItemWithSubitems($itemId: ID!, $columnIds: [String!]) {
        items(ids: [$itemId]) {
            id
            name
            column_values(ids: $columnIds) {
                id
                type
                value
                text
            }
            subitems {
                id
                name
                board { id }
            }
        }
    }
";

/// Every column of a single item.
const ITEM_COLUMNS_QUERY: &str = r"
    query GetItemColumns($itemId: ID!) {
        items(ids: [$itemId]) {
            id
            name
            column_values {
                id
                type
                value
                text
            }
        }
    }
";

const CHANGE_COLUMN_VALUE_MUTATION: &str = r"
    mutation ChangeColumnValue($boardId: ID!, $itemId: ID!, $columnId: String!, $value: JSON!) {
        change_column_value(board_id: $boardId, item_id: $itemId, column_id: $columnId, value: $value) {
            id
        }
    }
";

/// monday.com GraphQL client
#[derive(Debug, Clone)]
pub struct MondayClient {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

/// GraphQL request body
#[derive(Debug, Serialize)]
struct GraphQLRequest<'a, V: Serialize> {
    query: &'a str,
    variables: Option<V>,
}

/// GraphQL error entry
#[derive(Debug, Deserialize)]
struct GraphQLError {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ItemsResponse {
    #[serde(default)]
    items: Vec<Item>,
}

impl MondayClient {
    /// Create a client for the given endpoint.
    ///
    /// A missing key is not an error here; every call fails with
    /// [`ApiError::NotConfigured`] until one is supplied.
    pub fn new(api_key: Option<String>, api_url: impl Into<String>) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    /// Create a client from service configuration.
    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.api_key.clone(), config.api_url.clone())
    }

    /// Whether an API key is set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Execute a GraphQL query or mutation and return the full response body.
    ///
    /// Fails on a missing key, a transport error, a non-200 status, or a
    /// non-empty `errors` array.
    pub async fn execute<V: Serialize>(
        &self,
        query: &str,
        variables: Option<V>,
    ) -> Result<Value, ApiError> {
        let api_key = self.api_key.as_deref().ok_or(ApiError::NotConfigured)?;

        let request = GraphQLRequest { query, variables };

        let response = self
            .client
            .post(&self.api_url)
            .header(AUTHORIZATION, api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = %status, "monday.com API response");

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "monday.com API returned error status");
            return Err(ApiError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let body: Value = serde_json::from_slice(&bytes)?;

        if let Some(errors) = body.get("errors").filter(|e| !is_empty_errors(e)) {
            let errors: Vec<GraphQLError> =
                serde_json::from_value(errors.clone()).unwrap_or_default();
            let mut messages: Vec<String> = errors
                .into_iter()
                .map(|e| e.message.unwrap_or_else(|| "Unknown error".to_string()))
                .collect();
            if messages.is_empty() {
                messages.push("Unknown error".to_string());
            }
            warn!(errors = ?messages, "monday.com API returned GraphQL errors");
            return Err(ApiError::GraphQl(messages));
        }

        Ok(body)
    }

    /// Execute and decode `data.items`.
    async fn fetch_items<V: Serialize>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<Vec<Item>, ApiError> {
        let body = self.execute(query, Some(variables)).await?;
        let data = body.get("data").cloned().unwrap_or(Value::Null);
        if data.is_null() {
            return Ok(Vec::new());
        }
        let response: ItemsResponse = serde_json::from_value(data)?;
        Ok(response.items)
    }

    // =========================================================================
    // Item Operations
    // =========================================================================

    /// Get an item with one column and its subitems.
    ///
    /// Returns `None` when the item does not exist (or is not visible).
    #[instrument(skip(self))]
    pub async fn get_item_with_subitems(
        &self,
        item_id: &str,
        column_id: &str,
    ) -> Result<Option<Item>, ApiError> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "itemId")]
            item_id: &'a str,
            #[serde(rename = "columnIds")]
            column_ids: [&'a str; 1],
        }

        let items = self
            .fetch_items(
                ITEM_WITH_SUBITEMS_QUERY,
                Variables {
                    item_id,
                    column_ids: [column_id],
                },
            )
            .await?;
        Ok(items.into_iter().next())
    }

    /// Get an item with all of its column values.
    #[instrument(skip(self))]
    pub async fn get_item_columns(&self, item_id: &str) -> Result<Option<Item>, ApiError> {
        #[derive(Serialize)]
        struct Variables<'a> {
            #[serde(rename = "itemId")]
            item_id: &'a str,
        }

        let items = self
            .fetch_items(ITEM_COLUMNS_QUERY, Variables { item_id })
            .await?;
        Ok(items.into_iter().next())
    }

    /// Set a column on an item to a raw JSON-encoded value.
    ///
    /// The value is forwarded unchanged. Returns the id of the changed item.
    #[instrument(skip(self, value))]
    pub async fn change_column_value(
        &self,
        board_id: &str,
        item_id: &str,
        column_id: &str,
        value: &str,
    ) -> Result<Option<String>, ApiError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Variables<'a> {
            board_id: &'a str,
            item_id: &'a str,
            column_id: &'a str,
            value: &'a str,
        }

        let body = self
            .execute(
                CHANGE_COLUMN_VALUE_MUTATION,
                Some(Variables {
                    board_id,
                    item_id,
                    column_id,
                    value,
                }),
            )
            .await?;

        let changed = body
            .pointer("/data/change_column_value/id")
            .and_then(crate::models::id_from_value);
        debug!(changed_item = ?changed, "Column value changed");
        Ok(changed)
    }
}

fn is_empty_errors(errors: &Value) -> bool {
    match errors {
        Value::Null => true,
        Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MondayClient {
        MondayClient::new(Some("test-key".to_string()), server.uri()).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = MondayClient::new(Some("key".to_string()), "http://localhost").unwrap();
        assert!(client.is_configured());

        let client = MondayClient::new(Some(String::new()), "http://localhost").unwrap();
        assert!(!client.is_configured());
    }

    #[test]
    fn test_graphql_request_serialization() {
        let request = GraphQLRequest {
            query: "query { me { id } }",
            variables: Some(json!({ "itemId": "123" })),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["query"], "query { me { id } }");
        assert_eq!(value["variables"]["itemId"], "123");

        let request: GraphQLRequest<'_, Value> = GraphQLRequest {
            query: "query { me { id } }",
            variables: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["variables"].is_null());
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": {} })))
            .expect(0)
            .mount(&server)
            .await;

        let client = MondayClient::new(None, server.uri()).unwrap();
        let err = client
            .execute("query { me { id } }", None::<Value>)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotConfigured));
    }

    #[tokio::test]
    async fn test_execute_sends_auth_header_and_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("Authorization", "test-key"))
            .and(header("Content-Type", "application/json"))
            .and(body_partial_json(json!({ "variables": { "itemId": "42" } })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "items": [] }, "account_id": 1 })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let body = client
            .execute("query { items { id } }", Some(json!({ "itemId": "42" })))
            .await
            .unwrap();
        assert_eq!(body["account_id"], 1);
    }

    #[tokio::test]
    async fn test_non_200_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .execute("query { me { id } }", None::<Value>)
            .await
            .unwrap_err();
        match err {
            ApiError::Status { status, body } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
                assert_eq!(body, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_graphql_errors_fail_the_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [{ "message": "Column not found" }, { "locations": [] }]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .execute("query { me { id } }", None::<Value>)
            .await
            .unwrap_err();
        match err {
            ApiError::GraphQl(messages) => {
                assert_eq!(messages, vec!["Column not found", "Unknown error"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_errors_array_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": {}, "errors": [] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client
            .execute("query { me { id } }", None::<Value>)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_non_json_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .execute("query { me { id } }", None::<Value>)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Nothing listens on port 9 (discard) in the test environment
        let client =
            MondayClient::new(Some("test-key".to_string()), "http://127.0.0.1:9/v2").unwrap();
        let err = client
            .execute("query { me { id } }", None::<Value>)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }

    #[tokio::test]
    async fn test_get_item_with_subitems() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": { "itemId": "100", "columnIds": ["date7"] }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "items": [{
                    "id": "100",
                    "name": "Parent",
                    "column_values": [{ "id": "date7", "type": "date", "value": "{\"date\":\"2024-05-01\"}", "text": "2024-05-01" }],
                    "subitems": [{ "id": "201", "name": "Child", "board": { "id": "900" } }]
                }] }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let item = client
            .get_item_with_subitems("100", "date7")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(item.display_name(), "Parent");
        assert_eq!(item.subitems.len(), 1);
        assert_eq!(item.subitems[0].board_id(), Some("900"));
    }

    #[tokio::test]
    async fn test_get_item_columns_missing_item() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "items": [] } })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        assert!(client.get_item_columns("404").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_column_value_forwards_raw_value() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "variables": {
                    "boardId": "900",
                    "itemId": "201",
                    "columnId": "date_mkn2am1b",
                    "value": "{\"date\":\"2024-05-01\"}"
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "change_column_value": { "id": "201" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let changed = client
            .change_column_value("900", "201", "date_mkn2am1b", "{\"date\":\"2024-05-01\"}")
            .await
            .unwrap();
        assert_eq!(changed.as_deref(), Some("201"));
    }
}
