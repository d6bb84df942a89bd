//! GraphQL API Client
//!
//! Queries and mutations go over HTTP; subscriptions use the persistent
//! WebSocket channel in `state::websocket`. The client is constructed once
//! at startup and handed to the component tree through context.

use gloo_net::http::Request;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::state::global::{Link, NewVote};

/// Default API endpoint
pub const DEFAULT_API_ENDPOINT: &str = "http://localhost:4000";

const API_ENDPOINT_KEY: &str = "kindling_api_endpoint";
const AUTH_TOKEN_KEY: &str = "kindling_auth_token";

/// Get the API endpoint from local storage or use the default
pub fn get_api_endpoint() -> String {
    let url = if let Some(storage) = local_storage() {
        if let Ok(Some(url)) = storage.get_item(API_ENDPOINT_KEY) {
            url
        } else {
            DEFAULT_API_ENDPOINT.to_string()
        }
    } else {
        DEFAULT_API_ENDPOINT.to_string()
    };
    // Normalize: remove trailing slash
    url.trim_end_matches('/').to_string()
}

/// Read the bearer credential from its local storage slot.
///
/// This is the only credential accessor; the app root calls it once and
/// injects the result into both the client and the global state.
pub fn get_auth_token() -> Option<String> {
    let storage = local_storage()?;
    storage
        .get_item(AUTH_TOKEN_KEY)
        .ok()
        .flatten()
        .filter(|token| !token.is_empty())
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}

// ============ GraphQL Documents ============

const FEED_QUERY: &str = r#"
query FeedQuery($take: Int, $skip: Int, $orderBy: LinkOrderByInput) {
  feed(take: $take, skip: $skip, orderBy: $orderBy) {
    links {
      id
      createdAt
      url
      description
      postedBy {
        id
        name
      }
      votes {
        id
        user {
          id
        }
      }
    }
    count
  }
}"#;

const VOTE_MUTATION: &str = r#"
mutation VoteMutation($linkId: ID!) {
  vote(linkId: $linkId) {
    id
    link {
      id
      createdAt
      url
      description
      postedBy {
        id
        name
      }
      votes {
        id
        user {
          id
        }
      }
    }
    user {
      id
    }
  }
}"#;

// ============ Response Types ============

/// One window of the feed plus the total match count
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct FeedPage {
    #[serde(default)]
    pub links: Vec<Link>,
    pub count: usize,
}

#[derive(Debug, serde::Deserialize)]
struct FeedData {
    feed: FeedPage,
}

#[derive(Debug, serde::Deserialize)]
struct VoteData {
    vote: NewVote,
}

#[derive(Debug, serde::Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<Value>,
}

// ============ Client ============

/// GraphQL client over the request/response transport
#[derive(Clone)]
pub struct ApiClient {
    endpoint: String,
    auth_token: Option<String>,
}

impl ApiClient {
    pub fn new(endpoint: impl Into<String>, auth_token: Option<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            auth_token,
        }
    }

    /// Build the client from browser state: endpoint from its storage slot,
    /// credential through the single accessor.
    pub fn from_browser() -> Self {
        Self::new(get_api_endpoint(), get_auth_token())
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// The persistent-connection endpoint, derived from the HTTP one.
    pub fn ws_endpoint(&self) -> String {
        self.endpoint
            .replace("http://", "ws://")
            .replace("https://", "wss://")
    }

    /// Fetch one feed window, ordered by creation time descending.
    pub async fn fetch_feed(&self, take: usize, skip: usize) -> Result<FeedPage, String> {
        let variables = json!({
            "take": take,
            "skip": skip,
            "orderBy": { "createdAt": "desc" },
        });
        let data: FeedData = self.execute(FEED_QUERY, variables).await?;
        Ok(data.feed)
    }

    /// Cast a vote on a link. Returns the created vote with the affected
    /// link's full projection.
    pub async fn submit_vote(&self, link_id: &str) -> Result<NewVote, String> {
        let variables = json!({ "linkId": link_id });
        let data: VoteData = self.execute(VOTE_MUTATION, variables).await?;
        Ok(data.vote)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &'static str,
        variables: Value,
    ) -> Result<T, String> {
        #[derive(serde::Serialize)]
        struct GraphqlRequest<'a> {
            query: &'a str,
            variables: Value,
        }

        let bearer = self
            .auth_token
            .as_ref()
            .map(|token| format!("Bearer {}", token))
            .unwrap_or_default();

        let response = Request::post(&self.endpoint)
            .header("Authorization", &bearer)
            .json(&GraphqlRequest { query, variables })
            .map_err(|e| format!("Request build error: {}", e))?
            .send()
            .await
            .map_err(|e| format!("Network error: {}", e))?;

        if !response.ok() {
            return Err(format!("Server returned {}", response.status()));
        }

        let envelope: GraphqlResponse<T> = response
            .json()
            .await
            .map_err(|e| format!("Parse error: {}", e))?;

        // Surface GraphQL errors verbatim
        if let Some(errors) = envelope.errors {
            return Err(errors.to_string());
        }
        envelope.data.ok_or_else(|| "Empty response".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ws_endpoint_derivation() {
        let client = ApiClient::new("http://localhost:4000", None);
        assert_eq!(client.ws_endpoint(), "ws://localhost:4000");

        let client = ApiClient::new("https://kindling.example", None);
        assert_eq!(client.ws_endpoint(), "wss://kindling.example");
    }

    #[test]
    fn test_feed_response_deserializes() {
        let body = r#"{
            "data": {
                "feed": {
                    "links": [
                        {
                            "id": "l1",
                            "createdAt": "2024-03-01T12:00:00Z",
                            "url": "https://example.com",
                            "description": "a link",
                            "postedBy": { "id": "u1", "name": "alice" },
                            "votes": [
                                { "id": "v1", "user": { "id": "u2" } }
                            ]
                        },
                        {
                            "id": "l2",
                            "createdAt": "2024-03-02T08:30:00Z",
                            "url": "https://example.org",
                            "description": "anonymous link",
                            "postedBy": null,
                            "votes": []
                        }
                    ],
                    "count": 42
                }
            }
        }"#;

        let envelope: GraphqlResponse<FeedData> = serde_json::from_str(body).unwrap();
        let feed = envelope.data.unwrap().feed;

        assert_eq!(feed.count, 42);
        assert_eq!(feed.links.len(), 2);
        assert_eq!(feed.links[0].votes.len(), 1);
        assert_eq!(feed.links[0].posted_by.as_ref().unwrap().name, "alice");
        assert!(feed.links[1].posted_by.is_none());
    }

    #[test]
    fn test_vote_response_deserializes() {
        let body = r#"{
            "data": {
                "vote": {
                    "id": "v9",
                    "link": {
                        "id": "l1",
                        "createdAt": "2024-03-01T12:00:00Z",
                        "url": "https://example.com",
                        "description": "a link",
                        "postedBy": { "id": "u1", "name": "alice" },
                        "votes": [ { "id": "v9", "user": { "id": "u3" } } ]
                    },
                    "user": { "id": "u3" }
                }
            }
        }"#;

        let envelope: GraphqlResponse<VoteData> = serde_json::from_str(body).unwrap();
        let vote = envelope.data.unwrap().vote;

        assert_eq!(vote.id, "v9");
        assert_eq!(vote.link.id, "l1");
        assert_eq!(vote.user.unwrap().id, "u3");
    }

    #[test]
    fn test_graphql_errors_are_detected() {
        let body = r#"{ "data": null, "errors": [ { "message": "boom" } ] }"#;
        let envelope: GraphqlResponse<FeedData> = serde_json::from_str(body).unwrap();

        assert!(envelope.data.is_none());
        let errors = envelope.errors.unwrap();
        assert!(errors.to_string().contains("boom"));
    }
}
