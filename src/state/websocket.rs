//! Live Update Channel
//!
//! GraphQL subscriptions over a persistent WebSocket connection
//! (graphql-transport-ws framing). Delivers new links and new votes into
//! the feed cache as they are created.

use leptos::*;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, MessageEvent, WebSocket};

use crate::api::ApiClient;

use super::global::{GlobalState, Link, NewVote};

const NEW_LINKS_SUBSCRIPTION: &str = r#"
subscription {
  newLink {
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
}"#;

const NEW_VOTES_SUBSCRIPTION: &str = r#"
subscription {
  newVote {
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

/// Operation ids for the two standing subscriptions
const NEW_LINK_OP: &str = "new-link";
const NEW_VOTE_OP: &str = "new-vote";

const MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Messages sent from client to server
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Open the session; the credential rides in the payload
    ConnectionInit {
        #[serde(skip_serializing_if = "Option::is_none")]
        payload: Option<ConnectionParams>,
    },
    /// Start a subscription operation
    Subscribe { id: String, payload: OperationPayload },
    /// Stop a subscription operation
    Complete { id: String },
    /// Keepalive reply
    Pong,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionParams {
    pub auth_token: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct OperationPayload {
    pub query: String,
}

/// Messages sent from server to client
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Session established; operations may start
    ConnectionAck,
    /// A subscription delivered a result
    Next { id: String, payload: ExecutionResult },
    /// A subscription failed
    Error {
        id: String,
        payload: serde_json::Value,
    },
    /// A subscription finished
    Complete { id: String },
    /// Keepalive
    Ping,
    Pong,
}

/// GraphQL execution result carried by a `next` message
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ExecutionResult {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewLinkData {
    new_link: Link,
}

#[derive(Debug, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewVoteData {
    new_vote: NewVote,
}

/// Handle to the standing subscriptions. Scoped to the feed page: created
/// on mount, closed deterministically on unmount.
pub struct LiveFeed {
    ws: Rc<RefCell<Option<WebSocket>>>,
    url: String,
    auth_token: Option<String>,
    reconnect_attempts: Rc<RefCell<u32>>,
    closed: Rc<RefCell<bool>>,
}

/// Open the live update channel and register both feed subscriptions.
pub fn start_live_feed(state: GlobalState, client: &ApiClient) -> LiveFeed {
    let live = LiveFeed {
        ws: Rc::new(RefCell::new(None)),
        url: client.ws_endpoint(),
        auth_token: client.auth_token().map(str::to_string),
        reconnect_attempts: Rc::new(RefCell::new(0)),
        closed: Rc::new(RefCell::new(false)),
    };
    live.connect(state);
    live
}

impl LiveFeed {
    /// Connect to the WebSocket server
    fn connect(&self, state: GlobalState) {
        match WebSocket::new(&self.url) {
            Ok(ws) => {
                self.setup_handlers(&ws, state);
                *self.ws.borrow_mut() = Some(ws);
            }
            Err(e) => {
                web_sys::console::error_1(
                    &format!("WebSocket connection failed: {:?}", e).into(),
                );
                self.schedule_reconnect(state);
            }
        }
    }

    /// Set up WebSocket event handlers
    fn setup_handlers(&self, ws: &WebSocket, state: GlobalState) {
        let reconnect_attempts = Rc::clone(&self.reconnect_attempts);
        let ws_ref = Rc::clone(&self.ws);
        let closed = Rc::clone(&self.closed);
        let url = self.url.clone();
        let auth_token = self.auth_token.clone();

        // On open: start the graphql-transport-ws session
        let ws_for_open = ws.clone();
        let params = auth_token.clone().map(|token| ConnectionParams {
            auth_token: token,
        });
        let on_open = Closure::wrap(Box::new(move |_: JsValue| {
            web_sys::console::log_1(&"Live channel connected".into());
            send(&ws_for_open, &ClientMessage::ConnectionInit {
                payload: params.clone(),
            });
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));
        on_open.forget();

        // On message
        let state_clone = state.clone();
        let ws_for_message = ws.clone();
        let reconnect_clone = Rc::clone(&reconnect_attempts);
        let on_message = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                let text_str: String = text.into();
                handle_message(&text_str, &state_clone, &ws_for_message, &reconnect_clone);
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
        on_message.forget();

        // On close: reconnect with backoff unless deliberately closed
        let state_clone = state.clone();
        let on_close = Closure::wrap(Box::new(move |event: CloseEvent| {
            web_sys::console::log_1(
                &format!(
                    "Live channel closed: code={}, reason={}",
                    event.code(),
                    event.reason()
                )
                .into(),
            );
            state_clone.ws_connected.set(false);

            if *closed.borrow() {
                return;
            }

            let attempts = *reconnect_attempts.borrow();
            if attempts < MAX_RECONNECT_ATTEMPTS {
                let delay = (2_u32.pow(attempts) * 1000).min(30000);
                *reconnect_attempts.borrow_mut() = attempts + 1;

                let state_inner = state_clone.clone();
                let ws_inner = Rc::clone(&ws_ref);
                let url_inner = url.clone();
                let auth_inner = auth_token.clone();
                let reconnect_inner = Rc::clone(&reconnect_attempts);
                let closed_inner = Rc::clone(&closed);

                gloo_timers::callback::Timeout::new(delay, move || {
                    web_sys::console::log_1(
                        &format!("Attempting reconnect (attempt {})", reconnect_inner.borrow())
                            .into(),
                    );
                    let live = LiveFeed {
                        ws: ws_inner,
                        url: url_inner,
                        auth_token: auth_inner,
                        reconnect_attempts: reconnect_inner,
                        closed: closed_inner,
                    };
                    live.connect(state_inner);
                })
                .forget();
            }
        }) as Box<dyn FnMut(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
        on_close.forget();

        // On error
        let on_error = Closure::wrap(Box::new(move |e: JsValue| {
            web_sys::console::error_1(&format!("WebSocket error: {:?}", e).into());
        }) as Box<dyn FnMut(JsValue)>);
        ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));
        on_error.forget();
    }

    /// Schedule a reconnect attempt
    fn schedule_reconnect(&self, state: GlobalState) {
        let attempts = *self.reconnect_attempts.borrow();
        if attempts >= MAX_RECONNECT_ATTEMPTS {
            web_sys::console::error_1(&"Max reconnect attempts reached".into());
            return;
        }

        let delay = (2_u32.pow(attempts) * 1000).min(30000);
        *self.reconnect_attempts.borrow_mut() = attempts + 1;

        let ws_ref = Rc::clone(&self.ws);
        let url = self.url.clone();
        let auth_token = self.auth_token.clone();
        let reconnect_attempts = Rc::clone(&self.reconnect_attempts);
        let closed = Rc::clone(&self.closed);

        gloo_timers::callback::Timeout::new(delay, move || {
            let live = LiveFeed {
                ws: ws_ref,
                url,
                auth_token,
                reconnect_attempts,
                closed,
            };
            live.connect(state);
        })
        .forget();
    }

    /// Stop both subscriptions and close the connection. No reconnect is
    /// attempted after this.
    pub fn close(&self) {
        *self.closed.borrow_mut() = true;
        if let Some(ws) = self.ws.borrow().as_ref() {
            send(ws, &ClientMessage::Complete {
                id: NEW_LINK_OP.to_string(),
            });
            send(ws, &ClientMessage::Complete {
                id: NEW_VOTE_OP.to_string(),
            });
            let _ = ws.close();
        }
    }
}

fn send(ws: &WebSocket, message: &ClientMessage) {
    match serde_json::to_string(message) {
        Ok(json) => {
            let _ = ws.send_with_str(&json);
        }
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to encode message: {}", e).into());
        }
    }
}

fn subscribe(ws: &WebSocket, id: &str, query: &str) {
    send(ws, &ClientMessage::Subscribe {
        id: id.to_string(),
        payload: OperationPayload {
            query: query.to_string(),
        },
    });
}

/// Handle an incoming server message
fn handle_message(
    text: &str,
    state: &GlobalState,
    ws: &WebSocket,
    reconnect_attempts: &Rc<RefCell<u32>>,
) {
    match serde_json::from_str::<ServerMessage>(text) {
        Ok(ServerMessage::ConnectionAck) => {
            state.ws_connected.set(true);
            *reconnect_attempts.borrow_mut() = 0;
            subscribe(ws, NEW_LINK_OP, NEW_LINKS_SUBSCRIPTION);
            subscribe(ws, NEW_VOTE_OP, NEW_VOTES_SUBSCRIPTION);
        }
        Ok(ServerMessage::Next { id, payload }) => {
            handle_next(&id, payload, state);
        }
        Ok(ServerMessage::Error { id, payload }) => {
            web_sys::console::error_1(
                &format!("Subscription {} failed: {}", id, payload).into(),
            );
            state.show_error(&format!("Live updates interrupted: {}", payload));
        }
        Ok(ServerMessage::Complete { id }) => {
            web_sys::console::log_1(&format!("Subscription {} complete", id).into());
        }
        Ok(ServerMessage::Ping) => {
            send(ws, &ClientMessage::Pong);
        }
        Ok(ServerMessage::Pong) => {
            // Keepalive reply; connection alive
        }
        Err(e) => {
            web_sys::console::error_1(
                &format!("Failed to parse server message: {}", e).into(),
            );
        }
    }
}

/// Dispatch a subscription delivery into the feed cache
fn handle_next(id: &str, payload: ExecutionResult, state: &GlobalState) {
    if let Some(errors) = payload.errors {
        web_sys::console::error_1(&format!("Subscription {} errors: {}", id, errors).into());
    }
    let Some(data) = payload.data else {
        return;
    };

    match id {
        NEW_LINK_OP => match serde_json::from_value::<NewLinkData>(data) {
            Ok(delivery) => state.apply_new_link(delivery.new_link),
            Err(e) => {
                web_sys::console::error_1(&format!("Bad newLink payload: {}", e).into());
            }
        },
        NEW_VOTE_OP => match serde_json::from_value::<NewVoteData>(data) {
            Ok(delivery) => state.apply_new_vote(delivery.new_vote),
            Err(e) => {
                web_sys::console::error_1(&format!("Bad newVote payload: {}", e).into());
            }
        },
        other => {
            web_sys::console::log_1(&format!("Delivery for unknown operation {}", other).into());
        }
    }
}
