//! Link Row Component
//!
//! One feed entry: rank, vote affordance, description, vote count, author
//! and relative age.

use leptos::*;

use crate::api::ApiClient;
use crate::state::global::{GlobalState, Link};
use crate::time::time_ago;

/// A single link in the feed. `index` is the zero-based display rank,
/// already adjusted for the page offset by the caller.
#[component]
pub fn LinkRow(link: Link, index: usize) -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let client = use_context::<ApiClient>().expect("ApiClient not found");

    let auth_token = state.auth_token;

    let vote_count = link.votes.len();
    let author = link
        .posted_by
        .as_ref()
        .map(|user| user.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let posted = time_ago(link.created_at);
    let url = link.url.clone();
    let description = link.description.clone();

    // Optimistic vote: count bumps immediately, rolls back if the mutation
    // fails. At most one vote per link may be pending at a time.
    let vote_link_id = link.id.clone();
    let on_vote = move |_: ev::MouseEvent| {
        let state = state.clone();
        let client = client.clone();
        let link_id = vote_link_id.clone();

        if !state.begin_vote(&link_id) {
            return;
        }
        spawn_local(async move {
            match client.submit_vote(&link_id).await {
                Ok(vote) => {
                    state.confirm_vote(&link_id, vote);
                    state.show_success("Vote recorded");
                }
                Err(e) => {
                    state.rollback_vote(&link_id);
                    state.show_error(&format!("Vote failed: {}", e));
                }
            }
        });
    };

    view! {
        <div class="flex items-start mt-2">
            <div class="flex items-center text-gray-400">
                <span>{index + 1}"."</span>
                // Only signed-in users can vote
                {move || {
                    auth_token.get().is_some().then(|| {
                        let on_vote = on_vote.clone();
                        view! {
                            <button
                                on:click=on_vote
                                class="ml-1 cursor-pointer hover:text-orange-400"
                            >
                                "▲"
                            </button>
                        }
                    })
                }}
            </div>
            <div class="ml-2">
                <div>
                    {description}
                    " ("
                    <a
                        href=url.clone()
                        target="_blank"
                        class="text-gray-400 hover:underline"
                    >
                        {url}
                    </a>
                    ")"
                </div>
                <div class="text-sm text-gray-400">
                    {vote_count} " votes | by " {author} " " {posted}
                </div>
            </div>
        </div>
    }
}
