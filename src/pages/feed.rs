//! Feed Page
//!
//! Paginated, sortable list of submitted links with live updates.
//!
//! Two routes share this page: the default route ("/") shows the top links
//! re-ranked by vote count, the "new" route ("/new/:page") shows a
//! recency-ordered window with pager controls.

use leptos::*;
use leptos_router::*;

use crate::api::ApiClient;
use crate::components::{LinkRow, Loading};
use crate::state::global::{rank_by_votes, GlobalState};
use crate::state::start_live_feed;

/// Window size on the paginated route
pub const LINKS_PER_PAGE: usize = 10;

/// Window size on the default route
pub const TOP_FEED_TAKE: usize = 100;

/// Feed page component
#[component]
pub fn Feed() -> impl IntoView {
    let state = use_context::<GlobalState>().expect("GlobalState not found");
    let client = use_context::<ApiClient>().expect("ApiClient not found");

    let location = use_location();
    let route = create_memo(move |_| {
        let path = location.pathname.get();
        (is_new_route(&path), parse_page(&path))
    });

    // Query failures are surfaced in place of the list, not as a toast
    let (query_error, set_query_error) = create_signal(None::<String>);

    // Re-query whenever the route-derived variables change. A stale response
    // is dropped once navigation has bumped the epoch past it.
    let fetch_epoch = store_value(0u64);
    let state_for_fetch = state.clone();
    let client_for_fetch = client.clone();
    create_effect(move |_| {
        let (is_new, page) = route.get();
        let (take, skip) = query_window(is_new, page, LINKS_PER_PAGE);

        fetch_epoch.set_value(fetch_epoch.get_value() + 1);
        let epoch = fetch_epoch.get_value();

        let state = state_for_fetch.clone();
        let client = client_for_fetch.clone();
        spawn_local(async move {
            state.loading.set(true);
            set_query_error.set(None);

            let result = client.fetch_feed(take, skip).await;

            let still_current = fetch_epoch
                .try_get_value()
                .map(|current| current == epoch)
                .unwrap_or(false);
            if !still_current {
                return;
            }

            match result {
                Ok(feed) => {
                    state.links.set(feed.links);
                    state.count.set(feed.count);
                }
                Err(e) => set_query_error.set(Some(e)),
            }
            state.loading.set(false);
        });
    });

    // Subscriptions live exactly as long as this page is mounted
    let live = start_live_feed(state.clone(), &client);
    on_cleanup(move || live.close());

    let links = state.links;
    let count = state.count;
    let loading = state.loading;

    view! {
        <div>
            {move || {
                if loading.get() {
                    return view! { <Loading /> }.into_view();
                }
                if let Some(message) = query_error.get() {
                    return view! {
                        <pre class="bg-gray-800 text-red-400 rounded-lg p-4 overflow-x-auto">
                            {message}
                        </pre>
                    }
                    .into_view();
                }

                let (is_new, page) = route.get();
                let visible = if is_new {
                    links.get()
                } else {
                    rank_by_votes(&links.get())
                };
                let offset = if is_new { (page - 1) * LINKS_PER_PAGE } else { 0 };

                view! {
                    <div>
                        {visible
                            .into_iter()
                            .enumerate()
                            .map(|(i, link)| view! { <LinkRow link=link index={offset + i} /> })
                            .collect_view()}
                        {is_new.then(|| view! { <Pager page=page count=count.get() /> })}
                    </div>
                }
                .into_view()
            }}
        </div>
    }
}

/// Previous/Next controls, shown only on the paginated route
#[component]
fn Pager(page: usize, count: usize) -> impl IntoView {
    let navigate = use_navigate();
    let nav_prev = navigate.clone();

    let has_prev = page > 1;
    let has_next = has_next_page(page, count, LINKS_PER_PAGE);

    view! {
        <div class="flex items-center space-x-3 mt-6 ml-8 text-gray-400">
            <button
                on:click=move |_| {
                    if has_prev {
                        nav_prev(&format!("/new/{}", page - 1), Default::default());
                    }
                }
                disabled=!has_prev
                class="px-3 py-1 rounded hover:text-white disabled:opacity-40 disabled:hover:text-gray-400"
            >
                "Previous"
            </button>
            <button
                on:click=move |_| {
                    if has_next {
                        navigate(&format!("/new/{}", page + 1), Default::default());
                    }
                }
                disabled=!has_next
                class="px-3 py-1 rounded hover:text-white disabled:opacity-40 disabled:hover:text-gray-400"
            >
                "Next"
            </button>
        </div>
    }
}

/// Whether the path is the paginated "new" view
pub fn is_new_route(pathname: &str) -> bool {
    pathname.starts_with("/new")
}

/// 1-based page from the trailing path segment; non-numeric or missing
/// segments default to page 1.
pub fn parse_page(pathname: &str) -> usize {
    pathname
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse::<usize>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}

/// Query window (take, skip) for the current route
pub fn query_window(is_new_page: bool, page: usize, page_size: usize) -> (usize, usize) {
    if is_new_page {
        (page_size, (page - 1) * page_size)
    } else {
        (TOP_FEED_TAKE, 0)
    }
}

/// Whether a further page exists: page N is the last once N x page_size
/// exceeds the total count.
pub fn has_next_page(page: usize, count: usize, page_size: usize) -> bool {
    page * page_size <= count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        assert_eq!(parse_page("/new/2"), 2);
        assert_eq!(parse_page("/new/17"), 17);
        assert_eq!(parse_page("/new"), 1);
        assert_eq!(parse_page("/new/abc"), 1);
        assert_eq!(parse_page("/new/0"), 1);
        assert_eq!(parse_page("/"), 1);
    }

    #[test]
    fn test_query_window_paginated() {
        assert_eq!(query_window(true, 1, 10), (10, 0));
        assert_eq!(query_window(true, 2, 10), (10, 10));
        assert_eq!(query_window(true, 5, 10), (10, 40));
    }

    #[test]
    fn test_query_window_default_route_ignores_page() {
        assert_eq!(query_window(false, 1, 10), (TOP_FEED_TAKE, 0));
        assert_eq!(query_window(false, 7, 10), (TOP_FEED_TAKE, 0));
    }

    #[test]
    fn test_has_next_page() {
        // count=15: page 1 has a next page, page 2 is the last
        assert!(has_next_page(1, 15, 10));
        assert!(!has_next_page(2, 15, 10));

        // count=20: page 2 is exactly full, so it is still reachable
        assert!(has_next_page(2, 20, 10));
        assert!(!has_next_page(3, 20, 10));

        assert!(!has_next_page(1, 0, 10));
    }

    #[test]
    fn test_route_detection() {
        assert!(is_new_route("/new"));
        assert!(is_new_route("/new/3"));
        assert!(!is_new_route("/"));
    }
}
