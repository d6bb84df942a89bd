//! Global Application State
//!
//! Reactive state management using Leptos signals, plus the feed cache
//! operations that keep it consistent under live updates.

use chrono::{DateTime, Utc};
use leptos::*;

/// Global application state provided to all components
#[derive(Clone)]
pub struct GlobalState {
    /// Links in the current feed window
    pub links: RwSignal<Vec<Link>>,
    /// Total number of links matching the feed query
    pub count: RwSignal<usize>,
    /// Feed query in flight
    pub loading: RwSignal<bool>,
    /// Error message to display
    pub error: RwSignal<Option<String>>,
    /// Success message (for toasts)
    pub success: RwSignal<Option<String>>,
    /// Live update channel status
    pub ws_connected: RwSignal<bool>,
    /// Bearer credential captured at startup; gates the vote affordance
    pub auth_token: RwSignal<Option<String>>,
}

/// A submitted link as projected by the feed query
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
    pub description: String,
    /// Absent for links submitted anonymously; renders as "Unknown"
    #[serde(default)]
    pub posted_by: Option<User>,
    #[serde(default)]
    pub votes: Vec<Vote>,
}

/// A user as projected into `postedBy`
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// A vote as projected into a link's vote collection
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Vote {
    pub id: String,
    #[serde(default)]
    pub user: Option<Voter>,
}

/// Voter identity reference
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Voter {
    pub id: String,
}

/// A newly created vote, as delivered by the vote mutation and the
/// new-vote subscription: the vote plus the affected link's full projection
#[derive(Clone, Debug, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVote {
    pub id: String,
    pub link: Link,
    #[serde(default)]
    pub user: Option<Voter>,
}

/// Provide global state to the component tree
pub fn provide_global_state(auth_token: Option<String>) {
    let state = GlobalState {
        links: create_rw_signal(Vec::new()),
        count: create_rw_signal(0),
        loading: create_rw_signal(false),
        error: create_rw_signal(None),
        success: create_rw_signal(None),
        ws_connected: create_rw_signal(false),
        auth_token: create_rw_signal(auth_token),
    };

    provide_context(state);
}

impl GlobalState {
    /// Merge a newly delivered link into the cached window.
    pub fn apply_new_link(&self, link: Link) {
        let mut merged = false;
        self.links.update(|links| merged = merge_new_link(links, link));
        if merged {
            self.count.update(|c| *c += 1);
        }
    }

    /// Merge a newly delivered vote into the cached window.
    pub fn apply_new_vote(&self, vote: NewVote) {
        self.links.update(|links| {
            merge_new_vote(links, &vote);
        });
    }

    /// Optimistically record a vote for `link_id` before the mutation
    /// settles. Returns false if a vote for that link is already pending.
    pub fn begin_vote(&self, link_id: &str) -> bool {
        let mut applied = false;
        self.links
            .update(|links| applied = apply_optimistic_vote(links, link_id));
        applied
    }

    /// Replace the optimistic vote with the vote the server created.
    pub fn confirm_vote(&self, link_id: &str, vote: NewVote) {
        self.links.update(|links| {
            remove_optimistic_vote(links, link_id);
            merge_new_vote(links, &vote);
        });
    }

    /// Drop the optimistic vote after a failed mutation.
    pub fn rollback_vote(&self, link_id: &str) {
        self.links
            .update(|links| remove_optimistic_vote(links, link_id));
    }

    /// Show a success message (auto-clears after timeout)
    pub fn show_success(&self, message: &str) {
        self.success.set(Some(message.to_string()));

        let success_signal = self.success;
        gloo_timers::callback::Timeout::new(3000, move || {
            success_signal.set(None);
        })
        .forget();
    }

    /// Show an error message (auto-clears after timeout)
    pub fn show_error(&self, message: &str) {
        self.error.set(Some(message.to_string()));

        let error_signal = self.error;
        gloo_timers::callback::Timeout::new(5000, move || {
            error_signal.set(None);
        })
        .forget();
    }
}

/// Copy of `links` ranked by descending vote count. The cached vector is
/// never sorted in place; ties keep their server (recency) order.
pub fn rank_by_votes(links: &[Link]) -> Vec<Link> {
    let mut ranked = links.to_vec();
    ranked.sort_by(|a, b| b.votes.len().cmp(&a.votes.len()));
    ranked
}

/// Prepend `link` unless a link with the same id is already cached.
/// Returns whether the link was inserted.
pub fn merge_new_link(links: &mut Vec<Link>, link: Link) -> bool {
    if links.iter().any(|l| l.id == link.id) {
        return false;
    }
    links.insert(0, link);
    true
}

/// Add `vote` to its link's vote collection unless a vote with the same id
/// is already present. Deliveries for links outside the cached window are
/// ignored. Returns whether the vote was inserted.
pub fn merge_new_vote(links: &mut [Link], vote: &NewVote) -> bool {
    let Some(link) = links.iter_mut().find(|l| l.id == vote.link.id) else {
        return false;
    };
    if link.votes.iter().any(|v| v.id == vote.id) {
        return false;
    }
    link.votes.push(Vote {
        id: vote.id.clone(),
        user: vote.user.clone(),
    });
    true
}

/// Sentinel id for a vote that has not been acknowledged by the server yet.
fn optimistic_vote_id(link_id: &str) -> String {
    format!("pending-vote-{}", link_id)
}

/// Record a not-yet-acknowledged vote for `link_id`. At most one may be
/// pending per link. Returns whether the vote was inserted.
pub fn apply_optimistic_vote(links: &mut [Link], link_id: &str) -> bool {
    let Some(link) = links.iter_mut().find(|l| l.id == link_id) else {
        return false;
    };
    let sentinel = optimistic_vote_id(link_id);
    if link.votes.iter().any(|v| v.id == sentinel) {
        return false;
    }
    link.votes.push(Vote {
        id: sentinel,
        user: None,
    });
    true
}

/// Remove the pending vote for `link_id`, if any.
pub fn remove_optimistic_vote(links: &mut [Link], link_id: &str) {
    let sentinel = optimistic_vote_id(link_id);
    if let Some(link) = links.iter_mut().find(|l| l.id == link_id) {
        link.votes.retain(|v| v.id != sentinel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(id: &str, vote_count: usize) -> Link {
        Link {
            id: id.to_string(),
            created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            url: format!("https://example.com/{}", id),
            description: format!("link {}", id),
            posted_by: Some(User {
                id: "u1".to_string(),
                name: "alice".to_string(),
            }),
            votes: (0..vote_count)
                .map(|n| Vote {
                    id: format!("{}-v{}", id, n),
                    user: Some(Voter {
                        id: format!("voter{}", n),
                    }),
                })
                .collect(),
        }
    }

    fn new_vote(vote_id: &str, target: &Link) -> NewVote {
        NewVote {
            id: vote_id.to_string(),
            link: target.clone(),
            user: Some(Voter {
                id: "u9".to_string(),
            }),
        }
    }

    #[test]
    fn test_rank_by_votes_does_not_mutate_input() {
        let links = vec![link("a", 2), link("b", 5), link("c", 1)];
        let original = links.clone();

        let ranked = rank_by_votes(&links);

        assert_eq!(links, original);
        let ids: Vec<_> = ranked.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        // Idempotent: ranking the ranked copy yields the same order
        assert_eq!(rank_by_votes(&ranked), ranked);
    }

    #[test]
    fn test_merge_new_link_prepends() {
        let mut links = vec![link("a", 0)];
        assert!(merge_new_link(&mut links, link("b", 0)));
        let ids: Vec<_> = links.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_merge_new_link_is_idempotent() {
        let mut links = vec![link("a", 0)];
        assert!(!merge_new_link(&mut links, link("a", 3)));
        assert_eq!(links.len(), 1);
        assert!(links[0].votes.is_empty());
    }

    #[test]
    fn test_merge_new_vote() {
        let mut links = vec![link("a", 1), link("b", 0)];
        let vote = new_vote("fresh", &links[0]);

        assert!(merge_new_vote(&mut links, &vote));
        assert_eq!(links[0].votes.len(), 2);

        // Redelivery is a no-op
        assert!(!merge_new_vote(&mut links, &vote));
        assert_eq!(links[0].votes.len(), 2);
    }

    #[test]
    fn test_merge_new_vote_for_unknown_link_is_ignored() {
        let mut links = vec![link("a", 0)];
        let outside = link("z", 0);
        let vote = new_vote("v", &outside);

        assert!(!merge_new_vote(&mut links, &vote));
        assert!(links[0].votes.is_empty());
    }

    #[test]
    fn test_optimistic_vote_apply_and_rollback() {
        let mut links = vec![link("a", 1)];

        assert!(apply_optimistic_vote(&mut links, "a"));
        assert_eq!(links[0].votes.len(), 2);

        // A second pending vote for the same link is refused
        assert!(!apply_optimistic_vote(&mut links, "a"));
        assert_eq!(links[0].votes.len(), 2);

        remove_optimistic_vote(&mut links, "a");
        assert_eq!(links[0].votes.len(), 1);
        assert_eq!(links[0].votes[0].id, "a-v0");
    }

    #[test]
    fn test_optimistic_vote_confirm_replaces_sentinel() {
        let mut links = vec![link("a", 0)];
        assert!(apply_optimistic_vote(&mut links, "a"));

        let vote = new_vote("server-vote", &links[0]);
        remove_optimistic_vote(&mut links, "a");
        assert!(merge_new_vote(&mut links, &vote));

        assert_eq!(links[0].votes.len(), 1);
        assert_eq!(links[0].votes[0].id, "server-vote");
    }

    #[test]
    fn test_optimistic_vote_for_unknown_link_is_refused() {
        let mut links = vec![link("a", 0)];
        assert!(!apply_optimistic_vote(&mut links, "z"));
    }
}
