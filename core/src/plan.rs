//! Notification planning: per conflicting pull request, decide whether a
//! conflict comment must be created, updated, or left alone.
//!
//! Planning is pure: the clock and the already-fetched bot comments are
//! parameters, and the payload text is a deterministic function of
//! `(component, other pull numbers)`. Re-running the planner over an
//! unchanged snapshot yields only `Skip` decisions, which is what makes the
//! whole bot safe to run from a cron loop.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::component::ComponentId;
use crate::index::ConflictIndex;
use crate::snapshot::{ExistingComment, PullRequest, PullSnapshot};

/// Pulls not updated within this many days are treated as abandoned and are
/// not bothered with notifications.
pub const FRESHNESS_WINDOW_DAYS: i64 = 15;

/// Label marking a pull request as abandoned by the repository's triage
/// automation.
pub const STALE_LABEL: &str = "stale";

/// Why a pull request was left alone this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The pull carries the stale label.
    StaleLabel,
    /// The pull has not been updated within the freshness window.
    Inactive,
    /// The author's own pull body already references every conflicting pull.
    AuthorAcknowledged,
    /// Our existing comment already references every conflicting pull.
    CommentCurrent,
}

/// What to do about one (pull request, component) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationAction {
    /// No remote effect.
    Skip(SkipReason),
    /// Post a new comment with the given body.
    Create { body: String },
    /// Replace the identified comment's body.
    Update { comment_id: u64, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationDecision {
    pub number: u64,
    pub component: ComponentId,
    pub action: NotificationAction,
}

/// Source of the bot's own prior comments, assembled by the collaborator.
///
/// The collaborator resolves "authored by the bot" against the authenticated
/// user id it was handed; the planner only matches comment bodies against the
/// notification marker.
pub trait CommentLookup {
    /// All bot-authored comments on the given pull request.
    fn bot_comments(&self, number: u64) -> &[ExistingComment];
}

impl CommentLookup for std::collections::BTreeMap<u64, Vec<ExistingComment>> {
    fn bot_comments(&self, number: u64) -> &[ExistingComment] {
        self.get(&number).map(Vec::as_slice).unwrap_or(&[])
    }
}

impl CommentLookup for std::collections::HashMap<u64, Vec<ExistingComment>> {
    fn bot_comments(&self, number: u64) -> &[ExistingComment] {
        self.get(&number).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// First line of a conflict notification for `component`.
///
/// Doubles as the lookup prefix that identifies our comment among the bot's
/// other comments on the same pull request, so it must stay fixed per
/// component.
pub fn notification_marker(component: &ComponentId) -> String {
    format!("I detected other pull requests that are modifying {component} recipe:\n")
}

/// Full notification payload for `component`, naming `others`.
pub fn render_notification(component: &ComponentId, others: &[u64]) -> String {
    let mut body = notification_marker(component);
    for number in others {
        body.push_str(&format!("- #{number}\n"));
    }
    body.push('\n');
    body.push_str(
        "This message is posted automatically and is refreshed whenever the \
         set of conflicting pull requests changes.\n",
    );
    body
}

/// The idempotence predicate: does `text` already reference every number?
///
/// A reference is the substring `#<n>` or `/<n>` anywhere in the text. The
/// `/<n>` form accepts pull request URLs, at the cost of false positives on
/// unrelated path-like text containing the same digits.
pub fn references_all(text: &str, numbers: &[u64]) -> bool {
    if text.is_empty() {
        return false;
    }
    numbers
        .iter()
        .all(|number| text.contains(&format!("#{number}")) || text.contains(&format!("/{number}")))
}

/// Plans notifications for every member of every conflicting component.
///
/// Decisions come out grouped by component (sorted), members in registration
/// order, so the same inputs produce the same decision sequence.
pub fn plan_notifications(
    index: &ConflictIndex,
    snapshot: &PullSnapshot,
    comments: &impl CommentLookup,
    now: DateTime<Utc>,
) -> Vec<NotificationDecision> {
    let mut decisions = Vec::new();
    for (component, members) in index.conflicts() {
        for &number in members {
            let Some(pull) = snapshot.get(number) else {
                continue;
            };
            let others = index.conflicting_partners(component, number);
            let action = decide(component, pull, &others, comments, now);
            log_decision(component, number, &action);
            decisions.push(NotificationDecision {
                number,
                component: component.clone(),
                action,
            });
        }
    }
    decisions
}

fn decide(
    component: &ComponentId,
    pull: &PullRequest,
    others: &[u64],
    comments: &impl CommentLookup,
    now: DateTime<Utc>,
) -> NotificationAction {
    if pull.has_label(STALE_LABEL) {
        return NotificationAction::Skip(SkipReason::StaleLabel);
    }
    if pull.updated_at < now - Duration::days(FRESHNESS_WINDOW_DAYS) {
        return NotificationAction::Skip(SkipReason::Inactive);
    }
    if references_all(&pull.body, others) {
        return NotificationAction::Skip(SkipReason::AuthorAcknowledged);
    }

    let marker = notification_marker(component);
    let existing = comments
        .bot_comments(pull.number)
        .iter()
        .find(|comment| comment.body.starts_with(&marker));

    match existing {
        None => NotificationAction::Create {
            body: render_notification(component, others),
        },
        Some(comment) if references_all(&comment.body, others) => {
            NotificationAction::Skip(SkipReason::CommentCurrent)
        }
        Some(comment) => NotificationAction::Update {
            comment_id: comment.id,
            body: render_notification(component, others),
        },
    }
}

fn log_decision(component: &ComponentId, number: u64, action: &NotificationAction) {
    match action {
        NotificationAction::Skip(SkipReason::StaleLabel) => {
            tracing::warn!("skipping #{number} message because the pull request is stale");
        }
        NotificationAction::Skip(SkipReason::Inactive) => {
            tracing::warn!(
                "skipping #{number} message because the pull request has been inactive \
                 for over {FRESHNESS_WINDOW_DAYS} days"
            );
        }
        NotificationAction::Skip(SkipReason::AuthorAcknowledged) => {
            tracing::warn!(
                "all pull requests conflicting on {component} are already referenced \
                 in #{number}, skipping message"
            );
        }
        NotificationAction::Skip(SkipReason::CommentCurrent) => {
            tracing::debug!("existing comment on #{number} is current for {component}");
        }
        NotificationAction::Create { .. } => {
            tracing::debug!("will create conflict comment on #{number} for {component}");
        }
        NotificationAction::Update { comment_id, .. } => {
            tracing::debug!(
                "will update comment {comment_id} on #{number} for {component}"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::classify::ClassifiedPull;
    use pretty_assertions::assert_eq;
    use std::collections::{BTreeMap, BTreeSet};

    fn component() -> ComponentId {
        ComponentId::new("zlib", "1.2")
    }

    fn index_of(numbers: &[u64]) -> ConflictIndex {
        ConflictIndex::build(
            numbers
                .iter()
                .map(|&number| ClassifiedPull {
                    number,
                    components: BTreeSet::from([component()]),
                    illegal: false,
                })
                .collect(),
        )
    }

    fn pull(number: u64, body: &str, age_days: i64, labels: &[&str]) -> PullRequest {
        PullRequest {
            number,
            body: body.to_string(),
            updated_at: Utc::now() - Duration::days(age_days),
            labels: labels.iter().map(ToString::to_string).collect(),
            files: vec![],
        }
    }

    fn no_comments() -> BTreeMap<u64, Vec<ExistingComment>> {
        BTreeMap::new()
    }

    fn action_for(decisions: &[NotificationDecision], number: u64) -> &NotificationAction {
        &decisions
            .iter()
            .find(|decision| decision.number == number)
            .expect("decision for pull")
            .action
    }

    #[test]
    fn references_all_accepts_hash_and_slash_forms() {
        assert!(references_all("see #7", &[7]));
        assert!(references_all("see https://github.com/acme/repo/pull/7", &[7]));
        assert!(!references_all("see #7", &[7, 9]));
        assert!(references_all("see #7 and #9", &[7, 9]));
        assert!(!references_all("", &[7]));
        // Known fragility: any `/<n>` substring counts as a reference.
        assert!(references_all("path/12/file", &[12]));
    }

    #[test]
    fn fresh_unacknowledged_pulls_get_create_decisions() {
        let snapshot = PullSnapshot::new(vec![pull(1, "", 0, &[]), pull(2, "", 0, &[])]);
        let decisions =
            plan_notifications(&index_of(&[1, 2]), &snapshot, &no_comments(), Utc::now());

        assert_eq!(decisions.len(), 2);
        match action_for(&decisions, 1) {
            NotificationAction::Create { body } => {
                assert!(body.starts_with(&notification_marker(&component())));
                assert!(body.contains("- #2\n"));
                assert!(!body.contains("- #1\n"));
            }
            other => panic!("expected Create, got {other:?}"),
        }
        match action_for(&decisions, 2) {
            NotificationAction::Create { body } => assert!(body.contains("- #1\n")),
            other => panic!("expected Create, got {other:?}"),
        }
    }

    #[test]
    fn stale_label_and_inactivity_suppress_notifications() {
        let snapshot = PullSnapshot::new(vec![
            pull(1, "", 0, &["stale"]),
            pull(2, "", 30, &[]),
            pull(3, "", 0, &[]),
        ]);
        let decisions =
            plan_notifications(&index_of(&[1, 2, 3]), &snapshot, &no_comments(), Utc::now());

        assert_eq!(
            action_for(&decisions, 1),
            &NotificationAction::Skip(SkipReason::StaleLabel)
        );
        assert_eq!(
            action_for(&decisions, 2),
            &NotificationAction::Skip(SkipReason::Inactive)
        );
        assert!(matches!(
            action_for(&decisions, 3),
            NotificationAction::Create { .. }
        ));
    }

    #[test]
    fn author_body_referencing_all_partners_skips() {
        let snapshot = PullSnapshot::new(vec![
            pull(1, "depends on #7, see there", 0, &[]),
            pull(7, "", 0, &[]),
        ]);
        let decisions =
            plan_notifications(&index_of(&[1, 7]), &snapshot, &no_comments(), Utc::now());

        assert_eq!(
            action_for(&decisions, 1),
            &NotificationAction::Skip(SkipReason::AuthorAcknowledged)
        );
        assert!(matches!(
            action_for(&decisions, 7),
            NotificationAction::Create { .. }
        ));
    }

    #[test]
    fn current_comment_skips_and_outgrown_comment_updates() {
        let snapshot = PullSnapshot::new(vec![
            pull(1, "", 0, &[]),
            pull(7, "", 0, &[]),
            pull(9, "", 0, &[]),
        ]);
        // Comment from a previous run when only #7 conflicted with #1.
        let previous = render_notification(&component(), &[7]);
        let comments = BTreeMap::from([(1, vec![ExistingComment { id: 501, body: previous }])]);

        let decisions =
            plan_notifications(&index_of(&[1, 7, 9]), &snapshot, &comments, Utc::now());

        match action_for(&decisions, 1) {
            NotificationAction::Update { comment_id, body } => {
                assert_eq!(*comment_id, 501);
                assert!(body.contains("- #7\n"));
                assert!(body.contains("- #9\n"));
            }
            other => panic!("expected Update, got {other:?}"),
        }

        // Re-running with the refreshed comment body converges to Skip.
        let refreshed = render_notification(&component(), &[7, 9]);
        let comments = BTreeMap::from([(1, vec![ExistingComment { id: 501, body: refreshed }])]);
        let decisions =
            plan_notifications(&index_of(&[1, 7, 9]), &snapshot, &comments, Utc::now());
        assert_eq!(
            action_for(&decisions, 1),
            &NotificationAction::Skip(SkipReason::CommentCurrent)
        );
    }

    #[test]
    fn unrelated_bot_comments_do_not_match_the_marker() {
        let snapshot = PullSnapshot::new(vec![pull(1, "", 0, &[]), pull(2, "", 0, &[])]);
        let comments = BTreeMap::from([(
            1,
            vec![ExistingComment {
                id: 77,
                body: "Some other bot announcement mentioning #2".to_string(),
            }],
        )]);

        let decisions =
            plan_notifications(&index_of(&[1, 2]), &snapshot, &comments, Utc::now());
        assert!(matches!(
            action_for(&decisions, 1),
            NotificationAction::Create { .. }
        ));
    }

    #[test]
    fn payload_is_deterministic() {
        let others = [7, 9];
        assert_eq!(
            render_notification(&component(), &others),
            render_notification(&component(), &others)
        );
    }
}
