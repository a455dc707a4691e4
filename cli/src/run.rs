//! One end-to-end run: snapshot → engine → remote effects.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use anyhow::Context;
use chrono::Utc;
use conflictbot_core::classify::classify_pull;
use conflictbot_core::index::ConflictIndex;
use conflictbot_core::plan::{NotificationAction, NotificationDecision, plan_notifications};
use conflictbot_core::report::{render_report, report_needs_update};
use conflictbot_core::snapshot::{ExistingComment, PullSnapshot};
use conflictbot_github::GithubClient;
use futures::StreamExt;

use crate::config::Cli;

/// Upper bound on concurrent per-pull API fetches. The engine's output does
/// not depend on completion order; this is throughput only.
const FETCH_CONCURRENCY: usize = 8;

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = GithubClient::with_base_url(
        &cli.api_base,
        cli.repo.clone(),
        cli.token.as_deref(),
        cli.dry_run,
    )
    .context("constructing github client")?;

    let snapshot = fetch_snapshot(&client).await?;
    tracing::info!("fetched {} open pull requests", snapshot.len());

    let classified = snapshot
        .pulls()
        .iter()
        .map(|pull| classify_pull(pull, &cli.component_root))
        .collect();
    let index = ConflictIndex::build(classified);
    tracing::info!(
        "{} conflicting recipes, {} illegal pull requests",
        index.conflicts().count(),
        index.illegal().len()
    );

    let report = render_report(&index, &cli.repo);
    persist_report(&cli.report_path, &report)?;
    if let Some(issue) = cli.issue {
        sync_tracking_issue(&client, issue, &report).await?;
    }

    let comments = fetch_bot_comments(&client, &index).await?;
    let decisions = plan_notifications(&index, &snapshot, &comments, Utc::now());
    execute_decisions(&client, &decisions).await?;

    Ok(())
}

/// Lists open pulls, then fans out the per-pull file listings with bounded
/// concurrency. Results are keyed by number and reassembled in listing
/// order, so the snapshot is identical whatever order fetches complete in.
async fn fetch_snapshot(client: &GithubClient) -> anyhow::Result<PullSnapshot> {
    let summaries = client
        .list_open_pulls()
        .await
        .context("listing open pull requests")?;

    let mut files_by_number = HashMap::new();
    {
        let mut fetches = futures::stream::iter(summaries.iter().map(|summary| {
            let number = summary.number;
            async move { (number, client.list_pull_files(number).await) }
        }))
        .buffer_unordered(FETCH_CONCURRENCY);

        while let Some((number, files)) = fetches.next().await {
            let files = files.with_context(|| format!("listing files of #{number}"))?;
            files_by_number.insert(number, files);
        }
    }

    let pulls = summaries
        .into_iter()
        .map(|summary| {
            let files = files_by_number.remove(&summary.number).unwrap_or_default();
            summary.into_pull_request(files)
        })
        .collect();
    Ok(PullSnapshot::new(pulls))
}

fn persist_report(path: &Path, report: &str) -> anyhow::Result<()> {
    let stored = std::fs::read_to_string(path).ok();
    if !report_needs_update(stored.as_deref(), report) {
        tracing::debug!("report at {} is unchanged", path.display());
        return Ok(());
    }
    std::fs::write(path, report)
        .with_context(|| format!("writing report to {}", path.display()))?;
    tracing::info!("report written to {}", path.display());
    Ok(())
}

async fn sync_tracking_issue(
    client: &GithubClient,
    issue: u64,
    report: &str,
) -> anyhow::Result<()> {
    let stored = client
        .get_issue(issue)
        .await
        .with_context(|| format!("reading tracking issue #{issue}"))?
        .body
        .unwrap_or_default();

    if !report_needs_update(Some(&stored), report) {
        tracing::debug!("tracking issue #{issue} is up to date");
        return Ok(());
    }
    tracing::info!("updating tracking issue #{issue}");
    client
        .update_issue_body(issue, report)
        .await
        .with_context(|| format!("updating tracking issue #{issue}"))
}

/// Resolves the bot identity and collects its prior comments on every member
/// of every conflicting component, keyed by pull number.
async fn fetch_bot_comments(
    client: &GithubClient,
    index: &ConflictIndex,
) -> anyhow::Result<BTreeMap<u64, Vec<ExistingComment>>> {
    if !index.has_conflicts() {
        return Ok(BTreeMap::new());
    }

    let bot = client
        .authenticated_user()
        .await
        .context("resolving bot identity")?;
    tracing::debug!("bot identity is {} (id {})", bot.login, bot.id);
    let bot_id = bot.id;

    let members: BTreeSet<u64> = index
        .conflicts()
        .flat_map(|(_, pulls)| pulls.iter().copied())
        .collect();

    let mut by_number = BTreeMap::new();
    let mut fetches = futures::stream::iter(members.into_iter().map(|number| async move {
        (number, client.list_comments_by_user(number, bot_id).await)
    }))
    .buffer_unordered(FETCH_CONCURRENCY);

    while let Some((number, comments)) = fetches.next().await {
        let comments = comments.with_context(|| format!("listing comments of #{number}"))?;
        by_number.insert(
            number,
            comments
                .into_iter()
                .map(|comment| ExistingComment {
                    id: comment.id,
                    body: comment.body,
                })
                .collect(),
        );
    }
    Ok(by_number)
}

/// Executes Create/Update decisions sequentially. Each decision targets a
/// distinct comment, but serializing them keeps any one remote object from
/// seeing two writes in flight.
async fn execute_decisions(
    client: &GithubClient,
    decisions: &[NotificationDecision],
) -> anyhow::Result<()> {
    for decision in decisions {
        let number = decision.number;
        match &decision.action {
            NotificationAction::Skip(_) => {}
            NotificationAction::Create { body } => client
                .create_comment(number, body)
                .await
                .with_context(|| format!("creating comment on #{number}"))?,
            NotificationAction::Update { comment_id, body } => client
                .update_comment(*comment_id, body)
                .await
                .with_context(|| format!("updating comment {comment_id} on #{number}"))?,
        }
    }
    Ok(())
}
