use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::store::IngestTxn;
use crate::types::{Repository, RepositoryPayload};

/// Creates or updates the canonical repository record from a validated
/// payload. Lookup is by external id or full name, so a renamed repository
/// keeps its row. Returns the persisted row; a missing row after the write
/// aborts the transaction as an integrity error.
pub fn upsert(
    ctx: &IngestTxn<'_>,
    payload: &RepositoryPayload,
    now: DateTime<Utc>,
) -> Result<Repository> {
    let repos = ctx.repositories();
    let existing = repos.find(&payload.id, &payload.full_name)?;

    let repo = from_payload(payload, now);
    match existing {
        Some(existing) => repos.update(&existing.id, &repo)?,
        None => repos.insert(&repo)?,
    }

    repos
        .find(&payload.id, &payload.full_name)?
        .ok_or_else(|| {
            Error::Integrity(format!("repository {} missing after upsert", payload.id))
        })
}

/// Field mapping from the wire payload. Numeric metrics stay `None` when
/// absent; the snapshot layer is the one that zero-defaults.
fn from_payload(payload: &RepositoryPayload, now: DateTime<Utc>) -> Repository {
    let release = payload.latest_release.as_ref();

    Repository {
        id: payload.id.clone(),
        full_name: payload.full_name.clone(),
        name: payload.name.clone(),
        owner: payload.owner.clone(),
        owner_id: payload.owner_id.clone(),
        description: payload.description.clone(),
        localized_description: payload.localized_description.clone(),
        homepage: payload.homepage.clone(),
        topics: payload.topics.clone(),
        languages: payload.language_names(),
        license: payload.license.clone(),
        default_branch: payload.default_branch.clone(),
        archived: payload.archived.unwrap_or(false),
        stars: payload.stars,
        forks: payload.forks,
        watchers: payload.watchers,
        contributors: payload.contributors,
        pull_requests: payload.pull_requests,
        releases: payload.releases,
        commits: payload.commits,
        readme: payload.readme.clone(),
        localized_readme: payload.localized_readme.clone(),
        latest_release_name: release.and_then(|r| r.name.clone()),
        latest_release_tag: release.and_then(|r| r.tag_name.clone()),
        latest_release_published_at: release.and_then(|r| r.published_at),
        latest_release_url: release.and_then(|r| r.url.clone()),
        latest_release_description: release.and_then(|r| r.description.clone()),
        icon_url: payload.icon_url.clone(),
        og_image_url: payload.og_image_url.clone(),
        og_image_oss_url: payload.og_image_oss_url.clone(),
        created_at: payload.created_at,
        pushed_at: payload.pushed_at,
        last_commit_at: payload.last_commit_at,
        added_at: payload.added_at,
        updated_at: now,
    }
}
