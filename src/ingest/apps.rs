use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::slug::slugify;
use crate::error::Result;
use crate::store::IngestTxn;
use crate::types::{
    APP_SOURCE_WEBHOOK, APP_TYPE_APPLICATION, App, AppStatus, PublishStatus, Repository,
};

/// Brings catalog apps into agreement with the latest repository state.
///
/// Matching fans out: by `repo_id` foreign key, or by the canonical
/// `https://github.com/{full_name}` URL for apps recorded before the
/// repository was first ingested. Every match gets the repository's derived
/// fields overwritten and its `repo_id` pinned. When nothing matches, one new
/// app is synthesized in pending/offline state so the catalog picks the
/// repository up for review.
pub fn reconcile(
    ctx: &IngestTxn<'_>,
    repo: &Repository,
    now: DateTime<Utc>,
) -> Result<Vec<App>> {
    let github_url = github_url(&repo.full_name);
    let apps = ctx.apps();

    let matches = apps.find_for_repo(&repo.id, &github_url)?;
    if matches.is_empty() {
        let app = synthesize(repo, &github_url, now);
        apps.insert(&app)?;
        tracing::info!(repo_id = %repo.id, app_id = %app.id, "Synthesized app for repository");
        return Ok(vec![app]);
    }

    let mut updated = Vec::with_capacity(matches.len());
    for mut app in matches {
        apply_repository(&mut app, repo, now);
        apps.update_derived(&app)?;
        updated.push(app);
    }
    Ok(updated)
}

#[must_use]
pub fn github_url(full_name: &str) -> String {
    format!("https://github.com/{full_name}")
}

/// Overwrites an app's repository-derived fields. Metrics zero-default here,
/// and the website is only replaced by a non-blank homepage.
fn apply_repository(app: &mut App, repo: &Repository, now: DateTime<Utc>) {
    app.repo_id = Some(repo.id.clone());
    app.description = repo.description.clone();
    app.long_description = repo.localized_readme.clone().or_else(|| repo.readme.clone());
    if let Some(homepage) = &repo.homepage {
        if !homepage.trim().is_empty() {
            app.website = Some(homepage.clone());
        }
    }
    app.icon = repo.icon_url.clone();
    app.banner = repo
        .og_image_oss_url
        .clone()
        .or_else(|| repo.og_image_url.clone());
    app.stars = repo.stars.unwrap_or(0);
    app.forks = repo.forks.unwrap_or(0);
    app.watchers = repo.watchers.unwrap_or(0);
    app.contributors = repo.contributors.unwrap_or(0);
    app.pull_requests = repo.pull_requests.unwrap_or(0);
    app.releases = repo.releases.unwrap_or(0);
    app.commits = repo.commits.unwrap_or(0);
    app.last_commit_at = repo.last_commit_at;
    app.license = repo.license.clone();
    app.languages = repo.languages.clone();
    app.topics = repo.topics.clone();
    app.version = repo.latest_release_tag.clone();
    app.readme = repo.readme.clone();
    app.repo_created_at = Some(repo.created_at);
    app.default_branch = repo.default_branch.clone();
    app.last_analyzed_at = Some(now);
    app.updated_at = now;
}

/// A fresh app for a repository nothing tracks yet: pending review, offline,
/// unanalyzed, unfeatured, unverified.
fn synthesize(repo: &Repository, github_url: &str, now: DateTime<Utc>) -> App {
    let mut app = App {
        id: Uuid::new_v4().to_string(),
        slug: slugify(&repo.name),
        name: repo.name.clone(),
        repo_id: None,
        github: Some(github_url.to_string()),
        website: None,
        description: None,
        long_description: None,
        icon: None,
        banner: None,
        stars: 0,
        forks: 0,
        watchers: 0,
        contributors: 0,
        pull_requests: 0,
        releases: 0,
        commits: 0,
        last_commit_at: None,
        license: None,
        languages: Vec::new(),
        topics: Vec::new(),
        version: None,
        readme: None,
        app_type: APP_TYPE_APPLICATION.to_string(),
        source: APP_SOURCE_WEBHOOK.to_string(),
        status: AppStatus::Pending,
        publish_status: PublishStatus::Offline,
        analysed: false,
        featured: false,
        verified: false,
        deleted: false,
        repo_created_at: None,
        default_branch: None,
        last_analyzed_at: None,
        created_at: now,
        updated_at: now,
    };
    apply_repository(&mut app, repo, now);
    // Synthesized rows have never been through analysis, whatever the
    // crawler reported.
    app.analysed = false;
    app.last_analyzed_at = None;
    app
}
