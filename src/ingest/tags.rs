use chrono::Utc;
use uuid::Uuid;

use super::slug::slugify;
use crate::error::{Error, Result};
use crate::store::IngestTxn;
use crate::types::{Repository, TAG_SOURCE_GITHUB_TOPIC, TAG_TYPE_TOPIC, Tag};

/// Reconciles a repository's topics into the tag taxonomy.
///
/// Two phases: every topic is ensured as a tag row regardless of app linkage
/// (a repository may be ingested before any app claims it), then each tag is
/// associated with the apps already bound to the repository. Both phases are
/// best-effort enrichment: a failure on one topic or one association is
/// logged and skipped without aborting the surrounding transaction.
///
/// Returns the processed tags; an empty app set is a non-error condition.
pub fn reconcile(ctx: &IngestTxn<'_>, repo: &Repository) -> Vec<Tag> {
    let mut tags = Vec::new();
    for topic in &repo.topics {
        match ensure_tag(ctx, topic) {
            Ok(Some(tag)) => tags.push(tag),
            Ok(None) => {
                tracing::warn!(repo_id = %repo.id, "Skipping blank topic");
            }
            Err(e) => {
                tracing::warn!(repo_id = %repo.id, topic = %topic, "Skipping topic: {e}");
            }
        }
    }

    let app_ids = match ctx.apps().ids_for_repo(&repo.id) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(repo_id = %repo.id, "Failed to list apps for tag association: {e}");
            return tags;
        }
    };

    for app_id in &app_ids {
        for tag in &tags {
            if let Err(e) = associate(ctx, app_id, &tag.id) {
                tracing::warn!(
                    repo_id = %repo.id,
                    app_id = %app_id,
                    tag = %tag.name,
                    "Skipping app-tag association: {e}"
                );
            }
        }
    }

    tags
}

/// Idempotent create-if-absent keyed by the tag's unique name. Returns
/// `None` for blank topics, which are skipped rather than treated as errors.
fn ensure_tag(ctx: &IngestTxn<'_>, topic: &str) -> Result<Option<Tag>> {
    let name = topic.trim();
    if name.is_empty() {
        return Ok(None);
    }

    let tags = ctx.tags();
    if let Some(existing) = tags.find_by_name(name)? {
        return Ok(Some(existing));
    }

    let tag = Tag {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        slug: slugify(name),
        source: TAG_SOURCE_GITHUB_TOPIC.to_string(),
        tag_type: TAG_TYPE_TOPIC.to_string(),
        description: None,
        created_at: Utc::now(),
    };
    tags.insert_or_ignore(&tag)?;

    // A concurrent delivery may have won the insert; the surviving row is
    // canonical either way.
    tags.find_by_name(name)?
        .map(Some)
        .ok_or_else(|| Error::Integrity(format!("tag '{name}' missing after insert")))
}

fn associate(ctx: &IngestTxn<'_>, app_id: &str, tag_id: &str) -> Result<()> {
    let apps = ctx.apps();
    if !apps.has_tag(app_id, tag_id)? {
        apps.add_tag(app_id, tag_id)?;
    }
    Ok(())
}
