//! Bookmark command handlers

use anyhow::{bail, Context, Result};

use stash_core::{Bookmark, BookmarkStore, View};

use crate::output::Output;

/// List one view
pub async fn list(store: &BookmarkStore, view: View, output: &Output) -> Result<()> {
    store
        .load(view)
        .await
        .with_context(|| format!("Failed to load {} bookmarks", view))?;

    output.print_bookmarks(&store.snapshot().bookmarks, view);
    Ok(())
}

/// Save a new bookmark
pub async fn add(store: &BookmarkStore, url: String, output: &Output) -> Result<()> {
    let id = store
        .add_bookmark(&url)
        .await
        .context("Failed to add bookmark")?;

    output.success(&format!("Added bookmark: {}", id));
    if let Some(bookmark) = store.cached(&id) {
        output.print_bookmark(&bookmark);
    }
    Ok(())
}

/// Archive (`archive = true`) or restore a bookmark
pub async fn set_archived(
    store: &BookmarkStore,
    id: String,
    archive: bool,
    output: &Output,
) -> Result<()> {
    let view = if archive { View::Active } else { View::Archived };
    let id = load_and_resolve(store, view, &id).await?;

    match store
        .toggle_archived(&id)
        .await
        .context("Failed to update bookmark")?
    {
        Some(true) => output.success(&format!("Archived bookmark: {}", id)),
        Some(false) => output.success(&format!("Restored bookmark: {}", id)),
        None => bail!("Bookmark {} is no longer in the {} view", id, view),
    }
    Ok(())
}

/// Pin (`pin = true`) or un-pin a bookmark
pub async fn set_important(
    store: &BookmarkStore,
    id: String,
    pin: bool,
    output: &Output,
) -> Result<()> {
    let view = if pin { View::Active } else { View::Important };
    let id = load_and_resolve(store, view, &id).await?;

    // Toggling an already-pinned bookmark would un-pin it
    if store.cached(&id).is_some_and(|b| b.is_permanent == pin) {
        output.message(&format!(
            "Bookmark {} is already {}",
            id,
            if pin { "important" } else { "not important" }
        ));
        return Ok(());
    }

    match store
        .toggle_important(&id)
        .await
        .context("Failed to update bookmark")?
    {
        Some(true) => output.success(&format!("Marked important: {}", id)),
        Some(false) => output.success(&format!("No longer important: {}", id)),
        None => bail!("Bookmark {} is no longer in the {} view", id, view),
    }
    Ok(())
}

/// Re-fetch a bookmark's metadata
pub async fn refresh(store: &BookmarkStore, id: String, output: &Output) -> Result<()> {
    store
        .load_all()
        .await
        .context("Failed to load bookmarks")?;

    // Archived bookmarks are not listed; fall back to the id as given
    let id = match_id(&store.snapshot().bookmarks, &id)?.unwrap_or(id);

    let metadata = store
        .update_metadata(&id)
        .await
        .context("Failed to refresh metadata")?;

    output.success(&format!("Refreshed metadata: {}", id));
    output.print_metadata(&metadata);
    Ok(())
}

async fn load_and_resolve(store: &BookmarkStore, view: View, id: &str) -> Result<String> {
    store
        .load(view)
        .await
        .with_context(|| format!("Failed to load {} bookmarks", view))?;

    match match_id(&store.snapshot().bookmarks, id)? {
        Some(full) => Ok(full),
        None => bail!("No {} bookmark found matching: {}", view, id),
    }
}

/// Resolve a full id or unique prefix against a list
fn match_id(bookmarks: &[Bookmark], id: &str) -> Result<Option<String>> {
    // An empty prefix would match everything
    if id.trim().is_empty() {
        bail!("Bookmark ID must not be empty");
    }

    if bookmarks.iter().any(|b| b.id == id) {
        return Ok(Some(id.to_string()));
    }

    let matches: Vec<_> = bookmarks
        .iter()
        .filter(|b| b.id.starts_with(id))
        .collect();

    match matches.len() {
        0 => Ok(None),
        1 => Ok(Some(matches[0].id.clone())),
        _ => {
            eprintln!("Multiple bookmarks match '{}':", id);
            for bookmark in &matches {
                eprintln!("  {} - {}", bookmark.id, bookmark.display_title());
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmark(id: &str) -> Bookmark {
        let mut b = Bookmark::new(format!("https://{}.com", id), "u1");
        b.id = id.to_string();
        b
    }

    #[test]
    fn test_match_id_exact_and_prefix() {
        let list = vec![bookmark("abc123"), bookmark("abd456")];

        assert_eq!(match_id(&list, "abc123").unwrap().as_deref(), Some("abc123"));
        assert_eq!(match_id(&list, "abd").unwrap().as_deref(), Some("abd456"));
        assert_eq!(match_id(&list, "zzz").unwrap(), None);
    }

    #[test]
    fn test_match_id_ambiguous() {
        let list = vec![bookmark("abc123"), bookmark("abd456")];
        assert!(match_id(&list, "ab").is_err());
    }

    #[test]
    fn test_match_id_rejects_blank() {
        let list = vec![bookmark("abc123")];
        assert!(match_id(&list, "").is_err());
        assert!(match_id(&list, "   ").is_err());
    }

    #[test]
    fn test_exact_id_wins_over_longer_ids() {
        let list = vec![bookmark("abc"), bookmark("abcdef")];
        assert_eq!(match_id(&list, "abc").unwrap().as_deref(), Some("abc"));
    }
}
