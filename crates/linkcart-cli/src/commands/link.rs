//! Link command handlers

use anyhow::{bail, Context, Result};

use linkcart_core::{
    cancel_pair, parse_tags, AddError, Adder, Backend, Config, Draft, Filter, LinkId, LinkPatch,
    LinkRecord, LookupError, Resolution, Store, TitleResolver,
};

use super::storage_error;
use crate::output::Output;
use crate::prompt::{confirm, is_interactive, prompt_optional, prompt_with_default};

/// Arguments for `add`
pub struct AddArgs {
    pub url: String,
    pub title: Option<String>,
    /// Raw `--tag` values, each possibly comma-separated
    pub tags: Vec<String>,
    /// Look up the page title when none is given
    pub fetch_title: bool,
}

/// Save a new link
///
/// Ctrl-C while the title is being fetched cancels the lookup; the link is
/// still saved with its URL as title.
pub async fn add<B: Backend>(
    store: &mut Store<B>,
    config: &Config,
    args: AddArgs,
    output: &Output,
) -> Result<()> {
    let resolver = if args.fetch_title {
        Some(TitleResolver::from_config(config).context("Failed to create HTTP client")?)
    } else {
        None
    };
    let adder = Adder::new(resolver);

    let mut draft = Draft::new(args.url).tags(collect_tags(&args.tags));
    if let Some(title) = args.title {
        draft = draft.title(title);
    }

    let (cancel, token) = cancel_pair();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    output.progress("Adding...");
    let result = adder.submit(store, draft, &token).await;
    interrupt.abort();

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(AddError::Storage(e)) => return Err(storage_error(e)),
        Err(e) => return Err(e.into()),
    };

    if outcome.resolution == Some(Resolution::Cancelled) {
        output.progress("Title lookup cancelled, using the URL as title.");
    }

    output.success(&format!("Added link: {}", outcome.record.id));
    output.print_link(&outcome.record);

    Ok(())
}

/// List links, optionally filtered
pub fn list<B: Backend>(
    store: &Store<B>,
    tag: Option<String>,
    search: Option<String>,
    favorites: bool,
    output: &Output,
) -> Result<()> {
    let mut filter = Filter::new().favorites_only(favorites);
    if let Some(tag) = tag {
        filter = filter.tag(tag);
    }
    if let Some(text) = search {
        filter = filter.text(text);
    }

    output.print_links(&store.filter(&filter));
    Ok(())
}

/// Search links by text, optionally within a tag
pub fn search<B: Backend>(
    store: &Store<B>,
    text: String,
    tag: Option<String>,
    output: &Output,
) -> Result<()> {
    list(store, tag, Some(text), false, output)
}

/// Show a single link
pub fn show<B: Backend>(store: &Store<B>, id: String, output: &Output) -> Result<()> {
    let link = find_link(store, &id)?;
    output.print_link(link);
    Ok(())
}

/// Edit a link
///
/// With no flags, prompts for each field interactively.
pub fn edit<B: Backend>(
    store: &mut Store<B>,
    id: String,
    title: Option<String>,
    tags: Vec<String>,
    output: &Output,
) -> Result<()> {
    let link = find_link(store, &id)?.clone();

    let patch = if title.is_none() && tags.is_empty() {
        if !is_interactive() {
            bail!("Nothing to change. Pass --title or --tag, or run interactively.");
        }
        prompt_patch(&link)?
    } else {
        let mut patch = LinkPatch::default();
        if let Some(title) = title {
            patch = patch.title(title);
        }
        if !tags.is_empty() {
            patch = patch.tags(collect_tags(&tags));
        }
        patch
    };

    if patch.is_empty() {
        output.message("No changes.");
        return Ok(());
    }

    let updated = store
        .update(&link.id, patch)
        .map_err(storage_error)?
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?;

    output.success("Link updated");
    output.print_link(&updated);

    Ok(())
}

/// Toggle a link's favorite flag
pub fn favorite<B: Backend>(store: &mut Store<B>, id: String, output: &Output) -> Result<()> {
    let link_id = find_link(store, &id)?.id.clone();

    let favorite = store
        .toggle_favorite(&link_id)
        .map_err(storage_error)?
        .ok_or_else(|| anyhow::anyhow!("Link not found: {}", id))?;

    if favorite {
        output.success(&format!("Marked as favorite: {}", link_id.short()));
    } else {
        output.success(&format!("Removed from favorites: {}", link_id.short()));
    }

    Ok(())
}

/// Delete a link
///
/// Asks for confirmation unless `yes` is set. Without a terminal to ask on,
/// nothing is deleted.
pub fn remove<B: Backend>(
    store: &mut Store<B>,
    id: String,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let link_id = find_link(store, &id)?.id.clone();

    let removed = store
        .remove(&link_id, |link| {
            if yes {
                return true;
            }
            if !output.should_prompt() {
                return false;
            }
            println!("Delete link: {} - {}", link.id.short(), link.title);
            confirm("Are you sure?").unwrap_or(false)
        })
        .map_err(storage_error)?;

    match removed {
        Some(link) => output.success(&format!("Deleted link: {}", link.id)),
        None => output.message("Cancelled."),
    }

    Ok(())
}

/// Open a link in the system browser
pub fn open<B: Backend>(store: &Store<B>, id: String, output: &Output) -> Result<()> {
    let link = find_link(store, &id)?;

    open::that(&link.url).with_context(|| format!("Failed to open {}", link.url))?;

    output.success(&format!("Opened {}", link.url));
    Ok(())
}

/// Resolve a full ID or unique prefix, listing candidates when ambiguous
fn find_link<'a, B: Backend>(store: &'a Store<B>, id: &str) -> Result<&'a LinkRecord> {
    match store.find_by_prefix(id) {
        Ok(link) => Ok(link),
        Err(LookupError::Ambiguous { prefix, candidates }) => {
            eprintln!("Multiple links match '{}':", prefix);
            for link in candidates.iter().filter_map(|c: &LinkId| store.get(c)) {
                eprintln!("  {} - {}", link.id, link.title);
            }
            Err(LookupError::Ambiguous { prefix, candidates }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Flatten repeated, comma-separated tag arguments
fn collect_tags(raw: &[String]) -> Vec<String> {
    raw.iter().flat_map(|value| parse_tags(value)).collect()
}

fn prompt_patch(link: &LinkRecord) -> Result<LinkPatch> {
    println!("Editing link: {}", link.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let mut patch = LinkPatch::default();

    if let Some(new_title) = prompt_with_default("Title", &link.title)? {
        patch = patch.title(new_title);
    }

    let current_tags = link.tags.join(", ");
    println!(
        "Current tags: {}",
        if current_tags.is_empty() {
            "(none)"
        } else {
            &current_tags
        }
    );
    if let Some(new_tags) = prompt_optional("New tags (comma-separated)")? {
        patch = patch.tags(parse_tags(&new_tags));
    }

    Ok(patch)
}
