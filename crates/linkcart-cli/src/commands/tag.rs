//! Tag command handlers

use anyhow::Result;

use linkcart_core::{Backend, Store};

use crate::output::Output;

/// List all tags with usage counts
pub fn list<B: Backend>(store: &Store<B>, output: &Output) -> Result<()> {
    output.print_tags(&store.tag_counts());
    Ok(())
}
