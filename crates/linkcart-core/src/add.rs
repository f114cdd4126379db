//! Adding links
//!
//! The add pipeline: normalize the URL, resolve a title if the user gave none,
//! then prepend the record to the store. Only one add may be in flight at a
//! time; the [`BusyFlag`] is raised for the whole submission so a front end
//! can disable its add control and show progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::models::LinkRecord;
use crate::normalize::{normalize, NormalizeError};
use crate::resolver::{CancelToken, Resolution, TitleResolver};
use crate::storage::{Backend, StorageError};
use crate::store::Store;

/// Errors that abort an add
#[derive(Error, Debug)]
pub enum AddError {
    #[error(transparent)]
    InvalidUrl(#[from] NormalizeError),

    #[error("Another link is still being added")]
    Busy,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// User input for a new link
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    /// Raw URL text as typed
    pub url: String,
    /// Optional title; blank means "look it up"
    pub title: Option<String>,
    pub tags: Vec<String>,
}

impl Draft {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    fn explicit_title(&self) -> Option<String> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    }
}

/// Shared "add in progress" indicator
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Raise the flag unless it is already raised
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(Arc::clone(&self.0)))
    }
}

/// Lowers the busy flag when dropped
#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Result of a successful add
#[derive(Debug, Clone)]
pub struct AddOutcome {
    /// The record as stored
    pub record: LinkRecord,
    /// Title lookup outcome, if a lookup was attempted
    pub resolution: Option<Resolution>,
}

/// Runs the add pipeline against a store
#[derive(Debug, Clone, Default)]
pub struct Adder {
    resolver: Option<TitleResolver>,
    busy: BusyFlag,
}

impl Adder {
    /// `None` disables title lookups; the URL becomes the title
    pub fn new(resolver: Option<TitleResolver>) -> Self {
        Self {
            resolver,
            busy: BusyFlag::default(),
        }
    }

    /// Handle on the busy flag for progress display
    pub fn busy_flag(&self) -> BusyFlag {
        self.busy.clone()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// Validate, title and store a new link
    ///
    /// An invalid URL aborts before anything is fetched or stored. Title
    /// lookup failures and cancellation never abort: the URL is used as the
    /// title instead.
    pub async fn submit<B: Backend>(
        &self,
        store: &mut Store<B>,
        draft: Draft,
        cancel: &CancelToken,
    ) -> Result<AddOutcome, AddError> {
        let _guard = self.busy.try_acquire().ok_or(AddError::Busy)?;

        let url = normalize(&draft.url)?;

        let (title, resolution) = match (draft.explicit_title(), &self.resolver) {
            (Some(title), _) => (title, None),
            (None, Some(resolver)) => {
                let resolution = resolver.resolve(&url, cancel).await;
                debug!("Title lookup for {}: {:?}", url, resolution);
                (resolution.clone().title_or(&url), Some(resolution))
            }
            (None, None) => (url.clone(), None),
        };

        let mut record = LinkRecord::new(url);
        record.set_title(title);
        record.tags = draft.tags;

        store.add(record)?;
        let record = store.records()[0].clone();

        Ok(AddOutcome { record, resolution })
    }
}
