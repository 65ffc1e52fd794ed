//! Duplicate-safe insertion into the destination collection.
//!
//! The run loop owns one [`Membership`] per destination and hands it to the
//! coordinator by `&mut`; the coordinator is its only writer.

use rustc_hash::FxHashSet;
use tracing::{debug, warn};

use crate::catalog::{CatalogApi, CollectionApi, Destination};
use crate::error::CatalogError;
use crate::models::Classification;

// ============================================================================
// Equivalent Ids
// ============================================================================

/// Storefront-equivalent id for `catalog_id`, or the input unchanged when the
/// catalog has none or the lookup fails.
pub fn equivalent_id<C: CatalogApi + ?Sized>(catalog: &C, catalog_id: &str) -> String {
    match catalog.equivalent_song_id(catalog_id) {
        Ok(Some(equivalent)) if !equivalent.is_empty() => {
            if equivalent != catalog_id {
                debug!(from = catalog_id, to = %equivalent, "using storefront equivalent");
            }
            equivalent
        }
        Ok(_) => catalog_id.to_string(),
        Err(err) => {
            debug!(id = catalog_id, error = %err, "equivalent lookup failed");
            catalog_id.to_string()
        }
    }
}

// ============================================================================
// Membership
// ============================================================================

/// Local cache of ids already in the destination collection. Grows only.
#[derive(Debug, Default, Clone)]
pub struct Membership {
    ids: FxHashSet<String>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I: IntoIterator<Item = String>>(ids: I) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn insert(&mut self, id: String) {
        self.ids.insert(id);
    }
}

// ============================================================================
// Insertion Coordinator
// ============================================================================

/// Result of one insertion attempt.
#[derive(Debug)]
pub enum InsertOutcome {
    /// Inserted; carries the id actually sent
    Ok { song_id: String },
    /// Already present, nothing sent
    Duplicate { song_id: String },
    Error { song_id: String, error: CatalogError },
}

impl InsertOutcome {
    pub fn classification(&self) -> Classification {
        match self {
            InsertOutcome::Ok { .. } => Classification::Ok,
            InsertOutcome::Duplicate { .. } => Classification::Duplicate,
            InsertOutcome::Error { .. } => Classification::Error,
        }
    }

    pub fn song_id(&self) -> &str {
        match self {
            InsertOutcome::Ok { song_id }
            | InsertOutcome::Duplicate { song_id }
            | InsertOutcome::Error { song_id, .. } => song_id,
        }
    }
}

pub struct InsertionCoordinator<'a, C: CatalogApi + CollectionApi + ?Sized> {
    client: &'a C,
    destination: &'a Destination,
}

impl<'a, C: CatalogApi + CollectionApi + ?Sized> InsertionCoordinator<'a, C> {
    pub fn new(client: &'a C, destination: &'a Destination) -> Self {
        Self {
            client,
            destination,
        }
    }

    /// Equivalent-id mapping, duplicate check, then a single insertion call.
    /// Not retried; membership is touched only on success.
    pub fn insert(&self, resolved_id: &str, membership: &mut Membership) -> InsertOutcome {
        let song_id = equivalent_id(self.client, resolved_id);

        if membership.contains(&song_id) {
            debug!(id = %song_id, "already in destination");
            return InsertOutcome::Duplicate { song_id };
        }

        match self.destination.insert(self.client, &song_id) {
            Ok(()) => {
                membership.insert(song_id.clone());
                InsertOutcome::Ok { song_id }
            }
            Err(error) => {
                warn!(
                    id = %song_id,
                    mode = ?self.destination.mode(),
                    error = %error,
                    "insertion failed"
                );
                InsertOutcome::Error { song_id, error }
            }
        }
    }
}
