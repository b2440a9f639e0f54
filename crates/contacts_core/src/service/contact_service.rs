//! Contact use-case service.
//!
//! # Responsibility
//! - Provide the entry points the form layer calls: save, delete, load page.
//! - Delegate persistence to any `ContactRepository`.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::db::SchemaOutcome;
use crate::model::contact::{Contact, ContactId};
use crate::model::page::{clamp_page_number, ContactPage, PageRequest};
use crate::repo::contact_repo::{ContactRepository, RepoResult};

/// A loaded page plus the page number that was actually served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServedPage {
    pub page_number: u32,
    pub page: ContactPage,
}

/// Use-case service wrapper for contact operations.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Brings storage to the current schema. Called once at startup.
    pub fn ensure_schema(&self) -> RepoResult<SchemaOutcome> {
        self.repo.ensure_schema()
    }

    /// Inserts unsaved contacts and overwrites saved ones.
    ///
    /// # Contract
    /// - Unsaved (`id == 0`): duplicate-suppressed insert; returns the new or
    ///   existing id.
    /// - Saved: full overwrite; returns the contact's own id.
    pub fn save(&self, contact: &Contact) -> RepoResult<ContactId> {
        if contact.is_saved() {
            self.repo.update(contact)?;
            Ok(contact.id)
        } else {
            self.repo.insert(contact)
        }
    }

    pub fn insert(&self, contact: &Contact) -> RepoResult<ContactId> {
        self.repo.insert(contact)
    }

    pub fn update(&self, contact: &Contact) -> RepoResult<()> {
        self.repo.update(contact)
    }

    pub fn delete(&self, id: ContactId) -> RepoResult<()> {
        self.repo.delete(id)
    }

    pub fn get_by_id(&self, id: ContactId) -> RepoResult<Option<Contact>> {
        self.repo.get_by_id(id)
    }

    pub fn get_all(&self) -> RepoResult<Vec<Contact>> {
        self.repo.get_all()
    }

    /// Loads one page exactly as requested; out-of-range pages come back empty.
    pub fn get_page(&self, request: &PageRequest) -> RepoResult<ContactPage> {
        self.repo.get_page(request)
    }

    /// Loads a page, stepping back to the last page when the request is past
    /// the end (for example after deleting the only row on the last page).
    pub fn get_page_clamped(&self, request: &PageRequest) -> RepoResult<ServedPage> {
        let page = self.repo.get_page(request)?;
        let clamped = clamp_page_number(request.page_number, page.total, request.page_size);
        if clamped == request.page_number {
            return Ok(ServedPage {
                page_number: clamped,
                page,
            });
        }

        let retry = PageRequest {
            page_number: clamped,
            ..request.clone()
        };
        Ok(ServedPage {
            page_number: clamped,
            page: self.repo.get_page(&retry)?,
        })
    }
}
