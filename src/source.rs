//! External collaborator interfaces.
//!
//! The collector and link resolver only see these traits; the Google Scholar
//! and arXiv clients are one implementation each.

use crate::error::Result;
use crate::record::PublicationRecord;
use async_trait::async_trait;

/// A resolved author profile on the profile source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectHandle {
    /// Source-specific profile id (Google Scholar `user=` value)
    pub id: String,
    pub name: String,
    pub affiliation: String,
}

/// One row of a subject's publication list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicationRef {
    /// Source-specific id used to fetch the detail record
    pub id: String,
    pub title: String,
    pub year: String,
    pub citation_count: Option<u64>,
}

/// Full record as returned by the detail lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicationDetail {
    pub title: String,
    pub abstract_text: String,
    pub year: String,
    pub citation_count: Option<u64>,
    pub author: String,
    pub external_url: String,
}

impl PublicationDetail {
    /// Map into the canonical record shape.
    pub fn into_record(self) -> PublicationRecord {
        PublicationRecord {
            title: self.title,
            abstract_text: self.abstract_text,
            year: self.year,
            citation_count: self.citation_count,
            author: self.author,
            resolved_link: self.external_url,
            ..Default::default()
        }
    }
}

/// A search hit from the preprint repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub title: String,
    pub link: String,
}

/// Academic profile source (e.g. Google Scholar).
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Resolve a subject by name. Fails with `SubjectNotFound` when nothing matches.
    async fn find_subject(&self, name: &str) -> Result<SubjectHandle>;

    /// Enumerate every publication of the subject, in source order.
    async fn list_publications(&self, subject: &SubjectHandle) -> Result<Vec<PublicationRef>>;

    /// Fetch the detailed record for one publication.
    async fn fetch_detail(&self, publication: &PublicationRef) -> Result<PublicationDetail>;
}

/// Preprint repository searchable by title (e.g. arXiv).
#[async_trait]
pub trait PreprintSearch: Send + Sync {
    /// Up to `limit` candidates ranked by relevance; may be empty.
    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Candidate>>;
}
