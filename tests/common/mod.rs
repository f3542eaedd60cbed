//! Fake external sources shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pubmeta::source::{
    Candidate, PreprintSearch, ProfileSource, PublicationDetail, PublicationRef, SubjectHandle,
};
use pubmeta::{PubmetaError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// How a scripted detail call fails.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// Skippable, e.g. a 503 from the source
    Transient,
    /// Aborts the run, e.g. a CAPTCHA wall
    Fatal,
}

/// Profile source with `publications` papers titled `Paper 1..=n`.
pub struct FakeProfile {
    pub publications: usize,
    pub known_subject: bool,
    pub failures: HashMap<usize, Failure>,
    pub calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl FakeProfile {
    pub fn new(publications: usize) -> Self {
        Self {
            publications,
            known_subject: true,
            failures: HashMap::new(),
            calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the `k`-th detail call (1-based).
    pub fn failing_at(mut self, k: usize, failure: Failure) -> Self {
        self.failures.insert(k, failure);
        self
    }

    pub fn unknown_subject(mut self) -> Self {
        self.known_subject = false;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProfileSource for FakeProfile {
    async fn find_subject(&self, name: &str) -> Result<SubjectHandle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.known_subject {
            return Err(PubmetaError::SubjectNotFound(name.to_string()));
        }
        Ok(SubjectHandle {
            id: "fake-user".to_string(),
            name: name.to_string(),
            affiliation: "Test University".to_string(),
        })
    }

    async fn list_publications(&self, _subject: &SubjectHandle) -> Result<Vec<PublicationRef>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=self.publications)
            .map(|i| PublicationRef {
                id: format!("fake-user:{i}"),
                title: format!("Paper {i}"),
                year: "2020".to_string(),
                citation_count: Some(i as u64),
            })
            .collect())
    }

    async fn fetch_detail(&self, publication: &PublicationRef) -> Result<PublicationDetail> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let k = self.detail_calls.fetch_add(1, Ordering::SeqCst) + 1;
        match self.failures.get(&k) {
            Some(Failure::Transient) => Err(PubmetaError::Api {
                code: 503,
                message: "unavailable".to_string(),
            }),
            Some(Failure::Fatal) => Err(PubmetaError::Captcha),
            None => Ok(PublicationDetail {
                title: publication.title.clone(),
                abstract_text: format!("Abstract of {}", publication.title),
                year: publication.year.clone(),
                citation_count: publication.citation_count,
                author: "A Author and YS Ong".to_string(),
                external_url: String::new(),
            }),
        }
    }
}

/// Preprint search answering from a fixed title -> candidate table.
#[derive(Default)]
pub struct FakeSearch {
    pub answers: HashMap<String, Candidate>,
    pub failing: Vec<String>,
    pub fatal: Vec<String>,
    pub calls: AtomicUsize,
}

impl FakeSearch {
    pub fn answer(mut self, title: &str, candidate_title: &str, link: &str) -> Self {
        self.answers.insert(
            title.to_string(),
            Candidate {
                title: candidate_title.to_string(),
                link: link.to_string(),
            },
        );
        self
    }

    pub fn failing_on(mut self, title: &str) -> Self {
        self.failing.push(title.to_string());
        self
    }

    pub fn fatal_on(mut self, title: &str) -> Self {
        self.fatal.push(title.to_string());
        self
    }

    pub fn total_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PreprintSearch for FakeSearch {
    async fn search_by_title(&self, title: &str, limit: usize) -> Result<Vec<Candidate>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(limit, 1, "resolver must ask for exactly one candidate");
        if self.fatal.iter().any(|t| t == title) {
            return Err(PubmetaError::Io(std::io::Error::other("disk gone")));
        }
        if self.failing.iter().any(|t| t == title) {
            return Err(PubmetaError::RateLimited(1));
        }
        Ok(self.answers.get(title).cloned().into_iter().collect())
    }
}
