//! Publication records and datasets.
//!
//! A [`Dataset`] is serialized as a single JSON array of records. Decoding is
//! tolerant of the shapes older snapshots contain: numeric years, `""` for an
//! unknown citation count, a `[title, link]` pair stored in `url`, and
//! keywords given as an array. Keys this crate does not know about are kept
//! and written back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Preprint candidate attached by the link resolver, awaiting validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateMatch {
    /// Title of the candidate as reported by the preprint repository
    pub title: String,
    /// Link to the candidate (PDF URL)
    pub link: String,
}

/// A single publication in canonical shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRecord")]
pub struct PublicationRecord {
    /// Natural key used for cross-file merges
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub year: String,
    pub citation_count: Option<u64>,
    /// Delimiter-joined author names
    pub author: String,
    /// Accepted link, empty when none
    #[serde(rename = "url")]
    pub resolved_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_match: Option<CandidateMatch>,
    /// Empty marks the record as needing correction
    pub keywords: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PublicationRecord {
    /// Record with only a title set.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// True when the keywords field is missing or empty.
    pub fn needs_keywords(&self) -> bool {
        self.keywords.is_empty()
    }

    /// True when neither an accepted link nor a pending candidate is present.
    pub fn needs_link(&self) -> bool {
        self.resolved_link.is_empty() && self.candidate_match.is_none()
    }
}

/// Wire shape accepted when decoding a record.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, rename = "abstract")]
    abstract_text: Option<String>,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    citation_count: Option<Value>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    url: Option<Value>,
    #[serde(default)]
    candidate_match: Option<CandidateMatch>,
    #[serde(default)]
    keywords: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl TryFrom<RawRecord> for PublicationRecord {
    type Error = String;

    fn try_from(raw: RawRecord) -> std::result::Result<Self, Self::Error> {
        let year = match raw.year {
            None => String::new(),
            Some(Value::String(s)) => s,
            Some(Value::Number(n)) => n.to_string(),
            Some(other) => return Err(format!("year must be a string or number, got {other}")),
        };

        let citation_count = match raw.citation_count {
            None => None,
            Some(Value::Number(n)) => Some(
                n.as_u64()
                    .ok_or_else(|| format!("citation_count must be a non-negative integer, got {n}"))?,
            ),
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(
                s.trim()
                    .parse::<u64>()
                    .map_err(|_| format!("citation_count is not a number: {s:?}"))?,
            ),
            Some(other) => return Err(format!("citation_count has unexpected type: {other}")),
        };

        let mut candidate_match = raw.candidate_match;
        let resolved_link = match raw.url {
            None => String::new(),
            Some(Value::String(s)) => s,
            // Older link-resolution output stored the candidate positionally.
            Some(Value::Array(pair)) => match pair.as_slice() {
                [] => String::new(),
                [Value::String(title), Value::String(link)] => {
                    if candidate_match.is_none() {
                        candidate_match = Some(CandidateMatch {
                            title: title.clone(),
                            link: link.clone(),
                        });
                    }
                    String::new()
                }
                _ => return Err("url pair must be [title, link]".to_string()),
            },
            Some(other) => return Err(format!("url has unexpected type: {other}")),
        };

        let keywords = match raw.keywords {
            None => String::new(),
            Some(Value::String(s)) => s,
            Some(Value::Array(items)) => items
                .iter()
                .map(|v| match v {
                    Value::String(s) => Ok(s.as_str()),
                    other => Err(format!("keyword entries must be strings, got {other}")),
                })
                .collect::<std::result::Result<Vec<_>, _>>()?
                .join(", "),
            Some(other) => return Err(format!("keywords has unexpected type: {other}")),
        };

        Ok(Self {
            title: raw.title.unwrap_or_default(),
            abstract_text: raw.abstract_text.unwrap_or_default(),
            year,
            citation_count,
            author: raw.author.unwrap_or_default(),
            resolved_link,
            candidate_match,
            keywords,
            extra: raw.extra,
        })
    }
}

/// Ordered sequence of publication records; insertion order is source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    pub records: Vec<PublicationRecord>,
}

impl Dataset {
    pub fn new(records: Vec<PublicationRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn push(&mut self, record: PublicationRecord) {
        self.records.push(record);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PublicationRecord> {
        self.records.iter()
    }
}

impl From<Vec<PublicationRecord>> for Dataset {
    fn from(records: Vec<PublicationRecord>) -> Self {
        Self { records }
    }
}

impl IntoIterator for Dataset {
    type Item = PublicationRecord;
    type IntoIter = std::vec::IntoIter<PublicationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
