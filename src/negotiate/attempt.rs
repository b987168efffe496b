//! The negotiation attempt space
//!
//! An attempt is one point of `candidate × credential × content-type`.
//! The axes are explicit tables so the search order is fixed and reproducible.

use crate::translate::CandidateBody;
use serde::{Deserialize, Serialize};

/// How the access token is placed in the `Authorization` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// `Authorization: Bearer <token>`
    Bearer,
    /// `Authorization: <token>`
    Raw,
}

impl CredentialKind {
    /// Every credential encoding in negotiation order
    pub const ALL: [CredentialKind; 2] = [CredentialKind::Bearer, CredentialKind::Raw];

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Bearer => "bearer",
            CredentialKind::Raw => "raw",
        }
    }

    /// Encode a token with this scheme
    pub fn encode(self, token: &str) -> CredentialEncoding {
        match self {
            CredentialKind::Bearer => CredentialEncoding::Bearer(token.to_string()),
            CredentialKind::Raw => CredentialEncoding::Raw(token.to_string()),
        }
    }
}

/// An access token paired with its header encoding
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialEncoding {
    Bearer(String),
    Raw(String),
}

impl CredentialEncoding {
    /// The encoding scheme
    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialEncoding::Bearer(_) => CredentialKind::Bearer,
            CredentialEncoding::Raw(_) => CredentialKind::Raw,
        }
    }

    /// Value of the outbound `Authorization` header
    pub fn header_value(&self) -> String {
        match self {
            CredentialEncoding::Bearer(token) => format!("Bearer {}", token),
            CredentialEncoding::Raw(token) => token.clone(),
        }
    }
}

impl std::fmt::Debug for CredentialEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(<redacted>)", self.kind().as_str())
    }
}

/// Request body content type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    /// `application/json`
    Json,
    /// `application/x-amz-json-1.0`
    AmzJson,
}

impl ContentType {
    /// Every content type in negotiation order
    pub const ALL: [ContentType; 2] = [ContentType::Json, ContentType::AmzJson];

    /// Label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Json => "json",
            ContentType::AmzJson => "amz_json",
        }
    }

    /// MIME type sent in the `Content-Type` header
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
            ContentType::AmzJson => "application/x-amz-json-1.0",
        }
    }
}

/// One point of the attempt space
#[derive(Debug, Clone)]
pub struct NegotiationAttempt<'a> {
    /// Position in enumeration order (0-based)
    pub index: usize,
    pub body: &'a CandidateBody,
    pub credential: CredentialEncoding,
    pub content_type: ContentType,
}

/// Enumerate `candidates × credentials × content_types`
///
/// Candidate is the outermost axis, then credential, then content type.
pub fn enumerate_attempts<'a>(
    candidates: &'a [CandidateBody],
    credentials: &[CredentialKind],
    content_types: &[ContentType],
    token: &str,
) -> Vec<NegotiationAttempt<'a>> {
    let mut attempts =
        Vec::with_capacity(candidates.len() * credentials.len() * content_types.len());

    for body in candidates {
        for credential in credentials {
            for content_type in content_types {
                attempts.push(NegotiationAttempt {
                    index: attempts.len(),
                    body,
                    credential: credential.encode(token),
                    content_type: *content_type,
                });
            }
        }
    }

    attempts
}
