//! Serde types matching the content API's request and response bodies.

use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::ResourceKey;

/// Envelope returned by `get-content`.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
  pub success: bool,
  #[serde(default)]
  pub collection: String,
  #[serde(default)]
  pub total: u64,
  #[serde(default = "Vec::new")]
  pub documents: Vec<T>,
  pub error: Option<String>,
}

impl<T> ApiResponse<T> {
  /// Unwrap the documents, turning a reported failure into an error.
  pub fn into_documents(self, key: ResourceKey) -> Result<Vec<T>> {
    if self.success {
      debug!(
        resource = %key,
        collection = %self.collection,
        total = self.total,
        received = self.documents.len(),
        "Collection response"
      );
      Ok(self.documents)
    } else {
      Err(eyre!(
        "Error fetching {}: {}",
        key,
        self.error.as_deref().unwrap_or("unknown error")
      ))
    }
  }
}

/// Body of a contact form submission.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
  pub name: String,
  pub email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subject: Option<String>,
  pub message: String,
}

impl ContactSubmission {
  /// Check the fields the contact form marks as required.
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(eyre!("Name is required"));
    }
    if self.message.trim().is_empty() {
      return Err(eyre!("Message is required"));
    }
    let email = self.email.trim();
    match email.split_once('@') {
      Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(()),
      _ => Err(eyre!("Invalid email address: {}", email)),
    }
  }
}

/// Reply from `submit-contact`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContactResponse {
  pub success: bool,
  pub error: Option<String>,
}
