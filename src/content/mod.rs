//! Portfolio content: collection keys, record types and the API client.

mod api_types;
mod client;
mod types;

#[cfg(test)]
pub mod fixtures;

pub use api_types::ContactSubmission;
pub use client::{ContentSource, HttpContentClient};
pub use types::{
  AboutContent, ContentItem, Experience, HeroContent, LoadStage, Project, ResourceKey, Service,
  Skill, SocialLink,
};

use color_eyre::Result;
use std::future::Future;
use std::sync::Arc;

impl<C: ContentSource> ContentSource for Arc<C> {
  fn fetch_collection<T: ContentItem>(&self) -> impl Future<Output = Result<Vec<T>>> + Send {
    (**self).fetch_collection::<T>()
  }
}
