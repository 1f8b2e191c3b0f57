use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// The fixed set of cached content collections.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKey {
  #[value(name = "hero")]
  Hero,
  #[value(name = "about")]
  About,
  #[value(name = "skills")]
  Skills,
  #[value(name = "projects")]
  Projects,
  #[value(name = "experience")]
  Experience,
  #[value(name = "services")]
  Services,
  #[value(name = "social_links")]
  SocialLinks,
}

/// Which loading phase a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
  /// Needed for the first, above-the-fold render
  Priority,
  /// Loaded after the priority phase has committed
  Secondary,
}

impl ResourceKey {
  pub const ALL: [ResourceKey; 7] = [
    ResourceKey::Hero,
    ResourceKey::About,
    ResourceKey::Skills,
    ResourceKey::Projects,
    ResourceKey::Experience,
    ResourceKey::Services,
    ResourceKey::SocialLinks,
  ];

  /// Collection name used by the content API and as the cache key.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Hero => "hero",
      Self::About => "about",
      Self::Skills => "skills",
      Self::Projects => "projects",
      Self::Experience => "experience",
      Self::Services => "services",
      Self::SocialLinks => "social_links",
    }
  }

  pub fn stage(self) -> LoadStage {
    match self {
      Self::Hero | Self::About | Self::Skills => LoadStage::Priority,
      _ => LoadStage::Secondary,
    }
  }

  /// Built-in TTL class for this resource.
  pub fn default_ttl(self) -> Duration {
    const MINUTE: u64 = 60;
    match self {
      Self::Hero | Self::About | Self::Skills => Duration::from_secs(10 * MINUTE),
      Self::Projects => Duration::from_secs(5 * MINUTE),
      Self::Experience | Self::Services => Duration::from_secs(30 * MINUTE),
      Self::SocialLinks => Duration::from_secs(60 * MINUTE),
    }
  }
}

impl fmt::Display for ResourceKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A record type served from one content collection.
pub trait ContentItem: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
  /// The collection this record type lives in
  fn resource() -> ResourceKey;
}

macro_rules! content_item {
  ($ty:ty, $key:expr) => {
    impl ContentItem for $ty {
      fn resource() -> ResourceKey {
        $key
      }
    }
  };
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroContent {
  #[serde(rename = "$id")]
  pub id: String,
  pub title: String,
  pub subtitle: String,
  pub description: String,
  pub cta_text: String,
  pub cta_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AboutContent {
  #[serde(rename = "$id")]
  pub id: String,
  pub title: String,
  pub description: String,
  pub image_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
  #[serde(rename = "$id")]
  pub id: String,
  pub name: String,
  pub category: String,
  pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
  #[serde(rename = "$id")]
  pub id: String,
  pub title: String,
  pub category: String,
  pub year: String,
  pub description: String,
  pub image_pc: String,
  pub image_mobile: String,
  pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
  #[serde(rename = "$id")]
  pub id: String,
  pub role: String,
  pub company: String,
  pub start_date: String,
  pub end_date: String,
  pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
  #[serde(rename = "$id")]
  pub id: String,
  pub title: String,
  pub description: String,
  pub icon: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLink {
  #[serde(rename = "$id")]
  pub id: String,
  pub platform: String,
  pub url: String,
  pub icon: String,
}

content_item!(HeroContent, ResourceKey::Hero);
content_item!(AboutContent, ResourceKey::About);
content_item!(Skill, ResourceKey::Skills);
content_item!(Project, ResourceKey::Projects);
content_item!(Experience, ResourceKey::Experience);
content_item!(Service, ResourceKey::Services);
content_item!(SocialLink, ResourceKey::SocialLinks);
