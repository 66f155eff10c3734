//! Target platforms and their canonical canvas dimensions
//!
//! The dimension table is the only place canvas geometry comes from. Changing
//! an entry changes the exported size and nothing else.

pub mod display;

pub use display::{DisplayBox, DisplayMetrics};

use serde::{Deserialize, Serialize};

/// A social network surface with a preferred image size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    Facebook,
    Linkedin,
    Twitter,
    Instagram,
    InstagramStory,
}

/// Canonical export size plus human-readable labels for a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlatformDimensions {
    pub width: u32,
    pub height: u32,
    pub name: &'static str,
    pub aspect_ratio: &'static str,
    pub description: &'static str,
}

impl PlatformDimensions {
    /// Width divided by height
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

const FACEBOOK: PlatformDimensions = PlatformDimensions {
    width: 1200,
    height: 630,
    name: "Facebook Post",
    aspect_ratio: "1.91:1",
    description: "Optimized for Facebook feed posts and link shares",
};

const LINKEDIN: PlatformDimensions = PlatformDimensions {
    width: 1200,
    height: 627,
    name: "LinkedIn Post",
    aspect_ratio: "1.91:1",
    description: "Optimized for LinkedIn feed and article shares",
};

const TWITTER: PlatformDimensions = PlatformDimensions {
    width: 1200,
    height: 675,
    name: "X (Twitter)",
    aspect_ratio: "16:9",
    description: "Optimized for X/Twitter timeline posts",
};

const INSTAGRAM: PlatformDimensions = PlatformDimensions {
    width: 1080,
    height: 1080,
    name: "Instagram Square",
    aspect_ratio: "1:1",
    description: "Classic square format for Instagram feed",
};

const INSTAGRAM_STORY: PlatformDimensions = PlatformDimensions {
    width: 1080,
    height: 1920,
    name: "Story/Reels",
    aspect_ratio: "9:16",
    description: "Full-screen vertical for Stories and Reels",
};

impl Platform {
    /// Every platform, in the order exports are offered
    pub const ALL: [Platform; 5] = [
        Platform::Facebook,
        Platform::Linkedin,
        Platform::Twitter,
        Platform::Instagram,
        Platform::InstagramStory,
    ];

    pub fn dimensions(self) -> PlatformDimensions {
        match self {
            Platform::Facebook => FACEBOOK,
            Platform::Linkedin => LINKEDIN,
            Platform::Twitter => TWITTER,
            Platform::Instagram => INSTAGRAM,
            Platform::InstagramStory => INSTAGRAM_STORY,
        }
    }

    /// The kebab-case identifier used in settings files and filenames
    pub fn slug(self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Linkedin => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Instagram => "instagram",
            Platform::InstagramStory => "instagram-story",
        }
    }

    pub fn is_story(self) -> bool {
        matches!(self, Platform::InstagramStory)
    }

    /// Dynamic-height canvases are only allowed on the feed landscape presets.
    pub fn allows_dynamic_height(self) -> bool {
        !matches!(self, Platform::InstagramStory | Platform::Instagram)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.slug() == s)
            .ok_or_else(|| format!("unknown platform '{}'", s))
    }
}
