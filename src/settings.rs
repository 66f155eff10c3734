//! The settings model: one post, fully described
//!
//! `PostSettings` is plain data. Derived geometry is never stored back into
//! it; callers change it only through [`PostSettings::merge`].

use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::style::{FontFamily, GradientPreset};

/// Soft guideline for hook length; exceeding it is allowed
pub const SOFT_CHAR_LIMIT: usize = 500;

/// Content transformation and layout variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PostFormat {
    HookOnly,
    HookComments,
    ThreadStarter,
    LongThought,
    ListDrop,
    CreatorCard,
}

/// Display name, description and icon for a format picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

impl PostFormat {
    pub const ALL: [PostFormat; 6] = [
        PostFormat::CreatorCard,
        PostFormat::HookOnly,
        PostFormat::HookComments,
        PostFormat::ThreadStarter,
        PostFormat::LongThought,
        PostFormat::ListDrop,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            PostFormat::HookOnly => "hook-only",
            PostFormat::HookComments => "hook-comments",
            PostFormat::ThreadStarter => "thread-starter",
            PostFormat::LongThought => "long-thought",
            PostFormat::ListDrop => "list-drop",
            PostFormat::CreatorCard => "creator-card",
        }
    }

    pub fn info(self) -> FormatInfo {
        match self {
            PostFormat::CreatorCard => FormatInfo {
                name: "Creator Card",
                description: "Profile header + hook",
                icon: "👤",
            },
            PostFormat::HookOnly => FormatInfo {
                name: "Hook Only",
                description: "Single powerful statement",
                icon: "⚡",
            },
            PostFormat::HookComments => FormatInfo {
                name: "Hook → Comments",
                description: "Hook with comment pointer",
                icon: "👇",
            },
            PostFormat::ThreadStarter => FormatInfo {
                name: "Thread Starter",
                description: "Beginning of a story",
                icon: "🧵",
            },
            PostFormat::LongThought => FormatInfo {
                name: "Long Thought",
                description: "Extended reflection",
                icon: "💭",
            },
            PostFormat::ListDrop => FormatInfo {
                name: "List Drop",
                description: "Numbered points",
                icon: "📋",
            },
        }
    }
}

impl std::fmt::Display for PostFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.slug())
    }
}

impl std::str::FromStr for PostFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PostFormat::ALL
            .into_iter()
            .find(|f| f.slug() == s)
            .ok_or_else(|| format!("unknown format '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundType {
    Solid,
    Gradient,
}

/// Tri-level size of the footer call-to-action button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaSize {
    Sm,
    Md,
    Lg,
}

impl CtaSize {
    pub fn multiplier(self) -> f32 {
        match self {
            CtaSize::Sm => 0.8,
            CtaSize::Md => 1.1,
            CtaSize::Lg => 1.4,
        }
    }
}

/// Everything needed to render one post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PostSettings {
    pub content: String,
    pub subtitle: String,
    pub format: PostFormat,
    pub show_comment_pointer: bool,
    pub comment_pointer_text: String,
    pub font_family: FontFamily,
    pub background_type: BackgroundType,
    pub background_color: String,
    pub gradient_preset: GradientPreset,
    pub text_color: String,
    pub platform: Platform,
    pub creator_name: String,
    pub creator_handle: String,
    /// URL, local path, or `data:` URL of the creator's picture
    pub creator_avatar: String,
    pub show_verified_badge: bool,
    pub show_cta_button: bool,
    pub cta_size: CtaSize,
    pub highlight_text: String,
    pub highlight_color: String,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            content: String::new(),
            subtitle: String::new(),
            format: PostFormat::CreatorCard,
            show_comment_pointer: false,
            comment_pointer_text: "👇 Read the full breakdown in comments".to_string(),
            font_family: FontFamily::DmSans,
            background_type: BackgroundType::Solid,
            background_color: "#000000".to_string(),
            gradient_preset: GradientPreset::Ocean,
            text_color: "#ffffff".to_string(),
            platform: Platform::Facebook,
            creator_name: String::new(),
            creator_handle: String::new(),
            creator_avatar: String::new(),
            show_verified_badge: true,
            show_cta_button: false,
            cta_size: CtaSize::Md,
            highlight_text: String::new(),
            highlight_color: "#FACC15".to_string(),
        }
    }
}

/// Character count against the soft limit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharBudget {
    pub used: usize,
    pub limit: usize,
}

impl CharBudget {
    pub fn exceeded(&self) -> bool {
        self.used > self.limit
    }
}

impl PostSettings {
    /// Load settings from a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::Error::ConfigError(format!("settings JSON: {}", e)))
    }

    /// Shallow-merge a partial update. Fields absent from `patch` are kept.
    pub fn merge(&mut self, patch: SettingsPatch) {
        let SettingsPatch {
            content,
            subtitle,
            format,
            show_comment_pointer,
            comment_pointer_text,
            font_family,
            background_type,
            background_color,
            gradient_preset,
            text_color,
            platform,
            creator_name,
            creator_handle,
            creator_avatar,
            show_verified_badge,
            show_cta_button,
            cta_size,
            highlight_text,
            highlight_color,
        } = patch;

        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(v) = $field { self.$field = v; })*
            };
        }
        apply!(
            content,
            subtitle,
            format,
            show_comment_pointer,
            comment_pointer_text,
            font_family,
            background_type,
            background_color,
            gradient_preset,
            text_color,
            platform,
            creator_name,
            creator_handle,
            creator_avatar,
            show_verified_badge,
            show_cta_button,
            cta_size,
            highlight_text,
            highlight_color,
        );
    }

    /// A copy of these settings targeting another platform
    pub fn for_platform(&self, platform: Platform) -> PostSettings {
        PostSettings {
            platform,
            ..self.clone()
        }
    }

    pub fn char_budget(&self) -> CharBudget {
        CharBudget {
            used: self.content.chars().count(),
            limit: SOFT_CHAR_LIMIT,
        }
    }

    /// True when there is something worth exporting
    pub fn has_content(&self) -> bool {
        !self.content.trim().is_empty()
    }

    /// The profile header renders only for creator cards with a name or handle.
    pub fn shows_header(&self) -> bool {
        self.format == PostFormat::CreatorCard
            && (!self.creator_name.is_empty() || !self.creator_handle.is_empty())
    }

    /// Handle as displayed: exactly one leading `@`, or a placeholder.
    pub fn display_handle(&self) -> String {
        let bare = self.creator_handle.trim().trim_start_matches('@');
        if bare.is_empty() {
            "@handle".to_string()
        } else {
            format!("@{}", bare)
        }
    }

    pub fn display_name(&self) -> &str {
        if self.creator_name.is_empty() {
            "Your Name"
        } else {
            &self.creator_name
        }
    }

    /// Initial shown in the avatar placeholder
    pub fn avatar_initial(&self) -> String {
        self.creator_name
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }
}

/// A partial update; every `Some` field replaces the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub content: Option<String>,
    pub subtitle: Option<String>,
    pub format: Option<PostFormat>,
    pub show_comment_pointer: Option<bool>,
    pub comment_pointer_text: Option<String>,
    pub font_family: Option<FontFamily>,
    pub background_type: Option<BackgroundType>,
    pub background_color: Option<String>,
    pub gradient_preset: Option<GradientPreset>,
    pub text_color: Option<String>,
    pub platform: Option<Platform>,
    pub creator_name: Option<String>,
    pub creator_handle: Option<String>,
    pub creator_avatar: Option<String>,
    pub show_verified_badge: Option<bool>,
    pub show_cta_button: Option<bool>,
    pub cta_size: Option<CtaSize>,
    pub highlight_text: Option<String>,
    pub highlight_color: Option<String>,
}

impl SettingsPatch {
    pub fn content(text: impl Into<String>) -> Self {
        SettingsPatch {
            content: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == SettingsPatch::default()
    }
}
