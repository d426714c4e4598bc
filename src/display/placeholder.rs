//! Deterministic category placeholders.
//!
//! A placeholder is a pure function of its [`Category`] (and optional label):
//! a small SVG with the category's colours and icon. It needs no network
//! and cannot fail, which makes it the floor of the display fallback chain.

use crate::types::UploadTarget;
use base64::{Engine as _, engine::general_purpose};
use maud::{Markup, html};
use std::fmt;
use std::str::FromStr;

const WIDTH: u32 = 400;
const HEIGHT: u32 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Member,
    Event,
    News,
    Team,
    Community,
    Partnership,
    Game,
}

/// Colours, icon and default label for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    pub background: &'static str,
    pub accent: &'static str,
    /// SVG path data drawn in an 80×80 box.
    pub icon: &'static str,
    pub label: &'static str,
}

/// Indexed by `Category as usize`.
const STYLES: [CategoryStyle; 7] = [
    // Member: head and shoulders
    CategoryStyle {
        background: "#e8f1fb",
        accent: "#2f6fb3",
        icon: "M40 8a16 16 0 1 1 0 32a16 16 0 1 1 0-32zM8 76c0-18 14-28 32-28s32 10 32 28z",
        label: "Member",
    },
    // Event: calendar
    CategoryStyle {
        background: "#fdf0e6",
        accent: "#c0622b",
        icon: "M10 16h60v56h-60zM10 30h60M24 8v14M56 8v14",
        label: "Event",
    },
    // News: folded page with lines
    CategoryStyle {
        background: "#eef3ee",
        accent: "#3f7a4a",
        icon: "M12 10h48l8 8v52h-56zM22 28h36M22 40h36M22 52h24",
        label: "News",
    },
    // Team: three heads
    CategoryStyle {
        background: "#f2ecfa",
        accent: "#6b47a8",
        icon: "M16 24a8 8 0 1 1 0 16a8 8 0 1 1 0-16zM40 16a10 10 0 1 1 0 20a10 10 0 1 1 0-20zM64 24a8 8 0 1 1 0 16a8 8 0 1 1 0-16zM4 68c0-12 8-18 16-18M76 68c0-12-8-18-16-18M20 72c0-14 9-22 20-22s20 8 20 22z",
        label: "Team",
    },
    // Community: linked circles
    CategoryStyle {
        background: "#fbeef2",
        accent: "#b03a60",
        icon: "M28 24a16 16 0 1 1 0 32a16 16 0 1 1 0-32zM52 24a16 16 0 1 1 0 32a16 16 0 1 1 0-32z",
        label: "Community",
    },
    // Partnership: handshake bars
    CategoryStyle {
        background: "#eaf6f6",
        accent: "#217a7a",
        icon: "M6 36l18-12l16 10l16-10l18 12l-18 18l-16-8l-16 8z",
        label: "Partner",
    },
    // Game: controller
    CategoryStyle {
        background: "#f7f4e4",
        accent: "#8a7414",
        icon: "M14 28h52a10 10 0 0 1 10 10v10a10 10 0 0 1-18 6l-6-6h-24l-6 6a10 10 0 0 1-18-6v-10a10 10 0 0 1 10-10zM22 38v8M18 42h8M56 40h2M62 44h2",
        label: "Game",
    },
];

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Member,
        Category::Event,
        Category::News,
        Category::Team,
        Category::Community,
        Category::Partnership,
        Category::Game,
    ];

    pub fn style(self) -> &'static CategoryStyle {
        &STYLES[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Event => "event",
            Self::News => "news",
            Self::Team => "team",
            Self::Community => "community",
            Self::Partnership => "partnership",
            Self::Game => "game",
        }
    }
}

impl From<UploadTarget> for Category {
    fn from(target: UploadTarget) -> Self {
        match target {
            UploadTarget::Member => Self::Member,
            UploadTarget::Event => Self::Event,
            UploadTarget::News => Self::News,
            UploadTarget::Game => Self::Game,
            UploadTarget::Partner => Self::Partnership,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "partner" {
            return Ok(Self::Partnership);
        }
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown category '{s}'"))
    }
}

/// The placeholder as SVG markup.
pub fn placeholder_markup(category: Category, label: Option<&str>) -> Markup {
    let style = category.style();
    let label = label.map(str::trim).filter(|l| !l.is_empty()).unwrap_or(style.label);
    let view_box = format!("0 0 {WIDTH} {HEIGHT}");
    html! {
        svg xmlns="http://www.w3.org/2000/svg" viewBox=(view_box) width=(WIDTH) height=(HEIGHT)
            role="img" aria-label=(label) data-category=(category.as_str()) {
            rect width=(WIDTH) height=(HEIGHT) fill=(style.background) {}
            g transform="translate(160 70)" fill="none" stroke=(style.accent)
                stroke-width="4" stroke-linejoin="round" stroke-linecap="round" {
                path d=(style.icon) {}
            }
            text x=(WIDTH / 2) y="220" text-anchor="middle" font-family="sans-serif"
                font-size="22" fill=(style.accent) { (label) }
        }
    }
}

pub fn placeholder_svg(category: Category, label: Option<&str>) -> String {
    placeholder_markup(category, label).into_string()
}

/// `data:` URL usable directly as an `<img src>`.
pub fn placeholder_data_url(category: Category, label: Option<&str>) -> String {
    format!(
        "data:image/svg+xml;base64,{}",
        general_purpose::STANDARD.encode(placeholder_svg(category, label))
    )
}
