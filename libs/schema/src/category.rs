//! Identifier-range → category classification.
//!
//! Categories are cosmetic: they only drive blank-line grouping in generated
//! enumerations. A wrong classification is never a correctness bug, so there
//! is no error path — unmapped ranges resolve to [`Category::Unknown`].

/// Grouping label derived from an event identifier's numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Sprite,
    Input,
    Window,
    Text,
    Audio,
    Physics,
    Plugin,
    Camera,
    Script,
    Ui,
    Unknown,
}

impl Category {
    /// Classify an event identifier. Pure and total.
    pub const fn of(type_id: u32) -> Self {
        match type_id {
            0..=99 => Self::Sprite, // includes geometry
            100..=199 => Self::Input,
            200..=299 => Self::Window,
            300..=399 => Self::Text,
            400..=499 => Self::Audio,
            500..=599 => Self::Physics,
            1000..=1099 => Self::Plugin,
            2000..=2999 => Self::Camera,
            3000..=3999 => Self::Script,
            4000..=4999 => Self::Ui,
            _ => Self::Unknown,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sprite => "sprite",
            Self::Input => "input",
            Self::Window => "window",
            Self::Text => "text",
            Self::Audio => "audio",
            Self::Physics => "physics",
            Self::Plugin => "plugin",
            Self::Camera => "camera",
            Self::Script => "script",
            Self::Ui => "ui",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
