//! Category auto-assignment for newly observed applications.
//!
//! The rule table maps bundle-identifier fragments to a fixed category
//! set. First matching rule wins; apps nothing matches land in `Other`.
//! The assignment is only a default: the registry lets the user override
//! both the category and the distraction flag afterwards.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Development,
    Communication,
    Browsing,
    Productivity,
    Design,
    Entertainment,
    Utilities,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Development => "development",
            Category::Communication => "communication",
            Category::Browsing => "browsing",
            Category::Productivity => "productivity",
            Category::Design => "design",
            Category::Entertainment => "entertainment",
            Category::Utilities => "utilities",
            Category::Other => "other",
        }
    }

    /// Parse a stored category name; unknown names fall back to `Other`
    /// so rows written by a newer build still load.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "development" => Category::Development,
            "communication" => Category::Communication,
            "browsing" => Category::Browsing,
            "productivity" => Category::Productivity,
            "design" => Category::Design,
            "entertainment" => Category::Entertainment,
            "utilities" => Category::Utilities,
            _ => Category::Other,
        }
    }

    /// Whether apps in this category count against the productivity
    /// score by default.
    pub fn default_distraction(&self) -> bool {
        matches!(self, Category::Entertainment)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bundle-id fragment -> category. Matched case-insensitively as a
/// substring, in order.
const CATEGORY_RULES: &[(&str, Category)] = &[
    // Development
    ("com.microsoft.vscode", Category::Development),
    ("com.apple.dt.xcode", Category::Development),
    ("com.jetbrains", Category::Development),
    ("com.googlecode.iterm2", Category::Development),
    ("com.apple.terminal", Category::Development),
    ("com.github", Category::Development),
    ("dev.zed", Category::Development),
    ("com.sublimetext", Category::Development),
    ("org.vim", Category::Development),

    // Communication
    ("com.tinyspeck.slackmacgap", Category::Communication),
    ("com.hnc.discord", Category::Communication),
    ("com.apple.mail", Category::Communication),
    ("com.microsoft.outlook", Category::Communication),
    ("com.microsoft.teams", Category::Communication),
    ("us.zoom", Category::Communication),
    ("com.apple.messages", Category::Communication),

    // Browsing
    ("com.apple.safari", Category::Browsing),
    ("com.google.chrome", Category::Browsing),
    ("org.mozilla.firefox", Category::Browsing),
    ("com.brave.browser", Category::Browsing),
    ("company.thebrowser.browser", Category::Browsing),

    // Productivity
    ("com.apple.iwork", Category::Productivity),
    ("com.microsoft.word", Category::Productivity),
    ("com.microsoft.excel", Category::Productivity),
    ("notion.id", Category::Productivity),
    ("md.obsidian", Category::Productivity),
    ("com.culturedcode.things", Category::Productivity),
    ("com.linear", Category::Productivity),

    // Design
    ("com.figma", Category::Design),
    ("com.bohemiancoding.sketch", Category::Design),
    ("com.adobe", Category::Design),

    // Entertainment
    ("com.spotify", Category::Entertainment),
    ("com.apple.music", Category::Entertainment),
    ("com.apple.tv", Category::Entertainment),
    ("com.netflix", Category::Entertainment),
    ("com.valvesoftware.steam", Category::Entertainment),
    ("tv.twitch", Category::Entertainment),
    ("com.google.ios.youtube", Category::Entertainment),

    // Utilities
    ("com.apple.finder", Category::Utilities),
    ("com.apple.systempreferences", Category::Utilities),
    ("com.1password", Category::Utilities),
];

/// Assign a category to a bundle identifier via the static rule table.
pub fn assign(bundle_id: &str) -> Category {
    let id_lower = bundle_id.to_lowercase();
    for (fragment, category) in CATEGORY_RULES {
        if id_lower.contains(fragment) {
            return *category;
        }
    }
    Category::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_known_bundle_ids() {
        assert_eq!(assign("com.microsoft.VSCode"), Category::Development);
        assert_eq!(assign("com.tinyspeck.slackmacgap"), Category::Communication);
        assert_eq!(assign("com.google.Chrome"), Category::Browsing);
        assert_eq!(assign("com.spotify.client"), Category::Entertainment);
    }

    #[test]
    fn test_assign_is_case_insensitive() {
        assert_eq!(assign("COM.APPLE.DT.XCODE"), Category::Development);
    }

    #[test]
    fn test_assign_unknown_defaults_to_other() {
        assert_eq!(assign("com.example.mystery"), Category::Other);
        assert_eq!(assign(""), Category::Other);
    }

    #[test]
    fn test_category_round_trips_through_storage_name() {
        for category in [
            Category::Development,
            Category::Communication,
            Category::Browsing,
            Category::Productivity,
            Category::Design,
            Category::Entertainment,
            Category::Utilities,
            Category::Other,
        ] {
            assert_eq!(Category::from_str_lossy(category.as_str()), category);
        }
    }

    #[test]
    fn test_unknown_stored_name_falls_back() {
        assert_eq!(Category::from_str_lossy("gaming"), Category::Other);
    }

    #[test]
    fn test_default_distraction_flag() {
        assert!(Category::Entertainment.default_distraction());
        assert!(!Category::Development.default_distraction());
        assert!(!Category::Other.default_distraction());
    }
}
