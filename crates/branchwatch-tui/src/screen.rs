//! Screen identifiers.

use std::fmt;

/// Identifies each TUI screen. The three main screens are navigable by
/// number keys 1-3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    /// Shown until a session exists; not in the tab bar.
    #[default]
    Login,
    Dashboard,     // 1
    Branches,      // 2
    AddRestaurant, // 3
}

impl ScreenId {
    /// Screens in tab-bar order.
    pub const ALL: [ScreenId; 3] = [Self::Dashboard, Self::Branches, Self::AddRestaurant];

    /// Numeric key for this screen. Login has no number key.
    pub fn number(self) -> u8 {
        match self {
            Self::Login => 0,
            Self::Dashboard => 1,
            Self::Branches => 2,
            Self::AddRestaurant => 3,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous screen in tab order (wraps around).
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Login => "Login",
            Self::Dashboard => "Dashboard",
            Self::Branches => "Branches",
            Self::AddRestaurant => "Add Restaurant",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
