//! Logical monitored enclosures

use core::fmt;

/// A monitored unit. Its name is both the JSON key and the route segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Enclosure {
    Fridge,
    Freezer,
}

impl Enclosure {
    /// Every enclosure in the order it appears in the root snapshot.
    pub const ALL: [Enclosure; 2] = [Enclosure::Fridge, Enclosure::Freezer];

    pub const fn name(self) -> &'static str {
        match self {
            Enclosure::Fridge => "fridge",
            Enclosure::Freezer => "freezer",
        }
    }

    /// Parse a lowercase enclosure name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.name() == name)
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Enclosure::Fridge => 0,
            Enclosure::Freezer => 1,
        }
    }
}

impl fmt::Display for Enclosure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
