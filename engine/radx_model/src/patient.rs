use serde::{Deserialize, Serialize};

/// Optional demographics supplied with an upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub age: Option<u32>,
    pub gender: Option<String>,
}

impl Patient {
    pub fn new(age: Option<u32>, gender: Option<&str>) -> Self {
        Self {
            age,
            gender: gender.map(str::to_string),
        }
    }

    /// An age of zero is treated the same as a missing age.
    pub fn known_age(&self) -> Option<u32> {
        self.age.filter(|&a| a > 0)
    }

    pub fn older_than(&self, years: u32) -> bool {
        self.known_age().is_some_and(|a| a > years)
    }

    pub fn younger_than(&self, years: u32) -> bool {
        self.known_age().is_some_and(|a| a < years)
    }

    pub fn is_female(&self) -> bool {
        self.gender
            .as_deref()
            .is_some_and(|g| g.eq_ignore_ascii_case("female"))
    }
}
