//! Traffic-sign re-classification from recognized text.
//!
//! Several parking signs share a shape and colour and only differ by the text
//! printed on them. The detector gets the family right; the text decides the
//! exact category. Rules are evaluated in declaration order and the first
//! matching category wins.

/// How a category recognizes its sign text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignRule {
    /// Matches when any fragment contains any of these strings.
    AnyOf(Vec<String>),
    /// Matches when at least `min` fragments contain `needle`.
    Count { needle: String, min: usize },
}

impl SignRule {
    pub fn any_of(expected: &[&str]) -> Self {
        SignRule::AnyOf(expected.iter().map(|s| s.to_string()).collect())
    }

    pub fn count(needle: &str, min: usize) -> Self {
        SignRule::Count {
            needle: needle.to_string(),
            min,
        }
    }

    fn matches(&self, fragments: &[String]) -> bool {
        match self {
            SignRule::AnyOf(expected) => expected
                .iter()
                .any(|want| fragments.iter().any(|text| text.contains(want.as_str()))),
            SignRule::Count { needle, min } => {
                let hits = fragments
                    .iter()
                    .filter(|text| text.contains(needle.as_str()))
                    .count();
                hits >= *min
            }
        }
    }
}

/// Ordered category → rule table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpectedWordsTable {
    entries: Vec<(String, SignRule)>,
}

impl ExpectedWordsTable {
    pub fn new(entries: Vec<(String, SignRule)>) -> Self {
        Self { entries }
    }

    /// Parking-sign categories known to the bundled sign model.
    ///
    /// The two-sevens rule sits ahead of the single-seven rule so that a
    /// yellow sign is not swallowed by the red one.
    pub fn parking_signs() -> Self {
        Self::new(vec![
            (
                "NoParking24h".to_string(),
                SignRule::any_of(&["24hrs", "24 hrs", "24", "hrs"]),
            ),
            ("NoParkingEnd".to_string(), SignRule::any_of(&["End"])),
            (
                "NoParkingGreen".to_string(),
                SignRule::any_of(&["8", "10", "8-10"]),
            ),
            ("NoParkingYellow".to_string(), SignRule::count("7", 2)),
            ("NoParkingRed".to_string(), SignRule::any_of(&["12", "7"])),
            (
                "ExceptHolidays".to_string(),
                SignRule::any_of(&["Except General Holidays"]),
            ),
            ("ExceptTaxi".to_string(), SignRule::any_of(&["Except taxi"])),
        ])
    }

    pub fn contains(&self, category: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == category)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First category whose rule accepts the (already normalized) fragments.
    pub fn match_fragments(&self, fragments: &[String]) -> Option<&str> {
        self.entries
            .iter()
            .find(|(_, rule)| rule.matches(fragments))
            .map(|(name, _)| name.as_str())
    }
}

impl Default for ExpectedWordsTable {
    fn default() -> Self {
        Self::parking_signs()
    }
}

/// OCR confusion correction: lowercase `o` is read as the digit `0`.
pub fn normalize_fragments<S: AsRef<str>>(fragments: &[S]) -> Vec<String> {
    fragments
        .iter()
        .map(|text| text.as_ref().replace('o', "0"))
        .collect()
}
