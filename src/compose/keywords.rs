/// Keys that commit the chip input's pending text as a keyword.
pub const SEPARATOR_KEYS: &[ChipKey] = &[ChipKey::Enter, ChipKey::Char(',')];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipKey {
    Enter,
    Char(char),
}

/// The chip input control's pending text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordInput {
    value: String,
}

impl KeywordInput {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }
}

/// Ordered list of free-text tags.
///
/// Deliberately permissive: duplicates are kept, nothing is case-folded and
/// there is no length limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordList {
    keywords: Vec<String>,
}

impl KeywordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the trimmed input value if it is non-empty, then clear the
    /// input whether or not anything was added.
    ///
    /// Returns true if a keyword was appended.
    pub fn add(&mut self, input: &mut KeywordInput) -> bool {
        let added = self.push(input.value());
        input.clear();
        added
    }

    /// Append `raw` trimmed, if non-empty.
    pub fn push(&mut self, raw: &str) -> bool {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return false;
        }
        self.keywords.push(trimmed.to_owned());
        true
    }

    /// Feed a key press from the chip input. Separator keys commit the
    /// pending text; any other character is appended to it.
    pub fn key(&mut self, input: &mut KeywordInput, key: ChipKey) -> bool {
        if SEPARATOR_KEYS.contains(&key) {
            return self.add(input);
        }
        if let ChipKey::Char(c) = key {
            input.value.push(c);
        }
        false
    }

    /// Remove the first keyword equal to `keyword`. Absent keywords are
    /// ignored. Returns true if one was removed.
    pub fn remove(&mut self, keyword: &str) -> bool {
        match self.keywords.iter().position(|k| k == keyword) {
            Some(index) => {
                self.keywords.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }
}
