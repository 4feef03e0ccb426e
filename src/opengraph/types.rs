use std::collections::HashMap;
use url::Url;

/// One metadata entry plus the nested properties that followed it, e.g.
/// `og:image` with `og:image:width` and `og:image:type`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredMetadata {
    /// Tag name without namespace (`image`, `video`, `card`)
    pub name: String,
    pub value: String,
    pub properties: HashMap<String, Vec<String>>,
}

impl StructuredMetadata {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            properties: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_property(mut self, key: &str, value: impl Into<String>) -> Self {
        self.push_property(key, value);
        self
    }

    pub fn push_property(&mut self, key: &str, value: impl Into<String>) {
        self.properties
            .entry(key.to_string())
            .or_default()
            .push(value.into());
    }

    /// First value of a nested property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First value of a nested property parsed as an integer.
    #[must_use]
    pub fn int_property(&self, key: &str) -> Option<i64> {
        self.property(key).and_then(|v| v.trim().parse().ok())
    }
}

/// Open Graph and Twitter card metadata of one page, keyed by full tag name
/// (`og:image`, `twitter:card`). Values keep document order.
#[derive(Debug, Clone)]
pub struct OpenGraph {
    /// URL the graph was requested for
    pub original_url: Url,
    /// `<title>` element, used when no `og:title` is present
    pub document_title: Option<String>,
    pub metadata: HashMap<String, Vec<StructuredMetadata>>,
}

impl OpenGraph {
    #[must_use]
    pub fn empty(original_url: Url) -> Self {
        Self {
            original_url,
            document_title: None,
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.values().all(Vec::is_empty)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> &[StructuredMetadata] {
        self.metadata.get(key).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn first_value(&self, key: &str) -> Option<&str> {
        self.get(key)
            .iter()
            .map(|m| m.value.trim())
            .find(|v| !v.is_empty())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.first_value("og:title")
            .or_else(|| self.first_value("twitter:title"))
            .or(self.document_title.as_deref())
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.first_value("og:description")
            .or_else(|| self.first_value("twitter:description"))
    }

    #[must_use]
    pub fn card_type(&self) -> Option<&str> {
        self.first_value("twitter:card")
    }
}
