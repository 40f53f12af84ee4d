//! Shareable search links: only `q` and `type` are part of the URL contract

use crate::error::{Result, VigilError};
use crate::search::{SearchQuery, SearchScope};
use url::{form_urlencoded, Url};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeepLink {
    pub text: String,
    pub scope: SearchScope,
}

impl DeepLink {
    pub fn new(text: impl Into<String>, scope: SearchScope) -> Self {
        Self {
            text: text.into(),
            scope,
        }
    }

    /// Accepts a full URL, `?q=..&type=..`, or a bare `q=..&type=..`
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(VigilError::DeepLink("empty link".to_string()));
        }

        let query = if input.contains("://") {
            let url = Url::parse(input).map_err(|e| VigilError::DeepLink(e.to_string()))?;
            url.query().unwrap_or_default().to_string()
        } else {
            let start = input.find('?').map_or(0, |i| i + 1);
            input[start..].to_string()
        };

        let mut link = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "q" => link.text = value.trim().to_string(),
                "type" => {
                    link.scope = SearchScope::parse(&value).unwrap_or_else(|| {
                        tracing::debug!("Unknown search type '{}', using 'all'", value);
                        SearchScope::All
                    });
                }
                _ => {}
            }
        }

        Ok(link)
    }

    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair("q", &self.text)
            .append_pair("type", self.scope.as_str())
            .finish()
    }

    /// Filters are session-local, so a link always yields unfiltered queries
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery::new(&self.text).with_scope(self.scope)
    }
}

impl From<&SearchQuery> for DeepLink {
    fn from(query: &SearchQuery) -> Self {
        Self::new(query.text(), query.scope())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_url() {
        let link =
            DeepLink::parse("https://dashboard.example.com/search?q=front+door&type=events&page=2")
                .unwrap();

        assert_eq!(link.text, "front door");
        assert_eq!(link.scope, SearchScope::Events);
    }

    #[test]
    fn test_parse_bare_query_string() {
        let link = DeepLink::parse("?q=Lobby%20Cam").unwrap();
        assert_eq!(link.text, "Lobby Cam");
        assert_eq!(link.scope, SearchScope::All);

        let link = DeepLink::parse("type=identities&q=alice").unwrap();
        assert_eq!(link.scope, SearchScope::Identities);
    }

    #[test]
    fn test_unknown_type_falls_back_to_all() {
        let link = DeepLink::parse("q=x&type=billing").unwrap();
        assert_eq!(link.scope, SearchScope::All);
    }

    #[test]
    fn test_query_string_round_trip() {
        let link = DeepLink::new("front door & gate", SearchScope::Devices);
        let parsed = DeepLink::parse(&link.to_query_string()).unwrap();
        assert_eq!(parsed, link);
    }

    #[test]
    fn test_rejects_garbage_url() {
        assert!(DeepLink::parse("http://[::1").is_err());
        assert!(DeepLink::parse("   ").is_err());
    }
}
