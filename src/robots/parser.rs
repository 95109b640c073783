//! Robots.txt rules
//!
//! Thin wrapper over the robotstxt crate's matcher.

use robotstxt::DefaultMatcher;

/// Rules of one site's robots.txt
#[derive(Debug, Clone)]
pub struct RobotsRules {
    /// Raw robots.txt body; empty means allow all
    content: String,
}

impl RobotsRules {
    /// Wraps a fetched robots.txt body
    pub fn from_content(content: &str) -> Self {
        Self {
            content: content.to_string(),
        }
    }

    /// Rules that allow everything
    ///
    /// Used when robots.txt is missing or cannot be fetched.
    pub fn allow_all() -> Self {
        Self {
            content: String::new(),
        }
    }

    pub fn is_allow_all(&self) -> bool {
        self.content.trim().is_empty()
    }

    /// Checks whether `url` may be fetched by `agent`
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to check
    /// * `agent` - The product token matched against `User-agent` groups
    pub fn is_allowed(&self, url: &str, agent: &str) -> bool {
        if self.is_allow_all() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, agent, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AGENT: &str = "bio-harvest";

    #[test]
    fn test_allow_all() {
        let rules = RobotsRules::allow_all();
        assert!(rules.is_allow_all());
        assert!(rules.is_allowed("https://pt.wikipedia.org/wiki/Zico", AGENT));
    }

    #[test]
    fn test_disallow_prefix() {
        let rules = RobotsRules::from_content("User-agent: *\nDisallow: /w/\n");
        assert!(rules.is_allowed("https://pt.wikipedia.org/wiki/Zico", AGENT));
        assert!(!rules.is_allowed("https://pt.wikipedia.org/w/index.php", AGENT));
    }

    #[test]
    fn test_allow_overrides_disallow() {
        let rules =
            RobotsRules::from_content("User-agent: *\nDisallow: /wiki/\nAllow: /wiki/Zico\n");
        assert!(rules.is_allowed("https://pt.wikipedia.org/wiki/Zico", AGENT));
        assert!(!rules.is_allowed("https://pt.wikipedia.org/wiki/Pel%C3%A9", AGENT));
    }

    #[test]
    fn test_agent_specific_group() {
        let rules = RobotsRules::from_content(
            "User-agent: bio-harvest\nDisallow: /\n\nUser-agent: *\nAllow: /\n",
        );
        assert!(!rules.is_allowed("https://pt.wikipedia.org/wiki/Zico", AGENT));
        assert!(rules.is_allowed("https://pt.wikipedia.org/wiki/Zico", "OtherBot"));
    }

    #[test]
    fn test_garbage_allows() {
        let rules = RobotsRules::from_content("This is not robots.txt {{{");
        assert!(rules.is_allowed("https://pt.wikipedia.org/wiki/Zico", AGENT));
    }
}
