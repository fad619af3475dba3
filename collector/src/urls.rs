use std::collections::HashSet;

/// Deduplicated set of discovered URLs, every entry carrying a scheme.
#[derive(Debug, Default, Clone)]
pub struct UrlSet {
    urls: HashSet<String>,
}

/// Gives a scheme-less line the `https://` scheme. Blank lines yield `None`.
pub fn normalize(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    if line.contains("://") {
        Some(line.to_string())
    } else {
        Some(format!("https://{line}"))
    }
}

impl UrlSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when the normalized line was not already present.
    pub fn insert(&mut self, line: &str) -> bool {
        match normalize(line) {
            Some(url) => self.urls.insert(url),
            None => false,
        }
    }

    pub fn extend_lines(&mut self, text: &str) {
        for line in text.lines() {
            self.insert(line);
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// Newline-delimited, sorted so the scanner input is stable.
    pub fn to_lines(&self) -> String {
        let mut urls: Vec<&String> = self.urls.iter().collect();
        urls.sort();

        let mut out = String::new();
        for url in urls {
            out.push_str(url);
            out.push('\n');
        }
        out
    }
}
