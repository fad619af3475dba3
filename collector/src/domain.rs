use std::{fmt, path::Path};

use crate::Error;

/// A scan target as given by the operator, possibly with a scheme prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Domain(String);

impl Domain {
    pub fn new(name: impl Into<String>) -> Self {
        Domain(name.into())
    }

    /// The value exactly as supplied.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// The value without a leading `http://` or `https://`.
    pub fn bare(&self) -> &str {
        let name = self.0.strip_prefix("http://").unwrap_or(&self.0);
        name.strip_prefix("https://").unwrap_or(name)
    }

    /// Filesystem safe name shared by every artifact of this domain.
    pub fn file_stem(&self) -> String {
        self.bare().replace('/', "_")
    }

    /// Host part to resolve: no path, no port.
    pub fn host(&self) -> &str {
        let authority = self.bare().split('/').next().unwrap_or_default();

        if let Some(rest) = authority.strip_prefix('[') {
            return rest.split(']').next().unwrap_or(rest);
        }

        match authority.rsplit_once(':') {
            Some((host, port))
                if !host.contains(':') && port.chars().all(|c| c.is_ascii_digit()) =>
            {
                host
            }
            _ => authority,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.bare())
    }
}

/// Parses a newline-delimited domain list, skipping blank lines.
pub fn parse_domains(contents: &str) -> Vec<Domain> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(Domain::new)
        .collect()
}

pub fn read_domains(path: &Path) -> Result<Vec<Domain>, Error> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::DomainList {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse_domains(&contents))
}
