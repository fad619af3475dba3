use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use crate::Domain;

pub const DEFAULT_PARALLELISM: usize = 4;
pub const DEFAULT_TEMPLATES_PATH: &str = "fuzzing-templates";
pub const DEFAULT_TEMPLATES: &[&str] = &["lfi", "xss", "sqli", "redirect", "ssrf"];
pub const DEFAULT_TIMEOUT_SECS: u64 = 1800;
pub const DEFAULT_INTEL_URL: &str = "https://internetdb.shodan.io/";
pub const DEFAULT_SCANNER: &str = "nuclei";

/// A scan template, resolved against the template base path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    path: PathBuf,
}

impl TemplateRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TemplateRef { path: path.into() }
    }

    /// `base.join(name)`, so an absolute name is kept untouched.
    pub fn resolve(base: &Path, name: &str) -> Self {
        TemplateRef::new(base.join(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn basename(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().replace('/', "_"))
    }
}

/// Default templates followed by any extra names, all under `base`.
///
/// An extra name whose basename is already taken replaces that entry in
/// place, so every template keeps a distinct output file.
pub fn templates(base: &Path, extra: &[String]) -> Vec<TemplateRef> {
    let mut list: Vec<TemplateRef> = DEFAULT_TEMPLATES
        .iter()
        .map(|name| TemplateRef::resolve(base, name))
        .collect();

    for name in extra {
        let template = TemplateRef::resolve(base, name);
        let basename = template.basename();
        match list.iter_mut().find(|t| t.basename() == basename) {
            Some(slot) => *slot = template,
            None => list.push(template),
        }
    }
    list
}

/// Everything a run needs, built once from the command line.
#[derive(Debug, Clone)]
pub struct Settings {
    pub parallelism: usize,
    pub templates: Vec<TemplateRef>,
    pub scanner: String,
    pub scanner_flags: Vec<String>,
    pub timeout: Option<Duration>,
    pub results_dir: PathBuf,
    pub report_dir: PathBuf,
    pub styles: PathBuf,
    pub script: PathBuf,
    pub intel_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            parallelism: DEFAULT_PARALLELISM,
            templates: templates(Path::new(DEFAULT_TEMPLATES_PATH), &[]),
            scanner: DEFAULT_SCANNER.to_string(),
            scanner_flags: Vec::new(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            results_dir: PathBuf::from("Results"),
            report_dir: PathBuf::from("."),
            styles: PathBuf::from("styles.css"),
            script: PathBuf::from("script.js"),
            intel_url: DEFAULT_INTEL_URL.to_string(),
        }
    }
}

impl Settings {
    pub fn scan_output(&self, domain: &Domain, template: &TemplateRef) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}_output.txt",
            domain.file_stem(),
            template.basename()
        ))
    }

    pub fn partial_report(&self, domain: &Domain, template: &TemplateRef) -> PathBuf {
        self.results_dir.join(format!(
            "{}_{}_report.html",
            domain.file_stem(),
            template.basename()
        ))
    }

    pub fn report(&self, domain: &Domain) -> PathBuf {
        self.report_dir.join(format!("{}.html", domain.file_stem()))
    }

    pub fn real_ip(&self, domain: &Domain) -> PathBuf {
        self.results_dir.join(format!("{}_real_ip.txt", domain.file_stem()))
    }

    pub fn intel(&self, domain: &Domain) -> PathBuf {
        self.results_dir.join(format!("{}_intel.txt", domain.file_stem()))
    }
}
