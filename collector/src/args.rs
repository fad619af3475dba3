use std::{ffi::OsString, path::PathBuf, time::Duration};

use clap::{ArgAction, ArgGroup, Parser};

use crate::config::{
    self, Settings, DEFAULT_INTEL_URL, DEFAULT_PARALLELISM, DEFAULT_SCANNER,
    DEFAULT_TEMPLATES_PATH, DEFAULT_TIMEOUT_SECS,
};

/// Harvest URLs for a list of domains and fuzz them with scanner templates.
#[derive(Parser, Debug)]
#[command(
    name = "collector",
    version,
    after_long_help = "Make sure you have proper authorization to perform security scans on the provided domains."
)]
#[command(group(ArgGroup::new("target").required(true).multiple(true).args(["file", "domain"])))]
pub struct Args {
    /// Path to the file containing a list of domains to process
    #[arg(short = 'f', value_name = "FILE_PATH")]
    pub file: Option<PathBuf>,

    /// Perform scans on a single target domain
    #[arg(short = 'd', value_name = "DOMAIN")]
    pub domain: Option<String>,

    /// Number of domains processed in parallel
    #[arg(
        short = 'p',
        value_name = "PARALLEL",
        default_value_t = DEFAULT_PARALLELISM,
        value_parser = parse_parallelism,
        allow_negative_numbers = true
    )]
    pub parallel: usize,

    /// Custom flags passed to every scanner run (also `-nf`)
    #[arg(
        long = "nuclei-flags",
        visible_alias = "nf",
        value_name = "FLAGS",
        allow_hyphen_values = true
    )]
    pub nuclei_flags: Option<String>,

    /// Extra templates after lfi, xss, sqli, redirect and ssrf; a name with
    /// the basename of a default replaces that default
    #[arg(short = 't', value_name = "TEMPLATE", num_args = 1.., action = ArgAction::Append)]
    pub templates: Vec<String>,

    /// Directory the templates are resolved against (also `-tp`)
    #[arg(
        long = "templates-path",
        visible_alias = "tp",
        value_name = "TEMPLATES_PATH",
        default_value = DEFAULT_TEMPLATES_PATH
    )]
    pub templates_path: PathBuf,

    /// Scanner binary
    #[arg(long, default_value = DEFAULT_SCANNER)]
    pub scanner: String,

    /// Seconds before an external tool is killed, 0 to wait forever
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Where scan outputs, partial reports and IP records go
    #[arg(long, default_value = "Results")]
    pub results_dir: PathBuf,

    /// Where the per-domain HTML reports go
    #[arg(long, default_value = ".")]
    pub report_dir: PathBuf,

    /// CSS embedded in every report
    #[arg(long, default_value = "styles.css")]
    pub styles: PathBuf,

    /// JavaScript embedded in every report
    #[arg(long, default_value = "script.js")]
    pub script: PathBuf,

    /// Threat intelligence endpoint, queried as `<URL>/<ip>`
    #[arg(long, default_value = DEFAULT_INTEL_URL)]
    pub intel_url: String,
}

/// Anything that is not a number falls back to the default.
fn parse_parallelism(value: &str) -> Result<usize, String> {
    Ok(value.trim().parse().unwrap_or(DEFAULT_PARALLELISM))
}

/// Rewrites the single-dash `-nf` and `-tp` options to the long form clap
/// understands. The value following `-nf` is left alone, and arguments that
/// are not valid UTF-8 pass through for clap to reject.
pub fn normalize_legacy_flags<I, S>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    let mut out = Vec::new();
    let mut value_next = false;

    for arg in args.into_iter().map(Into::into) {
        if value_next {
            value_next = false;
            out.push(arg);
            continue;
        }

        match arg.to_str() {
            Some("-nf") => {
                value_next = true;
                out.push(OsString::from("--nf"));
            }
            Some("-tp") => {
                value_next = true;
                out.push(OsString::from("--tp"));
            }
            Some("--nf" | "--nuclei-flags" | "--tp" | "--templates-path") => {
                value_next = true;
                out.push(arg);
            }
            _ => out.push(arg),
        }
    }

    out
}

impl Args {
    pub fn settings(&self) -> Settings {
        Settings {
            parallelism: self.parallel,
            templates: config::templates(&self.templates_path, &self.templates),
            scanner: self.scanner.clone(),
            scanner_flags: self
                .nuclei_flags
                .as_deref()
                .map(|flags| flags.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            timeout: (self.timeout > 0).then(|| Duration::from_secs(self.timeout)),
            results_dir: self.results_dir.clone(),
            report_dir: self.report_dir.clone(),
            styles: self.styles.clone(),
            script: self.script.clone(),
            intel_url: self.intel_url.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        let argv = std::iter::once("collector").chain(args.iter().copied());
        Args::try_parse_from(normalize_legacy_flags(argv))
    }

    #[test]
    fn defaults() {
        let args = parse(&["-f", "domains.txt"]).unwrap();
        let settings = args.settings();

        assert_eq!(args.file.as_deref(), Some(Path::new("domains.txt")));
        assert_eq!(settings.parallelism, 4);
        assert_eq!(settings.templates.len(), 5);
        assert_eq!(settings.templates[0].path(), Path::new("fuzzing-templates/lfi"));
        assert!(settings.scanner_flags.is_empty());
        assert_eq!(settings.timeout, Some(Duration::from_secs(1800)));
    }

    #[test]
    fn legacy_single_dash_options() {
        let args = parse(&[
            "-d",
            "a.test",
            "-nf",
            "-rl 50 -silent",
            "-tp",
            "/opt/t",
            "-t",
            "cves",
            "exposures",
            "-p",
            "8",
        ])
        .unwrap();
        let settings = args.settings();

        assert_eq!(args.domain.as_deref(), Some("a.test"));
        assert_eq!(settings.parallelism, 8);
        assert_eq!(settings.scanner_flags, vec!["-rl", "50", "-silent"]);
        assert_eq!(settings.templates.len(), 7);
        assert_eq!(settings.templates[0].path(), Path::new("/opt/t/lfi"));
        assert_eq!(settings.templates[6].path(), Path::new("/opt/t/exposures"));
    }

    #[test]
    fn template_named_like_a_default_replaces_it() {
        let args = parse(&["-d", "a.test", "-t", "custom/lfi", "cves"]).unwrap();
        let settings = args.settings();

        assert_eq!(settings.templates.len(), 6);
        assert_eq!(
            settings.templates[0].path(),
            Path::new("fuzzing-templates/custom/lfi")
        );
        assert_eq!(settings.templates[5].basename(), "cves");
    }

    #[test]
    fn unparsable_parallelism_uses_default() {
        assert_eq!(parse(&["-f", "x", "-p", "lots"]).unwrap().parallel, 4);
        assert_eq!(parse(&["-f", "x", "-p", "-3"]).unwrap().parallel, 4);
    }

    #[test]
    fn target_is_required() {
        assert!(parse(&["-p", "2"]).is_err());
        assert!(parse(&["-f"]).is_err());
    }

    #[test]
    fn zero_timeout_disables_it() {
        let args = parse(&["-d", "a.test", "--timeout", "0"]).unwrap();
        assert_eq!(args.settings().timeout, None);
    }

    #[test]
    fn value_after_nf_is_not_rewritten() {
        let argv = ["collector", "-nf", "-tp", "-tp", "x"];
        let expected: Vec<OsString> = ["collector", "--nf", "-tp", "--tp", "x"]
            .iter()
            .map(OsString::from)
            .collect();
        assert_eq!(normalize_legacy_flags(argv), expected);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_argument_is_rejected_not_panicked_on() {
        use std::os::unix::ffi::OsStringExt;

        let bad = OsString::from_vec(vec![b'a', 0xff, b'.', b't']);
        let argv = vec![
            OsString::from("collector"),
            OsString::from("-tp"),
            OsString::from("/opt/t"),
            OsString::from("-d"),
            bad.clone(),
        ];

        let normalized = normalize_legacy_flags(argv);
        assert_eq!(normalized[1], OsString::from("--tp"));
        assert_eq!(normalized[4], bad);
        assert!(Args::try_parse_from(normalized).is_err());
    }
}
