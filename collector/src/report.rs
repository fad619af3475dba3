use std::path::Path;

use tracing::info;

use crate::{config::TemplateRef, Domain, Error, Settings};

/// Renders the HTML report of one domain from its scan output files.
#[derive(Debug, Clone)]
pub struct Synthesizer<'a> {
    settings: &'a Settings,
}

/// Escapes the characters that are significant in HTML text and attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn section(number: usize, output: &str) -> String {
    format!(
        r#"<h2 id="template{number}">Template {number} Results</h2><pre>{}</pre>"#,
        escape_html(output)
    )
}

fn page(domain: &str, css: &str, js: &str, sections: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>Security Scan Report for {domain}</title>
  <style>
{css}
  </style>
  <script>
{js}
  </script>
</head>
<body>
  <h1>Security Scan Report for {domain}</h1>
  <h2>Results:</h2>
{sections}
</body>
</html>
"#
    )
}

async fn read_asset(path: &Path) -> Result<String, Error> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| Error::Asset {
            path: path.to_path_buf(),
            source,
        })
}

impl<'a> Synthesizer<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Synthesizer { settings }
    }

    /// Renders the sections for `templates`, each paired with its 1-based
    /// position in the full template sequence. Any missing scan output fails
    /// the whole document.
    pub async fn render<'t, I>(&self, domain: &Domain, templates: I) -> Result<String, Error>
    where
        I: IntoIterator<Item = (usize, &'t TemplateRef)>,
    {
        let css = read_asset(&self.settings.styles).await?;
        let js = read_asset(&self.settings.script).await?;

        let mut sections = Vec::new();
        for (number, template) in templates {
            let path = self.settings.scan_output(domain, template);
            let output = tokio::fs::read(&path)
                .await
                .map_err(|source| Error::ScanOutput {
                    path: path.clone(),
                    source,
                })?;
            sections.push(section(number, &String::from_utf8_lossy(&output)));
        }

        Ok(page(
            &escape_html(domain.bare()),
            &css,
            &js,
            &sections.join("\n"),
        ))
    }

    /// Writes the aggregate report, every template in order.
    pub async fn write_report(&self, domain: &Domain) -> Result<(), Error> {
        let document = self
            .render(domain, (1..).zip(self.settings.templates.iter()))
            .await?;

        let path = self.settings.report(domain);
        tokio::fs::write(&path, document)
            .await
            .map_err(Error::io(&path))?;

        info!(domain = %domain, report = %path.display(), "HTML report generated");
        Ok(())
    }

    /// Writes the report of a single template, keeping its section number.
    pub async fn write_partial(
        &self,
        domain: &Domain,
        number: usize,
        template: &TemplateRef,
    ) -> Result<(), Error> {
        let document = self.render(domain, [(number, template)]).await?;

        let path = self.settings.partial_report(domain, template);
        tokio::fs::write(&path, document)
            .await
            .map_err(Error::io(&path))?;

        info!(
            domain = %domain,
            template = %template.basename(),
            report = %path.display(),
            "partial report generated"
        );
        Ok(())
    }
}
