use std::{path::PathBuf, sync::Arc};

use reqwest::Client;
use tracing::{error, info, info_span, warn, Instrument};

use crate::{
    dns::AddressLookup,
    enrich::{enrich, Enrichment},
    harvest::harvest,
    report::Synthesizer,
    scan::{scan_all, ScanSummary},
    Domain, Error, Runner, Settings,
};

/// Shared handles for every unit of work of a run.
#[derive(Clone)]
pub struct Context {
    pub settings: Arc<Settings>,
    pub runner: Arc<dyn Runner>,
    pub lookup: Arc<dyn AddressLookup>,
    pub http: Client,
}

/// What happened to one domain. Failures inside the stages are recorded here
/// rather than returned, so the caller always learns how far a domain got.
#[derive(Debug)]
pub struct DomainOutcome {
    pub domain: Domain,
    pub urls: usize,
    pub scans: ScanSummary,
    pub report: Result<PathBuf, Error>,
    pub enrichment: Result<Enrichment, Error>,
}

/// Harvest, scan, report and enrich one domain, in that order.
///
/// Only setup failures (output directories, temp workspace, merged url file)
/// are returned as `Err`. The temp workspace is removed when this returns.
pub async fn process_domain(ctx: Context, domain: Domain) -> Result<DomainOutcome, Error> {
    let span = info_span!("domain", domain = %domain);
    run(ctx, domain).instrument(span).await
}

async fn run(ctx: Context, domain: Domain) -> Result<DomainOutcome, Error> {
    info!("processing");
    let settings = &ctx.settings;

    for dir in [&settings.results_dir, &settings.report_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(Error::io(dir))?;
    }

    let workspace = tempfile::Builder::new()
        .prefix("scan-temp-")
        .tempdir()
        .map_err(Error::io(std::env::temp_dir()))?;

    let harvested = harvest(ctx.runner.clone(), &domain, workspace.path()).await?;

    let scans = scan_all(
        ctx.runner.clone(),
        settings.clone(),
        &domain,
        harvested.url_file.clone(),
    )
    .await;

    let synthesizer = Synthesizer::new(settings);
    let report = match synthesizer.write_report(&domain).await {
        Ok(()) => Ok(settings.report(&domain)),
        Err(err) => {
            error!(error = %err, "generating HTML report");
            Err(err)
        }
    };

    let enrichment = enrich(settings, ctx.lookup.as_ref(), &ctx.http, &domain).await;
    if let Err(err) = &enrichment {
        warn!(error = %err, "enrichment failed");
    }

    drop(workspace);
    info!(
        urls = harvested.urls.len(),
        scans_ok = scans.scans_succeeded(),
        scans_failed = scans.scans_failed(),
        "done processing"
    );

    Ok(DomainOutcome {
        domain,
        urls: harvested.urls.len(),
        scans,
        report,
        enrichment,
    })
}
