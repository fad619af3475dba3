use std::{sync::Arc, time::Duration};

use reqwest::{redirect, Client};
use tracing::{info, warn};

use crate::{
    args::Args,
    dns::DnsLookup,
    domain::read_domains,
    pipeline::{process_domain, Context, DomainOutcome},
    pool::{self, BatchSummary},
    runner::ProcessRunner,
    Domain, Error,
};

/// What a run did: one target inline, or a list through the pool.
#[derive(Debug)]
pub enum Dispatch {
    Single(DomainOutcome),
    Batch(BatchSummary<DomainOutcome>),
}

/// Builds the real tool runner, resolver and HTTP client, dispatches the
/// targets and logs how every domain went.
pub async fn run(args: Args) -> Result<(), Error> {
    let settings = Arc::new(args.settings());

    let http_timeout = Duration::from_secs(30);
    let http = Client::builder()
        .redirect(redirect::Policy::limited(4))
        .timeout(http_timeout)
        .build()?;

    let ctx = Context {
        runner: Arc::new(ProcessRunner::new(settings.timeout)),
        lookup: Arc::new(DnsLookup::new()?),
        http,
        settings,
    };

    info!(version = env!("CARGO_PKG_VERSION"), "collector starting");

    match dispatch(&args, ctx).await? {
        Dispatch::Single(outcome) => log_outcome(&outcome),
        Dispatch::Batch(summary) => {
            for (_, result) in &summary.results {
                if let Ok(outcome) = result {
                    log_outcome(outcome);
                }
            }
            info!(
                succeeded = summary.succeeded(),
                failed = summary.failed(),
                "all domains processed"
            );
        }
    }

    Ok(())
}

/// Loads the targets, then runs `-d` inline or the `-f` list through the
/// worker pool. `-d` wins when both are given.
pub async fn dispatch(args: &Args, ctx: Context) -> Result<Dispatch, Error> {
    // configuration problems surface before any tool is started
    match (&args.domain, &args.file) {
        (Some(domain), _) => {
            let outcome = process_domain(ctx, Domain::new(domain.as_str())).await?;
            Ok(Dispatch::Single(outcome))
        }
        (None, Some(path)) => {
            let domains = read_domains(path)?;
            let parallelism = ctx.settings.parallelism;
            let summary = pool::run(domains, parallelism, |domain| {
                process_domain(ctx.clone(), domain)
            })
            .await?;
            Ok(Dispatch::Batch(summary))
        }
        (None, None) => Err(Error::NoTarget),
    }
}

fn log_outcome(outcome: &DomainOutcome) {
    let report = outcome.report.is_ok();
    let enriched = outcome.enrichment.is_ok();

    if report && enriched && outcome.scans.scans_failed() == 0 {
        info!(domain = %outcome.domain, urls = outcome.urls, "domain complete");
    } else {
        warn!(
            domain = %outcome.domain,
            urls = outcome.urls,
            scans_failed = outcome.scans.scans_failed(),
            report,
            enriched,
            "domain finished with errors"
        );
    }
}
