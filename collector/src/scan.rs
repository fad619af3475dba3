use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::join_all;
use tokio::sync::{oneshot, Semaphore};
use tracing::{debug, info, warn};

use crate::{
    config::TemplateRef, report::Synthesizer, runner::Invocation, Domain, Error, Runner, Settings,
};

/// Outcome of the scan and partial report of one template.
#[derive(Debug)]
pub struct TemplateStatus {
    pub number: usize,
    pub template: TemplateRef,
    pub scan: Result<(), Error>,
    pub report: Result<(), Error>,
}

#[derive(Debug, Default)]
pub struct ScanSummary {
    pub templates: Vec<TemplateStatus>,
}

impl ScanSummary {
    pub fn scans_succeeded(&self) -> usize {
        self.templates.iter().filter(|t| t.scan.is_ok()).count()
    }

    pub fn scans_failed(&self) -> usize {
        self.templates.len() - self.scans_succeeded()
    }
}

struct ScanJob {
    number: usize,
    template: TemplateRef,
    invocation: Invocation,
    done: oneshot::Sender<()>,
}

struct ReportJob {
    number: usize,
    template: TemplateRef,
    domain: Domain,
    scan_done: oneshot::Receiver<()>,
}

/// `scanner -l URLS -t TEMPLATE -o OUTPUT [flags...]`
pub fn scan_invocation(
    settings: &Settings,
    domain: &Domain,
    url_file: &Path,
    template: &TemplateRef,
) -> Invocation {
    let mut args = vec![
        "-l".to_string(),
        url_file.to_string_lossy().into_owned(),
        "-t".to_string(),
        template.path().to_string_lossy().into_owned(),
        "-o".to_string(),
        settings.scan_output(domain, template).to_string_lossy().into_owned(),
    ];
    args.extend(settings.scanner_flags.iter().cloned());
    Invocation::new(settings.scanner.clone(), args)
}

/// Runs the scanner once per template and a partial report per template.
///
/// Scan tasks and report tasks draw from two separate pools, each sized to the
/// template count. A report task starts rendering once its sibling scan has
/// finished, whatever the scan's result.
pub async fn scan_all(
    runner: Arc<dyn Runner>,
    settings: Arc<Settings>,
    domain: &Domain,
    url_file: PathBuf,
) -> ScanSummary {
    let pool_size = settings.templates.len().max(1);
    let scan_permits = Arc::new(Semaphore::new(pool_size));
    let report_permits = Arc::new(Semaphore::new(pool_size));

    let mut scans = Vec::with_capacity(settings.templates.len());
    let mut reports = Vec::with_capacity(settings.templates.len());

    for (idx, template) in settings.templates.iter().enumerate() {
        let (done, scan_done) = oneshot::channel();

        let scan_job = ScanJob {
            number: idx + 1,
            template: template.clone(),
            invocation: scan_invocation(&settings, domain, &url_file, template),
            done,
        };
        scans.push(tokio::spawn(run_scan(
            runner.clone(),
            scan_permits.clone(),
            scan_job,
        )));

        let report_job = ReportJob {
            number: idx + 1,
            template: template.clone(),
            domain: domain.clone(),
            scan_done,
        };
        reports.push(tokio::spawn(run_report(
            settings.clone(),
            report_permits.clone(),
            report_job,
        )));
    }

    let (scans, reports) = futures::join!(join_all(scans), join_all(reports));

    let templates = settings
        .templates
        .iter()
        .zip(scans.into_iter().zip(reports))
        .enumerate()
        .map(|(idx, (template, (scan, report)))| {
            let scan = scan.map_err(Error::from).and_then(|result| result);
            let report = report.map_err(Error::from).and_then(|result| result);

            match &scan {
                Ok(()) => {
                    info!(domain = %domain, template = %template.basename(), "scan completed")
                }
                Err(err) => warn!(
                    domain = %domain,
                    template = %template.basename(),
                    error = %err,
                    "scan failed"
                ),
            }
            if let Err(err) = &report {
                warn!(
                    domain = %domain,
                    template = %template.basename(),
                    error = %err,
                    "partial report failed"
                );
            }

            TemplateStatus {
                number: idx + 1,
                template: template.clone(),
                scan,
                report,
            }
        })
        .collect();

    ScanSummary { templates }
}

async fn run_scan(
    runner: Arc<dyn Runner>,
    permits: Arc<Semaphore>,
    job: ScanJob,
) -> Result<(), Error> {
    let _permit = permits.acquire_owned().await?;

    debug!(template = %job.template.basename(), number = job.number, "scan started");
    let result = runner.run(&job.invocation).await.map(|_| ());

    // the receiver only cares that the scan is over
    let _ = job.done.send(());
    result
}

async fn run_report(
    settings: Arc<Settings>,
    permits: Arc<Semaphore>,
    job: ReportJob,
) -> Result<(), Error> {
    let _permit = permits.acquire_owned().await?;

    // an Err here means the scan task ended without signalling, still done
    let _ = job.scan_done.await;

    Synthesizer::new(&settings)
        .write_partial(&job.domain, job.number, &job.template)
        .await
}
