use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::{future::join_all, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

use crate::{runner::Invocation, urls::UrlSet, Domain, Error, Runner};

const FUNNEL_CAPACITY: usize = 1024;

/// The discovery tools run for every domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Harvester {
    Wayback,
    Gau,
    Katana,
    Hakrawler,
}

pub const HARVESTERS: [Harvester; 4] = [
    Harvester::Wayback,
    Harvester::Gau,
    Harvester::Katana,
    Harvester::Hakrawler,
];

impl Harvester {
    pub fn program(self) -> &'static str {
        match self {
            Harvester::Wayback => "waybackurls",
            Harvester::Gau => "gau",
            Harvester::Katana => "katana",
            Harvester::Hakrawler => "hakrawler",
        }
    }

    pub fn output_file(self) -> &'static str {
        match self {
            Harvester::Wayback => "wayback.txt",
            Harvester::Gau => "gau.txt",
            Harvester::Katana => "katana.txt",
            Harvester::Hakrawler => "hakrawler.txt",
        }
    }

    pub fn invocation(self, domain: &Domain) -> Invocation {
        match self {
            Harvester::Wayback | Harvester::Gau => Invocation::new(self.program(), [domain.bare()]),
            Harvester::Katana => {
                Invocation::new(self.program(), ["-u", domain.name(), "-d", "6", "-jc"])
            }
            Harvester::Hakrawler => {
                Invocation::new(self.program(), Vec::<String>::new()).with_stdin(domain.name())
            }
        }
    }
}

/// Everything one harvester task needs, moved into the task.
#[derive(Debug)]
struct HarvestJob {
    harvester: Harvester,
    invocation: Invocation,
    output: PathBuf,
    funnel: mpsc::Sender<String>,
}

#[derive(Debug)]
pub struct ToolReport {
    pub harvester: Harvester,
    pub result: Result<usize, Error>,
}

#[derive(Debug)]
pub struct Harvest {
    pub urls: UrlSet,
    pub url_file: PathBuf,
    pub tools: Vec<ToolReport>,
}

/// Runs every harvester concurrently, merges their URLs and writes `urls.txt`
/// into `workdir`.
pub async fn harvest(
    runner: Arc<dyn Runner>,
    domain: &Domain,
    workdir: &Path,
) -> Result<Harvest, Error> {
    let (funnel, lines) = mpsc::channel::<String>(FUNNEL_CAPACITY);

    let collector = tokio::spawn(async move {
        ReceiverStream::new(lines)
            .fold(UrlSet::new(), |mut urls, line| async move {
                urls.insert(&line);
                urls
            })
            .await
    });

    let handles: Vec<_> = HARVESTERS
        .iter()
        .map(|&harvester| {
            let job = HarvestJob {
                harvester,
                invocation: harvester.invocation(domain),
                output: workdir.join(harvester.output_file()),
                funnel: funnel.clone(),
            };
            tokio::spawn(run_harvester(runner.clone(), job))
        })
        .collect();
    // the collector finishes once every task has dropped its sender
    drop(funnel);

    let mut tools = Vec::with_capacity(HARVESTERS.len());
    for (harvester, joined) in HARVESTERS.iter().zip(join_all(handles).await) {
        let result = joined.map_err(Error::from).and_then(|result| result);
        match &result {
            Ok(lines) => {
                info!(domain = %domain, tool = harvester.program(), lines, "harvester finished")
            }
            Err(err) => warn!(
                domain = %domain,
                tool = harvester.program(),
                error = %err,
                "harvester failed"
            ),
        }
        tools.push(ToolReport {
            harvester: *harvester,
            result,
        });
    }

    let urls = collector.await?;
    let url_file = workdir.join("urls.txt");
    tokio::fs::write(&url_file, urls.to_lines())
        .await
        .map_err(Error::io(&url_file))?;

    info!(domain = %domain, urls = urls.len(), "merged harvested urls");

    Ok(Harvest {
        urls,
        url_file,
        tools,
    })
}

async fn run_harvester(runner: Arc<dyn Runner>, job: HarvestJob) -> Result<usize, Error> {
    let stdout = runner.run(&job.invocation).await?;

    tokio::fs::write(&job.output, &stdout)
        .await
        .map_err(Error::io(&job.output))?;

    let contents = tokio::fs::read(&job.output)
        .await
        .map_err(Error::io(&job.output))?;
    let contents = String::from_utf8_lossy(&contents);

    let mut sent = 0;
    for line in contents.lines().filter(|line| !line.trim().is_empty()) {
        if job.funnel.send(line.to_string()).await.is_err() {
            break;
        }
        sent += 1;
    }

    debug!(
        tool = job.harvester.program(),
        output = %job.output.display(),
        sent,
        "harvester output read"
    );
    Ok(sent)
}
