use std::{future::Future, sync::Arc};

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::{Domain, Error};

#[derive(Debug)]
pub struct BatchSummary<T> {
    /// One entry per submitted domain, in submission order.
    pub results: Vec<(Domain, Result<T, Error>)>,
}

impl<T> BatchSummary<T> {
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|(_, r)| r.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }
}

/// Runs `work` once per domain with at most `parallelism` units in flight.
///
/// A permit is taken before a domain's task is spawned and travels with the
/// task, so it is given back however the task ends. A failed or panicked unit
/// of work is logged and recorded; the remaining domains still run.
pub async fn run<F, Fut, T>(
    domains: Vec<Domain>,
    parallelism: usize,
    work: F,
) -> Result<BatchSummary<T>, Error>
where
    F: Fn(Domain) -> Fut,
    Fut: Future<Output = Result<T, Error>> + Send + 'static,
    T: Send + 'static,
{
    let permits = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut handles = Vec::with_capacity(domains.len());

    info!(domains = domains.len(), parallelism = parallelism.max(1), "starting batch");

    for domain in domains {
        let permit = permits.clone().acquire_owned().await?;
        let unit = work(domain.clone());

        let handle = tokio::spawn(async move {
            let _permit = permit;
            unit.await
        });
        handles.push((domain, handle));
    }

    let (domains, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
    let results = domains
        .into_iter()
        .zip(join_all(handles).await)
        .map(|(domain, joined)| {
            let result = joined.map_err(Error::from).and_then(|result| result);
            if let Err(err) = &result {
                error!(domain = %domain, error = %err, "processing domain");
            }
            (domain, result)
        })
        .collect();

    Ok(BatchSummary { results })
}
