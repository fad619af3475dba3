use std::{net::IpAddr, path::PathBuf};

use reqwest::Client;
use tracing::info;
use url::Url;

use crate::{dns::AddressLookup, Domain, Error, Settings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enrichment {
    pub ip: IpAddr,
    pub ip_record: PathBuf,
    pub intel_record: PathBuf,
}

/// `{base}/{ip}`, whether or not `base` ends with a slash.
pub fn intel_url(base: &str, ip: &str) -> Result<Url, Error> {
    let base = if base.ends_with('/') {
        Url::parse(base)?
    } else {
        Url::parse(&format!("{base}/"))?
    };

    Ok(base.join(ip)?)
}

/// Resolves the domain, records its address, then stores the threat-intel
/// answer for that address.
pub async fn enrich(
    settings: &Settings,
    lookup: &dyn AddressLookup,
    http: &Client,
    domain: &Domain,
) -> Result<Enrichment, Error> {
    let ip = lookup.lookup(domain.host()).await?;

    let ip_record = settings.real_ip(domain);
    tokio::fs::write(&ip_record, ip.to_string())
        .await
        .map_err(Error::io(&ip_record))?;
    info!(domain = %domain, %ip, "resolved real IP address");

    // the lookup is keyed by what was persisted
    let recorded = tokio::fs::read_to_string(&ip_record)
        .await
        .map_err(Error::io(&ip_record))?;
    let url = intel_url(&settings.intel_url, recorded.trim())?;

    let res = http.get(url.clone()).send().await?;
    if !res.status().is_success() {
        return Err(Error::InvalidHttpResponse(format!("{url} ({})", res.status())));
    }
    let body = res.bytes().await?;

    let intel_record = settings.intel(domain);
    tokio::fs::write(&intel_record, &body)
        .await
        .map_err(Error::io(&intel_record))?;
    info!(domain = %domain, %ip, intel = %intel_record.display(), "threat intel saved");

    Ok(Enrichment {
        ip,
        ip_record,
        intel_record,
    })
}
