use std::net::IpAddr;

use async_trait::async_trait;
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    TokioAsyncResolver,
};

use crate::Error;

#[async_trait]
pub trait AddressLookup: Send + Sync {
    /// First address the resolver returns for `host`.
    async fn lookup(&self, host: &str) -> Result<IpAddr, Error>;
}

pub struct DnsLookup {
    resolver: TokioAsyncResolver,
}

impl DnsLookup {
    /// Uses the system resolver configuration, falling back to the library
    /// defaults when it cannot be read.
    pub fn new() -> Result<Self, Error> {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(err) => {
                tracing::debug!(error = %err, "system resolver config unavailable");
                TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())?
            }
        };

        Ok(DnsLookup { resolver })
    }
}

#[async_trait]
impl AddressLookup for DnsLookup {
    async fn lookup(&self, host: &str) -> Result<IpAddr, Error> {
        let response = self.resolver.lookup_ip(host).await?;

        response
            .iter()
            .next()
            .ok_or_else(|| Error::NoAddress(host.to_string()))
    }
}
