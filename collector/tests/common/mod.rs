#![allow(dead_code)]

use std::{
    collections::HashMap,
    net::IpAddr,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use collector::{
    dns::AddressLookup, pipeline::Context, runner::Invocation, Error, Runner, Settings,
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};

/// Stands in for the discovery tools and the scanner.
///
/// Harvesters print their canned output; the scanner writes a small report
/// to its `-o` path that embeds a few HTML special characters.
#[derive(Default)]
pub struct FakeRunner {
    pub harvest: HashMap<String, String>,
    pub failing_templates: Vec<String>,
    pub delay: Duration,
    pub calls: Mutex<Vec<Invocation>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        let mut harvest = HashMap::new();
        harvest.insert(
            "waybackurls".to_string(),
            "example.com/a\nhttps://example.com/b\n\n".to_string(),
        );
        harvest.insert(
            "gau".to_string(),
            "https://example.com/a\nexample.com/c\n".to_string(),
        );
        harvest.insert(
            "katana".to_string(),
            "http://example.com/a\n   \nexample.com/b\n".to_string(),
        );
        harvest.insert("hakrawler".to_string(), "https://example.com/d\n".to_string());

        FakeRunner {
            harvest,
            ..FakeRunner::default()
        }
    }

    pub fn failing_tool(mut self, program: &str) -> Self {
        self.harvest.remove(program);
        self
    }

    pub fn failing_template(mut self, basename: &str) -> Self {
        self.failing_templates.push(basename.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.program == program)
            .collect()
    }
}

fn failed(program: &str) -> Error {
    Error::ToolFailed {
        program: program.to_string(),
        status: "exit status: 1".to_string(),
        stderr: "fake failure".to_string(),
    }
}

#[async_trait]
impl Runner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> Result<Vec<u8>, Error> {
        self.calls.lock().unwrap().push(invocation.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if invocation.program == "nuclei" {
            let template = invocation.arg_after("-t").unwrap_or_default();
            let basename = Path::new(template)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            if self.failing_templates.contains(&basename) {
                return Err(failed("nuclei"));
            }

            let urls = invocation.arg_after("-l").unwrap_or_default();
            let count = std::fs::read_to_string(urls)
                .map(|urls| urls.lines().count())
                .unwrap_or_default();
            let output = invocation.arg_after("-o").unwrap_or_default();
            std::fs::write(
                output,
                format!("[{basename}] <finding> & \"{count}\" urls\n"),
            )
            .map_err(|source| Error::Io {
                path: output.into(),
                source,
            })?;
            return Ok(Vec::new());
        }

        match self.harvest.get(&invocation.program) {
            Some(stdout) => Ok(stdout.clone().into_bytes()),
            None => Err(failed(&invocation.program)),
        }
    }
}

/// Resolves every host to the same address, or fails for all of them.
pub struct FakeLookup(pub Option<IpAddr>);

#[async_trait]
impl AddressLookup for FakeLookup {
    async fn lookup(&self, host: &str) -> Result<IpAddr, Error> {
        self.0.ok_or_else(|| Error::NoAddress(host.to_string()))
    }
}

/// Minimal HTTP endpoint answering every request with the same status and
/// body. Requested paths are recorded.
pub struct IntelServer {
    pub base: String,
    pub paths: Arc<Mutex<Vec<String>>>,
}

pub async fn intel_server(status: &'static str, body: &'static str) -> IntelServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}/", listener.local_addr().unwrap());
    let paths = Arc::new(Mutex::new(Vec::new()));

    let seen = paths.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let seen = seen.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                if let Some(path) = request.split_whitespace().nth(1) {
                    seen.lock().unwrap().push(path.to_string());
                }

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    IntelServer { base, paths }
}

/// Settings rooted in a fresh temp dir, with the report assets in place.
pub fn settings(root: &TempDir, intel_url: &str) -> Settings {
    let styles = root.path().join("styles.css");
    let script = root.path().join("script.js");
    std::fs::write(&styles, "body { font-family: monospace; }").unwrap();
    std::fs::write(&script, "console.log(1 < 2);").unwrap();

    Settings {
        results_dir: root.path().join("Results"),
        report_dir: root.path().to_path_buf(),
        styles,
        script,
        intel_url: intel_url.to_string(),
        timeout: Some(Duration::from_secs(10)),
        ..Settings::default()
    }
}

pub fn context(settings: Settings, runner: Arc<FakeRunner>, ip: Option<IpAddr>) -> Context {
    Context {
        settings: Arc::new(settings),
        runner,
        lookup: Arc::new(FakeLookup(ip)),
        http: reqwest::Client::new(),
    }
}
