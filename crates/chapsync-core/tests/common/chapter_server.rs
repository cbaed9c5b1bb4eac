//! Minimal HTTP/1.1 server imitating the resolve endpoint and a distribution node.
//!
//! `GET /at-home/server/<id>` answers `{"baseUrl": "<server>/node"}`;
//! `GET /node/data/<hash>/<file>` answers `page:<file>` after an optional
//! delay. Counters let tests observe how many page requests were in flight.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Sleep before answering each page request.
    pub page_delay: Duration,
    /// Page file names answered with 404.
    pub failing_pages: Vec<String>,
    /// If set, the resolve endpoint answers with this status and a short body.
    pub resolve_status: Option<u16>,
    /// If true, the resolve endpoint answers `{"baseUrl": ""}`.
    pub empty_base_url: bool,
}

#[derive(Debug, Default)]
pub struct Stats {
    pub resolve_requests: AtomicUsize,
    pub page_requests: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl Stats {
    pub fn page_requests(&self) -> usize {
        self.page_requests.load(Ordering::SeqCst)
    }

    pub fn resolve_requests(&self) -> usize {
        self.resolve_requests.load(Ordering::SeqCst)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

pub struct TestServer {
    pub base: String,
    pub stats: Arc<Stats>,
}

impl TestServer {
    /// Value for `resolve_endpoint`.
    pub fn resolve_endpoint(&self) -> String {
        format!("{}/at-home/server", self.base)
    }
}

/// Starts a server in a background thread. It runs until the process exits.
pub fn start(opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{}", port);
    let stats = Arc::new(Stats::default());
    let opts = Arc::new(opts);
    {
        let stats = Arc::clone(&stats);
        let base = base.clone();
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let stats = Arc::clone(&stats);
                let opts = Arc::clone(&opts);
                let base = base.clone();
                thread::spawn(move || handle(stream, &base, &opts, &stats));
            }
        });
    }
    TestServer { base, stats }
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn handle(mut stream: TcpStream, base: &str, opts: &ServerOptions, stats: &Stats) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = String::from_utf8_lossy(&buf[..n]);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();

    if path.starts_with("/at-home/server/") {
        stats.resolve_requests.fetch_add(1, Ordering::SeqCst);
        if let Some(code) = opts.resolve_status {
            respond(&mut stream, &format!("{} Test", code), "text/plain", b"upstream says no");
            return;
        }
        let body = if opts.empty_base_url {
            r#"{"result":"ok","baseUrl":""}"#.to_string()
        } else {
            format!(r#"{{"result":"ok","baseUrl":"{}/node"}}"#, base)
        };
        respond(&mut stream, "200 OK", "application/json", body.as_bytes());
        return;
    }

    if let Some(rest) = path.strip_prefix("/node/data/") {
        let file = rest.rsplit('/').next().unwrap_or("").to_string();
        stats.page_requests.fetch_add(1, Ordering::SeqCst);
        if opts.failing_pages.iter().any(|f| f == &file) {
            respond(&mut stream, "404 Not Found", "text/plain", b"missing");
            return;
        }
        let current = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        stats.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if !opts.page_delay.is_zero() {
            thread::sleep(opts.page_delay);
        }
        // Leave the in-flight window before answering; the client still holds its slot here.
        stats.in_flight.fetch_sub(1, Ordering::SeqCst);
        let body = format!("page:{}", file);
        respond(&mut stream, "200 OK", "image/png", body.as_bytes());
        return;
    }

    respond(&mut stream, "404 Not Found", "text/plain", b"");
}
