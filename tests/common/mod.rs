#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

use filebrowser_upload::api::Credentials;
use filebrowser_upload::config::UploadConfig;
use filebrowser_upload::planner::Destination;
use reqwest::Url;
use tempfile::TempDir;

//===============
// Stub server
//===============

/// One request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub target: String,
    /// Header names are lowercased.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn path(&self) -> &str {
        self.target.split('?').next().unwrap_or("")
    }
}

/// How the stub answers a request.
pub enum Reply {
    Status(u16, &'static str, String),
    /// Close the connection without answering.
    Hangup,
}

pub type Handler = fn(&Recorded) -> Reply;

/// Minimal HTTP/1.1 server on `127.0.0.1:0`, one connection per request.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl StubServer {
    pub fn start(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                // A malformed exchange only affects that one request.
                let _ = serve(stream, handler, &seen);
            }
        });

        StubServer { addr, requests }
    }

    pub fn api(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(stream: TcpStream, handler: Handler, seen: &Mutex<Vec<Recorded>>) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);

    let mut line = String::new();
    reader.read_line(&mut line)?;
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let target = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let len = headers
        .iter()
        .find(|(n, _)| n == "content-length")
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body)?;

    let recorded = Recorded {
        method,
        target,
        headers,
        body,
    };
    let reply = handler(&recorded);
    seen.lock().unwrap().push(recorded);

    let mut stream = stream;
    match reply {
        Reply::Status(code, reason, body) => {
            write!(
                stream,
                "HTTP/1.1 {code} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )?;
            stream.flush()
        }
        Reply::Hangup => stream.shutdown(std::net::Shutdown::Both),
    }
}

/// Answers the login with `token-123` and every upload with 200.
pub fn accept_all(req: &Recorded) -> Reply {
    if req.path().ends_with("/login") {
        Reply::Status(200, "OK", "token-123".into())
    } else {
        Reply::Status(200, "OK", String::new())
    }
}

//===============
// Fixtures
//===============

pub fn config(api: Url, source: &std::path::Path, dest: &str) -> UploadConfig {
    UploadConfig {
        api,
        credentials: Credentials {
            username: "admin".into(),
            password: "secret".into(),
        },
        source: source.to_path_buf(),
        destination: Destination::parse(dest).unwrap(),
        insecure_tls: false,
        no_progress: true,
        override_existing: false,
        dry_run: false,
        only_folder_content: false,
        fail_on_error: false,
    }
}

/// `docs/` holding five small files, two of them in a subfolder.
pub fn five_file_tree() -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let root = dir.path().join("docs");
    std::fs::create_dir_all(root.join("sub")).unwrap();
    for name in ["a.txt", "b.txt", "c.txt", "sub/d.txt", "sub/e.txt"] {
        std::fs::write(root.join(name), format!("content of {name}")).unwrap();
    }
    dir
}
