//! Minimal HTTP/1.1 server standing in for both the data file web server and
//! the OSF files API in integration tests.
//!
//! GET serves whatever body is registered for the path (404 otherwise).
//! PUT answers with the status scripted for the `name` query parameter
//! (201 by default). Requests scripted to hang up get the connection closed
//! with no response at all. Every request is recorded.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    /// Path including the query string.
    pub target: String,
    pub authorization: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Default)]
struct Shared {
    routes: HashMap<String, (u16, String)>,
    put_status: HashMap<String, u16>,
    hang_up_puts: HashSet<String>,
    hang_up_gets: HashSet<String>,
    requests: Vec<Recorded>,
}

#[derive(Clone)]
pub struct OsfServer {
    base: String,
    shared: Arc<Mutex<Shared>>,
}

impl OsfServer {
    /// Starts the server in a background thread. It runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let shared = Arc::new(Mutex::new(Shared::default()));
        let accept_shared = Arc::clone(&shared);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let shared = Arc::clone(&accept_shared);
                thread::spawn(move || handle(stream, &shared));
            }
        });
        OsfServer {
            base: format!("http://127.0.0.1:{}", port),
            shared,
        }
    }

    /// Absolute URL for `path` (which starts with `/`).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    /// Serve `body` with status 200 for GET `path`.
    pub fn serve(&self, path: &str, body: &str) {
        self.serve_status(path, 200, body);
    }

    pub fn serve_status(&self, path: &str, status: u16, body: &str) {
        self.shared
            .lock()
            .unwrap()
            .routes
            .insert(path.to_string(), (status, body.to_string()));
    }

    /// Answer PUTs for file `name` with `status`.
    pub fn put_status(&self, name: &str, status: u16) {
        self.shared
            .lock()
            .unwrap()
            .put_status
            .insert(name.to_string(), status);
    }

    /// Close the connection without replying to PUTs for file `name`.
    pub fn hang_up_on_put(&self, name: &str) {
        self.shared
            .lock()
            .unwrap()
            .hang_up_puts
            .insert(name.to_string());
    }

    /// Close the connection without replying to GET `path`.
    pub fn hang_up_on_get(&self, path: &str) {
        self.shared
            .lock()
            .unwrap()
            .hang_up_gets
            .insert(path.to_string());
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.shared.lock().unwrap().requests.clone()
    }

    pub fn puts(&self) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == "PUT")
            .collect()
    }
}

/// Value of the `name` query parameter of a request target.
pub fn query_name(target: &str) -> Option<String> {
    let (_, query) = target.split_once('?')?;
    query
        .split('&')
        .find_map(|kv| kv.strip_prefix("name="))
        .map(str::to_string)
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        404 => "Not Found",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

fn handle(stream: TcpStream, shared: &Mutex<Shared>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let target = parts.next().unwrap_or("").to_string();

    let mut content_length = 0usize;
    let mut authorization = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).unwrap_or(0) == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value.trim().to_string());
            }
        }
    }
    let mut body = vec![0u8; content_length];
    if reader.read_exact(&mut body).is_err() {
        return;
    }

    let reply = {
        let mut shared = shared.lock().unwrap();
        shared.requests.push(Recorded {
            method: method.clone(),
            target: target.clone(),
            authorization,
            body,
        });
        let is_put = method.eq_ignore_ascii_case("PUT");
        let hang_up = if is_put {
            query_name(&target).map_or(false, |n| shared.hang_up_puts.contains(&n))
        } else {
            shared.hang_up_gets.contains(&target)
        };
        if hang_up {
            None
        } else if is_put {
            let status = query_name(&target)
                .and_then(|n| shared.put_status.get(&n).copied())
                .unwrap_or(201);
            Some((status, String::new()))
        } else {
            Some(
                shared
                    .routes
                    .get(&target)
                    .cloned()
                    .unwrap_or((404, "not found".to_string())),
            )
        }
    };
    let Some((status, payload)) = reply else {
        let _ = stream.shutdown(Shutdown::Both);
        return;
    };

    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\n\
         Connection: close\r\n\r\n{}",
        status,
        reason(status),
        payload.len(),
        payload
    );
    let mut stream = stream;
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
