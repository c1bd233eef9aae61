//! Shared fixtures: a throwaway HTTP server and notebook archives.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

pub const FIXTURE_FILES: &[(&str, &str)] = &[
    ("README.md", "# STAK notebooks\n"),
    ("notebooks/intro/intro.ipynb", "{\"cells\": [], \"nbformat\": 4}\n"),
    ("notebooks/data/sample.csv", "wavelength,flux\n1.0,2.0\n"),
];

/// Minimal HTTP/1.1 server answering GETs from a fixed route table.
/// Unknown paths get a 404.
pub struct ArchiveServer {
    pub base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl ArchiveServer {
    pub fn start(routes: HashMap<String, Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind test server");
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { continue };
                serve(stream, &routes, &seen);
            }
        });

        Self { base, requests }
    }

    /// Paths requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn serve(mut stream: TcpStream, routes: &HashMap<String, Vec<u8>>, seen: &Mutex<Vec<String>>) {
    let Ok(clone) = stream.try_clone() else { return };
    let mut reader = BufReader::new(clone);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line == "\r\n" => break,
            Ok(_) => continue,
            Err(_) => return,
        }
    }

    let path = request_line
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    seen.lock().unwrap().push(path.clone());

    let (status, body) = match routes.get(&path) {
        Some(body) => ("200 OK", body.as_slice()),
        None => ("404 Not Found", &b"Not Found"[..]),
    };
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

/// Gzipped tarball with every fixture file under `top/`
pub fn notebooks_tar_gz(top: &str) -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents) in FIXTURE_FILES {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{top}/{path}"), contents.as_bytes())
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

pub fn assert_fixture_extracted(target: &Path) {
    for (path, contents) in FIXTURE_FILES {
        let actual = fs::read_to_string(target.join(path))
            .unwrap_or_else(|e| panic!("{} missing: {e}", target.join(path).display()));
        assert_eq!(actual, *contents);
    }
}

pub fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path).unwrap().next().is_none()
}

/// Names of the entries directly inside `dir`, sorted
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Config file pointing nbget at the test server
pub fn write_config(dir: &Path, repo_base: &str, temp_dir: &Path) -> PathBuf {
    let path = dir.join("nbget.toml");
    let content = format!(
        "[source]\nrepo_base = '{repo_base}'\nproject = 'foo'\n\n[download]\ntemp_dir = '{}'\n",
        temp_dir.display()
    );
    fs::write(&path, content).unwrap();
    path
}
