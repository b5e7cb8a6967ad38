#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use zip::write::FileOptions;

/// Write a ZIP container. Names ending in `/` become directory records.
pub fn write_zip(dir: &Path, name: &str, members: &[(&str, &[u8])]) -> PathBuf {
    let path = dir.join(name);
    let mut writer = zip::ZipWriter::new(std::fs::File::create(&path).unwrap());
    for (member, data) in members {
        if member.ends_with('/') {
            writer.add_directory(*member, FileOptions::default()).unwrap();
        } else {
            writer.start_file(*member, FileOptions::default()).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap();
    path
}

/// Overwrite the uncompressed size recorded in every central header.
pub fn set_zip_uncompressed_size(path: &Path, size: u32) {
    let mut bytes = std::fs::read(path).unwrap();
    for i in 0..bytes.len().saturating_sub(28) {
        if &bytes[i..i + 4] == b"PK\x01\x02" {
            bytes[i + 24..i + 28].copy_from_slice(&size.to_le_bytes());
        }
    }
    std::fs::write(path, bytes).unwrap();
}

/// Set the "encrypted" flag on every local and central header of a ZIP.
pub fn mark_zip_encrypted(path: &Path) {
    let mut bytes = std::fs::read(path).unwrap();
    for i in 0..bytes.len().saturating_sub(4) {
        match &bytes[i..i + 4] {
            b"PK\x03\x04" => bytes[i + 6] |= 0x01,
            b"PK\x01\x02" => bytes[i + 8] |= 0x01,
            _ => {}
        }
    }
    std::fs::write(path, bytes).unwrap();
}

/// One member of a hand-built RAR 4.x container.
pub struct RarMember<'a> {
    pub name: &'a str,
    pub data: &'a [u8],
    pub is_dir: bool,
    pub encrypted: bool,
}

impl<'a> RarMember<'a> {
    pub fn file(name: &'a str, data: &'a [u8]) -> Self {
        Self {
            name,
            data,
            is_dir: false,
            encrypted: false,
        }
    }

    pub fn dir(name: &'a str) -> Self {
        Self {
            name,
            data: &[],
            is_dir: true,
            encrypted: false,
        }
    }

    pub fn encrypted(name: &'a str) -> Self {
        Self {
            name,
            data: &[0u8; 16],
            is_dir: false,
            encrypted: true,
        }
    }
}

/// 2023-05-17 10:30:00 as an MS-DOS stamp
pub const RAR_DOS_TIME: u32 = (((43 << 9) | (5 << 5) | 17) << 16) | ((10 << 11) | (30 << 5));

fn rar_block(head_type: u8, flags: u16, body: &[u8]) -> Vec<u8> {
    let size = (7 + body.len()) as u16;
    let mut header = vec![head_type];
    header.extend_from_slice(&flags.to_le_bytes());
    header.extend_from_slice(&size.to_le_bytes());
    header.extend_from_slice(body);

    let crc = crc32fast::hash(&header) as u16;
    let mut block = crc.to_le_bytes().to_vec();
    block.extend_from_slice(&header);
    block
}

/// Write a RAR 4.x container whose members are all stored uncompressed.
pub fn write_rar(dir: &Path, name: &str, members: &[RarMember]) -> PathBuf {
    let mut bytes = b"Rar!\x1a\x07\x00".to_vec();
    bytes.extend(rar_block(0x73, 0x0000, &[0u8; 6]));

    for member in members {
        let mut flags = 0x8000u16;
        if member.is_dir {
            flags |= 0x00E0;
        }
        if member.encrypted {
            flags |= 0x0004;
        }
        let attr: u32 = if member.is_dir { 0o40755 } else { 0o100644 };
        let data_crc = if member.is_dir {
            0
        } else {
            crc32fast::hash(member.data)
        };

        let mut body = Vec::new();
        body.extend_from_slice(&(member.data.len() as u32).to_le_bytes());
        body.extend_from_slice(&(member.data.len() as u32).to_le_bytes());
        body.push(3); // Unix
        body.extend_from_slice(&data_crc.to_le_bytes());
        body.extend_from_slice(&RAR_DOS_TIME.to_le_bytes());
        body.push(29);
        body.push(0x30); // store
        body.extend_from_slice(&(member.name.len() as u16).to_le_bytes());
        body.extend_from_slice(&attr.to_le_bytes());
        body.extend_from_slice(member.name.as_bytes());

        bytes.extend(rar_block(0x74, flags, &body));
        bytes.extend_from_slice(member.data);
    }

    bytes.extend(rar_block(0x7B, 0x4000, &[]));

    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Canned reply of the fake remote helper.
#[derive(Clone)]
pub enum Reply {
    Json(u16, String),
    /// Accept the connection and never answer
    Hang,
}

/// Minimal HTTP/1.1 server standing in for the remote helper.
pub struct FakeHelper {
    pub url: String,
    requests: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeHelper {
    pub async fn start(routes: Vec<(&'static str, Reply)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let routes = Arc::new(routes);
        let log = requests.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = routes.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &log).await;
                });
            }
        });

        Self { url, requests }
    }

    /// Number of requests received for `path`.
    pub fn hits(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .count()
    }

    /// Bodies of the requests received for `path`.
    pub fn bodies(&self, path: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn serve(
    mut stream: TcpStream,
    routes: &[(&'static str, Reply)],
    log: &Mutex<Vec<(String, String)>>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let path = head
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    log.lock().unwrap().push((path.clone(), body));

    let reply = routes
        .iter()
        .find(|(route, _)| *route == path)
        .map(|(_, reply)| reply.clone())
        .unwrap_or(Reply::Json(404, "{}".to_string()));

    match reply {
        Reply::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
        Reply::Json(status, body) => {
            let response = format!(
                "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await?;
            stream.shutdown().await
        }
    }
}
