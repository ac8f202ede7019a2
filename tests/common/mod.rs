//! Shared helpers for integration tests.

#![allow(dead_code)]

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::{Cursor, Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

/// A smooth grayscale texture; different seeds give unrelated images
pub fn texture(seed: f32, width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let fx = x as f32 * 96.0 / width as f32;
        let fy = y as f32 * 96.0 / height as f32;
        let v = ((fx / (5.0 + seed)).sin() * (fy / (9.0 + seed)).cos() * 100.0 + 128.0) as u8;
        Rgb([v, v, v])
    }))
}

pub fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("encode test image");
    bytes
}

pub fn png(image: &DynamicImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

/// How the throw-away server answers
pub enum Reply {
    /// Status line (e.g. "200 OK") and body
    Respond(&'static str, Vec<u8>),
    /// Accept the connection and say nothing for this long
    Stall(Duration),
}

/// Serve one HTTP request on 127.0.0.1 and return the base URL
pub fn serve_once(reply: Reply) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let address = listener.local_addr().expect("listener address");

    thread::spawn(move || {
        let Ok((mut stream, _)) = listener.accept() else {
            return;
        };

        // Read until the end of the request headers
        let mut request = Vec::new();
        let mut buffer = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut buffer) {
                Ok(0) | Err(_) => return,
                Ok(n) => request.extend_from_slice(&buffer[..n]),
            }
        }

        match reply {
            Reply::Respond(status, body) => {
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = stream.write_all(head.as_bytes());
                let _ = stream.write_all(&body);
                let _ = stream.flush();
            }
            Reply::Stall(duration) => thread::sleep(duration),
        }
    });

    format!("http://{}", address)
}
