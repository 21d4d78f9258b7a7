//! Helpers shared by tests that need real HTTP traffic or real image bytes.

use std::io::Cursor;

use axum::Router;
use image::{ImageFormat, Rgba, RgbaImage};
use tokio::net::TcpListener;

/// Binds a local listener, builds the router with the server's base URL and serves it in the
/// background. Returns the base URL (`http://127.0.0.1:<port>`).
pub async fn serve(build: impl FnOnce(String) -> Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let router = build(base.clone());
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    base
}

/// Solid red PNG of the given size.
pub fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    solid_png(width, height, Rgba([255, 0, 0, 255]))
}

pub fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, color))
}

pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}
