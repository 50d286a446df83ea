//! `docsnag inspect` – run the response inspector on a body.

use anyhow::{Context, Result};
use docsnag_core::inspect;
use std::path::Path;
use tokio::io::AsyncReadExt;

pub async fn run_inspect(path: Option<&Path>) -> Result<()> {
    let body = match path {
        Some(p) => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("read body: {}", p.display()))?,
        None => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("read body from stdin")?;
            buf
        }
    };

    match inspect::extract(&body) {
        Some(url) => println!("{}", url),
        None => println!("no file URL found"),
    }
    Ok(())
}
