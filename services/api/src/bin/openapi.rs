//! services/api/src/bin/openapi.rs
//!
//! Dumps the REST API's OpenAPI document so the app can generate its client.
//! Usage: `openapi [OUTPUT]`, writing `openapi.json` by default.

use api_lib::web::rest::ApiDoc;
use std::path::PathBuf;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let doc = ApiDoc::openapi();
    std::fs::write(&output, doc.to_pretty_json()?)?;
    println!(
        "Wrote {} paths of the alumni quest API to {}",
        doc.paths.paths.len(),
        output.display()
    );
    Ok(())
}
