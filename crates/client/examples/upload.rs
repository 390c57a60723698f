//! Uploads files as a multipart form and prints what the server answered.
//!
//! ```text
//! cargo run --example upload -- http://127.0.0.1:8080/upload notes.txt photo.png
//! ```

use std::env;
use std::time::Duration;

use micro_client::{ClientConfig, HttpClient};
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::DEBUG).finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut args = env::args().skip(1);
    let Some(url) = args.next() else {
        error!("usage: upload <url> [file]...");
        return;
    };

    let client = HttpClient::new(ClientConfig::new().with_timeout(Duration::from_secs(60)));
    let mut builder = client.fetch_request().url(&url).form_text("uploader", "micro-client");
    for (index, path) in args.enumerate() {
        builder = builder.form_file(format!("file{index}"), None, path);
    }

    let request = match builder.build() {
        Ok(request) => request,
        Err(e) => {
            error!(cause = %e, "invalid request");
            return;
        }
    };

    match client.execute(&request).await {
        Ok(outcome) => {
            let response = outcome.response();
            info!(status = response.response_code(), size = response.content_size(), "upload finished");
            println!("{}", outcome.value());
        }
        Err(e) => error!(cause = %e, "upload failed"),
    }
}
