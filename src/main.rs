#[tokio::main]
async fn main() {
    if let Err(e) = shearstream_proxy::run().await {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
