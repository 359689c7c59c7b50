#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = classflow_rust::run().await {
        eprintln!("classflow-rust fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
