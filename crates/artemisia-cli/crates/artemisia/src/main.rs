#[tokio::main]
async fn main() {
    artemisia_cli::run().await;
}
