#[tokio::main]
async fn main() -> anyhow::Result<()> {
    snitch_lib::run().await
}
