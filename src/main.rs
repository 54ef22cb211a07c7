#[tokio::main]
async fn main() -> anyhow::Result<()> {
  cosirob_relay_lib::run().await
}
