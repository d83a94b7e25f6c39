#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ai_flashcards_backend::run().await
}
