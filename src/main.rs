fn main() -> anyhow::Result<()> {
    wellness_insights::cli::run()
}
