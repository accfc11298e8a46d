fn main() -> anyhow::Result<()> {
    notecard::cli::run()
}
