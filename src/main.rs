fn main() -> anyhow::Result<()> {
    terminal_notes::cli::run()
}
