fn main() -> anyhow::Result<()> {
    wipi_cli::run()
}
