use distga::Registry;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    distga::cli::run_with(Registry::default())
}
