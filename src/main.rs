fn main() -> anyhow::Result<()> {
    vocalviz::app::run()
}
