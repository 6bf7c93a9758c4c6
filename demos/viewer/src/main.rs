use flow_collide::{Config, run};

fn main() -> anyhow::Result<()> {
    let mut config = Config::default();
    if let Some(model) = std::env::args().nth(1) {
        config.model_path = model;
    }
    run(config)
}
