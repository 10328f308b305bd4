use glissade::{EngineConfig, InputEvent, Orchestrator, Page};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let s = include_str!("../tests/data/page.json");
    let page: Page = serde_json::from_str(s)?;

    let mut orch = Orchestrator::boot(page, EngineConfig::default())?;
    orch.dispatch(InputEvent::Wheel { delta: 1600.0 });

    for tick in 0..400u64 {
        orch.tick();
        if tick % 60 == 0 {
            let r = orch.report();
            println!(
                "t={tick:>3}  scroll={:>7.1}  section={:?}  title={:?}",
                r.scroll_pos, r.active_section, r.active_title
            );
        }
    }

    println!("{}", serde_json::to_string_pretty(&orch.report())?);
    Ok(())
}
