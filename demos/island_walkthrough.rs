use glissade::{EngineConfig, InputEvent, Key, Orchestrator, Page};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let s = include_str!("../tests/data/page.json");
    let page: Page = serde_json::from_str(s)?;
    let mut orch = Orchestrator::boot(page, EngineConfig::default())?;

    // Walk every section with the keyboard, watching the scramble settle.
    for _ in 0..3 {
        orch.dispatch(InputEvent::Key {
            key: Key::ArrowDown,
        });
        for _ in 0..120 {
            orch.tick();
        }
        let r = orch.report();
        println!(
            "section {:?}: {:?} ({:.0}%)",
            r.active_section,
            r.active_title,
            r.progress_pct.unwrap_or(0.0)
        );
    }

    Ok(())
}
