use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use sha2::Digest as _;

use glissade::{
    EngineConfig, Extent, InputEvent, Key, Orchestrator, Page, Viewport, page::attr,
    page::Element,
};

#[derive(Clone, Debug)]
struct BenchArgs {
    sections: u32,
    cards: u32,
    ticks: u64,
    warmup: u32,
    repeats: u32,
    seed: u64,
}

#[derive(Clone, Debug, Default)]
struct RunMetrics {
    boot: Duration,
    tick_total: Duration,
    wall_total: Duration,
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn try_main() -> anyhow::Result<()> {
    let args = parse_args()?;

    if args.sections == 0 {
        anyhow::bail!("--sections must be > 0");
    }
    if args.ticks == 0 || args.repeats == 0 {
        anyhow::bail!("--ticks and --repeats must be > 0");
    }

    let page = build_benchmark_page(args.sections, args.cards);
    let script = build_script(&page, args.ticks);

    eprintln!(
        "bench: {repeats} run(s) ({profile} build), {ticks} ticks/run, {elements} elements, {sections} sections, {cards} cards, {events} scripted events",
        repeats = args.repeats,
        profile = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        ticks = args.ticks,
        elements = page.elements.len(),
        sections = args.sections,
        cards = args.cards,
        events = script.len(),
    );

    let mut reference_digest: Option<String> = None;
    if args.warmup > 0 {
        eprintln!("warmup: {} run(s)", args.warmup);
        for _ in 0..args.warmup {
            let (_, digest) = run_once(&args, &page, &script)?;
            reference_digest = Some(digest);
        }
    }

    let mut runs = Vec::<RunMetrics>::with_capacity(args.repeats as usize);
    for _ in 0..args.repeats {
        let (metrics, digest) = run_once(&args, &page, &script)?;
        if let Some(reference) = &reference_digest {
            if digest != *reference {
                anyhow::bail!(
                    "final state diverged between runs (got {digest}, expected {reference})"
                );
            }
        } else {
            reference_digest = Some(digest);
        }
        runs.push(metrics);
    }

    if let Some(digest) = &reference_digest {
        eprintln!("final-state sha256: {digest}");
    }
    report_percentiles(&runs);
    Ok(())
}

/// Replays the script once and digests the final report, so run-to-run
/// divergence shows up as a digest mismatch rather than a silent skew in
/// the timings.
fn run_once(
    args: &BenchArgs,
    page: &Page,
    script: &[(u64, InputEvent)],
) -> anyhow::Result<(RunMetrics, String)> {
    let wall_start = Instant::now();

    let cfg = EngineConfig {
        seed: args.seed,
        ..EngineConfig::default()
    };

    let boot_start = Instant::now();
    let mut orch = Orchestrator::boot(page.clone(), cfg)?;
    let boot = boot_start.elapsed();

    let mut pending = script.iter().peekable();
    let tick_start = Instant::now();
    for tick in 0..args.ticks {
        while let Some((_, event)) = pending.next_if(|(at, _)| *at <= tick) {
            orch.dispatch(event.clone());
        }
        orch.tick();
    }
    let tick_total = tick_start.elapsed();

    let report = serde_json::to_vec(&orch.report())?;
    let digest = sha256_hex(&report);

    Ok((
        RunMetrics {
            boot,
            tick_total,
            wall_total: wall_start.elapsed(),
        },
        digest,
    ))
}

/// A synthetic page big enough to exercise every subsystem: scroll-spy
/// sections with island markup, fade-ups, parallax layers, blooms, hover
/// cards and a slide-out menu.
fn build_benchmark_page(sections: u32, cards: u32) -> Page {
    const SECTION_HEIGHT: f64 = 900.0;

    let mut elements = Vec::new();
    let tagged = |id: String, top: f64, height: f64, pairs: &[(&str, &str)]| {
        let attrs: BTreeMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Element {
            id,
            extent: Extent { top, height },
            parent: None,
            attrs,
            heading: None,
            text: None,
        }
    };

    for i in 0..sections {
        let top = f64::from(i) * SECTION_HEIGHT;
        let mut section = tagged(
            format!("section{i}"),
            top,
            SECTION_HEIGHT,
            &[(attr::NAV_SECTION, "")],
        );
        if i == 0 {
            section.attrs.insert(attr::HERO.to_string(), String::new());
        }
        section.heading = Some(format!("Chapter {i}"));
        elements.push(section);

        elements.push(tagged(
            format!("blurb{i}"),
            top + 300.0,
            120.0,
            &[(attr::ANIMATE, "fade-up")],
        ));
        elements.push(tagged(
            format!("layer{i}"),
            top + 100.0,
            500.0,
            &[(attr::PARALLAX, ""), (attr::SPEED, "0.6")],
        ));
        if i % 2 == 0 {
            elements.push(tagged(
                format!("pic{i}"),
                top + 450.0,
                400.0,
                &[(attr::BLOOM, "")],
            ));
        }
    }

    let island_children = [
        ("islandText", attr::ISLAND_TEXT),
        ("prevBtn", attr::ISLAND_PREV),
        ("nextBtn", attr::ISLAND_NEXT),
        ("progressBar", attr::ISLAND_PROGRESS),
    ];
    elements.push(tagged("island".to_string(), 0.0, 48.0, &[(attr::ISLAND, "")]));
    for (id, key) in island_children {
        let mut el = tagged(id.to_string(), 0.0, 24.0, &[(key, "")]);
        el.parent = Some("island".to_string());
        elements.push(el);
    }

    elements.push(tagged(
        "menuBtn".to_string(),
        0.0,
        32.0,
        &[(attr::MENU_BUTTON, "")],
    ));
    elements.push(tagged(
        "overlay".to_string(),
        0.0,
        900.0,
        &[(attr::MENU_OVERLAY, "")],
    ));

    for i in 0..cards {
        let top = 600.0 + f64::from(i) * 500.0;
        let card_id = format!("card{i}");
        elements.push(tagged(card_id.clone(), top, 400.0, &[(attr::CARD, "")]));
        let mut img = tagged(format!("card{i}Img"), top, 400.0, &[(attr::CARD_IMAGE, "")]);
        img.parent = Some(card_id.clone());
        elements.push(img);
        let mut vid = tagged(
            format!("card{i}Vid"),
            top,
            400.0,
            &[(attr::CARD_VIDEO, ""), (attr::VIDEO, "")],
        );
        vid.parent = Some(card_id);
        elements.push(vid);
    }

    Page {
        path: "/bench/index.html".to_string(),
        viewport: Viewport { height: 900.0 },
        elements,
    }
}

/// An input script that keeps the engine busy for the whole run: wheel
/// bursts, arrow navigation, card hovers, menu toggles.
fn build_script(page: &Page, ticks: u64) -> Vec<(u64, InputEvent)> {
    let mut script = Vec::new();
    let cards: Vec<&Element> = page
        .elements
        .iter()
        .filter(|el| el.has_attr(attr::CARD))
        .collect();

    let mut at = 10u64;
    let mut i = 0usize;
    while at + 90 < ticks {
        script.push((at, InputEvent::Wheel { delta: 700.0 }));
        script.push((
            at + 30,
            InputEvent::Key {
                key: Key::ArrowDown,
            },
        ));
        if let Some(card) = cards.get(i % cards.len().max(1)) {
            script.push((
                at + 45,
                InputEvent::PointerEnter {
                    target: card.id.clone(),
                },
            ));
            script.push((
                at + 75,
                InputEvent::PointerLeave {
                    target: card.id.clone(),
                },
            ));
        }
        if i % 4 == 3 {
            script.push((
                at + 80,
                InputEvent::Click {
                    target: "menuBtn".to_string(),
                },
            ));
            script.push((at + 85, InputEvent::Key { key: Key::Escape }));
        }
        at += 90;
        i += 1;
    }
    script
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}

fn parse_args() -> anyhow::Result<BenchArgs> {
    let mut args = std::env::args().skip(1);

    let mut out = BenchArgs {
        sections: 12,
        cards: 8,
        ticks: 3600,
        warmup: 1,
        repeats: 100,
        seed: 0,
    };

    while let Some(a) = args.next() {
        match a.as_str() {
            "--sections" => out.sections = parse_u32(args.next(), "--sections")?,
            "--cards" => out.cards = parse_u32(args.next(), "--cards")?,
            "--ticks" => out.ticks = u64::from(parse_u32(args.next(), "--ticks")?),
            "--warmup" => out.warmup = parse_u32(args.next(), "--warmup")?,
            "--repeats" => out.repeats = parse_u32(args.next(), "--repeats")?,
            "--seed" => out.seed = u64::from(parse_u32(args.next(), "--seed")?),
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => anyhow::bail!("unknown arg '{a}' (try --help)"),
        }
    }

    Ok(out)
}

fn print_help() {
    eprintln!(
        r#"glissade-bench

Replays a scripted interaction against a synthetic page repeatedly and
reports p50/p90/p99 for boot and the tick loop. The final state is hashed
every run; any divergence aborts the bench.

Usage:
  cargo run -q
  cargo run -q -- --repeats 100 --ticks 3600
  cargo run -q -- --sections 50 --cards 20

Args:
  --sections N   (default 12)
  --cards N      (default 8)
  --ticks N      (default 3600; one minute at 60 ticks/sec)
  --warmup N     (default 1)
  --repeats N    (default 100)
  --seed N       (default 0)
"#
    );
}

fn parse_u32(v: Option<String>, flag: &str) -> anyhow::Result<u32> {
    use anyhow::Context as _;
    let v = v.ok_or_else(|| anyhow::anyhow!("missing value for {flag}"))?;
    v.parse::<u32>()
        .with_context(|| format!("parse {flag} value '{v}'"))
}

fn report_percentiles(runs: &[RunMetrics]) {
    type Getter = fn(&RunMetrics) -> Duration;
    type Field = (&'static str, Getter);

    fn collect(runs: &[RunMetrics], f: fn(&RunMetrics) -> Duration) -> Vec<Duration> {
        let mut v = runs.iter().map(f).collect::<Vec<_>>();
        v.sort_by_key(|d| d.as_nanos());
        v
    }

    fn p(v: &[Duration], q: f64) -> Duration {
        if v.is_empty() {
            return Duration::ZERO;
        }
        let idx = ((v.len() - 1) as f64 * q).round() as usize;
        v[idx.min(v.len() - 1)]
    }

    fn fmt_ms(d: Duration) -> String {
        format!("{:.3}ms", d.as_secs_f64() * 1000.0)
    }

    let fields: &[Field] = &[
        ("boot", |m| m.boot),
        ("tick_loop", |m| m.tick_total),
        ("wall_total", |m| m.wall_total),
    ];

    eprintln!("\npercentiles across runs (p50/p90/p99):");
    for (name, getter) in fields {
        let v = collect(runs, *getter);
        let p50 = p(&v, 0.50);
        let p90 = p(&v, 0.90);
        let p99 = p(&v, 0.99);
        eprintln!(
            "  {name:12} p50={p50:>10}  p90={p90:>10}  p99={p99:>10}",
            name = *name,
            p50 = fmt_ms(p50),
            p90 = fmt_ms(p90),
            p99 = fmt_ms(p99)
        );
    }
}
