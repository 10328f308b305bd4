use crate::core::Tps;

/// Filler glyphs for not-yet-revealed positions.
const GLYPHS: &[u8] = b"!#$%&'()*+,-./:;<=>?@[]^_`{|}~";

/// SplitMix64. All scramble noise flows from the boot seed, so a full
/// simulation is bit-reproducible.
#[derive(Clone, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_glyph(&mut self) -> char {
        let idx = (self.next_u64() % GLYPHS.len() as u64) as usize;
        GLYPHS[idx] as char
    }
}

#[derive(Clone, Debug)]
struct Run {
    target: Vec<char>,
    len: usize, // max(old, target) length; filler width during the run
    total_frames: u64,
    frame: u64,
}

/// The decrypt/scramble text transition. One instance per text element;
/// starting a new run cancels the in-flight one, and a finished run always
/// leaves exactly the target text.
#[derive(Clone, Debug)]
pub struct Scramble {
    text: String,
    run: Option<Run>,
    rng: SplitMix64,
}

impl Scramble {
    pub fn new(initial_text: impl Into<String>, seed: u64) -> Self {
        Self {
            text: initial_text.into(),
            run: None,
            rng: SplitMix64::new(seed),
        }
    }

    /// Currently displayed text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_running(&self) -> bool {
        self.run.is_some()
    }

    /// Begins a transition toward `target`, cancelling any in-flight run.
    pub fn start(&mut self, target: &str, duration_secs: f64, tps: Tps) {
        let total_frames = tps.secs_to_ticks(duration_secs);
        if total_frames == 0 {
            self.text = target.to_string();
            self.run = None;
            return;
        }
        let target: Vec<char> = target.chars().collect();
        let len = self.text.chars().count().max(target.len());
        self.run = Some(Run {
            target,
            len,
            total_frames,
            frame: 0,
        });
    }

    /// Advances one frame. Returns true while a run is mutating the text.
    pub fn tick(&mut self) -> bool {
        let Some(run) = self.run.as_mut() else {
            return false;
        };
        run.frame += 1;
        if run.frame >= run.total_frames {
            self.text = run.target.iter().collect();
            self.run = None;
            return true;
        }

        let progress = run.frame as f64 / run.total_frames as f64;
        let mut out = String::with_capacity(run.len);
        for i in 0..run.len {
            if (i as f64 / run.len as f64) < progress {
                // Revealed; out-of-range positions of a shorter target are
                // dropped, shrinking the filler as the reveal sweeps.
                if let Some(&c) = run.target.get(i) {
                    out.push(c);
                }
            } else {
                out.push(self.rng.next_glyph());
            }
        }
        self.text = out;
        true
    }
}
