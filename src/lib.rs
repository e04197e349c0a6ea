use log::debug;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod browser;
pub mod capabilities;
pub mod config;
pub mod cycle;
pub mod frame;
pub mod logging;
pub mod settings;
pub mod utils;

use config::PALETTE;

/// What kind of symbol the trainer shows on each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Numbers,
    Arrows,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::Numbers, Mode::Arrows];

    pub fn id(self) -> &'static str {
        match self {
            Mode::Numbers => "numbers",
            Mode::Arrows => "arrows",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Numbers => "Numbers",
            Mode::Arrows => "Arrows",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.id() == id)
    }
}

/// Fixed, ordered groups of arrow glyphs. The stimulus generator draws an
/// index into [`ArrowSet::symbols`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowSet {
    #[default]
    Cardinal,
    Horizontal,
    Vertical,
    Diagonal,
    All,
}

impl ArrowSet {
    pub const ALL: [ArrowSet; 5] = [
        ArrowSet::Cardinal,
        ArrowSet::Horizontal,
        ArrowSet::Vertical,
        ArrowSet::Diagonal,
        ArrowSet::All,
    ];

    pub fn symbols(self) -> &'static [&'static str] {
        match self {
            ArrowSet::Cardinal => &["←", "↑", "→", "↓"],
            ArrowSet::Horizontal => &["←", "→"],
            ArrowSet::Vertical => &["↑", "↓"],
            ArrowSet::Diagonal => &["↖", "↗", "↘", "↙"],
            ArrowSet::All => &["←", "↖", "↑", "↗", "→", "↘", "↓", "↙"],
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            ArrowSet::Cardinal => "cardinal",
            ArrowSet::Horizontal => "horizontal",
            ArrowSet::Vertical => "vertical",
            ArrowSet::Diagonal => "diagonal",
            ArrowSet::All => "all",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArrowSet::Cardinal => "← ↑ → ↓",
            ArrowSet::Horizontal => "← →",
            ArrowSet::Vertical => "↑ ↓",
            ArrowSet::Diagonal => "↖ ↗ ↘ ↙",
            ArrowSet::All => "all 8",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }
}

/// One emitted stimulus value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stimulus {
    Number(i64),
    Arrow { set: ArrowSet, index: usize },
}

impl Stimulus {
    /// Text shown on the display surface.
    pub fn symbol(&self) -> String {
        match *self {
            Stimulus::Number(n) => n.to_string(),
            Stimulus::Arrow { set, index } => set
                .symbols()
                .get(index)
                .copied()
                .unwrap_or(config::IDLE_SYMBOL)
                .to_string(),
        }
    }
}

impl fmt::Display for Stimulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

/// The subset of settings that decides which stimulus comes next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StimulusParams {
    pub mode: Mode,
    pub low: i64,
    pub high: i64,
    pub arrow_set: ArrowSet,
    pub no_repeat: bool,
}

impl Default for StimulusParams {
    fn default() -> Self {
        Self {
            mode: Mode::Numbers,
            low: config::DEFAULT_MIN,
            high: config::DEFAULT_MAX,
            arrow_set: ArrowSet::Cardinal,
            no_repeat: true,
        }
    }
}

/// Draw a uniformly random integer in `[min(low, high), max(low, high)]`.
///
/// With `no_repeat` set, draws again until the result differs from
/// `previous`. A range holding a single value returns that value whatever the
/// flag says.
pub fn next_value<R: Rng + ?Sized>(
    rng: &mut R,
    low: i64,
    high: i64,
    no_repeat: bool,
    previous: Option<i64>,
) -> i64 {
    let lo = low.min(high);
    let hi = low.max(high);
    if lo == hi {
        return lo;
    }

    loop {
        let r = rng.random_range(lo..=hi);
        if !(no_repeat && previous == Some(r)) {
            return r;
        }
        debug!("Redrawing {} (repeat of previous value)", r);
    }
}

/// Pick a color from `palette`, never returning `previous` when the palette
/// offers an alternative.
pub fn next_color_from<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &[&'static str],
    previous: Option<&str>,
) -> &'static str {
    match palette.len() {
        0 => config::IDLE_COLOR,
        1 => palette[0],
        n => loop {
            let c = palette[rng.random_range(0..n)];
            if previous != Some(c) {
                return c;
            }
        },
    }
}

/// Pick the next stimulus color from [`PALETTE`].
pub fn next_color<R: Rng + ?Sized>(rng: &mut R, previous: Option<&str>) -> &'static str {
    next_color_from(rng, &PALETTE, previous)
}

/// Draw the next stimulus for the given parameters.
///
/// `previous` only constrains the draw when it is the same kind of stimulus:
/// after a switch from numbers to arrows (or between arrow sets) any value
/// may follow.
pub fn next_stimulus<R: Rng + ?Sized>(
    rng: &mut R,
    params: &StimulusParams,
    previous: Option<Stimulus>,
) -> Stimulus {
    match params.mode {
        Mode::Numbers => {
            let prev = match previous {
                Some(Stimulus::Number(n)) => Some(n),
                _ => None,
            };
            Stimulus::Number(next_value(rng, params.low, params.high, params.no_repeat, prev))
        }
        Mode::Arrows => {
            let set = params.arrow_set;
            let prev = match previous {
                Some(Stimulus::Arrow { set: s, index }) if s == set => Some(index as i64),
                _ => None,
            };
            let last = set.symbols().len().saturating_sub(1) as i64;
            let index = next_value(rng, 0, last, params.no_repeat, prev) as usize;
            Stimulus::Arrow { set, index }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn no_repeat_never_returns_previous_value() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(a, b) in &[(1, 4), (0, 1), (-3, 3), (10, 2), (i64::MAX - 1, i64::MAX)] {
            let mut prev = None;
            for _ in 0..1000 {
                let v = next_value(&mut rng, a, b, true, prev);
                assert!(v >= a.min(b) && v <= a.max(b), "{} outside [{}, {}]", v, a, b);
                assert_ne!(Some(v), prev);
                prev = Some(v);
            }
        }
    }

    #[test]
    fn degenerate_range_returns_its_only_value() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(next_value(&mut rng, 3, 3, true, Some(3)), 3);
        }
    }

    #[test]
    fn reversed_range_is_accepted() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = [false; 4];
        for _ in 0..500 {
            let v = next_value(&mut rng, 4, 1, false, None);
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "every value in 1..=4 should appear");
    }

    #[test]
    fn repeats_are_allowed_without_the_flag() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut prev = None;
        let mut repeated = false;
        for _ in 0..1000 {
            let v = next_value(&mut rng, 0, 1, false, prev);
            repeated |= prev == Some(v);
            prev = Some(v);
        }
        assert!(repeated);
    }

    #[test]
    fn color_never_repeats() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut prev: Option<&str> = None;
        for _ in 0..1000 {
            let c = next_color(&mut rng, prev);
            assert!(PALETTE.contains(&c));
            assert_ne!(Some(c), prev);
            prev = Some(c);
        }
    }

    #[test]
    fn single_entry_palette_is_returned_as_is() {
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(next_color_from(&mut rng, &["#fff"], Some("#fff")), "#fff");
    }

    #[test]
    fn arrows_follow_the_selected_set_without_repeats() {
        let mut rng = StdRng::seed_from_u64(9);
        let params = StimulusParams {
            mode: Mode::Arrows,
            arrow_set: ArrowSet::Horizontal,
            ..StimulusParams::default()
        };
        let mut prev = None;
        for _ in 0..200 {
            let s = next_stimulus(&mut rng, &params, prev);
            match s {
                Stimulus::Arrow { set, index } => {
                    assert_eq!(set, ArrowSet::Horizontal);
                    assert!(index < 2);
                }
                other => panic!("expected an arrow, got {:?}", other),
            }
            assert_ne!(Some(s), prev);
            prev = Some(s);
        }
    }

    #[test]
    fn previous_of_another_kind_does_not_constrain() {
        let mut rng = StdRng::seed_from_u64(4);
        let params = StimulusParams {
            low: 1,
            high: 1,
            ..StimulusParams::default()
        };
        let prev = Some(Stimulus::Arrow { set: ArrowSet::Cardinal, index: 0 });
        assert_eq!(next_stimulus(&mut rng, &params, prev), Stimulus::Number(1));
    }

    #[test]
    fn symbols_render_numbers_and_arrows() {
        assert_eq!(Stimulus::Number(-2).symbol(), "-2");
        assert_eq!(Stimulus::Arrow { set: ArrowSet::Cardinal, index: 1 }.symbol(), "↑");
        assert_eq!(Stimulus::Arrow { set: ArrowSet::All, index: 7 }.to_string(), "↙");
    }

    #[test]
    fn ids_round_trip() {
        for set in ArrowSet::ALL {
            assert_eq!(ArrowSet::from_id(set.id()), Some(set));
        }
        for mode in Mode::ALL {
            assert_eq!(Mode::from_id(mode.id()), Some(mode));
        }
        assert_eq!(ArrowSet::from_id("sideways"), None);
    }
}
