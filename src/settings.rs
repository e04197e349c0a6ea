//! User settings and their persisted form.
//!
//! Settings are stored as one flat JSON object. Loading is lenient: every key
//! is read on its own, so a missing or mistyped entry only falls back to its
//! own default. Text that is not a JSON object at all is discarded.

use crate::capabilities::{SettingsError, SettingsStore};
use crate::config::*;
use crate::utils::clamp;
use crate::{ArrowSet, Mode, StimulusParams};
use log::{debug, warn};
use serde::Serialize;
use serde_json::{Map, Value};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub mode: Mode,
    pub arrow_set: ArrowSet,
    pub min: i64,
    pub max: i64,
    /// Raw interval as entered; see [`Settings::interval_ms`] for the value
    /// the scheduler uses.
    pub interval_sec: f64,
    pub no_repeat: bool,
    pub audio_on: bool,
    pub want_fullscreen: bool,
    pub show_progress: bool,
    pub menu_hidden: bool,
    pub font_scale: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: Mode::Numbers,
            arrow_set: ArrowSet::Cardinal,
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            interval_sec: DEFAULT_INTERVAL_SEC,
            no_repeat: true,
            audio_on: false,
            want_fullscreen: false,
            show_progress: true,
            menu_hidden: false,
            font_scale: DEFAULT_FONT_SCALE,
        }
    }
}

/// A single settings change coming from the form or the footer controls.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsUpdate {
    Mode(Mode),
    ArrowSet(ArrowSet),
    Min(i64),
    Max(i64),
    IntervalSec(f64),
    NoRepeat(bool),
    AudioOn(bool),
    WantFullscreen(bool),
    ShowProgress(bool),
    ToggleMenu,
    GrowFont,
    ShrinkFont,
}

/// Clamp the interval into the schedulable range. Zero or non-finite input
/// means "use the default".
pub fn effective_interval_sec(raw: f64) -> f64 {
    if !raw.is_finite() || raw == 0.0 {
        return DEFAULT_INTERVAL_SEC;
    }
    clamp(raw, MIN_INTERVAL_SEC, MAX_INTERVAL_SEC)
}

/// Clamp a font scale into its allowed range, rounded to two decimals so
/// repeated ±0.1 steps do not drift.
pub fn normalize_font_scale(raw: f64) -> f64 {
    if !raw.is_finite() {
        return DEFAULT_FONT_SCALE;
    }
    (clamp(raw, MIN_FONT_SCALE, MAX_FONT_SCALE) * 100.0).round() / 100.0
}

impl Settings {
    /// Interval in milliseconds after clamping to `[0.25 s, 3600 s]`.
    pub fn interval_ms(&self) -> f64 {
        effective_interval_sec(self.interval_sec) * 1000.0
    }

    /// Ordered numeric range `(low, high)`; a reversed pair is swapped.
    pub fn range(&self) -> (i64, i64) {
        (self.min.min(self.max), self.min.max(self.max))
    }

    pub fn stimulus_params(&self) -> StimulusParams {
        let (low, high) = self.range();
        StimulusParams {
            mode: self.mode,
            low,
            high,
            arrow_set: self.arrow_set,
            no_repeat: self.no_repeat,
        }
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        match update {
            SettingsUpdate::Mode(mode) => self.mode = mode,
            SettingsUpdate::ArrowSet(set) => self.arrow_set = set,
            SettingsUpdate::Min(v) => self.min = v,
            SettingsUpdate::Max(v) => self.max = v,
            SettingsUpdate::IntervalSec(v) => self.interval_sec = v,
            SettingsUpdate::NoRepeat(v) => self.no_repeat = v,
            SettingsUpdate::AudioOn(v) => self.audio_on = v,
            SettingsUpdate::WantFullscreen(v) => self.want_fullscreen = v,
            SettingsUpdate::ShowProgress(v) => self.show_progress = v,
            SettingsUpdate::ToggleMenu => self.menu_hidden = !self.menu_hidden,
            SettingsUpdate::GrowFont => {
                self.font_scale = normalize_font_scale(self.font_scale + FONT_SCALE_STEP)
            }
            SettingsUpdate::ShrinkFont => {
                self.font_scale = normalize_font_scale(self.font_scale - FONT_SCALE_STEP)
            }
        }
    }

    /// Parse a stored record on top of the defaults.
    pub fn from_json(raw: &str) -> Result<Self, SettingsError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| SettingsError::Malformed(e.to_string()))?;
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(SettingsError::Malformed(format!(
                    "expected an object, found {}",
                    json_kind(&other)
                )))
            }
        };

        let mut s = Settings::default();
        if let Some(mode) = read_str(&map, "mode").and_then(Mode::from_id) {
            s.mode = mode;
        }
        if let Some(set) = read_str(&map, "arrowSet").and_then(ArrowSet::from_id) {
            s.arrow_set = set;
        }
        if let Some(v) = read_number(&map, "min") {
            s.min = v.round() as i64;
        }
        if let Some(v) = read_number(&map, "max") {
            s.max = v.round() as i64;
        }
        if let Some(v) = read_number(&map, "intervalSec") {
            s.interval_sec = effective_interval_sec(v);
        }
        if let Some(v) = read_bool(&map, "noRepeat") {
            s.no_repeat = v;
        }
        if let Some(v) = read_bool(&map, "audioOn") {
            s.audio_on = v;
        }
        if let Some(v) = read_bool(&map, "wantFullscreen") {
            s.want_fullscreen = v;
        }
        if let Some(v) = read_bool(&map, "showProgress") {
            s.show_progress = v;
        }
        if let Some(v) = read_bool(&map, "menuHidden") {
            s.menu_hidden = v;
        }
        if let Some(v) = read_number(&map, "fontScale") {
            s.font_scale = normalize_font_scale(v);
        }
        Ok(s)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        serde_json::to_string(self).map_err(|e| SettingsError::Malformed(e.to_string()))
    }
}

impl yew::Reducible for Settings {
    type Action = SettingsUpdate;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = (*self).clone();
        next.apply(action);
        if next == *self {
            self
        } else {
            Rc::new(next)
        }
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn read_str<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    map.get(key).and_then(Value::as_str)
}

/// Numbers may also be stored as numeric strings; anything non-finite is
/// ignored.
fn read_number(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let v = match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    v.filter(|n| n.is_finite())
}

fn read_bool(map: &Map<String, Value>, key: &str) -> Option<bool> {
    match map.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        _ => None,
    }
}

/// Load settings from `store`, falling back to defaults on any failure.
pub fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.load() {
        Ok(Some(raw)) => match Settings::from_json(&raw) {
            Ok(s) => {
                debug!("Loaded settings: {:?}", s);
                s
            }
            Err(e) => {
                warn!("Discarding stored settings: {}", e);
                Settings::default()
            }
        },
        Ok(None) => Settings::default(),
        Err(e) => {
            debug!("Settings storage unavailable: {}", e);
            Settings::default()
        }
    }
}

/// Persist settings to `store`. Failures are logged and otherwise ignored.
pub fn save_settings(store: &dyn SettingsStore, settings: &Settings) {
    let result = settings.to_json().and_then(|raw| store.save(&raw));
    if let Err(e) = result {
        debug!("Could not persist settings: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::MemoryStore;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let s = Settings::from_json(r#"{"min": 2}"#).unwrap();
        assert_eq!(s.min, 2);
        assert_eq!(s.max, DEFAULT_MAX);
        assert_eq!(s.interval_sec, DEFAULT_INTERVAL_SEC);
        assert!(s.no_repeat);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(Settings::from_json("{not json").is_err());
        assert!(Settings::from_json("[1, 2]").is_err());
    }

    #[test]
    fn mistyped_values_keep_their_defaults() {
        let s = Settings::from_json(
            r#"{"max": "9", "noRepeat": "yes", "mode": "letters", "arrowSet": "vertical"}"#,
        )
        .unwrap();
        assert_eq!(s.max, 9);
        assert!(s.no_repeat);
        assert_eq!(s.mode, Mode::Numbers);
        assert_eq!(s.arrow_set, ArrowSet::Vertical);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let s = Settings::from_json(r#"{"intervalSec": 0.01, "fontScale": 12, "min": 1.6}"#)
            .unwrap();
        assert_eq!(s.interval_sec, MIN_INTERVAL_SEC);
        assert_eq!(s.font_scale, MAX_FONT_SCALE);
        assert_eq!(s.min, 2);
    }

    #[test]
    fn interval_is_clamped_for_scheduling() {
        let mut s = Settings::default();
        s.interval_sec = 0.1;
        assert_eq!(s.interval_ms(), 250.0);
        s.interval_sec = 10_000.0;
        assert_eq!(s.interval_ms(), 3_600_000.0);
        s.interval_sec = 0.0;
        assert_eq!(s.interval_ms(), 5_000.0);
        s.interval_sec = f64::NAN;
        assert_eq!(s.interval_ms(), 5_000.0);
    }

    #[test]
    fn font_steps_stay_within_bounds() {
        let mut s = Settings::default();
        for _ in 0..40 {
            s.apply(SettingsUpdate::GrowFont);
        }
        assert_eq!(s.font_scale, MAX_FONT_SCALE);
        for _ in 0..40 {
            s.apply(SettingsUpdate::ShrinkFont);
        }
        assert_eq!(s.font_scale, MIN_FONT_SCALE);
        s.apply(SettingsUpdate::GrowFont);
        assert_eq!(s.font_scale, 0.6);
    }

    #[test]
    fn reversed_range_is_kept_and_ordered_on_read() {
        let mut s = Settings::default();
        s.apply(SettingsUpdate::Min(9));
        s.apply(SettingsUpdate::Max(3));
        assert_eq!((s.min, s.max), (9, 3));
        assert_eq!(s.range(), (3, 9));
        let params = s.stimulus_params();
        assert_eq!((params.low, params.high), (3, 9));
    }

    #[test]
    fn store_round_trip_preserves_every_field() {
        let store = MemoryStore::default();
        let s = Settings {
            mode: Mode::Arrows,
            arrow_set: ArrowSet::Diagonal,
            min: -5,
            max: 12,
            interval_sec: 1.5,
            no_repeat: false,
            audio_on: true,
            want_fullscreen: true,
            show_progress: false,
            menu_hidden: true,
            font_scale: 1.7,
        };
        save_settings(&store, &s);
        assert_eq!(load_settings(&store), s);
    }

    #[test]
    fn corrupt_store_loads_defaults() {
        let store = MemoryStore::with_raw("\"just a string\"");
        assert_eq!(load_settings(&store), Settings::default());
    }

    #[test]
    fn failing_store_loads_defaults() {
        let store = MemoryStore::failing();
        assert_eq!(load_settings(&store), Settings::default());
        save_settings(&store, &Settings::default());
    }

    #[test]
    fn reducer_keeps_identity_when_nothing_changes() {
        use yew::Reducible;
        let s = Rc::new(Settings::default());
        let same = s.clone().reduce(SettingsUpdate::NoRepeat(true));
        assert!(Rc::ptr_eq(&s, &same));
        let changed = s.clone().reduce(SettingsUpdate::NoRepeat(false));
        assert!(!changed.no_repeat);
    }
}
