//! Browser implementations of the host capabilities.
//!
//! Missing APIs map to [`CapabilityError::Unavailable`]; thrown exceptions and
//! rejected promises map to [`CapabilityError::Rejected`].

use crate::capabilities::{
    AudioCue, Capabilities, CapabilityError, ScreenResource, SettingsError, SettingsStore,
};
use crate::config::*;
use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use js_sys::{Function, Promise, Reflect};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioContext, AudioContextState, OscillatorType, Storage};

/// Milliseconds from `performance.now()`, or `Date.now()` when the
/// Performance API is missing.
pub fn now_ms() -> f64 {
    web_sys::window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

/// Capabilities backed by Web Audio, the Fullscreen API, the Screen Wake Lock
/// API and `localStorage`.
pub fn capabilities() -> Capabilities {
    Capabilities {
        audio: Rc::new(WebAudioBeep::default()),
        fullscreen: Rc::new(DocumentFullscreen),
        wake_lock: Rc::new(ScreenWakeLock::default()),
        store: Rc::new(LocalStorage::new(STORAGE_KEY)),
    }
}

/// Square-wave beep with a short exponential envelope. One `AudioContext` is
/// created lazily and reused for every cue.
#[derive(Default)]
pub struct WebAudioBeep {
    ctx: RefCell<Option<AudioContext>>,
}

impl WebAudioBeep {
    fn context(&self) -> Result<AudioContext, CapabilityError> {
        if let Some(ctx) = self.ctx.borrow().as_ref() {
            return Ok(ctx.clone());
        }
        let ctx = AudioContext::new()?;
        *self.ctx.borrow_mut() = Some(ctx.clone());
        Ok(ctx)
    }
}

impl AudioCue for WebAudioBeep {
    fn emit(&self) -> Result<(), CapabilityError> {
        let ctx = self.context()?;
        if ctx.state() == AudioContextState::Suspended {
            // Autoplay policy: resumes once the page has seen a user gesture.
            let _ = ctx.resume();
        }

        let osc = ctx.create_oscillator()?;
        let gain = ctx.create_gain()?;
        let t = ctx.current_time();

        osc.set_type(OscillatorType::Square);
        osc.frequency().set_value_at_time(BEEP_FREQUENCY_HZ, t)?;
        let envelope = gain.gain();
        envelope.set_value_at_time(BEEP_FLOOR_GAIN, t)?;
        envelope.exponential_ramp_to_value_at_time(BEEP_PEAK_GAIN, t + BEEP_ATTACK_SEC)?;
        envelope.exponential_ramp_to_value_at_time(BEEP_FLOOR_GAIN, t + BEEP_DECAY_SEC)?;

        osc.connect_with_audio_node(&gain)?;
        gain.connect_with_audio_node(&ctx.destination())?;
        osc.start()?;
        osc.stop_with_when(t + BEEP_STOP_SEC)?;
        Ok(())
    }
}

/// Fullscreen on the document element.
pub struct DocumentFullscreen;

impl DocumentFullscreen {
    fn enter() -> Result<(), CapabilityError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(CapabilityError::Unavailable)?;
        if document.fullscreen_element().is_some() {
            return Ok(());
        }
        let root = document
            .document_element()
            .ok_or(CapabilityError::Unavailable)?;
        root.request_fullscreen()?;
        Ok(())
    }

    fn exit() -> Result<(), CapabilityError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(CapabilityError::Unavailable)?;
        if document.fullscreen_element().is_some() {
            document.exit_fullscreen();
        }
        Ok(())
    }
}

impl ScreenResource for DocumentFullscreen {
    fn name(&self) -> &'static str {
        "fullscreen"
    }

    fn acquire(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
        future::ready(Self::enter()).boxed_local()
    }

    fn release(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
        future::ready(Self::exit()).boxed_local()
    }
}

/// Screen Wake Lock through `navigator.wakeLock`. `web-sys` only exposes the
/// API behind unstable flags, so it is reached through `Reflect`.
///
/// A release issued while a request is still pending wins: the sentinel that
/// arrives afterwards is let go at once.
#[derive(Default)]
pub struct ScreenWakeLock {
    sentinel: Rc<RefCell<Option<JsValue>>>,
    wanted: Rc<Cell<bool>>,
}

fn call_method(target: &JsValue, name: &str, args: &[JsValue]) -> Result<JsValue, CapabilityError> {
    let method = Reflect::get(target, &JsValue::from_str(name))?;
    if method.is_undefined() {
        return Err(CapabilityError::Unavailable);
    }
    let method: Function = method
        .dyn_into()
        .map_err(|_| CapabilityError::Rejected(format!("{} is not a function", name)))?;
    let result = match args {
        [] => method.call0(target)?,
        [a] => method.call1(target, a)?,
        _ => method.apply(target, &args.iter().collect::<js_sys::Array>())?,
    };
    Ok(result)
}

async fn await_promise(value: JsValue) -> Result<JsValue, CapabilityError> {
    let promise: Promise = value
        .dyn_into()
        .map_err(|_| CapabilityError::Rejected("expected a promise".to_string()))?;
    Ok(JsFuture::from(promise).await?)
}

/// Hosts flip `released` on the sentinel when they drop the lock themselves,
/// e.g. when the page is hidden.
fn sentinel_released(sentinel: &JsValue) -> bool {
    Reflect::get(sentinel, &JsValue::from_str("released"))
        .map(|v| v.as_bool().unwrap_or(false))
        .unwrap_or(true)
}

impl ScreenWakeLock {
    /// Whether a live sentinel is held.
    pub fn is_held(&self) -> bool {
        self.sentinel
            .borrow()
            .as_ref()
            .is_some_and(|s| !sentinel_released(s))
    }

    async fn request(
        slot: Rc<RefCell<Option<JsValue>>>,
        wanted: Rc<Cell<bool>>,
    ) -> Result<(), CapabilityError> {
        let window = web_sys::window().ok_or(CapabilityError::Unavailable)?;
        let wake_lock = Reflect::get(&window.navigator(), &JsValue::from_str("wakeLock"))?;
        if wake_lock.is_undefined() || wake_lock.is_null() {
            return Err(CapabilityError::Unavailable);
        }
        let pending = call_method(&wake_lock, "request", &[JsValue::from_str("screen")])?;
        let sentinel = await_promise(pending).await?;
        if !wanted.get() {
            // Released while the request was in flight.
            let pending = call_method(&sentinel, "release", &[])?;
            await_promise(pending).await?;
            return Ok(());
        }
        if let Some(previous) = slot.borrow_mut().replace(sentinel) {
            let _ = call_method(&previous, "release", &[]);
        }
        Ok(())
    }

    async fn drop_sentinel(slot: Rc<RefCell<Option<JsValue>>>) -> Result<(), CapabilityError> {
        let Some(sentinel) = slot.borrow_mut().take() else {
            return Ok(());
        };
        let pending = call_method(&sentinel, "release", &[])?;
        await_promise(pending).await?;
        Ok(())
    }
}

impl ScreenResource for ScreenWakeLock {
    fn name(&self) -> &'static str {
        "wake-lock"
    }

    fn acquire(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
        self.wanted.set(true);
        if self.is_held() {
            return future::ready(Ok(())).boxed_local();
        }
        Self::request(self.sentinel.clone(), self.wanted.clone()).boxed_local()
    }

    fn release(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
        self.wanted.set(false);
        Self::drop_sentinel(self.sentinel.clone()).boxed_local()
    }
}

/// One `localStorage` entry holding the settings JSON.
pub struct LocalStorage {
    key: &'static str,
}

impl LocalStorage {
    pub fn new(key: &'static str) -> Self {
        Self { key }
    }

    fn storage(&self) -> Result<Storage, SettingsError> {
        web_sys::window()
            .ok_or(SettingsError::Unavailable)?
            .local_storage()
            .map_err(|e| SettingsError::from(CapabilityError::from(e)))?
            .ok_or(SettingsError::Unavailable)
    }
}

impl SettingsStore for LocalStorage {
    fn load(&self) -> Result<Option<String>, SettingsError> {
        self.storage()?
            .get_item(self.key)
            .map_err(|e| CapabilityError::from(e).into())
    }

    fn save(&self, raw: &str) -> Result<(), SettingsError> {
        self.storage()?
            .set_item(self.key, raw)
            .map_err(|e| CapabilityError::from(e).into())
    }
}
