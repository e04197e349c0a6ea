//! Injected host capabilities: audio cue, fullscreen, wake-lock and settings
//! storage.
//!
//! The core never calls browser APIs directly. Every capability has a browser
//! implementation in [`crate::browser`] and a no-op one here, so the cycle and
//! settings logic run unchanged off the web.

use futures::future::{self, LocalBoxFuture};
use futures::{Future, FutureExt};
use log::{debug, info};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use wasm_bindgen::JsValue;

/// Failure of a best-effort host capability.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityError {
    /// The host does not provide the API at all.
    Unavailable,
    /// The API exists but refused or threw.
    Rejected(String),
}

impl fmt::Display for CapabilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapabilityError::Unavailable => write!(f, "Capability not available on this host"),
            CapabilityError::Rejected(reason) => write!(f, "Capability request rejected: {}", reason),
        }
    }
}

impl std::error::Error for CapabilityError {}

impl From<JsValue> for CapabilityError {
    fn from(err: JsValue) -> Self {
        let reason = err
            .as_string()
            .unwrap_or_else(|| format!("{:?}", err));
        CapabilityError::Rejected(reason)
    }
}

/// Failure reading or writing persisted settings.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    Unavailable,
    Malformed(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Unavailable => write!(f, "Settings storage not available"),
            SettingsError::Malformed(detail) => write!(f, "Malformed settings: {}", detail),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<CapabilityError> for SettingsError {
    fn from(err: CapabilityError) -> Self {
        match err {
            CapabilityError::Unavailable => SettingsError::Unavailable,
            CapabilityError::Rejected(reason) => SettingsError::Malformed(reason),
        }
    }
}

/// Short audible cue played once per tick.
pub trait AudioCue {
    fn emit(&self) -> Result<(), CapabilityError>;
}

/// A screen resource held for the duration of a run (fullscreen, wake-lock).
pub trait ScreenResource {
    fn name(&self) -> &'static str;
    fn acquire(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>>;
    fn release(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>>;
}

/// String-keyed persistence for the settings record.
pub trait SettingsStore {
    fn load(&self) -> Result<Option<String>, SettingsError>;
    fn save(&self, raw: &str) -> Result<(), SettingsError>;
}

/// Audio cue that stays silent.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl AudioCue for Silent {
    fn emit(&self) -> Result<(), CapabilityError> {
        Ok(())
    }
}

/// Screen resource for hosts without the API. Every request fails with
/// [`CapabilityError::Unavailable`].
#[derive(Debug, Clone, Copy)]
pub struct Unsupported(pub &'static str);

impl ScreenResource for Unsupported {
    fn name(&self) -> &'static str {
        self.0
    }

    fn acquire(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
        future::ready(Err(CapabilityError::Unavailable)).boxed_local()
    }

    fn release(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
        future::ready(Err(CapabilityError::Unavailable)).boxed_local()
    }
}

/// In-memory settings store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    raw: RefCell<Option<String>>,
    failing: bool,
}

impl MemoryStore {
    pub fn with_raw(raw: &str) -> Self {
        Self {
            raw: RefCell::new(Some(raw.to_string())),
            failing: false,
        }
    }

    /// A store whose every operation fails, like storage disabled by the
    /// browser's privacy settings.
    pub fn failing() -> Self {
        Self {
            raw: RefCell::new(None),
            failing: true,
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, SettingsError> {
        if self.failing {
            return Err(SettingsError::Unavailable);
        }
        Ok(self.raw.borrow().clone())
    }

    fn save(&self, raw: &str) -> Result<(), SettingsError> {
        if self.failing {
            return Err(SettingsError::Unavailable);
        }
        *self.raw.borrow_mut() = Some(raw.to_string());
        Ok(())
    }
}

/// Capabilities handed to the front end.
#[derive(Clone)]
pub struct Capabilities {
    pub audio: Rc<dyn AudioCue>,
    pub fullscreen: Rc<dyn ScreenResource>,
    pub wake_lock: Rc<dyn ScreenResource>,
    pub store: Rc<dyn SettingsStore>,
}

impl Capabilities {
    /// Silent audio, no screen resources and an in-memory store.
    pub fn noop() -> Self {
        Self {
            audio: Rc::new(Silent),
            fullscreen: Rc::new(Unsupported("fullscreen")),
            wake_lock: Rc::new(Unsupported("wake-lock")),
            store: Rc::new(MemoryStore::default()),
        }
    }

    /// Browser capabilities on wasm32, [`Capabilities::noop`] elsewhere.
    pub fn for_platform() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            crate::browser::capabilities()
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            Self::noop()
        }
    }

    /// Play the tick cue, skipping it if the host cannot.
    pub fn cue(&self) {
        if let Err(e) = self.audio.emit() {
            debug!("Skipping audio cue: {}", e);
        }
    }
}

impl PartialEq for Capabilities {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.audio, &other.audio)
            && Rc::ptr_eq(&self.fullscreen, &other.fullscreen)
            && Rc::ptr_eq(&self.wake_lock, &other.wake_lock)
            && Rc::ptr_eq(&self.store, &other.store)
    }
}

fn report(name: &str, verb: &str, result: Result<(), CapabilityError>) {
    match result {
        Ok(()) => info!("{} {}d", name, verb),
        Err(e) => debug!("Could not {} {}: {}", verb, name, e),
    }
}

async fn best_effort(resource: Rc<dyn ScreenResource>, acquire: bool) {
    let verb = if acquire { "acquire" } else { "release" };
    let result = if acquire {
        resource.acquire().await
    } else {
        resource.release().await
    };
    report(resource.name(), verb, result);
}

/// Acquire the run's screen resources. Wake-lock is always requested,
/// fullscreen only when asked for. Failures are logged and ignored.
///
/// Both requests are issued before this returns: fullscreen needs the user
/// activation of the calling gesture, which does not survive an await.
pub fn acquire_session(caps: Capabilities, fullscreen: bool) -> impl Future<Output = ()> {
    let fullscreen_request = fullscreen.then(|| caps.fullscreen.acquire());
    let wake_lock_request = caps.wake_lock.acquire();
    async move {
        if let Some(request) = fullscreen_request {
            report(caps.fullscreen.name(), "acquire", request.await);
        }
        report(caps.wake_lock.name(), "acquire", wake_lock_request.await);
    }
}

/// Release everything [`acquire_session`] may have taken.
pub async fn release_session(caps: Capabilities) {
    best_effort(caps.wake_lock.clone(), false).await;
    best_effort(caps.fullscreen.clone(), false).await;
}

/// Re-acquire the wake-lock, which hosts drop when the page is hidden.
pub async fn reacquire_wake_lock(caps: Capabilities) {
    best_effort(caps.wake_lock.clone(), true).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recording {
        acquired: Cell<u32>,
        released: Cell<u32>,
        fail: bool,
    }

    type Journal = Rc<RefCell<Vec<&'static str>>>;

    struct Handle(Rc<Recording>, &'static str, Journal);

    impl ScreenResource for Handle {
        fn name(&self) -> &'static str {
            self.1
        }

        fn acquire(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
            self.0.acquired.set(self.0.acquired.get() + 1);
            self.2.borrow_mut().push(self.1);
            let result = if self.0.fail {
                Err(CapabilityError::Rejected("denied".into()))
            } else {
                Ok(())
            };
            future::ready(result).boxed_local()
        }

        fn release(&self) -> LocalBoxFuture<'static, Result<(), CapabilityError>> {
            self.0.released.set(self.0.released.get() + 1);
            future::ready(Ok(())).boxed_local()
        }
    }

    fn caps_logged(wake: Rc<Recording>, full: Rc<Recording>, journal: Journal) -> Capabilities {
        Capabilities {
            wake_lock: Rc::new(Handle(wake, "wake-lock", journal.clone())),
            fullscreen: Rc::new(Handle(full, "fullscreen", journal)),
            ..Capabilities::noop()
        }
    }

    fn caps_with(wake: Rc<Recording>, full: Rc<Recording>) -> Capabilities {
        caps_logged(wake, full, Journal::default())
    }

    #[test]
    fn fullscreen_is_only_requested_when_wanted() {
        let wake = Rc::new(Recording::default());
        let full = Rc::new(Recording::default());
        let caps = caps_with(wake.clone(), full.clone());

        block_on(acquire_session(caps.clone(), false));
        assert_eq!(wake.acquired.get(), 1);
        assert_eq!(full.acquired.get(), 0);

        block_on(acquire_session(caps, true));
        assert_eq!(full.acquired.get(), 1);
    }

    #[test]
    fn fullscreen_is_requested_first_and_before_any_await() {
        let wake = Rc::new(Recording::default());
        let full = Rc::new(Recording::default());
        let journal = Journal::default();
        let caps = caps_logged(wake.clone(), full.clone(), journal.clone());

        let session = acquire_session(caps, true);
        assert_eq!(full.acquired.get(), 1);
        assert_eq!(wake.acquired.get(), 1);
        assert_eq!(*journal.borrow(), ["fullscreen", "wake-lock"]);

        block_on(session);
        assert_eq!(journal.borrow().len(), 2);
    }

    #[test]
    fn a_failed_wake_lock_does_not_block_fullscreen() {
        let wake = Rc::new(Recording {
            fail: true,
            ..Recording::default()
        });
        let full = Rc::new(Recording::default());
        block_on(acquire_session(caps_with(wake.clone(), full.clone()), true));
        assert_eq!(wake.acquired.get(), 1);
        assert_eq!(full.acquired.get(), 1);
    }

    #[test]
    fn release_touches_both_resources() {
        let wake = Rc::new(Recording::default());
        let full = Rc::new(Recording::default());
        block_on(release_session(caps_with(wake.clone(), full.clone())));
        assert_eq!(wake.released.get(), 1);
        assert_eq!(full.released.get(), 1);
    }

    #[test]
    fn noop_capabilities_swallow_every_failure() {
        let caps = Capabilities::noop();
        caps.cue();
        block_on(acquire_session(caps.clone(), true));
        block_on(release_session(caps));
    }

    #[test]
    fn error_messages() {
        assert_eq!(
            CapabilityError::Rejected("NotAllowedError".into()).to_string(),
            "Capability request rejected: NotAllowedError"
        );
        assert_eq!(
            SettingsError::from(CapabilityError::Unavailable),
            SettingsError::Unavailable
        );
    }
}
