use gloo_timers::callback::Interval;
use log::warn;
use reaction_trainer::browser::now_ms;
use reaction_trainer::capabilities::{
    acquire_session, reacquire_wake_lock, release_session, Capabilities,
};
use reaction_trainer::cycle::{Cycle, DisplayFrame, Reconfigured, Tick};
use reaction_trainer::frame::AnimationFrameLoop;
use reaction_trainer::settings::Settings;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, KeyboardEvent, VisibilityState};
use yew::prelude::*;

type Shared<T> = Rc<RefCell<T>>;

/// Parses and validates the raw text of an input field.
pub type ParseFn<T> = Rc<dyn Fn(&str) -> Result<T, String>>;

/// Holds the state and callbacks for a validated input field.
#[derive(Clone)]
pub struct ValidatedInput {
    /// The current text content of the input field.
    pub text: String,
    /// An optional error message if validation failed.
    pub error: Option<String>,
    /// Callback for the text input's `oninput` event. Updates the internal text state.
    pub on_text_input: Callback<InputEvent>,
    /// Parses and validates the current text, emitting the value on success.
    /// Wired to `onchange` and to the Enter key.
    pub on_commit: Callback<()>,
}

/// Custom hook to manage a text field bound to a typed setting.
///
/// `current` is the committed value owned elsewhere; when it changes the text
/// is re-synced to its canonical form.
#[hook]
pub fn use_validated_input<T>(
    current: T,
    parse_and_validate: ParseFn<T>,
    on_valid: Callback<T>,
) -> ValidatedInput
where
    T: Clone + PartialEq + std::fmt::Display + 'static,
{
    let text_state_handle: UseStateHandle<String> = use_state(|| current.to_string());
    let error_state_handle: UseStateHandle<Option<String>> = use_state(|| None::<String>);

    let on_text_input = {
        let text_setter = text_state_handle.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            text_setter.set(input.value());
        })
    };

    let on_commit = {
        let current_text_handle = text_state_handle.clone();
        let error_setter = error_state_handle.clone();
        Callback::from(move |_| match parse_and_validate(&current_text_handle) {
            Ok(parsed_val) => {
                current_text_handle.set(parsed_val.to_string()); // Update text to canonical form
                error_setter.set(None);
                on_valid.emit(parsed_val);
            }
            Err(err_msg) => {
                error_setter.set(Some(err_msg));
            }
        })
    };

    // Re-sync the text when the committed value changes
    {
        let text_setter = text_state_handle.clone();
        let error_setter = error_state_handle.clone();
        use_effect_with(current, move |value| {
            let formatted = value.to_string();
            if *text_setter != formatted {
                text_setter.set(formatted);
            }
            error_setter.set(None);
            || ()
        });
    }

    ValidatedInput {
        text: (*text_state_handle).clone(),
        error: (*error_state_handle).clone(),
        on_text_input,
        on_commit,
    }
}

/// Start/stop controls and the current display frame of the stimulus cycle.
pub struct CycleControls {
    pub display: DisplayFrame,
    pub running: bool,
    pub start: Callback<()>,
    pub stop: Callback<()>,
    pub toggle: Callback<()>,
    /// Re-request the wake-lock if a run is in progress.
    pub resume: Callback<()>,
}

fn show(cycle: &Shared<Cycle>, display: &UseStateHandle<DisplayFrame>) {
    display.set(cycle.borrow().display());
}

fn play(tick: &Tick, caps: &Capabilities) {
    if tick.cue {
        caps.cue();
    }
}

/// (Re)start the periodic tick. Replacing the handle drops, and so cancels,
/// the previous schedule.
fn arm_ticker(
    cycle: &Shared<Cycle>,
    ticker: &Shared<Option<Interval>>,
    display: &UseStateHandle<DisplayFrame>,
    caps: &Rc<Capabilities>,
) {
    let period = cycle.borrow().interval_ms().round() as u32;
    let cycle = cycle.clone();
    let display = display.clone();
    let caps = caps.clone();
    let interval = Interval::new(period, move || {
        let tick = cycle.borrow_mut().tick(&mut rand::rng(), now_ms());
        if let Some(tick) = tick {
            play(&tick, &caps);
            show(&cycle, &display);
        }
    });
    *ticker.borrow_mut() = Some(interval);
}

/// Start the progress loop if the cycle wants one and none is pending, or
/// drop it if the cycle no longer does.
fn arm_frames(
    cycle: &Shared<Cycle>,
    frames: &Shared<Option<AnimationFrameLoop>>,
    display: &UseStateHandle<DisplayFrame>,
) {
    if !cycle.borrow().frame_loop_active() {
        frames.borrow_mut().take();
        return;
    }
    if frames
        .borrow()
        .as_ref()
        .is_some_and(AnimationFrameLoop::is_pending)
    {
        return;
    }

    let cycle = cycle.clone();
    let display = display.clone();
    let started = AnimationFrameLoop::start(move |_| {
        let progress = cycle.borrow_mut().frame(now_ms());
        match progress {
            Some(_) => {
                show(&cycle, &display);
                true
            }
            None => false,
        }
    });
    match started {
        Ok(frame_loop) => *frames.borrow_mut() = Some(frame_loop),
        Err(e) => warn!("Progress display unavailable: {}", e),
    }
}

#[hook]
pub fn use_cycle(settings: Rc<Settings>, caps: Rc<Capabilities>) -> CycleControls {
    let cycle: Shared<Cycle> = use_mut_ref(|| Cycle::new(&settings));
    let display = use_state(|| cycle.borrow().display());
    let running = use_state(|| false);
    let ticker: Shared<Option<Interval>> = use_mut_ref(|| None);
    let frames: Shared<Option<AnimationFrameLoop>> = use_mut_ref(|| None);
    // Callbacks registered once (keyboard) still need the current settings.
    let latest = use_mut_ref(|| settings.clone());
    *latest.borrow_mut() = settings.clone();

    let start = {
        let cycle = cycle.clone();
        let ticker = ticker.clone();
        let frames = frames.clone();
        let display = display.clone();
        let running = running.clone();
        let latest = latest.clone();
        let caps = caps.clone();
        Callback::from(move |_: ()| {
            let tick = cycle.borrow_mut().start(&mut rand::rng(), now_ms());
            let Some(tick) = tick else {
                return;
            };
            play(&tick, &caps);
            arm_ticker(&cycle, &ticker, &display, &caps);
            arm_frames(&cycle, &frames, &display);
            show(&cycle, &display);
            running.set(true);

            let want_fullscreen = latest.borrow().want_fullscreen;
            spawn_local(acquire_session((*caps).clone(), want_fullscreen));
        })
    };

    let stop = {
        let cycle = cycle.clone();
        let ticker = ticker.clone();
        let frames = frames.clone();
        let display = display.clone();
        let running = running.clone();
        let caps = caps.clone();
        Callback::from(move |_: ()| {
            if !cycle.borrow_mut().stop() {
                return;
            }
            ticker.borrow_mut().take();
            frames.borrow_mut().take();
            show(&cycle, &display);
            running.set(false);
            spawn_local(release_session((*caps).clone()));
        })
    };

    let toggle = {
        let cycle = cycle.clone();
        let start = start.clone();
        let stop = stop.clone();
        Callback::from(move |_: ()| {
            let is_running = cycle.borrow().is_running();
            if is_running {
                stop.emit(());
            } else {
                start.emit(());
            }
        })
    };

    let resume = {
        let cycle = cycle.clone();
        let caps = caps.clone();
        Callback::from(move |_: ()| {
            if cycle.borrow().is_running() {
                spawn_local(reacquire_wake_lock((*caps).clone()));
            }
        })
    };

    // Settings changes reach the running schedule
    {
        let cycle = cycle.clone();
        let ticker = ticker.clone();
        let frames = frames.clone();
        let display = display.clone();
        use_effect_with(settings, move |settings| {
            let outcome = cycle
                .borrow_mut()
                .reconfigure(&mut rand::rng(), now_ms(), settings);
            if let Reconfigured::Restarted(tick) = outcome {
                play(&tick, &caps);
                arm_ticker(&cycle, &ticker, &display, &caps);
            }
            arm_frames(&cycle, &frames, &display);
            show(&cycle, &display);
            || ()
        });
    }

    // Cancel both tasks on unmount
    {
        let ticker = ticker.clone();
        let frames = frames.clone();
        use_effect_with((), move |_| {
            move || {
                ticker.borrow_mut().take();
                frames.borrow_mut().take();
            }
        });
    }

    CycleControls {
        display: (*display).clone(),
        running: *running,
        start,
        stop,
        toggle,
        resume,
    }
}

/// Toggle with the space bar, without letting it scroll the page.
#[hook]
pub fn use_space_toggle(toggle: Callback<()>) {
    use_effect_with((), move |_| {
        let listener = Closure::<dyn FnMut(KeyboardEvent)>::new(move |e: KeyboardEvent| {
            if e.code() == "Space" {
                e.prevent_default();
                if !e.repeat() {
                    toggle.emit(());
                }
            }
        });
        let window = gloo_utils::window();
        if let Err(e) =
            window.add_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref())
        {
            warn!("Could not install keyboard shortcut: {:?}", e);
        }
        move || {
            if let Err(e) = window
                .remove_event_listener_with_callback("keydown", listener.as_ref().unchecked_ref())
            {
                warn!("Could not remove keyboard shortcut: {:?}", e);
            }
        }
    });
}

/// Run `on_visible` whenever the page becomes visible again.
#[hook]
pub fn use_visibility_resume(on_visible: Callback<()>) {
    use_effect_with((), move |_| {
        let document = gloo_utils::document();
        let listener = {
            let document = document.clone();
            Closure::<dyn FnMut()>::new(move || {
                if document.visibility_state() == VisibilityState::Visible {
                    on_visible.emit(());
                }
            })
        };
        if let Err(e) = document.add_event_listener_with_callback(
            "visibilitychange",
            listener.as_ref().unchecked_ref(),
        ) {
            warn!("Could not watch page visibility: {:?}", e);
        }
        move || {
            if let Err(e) = document.remove_event_listener_with_callback(
                "visibilitychange",
                listener.as_ref().unchecked_ref(),
            ) {
                warn!("Could not stop watching page visibility: {:?}", e);
            }
        }
    });
}
