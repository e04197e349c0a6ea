//! Yew view components for the trainer UI.
//!
//! Components render from props and report changes as [`SettingsUpdate`]s;
//! none of them own settings or cycle state.

use crate::hooks::use_validated_input;
use reaction_trainer::cycle::DisplayFrame;
use reaction_trainer::settings::{effective_interval_sec, Settings, SettingsUpdate};
use reaction_trainer::utils::{parse_interval_sec, validate_range_bound};
use reaction_trainer::{ArrowSet, Mode};
use std::rc::Rc;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Calls `commit` when Enter is pressed.
fn enter_commits(commit: Callback<()>) -> Callback<KeyboardEvent> {
    Callback::from(move |e: KeyboardEvent| {
        if e.key() == "Enter" {
            commit.emit(());
        }
    })
}

#[derive(Properties, PartialEq)]
pub struct IntegerFieldProps {
    pub label: AttrValue,
    pub value: i64,
    pub on_commit: Callback<i64>,
}

/// One end of the numeric range.
#[function_component(IntegerField)]
pub fn integer_field(props: &IntegerFieldProps) -> Html {
    let label = props.label.clone();
    let input = use_validated_input(
        props.value,
        Rc::new(move |s: &str| validate_range_bound(s, &label)),
        props.on_commit.clone(),
    );

    html! {
        <label class="field">
            { props.label.clone() }
            <input
                type="text"
                inputmode="numeric"
                class={classes!("field-input", "narrow", input.error.is_some().then_some("invalid"))}
                value={input.text.clone()}
                oninput={input.on_text_input.clone()}
                onchange={input.on_commit.reform(|_| ())}
                onkeydown={enter_commits(input.on_commit.clone())}
            />
            if let Some(ref err) = input.error {
                <span class="input-error">{ err.clone() }</span>
            }
        </label>
    }
}

#[derive(Properties, PartialEq)]
pub struct IntervalFieldProps {
    pub value: f64,
    pub on_commit: Callback<f64>,
}

/// Interval in seconds; accepts "2.5", "750ms", "1m 30s" and "1:30".
#[function_component(IntervalField)]
pub fn interval_field(props: &IntervalFieldProps) -> Html {
    let input = use_validated_input(
        effective_interval_sec(props.value),
        Rc::new(parse_interval_sec),
        props.on_commit.clone(),
    );

    html! {
        <span class="chip">
            { "Interval (sec)" }
            <input
                type="text"
                inputmode="decimal"
                class={classes!("field-input", "wide", input.error.is_some().then_some("invalid"))}
                value={input.text.clone()}
                oninput={input.on_text_input.clone()}
                onchange={input.on_commit.reform(|_| ())}
                onkeydown={enter_commits(input.on_commit.clone())}
            />
            if let Some(ref err) = input.error {
                <span class="input-error">{ err.clone() }</span>
            }
        </span>
    }
}

#[derive(Properties, PartialEq)]
pub struct ToggleProps {
    pub label: AttrValue,
    pub checked: bool,
    pub on_toggle: Callback<bool>,
}

#[function_component(Toggle)]
pub fn toggle(props: &ToggleProps) -> Html {
    let onchange = {
        let on_toggle = props.on_toggle.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            on_toggle.emit(input.checked());
        })
    };

    html! {
        <label class="chip">
            <input type="checkbox" checked={props.checked} {onchange} />
            { props.label.clone() }
        </label>
    }
}

/// Renders a `<select>` whose options are `(id, label)` pairs.
fn render_select(
    selected: &str,
    options: impl Iterator<Item = (&'static str, &'static str)>,
    onchange: Callback<String>,
) -> Html {
    let onchange = Callback::from(move |e: Event| {
        let select: HtmlSelectElement = e.target_unchecked_into();
        onchange.emit(select.value());
    });

    html! {
        <select class="field-input" {onchange}>
            { for options.map(|(id, label)| html! {
                <option value={id} selected={id == selected}>{ label }</option>
            }) }
        </select>
    }
}

#[derive(Properties, PartialEq)]
pub struct SettingsHeaderProps {
    pub settings: Rc<Settings>,
    pub on_change: Callback<SettingsUpdate>,
}

/// The settings form shown above the display.
#[function_component(SettingsHeader)]
pub fn settings_header(props: &SettingsHeaderProps) -> Html {
    let s = &props.settings;
    let emit = |make: fn(bool) -> SettingsUpdate| props.on_change.reform(make);

    let on_mode = props.on_change.reform(|id: String| {
        SettingsUpdate::Mode(Mode::from_id(&id).unwrap_or_default())
    });
    let on_arrow_set = props.on_change.reform(|id: String| {
        SettingsUpdate::ArrowSet(ArrowSet::from_id(&id).unwrap_or_default())
    });

    html! {
        <header class="settings">
            <span class="chip">
                { "Mode" }
                { render_select(s.mode.id(), Mode::ALL.into_iter().map(|m| (m.id(), m.label())), on_mode) }
            </span>

            if s.mode == Mode::Numbers {
                <span class="chip">
                    { "Range" }
                    <IntegerField label="min" value={s.min} on_commit={props.on_change.reform(SettingsUpdate::Min)} />
                    <IntegerField label="max" value={s.max} on_commit={props.on_change.reform(SettingsUpdate::Max)} />
                </span>
            } else {
                <span class="chip">
                    { "Arrows" }
                    { render_select(s.arrow_set.id(), ArrowSet::ALL.into_iter().map(|a| (a.id(), a.label())), on_arrow_set) }
                </span>
            }

            <IntervalField value={s.interval_sec} on_commit={props.on_change.reform(SettingsUpdate::IntervalSec)} />

            <Toggle label="no immediate repeat" checked={s.no_repeat} on_toggle={emit(SettingsUpdate::NoRepeat)} />
            <Toggle label="beep" checked={s.audio_on} on_toggle={emit(SettingsUpdate::AudioOn)} />
            <Toggle label="fullscreen" checked={s.want_fullscreen} on_toggle={emit(SettingsUpdate::WantFullscreen)} />
            <Toggle label="show progress" checked={s.show_progress} on_toggle={emit(SettingsUpdate::ShowProgress)} />
        </header>
    }
}

#[derive(Properties, PartialEq)]
pub struct StimulusDisplayProps {
    pub frame: DisplayFrame,
    pub font_scale: f64,
}

/// The current symbol. Keyed by the pop token so the entry animation replays
/// on every tick.
#[function_component(StimulusDisplay)]
pub fn stimulus_display(props: &StimulusDisplayProps) -> Html {
    let style = format!(
        "color: {}; transform: scale({}); transform-origin: center;",
        props.frame.color, props.font_scale
    );

    html! {
        <main class="stage">
            <div key={props.frame.pop.to_string()} class="stimulus" {style}>
                <div class="pop">{ props.frame.symbol.clone() }</div>
            </div>
        </main>
    }
}

#[derive(Properties, PartialEq)]
pub struct ProgressBarProps {
    pub progress: f64,
    pub color: AttrValue,
}

#[function_component(ProgressBar)]
pub fn progress_bar(props: &ProgressBarProps) -> Html {
    let pct = (props.progress.clamp(0.0, 1.0) * 100.0).round();
    let style = format!("width: {}%; background: {};", pct, props.color);

    html! {
        <div class="progress" role="progressbar"
            aria-valuemin="0" aria-valuemax="100" aria-valuenow={pct.to_string()}>
            <div class="progress-fill" {style}></div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct FooterProps {
    pub running: bool,
    pub menu_hidden: bool,
    pub on_start: Callback<()>,
    pub on_stop: Callback<()>,
    pub on_change: Callback<SettingsUpdate>,
}

/// Start/Stop, menu toggle and font size controls.
#[function_component(Footer)]
pub fn footer(props: &FooterProps) -> Html {
    let click = |cb: &Callback<()>| cb.reform(|_: MouseEvent| ());
    let update = |u: SettingsUpdate| props.on_change.reform(move |_: MouseEvent| u.clone());

    html! {
        <footer class="controls">
            <div class="button-row">
                <button class="btn btn-start" disabled={props.running} onclick={click(&props.on_start)}>
                    { "Start" }
                </button>
                <button class="btn btn-stop" disabled={!props.running} onclick={click(&props.on_stop)}>
                    { "Stop" }
                </button>
                <button class="btn btn-secondary" onclick={update(SettingsUpdate::ToggleMenu)}>
                    { if props.menu_hidden { "Show menu" } else { "Hide menu" } }
                </button>
            </div>
            <div class="button-row">
                <button class="btn btn-secondary small" title="Increase size" onclick={update(SettingsUpdate::GrowFont)}>
                    { "A+" }
                </button>
                <button class="btn btn-secondary small" title="Decrease size" onclick={update(SettingsUpdate::ShrinkFont)}>
                    { "A-" }
                </button>
            </div>
        </footer>
    }
}
