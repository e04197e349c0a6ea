//! Main module for the reaction trainer using Yew.
//! Wires UI components, state hooks, and side-effect logic.

use log::LevelFilter;
use reaction_trainer::capabilities::Capabilities;
use reaction_trainer::logging;
use reaction_trainer::settings::{load_settings, save_settings, Settings};
use std::rc::Rc;
use yew::prelude::*;

mod components;
mod hooks;

use components::{Footer, ProgressBar, SettingsHeader, StimulusDisplay};
use hooks::{use_cycle, use_space_toggle, use_visibility_resume};

/// Primary application component wiring settings, the stimulus cycle and the
/// host capabilities.
#[function_component(App)]
fn app() -> Html {
    let caps = use_memo((), |_| Capabilities::for_platform());
    let settings = {
        let caps = caps.clone();
        use_reducer(move || load_settings(caps.store.as_ref()))
    };

    // Persist every change
    {
        let caps = caps.clone();
        use_effect_with((*settings).clone(), move |current: &Settings| {
            save_settings(caps.store.as_ref(), current);
            || ()
        });
    }

    let on_change = {
        let settings = settings.clone();
        Callback::from(move |update| settings.dispatch(update))
    };

    let cycle = use_cycle(Rc::new((*settings).clone()), caps.clone());
    use_space_toggle(cycle.toggle.clone());
    use_visibility_resume(cycle.resume.clone());

    let layout = if settings.menu_hidden {
        "app menu-hidden"
    } else {
        "app"
    };

    html! {
        <div class={layout}>
            if !settings.menu_hidden {
                <SettingsHeader settings={Rc::new((*settings).clone())} on_change={on_change.clone()} />
            }

            <StimulusDisplay frame={cycle.display.clone()} font_scale={settings.font_scale} />

            if settings.show_progress {
                <ProgressBar progress={cycle.display.progress} color={cycle.display.color} />
            }

            <Footer
                running={cycle.running}
                menu_hidden={settings.menu_hidden}
                on_start={cycle.start.clone()}
                on_stop={cycle.stop.clone()}
                {on_change}
            />
        </div>
    }
}

/// Entry point: installs panic and log hooks, then renders the App.
fn main() {
    console_error_panic_hook::set_once();
    logging::init(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });
    yew::Renderer::<App>::new().render();
}
