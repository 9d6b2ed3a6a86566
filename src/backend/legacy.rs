use {
    anyhow::{bail, Error},
    log::{debug, info, trace, warn},
};

use crate::{
    backend::{Backend, OutputRow, OUTPUT_ICON_NAME},
    choices::{closest_rate, rate_name, Choices},
    geometry::resolution_name,
    rotation::{Rotation, ROTATION_NAMES},
    screen::Screen,
    settings::{property_path, SettingValue, SettingsStore},
};

/// Where the screen based (pre 1.2) configuration comes from.
pub trait ScreenSource {
    fn screens(&self) -> Result<Vec<Screen>, Error>;

    /// Screen shown first.
    fn default_screen(&self) -> usize {
        0
    }

    fn apply(
        &self,
        screen: &Screen,
        size_index: usize,
        rotation: Rotation,
        rate: u16,
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone, PartialEq)]
struct ScreenState {
    screen: Screen,
    resolution: usize,
    rate: u16,
    rotation: Rotation,
}

impl ScreenState {
    fn new(screen: Screen) -> Self {
        ScreenState {
            resolution: screen.size_index,
            rate: screen.rate,
            rotation: screen.rotation,
            screen,
        }
    }

    fn is_changed(&self) -> bool {
        self.resolution != self.screen.size_index
            || self.rate != self.screen.rate
            || self.rotation != self.screen.rotation
    }
}

pub struct LegacyBackend<S> {
    source: S,
    screens: Vec<ScreenState>,
    active_screen: usize,
}

impl<S: ScreenSource> LegacyBackend<S> {
    pub fn new(source: S) -> Result<Self, Error> {
        let active_screen = source.default_screen();
        let mut backend = LegacyBackend {
            source,
            screens: Vec::new(),
            active_screen,
        };
        backend.reload()?;
        Ok(backend)
    }

    fn active(&self) -> &ScreenState {
        &self.screens[self.active_screen]
    }

    fn active_mut(&mut self) -> &mut ScreenState {
        &mut self.screens[self.active_screen]
    }

    /// Applies changed screens, then persists every screen.
    fn commit(&self, scheme: &str, store: &dyn SettingsStore) -> Result<(), Error> {
        for (n, state) in self.screens.iter().enumerate() {
            if state.is_changed() {
                info!(
                    "Applying size {} at {} Hz, rotation {} on screen {}",
                    state.resolution,
                    state.rate,
                    state.rotation.degrees(),
                    n
                );
                self.source
                    .apply(&state.screen, state.resolution, state.rotation, state.rate)?;
            }
        }

        for (n, state) in self.screens.iter().enumerate() {
            let section = format!("Screen_{}", n);
            if let Some(size) = state.screen.sizes.get(state.resolution) {
                store.set(
                    &property_path(scheme, &section, "Resolution"),
                    SettingValue::Str(resolution_name(size)),
                )?;
            }
            store.set(
                &property_path(scheme, &section, "RefreshRate"),
                SettingValue::Int(i32::from(state.rate)),
            )?;
            store.set(
                &property_path(scheme, &section, "Rotation"),
                SettingValue::Int(state.rotation.degrees()),
            )?;
        }
        Ok(())
    }
}

impl<S: ScreenSource> Backend for LegacyBackend<S> {
    fn outputs(&self) -> Vec<OutputRow> {
        (0..self.screens.len())
            .map(|n| OutputRow {
                name: format!("Screen {}", n + 1),
                icon_name: OUTPUT_ICON_NAME,
                id: n,
            })
            .collect()
    }

    fn active_output(&self) -> usize {
        self.active_screen
    }

    fn set_active_output(&mut self, id: usize) {
        if id < self.screens.len() {
            self.active_screen = id;
        } else {
            warn!("Ignoring unknown screen {}", id);
        }
    }

    fn resolutions(&self) -> Choices {
        let state = self.active();
        let mut choices = Choices::new();
        for (n, size) in state.screen.sizes.iter().enumerate() {
            let index = choices.push(resolution_name(size), n as u32);
            if n == state.resolution {
                choices.select(index);
            }
        }
        choices
    }

    fn set_resolution(&mut self, value: u32) {
        let index = value as usize;
        if index < self.active().screen.sizes.len() {
            self.active_mut().resolution = index;
        } else {
            warn!("Ignoring unknown size {}", index);
        }
    }

    fn refresh_rates(&self, _resolution: Option<u32>) -> Choices {
        let state = self.active();
        let rates = state.screen.rates_for(state.resolution);

        // listed in reverse, hence the index flip
        let mut choices = Choices::new();
        for rate in rates {
            choices.prepend(rate_name(u32::from(*rate)), u32::from(*rate));
        }
        if let Some(closest) = closest_rate(rates, state.rate) {
            choices.select(rates.len() - closest - 1);
        }
        choices
    }

    fn set_refresh_rate(&mut self, value: u32) {
        self.active_mut().rate = value as u16;
    }

    fn rotations(&self) -> Choices {
        let state = self.active();
        let mut choices = Choices::new();
        for (rotation, name) in ROTATION_NAMES.iter() {
            if state.screen.rotations.contains(*rotation) {
                let index = choices.push(*name, u32::from(rotation.bits()));
                if *rotation == state.rotation.orientation() {
                    choices.select(index);
                }
            }
        }
        choices
    }

    fn set_rotation(&mut self, value: u32) {
        let state = self.active_mut();
        state.rotation = state.rotation.with_orientation(Rotation::from_value(value));
    }

    fn reload(&mut self) -> Result<(), Error> {
        trace!("Reloading screen configuration");
        let screens = self.source.screens()?;
        if screens.is_empty() {
            bail!("The display has no screens");
        }
        debug!("screens: {:#?}", screens);

        self.screens = screens.into_iter().map(ScreenState::new).collect();
        if self.active_screen >= self.screens.len() {
            self.active_screen = 0;
        }
        Ok(())
    }

    fn save(&mut self, scheme: &str, store: &dyn SettingsStore) -> Result<(), Error> {
        let result = self.commit(scheme, store);
        // a failure may come after the server took part of the change
        let reloaded = self.reload();
        result.and(reloaded)
    }
}
