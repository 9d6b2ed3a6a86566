use {
    anyhow::{bail, Error},
    log::{debug, info, trace, warn},
    xcb::randr as xrandr,
};

use crate::{
    backend::{Backend, OutputRow, OUTPUT_ICON_NAME},
    choices::{rate_name, Choices},
    output::{friendly_name, output_statuses, Output, OutputStatus},
    rotation::{Rotation, ROTATION_NAMES},
    screen_resources::ScreenResources,
    settings::{property_path, SettingValue, SettingsStore},
};

/// Where the output based (RandR 1.2) configuration comes from.
pub trait ResourceSource {
    fn version(&self) -> Result<(u32, u32), Error>;
    fn resources(&self) -> Result<ScreenResources, Error>;
    fn apply(
        &self,
        resources: &ScreenResources,
        output: &Output,
        mode: xrandr::Mode,
        rotation: Rotation,
    ) -> Result<(), Error>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Selection {
    mode: xrandr::Mode,
    rotation: Rotation,
}

pub struct RandrBackend<S> {
    source: S,
    resources: ScreenResources,
    status: Vec<OutputStatus>,
    selections: Vec<Selection>,
    active_output: usize,
}

impl<S: ResourceSource> RandrBackend<S> {
    pub fn new(source: S) -> Result<Self, Error> {
        let (major, minor) = source.version()?;
        if (major, minor) < (1, 2) {
            bail!("RandR {}.{} is too old, 1.2 is required", major, minor);
        }

        let resources = source.resources()?;
        let mut backend = RandrBackend {
            source,
            resources,
            status: Vec::new(),
            selections: Vec::new(),
            active_output: 0,
        };
        backend.reset();
        Ok(backend)
    }

    fn reset(&mut self) {
        self.status = output_statuses(&self.resources.outputs);
        self.selections = self
            .resources
            .outputs
            .iter()
            .map(|output| Selection {
                mode: output.current_mode().unwrap_or(0),
                rotation: output.current_rotation(),
            })
            .collect();

        let status = &self.status;
        let listed = |n: usize| status.get(n).map_or(false, |s| *s != OutputStatus::None);
        if !listed(self.active_output) {
            self.active_output = (0..status.len()).find(|n| listed(*n)).unwrap_or(0);
        }
    }

    /// Applies changed outputs that have a CRTC, then persists every listed output.
    fn commit(&self, scheme: &str, store: &dyn SettingsStore) -> Result<(), Error> {
        let listed = self
            .resources
            .outputs
            .iter()
            .zip(self.selections.iter())
            .zip(self.status.iter())
            .filter(|(_, status)| **status != OutputStatus::None)
            .map(|(pair, _)| pair)
            .collect::<Vec<_>>();

        for (output, selection) in listed.iter() {
            if output.crtc.is_none() || selection.mode == 0 {
                continue;
            }
            if output.current_mode() != Some(selection.mode)
                || output.current_rotation() != selection.rotation
            {
                info!(
                    "Applying mode {} rotation {} on {}",
                    selection.mode,
                    selection.rotation.degrees(),
                    output.name
                );
                self.source
                    .apply(&self.resources, output, selection.mode, selection.rotation)?;
            }
        }

        for (output, selection) in listed.iter() {
            if let Some(mode) = self.resources.mode(selection.mode) {
                store.set(
                    &property_path(scheme, &output.name, "Resolution"),
                    SettingValue::Str(mode.name.clone()),
                )?;
                store.set(
                    &property_path(scheme, &output.name, "RefreshRate"),
                    SettingValue::Int(mode.refresh_rate() as i32),
                )?;
            }
            store.set(
                &property_path(scheme, &output.name, "Rotation"),
                SettingValue::Int(selection.rotation.degrees()),
            )?;
        }

        Ok(())
    }

    fn output(&self) -> Option<&Output> {
        self.resources.outputs.get(self.active_output)
    }

    fn selection_mut(&mut self) -> Option<&mut Selection> {
        self.selections.get_mut(self.active_output)
    }
}

impl<S: ResourceSource> Backend for RandrBackend<S> {
    fn outputs(&self) -> Vec<OutputRow> {
        self.resources
            .outputs
            .iter()
            .zip(self.status.iter())
            .enumerate()
            .filter(|(_, (_, status))| **status != OutputStatus::None)
            .map(|(n, (output, _))| OutputRow {
                name: friendly_name(&output.name).to_owned(),
                icon_name: OUTPUT_ICON_NAME,
                id: n,
            })
            .collect()
    }

    fn active_output(&self) -> usize {
        self.active_output
    }

    fn set_active_output(&mut self, id: usize) {
        match self.status.get(id) {
            Some(status) if *status != OutputStatus::None => self.active_output = id,
            _ => warn!("Ignoring unknown output {}", id),
        }
    }

    fn resolutions(&self) -> Choices {
        let mut choices = Choices::new();
        let output = match self.output() {
            Some(output) => output,
            None => return choices,
        };
        let current = self
            .selections
            .get(self.active_output)
            .and_then(|selection| self.resources.mode(selection.mode))
            .map(|mode| mode.name.as_str());

        let mut previous: Option<&str> = None;
        for mode in self.resources.modes.iter().filter(|mode| output.supports(mode.id)) {
            if previous == Some(mode.name.as_str()) {
                continue;
            }
            let index = choices.push(mode.name.clone(), mode.id);
            if current == Some(mode.name.as_str()) && choices.active.is_none() {
                choices.select(index);
            }
            previous = Some(mode.name.as_str());
        }
        choices
    }

    fn set_resolution(&mut self, value: u32) {
        // the refresh rate list carries the mode
        trace!("Resolution mode {} selected", value);
    }

    fn refresh_rates(&self, resolution: Option<u32>) -> Choices {
        let mut choices = Choices::new();
        let (output, selection) = match (self.output(), self.selections.get(self.active_output)) {
            (Some(output), Some(selection)) => (output, selection),
            _ => return choices,
        };
        let name = match resolution.and_then(|id| self.resources.mode(id)) {
            Some(mode) => mode.name.as_str(),
            None => return choices,
        };

        for mode in self
            .resources
            .modes
            .iter()
            .filter(|mode| mode.name == name && output.supports(mode.id))
        {
            choices.prepend(rate_name(mode.refresh_rate() as u32), mode.id);
            if mode.id == selection.mode {
                choices.select(0);
            }
        }
        if choices.active.is_none() && !choices.is_empty() {
            choices.select(0);
        }
        choices
    }

    fn set_refresh_rate(&mut self, value: u32) {
        if let Some(selection) = self.selection_mut() {
            selection.mode = value;
        }
    }

    fn rotations(&self) -> Choices {
        let mut choices = Choices::new();
        let (output, selection) = match (self.output(), self.selections.get(self.active_output)) {
            (Some(output), Some(selection)) => (output, selection),
            _ => return choices,
        };
        let supported = output.supported_rotations();
        for (rotation, name) in ROTATION_NAMES.iter() {
            if supported.contains(*rotation) {
                let index = choices.push(*name, u32::from(rotation.bits()));
                if *rotation == selection.rotation.orientation() {
                    choices.select(index);
                }
            }
        }
        choices
    }

    fn set_rotation(&mut self, value: u32) {
        if let Some(selection) = self.selection_mut() {
            selection.rotation = selection.rotation.with_orientation(Rotation::from_value(value));
        }
    }

    fn reload(&mut self) -> Result<(), Error> {
        trace!("Reloading screen resources");
        self.resources = self.source.resources()?;
        debug!("resources: {:#?}", self.resources);
        self.reset();
        Ok(())
    }

    fn save(&mut self, scheme: &str, store: &dyn SettingsStore) -> Result<(), Error> {
        let result = self.commit(scheme, store);
        // a failure may come after the server took part of the change
        let reloaded = self.reload();
        result.and(reloaded)
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            geometry::Resolution,
            output::Crtc,
            screen_resources::ModeInfo,
            settings::testing::MemoryStore,
        },
        std::{cell::RefCell, rc::Rc},
    };

    struct FakeResources {
        version: (u32, u32),
        resources: RefCell<ScreenResources>,
        applied: RefCell<Vec<(xrandr::Output, xrandr::Mode, Rotation)>>,
    }

    impl ResourceSource for Rc<FakeResources> {
        fn version(&self) -> Result<(u32, u32), Error> {
            Ok(self.version)
        }

        fn resources(&self) -> Result<ScreenResources, Error> {
            Ok(self.resources.borrow().clone())
        }

        fn apply(
            &self,
            _resources: &ScreenResources,
            output: &Output,
            mode: xrandr::Mode,
            rotation: Rotation,
        ) -> Result<(), Error> {
            self.applied.borrow_mut().push((output.id, mode, rotation));
            for stored in self.resources.borrow_mut().outputs.iter_mut() {
                if stored.id == output.id {
                    if let Some(crtc) = stored.crtc.as_mut() {
                        crtc.mode = mode;
                        crtc.rotation = rotation;
                    }
                }
            }
            Ok(())
        }
    }

    // 65 MHz over 1344x806 is 60 Hz, scaling the clock scales the rate.
    fn mode(id: u32, name: &str, hz: u32) -> ModeInfo {
        ModeInfo {
            id,
            name: name.to_owned(),
            size: Resolution::new(1024, 768),
            dot_clock: 65_000_000 / 60 * hz,
            htotal: 1344,
            vtotal: 806,
            flags: 0,
        }
    }

    fn resources() -> ScreenResources {
        ScreenResources {
            config_timestamp: 1,
            modes: vec![
                mode(1, "1280x1024", 60),
                mode(2, "1280x1024", 75),
                mode(3, "1024x768", 60),
                mode(4, "1024x768", 70),
                mode(5, "800x600", 60),
            ],
            outputs: vec![
                Output {
                    id: 100,
                    name: "VGA-0".to_owned(),
                    connected: false,
                    crtc: None,
                    modes: vec![1, 2, 3],
                },
                Output {
                    id: 101,
                    name: "LVDS1".to_owned(),
                    connected: true,
                    crtc: Some(Crtc {
                        id: 200,
                        mode: 4,
                        rotation: Rotation::ROTATE_0,
                        rotations: Rotation::ROTATE_0 | Rotation::ROTATE_90,
                        x: 0,
                        y: 0,
                    }),
                    modes: vec![1, 3, 4, 5],
                },
                Output {
                    id: 102,
                    name: "HDMI-1".to_owned(),
                    connected: true,
                    crtc: None,
                    modes: vec![3],
                },
            ],
        }
    }

    fn backend() -> (Rc<FakeResources>, RandrBackend<Rc<FakeResources>>) {
        let source = Rc::new(FakeResources {
            version: (1, 3),
            resources: RefCell::new(resources()),
            applied: RefCell::new(Vec::new()),
        });
        let backend = RandrBackend::new(source.clone()).unwrap();
        (source, backend)
    }

    fn names(choices: &Choices) -> Vec<&str> {
        choices.entries.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn old_servers_are_refused() {
        let source = Rc::new(FakeResources {
            version: (1, 1),
            resources: RefCell::new(resources()),
            applied: RefCell::new(Vec::new()),
        });
        assert!(RandrBackend::new(source).is_err());
    }

    #[test]
    fn disconnected_outputs_are_hidden() {
        let (_, backend) = backend();
        let outputs = backend.outputs();
        assert_eq!(
            outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            vec!["Laptop", "HDMI-1"]
        );
        assert_eq!(outputs[0].id, 1);
        assert_eq!(backend.active_output(), 1);
    }

    #[test]
    fn resolutions_are_deduplicated_by_name() {
        let (_, backend) = backend();
        let resolutions = backend.resolutions();
        assert_eq!(names(&resolutions), vec!["1280x1024", "1024x768", "800x600"]);
        assert_eq!(resolutions.active_value(), Some(3));
    }

    #[test]
    fn rates_follow_the_selected_resolution() {
        let (_, backend) = backend();
        let rates = backend.refresh_rates(Some(3));
        assert_eq!(names(&rates), vec!["70 Hz", "60 Hz"]);
        assert_eq!(rates.active_value(), Some(4));

        // mode 2 is not supported by the laptop panel
        let rates = backend.refresh_rates(Some(1));
        assert_eq!(names(&rates), vec!["60 Hz"]);
        assert_eq!(rates.active, Some(0));

        assert!(backend.refresh_rates(None).is_empty());
    }

    #[test]
    fn rotations_come_from_the_crtc() {
        let (_, mut backend) = backend();
        assert_eq!(names(&backend.rotations()), vec!["Normal", "Left"]);

        backend.set_active_output(2);
        assert_eq!(names(&backend.rotations()), vec!["Normal"]);

        backend.set_active_output(0);
        assert_eq!(backend.active_output(), 2);
    }

    #[test]
    fn save_applies_and_persists_listed_outputs() {
        let (source, mut backend) = backend();
        backend.set_refresh_rate(1);
        backend.set_rotation(u32::from(Rotation::ROTATE_90.bits()));

        let store = MemoryStore::default();
        backend.save("Default", &store).unwrap();

        assert_eq!(*source.applied.borrow(), vec![(101, 1, Rotation::ROTATE_90)]);
        assert_eq!(
            store.get("/Default/LVDS1/Resolution"),
            Some(SettingValue::Str("1280x1024".to_owned()))
        );
        assert_eq!(store.get("/Default/LVDS1/RefreshRate"), Some(SettingValue::Int(60)));
        assert_eq!(store.get("/Default/LVDS1/Rotation"), Some(SettingValue::Int(90)));
        assert_eq!(store.get("/Default/HDMI-1/Rotation"), Some(SettingValue::Int(0)));
        assert_eq!(store.get("/Default/VGA-0/Rotation"), None);

        assert_eq!(backend.resolutions().active_value(), Some(1));
    }

    #[test]
    fn failed_save_still_reloads() {
        let (source, mut backend) = backend();
        backend.set_refresh_rate(1);

        let store = MemoryStore {
            unreachable: true,
            ..Default::default()
        };
        assert!(backend.save("Default", &store).is_err());
        assert_eq!(*source.applied.borrow(), vec![(101, 1, Rotation::ROTATE_0)]);

        // the panel runs mode 1 now, and the snapshot says so
        assert_eq!(backend.resources.outputs[1].current_mode(), Some(1));
        assert_eq!(backend.resolutions().active_value(), Some(1));
    }
}
