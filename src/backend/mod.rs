pub mod legacy;
#[cfg(any(test, feature = "randr-1-2"))]
pub mod randr;

use anyhow::Error;

use crate::{
    choices::Choices,
    settings::SettingsStore,
};

pub const OUTPUT_ICON_NAME: &str = "video-display";

/// A row of the outputs list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub name: String,
    pub icon_name: &'static str,
    pub id: usize,
}

/// Display state the dialog edits. Setters only touch the pending
/// selection, nothing reaches the server before `save`.
pub trait Backend {
    fn outputs(&self) -> Vec<OutputRow>;
    fn active_output(&self) -> usize;
    fn set_active_output(&mut self, id: usize);

    fn resolutions(&self) -> Choices;
    fn set_resolution(&mut self, value: u32);

    /// Rates for the resolution currently selected in the dialog.
    fn refresh_rates(&self, resolution: Option<u32>) -> Choices;
    fn set_refresh_rate(&mut self, value: u32);

    fn rotations(&self) -> Choices;
    fn set_rotation(&mut self, value: u32);

    fn reload(&mut self) -> Result<(), Error>;

    /// Applies the pending selection and stores it under `scheme`.
    fn save(&mut self, scheme: &str, store: &dyn SettingsStore) -> Result<(), Error>;
}
