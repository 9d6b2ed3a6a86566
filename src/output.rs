use crate::{
    rotation::Rotation,
};

use {
    xcb::{
        randr as xrandr,
    },
};

/// CRTC currently driving an output.
#[derive(Debug, Clone, PartialEq)]
pub struct Crtc {
    pub id: xrandr::Crtc,
    pub mode: xrandr::Mode,
    pub rotation: Rotation,
    pub rotations: Rotation,
    pub x: i16,
    pub y: i16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub id: xrandr::Output,
    /// Connector name, e.g. `LVDS1`.
    pub name: String,
    pub connected: bool,
    pub crtc: Option<Crtc>,
    pub modes: Vec<xrandr::Mode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStatus {
    None,
    Primary,
    Secondary,
}

impl Output {
    pub fn supports(&self, mode: xrandr::Mode) -> bool {
        self.modes.contains(&mode)
    }

    pub fn current_mode(&self) -> Option<xrandr::Mode> {
        self.crtc.as_ref().map(|crtc| crtc.mode)
    }

    pub fn current_rotation(&self) -> Rotation {
        self.crtc
            .as_ref()
            .map(|crtc| crtc.rotation)
            .unwrap_or(Rotation::ROTATE_0)
    }

    pub fn supported_rotations(&self) -> Rotation {
        self.crtc
            .as_ref()
            .map(|crtc| crtc.rotations)
            .unwrap_or(Rotation::ROTATE_0)
    }
}

/// Disconnected outputs are hidden, the first connected one is primary.
pub fn output_statuses(outputs: &[Output]) -> Vec<OutputStatus> {
    let mut seen_primary = false;
    outputs
        .iter()
        .map(|output| {
            if !output.connected {
                OutputStatus::None
            } else if !seen_primary {
                seen_primary = true;
                OutputStatus::Primary
            } else {
                OutputStatus::Secondary
            }
        })
        .collect()
}

pub fn friendly_name(connector: &str) -> &str {
    if connector.starts_with("LVDS") || connector.starts_with("eDP") || connector == "PANEL" {
        "Laptop"
    } else if connector.starts_with("VGA") || connector.starts_with("Analog") {
        "Monitor"
    } else if connector.starts_with("TV") || connector == "S-video" {
        "Television"
    } else if connector.starts_with("TMDS")
        || connector.starts_with("DVI")
        || connector.starts_with("Digital")
    {
        "Digital display"
    } else {
        connector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(name: &str, connected: bool) -> Output {
        Output {
            id: 0,
            name: name.to_owned(),
            connected,
            crtc: None,
            modes: Vec::new(),
        }
    }

    #[test]
    fn connectors_get_friendly_names() {
        assert_eq!(friendly_name("LVDS1"), "Laptop");
        assert_eq!(friendly_name("eDP-1"), "Laptop");
        assert_eq!(friendly_name("VGA-0"), "Monitor");
        assert_eq!(friendly_name("S-video"), "Television");
        assert_eq!(friendly_name("DVI-I-1"), "Digital display");
        assert_eq!(friendly_name("HDMI-2"), "HDMI-2");
    }

    #[test]
    fn first_connected_output_is_primary() {
        let outputs = vec![
            output("VGA-0", false),
            output("LVDS1", true),
            output("DVI-0", true),
        ];
        assert_eq!(
            output_statuses(&outputs),
            vec![OutputStatus::None, OutputStatus::Primary, OutputStatus::Secondary]
        );
    }

    #[test]
    fn outputs_without_crtc_only_rotate_normal() {
        let output = output("VGA-0", true);
        assert_eq!(output.supported_rotations(), Rotation::ROTATE_0);
        assert_eq!(output.current_mode(), None);
    }
}
