use crate::{
    geometry::Resolution,
    output::Output,
};

use {
    xcb::{
        randr as xrandr,
        xproto,
    },
};

const MODE_FLAG_INTERLACE: u32 = 1 << 4;
const MODE_FLAG_DOUBLE_SCAN: u32 = 1 << 5;

#[derive(Debug, Clone, PartialEq)]
pub struct ModeInfo {
    pub id: xrandr::Mode,
    pub name: String,
    pub size: Resolution,
    pub dot_clock: u32,
    pub htotal: u16,
    pub vtotal: u16,
    pub flags: u32,
}

impl ModeInfo {
    pub fn refresh_rate(&self) -> f64 {
        let mut vtotal = u32::from(self.vtotal);
        if self.flags & MODE_FLAG_DOUBLE_SCAN != 0 {
            vtotal *= 2;
        }
        if self.flags & MODE_FLAG_INTERLACE != 0 {
            vtotal /= 2;
        }

        if self.htotal > 0 && vtotal > 0 {
            f64::from(self.dot_clock) / (f64::from(self.htotal) * f64::from(vtotal))
        } else {
            0.0
        }
    }
}

/// Modes and outputs of the screen as of `config_timestamp`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenResources {
    pub config_timestamp: xproto::Timestamp,
    pub modes: Vec<ModeInfo>,
    pub outputs: Vec<Output>,
}

impl ScreenResources {
    pub fn mode(&self, id: xrandr::Mode) -> Option<&ModeInfo> {
        self.modes.iter().find(|mode| mode.id == id)
    }

    /// Splits the packed mode names of a resources reply.
    pub fn modes_from_reply(reply: &xrandr::GetScreenResourcesCurrentReply) -> Vec<ModeInfo> {
        let names = reply.names();
        let mut offset = 0;
        let mut modes = Vec::new();
        for mode in reply.modes().into_iter() {
            let len = mode.name_len() as usize;
            let name = match names.get(offset..offset + len) {
                Some(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                None => String::new(),
            };
            offset += len;

            modes.push(ModeInfo {
                id: mode.id(),
                name,
                size: Resolution::new(mode.width(), mode.height()),
                dot_clock: mode.dot_clock(),
                htotal: mode.htotal(),
                vtotal: mode.vtotal(),
                flags: mode.mode_flags(),
            });
        }
        modes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mode(flags: u32) -> ModeInfo {
        ModeInfo {
            id: 1,
            name: "1024x768".to_owned(),
            size: Resolution::new(1024, 768),
            dot_clock: 65_000_000,
            htotal: 1344,
            vtotal: 806,
            flags,
        }
    }

    #[test]
    fn refresh_rate_from_timings() {
        assert_eq!(mode(0).refresh_rate() as i32, 60);
    }

    #[test]
    fn interlaced_modes_refresh_twice_as_often() {
        assert_eq!(mode(MODE_FLAG_INTERLACE).refresh_rate() as i32, 120);
        assert_eq!(mode(MODE_FLAG_DOUBLE_SCAN).refresh_rate() as i32, 30);
    }

    #[test]
    fn zero_totals_do_not_divide() {
        let mut broken = mode(0);
        broken.htotal = 0;
        assert_eq!(broken.refresh_rate(), 0.0);
    }
}
