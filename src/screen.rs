use crate::{
    geometry::Resolution,
    rotation::Rotation,
};

use {
    xcb::{
        randr as xrandr,
        xproto,
    },
};

/// One X screen as reported by RRGetScreenInfo.
#[derive(Debug, Clone, PartialEq)]
pub struct Screen {
    pub root: xproto::Window,
    pub config_timestamp: xproto::Timestamp,
    pub sizes: Vec<Resolution>,
    /// Refresh rates, indexed like `sizes`. Empty on RandR 1.0 servers.
    pub rates: Vec<Vec<u16>>,
    pub rotations: Rotation,
    pub size_index: usize,
    pub rate: u16,
    pub rotation: Rotation,
}

impl Screen {
    pub fn from_reply(root: xproto::Window, reply: &xrandr::GetScreenInfoReply) -> Screen {
        let sizes = reply
            .sizes()
            .into_iter()
            .map(|size| Resolution::new(size.width(), size.height()))
            .collect();
        let rates = reply
            .rates()
            .into_iter()
            .map(|rates| rates.rates().to_vec())
            .collect();

        Screen {
            root,
            config_timestamp: reply.config_timestamp(),
            sizes,
            rates,
            rotations: Rotation::from_bits_truncate(reply.rotations() as u16),
            size_index: reply.size_i_d() as usize,
            rate: reply.rate(),
            rotation: Rotation::from_bits_truncate(reply.rotation() as u16),
        }
    }

    pub fn rates_for(&self, size_index: usize) -> &[u16] {
        self.rates
            .get(size_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
