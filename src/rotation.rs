use bitflags::bitflags;

bitflags! {
    /// RandR rotation and reflection mask, bit-compatible with the protocol.
    pub struct Rotation: u16 {
        const ROTATE_0   = 1 << 0;
        const ROTATE_90  = 1 << 1;
        const ROTATE_180 = 1 << 2;
        const ROTATE_270 = 1 << 3;
        const REFLECT_X  = 1 << 4;
        const REFLECT_Y  = 1 << 5;

        const ROTATIONS = Self::ROTATE_0.bits
            | Self::ROTATE_90.bits
            | Self::ROTATE_180.bits
            | Self::ROTATE_270.bits;
    }
}

pub const ROTATION_NAMES: [(Rotation, &str); 4] = [
    (Rotation::ROTATE_0, "Normal"),
    (Rotation::ROTATE_90, "Left"),
    (Rotation::ROTATE_180, "Inverted"),
    (Rotation::ROTATE_270, "Right"),
];

impl Rotation {
    pub fn from_value(value: u32) -> Rotation {
        Rotation::from_bits_truncate(value as u16)
    }

    /// Only the rotation bits, reflections dropped.
    pub fn orientation(self) -> Rotation {
        self & Rotation::ROTATIONS
    }

    /// Replaces the rotation bits and keeps any reflection.
    pub fn with_orientation(self, orientation: Rotation) -> Rotation {
        (self - Rotation::ROTATIONS) | orientation.orientation()
    }

    pub fn degrees(self) -> i32 {
        let orientation = self.orientation();
        if orientation.contains(Rotation::ROTATE_90) {
            90
        } else if orientation.contains(Rotation::ROTATE_180) {
            180
        } else if orientation.contains(Rotation::ROTATE_270) {
            270
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degrees_ignore_reflection() {
        assert_eq!(Rotation::ROTATE_0.degrees(), 0);
        assert_eq!((Rotation::ROTATE_270 | Rotation::REFLECT_X).degrees(), 270);
        assert_eq!(Rotation::ROTATE_180.degrees(), 180);
    }

    #[test]
    fn orientation_swap_keeps_reflection() {
        let current = Rotation::ROTATE_0 | Rotation::REFLECT_Y;
        let rotated = current.with_orientation(Rotation::ROTATE_90);
        assert_eq!(rotated, Rotation::ROTATE_90 | Rotation::REFLECT_Y);
        assert_eq!(rotated.orientation(), Rotation::ROTATE_90);
    }

    #[test]
    fn unknown_bits_are_dropped() {
        assert_eq!(Rotation::from_value(0x102), Rotation::ROTATE_90);
    }
}
