use {
    euclid::*,
};

pub struct ScreenSpace;
pub type Resolution = Size2D<u16, ScreenSpace>;

pub fn resolution_name(size: &Resolution) -> String {
    format!("{}x{}", size.width, size.height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_width_by_height() {
        assert_eq!(resolution_name(&Resolution::new(1280, 1024)), "1280x1024");
    }
}
