/// One dropdown row: the label shown to the user and the value written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub name: String,
    pub value: u32,
}

/// Rows of a dropdown plus the row that should be selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Choices {
    pub entries: Vec<Choice>,
    pub active: Option<usize>,
}

impl Choices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: u32) -> usize {
        self.entries.push(Choice {
            name: name.into(),
            value,
        });
        self.entries.len() - 1
    }

    pub fn prepend(&mut self, name: impl Into<String>, value: u32) {
        self.entries.insert(
            0,
            Choice {
                name: name.into(),
                value,
            },
        );
        self.active = self.active.map(|index| index + 1);
    }

    pub fn select(&mut self, index: usize) {
        if index < self.entries.len() {
            self.active = Some(index);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
impl Choices {
    pub fn active_value(&self) -> Option<u32> {
        self.active
            .and_then(|index| self.entries.get(index))
            .map(|choice| choice.value)
    }
}

pub fn rate_name(rate: u32) -> String {
    format!("{} Hz", rate)
}

/// Index of the rate nearest to `current`. The earliest one wins a tie.
pub fn closest_rate(rates: &[u16], current: u16) -> Option<usize> {
    let mut closest: Option<(usize, u16)> = None;
    for (index, rate) in rates.iter().enumerate() {
        let diff = if *rate > current {
            rate - current
        } else {
            current - rate
        };
        match closest {
            Some((_, best)) if best <= diff => {}
            _ => closest = Some((index, diff)),
        }
    }
    closest.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_rate_picks_minimum_difference() {
        assert_eq!(closest_rate(&[50, 60, 75], 72), Some(2));
        assert_eq!(closest_rate(&[50, 60, 75], 61), Some(1));
        assert_eq!(closest_rate(&[60], 85), Some(0));
    }

    #[test]
    fn closest_rate_keeps_first_on_tie() {
        assert_eq!(closest_rate(&[70, 80], 75), Some(0));
    }

    #[test]
    fn closest_rate_of_nothing() {
        assert_eq!(closest_rate(&[], 60), None);
    }

    #[test]
    fn prepend_keeps_selection_on_same_row() {
        let mut choices = Choices::new();
        choices.push("a", 1);
        choices.select(0);
        choices.prepend("b", 2);
        assert_eq!(choices.active, Some(1));
        assert_eq!(choices.active_value(), Some(1));
    }

    #[test]
    fn selection_must_reference_a_row() {
        let mut choices = Choices::new();
        choices.push("a", 1);
        choices.select(3);
        assert_eq!(choices.active, None);
        choices.select(0);
        assert_eq!(choices.active_value(), Some(1));
    }
}
