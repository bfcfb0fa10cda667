use crate::utils::error::{MarketError, Result};
use std::collections::BTreeSet;
use std::fmt;

/// Rows are lettered `A`..`Z`.
pub const MAX_ROWS: usize = 26;
pub const MAX_COLUMNS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeatId {
    pub row: usize,
    pub col: usize,
}

impl SeatId {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Parses labels like `A1` or `c12`.
    pub fn parse(label: &str) -> Option<Self> {
        let mut chars = label.trim().chars();
        let letter = chars.next()?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return None;
        }
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let col: usize = digits.parse().ok()?;
        if col == 0 {
            return None;
        }
        Some(Self {
            row: (letter as u8 - b'A') as usize,
            col: col - 1,
        })
    }
}

impl fmt::Display for SeatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'A' + self.row as u8) as char, self.col + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatState {
    Available,
    Selected,
    Booked,
}

/// Seat grid for a departure. Rows are lettered, columns start at 1.
/// Oversized grids are clamped to `MAX_ROWS` x `MAX_COLUMNS`.
#[derive(Debug, Clone)]
pub struct SeatMap {
    rows: usize,
    cols: usize,
    max_selection: usize,
    booked: BTreeSet<SeatId>,
    selected: BTreeSet<SeatId>,
}

impl SeatMap {
    pub fn new(rows: usize, cols: usize, max_selection: usize) -> Self {
        Self {
            rows: rows.min(MAX_ROWS),
            cols: cols.min(MAX_COLUMNS),
            max_selection,
            booked: BTreeSet::new(),
            selected: BTreeSet::new(),
        }
    }

    fn check_bounds(&self, seat: SeatId) -> Result<()> {
        if seat.row >= self.rows || seat.col >= self.cols {
            return Err(MarketError::SeatError {
                seat: seat.to_string(),
                message: "outside the seat map".to_string(),
            });
        }
        Ok(())
    }

    pub fn mark_booked(&mut self, seat: SeatId) -> Result<()> {
        self.check_bounds(seat)?;
        self.selected.remove(&seat);
        self.booked.insert(seat);
        Ok(())
    }

    pub fn state(&self, seat: SeatId) -> Result<SeatState> {
        self.check_bounds(seat)?;
        Ok(if self.booked.contains(&seat) {
            SeatState::Booked
        } else if self.selected.contains(&seat) {
            SeatState::Selected
        } else {
            SeatState::Available
        })
    }

    /// Selects a free seat or releases a selected one.
    pub fn toggle(&mut self, seat: SeatId) -> Result<SeatState> {
        match self.state(seat)? {
            SeatState::Booked => Err(MarketError::SeatError {
                seat: seat.to_string(),
                message: "already booked".to_string(),
            }),
            SeatState::Selected => {
                self.selected.remove(&seat);
                Ok(SeatState::Available)
            }
            SeatState::Available => {
                if self.selected.len() >= self.max_selection {
                    return Err(MarketError::SeatError {
                        seat: seat.to_string(),
                        message: format!("at most {} seats per booking", self.max_selection),
                    });
                }
                self.selected.insert(seat);
                Ok(SeatState::Selected)
            }
        }
    }

    /// Selected seat labels in row-major order.
    pub fn selected(&self) -> Vec<String> {
        self.selected.iter().map(SeatId::to_string).collect()
    }

    pub fn available_count(&self) -> usize {
        self.rows
            .saturating_mul(self.cols)
            .saturating_sub(self.booked.len() + self.selected.len())
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(SeatId::new(0, 0).to_string(), "A1");
        assert_eq!(SeatId::new(2, 11).to_string(), "C12");
        assert_eq!(SeatId::parse("c12"), Some(SeatId::new(2, 11)));
        assert_eq!(SeatId::parse("A0"), None);
        assert_eq!(SeatId::parse("11"), None);
        assert_eq!(SeatId::parse("A+1"), None);
        assert_eq!(SeatId::parse("A-1"), None);
        assert_eq!(SeatId::parse("A 1"), None);
        assert_eq!(SeatId::parse("A"), None);
    }

    #[test]
    fn test_oversized_grid_is_clamped() {
        let mut map = SeatMap::new(usize::MAX, usize::MAX, 1);
        assert_eq!(map.available_count(), MAX_ROWS * MAX_COLUMNS);
        assert!(map.toggle(SeatId::new(0, MAX_COLUMNS)).is_err());
        map.toggle(SeatId::new(MAX_ROWS - 1, MAX_COLUMNS - 1)).unwrap();
        assert_eq!(map.selected(), vec!["Z100"]);

        assert_eq!(SeatMap::new(2, usize::MAX, 1).available_count(), 2 * MAX_COLUMNS);
    }

    #[test]
    fn test_toggle_select_and_release() {
        let mut map = SeatMap::new(3, 4, 2);
        assert_eq!(map.toggle(SeatId::new(1, 1)).unwrap(), SeatState::Selected);
        assert_eq!(map.toggle(SeatId::new(0, 3)).unwrap(), SeatState::Selected);
        assert_eq!(map.selected(), vec!["A4", "B2"]);
        assert_eq!(map.available_count(), 10);

        assert_eq!(map.toggle(SeatId::new(1, 1)).unwrap(), SeatState::Available);
        assert_eq!(map.selected(), vec!["A4"]);
    }

    #[test]
    fn test_selection_limit_and_booked_seats() {
        let mut map = SeatMap::new(2, 2, 1);
        map.mark_booked(SeatId::new(0, 0)).unwrap();
        assert!(map.toggle(SeatId::new(0, 0)).is_err());

        map.toggle(SeatId::new(0, 1)).unwrap();
        assert!(map.toggle(SeatId::new(1, 0)).is_err());
        assert!(map.toggle(SeatId::new(5, 0)).is_err());

        map.clear_selection();
        assert_eq!(map.available_count(), 3);
    }
}
