use crate::models::Seat;

/// Seats per row in the bus layout
pub const ROW_WIDTH: usize = 4;

/// Seats grouped into rows of [`ROW_WIDTH`], in the order the API listed them.
/// The last row may be short; it is not padded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatRowCollection {
    rows: Vec<Vec<Seat>>,
}

impl SeatRowCollection {
    pub fn from_seats(seats: Vec<Seat>) -> Self {
        let rows = seats
            .chunks(ROW_WIDTH)
            .map(|row| row.to_vec())
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<Seat>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn seat_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        self.rows.iter().flatten()
    }
}
