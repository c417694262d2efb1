use serde::{Deserialize, Serialize};

use crate::chart::ChartError;
use crate::limits::MAX_DAY_COUNT;
use crate::model::{add_days, days_between, Day};

/// Where a date falls relative to the visible window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Before,
    Inside(u32),
    After,
}

/// Navigation granularity. Only the paging step changes; the column count stays fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewScale {
    #[default]
    Day,
    Week,
    Month,
    Year,
}

impl ViewScale {
    pub fn page_step(self) -> i64 {
        match self {
            ViewScale::Day => 7,
            ViewScale::Week => 14,
            ViewScale::Month => 30,
            ViewScale::Year => 90,
        }
    }
}

/// A fixed-width run of `day_count` calendar days starting at `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimelineWindow {
    start: Day,
    day_count: u32,
}

impl TimelineWindow {
    pub fn new(start: Day, day_count: u32) -> Result<Self, ChartError> {
        if day_count == 0 || day_count > MAX_DAY_COUNT {
            return Err(ChartError::InvalidWindow(day_count));
        }
        Ok(Self { start, day_count })
    }

    pub fn start(&self) -> Day {
        self.start
    }

    pub fn day_count(&self) -> u32 {
        self.day_count
    }

    /// Exclusive end date.
    pub fn end(&self) -> Day {
        add_days(self.start, self.day_count as i64)
    }

    /// Signed day offset of `date` from column 0, unclamped.
    pub fn offset_of(&self, date: Day) -> i64 {
        days_between(self.start, date)
    }

    pub fn column_of(&self, date: Day) -> Column {
        let offset = self.offset_of(date);
        if offset < 0 {
            Column::Before
        } else if offset >= self.day_count as i64 {
            Column::After
        } else {
            Column::Inside(offset as u32)
        }
    }

    pub fn contains(&self, date: Day) -> bool {
        matches!(self.column_of(date), Column::Inside(_))
    }

    /// Date at a column boundary. `column == day_count` yields the exclusive end.
    pub fn date_at(&self, column: u32) -> Day {
        add_days(self.start, column as i64)
    }

    /// Snap a fractional pointer position (in columns) to the nearest boundary.
    pub fn nearest_column(&self, pointer: f64) -> u32 {
        if pointer.is_nan() {
            return 0;
        }
        pointer.round().clamp(0.0, self.day_count as f64) as u32
    }

    pub fn shift(&self, delta_days: i64) -> Self {
        Self {
            start: add_days(self.start, delta_days),
            day_count: self.day_count,
        }
    }

    pub fn anchor_to(&self, date: Day) -> Self {
        Self {
            start: date,
            day_count: self.day_count,
        }
    }

    pub fn dates(&self) -> impl Iterator<Item = Day> + use<> {
        let window = *self;
        (0..window.day_count).map(move |c| window.date_at(c))
    }
}
