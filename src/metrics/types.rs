use std::iter::Sum;
use std::ops::{Add, AddAssign};

use rust_decimal::Decimal;
use serde::Serialize;

/// Hours logged and the amount they bill for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub hours: Decimal,
    pub billing: Decimal,
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, other: Totals) -> Totals {
        Totals {
            hours: self.hours + other.hours,
            billing: self.billing + other.billing,
        }
    }
}

impl AddAssign for Totals {
    fn add_assign(&mut self, other: Totals) {
        self.hours += other.hours;
        self.billing += other.billing;
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Totals {
        iter.fold(Totals::default(), Add::add)
    }
}

/// Hours and billing for one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectMetrics {
    pub project_id: String,
    pub project_name: String,
    /// Tasks visited, zero-hour tasks included.
    pub task_count: u64,
    pub hours: Decimal,
    pub billing: Decimal,
}

impl ProjectMetrics {
    pub fn totals(&self) -> Totals {
        Totals {
            hours: self.hours,
            billing: self.billing,
        }
    }
}
