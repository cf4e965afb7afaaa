use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Smallest class size the open enrollment curve prices.
pub const MIN_SEATS: u32 = 6;
/// Largest class size the open enrollment curve prices.
pub const MAX_SEATS: u32 = 15;

/// Revenue and teacher cost for one hour of instruction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct HourlyRate {
    pub revenue_per_hour: f64,
    pub teacher_cost_per_hour: f64,
}

impl HourlyRate {
    pub const fn new(revenue_per_hour: f64, teacher_cost_per_hour: f64) -> Self {
        Self {
            revenue_per_hour,
            teacher_cost_per_hour,
        }
    }
}

/// A fixed monthly expense that does not scale with activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedCost {
    pub name: String,
    pub amount: f64,
}

/// Share of historical total expenses attributed to one overhead category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverheadRatio {
    pub name: String,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
    pub max_capacity: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub label: String,
    pub hours_per_session: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPattern {
    pub id: String,
    pub label: String,
    pub days_per_week: u32,
}

/// One bookable (room, day pattern, time slot) combination.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    pub room: &'a Room,
    pub day_pattern: &'a DayPattern,
    pub slot_index: usize,
    pub time_slot: &'a TimeSlot,
}

/// The facility: rooms, daily time slots and the weekly day patterns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    pub rooms: Vec<Room>,
    pub time_slots: Vec<TimeSlot>,
    pub day_patterns: Vec<DayPattern>,
}

impl Topology {
    pub fn total_weekly_slots(&self) -> usize {
        self.rooms.len() * self.time_slots.len() * self.day_patterns.len()
    }

    /// Seats available per week if every slot of every room ran full.
    pub fn weekly_seat_capacity(&self) -> u32 {
        let per_room_slots = (self.time_slots.len() * self.day_patterns.len()) as u32;
        self.rooms.iter().map(|room| room.max_capacity).sum::<u32>() * per_room_slots
    }

    pub fn largest_room(&self) -> u32 {
        self.rooms.iter().map(|room| room.max_capacity).max().unwrap_or(0)
    }

    /// Average weekly teaching hours of one cell across time slots and day
    /// patterns.
    pub fn mean_cell_weekly_hours(&self) -> f64 {
        let cells = self.time_slots.len() * self.day_patterns.len();
        if cells == 0 {
            return 0.0;
        }
        let total: f64 = self
            .day_patterns
            .iter()
            .flat_map(|pattern| {
                self.time_slots
                    .iter()
                    .map(move |slot| f64::from(pattern.days_per_week) * slot.hours_per_session)
            })
            .sum();
        total / cells as f64
    }

    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    pub fn day_pattern(&self, id: &str) -> Option<&DayPattern> {
        self.day_patterns.iter().find(|pattern| pattern.id == id)
    }

    /// Every cell in room, day pattern, time slot order.
    pub fn cells(&self) -> impl Iterator<Item = Cell<'_>> + '_ {
        self.rooms.iter().flat_map(move |room| {
            self.day_patterns.iter().flat_map(move |day_pattern| {
                self.time_slots
                    .iter()
                    .enumerate()
                    .map(move |(slot_index, time_slot)| Cell {
                        room,
                        day_pattern,
                        slot_index,
                        time_slot,
                    })
            })
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms.is_empty() {
            return Err(ConfigError::EmptyTopology("rooms"));
        }
        if self.time_slots.is_empty() {
            return Err(ConfigError::EmptyTopology("time slots"));
        }
        if self.day_patterns.is_empty() {
            return Err(ConfigError::EmptyTopology("day patterns"));
        }

        let mut seen = HashSet::new();
        for room in &self.rooms {
            if !seen.insert(room.id.as_str()) {
                return Err(ConfigError::DuplicateRoom(room.id.clone()));
            }
        }

        let mut seen = HashSet::new();
        for pattern in &self.day_patterns {
            if !seen.insert(pattern.id.as_str()) {
                return Err(ConfigError::DuplicateDayPattern(pattern.id.clone()));
            }
        }

        for slot in &self.time_slots {
            check_amount(&format!("time slot `{}` hours", slot.label), slot.hours_per_session)?;
        }

        Ok(())
    }
}

impl Default for Topology {
    fn default() -> Self {
        let room = |id: &str, name: &str, max_capacity| Room {
            id: id.to_string(),
            name: name.to_string(),
            max_capacity,
        };
        let slot = |label: &str, hours_per_session| TimeSlot {
            label: label.to_string(),
            hours_per_session,
        };
        let pattern = |id: &str, label: &str, days_per_week| DayPattern {
            id: id.to_string(),
            label: label.to_string(),
            days_per_week,
        };

        Self {
            rooms: vec![
                room("small1", "Small 1", 8),
                room("small2", "Small 2", 8),
                room("large1", "Large 1", 12),
                room("large2", "Large 2", 12),
                room("conference", "Conference", 15),
            ],
            time_slots: vec![
                slot("9:00-11:00", 2.0),
                slot("12:00-14:15", 2.25),
                slot("16:00-18:15", 2.25),
                slot("18:30-20:45", 2.25),
            ],
            day_patterns: vec![
                pattern("mon-wed", "Mon/Wed", 2),
                pattern("tue-thu", "Tue/Thu", 2),
            ],
        }
    }
}

/// Every pricing and cost constant the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub corporate: HourlyRate,
    pub institutional: HourlyRate,
    pub private: HourlyRate,
    /// Open enrollment pricing keyed by seat count.
    pub open_enrollment: BTreeMap<u32, HourlyRate>,
    pub monthly_rent: f64,
    pub fixed_costs: Vec<FixedCost>,
    pub overhead: Vec<OverheadRatio>,
    /// Fraction of historical total expenses made up of teacher pay and rent.
    pub direct_cost_share: f64,
    pub salary_surcharge_rate: f64,
    pub weeks_per_month: f64,
    pub topology: Topology,
}

impl Default for RateTable {
    fn default() -> Self {
        let open_enrollment = [
            (6, 27.78),
            (7, 32.41),
            (8, 37.04),
            (9, 41.67),
            (10, 46.30),
            (11, 50.93),
            (12, 55.56),
            (13, 60.19),
            (14, 64.82),
            (15, 69.45),
        ]
        .into_iter()
        .map(|(seats, revenue)| (seats, HourlyRate::new(revenue, 11.20)))
        .collect();

        Self {
            corporate: HourlyRate::new(34.92, 15.15),
            institutional: HourlyRate::new(34.62, 20.16),
            private: HourlyRate::new(30.00, 14.73),
            open_enrollment,
            monthly_rent: 3400.0,
            fixed_costs: vec![
                FixedCost {
                    name: "Admin".to_string(),
                    amount: 500.0,
                },
                FixedCost {
                    name: "Other".to_string(),
                    amount: 1200.0,
                },
            ],
            overhead: vec![
                OverheadRatio {
                    name: "Indirect costs".to_string(),
                    ratio: 0.119,
                },
                OverheadRatio {
                    name: "Fringe benefits".to_string(),
                    ratio: 0.053,
                },
                // telephone 1.5%, email/internet 0.6%, advertising 1.2%
                OverheadRatio {
                    name: "Other fixed".to_string(),
                    ratio: 0.033,
                },
            ],
            direct_cost_share: 0.65,
            salary_surcharge_rate: 0.40,
            weeks_per_month: 4.33,
            topology: Topology::default(),
        }
    }
}

impl RateTable {
    /// Looks up the open enrollment tier for a class size.
    ///
    /// The count is rounded and clamped into `MIN_SEATS..=MAX_SEATS`, so a
    /// half-typed 0 or an oversized class prices at the nearest defined tier.
    pub fn rate_for_seats(&self, count: f64) -> HourlyRate {
        let seats = seat_tier(count);
        self.open_enrollment
            .range(..=seats)
            .next_back()
            .or_else(|| self.open_enrollment.iter().next())
            .map(|(_, rate)| *rate)
            .unwrap_or_default()
    }

    /// Converts a per-week quantity into a per-month one.
    pub fn monthly(&self, weekly: f64) -> f64 {
        weekly * self.weeks_per_month
    }

    pub fn fixed_cost_total(&self) -> f64 {
        self.fixed_costs.iter().map(|cost| cost.amount).sum()
    }

    /// Overhead amount per dollar of direct cost, summed over every category.
    pub fn overhead_multiplier(&self) -> f64 {
        self.overhead
            .iter()
            .map(|overhead| overhead.ratio / self.direct_cost_share)
            .sum()
    }

    pub fn surcharge_multiplier(&self, salary_mix_percent: f64) -> f64 {
        1.0 + (salary_mix_percent / 100.0) * self.salary_surcharge_rate
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("corporate", &self.corporate)?;
        check_rate("institutional", &self.institutional)?;
        check_rate("private", &self.private)?;

        let flat_cost = self
            .open_enrollment
            .get(&MIN_SEATS)
            .ok_or(ConfigError::MissingSeatTier(MIN_SEATS))?
            .teacher_cost_per_hour;
        let mut previous: Option<(u32, f64)> = None;
        for seats in MIN_SEATS..=MAX_SEATS {
            let rate = self
                .open_enrollment
                .get(&seats)
                .ok_or(ConfigError::MissingSeatTier(seats))?;
            check_rate(&format!("{seats}-seat open enrollment"), rate)?;

            if rate.teacher_cost_per_hour != flat_cost {
                return Err(ConfigError::UnevenTeacherCost {
                    seats,
                    found: rate.teacher_cost_per_hour,
                    expected: flat_cost,
                });
            }
            if let Some((lower, lower_rate)) = previous {
                if rate.revenue_per_hour <= lower_rate {
                    return Err(ConfigError::NonIncreasingRevenue {
                        lower,
                        lower_rate,
                        upper: seats,
                        upper_rate: rate.revenue_per_hour,
                    });
                }
            }
            previous = Some((seats, rate.revenue_per_hour));
        }

        check_amount("monthly rent", self.monthly_rent)?;
        for cost in &self.fixed_costs {
            check_amount(&format!("fixed cost `{}`", cost.name), cost.amount)?;
        }
        for overhead in &self.overhead {
            check_amount(&format!("overhead ratio `{}`", overhead.name), overhead.ratio)?;
        }
        check_amount("salary surcharge rate", self.salary_surcharge_rate)?;
        check_positive("direct cost share", self.direct_cost_share)?;
        check_positive("weeks per month", self.weeks_per_month)?;

        self.topology.validate()
    }
}

/// Rounds a class size and clamps it into the priced range.
pub fn seat_tier(count: f64) -> u32 {
    if !count.is_finite() {
        return MIN_SEATS;
    }
    count.round().clamp(MIN_SEATS as f64, MAX_SEATS as f64) as u32
}

fn check_rate(label: &str, rate: &HourlyRate) -> Result<(), ConfigError> {
    check_amount(&format!("{label} revenue per hour"), rate.revenue_per_hour)?;
    check_amount(&format!("{label} teacher cost per hour"), rate.teacher_cost_per_hour)
}

fn check_amount(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidAmount {
            field: field.to_string(),
            value,
        })
    }
}

fn check_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field: field.to_string(),
            value,
        })
    }
}
