use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Program {
    OpenEnrollment,
    Private,
    Corporate,
    Institutional,
}

impl Program {
    pub fn label(self) -> &'static str {
        match self {
            Program::OpenEnrollment => "Open Enrollment",
            Program::Private => "Private",
            Program::Corporate => "Corporate",
            Program::Institutional => "Institutional",
        }
    }
}

/// Classes that can be placed on the on-site schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassType {
    OpenEnrollment,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub room: String,
    pub day_pattern: String,
    pub time_slot: usize,
}

impl SlotKey {
    pub fn new(room: impl Into<String>, day_pattern: impl Into<String>, time_slot: usize) -> Self {
        Self {
            room: room.into(),
            day_pattern: day_pattern.into(),
            time_slot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAssignment {
    pub class_type: ClassType,
    pub student_count: u32,
}

/// Flat form of one occupied grid cell, used for CSV and JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridEntry {
    pub room: String,
    pub day_pattern: String,
    pub time_slot: usize,
    pub class_type: ClassType,
    pub student_count: u32,
}

/// Sparse map of on-site class assignments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<GridEntry>", into = "Vec<GridEntry>")]
pub struct ScheduleGrid {
    cells: BTreeMap<SlotKey, ClassAssignment>,
}

impl ScheduleGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SlotKey) -> Option<&ClassAssignment> {
        self.cells.get(key)
    }

    pub fn assign(&mut self, key: SlotKey, class_type: ClassType, student_count: u32) {
        self.cells.insert(
            key,
            ClassAssignment {
                class_type,
                student_count,
            },
        );
    }

    pub fn remove(&mut self, key: &SlotKey) -> Option<ClassAssignment> {
        self.cells.remove(key)
    }

    /// Changes a cell's head count by `delta`, keeping it within `1..=max`.
    /// Returns the new count, or `None` if the cell is empty.
    pub fn adjust(&mut self, key: &SlotKey, delta: i32, max: u32) -> Option<u32> {
        let cell = self.cells.get_mut(key)?;
        let next = (i64::from(cell.student_count) + i64::from(delta))
            .clamp(1, i64::from(max.max(1)));
        cell.student_count = next as u32;
        Some(cell.student_count)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &ClassAssignment)> {
        self.cells.iter()
    }

    pub fn total_students(&self) -> u32 {
        self.cells.values().map(|cell| cell.student_count).sum()
    }
}

impl From<Vec<GridEntry>> for ScheduleGrid {
    fn from(entries: Vec<GridEntry>) -> Self {
        entries.into_iter().collect()
    }
}

impl FromIterator<GridEntry> for ScheduleGrid {
    fn from_iter<I: IntoIterator<Item = GridEntry>>(iter: I) -> Self {
        let mut grid = ScheduleGrid::new();
        for entry in iter {
            grid.assign(
                SlotKey::new(entry.room, entry.day_pattern, entry.time_slot),
                entry.class_type,
                entry.student_count,
            );
        }
        grid
    }
}

impl From<ScheduleGrid> for Vec<GridEntry> {
    fn from(grid: ScheduleGrid) -> Self {
        grid.cells
            .into_iter()
            .map(|(key, cell)| GridEntry {
                room: key.room,
                day_pattern: key.day_pattern,
                time_slot: key.time_slot,
                class_type: cell.class_type,
                student_count: cell.student_count,
            })
            .collect()
    }
}

/// User-entered volumes for one scenario.
///
/// Values arrive from editable fields and are not trusted; the engine works
/// on [`ScenarioInputs::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioInputs {
    /// Only read when no schedule grid is supplied.
    pub oe_classes: f64,
    pub oe_students_per_class: f64,
    pub oe_hours_per_week: f64,

    /// Private lessons entered by hand, on top of any scheduled ones.
    pub private_students: f64,
    pub private_hours_per_student: f64,

    pub corp_groups: f64,
    pub corp_participants_per_group: f64,
    pub corp_hours_per_month: f64,

    pub inst_groups: f64,
    pub inst_participants_per_group: f64,
    pub inst_hours_per_month: f64,

    pub salary_mix_percent: f64,
}

impl Default for ScenarioInputs {
    fn default() -> Self {
        Self {
            oe_classes: 10.0,
            oe_students_per_class: 8.0,
            oe_hours_per_week: 6.0,
            private_students: 9.0,
            private_hours_per_student: 6.0,
            corp_groups: 4.0,
            corp_participants_per_group: 4.0,
            corp_hours_per_month: 8.0,
            inst_groups: 2.0,
            inst_participants_per_group: 6.0,
            inst_hours_per_month: 6.0,
            salary_mix_percent: 0.0,
        }
    }
}

macro_rules! with_field {
    ($($method:ident => $field:ident),+ $(,)?) => {
        $(
            pub fn $method(self, value: f64) -> Self {
                Self { $field: value, ..self }
            }
        )+
    };
}

impl ScenarioInputs {
    /// A scenario with every volume at zero.
    pub fn empty() -> Self {
        Self {
            oe_classes: 0.0,
            oe_students_per_class: 0.0,
            oe_hours_per_week: 0.0,
            private_students: 0.0,
            private_hours_per_student: 0.0,
            corp_groups: 0.0,
            corp_participants_per_group: 0.0,
            corp_hours_per_month: 0.0,
            inst_groups: 0.0,
            inst_participants_per_group: 0.0,
            inst_hours_per_month: 0.0,
            salary_mix_percent: 0.0,
        }
    }

    /// The stock growth target: more and fuller open enrollment classes and
    /// a few more private students.
    pub fn default_goal() -> Self {
        Self::default()
            .with_oe_classes(15.0)
            .with_oe_students_per_class(10.0)
            .with_private_students(12.0)
    }

    with_field! {
        with_oe_classes => oe_classes,
        with_oe_students_per_class => oe_students_per_class,
        with_oe_hours_per_week => oe_hours_per_week,
        with_private_students => private_students,
        with_private_hours_per_student => private_hours_per_student,
        with_corp_groups => corp_groups,
        with_corp_participants_per_group => corp_participants_per_group,
        with_corp_hours_per_month => corp_hours_per_month,
        with_inst_groups => inst_groups,
        with_inst_participants_per_group => inst_participants_per_group,
        with_inst_hours_per_month => inst_hours_per_month,
        with_salary_mix_percent => salary_mix_percent,
    }

    /// Clamps every field: non-finite or negative becomes 0, volumes are held
    /// to [`MAX_VOLUME`] and the salary mix is held to `0..=100`.
    pub fn normalized(&self) -> Self {
        Self {
            oe_classes: volume(self.oe_classes),
            oe_students_per_class: volume(self.oe_students_per_class),
            oe_hours_per_week: volume(self.oe_hours_per_week),
            private_students: volume(self.private_students),
            private_hours_per_student: volume(self.private_hours_per_student),
            corp_groups: volume(self.corp_groups),
            corp_participants_per_group: volume(self.corp_participants_per_group),
            corp_hours_per_month: volume(self.corp_hours_per_month),
            inst_groups: volume(self.inst_groups),
            inst_participants_per_group: volume(self.inst_participants_per_group),
            inst_hours_per_month: volume(self.inst_hours_per_month),
            salary_mix_percent: non_negative(self.salary_mix_percent).min(100.0),
        }
    }
}

/// Largest value any scenario volume may take. Products of two capped volumes
/// and a rate stay far from `f64::MAX`.
pub const MAX_VOLUME: f64 = 1e9;

fn volume(value: f64) -> f64 {
    non_negative(value).min(MAX_VOLUME)
}

pub fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Running sums for one program before rent and overhead are applied.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgramTotals {
    pub revenue: f64,
    pub teacher_cost: f64,
    pub hours: f64,
    pub students: f64,
}

impl ProgramTotals {
    pub fn add(&mut self, other: &ProgramTotals) {
        self.revenue += other.revenue;
        self.teacher_cost += other.teacher_cost;
        self.hours += other.hours;
        self.students += other.students;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OpenEnrollmentTotals {
    pub totals: ProgramTotals,
    pub class_count: u32,
    pub avg_students: f64,
    /// Tier implied by `avg_students`, for display only.
    pub seat_tier: u32,
}

/// Per-program line of a computed scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramResult {
    pub program: Program,
    pub revenue: f64,
    /// Base teacher pay; the salary surcharge is carried in [`CostBreakdown`].
    pub teacher_cost: f64,
    pub rent_share: f64,
    pub profit: f64,
    pub margin: f64,
    pub hours: f64,
    pub students: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenEnrollmentResult {
    #[serde(flatten)]
    pub base: ProgramResult,
    pub class_count: u32,
    pub avg_students: f64,
    pub seat_tier: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostLine {
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub teacher: f64,
    pub salary_surcharge: f64,
    pub overhead: Vec<CostLine>,
    pub total_overhead: f64,
    pub rent: f64,
    pub fixed: Vec<CostLine>,
    pub total: f64,
}

/// Everything derived from one scenario. Always rebuilt from inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Results {
    pub open_enrollment: OpenEnrollmentResult,
    pub private: ProgramResult,
    pub corporate: ProgramResult,
    pub institutional: ProgramResult,
    pub costs: CostBreakdown,

    pub total_revenue: f64,
    pub total_costs: f64,
    pub net_profit: f64,
    pub profit_margin: f64,

    pub total_students: f64,
    pub total_instruction_hours: f64,
    pub capacity_utilization: f64,

    pub revenue_per_student: f64,
    pub cost_per_student: f64,
    pub profit_per_student: f64,
}

impl Results {
    pub fn programs(&self) -> [&ProgramResult; 4] {
        [
            &self.open_enrollment.base,
            &self.private,
            &self.corporate,
            &self.institutional,
        ]
    }
}

/// Goal minus current for each headline metric.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    pub revenue_diff: f64,
    pub cost_diff: f64,
    pub profit_diff: f64,
    pub margin_diff: f64,
    pub student_diff: f64,
    pub hours_diff: f64,
    pub profit_per_student_diff: f64,
    pub revenue_growth_pct: f64,
    pub profit_growth_pct: f64,
}
