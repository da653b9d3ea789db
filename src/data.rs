use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// Type aliases for clarity
pub type Minutes = u32;
pub type Weekday = u8;
pub type SemesterId = String;
pub type CourseCode = String;

/// Teaching days per week (Monday = 1 .. Friday = 5).
pub const DAYS_PER_WEEK: usize = 5;
/// One timeline per (weekday, week parity).
pub const SLOT_COUNT: usize = DAYS_PER_WEEK * 2;

/// Odd/even alternation of biweekly classes. Catalogue codes: `L` (odd), `S` (even).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum WeekParity {
    #[serde(rename = "L")]
    Odd,
    #[serde(rename = "S")]
    Even,
}

impl WeekParity {
    pub const ALL: [WeekParity; 2] = [WeekParity::Odd, WeekParity::Even];

    pub fn index(self) -> usize {
        match self {
            WeekParity::Odd => 0,
            WeekParity::Even => 1,
        }
    }
}

/// Kind of a parallel. Catalogue codes: `P` (lecture), `C` (tutorial), `L` (lab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum SectionType {
    #[serde(rename = "P")]
    Lecture,
    #[serde(rename = "C")]
    Tutorial,
    #[serde(rename = "L")]
    Lab,
}

impl SectionType {
    pub const ALL: [SectionType; 3] = [
        SectionType::Lecture,
        SectionType::Tutorial,
        SectionType::Lab,
    ];
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SectionType::Lecture => "lecture",
            SectionType::Tutorial => "tutorial",
            SectionType::Lab => "lab",
        };
        f.write_str(name)
    }
}

/// Wall-clock time as stored in the catalogue file: `[hour, minute]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClockTime(pub u8, pub u8);

impl ClockTime {
    pub fn minutes(self) -> Minutes {
        Minutes::from(self.0) * 60 + Minutes::from(self.1)
    }
}

/// A timetable entry exactly as loaded; `week == None` means every week.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawTimeBlock {
    pub day: Weekday,
    pub week: Option<WeekParity>,
    #[serde(default)]
    pub weeks_valid: Vec<u32>,
    pub start: ClockTime,
    pub end: ClockTime,
    #[serde(default)]
    pub room: Option<String>,
}

/// A single contiguous occupied interval on one weekday of one week parity.
///
/// `start` and `end` are minutes since midnight with `start < end`; this is
/// checked when the catalogue is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeBlock {
    pub day: Weekday,
    pub week: WeekParity,
    pub start: Minutes,
    pub end: Minutes,
    pub room: Option<String>,
    #[serde(default)]
    pub is_merged: bool,
    #[serde(default)]
    pub weeks_valid: Vec<u32>,
}

impl TimeBlock {
    /// Index of the day timeline this block lives on: `(day - 1) + 5 * parity`.
    /// `None` for weekdays outside `1..=5`.
    pub fn slot(&self) -> Option<usize> {
        let day = usize::from(self.day);
        if !(1..=DAYS_PER_WEEK).contains(&day) {
            return None;
        }
        Some(day - 1 + DAYS_PER_WEEK * self.week.index())
    }
}

/// A parallel exactly as loaded from the catalogue.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawSection {
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub num: Option<u32>,
    pub capacity: Option<u32>,
    #[serde(default)]
    pub occupied_places: Option<u32>,
    #[serde(default = "default_can_register")]
    pub can_register: bool,
    #[serde(default)]
    pub is_full: bool,
    pub timetable: Vec<RawTimeBlock>,
}

fn default_can_register() -> bool {
    true
}

/// One registerable instance (parallel) of a lecture, tutorial or lab.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Section {
    #[serde(rename = "type")]
    pub kind: SectionType,
    pub num: Option<u32>,
    pub capacity: Option<u32>,
    pub occupied_places: Option<u32>,
    pub can_register: bool,
    pub is_full: bool,
    pub timetable: Vec<TimeBlock>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawCourse {
    pub code: CourseCode,
    pub name: String,
    pub parallels: Vec<RawSection>,
}

/// Sections of one course, bucketed by their type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SectionsByType {
    pub lecture: Vec<Section>,
    pub tutorial: Vec<Section>,
    pub lab: Vec<Section>,
}

impl SectionsByType {
    pub fn of(&self, kind: SectionType) -> &[Section] {
        match kind {
            SectionType::Lecture => &self.lecture,
            SectionType::Tutorial => &self.tutorial,
            SectionType::Lab => &self.lab,
        }
    }

    pub(crate) fn of_mut(&mut self, kind: SectionType) -> &mut Vec<Section> {
        match kind {
            SectionType::Lecture => &mut self.lecture,
            SectionType::Tutorial => &mut self.tutorial,
            SectionType::Lab => &mut self.lab,
        }
    }
}

/// Represents a course with its merged, validated sections.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Course {
    pub code: CourseCode,
    pub name: String,
    pub parallels: SectionsByType,
}

/// Catalogue file contents: semester id -> courses.
pub type RawCatalogue = BTreeMap<SemesterId, Vec<RawCourse>>;

/// Which section types the user is willing to attend for one course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TypePreferences {
    #[serde(default)]
    pub lecture: bool,
    #[serde(default)]
    pub tutorial: bool,
    #[serde(default)]
    pub lab: bool,
}

impl TypePreferences {
    pub fn all() -> Self {
        Self {
            lecture: true,
            tutorial: true,
            lab: true,
        }
    }

    pub fn enabled(&self, kind: SectionType) -> bool {
        match kind {
            SectionType::Lecture => self.lecture,
            SectionType::Tutorial => self.tutorial,
            SectionType::Lab => self.lab,
        }
    }
}

/// The complete input for one timetable search.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub semester: SemesterId,
    pub preferences: BTreeMap<CourseCode, TypePreferences>,
    #[serde(default)]
    pub allow_full: BTreeMap<CourseCode, bool>,
    #[serde(default)]
    pub allow_locked: BTreeMap<CourseCode, bool>,
}

/// Sections picked for one course in one schedule option; `None` where the
/// type was excluded or had no candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChosenSections {
    pub lecture: Option<Section>,
    pub tutorial: Option<Section>,
    pub lab: Option<Section>,
}

impl ChosenSections {
    pub fn get(&self, kind: SectionType) -> Option<&Section> {
        match kind {
            SectionType::Lecture => self.lecture.as_ref(),
            SectionType::Tutorial => self.tutorial.as_ref(),
            SectionType::Lab => self.lab.as_ref(),
        }
    }

    pub(crate) fn set(&mut self, kind: SectionType, section: Section) {
        let slot = match kind {
            SectionType::Lecture => &mut self.lecture,
            SectionType::Tutorial => &mut self.tutorial,
            SectionType::Lab => &mut self.lab,
        };
        *slot = Some(section);
    }
}

/// One minimal-score schedule: course code -> chosen sections.
pub type ScheduleOption = BTreeMap<CourseCode, ChosenSections>;

/// Number of sections offered per type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionCounts {
    pub lecture: usize,
    pub tutorial: usize,
    pub lab: usize,
}

/// Course listing entry returned to clients picking their courses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub code: CourseCode,
    pub name: String,
    pub sections: SectionCounts,
}

impl From<&Course> for CourseSummary {
    fn from(course: &Course) -> Self {
        Self {
            code: course.code.clone(),
            name: course.name.clone(),
            sections: SectionCounts {
                lecture: course.parallels.lecture.len(),
                tutorial: course.parallels.tutorial.len(),
                lab: course.parallels.lab.len(),
            },
        }
    }
}
