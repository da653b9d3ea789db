//! Loading of the course catalogue.
//!
//! The catalogue file maps semester ids to course lists. Every entry is
//! validated once and every section's timetable merged once; after that the
//! catalogue is read-only and shared between searches.

use crate::data::{
    Course, CourseCode, CourseSummary, DAYS_PER_WEEK, RawCatalogue, RawCourse, RawSection,
    RawTimeBlock, Section, SectionsByType, SemesterId,
};
use crate::error::CatalogueError;
use crate::merge::merge_timetable;
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

/// Courses offered in one semester, keyed by their unique code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Semester {
    id: SemesterId,
    courses: BTreeMap<CourseCode, Course>,
}

impl Semester {
    pub fn new(id: impl Into<SemesterId>, courses: Vec<Course>) -> Result<Self, CatalogueError> {
        let id = id.into();
        let mut by_code = BTreeMap::new();
        for course in courses {
            if by_code.contains_key(&course.code) {
                return Err(CatalogueError::DuplicateCourse {
                    semester: id,
                    course: course.code,
                });
            }
            by_code.insert(course.code.clone(), course);
        }
        Ok(Self {
            id,
            courses: by_code,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn course(&self, code: &str) -> Option<&Course> {
        self.courses.get(code)
    }

    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    pub fn summaries(&self) -> Vec<CourseSummary> {
        self.courses().map(CourseSummary::from).collect()
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

/// Validated, merged catalogue for every known semester.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalogue {
    semesters: BTreeMap<SemesterId, Semester>,
}

impl Catalogue {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogueError> {
        let path = path.as_ref();
        info!("Loading catalogue from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogueError> {
        let raw: RawCatalogue = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawCatalogue) -> Result<Self, CatalogueError> {
        let start_time = Instant::now();
        let mut semesters = BTreeMap::new();

        for (id, raw_courses) in raw {
            let courses = raw_courses
                .into_iter()
                .map(|course| build_course(&id, course))
                .collect::<Result<Vec<_>, _>>()?;
            let semester = Semester::new(id.clone(), courses)?;
            debug!("Semester {}: {} courses", id, semester.len());
            semesters.insert(id, semester);
        }

        info!(
            "Catalogue ready in {:.2?}: {} semesters",
            start_time.elapsed(),
            semesters.len()
        );
        Ok(Self { semesters })
    }

    pub fn semester(&self, id: &str) -> Option<&Semester> {
        self.semesters.get(id)
    }

    pub fn semester_ids(&self) -> impl Iterator<Item = &str> {
        self.semesters.keys().map(String::as_str)
    }

    /// Adds or replaces a semester.
    pub fn insert(&mut self, semester: Semester) -> Option<Semester> {
        self.semesters.insert(semester.id.clone(), semester)
    }
}

fn build_course(semester: &str, raw: RawCourse) -> Result<Course, CatalogueError> {
    let mut parallels = SectionsByType::default();
    for section in raw.parallels {
        for entry in &section.timetable {
            validate_entry(semester, &raw.code, entry)?;
        }
        let kind = section.kind;
        parallels.of_mut(kind).push(build_section(section));
    }

    Ok(Course {
        code: raw.code,
        name: raw.name,
        parallels,
    })
}

fn build_section(raw: RawSection) -> Section {
    Section {
        kind: raw.kind,
        num: raw.num,
        capacity: raw.capacity,
        occupied_places: raw.occupied_places,
        can_register: raw.can_register,
        is_full: raw.is_full,
        timetable: merge_timetable(&raw.timetable),
    }
}

fn validate_entry(
    semester: &str,
    course: &str,
    entry: &RawTimeBlock,
) -> Result<(), CatalogueError> {
    if entry.day == 0 || usize::from(entry.day) > DAYS_PER_WEEK {
        return Err(CatalogueError::InvalidWeekday {
            semester: semester.to_string(),
            course: course.to_string(),
            day: entry.day,
        });
    }

    let (start, end) = (entry.start.minutes(), entry.end.minutes());
    if start >= end {
        return Err(CatalogueError::InvalidTimeRange {
            semester: semester.to_string(),
            course: course.to_string(),
            start,
            end,
        });
    }
    Ok(())
}
