//! Turns a semester plus user preferences into the groups the solver iterates
//! over, and maps the solver's index vectors back to concrete sections.

use crate::catalogue::Semester;
use crate::data::{
    ChosenSections, Course, CourseCode, ScheduleOption, Section, SectionType, SolveRequest,
};
use crate::error::SolveError;
use crate::solver::{BestResult, Candidate};
use log::{debug, trace};

/// Candidate sections competing for one (course, type) slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionGroup {
    pub course: CourseCode,
    pub kind: SectionType,
    /// Positions in the course's section list of `kind` that passed filtering.
    pub sections: Vec<usize>,
    course_index: usize,
}

/// Search input derived from one [`SolveRequest`].
#[derive(Debug, Clone)]
pub struct SelectionPlan<'s> {
    courses: Vec<&'s Course>,
    groups: Vec<SelectionGroup>,
    total: u64,
}

impl<'s> SelectionPlan<'s> {
    /// Filters every requested course by type preference, fullness and
    /// registration state. (course, type) pairs left without sections are
    /// dropped; they constrain nothing. Groups are ordered by ascending size,
    /// then course code, then type.
    pub fn build(semester: &'s Semester, request: &SolveRequest) -> Result<Self, SolveError> {
        let mut courses = Vec::with_capacity(request.preferences.len());
        let mut groups = Vec::new();

        for (code, preferences) in &request.preferences {
            let course = semester.course(code).ok_or_else(|| SolveError::UnknownCourse {
                semester: semester.id().to_string(),
                course: code.clone(),
            })?;
            let course_index = courses.len();
            courses.push(course);

            let allow_full = request.allow_full.get(code).copied().unwrap_or(false);
            let allow_locked = request.allow_locked.get(code).copied().unwrap_or(false);

            for kind in SectionType::ALL {
                if !preferences.enabled(kind) {
                    continue;
                }
                let all = course.parallels.of(kind);
                let sections: Vec<usize> = all
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| allow_full || !s.is_full)
                    .filter(|(_, s)| allow_locked || s.can_register)
                    .map(|(i, _)| i)
                    .collect();
                trace!(
                    "{} {}: {} of {} sections remain",
                    code,
                    kind,
                    sections.len(),
                    all.len()
                );

                if !sections.is_empty() {
                    groups.push(SelectionGroup {
                        course: code.clone(),
                        kind,
                        sections,
                        course_index,
                    });
                }
            }
        }

        groups.sort_by(|a, b| {
            a.sections
                .len()
                .cmp(&b.sections.len())
                .then_with(|| a.course.cmp(&b.course))
                .then_with(|| a.kind.cmp(&b.kind))
        });

        let total = groups
            .iter()
            .fold(1u64, |acc, g| acc.saturating_mul(g.sections.len() as u64));
        debug!(
            "Built {} selection groups for {} courses ({} combinations)",
            groups.len(),
            courses.len(),
            total
        );

        Ok(Self {
            courses,
            groups,
            total,
        })
    }

    pub fn groups(&self) -> &[SelectionGroup] {
        &self.groups
    }

    /// Product of the group sizes; empty (course, type) pairs count as one.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Solver input, in group order.
    pub fn candidates(&self) -> Result<Vec<Vec<Candidate>>, SolveError> {
        self.groups
            .iter()
            .map(|group| {
                group
                    .sections
                    .iter()
                    .map(|&i| Candidate::from_timetable(&self.section(group, i).timetable))
                    .collect()
            })
            .collect()
    }

    /// Maps one selection vector back to course -> chosen sections. Every
    /// requested course is present, with `None` for types not chosen.
    pub fn resolve(&self, selection: &[usize]) -> ScheduleOption {
        let mut option: ScheduleOption = self
            .courses
            .iter()
            .map(|c| (c.code.clone(), ChosenSections::default()))
            .collect();

        for (group, &choice) in self.groups.iter().zip(selection) {
            let section = self.section(group, group.sections[choice]).clone();
            option
                .entry(group.course.clone())
                .or_default()
                .set(group.kind, section);
        }
        option
    }

    pub fn resolve_all(&self, best: &BestResult) -> Vec<ScheduleOption> {
        best.combinations.iter().map(|s| self.resolve(s)).collect()
    }

    fn section(&self, group: &SelectionGroup, index: usize) -> &'s Section {
        &self.courses[group.course_index].parallels.of(group.kind)[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{TimeBlock, TypePreferences, WeekParity};
    use std::collections::BTreeMap;

    fn section(kind: SectionType, num: u32, day: u8, full: bool, open: bool) -> Section {
        Section {
            kind,
            num: Some(num),
            capacity: Some(20),
            occupied_places: None,
            can_register: open,
            is_full: full,
            timetable: vec![TimeBlock {
                day,
                week: WeekParity::Odd,
                start: 540,
                end: 630,
                room: None,
                is_merged: false,
                weeks_valid: vec![],
            }],
        }
    }

    fn semester() -> Semester {
        let mut alg = Course {
            code: "BI-AG1".into(),
            name: "Algorithms".into(),
            parallels: Default::default(),
        };
        alg.parallels.lecture = vec![section(SectionType::Lecture, 1, 1, false, true)];
        alg.parallels.tutorial = vec![
            section(SectionType::Tutorial, 101, 2, false, true),
            section(SectionType::Tutorial, 102, 3, true, true),
            section(SectionType::Tutorial, 103, 4, false, false),
        ];

        let mut db = Course {
            code: "BI-DBS".into(),
            name: "Databases".into(),
            parallels: Default::default(),
        };
        db.parallels.lecture = vec![
            section(SectionType::Lecture, 1, 1, false, true),
            section(SectionType::Lecture, 2, 5, false, true),
        ];
        db.parallels.lab = vec![section(SectionType::Lab, 201, 2, true, false)];

        Semester::new("B241", vec![alg, db]).unwrap()
    }

    fn request(codes: &[&str]) -> SolveRequest {
        SolveRequest {
            semester: "B241".into(),
            preferences: codes
                .iter()
                .map(|c| (c.to_string(), TypePreferences::all()))
                .collect(),
            allow_full: BTreeMap::new(),
            allow_locked: BTreeMap::new(),
        }
    }

    #[test]
    fn full_and_locked_sections_are_filtered() {
        let semester = semester();
        let plan = SelectionPlan::build(&semester, &request(&["BI-AG1"])).unwrap();
        let tutorials = plan
            .groups()
            .iter()
            .find(|g| g.kind == SectionType::Tutorial)
            .unwrap();
        assert_eq!(tutorials.sections, vec![0]);
    }

    #[test]
    fn allow_flags_keep_sections() {
        let semester = semester();
        let mut req = request(&["BI-AG1"]);
        req.allow_full.insert("BI-AG1".into(), true);
        req.allow_locked.insert("BI-AG1".into(), true);
        let plan = SelectionPlan::build(&semester, &req).unwrap();
        let tutorials = plan
            .groups()
            .iter()
            .find(|g| g.kind == SectionType::Tutorial)
            .unwrap();
        assert_eq!(tutorials.sections, vec![0, 1, 2]);
        assert_eq!(plan.total(), 3);
    }

    #[test]
    fn empty_groups_are_dropped_and_order_is_by_size() {
        let semester = semester();
        let plan = SelectionPlan::build(&semester, &request(&["BI-AG1", "BI-DBS"])).unwrap();
        let order: Vec<(&str, SectionType)> = plan
            .groups()
            .iter()
            .map(|g| (g.course.as_str(), g.kind))
            .collect();
        // BI-DBS lab is both full and locked, so it vanishes.
        assert_eq!(
            order,
            vec![
                ("BI-AG1", SectionType::Lecture),
                ("BI-AG1", SectionType::Tutorial),
                ("BI-DBS", SectionType::Lecture),
            ]
        );
        assert_eq!(plan.total(), 2);
    }

    #[test]
    fn disabled_types_are_skipped() {
        let semester = semester();
        let mut req = request(&["BI-AG1"]);
        req.preferences.insert(
            "BI-AG1".into(),
            TypePreferences {
                lecture: false,
                tutorial: true,
                lab: false,
            },
        );
        let plan = SelectionPlan::build(&semester, &req).unwrap();
        assert_eq!(plan.groups().len(), 1);
        assert_eq!(plan.groups()[0].kind, SectionType::Tutorial);
    }

    #[test]
    fn unknown_course_is_an_error() {
        let semester = semester();
        let err = SelectionPlan::build(&semester, &request(&["BI-XXX"])).unwrap_err();
        assert!(matches!(err, SolveError::UnknownCourse { .. }));
    }

    #[test]
    fn resolve_maps_indices_to_sections() {
        let semester = semester();
        let plan = SelectionPlan::build(&semester, &request(&["BI-AG1", "BI-DBS"])).unwrap();
        let option = plan.resolve(&[0, 0, 1]);

        let ag = &option["BI-AG1"];
        assert_eq!(ag.lecture.as_ref().and_then(|s| s.num), Some(1));
        assert_eq!(ag.tutorial.as_ref().and_then(|s| s.num), Some(101));
        assert!(ag.lab.is_none());

        let db = &option["BI-DBS"];
        assert_eq!(db.get(SectionType::Lecture).and_then(|s| s.num), Some(2));
        assert!(db.lab.is_none());
    }

    #[test]
    fn candidates_follow_group_order() {
        let semester = semester();
        let plan = SelectionPlan::build(&semester, &request(&["BI-DBS"])).unwrap();
        let candidates = plan.candidates().unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].len(), 2);
        assert_eq!(candidates[0][1].blocks[0].slot, 4);
    }
}
