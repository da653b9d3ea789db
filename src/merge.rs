//! Normalization of a section's raw timetable into non-overlapping blocks.
//!
//! Entries are bucketed by (week parity, weekday). Inside a bucket they are
//! ordered by `(start, end)` and folded left to right: an entry whose start is
//! at or before the running block's end is absorbed into it (touching entries
//! count as overlapping). Entries without a parity are expanded to one odd and
//! one even copy first, so a weekly class still collides with a biweekly one.

use crate::data::{RawTimeBlock, TimeBlock, WeekParity};
use itertools::Itertools;
use std::collections::BTreeSet;

/// Joins room names of merged blocks.
pub const ROOM_SEPARATOR: &str = ", ";

/// Converts one raw entry into a block per week parity it occurs in.
pub fn expand_weeks(raw: &RawTimeBlock) -> Vec<TimeBlock> {
    let weeks: &[WeekParity] = match &raw.week {
        Some(week) => std::slice::from_ref(week),
        None => &WeekParity::ALL,
    };

    let weeks_valid: Vec<u32> = raw
        .weeks_valid
        .iter()
        .copied()
        .sorted_unstable()
        .dedup()
        .collect();

    weeks
        .iter()
        .map(|&week| TimeBlock {
            day: raw.day,
            week,
            start: raw.start.minutes(),
            end: raw.end.minutes(),
            room: raw.room.clone(),
            is_merged: false,
            weeks_valid: weeks_valid.clone(),
        })
        .collect()
}

/// Collapses overlapping or touching blocks that share a (parity, weekday)
/// bucket. Output is ordered by parity, weekday and start time.
///
/// Running this on its own output returns the same blocks.
pub fn merge_blocks(blocks: Vec<TimeBlock>) -> Vec<TimeBlock> {
    blocks
        .into_iter()
        .sorted_by_key(|b| (b.week, b.day, b.start, b.end))
        .coalesce(|acc, next| {
            if acc.week == next.week && acc.day == next.day && next.start <= acc.end {
                Ok(absorb(acc, next))
            } else {
                Err((acc, next))
            }
        })
        .collect()
}

/// Full per-section pipeline: parity expansion followed by merging.
pub fn merge_timetable(raw: &[RawTimeBlock]) -> Vec<TimeBlock> {
    merge_blocks(raw.iter().flat_map(expand_weeks).collect())
}

fn absorb(mut acc: TimeBlock, next: TimeBlock) -> TimeBlock {
    acc.end = acc.end.max(next.end);
    acc.room = union_rooms(acc.room.as_deref(), next.room.as_deref());
    acc.weeks_valid.extend(next.weeks_valid);
    acc.weeks_valid.sort_unstable();
    acc.weeks_valid.dedup();
    acc.is_merged = true;
    acc
}

// Rooms of already merged blocks are split again, so the union stays flat.
fn union_rooms(a: Option<&str>, b: Option<&str>) -> Option<String> {
    let rooms: BTreeSet<&str> = a
        .into_iter()
        .chain(b)
        .flat_map(|r| r.split(ROOM_SEPARATOR))
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .collect();

    if rooms.is_empty() {
        None
    } else {
        Some(rooms.into_iter().join(ROOM_SEPARATOR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ClockTime;
    use proptest::prelude::*;

    fn raw(
        day: u8,
        week: Option<WeekParity>,
        start: (u8, u8),
        end: (u8, u8),
        room: &str,
    ) -> RawTimeBlock {
        RawTimeBlock {
            day,
            week,
            weeks_valid: vec![],
            start: ClockTime(start.0, start.1),
            end: ClockTime(end.0, end.1),
            room: Some(room.to_string()),
        }
    }

    fn block(day: u8, week: WeekParity, start: u32, end: u32, room: Option<&str>) -> TimeBlock {
        TimeBlock {
            day,
            week,
            start,
            end,
            room: room.map(str::to_string),
            is_merged: false,
            weeks_valid: vec![],
        }
    }

    #[test]
    fn every_week_entry_is_duplicated_for_both_parities() {
        let blocks = expand_weeks(&raw(2, None, (9, 15), (10, 45), "T9:105"));
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].week, WeekParity::Odd);
        assert_eq!(blocks[1].week, WeekParity::Even);
        assert!(blocks.iter().all(|b| b.start == 555 && b.end == 645));
    }

    #[test]
    fn overlapping_entries_are_merged() {
        let merged = merge_blocks(vec![
            block(1, WeekParity::Odd, 600, 700, Some("B")),
            block(1, WeekParity::Odd, 540, 620, Some("A")),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].start, 540);
        assert_eq!(merged[0].end, 700);
        assert_eq!(merged[0].room.as_deref(), Some("A, B"));
        assert!(merged[0].is_merged);
    }

    #[test]
    fn touching_entries_are_merged() {
        let merged = merge_blocks(vec![
            block(3, WeekParity::Even, 540, 630, None),
            block(3, WeekParity::Even, 630, 720, Some("KN:E-107")),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].end, 720);
        assert_eq!(merged[0].room.as_deref(), Some("KN:E-107"));
    }

    #[test]
    fn contained_entry_keeps_outer_end() {
        let merged = merge_blocks(vec![
            block(1, WeekParity::Odd, 540, 720, None),
            block(1, WeekParity::Odd, 600, 630, None),
        ]);
        assert_eq!(merged.len(), 1);
        assert_eq!((merged[0].start, merged[0].end), (540, 720));
    }

    #[test]
    fn different_days_and_parities_are_never_merged() {
        let merged = merge_blocks(vec![
            block(1, WeekParity::Odd, 540, 630, None),
            block(2, WeekParity::Odd, 540, 630, None),
            block(1, WeekParity::Even, 540, 630, None),
        ]);
        assert_eq!(merged.len(), 3);
        assert!(merged.iter().all(|b| !b.is_merged));
    }

    #[test]
    fn gap_starts_new_block() {
        let merged = merge_blocks(vec![
            block(4, WeekParity::Odd, 540, 600, None),
            block(4, WeekParity::Odd, 601, 660, None),
        ]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn valid_weeks_are_unioned_and_sorted() {
        let mut a = block(1, WeekParity::Odd, 540, 600, None);
        a.weeks_valid = vec![5, 1, 3];
        let mut b = block(1, WeekParity::Odd, 590, 620, None);
        b.weeks_valid = vec![3, 7];
        let merged = merge_blocks(vec![a, b]);
        assert_eq!(merged[0].weeks_valid, vec![1, 3, 5, 7]);
    }

    #[test]
    fn unmerged_entry_has_ordered_valid_weeks() {
        let mut entry = raw(2, None, (9, 0), (10, 0), "A");
        entry.weeks_valid = vec![9, 3, 3, 1];
        let merged = merge_timetable(&[entry]);
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|b| !b.is_merged && b.weeks_valid == vec![1, 3, 9]));
    }

    #[test]
    fn duplicate_rooms_appear_once() {
        let merged = merge_timetable(&[
            raw(1, Some(WeekParity::Odd), (9, 0), (10, 0), "A"),
            raw(1, Some(WeekParity::Odd), (9, 30), (11, 0), "A"),
        ]);
        assert_eq!(merged[0].room.as_deref(), Some("A"));
    }

    #[test]
    fn weekly_entry_merges_into_both_parities() {
        let merged = merge_timetable(&[
            raw(1, None, (9, 0), (10, 0), "A"),
            raw(1, Some(WeekParity::Even), (10, 0), (11, 0), "B"),
        ]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].week, WeekParity::Odd);
        assert_eq!((merged[0].start, merged[0].end), (540, 600));
        assert_eq!(merged[1].week, WeekParity::Even);
        assert_eq!((merged[1].start, merged[1].end), (540, 660));
        assert_eq!(merged[1].room.as_deref(), Some("A, B"));
    }

    fn arb_block() -> impl Strategy<Value = TimeBlock> {
        let rooms = prop::sample::select(vec!["A", "B", "C"]);
        (1u8..=5, prop::bool::ANY, 420u32..1200, 1u32..240, rooms)
            .prop_map(|(day, odd, start, len, room)| {
                let week = if odd { WeekParity::Odd } else { WeekParity::Even };
                block(day, week, start, start + len, Some(room))
            })
    }

    proptest! {
        #[test]
        fn merged_blocks_never_overlap(blocks in prop::collection::vec(arb_block(), 0..24)) {
            let merged = merge_blocks(blocks);
            for pair in merged.windows(2) {
                if pair[0].week == pair[1].week && pair[0].day == pair[1].day {
                    prop_assert!(pair[1].start > pair[0].end);
                }
            }
        }

        #[test]
        fn merge_is_idempotent(blocks in prop::collection::vec(arb_block(), 0..24)) {
            let once = merge_blocks(blocks);
            let twice = merge_blocks(once.clone());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn rooms_are_preserved_per_bucket(blocks in prop::collection::vec(arb_block(), 0..24)) {
            let rooms_of = |blocks: &[TimeBlock]| -> BTreeSet<(WeekParity, u8, String)> {
                blocks
                    .iter()
                    .flat_map(|b| {
                        b.room
                            .iter()
                            .flat_map(|r| r.split(ROOM_SEPARATOR))
                            .map(move |r| (b.week, b.day, r.to_string()))
                    })
                    .collect()
            };
            let before = rooms_of(&blocks);
            let after = rooms_of(&merge_blocks(blocks));
            prop_assert_eq!(before, after);
        }
    }
}
