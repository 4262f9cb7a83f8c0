//! 考试座位分配
//!
//! 对班级名单做一次均匀随机排列（Fisher-Yates），按排列顺序依次分配
//! 1..=min(N, capacity) 号座位，超出容量的学生不分配座位并单独返回。

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use std::collections::HashSet;
use ts_rs::TS;

/// 默认考场容量
pub const DEFAULT_SEAT_CAPACITY: usize = 60;

/// 单个座位分配结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/exam.ts")]
pub struct SeatAssignment {
    pub student_id: i64,
    pub seat_number: i32,
}

/// 一场考试的座位分配方案
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeatingPlan {
    /// 按座位号升序排列
    pub assignments: Vec<SeatAssignment>,
    /// 超出容量未分配座位的学生，按 ID 升序
    pub unseated: Vec<i64>,
}

impl SeatingPlan {
    pub fn seated_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_overflow(&self) -> bool {
        !self.unseated.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty() && self.unseated.is_empty()
    }
}

/// 使用给定的随机数生成器分配座位
///
/// 输入中重复的学生 ID 只保留一次；`capacity` 为 0 时所有学生都不分配座位。
pub fn allocate_seats<R>(student_ids: &[i64], capacity: usize, rng: &mut R) -> SeatingPlan
where
    R: Rng + ?Sized,
{
    let mut seen = HashSet::with_capacity(student_ids.len());
    let mut roster: Vec<i64> = student_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    roster.shuffle(rng);

    let seated = roster.len().min(capacity);
    let mut unseated = roster.split_off(seated);
    unseated.sort_unstable();

    let assignments = roster
        .into_iter()
        .enumerate()
        .map(|(i, student_id)| SeatAssignment {
            student_id,
            seat_number: (i + 1) as i32,
        })
        .collect();

    SeatingPlan {
        assignments,
        unseated,
    }
}

/// 使用线程本地随机数生成器分配座位
pub fn allocate_seats_random(student_ids: &[i64], capacity: usize) -> SeatingPlan {
    allocate_seats(student_ids, capacity, &mut rand::rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn assert_valid_plan(plan: &SeatingPlan, input: &[i64], capacity: usize) {
        let distinct: HashSet<i64> = input.iter().copied().collect();
        let expected = distinct.len().min(capacity);
        assert_eq!(plan.assignments.len(), expected);

        let mut seats: Vec<i32> = plan.assignments.iter().map(|a| a.seat_number).collect();
        seats.sort_unstable();
        let dense: Vec<i32> = (1..=expected as i32).collect();
        assert_eq!(seats, dense);

        let seated: HashSet<i64> = plan.assignments.iter().map(|a| a.student_id).collect();
        assert_eq!(seated.len(), plan.assignments.len());
        assert!(seated.iter().all(|id| distinct.contains(id)));
        assert!(plan.unseated.iter().all(|id| !seated.contains(id)));
        assert_eq!(seated.len() + plan.unseated.len(), distinct.len());
    }

    #[test]
    fn test_three_students() {
        let mut rng = StdRng::seed_from_u64(7);
        let roster = [11, 12, 13];
        let plan = allocate_seats(&roster, DEFAULT_SEAT_CAPACITY, &mut rng);
        assert_valid_plan(&plan, &roster, DEFAULT_SEAT_CAPACITY);
        assert!(!plan.is_overflow());
    }

    #[test]
    fn test_overflow_excludes_extra_students() {
        let mut rng = StdRng::seed_from_u64(42);
        let roster: Vec<i64> = (1..=65).collect();
        let plan = allocate_seats(&roster, DEFAULT_SEAT_CAPACITY, &mut rng);
        assert_valid_plan(&plan, &roster, DEFAULT_SEAT_CAPACITY);
        assert_eq!(plan.seated_count(), 60);
        assert_eq!(plan.unseated.len(), 5);
        assert!(plan.assignments.iter().all(|a| a.seat_number <= 60));
    }

    #[test]
    fn test_empty_roster() {
        let plan = allocate_seats_random(&[], DEFAULT_SEAT_CAPACITY);
        assert!(plan.is_empty());
        assert_eq!(plan.seated_count(), 0);
    }

    #[test]
    fn test_duplicate_ids_are_collapsed() {
        let mut rng = StdRng::seed_from_u64(1);
        let roster = [5, 5, 6, 7, 6];
        let plan = allocate_seats(&roster, DEFAULT_SEAT_CAPACITY, &mut rng);
        assert_valid_plan(&plan, &roster, DEFAULT_SEAT_CAPACITY);
        assert_eq!(plan.seated_count(), 3);
    }

    #[test]
    fn test_various_sizes() {
        let mut rng = StdRng::seed_from_u64(2024);
        for n in [1usize, 2, 59, 60, 61, 120] {
            let roster: Vec<i64> = (100..100 + n as i64).collect();
            for capacity in [1usize, 10, 60] {
                let plan = allocate_seats(&roster, capacity, &mut rng);
                assert_valid_plan(&plan, &roster, capacity);
            }
        }
    }

    #[test]
    fn test_seat_distribution_is_roughly_uniform() {
        const STUDENTS: usize = 5;
        const TRIALS: usize = 5000;
        let mut rng = StdRng::seed_from_u64(12345);
        let roster: Vec<i64> = (0..STUDENTS as i64).collect();
        let mut counts = [[0usize; STUDENTS]; STUDENTS];

        for _ in 0..TRIALS {
            let plan = allocate_seats(&roster, DEFAULT_SEAT_CAPACITY, &mut rng);
            for a in &plan.assignments {
                counts[a.student_id as usize][(a.seat_number - 1) as usize] += 1;
            }
        }

        // 期望每格约 1000 次，标准差约 28
        for row in counts.iter() {
            for &count in row.iter() {
                assert!((850..=1150).contains(&count), "count {count} out of range");
            }
        }
    }
}
