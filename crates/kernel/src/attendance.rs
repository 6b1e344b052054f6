//! Attendance arithmetic.
//!
//! Every function here is pure and total: thresholds above 100 are clamped,
//! and the two divisions that can hit zero (`threshold == 0` for bunking,
//! `threshold == 100` for recovery) return explicit variants instead.

pub const MAX_THRESHOLD_PERCENT: u32 = 100;

/// How many more classes can be missed while staying at or above the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BunkAllowance {
    Classes(u32),
    Unlimited,
}

/// How many consecutive attended classes are needed to get back to the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryPlan {
    Classes(u32),
    Unreachable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendanceOutlook {
    CanBunk(BunkAllowance),
    MustAttend(RecoveryPlan),
}

fn clamp_threshold(threshold: u32) -> u32 {
    threshold.min(MAX_THRESHOLD_PERCENT)
}

fn saturate_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Rounded (half up) attendance percentage; `0` when no class has been held.
pub fn percentage(attended: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }

    let attended = u64::from(attended);
    let total = u64::from(total);
    let rounded = (200 * attended + total) / (2 * total);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

pub fn meets_threshold(attended: u32, total: u32, threshold: u32) -> bool {
    percentage(attended, total) >= clamp_threshold(threshold)
}

/// `floor((100a - th*t) / th)`, clamped at zero.
pub fn bunkable(attended: u32, total: u32, threshold: u32) -> BunkAllowance {
    let threshold = clamp_threshold(threshold);
    if threshold == 0 {
        return BunkAllowance::Unlimited;
    }

    let surplus = 100 * i64::from(attended) - i64::from(threshold) * i64::from(total);
    if surplus <= 0 {
        return BunkAllowance::Classes(0);
    }
    BunkAllowance::Classes(saturate_u32(surplus / i64::from(threshold)))
}

/// `ceil((th*t - 100a) / (100 - th))`, clamped at zero.
pub fn needed_to_reach_threshold(attended: u32, total: u32, threshold: u32) -> RecoveryPlan {
    let threshold = clamp_threshold(threshold);
    let deficit = i64::from(threshold) * i64::from(total) - 100 * i64::from(attended);
    if deficit <= 0 {
        return RecoveryPlan::Classes(0);
    }
    if threshold == MAX_THRESHOLD_PERCENT {
        return RecoveryPlan::Unreachable;
    }

    let headroom = i64::from(MAX_THRESHOLD_PERCENT - threshold);
    let needed = (deficit + headroom - 1) / headroom;
    RecoveryPlan::Classes(saturate_u32(needed))
}

/// Picks the bunk branch when the threshold is met (or nothing was held yet),
/// otherwise the recovery branch.
pub fn outlook(attended: u32, total: u32, threshold: u32) -> AttendanceOutlook {
    if total == 0 || meets_threshold(attended, total, threshold) {
        AttendanceOutlook::CanBunk(bunkable(attended, total, threshold))
    } else {
        AttendanceOutlook::MustAttend(needed_to_reach_threshold(attended, total, threshold))
    }
}

#[cfg(test)]
#[path = "../tests/attendance/attendance_tests.rs"]
mod tests;
