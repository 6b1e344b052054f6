use super::*;

#[test]
fn percentage_should_be_zero_without_classes() {
    assert_eq!(percentage(0, 0), 0);
    assert_eq!(percentage(3, 0), 0);
}

#[test]
fn percentage_should_round_half_up() {
    assert_eq!(percentage(1, 8), 13);
    assert_eq!(percentage(2, 3), 67);
    assert_eq!(percentage(1, 3), 33);
    assert_eq!(percentage(18, 20), 90);
}

#[test]
fn percentage_should_stay_within_bounds_for_valid_counts() {
    for total in 1..=60_u32 {
        for attended in 0..=total {
            let value = percentage(attended, total);
            assert!(value <= 100, "{attended}/{total} gave {value}");
        }
    }
}

#[test]
fn outlook_should_allow_bunking_when_above_threshold() {
    assert_eq!(percentage(18, 20), 90);
    assert!(meets_threshold(18, 20, 75));
    assert_eq!(bunkable(18, 20, 75), BunkAllowance::Classes(4));
    assert_eq!(
        outlook(18, 20, 75),
        AttendanceOutlook::CanBunk(BunkAllowance::Classes(4))
    );
}

#[test]
fn outlook_should_require_recovery_when_below_threshold() {
    assert_eq!(percentage(10, 20), 50);
    assert!(!meets_threshold(10, 20, 75));
    assert_eq!(needed_to_reach_threshold(10, 20, 75), RecoveryPlan::Classes(20));
    assert_eq!(
        outlook(10, 20, 75),
        AttendanceOutlook::MustAttend(RecoveryPlan::Classes(20))
    );
}

#[test]
fn outlook_should_allow_zero_bunks_at_perfect_attendance_with_full_threshold() {
    assert_eq!(percentage(5, 5), 100);
    assert!(meets_threshold(5, 5, 100));
    assert_eq!(
        outlook(5, 5, 100),
        AttendanceOutlook::CanBunk(BunkAllowance::Classes(0))
    );
}

#[test]
fn outlook_should_mark_full_threshold_unreachable_after_a_miss() {
    assert_eq!(percentage(4, 5), 80);
    assert!(!meets_threshold(4, 5, 100));
    assert_eq!(
        outlook(4, 5, 100),
        AttendanceOutlook::MustAttend(RecoveryPlan::Unreachable)
    );
}

#[test]
fn bunkable_should_be_unlimited_for_zero_threshold() {
    assert_eq!(bunkable(0, 10, 0), BunkAllowance::Unlimited);
    assert_eq!(
        outlook(0, 10, 0),
        AttendanceOutlook::CanBunk(BunkAllowance::Unlimited)
    );
}

#[test]
fn outlook_should_take_bunk_branch_before_any_class() {
    assert_eq!(
        outlook(0, 0, 75),
        AttendanceOutlook::CanBunk(BunkAllowance::Classes(0))
    );
}

#[test]
fn bunkable_should_clamp_rounding_deficit_to_zero() {
    // 149/200 is 74.5%, which rounds up to 75 but is still below the exact ratio.
    assert!(meets_threshold(149, 200, 75));
    assert_eq!(bunkable(149, 200, 75), BunkAllowance::Classes(0));
}

#[test]
fn threshold_above_hundred_should_be_clamped() {
    assert!(meets_threshold(5, 5, 150));
    assert_eq!(needed_to_reach_threshold(4, 5, 150), RecoveryPlan::Unreachable);
}

#[test]
fn recovery_plan_should_actually_reach_threshold() {
    for total in 1..=40_u32 {
        for attended in 0..=total {
            if let RecoveryPlan::Classes(extra) = needed_to_reach_threshold(attended, total, 75) {
                let reached = 100 * u64::from(attended + extra) >= 75 * u64::from(total + extra);
                assert!(reached, "{attended}/{total} + {extra}");
            }
        }
    }
}
