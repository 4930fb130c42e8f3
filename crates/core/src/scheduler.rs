use chrono::{DateTime, Duration, Utc};

use crate::model::{ReviewItem, ReviewQuality, SrsStage, normalize_interval_modifier};

//
// ─── TUNING ────────────────────────────────────────────────────────────────────
//

pub const MIN_INTERVAL_MODIFIER: f64 = 0.5;
pub const MAX_INTERVAL_MODIFIER: f64 = 2.5;

/// Modifier change applied on a failed recall.
pub const AGAIN_PENALTY: f64 = 0.20;
/// Modifier change applied on a difficult recall.
pub const HARD_PENALTY: f64 = 0.15;
/// Modifier change applied on an effortless recall.
pub const EASY_BUMP: f64 = 0.15;

/// Stages at or above this lose twice as many steps on a failure.
const HEAVY_PENALTY_STAGE: u8 = 5;

/// Epoch seconds of 9999-12-31T00:00:00Z.
const BURNED_SENTINEL_SECS: i64 = 253_402_214_400;

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Review date given to burned items: far enough out to never come due.
#[must_use]
pub fn burned_review_date() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(BURNED_SENTINEL_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Clamps a modifier into `[MIN_INTERVAL_MODIFIER, MAX_INTERVAL_MODIFIER]`.
#[must_use]
pub fn clamp_interval_modifier(modifier: f64) -> f64 {
    normalize_interval_modifier(Some(modifier)).clamp(MIN_INTERVAL_MODIFIER, MAX_INTERVAL_MODIFIER)
}

/// Scaled interval until the next review for an item sitting at `stage`.
///
/// Returns `None` for burned items.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn interval_for(stage: SrsStage, modifier: f64) -> Option<Duration> {
    let hours = stage.base_interval_hours()?;
    let millis = (hours * clamp_interval_modifier(modifier) * MILLIS_PER_HOUR).round();
    Some(Duration::milliseconds(millis as i64))
}

/// Applies a recall judgment to `item` and returns the rescheduled copy.
///
/// - `Again`: bumps the incorrect count, drops `ceil(count / 2)` stages
///   (doubled from stage 5 up) but never below stage 1, modifier -0.20
/// - `Hard`: stage holds, modifier -0.15
/// - `Good`: stage +1
/// - `Easy`: stage +1, modifier +0.15
///
/// Any non-`Again` judgment clears the incorrect count. The modifier is
/// clamped to `[0.5, 2.5]`. Reaching stage 9 burns the item with a far-future
/// review date; otherwise the next review lands at
/// `now + base_interval(stage) * modifier`.
///
/// # Examples
///
/// ```
/// # use dokkai_core::calculate_next_review;
/// # use dokkai_core::model::{ReviewItem, ReviewItemId, ReviewQuality, SrsStage, WordContent};
/// # use dokkai_core::time::fixed_now;
/// let item = ReviewItem::new(
///     ReviewItemId::new("w1"),
///     WordContent::new("猫", "ねこ", "cat"),
///     None,
///     fixed_now(),
/// )?;
/// let reviewed = calculate_next_review(&item, ReviewQuality::Good, fixed_now());
/// assert_eq!(reviewed.srs_stage(), SrsStage::FIRST);
/// assert_eq!(reviewed.next_review_date(), fixed_now() + chrono::Duration::hours(4));
/// # Ok::<(), dokkai_core::model::ContentError>(())
/// ```
#[must_use]
pub fn calculate_next_review(
    item: &ReviewItem,
    quality: ReviewQuality,
    now: DateTime<Utc>,
) -> ReviewItem {
    let original_stage = i64::from(item.srs_stage().value());
    let mut modifier = item.interval_modifier();
    let mut incorrect = item.incorrect_answer_count();

    let new_stage = match quality {
        ReviewQuality::Again => {
            incorrect = incorrect.saturating_add(1);
            let adjustment = i64::from(incorrect.div_ceil(2));
            let factor = if item.srs_stage().value() >= HEAVY_PENALTY_STAGE {
                2
            } else {
                1
            };
            modifier -= AGAIN_PENALTY;
            (original_stage - adjustment * factor).max(1)
        }
        ReviewQuality::Hard => {
            incorrect = 0;
            modifier -= HARD_PENALTY;
            original_stage
        }
        ReviewQuality::Good => {
            incorrect = 0;
            original_stage + 1
        }
        ReviewQuality::Easy => {
            incorrect = 0;
            modifier += EASY_BUMP;
            original_stage + 1
        }
    };

    let modifier = clamp_interval_modifier(modifier);
    let stage = SrsStage::saturating(new_stage);

    let next_review_date = if stage.is_burned() {
        burned_review_date()
    } else {
        interval_for(stage, modifier).map_or_else(burned_review_date, |interval| now + interval)
    };

    let mut next = item.clone();
    next.srs_stage = stage;
    next.interval_modifier = modifier;
    next.incorrect_answer_count = incorrect;
    next.next_review_date = next_review_date;
    next
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
