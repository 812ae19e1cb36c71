//! Wellness score, label counts and check-in streaks over a user's mood log.
//!
//! Every contribution lands on a 0..10 scale where higher is better: positive
//! and neutral labels scale the score by their weight, negative labels invert
//! it first (`(10 - score) * |weight|`) so an intense bad mood pulls the
//! average down harder than a mild one.

use std::collections::{BTreeSet, HashMap};

use chrono::{FixedOffset, NaiveDate};

use crate::models::mood::{Mood, MoodCount, MoodEntry, MoodStats, ScoreSummary, MAX_SCORE};

/// Sentiment weight of a stored label. Unknown labels weigh 0.
pub fn sentiment_weight(label: &str) -> f64 {
    label.parse::<Mood>().map(|m| m.weight()).unwrap_or(0.0)
}

/// Contribution of one scored check-in to the wellness average.
pub fn contribution(label: &str, score: i32) -> f64 {
    let weight = sentiment_weight(label);
    let score = score as f64;
    if weight < 0.0 {
        (MAX_SCORE as f64 - score) * weight.abs()
    } else {
        score * weight
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sentiment-weighted mean over scored entries, rounded to one decimal.
/// `None` when nothing is scored.
pub fn weighted_average_score(entries: &[MoodEntry]) -> Option<f64> {
    let (sum, scored) = entries
        .iter()
        .filter_map(|e| e.score.map(|s| contribution(&e.mood, s)))
        .fold((0.0, 0usize), |(sum, n), c| (sum + c, n + 1));

    if scored == 0 {
        return None;
    }
    Some(round_one_decimal(sum / scored as f64))
}

/// Entries per label, most frequent first. Ties are ordered by label.
pub fn mood_counts(entries: &[MoodEntry]) -> Vec<MoodCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.mood.as_str()).or_insert(0) += 1;
    }

    let mut counts: Vec<MoodCount> = counts
        .into_iter()
        .map(|(mood, count)| MoodCount {
            mood: mood.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mood.cmp(&b.mood)));
    counts
}

/// Distinct check-in days on the server calendar, newest first.
pub fn check_in_days(entries: &[MoodEntry], offset: FixedOffset) -> Vec<NaiveDate> {
    let days: BTreeSet<NaiveDate> = entries
        .iter()
        .map(|e| e.created_at.with_timezone(&offset).date_naive())
        .collect();
    days.into_iter().rev().collect()
}

/// Consecutive check-in days ending today. A missing entry today yields 0.
///
/// `days` must be distinct and sorted newest first.
pub fn compute_streak(days: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut streak = 0u32;
    let mut expected = today;

    for day in days {
        if *day > expected {
            // Future-dated check-ins don't count toward or break the run.
            continue;
        }
        if *day != expected {
            break;
        }
        streak += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }

    streak
}

/// Longest run of consecutive check-in days anywhere in the log.
///
/// `days` must be distinct and sorted newest first.
pub fn longest_streak(days: &[NaiveDate]) -> u32 {
    let mut longest = 0u32;
    let mut run = 0u32;
    let mut prev: Option<NaiveDate> = None;

    for day in days {
        run = match prev {
            Some(p) if p.pred_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(*day);
    }

    longest
}

/// Full stats payload for `GET /api/moods/stats/summary`.
pub fn summarize(entries: &[MoodEntry], today: NaiveDate, offset: FixedOffset) -> MoodStats {
    let days = check_in_days(entries, offset);
    MoodStats {
        summary: ScoreSummary {
            avg_score: weighted_average_score(entries),
            count: entries.iter().filter(|e| e.score.is_some()).count(),
        },
        mood_counts: mood_counts(entries),
        streak: compute_streak(&days, today),
        longest_streak: longest_streak(&days),
        total_entries: entries.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn noon(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
    }

    fn entry(mood: &str, score: Option<i32>, created_at: DateTime<Utc>) -> MoodEntry {
        MoodEntry {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            mood: mood.into(),
            score,
            note: None,
            created_at,
        }
    }

    fn scored(mood: &str, score: i32) -> MoodEntry {
        entry(mood, Some(score), Utc::now())
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - Duration::days(n)
    }

    // ── weighted_average_score ───────────────────────────────────────────

    #[test]
    fn test_average_positive_only() {
        let entries = [scored("happy", 8), scored("excited", 6)];
        assert_eq!(weighted_average_score(&entries), Some(7.0));
    }

    #[test]
    fn test_average_mixed_polarity() {
        // happy: 8 * 1.0 = 8.0, sad: (10 - 8) * 0.8 = 1.6
        let entries = [scored("happy", 8), scored("sad", 8)];
        assert_eq!(weighted_average_score(&entries), Some(4.8));
    }

    #[test]
    fn test_average_empty_is_none() {
        assert_eq!(weighted_average_score(&[]), None);
    }

    #[test]
    fn test_average_ignores_unscored_entries() {
        let entries = [
            scored("neutral", 6),
            entry("sad", None, Utc::now()),
            entry("angry", None, Utc::now()),
        ];
        assert_eq!(weighted_average_score(&entries), Some(3.0));
    }

    #[test]
    fn test_average_only_unscored_is_none() {
        let entries = [entry("happy", None, Utc::now())];
        assert_eq!(weighted_average_score(&entries), None);
    }

    #[test]
    fn test_unknown_label_counts_in_denominator() {
        let entries = [scored("happy", 8), scored("bored", 9)];
        assert_eq!(weighted_average_score(&entries), Some(4.0));
    }

    #[test]
    fn test_intense_negative_drags_harder() {
        assert!(contribution("anxious", 9) < contribution("anxious", 2));
        assert!((contribution("angry", 10) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_is_rounded_to_one_decimal() {
        // anxious 3: (10 - 3) * 0.7 = 4.9, happy 7: 7.0, neutral 5: 2.5 → 14.4 / 3 = 4.8
        let entries = [scored("anxious", 3), scored("happy", 7), scored("neutral", 5)];
        assert_eq!(weighted_average_score(&entries), Some(4.8));

        let entries = [scored("happy", 1), scored("happy", 2), scored("happy", 2)];
        assert_eq!(weighted_average_score(&entries), Some(1.7));
    }

    // ── mood_counts ──────────────────────────────────────────────────────

    #[test]
    fn test_counts_sorted_descending() {
        let entries = [
            scored("sad", 4),
            entry("happy", None, Utc::now()),
            scored("happy", 9),
            scored("happy", 7),
            scored("anxious", 5),
            scored("anxious", 6),
        ];
        let counts = mood_counts(&entries);
        assert_eq!(
            counts,
            vec![
                MoodCount { mood: "happy".into(), count: 3 },
                MoodCount { mood: "anxious".into(), count: 2 },
                MoodCount { mood: "sad".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_counts_empty() {
        assert!(mood_counts(&[]).is_empty());
    }

    // ── compute_streak ───────────────────────────────────────────────────

    #[test]
    fn test_streak_breaks_on_gap() {
        let days = [today(), days_ago(1), days_ago(3)];
        assert_eq!(compute_streak(&days, today()), 2);
    }

    #[test]
    fn test_streak_zero_when_today_missing() {
        let days = [days_ago(1), days_ago(2), days_ago(3)];
        assert_eq!(compute_streak(&days, today()), 0);
    }

    #[test]
    fn test_streak_empty_log() {
        assert_eq!(compute_streak(&[], today()), 0);
    }

    #[test]
    fn test_streak_skips_future_days() {
        let days = [today() + Duration::days(1), today(), days_ago(1)];
        assert_eq!(compute_streak(&days, today()), 2);
    }

    #[test]
    fn test_same_day_entries_count_once() {
        let morning = Utc.from_utc_datetime(&today().and_hms_opt(7, 0, 0).unwrap());
        let evening = Utc.from_utc_datetime(&today().and_hms_opt(21, 0, 0).unwrap());
        let entries = [
            entry("happy", Some(8), evening),
            entry("sad", Some(3), morning),
            entry("neutral", None, noon(days_ago(1))),
        ];
        let days = check_in_days(&entries, utc());
        assert_eq!(days, vec![today(), days_ago(1)]);
        assert_eq!(compute_streak(&days, today()), 2);
    }

    #[test]
    fn test_check_in_days_use_calendar_offset() {
        // 22:30 UTC on the 14th is already the 15th in Nairobi (UTC+3).
        let late = Utc.with_ymd_and_hms(2024, 3, 14, 22, 30, 0).unwrap();
        let entries = [entry("happy", Some(7), late)];
        let nairobi = FixedOffset::east_opt(3 * 3600).unwrap();
        assert_eq!(check_in_days(&entries, nairobi), vec![today()]);
        assert_eq!(check_in_days(&entries, utc()), vec![days_ago(1)]);
    }

    // ── longest_streak ───────────────────────────────────────────────────

    #[test]
    fn test_longest_streak_across_gaps() {
        let days = [
            days_ago(1),
            days_ago(4),
            days_ago(5),
            days_ago(6),
            days_ago(9),
        ];
        assert_eq!(longest_streak(&days), 3);
        assert_eq!(longest_streak(&[]), 0);
    }

    // ── summarize ────────────────────────────────────────────────────────

    #[test]
    fn test_summarize() {
        let entries = [
            entry("happy", Some(8), noon(today())),
            entry("sad", Some(8), noon(days_ago(1))),
            entry("sad", None, noon(days_ago(2))),
            entry("excited", Some(6), noon(days_ago(5))),
        ];
        let stats = summarize(&entries, today(), utc());
        // (8.0 + 1.6 + 6.0) / 3 = 5.2
        assert_eq!(stats.summary.avg_score, Some(5.2));
        assert_eq!(stats.summary.count, 3);
        assert_eq!(stats.total_entries, 4);
        assert_eq!(stats.streak, 3);
        assert_eq!(stats.longest_streak, 3);
        assert_eq!(stats.mood_counts[0], MoodCount { mood: "sad".into(), count: 2 });
    }
}
