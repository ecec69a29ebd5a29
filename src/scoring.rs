use crate::model::types::{AnsweredRecord, Badge, QuizSummary, WeakArea};

/// Categories under this accuracy (percent) are reported as weak areas.
pub const WEAK_AREA_THRESHOLD: f64 = 70.0;

pub fn accuracy(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}

pub fn average_time(total_time: u64, total: u32) -> u64 {
    if total == 0 {
        return 0;
    }
    (total_time as f64 / total as f64).round() as u64
}

pub fn badge_for(accuracy: u32) -> Badge {
    match accuracy {
        90.. => Badge::Perfect,
        80..=89 => Badge::Excellent,
        70..=79 => Badge::Good,
        60..=69 => Badge::Fair,
        _ => Badge::KeepLearning,
    }
}

/// Per-category accuracy below [`WEAK_AREA_THRESHOLD`], weakest first.
/// Categories with equal accuracy keep the order they were first answered in.
pub fn weak_areas(answers: &[AnsweredRecord]) -> Vec<WeakArea> {
    // (category, correct, total) in first-seen order
    let mut stats: Vec<(&str, u32, u32)> = Vec::new();
    for answer in answers {
        let idx = match stats.iter().position(|(c, _, _)| *c == answer.category) {
            Some(idx) => idx,
            None => {
                stats.push((answer.category.as_str(), 0, 0));
                stats.len() - 1
            }
        };
        stats[idx].2 += 1;
        if answer.is_correct {
            stats[idx].1 += 1;
        }
    }

    let mut weak: Vec<WeakArea> = stats
        .into_iter()
        .map(|(category, correct, total)| WeakArea {
            category: category.to_string(),
            accuracy: correct as f64 / total as f64 * 100.0,
        })
        .filter(|area| area.accuracy < WEAK_AREA_THRESHOLD)
        .collect();
    weak.sort_by(|a, b| a.accuracy.total_cmp(&b.accuracy));
    weak
}

pub fn summarize(
    score: u32,
    total: u32,
    best_streak: u32,
    total_time: u64,
    answers: &[AnsweredRecord],
) -> QuizSummary {
    let accuracy = accuracy(score, total);
    QuizSummary {
        score,
        total,
        accuracy,
        total_time,
        average_time: average_time(total_time, total),
        best_streak,
        badge: badge_for(accuracy),
        weak_areas: weak_areas(answers),
    }
}
