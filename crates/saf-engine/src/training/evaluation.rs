//! Classification metrics for held-out evaluation

use serde::{Deserialize, Serialize};

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Accuracy plus per-class metrics; class 0 is "declined", class 1 "chose SAF"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub accuracy: f64,
    pub classes: [ClassMetrics; 2],
    pub macro_avg: ClassMetrics,
    pub weighted_avg: ClassMetrics,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn class_metrics(predicted: &[bool], actual: &[bool], class: bool) -> ClassMetrics {
    let mut tp = 0;
    let mut fp = 0;
    let mut fn_ = 0;
    for (&p, &a) in predicted.iter().zip(actual) {
        match (p == class, a == class) {
            (true, true) => tp += 1,
            (true, false) => fp += 1,
            (false, true) => fn_ += 1,
            (false, false) => {}
        }
    }

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    ClassMetrics {
        precision,
        recall,
        f1,
        support: tp + fn_,
    }
}

pub fn accuracy(predicted: &[bool], actual: &[bool]) -> f64 {
    let correct = predicted.iter().zip(actual).filter(|(p, a)| p == a).count();
    ratio(correct, actual.len())
}

pub fn classification_report(predicted: &[bool], actual: &[bool]) -> ClassificationReport {
    let classes = [
        class_metrics(predicted, actual, false),
        class_metrics(predicted, actual, true),
    ];

    let macro_avg = ClassMetrics {
        precision: (classes[0].precision + classes[1].precision) / 2.0,
        recall: (classes[0].recall + classes[1].recall) / 2.0,
        f1: (classes[0].f1 + classes[1].f1) / 2.0,
        support: actual.len(),
    };

    let total = actual.len().max(1) as f64;
    let weighted = |f: fn(&ClassMetrics) -> f64| {
        classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total
    };
    let weighted_avg = ClassMetrics {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1: weighted(|c| c.f1),
        support: actual.len(),
    };

    ClassificationReport {
        accuracy: accuracy(predicted, actual),
        classes,
        macro_avg,
        weighted_avg,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perfect_predictions() {
        let actual = vec![true, false, true, true];
        let report = classification_report(&actual, &actual);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.classes[1].precision, 1.0);
        assert_eq!(report.classes[1].support, 3);
        assert_eq!(report.classes[0].support, 1);
    }

    #[test]
    fn test_mixed_predictions() {
        let actual = vec![true, true, false, false];
        let predicted = vec![true, false, true, false];
        let report = classification_report(&predicted, &actual);
        assert_eq!(report.accuracy, 0.5);
        assert_eq!(report.classes[1].precision, 0.5);
        assert_eq!(report.classes[1].recall, 0.5);
        assert_eq!(report.classes[1].f1, 0.5);
        assert_eq!(report.macro_avg.f1, 0.5);
    }

    #[test]
    fn test_missing_class_scores_zero() {
        let actual = vec![true, true];
        let predicted = vec![true, true];
        let report = classification_report(&predicted, &actual);
        assert_eq!(report.classes[0].precision, 0.0);
        assert_eq!(report.classes[0].support, 0);
        assert_eq!(report.weighted_avg.precision, 1.0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(accuracy(&[], &[]), 0.0);
    }
}
