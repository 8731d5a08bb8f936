//! Searching producers over an array of values.

use stepwise_trace::{Step, StepKind};

use super::Recorder;

pub(crate) fn linear(values: &[i64], target: i64) -> Vec<Step> {
    let mut rec = Recorder::default();
    rec.label("target", target.to_string());
    for (index, &value) in values.iter().enumerate() {
        rec.push(StepKind::Visit { node: index });
        if value == target {
            rec.note(StepKind::Found { index }, format!("found {target} at {index}"));
            return rec.finish();
        }
    }
    rec.note(StepKind::NotFound, format!("{target} is not present"));
    rec.finish()
}

/// Binary search; `values` must already be sorted.
pub(crate) fn binary(values: &[i64], target: i64) -> Vec<Step> {
    let mut rec = Recorder::default();
    rec.label("target", target.to_string());
    let (mut lo, mut hi) = (0, values.len());
    while lo < hi {
        rec.label("range", format!("[{lo}, {hi})"));
        let mid = lo + (hi - lo) / 2;
        rec.push(StepKind::Visit { node: mid });
        match values[mid].cmp(&target) {
            std::cmp::Ordering::Equal => {
                rec.note(StepKind::Found { index: mid }, format!("found {target} at {mid}"));
                return rec.finish();
            }
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid,
        }
    }
    rec.label("range", "");
    rec.note(StepKind::NotFound, format!("{target} is not present"));
    rec.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn last(steps: &[Step]) -> &StepKind {
        &steps.last().unwrap().kind
    }

    #[test]
    fn linear_stops_at_first_match() {
        let steps = linear(&[4, 7, 7, 1], 7);
        assert_eq!(last(&steps), &StepKind::Found { index: 1 });
        assert_eq!(steps.iter().filter(|s| s.kind.name() == "visit").count(), 2);
    }

    #[test]
    fn binary_halves_the_range() {
        let values: Vec<i64> = (0..64).collect();
        let steps = binary(&values, 63);
        assert_eq!(last(&steps), &StepKind::Found { index: 63 });
        let visits = steps.iter().filter(|s| s.kind.name() == "visit").count();
        assert!(visits <= 7, "{visits} visits");
    }

    #[test]
    fn absent_targets_end_in_not_found() {
        assert_eq!(last(&linear(&[1, 2], 5)), &StepKind::NotFound);
        assert_eq!(last(&binary(&[1, 2], 5)), &StepKind::NotFound);
        assert_eq!(last(&binary(&[], 5)), &StepKind::NotFound);
    }
}
