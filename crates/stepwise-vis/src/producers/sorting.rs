//! Sorting producers. Each one sorts a private copy of the input and records
//! what it did to it.

use stepwise_trace::{Side, Step, StepKind};

use super::Recorder;

pub(crate) fn bubble(values: &[i64]) -> Vec<Step> {
    let mut work = values.to_vec();
    let mut rec = Recorder::default();
    let n = work.len();

    for pass in 0..n {
        let end = n - pass - 1;
        let mut swapped = false;
        for i in 0..end {
            rec.push(StepKind::Compare { i, j: i + 1 });
            if work[i] > work[i + 1] {
                work.swap(i, i + 1);
                rec.push(StepKind::Swap { i, j: i + 1 });
                swapped = true;
            }
        }
        if !swapped {
            rec.note(
                StepKind::MarkSorted {
                    indices: (0..=end).collect(),
                },
                format!("pass {} made no swaps", pass + 1),
            );
            break;
        }
        rec.push(StepKind::MarkSorted { indices: vec![end] });
    }
    rec.finish()
}

pub(crate) fn selection(values: &[i64]) -> Vec<Step> {
    let mut work = values.to_vec();
    let mut rec = Recorder::default();
    let n = work.len();

    for i in 0..n {
        let mut min = i;
        rec.push(StepKind::Select { index: min });
        for j in i + 1..n {
            rec.push(StepKind::Compare { i: min, j });
            if work[j] < work[min] {
                rec.push(StepKind::Deselect { index: min });
                min = j;
                rec.push(StepKind::Select { index: min });
            }
        }
        if min != i {
            work.swap(i, min);
            rec.note(
                StepKind::Swap { i, j: min },
                format!("{} is the smallest remaining", work[i]),
            );
        }
        rec.push(StepKind::Deselect { index: i });
        rec.push(StepKind::MarkSorted { indices: vec![i] });
    }
    rec.finish()
}

pub(crate) fn insertion(values: &[i64]) -> Vec<Step> {
    let mut work = values.to_vec();
    let mut rec = Recorder::default();
    let n = work.len();

    for i in 1..n {
        rec.push(StepKind::Select { index: i });
        let mut j = i;
        while j > 0 {
            rec.push(StepKind::Compare { i: j - 1, j });
            if work[j - 1] <= work[j] {
                break;
            }
            work.swap(j - 1, j);
            rec.push(StepKind::Swap { i: j - 1, j });
            j -= 1;
        }
        rec.push(StepKind::Deselect { index: j });
    }
    if n > 0 {
        rec.push(StepKind::MarkSorted {
            indices: (0..n).collect(),
        });
    }
    rec.finish()
}

/// Quicksort with Lomuto partitioning around the last element.
pub(crate) fn quick(values: &[i64]) -> Vec<Step> {
    let mut work = values.to_vec();
    let mut rec = Recorder::default();
    let n = work.len();
    quick_range(&mut work, 0, n, &mut rec);
    rec.finish()
}

fn quick_range(work: &mut [i64], lo: usize, hi: usize, rec: &mut Recorder) {
    match hi.saturating_sub(lo) {
        0 => return,
        1 => {
            rec.push(StepKind::MarkSorted { indices: vec![lo] });
            return;
        }
        _ => {}
    }

    let pivot = hi - 1;
    rec.note(
        StepKind::Partition { pivot },
        format!("partition {lo}..{hi} around {}", work[pivot]),
    );
    let mut store = lo;
    for j in lo..pivot {
        rec.push(StepKind::Compare { i: j, j: pivot });
        if work[j] < work[pivot] {
            rec.push(StepKind::Classify {
                index: j,
                side: Side::Less,
            });
            if store != j {
                work.swap(store, j);
                rec.push(StepKind::Swap { i: store, j });
            }
            store += 1;
        } else {
            rec.push(StepKind::Classify {
                index: j,
                side: Side::Greater,
            });
        }
    }
    if store != pivot {
        work.swap(store, pivot);
        rec.push(StepKind::Swap { i: store, j: pivot });
    }
    rec.push(StepKind::MarkSorted {
        indices: vec![store],
    });

    quick_range(work, lo, store, rec);
    quick_range(work, store + 1, hi, rec);
}

/// Top-down merge sort; merged values are written back into place.
pub(crate) fn merge(values: &[i64]) -> Vec<Step> {
    let mut work = values.to_vec();
    let mut rec = Recorder::default();
    let n = work.len();
    merge_range(&mut work, 0, n, &mut rec);
    if n > 0 {
        rec.push(StepKind::MarkSorted {
            indices: (0..n).collect(),
        });
    }
    rec.finish()
}

fn merge_range(work: &mut [i64], lo: usize, hi: usize, rec: &mut Recorder) {
    if hi - lo < 2 {
        return;
    }
    let mid = lo + (hi - lo) / 2;
    merge_range(work, lo, mid, rec);
    merge_range(work, mid, hi, rec);

    rec.label("merge", format!("{lo}..{mid} + {mid}..{hi}"));
    let left = work[lo..mid].to_vec();
    let right = work[mid..hi].to_vec();
    let (mut l, mut r) = (0, 0);
    for k in lo..hi {
        let take_left = if l < left.len() && r < right.len() {
            rec.push(StepKind::Compare {
                i: lo + l,
                j: mid + r,
            });
            left[l] <= right[r]
        } else {
            l < left.len()
        };
        let value = if take_left {
            l += 1;
            left[l - 1]
        } else {
            r += 1;
            right[r - 1]
        };
        work[k] = value;
        rec.push(StepKind::Write { index: k, value });
    }
    rec.label("merge", "");
}
